mod color;
mod normalize;

pub use color::{HexColor, Rgba, percent_to_alpha};
pub use normalize::{MAX_SHADOW_BLUR, StyleBag, normalize};

/// Alpha applied to the shadow color regardless of `text_opacity`.
pub const SHADOW_ALPHA: u8 = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FontWeight(u16);

impl FontWeight {
    pub const REGULAR: FontWeight = FontWeight(400);
    pub const SEMI_BOLD: FontWeight = FontWeight(600);

    /// Accepts the CSS numeric weights 100, 200, ... 900.
    pub fn new(value: u16) -> Option<Self> {
        if (100..=900).contains(&value) && value % 100 == 0 {
            Some(FontWeight(value))
        } else {
            None
        }
    }

    pub fn value(&self) -> u16 {
        self.0
    }

    pub fn is_bold(&self) -> bool {
        self.0 >= 500
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlignment {
    Left,
    Center,
    Right,
}

impl TextAlignment {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "left" => Some(TextAlignment::Left),
            "center" => Some(TextAlignment::Center),
            "right" => Some(TextAlignment::Right),
            _ => None,
        }
    }

    /// Horizontal drawing origin for a run of `width` pixels anchored at `x`.
    pub fn anchor(&self, x: f32, width: f32) -> f32 {
        match self {
            TextAlignment::Left => x,
            TextAlignment::Center => x - width / 2.0,
            TextAlignment::Right => x - width,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StyleSpecification {
    pub font_family: String,
    pub font_weight: FontWeight,
    pub font_size: u32,
    pub font_color: HexColor,
    pub x_position: i32,
    pub y_position: i32,
    pub text_alignment: TextAlignment,
    pub text_rotate: i32,
    pub text_opacity: u8,
    pub letter_spacing: f32,
    pub line_height: f32,
    pub enable_shadow: bool,
    pub shadow_x: i32,
    pub shadow_y: i32,
    pub shadow_blur: u32,
    pub shadow_color: HexColor,
    pub enable_background: bool,
    pub text_background: HexColor,
}

impl Default for StyleSpecification {
    fn default() -> Self {
        Self {
            font_family: "Roboto".to_string(),
            font_weight: FontWeight::SEMI_BOLD,
            font_size: 48,
            font_color: HexColor::rgb(0xFF, 0xFF, 0xFF),
            x_position: 250,
            y_position: 250,
            text_alignment: TextAlignment::Center,
            text_rotate: 0,
            text_opacity: 100,
            letter_spacing: 0.0,
            line_height: 1.2,
            enable_shadow: false,
            shadow_x: 2,
            shadow_y: 2,
            shadow_blur: 4,
            shadow_color: HexColor::rgb(0, 0, 0),
            enable_background: false,
            text_background: HexColor::rgba(0, 0, 0, 0),
        }
    }
}

impl StyleSpecification {
    pub fn text_rgba(&self) -> Rgba {
        self.font_color
            .with_opacity(percent_to_alpha(self.text_opacity))
    }

    pub fn shadow_rgba(&self) -> Rgba {
        self.shadow_color.with_opacity(SHADOW_ALPHA)
    }

    pub fn background_rgba(&self) -> Rgba {
        self.text_background.with_opacity(u8::MAX)
    }

    /// Panel height before padding; also the vertical extent used for the
    /// rotation pivot.
    pub fn background_height(&self) -> f32 {
        (self.font_size as f32 * self.line_height).trunc()
    }
}

/// Trimmed text together with the style it is rendered in.
#[derive(Debug, Clone, PartialEq)]
pub struct StyledText {
    pub text: String,
    pub style: StyleSpecification,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weights_must_be_whole_hundreds() {
        assert!(FontWeight::new(100).is_some());
        assert!(FontWeight::new(900).is_some());
        assert!(FontWeight::new(0).is_none());
        assert!(FontWeight::new(450).is_none());
        assert!(FontWeight::new(1000).is_none());
        assert!(!FontWeight::REGULAR.is_bold());
        assert!(FontWeight::new(500).map(|w| w.is_bold()).unwrap_or(false));
    }

    #[test]
    fn alignment_anchors_around_x() {
        assert_eq!(TextAlignment::Left.anchor(250.0, 100.0), 250.0);
        assert_eq!(TextAlignment::Center.anchor(250.0, 100.0), 200.0);
        assert_eq!(TextAlignment::Right.anchor(250.0, 100.0), 150.0);
    }

    #[test]
    fn defaults_resolve_to_opaque_white_text() {
        let style = StyleSpecification::default();
        assert_eq!(
            style.text_rgba(),
            Rgba {
                r: 255,
                g: 255,
                b: 255,
                a: 255
            }
        );
        assert!(style.background_rgba().is_transparent());
        assert_eq!(style.shadow_rgba().a, SHADOW_ALPHA);
        assert_eq!(style.background_height(), 57.0);
    }
}
