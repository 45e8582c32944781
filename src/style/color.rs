use crate::error::{ValidationError, ValidationErrorKind};

/// Straight (non-premultiplied) RGBA.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub fn is_transparent(&self) -> bool {
        self.a == 0
    }
}

/// A parsed `#RRGGBB` or `#RRGGBBAA` value. The alpha channel is only known
/// once it is combined with an opacity, see [`HexColor::with_opacity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HexColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub alpha: Option<u8>,
}

impl HexColor {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self {
            r,
            g,
            b,
            alpha: None,
        }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self {
            r,
            g,
            b,
            alpha: Some(a),
        }
    }

    pub fn parse(value: &str, field: &'static str) -> Result<Self, ValidationError> {
        let hex = value.trim();
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if !hex.chars().all(|ch| ch.is_ascii_hexdigit()) {
            return Err(ValidationError::new(
                ValidationErrorKind::InvalidColor,
                field,
                format!("'{}' is not a hex color", value),
            ));
        }
        let channel = |idx: usize| u8::from_str_radix(&hex[idx..idx + 2], 16).unwrap_or(0);
        match hex.len() {
            6 => Ok(Self::rgb(channel(0), channel(2), channel(4))),
            8 => Ok(Self::rgba(channel(0), channel(2), channel(4), channel(6))),
            len => Err(ValidationError::new(
                ValidationErrorKind::InvalidColor,
                field,
                format!("expected 6 or 8 hex digits, got {}", len),
            )),
        }
    }

    /// Resolves the final alpha. A 6-digit color takes `opacity` as is; an
    /// embedded alpha is scaled by `opacity / 255`.
    pub fn with_opacity(&self, opacity: u8) -> Rgba {
        let a = match self.alpha {
            Some(embedded) => scale_alpha(embedded, opacity),
            None => opacity,
        };
        Rgba {
            r: self.r,
            g: self.g,
            b: self.b,
            a,
        }
    }
}

/// `round(percent * 2.55)`.
pub fn percent_to_alpha(percent: u8) -> u8 {
    ((percent.min(100) as u32 * 255 + 50) / 100) as u8
}

fn scale_alpha(alpha: u8, opacity: u8) -> u8 {
    ((alpha as u32 * opacity as u32 + 127) / 255) as u8
}
