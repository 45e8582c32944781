//! Draws styled text onto an image.
//!
//! Everything is painted onto a transparent overlay first (background panel,
//! shadow, text), the overlay is rotated as a whole and then laid over the
//! source, so a rotated panel and its text always stay aligned.

use anyhow::{Result, anyhow};
use image::{DynamicImage, RgbImage};
use tiny_skia::Pixmap;

use crate::font::FontHandle;
use crate::style::{StyleSpecification, StyledText};

mod effects;
mod glyph;
mod output;

use glyph::GlyphPainter;

pub use output::{Clock, FixedClock, SystemClock, encode, output_file_name, persist};
pub(crate) use output::source_stem;

/// Characters of a text with their advances, measured once per composite.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    glyphs: Vec<(char, f32)>,
    width: f32,
}

impl TextRun {
    fn measure(painter: &GlyphPainter<'_>, text: &str, spacing: f32) -> Self {
        let glyphs: Vec<(char, f32)> = text.chars().map(|ch| (ch, painter.advance(ch))).collect();
        let mut width: f32 = glyphs.iter().map(|(_, advance)| advance).sum();
        if spacing != 0.0 && glyphs.len() > 1 {
            width += spacing * (glyphs.len() - 1) as f32;
        }
        Self { glyphs, width }
    }

    pub fn width(&self) -> f32 {
        self.width
    }

}

/// Width in pixels `text` occupies when drawn with `style`.
pub fn measure_text(text: &str, style: &StyleSpecification, font: &FontHandle) -> Result<f32> {
    let painter = GlyphPainter::new(font, style.font_size as f32)?;
    Ok(TextRun::measure(&painter, text, style.letter_spacing).width())
}

pub fn composite(
    source: &DynamicImage,
    styled: &StyledText,
    font: &FontHandle,
) -> Result<RgbImage> {
    let style = &styled.style;
    let base = source.to_rgba8();
    let (width, height) = base.dimensions();
    let mut overlay = Pixmap::new(width, height)
        .ok_or_else(|| anyhow!("image has no pixels ({}x{})", width, height))?;

    let painter = GlyphPainter::new(font, style.font_size as f32)?;
    let spacing = style.letter_spacing;
    let run = TextRun::measure(&painter, &styled.text, spacing);
    let x = style.text_alignment.anchor(style.x_position as f32, run.width);
    let y = style.y_position as f32;
    let box_height = style.background_height();

    if style.enable_background {
        let color = style.background_rgba();
        if !color.is_transparent() {
            effects::fill_background(&mut overlay, x, y, run.width, box_height, color);
        }
    }

    if style.enable_shadow {
        let color = style.shadow_rgba();
        if !color.is_transparent() {
            let paint = effects::solid_paint(color);
            let shadow_x = x + style.shadow_x as f32;
            let shadow_y = y + style.shadow_y as f32;
            if style.shadow_blur > 0 {
                let mut layer = Pixmap::new(width, height)
                    .ok_or_else(|| anyhow!("image has no pixels ({}x{})", width, height))?;
                draw_text(&painter, &mut layer, &run, shadow_x, shadow_y, spacing, &paint);
                let blurred = effects::blur_layer(&layer, style.shadow_blur as f32 / 2.0)?;
                effects::draw_layer(&mut overlay, &blurred);
            } else {
                draw_text(&painter, &mut overlay, &run, shadow_x, shadow_y, spacing, &paint);
            }
        }
    }

    let text_color = style.text_rgba();
    if !text_color.is_transparent() {
        let paint = effects::solid_paint(text_color);
        draw_text(&painter, &mut overlay, &run, x, y, spacing, &paint);
    }

    if style.text_rotate != 0 {
        let cx = x + run.width / 2.0;
        let cy = y + box_height / 2.0;
        overlay = effects::rotate_layer(&overlay, style.text_rotate as f32, cx, cy)?;
    }

    effects::flatten(&base, &overlay)
}

fn draw_text(
    painter: &GlyphPainter<'_>,
    pixmap: &mut Pixmap,
    run: &TextRun,
    x: f32,
    y: f32,
    spacing: f32,
    paint: &tiny_skia::Paint<'_>,
) {
    if spacing != 0.0 {
        painter.draw_spaced(pixmap, &run.glyphs, x, y, spacing, paint);
    } else {
        painter.draw_run(pixmap, &run.glyphs, x, y, paint);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::BuiltinFont;
    use crate::style::{HexColor, TextAlignment};
    use image::{Rgb, RgbImage};

    fn canvas() -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(200, 100, Rgb([20, 40, 60])))
    }

    fn styled(text: &str) -> StyledText {
        StyledText {
            text: text.to_string(),
            style: StyleSpecification {
                x_position: 100,
                y_position: 40,
                ..StyleSpecification::default()
            },
        }
    }

    fn builtin() -> FontHandle {
        FontHandle::Builtin(BuiltinFont)
    }

    fn changed(a: &RgbImage, b: &RgbImage) -> Vec<(u32, u32)> {
        a.enumerate_pixels()
            .filter(|(x, y, px)| b.get_pixel(*x, *y) != *px)
            .map(|(x, y, _)| (x, y))
            .collect()
    }

    #[test]
    fn run_width_includes_spacing_between_characters() {
        let font = builtin();
        let painter = GlyphPainter::new(&font, 48.0).expect("painter");
        assert_eq!(TextRun::measure(&painter, "abc", 0.0).width(), 36.0);
        assert_eq!(TextRun::measure(&painter, "abc", 4.0).width(), 44.0);
        assert_eq!(TextRun::measure(&painter, "a", 4.0).width(), 12.0);
        assert_eq!(TextRun::measure(&painter, "", 4.0).width(), 0.0);
    }

    #[test]
    fn alignment_moves_the_text() {
        let source = canvas();
        let mut left = styled("Hi");
        left.style.text_alignment = TextAlignment::Left;
        let mut right = styled("Hi");
        right.style.text_alignment = TextAlignment::Right;
        let plain = source.to_rgb8();

        let left_out = composite(&source, &left, &builtin()).expect("left");
        let right_out = composite(&source, &right, &builtin()).expect("right");
        let min_x = |img: &RgbImage| changed(img, &plain).iter().map(|(x, _)| *x).min();
        let max_x = |img: &RgbImage| changed(img, &plain).iter().map(|(x, _)| *x).max();
        assert!(min_x(&left_out).expect("ink") >= 100);
        assert!(max_x(&right_out).expect("ink") < 100);
    }

    #[test]
    fn transparent_text_without_effects_is_a_no_op() {
        let source = canvas();
        let mut request = styled("Hidden");
        request.style.text_opacity = 0;
        let out = composite(&source, &request, &builtin()).expect("composite");
        assert_eq!(out, source.to_rgb8());
    }

    #[test]
    fn zero_alpha_background_is_not_drawn() {
        let source = canvas();
        let mut with_panel = styled("Panel");
        with_panel.style.enable_background = true;
        with_panel.style.text_background = HexColor::rgba(255, 0, 0, 0);
        let without = styled("Panel");
        assert_eq!(
            composite(&source, &with_panel, &builtin()).expect("panel"),
            composite(&source, &without, &builtin()).expect("plain")
        );
    }

    #[test]
    fn background_panel_covers_padded_box() {
        let source = canvas();
        let mut request = styled("Box");
        request.style.enable_background = true;
        request.style.text_background = HexColor::rgb(255, 0, 0);
        let out = composite(&source, &request, &builtin()).expect("composite");
        // Box is 36 wide, centered on 100; panel spans 77..=122 by 35..=101.
        assert_eq!(out.get_pixel(78, 36).0, [255, 0, 0]);
        assert_eq!(out.get_pixel(121, 99).0, [255, 0, 0]);
        assert_eq!(out.get_pixel(76, 50).0, [20, 40, 60]);
        assert_eq!(out.get_pixel(123, 50).0, [20, 40, 60]);
    }

    #[test]
    fn tight_spacing_still_draws_the_panel() {
        let source = canvas();
        let mut request = styled("Box");
        request.style.enable_background = true;
        request.style.text_background = HexColor::rgb(255, 0, 0);
        request.style.letter_spacing = -40.0;
        request.style.text_opacity = 0;
        let out = composite(&source, &request, &builtin()).expect("composite");
        // Run width is 36 - 80 = -44, so the box spans 78..122 from an origin at 122.
        assert_eq!(out.get_pixel(74, 50).0, [255, 0, 0]);
        assert_eq!(out.get_pixel(126, 50).0, [255, 0, 0]);
        assert_eq!(out.get_pixel(72, 50).0, [20, 40, 60]);
    }

    #[test]
    fn shadow_is_drawn_even_when_text_is_transparent() {
        let source = canvas();
        let mut request = styled("Shade");
        request.style.text_opacity = 0;
        request.style.enable_shadow = true;
        request.style.shadow_blur = 0;
        let hard = composite(&source, &request, &builtin()).expect("hard");
        assert!(!changed(&hard, &source.to_rgb8()).is_empty());

        request.style.shadow_blur = 6;
        let soft = composite(&source, &request, &builtin()).expect("soft");
        let plain = source.to_rgb8();
        assert!(changed(&soft, &plain).len() > changed(&hard, &plain).len());
    }

    #[test]
    fn rotation_changes_output_and_zero_is_deterministic() {
        let source = canvas();
        let request = styled("Turn");
        let first = composite(&source, &request, &builtin()).expect("first");
        let second = composite(&source, &request, &builtin()).expect("second");
        assert_eq!(first, second);

        let mut rotated = styled("Turn");
        rotated.style.text_rotate = 90;
        let turned = composite(&source, &rotated, &builtin()).expect("rotated");
        let plain = source.to_rgb8();
        let ink = changed(&turned, &plain);
        let xs = ink.iter().map(|(x, _)| *x);
        let span = xs.clone().max().expect("ink") - xs.min().expect("ink");
        // 48px of text turned upright is at most a glyph cell wide.
        assert!(span < 24, "span {}", span);
    }
}
