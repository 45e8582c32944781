use anyhow::Result;
use tiny_skia::{FillRule, Paint, Path, PathBuilder, Pixmap, Transform};
use ttf_parser::{Face, GlyphId, OutlineBuilder};

use crate::font::{BuiltinFont, FontHandle};

/// Converts font-unit outlines (y up) into pixel-space paths (y down).
struct GlyphPathBuilder {
    builder: PathBuilder,
    origin_x: f32,
    baseline_y: f32,
    scale: f32,
}

impl GlyphPathBuilder {
    fn new(origin_x: f32, baseline_y: f32, scale: f32) -> Self {
        Self {
            builder: PathBuilder::new(),
            origin_x,
            baseline_y,
            scale,
        }
    }

    fn point(&self, x: f32, y: f32) -> (f32, f32) {
        (self.origin_x + x * self.scale, self.baseline_y - y * self.scale)
    }

    fn finish(self) -> Option<Path> {
        self.builder.finish()
    }
}

impl OutlineBuilder for GlyphPathBuilder {
    fn move_to(&mut self, x: f32, y: f32) {
        let (x, y) = self.point(x, y);
        self.builder.move_to(x, y);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        let (x, y) = self.point(x, y);
        self.builder.line_to(x, y);
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        let (x1, y1) = self.point(x1, y1);
        let (x, y) = self.point(x, y);
        self.builder.quad_to(x1, y1, x, y);
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        let (x1, y1) = self.point(x1, y1);
        let (x2, y2) = self.point(x2, y2);
        let (x, y) = self.point(x, y);
        self.builder.cubic_to(x1, y1, x2, y2, x, y);
    }

    fn close(&mut self) {
        self.builder.close();
    }
}

/// Glyph drawn for `ch`. Control characters and unmapped whitespace take
/// the space glyph; other unmapped characters get `.notdef`.
fn glyph_id(face: &Face<'_>, ch: char) -> Option<GlyphId> {
    if ch.is_control() {
        return face.glyph_index(' ');
    }
    match face.glyph_index(ch) {
        Some(id) => Some(id),
        None if ch.is_whitespace() => face.glyph_index(' '),
        None => Some(GlyphId(0)),
    }
}

/// A font bound to a pixel size, able to measure and fill single glyphs.
pub(crate) enum GlyphPainter<'a> {
    Outline {
        face: Face<'a>,
        scale: f32,
        ascent: f32,
    },
    Builtin(BuiltinFont),
}

impl<'a> GlyphPainter<'a> {
    pub(crate) fn new(font: &'a FontHandle, font_size: f32) -> Result<Self> {
        match font {
            FontHandle::Outline(outline) => Ok(GlyphPainter::Outline {
                face: outline.face()?,
                scale: outline.scale(font_size),
                ascent: outline.ascent(font_size),
            }),
            FontHandle::Builtin(builtin) => Ok(GlyphPainter::Builtin(*builtin)),
        }
    }

    pub(crate) fn advance(&self, ch: char) -> f32 {
        match self {
            GlyphPainter::Outline { face, scale, .. } => {
                let units = glyph_id(face, ch)
                    .and_then(|id| face.glyph_hor_advance(id))
                    .unwrap_or(0);
                units as f32 * scale
            }
            GlyphPainter::Builtin(font) => font.advance(),
        }
    }

    /// Outline of `ch` with its pen position at `x` and the top of the text
    /// box at `top`. Blank glyphs have no path.
    fn glyph_path(&self, ch: char, x: f32, top: f32) -> Option<Path> {
        match self {
            GlyphPainter::Outline {
                face,
                scale,
                ascent,
            } => {
                let id = glyph_id(face, ch)?;
                let mut builder = GlyphPathBuilder::new(x, top + ascent, *scale);
                face.outline_glyph(id, &mut builder)?;
                builder.finish()
            }
            GlyphPainter::Builtin(font) => {
                let mut builder = PathBuilder::new();
                if !font.push_glyph(&mut builder, ch, x, top) {
                    return None;
                }
                builder.finish()
            }
        }
    }

    fn fill_glyph(&self, pixmap: &mut Pixmap, ch: char, x: f32, top: f32, paint: &Paint<'_>) {
        if let Some(path) = self.glyph_path(ch, x, top) {
            pixmap.fill_path(&path, paint, FillRule::Winding, Transform::identity(), None);
        }
    }

    /// Draws `glyphs` as one run, advancing the pen by each glyph's width.
    pub(crate) fn draw_run(
        &self,
        pixmap: &mut Pixmap,
        glyphs: &[(char, f32)],
        x: f32,
        top: f32,
        paint: &Paint<'_>,
    ) {
        let mut pen = x;
        for &(ch, advance) in glyphs {
            self.fill_glyph(pixmap, ch, pen, top, paint);
            pen += advance;
        }
    }

    /// Draws `glyphs` one by one with `spacing` extra pixels after each.
    pub(crate) fn draw_spaced(
        &self,
        pixmap: &mut Pixmap,
        glyphs: &[(char, f32)],
        x: f32,
        top: f32,
        spacing: f32,
        paint: &Paint<'_>,
    ) {
        let mut cursor = x;
        for &(ch, advance) in glyphs {
            self.fill_glyph(pixmap, ch, cursor, top, paint);
            cursor += advance + spacing;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::OutlineFont;

    fn white() -> Paint<'static> {
        let mut paint = Paint::default();
        paint.set_color_rgba8(255, 255, 255, 255);
        paint.anti_alias = true;
        paint
    }

    fn glyphs(painter: &GlyphPainter<'_>, text: &str) -> Vec<(char, f32)> {
        text.chars().map(|ch| (ch, painter.advance(ch))).collect()
    }

    fn assert_zero_spacing_matches_run(font: &FontHandle) {
        let painter = GlyphPainter::new(font, 40.0).expect("painter");
        let glyphs = glyphs(&painter, "Sale AVA!");
        let mut run = Pixmap::new(400, 120).expect("pixmap");
        let mut spaced = Pixmap::new(400, 120).expect("pixmap");
        painter.draw_run(&mut run, &glyphs, 10.5, 20.0, &white());
        painter.draw_spaced(&mut spaced, &glyphs, 10.5, 20.0, 0.0, &white());
        assert!(run.data().iter().any(|byte| *byte != 0));
        assert_eq!(run.data(), spaced.data());
    }

    #[test]
    fn zero_spacing_loop_matches_single_run_builtin() {
        assert_zero_spacing_matches_run(&FontHandle::Builtin(BuiltinFont));
    }

    #[test]
    fn zero_spacing_loop_matches_single_run_outline() {
        let Some(path) = crate::test_util::system_font_file() else {
            return;
        };
        let font = OutlineFont::from_path(&path).expect("font");
        assert_zero_spacing_matches_run(&FontHandle::Outline(font));
    }

    #[test]
    fn outline_glyphs_hang_below_the_top_edge() {
        let Some(path) = crate::test_util::system_font_file() else {
            return;
        };
        let font = FontHandle::Outline(OutlineFont::from_path(&path).expect("font"));
        let painter = GlyphPainter::new(&font, 48.0).expect("painter");
        let outline = painter.glyph_path('H', 0.0, 100.0).expect("H has an outline");
        let bounds = outline.bounds();
        assert!(bounds.top() >= 100.0 - 1.0);
        assert!(bounds.bottom() <= 100.0 + 48.0 * 1.5);
        assert!(painter.glyph_path(' ', 0.0, 100.0).is_none());
    }

    fn assert_control_characters_draw_as_spaces(font: &FontHandle) {
        let painter = GlyphPainter::new(font, 40.0).expect("painter");
        let draw = |text: &str| {
            let mut pixmap = Pixmap::new(200, 80).expect("pixmap");
            painter.draw_run(&mut pixmap, &glyphs(&painter, text), 10.0, 10.0, &white());
            pixmap
        };
        let spaced = draw("A A");
        assert!(spaced.data().iter().any(|byte| *byte != 0));
        for text in ["A\nA", "A\tA", "A\rA", "A\u{1}A"] {
            assert_eq!(draw(text).data(), spaced.data(), "{:?}", text);
        }
    }

    #[test]
    fn control_characters_are_blank_builtin() {
        assert_control_characters_draw_as_spaces(&FontHandle::Builtin(BuiltinFont));
    }

    #[test]
    fn control_characters_are_blank_outline() {
        let Some(path) = crate::test_util::system_font_file() else {
            return;
        };
        let font = OutlineFont::from_path(&path).expect("font");
        assert_control_characters_draw_as_spaces(&FontHandle::Outline(font));
    }

    #[test]
    fn spacing_moves_later_glyphs_right() {
        let font = FontHandle::Builtin(BuiltinFont);
        let painter = GlyphPainter::new(&font, 48.0).expect("painter");
        let glyphs = glyphs(&painter, "II");
        let mut tight = Pixmap::new(100, 30).expect("pixmap");
        let mut loose = Pixmap::new(100, 30).expect("pixmap");
        painter.draw_spaced(&mut tight, &glyphs, 0.0, 0.0, 0.0, &white());
        painter.draw_spaced(&mut loose, &glyphs, 0.0, 0.0, 20.0, &white());
        let rightmost = |pixmap: &Pixmap| {
            (0..pixmap.width())
                .rev()
                .find(|x| (0..pixmap.height()).any(|y| pixmap.pixel(*x, y).map(|p| p.alpha()) != Some(0)))
        };
        assert_eq!(
            rightmost(&loose).expect("ink"),
            rightmost(&tight).expect("ink") + 20
        );
    }
}
