use anyhow::{Context, Result, anyhow};
use std::path::Path;
use std::sync::Arc;
use ttf_parser::Face;
use ttf_parser::name_id;

mod builtin;
mod remote;
mod resolver;
mod system;

pub use builtin::BuiltinFont;
pub use resolver::{FontCacheKey, FontResolver, FontSource, ResolvedFont};

/// A parsed outline font. The face is re-parsed from the shared bytes when
/// drawing, which only reads the table directory.
#[derive(Clone)]
pub struct OutlineFont {
    data: Arc<Vec<u8>>,
    face_index: u32,
    units_per_em: u16,
    ascender: i16,
    family: Option<String>,
}

impl std::fmt::Debug for OutlineFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutlineFont")
            .field("family", &self.family)
            .field("face_index", &self.face_index)
            .field("units_per_em", &self.units_per_em)
            .field("bytes", &self.data.len())
            .finish()
    }
}

impl OutlineFont {
    pub fn from_path(path: &Path) -> Result<Self> {
        let data = std::fs::read(path)
            .with_context(|| format!("failed to read font: {}", path.display()))?;
        Self::from_data(data, 0)
            .map_err(|err| anyhow!("failed to parse font: {} ({})", path.display(), err))
    }

    pub fn from_data(data: Vec<u8>, face_index: u32) -> Result<Self> {
        let face = Face::parse(&data, face_index)
            .map_err(|err| anyhow!("invalid font data: {}", err))?;
        if face.number_of_glyphs() == 0 {
            return Err(anyhow!("font has no glyphs"));
        }
        let units_per_em = face.units_per_em().max(1);
        let ascender = face.ascender();
        let family = extract_family_name(&face);
        Ok(Self {
            data: Arc::new(data),
            face_index,
            units_per_em,
            ascender,
            family,
        })
    }

    pub fn family(&self) -> Option<&str> {
        self.family.as_deref()
    }

    pub(crate) fn face(&self) -> Result<Face<'_>> {
        Face::parse(&self.data, self.face_index).map_err(|err| anyhow!("invalid font data: {}", err))
    }

    pub(crate) fn scale(&self, font_size: f32) -> f32 {
        font_size / self.units_per_em as f32
    }

    /// Distance from the top of the text box to the baseline.
    pub(crate) fn ascent(&self, font_size: f32) -> f32 {
        self.ascender.max(0) as f32 * self.scale(font_size)
    }
}

/// A renderable font: an outline font at any size, or the fixed-size
/// built-in bitmap font.
#[derive(Debug, Clone)]
pub enum FontHandle {
    Outline(OutlineFont),
    Builtin(BuiltinFont),
}

impl FontHandle {
    pub fn is_builtin(&self) -> bool {
        matches!(self, FontHandle::Builtin(_))
    }

    pub fn family(&self) -> Option<&str> {
        match self {
            FontHandle::Outline(font) => font.family(),
            FontHandle::Builtin(_) => None,
        }
    }
}

fn extract_family_name(face: &Face<'_>) -> Option<String> {
    let mut fallback = None;
    for name in face.names() {
        if name.name_id == name_id::TYPOGRAPHIC_FAMILY {
            if let Some(value) = name.to_string() {
                return Some(value);
            }
        } else if name.name_id == name_id::FAMILY && fallback.is_none() {
            fallback = name.to_string();
        }
    }
    fallback
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn garbage_is_not_a_font() {
        let err = OutlineFont::from_data(b"definitely not a font".to_vec(), 0)
            .expect_err("garbage");
        assert!(err.to_string().contains("invalid font data"));
    }

    #[test]
    fn system_font_exposes_metrics() {
        let Some(path) = crate::test_util::system_font_file() else {
            return;
        };
        let font = OutlineFont::from_path(&path).expect("system font");
        assert!(font.ascent(48.0) > 0.0);
        assert!(font.ascent(48.0) <= 48.0 * 2.0);
        assert!(font.face().is_ok());
        let handle = FontHandle::Outline(font);
        assert!(!handle.is_builtin());
        assert!(handle.family().is_some_and(|name| !name.is_empty()));
        assert_eq!(FontHandle::Builtin(BuiltinFont).family(), None);
    }
}
