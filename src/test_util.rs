pub(crate) fn system_font_file() -> Option<std::path::PathBuf> {
    use usvg::fontdb;

    static FONT: std::sync::OnceLock<Option<std::path::PathBuf>> = std::sync::OnceLock::new();
    FONT.get_or_init(|| {
        let mut db = fontdb::Database::new();
        db.load_system_fonts();
        db.faces()
            .filter(|face| face.index == 0)
            .filter_map(|face| match &face.source {
                fontdb::Source::File(path) => Some(path.clone()),
                _ => None,
            })
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| ext.eq_ignore_ascii_case("ttf"))
                    .unwrap_or(false)
            })
            .find(|path| crate::font::OutlineFont::from_path(path).is_ok())
    })
    .clone()
}
