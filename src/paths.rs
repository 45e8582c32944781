use std::path::{Path, PathBuf};

const BASE_DIR_ENV: &str = "TEXT_IMAGE_STYLER_DIR";
const BASE_DIR_NAME: &str = ".text-image-styler";

/// Directory holding `settings.toml`, the media root and the font cache.
pub(crate) fn base_dir() -> PathBuf {
    if let Some(dir) = base_dir_override() {
        return dir;
    }
    home_join(BASE_DIR_NAME).unwrap_or_else(|| PathBuf::from(BASE_DIR_NAME))
}

pub(crate) fn settings_dir() -> Option<PathBuf> {
    if let Some(dir) = base_dir_override() {
        return Some(dir);
    }
    home_join(BASE_DIR_NAME)
}

/// Resolves a configured directory: `~` is expanded and relative values are
/// anchored at [`base_dir`].
pub(crate) fn resolve_configured_dir(value: &str) -> Option<PathBuf> {
    let normalized = normalize_dir(value)?;
    if normalized.is_absolute() {
        return Some(normalized);
    }
    Some(base_dir().join(normalized))
}

fn base_dir_override() -> Option<PathBuf> {
    std::env::var(BASE_DIR_ENV)
        .ok()
        .and_then(|value| normalize_dir(&value))
}

fn home_join(suffix: &str) -> Option<PathBuf> {
    std::env::var("HOME").ok().and_then(|home| {
        let home = home.trim();
        if home.is_empty() {
            None
        } else {
            Some(Path::new(home).join(suffix))
        }
    })
}

pub(crate) fn normalize_dir(value: &str) -> Option<PathBuf> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    let expanded = expand_tilde(trimmed);
    Some(normalize_path(PathBuf::from(expanded)))
}

fn normalize_path(path: PathBuf) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        normalized.push(component.as_os_str());
    }
    normalized
}

fn expand_tilde(value: &str) -> String {
    if value == "~" || value.starts_with("~/") {
        if let Ok(home) = std::env::var("HOME") {
            let home = home.trim();
            if home.is_empty() {
                return value.to_string();
            }
            if value == "~" {
                return home.to_string();
            }
            return format!("{}{}", home, &value[1..]);
        }
    }
    value.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolute_dirs_are_kept() {
        let resolved = resolve_configured_dir("/usr/share/fonts/truetype/").expect("dir");
        assert_eq!(resolved, PathBuf::from("/usr/share/fonts/truetype"));
    }

    #[test]
    fn relative_dirs_are_anchored_at_base() {
        let resolved = resolve_configured_dir("media/fonts").expect("dir");
        assert_eq!(resolved, base_dir().join("media/fonts"));
    }

    #[test]
    fn blank_dirs_are_ignored() {
        assert!(resolve_configured_dir("   ").is_none());
    }
}
