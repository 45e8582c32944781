use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::paths;

const DEFAULT_SETTINGS_TOML: &str = include_str!("../settings.toml");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Jpeg,
    Png,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpg",
            OutputFormat::Png => "png",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" | "image/jpeg" => Some(OutputFormat::Jpeg),
            "png" | "image/png" => Some(OutputFormat::Png),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub media_root: PathBuf,
    pub output_dir: String,
    pub output_format: OutputFormat,
    pub jpeg_quality: u8,
    pub font_cache_dir: PathBuf,
    pub font_dirs: Vec<PathBuf>,
    pub remote_fonts: bool,
    pub font_service_url: String,
    pub font_fetch_timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        let base = paths::base_dir();
        Self {
            media_root: base.join("media"),
            output_dir: "outputs".to_string(),
            output_format: OutputFormat::Jpeg,
            jpeg_quality: 95,
            font_cache_dir: base.join("media").join("fonts"),
            font_dirs: vec![
                PathBuf::from("C:/Windows/Fonts"),
                PathBuf::from("/Library/Fonts"),
                PathBuf::from("/System/Library/Fonts"),
                PathBuf::from("/usr/share/fonts/truetype"),
            ],
            remote_fonts: true,
            font_service_url: "https://fonts.googleapis.com/css2".to_string(),
            font_fetch_timeout: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct SettingsFile {
    output: Option<OutputSettings>,
    fonts: Option<FontSettings>,
}

#[derive(Debug, Default, Deserialize)]
struct OutputSettings {
    media_root: Option<String>,
    dir: Option<String>,
    format: Option<String>,
    jpeg_quality: Option<u8>,
}

#[derive(Debug, Default, Deserialize)]
struct FontSettings {
    cache_dir: Option<String>,
    dirs: Option<Vec<String>>,
    remote: Option<bool>,
    service_url: Option<String>,
    timeout_secs: Option<u64>,
}

pub fn load_settings(extra_path: Option<&Path>) -> Result<Settings> {
    let mut settings = Settings::default();
    ensure_home_settings_file()?;

    let mut ordered_paths = Vec::new();
    ordered_paths.push(PathBuf::from("settings.toml"));
    ordered_paths.push(PathBuf::from("settings.local.toml"));

    if let Some(home) = paths::settings_dir() {
        ordered_paths.push(home.join("settings.toml"));
        ordered_paths.push(home.join("settings.local.toml"));
    }

    if let Some(extra) = extra_path {
        if !extra.exists() {
            return Err(anyhow!("settings file not found: {}", extra.display()));
        }
        ordered_paths.push(extra.to_path_buf());
    }

    for path in ordered_paths {
        if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("failed to read settings: {}", path.display()))?;
            settings
                .apply_toml(&content)
                .with_context(|| format!("failed to parse settings: {}", path.display()))?;
        }
    }

    Ok(settings)
}

impl Settings {
    pub fn apply_toml(&mut self, content: &str) -> Result<()> {
        let parsed: SettingsFile = toml::from_str(content)?;
        self.merge(parsed)
    }

    pub fn output_root(&self) -> PathBuf {
        self.media_root.join(&self.output_dir)
    }

    fn merge(&mut self, incoming: SettingsFile) -> Result<()> {
        if let Some(output) = incoming.output {
            if let Some(root) = output.media_root.as_deref() {
                if let Some(dir) = paths::resolve_configured_dir(root) {
                    self.media_root = dir;
                }
            }
            if let Some(dir) = output.dir {
                let dir = dir.trim().trim_matches('/').to_string();
                if !dir.is_empty() {
                    self.output_dir = dir;
                }
            }
            if let Some(format) = output.format {
                self.output_format = OutputFormat::parse(&format)
                    .ok_or_else(|| anyhow!("unsupported output format '{}'", format))?;
            }
            if let Some(quality) = output.jpeg_quality {
                if !(1..=100).contains(&quality) {
                    return Err(anyhow!("jpeg_quality must be between 1 and 100"));
                }
                self.jpeg_quality = quality;
            }
        }
        if let Some(fonts) = incoming.fonts {
            if let Some(dir) = fonts.cache_dir.as_deref() {
                if let Some(dir) = paths::resolve_configured_dir(dir) {
                    self.font_cache_dir = dir;
                }
            }
            if let Some(dirs) = fonts.dirs {
                self.font_dirs = dirs
                    .iter()
                    .filter_map(|dir| paths::normalize_dir(dir))
                    .collect();
            }
            if let Some(remote) = fonts.remote {
                self.remote_fonts = remote;
            }
            if let Some(url) = fonts.service_url {
                if !url.trim().is_empty() {
                    self.font_service_url = url.trim().to_string();
                }
            }
            if let Some(secs) = fonts.timeout_secs {
                if secs > 0 {
                    self.font_fetch_timeout = Duration::from_secs(secs);
                }
            }
        }
        Ok(())
    }
}

fn ensure_home_settings_file() -> Result<()> {
    let Some(home) = paths::settings_dir() else {
        return Ok(());
    };
    fs::create_dir_all(&home)
        .with_context(|| format!("failed to create settings directory: {}", home.display()))?;
    let path = home.join("settings.toml");
    if !path.exists() {
        fs::write(&path, DEFAULT_SETTINGS_TOML)
            .with_context(|| format!("failed to write settings: {}", path.display()))?;
    }
    Ok(())
}
