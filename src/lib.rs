use anyhow::{Context, Result, anyhow};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

pub mod error;
pub mod font;
pub mod logging;
mod paths;
pub mod render;
pub mod settings;
pub mod style;
#[cfg(test)]
mod test_util;

pub use error::{StylerError, ValidationError, ValidationErrorKind};
pub use font::{FontCacheKey, FontResolver, FontSource, ResolvedFont};
pub use render::{Clock, FixedClock, SystemClock};
pub use settings::{OutputFormat, Settings};
pub use style::{StyleBag, StyleSpecification, StyledText};

/// Placeholder drawn when only the font is being inspected.
const FONT_PREVIEW_TEXT: &str = "Aa";

/// One request: overlay `text` on the image at `image_path`.
#[derive(Debug, Clone)]
pub struct StyleJob {
    pub image_path: PathBuf,
    pub text: String,
    pub style: StyleBag,
}

#[derive(Debug, Clone)]
pub struct StyledOutput {
    /// Path relative to the media root, e.g. `outputs/photo_styled_1700000000.jpg`.
    pub relative_path: String,
    pub path: PathBuf,
    pub font: FontSource,
    pub width: u32,
    pub height: u32,
}

pub struct Styler {
    settings: Settings,
    resolver: FontResolver,
    clock: Arc<dyn Clock>,
}

impl Styler {
    pub fn new(settings: Settings) -> Self {
        Self::with_clock(settings, Arc::new(SystemClock))
    }

    pub fn with_clock(settings: Settings, clock: Arc<dyn Clock>) -> Self {
        let resolver = FontResolver::new(&settings);
        Self {
            settings,
            resolver,
            clock,
        }
    }

    pub fn resolver(&self) -> &FontResolver {
        &self.resolver
    }

    /// Validates the style, resolves the font, renders and stores the
    /// result. Nothing is read or written before validation passes.
    pub async fn style_image(&self, job: StyleJob) -> Result<StyledOutput, StylerError> {
        let styled = style::normalize(&job.text, &job.style)?;
        let key = FontCacheKey::new(&styled.style.font_family, styled.style.font_weight);
        let resolved = self.resolver.resolve(&key).await;
        info!(
            family = key.family(),
            weight = key.weight().value(),
            source = resolved.source().as_str(),
            "resolved font"
        );

        let handle = resolved.handle().clone();
        let output_root = self.settings.output_root();
        let format = self.settings.output_format;
        let quality = self.settings.jpeg_quality;
        let timestamp = self.clock.unix_timestamp();
        let image_path = job.image_path;

        let (name, path, width, height) = tokio::task::spawn_blocking(move || {
            let source = image::open(&image_path)
                .with_context(|| format!("failed to open image: {}", image_path.display()))?;
            let composed = render::composite(&source, &styled, &handle)?;
            let bytes = render::encode(&composed, format, quality)?;
            let stem = render::source_stem(&image_path);
            let (name, path) =
                render::persist(&bytes, &output_root, &stem, timestamp, format.extension())?;
            Ok::<_, anyhow::Error>((name, path, composed.width(), composed.height()))
        })
        .await
        .map_err(|err| anyhow!("render task failed: {}", err))??;

        let relative_path = format!("{}/{}", self.settings.output_dir, name);
        info!(output = %relative_path, width, height, "styled image written");
        Ok(StyledOutput {
            relative_path,
            path,
            font: resolved.source().clone(),
            width,
            height,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub image: Option<PathBuf>,
    pub text: Option<String>,
    pub style: Option<String>,
    pub set: Vec<String>,
    pub settings_path: Option<String>,
    pub media_root: Option<String>,
    pub no_remote_fonts: bool,
    pub show_font: bool,
}

pub async fn run(config: Config, input: Option<String>) -> Result<String> {
    let settings_path = config.settings_path.as_deref().map(Path::new);
    let mut settings = settings::load_settings(settings_path)?;
    if let Some(root) = config.media_root.as_deref() {
        let root = root.trim();
        if root.is_empty() {
            return Err(anyhow!("media root is empty"));
        }
        settings.media_root = PathBuf::from(root);
    }
    if config.no_remote_fonts {
        settings.remote_fonts = false;
    }

    let bag = build_style_bag(config.style.as_deref(), &config.set)?;
    let text = config.text.or(input).unwrap_or_default();
    let styler = Styler::new(settings);

    if config.show_font {
        let text = if text.trim().is_empty() {
            FONT_PREVIEW_TEXT
        } else {
            text.as_str()
        };
        return show_font(&styler, text, &bag).await;
    }

    let image_path = config
        .image
        .ok_or_else(|| anyhow!("--image is required"))?;
    let output = styler
        .style_image(StyleJob {
            image_path,
            text,
            style: bag,
        })
        .await?;
    Ok(output.relative_path)
}

async fn show_font(styler: &Styler, text: &str, bag: &StyleBag) -> Result<String> {
    let styled = style::normalize(text, bag)?;
    let key = FontCacheKey::new(&styled.style.font_family, styled.style.font_weight);
    let resolved = styler.resolver().resolve(&key).await;
    let width = render::measure_text(&styled.text, &styled.style, resolved.handle())?;
    let location = match (resolved.path(), resolved.handle().family()) {
        (Some(path), Some(family)) => format!("{}, {}", path.display(), family),
        (Some(path), None) => path.display().to_string(),
        (None, _) => "built-in".to_string(),
    };
    Ok(format!(
        "{} {}: {} ({}), {:.1}px wide",
        key.family(),
        key.weight().value(),
        resolved.source().as_str(),
        location,
        width
    ))
}

/// Merges a JSON object (inline or from a file) with `key=value` overrides.
pub fn build_style_bag(style: Option<&str>, overrides: &[String]) -> Result<StyleBag> {
    let mut bag = StyleBag::new();
    if let Some(style) = style {
        let trimmed = style.trim();
        let content = if trimmed.starts_with('{') || trimmed.starts_with('[') {
            trimmed.to_string()
        } else {
            std::fs::read_to_string(trimmed)
                .with_context(|| format!("failed to read style file: {}", trimmed))?
        };
        let value: Value =
            serde_json::from_str(&content).with_context(|| "failed to parse style JSON")?;
        match value {
            Value::Object(map) => bag.extend(map),
            _ => return Err(anyhow!("style JSON must be an object")),
        }
    }
    for entry in overrides {
        let (key, value) = entry
            .split_once('=')
            .ok_or_else(|| anyhow!("expected key=value, got '{}'", entry))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(anyhow!("expected key=value, got '{}'", entry));
        }
        bag.insert(key.to_string(), Value::String(value.to_string()));
    }
    Ok(bag)
}
