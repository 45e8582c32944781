use anyhow::{Context, Result, anyhow};
use futures_util::StreamExt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use super::OutlineFont;
use super::resolver::FontCacheKey;

/// Client for a Google Fonts style `css2` endpoint.
pub(crate) struct RemoteFontService {
    client: reqwest::Client,
    service_url: String,
}

impl RemoteFontService {
    pub(crate) fn new(service_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .with_context(|| "failed to build font service client")?;
        Ok(Self {
            client,
            service_url: service_url.trim_end_matches('?').to_string(),
        })
    }

    pub(crate) fn stylesheet_url(&self, key: &FontCacheKey) -> String {
        format!(
            "{}?family={}:wght@{}",
            self.service_url,
            key.family().replace(' ', "+"),
            key.weight().value()
        )
    }

    /// Downloads the font for `key` into `cache_dir` and returns the cached
    /// file with its parsed face.
    pub(crate) async fn fetch(
        &self,
        key: &FontCacheKey,
        cache_dir: &Path,
    ) -> Result<(PathBuf, OutlineFont)> {
        let css_url = self.stylesheet_url(key);
        let css = self
            .client
            .get(&css_url)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .with_context(|| format!("failed to fetch font stylesheet: {}", css_url))?
            .text()
            .await
            .with_context(|| format!("failed to read font stylesheet: {}", css_url))?;
        let font_url = first_font_url(&css)
            .ok_or_else(|| anyhow!("font stylesheet has no font url: {}", css_url))?;
        debug!(family = key.family(), url = %font_url, "downloading font");

        std::fs::create_dir_all(cache_dir)
            .with_context(|| format!("failed to create font cache: {}", cache_dir.display()))?;
        let mut tmp = tempfile::Builder::new()
            .prefix(".download-")
            .suffix(".part")
            .tempfile_in(cache_dir)
            .with_context(|| format!("failed to create font file in {}", cache_dir.display()))?;

        let response = self
            .client
            .get(&font_url)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .with_context(|| format!("failed to download font: {}", font_url))?;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.with_context(|| "failed to read font bytes")?;
            tmp.write_all(&chunk)
                .with_context(|| "failed to write font bytes")?;
        }
        tmp.flush().with_context(|| "failed to write font bytes")?;

        let data = std::fs::read(tmp.path())
            .with_context(|| format!("failed to read font: {}", tmp.path().display()))?;
        let ext = font_extension(&data)?;
        let font = OutlineFont::from_data(data, 0)
            .with_context(|| format!("downloaded font is unusable: {}", font_url))?;

        let dest = cache_dir.join(format!("{}.{}", key.file_stem(), ext));
        tmp.persist(&dest)
            .map_err(|err| err.error)
            .with_context(|| format!("failed to store font: {}", dest.display()))?;
        Ok((dest, font))
    }
}

/// First `url(...)` in a stylesheet that points at an http(s) resource.
pub(crate) fn first_font_url(css: &str) -> Option<String> {
    let mut rest = css;
    while let Some(start) = rest.find("url(") {
        let after = &rest[start + 4..];
        let end = after.find(')')?;
        let candidate = after[..end].trim().trim_matches(|c| c == '"' || c == '\'');
        if candidate.starts_with("http://") || candidate.starts_with("https://") {
            return Some(candidate.to_string());
        }
        rest = &after[end + 1..];
    }
    None
}

fn font_extension(data: &[u8]) -> Result<&'static str> {
    match infer::get(data).map(|kind| kind.extension()) {
        None | Some("ttf") => Ok("ttf"),
        Some("otf") => Ok("otf"),
        Some(other) => Err(anyhow!("unsupported font format: {}", other)),
    }
}
