use anyhow::{Context, Result, anyhow};
use image::RgbImage;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::settings::OutputFormat;

const MAX_NAME_ATTEMPTS: u32 = 1000;

pub trait Clock: Send + Sync {
    fn unix_timestamp(&self) -> i64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn unix_timestamp(&self) -> i64 {
        time::OffsetDateTime::now_utc().unix_timestamp()
    }
}

/// Always reports the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn unix_timestamp(&self) -> i64 {
        self.0
    }
}

pub fn encode(image: &RgbImage, format: OutputFormat, jpeg_quality: u8) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    match format {
        OutputFormat::Jpeg => image
            .write_with_encoder(JpegEncoder::new_with_quality(&mut bytes, jpeg_quality))
            .with_context(|| "failed to encode JPEG")?,
        OutputFormat::Png => image
            .write_with_encoder(PngEncoder::new(&mut bytes))
            .with_context(|| "failed to encode PNG")?,
    }
    Ok(bytes)
}

pub fn output_file_name(stem: &str, timestamp: i64, attempt: u32, ext: &str) -> String {
    if attempt == 0 {
        format!("{}_styled_{}.{}", stem, timestamp, ext)
    } else {
        format!("{}_styled_{}_{}.{}", stem, timestamp, attempt, ext)
    }
}

pub(crate) fn source_stem(path: &Path) -> String {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .map(str::trim)
        .filter(|stem| !stem.is_empty())
        .unwrap_or("image")
        .to_string()
}

/// Writes `bytes` into `dir` under the first free output name. The file only
/// appears under its final name once fully written.
pub fn persist(
    bytes: &[u8],
    dir: &Path,
    stem: &str,
    timestamp: i64,
    ext: &str,
) -> Result<(String, PathBuf)> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create output dir: {}", dir.display()))?;
    let mut tmp = tempfile::Builder::new()
        .prefix(".styled-")
        .suffix(".part")
        .tempfile_in(dir)
        .with_context(|| format!("failed to create output file in {}", dir.display()))?;
    tmp.write_all(bytes)
        .with_context(|| "failed to write output image")?;
    tmp.flush().with_context(|| "failed to write output image")?;

    for attempt in 0..MAX_NAME_ATTEMPTS {
        let name = output_file_name(stem, timestamp, attempt, ext);
        let dest = dir.join(&name);
        match tmp.persist_noclobber(&dest) {
            Ok(_) => return Ok((name, dest)),
            Err(err) if err.error.kind() == ErrorKind::AlreadyExists => tmp = err.file,
            Err(err) => {
                return Err(err.error)
                    .with_context(|| format!("failed to store output: {}", dest.display()));
            }
        }
    }
    Err(anyhow!(
        "no free output name for {} at {} in {}",
        stem,
        timestamp,
        dir.display()
    ))
}
