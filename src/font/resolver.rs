use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use tracing::{debug, info, warn};
use usvg::fontdb;

use super::remote::RemoteFontService;
use super::{BuiltinFont, FontHandle, OutlineFont, system};
use crate::settings::Settings;
use crate::style::FontWeight;

const CACHE_EXTENSIONS: [&str; 2] = ["ttf", "otf"];

/// Family and weight of a requested font. Runs of whitespace and
/// underscores in the family collapse to one space, so `Open Sans`,
/// `Open  Sans` and `Open_Sans` share a cache entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FontCacheKey {
    family: String,
    weight: FontWeight,
}

impl FontCacheKey {
    pub fn new(family: &str, weight: FontWeight) -> Self {
        let family = family
            .split(|c: char| c.is_whitespace() || c == '_')
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        Self { family, weight }
    }

    pub fn family(&self) -> &str {
        &self.family
    }

    pub fn weight(&self) -> FontWeight {
        self.weight
    }

    pub fn file_stem(&self) -> String {
        format!("{}_{}", self.family.replace(' ', "_"), self.weight.value())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FontSource {
    Cache(PathBuf),
    Remote(PathBuf),
    System(PathBuf),
    Builtin,
}

impl FontSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            FontSource::Cache(_) => "cache",
            FontSource::Remote(_) => "remote",
            FontSource::System(_) => "system",
            FontSource::Builtin => "builtin",
        }
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            FontSource::Cache(path) | FontSource::Remote(path) | FontSource::System(path) => {
                Some(path)
            }
            FontSource::Builtin => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResolvedFont {
    handle: FontHandle,
    source: FontSource,
}

impl ResolvedFont {
    fn outline(font: OutlineFont, source: FontSource) -> Self {
        Self {
            handle: FontHandle::Outline(font),
            source,
        }
    }

    fn builtin() -> Self {
        Self {
            handle: FontHandle::Builtin(BuiltinFont),
            source: FontSource::Builtin,
        }
    }

    pub fn handle(&self) -> &FontHandle {
        &self.handle
    }

    pub fn source(&self) -> &FontSource {
        &self.source
    }

    pub fn path(&self) -> Option<&Path> {
        self.source.path()
    }
}

/// Finds a usable font for a family and weight. Every lookup failure is a
/// miss; the built-in bitmap font is the last resort.
pub struct FontResolver {
    local: Arc<LocalFonts>,
    remote: Option<RemoteFontService>,
}

/// Fonts on disk: the download cache and the configured font directories.
/// Lookups read files, so they run on the blocking pool.
struct LocalFonts {
    cache_dir: PathBuf,
    font_dirs: Vec<PathBuf>,
    database: OnceLock<fontdb::Database>,
}

type LocalLookup = fn(&LocalFonts, &FontCacheKey) -> Option<ResolvedFont>;

impl FontResolver {
    pub fn new(settings: &Settings) -> Self {
        let remote = if settings.remote_fonts {
            match RemoteFontService::new(&settings.font_service_url, settings.font_fetch_timeout)
            {
                Ok(service) => Some(service),
                Err(err) => {
                    warn!("remote fonts disabled: {:#}", err);
                    None
                }
            }
        } else {
            None
        };
        Self {
            local: Arc::new(LocalFonts {
                cache_dir: settings.font_cache_dir.clone(),
                font_dirs: settings.font_dirs.clone(),
                database: OnceLock::new(),
            }),
            remote,
        }
    }

    pub async fn resolve(&self, key: &FontCacheKey) -> ResolvedFont {
        if let Some(resolved) = self.lookup_local(key, LocalFonts::find_cached).await {
            debug!(family = key.family(), weight = key.weight().value(), "font cache hit");
            return resolved;
        }

        if let Some(remote) = &self.remote {
            match remote.fetch(key, &self.local.cache_dir).await {
                Ok((path, font)) => {
                    info!(
                        family = key.family(),
                        weight = key.weight().value(),
                        path = %path.display(),
                        "downloaded font"
                    );
                    return ResolvedFont::outline(font, FontSource::Remote(path));
                }
                Err(err) => warn!(family = key.family(), "remote font lookup failed: {:#}", err),
            }
        }

        if let Some(resolved) = self.lookup_local(key, LocalFonts::find_installed).await {
            debug!(
                family = key.family(),
                path = ?resolved.path(),
                "using system font"
            );
            return resolved;
        }

        warn!(family = key.family(), "no font found; using built-in font");
        ResolvedFont::builtin()
    }

    async fn lookup_local(&self, key: &FontCacheKey, lookup: LocalLookup) -> Option<ResolvedFont> {
        let local = Arc::clone(&self.local);
        let key = key.clone();
        match tokio::task::spawn_blocking(move || lookup(local.as_ref(), &key)).await {
            Ok(found) => found,
            Err(err) => {
                warn!("font lookup task failed: {}", err);
                None
            }
        }
    }
}

impl LocalFonts {
    fn find_cached(&self, key: &FontCacheKey) -> Option<ResolvedFont> {
        let stem = key.file_stem();
        for ext in CACHE_EXTENSIONS {
            let path = self.cache_dir.join(format!("{}.{}", stem, ext));
            if !path.is_file() {
                continue;
            }
            match OutlineFont::from_path(&path) {
                Ok(font) => return Some(ResolvedFont::outline(font, FontSource::Cache(path))),
                Err(err) => warn!("ignoring cached font: {:#}", err),
            }
        }
        None
    }

    fn find_installed(&self, key: &FontCacheKey) -> Option<ResolvedFont> {
        let found = system::find_table_font(key.family(), key.weight(), &self.font_dirs)
            .or_else(|| {
                let db = self
                    .database
                    .get_or_init(|| system::load_database(&self.font_dirs));
                system::query_database(db, key.family(), key.weight())
            })
            .or_else(|| system::find_common_font(&self.font_dirs));
        found.map(|(path, font)| ResolvedFont::outline(font, FontSource::System(path)))
    }
}
