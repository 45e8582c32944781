use std::path::PathBuf;
use tracing::debug;
use usvg::fontdb;

use super::OutlineFont;
use crate::style::FontWeight;

struct FamilyFiles {
    family: &'static str,
    regular: &'static str,
    bold: &'static str,
}

const FAMILY_TABLE: &[FamilyFiles] = &[
    FamilyFiles {
        family: "Arial",
        regular: "arial.ttf",
        bold: "arialbd.ttf",
    },
    FamilyFiles {
        family: "Times New Roman",
        regular: "times.ttf",
        bold: "timesbd.ttf",
    },
    FamilyFiles {
        family: "Courier New",
        regular: "cour.ttf",
        bold: "courbd.ttf",
    },
    FamilyFiles {
        family: "Verdana",
        regular: "verdana.ttf",
        bold: "verdanab.ttf",
    },
    FamilyFiles {
        family: "Georgia",
        regular: "georgia.ttf",
        bold: "georgiab.ttf",
    },
    FamilyFiles {
        family: "DejaVu Sans",
        regular: "DejaVuSans.ttf",
        bold: "DejaVuSans-Bold.ttf",
    },
    FamilyFiles {
        family: "Liberation Sans",
        regular: "LiberationSans-Regular.ttf",
        bold: "LiberationSans-Bold.ttf",
    },
];

/// Tried in order when the requested family is unknown everywhere.
const COMMON_FONT_FILES: &[&str] = &[
    "arial.ttf",
    "arialbd.ttf",
    "times.ttf",
    "cour.ttf",
    "verdana.ttf",
    "georgia.ttf",
    "DejaVuSans.ttf",
];

/// File names to try for `family`, most specific first. Bold-or-heavier
/// weights fall back to the regular file when the bold one is missing.
pub(crate) fn table_candidates(family: &str, weight: FontWeight) -> Vec<&'static str> {
    let Some(entry) = FAMILY_TABLE
        .iter()
        .find(|entry| entry.family.eq_ignore_ascii_case(family))
    else {
        return Vec::new();
    };
    if weight.is_bold() {
        vec![entry.bold, entry.regular]
    } else {
        vec![entry.regular]
    }
}

pub(crate) fn find_table_font(
    family: &str,
    weight: FontWeight,
    dirs: &[PathBuf],
) -> Option<(PathBuf, OutlineFont)> {
    let candidates = table_candidates(family, weight);
    find_first_loadable(&candidates, dirs)
}

pub(crate) fn find_common_font(dirs: &[PathBuf]) -> Option<(PathBuf, OutlineFont)> {
    find_first_loadable(COMMON_FONT_FILES, dirs)
}

fn find_first_loadable(files: &[&str], dirs: &[PathBuf]) -> Option<(PathBuf, OutlineFont)> {
    for file in files {
        for dir in dirs {
            let path = dir.join(file);
            if !path.is_file() {
                continue;
            }
            match OutlineFont::from_path(&path) {
                Ok(font) => return Some((path, font)),
                Err(err) => debug!("skipping unreadable font {}: {}", path.display(), err),
            }
        }
    }
    None
}

/// Indexes every font below the configured directories (recursively).
pub(crate) fn load_database(dirs: &[PathBuf]) -> fontdb::Database {
    let mut db = fontdb::Database::new();
    for dir in dirs.iter().filter(|dir| dir.is_dir()) {
        db.load_fonts_dir(dir);
    }
    debug!(faces = db.len(), "indexed font directories");
    db
}

pub(crate) fn query_database(
    db: &fontdb::Database,
    family: &str,
    weight: FontWeight,
) -> Option<(PathBuf, OutlineFont)> {
    let families = [fontdb::Family::Name(family)];
    let query = fontdb::Query {
        families: &families,
        weight: fontdb::Weight(weight.value()),
        ..Default::default()
    };
    let id = db.query(&query)?;
    let path = match &db.face(id)?.source {
        fontdb::Source::File(path) => path.clone(),
        _ => return None,
    };
    let (data, index) = db.with_face_data(id, |data, index| (data.to_vec(), index))?;
    match OutlineFont::from_data(data, index) {
        Ok(font) => Some((path, font)),
        Err(err) => {
            debug!("skipping unreadable font {}: {}", path.display(), err);
            None
        }
    }
}
