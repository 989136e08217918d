use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::CatalogError;

use super::model::{Catalog, Track};

#[derive(Deserialize)]
struct CatalogFile {
    #[serde(default)]
    tracks: Vec<Track>,
}

/// Catalog file loading.
///
/// The file format is TOML with one `[[tracks]]` table per entry. Relative
/// `url` and `artwork` locators are resolved against the file's directory.
impl Catalog {
    /// Read a catalog from a TOML file.
    pub fn from_toml_file(path: &Path) -> Result<Self, CatalogError> {
        let text = fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        let catalog = Self::from_toml_str(&text, base).map_err(|e| match e {
            CatalogError::Parse { source, .. } => CatalogError::Parse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })?;

        if catalog.is_empty() {
            return Err(CatalogError::Empty(path.to_path_buf()));
        }
        tracing::info!(path = %path.display(), tracks = catalog.len(), "loaded catalog file");
        Ok(catalog)
    }

    /// Parse catalog TOML, resolving relative locators against `base`.
    pub fn from_toml_str(text: &str, base: &Path) -> Result<Self, CatalogError> {
        let file: CatalogFile = toml::from_str(text).map_err(|source| CatalogError::Parse {
            path: base.to_path_buf(),
            source,
        })?;

        let tracks = file
            .tracks
            .into_iter()
            .map(|mut t| {
                t.url = resolve_locator(&t.url, base);
                t.artwork = resolve_locator(&t.artwork, base);
                t
            })
            .collect();
        Self::new(tracks)
    }
}

/// Anchor a relative filesystem locator at `base`; URLs and absolute paths
/// pass through unchanged.
pub(super) fn resolve_locator(locator: &str, base: &Path) -> String {
    let trimmed = locator.trim();
    if trimmed.is_empty() || trimmed.contains("://") {
        return trimmed.to_string();
    }
    let p = Path::new(trimmed);
    if p.is_absolute() || base.as_os_str().is_empty() {
        trimmed.to_string()
    } else {
        base.join(p).to_string_lossy().into_owned()
    }
}
