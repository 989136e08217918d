use std::fmt;
use std::path::{Path, PathBuf};

use crate::catalog::{self, Catalog};
use crate::config::CatalogSettings;
use crate::error::CatalogError;

/// Where the catalog is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogSource {
    /// A TOML file of `[[tracks]]` tables.
    File(PathBuf),
    /// A music directory to scan.
    Directory(PathBuf),
}

impl CatalogSource {
    /// Pick the source from the command line argument, then `catalog.path`,
    /// then the current directory.
    pub fn resolve(arg: Option<PathBuf>, settings: &CatalogSettings) -> Self {
        let path = arg
            .or_else(|| settings.path.clone())
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."));

        if is_catalog_file(&path) {
            Self::File(path)
        } else {
            Self::Directory(path)
        }
    }

    pub fn load(&self, settings: &CatalogSettings) -> Result<Catalog, CatalogError> {
        match self {
            Self::File(path) => Catalog::from_toml_file(path),
            Self::Directory(dir) => Catalog::new(catalog::scan(dir, settings)),
        }
    }
}

impl fmt::Display for CatalogSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(p) | Self::Directory(p) => write!(f, "{}", p.display()),
        }
    }
}

fn is_catalog_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("toml"))
        && !path.is_dir()
}
