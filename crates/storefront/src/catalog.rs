//! Product catalog loading.
//!
//! Products are read from `products.json` in the content directory once at
//! startup and held in memory for the life of the process.

use std::path::Path;

use amadasun_core::{Catalog, CatalogError};
use thiserror::Error;

/// Errors loading the catalog file.
#[derive(Debug, Error)]
pub enum CatalogLoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error(transparent)]
    Invalid(#[from] CatalogError),
}

/// Load the catalog from a JSON file.
///
/// A missing file yields an empty catalog. Products that break their
/// invariants are logged and skipped.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_catalog(path: &Path) -> Result<Catalog, CatalogLoadError> {
    if !path.exists() {
        tracing::warn!("Catalog file does not exist: {:?}", path);
        return Ok(Catalog::default());
    }

    let json = std::fs::read_to_string(path).map_err(|source| CatalogLoadError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let (catalog, rejected) = Catalog::from_json(&json)?;
    for error in &rejected {
        tracing::error!(error = %error, "Skipping invalid product");
    }
    tracing::info!(
        products = catalog.len(),
        skipped = rejected.len(),
        "Loaded catalog from {:?}",
        path
    );

    Ok(catalog)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn seed_path() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("content/products.json")
    }

    #[test]
    fn test_seed_catalog_is_valid() {
        let json = std::fs::read_to_string(seed_path()).unwrap();
        let (catalog, rejected) = Catalog::from_json(&json).unwrap();
        assert!(rejected.is_empty(), "{rejected:?}");
        assert!(catalog.len() >= 3);
    }

    #[test]
    fn test_missing_file_is_empty_catalog() {
        let catalog = load_catalog(Path::new("/nonexistent/products.json")).unwrap();
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_load_seed() {
        let catalog = load_catalog(&seed_path()).unwrap();
        assert!(!catalog.is_empty());
    }
}
