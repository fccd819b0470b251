//! Seed the product catalog from a JSON file.
//!
//! The file holds an array of products in the same shape accepted by
//! `POST /api/products`. Every entry is validated before anything is written;
//! products whose code is already taken are skipped so seeding can be re-run.

use std::path::Path;

use tracing::{error, info};

use mercado_core::{NewProduct, ProductDraft};
use mercado_storefront::db::{ProductRepository, RepositoryError, Storage};

use super::load_config;
use crate::StorageKind;

/// Outcome of a seeding run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub created: usize,
    pub skipped: usize,
}

/// Seed products from a JSON file.
///
/// # Arguments
///
/// * `file_path` - Path to a JSON array of products
/// * `storage` - Backend override; `STOREFRONT_STORAGE` otherwise
///
/// # Errors
///
/// Returns an error if the file cannot be read, any entry is invalid, or
/// storage fails.
pub async fn products(
    file_path: &Path,
    storage: Option<StorageKind>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(storage)?;

    if !file_path.exists() {
        return Err(format!("File not found: {}", file_path.display()).into());
    }

    info!(path = %file_path.display(), "Loading products from file");

    // Read and validate before touching storage
    let content = tokio::fs::read_to_string(file_path).await?;
    let drafts = parse(&content)?;

    info!(products = drafts.len(), backend = config.storage.kind(), "Parsed seed file");

    let store = Storage::from_config(&config.storage).await?;
    let report = seed(store.products.as_ref(), drafts).await?;

    info!(
        created = report.created,
        skipped = report.skipped,
        "Seeding complete"
    );
    Ok(())
}

/// Parse and validate every entry of a seed file.
///
/// # Errors
///
/// Returns a message listing each invalid entry by position.
pub fn parse(content: &str) -> Result<Vec<ProductDraft>, Box<dyn std::error::Error>> {
    let entries: Vec<NewProduct> = serde_json::from_str(content)?;

    let mut drafts = Vec::with_capacity(entries.len());
    let mut errors = Vec::new();
    for (index, entry) in entries.into_iter().enumerate() {
        match entry.validate() {
            Ok(draft) => drafts.push(draft),
            Err(e) => errors.push(format!("entry {index}: {e}")),
        }
    }

    if errors.is_empty() {
        Ok(drafts)
    } else {
        error!("Seed file validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        Err(format!("{} validation errors found", errors.len()).into())
    }
}

/// Create each product, skipping codes that already exist.
///
/// # Errors
///
/// Returns `RepositoryError` for any failure other than a taken code.
pub async fn seed(
    repo: &dyn ProductRepository,
    drafts: Vec<ProductDraft>,
) -> Result<SeedReport, RepositoryError> {
    let mut report = SeedReport::default();

    for draft in drafts {
        let code = draft.code.clone();
        match repo.create(draft).await {
            Ok(product) => {
                info!(product_id = %product.id, %code, "Created product");
                report.created += 1;
            }
            Err(RepositoryError::Conflict(_)) => {
                info!(%code, "Skipping existing product code");
                report.skipped += 1;
            }
            Err(e) => return Err(e),
        }
    }

    Ok(report)
}
