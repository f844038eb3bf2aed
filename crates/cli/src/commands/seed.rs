//! Seed the catalogue with demo products.
//!
//! Products are created through the same service as `POST /api/products`,
//! so every opening stock level has a matching `initial` movement.

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

use ksurplus_server::db::ProductRepository;
use ksurplus_server::models::CreateProductInput;
use ksurplus_server::realtime::Broadcaster;
use ksurplus_server::services::ProductService;

use super::{CliError, connect};

/// Top-level layout of the seed file.
#[derive(Debug, Deserialize)]
struct SeedFile {
    products: Vec<CreateProductInput>,
}

/// Create the products listed in `file_path`.
///
/// Products whose name matches an active product are skipped unless
/// `allow_duplicates` is set.
///
/// # Errors
///
/// Returns `CliError` if the file cannot be read or parsed, or a product
/// fails validation or cannot be inserted.
pub async fn products(file_path: &str, allow_duplicates: bool) -> Result<(), CliError> {
    let path = Path::new(file_path);
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| CliError::Io {
            path: file_path.to_string(),
            source,
        })?;
    let seed: SeedFile = serde_yaml::from_str(&content)?;
    for product in &seed.products {
        product.validate()?;
    }
    info!(path = %file_path, products = seed.products.len(), "Parsed seed file");

    let pool = connect().await?;

    let existing: HashSet<String> = ProductRepository::new(&pool)
        .list_active()
        .await?
        .into_iter()
        .map(|p| p.name)
        .collect();

    // Nobody is listening; the service still needs somewhere to announce
    let events = Broadcaster::new(1);
    let service = ProductService::new(&pool, &events);

    let mut created = 0_usize;
    let mut skipped = 0_usize;
    for product in seed.products {
        if !allow_duplicates && existing.contains(product.name.trim()) {
            warn!(name = %product.name, "Product exists, skipping");
            skipped += 1;
            continue;
        }
        let product = service.create(product).await?;
        info!(
            product_id = %product.id,
            sku = %product.sku,
            stock = product.stock_quantity,
            "Product created"
        );
        created += 1;
    }

    info!(created, skipped, "Seeding complete!");
    Ok(())
}
