//! Catalog Reader - resolves active product definitions.
//!
//! Products are read fresh on every call and treated as immutable during a
//! single allocation decision. Column derivations (legacy `mode` fallback,
//! fulfillment defaults) live in [`Product::from_record`].

use crate::{
    entities::Product,
    errors::{Error, Result},
    store::{TableStore, tables},
};

/// All products with `active` set, in table row order.
pub async fn list_active_products<S: TableStore>(store: &S) -> Result<Vec<Product>> {
    let table = store.get_table(tables::PRODUCTS).await?;
    Ok(table
        .records()
        .map(|(_, rec)| Product::from_record(&rec))
        .filter(|p| p.active)
        .collect())
}

/// The active product with the given id.
///
/// # Errors
/// `ProductNotFound` when the id is absent or the product is inactive;
/// an inactive product must never receive new allocations.
pub async fn find_product_by_id<S: TableStore>(store: &S, product_id: &str) -> Result<Product> {
    list_active_products(store)
        .await?
        .into_iter()
        .find(|p| p.product_id == product_id)
        .ok_or_else(|| Error::ProductNotFound {
            product_id: product_id.to_string(),
        })
}
