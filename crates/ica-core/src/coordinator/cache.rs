//! Reference-data cache owned by the coordinator
//!
//! Each slot starts empty and is populated exactly once, on the first
//! successful fetch. A failed fetch leaves the slot empty so the next
//! accessor call tries again. Only the shopping-list slot is ever replaced,
//! and only by a refresh.

use std::future::Future;

use crate::types::{CommonArticle, Offer, ProductCategory, Recipe, ShoppingList, Store};

#[derive(Debug, Default)]
pub(crate) struct ReferenceCache {
    pub(crate) stores: Option<Vec<Store>>,
    pub(crate) favorite_products: Option<Vec<CommonArticle>>,
    pub(crate) product_categories: Option<Vec<ProductCategory>>,
    pub(crate) offers: Option<Vec<Offer>>,
    pub(crate) recipes: Option<Vec<Recipe>>,
    pub(crate) shopping_lists: Option<Vec<ShoppingList>>,
}

/// Return the slot's value, running `fetch` only if the slot is empty
pub(crate) async fn fetch_if_absent<T, F, Fut>(
    slot: &mut Option<T>,
    fetch: F,
) -> crate::Result<&T>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = crate::Result<T>>,
{
    let value = match slot.take() {
        Some(value) => value,
        None => fetch().await?,
    };
    Ok(&*slot.insert(value))
}
