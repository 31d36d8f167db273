// # Shopping API Trait
//
// Defines the interface the coordinator uses to reach the ICA handla API.
//
// ## Implementations
//
// - `IcaApiAsync` in the `ica-api` crate: offloads a blocking HTTP client
// - Test doubles in `tests/common`
//
// ## Usage
//
// ```rust,ignore
// use ica_core::ShoppingApi;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let api = /* ShoppingApi implementation */;
//
//     let summaries = api.get_shopping_lists().await?;
//     for summary in summaries {
//         let list = api.get_shopping_list(&summary.offline_id).await?;
//         println!("{}: {} rows", list.title, list.rows.len());
//     }
//
//     Ok(())
// }
// ```

use async_trait::async_trait;

use crate::sync::SyncPayload;
use crate::types::{CommonArticle, Offer, ProductCategory, Recipe, ShoppingList, Store};

/// Trait for ICA API implementations
///
/// One method per remote resource. Every call is single-shot: no retries,
/// no caching, no scheduling. Failures are returned as-is and the
/// coordinator decides what to do with them.
///
/// # Thread Safety
///
/// Implementations must be thread-safe and usable across async tasks.
#[async_trait]
pub trait ShoppingApi: Send + Sync {
    /// Summaries of every list on the account
    ///
    /// Summaries may lack rows; fetch each one with
    /// [`get_shopping_list`](Self::get_shopping_list) for the full record.
    async fn get_shopping_lists(&self) -> Result<Vec<ShoppingList>, crate::Error>;

    /// Full list, rows included, addressed by offline id
    async fn get_shopping_list(&self, offline_id: &str) -> Result<ShoppingList, crate::Error>;

    /// A single store by id
    async fn get_store(&self, store_id: i64) -> Result<Store, crate::Error>;

    /// The user's favorite stores
    ///
    /// Resolves the favorites id list, then fetches each store individually.
    async fn get_favorite_stores(&self) -> Result<Vec<Store>, crate::Error>;

    /// Products the user buys often; empty when the account has none
    async fn get_favorite_products(&self) -> Result<Vec<CommonArticle>, crate::Error>;

    /// Offers at the given stores
    async fn get_offers(&self, store_ids: &[i64]) -> Result<Vec<Offer>, crate::Error>;

    /// Product categories as of the fixed sync-date cutoff
    async fn get_product_categories(&self) -> Result<Vec<ProductCategory>, crate::Error>;

    /// `count` random recipes
    async fn get_random_recipes(&self, count: u32) -> Result<Vec<Recipe>, crate::Error>;

    /// Create an empty list, then return it as re-fetched from the remote
    async fn create_shopping_list(
        &self,
        offline_id: &str,
        title: &str,
        comment: &str,
        store_sorting: bool,
    ) -> Result<ShoppingList, crate::Error>;

    /// Post one diff for the list with the given offline id
    ///
    /// Returns the remote's merge result verbatim.
    async fn sync_shopping_list(
        &self,
        offline_id: &str,
        payload: &SyncPayload,
    ) -> Result<serde_json::Value, crate::Error>;

    /// Delete a list
    ///
    /// Any failure, a missing list included, is returned as an error, so
    /// `Ok` always carries `true`.
    async fn delete_shopping_list(&self, offline_id: &str) -> Result<bool, crate::Error>;

    /// Name of the implementation (for logging/debugging)
    fn api_name(&self) -> &'static str;
}
