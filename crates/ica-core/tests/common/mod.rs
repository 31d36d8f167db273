//! Test doubles and common utilities for coordinator contract tests
//!
//! `MockShoppingApi` keeps an in-memory remote that applies sync payloads
//! the way the ICA API merges them, and counts every call.

use ica_core::error::{Error, Result};
use ica_core::types::{
    CommonArticle, Offer, ProductCategory, Recipe, ShoppingList, ShoppingListEntry, Store,
};
use ica_core::{Credentials, IcaConfig, ShoppingApi, SyncPayload};
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Call counters shared between clones of a mock
#[derive(Default)]
pub struct CallCounts {
    pub lists: AtomicUsize,
    pub list: AtomicUsize,
    pub stores: AtomicUsize,
    pub favorite_products: AtomicUsize,
    pub offers: AtomicUsize,
    pub categories: AtomicUsize,
    pub recipes: AtomicUsize,
    pub sync: AtomicUsize,
    pub create: AtomicUsize,
    pub delete: AtomicUsize,
}

impl CallCounts {
    pub fn get(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

/// An in-memory ICA remote
pub struct MockShoppingApi {
    lists: Arc<Mutex<Vec<ShoppingList>>>,
    calls: Arc<CallCounts>,
    /// Every sync body, serialized as it would go on the wire
    synced: Arc<Mutex<Vec<serde_json::Value>>>,
    /// Store ids passed to get_offers
    offer_store_ids: Arc<Mutex<Vec<Vec<i64>>>>,
    /// When set, every read fails with HTTP 503
    fail_reads: Arc<AtomicBool>,
    next_id: Arc<AtomicI64>,
}

impl MockShoppingApi {
    pub fn new() -> Self {
        Self {
            lists: Arc::new(Mutex::new(Vec::new())),
            calls: Arc::new(CallCounts::default()),
            synced: Arc::new(Mutex::new(Vec::new())),
            offer_store_ids: Arc::new(Mutex::new(Vec::new())),
            fail_reads: Arc::new(AtomicBool::new(false)),
            next_id: Arc::new(AtomicI64::new(1000)),
        }
    }

    /// A remote holding one list per `(id, title, rows)`
    pub fn with_lists(lists: Vec<ShoppingList>) -> Self {
        let api = Self::new();
        *api.lists.lock().unwrap() = lists;
        api
    }

    /// Create a new MockShoppingApi that shares state and counters with an existing one
    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            lists: Arc::clone(&other.lists),
            calls: Arc::clone(&other.calls),
            synced: Arc::clone(&other.synced),
            offer_store_ids: Arc::clone(&other.offer_store_ids),
            fail_reads: Arc::clone(&other.fail_reads),
            next_id: Arc::clone(&other.next_id),
        }
    }

    pub fn calls(&self) -> &CallCounts {
        &self.calls
    }

    pub fn synced(&self) -> Vec<serde_json::Value> {
        self.synced.lock().unwrap().clone()
    }

    pub fn offer_store_ids(&self) -> Vec<Vec<i64>> {
        self.offer_store_ids.lock().unwrap().clone()
    }

    pub fn remote_list(&self, list_id: i64) -> Option<ShoppingList> {
        self.lists
            .lock()
            .unwrap()
            .iter()
            .find(|list| list.id == list_id)
            .cloned()
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    fn check_reads(&self) -> Result<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(Error::http_status(503, "Service Unavailable"));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl ShoppingApi for MockShoppingApi {
    async fn get_shopping_lists(&self) -> Result<Vec<ShoppingList>> {
        self.calls.lists.fetch_add(1, Ordering::SeqCst);
        self.check_reads()?;

        // Summaries carry no rows
        Ok(self
            .lists
            .lock()
            .unwrap()
            .iter()
            .map(|list| ShoppingList {
                rows: Vec::new(),
                ..list.clone()
            })
            .collect())
    }

    async fn get_shopping_list(&self, offline_id: &str) -> Result<ShoppingList> {
        self.calls.list.fetch_add(1, Ordering::SeqCst);
        self.check_reads()?;

        self.lists
            .lock()
            .unwrap()
            .iter()
            .find(|list| list.offline_id == offline_id)
            .cloned()
            .ok_or_else(|| Error::http_status(404, "Not Found"))
    }

    async fn get_store(&self, store_id: i64) -> Result<Store> {
        self.check_reads()?;
        Ok(Store {
            id: store_id,
            marketing_name: Some(format!("ICA {}", store_id)),
            ..Default::default()
        })
    }

    async fn get_favorite_stores(&self) -> Result<Vec<Store>> {
        self.calls.stores.fetch_add(1, Ordering::SeqCst);
        let mut stores = Vec::new();
        for id in [11, 22] {
            stores.push(self.get_store(id).await?);
        }
        Ok(stores)
    }

    async fn get_favorite_products(&self) -> Result<Vec<CommonArticle>> {
        self.calls.favorite_products.fetch_add(1, Ordering::SeqCst);
        self.check_reads()?;

        Ok(["Kaffe", "Välling"]
            .iter()
            .enumerate()
            .map(|(i, name)| CommonArticle {
                id: Some(i as i64 + 1),
                product_name: Some(name.to_string()),
                article_group_id: Some(9),
                ..Default::default()
            })
            .collect())
    }

    async fn get_offers(&self, store_ids: &[i64]) -> Result<Vec<Offer>> {
        self.calls.offers.fetch_add(1, Ordering::SeqCst);
        self.check_reads()?;
        self.offer_store_ids.lock().unwrap().push(store_ids.to_vec());

        Ok(store_ids
            .iter()
            .map(|id| Offer {
                offer_id: Some(format!("offer-{}", id)),
                store_id: Some(*id),
                ..Default::default()
            })
            .collect())
    }

    async fn get_product_categories(&self) -> Result<Vec<ProductCategory>> {
        self.calls.categories.fetch_add(1, Ordering::SeqCst);
        self.check_reads()?;
        Ok(vec![ProductCategory {
            id: 9,
            name: Some("Mejeri".to_string()),
            ..Default::default()
        }])
    }

    async fn get_random_recipes(&self, count: u32) -> Result<Vec<Recipe>> {
        self.calls.recipes.fetch_add(1, Ordering::SeqCst);
        self.check_reads()?;
        Ok((0..i64::from(count))
            .map(|id| Recipe {
                id,
                ..Default::default()
            })
            .collect())
    }

    async fn create_shopping_list(
        &self,
        offline_id: &str,
        title: &str,
        comment: &str,
        store_sorting: bool,
    ) -> Result<ShoppingList> {
        self.calls.create.fetch_add(1, Ordering::SeqCst);

        let list = ShoppingList {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            offline_id: offline_id.to_string(),
            title: title.to_string(),
            comment_text: Some(comment.to_string()),
            sorting_store: i32::from(store_sorting),
            ..Default::default()
        };
        self.lists.lock().unwrap().push(list.clone());
        Ok(list)
    }

    async fn sync_shopping_list(
        &self,
        offline_id: &str,
        payload: &SyncPayload,
    ) -> Result<serde_json::Value> {
        self.calls.sync.fetch_add(1, Ordering::SeqCst);
        self.synced
            .lock()
            .unwrap()
            .push(serde_json::to_value(payload)?);

        let mut lists = self.lists.lock().unwrap();
        let list = lists
            .iter_mut()
            .find(|list| list.offline_id == offline_id)
            .ok_or_else(|| Error::http_status(404, "Not Found"))?;

        match payload {
            SyncPayload::Created { rows } => {
                for row in rows {
                    list.rows.push(ShoppingListEntry {
                        row_id: Some(self.next_id.fetch_add(1, Ordering::SeqCst)),
                        offline_id: Some(row.offline_id.clone()),
                        product_name: row.product_name.clone(),
                        source_id: Some(row.source_id),
                        is_striked_over: row.is_striked_over,
                        article_group_id: Some(row.article_group_id),
                        ..Default::default()
                    });
                }
            }
            SyncPayload::Changed { rows } => {
                for change in rows {
                    if let Some(row) = list
                        .rows
                        .iter_mut()
                        .find(|row| row.offline_id.as_deref() == Some(change.offline_id.as_str()))
                    {
                        row.is_striked_over = change.is_striked_over;
                    }
                }
            }
            SyncPayload::Deleted { offline_ids } => {
                list.rows.retain(|row| {
                    !row
                        .offline_id
                        .as_ref()
                        .is_some_and(|id| offline_ids.contains(id))
                });
            }
            SyncPayload::FullReplace(record) => {
                list.title = record.title.clone();
                list.latest_change = record.latest_change.clone();
            }
        }

        Ok(serde_json::json!({"Id": list.id, "Rows": list.rows.len()}))
    }

    async fn delete_shopping_list(&self, offline_id: &str) -> Result<bool> {
        self.calls.delete.fetch_add(1, Ordering::SeqCst);
        let mut lists = self.lists.lock().unwrap();
        let before = lists.len();
        lists.retain(|list| list.offline_id != offline_id);
        if lists.len() == before {
            return Err(Error::http_status(404, "Not Found"));
        }
        Ok(true)
    }

    fn api_name(&self) -> &'static str {
        "mock"
    }
}

/// A list with the given rows as `(offline_id, name, checked)`
pub fn list(id: i64, title: &str, rows: &[(&str, &str, bool)]) -> ShoppingList {
    ShoppingList {
        id,
        offline_id: format!("list-{}", id),
        title: title.to_string(),
        rows: rows
            .iter()
            .enumerate()
            .map(|(i, (offline_id, name, checked))| ShoppingListEntry {
                row_id: Some(i as i64 + 1),
                offline_id: Some(offline_id.to_string()),
                product_name: name.to_string(),
                is_striked_over: *checked,
                ..Default::default()
            })
            .collect(),
        ..Default::default()
    }
}

/// Create a minimal config for testing
pub fn minimal_config() -> IcaConfig {
    let mut config = IcaConfig::new(Credentials::new("199001011234", "1234"));
    config.recipe_count = 3;
    config
}
