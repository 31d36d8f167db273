//! Shopping-list coordinator
//!
//! The coordinator is responsible for:
//! - Holding the single authoritative snapshot of the account's lists
//! - Refreshing that snapshot on a fixed interval and after every mutation
//! - Fetching reference data (stores, favorite products, categories, offers,
//!   recipes) lazily, at most once per coordinator lifetime
//! - Staging row-level diffs and syncing them to the remote
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │ ShoppingListTodo │─── stage / sync / refresh ───┐
//! └──────────────────┘                              │
//!                                                   ▼
//!                                  ┌───────────────────────────┐
//!                                  │ ShoppingListCoordinator   │
//!                                  └───────────────────────────┘
//!                                                   │
//!         ┌─────────────────────────────────────────┼───────────────────┐
//!         │                                         │                   │
//!         ▼                                         ▼                   ▼
//! ┌────────────────┐                       ┌──────────────┐      ┌─────────────┐
//! │ ReferenceCache │                       │ ShoppingApi  │      │   Events    │
//! │ (fetch once)   │                       │ (remote)     │      │  (notify)   │
//! └────────────────┘                       └──────────────┘      └─────────────┘
//! ```
//!
//! ## Mutation Flow
//!
//! 1. Look up the cached list
//! 2. Stage one created, changed or deleted row set
//! 3. Stamp `LatestChange` and sync the selected payload
//! 4. Refresh; no row is durable until the remote returns it

pub mod article_group;
mod cache;

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::config::IcaConfig;
use crate::error::{Error, Result};
use crate::sync::{ChangedRow, NewRow, StagedRows, SyncPayload};
use crate::traits::ShoppingApi;
use crate::types::{
    latest_change_now, CommonArticle, Offer, ProductCategory, Recipe, ShoppingList, Store,
};

use cache::{fetch_if_absent, ReferenceCache};

/// Events emitted by the coordinator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoordinatorEvent {
    /// A refresh replaced the list snapshot
    Refreshed {
        lists_count: usize,
    },

    /// A refresh failed; the previous snapshot is still served
    RefreshFailed {
        error: String,
    },

    /// A diff was accepted by the remote
    Synced {
        list_id: i64,
        payload: &'static str,
    },

    /// A list was created on the remote
    ListCreated {
        offline_id: String,
    },

    /// A list was deleted on the remote
    ListDeleted {
        offline_id: String,
    },
}

/// Coordinator for the ICA shopping lists of one account
///
/// ## Threading
///
/// Every operation takes `&mut self`; one task owns the coordinator and
/// serializes refreshes and mutations, so the reference cache needs no
/// lock.
pub struct ShoppingListCoordinator {
    /// Remote API
    api: Box<dyn ShoppingApi>,

    /// Reference data and the list snapshot
    cache: ReferenceCache,

    /// Diffs staged per list id, drained by each sync
    staged: HashMap<i64, StagedRows>,

    /// Number of random recipes to fetch
    recipe_count: u32,

    /// Interval between scheduled refreshes
    update_interval: Duration,

    /// Whether the most recent refresh succeeded
    last_update_success: bool,

    /// When the snapshot was last replaced
    last_refreshed: Option<DateTime<Utc>>,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<CoordinatorEvent>,
}

impl ShoppingListCoordinator {
    /// Create a new coordinator
    ///
    /// No remote call is made; the snapshot is empty until the first
    /// [`refresh`](Self::refresh).
    ///
    /// # Returns
    ///
    /// A tuple of (coordinator, event_receiver) where event_receiver yields
    /// coordinator events
    pub fn new(
        api: Box<dyn ShoppingApi>,
        config: &IcaConfig,
    ) -> Result<(Self, mpsc::Receiver<CoordinatorEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.coordinator.event_channel_capacity);

        let coordinator = Self {
            api,
            cache: ReferenceCache::default(),
            staged: HashMap::new(),
            recipe_count: config.recipe_count,
            update_interval: config.coordinator.update_interval(),
            last_update_success: false,
            last_refreshed: None,
            event_tx: tx,
        };

        Ok((coordinator, rx))
    }

    /// The remote API
    pub fn api(&self) -> &dyn ShoppingApi {
        self.api.as_ref()
    }

    /// Interval between scheduled refreshes
    pub fn update_interval(&self) -> Duration {
        self.update_interval
    }

    /// Whether the most recent refresh succeeded
    pub fn last_update_success(&self) -> bool {
        self.last_update_success
    }

    /// When the snapshot was last replaced by a successful refresh
    pub fn last_refreshed(&self) -> Option<DateTime<Utc>> {
        self.last_refreshed
    }

    /// The cached lists, empty before the first successful fetch
    pub fn shopping_lists(&self) -> &[ShoppingList] {
        self.cache.shopping_lists.as_deref().unwrap_or_default()
    }

    /// Re-fetch every list and replace the snapshot wholesale
    ///
    /// A failure leaves the previous snapshot in place and is returned as
    /// [`Error::UpdateFailed`].
    pub async fn refresh(&mut self) -> Result<()> {
        match fetch_all_lists(self.api.as_ref()).await {
            Ok(lists) => {
                debug!("Refreshed {} shopping list(s)", lists.len());
                self.emit_event(CoordinatorEvent::Refreshed {
                    lists_count: lists.len(),
                });
                self.cache.shopping_lists = Some(lists);
                self.last_update_success = true;
                self.last_refreshed = Some(Utc::now());
                Ok(())
            }
            Err(e) => {
                error!("Error communicating with API: {}", e);
                self.last_update_success = false;
                self.emit_event(CoordinatorEvent::RefreshFailed {
                    error: e.to_string(),
                });
                Err(Error::update_failed(&e))
            }
        }
    }

    /// Refresh, logging instead of returning a failure
    ///
    /// Used after mutations; the next scheduled tick retries.
    pub async fn request_refresh(&mut self) {
        if let Err(e) = self.refresh().await {
            warn!("Refresh after mutation failed: {}", e);
        }
    }

    /// The cached list with the given id, without fetching
    pub fn get_shopping_list(&self, list_id: i64) -> Option<&ShoppingList> {
        self.shopping_lists().iter().find(|list| list.id == list_id)
    }

    /// Article group for a new row with this product name
    pub fn get_article_group(&self, product_name: &str) -> i64 {
        article_group::lookup(product_name)
    }

    /// Lists, fetched only if no snapshot exists yet
    pub async fn get_shopping_lists(&mut self) -> Result<&[ShoppingList]> {
        let api = self.api.as_ref();
        fetch_if_absent(&mut self.cache.shopping_lists, || fetch_all_lists(api))
            .await
            .map(Vec::as_slice)
    }

    /// Favorite stores, fetched at most once
    pub async fn get_stores(&mut self) -> Result<&[Store]> {
        let api = self.api.as_ref();
        fetch_if_absent(&mut self.cache.stores, || api.get_favorite_stores())
            .await
            .map(Vec::as_slice)
    }

    /// Frequently bought products, fetched at most once
    pub async fn get_favorite_products(&mut self) -> Result<&[CommonArticle]> {
        let api = self.api.as_ref();
        fetch_if_absent(&mut self.cache.favorite_products, || {
            api.get_favorite_products()
        })
        .await
        .map(Vec::as_slice)
    }

    /// Product categories, fetched at most once
    pub async fn get_product_categories(&mut self) -> Result<&[ProductCategory]> {
        let api = self.api.as_ref();
        fetch_if_absent(&mut self.cache.product_categories, || {
            api.get_product_categories()
        })
        .await
        .map(Vec::as_slice)
    }

    /// Offers at the favorite stores, fetched at most once
    pub async fn get_offers(&mut self) -> Result<&[Offer]> {
        let store_ids: Vec<i64> = self.get_stores().await?.iter().map(|s| s.id).collect();

        let api = self.api.as_ref();
        fetch_if_absent(&mut self.cache.offers, || async move {
            api.get_offers(&store_ids).await
        })
        .await
        .map(Vec::as_slice)
    }

    /// Random recipes, fetched at most once
    pub async fn get_recipes(&mut self) -> Result<&[Recipe]> {
        let api = self.api.as_ref();
        let count = self.recipe_count;
        fetch_if_absent(&mut self.cache.recipes, || api.get_random_recipes(count))
            .await
            .map(Vec::as_slice)
    }

    /// Stage a new row on a cached list
    ///
    /// # Returns
    ///
    /// The offline id generated for the row
    pub fn stage_created(&mut self, list_id: i64, row: NewRow) -> Result<String> {
        self.ensure_cached(list_id)?;
        let offline_id = row.offline_id.clone();
        self.staged.entry(list_id).or_default().stage_created(row);
        Ok(offline_id)
    }

    /// Stage a checked-state change on a cached list
    pub fn stage_changed(&mut self, list_id: i64, row: ChangedRow) -> Result<()> {
        self.ensure_cached(list_id)?;
        self.staged.entry(list_id).or_default().stage_changed(row);
        Ok(())
    }

    /// Stage row deletions on a cached list
    pub fn stage_deleted(&mut self, list_id: i64, offline_ids: &[String]) -> Result<()> {
        self.ensure_cached(list_id)?;
        self.staged
            .entry(list_id)
            .or_default()
            .stage_deleted(offline_ids.iter().cloned());
        Ok(())
    }

    /// Diffs currently staged for a list
    pub fn staged(&self, list_id: i64) -> Option<&StagedRows> {
        self.staged.get(&list_id)
    }

    /// Stamp `LatestChange`, drain the staged diff and post it
    ///
    /// With nothing staged the whole record is sent. Staging is cleared
    /// whether or not the remote accepts the payload.
    ///
    /// # Returns
    ///
    /// The remote's merge result
    pub async fn sync_list(&mut self, list_id: i64) -> Result<serde_json::Value> {
        let staged = self.staged.remove(&list_id).unwrap_or_default();

        let list = self
            .cache
            .shopping_lists
            .as_mut()
            .and_then(|lists| lists.iter_mut().find(|list| list.id == list_id))
            .ok_or_else(|| Error::not_found(format!("Shopping list {} is not cached", list_id)))?;

        list.latest_change = Some(latest_change_now());
        let payload = SyncPayload::select(list, staged);
        let offline_id = list.offline_id.clone();

        debug!(
            "Syncing list {} ({}) with {}",
            list_id,
            offline_id,
            payload.kind()
        );
        let result = self.api.sync_shopping_list(&offline_id, &payload).await?;

        self.emit_event(CoordinatorEvent::Synced {
            list_id,
            payload: payload.kind(),
        });
        Ok(result)
    }

    /// Create an empty list on the remote and refresh
    ///
    /// # Returns
    ///
    /// The created list as re-fetched from the remote
    pub async fn create_list(
        &mut self,
        title: &str,
        comment: &str,
        store_sorting: bool,
    ) -> Result<ShoppingList> {
        let offline_id = uuid::Uuid::new_v4().to_string();
        let list = self
            .api
            .create_shopping_list(&offline_id, title, comment, store_sorting)
            .await?;

        info!("Created shopping list '{}' ({})", title, offline_id);
        self.emit_event(CoordinatorEvent::ListCreated { offline_id });
        self.request_refresh().await;
        Ok(list)
    }

    /// Delete a list on the remote and refresh
    ///
    /// A list the remote does not know is an error, not `Ok(false)`.
    pub async fn delete_list(&mut self, offline_id: &str) -> Result<bool> {
        let deleted = self.api.delete_shopping_list(offline_id).await?;

        info!("Deleted shopping list {}", offline_id);
        self.emit_event(CoordinatorEvent::ListDeleted {
            offline_id: offline_id.to_string(),
        });
        self.request_refresh().await;
        Ok(deleted)
    }

    fn ensure_cached(&self, list_id: i64) -> Result<()> {
        match self.get_shopping_list(list_id) {
            Some(_) => Ok(()),
            None => Err(Error::not_found(format!(
                "Shopping list {} is not cached",
                list_id
            ))),
        }
    }

    /// Emit a coordinator event
    fn emit_event(&self, event: CoordinatorEvent) {
        if self.event_tx.try_send(event).is_err() {
            warn!("Event channel full, dropping event. Consider increasing event_channel_capacity.");
        }
    }
}

impl std::fmt::Debug for ShoppingListCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShoppingListCoordinator")
            .field("api", &self.api.api_name())
            .field("lists", &self.shopping_lists().len())
            .field("update_interval", &self.update_interval)
            .field("last_update_success", &self.last_update_success)
            .finish()
    }
}

/// Fetch the list summaries, then each list's full record
async fn fetch_all_lists(api: &dyn ShoppingApi) -> Result<Vec<ShoppingList>> {
    let summaries = api.get_shopping_lists().await?;

    let mut lists = Vec::with_capacity(summaries.len());
    for summary in summaries {
        lists.push(api.get_shopping_list(&summary.offline_id).await?);
    }
    Ok(lists)
}
