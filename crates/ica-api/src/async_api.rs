//! Async adapter over [`IcaClient`]
//!
//! Each call runs the blocking client on tokio's blocking pool. The client
//! is created on the first call, not at construction, since logging in is
//! itself a blocking network call.

use std::sync::Arc;

use async_trait::async_trait;
use ica_core::types::{CommonArticle, Offer, ProductCategory, Recipe, ShoppingList, Store};
use ica_core::{Credentials, Error, Result, ShoppingApi, SyncPayload};
use serde_json::Value;
use tokio::sync::OnceCell;

use crate::client::IcaClient;

/// [`ShoppingApi`] backed by the ICA handla API
pub struct IcaApiAsync {
    base_url: String,
    credentials: Credentials,
    client: OnceCell<Arc<IcaClient>>,
}

impl std::fmt::Debug for IcaApiAsync {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IcaApiAsync")
            .field("base_url", &self.base_url)
            .field("credentials", &self.credentials)
            .field("logged_in", &self.client.initialized())
            .finish()
    }
}

impl IcaApiAsync {
    /// No network call is made until the first request
    pub fn new(base_url: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            base_url: base_url.into(),
            credentials,
            client: OnceCell::new(),
        }
    }

    /// Adapter for the configured account and base URL
    pub fn from_config(config: &ica_core::IcaConfig) -> Self {
        Self::new(config.base_url.clone(), config.credentials.clone())
    }

    /// Whether the login has happened yet
    pub fn is_logged_in(&self) -> bool {
        self.client.initialized()
    }

    async fn client(&self) -> Result<Arc<IcaClient>> {
        let client = self
            .client
            .get_or_try_init(|| {
                let base_url = self.base_url.clone();
                let credentials = self.credentials.clone();
                offload(move || IcaClient::login(&base_url, &credentials).map(Arc::new))
            })
            .await?;
        Ok(Arc::clone(client))
    }

    /// Run `call` against the logged-in client off the async runtime
    async fn call<T, F>(&self, call: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&IcaClient) -> Result<T> + Send + 'static,
    {
        let client = self.client().await?;
        offload(move || call(&client)).await
    }
}

async fn offload<T, F>(f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| Error::Other(format!("Blocking API task failed: {}", e)))?
}

#[async_trait]
impl ShoppingApi for IcaApiAsync {
    async fn get_shopping_lists(&self) -> Result<Vec<ShoppingList>> {
        self.call(|client| client.get_shopping_lists()).await
    }

    async fn get_shopping_list(&self, offline_id: &str) -> Result<ShoppingList> {
        let offline_id = offline_id.to_string();
        self.call(move |client| client.get_shopping_list(&offline_id))
            .await
    }

    async fn get_store(&self, store_id: i64) -> Result<Store> {
        self.call(move |client| client.get_store(store_id)).await
    }

    async fn get_favorite_stores(&self) -> Result<Vec<Store>> {
        self.call(|client| client.get_favorite_stores()).await
    }

    async fn get_favorite_products(&self) -> Result<Vec<CommonArticle>> {
        self.call(|client| client.get_favorite_products()).await
    }

    async fn get_offers(&self, store_ids: &[i64]) -> Result<Vec<Offer>> {
        let store_ids = store_ids.to_vec();
        self.call(move |client| client.get_offers(&store_ids)).await
    }

    async fn get_product_categories(&self) -> Result<Vec<ProductCategory>> {
        self.call(|client| client.get_product_categories()).await
    }

    async fn get_random_recipes(&self, count: u32) -> Result<Vec<Recipe>> {
        self.call(move |client| client.get_random_recipes(count))
            .await
    }

    async fn create_shopping_list(
        &self,
        offline_id: &str,
        title: &str,
        comment: &str,
        store_sorting: bool,
    ) -> Result<ShoppingList> {
        let (offline_id, title, comment) =
            (offline_id.to_string(), title.to_string(), comment.to_string());
        self.call(move |client| {
            client.create_shopping_list(&offline_id, &title, &comment, store_sorting)
        })
        .await
    }

    async fn sync_shopping_list(&self, offline_id: &str, payload: &SyncPayload) -> Result<Value> {
        let offline_id = offline_id.to_string();
        let payload = payload.clone();
        self.call(move |client| client.sync_shopping_list(&offline_id, &payload))
            .await
    }

    async fn delete_shopping_list(&self, offline_id: &str) -> Result<bool> {
        let offline_id = offline_id.to_string();
        self.call(move |client| client.delete_shopping_list(&offline_id))
            .await
    }

    fn api_name(&self) -> &'static str {
        "ica"
    }
}

impl Drop for IcaApiAsync {
    fn drop(&mut self) {
        // The blocking client must not be dropped on a runtime worker
        if let Some(client) = self.client.take() {
            if let Ok(handle) = tokio::runtime::Handle::try_current() {
                handle.spawn_blocking(move || drop(client));
            }
        }
    }
}
