//! Blocking ICA handla API client

use std::time::Duration;

use ica_core::types::{
    CommonArticle, CommonArticlesResponse, FavoriteStores, NewShoppingList, Offer,
    ProductCategory, Recipe, ShoppingList, ShoppingListsResponse, Store,
};
use ica_core::{Credentials, Error, Result, SyncPayload};
use reqwest::blocking::Client;
use serde_json::Value;
use tracing::{debug, info};

use crate::http::{self, rest_url, AUTH_TICKET_HEADER};

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Fixed cutoff for the article-group listing
const ARTICLE_GROUPS_SYNC_DATE: &str = "2001-01-01";

const LOGIN_ENDPOINT: &str = "login";
const MY_LISTS_ENDPOINT: &str = "user/offlineshoppinglists";
const MY_STORES_ENDPOINT: &str = "user/stores";
const MY_COMMON_ARTICLES_ENDPOINT: &str = "user/commonarticles";

/// Authenticated, blocking client for one account
///
/// Construction logs in, so it blocks on the network. Every call reuses the
/// same session and ticket.
///
/// # Security
///
/// The Debug implementation does NOT expose the ticket.
pub struct IcaClient {
    base_url: String,
    session: Client,
    /// ⚠️ NEVER log this value
    ticket: String,
}

impl std::fmt::Debug for IcaClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IcaClient")
            .field("base_url", &self.base_url)
            .field("ticket", &"<REDACTED>")
            .finish()
    }
}

impl IcaClient {
    /// Log in with basic auth and keep the returned ticket
    ///
    /// # Errors
    ///
    /// - [`Error::Authentication`] if the remote answers 401 or the response
    ///   carries no `AuthenticationTicket` header
    /// - [`Error::HttpStatus`] / [`Error::Http`] for other failures
    pub fn login(base_url: &str, credentials: &Credentials) -> Result<Self> {
        let session = Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        let url = rest_url(base_url, LOGIN_ENDPOINT);
        debug!("Logging in at {}", url);

        let response = session
            .get(&url)
            .basic_auth(&credentials.personal_id, Some(&credentials.pin))
            .send()
            .map_err(|e| Error::http(format!("Request to {} failed: {}", url, e)))?;
        let response = http::check_status(response)?;

        let ticket = response
            .headers()
            .get(AUTH_TICKET_HEADER)
            .and_then(|value| value.to_str().ok())
            .filter(|ticket| !ticket.is_empty())
            .ok_or_else(|| Error::auth("Login response carried no AuthenticationTicket"))?
            .to_string();

        info!("Logged in to the ICA API");

        Ok(Self {
            base_url: base_url.to_string(),
            session,
            ticket,
        })
    }

    fn url(&self, endpoint: &str) -> String {
        rest_url(&self.base_url, endpoint)
    }

    fn get<T: serde::de::DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        http::get(&self.session, &self.url(endpoint), Some(&self.ticket))
    }

    /// Summaries of every list on the account
    pub fn get_shopping_lists(&self) -> Result<Vec<ShoppingList>> {
        let response: ShoppingListsResponse = self.get(MY_LISTS_ENDPOINT)?;
        Ok(response.shopping_lists)
    }

    /// One list with its rows
    pub fn get_shopping_list(&self, offline_id: &str) -> Result<ShoppingList> {
        self.get(&format!("{}/{}", MY_LISTS_ENDPOINT, offline_id))
    }

    pub fn get_store(&self, store_id: i64) -> Result<Store> {
        self.get(&format!("stores/{}", store_id))
    }

    /// Favorite store ids, each resolved to its store record
    pub fn get_favorite_stores(&self) -> Result<Vec<Store>> {
        let favorites: FavoriteStores = self.get(MY_STORES_ENDPOINT)?;
        favorites
            .favorite_stores
            .iter()
            .map(|id| self.get_store(*id))
            .collect()
    }

    /// Frequently bought products; empty if the remote sends none
    pub fn get_favorite_products(&self) -> Result<Vec<CommonArticle>> {
        let response: CommonArticlesResponse = self.get(MY_COMMON_ARTICLES_ENDPOINT)?;
        Ok(response.common_articles)
    }

    pub fn get_offers(&self, store_ids: &[i64]) -> Result<Vec<Offer>> {
        let stores = store_ids
            .iter()
            .map(i64::to_string)
            .collect::<Vec<_>>()
            .join(",");
        self.get(&format!("offers?Stores={}", stores))
    }

    pub fn get_product_categories(&self) -> Result<Vec<ProductCategory>> {
        self.get(&format!(
            "articles/articlegroups?lastsyncdate={}",
            ARTICLE_GROUPS_SYNC_DATE
        ))
    }

    pub fn get_random_recipes(&self, count: u32) -> Result<Vec<Recipe>> {
        self.get(&format!("recipes/random?numberofrecipes={}", count))
    }

    /// Post an empty list, then fetch it back by offline id
    pub fn create_shopping_list(
        &self,
        offline_id: &str,
        title: &str,
        comment: &str,
        store_sorting: bool,
    ) -> Result<ShoppingList> {
        let skeleton = NewShoppingList::new(offline_id, title, comment, store_sorting);
        let request_id = uuid::Uuid::new_v4().to_string();
        http::post(
            &self.session,
            &self.url(MY_LISTS_ENDPOINT),
            Some(&self.ticket),
            &skeleton,
            Some(&request_id),
        )?;

        self.get_shopping_list(offline_id)
    }

    /// Post one diff
    ///
    /// # Returns
    ///
    /// The remote's merge result, `Value::Null` if it sent no body
    pub fn sync_shopping_list(&self, offline_id: &str, payload: &SyncPayload) -> Result<Value> {
        http::post(
            &self.session,
            &self.url(&format!("{}/{}/sync", MY_LISTS_ENDPOINT, offline_id)),
            Some(&self.ticket),
            payload,
            None,
        )
    }

    pub fn delete_shopping_list(&self, offline_id: &str) -> Result<bool> {
        let request_id = uuid::Uuid::new_v4().to_string();
        http::delete(
            &self.session,
            &self.url(&format!("{}/{}", MY_LISTS_ENDPOINT, offline_id)),
            Some(&self.ticket),
            Some(&request_id),
        )
    }
}
