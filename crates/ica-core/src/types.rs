//! Wire records for the ICA handla API
//!
//! Plain structured records with no behavior, mirroring the remote's
//! PascalCase JSON. Every field the remote may omit is defaulted so a
//! partial record still deserializes.
//!
//! Lists and rows are sent back whole on a full sync, so they serialize
//! only the optional fields the remote provided and carry any field they
//! do not model in `extra`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Format the current UTC time the way the remote stamps `LatestChange`
///
/// Whole seconds, `Z` suffix: `2024-03-01T09:30:00Z`.
pub fn latest_change_now() -> String {
    chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// A shopping list with its rows
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ShoppingList {
    /// Remote id
    pub id: i64,
    /// Client-generated id, also used in resource paths
    pub offline_id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment_text: Option<String>,
    /// 1 if rows are sorted by store layout, else 0
    pub sorting_store: i32,
    pub rows: Vec<ShoppingListEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_change: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_private: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_smart_list: Option<bool>,
    /// Fields not modeled here, kept verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ShoppingList {
    /// Find a row by its offline id
    pub fn row(&self, offline_id: &str) -> Option<&ShoppingListEntry> {
        self.rows
            .iter()
            .find(|row| row.offline_id.as_deref() == Some(offline_id))
    }
}

/// Envelope returned by `user/offlineshoppinglists`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ShoppingListsResponse {
    pub shopping_lists: Vec<ShoppingList>,
}

/// One row of a shopping list
///
/// `row_id` is assigned by the remote on sync; until then the row is known
/// only by its `offline_id`, which stays stable across syncs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ShoppingListEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offline_id: Option<String>,
    pub product_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_id: Option<i64>,
    pub is_striked_over: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub internal_order: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub article_group_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub article_group_id_extended: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_change: Option<String>,
    pub is_smart_item: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Envelope returned by `user/stores`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct FavoriteStores {
    pub favorite_stores: Vec<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Address {
    pub street: Option<String>,
    pub zip: Option<String>,
    pub city: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Coordinate {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct DayOpeningHours {
    pub title: Option<String>,
    pub hours: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct OpeningHours {
    pub today: Option<String>,
    pub regular_hours: Vec<DayOpeningHours>,
    pub special_hours: Vec<DayOpeningHours>,
    pub other_opening_hours: Vec<DayOpeningHours>,
}

/// A store, fetched once and cached as reference data
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Store {
    pub id: i64,
    pub marketing_name: Option<String>,
    pub address: Option<Address>,
    pub phone: Option<String>,
    pub coordinates: Option<Coordinate>,
    #[serde(rename = "WebURL")]
    pub web_url: Option<String>,
    pub opening_hours: Option<OpeningHours>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct OfferArticle {
    pub ean_id: Option<String>,
    pub article_description: Option<String>,
}

/// A promotional offer at one or more stores
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Offer {
    pub offer_id: Option<String>,
    pub store_id: Option<i64>,
    pub store_ids: Vec<i64>,
    pub article_group_id: Option<i64>,
    pub offer_type: Option<String>,
    pub product_name: Option<String>,
    pub offer_type_title: Option<String>,
    pub price_comparison: Option<String>,
    pub disclaimer: Option<String>,
    pub offer_condition: Option<String>,
    pub loaded_on_card: bool,
    pub offer_used: bool,
    pub expired: bool,
    pub articles: Vec<OfferArticle>,
}

/// A product category ("article group")
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ProductCategory {
    pub id: i64,
    pub name: Option<String>,
    pub parent_id: Option<i64>,
    pub last_sync_date: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Ingredient {
    pub text: Option<String>,
    pub ingredients_id: Option<i64>,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    pub ingredient: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct IngredientGroup {
    pub group_name: Option<String>,
    pub ingredients: Vec<Ingredient>,
}

/// A recipe from `recipes/random`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Recipe {
    pub id: i64,
    pub title: Option<String>,
    pub image_id: Option<i64>,
    #[serde(rename = "YouTubeId")]
    pub youtube_id: Option<String>,
    pub ingredient_groups: Vec<IngredientGroup>,
    #[serde(rename = "PreambleHTML")]
    pub preamble_html: Option<String>,
    pub current_user_rating: Option<f64>,
    pub average_rating: Option<f64>,
    pub difficulty: Option<String>,
    pub cooking_time: Option<String>,
    pub portions: Option<i64>,
}

/// A product the user buys often
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct CommonArticle {
    pub id: Option<i64>,
    pub product_name: Option<String>,
    pub article_id: Option<i64>,
    pub article_group_id: Option<i64>,
    pub article_group_id_extended: Option<i64>,
    pub format_category_maxi: Option<String>,
    pub format_category_kvantum: Option<String>,
    pub format_category_super_market: Option<String>,
    pub format_category_nara: Option<String>,
}

/// Envelope returned by `user/commonarticles`; the key is absent when the
/// account has none
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct CommonArticlesResponse {
    pub common_articles: Vec<CommonArticle>,
}

/// Body posted to `user/offlineshoppinglists` to create a list skeleton
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NewShoppingList {
    pub offline_id: String,
    pub title: String,
    pub comment_text: String,
    pub sorting_store: i32,
    pub rows: Vec<ShoppingListEntry>,
    pub latest_change: String,
}

impl NewShoppingList {
    pub fn new(
        offline_id: impl Into<String>,
        title: impl Into<String>,
        comment: impl Into<String>,
        store_sorting: bool,
    ) -> Self {
        Self {
            offline_id: offline_id.into(),
            title: title.into(),
            comment_text: comment.into(),
            sorting_store: i32::from(store_sorting),
            rows: Vec::new(),
            latest_change: latest_change_now(),
        }
    }
}
