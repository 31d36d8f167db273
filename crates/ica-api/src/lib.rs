// # ICA handla API
//
// This crate reaches the ICA handla REST API for the shopping-list
// synchronizer.
//
// ## Layers
//
// - `http`: GET/POST/DELETE helpers carrying the `AuthenticationTicket`
//   header, JSON bodies and status mapping
// - `IcaClient`: blocking client; logging in happens at construction
// - `IcaApiAsync`: implements `ica_core::ShoppingApi` by running the blocking
//   client on tokio's blocking pool, logging in lazily on first use
//
// ## Guarantees
//
// - One request per call: no retries, no caching
// - The PIN and the ticket never appear in logs or Debug output
//
// ## API Reference
//
// - Login: GET `login` with basic auth, ticket in the response header
// - Lists: GET `user/offlineshoppinglists`, GET/DELETE
//   `user/offlineshoppinglists/{offline_id}`
// - Sync: POST `user/offlineshoppinglists/{offline_id}/sync`
// - Stores: GET `user/stores`, GET `stores/{id}`
// - Favorite products: GET `user/commonarticles`
// - Offers: GET `offers?Stores={ids}`
// - Categories: GET `articles/articlegroups?lastsyncdate=2001-01-01`
// - Recipes: GET `recipes/random?numberofrecipes={n}`

pub mod async_api;
pub mod client;
pub mod http;

pub use async_api::IcaApiAsync;
pub use client::IcaClient;

use ica_core::{IcaConfig, SetupError, ShoppingApi};

/// Check the configured credentials by logging in and fetching the lists
///
/// # Returns
///
/// The logged-in adapter, ready to hand to the coordinator, or the
/// classification to show next to the credential fields
pub async fn validate_setup(config: &IcaConfig) -> std::result::Result<IcaApiAsync, SetupError> {
    let api = IcaApiAsync::from_config(config);

    match api.get_shopping_lists().await {
        Ok(lists) => {
            tracing::debug!("Credentials accepted, {} list(s) on the account", lists.len());
            Ok(api)
        }
        Err(e) => {
            let setup_error = SetupError::from(&e);
            match setup_error {
                SetupError::Unknown => {
                    tracing::error!("Unexpected error during setup validation: {:?}", e)
                }
                _ => tracing::warn!("Setup validation failed ({}): {}", setup_error, e),
            }
            Err(setup_error)
        }
    }
}
