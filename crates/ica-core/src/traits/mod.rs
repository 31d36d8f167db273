//! Core traits for the ICA shopping-list synchronizer
//!
//! - [`ShoppingApi`]: reach the remote handla API

pub mod shopping_api;

pub use shopping_api::ShoppingApi;
