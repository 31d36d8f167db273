//! Configuration types for the ICA shopping-list synchronizer
//!
//! This module defines all configuration structures used throughout the crate.

use serde::{Deserialize, Serialize};

/// Base URL of the ICA handla API
pub const DEFAULT_BASE_URL: &str = "https://handla.api.ica.se/api/";

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IcaConfig {
    /// Account credentials
    pub credentials: Credentials,

    /// Number of random recipes to retrieve
    #[serde(default = "default_recipe_count")]
    pub recipe_count: u32,

    /// API base URL (trailing slash optional)
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Optional coordinator settings
    #[serde(default)]
    pub coordinator: CoordinatorConfig,
}

impl IcaConfig {
    /// Create a configuration with default settings for the given account
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            recipe_count: default_recipe_count(),
            base_url: default_base_url(),
            coordinator: CoordinatorConfig::default(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.credentials.validate()?;

        if self.recipe_count == 0 {
            return Err(crate::Error::config("Recipe count must be > 0"));
        }

        if !self.base_url.starts_with("https://") && !self.base_url.starts_with("http://") {
            return Err(crate::Error::config(format!(
                "Base URL must use HTTP or HTTPS scheme. Got: {}",
                self.base_url
            )));
        }

        self.coordinator.validate()
    }
}

/// Account credentials: personal id number and PIN
///
/// The Debug implementation does NOT expose the PIN.
#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    /// Swedish personal id number
    pub personal_id: String,
    /// PIN code
    /// ⚠️ NEVER log this value
    pub pin: String,
}

impl Credentials {
    pub fn new(personal_id: impl Into<String>, pin: impl Into<String>) -> Self {
        Self {
            personal_id: personal_id.into(),
            pin: pin.into(),
        }
    }

    /// Both fields are required
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.personal_id.trim().is_empty() {
            return Err(crate::Error::config("Personal id cannot be empty"));
        }
        if self.pin.trim().is_empty() {
            return Err(crate::Error::config("PIN cannot be empty"));
        }
        Ok(())
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("personal_id", &self.personal_id)
            .field("pin", &"<REDACTED>")
            .finish()
    }
}

/// Coordinator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    /// Interval between scheduled refreshes (in seconds)
    #[serde(default = "default_update_interval_secs")]
    pub update_interval_secs: u64,

    /// Capacity of the coordinator event channel
    ///
    /// When full, new events are dropped (with a warning log).
    ///
    /// Default: 100 events
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl CoordinatorConfig {
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.update_interval_secs == 0 {
            return Err(crate::Error::config("Update interval must be > 0"));
        }
        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("Event channel capacity must be > 0"));
        }
        Ok(())
    }

    pub fn update_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.update_interval_secs)
    }
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            update_interval_secs: default_update_interval_secs(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

fn default_recipe_count() -> u32 {
    5
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_update_interval_secs() -> u64 {
    60
}

fn default_event_channel_capacity() -> usize {
    100
}
