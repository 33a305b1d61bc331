//! Engine configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::DesignResult;

/// Tunables for [`crate::DesignEngine`]. Every field has a default, so a
/// partial JSON object is a valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Title of the product created for a fresh editor.
    pub product_title: String,
    /// Id of the initial view.
    pub default_view_id: String,
    /// Title of the initial view.
    pub default_view_title: String,
    /// Width of the initial view.
    pub default_view_width: f64,
    /// Height of the initial view.
    pub default_view_height: f64,
    /// Maximum retained history checkpoints.
    pub history_depth: usize,
    /// Edits to the same property of the same element closer together than
    /// this collapse into one checkpoint.
    pub coalesce_window_ms: u64,
    /// Offset applied to duplicated elements.
    pub duplicate_offset: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            product_title: "Product".to_string(),
            default_view_id: "front".to_string(),
            default_view_title: "Front".to_string(),
            default_view_width: 800.0,
            default_view_height: 600.0,
            history_depth: 100,
            coalesce_window_ms: 500,
            duplicate_offset: 10.0,
        }
    }
}

impl EngineConfig {
    /// Parse from JSON; missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`crate::DesignError::Serialization`] on malformed JSON.
    pub fn from_json(json: &str) -> DesignResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Coalescing window as a [`Duration`].
    #[must_use]
    pub const fn coalesce_window(&self) -> Duration {
        Duration::from_millis(self.coalesce_window_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let cfg = EngineConfig::from_json(r#"{"historyDepth": 5}"#).expect("config");
        assert_eq!(cfg.history_depth, 5);
        assert_eq!(cfg.coalesce_window(), Duration::from_millis(500));
        assert_eq!(cfg.default_view_id, "front");
    }

    #[test]
    fn test_malformed_json_fails() {
        assert!(EngineConfig::from_json("{historyDepth").is_err());
    }
}
