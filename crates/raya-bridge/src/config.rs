//! Bridge configuration
//!
//! Loaded from JSON (or built in code) and shared read-only by every
//! conversion a [`Bridge`](crate::Bridge) performs.

use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, BridgeResult};

/// Tag namespace used when a caller does not name one
pub const DEFAULT_TAG_NAME: &str = "script";

/// How an empty table decodes into an interface destination
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EmptyTablePolicy {
    /// Decode as `map[string]any`
    #[default]
    Mapping,
    /// Decode as `[]any`
    Sequence,
}

/// How a table decodes into a fixed-size array whose length differs
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ArrayLengthPolicy {
    /// Reject with a size mismatch
    #[default]
    Exact,
    /// Truncate extra elements, zero-fill missing ones
    Lenient,
}

/// Bridge configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BridgeConfig {
    /// Default tag namespace for record fields
    pub tag_name: String,

    /// Interface destination for empty tables
    pub empty_table: EmptyTablePolicy,

    /// Fixed-size array length handling
    pub array_length: ArrayLengthPolicy,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            tag_name: DEFAULT_TAG_NAME.to_string(),
            empty_table: EmptyTablePolicy::default(),
            array_length: ArrayLengthPolicy::default(),
        }
    }
}

impl BridgeConfig {
    /// Parse a configuration from JSON; missing keys take their defaults
    pub fn from_json(json: &str) -> BridgeResult<Self> {
        let config: BridgeConfig =
            serde_json::from_str(json).map_err(|e| BridgeError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty-printed JSON
    pub fn to_json(&self) -> BridgeResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| BridgeError::Config(e.to_string()))
    }

    /// Check invariants serde cannot express
    pub fn validate(&self) -> BridgeResult<()> {
        if self.tag_name.is_empty() {
            return Err(BridgeError::Config("tag_name must not be empty".to_string()));
        }
        if self.tag_name.contains(|c: char| c == ',' || c == '"' || c.is_whitespace()) {
            return Err(BridgeError::Config(format!(
                "tag_name '{}' is not a valid tag namespace",
                self.tag_name
            )));
        }
        Ok(())
    }

    /// Use a different default tag namespace
    pub fn with_tag_name(mut self, tag_name: impl Into<String>) -> Self {
        self.tag_name = tag_name.into();
        self
    }

    /// Use a different empty-table policy
    pub fn with_empty_table(mut self, policy: EmptyTablePolicy) -> Self {
        self.empty_table = policy;
        self
    }

    /// Use a different fixed-array length policy
    pub fn with_array_length(mut self, policy: ArrayLengthPolicy) -> Self {
        self.array_length = policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BridgeConfig::default();
        assert_eq!(config.tag_name, "script");
        assert_eq!(config.empty_table, EmptyTablePolicy::Mapping);
        assert_eq!(config.array_length, ArrayLengthPolicy::Exact);
    }

    #[test]
    fn test_from_json_fills_missing_keys() {
        let config = BridgeConfig::from_json(r#"{ "tag_name": "lua", "array_length": "lenient" }"#)
            .unwrap();
        assert_eq!(config.tag_name, "lua");
        assert_eq!(config.array_length, ArrayLengthPolicy::Lenient);
        assert_eq!(config.empty_table, EmptyTablePolicy::Mapping);
    }

    #[test]
    fn test_from_json_rejects_bad_input() {
        assert!(matches!(
            BridgeConfig::from_json(r#"{ "empty_table": "set" }"#),
            Err(BridgeError::Config(_))
        ));
        assert!(matches!(
            BridgeConfig::from_json(r#"{ "tag_name": "" }"#),
            Err(BridgeError::Config(_))
        ));
    }

    #[test]
    fn test_json_roundtrip() {
        let config = BridgeConfig::default().with_empty_table(EmptyTablePolicy::Sequence);
        let json = config.to_json().unwrap();
        assert_eq!(BridgeConfig::from_json(&json).unwrap(), config);
    }
}
