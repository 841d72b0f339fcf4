//! Resolution settings.
//!
//! Loading configuration is the host's business; this module only defines
//! what the pipeline needs and how to read it from TOML when the host keeps
//! it there:
//!
//! ```toml
//! advanced_features = true   # blur, mirror, composite/watermark, conditions
//! vendor_prefix = "im"       # im.width=, im=Resize,..., /im-width=/, /im(...)/
//! default_offset = 5         # overlay distance from the placement edge
//!
//! [derivatives]              # path segments that expand to presets
//! thumbnail = "width=320&height=180&fit=cover"
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[cfg(feature = "std")]
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[cfg(feature = "toml")]
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Pipeline configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Enables blur, mirror, composite/watermark, and conditional directives
    /// in the legacy vendor dialect.
    pub advanced_features: bool,
    /// Legacy vendor key prefix.
    pub vendor_prefix: String,
    /// Overlay offset used when a placement names an edge but no offset is given.
    pub default_offset: f64,
    /// Path derivatives: segment name to a Standard-dialect query.
    pub derivatives: BTreeMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        let mut derivatives = BTreeMap::new();
        derivatives.insert(
            "thumbnail".to_string(),
            "width=320&height=180&fit=cover".to_string(),
        );
        Self {
            advanced_features: false,
            vendor_prefix: "im".to_string(),
            default_offset: 5.0,
            derivatives,
        }
    }
}

impl Config {
    pub fn with_advanced_features(mut self, enabled: bool) -> Self {
        self.advanced_features = enabled;
        self
    }

    pub fn with_vendor_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.vendor_prefix = prefix.into();
        self
    }

    pub fn with_default_offset(mut self, offset: f64) -> Self {
        self.default_offset = offset;
        self
    }

    pub fn with_derivative(mut self, name: impl Into<String>, query: impl Into<String>) -> Self {
        self.derivatives.insert(name.into(), query.into());
        self
    }

    /// Look up a derivative by path segment (case-insensitive).
    pub fn derivative(&self, segment: &str) -> Option<&str> {
        self.derivatives
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(segment))
            .map(|(_, q)| q.as_str())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.vendor_prefix.is_empty()
            || !self
                .vendor_prefix
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'_')
        {
            return Err(ConfigError::Validation(
                "vendor_prefix must be non-empty and alphanumeric".to_string(),
            ));
        }
        if !self.default_offset.is_finite() || self.default_offset < 0.0 {
            return Err(ConfigError::Validation(
                "default_offset must be a non-negative number".to_string(),
            ));
        }
        if let Some((name, _)) = self
            .derivatives
            .iter()
            .find(|(name, _)| name.is_empty() || name.contains('/'))
        {
            return Err(ConfigError::Validation(alloc::format!(
                "derivative name {name:?} is not a single path segment"
            )));
        }
        Ok(())
    }

    /// Parse and validate a TOML document.
    #[cfg(feature = "toml")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse, and validate a TOML file.
    #[cfg(feature = "toml")]
    pub fn load(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = Config::default();
        assert!(!c.advanced_features);
        assert_eq!(c.vendor_prefix, "im");
        assert_eq!(c.default_offset, 5.0);
        assert_eq!(c.derivative("Thumbnail"), Some("width=320&height=180&fit=cover"));
        assert!(c.validate().is_ok());
    }

    #[test]
    fn rejects_bad_prefix() {
        let c = Config::default().with_vendor_prefix("im.");
        assert!(matches!(c.validate(), Err(ConfigError::Validation(_))));
        let c = Config::default().with_vendor_prefix("");
        assert!(c.validate().is_err());
    }

    #[test]
    fn rejects_negative_offset() {
        assert!(Config::default().with_default_offset(-1.0).validate().is_err());
    }

    #[cfg(feature = "toml")]
    mod toml_loading {
        use super::*;

        #[test]
        fn sparse_document_keeps_defaults() {
            let c = Config::from_toml_str("advanced_features = true").unwrap();
            assert!(c.advanced_features);
            assert_eq!(c.vendor_prefix, "im");
            assert!(c.derivative("thumbnail").is_some());
        }

        #[test]
        fn derivatives_table() {
            let c = Config::from_toml_str(
                "vendor_prefix = \"akm\"\n[derivatives]\nhero = \"width=1600&fit=cover\"\n",
            )
            .unwrap();
            assert_eq!(c.vendor_prefix, "akm");
            assert_eq!(c.derivative("hero"), Some("width=1600&fit=cover"));
            // A supplied table replaces the default one.
            assert_eq!(c.derivative("thumbnail"), None);
        }

        #[test]
        fn unknown_key_is_an_error() {
            let err = Config::from_toml_str("advanced = true").unwrap_err();
            assert!(matches!(err, ConfigError::Toml(_)));
        }

        #[test]
        fn invalid_value_is_a_validation_error() {
            let err = Config::from_toml_str("default_offset = -3.0").unwrap_err();
            assert!(matches!(err, ConfigError::Validation(_)));
        }

        #[test]
        fn missing_file_is_io_error() {
            let err = Config::load(std::path::Path::new("/nonexistent/zenquery.toml")).unwrap_err();
            assert!(matches!(err, ConfigError::Io(_)));
        }
    }
}
