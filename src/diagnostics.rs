//! Non-fatal warnings and the per-request diagnostic snapshot.
//!
//! Nothing in the resolution pipeline fails a request. Whatever could not be
//! understood is dropped where it occurred and recorded here instead.

use alloc::collections::BTreeMap;
use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use thiserror::Error;

use crate::dialect::Dialect;

/// Non-fatal warning from parsing or resolution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseWarning {
    /// The same parameter arrived twice from one source (last value wins).
    #[error("duplicate `{key}`; `{value}` wins")]
    DuplicateKey { key: String, value: String },
    /// No selected dialect understands this query key.
    #[error("key `{key}` not recognized")]
    KeyNotRecognized { key: String, value: String },
    /// A single parameter or directive clause failed its own syntax.
    #[error("invalid `{key}` value `{value}`: {reason}")]
    ValueInvalid {
        key: String,
        value: String,
        reason: &'static str,
    },
    /// Registry validation failed; the default took its place.
    #[error("`{name}` rejected `{value}`; default substituted")]
    DefaultSubstituted { name: &'static str, value: String },
    /// Registry validation failed with no default; the parameter is gone.
    #[error("`{name}` rejected `{value}`; dropped")]
    ValueDropped { name: &'static str, value: String },
    /// An advanced directive was seen while advanced features are off.
    #[error("`{directive}` skipped: advanced features disabled")]
    FeatureDisabled { directive: String },
    /// A condition could not be evaluated and counts as not satisfied.
    #[error("condition `{directive}` not evaluated: {reason}")]
    ConditionUnresolved {
        directive: String,
        reason: &'static str,
    },
    /// A composite directive produced no url.
    #[error("overlay #{occurrence} dropped: no url")]
    OverlayDropped { occurrence: u32 },
}

/// What happened while resolving one request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diagnostics {
    /// Dialects selected for the request, in evaluation order.
    pub dialects: Vec<Dialect>,
    pub warnings: Vec<ParseWarning>,
    /// Query pairs and consumed path segments as received.
    pub raw: BTreeMap<String, String>,
    /// Surviving parameters after resolution, with their provenance.
    pub translated: BTreeMap<String, String>,
}

impl Diagnostics {
    /// Flatten into a plain key/value map.
    ///
    /// Keys: `dialects`, `raw.<key>`, `translated.<name>`, `warning.<n>`.
    pub fn to_map(&self) -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();
        let dialects: Vec<&str> = self.dialects.iter().map(|d| d.as_str()).collect();
        map.insert("dialects".to_string(), dialects.join(","));
        for (k, v) in &self.raw {
            map.insert(format!("raw.{k}"), v.clone());
        }
        for (k, v) in &self.translated {
            map.insert(format!("translated.{k}"), v.clone());
        }
        for (i, w) in self.warnings.iter().enumerate() {
            map.insert(format!("warning.{i}"), w.to_string());
        }
        map
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}
