//! Multi-dialect image transformation URL resolution.
//!
//! Accepts transformation requests written in any mix of URL dialects and
//! resolves them into one canonical option map for a downstream
//! transformation API. Malformed input degrades to whatever could be
//! understood; nothing here fails a request.
//!
//! ```
//! use zenquery::{Config, Processor, Request};
//!
//! let processor = Processor::new(Config::default());
//! let request = Request::from_uri("/cat.jpg?im=Resize,width=800,height=600,mode=fit");
//! let resolved = processor.process(&request, &());
//!
//! assert_eq!(resolved.options.to_query(), "fit=contain&height=600&width=800");
//! assert!(resolved.diagnostics.warnings.is_empty());
//! ```
//!
//! # Modules
//!
//! - [`dialect`] — Parser selector and the Standard, Compact, Path, and legacy vendor dialects
//! - [`processor`] — Merge by priority, validation, size codes, conditions, overlays
//! - [`registry`] — Parameter definitions and the size-code table
//! - [`output`] — Canonical option map and its query/JSON forms
//! - [`condition`] — Conditional transforms and the dimension lookup seam
//! - [`overlay`] — Composite fragments, placement table, overlay descriptors
//! - [`config`] — Settings, optionally loaded from TOML
//! - [`diagnostics`] — Warnings and the per-request snapshot

#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

pub mod color;
pub mod condition;
pub mod config;
pub mod diagnostics;
pub mod dialect;
pub mod output;
pub mod overlay;
pub mod param;
pub mod processor;
pub mod registry;
pub mod request;

pub use condition::{ConditionDirective, DimensionLookup, ImageInfo, LookupFn};
pub use config::{Config, ConfigError};
pub use diagnostics::{Diagnostics, ParseWarning};
pub use dialect::Dialect;
pub use output::{CanonicalOptions, OptionValue};
pub use overlay::{Overlay, OverlayFragment, Placement};
pub use param::{ParameterInstance, Source, Value};
pub use processor::{Processor, Resolution};
pub use request::Request;
