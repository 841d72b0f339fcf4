//! Parsed parameter occurrences and their provenance.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use crate::overlay::{Overlay, OverlayFragment};

/// Priority added to an instance derived from (or remapped out of) another one.
pub const DERIVED_BOOST: i32 = 20;

/// Which dialect produced a [`ParameterInstance`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Source {
    /// Named-parameter query keys (`width=800`).
    Standard,
    /// Short query keys (`w=800`).
    Compact,
    /// Path segments (`/_width=800/`, derivative names).
    Path,
    /// Legacy vendor dot, equals, and path spellings.
    LegacyVendor,
    /// Computed from another instance: size codes, satisfied conditions.
    Derived,
}

impl Source {
    /// Base priority of instances from this source.
    ///
    /// `Derived` has no base of its own; derived instances take their
    /// origin's priority plus [`DERIVED_BOOST`].
    pub const fn base_priority(self) -> i32 {
        match self {
            Self::Path => 100,
            Self::LegacyVendor => 80,
            Self::Standard => 70,
            Self::Compact => 60,
            Self::Derived => 0,
        }
    }

    /// Tie-break rank when two instances have equal priority. Higher wins.
    pub const fn rank(self) -> u8 {
        match self {
            Self::Derived => 4,
            Self::Path => 3,
            Self::LegacyVendor => 2,
            Self::Standard => 1,
            Self::Compact => 0,
        }
    }

    /// Whether a width/height from this source was typed by a person.
    pub const fn is_human_authored(self) -> bool {
        matches!(self, Self::Standard | Self::Compact | Self::Path)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Compact => "compact",
            Self::Path => "path",
            Self::LegacyVendor => "legacy-vendor",
            Self::Derived => "derived",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Edge distances, as used by `trim`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Edges {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Edges {
    /// Parse `top;right;bottom;left`.
    pub fn parse(s: &str) -> Option<Self> {
        let mut it = s.split(';').map(|p| p.trim().parse::<f64>());
        let edges = Self {
            top: it.next()?.ok()?,
            right: it.next()?.ok()?,
            bottom: it.next()?.ok()?,
            left: it.next()?.ok()?,
        };
        if it.next().is_some() {
            return None;
        }
        Some(edges)
    }

    /// Edges of a crop rectangle given as origin and size.
    pub fn from_rect(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self {
            top: y,
            right: x + w,
            bottom: y + h,
            left: x,
        }
    }
}

impl fmt::Display for Edges {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{};{};{};{}", self.top, self.right, self.bottom, self.left)
    }
}

/// A parameter value, before registry formatting.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Number(f64),
    Text(String),
    Bool(bool),
    Edges(Edges),
    /// One clause of a composite/watermark directive.
    Fragment(OverlayFragment),
    /// Fully resolved overlay descriptors.
    Overlays(Vec<Overlay>),
}

impl Value {
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Edges(e) => write!(f, "{e}"),
            Self::Fragment(frag) => write!(f, "{frag}"),
            Self::Overlays(list) => write!(f, "[{} overlay(s)]", list.len()),
        }
    }
}

/// One parsed occurrence of a named parameter.
#[derive(Clone, Debug, PartialEq)]
pub struct ParameterInstance {
    /// Canonical parameter name (a registry key).
    pub name: &'static str,
    pub value: Value,
    pub source: Source,
    /// Higher wins when several instances share a name.
    pub priority: i32,
    /// Width/height supplied on purpose rather than computed.
    pub explicit: bool,
}

impl ParameterInstance {
    /// New instance at its source's base priority.
    pub fn new(name: &'static str, value: Value, source: Source) -> Self {
        Self {
            name,
            value,
            source,
            priority: source.base_priority(),
            explicit: false,
        }
    }

    /// A derived instance computed from `self`, boosted over it.
    ///
    /// The explicit flag carries over.
    pub fn derive(&self, name: &'static str, value: Value) -> Self {
        Self {
            name,
            value,
            source: Source::Derived,
            priority: self.priority + DERIVED_BOOST,
            explicit: self.explicit,
        }
    }

    /// Same value under another name, boosted, keeping provenance.
    pub fn remap(&self, name: &'static str) -> Self {
        Self {
            name,
            value: self.value.clone(),
            source: self.source,
            priority: self.priority + DERIVED_BOOST,
            explicit: self.explicit,
        }
    }

    pub fn with_explicit(mut self, explicit: bool) -> Self {
        self.explicit = explicit;
        self
    }

    /// `true` if `self` beats `other` under the merge rule: priority first,
    /// then source rank. Equal on both counts is not a win.
    pub fn outranks(&self, other: &Self) -> bool {
        (self.priority, self.source.rank()) > (other.priority, other.source.rank())
    }
}
