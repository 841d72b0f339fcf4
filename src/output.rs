//! Output formatting: canonical parameters to the downstream option map.
//!
//! Applies each definition's formatter, drops parameters that are consumed
//! upstream (size codes, conditions, overlay fragments, vendor aliases), and
//! resolves an aspect ratio into a height.

use alloc::collections::BTreeMap;
use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use serde::Serialize;

use crate::overlay::Overlay;
use crate::param::{ParameterInstance, Value};
use crate::registry::{self, Exposure, MAX_DIMENSION};
use crate::request::percent_encode;

/// A single downstream option value.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OptionValue {
    Int(i64),
    Float(f64),
    Text(String),
    Bool(bool),
    Overlays(Vec<Overlay>),
}

impl OptionValue {
    /// Default wire form of a value with no dedicated formatter.
    pub fn from_value(value: &Value) -> Option<Self> {
        Some(match value {
            Value::Number(n) => Self::Float(*n),
            Value::Text(s) => Self::Text(s.clone()),
            Value::Bool(b) => Self::Bool(*b),
            Value::Edges(e) => Self::Text(format!("{e}")),
            Value::Overlays(list) => Self::Overlays(list.clone()),
            Value::Fragment(_) => return None,
        })
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Query-string form, unencoded.
    fn to_query_value(&self) -> Option<String> {
        Some(match self {
            Self::Int(n) => n.to_string(),
            Self::Float(n) => n.to_string(),
            Self::Text(s) => s.clone(),
            Self::Bool(b) => b.to_string(),
            Self::Overlays(list) => serde_json::to_string(list).ok()?,
        })
    }
}

/// The canonical option map, keyed by downstream parameter name.
///
/// Serializes as a flat JSON object.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CanonicalOptions(BTreeMap<&'static str, OptionValue>);

impl CanonicalOptions {
    pub fn get(&self, name: &str) -> Option<&OptionValue> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &OptionValue)> {
        self.0.iter().map(|(k, v)| (*k, v))
    }

    pub fn into_inner(self) -> BTreeMap<&'static str, OptionValue> {
        self.0
    }

    /// Render as a Standard-dialect query string.
    ///
    /// Processing the result again yields the same options.
    pub fn to_query(&self) -> String {
        let mut out = String::new();
        for (name, value) in &self.0 {
            let Some(v) = value.to_query_value() else {
                continue;
            };
            if !out.is_empty() {
                out.push('&');
            }
            out.push_str(name);
            out.push('=');
            out.push_str(&percent_encode(&v));
        }
        out
    }
}

/// Format the surviving parameters into the downstream option map.
///
/// Every instance here has already passed validation, so the output never
/// carries a rejected value, and the map guarantees one entry per name.
pub fn format_options(params: &BTreeMap<&'static str, ParameterInstance>) -> CanonicalOptions {
    let mut map = BTreeMap::new();
    for (name, inst) in params {
        let Some(def) = registry::definition(name) else {
            continue;
        };
        if def.exposure != Exposure::Public {
            continue;
        }
        if let Some(v) = def.format(&inst.value) {
            map.insert(def.name, v);
        }
    }

    if let Some(aspect) = params.get("aspect") {
        apply_aspect(&mut map, &aspect.value);
    }

    CanonicalOptions(map)
}

/// With a width and no height, derive the height from the ratio and crop to it.
fn apply_aspect(map: &mut BTreeMap<&'static str, OptionValue>, aspect: &Value) {
    let Some((rw, rh)) = aspect.as_text().and_then(registry::parse_aspect) else {
        return;
    };
    if map.contains_key("height") {
        return;
    }
    let Some(width) = map.get("width").and_then(OptionValue::as_int) else {
        return;
    };
    let height = num_traits::Float::round(width as f64 * rh / rw).clamp(1.0, MAX_DIMENSION);
    map.insert("height", OptionValue::Int(height as i64));
    map.entry("fit")
        .or_insert_with(|| OptionValue::Text("crop".to_string()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::param::Source;

    fn params(list: &[(&'static str, Value)]) -> BTreeMap<&'static str, ParameterInstance> {
        list.iter()
            .map(|(n, v)| (*n, ParameterInstance::new(*n, v.clone(), Source::Standard)))
            .collect()
    }

    #[test]
    fn internal_names_are_stripped() {
        let p = params(&[
            ("width", Value::Number(600.0)),
            ("size", Value::text("s")),
            ("imwidth", Value::Number(300.0)),
            ("condition", Value::text("width>10,q=1")),
        ]);
        let out = format_options(&p);
        assert_eq!(out.len(), 1);
        assert_eq!(out.get("width"), Some(&OptionValue::Int(600)));
    }

    #[test]
    fn aspect_resolves_height_and_defaults_fit() {
        let p = params(&[("width", Value::Number(800.0)), ("aspect", Value::text("16:9"))]);
        let out = format_options(&p);
        assert_eq!(out.get("height"), Some(&OptionValue::Int(450)));
        assert_eq!(out.get("fit").and_then(OptionValue::as_text), Some("crop"));
        assert!(!out.contains("aspect"));
    }

    #[test]
    fn aspect_yields_to_explicit_height_and_fit() {
        let p = params(&[
            ("width", Value::Number(800.0)),
            ("height", Value::Number(200.0)),
            ("fit", Value::text("pad")),
            ("aspect", Value::text("16:9")),
        ]);
        let out = format_options(&p);
        assert_eq!(out.get("height"), Some(&OptionValue::Int(200)));
        assert_eq!(out.get("fit").and_then(OptionValue::as_text), Some("pad"));
    }

    #[test]
    fn aspect_without_width_is_dropped() {
        let out = format_options(&params(&[("aspect", Value::text("1:1"))]));
        assert!(out.is_empty());
    }

    #[test]
    fn query_rendering() {
        let p = params(&[
            ("width", Value::Number(800.0)),
            ("background", Value::text("red")),
            ("flip", Value::Bool(true)),
            ("sharpen", Value::Number(1.5)),
        ]);
        assert_eq!(
            format_options(&p).to_query(),
            "background=%23ff0000&flip=true&sharpen=1.5&width=800"
        );
    }

    #[test]
    fn serializes_as_flat_object() {
        let p = params(&[("width", Value::Number(800.0)), ("fit", Value::text("cover"))]);
        let json = serde_json::to_string(&format_options(&p)).unwrap();
        assert_eq!(json, r#"{"fit":"cover","width":800}"#);
    }
}
