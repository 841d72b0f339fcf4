//! Compact dialect: short keys (`w=800&h=600&q=70&f=s`).
//!
//! `f` passes the size code through unresolved. The processor decides
//! whether it becomes a width.

use alloc::format;
use alloc::string::String;

use crate::param::{ParameterInstance, Source, Value};
use crate::registry;
use crate::request::Request;

use super::ParseOutput;

/// Short key to canonical name, sorted by key.
const KEYS: &[(&str, &str)] = &[
    ("aspect", "aspect"),
    ("bg", "background"),
    ("f", "size"),
    ("fmt", "format"),
    ("focal", "gravity"),
    ("h", "height"),
    ("p", "gravity"),
    ("q", "quality"),
    ("r", "aspect"),
    ("w", "width"),
];

fn target(key: &str) -> Option<&'static str> {
    KEYS.binary_search_by_key(&key, |&(k, _)| k)
        .ok()
        .map(|i| KEYS[i].1)
}

pub fn claims_key(key: &str) -> bool {
    target(key).is_some()
}

/// Build an instance for a compact key.
pub fn instance(key: &str, value: &str, source: Source) -> Option<ParameterInstance> {
    let name = target(key)?;
    let def = registry::definition(name)?;
    let value = match key {
        // `16x9` and `16:9` are the same ratio.
        "r" | "aspect" => Value::Text(value.trim().replace('x', ":")),
        "focal" => Value::Text(focal_point(value)),
        "p" => Value::Text(value.trim().to_ascii_lowercase()),
        _ => def.ty.coerce(value),
    };
    Some(ParameterInstance::new(def.name, value, source))
}

/// `0.5,0.25` → `0.5x0.25`. Anything else passes through for validation.
fn focal_point(raw: &str) -> String {
    match raw.split_once(',') {
        Some((x, y)) => format!("{}x{}", x.trim(), y.trim()),
        None => String::from(raw.trim()),
    }
}

pub(crate) fn parse(request: &Request) -> ParseOutput {
    let mut out = ParseOutput::default();
    for pair in request.query() {
        if let Some(inst) = instance(&pair.key, &pair.value, Source::Compact) {
            out.params.push(inst);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_sorted() {
        for w in KEYS.windows(2) {
            assert!(w[0].0 < w[1].0, "{:?} >= {:?}", w[0].0, w[1].0);
        }
    }

    #[test]
    fn every_target_is_registered() {
        for (_, name) in KEYS {
            assert!(registry::definition(name).is_some(), "{name}");
        }
    }

    #[test]
    fn short_keys_map_to_canonical_names() {
        let out = parse(&Request::new("/", "w=800&h=600&q=70&f=S&fmt=WebP&bg=red"));
        let got: alloc::vec::Vec<(&str, &Value)> =
            out.params.iter().map(|p| (p.name, &p.value)).collect();
        assert_eq!(
            got,
            [
                ("width", &Value::Number(800.0)),
                ("height", &Value::Number(600.0)),
                ("quality", &Value::Number(70.0)),
                ("size", &Value::text("s")),
                ("format", &Value::text("webp")),
                ("background", &Value::text("red")),
            ]
        );
        assert!(out.params.iter().all(|p| p.source == Source::Compact));
    }

    #[test]
    fn ratio_spellings_agree() {
        let r = instance("r", "16x9", Source::Compact).unwrap();
        let a = instance("aspect", "16:9", Source::Compact).unwrap();
        assert_eq!(r.name, "aspect");
        assert_eq!(r.value, a.value);
    }

    #[test]
    fn focal_point_becomes_gravity_coordinates() {
        let g = instance("focal", "0.5, 0.25", Source::Compact).unwrap();
        assert_eq!(g.name, "gravity");
        assert_eq!(g.value, Value::text("0.5x0.25"));
        let p = instance("p", "Face", Source::Compact).unwrap();
        assert_eq!(p.value, Value::text("face"));
    }

    #[test]
    fn long_names_are_not_compact() {
        assert!(!claims_key("width"));
        assert!(instance("quality", "50", Source::Compact).is_none());
    }
}
