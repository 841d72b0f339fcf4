//! Standard dialect: one query key per canonical name (`width=800&fit=cover`).

use crate::param::{ParameterInstance, Source};
use crate::registry::{self, Exposure};
use crate::request::Request;

use super::ParseOutput;

/// Registry names a request may spell directly. Internal names are excluded.
pub fn claims_key(key: &str) -> bool {
    registry::definition(key).is_some_and(|d| d.exposure != Exposure::Internal)
}

/// Build an instance for a Standard key, coercing by registry type.
pub fn instance(key: &str, value: &str, source: Source) -> Option<ParameterInstance> {
    let def = registry::definition(key).filter(|d| d.exposure != Exposure::Internal)?;
    Some(ParameterInstance::new(def.name, def.ty.coerce(value), source))
}

pub(crate) fn parse(request: &Request) -> ParseOutput {
    let mut out = ParseOutput::default();
    for pair in request.query() {
        if let Some(inst) = instance(&pair.key, &pair.value, Source::Standard) {
            out.params.push(inst);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::param::Value;

    #[test]
    fn coerces_by_registry_type() {
        let req = Request::new("/", "width=800&fit=Cover&flip=yes&trim=1;2;3;4&zoom=2");
        let out = parse(&req);
        let got: alloc::vec::Vec<(&str, &Value)> =
            out.params.iter().map(|p| (p.name, &p.value)).collect();
        assert_eq!(got.len(), 4);
        assert_eq!(got[0], ("width", &Value::Number(800.0)));
        assert_eq!(got[1], ("fit", &Value::text("cover")));
        assert_eq!(got[2], ("flip", &Value::Bool(true)));
        assert!(matches!(got[3], ("trim", Value::Edges(_))));
        assert!(out.params.iter().all(|p| p.source == Source::Standard && p.priority == 70));
    }

    #[test]
    fn internal_names_are_not_standard_keys() {
        assert!(!claims_key("imwidth"));
        assert!(!claims_key("overlay"));
        assert!(!claims_key("condition"));
        assert!(claims_key("size"));
        assert!(claims_key("overlays"));
    }

    #[test]
    fn uncoercible_value_is_kept_as_text() {
        let inst = instance("width", "wide", Source::Standard).unwrap();
        assert_eq!(inst.value, Value::text("wide"));
    }
}
