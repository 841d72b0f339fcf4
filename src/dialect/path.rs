//! Path dialect: parameters embedded in path segments.
//!
//! - `_name=value` or `_name:value`, where `name` is a Standard or Compact key
//! - a segment equal to a configured derivative name, which expands to the
//!   derivative's Standard query
//!
//! Consumed segments are reported so the caller can strip them from the path.

use crate::config::Config;
use crate::param::Source;
use crate::request::Request;

use super::{ParseContext, ParseOutput, compact, standard};

/// Split `_name=value` / `_name:value` at whichever separator comes first.
fn embedded(segment: &str) -> Option<(&str, &str)> {
    let rest = segment.strip_prefix('_')?;
    let at = rest.find(['=', ':'])?;
    Some((&rest[..at], &rest[at + 1..]))
}

fn is_known(name: &str) -> bool {
    standard::claims_key(name) || compact::claims_key(name)
}

pub(crate) fn matches(request: &Request, config: &Config) -> bool {
    request.segments().iter().any(|seg| {
        embedded(seg).is_some_and(|(name, _)| is_known(&name.to_ascii_lowercase()))
            || config.derivative(seg).is_some()
    })
}

pub(crate) fn parse(request: &Request, ctx: &mut ParseContext<'_>) -> ParseOutput {
    let mut out = ParseOutput::default();
    for (i, seg) in request.segments().iter().enumerate() {
        if let Some((name, value)) = embedded(seg) {
            let name = name.to_ascii_lowercase();
            let inst = standard::instance(&name, value, Source::Path)
                .or_else(|| compact::instance(&name, value, Source::Path));
            if let Some(inst) = inst {
                out.params.push(inst);
                out.consumed_segments.push(i);
            }
        } else if let Some(query) = ctx.config.derivative(seg) {
            log::trace!("derivative {seg:?} expands to {query:?}");
            let preset = Request::new("", query);
            for pair in preset.query() {
                if let Some(inst) = standard::instance(&pair.key, &pair.value, Source::Path) {
                    out.params.push(inst);
                }
            }
            out.consumed_segments.push(i);
        }
    }
    out
}
