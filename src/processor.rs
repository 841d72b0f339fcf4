//! Parameter processor: parse, merge, validate, resolve special cases.
//!
//! ```text
//! Request ──select──▶ dialects ──parse──▶ instances
//!   ──merge by priority──▶ one per name (fragments/conditions accumulate)
//!   ──validate──▶ default or drop
//!   ──special cases──▶ aliases, explicit dims, size code, path width,
//!                      conditions, overlays
//!   ──format──▶ CanonicalOptions
//! ```
//!
//! Special cases run in a fixed order because each may override the
//! previous one.

use alloc::collections::BTreeMap;
use alloc::collections::btree_map::Entry;
use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use log::{debug, trace};

use crate::condition::{ConditionDirective, DimensionLookup, ImageInfo};
use crate::config::Config;
use crate::diagnostics::{Diagnostics, ParseWarning};
use crate::dialect::{self, ParseContext};
use crate::output::{self, CanonicalOptions};
use crate::overlay::{self, OverlayFragment};
use crate::param::{ParameterInstance, Source, Value};
use crate::registry::{self, MergePolicy, Validation};
use crate::request::Request;

/// Vendor dimension aliases and their canonical names.
const ALIASES: &[(&str, &str)] = &[("imwidth", "width"), ("imheight", "height")];

/// Everything resolved for one request.
#[derive(Clone, Debug, PartialEq)]
pub struct Resolution {
    /// Downstream options.
    pub options: CanonicalOptions,
    pub diagnostics: Diagnostics,
    /// The request path with consumed parameter segments removed.
    pub path: String,
    /// Size code as requested, kept for cache keys even when it did not
    /// set the width.
    pub size_code: Option<String>,
}

/// Resolves requests under one [`Config`].
#[derive(Clone, Debug, Default)]
pub struct Processor {
    config: Config,
}

impl Processor {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Resolve a request. Never fails; whatever could not be understood is
    /// dropped and reported in [`Resolution::diagnostics`].
    ///
    /// `dimensions` is consulted at most once, and only if the request
    /// carries a condition.
    pub fn process<D: DimensionLookup + ?Sized>(
        &self,
        request: &Request,
        dimensions: &D,
    ) -> Resolution {
        let dialects = dialect::select(request, &self.config);
        let mut ctx = ParseContext::new(&self.config);
        let mut warnings = Vec::new();
        let mut instances = Vec::new();
        let mut consumed = Vec::new();

        for d in &dialects {
            let out = d.parse(request, &mut ctx);
            trace!("{d}: {} instance(s)", out.params.len());
            instances.extend(out.params);
            warnings.extend(out.warnings);
            consumed.extend(out.consumed_segments);
        }
        consumed.sort_unstable();
        consumed.dedup();

        for pair in request.query() {
            if !dialects.iter().any(|d| d.claims_key(&pair.key, &self.config)) {
                debug!("unrecognized key {:?}", pair.key);
                warnings.push(ParseWarning::KeyNotRecognized {
                    key: pair.key.clone(),
                    value: pair.value.clone(),
                });
            }
        }

        // Captured before merging so a size-code width can't hide it. Its
        // warnings are reported by the regular validation pass.
        let path_width = instances
            .iter()
            .rfind(|i| i.name == "width" && i.source == Source::Path)
            .cloned()
            .and_then(|i| validate(i, &mut Vec::new()));

        let mut set = WorkingSet::default();
        for inst in instances {
            set.insert(inst, &mut warnings);
        }
        set.validate(&mut warnings);

        set.map_aliases(&mut warnings);
        set.mark_explicit();
        set.resolve_size_code();
        if let Some(width) = path_width {
            set.install_path_width(width);
        }
        set.evaluate_conditions(dimensions, &mut ctx, &mut warnings);
        set.collapse_overlays(self.config.default_offset, &mut warnings);

        let options = output::format_options(&set.winners);

        let mut raw = BTreeMap::new();
        for pair in request.query() {
            raw.insert(pair.key.clone(), pair.value.clone());
        }
        for &i in &consumed {
            if let Some(seg) = request.segments().get(i) {
                raw.insert(format!("path.{i}"), seg.clone());
            }
        }
        let translated = set
            .winners
            .values()
            .map(|inst| {
                let explicit = if inst.explicit { ", explicit" } else { "" };
                (
                    inst.name.to_string(),
                    format!("{} ({}{explicit})", inst.value, inst.source),
                )
            })
            .collect();

        let size_code = set
            .winners
            .get("size")
            .and_then(|i| i.value.as_text())
            .map(ToString::to_string);

        Resolution {
            options,
            diagnostics: Diagnostics {
                dialects,
                warnings,
                raw,
                translated,
            },
            path: request.path_without(&consumed),
            size_code,
        }
    }
}

/// Validate one instance, substituting the default or dropping it.
fn validate(
    mut inst: ParameterInstance,
    warnings: &mut Vec<ParseWarning>,
) -> Option<ParameterInstance> {
    let def = registry::definition(inst.name)?;
    match def.validate(inst.value.clone()) {
        Validation::Valid(v) => {
            inst.value = v;
            Some(inst)
        }
        Validation::Substituted(v) => {
            debug!("{} rejected {}; using default {v}", inst.name, inst.value);
            warnings.push(ParseWarning::DefaultSubstituted {
                name: def.name,
                value: inst.value.to_string(),
            });
            inst.value = v;
            Some(inst)
        }
        Validation::Rejected => {
            debug!("{} rejected {}; dropped", inst.name, inst.value);
            warnings.push(ParseWarning::ValueDropped {
                name: def.name,
                value: inst.value.to_string(),
            });
            None
        }
    }
}

fn alias_target(name: &str) -> Option<&'static str> {
    ALIASES.iter().find(|(a, _)| *a == name).map(|&(_, t)| t)
}

fn is_dimension(name: &str) -> bool {
    matches!(name, "width" | "height")
}

/// Merged parameters: one winner per replaceable name, every instance of an
/// accumulating name.
#[derive(Debug, Default)]
struct WorkingSet {
    winners: BTreeMap<&'static str, ParameterInstance>,
    accumulated: BTreeMap<&'static str, Vec<ParameterInstance>>,
}

impl WorkingSet {
    /// Merge one instance. Higher priority wins, then source rank; a full
    /// tie goes to the later instance.
    fn insert(&mut self, inst: ParameterInstance, warnings: &mut Vec<ParseWarning>) {
        let Some(def) = registry::definition(inst.name) else {
            return;
        };
        if def.merge == MergePolicy::Accumulate {
            self.accumulated.entry(def.name).or_default().push(inst);
            return;
        }
        match self.winners.entry(def.name) {
            Entry::Vacant(e) => {
                e.insert(inst);
            }
            Entry::Occupied(mut e) => {
                let current = e.get();
                if inst.outranks(current) {
                    trace!(
                        "{}: {} ({}) beats {} ({})",
                        def.name,
                        inst.value,
                        inst.source,
                        current.value,
                        current.source
                    );
                    e.insert(inst);
                } else if !current.outranks(&inst) {
                    warnings.push(ParseWarning::DuplicateKey {
                        key: def.name.to_string(),
                        value: inst.value.to_string(),
                    });
                    e.insert(inst);
                } else {
                    trace!(
                        "{}: {} ({}) loses to {} ({})",
                        def.name,
                        inst.value,
                        inst.source,
                        current.value,
                        current.source
                    );
                }
            }
        }
    }

    fn validate(&mut self, warnings: &mut Vec<ParseWarning>) {
        let winners = core::mem::take(&mut self.winners);
        for (name, inst) in winners {
            if let Some(inst) = validate(inst, warnings) {
                self.winners.insert(name, inst);
            }
        }
        for list in self.accumulated.values_mut() {
            let taken = core::mem::take(list);
            list.extend(taken.into_iter().filter_map(|i| validate(i, warnings)));
        }
    }

    /// Vendor width/height aliases become explicit canonical dimensions.
    fn map_aliases(&mut self, warnings: &mut Vec<ParseWarning>) {
        for &(alias, target) in ALIASES {
            if let Some(inst) = self.winners.remove(alias) {
                self.insert(inst.remap(target).with_explicit(true), warnings);
            }
        }
    }

    /// Dimensions typed by a person are explicit.
    fn mark_explicit(&mut self) {
        for name in ["width", "height"] {
            if let Some(inst) = self.winners.get_mut(name) {
                if inst.source.is_human_authored() {
                    inst.explicit = true;
                }
            }
        }
    }

    fn has_explicit_width(&self) -> bool {
        self.winners.get("width").is_some_and(|w| w.explicit)
    }

    /// A size code sets the width unless an explicit width already exists.
    /// The code itself stays for cache keys.
    fn resolve_size_code(&mut self) {
        let Some(code) = self.winners.get("size") else {
            return;
        };
        if self.has_explicit_width() {
            debug!("size code {} ignored: explicit width present", code.value);
            return;
        }
        let Some(px) = code.value.as_text().and_then(registry::size_code_width) else {
            return;
        };
        let width = code
            .derive("width", Value::Number(f64::from(px)))
            .with_explicit(true);
        trace!("size code {} resolves to width {px}", code.value);
        self.winners.insert("width", width);
    }

    /// A path width always wins, and retires the size code.
    fn install_path_width(&mut self, width: ParameterInstance) {
        trace!("path width {} installed", width.value);
        self.winners.insert("width", width.with_explicit(true));
        self.winners.remove("size");
    }

    fn evaluate_conditions<D: DimensionLookup + ?Sized>(
        &mut self,
        dimensions: &D,
        ctx: &mut ParseContext<'_>,
        warnings: &mut Vec<ParseWarning>,
    ) {
        let conditions = self.accumulated.remove("condition").unwrap_or_default();
        let mut info: Option<Option<ImageInfo>> = None;

        for cond in conditions {
            let raw = cond.value.to_string();
            let directive = match ConditionDirective::parse(&raw) {
                Ok(d) => d,
                Err(e) => {
                    debug!("condition {raw:?} unparseable: {e}");
                    warnings.push(ParseWarning::ConditionUnresolved {
                        directive: raw,
                        reason: e.reason(),
                    });
                    continue;
                }
            };
            let Some(image) = info.get_or_insert_with(|| dimensions.lookup()).as_ref() else {
                debug!("condition {raw:?} skipped: dimensions unavailable");
                warnings.push(ParseWarning::ConditionUnresolved {
                    directive: raw,
                    reason: "dimensions unavailable",
                });
                continue;
            };
            match directive.evaluate(image) {
                Some(true) => {
                    trace!("condition {raw:?} holds");
                    self.apply_clause(&cond, &directive.then_clause, ctx, warnings);
                }
                Some(false) => trace!("condition {raw:?} does not hold"),
                None => warnings.push(ParseWarning::ConditionUnresolved {
                    directive: raw,
                    reason: "property unavailable",
                }),
            }
        }
    }

    /// Merge a satisfied then-clause as instances derived from the condition.
    fn apply_clause(
        &mut self,
        cond: &ParameterInstance,
        clause: &str,
        ctx: &mut ParseContext<'_>,
        warnings: &mut Vec<ParseWarning>,
    ) {
        let out = dialect::parse_clause(clause, ctx);
        warnings.extend(out.warnings);

        let mut derived = Vec::new();
        for inst in out.params {
            if inst.name == "condition" {
                warnings.push(ParseWarning::ConditionUnresolved {
                    directive: inst.value.to_string(),
                    reason: "nested condition",
                });
                continue;
            }
            let name = alias_target(inst.name).unwrap_or(inst.name);
            let d = cond.derive(name, inst.value).with_explicit(is_dimension(name));
            if let Some(d) = validate(d, warnings) {
                derived.push(d);
            }
        }

        let explicit_width =
            self.has_explicit_width() || derived.iter().any(|d| d.name == "width");
        if !explicit_width {
            let px = derived
                .iter()
                .filter(|d| d.name == "size")
                .filter_map(|d| d.value.as_text().and_then(registry::size_code_width))
                .last();
            if let Some(px) = px {
                derived.push(
                    cond.derive("width", Value::Number(f64::from(px)))
                        .with_explicit(true),
                );
            }
        }

        for d in derived {
            self.insert(d, warnings);
        }
    }

    /// Fold composite fragments into the `overlays` list, after any
    /// descriptors given directly.
    fn collapse_overlays(&mut self, default_offset: f64, warnings: &mut Vec<ParseWarning>) {
        let Some(instances) = self.accumulated.remove("overlay") else {
            return;
        };
        let fragments: Vec<&OverlayFragment> = instances
            .iter()
            .filter_map(|i| match &i.value {
                Value::Fragment(f) => Some(f),
                _ => None,
            })
            .collect();
        let collapsed = overlay::collapse(fragments, default_offset);
        for occurrence in collapsed.dropped {
            debug!("overlay #{occurrence} dropped: no url");
            warnings.push(ParseWarning::OverlayDropped { occurrence });
        }
        if collapsed.overlays.is_empty() {
            return;
        }

        let mut list = match self.winners.get("overlays").map(|i| &i.value) {
            Some(Value::Overlays(direct)) => direct.clone(),
            _ => Vec::new(),
        };
        list.extend(collapsed.overlays);
        if let Some(first) = instances.first() {
            self.winners
                .insert("overlays", first.derive("overlays", Value::Overlays(list)));
        }
    }
}
