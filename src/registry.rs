//! Parameter registry and size-code table.
//!
//! Both tables are `static` and sorted by key for binary search. Nothing here
//! is mutated after compilation.

use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use crate::color;
use crate::output::OptionValue;
use crate::overlay::Overlay;
use crate::param::{Edges, Value};

/// Upper bound for requested pixel dimensions.
pub const MAX_DIMENSION: f64 = 12_000.0;

/// Value shape a parameter expects.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ParamType {
    Number,
    Text,
    Boolean,
    /// Text restricted to [`ParameterDefinition::allowed`].
    Enum,
    /// `top;right;bottom;left`.
    Edges,
    /// Key into [`SIZE_CODES`].
    SizeCode,
    /// One composite/watermark clause.
    Fragment,
    /// JSON array of overlay descriptors.
    Overlays,
}

impl ParamType {
    /// Coerce a raw query value into this type.
    ///
    /// Values that don't coerce are returned as [`Value::Text`] so that
    /// validation, not parsing, decides between default and drop.
    pub fn coerce(self, raw: &str) -> Value {
        let trimmed = raw.trim();
        match self {
            Self::Number => match trimmed.parse::<f64>() {
                Ok(n) if n.is_finite() => Value::Number(n),
                _ => Value::text(raw),
            },
            Self::Boolean => match parse_bool(trimmed) {
                Some(b) => Value::Bool(b),
                None => Value::text(raw),
            },
            Self::Enum | Self::SizeCode => Value::Text(trimmed.to_ascii_lowercase()),
            Self::Edges => match Edges::parse(trimmed) {
                Some(e) => Value::Edges(e),
                None => Value::text(raw),
            },
            Self::Overlays => match serde_json::from_str::<Vec<Overlay>>(trimmed) {
                Ok(list) => Value::Overlays(list),
                Err(_) => Value::text(raw),
            },
            Self::Text | Self::Fragment => Value::text(trimmed),
        }
    }

    fn accepts(self, value: &Value) -> bool {
        matches!(
            (self, value),
            (Self::Number, Value::Number(_))
                | (Self::Boolean, Value::Bool(_))
                | (Self::Text | Self::Enum | Self::SizeCode, Value::Text(_))
                | (Self::Edges, Value::Edges(_))
                | (Self::Fragment, Value::Fragment(_))
                | (Self::Overlays, Value::Overlays(_))
        )
    }
}

/// How instances sharing a name are combined.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum MergePolicy {
    /// The highest-priority instance wins.
    Replace,
    /// Every instance is kept, in order.
    Accumulate,
}

/// Whether a parameter is part of the downstream option map.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Exposure {
    /// Accepted as a Standard key and emitted by the formatter.
    Public,
    /// Accepted as a Standard key but consumed by the processor.
    Directive,
    /// Produced only by parsers and consumed by the processor.
    Internal,
}

/// Compile-time default value.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum DefaultValue {
    Number(f64),
    Text(&'static str),
}

impl DefaultValue {
    pub fn to_value(self) -> Value {
        match self {
            Self::Number(n) => Value::Number(n),
            Self::Text(s) => Value::text(s),
        }
    }
}

/// Registry entry for one canonical parameter.
#[derive(Debug)]
pub struct ParameterDefinition {
    pub name: &'static str,
    pub ty: ParamType,
    pub validator: Option<fn(&Value) -> bool>,
    pub allowed: &'static [&'static str],
    pub default: Option<DefaultValue>,
    pub formatter: Option<fn(&Value) -> Option<OptionValue>>,
    /// Canonical spelling for text values, applied before validation.
    pub normalizer: Option<fn(&str) -> String>,
    pub merge: MergePolicy,
    pub exposure: Exposure,
}

/// Outcome of [`ParameterDefinition::validate`].
#[derive(Clone, Debug, PartialEq)]
pub enum Validation {
    Valid(Value),
    /// The value failed; this default replaced it.
    Substituted(Value),
    /// The value failed and there is no default.
    Rejected,
}

impl ParameterDefinition {
    const fn new(name: &'static str, ty: ParamType) -> Self {
        Self {
            name,
            ty,
            validator: None,
            allowed: &[],
            default: None,
            formatter: None,
            normalizer: None,
            merge: MergePolicy::Replace,
            exposure: Exposure::Public,
        }
    }

    const fn validator(mut self, f: fn(&Value) -> bool) -> Self {
        self.validator = Some(f);
        self
    }

    const fn allowed(mut self, values: &'static [&'static str]) -> Self {
        self.allowed = values;
        self
    }

    const fn with_default(mut self, d: DefaultValue) -> Self {
        self.default = Some(d);
        self
    }

    const fn formatter(mut self, f: fn(&Value) -> Option<OptionValue>) -> Self {
        self.formatter = Some(f);
        self
    }

    const fn normalizer(mut self, f: fn(&str) -> String) -> Self {
        self.normalizer = Some(f);
        self
    }

    const fn accumulate(mut self) -> Self {
        self.merge = MergePolicy::Accumulate;
        self
    }

    const fn exposure(mut self, e: Exposure) -> Self {
        self.exposure = e;
        self
    }

    /// Check type, allowed values, and validator.
    pub fn is_valid(&self, value: &Value) -> bool {
        if !self.ty.accepts(value) {
            return false;
        }
        if !self.allowed.is_empty() {
            match value {
                Value::Text(s) if self.allowed.contains(&s.as_str()) => {}
                _ => return false,
            }
        }
        self.validator.is_none_or(|f| f(value))
    }

    /// Rewrite a text value into its canonical spelling.
    pub fn normalize(&self, value: Value) -> Value {
        match (self.normalizer, value) {
            (Some(f), Value::Text(s)) => Value::Text(f(&s)),
            (_, value) => value,
        }
    }

    /// Normalize and validate, substituting the default on failure.
    pub fn validate(&self, value: Value) -> Validation {
        let value = self.normalize(value);
        if self.is_valid(&value) {
            Validation::Valid(value)
        } else if let Some(d) = self.default {
            Validation::Substituted(d.to_value())
        } else {
            Validation::Rejected
        }
    }

    /// Wire representation, or `None` if the value has no wire form.
    pub fn format(&self, value: &Value) -> Option<OptionValue> {
        match self.formatter {
            Some(f) => f(value),
            None => OptionValue::from_value(value),
        }
    }
}

/// All known parameters, sorted by name.
pub static REGISTRY: &[ParameterDefinition] = &[
    ParameterDefinition::new("anim", ParamType::Boolean),
    ParameterDefinition::new("aspect", ParamType::Text)
        .validator(is_aspect)
        .exposure(Exposure::Directive),
    ParameterDefinition::new("background", ParamType::Text)
        .validator(is_color)
        .formatter(format_color),
    ParameterDefinition::new("blur", ParamType::Number).validator(is_blur),
    ParameterDefinition::new("brightness", ParamType::Number).validator(is_adjustment),
    ParameterDefinition::new("condition", ParamType::Text)
        .validator(is_non_empty)
        .accumulate()
        .exposure(Exposure::Internal),
    ParameterDefinition::new("contrast", ParamType::Number).validator(is_adjustment),
    ParameterDefinition::new("dpr", ParamType::Number).validator(is_dpr),
    ParameterDefinition::new("fit", ParamType::Enum).allowed(FIT_MODES),
    ParameterDefinition::new("flip", ParamType::Boolean),
    ParameterDefinition::new("flop", ParamType::Boolean),
    ParameterDefinition::new("format", ParamType::Enum)
        .allowed(FORMATS)
        .normalizer(normalize_format)
        .with_default(DefaultValue::Text("auto")),
    ParameterDefinition::new("gamma", ParamType::Number).validator(is_adjustment),
    ParameterDefinition::new("gravity", ParamType::Text)
        .validator(is_gravity)
        .normalizer(lowercase),
    ParameterDefinition::new("height", ParamType::Number)
        .validator(is_dimension)
        .formatter(format_int),
    ParameterDefinition::new("imheight", ParamType::Number)
        .validator(is_dimension)
        .exposure(Exposure::Internal),
    ParameterDefinition::new("imwidth", ParamType::Number)
        .validator(is_dimension)
        .exposure(Exposure::Internal),
    ParameterDefinition::new("metadata", ParamType::Enum).allowed(METADATA),
    ParameterDefinition::new("overlay", ParamType::Fragment)
        .accumulate()
        .exposure(Exposure::Internal),
    ParameterDefinition::new("overlays", ParamType::Overlays).validator(is_overlay_list),
    ParameterDefinition::new("quality", ParamType::Number)
        .validator(is_quality)
        .with_default(DefaultValue::Number(85.0))
        .formatter(format_int),
    ParameterDefinition::new("rotate", ParamType::Number)
        .validator(is_right_angle)
        .formatter(format_int),
    ParameterDefinition::new("saturation", ParamType::Number).validator(is_adjustment),
    ParameterDefinition::new("sharpen", ParamType::Number).validator(is_sharpen),
    ParameterDefinition::new("size", ParamType::SizeCode)
        .validator(is_size_code)
        .exposure(Exposure::Directive),
    ParameterDefinition::new("trim", ParamType::Edges)
        .validator(is_edges)
        .formatter(format_edges),
    ParameterDefinition::new("width", ParamType::Number)
        .validator(is_dimension)
        .formatter(format_int),
];

/// Downstream fit keywords.
pub const FIT_MODES: &[&str] = &["contain", "cover", "crop", "pad", "scale-down"];

pub const FORMATS: &[&str] = &[
    "auto",
    "avif",
    "baseline-jpeg",
    "gif",
    "jpeg",
    "json",
    "png",
    "webp",
];

pub const METADATA: &[&str] = &["copyright", "keep", "none"];

const GRAVITY_NAMES: &[&str] = &["auto", "bottom", "center", "face", "left", "right", "top"];

/// Look up a parameter by canonical name.
pub fn definition(name: &str) -> Option<&'static ParameterDefinition> {
    REGISTRY
        .binary_search_by_key(&name, |d| d.name)
        .ok()
        .map(|i| &REGISTRY[i])
}

/// Map a runtime string to its `'static` canonical name.
pub fn canonical_name(name: &str) -> Option<&'static str> {
    definition(name).map(|d| d.name)
}

/// Named size codes and their pixel widths, sorted by code.
pub static SIZE_CODES: &[(&str, u32)] = &[
    ("l", 1280),
    ("m", 960),
    ("s", 600),
    ("xl", 1600),
    ("xs", 320),
    ("xxl", 1920),
    ("xxs", 160),
    ("xxxl", 2560),
];

/// Pixel width for a size code (case-insensitive).
pub fn size_code_width(code: &str) -> Option<u32> {
    let lower = code.trim().to_ascii_lowercase();
    SIZE_CODES
        .binary_search_by_key(&lower.as_str(), |&(c, _)| c)
        .ok()
        .map(|i| SIZE_CODES[i].1)
}

/// Lowercase output format, with `jpg` spelled `jpeg`.
pub fn normalize_format(s: &str) -> String {
    let lower = s.trim().to_ascii_lowercase();
    match lower.as_str() {
        "jpg" => "jpeg".to_string(),
        _ => lower,
    }
}

fn lowercase(s: &str) -> String {
    s.trim().to_ascii_lowercase()
}

pub(crate) fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse `W:H` (or `WxH`) into a ratio pair.
pub(crate) fn parse_aspect(s: &str) -> Option<(f64, f64)> {
    let (w, h) = s.split_once(':').or_else(|| s.split_once('x'))?;
    let w: f64 = w.trim().parse().ok()?;
    let h: f64 = h.trim().parse().ok()?;
    (w > 0.0 && h > 0.0 && w.is_finite() && h.is_finite()).then_some((w, h))
}

// ---- Validators ----

fn number_in(value: &Value, min: f64, max: f64) -> bool {
    value.as_number().is_some_and(|n| (min..=max).contains(&n))
}

fn is_dimension(v: &Value) -> bool {
    number_in(v, 1.0, MAX_DIMENSION)
}

fn is_quality(v: &Value) -> bool {
    number_in(v, 1.0, 100.0)
}

fn is_blur(v: &Value) -> bool {
    number_in(v, 0.0, 250.0)
}

fn is_sharpen(v: &Value) -> bool {
    number_in(v, 0.0, 10.0)
}

fn is_adjustment(v: &Value) -> bool {
    number_in(v, 0.0, 10.0)
}

fn is_dpr(v: &Value) -> bool {
    number_in(v, 1.0, 4.0)
}

fn is_right_angle(v: &Value) -> bool {
    matches!(v.as_number(), Some(n) if n == 90.0 || n == 180.0 || n == 270.0)
}

fn is_non_empty(v: &Value) -> bool {
    v.as_text().is_some_and(|s| !s.trim().is_empty())
}

fn is_color(v: &Value) -> bool {
    v.as_text().and_then(color::parse_color).is_some()
}

fn is_aspect(v: &Value) -> bool {
    v.as_text().and_then(parse_aspect).is_some()
}

fn is_size_code(v: &Value) -> bool {
    v.as_text().and_then(size_code_width).is_some()
}

fn is_gravity(v: &Value) -> bool {
    let Some(s) = v.as_text() else {
        return false;
    };
    if GRAVITY_NAMES.contains(&s) {
        return true;
    }
    let Some((x, y)) = s.split_once('x') else {
        return false;
    };
    let unit = |p: &str| p.parse::<f64>().is_ok_and(|n| (0.0..=1.0).contains(&n));
    unit(x) && unit(y)
}

fn is_edges(v: &Value) -> bool {
    match v {
        Value::Edges(e) => [e.top, e.right, e.bottom, e.left]
            .iter()
            .all(|n| n.is_finite() && *n >= 0.0),
        _ => false,
    }
}

fn is_overlay_list(v: &Value) -> bool {
    match v {
        Value::Overlays(list) => list.iter().all(Overlay::is_valid),
        _ => false,
    }
}

// ---- Formatters ----

fn format_int(v: &Value) -> Option<OptionValue> {
    v.as_number()
        .map(|n| OptionValue::Int(num_traits::Float::round(n) as i64))
}

fn format_color(v: &Value) -> Option<OptionValue> {
    v.as_text()
        .and_then(color::normalize_color)
        .map(OptionValue::Text)
}

fn format_edges(v: &Value) -> Option<OptionValue> {
    match v {
        Value::Edges(e) => Some(OptionValue::Text(format!("{e}"))),
        _ => None,
    }
}
