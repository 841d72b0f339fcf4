//! URL dialects and the parser selector.
//!
//! Each [`Dialect`] turns a [`Request`] into a flat list of
//! [`ParameterInstance`]s tagged with its [`Source`]. The set of dialects is
//! closed, so dispatch is a `match` rather than a trait object.
//!
//! | Dialect | Example |
//! |---|---|
//! | [`Dialect::Path`] | `/_width=800/cat.jpg`, `/thumbnail/cat.jpg` |
//! | [`Dialect::LegacyVendor`] | `im.width=800`, `im=Resize,width=800`, `/im(width=800)/` |
//! | [`Dialect::Standard`] | `width=800&fit=cover` |
//! | [`Dialect::Compact`] | `w=800&q=70&f=s` |

pub mod compact;
pub mod path;
pub mod standard;
pub mod vendor;

use alloc::string::ToString;
use alloc::vec::Vec;
use core::fmt;

use crate::config::Config;
use crate::diagnostics::ParseWarning;
use crate::param::{ParameterInstance, Source};
use crate::request::{Request, split_pair};

/// A URL syntax that can express a transformation request.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Dialect {
    Path,
    LegacyVendor,
    Standard,
    Compact,
}

impl Dialect {
    /// Every dialect, in evaluation order.
    pub const ALL: [Dialect; 4] = [
        Dialect::Path,
        Dialect::LegacyVendor,
        Dialect::Standard,
        Dialect::Compact,
    ];

    pub const fn source(self) -> Source {
        match self {
            Self::Path => Source::Path,
            Self::LegacyVendor => Source::LegacyVendor,
            Self::Standard => Source::Standard,
            Self::Compact => Source::Compact,
        }
    }

    pub const fn as_str(self) -> &'static str {
        self.source().as_str()
    }

    /// Cheap presence check. Never parses values.
    pub fn matches(self, request: &Request, config: &Config) -> bool {
        match self {
            Self::Standard => true,
            Self::Compact => request.keys().any(compact::claims_key),
            Self::Path => path::matches(request, config),
            Self::LegacyVendor => vendor::matches(request, &config.vendor_prefix),
        }
    }

    /// Whether a query key belongs to this dialect.
    pub fn claims_key(self, key: &str, config: &Config) -> bool {
        match self {
            Self::Standard => standard::claims_key(key),
            Self::Compact => compact::claims_key(key),
            Self::Path => false,
            Self::LegacyVendor => vendor::claims_key(key, &config.vendor_prefix),
        }
    }

    pub fn parse(self, request: &Request, ctx: &mut ParseContext<'_>) -> ParseOutput {
        match self {
            Self::Standard => standard::parse(request),
            Self::Compact => compact::parse(request),
            Self::Path => path::parse(request, ctx),
            Self::LegacyVendor => vendor::parse(request, ctx),
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Dialects applicable to a request, in evaluation order.
///
/// Standard is always included. Mixing dialects is not an error.
pub fn select(request: &Request, config: &Config) -> Vec<Dialect> {
    Dialect::ALL
        .into_iter()
        .filter(|d| d.matches(request, config))
        .inspect(|d| log::trace!("dialect {d} selected"))
        .collect()
}

/// State shared by every parser that runs for one request.
#[derive(Debug)]
pub struct ParseContext<'a> {
    pub config: &'a Config,
    next_occurrence: u32,
}

impl<'a> ParseContext<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self {
            config,
            next_occurrence: 0,
        }
    }

    /// Number the next composite directive.
    pub fn next_occurrence(&mut self) -> u32 {
        let n = self.next_occurrence;
        self.next_occurrence += 1;
        n
    }
}

/// What one parser produced.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ParseOutput {
    pub params: Vec<ParameterInstance>,
    pub warnings: Vec<ParseWarning>,
    /// Indices of path segments this parser consumed.
    pub consumed_segments: Vec<usize>,
}

impl ParseOutput {
    pub fn extend(&mut self, other: ParseOutput) {
        self.params.extend(other.params);
        self.warnings.extend(other.warnings);
        self.consumed_segments.extend(other.consumed_segments);
    }
}

/// Parse the then-clause of a condition.
///
/// A clause whose first token is a vendor directive name (`Resize,width=800`)
/// is read as an equals-notation directive chain. Anything else is a list of
/// `key=value` pairs separated by `,`, `;` or `&`, each tried as Standard,
/// then Compact, then a vendor parameter.
pub fn parse_clause(clause: &str, ctx: &mut ParseContext<'_>) -> ParseOutput {
    let first = clause.split([',', ';']).next().unwrap_or("").trim();
    if vendor::is_directive(first) {
        return vendor::parse_directives(clause, ctx);
    }

    let mut out = ParseOutput::default();
    let config = ctx.config;
    let prefix = config.vendor_prefix.as_str();
    for pair in clause.split([',', ';', '&']).map(str::trim).filter(|p| !p.is_empty()) {
        let (key, value) = split_pair(pair);
        let key = key.trim().to_ascii_lowercase();
        let value = value.trim();
        if let Some(inst) = standard::instance(&key, value, Source::Standard) {
            out.params.push(inst);
        } else if let Some(inst) = compact::instance(&key, value, Source::Compact) {
            out.params.push(inst);
        } else {
            let param = key
                .strip_prefix(prefix)
                .and_then(|k| k.strip_prefix('.'))
                .unwrap_or(&key);
            if vendor::is_param(param) {
                out.extend(vendor::parse_param(param, value, &key, ctx));
            } else {
                out.warnings.push(ParseWarning::KeyNotRecognized {
                    key: key.to_string(),
                    value: value.to_string(),
                });
            }
        }
    }
    out
}
