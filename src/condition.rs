//! Conditional transforms: `<property><op><threshold>,<then-clause>`.
//!
//! A directive is parsed up front but evaluated only once image dimensions
//! are known. The then-clause is kept as raw text; the processor parses it
//! in whichever dialect it is written in.
//!
//! ```text
//! width>1000,Resize,width=800
//! ratio>=16:9,w=1920&h=1080
//! format!=png,quality=70
//! ```

use alloc::string::{String, ToString};
use core::fmt;

use thiserror::Error;

use crate::registry::{normalize_format, parse_aspect};

/// Image properties a condition can test.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Property {
    Width,
    Height,
    /// `width / height`.
    Ratio,
    /// Source format name, e.g. `jpeg`.
    Format,
}

impl Property {
    fn parse(s: &str) -> Option<Self> {
        Some(match s.to_ascii_lowercase().as_str() {
            "width" | "w" => Self::Width,
            "height" | "h" => Self::Height,
            "ratio" | "aspect" => Self::Ratio,
            "format" => Self::Format,
            _ => return None,
        })
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Operator {
    Gt,
    Ge,
    Lt,
    Le,
    Eq,
    Ne,
}

impl Operator {
    /// Split a leading operator off `s`. Two-character operators first.
    fn split(s: &str) -> Option<(Self, &str)> {
        const OPS: &[(&str, Operator)] = &[
            (">=", Operator::Ge),
            ("<=", Operator::Le),
            ("!=", Operator::Ne),
            ("==", Operator::Eq),
            (">", Operator::Gt),
            ("<", Operator::Lt),
            ("=", Operator::Eq),
        ];
        OPS.iter()
            .find_map(|&(tok, op)| s.strip_prefix(tok).map(|rest| (op, rest)))
    }

    fn compare(self, lhs: f64, rhs: f64) -> bool {
        match self {
            Self::Gt => lhs > rhs,
            Self::Ge => lhs >= rhs,
            Self::Lt => lhs < rhs,
            Self::Le => lhs <= rhs,
            Self::Eq => lhs == rhs,
            Self::Ne => lhs != rhs,
        }
    }

    const fn as_str(self) -> &'static str {
        match self {
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Eq => "=",
            Self::Ne => "!=",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Threshold {
    Number(f64),
    Text(String),
}

/// Why a condition string could not be parsed.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
pub enum ConditionError {
    #[error("missing then-clause")]
    MissingThenClause,
    #[error("unknown property")]
    UnknownProperty,
    #[error("missing comparison operator")]
    MissingOperator,
    #[error("invalid threshold")]
    InvalidThreshold,
    #[error("operator not supported for format")]
    UnsupportedOperator,
}

impl ConditionError {
    /// Static description, for warnings.
    pub const fn reason(self) -> &'static str {
        match self {
            Self::MissingThenClause => "missing then-clause",
            Self::UnknownProperty => "unknown property",
            Self::MissingOperator => "missing comparison operator",
            Self::InvalidThreshold => "invalid threshold",
            Self::UnsupportedOperator => "operator not supported for format",
        }
    }
}

/// A parsed conditional transform.
#[derive(Clone, Debug, PartialEq)]
pub struct ConditionDirective {
    pub property: Property,
    pub operator: Operator,
    pub threshold: Threshold,
    /// Raw clause applied when the comparison holds.
    pub then_clause: String,
}

impl ConditionDirective {
    pub fn parse(s: &str) -> Result<Self, ConditionError> {
        let (test, then_clause) = s.split_once(',').ok_or(ConditionError::MissingThenClause)?;
        let then_clause = then_clause.trim();
        if then_clause.is_empty() {
            return Err(ConditionError::MissingThenClause);
        }

        let test = test.trim();
        let name_len = test
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(test.len());
        let property = Property::parse(&test[..name_len]).ok_or(ConditionError::UnknownProperty)?;
        let (operator, raw) =
            Operator::split(test[name_len..].trim_start()).ok_or(ConditionError::MissingOperator)?;
        let raw = raw.trim();

        let threshold = match property {
            Property::Width | Property::Height => Threshold::Number(parse_number(raw)?),
            Property::Ratio => match parse_aspect(raw) {
                Some((w, h)) => Threshold::Number(w / h),
                _ => Threshold::Number(parse_number(raw)?),
            },
            Property::Format => {
                if !matches!(operator, Operator::Eq | Operator::Ne) {
                    return Err(ConditionError::UnsupportedOperator);
                }
                if raw.is_empty() {
                    return Err(ConditionError::InvalidThreshold);
                }
                Threshold::Text(normalize_format(raw))
            }
        };

        Ok(Self {
            property,
            operator,
            threshold,
            then_clause: then_clause.to_string(),
        })
    }

    /// Evaluate against known image properties.
    ///
    /// `None` if the property is unavailable (no format, zero height).
    pub fn evaluate(&self, info: &ImageInfo) -> Option<bool> {
        match (&self.threshold, self.property) {
            (Threshold::Number(t), Property::Width) => {
                Some(self.operator.compare(f64::from(info.width), *t))
            }
            (Threshold::Number(t), Property::Height) => {
                Some(self.operator.compare(f64::from(info.height), *t))
            }
            (Threshold::Number(t), Property::Ratio) => {
                if info.height == 0 {
                    return None;
                }
                let ratio = f64::from(info.width) / f64::from(info.height);
                Some(self.operator.compare(ratio, *t))
            }
            (Threshold::Text(t), Property::Format) => {
                let actual = normalize_format(info.format.as_deref()?);
                let equal = actual == *t;
                Some(if self.operator == Operator::Ne { !equal } else { equal })
            }
            _ => None,
        }
    }
}

impl fmt::Display for ConditionDirective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prop = match self.property {
            Property::Width => "width",
            Property::Height => "height",
            Property::Ratio => "ratio",
            Property::Format => "format",
        };
        write!(f, "{prop}{}", self.operator.as_str())?;
        match &self.threshold {
            Threshold::Number(n) => write!(f, "{n}")?,
            Threshold::Text(s) => f.write_str(s)?,
        }
        write!(f, ",{}", self.then_clause)
    }
}

fn parse_number(raw: &str) -> Result<f64, ConditionError> {
    raw.parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .ok_or(ConditionError::InvalidThreshold)
}

/// Dimensions (exact or estimated) of the source image.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    pub format: Option<String>,
}

impl ImageInfo {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            format: None,
        }
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }
}

/// Source of image dimensions for condition evaluation.
///
/// Consulted at most once per request, and only if a condition needs it.
/// Returning `None` leaves every condition unsatisfied.
pub trait DimensionLookup {
    fn lookup(&self) -> Option<ImageInfo>;
}

impl DimensionLookup for ImageInfo {
    fn lookup(&self) -> Option<ImageInfo> {
        Some(self.clone())
    }
}

impl DimensionLookup for Option<ImageInfo> {
    fn lookup(&self) -> Option<ImageInfo> {
        self.clone()
    }
}

/// No dimensions available.
impl DimensionLookup for () {
    fn lookup(&self) -> Option<ImageInfo> {
        None
    }
}

impl<T: DimensionLookup + ?Sized> DimensionLookup for &T {
    fn lookup(&self) -> Option<ImageInfo> {
        (**self).lookup()
    }
}

/// Closure-backed lookup, e.g. a metadata store query.
pub struct LookupFn<F>(pub F);

impl<F: Fn() -> Option<ImageInfo>> DimensionLookup for LookupFn<F> {
    fn lookup(&self) -> Option<ImageInfo> {
        (self.0)()
    }
}
