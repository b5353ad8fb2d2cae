//! Threshold ranges in the Nagios plugin syntax.
//!
//! ```text
//! [@]start:end    alarm outside [start, end], or inside it with `@`
//! 10              shorthand for 0:10
//! 10:             10 up to +infinity
//! :10             0 up to 10 (an empty left side means 0)
//! ~:10            -infinity up to 10
//! ```
//!
//! ```rust
//! # use snmpdisk::RangeSpec;
//! let spec: RangeSpec = "10:90".parse().unwrap();
//! assert!(!spec.triggers(10.0));
//! assert!(spec.triggers(90.5));
//! assert_eq!(spec.to_string(), "10:90");
//! ```

use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RangeParseError {
    #[error("empty range")]
    Empty,
    #[error("range \"{0}\" has no bounds")]
    MissingBounds(String),
    #[error("range \"{0}\" has more than one ':'")]
    TooManyColons(String),
    #[error("invalid bound \"{0}\"")]
    InvalidBound(String),
    #[error("lower bound {lower} is greater than upper bound {upper}")]
    Inverted { lower: f64, upper: f64 },
}

/// A parsed threshold range. Both bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeSpec {
    negate: bool,
    lower: f64,
    upper: f64,
}

impl RangeSpec {
    /// Builds a range from already resolved bounds. Use `f64::NEG_INFINITY` and `f64::INFINITY`
    /// for open ends.
    pub fn new(lower: f64, upper: f64, negate: bool) -> Result<Self, RangeParseError> {
        if lower.is_nan()
            || upper.is_nan()
            || lower == f64::INFINITY
            || upper == f64::NEG_INFINITY
        {
            return Err(RangeParseError::InvalidBound(format!("{}:{}", lower, upper)));
        }
        if lower > upper {
            return Err(RangeParseError::Inverted { lower, upper });
        }
        Ok(RangeSpec {
            negate,
            lower,
            upper,
        })
    }

    /// True if the alarm fires when the value lies inside the range (`@` prefix).
    pub fn is_negated(&self) -> bool {
        self.negate
    }

    pub fn lower(&self) -> f64 {
        self.lower
    }

    pub fn upper(&self) -> f64 {
        self.upper
    }

    /// The same bounds with the opposite alarm polarity.
    pub fn negated(&self) -> RangeSpec {
        RangeSpec {
            negate: !self.negate,
            ..*self
        }
    }

    /// Returns true if `value` is alarming for this range.
    pub fn triggers(&self, value: f64) -> bool {
        if self.negate {
            self.lower <= value && value <= self.upper
        } else {
            value < self.lower || value > self.upper
        }
    }
}

impl FromStr for RangeSpec {
    type Err = RangeParseError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let (negate, range) = match text.strip_prefix('@') {
            Some(rest) => (true, rest),
            None => (false, text),
        };
        if range.is_empty() {
            return Err(RangeParseError::Empty);
        }

        let (lower, upper) = match range.split_once(':') {
            None => (0.0, parse_upper(range)?),
            Some((_, right)) if right.contains(':') => {
                return Err(RangeParseError::TooManyColons(text.to_owned()))
            }
            Some(("", "")) => return Err(RangeParseError::MissingBounds(text.to_owned())),
            Some((left, right)) => {
                let lower = if left.is_empty() {
                    0.0
                } else {
                    parse_lower(left)?
                };
                let upper = if right.is_empty() {
                    f64::INFINITY
                } else {
                    parse_upper(right)?
                };
                (lower, upper)
            }
        };

        RangeSpec::new(lower, upper, negate)
    }
}

fn parse_lower(bound: &str) -> Result<f64, RangeParseError> {
    if bound == "~" {
        return Ok(f64::NEG_INFINITY);
    }
    parse_number(bound)
}

fn parse_upper(bound: &str) -> Result<f64, RangeParseError> {
    parse_number(bound)
}

fn parse_number(bound: &str) -> Result<f64, RangeParseError> {
    match bound.parse::<f64>() {
        Ok(n) if n.is_finite() => Ok(n),
        _ => Err(RangeParseError::InvalidBound(bound.to_owned())),
    }
}

/// Renders the canonical text form, which parses back into an equal range.
impl fmt::Display for RangeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negate {
            f.write_str("@")?;
        }
        if self.lower == 0.0 && self.upper.is_finite() {
            return write!(f, "{}", self.upper);
        }
        if self.lower == f64::NEG_INFINITY {
            f.write_str("~:")?;
        } else {
            write!(f, "{}:", self.lower)?;
        }
        if self.upper.is_finite() {
            write!(f, "{}", self.upper)?;
        }
        Ok(())
    }
}
