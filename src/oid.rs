//! Object identifiers as owned integer paths.

use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OidError {
    #[error("empty OID")]
    Empty,
    #[error("invalid OID segment \"{segment}\" in \"{text}\"")]
    InvalidSegment { text: String, segment: String },
    #[error("cannot trim {trim} segments from {oid}")]
    TrimTooLong { oid: Oid, trim: usize },
}

/// A dotted OID path such as `.1.3.6.1.2.1.25.2.3.1.3`.
///
/// Ordering is lexicographic over the segments, which is the order a table walk returns rows in.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Oid(Vec<u32>);

impl Oid {
    pub fn new(segments: Vec<u32>) -> Oid {
        Oid(segments)
    }

    pub fn segments(&self) -> &[u32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The terminal segment, which is the row index for a table cell.
    pub fn last(&self) -> Option<u32> {
        self.0.last().copied()
    }

    /// True if `self` lies strictly below `base` in the tree.
    pub fn is_below(&self, base: &Oid) -> bool {
        self.0.len() > base.0.len() && self.0.starts_with(&base.0)
    }

    pub fn child(&self, segment: u32) -> Oid {
        let mut segments = self.0.clone();
        segments.push(segment);
        Oid(segments)
    }

    /// Removes `trim` trailing segments, appends `replacement` (with or without a leading dot)
    /// and finally `index`.
    ///
    /// ```rust
    /// # use snmpdisk::Oid;
    /// let names: Oid = ".1.3.6.1.2.1.25.2.3.1.3".parse().unwrap();
    /// let size = names.related(1, "5", 2).unwrap();
    /// assert_eq!(size.to_string(), ".1.3.6.1.2.1.25.2.3.1.5.2");
    /// assert_eq!(size, names.related(1, ".5", 2).unwrap());
    /// ```
    pub fn related(&self, trim: usize, replacement: &str, index: u32) -> Result<Oid, OidError> {
        if trim > self.0.len() {
            return Err(OidError::TrimTooLong {
                oid: self.clone(),
                trim,
            });
        }
        let mut segments = self.0[..self.0.len() - trim].to_vec();
        let replacement = replacement.strip_prefix('.').unwrap_or(replacement);
        if !replacement.is_empty() {
            segments.extend(parse_segments(replacement)?);
        }
        segments.push(index);
        Ok(Oid(segments))
    }
}

impl From<&[u32]> for Oid {
    fn from(segments: &[u32]) -> Self {
        Oid(segments.to_vec())
    }
}

impl FromStr for Oid {
    type Err = OidError;

    /// Accepts the path with or without a leading dot.
    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let body = text.strip_prefix('.').unwrap_or(text);
        if body.is_empty() {
            return Err(OidError::Empty);
        }
        parse_segments(body).map(Oid).map_err(|err| match err {
            OidError::InvalidSegment { segment, .. } => OidError::InvalidSegment {
                text: text.to_owned(),
                segment,
            },
            other => other,
        })
    }
}

fn parse_segments(body: &str) -> Result<Vec<u32>, OidError> {
    body.split('.')
        .map(|segment| {
            segment
                .parse::<u32>()
                .map_err(|_| OidError::InvalidSegment {
                    text: body.to_owned(),
                    segment: segment.to_owned(),
                })
        })
        .collect()
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.0 {
            write!(f, ".{}", segment)?;
        }
        Ok(())
    }
}
