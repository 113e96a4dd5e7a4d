//! Typed field paths.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::error::{FormError, Result};

/// A segment in a field path.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PathSegment {
    /// A named field in an object (e.g., `social`).
    Key(String),
    /// A position in a list (e.g., the `0` in `phNumbers.0`).
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => f.write_str(key),
            Self::Index(index) => write!(f, "{index}"),
        }
    }
}

/// An address into the form's value tree.
///
/// Paths are written with dots: `social.twitter`, `phNumbers.1.number`.
/// A segment made only of ASCII digits is a list index (no leading zeros);
/// anything else is an object key. The first segment is always a key.
///
/// # Example
///
/// ```
/// use formstate::{FieldPath, PathSegment};
///
/// let path = FieldPath::parse("phNumbers.1.number").unwrap();
/// assert_eq!(path.segments()[1], PathSegment::Index(1));
/// assert_eq!(path.to_string(), "phNumbers.1.number");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FieldPath {
    segments: Vec<PathSegment>,
}

impl FieldPath {
    /// Parses a dotted path string.
    pub fn parse(path: &str) -> Result<Self> {
        let invalid = |reason| FormError::InvalidPath {
            path: path.to_string(),
            reason,
        };

        if path.is_empty() {
            return Err(invalid("path is empty"));
        }

        let mut segments = Vec::new();
        for part in path.split('.') {
            if part.is_empty() {
                return Err(invalid("path contains an empty segment"));
            }
            if part.bytes().all(|b| b.is_ascii_digit()) {
                if part.len() > 1 && part.starts_with('0') {
                    return Err(invalid("list index has a leading zero"));
                }
                let index = part
                    .parse()
                    .map_err(|_| invalid("list index is out of range"))?;
                segments.push(PathSegment::Index(index));
            } else {
                segments.push(PathSegment::Key(part.to_string()));
            }
        }

        if !matches!(segments.first(), Some(PathSegment::Key(_))) {
            return Err(invalid("path must start with a field name"));
        }

        Ok(Self { segments })
    }

    /// Creates a single-segment path for a top-level field.
    pub fn key(name: impl Into<String>) -> Self {
        Self {
            segments: vec![PathSegment::Key(name.into())],
        }
    }

    /// Returns the path segments.
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Returns the number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Always false; a parsed path has at least one segment.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns this path extended with an object key.
    #[must_use]
    pub fn child(&self, key: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(PathSegment::Key(key.into()));
        Self { segments }
    }

    /// Returns this path extended with a list index.
    #[must_use]
    pub fn index(&self, index: usize) -> Self {
        let mut segments = self.segments.clone();
        segments.push(PathSegment::Index(index));
        Self { segments }
    }

    /// Returns this path extended with all segments of `other`.
    #[must_use]
    pub fn join(&self, other: &Self) -> Self {
        let mut segments = self.segments.clone();
        segments.extend(other.segments.iter().cloned());
        Self { segments }
    }

    /// Returns the parent path, or `None` for a top-level field.
    pub fn parent(&self) -> Option<Self> {
        (self.segments.len() > 1).then(|| Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// Returns whether `prefix` is this path or one of its ancestors.
    pub fn starts_with(&self, prefix: &Self) -> bool {
        self.segments.starts_with(&prefix.segments)
    }

    /// Returns whether either path contains the other.
    ///
    /// A change to `social` affects `social.twitter` and vice versa.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.starts_with(other) || other.starts_with(self)
    }

    /// Returns the index of the array entry this path lives under.
    ///
    /// `phNumbers.2.number` is under entry 2 of `phNumbers`; `phNumbers`
    /// itself is under no entry.
    pub fn index_under(&self, array: &Self) -> Option<usize> {
        if !self.starts_with(array) {
            return None;
        }
        match self.segments.get(array.segments.len()) {
            Some(PathSegment::Index(index)) => Some(*index),
            _ => None,
        }
    }

    /// Returns this path moved to entry `index` of `array`.
    ///
    /// Only meaningful when [`index_under`](Self::index_under) is `Some`.
    #[must_use]
    pub fn with_index_under(&self, array: &Self, index: usize) -> Self {
        let mut segments = self.segments.clone();
        if let Some(segment) = segments.get_mut(array.segments.len()) {
            *segment = PathSegment::Index(index);
        }
        Self { segments }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

impl FromStr for FieldPath {
    type Err = FormError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for FieldPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Conversion into a [`FieldPath`], accepted wherever a path is expected.
pub trait IntoFieldPath {
    /// Converts into a path, parsing if needed.
    fn into_field_path(self) -> Result<FieldPath>;
}

impl IntoFieldPath for FieldPath {
    fn into_field_path(self) -> Result<FieldPath> {
        Ok(self)
    }
}

impl IntoFieldPath for &FieldPath {
    fn into_field_path(self) -> Result<FieldPath> {
        Ok(self.clone())
    }
}

impl IntoFieldPath for &str {
    fn into_field_path(self) -> Result<FieldPath> {
        FieldPath::parse(self)
    }
}

impl IntoFieldPath for String {
    fn into_field_path(self) -> Result<FieldPath> {
        FieldPath::parse(&self)
    }
}

impl IntoFieldPath for &String {
    fn into_field_path(self) -> Result<FieldPath> {
        FieldPath::parse(self)
    }
}

/// Moves every key living under an entry of `array` to the entry index
/// chosen by `reindex`; keys whose entry maps to `None` are dropped.
pub(crate) fn reindex_keys<V>(
    map: &mut BTreeMap<FieldPath, V>,
    array: &FieldPath,
    reindex: &dyn Fn(usize) -> Option<usize>,
) {
    let affected: Vec<FieldPath> = map
        .keys()
        .filter(|path| path.index_under(array).is_some())
        .cloned()
        .collect();

    let moved: Vec<(FieldPath, V)> = affected
        .into_iter()
        .filter_map(|path| map.remove(&path).map(|value| (path, value)))
        .collect();

    for (path, value) in moved {
        let target = path.index_under(array).and_then(reindex);
        if let Some(index) = target {
            map.insert(path.with_index_under(array, index), value);
        }
    }
}
