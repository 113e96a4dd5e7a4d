//! Field values and the form value tree.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::FormError;
use crate::path::{FieldPath, PathSegment};

/// Shared `Null` returned for paths with no value.
pub(crate) static NULL: FieldValue = FieldValue::Null;

/// A value stored at a field path.
///
/// Equality is structural, so dirty checks compare values, not identity.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// No value.
    #[default]
    Null,
    /// Boolean (checkboxes).
    Bool(bool),
    /// Numeric value.
    Number(f64),
    /// Calendar date.
    Date(NaiveDate),
    /// Text value.
    Text(String),
    /// Ordered list of values.
    List(Vec<FieldValue>),
    /// Nested record.
    Object(BTreeMap<String, FieldValue>),
}

impl FieldValue {
    /// Returns whether the value counts as absent for a `required` rule.
    ///
    /// `Null`, blank text, an empty list and `false` are empty. Numbers are
    /// always present, including `0`.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Bool(b) => !b,
            Self::Text(s) => s.trim().is_empty(),
            Self::List(items) => items.is_empty(),
            Self::Number(_) | Self::Date(_) | Self::Object(_) => false,
        }
    }

    /// Returns the text, if this is a text value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the number, if this is a numeric value.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the boolean, if this is a boolean value.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the date, if this is a date value.
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(d) => Some(*d),
            _ => None,
        }
    }

    /// Returns the items, if this is a list.
    pub fn as_list(&self) -> Option<&[FieldValue]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the value at `segments` below this one.
    pub fn get_path(&self, segments: &[PathSegment]) -> Option<&FieldValue> {
        segments
            .iter()
            .try_fold(self, |node, segment| match (segment, node) {
                (PathSegment::Key(key), Self::Object(map)) => map.get(key),
                (PathSegment::Index(index), Self::List(items)) => items.get(*index),
                _ => None,
            })
    }

    /// Returns a mutable slot at `segments`, creating containers on the way.
    ///
    /// Intermediate values of the wrong shape are replaced. A list grows by
    /// at most one item; with `pad`, gaps are filled with `Null` instead.
    /// `path` is only used for errors.
    pub(crate) fn slot_mut(
        &mut self,
        path: &FieldPath,
        segments: &[PathSegment],
        pad: bool,
    ) -> Result<&mut FieldValue, FormError> {
        let Some((first, rest)) = segments.split_first() else {
            return Ok(self);
        };

        match (first, self) {
            (PathSegment::Key(key), Self::Object(map)) => {
                map.entry(key.clone()).or_default().slot_mut(path, rest, pad)
            }
            (PathSegment::Index(index), Self::List(items)) => {
                let index = *index;
                if index > items.len() && !pad {
                    return Err(FormError::IndexOutOfBounds {
                        path: path.clone(),
                        index,
                        len: items.len(),
                    });
                }
                if index >= items.len() {
                    items.resize(index + 1, Self::Null);
                }
                items[index].slot_mut(path, rest, pad)
            }
            (PathSegment::Key(_), slot) => {
                *slot = Self::Object(BTreeMap::new());
                slot.slot_mut(path, segments, pad)
            }
            (PathSegment::Index(_), slot) => {
                *slot = Self::List(Vec::new());
                slot.slot_mut(path, segments, pad)
            }
        }
    }

    /// Converts into a JSON value. Dates become `YYYY-MM-DD` strings.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Null => serde_json::Value::Null,
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Number(n) => serde_json::Number::from_f64(*n)
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
            Self::Date(d) => serde_json::Value::String(d.format("%Y-%m-%d").to_string()),
            Self::Text(s) => serde_json::Value::String(s.clone()),
            Self::List(items) => serde_json::Value::Array(items.iter().map(Self::to_json).collect()),
            Self::Object(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
        }
    }
}

impl From<serde_json::Value> for FieldValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => n.as_f64().map_or(Self::Null, Self::Number),
            serde_json::Value::String(s) => Self::Text(s),
            serde_json::Value::Array(items) => Self::List(items.into_iter().map(Self::from).collect()),
            serde_json::Value::Object(map) => {
                Self::Object(map.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
            }
        }
    }
}

impl<'de> Deserialize<'de> for FieldValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(Self::from)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<u32> for FieldValue {
    fn from(value: u32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<NaiveDate> for FieldValue {
    fn from(value: NaiveDate) -> Self {
        Self::Date(value)
    }
}

impl From<Vec<FieldValue>> for FieldValue {
    fn from(value: Vec<FieldValue>) -> Self {
        Self::List(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// How raw input is converted before it is stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ValueAs {
    /// Store the value as given.
    #[default]
    Raw,
    /// Parse text as a number; blank or unparsable text becomes `Null`.
    Number,
    /// Parse text as a `YYYY-MM-DD` date; blank or unparsable text becomes `Null`.
    Date,
}

impl ValueAs {
    /// Applies the conversion. Non-text values pass through unchanged.
    pub fn coerce(self, value: FieldValue) -> FieldValue {
        match (self, value) {
            (Self::Number, FieldValue::Text(s)) => s
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .map_or(FieldValue::Null, FieldValue::Number),
            (Self::Date, FieldValue::Text(s)) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
                .map_or(FieldValue::Null, FieldValue::Date),
            (_, value) => value,
        }
    }
}

/// The form's value tree: a record of top-level fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FormValues {
    fields: BTreeMap<String, FieldValue>,
}

impl FormValues {
    /// Creates an empty value tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value at `path`.
    pub fn get(&self, path: &FieldPath) -> Option<&FieldValue> {
        let (first, rest) = path.segments().split_first()?;
        let PathSegment::Key(key) = first else {
            return None;
        };
        self.fields.get(key)?.get_path(rest)
    }

    /// Returns the value at `path`, or `Null` when absent.
    pub fn get_or_null(&self, path: &FieldPath) -> &FieldValue {
        self.get(path).unwrap_or(&NULL)
    }

    /// Writes `value` at `path`, creating intermediate records and lists.
    ///
    /// A list index may be at most the list's length (append). Anything
    /// further is [`FormError::IndexOutOfBounds`]; a missing list counts as
    /// empty.
    pub fn set(&mut self, path: &FieldPath, value: FieldValue) -> Result<(), FormError> {
        self.check_indices(path)?;
        *self.slot_mut(path, false)? = value;
        Ok(())
    }

    /// Like [`set`](Self::set), but fills list gaps with `Null`.
    pub(crate) fn set_padded(&mut self, path: &FieldPath, value: FieldValue) {
        if let Ok(slot) = self.slot_mut(path, true) {
            *slot = value;
        }
    }

    /// Checks that [`set`](Self::set) would accept `path`, without writing.
    pub(crate) fn check_indices(&self, path: &FieldPath) -> Result<(), FormError> {
        let Some((PathSegment::Key(first), rest)) = path.segments().split_first() else {
            return Ok(());
        };
        let mut node = self.fields.get(first);
        for segment in rest {
            node = match (segment, node) {
                (PathSegment::Key(key), Some(FieldValue::Object(map))) => map.get(key),
                (PathSegment::Key(_), _) => None,
                (PathSegment::Index(index), Some(FieldValue::List(items))) => {
                    if *index > items.len() {
                        return Err(FormError::IndexOutOfBounds {
                            path: path.clone(),
                            index: *index,
                            len: items.len(),
                        });
                    }
                    items.get(*index)
                }
                (PathSegment::Index(index), _) => {
                    if *index > 0 {
                        return Err(FormError::IndexOutOfBounds {
                            path: path.clone(),
                            index: *index,
                            len: 0,
                        });
                    }
                    None
                }
            };
        }
        Ok(())
    }

    /// Removes and returns the value at `path`.
    ///
    /// Removing a list item shifts later items left.
    pub fn remove(&mut self, path: &FieldPath) -> Option<FieldValue> {
        let segments = path.segments();
        let (last, parent) = segments.split_last()?;

        if parent.is_empty() {
            let PathSegment::Key(key) = last else {
                return None;
            };
            return self.fields.remove(key);
        }

        let parent = self.get_mut(parent)?;
        match (last, parent) {
            (PathSegment::Key(key), FieldValue::Object(map)) => map.remove(key),
            (PathSegment::Index(index), FieldValue::List(items)) if *index < items.len() => {
                Some(items.remove(*index))
            }
            _ => None,
        }
    }

    /// Returns the list at `path`, creating an empty one if absent or `Null`.
    ///
    /// Fails with [`FormError::NotAnArray`] if a non-list value is stored there.
    pub(crate) fn list_mut(&mut self, path: &FieldPath) -> Result<&mut Vec<FieldValue>, FormError> {
        self.check_indices(path)?;
        let slot = self.slot_mut(path, false)?;
        if matches!(slot, FieldValue::Null) {
            *slot = FieldValue::List(Vec::new());
        }
        match slot {
            FieldValue::List(items) => Ok(items),
            _ => Err(FormError::NotAnArray(path.clone())),
        }
    }

    /// Returns the top-level field names and values.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns whether the tree has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Converts into a JSON object.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.fields
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect(),
        )
    }

    fn slot_mut(&mut self, path: &FieldPath, pad: bool) -> Result<&mut FieldValue, FormError> {
        let (first, rest) = match path.segments().split_first() {
            Some((PathSegment::Key(key), rest)) => (key.clone(), rest),
            // parsed paths always start with a key
            Some((PathSegment::Index(index), rest)) => (index.to_string(), rest),
            None => (String::new(), &[][..]),
        };
        self.fields.entry(first).or_default().slot_mut(path, rest, pad)
    }

    fn get_mut(&mut self, segments: &[PathSegment]) -> Option<&mut FieldValue> {
        let (first, rest) = segments.split_first()?;
        let PathSegment::Key(key) = first else {
            return None;
        };
        let mut node = self.fields.get_mut(key)?;
        for segment in rest {
            node = match (segment, node) {
                (PathSegment::Key(key), FieldValue::Object(map)) => map.get_mut(key)?,
                (PathSegment::Index(index), FieldValue::List(items)) => items.get_mut(*index)?,
                _ => return None,
            };
        }
        Some(node)
    }
}

impl From<BTreeMap<String, FieldValue>> for FormValues {
    fn from(fields: BTreeMap<String, FieldValue>) -> Self {
        Self { fields }
    }
}

impl TryFrom<serde_json::Value> for FormValues {
    type Error = FormError;

    fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        match FieldValue::from(value) {
            FieldValue::Object(fields) => Ok(Self { fields }),
            other => Err(FormError::NotAnObject(format!("{other:?}"))),
        }
    }
}

impl<'de> Deserialize<'de> for FormValues {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        Self::try_from(value).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn path(s: &str) -> FieldPath {
        FieldPath::parse(s).unwrap()
    }

    #[test]
    fn test_get_nested() {
        let values = FormValues::try_from(json!({
            "social": { "twitter": "@batman" },
            "phNumbers": [{ "number": "555" }],
        }))
        .unwrap();

        assert_eq!(
            values.get(&path("social.twitter")),
            Some(&FieldValue::from("@batman"))
        );
        assert_eq!(
            values.get(&path("phNumbers.0.number")),
            Some(&FieldValue::from("555"))
        );
        assert_eq!(values.get(&path("phNumbers.1.number")), None);
        assert_eq!(values.get_or_null(&path("missing")), &FieldValue::Null);
    }

    #[test]
    fn test_set_creates_containers() {
        let mut values = FormValues::new();
        values.set(&path("phoneNumbers.0"), "555-0100".into()).unwrap();
        values.set(&path("phoneNumbers.1"), "555-0101".into()).unwrap();
        values.set(&path("social.facebook"), "fb".into()).unwrap();

        assert_eq!(
            values.to_json(),
            json!({
                "phoneNumbers": ["555-0100", "555-0101"],
                "social": { "facebook": "fb" },
            })
        );
    }

    #[test]
    fn test_set_rejects_list_gaps() {
        let mut values = FormValues::try_from(json!({ "tags": ["a"] })).unwrap();

        for (p, index, len) in [
            ("tags.18446744073709551615", usize::MAX, 1),
            ("tags.1000000000", 1_000_000_000, 1),
            ("fresh.1", 1, 0),
        ] {
            let err = values.set(&path(p), "x".into()).unwrap_err();
            assert!(
                matches!(err, FormError::IndexOutOfBounds { index: i, len: l, .. } if i == index && l == len),
                "{p}: {err:?}"
            );
            assert!(values.check_indices(&path(p)).is_err());
        }
        assert_eq!(values.to_json(), json!({ "tags": ["a"] }));

        values.set(&path("tags.1"), "b".into()).unwrap();
        assert_eq!(values.to_json(), json!({ "tags": ["a", "b"] }));
    }

    #[test]
    fn test_remove_list_item_shifts() {
        let mut values = FormValues::try_from(json!({ "tags": ["a", "b", "c"] })).unwrap();
        assert_eq!(values.remove(&path("tags.0")), Some("a".into()));
        assert_eq!(values.to_json(), json!({ "tags": ["b", "c"] }));
    }

    #[test]
    fn test_is_empty_semantics() {
        assert!(FieldValue::Null.is_empty());
        assert!(FieldValue::from("   ").is_empty());
        assert!(FieldValue::from(false).is_empty());
        assert!(FieldValue::List(vec![]).is_empty());
        assert!(!FieldValue::from(0).is_empty());
        assert!(!FieldValue::from("x").is_empty());
    }

    #[test]
    fn test_coerce() {
        assert_eq!(ValueAs::Number.coerce("42".into()), FieldValue::Number(42.0));
        assert_eq!(ValueAs::Number.coerce("".into()), FieldValue::Null);
        assert_eq!(ValueAs::Number.coerce("abc".into()), FieldValue::Null);
        assert_eq!(
            ValueAs::Date.coerce("2024-01-15".into()),
            FieldValue::Date(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap())
        );
        assert_eq!(ValueAs::Date.coerce("15/01/2024".into()), FieldValue::Null);
        assert_eq!(ValueAs::Raw.coerce("42".into()), FieldValue::from("42"));
    }

    #[test]
    fn test_rejects_non_object_root() {
        assert!(FormValues::try_from(json!([1, 2])).is_err());
    }

    #[test]
    fn test_json_dates_as_strings() {
        let date = NaiveDate::from_ymd_opt(1990, 5, 1).unwrap();
        assert_eq!(FieldValue::Date(date).to_json(), json!("1990-05-01"));
    }
}
