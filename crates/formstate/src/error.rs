//! Error types for forms.

use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

use crate::path::{reindex_keys, FieldPath};
use crate::value::{FieldValue, FormValues};

/// Boxed error returned by default-value loaders.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Form-specific errors.
///
/// Field validation failures are not errors; they are collected in
/// [`FieldErrors`].
#[derive(Debug, Error)]
pub enum FormError {
    /// A path string could not be parsed.
    #[error("invalid field path `{path}`: {reason}")]
    InvalidPath { path: String, reason: &'static str },

    /// The field has not been registered.
    #[error("field not registered: {0}")]
    UnknownField(FieldPath),

    /// A non-list value is stored where a field array was expected.
    #[error("not an array field: {0}")]
    NotAnArray(FieldPath),

    /// An array operation referenced a missing entry.
    #[error("index {index} out of bounds for array field {path} of length {len}")]
    IndexOutOfBounds {
        path: FieldPath,
        index: usize,
        len: usize,
    },

    /// Default values are still loading, or failed to load.
    #[error("form is not ready: default values have not been loaded")]
    NotReady,

    /// The default-value loader has already run.
    #[error("default values have already been loaded")]
    AlreadyLoaded,

    /// The default-value loader failed.
    #[error("failed to load default values: {0}")]
    Initialization(#[source] BoxError),

    /// A validator could not produce a verdict.
    #[error("validator `{validator}` on field {path} failed: {reason}")]
    ValidatorFault {
        path: FieldPath,
        validator: String,
        reason: String,
    },

    /// A `pattern` rule was given an invalid regex.
    #[error("invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// Values were expected to be a record.
    #[error("form values must be an object, got {0}")]
    NotAnObject(String),
}

/// Returned by a validator that cannot decide, instead of a verdict.
///
/// This is a programming or infrastructure failure, not a validation
/// failure: it aborts the validation pass and surfaces as
/// [`FormError::ValidatorFault`].
#[derive(Debug, Clone, Error)]
#[error("{reason}")]
pub struct ValidatorFault {
    /// What went wrong.
    pub reason: String,
}

impl ValidatorFault {
    /// Creates a fault with the given reason.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// The active error of a single field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// The rule that failed: `required`, `pattern`, or a validator name.
    #[serde(rename = "type")]
    pub rule: String,
    /// Message shown to the user.
    pub message: String,
}

impl FieldError {
    /// Creates a field error.
    pub fn new(rule: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            rule: rule.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

/// Collection of field errors, at most one per field path.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors {
    pub(crate) errors: BTreeMap<FieldPath, FieldError>,
}

impl FieldErrors {
    /// Creates a new empty FieldErrors.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the error for a field, replacing any previous one.
    pub(crate) fn insert(&mut self, path: FieldPath, error: FieldError) {
        self.errors.insert(path, error);
    }

    /// Sets or clears the error for a field.
    pub(crate) fn set(&mut self, path: &FieldPath, error: Option<FieldError>) {
        match error {
            Some(error) => {
                self.errors.insert(path.clone(), error);
            }
            None => {
                self.errors.remove(path);
            }
        }
    }

    /// Removes the error for a field.
    pub fn remove(&mut self, path: &FieldPath) -> Option<FieldError> {
        self.errors.remove(path)
    }

    /// Removes every error.
    pub fn clear(&mut self) {
        self.errors.clear();
    }

    /// Returns whether there are any errors.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns the number of fields with errors.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Returns the error for a specific field.
    pub fn get(&self, path: &FieldPath) -> Option<&FieldError> {
        self.errors.get(path)
    }

    /// Returns the message for a dotted path, if that field has an error.
    pub fn message(&self, path: &str) -> Option<&str> {
        let path = FieldPath::parse(path).ok()?;
        self.errors.get(&path).map(|e| e.message.as_str())
    }

    /// Returns whether a field has an error.
    pub fn contains(&self, path: &FieldPath) -> bool {
        self.errors.contains_key(path)
    }

    /// Iterates errors in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&FieldPath, &FieldError)> {
        self.errors.iter()
    }

    /// Returns all errors as a flat list.
    pub fn all_errors(&self) -> Vec<(String, &str)> {
        self.errors
            .iter()
            .map(|(path, error)| (path.to_string(), error.message.as_str()))
            .collect()
    }

    /// Renders the errors as a nested tree mirroring the value tree.
    ///
    /// Lists are padded with `null` up to the highest index with an error.
    ///
    /// ```
    /// use formstate::{FieldError, Form, FormValues};
    /// use serde_json::json;
    ///
    /// let defaults = FormValues::try_from(json!({
    ///     "social": { "twitter": "" },
    ///     "phNumbers": [{ "number": "" }, { "number": "" }],
    /// }))
    /// .unwrap();
    /// let mut form = Form::builder().default_values(defaults).build().unwrap();
    /// form.set_error(
    ///     "social.twitter",
    ///     FieldError::new("required", "Enter twitter profile"),
    /// )
    /// .unwrap();
    /// assert_eq!(
    ///     form.errors().to_tree(),
    ///     json!({ "social": { "twitter": {
    ///         "type": "required", "message": "Enter twitter profile"
    ///     } } })
    /// );
    /// ```
    pub fn to_tree(&self) -> serde_json::Value {
        let mut tree = FormValues::new();
        for (path, error) in &self.errors {
            let node = FieldValue::Object(
                [
                    ("type".to_string(), FieldValue::from(error.rule.as_str())),
                    ("message".to_string(), FieldValue::from(error.message.as_str())),
                ]
                .into_iter()
                .collect(),
            );
            tree.set_padded(path, node);
        }
        tree.to_json()
    }

    pub(crate) fn reindex(&mut self, array: &FieldPath, reindex: &dyn Fn(usize) -> Option<usize>) {
        reindex_keys(&mut self.errors, array, reindex);
    }

    pub(crate) fn retain(&mut self, mut keep: impl FnMut(&FieldPath) -> bool) {
        self.errors.retain(|path, _| keep(path));
    }
}

impl std::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (path, error) in &self.errors {
            writeln!(f, "{path}: {error}")?;
        }
        Ok(())
    }
}

/// Result type alias for form operations.
pub type Result<T> = std::result::Result<T, FormError>;
