//! Field registration options and the field registry.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use regex::Regex;

use crate::error::Result;
use crate::path::{reindex_keys, FieldPath, IntoFieldPath};
use crate::validation::{AsyncValidator, Message, RegexValidator, RequiredValidator, Validator};
use crate::value::{FormValues, ValueAs};

/// Kind of a validation rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidatorKind {
    /// Value must be present.
    Required,
    /// Text must match a regex.
    Pattern,
    /// Named synchronous check.
    CustomSync,
    /// Named asynchronous check.
    CustomAsync,
}

/// The callable part of a named validator.
#[derive(Clone)]
pub enum Check {
    /// Runs inline.
    Sync(Arc<dyn Validator>),
    /// Runs as a suspended task.
    Async(Arc<dyn AsyncValidator>),
}

/// A custom validator with the name reported in [`crate::FieldError::rule`].
#[derive(Clone)]
pub struct NamedValidator {
    /// Validator name (e.g., `notAdmin`).
    pub name: String,
    /// The check to run.
    pub check: Check,
}

impl NamedValidator {
    /// Returns the validator kind.
    pub fn kind(&self) -> ValidatorKind {
        match self.check {
            Check::Sync(_) => ValidatorKind::CustomSync,
            Check::Async(_) => ValidatorKind::CustomAsync,
        }
    }
}

impl fmt::Debug for NamedValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamedValidator")
            .field("name", &self.name)
            .field("kind", &self.kind())
            .finish_non_exhaustive()
    }
}

type DisabledWhen = Arc<dyn Fn(&FormValues) -> bool + Send + Sync>;

/// Options for registering a field: its rules and value handling.
///
/// ```
/// use formstate::FieldOptions;
///
/// let email = FieldOptions::new()
///     .required("Email is required")
///     .pattern(r"^\S+@\S+$", "Invalid email format")
///     .unwrap();
/// assert_eq!(email.validator_count(), 2);
/// ```
#[derive(Clone, Default)]
pub struct FieldOptions {
    pub(crate) required: Option<RequiredValidator>,
    pub(crate) pattern: Option<RegexValidator>,
    pub(crate) validators: Vec<NamedValidator>,
    pub(crate) value_as: ValueAs,
    pub(crate) disabled: bool,
    pub(crate) disabled_when: Option<DisabledWhen>,
}

impl fmt::Debug for FieldOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldOptions")
            .field("required", &self.required.is_some())
            .field("pattern", &self.pattern.is_some())
            .field("validators", &self.validators)
            .field("value_as", &self.value_as)
            .field("disabled", &self.disabled)
            .finish_non_exhaustive()
    }
}

impl FieldOptions {
    /// Creates options with no rules.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the field required.
    #[must_use]
    pub fn required(mut self, message: impl Into<Message>) -> Self {
        self.required = Some(RequiredValidator::with_message(message));
        self
    }

    /// Requires present text to match `pattern`.
    pub fn pattern(self, pattern: &str, message: impl Into<Message>) -> Result<Self> {
        Ok(self.pattern_regex(Regex::new(pattern)?, message))
    }

    /// Requires present text to match a compiled regex.
    #[must_use]
    pub fn pattern_regex(mut self, pattern: Regex, message: impl Into<Message>) -> Self {
        self.pattern = Some(RegexValidator::from_regex(pattern, message));
        self
    }

    /// Adds a named synchronous validator.
    #[must_use]
    pub fn validate(mut self, name: impl Into<String>, validator: impl Validator + 'static) -> Self {
        self.validators.push(NamedValidator {
            name: name.into(),
            check: Check::Sync(Arc::new(validator)),
        });
        self
    }

    /// Adds a named asynchronous validator.
    #[must_use]
    pub fn validate_async(
        mut self,
        name: impl Into<String>,
        validator: impl AsyncValidator + 'static,
    ) -> Self {
        self.validators.push(NamedValidator {
            name: name.into(),
            check: Check::Async(Arc::new(validator)),
        });
        self
    }

    /// Parses text input as a number.
    #[must_use]
    pub fn value_as_number(mut self) -> Self {
        self.value_as = ValueAs::Number;
        self
    }

    /// Parses text input as a date.
    #[must_use]
    pub fn value_as_date(mut self) -> Self {
        self.value_as = ValueAs::Date;
        self
    }

    /// Disables the field.
    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    /// Disables the field whenever `predicate` holds for the current values.
    #[must_use]
    pub fn disabled_when(
        mut self,
        predicate: impl Fn(&FormValues) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.disabled_when = Some(Arc::new(predicate));
        self
    }

    /// Returns the number of rules (required, pattern and named validators).
    pub fn validator_count(&self) -> usize {
        usize::from(self.required.is_some())
            + usize::from(self.pattern.is_some())
            + self.validators.len()
    }

    /// Lists the rules by name and kind, in evaluation order.
    ///
    /// ```
    /// use formstate::{FieldOptions, ValidatorKind};
    ///
    /// let email = FieldOptions::new()
    ///     .required("Email is required")
    ///     .pattern(r"^\S+@\S+$", "Invalid email format")
    ///     .unwrap();
    /// assert_eq!(
    ///     email.rules(),
    ///     vec![("required", ValidatorKind::Required), ("pattern", ValidatorKind::Pattern)]
    /// );
    /// ```
    pub fn rules(&self) -> Vec<(&str, ValidatorKind)> {
        let required = self
            .required
            .as_ref()
            .map(|_| ("required", ValidatorKind::Required));
        let pattern = self
            .pattern
            .as_ref()
            .map(|_| ("pattern", ValidatorKind::Pattern));
        required
            .into_iter()
            .chain(pattern)
            .chain(self.validators.iter().map(|v| (v.name.as_str(), v.kind())))
            .collect()
    }

    /// Returns the input conversion.
    pub fn value_as(&self) -> ValueAs {
        self.value_as
    }

    pub(crate) fn is_disabled(&self, values: &FormValues) -> bool {
        self.disabled || self.disabled_when.as_ref().is_some_and(|f| f(values))
    }
}

/// Returned by `register`; names the registered field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldHandle {
    path: FieldPath,
}

impl FieldHandle {
    pub(crate) fn new(path: FieldPath) -> Self {
        Self { path }
    }

    /// Returns the field path.
    pub fn path(&self) -> &FieldPath {
        &self.path
    }

    /// Returns the dotted field name.
    pub fn name(&self) -> String {
        self.path.to_string()
    }
}

impl IntoFieldPath for &FieldHandle {
    fn into_field_path(self) -> Result<FieldPath> {
        Ok(self.path.clone())
    }
}

/// Registry entry for one field. The value itself lives in the value tree.
#[derive(Debug)]
pub(crate) struct FieldEntry {
    pub options: FieldOptions,
    pub touched: bool,
    pub dirty: bool,
    pub disabled: bool,
    /// Bumped whenever the field's value changes.
    pub generation: u64,
    /// Generation of the in-flight async validation.
    pub validating: Option<u64>,
}

/// Per-field rules and metadata, keyed by path.
#[derive(Debug, Default)]
pub(crate) struct FieldRegistry {
    fields: BTreeMap<FieldPath, FieldEntry>,
    next_generation: u64,
}

impl FieldRegistry {
    /// Registers a field. Re-registering replaces the rules and keeps the
    /// metadata. Returns whether an entry was replaced.
    pub fn register(&mut self, path: FieldPath, options: FieldOptions) -> bool {
        if let Some(entry) = self.fields.get_mut(&path) {
            entry.options = options;
            return true;
        }
        let generation = self.next_generation();
        self.fields.insert(
            path,
            FieldEntry {
                options,
                touched: false,
                dirty: false,
                disabled: false,
                generation,
                validating: None,
            },
        );
        false
    }

    pub fn unregister(&mut self, path: &FieldPath) -> Option<FieldEntry> {
        self.fields.remove(path)
    }

    pub fn contains(&self, path: &FieldPath) -> bool {
        self.fields.contains_key(path)
    }

    pub fn get(&self, path: &FieldPath) -> Option<&FieldEntry> {
        self.fields.get(path)
    }

    pub fn get_mut(&mut self, path: &FieldPath) -> Option<&mut FieldEntry> {
        self.fields.get_mut(path)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FieldPath, &FieldEntry)> {
        self.fields.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&FieldPath, &mut FieldEntry)> {
        self.fields.iter_mut()
    }

    pub fn paths(&self) -> Vec<FieldPath> {
        self.fields.keys().cloned().collect()
    }

    /// Registered paths equal to, inside, or containing `path`.
    pub fn overlapping(&self, path: &FieldPath) -> Vec<FieldPath> {
        self.fields
            .keys()
            .filter(|p| p.overlaps(path))
            .cloned()
            .collect()
    }

    /// Marks every field overlapping `path` as changed. In-flight
    /// validations for those fields become stale.
    pub fn bump(&mut self, path: &FieldPath) {
        let mut next = self.next_generation;
        for (p, entry) in &mut self.fields {
            if p.overlaps(path) {
                next += 1;
                entry.generation = next;
                entry.validating = None;
            }
        }
        self.next_generation = next;
    }

    /// Marks every field as changed.
    pub fn bump_all(&mut self) {
        let mut next = self.next_generation;
        for entry in self.fields.values_mut() {
            next += 1;
            entry.generation = next;
            entry.validating = None;
        }
        self.next_generation = next;
    }

    /// Registered paths equal to or inside `path`.
    pub fn under(&self, path: &FieldPath) -> Vec<FieldPath> {
        self.fields
            .keys()
            .filter(|p| p.starts_with(path))
            .cloned()
            .collect()
    }

    pub fn reindex(&mut self, array: &FieldPath, reindex: &dyn Fn(usize) -> Option<usize>) {
        reindex_keys(&mut self.fields, array, reindex);
    }

    pub fn retain(&mut self, mut keep: impl FnMut(&FieldPath) -> bool) {
        self.fields.retain(|path, _| keep(path));
    }

    fn next_generation(&mut self) -> u64 {
        self.next_generation += 1;
        self.next_generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::{AsyncFnValidator, FnValidator, Verdict};
    use crate::value::FieldValue;

    #[test]
    fn test_options_builder() {
        let options = FieldOptions::new()
            .required("Username is required")
            .validate(
                "notAdmin",
                FnValidator::new(|value: &FieldValue, _: &FormValues| {
                    Ok(Verdict::check(value.as_str() != Some("admin"), "Reserved"))
                }),
            )
            .value_as_number();

        assert_eq!(options.validator_count(), 2);
        assert_eq!(options.value_as(), ValueAs::Number);
        assert_eq!(options.validators[0].kind(), ValidatorKind::CustomSync);
    }

    #[test]
    fn test_rules_in_evaluation_order() {
        let options = FieldOptions::new()
            .validate_async(
                "emailAvailable",
                AsyncFnValidator::new(|_: FieldValue, _: FormValues| async { Ok(Verdict::Pass) }),
            )
            .pattern(r"^\S+@\S+$", "Invalid email format")
            .unwrap()
            .required("Email is required");

        assert_eq!(
            options.rules(),
            vec![
                ("required", ValidatorKind::Required),
                ("pattern", ValidatorKind::Pattern),
                ("emailAvailable", ValidatorKind::CustomAsync),
            ]
        );
    }

    #[test]
    fn test_invalid_pattern() {
        assert!(FieldOptions::new().pattern("(unclosed", "bad").is_err());
    }

    #[test]
    fn test_reregister_keeps_metadata() {
        let mut registry = FieldRegistry::default();
        let path = FieldPath::key("username");

        assert!(!registry.register(path.clone(), FieldOptions::new()));
        registry.get_mut(&path).unwrap().touched = true;
        assert!(registry.register(path.clone(), FieldOptions::new().required("x")));

        let entry = registry.get(&path).unwrap();
        assert!(entry.touched);
        assert!(entry.options.required.is_some());
    }

    #[test]
    fn test_bump_overlapping() {
        let mut registry = FieldRegistry::default();
        let twitter = FieldPath::parse("social.twitter").unwrap();
        let email = FieldPath::key("email");
        registry.register(twitter.clone(), FieldOptions::new());
        registry.register(email.clone(), FieldOptions::new());

        let before_twitter = registry.get(&twitter).unwrap().generation;
        let before_email = registry.get(&email).unwrap().generation;
        registry.bump(&FieldPath::key("social"));

        assert_ne!(registry.get(&twitter).unwrap().generation, before_twitter);
        assert_eq!(registry.get(&email).unwrap().generation, before_email);
    }

    #[test]
    fn test_under_excludes_ancestors() {
        let mut registry = FieldRegistry::default();
        let twitter = FieldPath::parse("social.twitter").unwrap();
        registry.register(twitter.clone(), FieldOptions::new());
        registry.register(FieldPath::key("social"), FieldOptions::new());

        assert_eq!(registry.under(&twitter), vec![twitter.clone()]);
        assert_eq!(registry.under(&FieldPath::key("social")).len(), 2);
        assert!(registry.under(&FieldPath::key("email")).is_empty());
    }

    #[test]
    fn test_disabled_when() {
        let options = FieldOptions::new().disabled_when(|values| {
            values
                .get(&FieldPath::key("channel"))
                .is_none_or(|v| v.is_empty())
        });
        assert!(options.is_disabled(&FormValues::new()));
    }
}
