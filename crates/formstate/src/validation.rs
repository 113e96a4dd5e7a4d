//! Field validators.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use regex::Regex;

use crate::error::ValidatorFault;
use crate::value::{FieldValue, FormValues};

/// A boxed future for async validators and loaders.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Outcome of a single validator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// The value is acceptable.
    Pass,
    /// The value is rejected with this message.
    Fail(String),
}

impl Verdict {
    /// Creates a failing verdict.
    pub fn fail(message: impl Into<String>) -> Self {
        Self::Fail(message.into())
    }

    /// Passes when `ok` holds, otherwise fails with `message`.
    pub fn check(ok: bool, message: impl Into<String>) -> Self {
        if ok {
            Self::Pass
        } else {
            Self::Fail(message.into())
        }
    }

    /// Returns whether this verdict passes.
    pub fn is_pass(&self) -> bool {
        matches!(self, Self::Pass)
    }
}

/// Error message of a rule: fixed text, or built from the rejected value.
#[derive(Clone)]
pub enum Message {
    /// Fixed text.
    Static(String),
    /// Text computed from the candidate value.
    Dynamic(Arc<dyn Fn(&FieldValue) -> String + Send + Sync>),
}

impl Message {
    /// Creates a message computed from the candidate value.
    pub fn from_fn(f: impl Fn(&FieldValue) -> String + Send + Sync + 'static) -> Self {
        Self::Dynamic(Arc::new(f))
    }

    /// Renders the message for a value.
    pub fn render(&self, value: &FieldValue) -> String {
        match self {
            Self::Static(text) => text.clone(),
            Self::Dynamic(f) => f(value),
        }
    }
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(text) => f.debug_tuple("Static").field(text).finish(),
            Self::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

impl From<&str> for Message {
    fn from(text: &str) -> Self {
        Self::Static(text.to_string())
    }
}

impl From<String> for Message {
    fn from(text: String) -> Self {
        Self::Static(text)
    }
}

/// Trait for synchronous field validators.
///
/// `values` is the whole form, so a rule can look at sibling fields.
/// Returning `Err` means the validator itself failed; that aborts validation
/// instead of marking the field invalid.
pub trait Validator: Send + Sync {
    /// Validates a value.
    fn validate(&self, value: &FieldValue, values: &FormValues) -> Result<Verdict, ValidatorFault>;
}

/// Trait for asynchronous field validators, such as remote lookups.
///
/// The validator receives owned snapshots so the returned future does not
/// borrow the form.
pub trait AsyncValidator: Send + Sync {
    /// Validates a value.
    fn validate(
        &self,
        value: FieldValue,
        values: FormValues,
    ) -> BoxFuture<'static, Result<Verdict, ValidatorFault>>;
}

/// Validator that requires a non-empty value.
///
/// See [`FieldValue::is_empty`] for what counts as empty; `0` is present.
#[derive(Debug, Clone)]
pub struct RequiredValidator {
    message: Message,
}

impl RequiredValidator {
    /// Creates a new RequiredValidator with default message.
    pub fn new() -> Self {
        Self::with_message("This field is required.")
    }

    /// Creates a new RequiredValidator with custom message.
    pub fn with_message(message: impl Into<Message>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Default for RequiredValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl Validator for RequiredValidator {
    fn validate(&self, value: &FieldValue, _: &FormValues) -> Result<Verdict, ValidatorFault> {
        Ok(Verdict::check(!value.is_empty(), self.message.render(value)))
    }
}

/// Email address pattern for the `pattern` rule.
///
/// ```
/// use formstate::validation::EMAIL_PATTERN;
/// use formstate::FieldOptions;
///
/// let options = FieldOptions::new()
///     .pattern(EMAIL_PATTERN, "Invalid email format")
///     .unwrap();
/// # let _ = options;
/// ```
pub const EMAIL_PATTERN: &str =
    r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9-]+(?:\.[a-zA-Z0-9-]+)*$";

/// Validator using a custom regex pattern. Backs the `pattern` rule.
///
/// Only present text is checked; emptiness is the `required` rule's job.
#[derive(Debug, Clone)]
pub struct RegexValidator {
    pattern: Regex,
    message: Message,
}

impl RegexValidator {
    /// Creates a new RegexValidator.
    pub fn new(pattern: &str, message: impl Into<Message>) -> Result<Self, regex::Error> {
        Ok(Self::from_regex(Regex::new(pattern)?, message))
    }

    /// Creates a RegexValidator from a compiled regex.
    pub fn from_regex(pattern: Regex, message: impl Into<Message>) -> Self {
        Self {
            pattern,
            message: message.into(),
        }
    }
}

impl Validator for RegexValidator {
    fn validate(&self, value: &FieldValue, _: &FormValues) -> Result<Verdict, ValidatorFault> {
        let ok = match value.as_str() {
            Some("") | None => true,
            Some(s) => self.pattern.is_match(s),
        };
        Ok(Verdict::check(ok, self.message.render(value)))
    }
}

/// Validator backed by a closure.
///
/// ```
/// use formstate::validation::{FnValidator, Validator, Verdict};
/// use formstate::{FieldValue, FormValues};
///
/// let not_admin = FnValidator::new(|value: &FieldValue, _: &FormValues| {
///     Ok(Verdict::check(
///         value.as_str() != Some("admin@example.com"),
///         "Enter a different email address",
///     ))
/// });
/// let verdict = not_admin
///     .validate(&"admin@example.com".into(), &FormValues::new())
///     .unwrap();
/// assert!(!verdict.is_pass());
/// ```
pub struct FnValidator<F> {
    f: F,
}

impl<F> FnValidator<F>
where
    F: Fn(&FieldValue, &FormValues) -> Result<Verdict, ValidatorFault> + Send + Sync,
{
    /// Wraps a closure.
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> Validator for FnValidator<F>
where
    F: Fn(&FieldValue, &FormValues) -> Result<Verdict, ValidatorFault> + Send + Sync,
{
    fn validate(&self, value: &FieldValue, values: &FormValues) -> Result<Verdict, ValidatorFault> {
        (self.f)(value, values)
    }
}

/// Async validator backed by a closure returning a future.
pub struct AsyncFnValidator<F> {
    f: F,
}

impl<F, Fut> AsyncFnValidator<F>
where
    F: Fn(FieldValue, FormValues) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Verdict, ValidatorFault>> + Send + 'static,
{
    /// Wraps a closure.
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F, Fut> AsyncValidator for AsyncFnValidator<F>
where
    F: Fn(FieldValue, FormValues) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Verdict, ValidatorFault>> + Send + 'static,
{
    fn validate(
        &self,
        value: FieldValue,
        values: FormValues,
    ) -> BoxFuture<'static, Result<Verdict, ValidatorFault>> {
        Box::pin((self.f)(value, values))
    }
}
