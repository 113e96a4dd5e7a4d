//! Rule evaluation and pending async validation.
//!
//! A field's rules run in a fixed order: `required` (stops on empty
//! values), then `pattern`, then named validators in registration order.
//! The first failure wins. Synchronous rules run inline; once the first
//! async validator is reached, it and every later rule move into a
//! [`PendingValidation`] that the caller drives without borrowing the form.

use futures::future::join_all;
use tracing::debug;

use crate::error::{FieldError, FormError, Result, ValidatorFault};
use crate::field::{Check, FieldOptions, NamedValidator};
use crate::path::FieldPath;
use crate::validation::{Validator, Verdict};
use crate::value::{FieldValue, FormValues};

/// Result of running the synchronous part of a field's rules.
pub(crate) enum SyncOutcome {
    /// All rules ran; this is the field's error, if any.
    Settled(Option<FieldError>),
    /// Rules from the first async validator onward still have to run.
    Deferred(Vec<NamedValidator>),
}

fn fault(path: &FieldPath, validator: &str, fault: ValidatorFault) -> FormError {
    FormError::ValidatorFault {
        path: path.clone(),
        validator: validator.to_string(),
        reason: fault.reason,
    }
}

fn verdict_error(rule: &str, verdict: Verdict) -> Option<FieldError> {
    match verdict {
        Verdict::Pass => None,
        Verdict::Fail(message) => Some(FieldError::new(rule, message)),
    }
}

/// Runs rules up to the first async validator.
pub(crate) fn run_sync(
    path: &FieldPath,
    options: &FieldOptions,
    disabled: bool,
    value: &FieldValue,
    values: &FormValues,
) -> Result<SyncOutcome> {
    if disabled {
        return Ok(SyncOutcome::Settled(None));
    }

    if let Some(required) = &options.required {
        let verdict = required
            .validate(value, values)
            .map_err(|e| fault(path, "required", e))?;
        if let Some(error) = verdict_error("required", verdict) {
            return Ok(SyncOutcome::Settled(Some(error)));
        }
    }

    if let Some(pattern) = &options.pattern {
        let verdict = pattern
            .validate(value, values)
            .map_err(|e| fault(path, "pattern", e))?;
        if let Some(error) = verdict_error("pattern", verdict) {
            return Ok(SyncOutcome::Settled(Some(error)));
        }
    }

    for (i, named) in options.validators.iter().enumerate() {
        match &named.check {
            Check::Sync(validator) => {
                let verdict = validator
                    .validate(value, values)
                    .map_err(|e| fault(path, &named.name, e))?;
                if let Some(error) = verdict_error(&named.name, verdict) {
                    return Ok(SyncOutcome::Settled(Some(error)));
                }
            }
            Check::Async(_) => {
                return Ok(SyncOutcome::Deferred(options.validators[i..].to_vec()));
            }
        }
    }

    Ok(SyncOutcome::Settled(None))
}

/// The async remainder of one field's validation.
pub(crate) struct FieldTask {
    pub path: FieldPath,
    pub generation: u64,
    pub value: FieldValue,
    pub values: FormValues,
    pub remaining: Vec<NamedValidator>,
}

impl FieldTask {
    async fn run(self) -> Result<FieldOutcome> {
        for named in &self.remaining {
            let verdict = match &named.check {
                Check::Sync(validator) => validator.validate(&self.value, &self.values),
                Check::Async(validator) => {
                    validator
                        .validate(self.value.clone(), self.values.clone())
                        .await
                }
            }
            .map_err(|e| fault(&self.path, &named.name, e))?;

            if let Some(error) = verdict_error(&named.name, verdict) {
                return Ok(FieldOutcome {
                    path: self.path,
                    generation: self.generation,
                    error: Some(error),
                });
            }
        }

        Ok(FieldOutcome {
            path: self.path,
            generation: self.generation,
            error: None,
        })
    }
}

/// Validation work still in flight after a mutation.
///
/// Holds snapshots of the values it checks, so it can be awaited while the
/// form keeps changing. Hand the resolved [`ValidationOutcome`] back to
/// [`Form::apply_validation`](crate::Form::apply_validation); results for
/// fields whose value changed in the meantime are discarded there.
#[must_use = "pending validation does nothing unless resolved and applied"]
pub struct PendingValidation {
    pub(crate) tasks: Vec<FieldTask>,
}

impl PendingValidation {
    /// Returns the paths being validated.
    pub fn paths(&self) -> Vec<&FieldPath> {
        self.tasks.iter().map(|t| &t.path).collect()
    }

    /// Runs the remaining validators of every field concurrently.
    ///
    /// A validator fault fails the whole batch.
    pub async fn resolve(self) -> Result<ValidationOutcome> {
        debug!(fields = self.tasks.len(), "resolving async validation");
        let results = join_all(self.tasks.into_iter().map(FieldTask::run)).await;
        let fields = results.into_iter().collect::<Result<Vec<_>>>()?;
        Ok(ValidationOutcome { fields })
    }
}

impl std::fmt::Debug for PendingValidation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingValidation")
            .field("paths", &self.paths())
            .finish()
    }
}

/// Result for one field of a resolved validation.
#[derive(Debug, Clone)]
pub struct FieldOutcome {
    /// Field path.
    pub path: FieldPath,
    /// Field generation the result was computed for.
    pub(crate) generation: u64,
    /// The error, or `None` if every rule passed.
    pub error: Option<FieldError>,
}

/// Resolved results of a [`PendingValidation`].
#[derive(Debug, Clone)]
pub struct ValidationOutcome {
    pub(crate) fields: Vec<FieldOutcome>,
}

impl ValidationOutcome {
    /// Returns the per-field results.
    pub fn fields(&self) -> &[FieldOutcome] {
        &self.fields
    }
}
