//! Derived form state.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::error::FieldErrors;
use crate::loader::FormPhase;
use crate::path::FieldPath;
use crate::value::FormValues;

/// Snapshot of a form, recomputed after every mutation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormState {
    /// Lifecycle phase.
    pub phase: FormPhase,
    /// Current values.
    pub values: FormValues,
    /// Active field errors.
    pub errors: FieldErrors,
    /// Fields whose value differs from their default.
    pub dirty_fields: BTreeSet<FieldPath>,
    /// Fields that have lost focus at least once.
    pub touched_fields: BTreeSet<FieldPath>,
    /// Fields with async validation in flight.
    pub validating_fields: BTreeSet<FieldPath>,
    /// Fields currently disabled.
    pub disabled_fields: BTreeSet<FieldPath>,
    /// Whether any field differs from its default.
    pub is_dirty: bool,
    /// No errors and nothing still validating.
    pub is_valid: bool,
    /// Whether any async validation is in flight.
    pub is_validating: bool,
    /// Whether default values are still loading.
    pub is_loading: bool,
    /// Whether a submission is running.
    pub is_submitting: bool,
    /// Whether the form has been submitted since the last reset.
    pub is_submitted: bool,
    /// Whether the last submission passed validation.
    pub is_submit_successful: bool,
    /// Number of completed submissions.
    pub submit_count: u32,
    /// Number of mutation batches this form instance has committed.
    pub revision: u64,
}

impl FormState {
    /// Whether a submit control should be enabled.
    pub fn can_submit(&self) -> bool {
        self.phase == FormPhase::Ready && self.is_dirty && !self.is_submitting
    }
}
