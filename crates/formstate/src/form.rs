//! The form state controller.

use std::collections::BTreeSet;
use std::future::Future;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::array::{ArrayTemplate, FieldArrays};
use crate::engine::{self, FieldOutcome, FieldTask, PendingValidation, SyncOutcome, ValidationOutcome};
use crate::error::{FieldError, FieldErrors, FormError, Result};
use crate::field::{FieldHandle, FieldOptions, FieldRegistry};
use crate::loader::{DefaultValueLoader, DefaultValues, FormPhase, Phase};
use crate::observer::{Observers, Subscription};
use crate::path::{FieldPath, IntoFieldPath};
use crate::state::FormState;
use crate::value::{FieldValue, FormValues};

/// When fields are validated before the first submit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Mode {
    /// Only on submit.
    #[default]
    OnSubmit,
    /// On every value change.
    OnChange,
    /// When a field loses focus.
    OnBlur,
    /// On first blur, then on every change.
    OnTouched,
    /// On every change and every blur.
    All,
}

/// When fields are re-validated after the first submit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReValidateMode {
    /// On every value change.
    #[default]
    OnChange,
    /// When a field loses focus.
    OnBlur,
    /// Only on submit.
    OnSubmit,
}

/// Form-wide behaviour.
#[derive(Debug, Clone)]
pub struct FormOptions {
    /// Validation policy before the first submit.
    pub mode: Mode,
    /// Validation policy after the first submit.
    pub re_validate_mode: ReValidateMode,
    /// Reset to defaults once a submission succeeds.
    pub reset_on_submit_success: bool,
}

impl Default for FormOptions {
    fn default() -> Self {
        Self {
            mode: Mode::default(),
            re_validate_mode: ReValidateMode::default(),
            reset_on_submit_success: true,
        }
    }
}

/// Side effects of [`Form::set_value`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SetValueOptions {
    /// Validate the field after setting it.
    pub should_validate: bool,
    /// Recompute the dirty flag against the default.
    pub should_dirty: bool,
    /// Mark the field as touched.
    pub should_touch: bool,
}

impl SetValueOptions {
    /// Validate, recompute dirty and mark touched.
    pub fn all() -> Self {
        Self {
            should_validate: true,
            should_dirty: true,
            should_touch: true,
        }
    }
}

/// What [`Form::reset_with`] and [`Form::reset_to`] preserve.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResetOptions {
    /// Keep current errors.
    pub keep_errors: bool,
    /// Keep touched flags.
    pub keep_touched: bool,
    /// Keep the submit counter.
    pub keep_submit_count: bool,
    /// With [`Form::reset_to`], keep the old defaults for dirty checks.
    pub keep_default_values: bool,
}

#[derive(Debug, Clone, Copy, Default)]
struct SubmitState {
    is_submitting: bool,
    is_submitted: bool,
    is_submit_successful: bool,
    submit_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Event {
    Change,
    Blur,
}

/// What a mutation batch touched.
pub(crate) enum Change<'a> {
    /// One value (and everything under it).
    Value(&'a FieldPath),
    /// The whole value tree.
    Values,
    /// Metadata only.
    State,
}

/// Value watcher: current values and the path that changed (`None` for
/// whole-form changes such as reset).
pub type WatchCallback = dyn FnMut(&FormValues, Option<&FieldPath>) + Send;

/// State subscriber.
pub type StateCallback = dyn FnMut(&FormState) + Send;

/// A form instance: values, rules, metadata and submission lifecycle.
///
/// All mutations take `&mut self`; async validation is handed out as
/// [`PendingValidation`] so it can be awaited while the form keeps
/// accepting input.
pub struct Form {
    options: FormOptions,
    phase: Phase,
    pub(crate) defaults: FormValues,
    pub(crate) values: FormValues,
    pub(crate) registry: FieldRegistry,
    pub(crate) errors: FieldErrors,
    pub(crate) arrays: FieldArrays,
    submit: SubmitState,
    success_seen: bool,
    revision: u64,
    watchers: Observers<WatchCallback>,
    subscribers: Observers<StateCallback>,
}

impl std::fmt::Debug for Form {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Form")
            .field("phase", &self.phase.public())
            .field("values", &self.values)
            .field("errors", &self.errors)
            .field("revision", &self.revision)
            .finish_non_exhaustive()
    }
}

impl Form {
    /// Creates a form. With a loader, the form starts in
    /// [`FormPhase::Loading`] until [`load_defaults`](Self::load_defaults)
    /// runs.
    pub fn new(options: FormOptions, defaults: DefaultValues) -> Self {
        let (phase, defaults) = match defaults {
            DefaultValues::Values(values) => (Phase::Ready, values),
            DefaultValues::Loader(loader) => (Phase::Loading(loader), FormValues::new()),
        };

        Self {
            options,
            phase,
            values: defaults.clone(),
            defaults,
            registry: FieldRegistry::default(),
            errors: FieldErrors::new(),
            arrays: FieldArrays::default(),
            submit: SubmitState::default(),
            success_seen: false,
            revision: 0,
            watchers: Observers::new(),
            subscribers: Observers::new(),
        }
    }

    /// Returns a builder.
    pub fn builder() -> FormBuilder {
        FormBuilder::new()
    }

    /// Returns the form options.
    pub fn options(&self) -> &FormOptions {
        &self.options
    }

    /// Returns the lifecycle phase.
    pub fn phase(&self) -> FormPhase {
        self.phase.public()
    }

    /// Returns whether default values are in place.
    pub fn is_ready(&self) -> bool {
        matches!(self.phase, Phase::Ready)
    }

    /// Returns why the loader failed, if it did.
    pub fn load_error(&self) -> Option<&str> {
        match &self.phase {
            Phase::Failed(reason) => Some(reason),
            _ => None,
        }
    }

    /// Runs the default-value loader, once.
    ///
    /// On success the form is reset to the loaded values and becomes ready.
    /// On failure it stays unusable for submission and the error is returned.
    pub async fn load_defaults(&mut self) -> Result<()> {
        let loader = match &self.phase {
            Phase::Loading(loader) => Arc::clone(loader),
            Phase::Ready | Phase::Failed(_) => return Err(FormError::AlreadyLoaded),
        };

        info!("loading default values");
        match loader.load().await {
            Ok(defaults) => {
                self.phase = Phase::Ready;
                self.reset_to(defaults, ResetOptions::default());
                info!(revision = self.revision, "default values loaded");
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "failed to load default values");
                self.phase = Phase::Failed(err.to_string());
                self.commit(Change::State);
                Err(FormError::Initialization(err))
            }
        }
    }

    /// Registers a field.
    ///
    /// Registering a path again replaces its rules and keeps its value and
    /// metadata. A new field is seeded from the defaults, or `Null`.
    pub fn register(&mut self, path: impl IntoFieldPath, options: FieldOptions) -> Result<FieldHandle> {
        let path = path.into_field_path()?;
        if self.values.get(&path).is_none() {
            let seed = self.defaults.get_or_null(&path).clone();
            self.values.set(&path, seed)?;
        }

        let replaced = self.registry.register(path.clone(), options);
        self.refresh_disabled();

        debug!(%path, replaced, "registered field");
        Ok(FieldHandle::new(path))
    }

    /// Removes a field's rules, error and metadata. Its value stays.
    pub fn unregister(&mut self, path: impl IntoFieldPath) -> Result<()> {
        let path = path.into_field_path()?;
        self.registry
            .unregister(&path)
            .ok_or_else(|| FormError::UnknownField(path.clone()))?;
        self.errors.remove(&path);
        debug!(%path, "unregistered field");
        self.commit(Change::State);
        Ok(())
    }

    /// Returns whether a field is registered.
    pub fn is_registered(&self, path: &FieldPath) -> bool {
        self.registry.contains(path)
    }

    /// Returns the value at `path`.
    pub fn get_value(&self, path: impl IntoFieldPath) -> Result<Option<&FieldValue>> {
        let path = path.into_field_path()?;
        Ok(self.values.get(&path))
    }

    /// Returns the values at several paths, in order.
    pub fn get_values<P: IntoFieldPath>(
        &self,
        paths: impl IntoIterator<Item = P>,
    ) -> Result<Vec<Option<&FieldValue>>> {
        paths
            .into_iter()
            .map(|p| Ok(self.values.get(&p.into_field_path()?)))
            .collect()
    }

    /// Returns the current value tree.
    pub fn values(&self) -> &FormValues {
        &self.values
    }

    /// Returns the default value tree.
    pub fn default_values(&self) -> &FormValues {
        &self.defaults
    }

    /// Returns the active field errors.
    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    /// Sets a value programmatically.
    ///
    /// Unregistered paths are written too. Returns the async part of the
    /// validation, if `should_validate` started any.
    pub fn set_value(
        &mut self,
        path: impl IntoFieldPath,
        value: impl Into<FieldValue>,
        options: SetValueOptions,
    ) -> Result<Option<PendingValidation>> {
        let path = path.into_field_path()?;
        self.write_value(&path, value.into())?;

        if options.should_dirty {
            self.refresh_dirty(&path);
        }
        let targets = self.registry.under(&path);
        if options.should_touch {
            for target in &targets {
                if let Some(entry) = self.registry.get_mut(target) {
                    entry.touched = true;
                }
            }
        }

        let pending = if options.should_validate {
            self.start_validation(&targets)
        } else {
            Ok(None)
        };
        self.commit(Change::Value(&path));
        pending
    }

    /// Handles an input change on a registered field.
    ///
    /// Text is converted per the field's `value_as`, the dirty flag is
    /// recomputed, and the field is validated if the mode asks for it.
    pub fn change(
        &mut self,
        path: impl IntoFieldPath,
        value: impl Into<FieldValue>,
    ) -> Result<Option<PendingValidation>> {
        let path = path.into_field_path()?;
        let entry = self
            .registry
            .get(&path)
            .ok_or_else(|| FormError::UnknownField(path.clone()))?;
        let value = entry.options.value_as().coerce(value.into());
        let touched = entry.touched;

        self.write_value(&path, value)?;
        self.refresh_dirty(&path);

        let pending = if self.validates_on(Event::Change, touched) {
            self.start_validation(std::slice::from_ref(&path))
        } else {
            Ok(None)
        };
        self.commit(Change::Value(&path));
        pending
    }

    /// Handles a registered field losing focus.
    pub fn blur(&mut self, path: impl IntoFieldPath) -> Result<Option<PendingValidation>> {
        let path = path.into_field_path()?;
        let entry = self
            .registry
            .get_mut(&path)
            .ok_or_else(|| FormError::UnknownField(path.clone()))?;
        entry.touched = true;

        let pending = if self.validates_on(Event::Blur, true) {
            self.start_validation(std::slice::from_ref(&path))
        } else {
            Ok(None)
        };
        self.commit(Change::State);
        pending
    }

    /// Applies resolved validation results.
    ///
    /// Results for fields whose value changed since the validation started
    /// are discarded. Returns how many results were applied.
    pub fn apply_validation(&mut self, outcome: ValidationOutcome) -> usize {
        let mut applied = 0;
        for field in outcome.fields {
            if self.apply_outcome(field) {
                applied += 1;
            }
        }
        if applied > 0 {
            self.commit(Change::State);
        }
        applied
    }

    /// Validates one field, awaiting its async validators.
    pub async fn validate_field(&mut self, path: impl IntoFieldPath) -> Result<Option<FieldError>> {
        let path = path.into_field_path()?;
        if !self.registry.contains(&path) {
            return Err(FormError::UnknownField(path));
        }
        self.validate_paths(vec![path.clone()]).await?;
        Ok(self.errors.get(&path).cloned())
    }

    /// Validates every registered field and returns all errors.
    pub async fn validate_all(&mut self) -> Result<FieldErrors> {
        let paths = self.registry.paths();
        self.validate_paths(paths).await?;
        Ok(self.errors.clone())
    }

    /// Validates the whole form; returns whether it is valid.
    pub async fn trigger(&mut self) -> Result<bool> {
        Ok(self.validate_all().await?.is_empty())
    }

    /// Validates the registered fields at or under `path`.
    pub async fn trigger_field(&mut self, path: impl IntoFieldPath) -> Result<bool> {
        self.trigger_many([path]).await
    }

    /// Validates the registered fields at or under each path; returns
    /// whether none of them has an error.
    pub async fn trigger_many<P: IntoFieldPath>(
        &mut self,
        paths: impl IntoIterator<Item = P>,
    ) -> Result<bool> {
        let mut targets = BTreeSet::new();
        for path in paths {
            let path = path.into_field_path()?;
            let under = self.registry.under(&path);
            if under.is_empty() {
                return Err(FormError::UnknownField(path));
            }
            targets.extend(under);
        }

        let targets: Vec<FieldPath> = targets.into_iter().collect();
        self.validate_paths(targets.clone()).await?;
        Ok(targets.iter().all(|p| !self.errors.contains(p)))
    }

    /// Sets an error by hand, as a server-side check would.
    ///
    /// List indices in `path` follow the same bounds as
    /// [`set_value`](Self::set_value).
    pub fn set_error(&mut self, path: impl IntoFieldPath, error: FieldError) -> Result<()> {
        let path = path.into_field_path()?;
        self.values.check_indices(&path)?;
        self.errors.insert(path, error);
        self.commit(Change::State);
        Ok(())
    }

    /// Clears one field's error.
    pub fn clear_error(&mut self, path: impl IntoFieldPath) -> Result<()> {
        let path = path.into_field_path()?;
        self.errors.remove(&path);
        self.commit(Change::State);
        Ok(())
    }

    /// Clears every error.
    pub fn clear_errors(&mut self) {
        self.errors.clear();
        self.commit(Change::State);
    }

    /// Watches every value change. Callbacks run in subscription order,
    /// synchronously after each mutation.
    pub fn watch<F>(&self, callback: F) -> Subscription
    where
        F: FnMut(&FormValues, Option<&FieldPath>) + Send + 'static,
    {
        let slot: Arc<Mutex<WatchCallback>> = Arc::new(Mutex::new(callback));
        self.watchers.subscribe(slot)
    }

    /// Watches one field. The callback gets the field's value whenever a
    /// change touches it.
    pub fn watch_field<F>(&self, path: impl IntoFieldPath, callback: F) -> Result<Subscription>
    where
        F: FnMut(&FieldValue) + Send + 'static,
    {
        let path = path.into_field_path()?;
        let mut callback = callback;
        Ok(self.watch(move |values, changed| {
            if changed.is_none_or(|c| c.overlaps(&path)) {
                callback(values.get_or_null(&path));
            }
        }))
    }

    /// Subscribes to state snapshots, delivered after every mutation.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: FnMut(&FormState) + Send + 'static,
    {
        let slot: Arc<Mutex<StateCallback>> = Arc::new(Mutex::new(callback));
        self.subscribers.subscribe(slot)
    }

    /// Submits the form.
    ///
    /// Runs full validation, then calls `on_valid` with the values or
    /// `on_invalid` with the errors. Returns whether the form was valid.
    /// Fails with [`FormError::NotReady`] before defaults are loaded, and
    /// with [`FormError::ValidatorFault`] if a validator breaks.
    pub async fn handle_submit<V, Fut, I>(&mut self, on_valid: V, on_invalid: I) -> Result<bool>
    where
        V: FnOnce(FormValues) -> Fut,
        Fut: Future<Output = ()>,
        I: FnOnce(FieldErrors),
    {
        if !self.is_ready() {
            return Err(FormError::NotReady);
        }

        self.submit.is_submitting = true;
        self.commit(Change::State);

        let paths = self.registry.paths();
        if let Err(err) = self.validate_paths(paths).await {
            warn!(error = %err, "submission aborted");
            self.submit.is_submitting = false;
            self.commit(Change::State);
            return Err(err);
        }

        let valid = self.errors.is_empty();
        if valid {
            on_valid(self.values.clone()).await;
        } else {
            on_invalid(self.errors.clone());
        }

        self.submit.submit_count += 1;
        self.submit.is_submitted = true;
        self.submit.is_submit_successful = valid;
        self.submit.is_submitting = false;
        info!(
            valid,
            errors = self.errors.len(),
            submit_count = self.submit.submit_count,
            "form submitted"
        );
        self.commit(Change::State);
        Ok(valid)
    }

    /// Resets values to the defaults and clears dirty, touched, errors and
    /// submission state.
    pub fn reset(&mut self) {
        self.reset_with(ResetOptions::default());
    }

    /// Resets values to the defaults, keeping what `options` asks for.
    pub fn reset_with(&mut self, options: ResetOptions) {
        let defaults = self.defaults.clone();
        self.reset_values(defaults, options);
    }

    /// Resets to new values, which also become the defaults unless
    /// `keep_default_values` is set.
    pub fn reset_to(&mut self, values: FormValues, options: ResetOptions) {
        if !options.keep_default_values {
            self.defaults = values.clone();
        }
        self.reset_values(values, options);
    }

    /// Computes the current state snapshot.
    pub fn state(&self) -> FormState {
        let mut dirty_fields = BTreeSet::new();
        let mut touched_fields = BTreeSet::new();
        let mut validating_fields = BTreeSet::new();
        let mut disabled_fields = BTreeSet::new();
        let mut is_dirty = false;

        for (path, entry) in self.registry.iter() {
            if entry.dirty {
                dirty_fields.insert(path.clone());
            }
            if entry.touched {
                touched_fields.insert(path.clone());
            }
            if entry.validating.is_some() {
                validating_fields.insert(path.clone());
            }
            if entry.disabled {
                disabled_fields.insert(path.clone());
            }
            is_dirty |= self.differs(path);
        }
        for path in self.arrays.paths() {
            if self.differs(path) {
                dirty_fields.insert(path.clone());
                is_dirty = true;
            }
        }

        let is_validating = !validating_fields.is_empty();
        FormState {
            phase: self.phase.public(),
            values: self.values.clone(),
            errors: self.errors.clone(),
            dirty_fields,
            touched_fields,
            validating_fields,
            disabled_fields,
            is_dirty,
            is_valid: self.errors.is_empty() && !is_validating,
            is_validating,
            is_loading: matches!(self.phase, Phase::Loading(_)),
            is_submitting: self.submit.is_submitting,
            is_submitted: self.submit.is_submitted,
            is_submit_successful: self.submit.is_submit_successful,
            submit_count: self.submit.submit_count,
            revision: self.revision,
        }
    }

    /// Returns the number of committed mutation batches.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn write_value(&mut self, path: &FieldPath, value: FieldValue) -> Result<()> {
        self.values.set(path, value)?;
        self.registry.bump(path);
        self.sync_arrays(false);
        self.refresh_disabled();
        Ok(())
    }

    pub(crate) fn differs(&self, path: &FieldPath) -> bool {
        self.values.get_or_null(path) != self.defaults.get_or_null(path)
    }

    /// Recomputes dirty flags of fields overlapping `path`.
    pub(crate) fn refresh_dirty(&mut self, path: &FieldPath) {
        for target in self.registry.overlapping(path) {
            let differs = self.differs(&target);
            if let Some(entry) = self.registry.get_mut(&target) {
                entry.dirty = differs;
            }
        }
    }

    /// Re-evaluates disabled flags. A field that becomes disabled loses its
    /// error.
    pub(crate) fn refresh_disabled(&mut self) {
        for (path, entry) in self.registry.iter_mut() {
            let disabled = entry.options.is_disabled(&self.values);
            if disabled && !entry.disabled {
                debug!(%path, "field disabled");
                self.errors.remove(path);
                entry.validating = None;
            }
            entry.disabled = disabled;
        }
    }

    fn validates_on(&self, event: Event, touched: bool) -> bool {
        let by_mode = match self.options.mode {
            Mode::All => true,
            Mode::OnChange => event == Event::Change,
            Mode::OnBlur => event == Event::Blur,
            Mode::OnTouched => event == Event::Blur || touched,
            Mode::OnSubmit => false,
        };
        let by_revalidate = self.submit.is_submitted
            && match self.options.re_validate_mode {
                ReValidateMode::OnChange => event == Event::Change,
                ReValidateMode::OnBlur => event == Event::Blur,
                ReValidateMode::OnSubmit => false,
            };
        by_mode || by_revalidate
    }

    /// Runs the sync rules of each path and collects the async remainder.
    fn start_validation(&mut self, paths: &[FieldPath]) -> Result<Option<PendingValidation>> {
        let mut tasks = Vec::new();

        for path in paths {
            let Some(entry) = self.registry.get_mut(path) else {
                continue;
            };
            let value = self.values.get_or_null(path);

            let outcome = match engine::run_sync(path, &entry.options, entry.disabled, value, &self.values) {
                Ok(outcome) => outcome,
                Err(err) => {
                    warn!(%path, error = %err, "validator fault");
                    self.abandon(paths);
                    return Err(err);
                }
            };

            match outcome {
                SyncOutcome::Settled(error) => {
                    debug!(%path, error = ?error.as_ref().map(|e| &e.rule), "validated field");
                    entry.validating = None;
                    self.errors.set(path, error);
                }
                SyncOutcome::Deferred(remaining) => {
                    debug!(%path, generation = entry.generation, "async validation started");
                    entry.validating = Some(entry.generation);
                    // the rules that just ran passed; only a deferred rule's error can stand
                    let stale = self
                        .errors
                        .get(path)
                        .is_some_and(|e| remaining.iter().all(|v| v.name != e.rule));
                    if stale {
                        self.errors.remove(path);
                    }
                    tasks.push(FieldTask {
                        path: path.clone(),
                        generation: entry.generation,
                        value: value.clone(),
                        values: self.values.clone(),
                        remaining,
                    });
                }
            }
        }

        Ok((!tasks.is_empty()).then_some(PendingValidation { tasks }))
    }

    fn apply_outcome(&mut self, outcome: FieldOutcome) -> bool {
        let Some(entry) = self.registry.get_mut(&outcome.path) else {
            debug!(path = %outcome.path, "discarding result for unregistered field");
            return false;
        };
        if entry.generation != outcome.generation {
            debug!(path = %outcome.path, "discarding stale validation result");
            return false;
        }

        entry.validating = None;
        let error = if entry.disabled { None } else { outcome.error };
        self.errors.set(&outcome.path, error);
        true
    }

    fn abandon(&mut self, paths: &[FieldPath]) {
        for path in paths {
            if let Some(entry) = self.registry.get_mut(path) {
                entry.validating = None;
            }
        }
    }

    async fn validate_paths(&mut self, paths: Vec<FieldPath>) -> Result<()> {
        let pending = match self.start_validation(&paths) {
            Ok(pending) => pending,
            Err(err) => {
                self.commit(Change::State);
                return Err(err);
            }
        };

        if let Some(pending) = pending {
            // publish the validating flags before suspending
            self.commit(Change::State);
            match pending.resolve().await {
                Ok(outcome) => {
                    for field in outcome.fields {
                        self.apply_outcome(field);
                    }
                }
                Err(err) => {
                    warn!(error = %err, "validator fault");
                    self.abandon(&paths);
                    self.commit(Change::State);
                    return Err(err);
                }
            }
        }

        self.commit(Change::State);
        Ok(())
    }

    fn reset_values(&mut self, values: FormValues, options: ResetOptions) {
        self.values = values;
        self.registry.bump_all();

        for path in self.registry.paths() {
            let differs = self.differs(&path);
            if let Some(entry) = self.registry.get_mut(&path) {
                entry.dirty = differs;
                if !options.keep_touched {
                    entry.touched = false;
                }
            }
        }
        if !options.keep_errors {
            self.errors.clear();
        }

        self.submit = SubmitState {
            submit_count: if options.keep_submit_count {
                self.submit.submit_count
            } else {
                0
            },
            ..SubmitState::default()
        };

        self.sync_arrays(true);
        self.refresh_disabled();
        debug!("form reset");
        self.commit(Change::Values);
    }

    /// Ends a mutation batch: bumps the revision, notifies watchers and
    /// subscribers, then runs state reactions.
    pub(crate) fn commit(&mut self, change: Change<'_>) {
        self.revision += 1;

        match change {
            Change::Value(path) => self.watchers.notify(|cb| cb(&self.values, Some(path))),
            Change::Values => self.watchers.notify(|cb| cb(&self.values, None)),
            Change::State => {}
        }

        if !self.subscribers.is_empty() {
            let state = self.state();
            self.subscribers.notify(|cb| cb(&state));
        }

        let succeeded = self.submit.is_submit_successful;
        let transitioned = succeeded && !self.success_seen;
        self.success_seen = succeeded;
        if transitioned && self.options.reset_on_submit_success {
            debug!("submission succeeded, resetting to defaults");
            self.reset_with(ResetOptions {
                keep_submit_count: true,
                ..ResetOptions::default()
            });
        }
    }
}

/// A builder for configuring and creating forms.
#[derive(Debug, Default)]
pub struct FormBuilder {
    options: FormOptions,
    defaults: DefaultValues,
    fields: Vec<(String, FieldOptions)>,
    arrays: Vec<(String, ArrayTemplate)>,
}

impl FormBuilder {
    /// Creates a new form builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the validation mode.
    #[must_use]
    pub fn mode(mut self, mode: Mode) -> Self {
        self.options.mode = mode;
        self
    }

    /// Sets the re-validation mode used after the first submit.
    #[must_use]
    pub fn re_validate_mode(mut self, mode: ReValidateMode) -> Self {
        self.options.re_validate_mode = mode;
        self
    }

    /// Sets whether a successful submission resets the form.
    #[must_use]
    pub fn reset_on_submit_success(mut self, enabled: bool) -> Self {
        self.options.reset_on_submit_success = enabled;
        self
    }

    /// Uses fixed default values.
    #[must_use]
    pub fn default_values(mut self, values: FormValues) -> Self {
        self.defaults = DefaultValues::Values(values);
        self
    }

    /// Loads default values asynchronously after construction.
    #[must_use]
    pub fn default_values_with(mut self, loader: impl DefaultValueLoader + 'static) -> Self {
        self.defaults = DefaultValues::Loader(Arc::new(loader));
        self
    }

    /// Adds a field.
    #[must_use]
    pub fn field(mut self, path: impl Into<String>, options: FieldOptions) -> Self {
        self.fields.push((path.into(), options));
        self
    }

    /// Adds a field array whose entries are registered from `template`.
    #[must_use]
    pub fn field_array(mut self, path: impl Into<String>, template: ArrayTemplate) -> Self {
        self.arrays.push((path.into(), template));
        self
    }

    /// Creates the form and registers its fields.
    pub fn build(self) -> Result<Form> {
        let mut form = Form::new(self.options, self.defaults);
        for (path, options) in self.fields {
            form.register(path, options)?;
        }
        for (path, template) in self.arrays {
            form.register_array(path, template)?;
        }
        Ok(form)
    }
}
