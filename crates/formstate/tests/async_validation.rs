//! Tests for async validators and the staleness guard.

mod common;
use common::*;

use std::sync::Arc;

use formstate::validation::{AsyncFnValidator, Verdict};
use formstate::{
    FieldOptions, FieldValue, Form, FormError, FormValues, Mode, SetValueOptions, ValidatorFault,
};
use tokio::sync::Notify;

#[tokio::test]
async fn stale_result_is_discarded() {
    let mut form = registration_form(Mode::OnChange);

    let first = form.change("email", "Sincere@april.biz").unwrap().unwrap();
    let second = form.change("email", "free@site.com").unwrap().unwrap();

    let outcome = first.resolve().await.unwrap();
    assert_eq!(form.apply_validation(outcome), 0);
    assert!(form.errors().message("email").is_none());
    assert!(form.state().is_validating);

    let outcome = second.resolve().await.unwrap();
    assert_eq!(form.apply_validation(outcome), 1);
    let state = form.state();
    assert!(!state.is_validating);
    assert!(state.errors.message("email").is_none());
}

#[tokio::test]
async fn previous_error_kept_while_pending() {
    let mut form = registration_form(Mode::OnChange);

    let pending = form.change("email", "Sincere@april.biz").unwrap().unwrap();
    let outcome = pending.resolve().await.unwrap();
    form.apply_validation(outcome);
    assert_eq!(form.errors().message("email"), Some("Email already exists"));

    let pending = form.change("email", "free@site.com").unwrap().unwrap();
    let state = form.state();
    assert_eq!(state.errors.message("email"), Some("Email already exists"));
    assert!(state.validating_fields.contains(&path("email")));
    assert!(!state.is_valid);

    let outcome = pending.resolve().await.unwrap();
    form.apply_validation(outcome);
    assert!(form.errors().message("email").is_none());
}

#[tokio::test]
async fn sync_error_cleared_once_sync_rules_pass() {
    let mut form = registration_form(Mode::OnChange);

    assert!(form.change("email", "admin@example.com").unwrap().is_none());
    assert_eq!(
        form.errors().get(&path("email")).map(|e| e.rule.as_str()),
        Some("notAdmin")
    );

    let pending = form.change("email", "ok@site.com").unwrap().unwrap();
    let state = form.state();
    assert!(state.errors.get(&path("email")).is_none());
    assert!(state.validating_fields.contains(&path("email")));
    assert!(!state.is_valid);

    let outcome = pending.resolve().await.unwrap();
    assert_eq!(form.apply_validation(outcome), 1);
    assert!(form.state().is_valid);
}

#[tokio::test]
async fn sync_failure_skips_async_validator() {
    let mut form = registration_form(Mode::OnChange);
    let pending = form.change("email", "spam@baddomain.com").unwrap();
    assert!(pending.is_none());
    assert_eq!(
        form.errors().get(&path("email")).map(|e| e.rule.as_str()),
        Some("notBlackListed")
    );
}

#[tokio::test]
async fn validate_field_awaits_async_rules() {
    let mut form = registration_form(Mode::OnSubmit);
    form.set_value("email", "Shanna@melissa.tv", SetValueOptions::default())
        .unwrap();

    let error = form.validate_field("email").await.unwrap().unwrap();
    assert_eq!(error.rule, "emailAvailable");
    assert_eq!(error.message, "Email already exists");

    assert!(matches!(
        form.validate_field("nickname").await,
        Err(FormError::UnknownField(_))
    ));
}

#[tokio::test]
async fn result_arriving_after_edit_is_ignored() {
    let gate = Arc::new(Notify::new());
    let mut form = {
        let gate = Arc::clone(&gate);
        Form::builder()
            .mode(Mode::OnChange)
            .field(
                "email",
                FieldOptions::new().validate_async(
                    "emailAvailable",
                    AsyncFnValidator::new(move |_: FieldValue, _: FormValues| {
                        let gate = Arc::clone(&gate);
                        async move {
                            gate.notified().await;
                            Ok(Verdict::fail("Email already exists"))
                        }
                    }),
                ),
            )
            .build()
            .unwrap()
    };

    let pending = form.change("email", "first@site.com").unwrap().unwrap();
    let task = tokio::spawn(pending.resolve());

    form.set_value("email", "second@site.com", SetValueOptions::default())
        .unwrap();
    gate.notify_one();

    let outcome = task.await.unwrap().unwrap();
    assert_eq!(form.apply_validation(outcome), 0);
    assert!(form.errors().is_empty());
}

#[tokio::test]
async fn validator_fault_propagates_and_clears_validating() {
    let mut form = Form::builder()
        .field(
            "email",
            FieldOptions::new().validate_async(
                "emailAvailable",
                AsyncFnValidator::new(|_: FieldValue, _: FormValues| async {
                    Err(ValidatorFault::new("service returned malformed JSON"))
                }),
            ),
        )
        .build()
        .unwrap();

    let err = form.trigger().await.unwrap_err();
    match err {
        FormError::ValidatorFault {
            path, validator, ..
        } => {
            assert_eq!(path.to_string(), "email");
            assert_eq!(validator, "emailAvailable");
        }
        other => panic!("expected validator fault, got {other:?}"),
    }

    let state = form.state();
    assert!(!state.is_validating);
    assert!(state.errors.is_empty());
}

#[tokio::test]
async fn validate_all_runs_async_fields_together() {
    let mut form = registration_form(Mode::OnSubmit);
    fill_valid(&mut form);
    form.set_value("email", "Sincere@april.biz", SetValueOptions::default())
        .unwrap();

    let errors = form.validate_all().await.unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors.message("email"), Some("Email already exists"));
    assert!(!form.state().is_validating);
}
