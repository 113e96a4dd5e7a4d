//! Tests for the submission lifecycle.

mod common;
use common::*;

use std::sync::{Arc, Mutex};

use formstate::{
    FieldValue, Form, FormError, FormPhase, LoaderFn, Mode, SetValueOptions,
};

#[tokio::test]
async fn empty_required_field_reports_only_that_path() {
    let mut form = registration_form(Mode::OnSubmit);
    fill_valid(&mut form);
    form.change("username", "").unwrap();

    let mut valid_called = false;
    let mut reported = None;
    let valid = form
        .handle_submit(
            |_| {
                valid_called = true;
                async {}
            },
            |errors| reported = Some(errors),
        )
        .await
        .unwrap();

    assert!(!valid);
    assert!(!valid_called);
    let errors = reported.expect("on_invalid must be called");
    assert_eq!(errors.len(), 1);
    assert_eq!(errors.message("username"), Some("Username is required"));

    let state = form.state();
    assert_eq!(state.submit_count, 1);
    assert!(state.is_submitted);
    assert!(!state.is_submit_successful);
    assert!(!state.is_submitting);
}

#[tokio::test]
async fn valid_submit_receives_typed_values() {
    let mut form = registration_form(Mode::OnSubmit);
    fill_valid(&mut form);

    let mut submitted = None;
    let valid = form
        .handle_submit(
            |values| {
                submitted = Some(values);
                async {}
            },
            |errors| panic!("unexpected errors: {errors}"),
        )
        .await
        .unwrap();
    assert!(valid);

    let values = submitted.unwrap();
    assert_eq!(values.get(&path("age")), Some(&FieldValue::Number(35.0)));
    assert_eq!(
        values.get(&path("dob")),
        Some(&FieldValue::Date(date(1980, 2, 19)))
    );
    assert_eq!(
        values.get(&path("email")),
        Some(&FieldValue::from("bruce@wayne.com"))
    );
    assert_eq!(
        values.get(&path("phNumbers.0.number")),
        Some(&FieldValue::from(""))
    );
}

#[tokio::test]
async fn successful_submit_resets_after_subscribers_observe_it() {
    let mut form = registration_form(Mode::OnSubmit);
    fill_valid(&mut form);

    let seen = Arc::new(Mutex::new(Vec::new()));
    let _sub = {
        let seen = Arc::clone(&seen);
        form.subscribe(move |state| {
            seen.lock()
                .unwrap()
                .push((state.is_submit_successful, state.is_dirty));
        })
    };

    assert!(form.handle_submit(|_| async {}, |_| {}).await.unwrap());

    let seen = seen.lock().unwrap();
    let success = seen
        .iter()
        .position(|(ok, _)| *ok)
        .expect("subscribers see the successful state");
    assert!(seen[success].1, "still dirty when success is observed");
    assert_eq!(seen.last(), Some(&(false, false)));

    let state = form.state();
    assert_eq!(state.values, registration_defaults());
    assert_eq!(state.submit_count, 1);
    assert!(!state.is_submitted);
    assert!(!state.is_dirty);
}

#[tokio::test]
async fn auto_reset_can_be_switched_off() {
    let mut form = registration_builder(Mode::OnSubmit)
        .default_values(registration_defaults())
        .reset_on_submit_success(false)
        .build()
        .unwrap();
    fill_valid(&mut form);

    assert!(form.handle_submit(|_| async {}, |_| {}).await.unwrap());
    let state = form.state();
    assert!(state.is_submit_successful);
    assert!(state.is_dirty);
    assert_eq!(
        form.get_value("channel").unwrap(),
        Some(&FieldValue::from("Gotham"))
    );
}

#[tokio::test]
async fn submit_refused_until_defaults_load() {
    let mut form = registration_builder(Mode::OnSubmit)
        .default_values_with(LoaderFn::new(|| async { Ok(registration_defaults()) }))
        .build()
        .unwrap();

    assert_eq!(form.phase(), FormPhase::Loading);
    assert!(matches!(
        form.handle_submit(|_| async {}, |_| {}).await,
        Err(FormError::NotReady)
    ));
    assert_eq!(form.state().submit_count, 0);
}

#[test]
fn can_submit_requires_dirty_form() {
    let mut form = registration_form(Mode::OnSubmit);
    assert!(!form.state().can_submit());

    form.change("channel", "Gotham").unwrap();
    assert!(form.state().can_submit());
}

#[test]
fn set_value_with_all_side_effects() {
    let mut form = registration_form(Mode::OnSubmit);
    let pending = form
        .set_value("username", "", SetValueOptions::all())
        .unwrap();
    assert!(pending.is_none());

    let state = form.state();
    assert_eq!(state.errors.message("username"), Some("Username is required"));
    assert!(state.touched_fields.contains(&path("username")));
    assert!(state.dirty_fields.contains(&path("username")));
}

#[test]
fn get_values_reads_several_paths() {
    let form = registration_form(Mode::OnSubmit);
    let values = form
        .get_values(["social.twitter", "username", "channel"])
        .unwrap();
    assert_eq!(
        values,
        vec![
            Some(&FieldValue::from("")),
            Some(&FieldValue::from("Batman")),
            Some(&FieldValue::from("")),
        ]
    );
}

#[tokio::test]
async fn trigger_validates_whole_form() {
    let mut form = registration_form(Mode::All);
    assert!(!form.trigger().await.unwrap());

    let errors = form.errors();
    assert_eq!(errors.message("email"), Some("Email is required"));
    assert_eq!(errors.message("channel"), Some("Channel is required"));
    assert!(errors.message("social.twitter").is_none());
    assert!(errors.message("age").is_none());
    assert_eq!(form.state().submit_count, 0);
}

#[test]
fn invalid_paths_are_rejected() {
    let mut form = Form::builder().build().unwrap();
    assert!(matches!(
        form.set_value("social..twitter", "x", SetValueOptions::default()),
        Err(FormError::InvalidPath { .. })
    ));
    assert!(matches!(
        form.register("", formstate::FieldOptions::new()),
        Err(FormError::InvalidPath { .. })
    ));
}
