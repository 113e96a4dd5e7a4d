//! Tests for field disablement and reset.

mod common;
use common::*;

use formstate::{FieldOptions, FieldValue, Form, FormValues, Mode, ResetOptions};
use serde_json::json;

#[tokio::test]
async fn disabled_field_skips_required() {
    let mut form = registration_form(Mode::OnSubmit);
    fill_valid(&mut form);
    form.change("channel", "").unwrap();
    form.change("social.twitter", "").unwrap();

    assert!(form.state().disabled_fields.contains(&path("social.twitter")));
    let valid = form.handle_submit(|_| async {}, |_| {}).await.unwrap();
    assert!(!valid);
    assert!(form.errors().message("social.twitter").is_none());
    assert_eq!(form.errors().message("channel"), Some("Channel is required"));

    // re-enabling and leaving it empty raises the error on the next pass
    form.change("channel", "Gotham").unwrap();
    assert!(form.state().disabled_fields.is_empty());
    let valid = form.handle_submit(|_| async {}, |_| {}).await.unwrap();
    assert!(!valid);
    assert_eq!(
        form.errors().message("social.twitter"),
        Some("Enter twitter profile")
    );
}

#[tokio::test]
async fn becoming_disabled_drops_error() {
    let mut form = registration_form(Mode::OnSubmit);
    fill_valid(&mut form);
    form.change("social.twitter", "").unwrap();
    form.handle_submit(|_| async {}, |_| {}).await.unwrap();
    assert!(form.errors().contains(&path("social.twitter")));

    form.change("channel", "").unwrap();
    assert!(!form.errors().contains(&path("social.twitter")));
}

#[tokio::test]
async fn disabled_values_are_submitted() {
    let mut form = Form::builder()
        .default_values(FormValues::try_from(json!({ "name": "", "nickname": "Bats" })).unwrap())
        .field("name", FieldOptions::new().required("Name is required"))
        .field("nickname", FieldOptions::new().disabled().required("unused"))
        .build()
        .unwrap();
    form.change("name", "Bruce").unwrap();

    let mut submitted = None;
    form.handle_submit(
        |values| {
            submitted = Some(values);
            async {}
        },
        |_| {},
    )
    .await
    .unwrap();
    assert_eq!(
        submitted.unwrap().get(&path("nickname")),
        Some(&FieldValue::from("Bats"))
    );
}

#[tokio::test]
async fn reset_restores_defaults_and_clears_metadata() {
    let mut form = registration_form(Mode::OnBlur);
    form.change("username", "").unwrap();
    form.blur("username").unwrap();
    form.handle_submit(|_| async {}, |_| {}).await.unwrap();

    let state = form.state();
    assert!(state.is_dirty);
    assert!(state.is_submitted);
    assert!(!state.touched_fields.is_empty());
    assert!(!state.errors.is_empty());

    form.reset();
    let state = form.state();
    assert_eq!(state.values, registration_defaults());
    assert!(!state.is_dirty);
    assert!(state.dirty_fields.is_empty());
    assert!(state.touched_fields.is_empty());
    assert!(state.errors.is_empty());
    assert!(!state.is_submitted);
    assert!(!state.is_submit_successful);
    assert_eq!(state.submit_count, 0);
}

#[tokio::test]
async fn reset_with_keeps_requested_state() {
    let mut form = registration_form(Mode::OnBlur);
    form.change("username", "").unwrap();
    form.blur("username").unwrap();
    form.handle_submit(|_| async {}, |_| {}).await.unwrap();

    form.reset_with(ResetOptions {
        keep_errors: true,
        keep_touched: true,
        keep_submit_count: true,
        ..ResetOptions::default()
    });

    let state = form.state();
    assert!(!state.is_dirty);
    assert!(state.touched_fields.contains(&path("username")));
    assert_eq!(state.errors.message("username"), Some("Username is required"));
    assert_eq!(state.submit_count, 1);
    assert!(!state.is_submitted);
}

#[test]
fn reset_to_replaces_defaults() {
    let mut form = registration_form(Mode::OnSubmit);
    let mut next = registration_defaults();
    next.set(&path("username"), "Robin".into()).unwrap();

    form.reset_to(next.clone(), ResetOptions::default());
    assert_eq!(form.default_values(), &next);
    assert!(!form.state().is_dirty);

    form.change("username", "Batman").unwrap();
    assert!(form.state().dirty_fields.contains(&path("username")));
}

#[test]
fn reset_to_can_keep_old_defaults() {
    let mut form = registration_form(Mode::OnSubmit);
    let mut next = registration_defaults();
    next.set(&path("username"), "Robin".into()).unwrap();

    form.reset_to(
        next,
        ResetOptions {
            keep_default_values: true,
            ..ResetOptions::default()
        },
    );
    assert_eq!(form.default_values(), &registration_defaults());
    assert!(form.state().dirty_fields.contains(&path("username")));
}
