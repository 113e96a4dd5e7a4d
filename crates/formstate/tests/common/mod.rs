#![allow(dead_code)]

use chrono::NaiveDate;
use formstate::validation::{AsyncFnValidator, FnValidator, Verdict, EMAIL_PATTERN};
use formstate::{
    ArrayTemplate, FieldOptions, FieldPath, FieldValue, Form, FormValues, Mode,
};
use serde_json::json;

/// Addresses the fake availability check reports as taken.
pub const TAKEN_EMAILS: &[&str] = &["Sincere@april.biz", "Shanna@melissa.tv"];

pub fn path(s: &str) -> FieldPath {
    FieldPath::parse(s).unwrap_or_else(|e| panic!("bad path {s}: {e}"))
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn registration_defaults() -> FormValues {
    let mut values = FormValues::try_from(json!({
        "username": "Batman",
        "email": "",
        "channel": "",
        "social": { "twitter": "", "facebook": "" },
        "phoneNumbers": ["", ""],
        "phNumbers": [{ "number": "" }],
        "age": 0,
    }))
    .unwrap();
    values
        .set(&path("dob"), FieldValue::from(date(2000, 1, 1)))
        .unwrap();
    values
}

pub fn email_options() -> FieldOptions {
    FieldOptions::new()
        .required("Email is required")
        .pattern(EMAIL_PATTERN, "Invalid email format")
        .unwrap()
        .validate(
            "notAdmin",
            FnValidator::new(|value: &FieldValue, _: &FormValues| {
                Ok(Verdict::check(
                    value.as_str() != Some("admin@example.com"),
                    "Enter a different email address",
                ))
            }),
        )
        .validate(
            "notBlackListed",
            FnValidator::new(|value: &FieldValue, _: &FormValues| {
                Ok(Verdict::check(
                    !value.as_str().unwrap_or_default().ends_with("baddomain.com"),
                    "This domain is not supported",
                ))
            }),
        )
        .validate_async(
            "emailAvailable",
            AsyncFnValidator::new(|value: FieldValue, _: FormValues| async move {
                let taken = value
                    .as_str()
                    .is_some_and(|email| TAKEN_EMAILS.contains(&email));
                Ok(Verdict::check(!taken, "Email already exists"))
            }),
        )
}

pub fn registration_builder(mode: Mode) -> formstate::FormBuilder {
    Form::builder()
        .mode(mode)
        .field("username", FieldOptions::new().required("Username is required"))
        .field("email", email_options())
        .field("channel", FieldOptions::new().required("Channel is required"))
        .field(
            "social.twitter",
            FieldOptions::new()
                .required("Enter twitter profile")
                .disabled_when(|values| {
                    values
                        .get(&FieldPath::key("channel"))
                        .is_none_or(FieldValue::is_empty)
                }),
        )
        .field("social.facebook", FieldOptions::new())
        .field("phoneNumbers.0", FieldOptions::new())
        .field("phoneNumbers.1", FieldOptions::new())
        .field_array(
            "phNumbers",
            ArrayTemplate::new()
                .item_field("number", FieldOptions::new())
                .unwrap(),
        )
        .field(
            "age",
            FieldOptions::new().value_as_number().required("Age is required"),
        )
        .field(
            "dob",
            FieldOptions::new()
                .value_as_date()
                .required("Date of birth is required"),
        )
}

/// The registration form with static defaults.
pub fn registration_form(mode: Mode) -> Form {
    registration_builder(mode)
        .default_values(registration_defaults())
        .build()
        .unwrap()
}

/// Fills every required field with acceptable input.
pub fn fill_valid(form: &mut Form) {
    form.change("email", "bruce@wayne.com").unwrap();
    form.change("channel", "Gotham").unwrap();
    form.change("social.twitter", "@batman").unwrap();
    form.change("age", "35").unwrap();
    form.change("dob", "1980-02-19").unwrap();
}
