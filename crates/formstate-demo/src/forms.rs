//! The sample forms: a channel registration form and a login form.

use chrono::Local;
use formstate::validation::{FnValidator, Verdict, EMAIL_PATTERN};
use formstate::{
    ArrayTemplate, FieldOptions, FieldPath, FieldValue, Form, FormBuilder, FormValues, Mode,
};
use formstate_remote::{EmailAvailability, RemoteDefaults, UserClient};
use serde_json::json;

/// Where the registration form gets its defaults and availability checks.
pub enum Backend {
    /// Static defaults, no remote checks.
    Offline,
    /// Defaults and availability checks from the user service.
    Remote { client: UserClient, user_id: u32 },
}

fn registration_defaults() -> formstate::Result<FormValues> {
    let mut values = FormValues::try_from(json!({
        "username": "Batman",
        "email": "",
        "channel": "",
        "social": { "twitter": "", "facebook": "" },
        "phoneNumbers": ["", ""],
        "phNumbers": [{ "number": "" }],
        "age": 0,
    }))?;
    values.set(
        &FieldPath::key("dob"),
        FieldValue::Date(Local::now().date_naive()),
    )?;
    Ok(values)
}

fn email_options(backend: &Backend) -> formstate::Result<FieldOptions> {
    let options = FieldOptions::new()
        .required("Email is required")
        .pattern(EMAIL_PATTERN, "Invalid email format")?
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
        );

    Ok(match backend {
        Backend::Offline => options,
        Backend::Remote { client, .. } => {
            options.validate_async("emailAvailable", EmailAvailability::new(client.clone()))
        }
    })
}

/// Builds the channel registration form.
pub fn registration(mode: Mode, backend: &Backend) -> formstate::Result<Form> {
    let builder = FormBuilder::new()
        .mode(mode)
        .field("username", FieldOptions::new().required("Username is required"))
        .field("email", email_options(backend)?)
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
            ArrayTemplate::new().item_field("number", FieldOptions::new())?,
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
        );

    let defaults = registration_defaults()?;
    let builder = match backend {
        Backend::Offline => builder.default_values(defaults),
        Backend::Remote { client, user_id } => {
            builder.default_values_with(RemoteDefaults::new(client.clone(), *user_id, defaults))
        }
    };
    builder.build()
}

/// Builds the login form.
pub fn login(mode: Mode) -> formstate::Result<Form> {
    Form::builder()
        .mode(mode)
        .default_values(FormValues::try_from(json!({ "email": "", "password": "" }))?)
        .field("email", FieldOptions::new().required("Email is required"))
        .field("password", FieldOptions::new().required("Password is required"))
        .build()
}
