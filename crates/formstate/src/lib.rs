//! # formstate
//!
//! Form state tracking and validation.
//!
//! This crate provides:
//! - A value tree addressed by dotted paths (`social.twitter`, `phNumbers.0.number`)
//! - Field registration with `required`, `pattern` and named sync/async rules
//! - Dirty, touched, validating and disabled tracking per field
//! - Validation modes deciding when rules run (`onSubmit`, `onBlur`, ...)
//! - Field arrays with stable entry identities
//! - Submission lifecycle, reset and default-value loading
//! - Watchers and state subscriptions
//!
//! ## Quick Start
//!
//! ```rust
//! use formstate::{FieldOptions, Form, FormValues, Mode};
//! use serde_json::json;
//!
//! let defaults = FormValues::try_from(json!({ "email": "", "channel": "" })).unwrap();
//! let mut form = Form::builder()
//!     .mode(Mode::OnChange)
//!     .default_values(defaults)
//!     .field(
//!         "email",
//!         FieldOptions::new()
//!             .required("Email is required")
//!             .pattern(r"^\S+@\S+$", "Invalid email format")
//!             .unwrap(),
//!     )
//!     .field("channel", FieldOptions::new().required("Channel is required"))
//!     .build()
//!     .unwrap();
//!
//! form.change("email", "not-an-email").unwrap();
//! assert_eq!(form.errors().message("email"), Some("Invalid email format"));
//!
//! form.change("email", "bruce@wayne.com").unwrap();
//! let state = form.state();
//! assert!(state.is_dirty);
//! assert!(state.errors.is_empty());
//! ```
//!
//! ## Field Arrays
//!
//! ```rust
//! use formstate::{ArrayTemplate, FieldOptions, Form};
//!
//! let mut form = Form::builder()
//!     .field_array(
//!         "phNumbers",
//!         ArrayTemplate::new()
//!             .item_field("number", FieldOptions::new().required("Phone number is required"))
//!             .unwrap(),
//!     )
//!     .build()
//!     .unwrap();
//!
//! let mut phones = form.field_array("phNumbers").unwrap();
//! let id = phones.append(serde_json::json!({ "number": "" })).unwrap();
//! assert_eq!(phones.fields()[0].id, id);
//! ```
//!
//! ## Async Validation
//!
//! Mutations run synchronous rules inline and return the async remainder as
//! a [`PendingValidation`]. Resolve it wherever convenient and hand the
//! outcome back with [`Form::apply_validation`]; results for fields edited
//! in the meantime are dropped. The `validate_*`, `trigger*` and
//! [`Form::handle_submit`] methods do all of this themselves.

mod array;
mod engine;
mod error;
mod field;
mod form;
mod loader;
mod observer;
mod path;
mod state;
pub mod validation;
mod value;

pub use array::{ArrayFieldEntry, ArrayTemplate, EntryId, FieldArray};
pub use engine::{FieldOutcome, PendingValidation, ValidationOutcome};
pub use error::{BoxError, FieldError, FieldErrors, FormError, Result, ValidatorFault};
pub use field::{FieldHandle, FieldOptions, ValidatorKind};
pub use form::{
    Form, FormBuilder, FormOptions, Mode, ReValidateMode, ResetOptions, SetValueOptions,
    StateCallback, WatchCallback,
};
pub use loader::{DefaultValueLoader, DefaultValues, FormPhase, LoaderFn};
pub use observer::Subscription;
pub use path::{FieldPath, IntoFieldPath, PathSegment};
pub use state::FormState;
pub use value::{FieldValue, FormValues, ValueAs};
