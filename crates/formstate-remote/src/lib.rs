//! # formstate-remote
//!
//! HTTP adapters connecting [`formstate`] forms to a user service:
//!
//! - [`RemoteDefaults`]: a default-value loader backed by `GET {base}/users/{id}`
//! - [`EmailAvailability`]: an async validator backed by `GET {base}/users?email=`
//!
//! ```no_run
//! use formstate::{FieldOptions, Form, FormValues};
//! use formstate_remote::{EmailAvailability, RemoteConfig, RemoteDefaults, UserClient};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let client = UserClient::new(RemoteConfig::default())?;
//! let mut form = Form::builder()
//!     .default_values_with(RemoteDefaults::new(client.clone(), 1, FormValues::new()))
//!     .field(
//!         "email",
//!         FieldOptions::new()
//!             .required("Email is required")
//!             .validate_async("emailAvailable", EmailAvailability::new(client)),
//!     )
//!     .build()?;
//! form.load_defaults().await?;
//! # Ok(())
//! # }
//! ```

mod client;
mod defaults;
mod email;
mod error;
#[cfg(test)]
mod test_server;

pub use client::{RemoteConfig, UserClient, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
pub use defaults::RemoteDefaults;
pub use email::EmailAvailability;
pub use error::{RemoteError, Result};
