//! Remote email availability check.

use formstate::validation::{AsyncValidator, BoxFuture, Message, Verdict};
use formstate::{FieldValue, FormValues, ValidatorFault};
use tracing::{debug, warn};

use crate::client::UserClient;

/// Async validator that fails when the user service already has an
/// account for the address.
///
/// Blank and non-text values pass without a request; pair it with a
/// `required` rule. Transport failures are validator faults, not field
/// errors.
#[derive(Debug, Clone)]
pub struct EmailAvailability {
    client: UserClient,
    message: Message,
}

impl EmailAvailability {
    /// Creates the validator with the default message.
    pub fn new(client: UserClient) -> Self {
        Self::with_message(client, "Email already exists")
    }

    /// Creates the validator with a custom message.
    pub fn with_message(client: UserClient, message: impl Into<Message>) -> Self {
        Self {
            client,
            message: message.into(),
        }
    }
}

impl AsyncValidator for EmailAvailability {
    fn validate(
        &self,
        value: FieldValue,
        _: FormValues,
    ) -> BoxFuture<'static, Result<Verdict, ValidatorFault>> {
        let client = self.client.clone();
        let message = self.message.render(&value);

        Box::pin(async move {
            let Some(email) = value.as_str().map(str::trim).filter(|s| !s.is_empty()) else {
                return Ok(Verdict::Pass);
            };

            let users = match client.users_with_email(email).await {
                Ok(users) => users,
                Err(err) => {
                    warn!(error = %err, "email availability check failed");
                    return Err(ValidatorFault::new(err.to_string()));
                }
            };
            debug!(email, matches = users.len(), "email availability checked");
            Ok(Verdict::check(users.is_empty(), message))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::RemoteConfig;
    use crate::test_server::respond_once;
    use formstate::{FieldOptions, Form, FormError, Mode};

    async fn check(status: &str, body: &str, email: &str) -> Result<Verdict, ValidatorFault> {
        let (url, _request) = respond_once(status, body).await;
        let client = UserClient::new(RemoteConfig::new(url)).unwrap();
        EmailAvailability::new(client)
            .validate(email.into(), FormValues::new())
            .await
    }

    #[tokio::test]
    async fn test_available() {
        assert_eq!(check("200 OK", "[]", "free@site.com").await.unwrap(), Verdict::Pass);
    }

    #[tokio::test]
    async fn test_taken() {
        let verdict = check("200 OK", r#"[{"id":1}]"#, "Sincere@april.biz").await.unwrap();
        assert_eq!(verdict, Verdict::fail("Email already exists"));
    }

    #[tokio::test]
    async fn test_blank_skips_request() {
        let client = UserClient::new(RemoteConfig::new("http://127.0.0.1:9")).unwrap();
        let verdict = EmailAvailability::new(client)
            .validate("  ".into(), FormValues::new())
            .await
            .unwrap();
        assert!(verdict.is_pass());
    }

    #[tokio::test]
    async fn test_server_error_is_fault() {
        assert!(check("500 Internal Server Error", "{}", "a@b.c").await.is_err());
    }

    #[tokio::test]
    async fn test_fault_surfaces_from_form() {
        let (url, _request) = respond_once("200 OK", "{}").await;
        let client = UserClient::new(RemoteConfig::new(url)).unwrap();
        let mut form = Form::builder()
            .mode(Mode::OnChange)
            .field(
                "email",
                FieldOptions::new().validate_async("emailAvailable", EmailAvailability::new(client)),
            )
            .build()
            .unwrap();

        let pending = form.change("email", "a@b.c").unwrap().unwrap();
        assert!(matches!(
            pending.resolve().await,
            Err(FormError::ValidatorFault { .. })
        ));
    }
}
