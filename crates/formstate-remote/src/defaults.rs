//! Default values fetched from the user service.

use formstate::validation::BoxFuture;
use formstate::{BoxError, DefaultValueLoader, FieldPath, FieldValue, FormValues, IntoFieldPath};
use tracing::info;

use crate::client::UserClient;
use crate::error::RemoteError;

/// Loads a user record and copies selected attributes over a base set of
/// defaults.
///
/// By default only `email` is copied, to the `email` field.
#[derive(Debug, Clone)]
pub struct RemoteDefaults {
    client: UserClient,
    user_id: u32,
    base: FormValues,
    copies: Vec<(String, FieldPath)>,
}

impl RemoteDefaults {
    /// Creates a loader for user `user_id` on top of `base`.
    pub fn new(client: UserClient, user_id: u32, base: FormValues) -> Self {
        Self {
            client,
            user_id,
            base,
            copies: vec![("email".to_string(), FieldPath::key("email"))],
        }
    }

    /// Copies the remote attribute `attribute` to the field at `path`.
    pub fn copy(
        mut self,
        attribute: impl Into<String>,
        path: impl IntoFieldPath,
    ) -> formstate::Result<Self> {
        self.copies.push((attribute.into(), path.into_field_path()?));
        Ok(self)
    }

    async fn fetch(&self) -> Result<FormValues, RemoteError> {
        let user = self.client.user(self.user_id).await?;
        let mut values = self.base.clone();
        for (attribute, path) in &self.copies {
            let value = user.get(attribute).cloned().ok_or_else(|| {
                RemoteError::UnexpectedPayload(format!("user record has no `{attribute}`"))
            })?;
            values.set(path, FieldValue::from(value))?;
        }
        info!(user_id = self.user_id, "fetched remote default values");
        Ok(values)
    }
}

impl DefaultValueLoader for RemoteDefaults {
    fn load(&self) -> BoxFuture<'_, Result<FormValues, BoxError>> {
        Box::pin(async move { self.fetch().await.map_err(BoxError::from) })
    }
}
