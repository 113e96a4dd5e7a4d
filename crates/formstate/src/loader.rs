//! Default-value loading.

use std::future::Future;
use std::sync::Arc;

use serde::Serialize;

use crate::error::BoxError;
use crate::validation::BoxFuture;
use crate::value::FormValues;

/// Trait for asynchronous default-value sources, such as a profile fetch.
///
/// A form built with a loader stays in [`FormPhase::Loading`] until
/// [`Form::load_defaults`](crate::Form::load_defaults) has run it.
pub trait DefaultValueLoader: Send + Sync {
    /// Loads the default values.
    fn load(&self) -> BoxFuture<'_, Result<FormValues, BoxError>>;
}

/// Loader backed by a closure returning a future.
pub struct LoaderFn<F> {
    f: F,
}

impl<F, Fut> LoaderFn<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<FormValues, BoxError>> + Send + 'static,
{
    /// Wraps a closure.
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F, Fut> DefaultValueLoader for LoaderFn<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<FormValues, BoxError>> + Send + 'static,
{
    fn load(&self) -> BoxFuture<'_, Result<FormValues, BoxError>> {
        Box::pin((self.f)())
    }
}

/// Where a form's default values come from.
#[derive(Clone)]
pub enum DefaultValues {
    /// Known up front; the form is ready immediately.
    Values(FormValues),
    /// Fetched once, after construction.
    Loader(Arc<dyn DefaultValueLoader>),
}

impl Default for DefaultValues {
    fn default() -> Self {
        Self::Values(FormValues::new())
    }
}

impl std::fmt::Debug for DefaultValues {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Values(values) => f.debug_tuple("Values").field(values).finish(),
            Self::Loader(_) => f.write_str("Loader(..)"),
        }
    }
}

/// Lifecycle phase of a form instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FormPhase {
    /// Default values are pending; submission is refused.
    Loading,
    /// Default values are in place.
    Ready,
    /// The loader failed; the form never becomes ready.
    Failed,
}

/// Internal phase, carrying the loader until it has run.
pub(crate) enum Phase {
    Loading(Arc<dyn DefaultValueLoader>),
    Ready,
    Failed(String),
}

impl Phase {
    pub fn public(&self) -> FormPhase {
        match self {
            Self::Loading(_) => FormPhase::Loading,
            Self::Ready => FormPhase::Ready,
            Self::Failed(_) => FormPhase::Failed,
        }
    }
}
