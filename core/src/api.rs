//! The remote side: anything that can list cluster objects.

use serde::de::DeserializeOwned;
use thiserror::Error;

/// Selects all namespaces when passed to [`ResourceApi::list`].
pub const ALL_NAMESPACES: &str = "";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListOptions {
    pub label_selector: Option<String>,
}

impl ListOptions {
    pub fn with_labels(selector: impl Into<String>) -> Self {
        Self {
            label_selector: Some(selector.into()),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum ApiError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("failed to decode {kind}: {message}")]
    Decode { kind: String, message: String },
}

/// Cluster API client as seen by the bindings.
///
/// Objects come back as Kubernetes-shaped JSON documents; decoding into
/// typed items happens on the binding side so every kind shares one call.
/// Calls block until the collaborator answers; no timeout is applied here.
pub trait ResourceApi {
    fn list(&self, kind: &str, namespace: &str, options: &ListOptions) -> Result<Vec<serde_json::Value>, ApiError>;
}

/// List `kind` and decode every document into `T`.
pub fn list_as<T: DeserializeOwned>(
    api: &dyn ResourceApi,
    kind: &str,
    namespace: &str,
    options: &ListOptions,
) -> Result<Vec<T>, ApiError> {
    api.list(kind, namespace, options)?
        .into_iter()
        .map(|doc| {
            serde_json::from_value(doc).map_err(|e| ApiError::Decode {
                kind: kind.to_string(),
                message: e.to_string(),
            })
        })
        .collect()
}
