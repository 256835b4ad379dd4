use std::sync::Arc;

use thiserror::Error;

use crate::api::ApiError;

pub type Result<T, E = BindError> = std::result::Result<T, E>;

/// Everything that can go wrong between a script call and the host.
///
/// Apart from `Configuration`, every variant is raised back into the
/// interpreter as an exception carrying the display text.
#[derive(Debug, Clone, Error)]
pub enum BindError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("wrong number of arguments for `{name}` (given {given}, expected {expected})")]
    Arity { name: String, given: usize, expected: String },

    #[error("{0}")]
    Type(String),

    #[error("{0}")]
    Validation(String),

    #[error("{class}: could not find class instance")]
    NotFound { class: String },

    #[error(transparent)]
    RemoteApi(#[from] ApiError),

    #[error("host is closed")]
    ClosedHost,

    #[error("io error: {0}")]
    Io(Arc<std::io::Error>),

    #[error(transparent)]
    Script(#[from] mlua::Error),
}

impl BindError {
    pub fn type_error(msg: impl Into<String>) -> Self {
        BindError::Type(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        BindError::Validation(msg.into())
    }
}

impl From<std::io::Error> for BindError {
    fn from(err: std::io::Error) -> Self {
        BindError::Io(Arc::new(err))
    }
}

impl From<BindError> for mlua::Error {
    fn from(err: BindError) -> Self {
        match err {
            BindError::Script(inner) => inner,
            other => mlua::Error::external(other),
        }
    }
}
