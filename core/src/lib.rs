pub mod api;
pub mod arity;
pub mod bridge;
pub mod class;
pub mod command;
pub mod error;
pub mod host;
pub mod kinds;
pub mod marshal;
pub mod output;
pub mod session;
pub mod template;
pub mod value;

#[cfg(test)]
mod test_support;

#[cfg(test)]
mod marshal_test;
#[cfg(test)]
mod template_test;

pub use api::{ALL_NAMESPACES, ApiError, ListOptions, ResourceApi};
pub use arity::{ArgSpec, Args};
pub use command::{Category, CommandEntry, CommandRegistry};
pub use error::{BindError, Result};
pub use host::{DEFAULT_NAMESPACE, Host, HostConfig};
pub use output::Capture;
pub use session::Session;
