use std::cell::RefCell;
use std::fmt::{self, Display};
use std::io::Write;
use std::rc::Rc;

use mlua::Lua;
use tracing::info;

use crate::api::ResourceApi;
use crate::error::{BindError, Result};
use crate::kinds::Classes;

/// Per-host state reachable from every binding: the API client, the default
/// namespace, the output sink and the class registries.
pub struct Session {
    api: Rc<dyn ResourceApi>,
    namespace: String,
    output: RefCell<Box<dyn Write>>,
    observer: Option<Rc<dyn Fn(&str)>>,
    classes: Classes,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("namespace", &self.namespace)
            .field("classes", &self.classes)
            .finish_non_exhaustive()
    }
}

impl Session {
    pub(crate) fn new(
        api: Rc<dyn ResourceApi>,
        namespace: String,
        output: Box<dyn Write>,
        observer: Option<Rc<dyn Fn(&str)>>,
        classes: Classes,
    ) -> Self {
        Self {
            api,
            namespace,
            output: RefCell::new(output),
            observer,
            classes,
        }
    }

    /// The session of the host that owns `lua`.
    pub fn current(lua: &Lua) -> Result<Rc<Session>> {
        lua.app_data_ref::<Rc<Session>>()
            .map(|session| Rc::clone(&*session))
            .ok_or(BindError::ClosedHost)
    }

    pub fn api(&self) -> &dyn ResourceApi {
        self.api.as_ref()
    }

    pub fn default_namespace(&self) -> &str {
        &self.namespace
    }

    /// A namespace the script left out (nil) falls back to the session default.
    pub fn resolve_namespace<'a>(&'a self, requested: Option<&'a str>) -> &'a str {
        requested.unwrap_or(&self.namespace)
    }

    pub fn classes(&self) -> &Classes {
        &self.classes
    }

    pub fn println(&self, line: impl Display) -> Result<()> {
        let mut out = self.output.borrow_mut();
        writeln!(out, "{line}")?;
        out.flush()?;
        Ok(())
    }

    /// Report a verb call before it runs.
    pub fn observe(&self, line: &str) {
        info!(target: "rk::verb", "{line}");
        if let Some(observer) = &self.observer {
            observer(line);
        }
    }
}
