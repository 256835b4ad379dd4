//! The interpreter host: one Lua state, its session and its installed commands.

use std::fmt;
use std::io::{self, Write};
use std::rc::Rc;

use mlua::{FromLuaMulti, Lua, Value};
use tracing::debug;

use crate::api::ResourceApi;
use crate::arity::{ArgSpec, Args};
use crate::command::{CommandEntry, CommandRegistry};
use crate::error::{BindError, Result};
use crate::kinds::Classes;
use crate::session::Session;

pub const DEFAULT_NAMESPACE: &str = "default";

/// Chunk name scripts run under unless the caller names them.
const DEFAULT_CHUNK: &str = "script";

/// Everything a host needs before the interpreter starts.
pub struct HostConfig {
    api: Rc<dyn ResourceApi>,
    namespace: String,
    output: Box<dyn Write>,
    observer: Option<Rc<dyn Fn(&str)>>,
}

impl fmt::Debug for HostConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostConfig")
            .field("namespace", &self.namespace)
            .field("observer", &self.observer.is_some())
            .finish_non_exhaustive()
    }
}

impl HostConfig {
    pub fn new(api: Rc<dyn ResourceApi>) -> Self {
        Self {
            api,
            namespace: DEFAULT_NAMESPACE.to_string(),
            output: Box::new(io::stdout()),
            observer: None,
        }
    }

    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Where `inspect`, `count_pods` and friends print.
    pub fn output(mut self, output: impl Write + 'static) -> Self {
        self.output = Box::new(output);
        self
    }

    /// Called with `name(arg, ...)` for every verb call, after the log event.
    pub fn observer(mut self, observer: impl Fn(&str) + 'static) -> Self {
        self.observer = Some(Rc::new(observer));
        self
    }
}

/// An embedded interpreter wired to a cluster API.
///
/// Garbage collection stays off while the host is open; script objects are
/// owned by the class bridges and released together in [`Host::close`].
pub struct Host {
    lua: Option<Lua>,
    session: Rc<Session>,
    commands: CommandRegistry,
}

impl fmt::Debug for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Host")
            .field("open", &self.lua.is_some())
            .field("session", &self.session)
            .field("commands", &self.commands)
            .finish()
    }
}

impl Host {
    /// Start an interpreter, define every resource class and install the
    /// commands whose names are not in `omit`.
    pub fn initialize(config: HostConfig, mut commands: CommandRegistry, omit: &[String]) -> Result<Self> {
        let lua = Lua::new();
        lua.gc_stop();

        let classes = Classes::define(&lua).map_err(|e| BindError::Configuration(format!("defining classes: {e}")))?;
        let session = Rc::new(Session::new(
            config.api,
            config.namespace,
            config.output,
            config.observer,
            classes,
        ));
        lua.set_app_data(Rc::clone(&session));

        commands.omit(omit);
        commands.install(&lua)?;

        debug!(
            target: "rk::host",
            namespace = session.default_namespace(),
            verbs = commands.verbs().len(),
            functions = commands.functions().len(),
            "host initialized"
        );

        Ok(Self {
            lua: Some(lua),
            session,
            commands,
        })
    }

    fn open_lua(&self) -> Result<&Lua> {
        self.lua.as_ref().ok_or(BindError::ClosedHost)
    }

    /// Register and install a verb on a running host.
    pub fn register_verb<F>(&mut self, name: &str, spec: ArgSpec, handler: F) -> Result<()>
    where
        F: Fn(&Lua, &Session, Args) -> Result<Value> + 'static,
    {
        let lua = self.lua.as_ref().ok_or(BindError::ClosedHost)?;
        let entry = self.commands.register_verb(name, spec, handler)?;
        entry.install(lua)
    }

    /// Register and install a function on a running host.
    pub fn register_function<F>(&mut self, name: &str, spec: ArgSpec, handler: F) -> Result<()>
    where
        F: Fn(&Lua, &Session, Args) -> Result<Value> + 'static,
    {
        let lua = self.lua.as_ref().ok_or(BindError::ClosedHost)?;
        let entry: CommandEntry = self.commands.register_function(name, spec, handler)?;
        entry.install(lua)
    }

    /// Evaluate `script` and return the value of its last expression.
    pub fn run(&self, script: &str) -> Result<Value> {
        self.run_named(script, DEFAULT_CHUNK)
    }

    /// Like [`Host::run`], reporting errors against `chunk`.
    pub fn run_named(&self, script: &str, chunk: &str) -> Result<Value> {
        let lua = self.open_lua()?;
        Ok(lua.load(script).set_name(chunk).eval::<Value>()?)
    }

    /// Evaluate `script` and convert its results.
    pub fn eval<R: FromLuaMulti>(&self, script: &str) -> Result<R> {
        let lua = self.open_lua()?;
        Ok(lua.load(script).set_name(DEFAULT_CHUNK).eval::<R>()?)
    }

    pub fn lua(&self) -> Result<&Lua> {
        self.open_lua()
    }

    pub fn session(&self) -> &Rc<Session> {
        &self.session
    }

    pub fn commands(&self) -> &CommandRegistry {
        &self.commands
    }

    pub fn is_closed(&self) -> bool {
        self.lua.is_none()
    }

    /// Release every script object and shut the interpreter down.
    pub fn close(&mut self) -> Result<()> {
        let lua = self.lua.take().ok_or(BindError::ClosedHost)?;
        let classes = self.session.classes();
        for (class, count) in classes.object_counts() {
            debug!(target: "rk::host", class, count, "releasing objects");
        }
        classes.clear();
        lua.remove_app_data::<Rc<Session>>();
        lua.gc_restart();
        lua.gc_collect()?;
        drop(lua);
        debug!(target: "rk::host", "host closed");
        Ok(())
    }
}

impl Drop for Host {
    fn drop(&mut self) {
        if self.lua.is_some() {
            let _ = self.close();
        }
    }
}
