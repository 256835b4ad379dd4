use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use mlua::{Lua, Value, Variadic};
use tracing::warn;

use crate::arity::{ArgSpec, Args};
use crate::error::{BindError, Result};
use crate::session::Session;
use crate::value::display_string;

/// Host side of a top-level script call.
pub type CommandFn = Rc<dyn Fn(&Lua, &Session, Args) -> Result<Value>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    /// Unlogged utility callable.
    Function,
    /// Logged side-effecting command; every call is reported before it runs.
    Verb,
}

#[derive(Clone)]
pub struct CommandEntry {
    name: String,
    spec: ArgSpec,
    category: Category,
    handler: CommandFn,
}

impl fmt::Debug for CommandEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandEntry")
            .field("name", &self.name)
            .field("spec", &self.spec)
            .field("category", &self.category)
            .finish_non_exhaustive()
    }
}

impl CommandEntry {
    pub fn new<F>(name: &str, spec: ArgSpec, category: Category, handler: F) -> Self
    where
        F: Fn(&Lua, &Session, Args) -> Result<Value> + 'static,
    {
        Self {
            name: name.to_string(),
            spec,
            category,
            handler: Rc::new(handler),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn spec(&self) -> ArgSpec {
        self.spec
    }

    pub fn category(&self) -> Category {
        self.category
    }

    /// Publish the entry as a global function of `lua`.
    ///
    /// Arity is enforced first; verbs then report `name(arg, ...)` and only
    /// afterwards reach the handler, so the report exists even when the handler fails.
    pub fn install(&self, lua: &Lua) -> Result<()> {
        let entry = self.clone();
        let func = lua.create_function(move |lua, args: Variadic<Value>| {
            let values: Vec<Value> = args.into_iter().collect();
            entry.spec.check(&entry.name, &values)?;
            let session = Session::current(lua)?;
            if entry.category == Category::Verb {
                let rendered: Vec<String> = values.iter().map(display_string).collect();
                session.observe(&format!("{}({})", entry.name, rendered.join(", ")));
            }
            (entry.handler)(lua, &session, Args::new(entry.name.clone(), values)).map_err(mlua::Error::from)
        })?;
        lua.globals().set(self.name.as_str(), func)?;
        Ok(())
    }
}

/// Name-keyed table of one category of commands.
#[derive(Debug, Clone)]
pub struct CommandTable {
    category: Category,
    entries: BTreeMap<String, CommandEntry>,
}

impl CommandTable {
    pub fn new(category: Category) -> Self {
        Self {
            category,
            entries: BTreeMap::new(),
        }
    }

    pub fn category(&self) -> Category {
        self.category
    }

    /// Add an entry; names are unique within a table.
    pub fn insert(&mut self, entry: CommandEntry) -> Result<()> {
        if entry.category != self.category {
            return Err(BindError::Configuration(format!(
                "`{}` is a {:?} entry, not a {:?}",
                entry.name, entry.category, self.category
            )));
        }
        if self.entries.contains_key(&entry.name) {
            return Err(BindError::Configuration(format!(
                "{:?} `{}` is already registered",
                self.category, entry.name
            )));
        }
        self.entries.insert(entry.name.clone(), entry);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&CommandEntry> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &CommandEntry> {
        self.entries.values()
    }

    fn omit(&mut self, names: &[String]) {
        self.entries.retain(|name, _| !names.iter().any(|omitted| omitted == name));
    }
}

/// The two jump tables handed to a host: logged verbs and plain functions.
#[derive(Debug, Clone)]
pub struct CommandRegistry {
    verbs: CommandTable,
    functions: CommandTable,
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self {
            verbs: CommandTable::new(Category::Verb),
            functions: CommandTable::new(Category::Function),
        }
    }

    pub fn register_verb<F>(&mut self, name: &str, spec: ArgSpec, handler: F) -> Result<CommandEntry>
    where
        F: Fn(&Lua, &Session, Args) -> Result<Value> + 'static,
    {
        let entry = CommandEntry::new(name, spec, Category::Verb, handler);
        self.verbs.insert(entry.clone())?;
        Ok(entry)
    }

    pub fn register_function<F>(&mut self, name: &str, spec: ArgSpec, handler: F) -> Result<CommandEntry>
    where
        F: Fn(&Lua, &Session, Args) -> Result<Value> + 'static,
    {
        let entry = CommandEntry::new(name, spec, Category::Function, handler);
        self.functions.insert(entry.clone())?;
        Ok(entry)
    }

    pub fn verbs(&self) -> &CommandTable {
        &self.verbs
    }

    pub fn functions(&self) -> &CommandTable {
        &self.functions
    }

    /// Drop omitted names from both tables. Runs before anything is installed.
    pub fn omit(&mut self, names: &[String]) {
        self.verbs.omit(names);
        self.functions.omit(names);
    }

    /// Install verbs, then functions, as interpreter globals.
    pub fn install(&self, lua: &Lua) -> Result<()> {
        for entry in self.verbs.entries() {
            entry.install(lua)?;
        }
        for entry in self.functions.entries() {
            if self.verbs.contains(entry.name()) {
                warn!(target: "rk::host", name = entry.name(), "function shadows verb of the same name");
            }
            entry.install(lua)?;
        }
        Ok(())
    }
}
