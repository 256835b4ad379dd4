use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use mlua::{Function, Lua, Table, Value, Variadic};

use crate::arity::{ArgSpec, Args};
use crate::error::{BindError, Result};
use crate::value::display_string;

/// Method name that also receives every non-string key used to index an instance.
pub const INDEXER: &str = "[]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Instance,
    Class,
}

/// Receives the instance (or the class table for class-scope methods) and the remaining arguments.
pub type MethodFn = Rc<dyn Fn(&Lua, &Table, Args) -> Result<Value>>;

#[derive(Clone)]
pub struct MethodDef {
    pub spec: ArgSpec,
    pub scope: Scope,
    pub handler: MethodFn,
}

impl fmt::Debug for MethodDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDef")
            .field("spec", &self.spec)
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

/// A script class before it is handed to the interpreter.
#[derive(Debug, Clone)]
pub struct ClassDefinition {
    name: String,
    methods: BTreeMap<String, MethodDef>,
}

impl ClassDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            methods: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn method(&self, name: &str) -> Option<&MethodDef> {
        self.methods.get(name)
    }

    pub fn method_names(&self, scope: Scope) -> Vec<&str> {
        self.methods
            .iter()
            .filter(|(_, def)| def.scope == scope)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Add or replace a method.
    pub fn define(mut self, name: &str, def: MethodDef) -> Self {
        self.methods.insert(name.to_string(), def);
        self
    }

    pub fn instance_method<F>(self, name: &str, spec: ArgSpec, handler: F) -> Self
    where
        F: Fn(&Lua, &Table, Args) -> Result<Value> + 'static,
    {
        self.define(
            name,
            MethodDef {
                spec,
                scope: Scope::Instance,
                handler: Rc::new(handler),
            },
        )
    }

    pub fn class_method<F>(self, name: &str, spec: ArgSpec, handler: F) -> Self
    where
        F: Fn(&Lua, &Table, Args) -> Result<Value> + 'static,
    {
        self.define(
            name,
            MethodDef {
                spec,
                scope: Scope::Class,
                handler: Rc::new(handler),
            },
        )
    }

    /// Build the class table and instance metatable and publish the class as a global.
    pub fn install(self, lua: &Lua) -> Result<InstalledClass> {
        let class = lua.create_table()?;
        let methods = lua.create_table()?;
        let mut indexer = None;

        for (name, def) in self.methods {
            match def.scope {
                Scope::Instance => {
                    let func = instance_function(lua, format!("{}#{}", self.name, name), def)?;
                    if name == INDEXER {
                        indexer = Some(func.clone());
                    }
                    methods.raw_set(name, func)?;
                }
                Scope::Class => {
                    let func = class_function(lua, format!("{}.{}", self.name, name), class.clone(), def)?;
                    class.raw_set(name, func)?;
                }
            }
        }

        let meta = lua.create_table()?;
        meta.raw_set("__index", index_function(lua, methods, indexer)?)?;
        meta.raw_set("__newindex", newindex_function(lua, self.name.clone())?)?;
        meta.raw_set("__name", self.name.as_str())?;
        meta.raw_set("__metatable", false)?;

        lua.globals().set(self.name.as_str(), class.clone())?;

        Ok(InstalledClass {
            name: self.name,
            class,
            meta,
        })
    }
}

/// A class living in the interpreter: its global table and the metatable of its instances.
#[derive(Debug, Clone)]
pub struct InstalledClass {
    name: String,
    class: Table,
    meta: Table,
}

impl InstalledClass {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn table(&self) -> &Table {
        &self.class
    }

    pub fn instantiate(&self, lua: &Lua) -> Result<Table> {
        let this = lua.create_table()?;
        this.set_metatable(Some(self.meta.clone()));
        Ok(this)
    }
}

fn instance_function(lua: &Lua, qualified: String, def: MethodDef) -> Result<Function> {
    let func = lua.create_function(move |lua, args: Variadic<Value>| {
        let mut values: Vec<Value> = args.into_iter().collect();
        let this = match values.first() {
            Some(Value::Table(t)) => t.clone(),
            _ => {
                return Err(BindError::type_error(format!("{qualified} must be called on an instance (use ':')")).into());
            }
        };
        values.remove(0);
        def.spec.check(&qualified, &values)?;
        (def.handler)(lua, &this, Args::new(qualified.clone(), values)).map_err(mlua::Error::from)
    })?;
    Ok(func)
}

fn class_function(lua: &Lua, qualified: String, class: Table, def: MethodDef) -> Result<Function> {
    let func = lua.create_function(move |lua, args: Variadic<Value>| {
        let mut values: Vec<Value> = args.into_iter().collect();
        // Accept both `Class.m()` and `Class:m()`.
        if matches!(values.first(), Some(Value::Table(t)) if *t == class) {
            values.remove(0);
        }
        def.spec.check(&qualified, &values)?;
        (def.handler)(lua, &class, Args::new(qualified.clone(), values)).map_err(mlua::Error::from)
    })?;
    Ok(func)
}

fn index_function(lua: &Lua, methods: Table, indexer: Option<Function>) -> Result<Function> {
    let func = lua.create_function(move |_, (this, key): (Table, Value)| match key {
        Value::String(_) => {
            let method: Value = methods.raw_get(key)?;
            Ok(method)
        }
        other => match &indexer {
            Some(index) => {
                let item: Value = index.call((this, other))?;
                Ok(item)
            }
            None => Ok(Value::Nil),
        },
    })?;
    Ok(func)
}

fn newindex_function(lua: &Lua, class_name: String) -> Result<Function> {
    let func = lua.create_function(move |_, (_this, key, _value): (Table, Value, Value)| {
        Err::<(), _>(
            BindError::type_error(format!(
                "{class_name} instances are read-only (cannot set `{}`)",
                display_string(&key)
            ))
            .into(),
        )
    })?;
    Ok(func)
}
