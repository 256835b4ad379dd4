//! Script classes generated once per resource kind.
//!
//! For a kind `R` the template yields a collection class (`R::COLLECTION_CLASS`)
//! holding an ordered list of fetched items, and an item class
//! (`R::ITEM_CLASS`) holding one item. Indexing, `first`, `last`, `any` and
//! `each` on a collection hand out fresh item instances.

use std::rc::{Rc, Weak};

use mlua::{Lua, Table, Value};
use rand::Rng;
use regex::Regex;
use tracing::debug;

use crate::api::{self, ListOptions};
use crate::arity::{ArgSpec, Args};
use crate::bridge::Bridge;
use crate::class::{ClassDefinition, INDEXER};
use crate::error::{BindError, Result};
use crate::kinds::Resource;
use crate::marshal::StringHash;
use crate::session::Session;
use crate::value::to_lua;

/// Keys accepted by the table form of a name filter.
pub const FILTER_KEYS: &[&str] = &["labels", "name"];

/// Vars bag of a collection instance.
#[derive(Debug, Clone)]
pub struct ListVars<R> {
    pub items: Vec<R>,
    /// The query of the last fetch, replayed by `update`.
    pub query: Option<Query>,
}

impl<R> Default for ListVars<R> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            query: None,
        }
    }
}

/// Vars bag of an item instance.
#[derive(Debug, Clone, Default)]
pub struct ItemVars<R> {
    pub item: R,
}

pub type CollectionClass<R> = Rc<Bridge<ListVars<R>>>;
pub type ItemClass<R> = Rc<Bridge<ItemVars<R>>>;

/// What a fetch asks for: namespace (nil means the session default), an
/// optional name pattern and list options passed to the API.
#[derive(Debug, Clone, Default)]
pub struct Query {
    pub namespace: Option<String>,
    pub name: Option<Regex>,
    pub options: ListOptions,
}

impl Query {
    /// Parse `fetch!(namespace?, filter?)` arguments. The filter is either a
    /// pattern string or a table with `name` and `labels` keys.
    pub fn from_args(args: &Args) -> Result<Self> {
        let mut query = Query {
            namespace: args.opt_string(0)?,
            ..Query::default()
        };
        match args.get(1) {
            Value::Nil => {}
            Value::String(s) => query.name = Some(compile_pattern(&s.to_string_lossy())?),
            Value::Table(t) => {
                let filter = StringHash::from_table(t, args.name(), FILTER_KEYS)?;
                if let Some(pattern) = filter.get("name") {
                    query.name = Some(compile_pattern(pattern)?);
                }
                if let Some(selector) = filter.get("labels") {
                    query.options = ListOptions::with_labels(selector);
                }
            }
            other => {
                return Err(BindError::type_error(format!(
                    "{}: filter must be a string or a table, got {}",
                    args.name(),
                    other.type_name()
                )));
            }
        }
        Ok(query)
    }

    pub fn matches<R: Resource>(&self, item: &R) -> bool {
        self.name.as_ref().is_none_or(|re| re.is_match(&item.metadata().name))
    }
}

fn compile_pattern(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| BindError::validation(format!("invalid name pattern `{pattern}`: {e}")))
}

/// Map a script index onto a list of `len` items: `[0, len)` counts from the
/// front, `[-len, 0)` from the back, anything else selects nothing.
pub fn resolve_index(index: i64, len: usize) -> Option<usize> {
    let len = i64::try_from(len).ok()?;
    if (0..len).contains(&index) {
        Some(index as usize)
    } else if (-len..0).contains(&index) {
        Some((len + index) as usize)
    } else {
        None
    }
}

/// Run `query` and replace the items of the collection `this` in place.
/// Returns the new item count.
pub fn fetch<R: Resource>(lua: &Lua, class: &Bridge<ListVars<R>>, this: &Table, query: Query) -> Result<usize> {
    let vars = class.lookup_vars(this)?;
    let session = Session::current(lua)?;
    let namespace = session.resolve_namespace(query.namespace.as_deref());
    let listed: Vec<R> = api::list_as(session.api(), R::KIND, namespace, &query.options)?;
    let items: Vec<R> = listed.into_iter().filter(|item| query.matches(item)).collect();
    let count = items.len();
    debug!(target: "rk::template", class = R::COLLECTION_CLASS, namespace, count, "fetched");

    let mut vars = vars.borrow_mut();
    vars.items = items;
    vars.query = Some(query);
    Ok(count)
}

/// Replay the last fetch of `this`; a collection never fetched runs the default query.
pub fn update<R: Resource>(lua: &Lua, class: &Bridge<ListVars<R>>, this: &Table) -> Result<usize> {
    let query = class.lookup_vars(this)?.borrow().query.clone().unwrap_or_default();
    fetch(lua, class, this, query)
}

/// Wrap `item` in a new instance of the item class.
pub fn wrap_item<R: Resource>(lua: &Lua, items: &Bridge<ItemVars<R>>, item: R) -> Result<Value> {
    Ok(Value::Table(items.create_with(lua, ItemVars { item })?))
}

fn items_of<R: Resource>(class: &Weak<Bridge<ListVars<R>>>, this: &Table) -> Result<Vec<R>> {
    let vars = Bridge::upgrade(class)?.lookup_vars(this)?;
    let items = vars.borrow().items.clone();
    Ok(items)
}

/// Select one item by position and wrap it, or nil when there is none.
fn pick<R, F>(lua: &Lua, class: &Weak<Bridge<ListVars<R>>>, items: &Weak<Bridge<ItemVars<R>>>, this: &Table, select: F) -> Result<Value>
where
    R: Resource,
    F: FnOnce(usize) -> Option<usize>,
{
    let vars = Bridge::upgrade(class)?.lookup_vars(this)?;
    let item = {
        let vars = vars.borrow();
        select(vars.items.len()).and_then(|i| vars.items.get(i).cloned())
    };
    match item {
        Some(item) => wrap_item(lua, &*Bridge::upgrade(items)?, item),
        None => Ok(Value::Nil),
    }
}

pub fn define_collection_class<R: Resource>(lua: &Lua, items: &ItemClass<R>) -> Result<CollectionClass<R>> {
    let class: CollectionClass<R> = Bridge::new(R::COLLECTION_CLASS);
    let weak = Rc::downgrade(&class);
    let item_class = Rc::downgrade(items);

    let fetch_method = {
        let weak = weak.clone();
        move |lua: &Lua, this: &Table, args: Args| -> Result<Value> {
            let query = Query::from_args(&args)?;
            fetch(lua, &*Bridge::upgrade(&weak)?, this, query)?;
            Ok(Value::Table(this.clone()))
        }
    };

    let def = class
        .common_methods(ClassDefinition::new(R::COLLECTION_CLASS))
        .instance_method("fetch!", ArgSpec::opt(2), fetch_method.clone())
        .instance_method("fetch", ArgSpec::opt(2), fetch_method)
        .instance_method("update", ArgSpec::none(), {
            let weak = weak.clone();
            move |lua, this, _args| {
                update(lua, &*Bridge::upgrade(&weak)?, this)?;
                Ok(Value::Table(this.clone()))
            }
        })
        .instance_method("inspect", ArgSpec::none(), {
            let weak = weak.clone();
            move |lua, this, _args| {
                let session = Session::current(lua)?;
                for (n, item) in items_of(&weak, this)?.iter().enumerate() {
                    let meta = item.metadata();
                    session.println(format_args!("{}: {}/{}", n, meta.namespace, meta.name))?;
                }
                Ok(Value::Table(this.clone()))
            }
        })
        .instance_method(INDEXER, ArgSpec::req(1), {
            let weak = weak.clone();
            let item_class = item_class.clone();
            move |lua, this, args| {
                let index = match args.get(0) {
                    Value::Integer(n) => *n,
                    other => {
                        return Err(BindError::type_error(format!(
                            "{}: index must be an integer, got {}",
                            R::COLLECTION_CLASS,
                            other.type_name()
                        )));
                    }
                };
                pick(lua, &weak, &item_class, this, |len| resolve_index(index, len))
            }
        })
        .instance_method("count", ArgSpec::none(), {
            let weak = weak.clone();
            move |_lua, this, _args| {
                let vars = Bridge::upgrade(&weak)?.lookup_vars(this)?;
                let count = vars.borrow().items.len();
                Ok(Value::Integer(count as i64))
            }
        })
        .instance_method("first", ArgSpec::none(), {
            let weak = weak.clone();
            let item_class = item_class.clone();
            move |lua, this, _args| pick(lua, &weak, &item_class, this, |len| (len > 0).then_some(0))
        })
        .instance_method("last", ArgSpec::none(), {
            let weak = weak.clone();
            let item_class = item_class.clone();
            move |lua, this, _args| pick(lua, &weak, &item_class, this, |len| len.checked_sub(1))
        })
        .instance_method("any", ArgSpec::none(), {
            let weak = weak.clone();
            let item_class = item_class.clone();
            move |lua, this, _args| {
                pick(lua, &weak, &item_class, this, |len| {
                    (len > 0).then(|| rand::thread_rng().gen_range(0..len))
                })
            }
        })
        .instance_method("each", ArgSpec::block(), {
            let weak = weak.clone();
            let item_class = item_class.clone();
            move |lua, this, args| {
                let block = args.block()?;
                let items = Bridge::upgrade(&item_class)?;
                for item in items_of(&weak, this)? {
                    let handle = wrap_item(lua, &items, item)?;
                    block.call::<()>(handle)?;
                }
                Ok(Value::Table(this.clone()))
            }
        });

    class.bind(def.install(lua)?)?;
    Ok(class)
}

pub fn define_item_class<R: Resource>(lua: &Lua) -> Result<ItemClass<R>> {
    let class: ItemClass<R> = Bridge::new(R::ITEM_CLASS);
    let weak = Rc::downgrade(&class);

    let mut def = class
        .common_methods(ClassDefinition::new(R::ITEM_CLASS))
        .instance_method("name", ArgSpec::none(), {
            let weak = weak.clone();
            move |lua, this, _args| {
                let name = item_of(&weak, this)?.metadata().name.clone();
                Ok(Value::String(lua.create_string(&name)?))
            }
        })
        .instance_method("namespace", ArgSpec::none(), {
            let weak = weak.clone();
            move |lua, this, _args| {
                let namespace = item_of(&weak, this)?.metadata().namespace.clone();
                Ok(Value::String(lua.create_string(&namespace)?))
            }
        })
        .instance_method("labels", ArgSpec::none(), {
            let weak = weak.clone();
            move |lua, this, _args| to_lua(lua, &item_of(&weak, this)?.metadata().labels)
        })
        .instance_method("inspect", ArgSpec::none(), {
            let weak = weak.clone();
            move |lua, this, _args| {
                let item = item_of(&weak, this)?;
                let meta = item.metadata();
                Session::current(lua)?.println(format_args!("{}/{}", meta.namespace, meta.name))?;
                Ok(Value::Table(this.clone()))
            }
        })
        .instance_method("to_h", ArgSpec::none(), {
            let weak = weak.clone();
            move |lua, this, _args| to_lua(lua, &item_of(&weak, this)?)
        });

    for attribute in R::attributes() {
        let weak = weak.clone();
        let read = attribute.read;
        def = def.instance_method(attribute.name, ArgSpec::none(), move |lua, this, _args| {
            to_lua(lua, &read(&item_of(&weak, this)?))
        });
    }

    class.bind(def.install(lua)?)?;
    Ok(class)
}

fn item_of<R: Resource>(class: &Weak<Bridge<ItemVars<R>>>, this: &Table) -> Result<R> {
    let vars = Bridge::upgrade(class)?.lookup_vars(this)?;
    let item = vars.borrow().item.clone();
    Ok(item)
}
