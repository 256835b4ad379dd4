//! Logged top-level commands.

use mlua::{Lua, Value};

use rk_core::api::{self, ALL_NAMESPACES, ListOptions};
use rk_core::kinds::{ObjectMeta, Pod, PodSpec, Resource};
use rk_core::marshal;
use rk_core::template::{self, CollectionClass, Query};
use rk_core::{ArgSpec, Args, CommandRegistry, Result, Session};

pub fn register(commands: &mut CommandRegistry) -> Result<()> {
    commands.register_verb("pods", ArgSpec::opt(2), |lua, session, args| {
        fetch_new(lua, &session.classes().pods, &args)
    })?;
    commands.register_verb("services", ArgSpec::opt(2), |lua, session, args| {
        fetch_new(lua, &session.classes().services, &args)
    })?;
    commands.register_verb("deployments", ArgSpec::opt(2), |lua, session, args| {
        fetch_new(lua, &session.classes().deployments, &args)
    })?;
    commands.register_verb("count_pods", ArgSpec::none(), count_pods)?;
    commands.register_verb("new_app", ArgSpec::req(1), new_app)?;
    Ok(())
}

/// A new collection, fetched with the verb's own arguments.
fn fetch_new<R: Resource>(lua: &Lua, class: &CollectionClass<R>, args: &Args) -> Result<Value> {
    let query = Query::from_args(args)?;
    let this = class.create(lua)?.this;
    template::fetch(lua, class, &this, query)?;
    Ok(Value::Table(this))
}

fn count_pods(_lua: &Lua, session: &Session, _args: Args) -> Result<Value> {
    let pods: Vec<Pod> = api::list_as(session.api(), Pod::KIND, ALL_NAMESPACES, &ListOptions::default())?;
    session.println(format_args!("There are {} pods in the cluster", pods.len()))?;
    Ok(Value::Integer(pods.len() as i64))
}

/// Build an unsaved single-container pod in the default namespace.
fn new_app(lua: &Lua, session: &Session, args: Args) -> Result<Value> {
    let container = marshal::container_from_table(&args.table(0)?, args.name())?;
    let pod = Pod {
        metadata: ObjectMeta {
            name: container.name.clone(),
            namespace: session.default_namespace().to_string(),
            ..ObjectMeta::default()
        },
        spec: PodSpec {
            containers: vec![container],
            ..PodSpec::default()
        },
        ..Pod::default()
    };
    template::wrap_item(lua, &session.classes().pod, pod)
}
