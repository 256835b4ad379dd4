use std::fs;
use std::io;

use mlua::{Lua, Value};

use rk_core::{ArgSpec, Args, CommandRegistry, Result, Session};

pub fn register(commands: &mut CommandRegistry) -> Result<()> {
    commands.register_function("getenv", ArgSpec::req(1), getenv)?;
    commands.register_function("import", ArgSpec::req(1), import)?;
    Ok(())
}

/// Environment lookup; unset or non-unicode variables read as "".
fn getenv(lua: &Lua, _session: &Session, args: Args) -> Result<Value> {
    let value = std::env::var(args.string(0)?).unwrap_or_default();
    Ok(Value::String(lua.create_string(&value)?))
}

/// Run another script file in the current interpreter and return its value.
fn import(lua: &Lua, _session: &Session, args: Args) -> Result<Value> {
    let path = args.string(0)?;
    let source = fs::read_to_string(&path).map_err(|e| io::Error::new(e.kind(), format!("{path}: {e}")))?;
    Ok(lua.load(source).set_name(path).eval::<Value>()?)
}
