use mlua::{Lua, LuaSerdeExt, SerializeOptions, Value};
use serde::Serialize;

use crate::error::Result;

/// Display form of a script value as it appears in verb logs.
pub fn display_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.to_string_lossy().to_string(),
        other => inspect_value(other, 0),
    }
}

fn inspect_value(value: &Value, depth: usize) -> String {
    match value {
        Value::Nil => "nil".to_string(),
        Value::Boolean(b) => b.to_string(),
        Value::Integer(n) => n.to_string(),
        Value::Number(n) => format!("{n:?}"),
        Value::String(s) => format!("{:?}", s.to_string_lossy().to_string()),
        Value::Table(t) if depth < 2 => {
            let mut pairs: Vec<(String, String)> = Vec::new();
            for pair in t.clone().pairs::<Value, Value>() {
                match pair {
                    Ok((k, v)) => pairs.push((display_string(&k), inspect_value(&v, depth + 1))),
                    Err(_) => return "{?}".to_string(),
                }
            }
            pairs.sort();
            let body: Vec<String> = pairs.into_iter().map(|(k, v)| format!("{k} = {v}")).collect();
            format!("{{{}}}", body.join(", "))
        }
        Value::Table(_) => "{...}".to_string(),
        other => other.type_name().to_string(),
    }
}

/// Convert host data into plain Lua values; absent fields become nil.
pub fn to_lua<T: Serialize + ?Sized>(lua: &Lua, data: &T) -> Result<Value> {
    let options = SerializeOptions::new()
        .serialize_none_to_null(false)
        .serialize_unit_to_null(false);
    Ok(lua.to_value_with(data, options)?)
}
