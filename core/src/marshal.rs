//! Turning untyped script hashes into typed descriptors.

use std::collections::BTreeMap;

use mlua::{Table, Value};

use crate::error::{BindError, Result};
use crate::kinds::Container;
use crate::value::display_string;

/// Keys accepted by `new_app`.
pub const CONTAINER_KEYS: &[&str] = &["image", "name"];

/// A validated hash of string keys to string values.
///
/// Construction checks every pair before anything is returned, so a caller
/// never sees a partially applied hash.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StringHash {
    entries: BTreeMap<String, String>,
}

impl StringHash {
    /// Read `table`, requiring string values and keys drawn from `allowed`.
    pub fn from_table(table: &Table, call_site: &str, allowed: &[&str]) -> Result<Self> {
        let mut entries = BTreeMap::new();
        for pair in table.clone().pairs::<Value, Value>() {
            let (key, value) = pair?;
            let key = match key {
                Value::String(s) => s.to_string_lossy().to_string(),
                other => {
                    return Err(BindError::validation(format!(
                        "{call_site}: key {} is not a string",
                        display_string(&other)
                    )));
                }
            };
            let value = match value {
                Value::String(s) => s.to_string_lossy().to_string(),
                _ => return Err(BindError::type_error(format!("value for key `{key}` is not string"))),
            };
            if !allowed.contains(&key.as_str()) {
                return Err(BindError::validation(format!(
                    "{call_site} only accepts {} as keys, got `{key}`",
                    quote_keys(allowed)
                )));
            }
            entries.insert(key, value);
        }
        Ok(Self { entries })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn quote_keys(keys: &[&str]) -> String {
    keys.iter().map(|k| format!("`{k}`")).collect::<Vec<_>>().join(", ")
}

/// Build a container descriptor; `name` defaults to the image's short name.
pub fn container_from_table(table: &Table, call_site: &str) -> Result<Container> {
    let hash = StringHash::from_table(table, call_site, CONTAINER_KEYS)?;
    container_from_hash(&hash, call_site)
}

pub fn container_from_hash(hash: &StringHash, call_site: &str) -> Result<Container> {
    let image = hash
        .get("image")
        .ok_or_else(|| BindError::validation(format!("{call_site} requires `image`")))?;
    let name = match hash.get("name") {
        Some(name) => name.to_string(),
        None => image_name(image).to_string(),
    };
    Ok(Container {
        name,
        image: image.to_string(),
    })
}

/// Last path segment of an image reference without tag or digest:
/// `registry:5000/team/app:v1` gives `app`.
pub fn image_name(image: &str) -> &str {
    let last = image.rsplit('/').next().unwrap_or(image);
    let last = last.split('@').next().unwrap_or(last);
    last.split(':').next().unwrap_or(last)
}
