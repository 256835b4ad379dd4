//! `rk.toml`: defaults for namespace, cluster snapshots and omitted commands.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::debug;

use rk_core::DEFAULT_NAMESPACE;

pub const DEFAULT_CONFIG_FILE: &str = "rk.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub namespace: Option<String>,
    pub manifests: Vec<PathBuf>,
    pub omit: Vec<String>,
}

impl FileConfig {
    pub fn from_toml_str(source: &str) -> Result<Self> {
        Ok(toml::from_str(source)?)
    }

    /// Read a config file. Relative manifest paths are taken from the file's directory.
    pub fn load(path: &Path) -> Result<Self> {
        let source = fs::read_to_string(path).with_context(|| format!("reading config {}", path.display()))?;
        let mut config = Self::from_toml_str(&source).with_context(|| format!("parsing config {}", path.display()))?;
        if let Some(dir) = path.parent() {
            for manifest in &mut config.manifests {
                if manifest.is_relative() {
                    *manifest = dir.join(&*manifest);
                }
            }
        }
        Ok(config)
    }

    /// The explicit file if given, else `./rk.toml` when it exists.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load(path),
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_FILE);
                if fallback.is_file() {
                    debug!(path = DEFAULT_CONFIG_FILE, "using config from working directory");
                    Self::load(fallback)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }
}

/// Flag values layered over the file.
#[derive(Debug, Clone, Copy, Default)]
pub struct Overrides<'a> {
    pub namespace: Option<&'a str>,
    pub manifests: &'a [PathBuf],
    pub omit: &'a [String],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub namespace: String,
    pub manifests: Vec<PathBuf>,
    pub omit: Vec<String>,
}

impl Settings {
    /// Flags replace the file's namespace and manifests; omit lists are combined.
    pub fn merge(file: FileConfig, flags: Overrides<'_>) -> Self {
        let namespace = flags
            .namespace
            .map(str::to_string)
            .or(file.namespace)
            .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string());
        let manifests = if flags.manifests.is_empty() {
            file.manifests
        } else {
            flags.manifests.to_vec()
        };
        let mut omit = file.omit;
        for name in flags.omit {
            if !omit.contains(name) {
                omit.push(name.clone());
            }
        }
        Self {
            namespace,
            manifests,
            omit,
        }
    }
}
