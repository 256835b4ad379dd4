//! A read-only cluster backed by manifest files.
//!
//! Handy for dry runs and tests: every object found in the given YAML or JSON
//! files is listable through [`ResourceApi`] as if a live API served it.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use serde_json::Value as Json;
use tracing::debug;

use rk_core::{ALL_NAMESPACES, ApiError, ListOptions, ResourceApi};

#[derive(Debug, Clone, Default)]
pub struct ManifestCluster {
    objects: Vec<Json>,
}

impl ManifestCluster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every file in `paths`, in order.
    pub fn load<P: AsRef<Path>>(paths: &[P]) -> Result<Self> {
        let mut cluster = Self::new();
        for path in paths {
            cluster.load_file(path.as_ref())?;
        }
        Ok(cluster)
    }

    pub fn load_file(&mut self, path: &Path) -> Result<()> {
        let source = fs::read_to_string(path).with_context(|| format!("reading manifest {}", path.display()))?;
        let before = self.objects.len();
        self.add_documents(&source)
            .with_context(|| format!("parsing manifest {}", path.display()))?;
        debug!(path = %path.display(), objects = self.objects.len() - before, "loaded manifest");
        Ok(())
    }

    pub fn from_yaml_str(source: &str) -> Result<Self> {
        let mut cluster = Self::new();
        cluster.add_documents(source)?;
        Ok(cluster)
    }

    /// Add the objects of a (multi-document) YAML or JSON text.
    pub fn add_documents(&mut self, source: &str) -> Result<()> {
        for document in serde_yaml::Deserializer::from_str(source) {
            let doc = Json::deserialize(document)?;
            if doc.is_null() {
                continue;
            }
            self.add_object(doc)?;
        }
        Ok(())
    }

    fn add_object(&mut self, doc: Json) -> Result<()> {
        let kind = doc
            .get("kind")
            .and_then(Json::as_str)
            .ok_or_else(|| anyhow!("document has no `kind`"))?
            .to_string();
        if kind == "List" || kind.ends_with("List") {
            // Items of a typed list such as `PodList` may omit their own kind.
            let item_kind = kind.strip_suffix("List").unwrap_or_default().to_string();
            let items = match doc.get("items") {
                Some(Json::Array(items)) => items.clone(),
                Some(_) => return Err(anyhow!("`items` of a {kind} must be a sequence")),
                None => Vec::new(),
            };
            for mut item in items {
                if item.get("kind").is_none() && !item_kind.is_empty() {
                    if let Json::Object(map) = &mut item {
                        map.insert("kind".to_string(), Json::String(item_kind.clone()));
                    }
                }
                self.add_object(item)?;
            }
            return Ok(());
        }
        self.objects.push(doc);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

fn namespace_of(doc: &Json) -> &str {
    doc.pointer("/metadata/namespace").and_then(Json::as_str).unwrap_or("default")
}

fn labels_of(doc: &Json) -> BTreeMap<&str, &str> {
    doc.pointer("/metadata/labels")
        .and_then(Json::as_object)
        .map(|labels| {
            labels
                .iter()
                .filter_map(|(k, v)| v.as_str().map(|v| (k.as_str(), v)))
                .collect()
        })
        .unwrap_or_default()
}

impl ResourceApi for ManifestCluster {
    fn list(&self, kind: &str, namespace: &str, options: &ListOptions) -> Result<Vec<Json>, ApiError> {
        let selector = match &options.label_selector {
            Some(raw) => raw.parse::<LabelSelector>()?,
            None => LabelSelector::default(),
        };
        let found: Vec<Json> = self
            .objects
            .iter()
            .filter(|doc| doc.get("kind").and_then(Json::as_str) == Some(kind))
            .filter(|doc| namespace == ALL_NAMESPACES || namespace_of(doc) == namespace)
            .filter(|doc| selector.matches(&labels_of(doc)))
            .cloned()
            .collect();
        debug!(kind, namespace, count = found.len(), "listed");
        Ok(found)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requirement {
    Equals(String, String),
    NotEquals(String, String),
    Exists(String),
    NotExists(String),
}

impl Requirement {
    fn matches(&self, labels: &BTreeMap<&str, &str>) -> bool {
        match self {
            Requirement::Equals(k, v) => labels.get(k.as_str()) == Some(&v.as_str()),
            Requirement::NotEquals(k, v) => labels.get(k.as_str()) != Some(&v.as_str()),
            Requirement::Exists(k) => labels.contains_key(k.as_str()),
            Requirement::NotExists(k) => !labels.contains_key(k.as_str()),
        }
    }
}

/// Equality-based label selector: `k=v`, `k==v`, `k!=v`, `k` and `!k`,
/// joined by commas. All requirements must hold.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelSelector {
    requirements: Vec<Requirement>,
}

impl LabelSelector {
    pub fn requirements(&self) -> &[Requirement] {
        &self.requirements
    }

    pub fn matches(&self, labels: &BTreeMap<&str, &str>) -> bool {
        self.requirements.iter().all(|r| r.matches(labels))
    }
}

fn label_key(raw: &str, selector: &str) -> Result<String, ApiError> {
    let key = raw.trim();
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '/'));
    if valid {
        Ok(key.to_string())
    } else {
        Err(ApiError::BadRequest(format!("invalid label key `{key}` in selector `{selector}`")))
    }
}

impl FromStr for LabelSelector {
    type Err = ApiError;

    fn from_str(selector: &str) -> Result<Self, ApiError> {
        if selector.trim().is_empty() {
            return Ok(Self::default());
        }
        let mut requirements = Vec::new();
        for term in selector.split(',') {
            let term = term.trim();
            let requirement = if let Some((k, v)) = term.split_once("!=") {
                Requirement::NotEquals(label_key(k, selector)?, v.trim().to_string())
            } else if let Some((k, v)) = term.split_once("==") {
                Requirement::Equals(label_key(k, selector)?, v.trim().to_string())
            } else if let Some((k, v)) = term.split_once('=') {
                Requirement::Equals(label_key(k, selector)?, v.trim().to_string())
            } else if let Some(k) = term.strip_prefix('!') {
                Requirement::NotExists(label_key(k, selector)?)
            } else {
                Requirement::Exists(label_key(term, selector)?)
            };
            requirements.push(requirement);
        }
        Ok(Self { requirements })
    }
}
