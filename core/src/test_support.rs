use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use serde_json::{Value as Json, json};

use crate::api::{ALL_NAMESPACES, ApiError, ListOptions, ResourceApi};
use crate::command::CommandRegistry;
use crate::host::{Host, HostConfig};
use crate::output::Capture;

/// In-memory API keyed by kind. Records every call it answers.
#[derive(Debug, Default)]
pub struct FakeApi {
    pub objects: BTreeMap<String, Vec<Json>>,
    pub calls: RefCell<Vec<(String, String, ListOptions)>>,
    pub fail_with: Option<ApiError>,
}

impl FakeApi {
    pub fn with(mut self, kind: &str, doc: Json) -> Self {
        self.objects.entry(kind.to_string()).or_default().push(doc);
        self
    }

    pub fn with_pods(self, namespace: &str, names: &[&str]) -> Self {
        names.iter().fold(self, |api, name| api.with("Pod", pod(namespace, name)))
    }
}

impl ResourceApi for FakeApi {
    fn list(&self, kind: &str, namespace: &str, options: &ListOptions) -> Result<Vec<Json>, ApiError> {
        self.calls
            .borrow_mut()
            .push((kind.to_string(), namespace.to_string(), options.clone()));
        if let Some(err) = &self.fail_with {
            return Err(err.clone());
        }
        let docs = self.objects.get(kind).cloned().unwrap_or_default();
        Ok(docs
            .into_iter()
            .filter(|doc| namespace == ALL_NAMESPACES || doc["metadata"]["namespace"] == namespace)
            .collect())
    }
}

pub fn pod(namespace: &str, name: &str) -> Json {
    json!({
        "metadata": { "name": name, "namespace": namespace, "labels": { "app": name } },
        "spec": { "nodeName": "node-1", "containers": [{ "name": "main", "image": format!("registry.local/{name}:1.0") }] },
        "status": { "phase": "Running", "podIP": "10.0.0.1" }
    })
}

/// A host over `api` printing into the returned capture.
pub fn host_with(api: FakeApi, commands: CommandRegistry) -> (Host, Capture, Rc<FakeApi>) {
    let api = Rc::new(api);
    let capture = Capture::new();
    let config = HostConfig::new(api.clone()).namespace("ns").output(capture.clone());
    let host = Host::initialize(config, commands, &[]).unwrap();
    (host, capture, api)
}
