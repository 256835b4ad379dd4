use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{Attribute, ObjectMeta, Resource};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Service {
    pub metadata: ObjectMeta,
    pub spec: ServiceSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServiceSpec {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub service_type: Option<String>,
    #[serde(rename = "clusterIP", skip_serializing_if = "Option::is_none")]
    pub cluster_ip: Option<String>,
    pub ports: Vec<ServicePort>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServicePort {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub port: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    /// Either a port number or a named container port.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_port: Option<serde_json::Value>,
}

impl Resource for Service {
    const KIND: &'static str = "Service";
    const ITEM_CLASS: &'static str = "Service";
    const COLLECTION_CLASS: &'static str = "Services";

    fn metadata(&self) -> &ObjectMeta {
        &self.metadata
    }

    fn attributes() -> Vec<Attribute<Self>> {
        vec![
            Attribute {
                name: "type",
                read: |svc| json!(svc.spec.service_type),
            },
            Attribute {
                name: "cluster_ip",
                read: |svc| json!(svc.spec.cluster_ip),
            },
            Attribute {
                name: "ports",
                read: |svc| json!(svc.spec.ports.iter().map(|p| p.port).collect::<Vec<_>>()),
            },
        ]
    }
}
