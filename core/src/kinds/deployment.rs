use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{Attribute, ObjectMeta, PodSpec, Resource};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Deployment {
    pub metadata: ObjectMeta,
    pub spec: DeploymentSpec,
    pub status: DeploymentStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeploymentSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replicas: Option<i32>,
    pub template: PodTemplateSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PodTemplateSpec {
    pub metadata: ObjectMeta,
    pub spec: PodSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeploymentStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replicas: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ready_replicas: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_replicas: Option<i32>,
}

impl Resource for Deployment {
    const KIND: &'static str = "Deployment";
    const ITEM_CLASS: &'static str = "Deployment";
    const COLLECTION_CLASS: &'static str = "Deployments";

    fn metadata(&self) -> &ObjectMeta {
        &self.metadata
    }

    fn attributes() -> Vec<Attribute<Self>> {
        vec![
            Attribute {
                name: "replicas",
                read: |d| json!(d.spec.replicas),
            },
            Attribute {
                name: "ready_replicas",
                read: |d| json!(d.status.ready_replicas.unwrap_or(0)),
            },
            Attribute {
                name: "images",
                read: |d| json!(d.spec.template.spec.containers.iter().map(|c| c.image.as_str()).collect::<Vec<_>>()),
            },
        ]
    }
}
