use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{Attribute, ObjectMeta, Resource};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Container {
    pub name: String,
    pub image: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Pod {
    pub metadata: ObjectMeta,
    pub spec: PodSpec,
    pub status: PodStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PodSpec {
    pub containers: Vec<Container>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PodStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
    #[serde(rename = "podIP", skip_serializing_if = "Option::is_none")]
    pub pod_ip: Option<String>,
}

impl Resource for Pod {
    const KIND: &'static str = "Pod";
    const ITEM_CLASS: &'static str = "Pod";
    const COLLECTION_CLASS: &'static str = "Pods";

    fn metadata(&self) -> &ObjectMeta {
        &self.metadata
    }

    fn attributes() -> Vec<Attribute<Self>> {
        vec![
            Attribute {
                name: "phase",
                read: |pod| json!(pod.status.phase),
            },
            Attribute {
                name: "node",
                read: |pod| json!(pod.spec.node_name),
            },
            Attribute {
                name: "ip",
                read: |pod| json!(pod.status.pod_ip),
            },
            Attribute {
                name: "images",
                read: |pod| json!(pod.spec.containers.iter().map(|c| c.image.as_str()).collect::<Vec<_>>()),
            },
        ]
    }
}
