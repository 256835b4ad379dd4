//! Remote object kinds projected into script space.

mod deployment;
mod pod;
mod service;

use std::collections::BTreeMap;
use std::fmt;

use mlua::Lua;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::template::{self, CollectionClass, ItemClass};

pub use deployment::{Deployment, DeploymentSpec, DeploymentStatus, PodTemplateSpec};
pub use pod::{Container, Pod, PodSpec, PodStatus};
pub use service::{Service, ServicePort, ServiceSpec};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ObjectMeta {
    pub name: String,
    pub namespace: String,
    pub labels: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creation_timestamp: Option<String>,
}

/// A kind-specific read accessor exposed as a zero-argument item method.
pub struct Attribute<R> {
    pub name: &'static str,
    pub read: fn(&R) -> serde_json::Value,
}

/// A listable remote object.
pub trait Resource: Clone + Default + Serialize + DeserializeOwned + 'static {
    /// Kind name the API lists by.
    const KIND: &'static str;
    /// Script class of a single item.
    const ITEM_CLASS: &'static str;
    /// Script class of a fetched list.
    const COLLECTION_CLASS: &'static str;

    fn metadata(&self) -> &ObjectMeta;

    fn attributes() -> Vec<Attribute<Self>> {
        Vec::new()
    }
}

/// Every class the host defines at setup, one collection and one item class per kind.
pub struct Classes {
    pub pods: CollectionClass<Pod>,
    pub pod: ItemClass<Pod>,
    pub services: CollectionClass<Service>,
    pub service: ItemClass<Service>,
    pub deployments: CollectionClass<Deployment>,
    pub deployment: ItemClass<Deployment>,
}

impl fmt::Debug for Classes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.object_counts()).finish()
    }
}

impl Classes {
    pub fn define(lua: &Lua) -> Result<Self> {
        let pod = template::define_item_class::<Pod>(lua)?;
        let pods = template::define_collection_class::<Pod>(lua, &pod)?;
        let service = template::define_item_class::<Service>(lua)?;
        let services = template::define_collection_class::<Service>(lua, &service)?;
        let deployment = template::define_item_class::<Deployment>(lua)?;
        let deployments = template::define_collection_class::<Deployment>(lua, &deployment)?;
        Ok(Self {
            pods,
            pod,
            services,
            service,
            deployments,
            deployment,
        })
    }

    pub fn object_counts(&self) -> Vec<(&'static str, usize)> {
        vec![
            (self.pods.name(), self.pods.object_count()),
            (self.pod.name(), self.pod.object_count()),
            (self.services.name(), self.services.object_count()),
            (self.service.name(), self.service.object_count()),
            (self.deployments.name(), self.deployments.object_count()),
            (self.deployment.name(), self.deployment.object_count()),
        ]
    }

    pub(crate) fn clear(&self) {
        self.pods.clear();
        self.pod.clear();
        self.services.clear();
        self.service.clear();
        self.deployments.clear();
        self.deployment.clear();
    }
}
