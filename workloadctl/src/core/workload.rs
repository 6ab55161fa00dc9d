use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DEFAULT_PULL_POLICY: &str = "IMAGE_PULL_POLICY_DEFAULT";
pub const DEFAULT_FLAVOR: &str = "CONTAINER_FLAVOR_TYPE_TINY";
pub const PROTOCOL_TCP: &str = "PROTOCOL_TCP";

/// `WorkloadDescriptor` holds the desired state of a single workload.
///
/// It is built once from the configuration and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkloadDescriptor {
    pub name: String,
    /// Container image reference, e.g. `registry/app:v1`
    pub image: String,
    /// Name of the virtual site the workload is deployed on
    pub site_name: String,
    pub site_namespace: String,
    pub port: u16,
    /// Name of the container registry object holding pull credentials
    pub registry: String,
}

/// `Workload` is the body sent on create and replace requests.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Workload {
    pub metadata: Metadata,
    pub spec: Spec,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Metadata {
    pub name: String,
    pub namespace: String,
    pub labels: BTreeMap<String, String>,
    pub annotations: BTreeMap<String, String>,
    pub disable: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Spec {
    pub service: Service,
}

/// `Service` is the only workload flavour we manage: a stateless service.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Service {
    pub num_replicas: u32,
    pub containers: Vec<Container>,
    pub volumes: Vec<serde_json::Value>,
    pub deploy_options: DeployOptions,
    pub advertise_options: AdvertiseOptions,
    pub family: Family,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Container {
    pub name: String,
    pub image: Image,
    pub init_container: bool,
    pub flavor: String,
    pub command: Vec<String>,
    pub args: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Image {
    pub name: String,
    pub container_registry: ObjectRef,
    pub pull_policy: String,
}

/// Reference to another configuration object of the control plane.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ObjectRef {
    pub namespace: String,
    pub name: String,
    pub kind: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DeployOptions {
    pub deploy_ce_virtual_sites: VirtualSites,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct VirtualSites {
    pub virtual_site: Vec<ObjectRef>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AdvertiseOptions {
    pub advertise_in_cluster: AdvertiseInCluster,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AdvertiseInCluster {
    pub port: AdvertisePort,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AdvertisePort {
    pub info: PortInfo,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PortInfo {
    pub port: u16,
    pub protocol: String,
    /// Target port is the same as the advertised one.
    pub same_as_port: Empty,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Family {
    pub v4: Empty,
}

/// Marker object, serialized as `{}`.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Empty {}

/// Body of a delete request.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct DeleteRequest {
    pub name: String,
    pub namespace: String,
}

impl ObjectRef {
    fn new(namespace: &str, name: &str, kind: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            name: name.to_string(),
            kind: kind.to_string(),
        }
    }
}

impl Workload {
    /// Build the payload of `descriptor` living in `namespace`.
    pub fn build(namespace: &str, descriptor: &WorkloadDescriptor) -> Self {
        let container = Container {
            name: descriptor.name.clone(),
            image: Image {
                name: descriptor.image.clone(),
                container_registry: ObjectRef::new(
                    namespace,
                    &descriptor.registry,
                    "container_registry",
                ),
                pull_policy: DEFAULT_PULL_POLICY.to_string(),
            },
            init_container: false,
            flavor: DEFAULT_FLAVOR.to_string(),
            command: vec![],
            args: vec![],
        };

        Self {
            metadata: Metadata {
                name: descriptor.name.clone(),
                namespace: namespace.to_string(),
                labels: BTreeMap::new(),
                annotations: BTreeMap::new(),
                disable: false,
            },
            spec: Spec {
                service: Service {
                    num_replicas: 1,
                    containers: vec![container],
                    volumes: vec![],
                    deploy_options: DeployOptions {
                        deploy_ce_virtual_sites: VirtualSites {
                            virtual_site: vec![ObjectRef::new(
                                &descriptor.site_namespace,
                                &descriptor.site_name,
                                "virtual_site",
                            )],
                        },
                    },
                    advertise_options: AdvertiseOptions {
                        advertise_in_cluster: AdvertiseInCluster {
                            port: AdvertisePort {
                                info: PortInfo {
                                    port: descriptor.port,
                                    protocol: PROTOCOL_TCP.to_string(),
                                    same_as_port: Empty {},
                                },
                            },
                        },
                    },
                    family: Family { v4: Empty {} },
                },
            },
        }
    }
}

impl DeleteRequest {
    pub fn new(namespace: &str, name: &str) -> Self {
        Self {
            name: name.to_string(),
            namespace: namespace.to_string(),
        }
    }
}
