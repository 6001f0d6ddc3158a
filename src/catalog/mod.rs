//! The closed catalog of component types that can be placed on a canvas.
//!
//! Every type carries a fixed, ordered checklist of required attributes. The checklist
//! is declared here once and never inferred from stored node data.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of value an attribute expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeKind {
    Text,
    Number,
    Boolean,
}

/// Visual grouping of a component type. Mostly cosmetic; `Compute` is also used to
/// pick a nominal migration destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComponentCategory {
    Compute,
    Database,
    Networking,
}

/// One entry of a component type's checklist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequiredAttribute {
    pub name: &'static str,
    pub help: &'static str,
    pub kind: AttributeKind,
}

/// Static description of a component type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComponentDescriptor {
    pub component_type: ComponentType,
    /// Stable lookup key, also used as the serialized form.
    pub key: &'static str,
    /// Display name shown in the toolbox.
    pub name: &'static str,
    /// Short prefix for generated node names, e.g. `Server-3`.
    pub short_name: &'static str,
    pub category: ComponentCategory,
    pub required_attributes: &'static [RequiredAttribute],
}

impl ComponentDescriptor {
    pub fn is_compute(&self) -> bool {
        self.category == ComponentCategory::Compute
    }
}

/// Declares the `ComponentType` enum together with its descriptor table and key lookup.
macro_rules! define_component_catalog {
    ( $(
        $variant:ident => ($key:literal, $name:literal, $short:literal, $category:ident, [
            $( ($attr:literal, $kind:ident, $help:literal) ),* $(,)?
        ])
    ),* $(,)? ) => {
        /// A placeable component type.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum ComponentType {
            $( #[serde(rename = $key)] $variant, )*
        }

        static CATALOG: &[ComponentDescriptor] = &[
            $(
                ComponentDescriptor {
                    component_type: ComponentType::$variant,
                    key: $key,
                    name: $name,
                    short_name: $short,
                    category: ComponentCategory::$category,
                    required_attributes: &[
                        $( RequiredAttribute { name: $attr, help: $help, kind: AttributeKind::$kind }, )*
                    ],
                },
            )*
        ];

        impl ComponentType {
            /// All catalog types in toolbox order.
            pub const ALL: &'static [ComponentType] = &[ $( ComponentType::$variant, )* ];

            /// Looks a type up by its stable key.
            pub fn from_key(key: &str) -> Option<Self> {
                match key {
                    $( $key => Some(ComponentType::$variant), )*
                    _ => None,
                }
            }
        }
    };
}

define_component_catalog! {
    OnPremServer => ("onPremServer", "Server (VM)", "Server", Compute, [
        ("hostname", Text, "Fully qualified host name of the machine"),
        ("operatingSystem", Text, "Operating system and version, e.g. Ubuntu 22.04"),
        ("cpuCores", Number, "Number of vCPUs currently allocated"),
        ("memoryGb", Number, "Memory currently allocated, in GiB"),
        ("isProduction", Boolean, "Does this machine serve production traffic?"),
    ]),
    OnPremDatabase => ("onPremDatabase", "Database (VM)", "Database", Database, [
        ("engine", Text, "Database engine, e.g. PostgreSQL, MySQL, SQL Server"),
        ("engineVersion", Text, "Engine version currently running"),
        ("storageGb", Number, "Allocated storage, in GiB"),
        ("port", Number, "Listening port"),
        ("highAvailability", Boolean, "Is the database replicated for failover?"),
    ]),
    LoadBalancer => ("loadBalancer", "Load Balancer", "LoadBalancer", Networking, [
        ("listenerPort", Number, "Port the balancer listens on"),
        ("protocol", Text, "Listener protocol, e.g. HTTP, HTTPS, TCP"),
        ("stickySessions", Boolean, "Are sessions pinned to a backend?"),
    ]),
    NetworkGateway => ("networkGateway", "Network Gateway", "Gateway", Networking, []),
    CloudCompute => ("cloudCompute", "Cloud Compute Instance", "Compute", Compute, [
        ("instanceType", Text, "Instance size, e.g. m5.large"),
        ("imageId", Text, "Machine image the instance boots from"),
        ("vcpus", Number, "Number of vCPUs"),
    ]),
    ManagedDatabase => ("managedDatabase", "Managed Database", "ManagedDb", Database, [
        ("engine", Text, "Managed engine, e.g. aurora-postgresql"),
        ("instanceClass", Text, "Instance class, e.g. db.r6g.large"),
        ("allocatedStorageGb", Number, "Allocated storage, in GiB"),
        ("multiAz", Boolean, "Deploy a standby in a second availability zone?"),
    ]),
    LoadBalancerTarget => ("loadBalancerTarget", "Load Balancer Target Group", "TargetGroup", Networking, [
        ("targetGroupName", Text, "Name of the target group"),
        ("healthCheckPath", Text, "HTTP path used for health checks"),
        ("targetPort", Number, "Port traffic is forwarded to"),
    ]),
    VirtualNetwork => ("virtualNetwork", "Virtual Network", "Network", Networking, [
        ("cidrBlock", Text, "Address range, e.g. 10.0.0.0/16"),
        ("subnetCount", Number, "Number of subnets to create"),
    ]),
}

impl ComponentType {
    pub fn descriptor(self) -> &'static ComponentDescriptor {
        // CATALOG is declared in the same order as the enum variants.
        &CATALOG[self as usize]
    }

    pub fn key(self) -> &'static str {
        self.descriptor().key
    }

    pub fn required_attributes(self) -> &'static [RequiredAttribute] {
        self.descriptor().required_attributes
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.descriptor().name)
    }
}
