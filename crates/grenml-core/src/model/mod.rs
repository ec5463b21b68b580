//! GRENML entity model: Institution, Node, Link and Topology.
//!
//! Every entity carries the same header ([`Meta`]): identifier, name,
//! optional short name, optional version and a [`PropertyBag`]. Identity is
//! computed once, when the entity is built, and never changes afterwards.
//! Cross-entity references (owners, link endpoints, primary owner) are plain
//! ID strings resolved against the owning [`Topology`] on demand.

use crate::identity::{generate_id, IdGeneration};
use crate::properties::PropertyBag;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Builder methods shared by every entity builder holding a `meta` field.
macro_rules! meta_builder_methods {
    () => {
        /// Explicit identifier. An empty value falls back to the determinate ID.
        pub fn id(mut self, id: impl ToString) -> Self {
            self.meta.id = Some(id.to_string());
            self
        }

        pub fn id_generation(mut self, mode: $crate::identity::IdGeneration) -> Self {
            self.meta.id_generation = mode;
            self
        }

        pub fn short_name(mut self, short_name: impl Into<String>) -> Self {
            self.meta.short_name = Some(short_name.into());
            self
        }

        pub fn version(mut self, version: impl Into<String>) -> Self {
            self.meta.version = Some(version.into());
            self
        }

        pub fn property(mut self, key: &str, value: impl Into<String>) -> Self {
            self.meta.properties.add(key, value);
            self
        }
    };
}

/// ID-based equality, hashing and reference conversions.
macro_rules! impl_identity {
    ($ty:ty) => {
        impl PartialEq for $ty {
            fn eq(&self, other: &Self) -> bool {
                self.meta.id == other.meta.id
            }
        }

        impl Eq for $ty {}

        impl std::hash::Hash for $ty {
            fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
                std::hash::Hash::hash(&self.meta.id, state);
            }
        }

        impl From<&$ty> for String {
            fn from(entity: &$ty) -> Self {
                entity.meta.id.clone()
            }
        }

        impl From<&$ty> for $crate::query::QueryValue {
            fn from(entity: &$ty) -> Self {
                $crate::query::QueryValue::Str(entity.meta.id.clone())
            }
        }
    };
}

pub mod institution;
pub mod lifetime;
pub mod link;
pub mod location;
pub mod node;
pub mod topology;
pub(crate) mod update;

pub use institution::{Institution, InstitutionBuilder, DEFAULT_INSTITUTION_TYPE};
pub use lifetime::Lifetime;
pub use link::{Link, LinkBuilder};
pub use location::Location;
pub use node::{Node, NodeBuilder};
pub use topology::{Topology, TopologyBuilder};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Institution,
    Node,
    Link,
    Topology,
}

impl EntityKind {
    /// Kind label mixed into determinate identifiers.
    pub fn discriminator(&self) -> &'static str {
        match self {
            EntityKind::Institution => "Institution",
            EntityKind::Node => "Node",
            EntityKind::Link => "Link",
            EntityKind::Topology => "Topology",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.discriminator())
    }
}

/// Header shared by all entities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meta {
    pub(crate) id: String,
    pub name: String,
    pub short_name: Option<String>,
    pub version: Option<String>,
    pub properties: PropertyBag,
}

impl Meta {
    pub fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct MetaBuilder {
    pub(crate) id: Option<String>,
    pub(crate) id_generation: IdGeneration,
    pub(crate) name: String,
    pub(crate) short_name: Option<String>,
    pub(crate) version: Option<String>,
    pub(crate) properties: PropertyBag,
}

impl MetaBuilder {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub(crate) fn finish(self, kind: EntityKind) -> Meta {
        let id = generate_id(
            kind.discriminator(),
            &self.name,
            self.short_name.as_deref(),
            self.id.as_deref(),
            self.id_generation,
        );
        Meta {
            id,
            name: self.name,
            short_name: self.short_name,
            version: self.version,
            properties: self.properties,
        }
    }
}

/// Common accessors over the entity header.
pub trait GrenmlObject {
    const KIND: EntityKind;

    fn meta(&self) -> &Meta;
    fn meta_mut(&mut self) -> &mut Meta;

    fn id(&self) -> &str {
        &self.meta().id
    }

    fn name(&self) -> &str {
        &self.meta().name
    }

    fn short_name(&self) -> Option<&str> {
        self.meta().short_name.as_deref()
    }

    fn version(&self) -> Option<&str> {
        self.meta().version.as_deref()
    }

    fn properties(&self) -> &PropertyBag {
        &self.meta().properties
    }

    fn properties_mut(&mut self) -> &mut PropertyBag {
        &mut self.meta_mut().properties
    }

    fn add_property(&mut self, key: &str, value: impl Into<String>)
    where
        Self: Sized,
    {
        self.meta_mut().properties.add(key, value);
    }
}
