use super::{EntityKind, GrenmlObject, Institution, Link, Meta, MetaBuilder, Node};
use crate::query::{FieldTable, FieldValue, Matchable};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One network graph: three ID-keyed collections and a primary owner.
///
/// The topology is the only long-lived owner of its entities. Collection
/// operations live in [`crate::store`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Topology {
    pub meta: Meta,
    pub(crate) primary_owner: Option<String>,
    pub(crate) institutions: IndexMap<String, Institution>,
    pub(crate) nodes: IndexMap<String, Node>,
    pub(crate) links: IndexMap<String, Link>,
}

#[derive(Debug, Clone)]
pub struct TopologyBuilder {
    meta: MetaBuilder,
}

impl TopologyBuilder {
    meta_builder_methods!();

    pub fn build(self) -> Topology {
        Topology::from_meta(self.meta.finish(EntityKind::Topology))
    }
}

impl Topology {
    pub fn builder(name: impl Into<String>) -> TopologyBuilder {
        TopologyBuilder {
            meta: MetaBuilder::new(name),
        }
    }

    pub fn new(name: impl Into<String>) -> Self {
        Self::builder(name).build()
    }

    fn from_meta(meta: Meta) -> Self {
        Self {
            meta,
            primary_owner: None,
            institutions: IndexMap::new(),
            nodes: IndexMap::new(),
            links: IndexMap::new(),
        }
    }

    pub fn primary_owner(&self) -> Option<&str> {
        self.primary_owner.as_deref()
    }

    /// Unchecked. Reference integrity is a validation concern.
    pub fn set_primary_owner(&mut self, owner: Option<String>) {
        self.primary_owner = owner;
    }

    pub fn institutions(&self) -> impl Iterator<Item = &Institution> {
        self.institutions.values()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn links(&self) -> impl Iterator<Item = &Link> {
        self.links.values()
    }

    pub fn has_institution(&self, id: &str) -> bool {
        self.institutions.contains_key(id)
    }

    pub fn has_node(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn has_link(&self, id: &str) -> bool {
        self.links.contains_key(id)
    }

    pub fn institution_count(&self) -> usize {
        self.institutions.len()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }
}

impl PartialEq for Topology {
    fn eq(&self, other: &Self) -> bool {
        self.meta.id == other.meta.id
    }
}

impl Eq for Topology {}

impl GrenmlObject for Topology {
    const KIND: EntityKind = EntityKind::Topology;

    fn meta(&self) -> &Meta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut Meta {
        &mut self.meta
    }
}

const TOPOLOGY_FIELDS: FieldTable<Topology> = &[
    ("id", |t| FieldValue::Str(&t.meta.id)),
    ("name", |t| FieldValue::Str(&t.meta.name)),
    ("short_name", |t| FieldValue::opt_str(&t.meta.short_name)),
    ("version", |t| FieldValue::opt_str(&t.meta.version)),
    ("primary_owner", |t| FieldValue::opt_str(&t.primary_owner)),
];

impl Matchable for Topology {
    fn field_table() -> FieldTable<Self> {
        TOPOLOGY_FIELDS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::IdGeneration;
    use crate::query::Query;

    #[test]
    fn test_topology_matching() {
        let mut topology = Topology::builder("GREN Map").version("2021-01-01").build();
        assert!(topology.matches(&Query::new().contains("name", "Map")));
        assert!(topology.matches(&Query::new().eq("primary_owner", None::<String>)));
        topology.set_primary_owner(Some("OWNER".into()));
        assert!(topology.matches(&Query::new().eq("primary_owner", "OWNER")));
        assert!(!topology.matches(&Query::new().eq("nodes", "x")));
    }

    #[test]
    fn test_random_topologies_differ() {
        let a = Topology::builder("T").id_generation(IdGeneration::Random).build();
        let b = Topology::builder("T").id_generation(IdGeneration::Random).build();
        assert_ne!(a, b);
        assert_eq!(Topology::new("T"), Topology::new("T"));
    }
}
