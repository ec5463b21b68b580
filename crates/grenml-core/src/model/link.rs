use super::lifetime::Lifetime;
use super::update::{meta_field, optional_timestamp, string_set};
use super::{EntityKind, GrenmlObject, Meta, MetaBuilder};
use crate::error::Result;
use crate::properties::PropertyUpdate;
use crate::query::{FieldTable, FieldValue, Matchable};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

/// A connection between two Nodes.
///
/// The endpoint set is free to hold any number of IDs while the topology is
/// being assembled; validation requires exactly two.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Link {
    pub meta: Meta,
    pub lifetime: Lifetime,
    /// Institution IDs.
    pub owners: IndexSet<String>,
    /// Node IDs.
    pub nodes: IndexSet<String>,
}

#[derive(Debug, Clone)]
pub struct LinkBuilder {
    meta: MetaBuilder,
    lifetime_start: Option<String>,
    lifetime_end: Option<String>,
    owners: IndexSet<String>,
    nodes: IndexSet<String>,
}

impl_identity!(Link);

impl LinkBuilder {
    meta_builder_methods!();

    pub fn lifetime_start(mut self, start: impl Into<String>) -> Self {
        self.lifetime_start = Some(start.into());
        self
    }

    pub fn lifetime_end(mut self, end: impl Into<String>) -> Self {
        self.lifetime_end = Some(end.into());
        self
    }

    pub fn owner(mut self, owner: impl Into<String>) -> Self {
        self.owners.insert(owner.into());
        self
    }

    pub fn owners<I, S>(mut self, owners: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.owners.extend(owners.into_iter().map(Into::into));
        self
    }

    /// Accepts a Node ID or an `&Node`.
    pub fn node(mut self, node: impl Into<String>) -> Self {
        self.nodes.insert(node.into());
        self
    }

    pub fn nodes<I, S>(mut self, nodes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.nodes.extend(nodes.into_iter().map(Into::into));
        self
    }

    pub fn build(self) -> Result<Link> {
        let lifetime = Lifetime::new(self.lifetime_start.as_deref(), self.lifetime_end.as_deref())?;
        Ok(Link {
            meta: self.meta.finish(EntityKind::Link),
            lifetime,
            owners: self.owners,
            nodes: self.nodes,
        })
    }
}

impl Link {
    pub fn builder(name: impl Into<String>) -> LinkBuilder {
        LinkBuilder {
            meta: MetaBuilder::new(name),
            lifetime_start: None,
            lifetime_end: None,
            owners: IndexSet::new(),
            nodes: IndexSet::new(),
        }
    }

    pub fn new(name: impl Into<String>) -> Self {
        Self {
            meta: MetaBuilder::new(name).finish(EntityKind::Link),
            lifetime: Lifetime::default(),
            owners: IndexSet::new(),
            nodes: IndexSet::new(),
        }
    }

    pub fn add_owner(&mut self, owner: impl Into<String>) -> bool {
        self.owners.insert(owner.into())
    }

    pub fn remove_owner(&mut self, owner: &str) -> bool {
        self.owners.shift_remove(owner)
    }

    pub fn add_node(&mut self, node: impl Into<String>) -> bool {
        self.nodes.insert(node.into())
    }

    pub fn remove_node(&mut self, node: &str) -> bool {
        self.nodes.shift_remove(node)
    }

    pub(crate) fn update_field(
        &mut self,
        attribute: &str,
        update: &PropertyUpdate,
    ) -> Option<Result<()>> {
        if let Some(result) = meta_field(Self::KIND, &mut self.meta, attribute, update) {
            return Some(result);
        }
        let result = match attribute {
            "owners" => string_set(attribute, &mut self.owners, update),
            "nodes" => string_set(attribute, &mut self.nodes, update),
            "lifetime_start" => optional_timestamp(attribute, &mut self.lifetime.start, update),
            "lifetime_end" => optional_timestamp(attribute, &mut self.lifetime.end, update),
            _ => return None,
        };
        Some(result)
    }
}

impl GrenmlObject for Link {
    const KIND: EntityKind = EntityKind::Link;

    fn meta(&self) -> &Meta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut Meta {
        &mut self.meta
    }
}

const LINK_FIELDS: FieldTable<Link> = &[
    ("id", |l| FieldValue::Str(&l.meta.id)),
    ("name", |l| FieldValue::Str(&l.meta.name)),
    ("short_name", |l| FieldValue::opt_str(&l.meta.short_name)),
    ("version", |l| FieldValue::opt_str(&l.meta.version)),
    ("owners", |l| FieldValue::set(&l.owners)),
    ("nodes", |l| FieldValue::set(&l.nodes)),
    ("lifetime_start", |l| FieldValue::opt_str(&l.lifetime.start)),
    ("lifetime_end", |l| FieldValue::opt_str(&l.lifetime.end)),
];

impl Matchable for Link {
    fn field_table() -> FieldTable<Self> {
        LINK_FIELDS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Node;
    use crate::query::Query;

    #[test]
    fn test_nodes_from_entities() -> Result<()> {
        let a = Node::new("A");
        let b = Node::new("B");
        let link = Link::builder("A-B").node(&a).node(&b).build()?;
        assert_eq!(link.nodes.len(), 2);
        assert!(link.matches(&Query::new().contains("nodes", vec![&a, &b])));
        assert!(link.matches(&Query::new().eq("nodes", vec![b.id(), a.id()])));
        assert!(!link.matches(&Query::new().is_in("nodes", vec![a.id()])));
        Ok(())
    }

    #[test]
    fn test_duplicate_endpoint_is_collapsed() {
        let mut link = Link::new("L");
        assert!(link.add_node("N1"));
        assert!(!link.add_node("N1"));
        assert_eq!(link.nodes.len(), 1);
    }

    #[test]
    fn test_kind_discriminates_identity() {
        assert_ne!(Link::new("SAME").id(), Node::new("SAME").id());
    }

    #[test]
    fn test_update_nodes() {
        let mut link = Link::new("L");
        let result = link.update_field("nodes", &PropertyUpdate::append("N1"));
        assert!(matches!(result, Some(Ok(()))));
        let result = link.update_field("nodes", &PropertyUpdate::remove_value("N2"));
        assert!(matches!(result, Some(Err(e)) if e.is_value_error()));
    }
}
