use super::lifetime::Lifetime;
use super::location::{check_altitude, check_latitude, check_longitude, Location};
use super::update::{meta_field, optional_number, optional_text, optional_timestamp, string_set};
use super::{EntityKind, GrenmlObject, Meta, MetaBuilder};
use crate::error::Result;
use crate::properties::PropertyUpdate;
use crate::query::{FieldTable, FieldValue, Matchable};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

/// A point of presence in the network.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub meta: Meta,
    pub location: Location,
    pub lifetime: Lifetime,
    /// Institution IDs.
    pub owners: IndexSet<String>,
}

#[derive(Debug, Clone)]
pub struct NodeBuilder {
    meta: MetaBuilder,
    location: Location,
    lifetime_start: Option<String>,
    lifetime_end: Option<String>,
    owners: IndexSet<String>,
}

impl_identity!(Node);

impl NodeBuilder {
    meta_builder_methods!();

    pub fn latitude(mut self, latitude: f64) -> Self {
        self.location.latitude = Some(latitude);
        self
    }

    pub fn longitude(mut self, longitude: f64) -> Self {
        self.location.longitude = Some(longitude);
        self
    }

    pub fn altitude(mut self, altitude: f64) -> Self {
        self.location.altitude = Some(altitude);
        self
    }

    pub fn unlocode(mut self, unlocode: impl Into<String>) -> Self {
        self.location.unlocode = Some(unlocode.into());
        self
    }

    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.location.add_address(address);
        self
    }

    pub fn lifetime_start(mut self, start: impl Into<String>) -> Self {
        self.lifetime_start = Some(start.into());
        self
    }

    pub fn lifetime_end(mut self, end: impl Into<String>) -> Self {
        self.lifetime_end = Some(end.into());
        self
    }

    /// Accepts an ID or an `&Institution`.
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

    pub fn build(self) -> Result<Node> {
        self.location.check()?;
        let lifetime = Lifetime::new(self.lifetime_start.as_deref(), self.lifetime_end.as_deref())?;
        Ok(Node {
            meta: self.meta.finish(EntityKind::Node),
            location: self.location,
            lifetime,
            owners: self.owners,
        })
    }
}

impl Node {
    pub fn builder(name: impl Into<String>) -> NodeBuilder {
        NodeBuilder {
            meta: MetaBuilder::new(name),
            location: Location::default(),
            lifetime_start: None,
            lifetime_end: None,
            owners: IndexSet::new(),
        }
    }

    pub fn new(name: impl Into<String>) -> Self {
        Self {
            meta: MetaBuilder::new(name).finish(EntityKind::Node),
            location: Location::default(),
            lifetime: Lifetime::default(),
            owners: IndexSet::new(),
        }
    }

    /// Returns false if already an owner.
    pub fn add_owner(&mut self, owner: impl Into<String>) -> bool {
        self.owners.insert(owner.into())
    }

    pub fn remove_owner(&mut self, owner: &str) -> bool {
        self.owners.shift_remove(owner)
    }

    pub(crate) fn update_field(
        &mut self,
        attribute: &str,
        update: &PropertyUpdate,
    ) -> Option<Result<()>> {
        if let Some(result) = meta_field(Self::KIND, &mut self.meta, attribute, update) {
            return Some(result);
        }
        let location = &mut self.location;
        let result = match attribute {
            "owners" => string_set(attribute, &mut self.owners, update),
            "latitude" => optional_number(attribute, &mut location.latitude, update, check_latitude),
            "longitude" => {
                optional_number(attribute, &mut location.longitude, update, check_longitude)
            }
            "altitude" => optional_number(attribute, &mut location.altitude, update, check_altitude),
            "unlocode" => optional_text(attribute, &mut location.unlocode, update),
            "address" | "addresses" => string_set("address", &mut location.addresses, update),
            "lifetime_start" => optional_timestamp(attribute, &mut self.lifetime.start, update),
            "lifetime_end" => optional_timestamp(attribute, &mut self.lifetime.end, update),
            _ => return None,
        };
        Some(result)
    }
}

impl GrenmlObject for Node {
    const KIND: EntityKind = EntityKind::Node;

    fn meta(&self) -> &Meta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut Meta {
        &mut self.meta
    }
}

const NODE_FIELDS: FieldTable<Node> = &[
    ("id", |n| FieldValue::Str(&n.meta.id)),
    ("name", |n| FieldValue::Str(&n.meta.name)),
    ("short_name", |n| FieldValue::opt_str(&n.meta.short_name)),
    ("version", |n| FieldValue::opt_str(&n.meta.version)),
    ("owners", |n| FieldValue::set(&n.owners)),
    ("latitude", |n| FieldValue::opt_num(n.location.latitude)),
    ("longitude", |n| FieldValue::opt_num(n.location.longitude)),
    ("altitude", |n| FieldValue::opt_num(n.location.altitude)),
    ("unlocode", |n| FieldValue::opt_str(&n.location.unlocode)),
    ("address", |n| FieldValue::set(&n.location.addresses)),
    ("addresses", |n| FieldValue::set(&n.location.addresses)),
    ("lifetime_start", |n| FieldValue::opt_str(&n.lifetime.start)),
    ("lifetime_end", |n| FieldValue::opt_str(&n.lifetime.end)),
];

impl Matchable for Node {
    fn field_table() -> FieldTable<Self> {
        NODE_FIELDS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Institution;
    use crate::query::Query;

    #[test]
    fn test_same_name_nodes_are_equal() {
        let a = Node::new("TEST_NODE_NAME");
        let b = Node::new("TEST_NODE_NAME");
        assert_eq!(a, b);
        assert_ne!(a.id(), Institution::new("TEST_NODE_NAME").id());
    }

    #[test]
    fn test_short_name_changes_identity() -> Result<()> {
        let a = Node::builder("TEST_NODE_NAME").build()?;
        let b = Node::builder("TEST_NODE_NAME").short_name("TNN").build()?;
        assert_ne!(a, b);
        Ok(())
    }

    #[test]
    fn test_owner_from_institution() -> Result<()> {
        let owner = Institution::new("OWNER");
        let node = Node::builder("N").owner(&owner).build()?;
        assert!(node.owners.contains(owner.id()));
        assert!(node.matches(&Query::new().contains("owners", &owner)));
        Ok(())
    }

    #[test]
    fn test_lifetime_is_normalised() -> Result<()> {
        let node = Node::builder("N")
            .lifetime_start("2020-03-20T14:30:43Z")
            .lifetime_end("2021-03-20T14:30:43.999+01:00")
            .build()?;
        assert_eq!(node.lifetime.start.as_deref(), Some("2020-03-20T14:30:43+00:00"));
        assert_eq!(node.lifetime.end.as_deref(), Some("2021-03-20T14:30:43+01:00"));
        assert!(node.matches(&Query::new().contains("lifetime_start", "2020-03-20")));

        assert!(Node::builder("N").lifetime_start("14:30:43").build().is_err());
        Ok(())
    }

    #[test]
    fn test_unknown_field_is_false() {
        let node = Node::new("TEST_NODE_NAME");
        assert!(!node.matches(&Query::new().eq("notname", "TEST_NODE_NAME")));
        assert!(node.matches(&Query::new().eq("name", "TEST_NODE_NAME")));
    }

    #[test]
    fn test_custom_id() -> Result<()> {
        let node = Node::builder("N").id(123).build()?;
        assert_eq!(node.id(), "123");
        assert!(node.matches(&Query::by_id("123")));
        Ok(())
    }
}
