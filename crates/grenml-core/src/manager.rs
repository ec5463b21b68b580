//! CRUD facade over a single [`Topology`].

use crate::config::ManagerConfig;
use crate::error::{GrenmlError, Result};
use crate::model::{
    GrenmlObject, Institution, InstitutionBuilder, Link, LinkBuilder, Node, NodeBuilder,
    Topology,
};
use crate::persistence::TopologySnapshot;
use crate::properties::PropertyUpdate;
use crate::query::Query;
use crate::store::Element;
use crate::validator::TopologyValidator;
use std::path::Path;
use tracing::{debug, info};

/// Owns one topology and the rules for populating it.
///
/// Collaborators (importers, exporters, CLIs) go through this surface rather
/// than reaching into the topology's collections.
#[derive(Debug, Clone)]
pub struct GrenmlManager {
    topology: Topology,
    config: ManagerConfig,
    validator: TopologyValidator,
}

impl GrenmlManager {
    /// Empty topology with the default configuration.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            topology: Topology::new(name),
            config: ManagerConfig::default(),
            validator: TopologyValidator::new(),
        }
    }

    pub fn with_config(name: impl Into<String>, config: ManagerConfig) -> Result<Self> {
        let topology = Topology::builder(name)
            .id_generation(config.id_generation)
            .build();
        Self::from_topology(topology, config)
    }

    /// Adopt an existing topology, seeding the global institution if
    /// configured and absent.
    pub fn from_topology(topology: Topology, config: ManagerConfig) -> Result<Self> {
        let mut manager = Self {
            topology,
            config,
            validator: TopologyValidator::new(),
        };
        if manager.config.seed_global_institution {
            manager.seed_global_institution()?;
        }
        info!(
            topology = manager.topology.id(),
            name = manager.topology.name(),
            "manager ready"
        );
        Ok(manager)
    }

    pub fn with_validator(mut self, validator: TopologyValidator) -> Self {
        self.validator = validator;
        self
    }

    fn seed_global_institution(&mut self) -> Result<()> {
        let global = &self.config.global_institution;
        if self.topology.has_institution(&global.id) {
            return Ok(());
        }
        let institution = Institution::builder(global.name.clone())
            .id(&global.id)
            .institution_type(global.institution_type.clone())
            .build()?;
        self.topology.add(institution)
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn topology_mut(&mut self) -> &mut Topology {
        &mut self.topology
    }

    pub fn into_topology(self) -> Topology {
        self.topology
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    /// Builders pre-set with the configured identity mode.
    pub fn institution(&self, name: impl Into<String>) -> InstitutionBuilder {
        Institution::builder(name).id_generation(self.config.id_generation)
    }

    pub fn node(&self, name: impl Into<String>) -> NodeBuilder {
        Node::builder(name).id_generation(self.config.id_generation)
    }

    pub fn link(&self, name: impl Into<String>) -> LinkBuilder {
        Link::builder(name).id_generation(self.config.id_generation)
    }

    // Institutions

    /// Insert an institution, optionally making it the primary owner.
    pub fn add_institution(&mut self, institution: Institution, primary_owner: bool) -> Result<()> {
        let id = institution.id().to_string();
        self.topology.add(institution)?;
        if primary_owner {
            self.set_primary_owner(&id)?;
        }
        Ok(())
    }

    pub fn add_institutions<I>(&mut self, institutions: I) -> Result<()>
    where
        I: IntoIterator<Item = Institution>,
    {
        institutions
            .into_iter()
            .try_for_each(|institution| self.add_institution(institution, false))
    }

    pub fn get_institution(&self, query: &Query) -> Result<&Institution> {
        self.topology.get(query)
    }

    pub fn get_institution_mut(&mut self, query: &Query) -> Result<&mut Institution> {
        self.topology.get_mut(query)
    }

    pub fn get_institutions(&self, query: &Query) -> Vec<&Institution> {
        self.topology.get_many(query)
    }

    /// Removed institutions stay referenced by any node or link that lists
    /// them; validation reports those dangling owners.
    pub fn delete_institutions(&mut self, query: &Query) -> Vec<Institution> {
        self.topology.delete(query)
    }

    // Nodes

    /// Insert a node. The current primary owner becomes one of its owners.
    pub fn add_node(&mut self, mut node: Node) -> Result<()> {
        if let Some(owner) = self.topology.primary_owner() {
            node.add_owner(owner);
        }
        self.topology.add(node)
    }

    pub fn add_nodes<I>(&mut self, nodes: I) -> Result<()>
    where
        I: IntoIterator<Item = Node>,
    {
        nodes.into_iter().try_for_each(|node| self.add_node(node))
    }

    pub fn get_node(&self, query: &Query) -> Result<&Node> {
        self.topology.get(query)
    }

    pub fn get_node_mut(&mut self, query: &Query) -> Result<&mut Node> {
        self.topology.get_mut(query)
    }

    pub fn get_nodes(&self, query: &Query) -> Vec<&Node> {
        self.topology.get_many(query)
    }

    pub fn delete_nodes(&mut self, query: &Query) -> Vec<Node> {
        self.topology.delete(query)
    }

    // Links

    /// Insert a link. The current primary owner becomes one of its owners.
    pub fn add_link(&mut self, mut link: Link) -> Result<()> {
        if let Some(owner) = self.topology.primary_owner() {
            link.add_owner(owner);
        }
        self.topology.add(link)
    }

    pub fn add_links<I>(&mut self, links: I) -> Result<()>
    where
        I: IntoIterator<Item = Link>,
    {
        links.into_iter().try_for_each(|link| self.add_link(link))
    }

    pub fn get_link(&self, query: &Query) -> Result<&Link> {
        self.topology.get(query)
    }

    pub fn get_link_mut(&mut self, query: &Query) -> Result<&mut Link> {
        self.topology.get_mut(query)
    }

    pub fn get_links(&self, query: &Query) -> Vec<&Link> {
        self.topology.get_many(query)
    }

    pub fn delete_links(&mut self, query: &Query) -> Vec<Link> {
        self.topology.delete(query)
    }

    // Ownership

    pub fn primary_owner(&self) -> Option<&str> {
        self.topology.primary_owner()
    }

    /// The institution must already be part of the topology.
    pub fn set_primary_owner(&mut self, institution_id: &str) -> Result<()> {
        if !self.topology.has_institution(institution_id) {
            return Err(GrenmlError::InstitutionNotFound(
                Query::by_id(institution_id).to_string(),
            ));
        }
        debug!(owner = institution_id, "setting primary owner");
        self.topology
            .set_primary_owner(Some(institution_id.to_string()));
        Ok(())
    }

    pub fn clear_primary_owner(&mut self) {
        self.topology.set_primary_owner(None);
    }

    /// Attach an owner reference. The institution need not exist yet.
    pub fn add_owner_to_node(&mut self, node_id: &str, owner: impl Into<String>) -> Result<()> {
        let owner = owner.into();
        debug!(node = node_id, owner = %owner, "adding node owner");
        self.topology
            .get_mut::<Node>(&Query::by_id(node_id))?
            .add_owner(owner);
        Ok(())
    }

    pub fn remove_owner_from_node(&mut self, node_id: &str, owner: &str) -> Result<()> {
        let node = self.topology.get_mut::<Node>(&Query::by_id(node_id))?;
        if !node.remove_owner(owner) {
            return Err(missing_reference::<Node>(node_id, "owners", owner));
        }
        debug!(node = node_id, owner, "removed node owner");
        Ok(())
    }

    pub fn add_owner_to_link(&mut self, link_id: &str, owner: impl Into<String>) -> Result<()> {
        let owner = owner.into();
        debug!(link = link_id, owner = %owner, "adding link owner");
        self.topology
            .get_mut::<Link>(&Query::by_id(link_id))?
            .add_owner(owner);
        Ok(())
    }

    pub fn remove_owner_from_link(&mut self, link_id: &str, owner: &str) -> Result<()> {
        let link = self.topology.get_mut::<Link>(&Query::by_id(link_id))?;
        if !link.remove_owner(owner) {
            return Err(missing_reference::<Link>(link_id, "owners", owner));
        }
        debug!(link = link_id, owner, "removed link owner");
        Ok(())
    }

    // Properties, validation, persistence

    /// See [`Topology::update_property`].
    pub fn update_property<T: Element>(
        &mut self,
        query: &Query,
        attribute: &str,
        update: &PropertyUpdate,
    ) -> Result<usize> {
        self.topology.update_property::<T>(query, attribute, update)
    }

    pub fn validate(&self, raise_error: bool) -> Result<Vec<String>> {
        self.validator.validate(&self.topology, raise_error)
    }

    pub fn save_snapshot(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        if self.config.validate_before_save {
            self.validate(true)?;
        }
        TopologySnapshot::new(self.topology.clone()).save_to_file(path)
    }

    pub fn load_snapshot(path: impl AsRef<Path>, config: ManagerConfig) -> anyhow::Result<Self> {
        let snapshot = TopologySnapshot::load_from_file(path)?;
        Ok(Self::from_topology(snapshot.topology, config)?)
    }
}

fn missing_reference<T: GrenmlObject>(id: &str, field: &str, reference: &str) -> GrenmlError {
    GrenmlError::ReferenceNotFound {
        kind: T::KIND,
        id: id.to_string(),
        field: field.to_string(),
        reference: reference.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GLOBAL_INSTITUTION_ID;
    use crate::model::EntityKind;

    #[test]
    fn test_primary_owner_propagates() -> Result<()> {
        let mut manager = GrenmlManager::new("T");
        let owner = Institution::new("OWNER");
        let owner_id = owner.id().to_string();
        manager.add_institution(owner, true)?;
        assert_eq!(manager.primary_owner(), Some(owner_id.as_str()));

        manager.add_node(Node::new("N"))?;
        manager.add_link(Link::new("L"))?;
        assert!(manager.get_node(&Query::new())?.owners.contains(&owner_id));
        assert!(manager.get_link(&Query::new())?.owners.contains(&owner_id));
        Ok(())
    }

    #[test]
    fn test_set_primary_owner_requires_institution() {
        let mut manager = GrenmlManager::new("T");
        let err = manager.set_primary_owner("GHOST").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_owner_attach_and_detach() -> Result<()> {
        let mut manager = GrenmlManager::new("T");
        manager.add_node(Node::builder("N").id("N").build()?)?;
        manager.add_owner_to_node("N", "I")?;
        assert!(manager.get_node(&Query::by_id("N"))?.owners.contains("I"));
        manager.remove_owner_from_node("N", "I")?;
        let err = manager.remove_owner_from_node("N", "I").unwrap_err();
        assert!(matches!(
            err,
            GrenmlError::ReferenceNotFound {
                kind: EntityKind::Node,
                ..
            }
        ));
        assert!(err.is_key_error());
        assert!(manager.add_owner_to_link("missing", "I").unwrap_err().is_not_found());
        Ok(())
    }

    #[test]
    fn test_global_institution_seed() -> Result<()> {
        let config = ManagerConfig::default().with_global_institution(true);
        let manager = GrenmlManager::with_config("T", config.clone())?;
        let global = manager.get_institution(&Query::by_id(GLOBAL_INSTITUTION_ID))?;
        assert_eq!(global.name(), "GREN");
        assert_eq!(global.institution_type(), "global");

        let again = GrenmlManager::from_topology(manager.into_topology(), config)?;
        assert_eq!(again.get_institutions(&Query::new()).len(), 1);
        Ok(())
    }
}
