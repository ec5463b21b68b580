//! Collection operations over a [`Topology`].
//!
//! Each entity kind lives in its own ID-keyed map. All operations are
//! generic over [`Element`], which ties a kind to its collection, its
//! not-found error and its first-class update rules.

use crate::error::{GrenmlError, Result};
use crate::model::{GrenmlObject, Institution, Link, Node, Topology};
use crate::properties::PropertyUpdate;
use crate::query::{Matchable, Query};
use indexmap::IndexMap;
use tracing::debug;

/// An entity kind stored in a [`Topology`].
pub trait Element: GrenmlObject + Matchable + Clone {
    fn collection(topology: &Topology) -> &IndexMap<String, Self>;
    fn collection_mut(topology: &mut Topology) -> &mut IndexMap<String, Self>;
    fn not_found(query: &Query) -> GrenmlError;
    /// `None` when `attribute` is not a first-class field.
    fn update_field(&mut self, attribute: &str, update: &PropertyUpdate) -> Option<Result<()>>;
}

impl Element for Institution {
    fn collection(topology: &Topology) -> &IndexMap<String, Self> {
        &topology.institutions
    }

    fn collection_mut(topology: &mut Topology) -> &mut IndexMap<String, Self> {
        &mut topology.institutions
    }

    fn not_found(query: &Query) -> GrenmlError {
        GrenmlError::InstitutionNotFound(query.to_string())
    }

    fn update_field(&mut self, attribute: &str, update: &PropertyUpdate) -> Option<Result<()>> {
        Institution::update_field(self, attribute, update)
    }
}

impl Element for Node {
    fn collection(topology: &Topology) -> &IndexMap<String, Self> {
        &topology.nodes
    }

    fn collection_mut(topology: &mut Topology) -> &mut IndexMap<String, Self> {
        &mut topology.nodes
    }

    fn not_found(query: &Query) -> GrenmlError {
        GrenmlError::NodeNotFound(query.to_string())
    }

    fn update_field(&mut self, attribute: &str, update: &PropertyUpdate) -> Option<Result<()>> {
        Node::update_field(self, attribute, update)
    }
}

impl Element for Link {
    fn collection(topology: &Topology) -> &IndexMap<String, Self> {
        &topology.links
    }

    fn collection_mut(topology: &mut Topology) -> &mut IndexMap<String, Self> {
        &mut topology.links
    }

    fn not_found(query: &Query) -> GrenmlError {
        GrenmlError::LinkNotFound(query.to_string())
    }

    fn update_field(&mut self, attribute: &str, update: &PropertyUpdate) -> Option<Result<()>> {
        Link::update_field(self, attribute, update)
    }
}

impl Topology {
    /// Insert an entity. Fails if its ID is already taken within its kind.
    pub fn add<T: Element>(&mut self, entity: T) -> Result<()> {
        let collection = T::collection_mut(self);
        if collection.contains_key(entity.id()) {
            return Err(GrenmlError::AttributeId {
                kind: T::KIND,
                id: entity.id().to_string(),
            });
        }
        debug!(kind = %T::KIND, id = entity.id(), "adding entity");
        collection.insert(entity.id().to_string(), entity);
        Ok(())
    }

    pub fn get_by_id<T: Element>(&self, id: &str) -> Option<&T> {
        T::collection(self).get(id)
    }

    /// The unique entity matching `query`.
    pub fn get<T: Element>(&self, query: &Query) -> Result<&T> {
        let mut matches = self.get_many::<T>(query).into_iter();
        let first = matches.next().ok_or_else(|| T::not_found(query))?;
        let rest = matches.count();
        if rest > 0 {
            return Err(GrenmlError::MultipleReturned {
                kind: T::KIND,
                query: query.to_string(),
                count: rest + 1,
            });
        }
        Ok(first)
    }

    /// Every entity matching `query`, in insertion order.
    pub fn get_many<T: Element>(&self, query: &Query) -> Vec<&T> {
        T::collection(self)
            .values()
            .filter(|entity| entity.matches(query))
            .collect()
    }

    pub fn get_mut<T: Element>(&mut self, query: &Query) -> Result<&mut T> {
        let id = self.get::<T>(query)?.id().to_string();
        T::collection_mut(self)
            .get_mut(&id)
            .ok_or_else(|| T::not_found(query))
    }

    /// Remove every match and hand the removed entities back. No match is
    /// not an error. References held by other entities are left dangling.
    pub fn delete<T: Element>(&mut self, query: &Query) -> Vec<T> {
        let collection = T::collection_mut(self);
        let ids: Vec<String> = collection
            .values()
            .filter(|entity| entity.matches(query))
            .map(|entity| entity.id().to_string())
            .collect();
        let removed: Vec<T> = ids
            .iter()
            .filter_map(|id| collection.shift_remove(id))
            .collect();
        if !removed.is_empty() {
            debug!(kind = %T::KIND, count = removed.len(), query = %query, "deleted entities");
        }
        removed
    }

    /// Apply `update` to `attribute` on every match. First-class fields take
    /// precedence over the property bag. Returns the number of entities
    /// updated.
    ///
    /// All or nothing: the update is applied to copies of the matches and
    /// committed only when every one of them accepts it.
    pub fn update_property<T: Element>(
        &mut self,
        query: &Query,
        attribute: &str,
        update: &PropertyUpdate,
    ) -> Result<usize> {
        update.check(attribute)?;
        let attribute = attribute.to_lowercase();
        let collection = T::collection_mut(self);
        let mut staged = Vec::new();
        for (id, entity) in collection.iter().filter(|(_, e)| e.matches(query)) {
            let mut entity = entity.clone();
            match entity.update_field(&attribute, update) {
                Some(result) => result?,
                None => entity.properties_mut().apply(&attribute, update)?,
            }
            staged.push((id.clone(), entity));
        }
        let updated = staged.len();
        for (id, entity) in staged {
            collection.insert(id, entity);
        }
        debug!(kind = %T::KIND, attribute = %attribute, updated, "updated property");
        Ok(updated)
    }
}
