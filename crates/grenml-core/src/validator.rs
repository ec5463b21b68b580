//! Referential-integrity and value-domain checks over a [`Topology`].

use crate::error::{GrenmlError, Result};
use crate::model::lifetime::is_full_iso;
use crate::model::{GrenmlObject, Institution, Lifetime, Topology};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Selectable validation checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationRules {
    pub primary_owner: bool,
    pub locations: bool,
    pub owners: bool,
    pub link_nodes: bool,
    pub lifetimes: bool,
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self::all()
    }
}

impl ValidationRules {
    pub fn all() -> Self {
        Self {
            primary_owner: true,
            locations: true,
            owners: true,
            link_nodes: true,
            lifetimes: true,
        }
    }

    pub fn none() -> Self {
        Self {
            primary_owner: false,
            locations: false,
            owners: false,
            link_nodes: false,
            lifetimes: false,
        }
    }

    /// Parse from comma-separated rule names. Unknown names are ignored.
    pub fn parse(rules: &str) -> Self {
        let mut selected = Self::none();
        for rule in rules.split(',').map(|s| s.trim().to_lowercase()) {
            match rule.as_str() {
                "primary_owner" | "primary" => selected.primary_owner = true,
                "locations" | "location" => selected.locations = true,
                "owners" | "owner" => selected.owners = true,
                "link_nodes" | "nodes" => selected.link_nodes = true,
                "lifetimes" | "lifetime" => selected.lifetimes = true,
                "all" => selected = Self::all(),
                _ => {}
            }
        }
        selected
    }
}

#[derive(Debug, Clone, Default)]
pub struct TopologyValidator {
    rules: ValidationRules,
}

impl TopologyValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rules(rules: ValidationRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> ValidationRules {
        self.rules
    }

    /// Validate `topology`.
    ///
    /// With `raise_error` the first problem is returned as
    /// [`GrenmlError::Validation`]; otherwise every problem is collected and
    /// returned as `Ok`. An empty list means the topology is valid.
    pub fn validate(&self, topology: &Topology, raise_error: bool) -> Result<Vec<String>> {
        let errors = self.check(topology);
        if !errors.is_empty() {
            warn!(
                topology = topology.id(),
                count = errors.len(),
                "topology failed validation"
            );
        }
        if raise_error {
            if let Some(first) = errors.into_iter().next() {
                return Err(GrenmlError::Validation(first));
            }
            return Ok(Vec::new());
        }
        Ok(errors)
    }

    /// Run every enabled check and collect the messages.
    pub fn check(&self, topology: &Topology) -> Vec<String> {
        let mut errors = Vec::new();
        if self.rules.primary_owner {
            check_primary_owner(topology, &mut errors);
        }
        if self.rules.locations {
            for institution in topology.institutions() {
                check_location(institution, &mut errors);
            }
        }
        if self.rules.owners {
            check_owners(topology, &mut errors);
        }
        if self.rules.link_nodes {
            check_link_nodes(topology, &mut errors);
        }
        if self.rules.lifetimes {
            for node in topology.nodes() {
                check_lifetime("Node", node.id(), &node.lifetime, &mut errors);
            }
            for link in topology.links() {
                check_lifetime("Link", link.id(), &link.lifetime, &mut errors);
            }
        }
        errors
    }
}

fn check_primary_owner(topology: &Topology, errors: &mut Vec<String>) {
    if let Some(owner) = topology.primary_owner() {
        if !topology.has_institution(owner) {
            errors.push(format!(
                "Topology {} primary owner ID {} must be in the Topologies Institutions",
                topology.id(),
                owner
            ));
        }
    }
}

fn check_location(institution: &Institution, errors: &mut Vec<String>) {
    let id = institution.id();
    let location = &institution.location;
    if let Some(latitude) = location.latitude {
        if !(-90.0..=90.0).contains(&latitude) {
            errors.push(format!(
                "Institution {} latitude {} must be between -90 and 90",
                id, latitude
            ));
        }
    }
    if let Some(longitude) = location.longitude {
        if !(-180.0..=180.0).contains(&longitude) {
            errors.push(format!(
                "Institution {} longitude {} must be between -180 and 180",
                id, longitude
            ));
        }
    }
    if let Some(altitude) = location.altitude {
        if !altitude.is_finite() {
            errors.push(format!("Institution {} altitude must be a finite number", id));
        }
    }
}

fn check_owners(topology: &Topology, errors: &mut Vec<String>) {
    let parent = topology.id();
    for node in topology.nodes() {
        for owner in node.owners.iter().filter(|o| !topology.has_institution(o)) {
            errors.push(format!(
                "Node {} listed owner id {} does not exist in parent Topology {}",
                node.id(),
                owner,
                parent
            ));
        }
    }
    for link in topology.links() {
        for owner in link.owners.iter().filter(|o| !topology.has_institution(o)) {
            errors.push(format!(
                "Link {} listed owner id {} does not exist in parent Topology {}",
                link.id(),
                owner,
                parent
            ));
        }
    }
}

fn check_link_nodes(topology: &Topology, errors: &mut Vec<String>) {
    let parent = topology.id();
    for link in topology.links() {
        for node in link.nodes.iter().filter(|n| !topology.has_node(n)) {
            errors.push(format!(
                "Link {} listed node id {} does not exist in parent Topology {}",
                link.id(),
                node,
                parent
            ));
        }
        if link.nodes.len() != 2 {
            errors.push(format!(
                "Link {} must reference exactly 2 distinct nodes, found {}",
                link.id(),
                link.nodes.len()
            ));
        }
    }
}

fn check_lifetime(kind: &str, id: &str, lifetime: &Lifetime, errors: &mut Vec<String>) {
    let bounds = [("Start", &lifetime.start), ("End", &lifetime.end)];
    for (label, value) in bounds {
        if let Some(value) = value.as_deref() {
            if !is_full_iso(value) {
                errors.push(format!(
                    "{} {} Lifetime {} needs to be in full ISO format, got '{}'",
                    kind, id, label, value
                ));
            }
        }
    }
}
