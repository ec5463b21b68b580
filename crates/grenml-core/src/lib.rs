//! In-memory model of a research and education network topology.
//!
//! A [`Topology`] holds Institutions, Nodes and Links keyed by ID.
//! [`GrenmlManager`] is the CRUD surface over one topology, [`Query`] filters
//! entities by field, and [`TopologyValidator`] certifies referential
//! integrity before a topology is handed to an exporter.

pub mod config;
pub mod error;
pub mod identity;
pub mod logging;
pub mod manager;
pub mod model;
pub mod persistence;
pub mod properties;
pub mod query;
pub mod store;
pub mod validator;

pub use config::{ManagerConfig, GLOBAL_INSTITUTION_ID};
pub use error::{GrenmlError, Result};
pub use identity::IdGeneration;
pub use manager::GrenmlManager;
pub use model::{
    EntityKind, GrenmlObject, Institution, Lifetime, Link, Location, Node, Topology,
};
pub use persistence::{SnapshotFormat, TopologySnapshot};
pub use properties::{PropertyBag, PropertyUpdate};
pub use query::{Matchable, Query, QueryValue};
pub use store::Element;
pub use validator::{TopologyValidator, ValidationRules};
