use crate::model::EntityKind;

/// Errors raised by the GRENML core.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GrenmlError {
    #[error("{kind} with ID {id} already exists in this topology")]
    AttributeId { kind: EntityKind, id: String },

    #[error("No Institution found matching [{0}]")]
    InstitutionNotFound(String),

    #[error("No Node found matching [{0}]")]
    NodeNotFound(String),

    #[error("No Link found matching [{0}]")]
    LinkNotFound(String),

    #[error("Expected a single {kind} matching [{query}], found {count}")]
    MultipleReturned {
        kind: EntityKind,
        query: String,
        count: usize,
    },

    #[error("{0}")]
    Validation(String),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Property {0} does not exist")]
    KeyNotFound(String),

    #[error("Attribute {attribute} cannot be removed from {kind}")]
    NonRemovable { kind: EntityKind, attribute: String },

    #[error("Value {value} not present under {key}")]
    ValueNotFound { key: String, value: String },

    #[error("Cannot append and remove {0} in the same update")]
    ConflictingUpdate(String),

    #[error("{kind} {id} has no {field} reference {reference}")]
    ReferenceNotFound {
        kind: EntityKind,
        id: String,
        field: String,
        reference: String,
    },
}

impl GrenmlError {
    pub(crate) fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Lookup failures on a singular get.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::InstitutionNotFound(_) | Self::NodeNotFound(_) | Self::LinkNotFound(_)
        )
    }

    /// Missing or protected keys and references.
    pub fn is_key_error(&self) -> bool {
        matches!(
            self,
            Self::KeyNotFound(_) | Self::NonRemovable { .. } | Self::ReferenceNotFound { .. }
        )
    }

    /// Rejected values and malformed update requests.
    pub fn is_value_error(&self) -> bool {
        matches!(
            self,
            Self::Validation(_)
                | Self::InvalidValue { .. }
                | Self::ValueNotFound { .. }
                | Self::ConflictingUpdate(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, GrenmlError>;
