//! Identifier generation for GRENML objects.
//!
//! Three policies are supported. A non-empty caller-supplied identifier is
//! always used verbatim. Otherwise the identifier is either a SHA-256 digest
//! over `{Kind}:{name}:{short_name}` (determinate) or a fresh UUID (random).

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Identifier generation policy for objects constructed without an explicit ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdGeneration {
    /// Caller-supplied identifier, used verbatim.
    Custom,
    /// Digest of kind, name and short name. Stable across re-imports.
    #[default]
    Determinate,
    /// Fresh UUID v4 per object.
    Random,
}

impl fmt::Display for IdGeneration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            IdGeneration::Custom => "custom",
            IdGeneration::Determinate => "determinate",
            IdGeneration::Random => "random",
        };
        f.write_str(label)
    }
}

impl FromStr for IdGeneration {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "custom" => Ok(IdGeneration::Custom),
            "determinate" | "deterministic" | "det" => Ok(IdGeneration::Determinate),
            "random" | "rnd" | "uuid" => Ok(IdGeneration::Random),
            other => Err(format!("Unknown ID generation mode: {}", other)),
        }
    }
}

/// Canonical string hashed by the determinate policy.
pub fn canonical_string(discriminator: &str, name: &str, short_name: Option<&str>) -> String {
    format!("{}:{}:{}", discriminator, name, short_name.unwrap_or(""))
}

/// Lowercase hex SHA-256 of the canonical string.
pub fn determinate_id(discriminator: &str, name: &str, short_name: Option<&str>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(canonical_string(discriminator, name, short_name).as_bytes());
    hex::encode(hasher.finalize())
}

pub fn random_id() -> String {
    Uuid::new_v4().to_string()
}

/// Resolve the identifier for a new object.
///
/// An empty (or whitespace-only) custom identifier never survives: it falls
/// back to the determinate digest whatever the mode. `Custom` mode without
/// an ID is also determinate.
pub fn generate_id(
    discriminator: &str,
    name: &str,
    short_name: Option<&str>,
    custom: Option<&str>,
    mode: IdGeneration,
) -> String {
    match custom {
        Some(id) if !id.trim().is_empty() => id.to_string(),
        Some(_) => determinate_id(discriminator, name, short_name),
        None => match mode {
            IdGeneration::Random => random_id(),
            IdGeneration::Custom | IdGeneration::Determinate => {
                determinate_id(discriminator, name, short_name)
            }
        },
    }
}
