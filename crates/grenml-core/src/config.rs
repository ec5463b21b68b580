//! Configuration for the GRENML manager

use crate::identity::IdGeneration;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const GLOBAL_INSTITUTION_ID: &str = "urn:ogf:networking:global";
pub const GLOBAL_INSTITUTION_NAME: &str = "GREN";
pub const GLOBAL_INSTITUTION_TYPE: &str = "global";

/// Institution seeded into every new topology when enabled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalInstitutionConfig {
    #[serde(default = "default_global_id")]
    pub id: String,
    #[serde(default = "default_global_name")]
    pub name: String,
    #[serde(default = "default_global_type")]
    pub institution_type: String,
}

impl Default for GlobalInstitutionConfig {
    fn default() -> Self {
        Self {
            id: default_global_id(),
            name: default_global_name(),
            institution_type: default_global_type(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManagerConfig {
    /// Identity mode for entities the manager builds itself
    #[serde(default)]
    pub id_generation: IdGeneration,
    /// Insert the global institution on creation
    #[serde(default)]
    pub seed_global_institution: bool,
    #[serde(default)]
    pub global_institution: GlobalInstitutionConfig,
    /// Validate in raise mode before writing a snapshot
    #[serde(default = "default_true")]
    pub validate_before_save: bool,
}

fn default_true() -> bool {
    true
}

fn default_global_id() -> String {
    GLOBAL_INSTITUTION_ID.to_string()
}

fn default_global_name() -> String {
    GLOBAL_INSTITUTION_NAME.to_string()
}

fn default_global_type() -> String {
    GLOBAL_INSTITUTION_TYPE.to_string()
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            id_generation: IdGeneration::default(),
            seed_global_institution: false,
            global_institution: GlobalInstitutionConfig::default(),
            validate_before_save: true,
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl ManagerConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse manager config")
    }

    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_json_str(&content)
    }

    /// `GRENML_CONFIG` names a JSON file; `GRENML_ID_GENERATION` and
    /// `GRENML_SEED_GLOBAL_INSTITUTION` override individual fields.
    pub fn from_env() -> Result<Self> {
        let mut config = match std::env::var("GRENML_CONFIG") {
            Ok(path) => Self::load_from_file(path)?,
            Err(_) => Self::default(),
        };
        if let Ok(mode) = std::env::var("GRENML_ID_GENERATION") {
            config.id_generation = mode
                .parse::<IdGeneration>()
                .map_err(anyhow::Error::msg)
                .context("Invalid GRENML_ID_GENERATION")?;
        }
        if let Ok(flag) = std::env::var("GRENML_SEED_GLOBAL_INSTITUTION") {
            config.seed_global_institution = parse_flag(&flag)
                .with_context(|| format!("Invalid GRENML_SEED_GLOBAL_INSTITUTION: {}", flag))?;
        }
        Ok(config)
    }

    pub fn with_id_generation(mut self, mode: IdGeneration) -> Self {
        self.id_generation = mode;
        self
    }

    pub fn with_global_institution(mut self, seed: bool) -> Self {
        self.seed_global_institution = seed;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ManagerConfig::default();
        assert_eq!(config.id_generation, IdGeneration::Determinate);
        assert!(!config.seed_global_institution);
        assert!(config.validate_before_save);
        assert_eq!(config.global_institution.name, "GREN");
    }

    #[test]
    fn test_partial_json_uses_defaults() -> Result<()> {
        let config = ManagerConfig::from_json_str(
            r#"{"id_generation": "random", "global_institution": {"name": "World"}}"#,
        )?;
        assert_eq!(config.id_generation, IdGeneration::Random);
        assert!(config.validate_before_save);
        assert_eq!(config.global_institution.name, "World");
        assert_eq!(config.global_institution.id, GLOBAL_INSTITUTION_ID);
        Ok(())
    }

    #[test]
    fn test_load_from_file() -> Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        write!(file, r#"{{"seed_global_institution": true}}"#)?;
        let config = ManagerConfig::load_from_file(file.path())?;
        assert!(config.seed_global_institution);
        assert!(ManagerConfig::load_from_file("/nonexistent/grenml.json").is_err());
        Ok(())
    }

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag("0"), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }
}
