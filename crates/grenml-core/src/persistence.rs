use crate::model::{GrenmlObject, Topology};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotFormat {
    Binary,
    Json,
}

impl SnapshotFormat {
    /// `.json` selects JSON; anything else is binary.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => SnapshotFormat::Json,
            _ => SnapshotFormat::Binary,
        }
    }
}

/// Whole-topology interchange record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopologySnapshot {
    pub version: u32,
    pub topology: Topology,
}

impl TopologySnapshot {
    pub fn new(topology: Topology) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            topology,
        }
    }

    pub fn to_bytes(&self, format: SnapshotFormat) -> Result<Vec<u8>> {
        match format {
            SnapshotFormat::Binary => bincode::serialize(self).context("Failed to encode snapshot"),
            SnapshotFormat::Json => {
                serde_json::to_vec_pretty(self).context("Failed to encode snapshot as JSON")
            }
        }
    }

    pub fn from_bytes(data: &[u8], format: SnapshotFormat) -> Result<Self> {
        let snapshot: Self = match format {
            SnapshotFormat::Binary => {
                bincode::deserialize(data).context("Failed to decode snapshot")?
            }
            SnapshotFormat::Json => {
                serde_json::from_slice(data).context("Failed to decode JSON snapshot")?
            }
        };
        if snapshot.version != SNAPSHOT_VERSION {
            bail!(
                "Unsupported snapshot version {} (expected {})",
                snapshot.version,
                SNAPSHOT_VERSION
            );
        }
        Ok(snapshot)
    }

    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let format = SnapshotFormat::from_path(path);
        let data = self.to_bytes(format)?;
        fs::write(path, data).with_context(|| format!("Failed to write {}", path.display()))?;
        info!(
            topology = self.topology.id(),
            path = %path.display(),
            ?format,
            "topology saved"
        );
        Ok(())
    }

    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        let snapshot = Self::from_bytes(&data, SnapshotFormat::from_path(path))
            .with_context(|| format!("Failed to load snapshot {}", path.display()))?;
        info!(
            topology = snapshot.topology.id(),
            path = %path.display(),
            institutions = snapshot.topology.institution_count(),
            nodes = snapshot.topology.node_count(),
            links = snapshot.topology.link_count(),
            "topology loaded"
        );
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Institution, Node};

    fn topology() -> anyhow::Result<Topology> {
        let mut topology = Topology::builder("T").version("2021-01-01").build();
        let mut institution = Institution::builder("I")
            .latitude(45.0)
            .address("1 Main St")
            .build()?;
        institution.add_property("Tag", "a");
        topology.add(institution)?;
        topology.add(Node::builder("N").lifetime_start("2020-01-01T00:00:00Z").build()?)?;
        Ok(topology)
    }

    #[test]
    fn test_binary_and_json_agree() -> anyhow::Result<()> {
        let snapshot = TopologySnapshot::new(topology()?);
        for format in [SnapshotFormat::Binary, SnapshotFormat::Json] {
            let bytes = snapshot.to_bytes(format)?;
            let restored = TopologySnapshot::from_bytes(&bytes, format)?;
            assert_eq!(restored.topology, snapshot.topology);
            assert_eq!(restored.topology.institution_count(), 1);
            let institution = restored
                .topology
                .institutions()
                .next()
                .map(|i| i.properties().get("tag").map(<[String]>::to_vec));
            assert_eq!(institution, Some(Some(vec!["a".to_string()])));
        }
        Ok(())
    }

    #[test]
    fn test_version_is_checked() -> anyhow::Result<()> {
        let mut snapshot = TopologySnapshot::new(topology()?);
        snapshot.version = 99;
        let bytes = snapshot.to_bytes(SnapshotFormat::Json)?;
        assert!(TopologySnapshot::from_bytes(&bytes, SnapshotFormat::Json).is_err());
        Ok(())
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(SnapshotFormat::from_path(Path::new("t.JSON")), SnapshotFormat::Json);
        assert_eq!(SnapshotFormat::from_path(Path::new("t.bin")), SnapshotFormat::Binary);
    }
}
