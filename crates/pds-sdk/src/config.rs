//! Peer configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PeerError, PeerResult};

/// Upper bound on `snapshot_interval`; past this a snapshot no longer
/// meaningfully bounds replay.
pub const MAX_SNAPSHOT_INTERVAL: usize = 10_000;

/// Tunables for a [`Peer`](crate::Peer).
///
/// ```toml
/// snapshot_interval = 2
/// publish_merges = true
/// node_id = 7
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PeerConfig {
    /// Non-merge entries since the nearest snapshot that trigger a new one.
    /// Zero disables snapshots.
    pub snapshot_interval: usize,
    /// Also publish (write to `latest_revision` and announce) merge entries
    /// created by `pull`.
    pub publish_merges: bool,
    /// Hybrid logical clock node id. Derived from the agent id when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_id: Option<u16>,
}

impl Default for PeerConfig {
    fn default() -> Self {
        Self {
            snapshot_interval: pds_diff::compactor::DEFAULT_SNAPSHOT_INTERVAL,
            publish_merges: true,
            node_id: None,
        }
    }
}

impl PeerConfig {
    pub fn from_toml_str(s: &str) -> PeerResult<Self> {
        let config: PeerConfig =
            toml::from_str(s).map_err(|e| PeerError::Config(format!("failed to parse: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> PeerResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| PeerError::Config(format!("failed to read {}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    pub fn to_toml_string(&self) -> PeerResult<String> {
        toml::to_string(self).map_err(|e| PeerError::Config(e.to_string()))
    }

    pub fn validate(&self) -> PeerResult<()> {
        if self.snapshot_interval > MAX_SNAPSHOT_INTERVAL {
            return Err(PeerError::Config(format!(
                "snapshot_interval {} exceeds {MAX_SNAPSHOT_INTERVAL}",
                self.snapshot_interval
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = PeerConfig::default();
        assert_eq!(c.snapshot_interval, 2);
        assert!(c.publish_merges);
        assert!(c.node_id.is_none());
    }

    #[test]
    fn empty_toml_is_default() {
        assert_eq!(PeerConfig::from_toml_str("").unwrap(), PeerConfig::default());
    }

    #[test]
    fn parses_all_fields() {
        let c = PeerConfig::from_toml_str(
            "snapshot_interval = 0\npublish_merges = false\nnode_id = 7\n",
        )
        .unwrap();
        assert_eq!(c.snapshot_interval, 0);
        assert!(!c.publish_merges);
        assert_eq!(c.node_id, Some(7));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = PeerConfig::from_toml_str("snapshot_every = 3").unwrap_err();
        assert!(matches!(err, PeerError::Config(_)));
    }

    #[test]
    fn oversized_interval_is_rejected() {
        let err = PeerConfig::from_toml_str("snapshot_interval = 1000000").unwrap_err();
        assert!(matches!(err, PeerError::Config(msg) if msg.contains("snapshot_interval")));
    }

    #[test]
    fn toml_output_parses_back() {
        let c = PeerConfig {
            snapshot_interval: 5,
            publish_merges: false,
            node_id: Some(3),
        };
        let text = c.to_toml_string().unwrap();
        assert!(text.contains("snapshot_interval = 5"));
        assert_eq!(PeerConfig::from_toml_str(&text).unwrap(), c);
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("peer.toml");
        std::fs::write(&path, "snapshot_interval = 4\n").unwrap();
        assert_eq!(PeerConfig::load(&path).unwrap().snapshot_interval, 4);
        assert!(matches!(
            PeerConfig::load(dir.path().join("missing.toml")),
            Err(PeerError::Config(_))
        ));
    }
}
