//! Routing snapshots for shipping a topology between processes.
//!
//! Only the key-space shape, the sorted host list and the topology version are
//! stored. The trie and everything derived from it is rebuilt on load.

use crate::error::{Result, ZrouteError};
use serde::{Deserialize, Serialize};
use zroute_types::host::HostId;
use zroute_types::space::SpaceConfig;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoutingSnapshot {
    pub dims: usize,
    pub bits_per_dim: u32,
    /// Hosts in the ordering policy's order
    pub hosts: Vec<HostId>,
    pub version: u64,
}

impl RoutingSnapshot {
    pub fn new(space: SpaceConfig, hosts: Vec<HostId>, version: u64) -> Self {
        Self {
            dims: space.dims,
            bits_per_dim: space.bits_per_dim,
            hosts,
            version,
        }
    }

    pub fn space(&self) -> SpaceConfig {
        SpaceConfig::new(self.dims, self.bits_per_dim)
    }

    pub fn validate(&self) -> Result<()> {
        self.space().validate().map_err(ZrouteError::InvalidConfig)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let snapshot: Self = serde_json::from_str(json)?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    #[cfg(feature = "snapshot")]
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(|e| {
            ZrouteError::SerializationErrorWithContext(format!(
                "Failed to encode routing snapshot at version {}: {}",
                self.version, e
            ))
        })
    }

    #[cfg(feature = "snapshot")]
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let snapshot: Self = bincode::deserialize(bytes)
            .map_err(|e| ZrouteError::SerializationErrorWithContext(e.to_string()))?;
        snapshot.validate()?;
        Ok(snapshot)
    }
}
