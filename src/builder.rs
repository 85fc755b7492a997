//! Router builder for flexible configuration
//!
//! This module provides a builder pattern for creating routers with a custom
//! key-space shape, host ordering policy and initial membership.

use crate::config::Config;
use crate::error::{Result, ZrouteError};
use crate::ordering::{HostOrdering, Lexicographic};
use crate::partition::PartitionTree;
use crate::router::Router;
use std::sync::Arc;
use zroute_types::host::HostId;

/// Builder for routers with a custom space, ordering policy and host set.
pub struct RouterBuilder {
    config: Config,
    ordering: Arc<dyn HostOrdering>,
    hosts: Vec<HostId>,
    version: u64,
}

impl RouterBuilder {
    /// Create a new builder with the default configuration and no hosts.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
            ordering: Arc::new(Lexicographic),
            hosts: Vec::new(),
            version: 0,
        }
    }

    /// Set the whole configuration.
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn dims(mut self, dims: usize) -> Self {
        self.config.dims = dims;
        self
    }

    pub fn bits_per_dim(mut self, bits_per_dim: u32) -> Self {
        self.config.bits_per_dim = bits_per_dim;
        self
    }

    /// Install the host ordering policy used to lay hosts out on the trie.
    pub fn ordering(mut self, ordering: Arc<dyn HostOrdering>) -> Self {
        self.ordering = ordering;
        self
    }

    /// Initial membership, e.g. the full host set known at startup.
    pub fn hosts<I, H>(mut self, hosts: I) -> Self
    where
        I: IntoIterator<Item = H>,
        H: Into<HostId>,
    {
        self.hosts.extend(hosts.into_iter().map(Into::into));
        self
    }

    /// Starting topology version.
    pub fn version(mut self, version: u64) -> Self {
        self.version = version;
        self
    }

    /// Build the router. The initial host set is laid out in a single rebuild.
    pub fn build(self) -> Result<Router> {
        self.config.validate().map_err(ZrouteError::InvalidConfig)?;
        let tree = PartitionTree::from_hosts(self.config.space(), self.ordering, self.hosts)?;
        Router::from_parts(self.config, tree, self.version)
    }
}

impl Default for RouterBuilder {
    fn default() -> Self {
        Self::new()
    }
}
