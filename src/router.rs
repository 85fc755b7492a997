//! Router facade: the only entry point the request-dispatch layer uses.
//!
//! The router keeps the current topology as an immutable `Arc<Topology>`
//! behind a `parking_lot::RwLock`. Route calls clone the `Arc` under a short
//! read guard and work on that snapshot; membership changes build the next
//! topology to completion under the write guard and swap it in, so a reader
//! never sees a half-rebuilt trie.
//!
//! # Examples
//!
//! ```rust
//! use zroute::{Config, Router};
//!
//! let router = Router::new(Config::default().with_bits_per_dim(8))?;
//! router.register_host("shard-a".into());
//! router.register_host("shard-b".into());
//!
//! let owner = router.route_get(&[3, 4])?;
//! let hosts = router.route_range(&[0, 0], &[16, 16])?;
//! assert!(hosts.contains(&owner));
//! # Ok::<(), zroute::ZrouteError>(())
//! ```

use crate::address::Address;
use crate::builder::RouterBuilder;
use crate::canonical_box::CanonicalBox;
use crate::config::Config;
use crate::decompose::{RangeDecomposer, coalesce};
use crate::error::{Result, ZrouteError};
use crate::ordering::{HostOrdering, Lexicographic};
use crate::partition::PartitionTree;
use crate::snapshot::RoutingSnapshot;
use parking_lot::RwLock;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use zroute_types::host::HostId;
use zroute_types::rect::KeyRect;
use zroute_types::space::SpaceConfig;

/// Straddling dimensions beyond which a pruning box is routed to every host.
const MAX_SIGN_SPLIT_DIMS: usize = 10;

/// One immutable generation of the routing topology.
#[derive(Debug, Clone)]
pub struct Topology {
    tree: Arc<PartitionTree>,
    version: u64,
}

impl Topology {
    pub fn tree(&self) -> &PartitionTree {
        &self.tree
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// The generation after this one, holding `tree`. Versions wrap around
    /// rather than overflow.
    fn succeed(&self, tree: PartitionTree) -> Topology {
        let version = self.version.wrapping_add(1);
        if version == 0 {
            log::warn!("Topology version wrapped around to 0");
        }
        Topology {
            tree: Arc::new(tree),
            version,
        }
    }
}

/// Thread-safe router over a shared, swappable topology.
///
/// Cloning a `Router` yields a handle onto the same topology.
#[derive(Clone)]
pub struct Router {
    decomposer: RangeDecomposer,
    config: Config,
    topology: Arc<RwLock<Arc<Topology>>>,
}

impl Router {
    /// Create a router with no hosts and the lexicographic host ordering.
    pub fn new(config: Config) -> Result<Self> {
        Self::with_ordering(config, Arc::new(Lexicographic))
    }

    pub fn with_ordering(config: Config, ordering: Arc<dyn HostOrdering>) -> Result<Self> {
        config.validate().map_err(ZrouteError::InvalidConfig)?;
        let tree = PartitionTree::with_ordering(config.space(), ordering)?;
        Self::from_parts(config, tree, 0)
    }

    pub fn builder() -> RouterBuilder {
        RouterBuilder::new()
    }

    pub(crate) fn from_parts(config: Config, tree: PartitionTree, version: u64) -> Result<Self> {
        Ok(Self {
            decomposer: RangeDecomposer::new(config.space())?,
            config,
            topology: Arc::new(RwLock::new(Arc::new(Topology {
                tree: Arc::new(tree),
                version,
            }))),
        })
    }

    /// Rebuild a router from a shipped snapshot. Hosts are re-sorted with
    /// `ordering`; duplicates collapse.
    pub fn from_snapshot(
        snapshot: RoutingSnapshot,
        ordering: Arc<dyn HostOrdering>,
    ) -> Result<Self> {
        snapshot.validate()?;
        let config = Config::from(snapshot.space());
        let tree = PartitionTree::from_hosts(snapshot.space(), ordering, snapshot.hosts)?;
        Self::from_parts(config, tree, snapshot.version)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn space(&self) -> SpaceConfig {
        self.config.space()
    }

    pub fn decomposer(&self) -> &RangeDecomposer {
        &self.decomposer
    }

    /// The current topology generation. Route against it directly to get
    /// several answers from one consistent view.
    pub fn topology(&self) -> Arc<Topology> {
        self.topology.read().clone()
    }

    /// Host owning the point `key`.
    pub fn route_get(&self, key: &[i64]) -> Result<HostId> {
        self.topology().tree.route_key(key).cloned()
    }

    /// Hosts that may hold keys of the rectangle spanned by `start` and `end`.
    ///
    /// Both corners' owners are always part of the answer.
    pub fn route_range(&self, start: &[i64], end: &[i64]) -> Result<Vec<HostId>> {
        let cover = self.decomposer.rect_cover(start, end)?;
        self.resolve(cover)
    }

    pub fn route_rect(&self, rect: &KeyRect) -> Result<Vec<HostId>> {
        self.route_range(&rect.start, &rect.end)
    }

    /// Hosts owning any address of the closed interval `[lo, hi]`.
    pub fn route_address_range(&self, lo: &Address, hi: &Address) -> Result<Vec<HostId>> {
        let cover = self.decomposer.region_cover(lo, hi)?;
        self.resolve(cover)
    }

    /// Hosts to contact for a nearest-neighbour search whose pruning box is
    /// every key within `radius` of `center` on each axis.
    ///
    /// The box is clamped to the coordinate window and split at zero on every
    /// axis it straddles, so each piece has a well-ordered Z-order interval.
    pub fn route_around(&self, center: &[i64], radius: u64) -> Result<Vec<HostId>> {
        self.decomposer.encoder().check_dims(center)?;
        let space = self.space();
        let mut rect = KeyRect::around(center, radius);
        for (lo, hi) in rect.start.iter_mut().zip(rect.end.iter_mut()) {
            *lo = (*lo).clamp(space.coord_min(), space.coord_max());
            *hi = (*hi).clamp(space.coord_min(), space.coord_max());
        }

        let straddling = rect
            .start
            .iter()
            .zip(rect.end.iter())
            .filter(|(lo, hi)| **lo < 0 && **hi >= 0)
            .count();
        if straddling > MAX_SIGN_SPLIT_DIMS {
            log::debug!(
                "Pruning box straddles zero on {} axes, routing to all hosts",
                straddling
            );
            return self.route_all();
        }

        let mut cover = BTreeSet::new();
        for piece in split_at_sign(&rect) {
            cover.append(&mut self.decomposer.rect_cover(&piece.start, &piece.end)?);
        }
        self.resolve(cover)
    }

    /// Hosts owning any of `boxes`, resolved conservatively.
    pub fn route_boxes<'a, I>(&self, boxes: I) -> Result<Vec<HostId>>
    where
        I: IntoIterator<Item = &'a CanonicalBox>,
    {
        self.topology().tree.route_boxes(boxes)
    }

    /// Every registered host, for queries that cannot be pruned.
    pub fn route_all(&self) -> Result<Vec<HostId>> {
        let topology = self.topology();
        if topology.tree.is_empty() {
            return Err(ZrouteError::EmptyTopology);
        }
        Ok(topology.tree.hosts().to_vec())
    }

    /// Registered hosts in policy order.
    pub fn hosts(&self) -> Vec<HostId> {
        self.topology().tree.hosts().to_vec()
    }

    pub fn host_count(&self) -> usize {
        self.topology().tree.len()
    }

    /// Host-join notification. Returns `false` for an already known host.
    pub fn register_host(&self, host: HostId) -> bool {
        let mut current = self.topology.write();
        if current.tree.contains(&host) {
            return false;
        }
        let mut tree = PartitionTree::clone(&current.tree);
        log::info!("Registering host {} ({} hosts before)", host, tree.len());
        tree.add(host);
        *current = Arc::new(current.succeed(tree));
        true
    }

    /// Host-leave notification. Returns `false` for an unknown host.
    pub fn unregister_host(&self, host: &HostId) -> bool {
        let mut current = self.topology.write();
        if !current.tree.contains(host) {
            return false;
        }
        let mut tree = PartitionTree::clone(&current.tree);
        log::info!("Unregistering host {} ({} hosts before)", host, tree.len());
        tree.remove(host);
        *current = Arc::new(current.succeed(tree));
        true
    }

    /// Replace the whole host set, e.g. with the membership service's view at
    /// startup. Returns `false` if the set is unchanged.
    pub fn reset_hosts<I>(&self, hosts: I) -> bool
    where
        I: IntoIterator<Item = HostId>,
    {
        let mut current = self.topology.write();
        let mut tree = PartitionTree::clone(&current.tree);
        tree.reset(hosts);
        if tree.hosts() == current.tree.hosts() {
            return false;
        }
        log::info!(
            "Resetting topology: {} hosts -> {} hosts",
            current.tree.len(),
            tree.len()
        );
        *current = Arc::new(current.succeed(tree));
        true
    }

    /// Topology version; bumped on every effective membership change.
    pub fn version(&self) -> u64 {
        self.topology.read().version
    }

    /// Adopt an externally assigned topology version.
    pub fn set_version(&self, version: u64) {
        let mut current = self.topology.write();
        if version < current.version {
            log::warn!(
                "Topology version moving backwards from {} to {}",
                current.version,
                version
            );
        }
        *current = Arc::new(Topology {
            tree: Arc::clone(&current.tree),
            version,
        });
    }

    pub fn snapshot(&self) -> RoutingSnapshot {
        let topology = self.topology();
        RoutingSnapshot::new(
            self.space(),
            topology.tree.hosts().to_vec(),
            topology.version,
        )
    }

    fn resolve(&self, cover: BTreeSet<CanonicalBox>) -> Result<Vec<HostId>> {
        let cover = if self.config.coalesce_ranges {
            coalesce(cover)
        } else {
            cover
        };
        self.topology().tree.route_boxes(&cover)
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let topology = self.topology();
        f.debug_struct("Router")
            .field("config", &self.config)
            .field("version", &topology.version)
            .field("hosts", &topology.tree.len())
            .finish()
    }
}

/// Split `rect` at zero on every axis where it spans both signs.
fn split_at_sign(rect: &KeyRect) -> Vec<KeyRect> {
    let mut pieces = vec![rect.clone()];
    for axis in 0..rect.dims() {
        let (lo, hi) = (rect.start[axis], rect.end[axis]);
        if lo >= 0 || hi < 0 {
            continue;
        }
        pieces = pieces
            .into_iter()
            .flat_map(|piece| {
                let mut negative = piece.clone();
                negative.end[axis] = -1;
                let mut positive = piece;
                positive.start[axis] = 0;
                [negative, positive]
            })
            .collect();
    }
    pieces
}
