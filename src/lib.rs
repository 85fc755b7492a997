//! Key-space partitioning and range decomposition for a distributed spatial index.
//!
//! ## Features
//! - **Z-order addressing**: D-dimensional signed integer keys interleaved into
//!   fixed-width Morton addresses
//! - **Partition tree**: a balanced binary trie laying a dynamic host set over
//!   the address space
//! - **Range decomposition**: any address interval or key rectangle expressed as
//!   at most `2 × width` canonical boxes
//! - **Versioned topology**: lock-protected snapshots with a version number for
//!   staleness checks
//!
//! This crate only answers "which hosts"; it performs no I/O.
//!
//! ```rust
//! use zroute::{Config, Router};
//!
//! let router = Router::builder()
//!     .config(Config::default().with_dims(3).with_bits_per_dim(16))
//!     .hosts(["10.0.0.1:7000", "10.0.0.2:7000", "10.0.0.3:7000"])
//!     .build()?;
//!
//! let owner = router.route_get(&[12, 40, 7])?;
//! let candidates = router.route_range(&[0, 0, 0], &[100, 100, 100])?;
//! assert!(candidates.contains(&owner));
//!
//! // Host set changed: the version moves on.
//! let seen = router.version();
//! router.register_host("10.0.0.4:7000".into());
//! assert!(router.version() > seen);
//! # Ok::<(), zroute::ZrouteError>(())
//! ```

pub mod address;
pub mod builder;
pub mod canonical_box;
pub mod config;
pub mod decompose;
pub mod error;
pub mod morton;
pub mod ordering;
pub mod partition;
pub mod router;
pub mod snapshot;

pub use address::Address;
pub use builder::RouterBuilder;
pub use canonical_box::CanonicalBox;
pub use config::{Config, HostId, KeyRect, SpaceConfig};
pub use decompose::{RangeDecomposer, coalesce};
pub use error::{Result, ZrouteError};
pub use morton::MortonEncoder;
pub use ordering::{HostOrdering, Lexicographic, OrderBy};
pub use partition::PartitionTree;
pub use router::{Router, Topology};
pub use snapshot::RoutingSnapshot;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {
    pub use crate::{Result, Router, RouterBuilder, ZrouteError};
    pub use crate::{Address, CanonicalBox, MortonEncoder, RangeDecomposer};
    pub use crate::{Config, HostId, KeyRect, SpaceConfig};
    pub use crate::{HostOrdering, Lexicographic};
    pub use std::sync::Arc;
}
