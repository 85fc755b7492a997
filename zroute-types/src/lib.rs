//! # zroute-types
//!
//! Core value types shared between the zroute partitioning layer and its
//! collaborators (membership service, request dispatch).
//!
//! - **Host identity**: `HostId`
//! - **Key-space shape**: `SpaceConfig`
//! - **Query rectangles**: `KeyRect`
//!
//! All types are serializable with Serde.
//!
//! ## Examples
//!
//! ```rust
//! use zroute_types::host::HostId;
//! use zroute_types::rect::KeyRect;
//! use zroute_types::space::SpaceConfig;
//!
//! let space = SpaceConfig::new(2, 16);
//! assert_eq!(space.width(), 32);
//!
//! let host = HostId::from("shard-a:7000");
//! assert_eq!(host.as_str(), "shard-a:7000");
//!
//! let rect = KeyRect::new(vec![0, 0], vec![10, 10]);
//! assert!(rect.contains(&[5, 5]));
//! ```

pub mod host;
pub mod rect;
pub mod space;
