//! Partition tree: a balanced binary trie assigning address space to hosts.
//!
//! The trie is rebuilt from scratch whenever membership changes by splitting
//! the sorted host sequence at its midpoint (left half under the `0` child,
//! right half under the `1` child) until each leaf holds one host. Leaf paths
//! are therefore positional; a lookup gives them geometric meaning by
//! following the key's own Morton bits from the top level down.
//!
//! Nodes live in a flat arena addressed by index. Each node records its parent
//! and the contiguous run of the sorted host sequence stored below it, which
//! turns "every host under this box" into a single range lookup.

use crate::address::Address;
use crate::canonical_box::CanonicalBox;
use crate::error::{Result, ZrouteError};
use crate::morton::MortonEncoder;
use crate::ordering::{HostOrdering, Lexicographic};
use rustc_hash::FxHashSet;
use smallvec::SmallVec;
use std::fmt;
use std::ops::Range;
use std::sync::Arc;
use zroute_types::host::HostId;
use zroute_types::space::SpaceConfig;

pub type NodeIdx = u32;

const ROOT: NodeIdx = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeKind {
    Leaf,
    Branch { zero: NodeIdx, one: NodeIdx },
}

#[derive(Debug, Clone, Copy)]
struct TrieNode {
    parent: Option<NodeIdx>,
    kind: NodeKind,
    /// Hosts stored below this node, as indices into the sorted sequence.
    first: u32,
    end: u32,
}

impl TrieNode {
    fn span(&self) -> Range<usize> {
        self.first as usize..self.end as usize
    }
}

#[derive(Clone)]
pub struct PartitionTree {
    encoder: MortonEncoder,
    ordering: Arc<dyn HostOrdering>,
    hosts: Vec<HostId>,
    nodes: Vec<TrieNode>,
    /// Arena index of each host's leaf, parallel to `hosts`.
    leaves: Vec<NodeIdx>,
    depth: usize,
}

impl PartitionTree {
    /// Empty tree with the default lexicographic host ordering.
    pub fn new(space: SpaceConfig) -> Result<Self> {
        Self::with_ordering(space, Arc::new(Lexicographic))
    }

    pub fn with_ordering(space: SpaceConfig, ordering: Arc<dyn HostOrdering>) -> Result<Self> {
        Ok(Self {
            encoder: MortonEncoder::new(space)?,
            ordering,
            hosts: Vec::new(),
            nodes: Vec::new(),
            leaves: Vec::new(),
            depth: 0,
        })
    }

    /// Build a tree over a full host set in one rebuild. Duplicates collapse.
    pub fn from_hosts<I>(
        space: SpaceConfig,
        ordering: Arc<dyn HostOrdering>,
        hosts: I,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = HostId>,
    {
        let mut tree = Self::with_ordering(space, ordering)?;
        tree.reset(hosts);
        Ok(tree)
    }

    /// Replace the whole host set in one rebuild. Duplicates collapse.
    pub fn reset<I>(&mut self, hosts: I)
    where
        I: IntoIterator<Item = HostId>,
    {
        let mut hosts: Vec<HostId> = hosts.into_iter().collect();
        hosts.sort_by(|a, b| self.ordering.compare(a, b));
        hosts.dedup_by(|a, b| self.ordering.compare(a, b).is_eq());
        self.hosts = hosts;
        self.rebuild();
    }

    pub fn space(&self) -> SpaceConfig {
        self.encoder.space()
    }

    pub fn ordering(&self) -> &Arc<dyn HostOrdering> {
        &self.ordering
    }

    /// Registered hosts in policy order (the leaf order of the trie).
    pub fn hosts(&self) -> &[HostId] {
        &self.hosts
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    /// Depth of the deepest leaf: `ceil(log2(len))`.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn contains(&self, host: &HostId) -> bool {
        self.position(host).is_ok()
    }

    /// Insert `host` and rebuild. Returns `false` if it was already present.
    pub fn add(&mut self, host: HostId) -> bool {
        match self.position(&host) {
            Ok(_) => false,
            Err(at) => {
                self.hosts.insert(at, host);
                self.rebuild();
                true
            }
        }
    }

    /// Remove `host` and rebuild. Returns `false` if it was not present.
    pub fn remove(&mut self, host: &HostId) -> bool {
        match self.position(host) {
            Ok(at) => {
                self.hosts.remove(at);
                self.rebuild();
                true
            }
            Err(_) => false,
        }
    }

    /// Host owning the point `key`.
    pub fn route_key(&self, key: &[i64]) -> Result<&HostId> {
        self.encoder.check_dims(key)?;
        let width = self.encoder.width();
        self.walk(|level| level < width && self.encoder.key_bit(key, level))
    }

    /// Host owning an already encoded full-width address.
    pub fn route_address(&self, addr: &Address) -> Result<&HostId> {
        if addr.width() != self.encoder.width() {
            return Err(ZrouteError::InvalidAddress(format!(
                "expected a {}-bit address, got {} bits",
                self.encoder.width(),
                addr.width()
            )));
        }
        self.walk(|level| addr.get(level).unwrap_or(false))
    }

    /// Every host whose leaf lies under any of `boxes`, in leaf order.
    ///
    /// Resolution is conservative: a box wider than one leaf yields every host
    /// below it. A box narrower than a leaf yields the leaf that contains it.
    pub fn route_boxes<'a, I>(&self, boxes: I) -> Result<Vec<HostId>>
    where
        I: IntoIterator<Item = &'a CanonicalBox>,
    {
        if self.hosts.is_empty() {
            return Err(ZrouteError::EmptyTopology);
        }

        let mut spans: SmallVec<[Range<usize>; 8]> = SmallVec::new();
        for cbox in boxes {
            if cbox.level() > self.encoder.width() {
                return Err(ZrouteError::InvalidAddress(format!(
                    "box {} is deeper than the {}-bit address space",
                    cbox,
                    self.encoder.width()
                )));
            }
            spans.push(self.nodes[self.box_node(cbox) as usize].span());
        }

        let mut seen: FxHashSet<usize> = FxHashSet::default();
        for span in spans {
            seen.extend(span);
        }
        let mut owners: Vec<usize> = seen.into_iter().collect();
        owners.sort_unstable();
        Ok(owners.into_iter().map(|i| self.hosts[i].clone()).collect())
    }

    /// Positional trie path of `host`'s leaf, or `None` if it is not registered.
    pub fn leaf_path(&self, host: &HostId) -> Option<Address> {
        let index = self.position(host).ok()?;
        let mut bits: SmallVec<[bool; 32]> = SmallVec::new();
        let mut child = self.leaves[index];
        while let Some(parent) = self.nodes[child as usize].parent {
            match self.nodes[parent as usize].kind {
                NodeKind::Branch { one, .. } => bits.push(one == child),
                NodeKind::Leaf => unreachable!("leaf recorded as a parent"),
            }
            child = parent;
        }
        let mut path = Address::with_capacity(bits.len());
        for bit in bits.into_iter().rev() {
            path.push(bit);
        }
        Some(path)
    }

    fn position(&self, host: &HostId) -> std::result::Result<usize, usize> {
        self.hosts
            .binary_search_by(|probe| self.ordering.compare(probe, host))
    }

    fn walk(&self, mut bit_at: impl FnMut(usize) -> bool) -> Result<&HostId> {
        if self.hosts.is_empty() {
            return Err(ZrouteError::EmptyTopology);
        }
        let mut idx = ROOT;
        let mut level = 0;
        loop {
            let node = &self.nodes[idx as usize];
            match node.kind {
                NodeKind::Leaf => return Ok(&self.hosts[node.first as usize]),
                NodeKind::Branch { zero, one } => {
                    idx = if bit_at(level) { one } else { zero };
                    level += 1;
                }
            }
        }
    }

    /// Deepest node on the path of `cbox`'s prefix, stopping early at a leaf.
    fn box_node(&self, cbox: &CanonicalBox) -> NodeIdx {
        let mut idx = ROOT;
        for bit in cbox.prefix().bits() {
            match self.nodes[idx as usize].kind {
                NodeKind::Leaf => break,
                NodeKind::Branch { zero, one } => idx = if bit { one } else { zero },
            }
        }
        idx
    }

    /// Rebuild the arena from the sorted host sequence and swap it in.
    fn rebuild(&mut self) {
        let count = self.hosts.len();
        let mut nodes: Vec<TrieNode> = Vec::with_capacity((2 * count).saturating_sub(1));
        let mut leaves: Vec<NodeIdx> = vec![ROOT; count];
        let mut depth = 0;

        if count > 0 {
            nodes.push(TrieNode {
                parent: None,
                kind: NodeKind::Leaf,
                first: 0,
                end: count as u32,
            });
            let mut pending: Vec<(NodeIdx, usize)> = vec![(ROOT, 0)];
            while let Some((idx, level)) = pending.pop() {
                let TrieNode { first, end, .. } = nodes[idx as usize];
                depth = depth.max(level);
                if end - first == 1 {
                    leaves[first as usize] = idx;
                    continue;
                }
                let mid = first + (end - first).div_ceil(2);
                let zero = nodes.len() as NodeIdx;
                let one = zero + 1;
                for (first, end) in [(first, mid), (mid, end)] {
                    nodes.push(TrieNode {
                        parent: Some(idx),
                        kind: NodeKind::Leaf,
                        first,
                        end,
                    });
                }
                nodes[idx as usize].kind = NodeKind::Branch { zero, one };
                pending.push((zero, level + 1));
                pending.push((one, level + 1));
            }
        }

        if depth > self.encoder.width() {
            log::warn!(
                "Partition trie depth {} exceeds the {}-bit address width; {} hosts cannot own point keys",
                depth,
                self.encoder.width(),
                count.saturating_sub(1usize << self.encoder.width().min(63))
            );
        }
        log::debug!(
            "Rebuilt partition trie: {} hosts, {} nodes, depth {} ({} ordering)",
            count,
            nodes.len(),
            depth,
            self.ordering.name()
        );

        self.nodes = nodes;
        self.leaves = leaves;
        self.depth = depth;
    }
}

impl fmt::Debug for PartitionTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PartitionTree")
            .field("space", &self.space())
            .field("ordering", &self.ordering.name())
            .field("hosts", &self.hosts)
            .field("depth", &self.depth)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ordering::OrderBy;

    fn tree(hosts: &[&str]) -> PartitionTree {
        let mut t = PartitionTree::new(SpaceConfig::new(2, 4)).unwrap();
        for h in hosts {
            t.add(HostId::from(*h));
        }
        t
    }

    fn path(t: &PartitionTree, host: &str) -> String {
        t.leaf_path(&HostId::from(host)).unwrap().to_string()
    }

    #[test]
    fn test_empty_topology() {
        let t = tree(&[]);
        assert_eq!(t.route_key(&[1, 2]), Err(ZrouteError::EmptyTopology));
        let root = CanonicalBox::root();
        assert_eq!(t.route_boxes([&root]), Err(ZrouteError::EmptyTopology));
    }

    #[test]
    fn test_single_host_owns_everything() {
        let t = tree(&["solo"]);
        assert_eq!(t.depth(), 0);
        assert_eq!(t.route_key(&[-8, 7]).unwrap().as_str(), "solo");
        assert_eq!(path(&t, "solo"), "");
    }

    #[test]
    fn test_balanced_split_is_positional() {
        let t = tree(&["d", "b", "a", "c", "e"]);
        assert_eq!(t.depth(), 3);
        assert_eq!(
            t.hosts().iter().map(HostId::as_str).collect::<Vec<_>>(),
            vec!["a", "b", "c", "d", "e"]
        );
        // [a b c | d e] -> [a b | c], [d | e] -> [a | b]
        assert_eq!(path(&t, "a"), "000");
        assert_eq!(path(&t, "b"), "001");
        assert_eq!(path(&t, "c"), "01");
        assert_eq!(path(&t, "d"), "10");
        assert_eq!(path(&t, "e"), "11");
    }

    #[test]
    fn test_route_key_follows_morton_bits() {
        let t = tree(&["a", "b", "c", "d"]);
        // [x, y] with 4 bits per dim: the top two address bits are the sign
        // bits of x and y.
        assert_eq!(t.route_key(&[0, 0]).unwrap().as_str(), "a");
        assert_eq!(t.route_key(&[0, -1]).unwrap().as_str(), "b");
        assert_eq!(t.route_key(&[-1, 0]).unwrap().as_str(), "c");
        assert_eq!(t.route_key(&[-1, -1]).unwrap().as_str(), "d");
        assert!(matches!(
            t.route_key(&[0]),
            Err(ZrouteError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_route_address_matches_route_key() {
        let t = tree(&["a", "b", "c", "d", "e", "f", "g"]);
        let encoder = MortonEncoder::new(t.space()).unwrap();
        for x in -8..8 {
            for y in -8..8 {
                let addr = encoder.encode(&[x, y]).unwrap();
                assert_eq!(t.route_address(&addr), t.route_key(&[x, y]));
            }
        }
        assert!(t.route_address(&"01".parse().unwrap()).is_err());
    }

    #[test]
    fn test_route_boxes_collects_hosts_under_box() {
        let t = tree(&["a", "b", "c", "d", "e"]);
        let cbox = |s: &str| s.parse::<CanonicalBox>().unwrap();
        let names = |v: Vec<HostId>| v.into_iter().map(HostId::into_inner).collect::<Vec<_>>();

        assert_eq!(names(t.route_boxes([&cbox("0")]).unwrap()), vec!["a", "b", "c"]);
        assert_eq!(names(t.route_boxes([&cbox("")]).unwrap()).len(), 5);
        // deeper than the leaf for "c"
        assert_eq!(names(t.route_boxes([&cbox("011011")]).unwrap()), vec!["c"]);
        assert_eq!(
            names(t.route_boxes([&cbox("11"), &cbox("000"), &cbox("1")]).unwrap()),
            vec!["a", "d", "e"]
        );
        assert!(t.route_boxes([&cbox(&"0".repeat(9))]).is_err());
    }

    #[test]
    fn test_add_remove_idempotent_and_restoring() {
        let mut t = tree(&["a", "b", "c"]);
        let before: Vec<_> = (-8..8)
            .map(|x| t.route_key(&[x, 3]).unwrap().clone())
            .collect();

        assert!(!t.add(HostId::from("b")));
        assert!(t.add(HostId::from("bb")));
        assert!(t.remove(&HostId::from("bb")));
        assert!(!t.remove(&HostId::from("bb")));

        let after: Vec<_> = (-8..8)
            .map(|x| t.route_key(&[x, 3]).unwrap().clone())
            .collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_custom_ordering_changes_layout() {
        let ordering = Arc::new(OrderBy::new(|a: &HostId, b: &HostId| b.cmp(a)));
        let t = PartitionTree::from_hosts(
            SpaceConfig::new(2, 4),
            ordering,
            ["a", "b", "a"].into_iter().map(HostId::from),
        )
        .unwrap();
        assert_eq!(t.len(), 2);
        assert_eq!(path(&t, "b"), "0");
        assert_eq!(path(&t, "a"), "1");
        assert!(t.leaf_path(&HostId::from("zz")).is_none());
    }

    #[test]
    fn test_more_hosts_than_addresses_still_routes() {
        let mut t = PartitionTree::new(SpaceConfig::new(1, 1)).unwrap();
        for i in 0..5 {
            t.add(HostId::new(format!("h{}", i)));
        }
        assert!(t.depth() > 1);
        assert!(t.contains(t.route_key(&[0]).unwrap()));
        assert!(t.contains(t.route_key(&[-1]).unwrap()));
    }

    #[test]
    fn test_constructors_reject_invalid_space() {
        for bits_per_dim in [0, 65] {
            let space = SpaceConfig::new(1, bits_per_dim);
            assert!(matches!(
                PartitionTree::new(space),
                Err(ZrouteError::InvalidConfig(_))
            ));
            assert!(matches!(
                PartitionTree::from_hosts(
                    space,
                    Arc::new(Lexicographic),
                    ["a", "b"].into_iter().map(HostId::from),
                ),
                Err(ZrouteError::InvalidConfig(_))
            ));
        }
    }
}
