//! Prefix-identified regions of the address space.

use crate::address::Address;
use crate::error::Result;
use std::fmt;
use std::str::FromStr;

/// All full-width addresses sharing one bit prefix.
///
/// Two boxes are either disjoint or nested; nesting is exactly the prefix
/// relation between their identifying bit strings. Ordering follows the
/// prefix's lexicographic order, so a box sorts right before its descendants.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct CanonicalBox {
    prefix: Address,
}

impl CanonicalBox {
    pub fn new(prefix: Address) -> Self {
        Self { prefix }
    }

    /// The whole universe (empty prefix).
    pub fn root() -> Self {
        Self::default()
    }

    pub fn prefix(&self) -> &Address {
        &self.prefix
    }

    pub fn into_prefix(self) -> Address {
        self.prefix
    }

    /// Prefix length. Larger levels denote smaller regions.
    pub fn level(&self) -> usize {
        self.prefix.width()
    }

    pub fn child(&self, bit: bool) -> Self {
        Self::new(self.prefix.with_bit(bit))
    }

    pub fn parent(&self) -> Option<Self> {
        (!self.prefix.is_empty()).then(|| Self::new(self.prefix.prefix(self.level() - 1)))
    }

    /// The other child of this box's parent.
    pub fn sibling(&self) -> Option<Self> {
        let last = self.level().checked_sub(1)?;
        Some(Self::new(
            self.prefix.with_bit_at(last, !self.prefix.bit(last)),
        ))
    }

    /// Strict ancestry: `self` contains `other` and is not equal to it.
    pub fn is_ancestor_of(&self, other: &CanonicalBox) -> bool {
        self.level() < other.level() && self.prefix.is_prefix_of(&other.prefix)
    }

    pub fn contains(&self, addr: &Address) -> bool {
        self.prefix.is_prefix_of(addr)
    }

    /// Smallest address of the given width inside the box.
    pub fn lower_bound(&self, width: usize) -> Address {
        let mut addr = self.prefix.prefix(width);
        while addr.width() < width {
            addr.push(false);
        }
        addr
    }

    /// Largest address of the given width inside the box.
    pub fn upper_bound(&self, width: usize) -> Address {
        let mut addr = self.prefix.prefix(width);
        while addr.width() < width {
            addr.push(true);
        }
        addr
    }
}

impl From<Address> for CanonicalBox {
    fn from(prefix: Address) -> Self {
        Self::new(prefix)
    }
}

impl FromStr for CanonicalBox {
    type Err = crate::error::ZrouteError;

    fn from_str(s: &str) -> Result<Self> {
        Ok(Self::new(s.parse()?))
    }
}

impl fmt::Display for CanonicalBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.prefix.is_empty() {
            f.write_str("*")
        } else {
            write!(f, "{}*", self.prefix)
        }
    }
}

impl fmt::Debug for CanonicalBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CanonicalBox(\"{}\")", self.prefix)
    }
}
