//! Host ordering policies for the partition tree.
//!
//! The sorted host sequence decides which trie leaf each host gets, so every
//! process that routes against the same topology must install the same
//! policy.

use std::cmp::Ordering;
use std::fmt;
use zroute_types::host::HostId;

/// Total order over host ids used to lay hosts out across the trie leaves.
pub trait HostOrdering: Send + Sync {
    fn compare(&self, a: &HostId, b: &HostId) -> Ordering;

    /// Short name used in log lines.
    fn name(&self) -> &str {
        "custom"
    }
}

/// Byte-wise lexicographic order of the host id text. The default policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Lexicographic;

impl HostOrdering for Lexicographic {
    fn compare(&self, a: &HostId, b: &HostId) -> Ordering {
        a.as_str().cmp(b.as_str())
    }

    fn name(&self) -> &str {
        "lexicographic"
    }
}

/// Policy backed by a comparison closure.
///
/// # Examples
///
/// ```
/// use zroute::ordering::{HostOrdering, OrderBy};
/// use zroute_types::host::HostId;
///
/// let by_len = OrderBy::new(|a: &HostId, b: &HostId| {
///     a.as_str().len().cmp(&b.as_str().len()).then_with(|| a.cmp(b))
/// });
/// assert!(by_len.compare(&"z".into(), &"aa".into()).is_lt());
/// ```
pub struct OrderBy<F> {
    compare: F,
}

impl<F> OrderBy<F>
where
    F: Fn(&HostId, &HostId) -> Ordering + Send + Sync,
{
    pub fn new(compare: F) -> Self {
        Self { compare }
    }
}

impl<F> HostOrdering for OrderBy<F>
where
    F: Fn(&HostId, &HostId) -> Ordering + Send + Sync,
{
    fn compare(&self, a: &HostId, b: &HostId) -> Ordering {
        (self.compare)(a, b)
    }
}

impl<F> fmt::Debug for OrderBy<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrderBy").finish_non_exhaustive()
    }
}
