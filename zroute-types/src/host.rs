use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Opaque identifier of a shard-owning process.
///
/// Host ids are compared only through the ordering policy installed on the
/// partition tree; the string content carries no meaning for routing.
///
/// # Examples
///
/// ```
/// use zroute_types::host::HostId;
///
/// let a = HostId::new("10.0.0.1:7000");
/// let b: HostId = "10.0.0.1:7000".into();
/// assert_eq!(a, b);
/// assert_eq!(a.to_string(), "10.0.0.1:7000");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HostId(String);

impl HostId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for HostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for HostId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for HostId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl AsRef<str> for HostId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for HostId {
    fn borrow(&self) -> &str {
        &self.0
    }
}
