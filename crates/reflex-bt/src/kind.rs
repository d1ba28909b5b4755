use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Maximum number of children a node may have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Capacity {
    Leaf,
    Single,
    Unbounded,
}

impl Capacity {
    pub fn limit(self) -> Option<usize> {
        match self {
            Capacity::Leaf => Some(0),
            Capacity::Single => Some(1),
            Capacity::Unbounded => None,
        }
    }

    /// Authoring-side encoding: `0`, `1`, `-1`.
    pub fn raw(self) -> i32 {
        match self {
            Capacity::Leaf => 0,
            Capacity::Single => 1,
            Capacity::Unbounded => -1,
        }
    }

    pub fn from_raw(raw: i32) -> Option<Self> {
        match raw {
            0 => Some(Capacity::Leaf),
            1 => Some(Capacity::Single),
            -1 => Some(Capacity::Unbounded),
            _ => None,
        }
    }

    /// Whether a node holding `count` children may take one more.
    pub fn admits(self, count: usize) -> bool {
        self.limit().map_or(true, |limit| count < limit)
    }

    pub fn allows(self, count: usize) -> bool {
        self.limit().map_or(true, |limit| count <= limit)
    }
}

impl fmt::Display for Capacity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capacity::Leaf => f.write_str("leaf"),
            Capacity::Single => f.write_str("single"),
            Capacity::Unbounded => f.write_str("unbounded"),
        }
    }
}

/// Closed set of node kinds. The capacity of each kind is fixed here and
/// cannot be overridden by a concrete behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum NodeKind {
    Root,
    Action,
    Decorator,
    Composite,
}

impl NodeKind {
    pub const fn capacity(self) -> Capacity {
        match self {
            NodeKind::Root | NodeKind::Decorator => Capacity::Single,
            NodeKind::Action => Capacity::Leaf,
            NodeKind::Composite => Capacity::Unbounded,
        }
    }

    pub fn is_root(self) -> bool {
        self == NodeKind::Root
    }

    /// Kind implied by an authored capacity and root flag. A root must be
    /// `Single`.
    pub fn from_capacity(capacity: Capacity, is_root: bool) -> Option<Self> {
        match (capacity, is_root) {
            (Capacity::Single, true) => Some(NodeKind::Root),
            (_, true) => None,
            (Capacity::Leaf, false) => Some(NodeKind::Action),
            (Capacity::Single, false) => Some(NodeKind::Decorator),
            (Capacity::Unbounded, false) => Some(NodeKind::Composite),
        }
    }
}
