//! Arena-backed binary decode tree: left is dit, right is dah.

use crate::decode::table::{DAH, DIT, MORSE_TABLE};

/// Index of a node in a [`DecodeTree`].
pub type NodeId = usize;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Node {
    symbol: Option<char>,
    dit: Option<NodeId>,
    dah: Option<NodeId>,
}

/// Immutable decode tree built from a symbol table.
///
/// Node 0 is the root. Intermediate nodes on a path to a longer code exist even when
/// no symbol ends there; those carry `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeTree {
    nodes: Vec<Node>,
}

impl DecodeTree {
    pub const ROOT: NodeId = 0;

    /// Builds the tree for the international Morse table.
    pub fn new() -> Self {
        Self::from_table(MORSE_TABLE)
    }

    /// Builds a tree from `(symbol, code)` pairs. Characters other than `.` and `-`
    /// in a code are skipped.
    pub fn from_table(table: &[(char, &str)]) -> Self {
        let mut tree = Self {
            nodes: vec![Node::default()],
        };
        for &(symbol, code) in table {
            let mut cursor = Self::ROOT;
            for element in code.chars() {
                cursor = match element {
                    DIT => tree.child_or_insert(cursor, true),
                    DAH => tree.child_or_insert(cursor, false),
                    _ => continue,
                };
            }
            tree.nodes[cursor].symbol = Some(symbol);
        }
        tree
    }

    fn child_or_insert(&mut self, parent: NodeId, dit: bool) -> NodeId {
        let existing = if dit {
            self.nodes[parent].dit
        } else {
            self.nodes[parent].dah
        };
        if let Some(child) = existing {
            return child;
        }
        let child = self.nodes.len();
        self.nodes.push(Node::default());
        if dit {
            self.nodes[parent].dit = Some(child);
        } else {
            self.nodes[parent].dah = Some(child);
        }
        child
    }

    /// Left child of `node`.
    pub fn dit(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node).and_then(|n| n.dit)
    }

    /// Right child of `node`.
    pub fn dah(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node).and_then(|n| n.dah)
    }

    /// Symbol ending at `node`, if any.
    pub fn symbol(&self, node: NodeId) -> Option<char> {
        self.nodes.get(node).and_then(|n| n.symbol)
    }

    /// Follows a whole code from the root.
    pub fn walk(&self, code: &str) -> Option<NodeId> {
        code.chars().try_fold(Self::ROOT, |node, element| match element {
            DIT => self.dit(node),
            DAH => self.dah(node),
            _ => None,
        })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl Default for DecodeTree {
    fn default() -> Self {
        Self::new()
    }
}
