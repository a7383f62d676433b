//! Static trie: the immutable, arena-backed form used for lookups.
//!
//! All nodes live in one `Vec`, root at index 0. Links are 32-bit indices.
//! A node's two child slots are addressed by the first bit of the child's
//! segment, so a lookup inspects exactly one candidate per level.
//!
//! A static trie is built once, either by flattening a [`DynamicTrie`] or by
//! parsing a persisted trie (see [`crate::persist`]), and never mutated
//! afterwards. It is `Send + Sync`; concurrent lookups need no locking.

use std::fmt;
use std::mem;

use smallvec::SmallVec;

use crate::bits::bit_slot;
use crate::dynamic::{DynamicTrie, Node};
use crate::key::Label;

/// 4-byte arena index.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct NodeIdx(u32);

impl NodeIdx {
    /// No node.
    pub const NONE: Self = NodeIdx(u32::MAX);
    /// The root is always allocated first.
    pub const ROOT: Self = NodeIdx(0);

    /// True for [`NodeIdx::NONE`].
    #[inline]
    pub fn is_none(self) -> bool {
        self == Self::NONE
    }

    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for NodeIdx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            f.write_str("NodeIdx(NONE)")
        } else {
            write!(f, "NodeIdx({})", self.0)
        }
    }
}

/// A node in the static arena.
#[derive(Debug, Clone)]
pub struct StaticNode {
    /// Edge bits from the parent. Inline up to 32 bits (any IPv4 segment).
    segment: SmallVec<[u8; 32]>,
    children: [NodeIdx; 2],
    parent: NodeIdx,
    label: Option<Label>,
}

impl StaticNode {
    /// Edge bits from the parent; empty only at the root.
    pub fn segment(&self) -> &[u8] {
        &self.segment
    }

    /// Label, or `None` for branch nodes.
    pub fn label(&self) -> Option<Label> {
        self.label
    }

    /// Child whose segment starts with `bit`, if any.
    pub fn child(&self, bit: u8) -> NodeIdx {
        bit_slot(bit).map_or(NodeIdx::NONE, |slot| self.children[slot])
    }

    /// Parent index; [`NodeIdx::NONE`] at the root.
    pub fn parent(&self) -> NodeIdx {
        self.parent
    }
}

/// Memory statistics for a static trie.
#[derive(Debug, Clone, Default)]
pub struct MemoryStats {
    /// Bytes reserved for the node arena.
    pub arena_bytes: usize,
    /// Heap bytes of segments too long to stay inline.
    pub spilled_bytes: usize,
    /// Number of nodes.
    pub nodes: usize,
    /// Total bytes per node.
    pub bytes_per_node: f64,
}

/// Immutable longest-prefix-match trie.
#[derive(Debug, Clone)]
pub struct StaticTrie {
    nodes: Vec<StaticNode>,
    len: usize,
}

impl StaticTrie {
    /// Flatten a dynamic trie depth-first. The arena is sized to
    /// `trie.node_count()` up front.
    pub fn from_dynamic(trie: &DynamicTrie) -> Self {
        let mut out = Self::with_capacity(trie.node_count());
        let root = out.push_root(trie.root().label());
        out.flatten(trie.root(), root);
        debug_assert_eq!(out.node_count(), trie.node_count());
        out
    }

    fn flatten(&mut self, node: &Node, at: NodeIdx) {
        for child in node.children() {
            let idx = self.push_child(at, child.segment(), child.label());
            self.flatten(child, idx);
        }
    }

    pub(crate) fn with_capacity(nodes: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(nodes),
            len: 0,
        }
    }

    pub(crate) fn push_root(&mut self, label: Option<Label>) -> NodeIdx {
        debug_assert!(self.nodes.is_empty());
        self.push(StaticNode {
            segment: SmallVec::new(),
            children: [NodeIdx::NONE; 2],
            parent: NodeIdx::NONE,
            label,
        })
    }

    /// Append a child under `parent`. The caller guarantees the segment is a
    /// non-empty bit string and that the matching slot is still free.
    pub(crate) fn push_child(
        &mut self,
        parent: NodeIdx,
        segment: &[u8],
        label: Option<Label>,
    ) -> NodeIdx {
        let slot = segment
            .first()
            .and_then(|&b| bit_slot(b))
            .unwrap_or_default();
        debug_assert!(!segment.is_empty());
        debug_assert!(self.nodes[parent.index()].children[slot].is_none());

        let idx = self.push(StaticNode {
            segment: SmallVec::from_slice(segment),
            children: [NodeIdx::NONE; 2],
            parent,
            label,
        });
        self.nodes[parent.index()].children[slot] = idx;
        idx
    }

    fn push(&mut self, node: StaticNode) -> NodeIdx {
        let idx = NodeIdx(self.nodes.len() as u32);
        if node.label.is_some() {
            self.len += 1;
        }
        self.nodes.push(node);
        idx
    }

    /// Node at `idx`. Panics on [`NodeIdx::NONE`] or an index from another trie.
    pub fn node(&self, idx: NodeIdx) -> &StaticNode {
        &self.nodes[idx.index()]
    }

    /// The root node, if the arena is populated.
    pub fn root(&self) -> Option<&StaticNode> {
        self.nodes.first()
    }

    /// Longest-prefix match: the label of the deepest labeled node whose key
    /// is a prefix of `key`.
    ///
    /// Branch nodes on the path carry no label and are skipped in favour of
    /// the nearest labeled ancestor. A labeled root matches every key.
    pub fn find(&self, key: &[u8]) -> Option<Label> {
        let mut node = self.nodes.first()?;
        let mut best = node.label;
        let mut matched = 0;

        while let Some(&bit) = key.get(matched) {
            let next = node.child(bit);
            if next.is_none() {
                break;
            }
            let child = &self.nodes[next.index()];
            if !key[matched..].starts_with(&child.segment) {
                break;
            }
            matched += child.segment.len();
            if child.label.is_some() {
                best = child.label;
            }
            node = child;
        }

        best
    }

    /// Number of labeled nodes.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True when no node carries a label.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of nodes, root included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Get memory statistics.
    pub fn memory_usage(&self) -> MemoryStats {
        let arena_bytes = self.nodes.capacity() * mem::size_of::<StaticNode>();
        let spilled_bytes = self
            .nodes
            .iter()
            .filter(|n| n.segment.spilled())
            .map(|n| n.segment.capacity())
            .sum();
        let nodes = self.nodes.len();
        MemoryStats {
            arena_bytes,
            spilled_bytes,
            nodes,
            bytes_per_node: if nodes > 0 {
                (arena_bytes + spilled_bytes) as f64 / nodes as f64
            } else {
                0.0
            },
        }
    }

    /// Tree listing in the same layout as [`DynamicTrie::dump`] (segments only).
    /// Children are listed in bit order.
    pub fn dump(&self, out: &mut impl fmt::Write) -> fmt::Result {
        if self.nodes.is_empty() {
            return Ok(());
        }
        self.dump_node(out, NodeIdx::ROOT, 0)
    }

    fn dump_node(&self, out: &mut impl fmt::Write, idx: NodeIdx, level: usize) -> fmt::Result {
        let node = self.node(idx);
        for _ in 0..level {
            out.write_char('-')?;
        }
        let bits = String::from_utf8_lossy(&node.segment);
        match node.label {
            _ if level == 0 => writeln!(out, "ROOT")?,
            None => writeln!(out, " {} [node]", bits)?,
            Some(label) => writeln!(out, " {} => {}", bits, label)?,
        }
        for child in node.children {
            if !child.is_none() {
                self.dump_node(out, child, level + 1)?;
            }
        }
        Ok(())
    }
}
