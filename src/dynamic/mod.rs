//! Dynamic trie: a mutable, path-compressed binary radix trie.
//!
//! Each node keeps its full key from the root (`content`) and the edge bits
//! that lead to it from its parent (`segment`). Children are owned boxes;
//! there are never more than two because siblings must start with different
//! bits.
//!
//! Restructuring happens in place inside the parent's child slot:
//! - Splice: the inserted key is a strict prefix of a node, so the new node
//!   takes the old node's slot and adopts it as its only child.
//! - Split: the key and a node diverge part way through the node's segment,
//!   so an unlabeled branch node takes the slot and adopts both.
//!
//! Neither case needs a parent back-reference.

use std::fmt;
use std::mem;

use smallvec::SmallVec;

use crate::bits::{common_prefix_len, is_bit_string, BitString};
use crate::key::Label;

/// A node of the dynamic trie.
#[derive(Debug, Clone)]
pub struct Node {
    content: BitString,
    segment: BitString,
    children: SmallVec<[Box<Node>; 2]>,
    label: Option<Label>,
}

impl Node {
    fn new(content: BitString, segment: BitString, label: Option<Label>) -> Self {
        Self {
            content,
            segment,
            children: SmallVec::new(),
            label,
        }
    }

    /// Full key from the root to this node.
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// Bits added by this node on top of its parent's content.
    pub fn segment(&self) -> &[u8] {
        &self.segment
    }

    /// Label of the prefix ending here; `None` for branch nodes and an
    /// unlabeled root.
    pub fn label(&self) -> Option<Label> {
        self.label
    }

    /// Children in insertion order.
    pub fn children(&self) -> impl Iterator<Item = &Node> + '_ {
        self.children.iter().map(|c| &**c)
    }

    /// Number of children (0, 1 or 2).
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    fn parent_len(&self) -> usize {
        self.content.len() - self.segment.len()
    }
}

/// Outcome of [`DynamicTrie::insert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Insert {
    /// The key did not carry a label before.
    Added,
    /// The key was already labeled; only the label changed.
    Updated(Label),
}

enum Step {
    Relabeled(Option<Label>),
    Grew(usize),
}

/// Mutable radix trie over ASCII bit strings.
#[derive(Debug, Clone)]
pub struct DynamicTrie {
    root: Node,
    len: usize,
    nodes: usize,
}

impl DynamicTrie {
    /// Create an empty trie holding only the root.
    pub fn new() -> Self {
        Self {
            root: Node::new(BitString::new(), BitString::new(), None),
            len: 0,
            nodes: 1,
        }
    }

    /// Number of labeled prefixes.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True when no prefix carries a label.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of nodes, root included.
    pub fn node_count(&self) -> usize {
        self.nodes
    }

    /// The root node. Its segment is always empty.
    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Bind `label` to `key`, restructuring the trie as needed.
    ///
    /// Inserting an existing key only replaces its label.
    pub fn insert(&mut self, key: &[u8], label: Label) -> Insert {
        debug_assert!(is_bit_string(key), "keys must be ASCII bit strings");

        match insert_at(&mut self.root, key, label) {
            Step::Relabeled(Some(old)) => Insert::Updated(old),
            Step::Relabeled(None) => {
                self.len += 1;
                Insert::Added
            }
            Step::Grew(nodes) => {
                self.nodes += nodes;
                self.len += 1;
                Insert::Added
            }
        }
    }

    /// Exact-match read.
    pub fn get(&self, key: &[u8]) -> Option<Label> {
        let mut node = &self.root;
        loop {
            if node.content == key {
                return node.label;
            }
            let depth = node.content.len();
            let next = key.get(depth)?;
            node = node
                .children()
                .find(|c| c.segment.first() == Some(next))?;
            if !key.starts_with(&node.content) {
                return None;
            }
        }
    }

    /// All keys bound to `label`, in depth-first order.
    pub fn prefixes_with_label(&self, label: Label) -> Vec<BitString> {
        let mut out = Vec::new();
        let mut stack = vec![&self.root];
        while let Some(node) = stack.pop() {
            if node.label == Some(label) {
                out.push(node.content.clone());
            }
            stack.extend(node.children.iter().rev().map(|c| &**c));
        }
        out
    }

    /// Every `(key, label)` pair, in depth-first order.
    pub fn routes(&self) -> Vec<(BitString, Label)> {
        let mut out = Vec::with_capacity(self.len);
        let mut stack = vec![&self.root];
        while let Some(node) = stack.pop() {
            if let Some(label) = node.label {
                out.push((node.content.clone(), label));
            }
            stack.extend(node.children.iter().rev().map(|c| &**c));
        }
        out
    }

    /// Drop every node and start over.
    pub fn clear(&mut self) {
        *self = Self::new();
    }

    /// Write an indented tree listing: `ROOT`, then one line per node with
    /// `-` per depth level, children in bit order. `full` prints whole keys
    /// instead of segments.
    pub fn dump(&self, out: &mut impl fmt::Write, full: bool) -> fmt::Result {
        dump_node(out, &self.root, 0, full)
    }
}

impl Default for DynamicTrie {
    fn default() -> Self {
        Self::new()
    }
}

fn insert_at(node: &mut Node, key: &[u8], label: Label) -> Step {
    if node.content == key {
        return Step::Relabeled(node.label.replace(label));
    }

    let m = common_prefix_len(key, &node.content);

    if m == node.content.len() {
        // node.content is a strict prefix of key (always true at the root).
        // At most one child starts with key[m].
        let next = key[m];
        if let Some(child) = node
            .children
            .iter_mut()
            .find(|c| c.segment.first() == Some(&next))
        {
            return insert_at(child, key, label);
        }
        node.children
            .push(Box::new(Node::new(key.to_vec(), key[m..].to_vec(), Some(label))));
        return Step::Grew(1);
    }

    // Only reachable below the root: we descended here because the node's
    // segment starts with the key's next bit.
    let parent_len = node.parent_len();
    debug_assert!(m > parent_len);

    if m == key.len() {
        // Splice. Every child extends node.content beyond the end of key,
        // so there is nothing deeper to descend into.
        let spliced = Node::new(key.to_vec(), key[parent_len..].to_vec(), Some(label));
        let mut old = mem::replace(node, spliced);
        old.segment = old.content[m..].to_vec();
        node.children.push(Box::new(old));
        return Step::Grew(1);
    }

    // Split on the first differing bit.
    let branch = Node::new(key[..m].to_vec(), key[parent_len..m].to_vec(), None);
    let mut old = mem::replace(node, branch);
    old.segment = old.content[m..].to_vec();
    node.children.push(Box::new(old));
    node.children
        .push(Box::new(Node::new(key.to_vec(), key[m..].to_vec(), Some(label))));
    Step::Grew(2)
}

fn dump_node(out: &mut impl fmt::Write, node: &Node, level: usize, full: bool) -> fmt::Result {
    for _ in 0..level {
        out.write_char('-')?;
    }
    let bits = if full { &node.content } else { &node.segment };
    let bits = String::from_utf8_lossy(bits);
    match node.label {
        _ if level == 0 => writeln!(out, "ROOT")?,
        None => writeln!(out, " {} [node]", bits)?,
        Some(label) => writeln!(out, " {} => {}", bits, label)?,
    }
    for bit in [b'0', b'1'] {
        if let Some(child) = node.children().find(|c| c.segment.first() == Some(&bit)) {
            dump_node(out, child, level + 1, full)?;
        }
    }
    Ok(())
}
