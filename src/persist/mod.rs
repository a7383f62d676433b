//! Persisted trie format.
//!
//! ```text
//! file := '_' <node_count> '_' node
//! node := <segment bits> '|' <label> '<' node* '>'
//! ```
//!
//! The root record comes first with an empty segment. Label `0` means "no
//! label". `node_count` counts every record, root included, and the reader
//! sizes the static arena from it, so a mismatch is rejected as corruption
//! rather than trusted.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::num::NonZeroU32;
use std::path::Path;

use memmap2::Mmap;
use tracing::debug;

use crate::bits::bit_slot;
use crate::dynamic::{DynamicTrie, Node};
use crate::error::{Error, Result};
use crate::frozen::{NodeIdx, StaticTrie};
use crate::key::Label;

/// Separates a record's segment from its label.
pub const SEP: u8 = b'|';
/// Delimits the node-count header.
pub const SEP_META: u8 = b'_';
/// Opens a record's child list.
pub const SEP_CHILD_START: u8 = b'<';
/// Closes a record's child list.
pub const SEP_CHILD_END: u8 = b'>';

/// Smallest possible record: `|0<>` for the root, one byte more elsewhere.
const MIN_RECORD_LEN: usize = 4;

/// Serialize a dynamic trie. Returns the number of records written.
pub fn write<W: Write>(trie: &DynamicTrie, mut out: W) -> io::Result<usize> {
    write!(out, "_{}_", trie.node_count())?;
    let written = write_node(&mut out, trie.root())?;
    debug_assert_eq!(written, trie.node_count());
    out.flush()?;
    Ok(written)
}

fn write_node<W: Write>(out: &mut W, node: &Node) -> io::Result<usize> {
    out.write_all(node.segment())?;
    write!(out, "|{}<", node.label().map_or(0, NonZeroU32::get))?;
    let mut total = 1;
    for child in node.children() {
        total += write_node(out, child)?;
    }
    out.write_all(&[SEP_CHILD_END])?;
    Ok(total)
}

/// Serialize a static trie in the same format. Children come out in bit
/// order, so the output is canonical for a given set of routes.
pub fn write_static<W: Write>(trie: &StaticTrie, mut out: W) -> io::Result<usize> {
    write!(out, "_{}_", trie.node_count())?;
    let written = if trie.root().is_some() {
        write_static_node(&mut out, trie, NodeIdx::ROOT)?
    } else {
        0
    };
    out.flush()?;
    Ok(written)
}

fn write_static_node<W: Write>(out: &mut W, trie: &StaticTrie, idx: NodeIdx) -> io::Result<usize> {
    let node = trie.node(idx);
    out.write_all(node.segment())?;
    write!(out, "|{}<", node.label().map_or(0, NonZeroU32::get))?;
    let mut total = 1;
    for bit in [b'0', b'1'] {
        let child = node.child(bit);
        if !child.is_none() {
            total += write_static_node(out, trie, child)?;
        }
    }
    out.write_all(&[SEP_CHILD_END])?;
    Ok(total)
}

/// Write a dynamic trie to `path`. The file is written beside the target and
/// renamed into place, so readers never see a half-written trie. A failed
/// save leaves no partial file behind.
pub fn save(trie: &DynamicTrie, path: impl AsRef<Path>) -> Result<usize> {
    let path = path.as_ref();
    let mut partial = path.as_os_str().to_owned();
    partial.push(".partial");

    let written = File::create(&partial)
        .and_then(|file| write(trie, BufWriter::new(file)))
        .and_then(|written| fs::rename(&partial, path).map(|()| written));
    let written = match written {
        Ok(written) => written,
        Err(err) => {
            let _ = fs::remove_file(&partial);
            return Err(err.into());
        }
    };
    debug!(path = %path.display(), nodes = written, "saved trie");
    Ok(written)
}

/// Memory-map `path` and parse it into a static trie whose keys are at
/// most `max_bits` long.
pub fn load(path: impl AsRef<Path>, max_bits: usize) -> Result<StaticTrie> {
    let path = path.as_ref();
    let file = File::open(path)?;
    // SAFETY: the map is read-only and dropped before returning. Persisted
    // tries are replaced by rename, never rewritten in place.
    let map = unsafe { Mmap::map(&file)? };
    let trie = parse(&map, max_bits)?;
    debug!(path = %path.display(), nodes = trie.node_count(), "loaded trie");
    Ok(trie)
}

/// Parse a persisted trie straight into a static arena.
///
/// `max_bits` is the key width of the trie's address family. A record whose
/// full key would be longer is corruption: the file belongs to another
/// family or was damaged.
pub fn parse(input: &[u8], max_bits: usize) -> Result<StaticTrie> {
    let mut p = Parser { input, pos: 0 };

    let declared = p.header()?;
    if declared == 0 {
        return Err(p.corrupt("header declares no nodes"));
    }
    if declared > p.remaining() / MIN_RECORD_LEN + 1 {
        return Err(p.corrupt("header declares more nodes than the file can hold"));
    }

    let mut trie = StaticTrie::with_capacity(declared);

    let segment = p.segment()?;
    if !segment.is_empty() {
        return Err(p.corrupt_at(p.pos - 1, "root record has a segment"));
    }
    let label = p.label()?;
    let mut current = trie.push_root(label);
    // Key length of every record on the path from the root to `current`.
    let mut depths = vec![0usize];

    // Each record leaves `current` pointing at itself; each '>' pops back to
    // the parent. The root's '>' ends the body.
    loop {
        match p.peek() {
            Some(SEP_CHILD_END) => {
                p.pos += 1;
                if current == NodeIdx::ROOT {
                    break;
                }
                depths.pop();
                current = trie.node(current).parent();
            }
            Some(_) => {
                let start = p.pos;
                let segment = p.segment()?;
                let Some(&first) = segment.first() else {
                    return Err(p.corrupt_at(start, "empty segment below the root"));
                };
                let label = p.label()?;
                if !trie.node(current).child(first).is_none() {
                    return Err(p.corrupt_at(start, "sibling records start with the same bit"));
                }
                if trie.node_count() == declared {
                    return Err(p.corrupt_at(start, "more records than the header declares"));
                }
                let depth = depths.last().copied().unwrap_or(0) + segment.len();
                if depth > max_bits {
                    return Err(p.corrupt_at(start, "key is longer than the address width"));
                }
                depths.push(depth);
                current = trie.push_child(current, segment, label);
            }
            None => return Err(p.corrupt("unexpected end of input inside a record")),
        }
    }

    if p.input[p.pos..].iter().any(|b| !b.is_ascii_whitespace()) {
        return Err(p.corrupt("trailing bytes after the root record"));
    }
    if trie.node_count() != declared {
        return Err(Error::NodeCountMismatch {
            declared,
            actual: trie.node_count(),
        });
    }

    Ok(trie)
}

struct Parser<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn remaining(&self) -> usize {
        self.input.len() - self.pos
    }

    fn expect(&mut self, byte: u8, reason: &'static str) -> Result<()> {
        if self.peek() != Some(byte) {
            return Err(self.corrupt(reason));
        }
        self.pos += 1;
        Ok(())
    }

    /// Decimal digits up to (not including) `end`, which is consumed.
    fn number(&mut self, end: u8, reason: &'static str) -> Result<u32> {
        let start = self.pos;
        let mut value: u32 = 0;
        while let Some(b) = self.peek() {
            if b == end {
                break;
            }
            if !b.is_ascii_digit() {
                return Err(self.corrupt(reason));
            }
            value = value
                .checked_mul(10)
                .and_then(|v| v.checked_add(u32::from(b - b'0')))
                .ok_or_else(|| self.corrupt_at(start, reason))?;
            self.pos += 1;
        }
        if self.pos == start {
            return Err(self.corrupt(reason));
        }
        self.expect(end, reason)?;
        Ok(value)
    }

    fn header(&mut self) -> Result<usize> {
        self.expect(SEP_META, "missing node-count header")?;
        let count = self.number(SEP_META, "malformed node-count header")?;
        Ok(count as usize)
    }

    /// Segment bits up to the `|` separator, which is consumed.
    fn segment(&mut self) -> Result<&'a [u8]> {
        let start = self.pos;
        loop {
            match self.peek() {
                Some(SEP) => break,
                Some(b) if bit_slot(b).is_some() => self.pos += 1,
                Some(_) => return Err(self.corrupt("segment contains a non-bit byte")),
                None => return Err(self.corrupt("unexpected end of input inside a segment")),
            }
        }
        let segment = &self.input[start..self.pos];
        self.pos += 1;
        Ok(segment)
    }

    /// Label up to the `<` marker, which is consumed.
    fn label(&mut self) -> Result<Option<Label>> {
        let value = self.number(SEP_CHILD_START, "malformed label")?;
        Ok(NonZeroU32::new(value))
    }

    fn corrupt(&self, reason: &'static str) -> Error {
        self.corrupt_at(self.pos, reason)
    }

    fn corrupt_at(&self, offset: usize, reason: &'static str) -> Error {
        Error::PersistedFileCorrupt { offset, reason }
    }
}
