//! # lpm-trie
//!
//! Longest-prefix match over IPv4 and IPv6 route tables.
//!
//! Routes are built into a [`DynamicTrie`], a path-compressed binary radix
//! trie that supports incremental insertion. For queries the trie is
//! flattened into a [`StaticTrie`], an immutable index-addressed arena. The
//! [`persist`] module writes a dynamic trie to a compact nested text format
//! and parses that format straight back into a static trie, so a prebuilt
//! table can be reloaded without re-inserting every route.
//!
//! Keys are ASCII bit strings (see [`bits`]); [`key`] converts textual
//! addresses and prefixes into them.
//!
//! ## Example
//!
//! ```rust
//! use lpm_trie::{key, DynamicTrie, Label, StaticTrie};
//!
//! let mut trie = DynamicTrie::new();
//! let (_, k) = key::encode_prefix("10.0.0.0", 8)?;
//! trie.insert(&k, Label::new(100).unwrap());
//! let (_, k) = key::encode_prefix("10.1.0.0", 16)?;
//! trie.insert(&k, Label::new(200).unwrap());
//!
//! let table = StaticTrie::from_dynamic(&trie);
//! let (_, q) = key::encode_address("10.1.2.3")?;
//! assert_eq!(table.find(&q).map(Label::get), Some(200));
//! let (_, q) = key::encode_address("11.0.0.0")?;
//! assert_eq!(table.find(&q), None);
//! # Ok::<(), lpm_trie::Error>(())
//! ```

#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs)]

pub mod bits;
pub mod dynamic;
pub mod error;
pub mod frozen;
pub mod key;
pub mod persist;

pub use dynamic::{DynamicTrie, Insert};
pub use error::{Error, Result};
pub use frozen::{MemoryStats, NodeIdx, StaticTrie};
pub use key::{Family, Label};

#[cfg(test)]
mod proptests;
