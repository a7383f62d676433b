//! Key codec: textual addresses and prefixes to canonical bit strings.
//!
//! IPv4 keys are 32 bits, IPv6 keys 128 bits. A prefix `a/len` encodes to the
//! first `len` bits of `a`; host bits past `len` are dropped.

use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::num::NonZeroU32;

use crate::bits::{self, BitString};
use crate::error::{Error, Result};

/// Route label bound to a prefix (an autonomous-system number).
///
/// Zero is reserved: the persisted format uses it to mean "no data".
pub type Label = NonZeroU32;

/// Address family. Each family gets its own trie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    /// 32-bit keys.
    V4,
    /// 128-bit keys.
    V6,
}

impl Family {
    /// Both families, IPv4 first.
    pub const ALL: [Family; 2] = [Family::V4, Family::V6];

    /// Full key length in bits.
    pub const fn key_bits(self) -> usize {
        match self {
            Family::V4 => 32,
            Family::V6 => 128,
        }
    }

    /// Guess the family from address text: anything with a colon is IPv6.
    pub fn detect(text: &str) -> Self {
        if text.contains(':') {
            Family::V6
        } else {
            Family::V4
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Family::V4 => f.write_str("IPv4"),
            Family::V6 => f.write_str("IPv6"),
        }
    }
}

/// Encode a full address.
pub fn encode_address(text: &str) -> Result<(Family, BitString)> {
    let text = text.trim();
    let family = Family::detect(text);
    let value = parse_value(text, family)?;
    Ok((family, bits::from_value(value, family.key_bits(), family.key_bits())))
}

/// Encode a prefix, truncated to `len` bits.
pub fn encode_prefix(text: &str, len: usize) -> Result<(Family, BitString)> {
    let text = text.trim();
    let family = Family::detect(text);
    if len > family.key_bits() {
        return Err(Error::invalid_key(text, "prefix length exceeds the address width"));
    }
    let value = parse_value(text, family)?;
    Ok((family, bits::from_value(value, family.key_bits(), len)))
}

fn parse_value(text: &str, family: Family) -> Result<u128> {
    match family {
        Family::V4 => text
            .parse::<Ipv4Addr>()
            .map(|a| u128::from(u32::from(a)))
            .map_err(|_| Error::invalid_key(text, "not an IPv4 address")),
        Family::V6 => text
            .parse::<Ipv6Addr>()
            .map(u128::from)
            .map_err(|_| Error::invalid_key(text, "not an IPv6 address")),
    }
}
