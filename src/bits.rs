//! Bit-string helpers.
//!
//! Keys are ASCII bit strings: one byte per bit, each `b'0'` or `b'1'`,
//! most significant bit first. The persisted format stores segments the same
//! way, so they move between memory and disk without conversion.

/// An owned ASCII bit string.
pub type BitString = Vec<u8>;

/// Length of the shared prefix of two bit strings.
#[inline]
pub fn common_prefix_len(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b.iter()).take_while(|(x, y)| x == y).count()
}

/// Check that every byte is `b'0'` or `b'1'`.
pub fn is_bit_string(bits: &[u8]) -> bool {
    bits.iter().all(|&b| b == b'0' || b == b'1')
}

/// Child slot selected by a bit: `0` for `b'0'`, `1` for `b'1'`.
#[inline]
pub fn bit_slot(bit: u8) -> Option<usize> {
    match bit {
        b'0' => Some(0),
        b'1' => Some(1),
        _ => None,
    }
}

/// Render the top `len` bits of a `width`-bit value as a bit string.
pub fn from_value(value: u128, width: usize, len: usize) -> BitString {
    debug_assert!(len <= width && width <= 128);
    (0..len)
        .map(|i| {
            if (value >> (width - 1 - i)) & 1 == 1 {
                b'1'
            } else {
                b'0'
            }
        })
        .collect()
}
