//! Slot placement hash for the sharded counter table.
//!
//! The digest is only used to pick a counter slot. It is not cryptographic and
//! collisions are expected; the sharded counter merges the counts of aliased
//! keys.
//!
//! The hash works in two steps:
//! - **Fold** the key bytes into a 64-bit "ring" state ([`xorstring`])
//! - **Permute** that state into 32 bits with the XSH-RR output function
//!   borrowed from the PCG family of generators ([`xshrr`])
//!
//! Both steps are pure. Equal keys always produce equal digests, across calls
//! and across process runs, since nothing is salted or randomized.

/// Fold a string into a 64-bit state.
///
/// Bytes are accumulated left to right into a ring that is shifted by one
/// byte per step before the next byte is xored in. The ring shift keeps only
/// the bits of `n << 8`, so the folded state is determined by the last eight
/// bytes of the key.
#[inline]
pub fn xorstring(s: &str) -> u64 {
    let mut n: u64 = 0;
    for &b in s.as_bytes() {
        n = ((n & 0xff) >> 56) | (n << 8);
        n ^= u64::from(b);
    }
    n
}

/// Randomly rotated xorshift ("XSH RR").
///
/// Takes the 64-bit folded state and returns a 32-bit digest. States below
/// 2^27 (keys of three bytes or fewer) permute to zero.
#[inline]
pub fn xshrr(n: u64) -> u32 {
    let xorshifted = (((n >> 18) ^ n) >> 27) as u32;
    let rot = (n >> 59) as u32;
    xorshifted.rotate_right(rot)
}

/// Full 32-bit digest of a key.
#[inline]
pub fn digest(key: &str) -> u32 {
    xshrr(xorstring(key))
}

/// Slot index of `key` in a table of `width` slots.
///
/// `width` must be non-zero; table constructors validate this.
#[inline]
pub fn slot_hash(key: &str, width: u32) -> u32 {
    digest(key) % width
}
