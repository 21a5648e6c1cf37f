//! An optional Bloom pre-stage for [v1](crate::v1) filters.
//!
//! The Bloom bits live in the very same backing bytes as the quaternary
//! cells: arming the Bloom stage only ever ORs bits in, which is exactly
//! the transition discipline the cell engine already relies on (see
//! [`crate::engine::advance`]), so arming never corrupts an already-stored
//! answer — it can only cost a query a few extra hops before a COLLIDED
//! cell resolves.
//!
//! This stage is auxiliary: [`crate::v1::FilterV1::get`] never consults it.
//! Callers who want a cheap pre-reject call [`maybe_contains`] explicitly.

use crate::v1::ROUNDS;

/// The number of `(roundx, roundy)` pairs the round schedule can produce
/// (`ROUNDS * (ROUNDS - 1) / 2`); the hard ceiling on distinct Bloom bit
/// positions one key can ever reach, regardless of `bloom_funcs`.
pub const MAX_POSITIONS: usize = (ROUNDS * (ROUNDS - 1) / 2) as usize;

/// Computes up to `bloom_funcs` *distinct* bit positions (bounded by the
/// `ROUNDS` round-pair schedule, [`MAX_POSITIONS`] pairs) for one key's
/// Bloom membership, using the same ascending `(roundx, roundy)`
/// enumeration as the quaternary stage. A round-pair whose hop collides
/// with a position already produced earlier in this same walk is skipped
/// without consuming a slot, so the result always holds up to
/// `bloom_funcs` *different* positions rather than `bloom_funcs` raw
/// draws.
fn positions(digest: &[u32; 16], bit_count: u64, bloom_funcs: u8) -> Vec<u64> {
    let mut out = Vec::with_capacity(bloom_funcs as usize);
    'outer: for roundx in 0..ROUNDS {
        for roundy in (roundx + 1)..ROUNDS {
            if out.len() >= bloom_funcs as usize {
                break 'outer;
            }
            let x = digest[roundx as usize];
            let y = digest[roundy as usize];
            let hh = crate::engine::hash64(x, y, bit_count);
            if !out.contains(&hh) {
                out.push(hh);
            }
        }
    }
    out
}

/// Arms the Bloom stage for one key: sets up to `bloom_funcs` distinct
/// bits in `cells` (interpreted as a flat bit array of `8 * cells.len()`
/// bits). Returns the number of distinct positions armed, which is less
/// than `bloom_funcs` only when the backing array is too small to offer
/// that many different positions within the round-pair budget — callers
/// that need a particular false-positive rate should treat a short count
/// as a signal to grow the array and rearm.
pub fn arm(cells: &mut [u8], digest: &[u32; 16], bloom_funcs: u8) -> usize {
    if bloom_funcs == 0 || cells.is_empty() {
        return 0;
    }
    let bit_count = 8 * cells.len() as u64;
    let pos = positions(digest, bit_count, bloom_funcs);
    for &hh in &pos {
        let byte = (hh / 8) as usize;
        let shift = (hh % 8) as u32;
        cells[byte] |= 1 << shift;
    }
    pos.len()
}

/// Probes the Bloom stage for one key. A `false` result means the key was
/// definitely never armed; a `true` result means it probably was (subject
/// to the usual Bloom false-positive rate).
pub fn maybe_contains(cells: &[u8], digest: &[u32; 16], bloom_funcs: u8) -> bool {
    if bloom_funcs == 0 || cells.is_empty() {
        return true;
    }
    let bit_count = 8 * cells.len() as u64;
    positions(digest, bit_count, bloom_funcs).into_iter().all(|hh| {
        let byte = (hh / 8) as usize;
        let shift = (hh % 8) as u32;
        cells[byte] & (1 << shift) != 0
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::hash::sha2;

    #[test]
    fn armed_key_is_contained() {
        let mut cells = vec![0u8; 32];
        let digest = sha2::digest_words(b"hello");
        arm(&mut cells, &digest, 4);
        assert!(maybe_contains(&cells, &digest, 4));
    }

    #[test]
    fn zero_bloom_funcs_is_a_no_op_and_always_contains() {
        let mut cells = vec![0u8; 32];
        let digest = sha2::digest_words(b"hello");
        arm(&mut cells, &digest, 0);
        assert_eq!(cells, vec![0u8; 32]);
        assert!(maybe_contains(&cells, &digest, 0));
    }

    #[test]
    fn arm_reports_fewer_than_requested_when_array_is_too_small() {
        let mut cells = vec![0u8; 1];
        let digest = sha2::digest_words(b"hello");
        let placed = arm(&mut cells, &digest, 100);
        assert!(placed <= 8, "a single byte can hold at most 8 distinct bit positions");
    }

    #[test]
    fn positions_are_deduplicated_within_one_walk() {
        let digest = sha2::digest_words(b"dedup-me");
        let pos = positions(&digest, 16, 200);
        let mut sorted = pos.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(pos.len(), sorted.len(), "positions() must not repeat a value");
    }
}
