//! The variable-width value filter (v1): each key reserves a contiguous
//! run of cells sized to its own answer, rather than the single bit v0
//! reserves.
//!
//! Where v0 and [multi](crate::multi) walk a fixed-width round schedule
//! keyed off a rotating 32-bit word, v1 keys its schedule directly off the
//! sixteen 32-bit words of the key's SHA-512 digest ([`sha2::digest_words`]),
//! enumerating all `(roundx, roundy)` pairs with `roundx < roundy` in
//! ascending order. Both store and load walk the identical enumeration —
//! earlier revisions of this scheme used a different pair order for loads,
//! which is corrected here so a filter's bytes alone determine every
//! answer, with no separate "how was this built" state required to read it.
//!
//! Every filter carries two trailing metadata bytes: `bloomFuncs` and
//! `bitLimit`, with `bitLimit` the very last byte. A filter with no
//! quaternary cells at all (just these two bytes) is the sentinel empty
//! filter; queries against it return an all-zero answer of the requested
//! length rather than erroring.

use crate::{
    engine::{advance, cell_size, doubled_address, hash64, peek, Cell},
    error::Error,
    hash::sha2,
};

/// The number of digest words consulted for the round-pair schedule, and
/// the number of `(roundx, roundy)` pairs it produces (`ROUNDS * (ROUNDS -
/// 1) / 2 = 120`).
pub const ROUNDS: u32 = 16;

/// A finished v1 filter: quaternary cells followed by a two-byte trailer
/// `[bloomFuncs, bitLimit]`.
#[derive(Debug, Clone)]
pub struct FilterV1(pub Vec<u8>);

impl FilterV1 {
    /// The sentinel empty filter for a given configuration: no quaternary
    /// cells, just the trailer.
    pub fn empty(bloom_funcs: u8, bit_limit: u8) -> Self {
        Self(vec![bloom_funcs, bit_limit])
    }

    pub fn bloom_funcs(&self) -> u8 {
        self.0[self.0.len() - 2]
    }

    pub fn bit_limit(&self) -> u8 {
        self.0[self.0.len() - 1]
    }

    fn cells(&self) -> &[u8] {
        &self.0[..self.0.len() - 2]
    }

    fn cells_mut(&mut self) -> &mut [u8] {
        let end = self.0.len() - 2;
        &mut self.0[..end]
    }

    /// Stores one key/answer pair, reserving `stored_bits` contiguous cells
    /// (big-endian bit order within `answer`) for the answer. Returns the
    /// number of cells newly written, using the same overflow-sentinel
    /// convention as [`crate::v0::FilterV0::insert_numeric`].
    pub fn store(&mut self, key: &[u8], answer: &[u8], stored_bits: u64) -> Result<u64, Error> {
        if stored_bits == 0 || self.cells().is_empty() {
            return Ok(0);
        }
        let base = cell_size(self.cells().len() as u64);
        if stored_bits >= base {
            return Err(Error::OversizedTable);
        }
        let cells_base = base - (stored_bits - 1);
        let digest = sha2::digest_words(key);

        let mut active = vec![false; stored_bits as usize];
        let mut inserted = 0u64;
        let cells = self.cells_mut();

        'outer: for roundx in 0..ROUNDS {
            for roundy in (roundx + 1)..ROUNDS {
                let x = digest[roundx as usize];
                let y = digest[roundy as usize];
                let hh = hash64(x, y, cells_base << 1);
                let mut any_active = false;
                for (i, done) in active.iter_mut().enumerate() {
                    if *done {
                        continue;
                    }
                    any_active = true;
                    let h = hh + ((i as u64) << 1);
                    let (byte_index, shift) = doubled_address(h);
                    let bit = answer_bit(answer, i);
                    match peek(cells, byte_index, shift) {
                        Cell::Empty => {
                            if bit == (h & 1) as u8 {
                                *done = true;
                            } else {
                                advance(cells, byte_index, shift, bit + 1);
                                inserted += 1;
                                *done = true;
                            }
                        }
                        Cell::Zero => {
                            if bit == 0 {
                                *done = true;
                            } else {
                                advance(cells, byte_index, shift, 3);
                                inserted += 1;
                            }
                        }
                        Cell::One => {
                            if bit == 1 {
                                *done = true;
                            } else {
                                advance(cells, byte_index, shift, 3);
                                inserted += 1;
                            }
                        }
                        Cell::Collided => {}
                    }
                }
                if !any_active {
                    break 'outer;
                }
            }
        }

        let unresolved = active.iter().filter(|&&done| !done).count() as u64;
        Ok(inserted + unresolved)
    }

    /// Recovers up to `anslen` answer bits for `key`. On the sentinel empty
    /// filter, returns `ceil(anslen/8)` zero bytes.
    pub fn get(&self, key: &[u8], anslen: u64) -> Result<Vec<u8>, Error> {
        let bit_limit = self.bit_limit();
        if bit_limit != 0 && anslen > bit_limit as u64 {
            return Err(Error::BitLimitTooSmallOnLoad);
        }
        let ret_len = ((anslen + 7) / 8) as usize;
        if self.cells().is_empty() {
            return Ok(vec![0u8; ret_len]);
        }

        let base = cell_size(self.cells().len() as u64);
        let mut stored_bits = if bit_limit != 0 { bit_limit as u64 } else { anslen };
        if stored_bits >= base {
            return Err(Error::OversizedTable);
        }
        let cells_base = base - (stored_bits - 1);
        if stored_bits > anslen {
            stored_bits = anslen;
        }

        let digest = sha2::digest_words(key);
        let mut ret = vec![0u8; ret_len];
        let mut done = vec![false; stored_bits as usize];
        let cells = self.cells();

        'outer: for roundx in 0..ROUNDS {
            for roundy in (roundx + 1)..ROUNDS {
                let x = digest[roundx as usize];
                let y = digest[roundy as usize];
                let hh = hash64(x, y, cells_base << 1);
                let parity = hh & 1 == 1;
                let mut any_active = false;
                for (i, finished) in done.iter_mut().enumerate() {
                    if *finished {
                        continue;
                    }
                    any_active = true;
                    let h = hh + ((i as u64) << 1);
                    let (byte_index, shift) = doubled_address(h);
                    match peek(cells, byte_index, shift) {
                        Cell::Empty => {
                            if parity {
                                set_answer_bit(&mut ret, i);
                            }
                            *finished = true;
                        }
                        Cell::Zero => {
                            *finished = true;
                        }
                        Cell::One => {
                            set_answer_bit(&mut ret, i);
                            *finished = true;
                        }
                        Cell::Collided => {}
                    }
                }
                if !any_active {
                    break 'outer;
                }
            }
        }

        Ok(ret)
    }

    /// Arms the Bloom pre-stage for `key` (see [`crate::bloom`]). Returns
    /// the number of distinct bits armed, which is less than
    /// `bloom_funcs` only when the filter's backing array is too small to
    /// offer that many distinct positions.
    pub fn arm_bloom(&mut self, key: &[u8]) -> usize {
        let bloom_funcs = self.bloom_funcs();
        let digest = sha2::digest_words(key);
        crate::bloom::arm(self.cells_mut(), &digest, bloom_funcs)
    }

    /// Cheap pre-reject via the Bloom pre-stage (see [`crate::bloom`]).
    pub fn maybe_contains(&self, key: &[u8]) -> bool {
        let digest = sha2::digest_words(key);
        crate::bloom::maybe_contains(self.cells(), &digest, self.bloom_funcs())
    }
}

/// Reads bit `i` of `answer`, big-endian: bit 0 is the low bit of the last
/// byte.
fn answer_bit(answer: &[u8], i: usize) -> u8 {
    let byte = answer[answer.len() - 1 - (i >> 3)];
    (byte >> (i & 7)) & 1
}

/// Sets bit `i` of `ret`, using the same big-endian convention as
/// [`answer_bit`].
fn set_answer_bit(ret: &mut [u8], i: usize) {
    let len = ret.len();
    ret[len - 1 - (i >> 3)] |= 1 << (i & 7);
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn round_trips_fixed_width_answers() {
        let mut filter = FilterV1(vec![0u8; 64 + 2]);
        filter.0[64] = 0;
        filter.0[65] = 16;
        filter.store(b"alice", &[0x12, 0x34], 16).unwrap();
        filter.store(b"bob", &[0xab, 0xcd], 16).unwrap();

        assert_eq!(filter.get(b"alice", 16).unwrap(), vec![0x12, 0x34]);
        assert_eq!(filter.get(b"bob", 16).unwrap(), vec![0xab, 0xcd]);
    }

    #[test]
    fn round_trips_variable_width_answers() {
        let mut filter = FilterV1(vec![0u8; 128 + 2]);
        filter.0[128] = 0;
        filter.0[129] = 0;
        filter.store(b"short", &[0x01], 8).unwrap();
        filter.store(b"longer-key", &[0xde, 0xad, 0xbe, 0xef], 32).unwrap();

        assert_eq!(filter.get(b"short", 8).unwrap(), vec![0x01]);
        assert_eq!(filter.get(b"longer-key", 32).unwrap(), vec![0xde, 0xad, 0xbe, 0xef]);
    }

    #[test]
    fn sentinel_empty_filter_returns_zeros() {
        let filter = FilterV1::empty(4, 16);
        assert_eq!(filter.get(b"anything", 16).unwrap(), vec![0u8; 2]);
    }

    #[test]
    fn bit_limit_rejects_oversized_requests() {
        let filter = FilterV1::empty(0, 8);
        assert_eq!(filter.get(b"x", 16), Err(Error::BitLimitTooSmallOnLoad));
    }

    #[test]
    fn bloom_pre_stage_round_trips_through_filter() {
        let mut filter = FilterV1(vec![0u8; 64 + 2]);
        filter.0[64] = 4;
        filter.0[65] = 0;
        filter.arm_bloom(b"armed-key");
        assert!(filter.maybe_contains(b"armed-key"));
    }

    #[test]
    fn answer_bit_round_trips() {
        let answer = [0b1010_0000u8, 0b0000_0001];
        assert_eq!(answer_bit(&answer, 0), 1);
        assert_eq!(answer_bit(&answer, 8), 0);
        assert_eq!(answer_bit(&answer, 13), 1);

        let mut ret = vec![0u8; 2];
        set_answer_bit(&mut ret, 0);
        set_answer_bit(&mut ret, 13);
        assert_eq!(ret, answer);
    }
}
