//! The single-bit filter (v0): one answer bit per key, no stored metadata.
//!
//! Two key-shapes share the cell engine from [`crate::engine`]: numeric
//! keys up to 64 bits wide walk a 64-round hop sequence derived from a
//! rotating key word, while byte keys (and the strings/long-strings folded
//! into 64-byte blocks by [`crate::key`]) walk a 512-round hop sequence
//! re-derived from [`data_hash`](crate::engine::data_hash) every round.

use crate::engine::{
    advance, byte_size, cell_size, data_hash, doubled_address, hash64, peek, plain_address, Cell,
};

const NUMERIC_ROUNDS: u32 = 64;
const BYTE_ROUNDS: u32 = 512;

/// A finished single-bit filter: a raw cell array with no header.
#[derive(Debug, Clone, Default)]
pub struct FilterV0(pub Vec<u8>);

impl FilterV0 {
    pub fn with_cells(cells: Vec<u8>) -> Self {
        Self(cells)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Inserts one answer bit for a numeric key. Returns the number of
    /// cells written; a return value of `inserted + 1` (strictly greater
    /// than the real write count) signals that the 64-round hop budget
    /// was exhausted without a terminal resolution.
    pub fn insert_numeric(&mut self, num: u64, answer: bool) -> usize {
        if self.0.is_empty() {
            return 1;
        }
        let cells = cell_size(self.0.len() as u64);
        let mut x = num as u32;
        let high = (num >> 32) as u32;
        let answer = answer as u32;
        let mut inserted = 0usize;
        for i in 0..NUMERIC_ROUNDS {
            let h = hash64(x, high ^ i, cells) as u32;
            let (byte_index, shift) = plain_address(h);
            match peek(&self.0, byte_index, shift) {
                Cell::Empty => {
                    if answer == x & 1 {
                        return inserted;
                    }
                    advance(&mut self.0, byte_index, shift, (answer + 1) as u8);
                    return inserted + 1;
                }
                Cell::Zero => {
                    if answer == 0 {
                        return inserted;
                    }
                }
                Cell::One => {
                    if answer == 1 {
                        return inserted;
                    }
                }
                Cell::Collided => {
                    x = x.rotate_right(1);
                    continue;
                }
            }
            advance(&mut self.0, byte_index, shift, 3);
            x = x.rotate_right(1);
            inserted += 1;
        }
        inserted + 1
    }

    /// Looks up a numeric key. Never fails; an empty filter returns the
    /// key's low bit as a free parity guess.
    pub fn get_numeric(&self, num: u64) -> bool {
        if self.0.is_empty() {
            return num & 1 == 1;
        }
        let cells = cell_size(self.0.len() as u64);
        let mut x = num as u32;
        let high = (num >> 32) as u32;
        for i in 0..NUMERIC_ROUNDS {
            let h = hash64(x, high ^ i, cells) as u32;
            let (byte_index, shift) = plain_address(h);
            match peek(&self.0, byte_index, shift) {
                Cell::Empty => return x & 1 == 1,
                Cell::Zero => return false,
                Cell::One => return true,
                Cell::Collided => x = x.rotate_right(1),
            }
        }
        false
    }

    /// Inserts one answer bit for a byte key (the folded form of a string
    /// or long string, or a caller-supplied byte key). Returns the number
    /// of cells written, with the same overflow-sentinel convention as
    /// [`insert_numeric`](Self::insert_numeric).
    pub fn store_bytes(&mut self, data: &[u8], answer: bool) -> usize {
        if self.0.is_empty() {
            return 1;
        }
        let cells = cell_size(self.0.len() as u64);
        let answer = answer as u32;
        let mut inserted = 0usize;
        for i in 0..BYTE_ROUNDS {
            let h = hash64(data_hash(i, data), cells as u32, cells << 1);
            let (byte_index, shift) = doubled_address(h);
            match peek(&self.0, byte_index, shift) {
                Cell::Empty => {
                    if answer == (h & 1) as u32 {
                        return inserted;
                    }
                    advance(&mut self.0, byte_index, shift, (answer + 1) as u8);
                    return inserted + 1;
                }
                Cell::Zero => {
                    if answer == 0 {
                        return inserted;
                    }
                }
                Cell::One => {
                    if answer == 1 {
                        return inserted;
                    }
                }
                Cell::Collided => continue,
            }
            advance(&mut self.0, byte_index, shift, 3);
            inserted += 1;
        }
        inserted + 1
    }

    /// Looks up a byte key. An empty filter always returns `false` for
    /// this variant — deliberately different from the numeric path's
    /// parity-guess fallback (see P6 in the crate's test suite).
    pub fn get_bytes(&self, data: &[u8]) -> bool {
        if self.0.is_empty() {
            return false;
        }
        let cells = cell_size(self.0.len() as u64);
        for i in 0..BYTE_ROUNDS {
            let h = hash64(data_hash(i, data), cells as u32, cells << 1);
            let (byte_index, shift) = doubled_address(h);
            match peek(&self.0, byte_index, shift) {
                Cell::Empty => return h & 1 == 1,
                Cell::Zero => return false,
                Cell::One => return true,
                Cell::Collided => continue,
            }
        }
        false
    }
}

/// `byteSize(grow(size))`: the initial array length for a v0 build with
/// `size` key/answer pairs.
pub fn initial_size(size: u64) -> u64 {
    byte_size(crate::engine::grow(size))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn numeric_round_trips_small_map() {
        let mut filter = FilterV0::with_cells(vec![0u8; initial_size(4) as usize]);
        filter.insert_numeric(5, true);
        filter.insert_numeric(55, false);
        assert!(filter.get_numeric(5));
        assert!(!filter.get_numeric(55));
    }

    #[test]
    fn byte_round_trips_small_map() {
        let mut filter = FilterV0::with_cells(vec![0u8; initial_size(4) as usize]);
        let a = [1u8; 64];
        let b = [2u8; 64];
        filter.store_bytes(&a, true);
        filter.store_bytes(&b, false);
        assert!(filter.get_bytes(&a));
        assert!(!filter.get_bytes(&b));
    }

    #[test]
    fn empty_filter_numeric_is_parity_guess() {
        let filter = FilterV0::default();
        assert!(filter.get_numeric(1));
        assert!(!filter.get_numeric(2));
    }

    #[test]
    fn empty_filter_bytes_is_always_false() {
        let filter = FilterV0::default();
        assert!(!filter.get_bytes(&[7u8; 64]));
    }
}
