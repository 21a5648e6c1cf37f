//! Parallel multi-bit filters: up to 64 independent answer bits per key,
//! sharing a single hop sequence.
//!
//! Each round's hop is a pure function of the round index (and, for the
//! numeric variant, the key) — never of which filters are still active —
//! so walking the shared loop once and applying the single-bit transition
//! rules to every still-active filter produces byte-identical results to
//! running [`crate::v0`]'s single-bit store independently per filter. That
//! equivalence is [P5](crate::test) and is exercised directly by the
//! randomized trials ported from the original corpus's own test suite.

use crate::engine::{
    advance, byte_size, cell_size, data_hash, doubled_address, hash64, peek, plain_address, Cell,
};

const NUMERIC_ROUNDS: u32 = 64;
const BYTE_ROUNDS: u32 = 512;

/// `N` parallel filters of identical byte length.
#[derive(Debug, Clone)]
pub struct MultiFilter {
    filters: Vec<Vec<u8>>,
}

impl MultiFilter {
    pub fn new(n: usize, byte_len: usize) -> Self {
        Self {
            filters: vec![vec![0u8; byte_len]; n],
        }
    }

    /// Assembles a multi-filter from already-built per-filter byte arrays.
    /// Every filter must share the same byte length, or the filters could
    /// never have come from one [`crate::build::build_multi_numeric`] /
    /// [`crate::build::build_multi_bytes`] run; mixing lengths would make
    /// [`cell_size`] disagree between filters and desynchronize the shared
    /// hop sequence.
    pub fn from_filters(filters: Vec<Vec<u8>>) -> Result<Self, crate::error::Error> {
        if let Some(first) = filters.first() {
            if filters.iter().any(|f| f.len() != first.len()) {
                return Err(crate::error::Error::MultiFilterSizeMismatch);
            }
        }
        Ok(Self { filters })
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn byte_len(&self) -> usize {
        self.filters.first().map_or(0, Vec::len)
    }

    pub fn filters(&self) -> &[Vec<u8>] {
        &self.filters
    }

    /// Inserts `N` answer bits (bit `j` of `answers` for filter `j`) for a
    /// numeric key, via the shared rotating-key hop sequence used by
    /// [`crate::v0::FilterV0::insert_numeric`]. Returns one insertion
    /// count per filter, in the same overflow-sentinel convention.
    pub fn insert(&mut self, num: u64, answers: u64) -> Vec<usize> {
        let n = self.filters.len();
        let mut inserted = vec![0usize; n];
        let mut active = vec![false; n];
        for (j, count) in inserted.iter_mut().enumerate() {
            if self.filters[j].is_empty() {
                *count = 1;
                active[j] = true;
            }
        }
        if active.iter().all(|&a| a) {
            return inserted;
        }

        let cells = cell_size(self.filters.iter().find(|f| !f.is_empty()).unwrap().len() as u64);
        let mut x = num as u32;
        let high = (num >> 32) as u32;

        for i in 0..NUMERIC_ROUNDS {
            let h = hash64(x, high ^ i, cells) as u32;
            let (byte_index, shift) = plain_address(h);
            let mut any_active = false;
            for j in 0..n {
                if active[j] {
                    continue;
                }
                any_active = true;
                let answer = (answers >> j) & 1;
                match peek(&self.filters[j], byte_index, shift) {
                    Cell::Empty => {
                        if answer as u32 == x & 1 {
                            active[j] = true;
                        } else {
                            advance(&mut self.filters[j], byte_index, shift, (answer + 1) as u8);
                            inserted[j] += 1;
                            active[j] = true;
                        }
                    }
                    Cell::Zero => {
                        if answer == 0 {
                            active[j] = true;
                        } else {
                            advance(&mut self.filters[j], byte_index, shift, 3);
                            inserted[j] += 1;
                        }
                    }
                    Cell::One => {
                        if answer == 1 {
                            active[j] = true;
                        } else {
                            advance(&mut self.filters[j], byte_index, shift, 3);
                            inserted[j] += 1;
                        }
                    }
                    Cell::Collided => {}
                }
            }
            if !any_active {
                break;
            }
            x = x.rotate_right(1);
        }

        for (j, count) in inserted.iter_mut().enumerate() {
            if !active[j] {
                *count += 1;
            }
        }
        inserted
    }

    /// Byte-keyed counterpart of [`insert`](Self::insert), mirroring
    /// [`crate::v0::FilterV0::store_bytes`]'s shared re-digested hop per
    /// round.
    pub fn store(&mut self, data: &[u8], answers: u64) -> Vec<usize> {
        let n = self.filters.len();
        let mut inserted = vec![0usize; n];
        let mut active = vec![false; n];
        for (j, count) in inserted.iter_mut().enumerate() {
            if self.filters[j].is_empty() {
                *count = 1;
                active[j] = true;
            }
        }
        if active.iter().all(|&a| a) {
            return inserted;
        }

        let cells = cell_size(self.filters.iter().find(|f| !f.is_empty()).unwrap().len() as u64);

        for i in 0..BYTE_ROUNDS {
            let h = hash64(data_hash(i, data), cells as u32, cells << 1);
            let (byte_index, shift) = doubled_address(h);
            let mut any_active = false;
            for j in 0..n {
                if active[j] {
                    continue;
                }
                any_active = true;
                let answer = (answers >> j) & 1;
                match peek(&self.filters[j], byte_index, shift) {
                    Cell::Empty => {
                        if answer as u32 == (h & 1) as u32 {
                            active[j] = true;
                        } else {
                            advance(&mut self.filters[j], byte_index, shift, (answer + 1) as u8);
                            inserted[j] += 1;
                            active[j] = true;
                        }
                    }
                    Cell::Zero => {
                        if answer == 0 {
                            active[j] = true;
                        } else {
                            advance(&mut self.filters[j], byte_index, shift, 3);
                            inserted[j] += 1;
                        }
                    }
                    Cell::One => {
                        if answer == 1 {
                            active[j] = true;
                        } else {
                            advance(&mut self.filters[j], byte_index, shift, 3);
                            inserted[j] += 1;
                        }
                    }
                    Cell::Collided => {}
                }
            }
            if !any_active {
                break;
            }
        }

        for (j, count) in inserted.iter_mut().enumerate() {
            if !active[j] {
                *count += 1;
            }
        }
        inserted
    }

    /// Looks up a numeric key, returning a bitmap with bit `j` set to
    /// filter `j`'s answer.
    pub fn get_numeric(&self, num: u64) -> u64 {
        let mut result = 0u64;
        for (j, filter) in self.filters.iter().enumerate() {
            if get_numeric_one(filter, num) {
                result |= 1 << j;
            }
        }
        result
    }

    /// Looks up a byte key, returning a bitmap with bit `j` set to filter
    /// `j`'s answer.
    pub fn get_bytes(&self, data: &[u8]) -> u64 {
        let mut result = 0u64;
        for (j, filter) in self.filters.iter().enumerate() {
            if get_bytes_one(filter, data) {
                result |= 1 << j;
            }
        }
        result
    }
}

fn get_numeric_one(filter: &[u8], num: u64) -> bool {
    if filter.is_empty() {
        return num & 1 == 1;
    }
    let cells = cell_size(filter.len() as u64);
    let mut x = num as u32;
    let high = (num >> 32) as u32;
    for i in 0..NUMERIC_ROUNDS {
        let h = hash64(x, high ^ i, cells) as u32;
        let (byte_index, shift) = plain_address(h);
        match peek(filter, byte_index, shift) {
            Cell::Empty => return x & 1 == 1,
            Cell::Zero => return false,
            Cell::One => return true,
            Cell::Collided => x = x.rotate_right(1),
        }
    }
    false
}

fn get_bytes_one(filter: &[u8], data: &[u8]) -> bool {
    if filter.is_empty() {
        return false;
    }
    let cells = cell_size(filter.len() as u64);
    for i in 0..BYTE_ROUNDS {
        let h = hash64(data_hash(i, data), cells as u32, cells << 1);
        let (byte_index, shift) = doubled_address(h);
        match peek(filter, byte_index, shift) {
            Cell::Empty => return h & 1 == 1,
            Cell::Zero => return false,
            Cell::One => return true,
            Cell::Collided => continue,
        }
    }
    false
}

/// `byteSize(grow(size))`: the initial per-filter array length for a multi
/// build with `size` key/answer pairs.
pub fn initial_size(size: u64) -> u64 {
    byte_size(crate::engine::grow(size))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::v0::FilterV0;
    use rand::Rng;

    #[test]
    fn insert_matches_independent_single_filter_stores() {
        let mut rng = rand::thread_rng();
        let n_filters = 5;
        let filter_size = 256;

        for _ in 0..100 {
            let mut multi = MultiFilter::new(n_filters, filter_size);
            let mut singles: Vec<FilterV0> =
                (0..n_filters).map(|_| FilterV0::with_cells(vec![0u8; filter_size])).collect();

            let num: u64 = rng.gen();
            let answers: u64 = rng.gen();

            let multi_inserted = multi.insert(num, answers);
            let single_inserted: Vec<usize> = (0..n_filters)
                .map(|j| {
                    let bit = (answers >> j) & 1 == 1;
                    singles[j].insert_numeric(num, bit)
                })
                .collect();

            assert_eq!(multi_inserted, single_inserted);
            for j in 0..n_filters {
                assert_eq!(multi.filters()[j], singles[j].0);
            }
        }
    }

    #[test]
    fn store_matches_independent_single_filter_stores() {
        let mut rng = rand::thread_rng();
        let n_filters = 5;
        let filter_size = 256;
        let data_len = 32;

        for _ in 0..100 {
            let mut multi = MultiFilter::new(n_filters, filter_size);
            let mut singles: Vec<FilterV0> =
                (0..n_filters).map(|_| FilterV0::with_cells(vec![0u8; filter_size])).collect();

            let data: Vec<u8> = (0..data_len).map(|_| rng.gen()).collect();
            let answers: u64 = rng.gen();

            let multi_inserted = multi.store(&data, answers);
            let single_inserted: Vec<usize> = (0..n_filters)
                .map(|j| {
                    let bit = (answers >> j) & 1 == 1;
                    singles[j].store_bytes(&data, bit)
                })
                .collect();

            assert_eq!(multi_inserted, single_inserted);
            for j in 0..n_filters {
                assert_eq!(multi.filters()[j], singles[j].0);
            }
        }
    }

    #[test]
    fn from_filters_rejects_mismatched_lengths() {
        let filters = vec![vec![0u8; 16], vec![0u8; 32]];
        assert_eq!(
            MultiFilter::from_filters(filters).unwrap_err(),
            crate::error::Error::MultiFilterSizeMismatch
        );
    }

    #[test]
    fn from_filters_accepts_matching_lengths() {
        let filters = vec![vec![0u8; 16], vec![1u8; 16]];
        let multi = MultiFilter::from_filters(filters).unwrap();
        assert_eq!(multi.len(), 2);
    }

    #[test]
    fn get_matches_insert() {
        let mut multi = MultiFilter::new(3, 64);
        multi.insert(5, 0b101);
        multi.insert(55, 0b010);
        assert_eq!(multi.get_numeric(5) & 0b111, 0b101);
        assert_eq!(multi.get_numeric(55) & 0b111, 0b010);
    }
}
