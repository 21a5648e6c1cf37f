//! The build loop shared by every filter variant: repeatedly insert until
//! a full pass makes no further progress, growing the backing array by a
//! factor of 1.5x whenever that quiescent point is reached before every
//! pair settles.
//!
//! All randomness in a build is derived from the keys themselves; the loop
//! is deterministic given a fixed iteration order over its input, which is
//! why every public `build_*` entry point materializes its input into an
//! owned `Vec` up front rather than consuming a one-shot iterator.

use crate::{
    engine::{byte_size, cell_size, grow},
    error::Error,
    multi::MultiFilter,
    v0::FilterV0,
    v1::FilterV1,
};

/// Drives the geometric regrowth loop described in the crate's design
/// notes: allocate a container sized for `size` pairs, repeatedly call
/// `run_pass` until a pass inserts nothing new, and on every such
/// quiescent point that still falls short of a full fit, grow and retry.
///
/// `alloc(bytes)` must produce a fresh, zeroed container of the given byte
/// size. `run_pass(container, load, max_load)` must perform one full pass
/// over the input, writing into `container` and returning the number of
/// cells newly written (capped so that repeated no-progress passes can
/// never report nonzero spuriously — see the v0/v1 store functions for the
/// overflow-sentinel convention that guarantees this).
pub fn build_generic<T>(
    size: u64,
    mut alloc: impl FnMut(u64) -> T,
    mut run_pass: impl FnMut(&mut T, u64, u64) -> u64,
) -> T {
    let mut bytes = byte_size(grow(size));
    let mut max_load = size;
    loop {
        let mut container = alloc(bytes);
        let mut load = 0u64;
        let mut is_mutated = true;
        while is_mutated && load < max_load {
            let new_inserted = run_pass(&mut container, load, max_load);
            is_mutated = new_inserted > 0;
            load += new_inserted;
        }
        if is_mutated {
            bytes = byte_size(grow(cell_size(bytes)));
            max_load = grow(max_load);
        } else {
            return container;
        }
    }
}

/// Builds a v0 filter from a numeric map and a byte-keyed map sharing one
/// cell array, mirroring how [`crate::api::build_string`] combines short
/// (numeric-encoded) and long (byte-folded) strings into a single filter.
pub fn build_v0(numbers: &[(u64, bool)], data: &[(Vec<u8>, bool)]) -> FilterV0 {
    let size = (numbers.len() + data.len()) as u64;
    if size == 0 {
        return FilterV0::default();
    }
    build_generic(
        size,
        |bytes| FilterV0::with_cells(vec![0u8; bytes as usize]),
        |filter, load, max_load| {
            let mut new_inserted = 0u64;
            for (key, answer) in data {
                new_inserted += filter.store_bytes(key, *answer) as u64;
                if load + new_inserted >= max_load {
                    break;
                }
            }
            for (key, answer) in numbers {
                new_inserted += filter.insert_numeric(*key, *answer) as u64;
                if load + new_inserted >= max_load {
                    break;
                }
            }
            new_inserted
        },
    )
}

/// Builds a numeric-keyed multi-filter from a map of key to an `N`-bit
/// answer word.
pub fn build_multi_numeric(n: usize, pairs: &[(u64, u64)]) -> MultiFilter {
    let size = pairs.len() as u64;
    if size == 0 {
        return MultiFilter::new(n, 0);
    }
    build_generic(
        size,
        |bytes| MultiFilter::new(n, bytes as usize),
        |filter, load, max_load| {
            let mut new_inserted = 0u64;
            for (key, answers) in pairs {
                let counts = filter.insert(*key, *answers);
                new_inserted += counts.iter().map(|&c| c as u64).sum::<u64>();
                if load + new_inserted >= max_load {
                    break;
                }
            }
            new_inserted
        },
    )
}

/// Builds a byte-keyed multi-filter from a map of key bytes to an `N`-bit
/// answer word.
pub fn build_multi_bytes(n: usize, pairs: &[(Vec<u8>, u64)]) -> MultiFilter {
    let size = pairs.len() as u64;
    if size == 0 {
        return MultiFilter::new(n, 0);
    }
    build_generic(
        size,
        |bytes| MultiFilter::new(n, bytes as usize),
        |filter, load, max_load| {
            let mut new_inserted = 0u64;
            for (key, answers) in pairs {
                let counts = filter.store(key, *answers);
                new_inserted += counts.iter().map(|&c| c as u64).sum::<u64>();
                if load + new_inserted >= max_load {
                    break;
                }
            }
            new_inserted
        },
    )
}

/// Builds a v1 filter from a slice of key/answer pairs. `bit_limit == 0`
/// means each value occupies exactly its own bit length; otherwise every
/// value must be exactly `ceil(bit_limit / 8)` bytes. `bloom_funcs` is
/// recorded in the trailer and used by [`FilterV1::arm_bloom`] /
/// [`FilterV1::maybe_contains`]; pass 0 to skip the Bloom pre-stage.
/// When `bloom_funcs` is nonzero, the backing array is floored to a size
/// proportional to `bloom_funcs * pairs.len()` and grown further whenever
/// a key can't reach `bloom_funcs` distinct Bloom positions, so the Bloom
/// stage's false-positive rate doesn't depend on how large the quaternary
/// payload happens to be.
pub fn build_v1(
    pairs: &[(Vec<u8>, Vec<u8>)],
    bit_limit: u8,
    bloom_funcs: u8,
) -> Result<FilterV1, Error> {
    if bit_limit != 0 {
        let want = (bit_limit as usize + 7) / 8;
        for (_, v) in pairs {
            if v.len() != want {
                return Err(Error::ValueExceedsBitLimit);
            }
        }
    }
    if pairs.is_empty() {
        return Ok(FilterV1::empty(bloom_funcs, bit_limit));
    }

    let stored_bits_of = |v: &[u8]| -> u64 {
        if bit_limit != 0 {
            bit_limit as u64
        } else {
            8 * v.len() as u64
        }
    };
    let size: u64 = pairs.iter().map(|(_, v)| stored_bits_of(v)).sum();

    // The Bloom stage shares the quaternary cell bytes, but its own load
    // isn't reflected in `size` at all: a key that reserves few or no
    // quaternary cells (small answers, or `bloomFuncs` alone) can still
    // need plenty of distinct bit positions. Floor the byte count so every
    // key has room for its own `bloom_funcs` bits several times over,
    // keeping the Bloom stage's false-positive rate low instead of
    // saturating a handful of bytes shared across every key.
    let bloom_byte_floor = bloom_funcs as u64 * pairs.len() as u64;
    let bloom_target = (bloom_funcs as usize).min(crate::bloom::MAX_POSITIONS);

    let mut bytes = byte_size(grow(size)).max(bloom_byte_floor);
    let mut max_load = size;
    loop {
        let mut filter = FilterV1(vec![0u8; bytes as usize + 2]);
        let tail = filter.0.len();
        filter.0[tail - 2] = bloom_funcs;
        filter.0[tail - 1] = bit_limit;

        let mut load = 0u64;
        let mut is_mutated = true;
        while is_mutated && load < max_load {
            let mut new_inserted = 0u64;
            for (key, value) in pairs {
                let stored_bits = stored_bits_of(value);
                new_inserted += filter.store(key, value, stored_bits)?;
                if load + new_inserted >= max_load {
                    break;
                }
            }
            is_mutated = new_inserted > 0;
            load += new_inserted;
        }

        if is_mutated {
            bytes = byte_size(grow(cell_size(bytes)));
            max_load = grow(max_load);
            continue;
        }

        if bloom_funcs != 0 {
            let mut saturated = false;
            for (key, _) in pairs {
                if filter.arm_bloom(key) < bloom_target {
                    saturated = true;
                    break;
                }
            }
            if saturated {
                bytes = byte_size(grow(cell_size(bytes)));
                max_load = grow(max_load);
                continue;
            }
        }

        return Ok(filter);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn build_v0_round_trips_numeric_map() {
        let numbers = vec![(5u64, true), (55u64, false)];
        let filter = build_v0(&numbers, &[]);
        assert!(filter.get_numeric(5));
        assert!(!filter.get_numeric(55));
    }

    #[test]
    fn build_v0_round_trips_large_numeric_map() {
        let numbers: Vec<(u64, bool)> = (0..10_000u64).map(|i| (i, i % 2 == 1)).collect();
        let filter = build_v0(&numbers, &[]);
        for i in 0..10_000u64 {
            assert_eq!(filter.get_numeric(i), i % 2 == 1, "mismatch at {i}");
        }
    }

    #[test]
    fn build_v0_round_trips_mixed_map() {
        let numbers = vec![(1u64, true)];
        let data = vec![(vec![9u8; 64], false)];
        let filter = build_v0(&numbers, &data);
        assert!(filter.get_numeric(1));
        assert!(!filter.get_bytes(&data[0].0));
    }

    #[test]
    fn build_loop_grows_when_needed() {
        // Deliberately tiny size estimate forces regrowth once real keys
        // collide against the optimistic initial allocation.
        let numbers: Vec<(u64, bool)> = (0..200u64).map(|i| (i, i % 3 == 0)).collect();
        let filter = build_v0(&numbers, &[]);
        for (k, v) in &numbers {
            assert_eq!(filter.get_numeric(*k), *v);
        }
    }

    #[test]
    fn build_v1_round_trips_fixed_width_map() {
        let pairs = vec![
            (b"alice".to_vec(), vec![0x12, 0x34]),
            (b"bob".to_vec(), vec![0xab, 0xcd]),
            (b"carol".to_vec(), vec![0x00, 0x01]),
        ];
        let filter = build_v1(&pairs, 16, 0).unwrap();
        for (k, v) in &pairs {
            assert_eq!(&filter.get(k, 16).unwrap(), v);
        }
    }

    #[test]
    fn build_v1_rejects_mismatched_value_width() {
        let pairs = vec![(b"alice".to_vec(), vec![0x12])];
        assert!(build_v1(&pairs, 16, 0).is_err());
    }

    #[test]
    fn build_v1_round_trips_variable_width_map() {
        let pairs = vec![
            (b"short".to_vec(), vec![0x01]),
            (b"a much longer key entirely".to_vec(), vec![0xde, 0xad, 0xbe, 0xef]),
        ];
        let filter = build_v1(&pairs, 0, 0).unwrap();
        assert_eq!(filter.get(b"short", 8).unwrap(), vec![0x01]);
        assert_eq!(
            filter.get(b"a much longer key entirely", 32).unwrap(),
            vec![0xde, 0xad, 0xbe, 0xef]
        );
    }

    #[test]
    fn build_v1_with_bloom_pre_stage_recognizes_armed_keys() {
        let pairs = vec![(b"alice".to_vec(), vec![0x7f]), (b"bob".to_vec(), vec![0x00])];
        let filter = build_v1(&pairs, 8, 4).unwrap();
        assert!(filter.maybe_contains(b"alice"));
        assert!(filter.maybe_contains(b"bob"));
    }

    #[test]
    fn build_v1_empty_map_is_sentinel() {
        let filter = build_v1(&[], 16, 4).unwrap();
        assert_eq!(filter.get(b"anything", 16).unwrap(), vec![0u8; 2]);
    }
}
