//! Public entry points: `build_*`/`get_*` wrappers dispatching numeric,
//! byte, and string code paths onto the underlying filter variants.
//!
//! Every `build_*` function materializes its input into an owned `Vec`
//! before handing it to [`crate::build`], so the result is deterministic
//! regardless of what iterator or map the caller happened to pass in.

use crate::{
    build,
    error::Error,
    key::{encode_string, fold_strings, StringKey},
    multi::MultiFilter,
    v0::FilterV0,
    v1::FilterV1,
};

/// Builds a single-bit filter from a map of numeric keys to answers.
pub fn build_numeric(pairs: impl IntoIterator<Item = (u64, bool)>) -> FilterV0 {
    let numbers: Vec<(u64, bool)> = pairs.into_iter().collect();
    build::build_v0(&numbers, &[])
}

/// Builds a single-bit filter from a map of 64-byte keys to answers.
pub fn build_bytes(pairs: impl IntoIterator<Item = ([u8; 64], bool)>) -> FilterV0 {
    let data: Vec<(Vec<u8>, bool)> = pairs.into_iter().map(|(k, v)| (k.to_vec(), v)).collect();
    build::build_v0(&[], &data)
}

/// Builds a single-bit filter from a map of string keys to answers.
///
/// Strings of at most [`crate::key::SHORT_STRING_LIMIT`] bytes are inlined
/// into a 64-bit integer and walk the numeric path; longer strings are
/// folded via SHA-512 into a 64-byte block and walk the byte-keyed path.
/// Both paths share one cell array.
pub fn build_string<'a>(pairs: impl IntoIterator<Item = (&'a str, bool)>) -> FilterV0 {
    let mut numbers = Vec::new();
    let mut data = Vec::new();
    for (key, answer) in pairs {
        match encode_string(key) {
            StringKey::Short(n) => numbers.push((n, answer)),
            StringKey::Long(block) => data.push((block.to_vec(), answer)),
        }
    }
    build::build_v0(&numbers, &data)
}

/// Builds an `n`-bit-per-key multi-filter from a map of numeric keys to
/// `n`-bit answer words (bit `i` of the answer is filter `i`'s bit).
pub fn build_multi(n: usize, pairs: impl IntoIterator<Item = (u64, u64)>) -> MultiFilter {
    let pairs: Vec<(u64, u64)> = pairs.into_iter().collect();
    build::build_multi_numeric(n, &pairs)
}

/// Byte-keyed counterpart of [`build_multi`], for callers who already have
/// byte keys rather than numeric ones.
pub fn build_multi_bytes(n: usize, pairs: impl IntoIterator<Item = (Vec<u8>, u64)>) -> MultiFilter {
    let pairs: Vec<(Vec<u8>, u64)> = pairs.into_iter().collect();
    build::build_multi_bytes(n, &pairs)
}

/// Builds a variable-width value filter. `bit_limit == 0` means every
/// value keeps its own bit length; otherwise every value must be exactly
/// `ceil(bit_limit / 8)` bytes, or the build fails with
/// [`Error::ValueExceedsBitLimit`]. `bloom_funcs` arms an optional Bloom
/// pre-stage (0 disables it).
pub fn build_v1(
    mapping: impl IntoIterator<Item = (Vec<u8>, Vec<u8>)>,
    bit_limit: u8,
    bloom_funcs: u8,
) -> Result<FilterV1, Error> {
    let pairs: Vec<(Vec<u8>, Vec<u8>)> = mapping.into_iter().collect();
    build::build_v1(&pairs, bit_limit, bloom_funcs)
}

/// Same as [`build_v1`], but with string keys combined via
/// [`fold_strings`](crate::key::fold_strings) into one 64-byte block (a
/// convenience for callers whose natural key type is a string, not bytes).
pub fn build_v1_strings<'a>(
    mapping: impl IntoIterator<Item = (&'a str, Vec<u8>)>,
    bit_limit: u8,
    bloom_funcs: u8,
) -> Result<FilterV1, Error> {
    let pairs: Vec<(Vec<u8>, Vec<u8>)> = mapping
        .into_iter()
        .map(|(k, v)| (fold_strings(&[k]).to_vec(), v))
        .collect();
    build::build_v1(&pairs, bit_limit, bloom_funcs)
}

/// Looks up a numeric key in a v0 filter.
pub fn get_v0_numeric(filter: &FilterV0, key: u64) -> bool {
    filter.get_numeric(key)
}

/// Looks up a 64-byte key in a v0 filter.
pub fn get_v0_bytes(filter: &FilterV0, key: &[u8; 64]) -> bool {
    filter.get_bytes(key)
}

/// Looks up a string key in a v0 filter built by [`build_string`], using
/// the same short/long dispatch.
pub fn get_v0_string(filter: &FilterV0, key: &str) -> bool {
    match encode_string(key) {
        StringKey::Short(n) => filter.get_numeric(n),
        StringKey::Long(block) => filter.get_bytes(&block),
    }
}

/// Looks up a numeric key in a multi-filter; bit `i` of the result is
/// filter `i`'s answer.
pub fn get_multi(filter: &MultiFilter, key: u64) -> u64 {
    filter.get_numeric(key)
}

/// Looks up a byte key in a multi-filter; bit `i` of the result is filter
/// `i`'s answer.
pub fn get_multi_bytes(filter: &MultiFilter, key: &[u8]) -> u64 {
    filter.get_bytes(key)
}

/// Recovers up to `anslen` answer bits for `key` from a v1 filter, as
/// `ceil(anslen / 8)` big-endian bytes.
pub fn get_v1(filter: &FilterV1, anslen: u64, key: &[u8]) -> Result<Vec<u8>, Error> {
    filter.get(key, anslen)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn numeric_round_trip() {
        let filter = build_numeric([(5u64, true), (55u64, false)]);
        assert!(get_v0_numeric(&filter, 5));
        assert!(!get_v0_numeric(&filter, 55));
    }

    #[test]
    fn numeric_round_trip_at_scale() {
        let filter = build_numeric((0..10_000u64).map(|i| (i, i % 2 == 1)));
        for i in 0..10_000u64 {
            assert_eq!(get_v0_numeric(&filter, i), i % 2 == 1, "mismatch at {i}");
        }
    }

    #[test]
    fn string_round_trip_mixes_short_and_long_keys() {
        let filter =
            build_string([("a", true), ("b", false), ("0", true), ("", false)]);
        assert!(get_v0_string(&filter, "a"));
        assert!(!get_v0_string(&filter, "b"));
        assert!(get_v0_string(&filter, "0"));
        assert!(!get_v0_string(&filter, ""));
    }

    #[test]
    fn string_round_trip_at_scale() {
        let keys: Vec<String> = (0..20_000u64).map(|i| i.to_string()).collect();
        let filter = build_string(keys.iter().map(|k| (k.as_str(), {
            let i: u64 = k.parse().unwrap();
            i >= 10_000
        })));
        for (i, k) in keys.iter().enumerate() {
            assert_eq!(get_v0_string(&filter, k), i as u64 >= 10_000, "mismatch at {k}");
        }
    }

    #[test]
    fn v1_round_trip_single_byte_answers() {
        let mapping: Vec<(Vec<u8>, Vec<u8>)> = vec![
            (b"ok".to_vec(), vec![1]),
            (b"cool".to_vec(), vec![2]),
            (b"bad".to_vec(), vec![3]),
            (b"also".to_vec(), vec![4]),
            (b"again".to_vec(), vec![5]),
        ];
        let filter = build_v1(mapping.clone(), 8, 0).unwrap();
        for (key, answer) in &mapping {
            assert_eq!(&get_v1(&filter, 8, key).unwrap(), answer);
        }
    }

    #[test]
    fn v1_with_bloom_pre_stage_recovers_both_keys() {
        let mapping: Vec<(Vec<u8>, Vec<u8>)> =
            vec![(vec![41u8], vec![1]), (vec![52u8], vec![0])];
        let filter = build_v1(mapping, 1, 16).unwrap();
        assert_eq!(get_v1(&filter, 1, &[41u8]).unwrap(), vec![1]);
        assert_eq!(get_v1(&filter, 1, &[52u8]).unwrap(), vec![0]);

        let mut other_keys_rejected = 0;
        for b in 0u8..=255 {
            if b == 41 || b == 52 {
                continue;
            }
            if !filter.maybe_contains(&[b]) {
                other_keys_rejected += 1;
            }
        }
        assert!(other_keys_rejected >= 250, "only {other_keys_rejected} of 254 rejected");
    }

    #[test]
    fn multi_round_trip() {
        let filter = build_multi(3, [(5u64, 0b101), (55u64, 0b010)]);
        assert_eq!(get_multi(&filter, 5) & 0b111, 0b101);
        assert_eq!(get_multi(&filter, 55) & 0b111, 0b010);
    }
}
