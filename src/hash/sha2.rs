//! SHA-512 is a hash function specified by [FIPS
//! 180-4](https://nvlpubs.nist.gov/nistpubs/FIPS/NIST.FIPS.180-4.pdf).
//!
//! SHA-512 operates on 64-bit words instead of the 32-bit words used by
//! SHA-256, giving it a larger internal state and a larger digest. The
//! digest is used throughout this crate as the keyed digest input to the
//! [v1 filter](crate::v1) construction, where the 8 internal state words are
//! consumed directly as the round key material rather than concatenated
//! into a byte string.

use {crate::Hash, docext::docext, std::iter};

pub const BLOCK_BYTES: usize = 128;

/// A preimage block.
pub type Block = [u8; BLOCK_BYTES];

/// The internal state of [SHA-512](Sha512), also the shape of its digest.
pub type Sha512State = [u64; 8];

/// The $K_t^{512}$ constants for [SHA-512](Sha512).
#[docext]
pub const KT_512: [u64; 80] = [
    0x428a2f98d728ae22,
    0x7137449123ef65cd,
    0xb5c0fbcfec4d3b2f,
    0xe9b5dba58189dbbc,
    0x3956c25bf348b538,
    0x59f111f1b605d019,
    0x923f82a4af194f9b,
    0xab1c5ed5da6d8118,
    0xd807aa98a3030242,
    0x12835b0145706fbe,
    0x243185be4ee4b28c,
    0x550c7dc3d5ffb4e2,
    0x72be5d74f27b896f,
    0x80deb1fe3b1696b1,
    0x9bdc06a725c71235,
    0xc19bf174cf692694,
    0xe49b69c19ef14ad2,
    0xefbe4786384f25e3,
    0x0fc19dc68b8cd5b5,
    0x240ca1cc77ac9c65,
    0x2de92c6f592b0275,
    0x4a7484aa6ea6e483,
    0x5cb0a9dcbd41fbd4,
    0x76f988da831153b5,
    0x983e5152ee66dfab,
    0xa831c66d2db43210,
    0xb00327c898fb213f,
    0xbf597fc7beef0ee4,
    0xc6e00bf33da88fc2,
    0xd5a79147930aa725,
    0x06ca6351e003826f,
    0x142929670a0e6e70,
    0x27b70a8546d22ffc,
    0x2e1b21385c26c926,
    0x4d2c6dfc5ac42aed,
    0x53380d139d95b3df,
    0x650a73548baf63de,
    0x766a0abb3c77b2a8,
    0x81c2c92e47edaee6,
    0x92722c851482353b,
    0xa2bfe8a14cf10364,
    0xa81a664bbc423001,
    0xc24b8b70d0f89791,
    0xc76c51a30654be30,
    0xd192e819d6ef5218,
    0xd69906245565a910,
    0xf40e35855771202a,
    0x106aa07032bbd1b8,
    0x19a4c116b8d2d0c8,
    0x1e376c085141ab53,
    0x2748774cdf8eeb99,
    0x34b0bcb5e19b48a8,
    0x391c0cb3c5c95a63,
    0x4ed8aa4ae3418acb,
    0x5b9cca4f7763e373,
    0x682e6ff3d6b2b8a3,
    0x748f82ee5defb2fc,
    0x78a5636f43172f60,
    0x84c87814a1f0ab72,
    0x8cc702081a6439ec,
    0x90befffa23631e28,
    0xa4506cebde82bde9,
    0xbef9a3f7b2c67915,
    0xc67178f2e372532b,
    0xca273eceea26619c,
    0xd186b8c721c0c207,
    0xeada7dd6cde0eb1e,
    0xf57d4f7fee6ed178,
    0x06f067aa72176fba,
    0x0a637dc5a2c898a6,
    0x113f9804bef90dae,
    0x1b710b35131c471b,
    0x28db77f523047d84,
    0x32caab7b40c72493,
    0x3c9ebe0a15c9bebc,
    0x431d67c49c100d4c,
    0x4cc5d4becb3e42b6,
    0x597f299cfc657e2a,
    0x5fcb6fab3ad6faec,
    0x6c44198c4a475817,
];

/// SHA-512 hash specified by [FIPS
/// 180-4](https://nvlpubs.nist.gov/nistpubs/FIPS/NIST.FIPS.180-4.pdf).
///
/// For more details, see the [module documentation](self).
#[derive(Debug, Default)]
pub struct Sha512(());

impl Hash for Sha512 {
    type Output = [u8; 64];

    fn hash(&self, input: &[u8]) -> Self::Output {
        let mut result = [0; 64];
        digest(input)
            .into_iter()
            .flat_map(u64::to_be_bytes)
            .zip(result.iter_mut())
            .for_each(|(b, r)| *r = b);
        result
    }
}

/// The SHA-512 digest of `preimage`, read as sixteen big-endian 32-bit
/// words rather than 64 bytes.
///
/// The [v1 filter](crate::v1) construction indexes its round-pair schedule
/// by these words directly, rather than re-slicing a byte buffer at every
/// round.
pub fn digest_words(preimage: &[u8]) -> [u32; 16] {
    let mut bytes = [0u8; 64];
    digest(preimage)
        .into_iter()
        .flat_map(u64::to_be_bytes)
        .zip(bytes.iter_mut())
        .for_each(|(b, r)| *r = b);
    let mut words = [0u32; 16];
    words
        .iter_mut()
        .zip(bytes.chunks_exact(4))
        .for_each(|(w, b)| *w = u32::from_be_bytes(b.try_into().unwrap()));
    words
}

/// Runs the full SHA-512 compression chain over the padded preimage and
/// returns the raw 8-word state, without serializing it to bytes.
///
/// The [v1 filter](crate::v1) construction uses this state directly as
/// round key material, so it is exposed separately from [`Hash::hash`].
pub fn digest(preimage: &[u8]) -> Sha512State {
    let mut state: Sha512State = [
        0x6a09e667f3bcc908,
        0xbb67ae8584caa73b,
        0x3c6ef372fe94f82b,
        0xa54ff53a5f1d36f1,
        0x510e527fade682d1,
        0x9b05688c2b3e6c1f,
        0x1f83d9abfb41bd6b,
        0x5be0cd19137e2179,
    ];
    for block in pad(preimage) {
        state = compress(state, block);
    }
    state
}

/// The compression function underlying [SHA-512](Sha512).
///
/// Applies 80 rounds of the following permutation, where $a, b, c, \dots$
/// represent the current state in 64-bit words, $W_i$ is the message
/// schedule (described below), [$\Sigma_0^{512}$](uppercase_sigma_0),
/// [$\Sigma_1^{512}$](uppercase_sigma_1), [$Ch$](ch), and [$Maj$](maj) are
/// helper functions, and [$K_t^{512}$](KT_512) are the round constants:
///
/// $$
/// T_1 = h + \Sigma_1^{512}(e) + Ch(e, f, g) + K_t^{512} + W_0
/// \pmod{2^{64}}\\
/// T_2 = \Sigma_0^{512}(a) + Maj(a, b, c) \pmod{2^{64}}\\
/// h \gets g\\
/// g \gets f\\
/// f \gets e\\
/// e \gets d + T_1\\
/// d \gets c\\
/// c \gets b\\
/// b \gets a\\
/// a \gets T_1 + T_2
/// $$
///
/// The message schedule $W$ is a 16 element array of 64-bit words,
/// initialized to the current preimage block and updated at the end of
/// each round as follows, where [$\sigma_0^{512}$](lowercase_sigma_0) and
/// [$\sigma_1^{512}$](lowercase_sigma_1) are helper functions:
///
/// $$
/// T = \sigma_1^{512}(W_{14}) + W_9 + \sigma_0^{512}(W_1) + W_0
/// \pmod{2^{64}}\\
/// W_i \gets W_{i + 1}, \forall i \in \{0, 1, \dots, 14\}\\
/// W_{15} \gets T
/// $$
///
/// The final state is the sum, word by word, of the state entering the
/// round and the state produced by the rounds above. Because the new state
/// is derived this way, the construction as a whole is a
/// [Merkle-Damgard](https://en.wikipedia.org/wiki/Merkle%E2%80%93Damg%C3%A5rd_construction)
/// hash and is vulnerable to length-extension attacks.
fn compress(state: Sha512State, block: Block) -> Sha512State {
    let mut schedule = [0u64; 16];
    schedule
        .iter_mut()
        .zip(block.chunks_exact(8))
        .for_each(|(s, b)| *s = u64::from_be_bytes(b.try_into().unwrap()));

    let mut a = state[0];
    let mut b = state[1];
    let mut c = state[2];
    let mut d = state[3];
    let mut e = state[4];
    let mut f = state[5];
    let mut g = state[6];
    let mut h = state[7];
    #[allow(clippy::needless_range_loop)]
    for t in 0..80 {
        let wt = schedule[0];
        let temp1 = h
            .wrapping_add(uppercase_sigma_1(e))
            .wrapping_add(ch(e, f, g))
            .wrapping_add(KT_512[t])
            .wrapping_add(wt);
        let temp2 = uppercase_sigma_0(a).wrapping_add(maj(a, b, c));
        h = g;
        g = f;
        f = e;
        e = d.wrapping_add(temp1);
        d = c;
        c = b;
        b = a;
        a = temp1.wrapping_add(temp2);

        let next = lowercase_sigma_1(schedule[14])
            .wrapping_add(schedule[9])
            .wrapping_add(lowercase_sigma_0(schedule[1]))
            .wrapping_add(schedule[0]);
        schedule.rotate_left(1);
        schedule[15] = next;
    }

    [
        state[0].wrapping_add(a),
        state[1].wrapping_add(b),
        state[2].wrapping_add(c),
        state[3].wrapping_add(d),
        state[4].wrapping_add(e),
        state[5].wrapping_add(f),
        state[6].wrapping_add(g),
        state[7].wrapping_add(h),
    ]
}

/// Helper function $Ch$.
///
/// $$
/// Ch(x, y, z) = (x \land y) \oplus (\neg x \land z)
/// $$
#[docext]
pub fn ch(x: u64, y: u64, z: u64) -> u64 {
    (x & y) ^ ((!x) & z)
}

/// Helper function $Maj$.
///
/// $$
/// Maj(x, y, z) = (x \land y) \oplus (x \land z) \oplus (y \land z)
/// $$
#[docext]
pub fn maj(x: u64, y: u64, z: u64) -> u64 {
    (x & y) ^ (x & z) ^ (y & z)
}

/// Helper function $\Sigma_0^{512}$.
///
/// $$
/// \Sigma_0^{512}(x) = \mathrm{ROTR}(x, 28) \oplus \mathrm{ROTR}(x, 34) \oplus
/// \mathrm{ROTR}(x, 39) $$
///
/// Where $\mathrm{ROTR}$ is bitwise rotation to the right.
#[docext]
pub fn uppercase_sigma_0(x: u64) -> u64 {
    x.rotate_right(28) ^ x.rotate_right(34) ^ x.rotate_right(39)
}

/// Helper function $\Sigma_1^{512}$.
///
/// $$
/// \Sigma_1^{512}(x) = \mathrm{ROTR}(x, 14) \oplus \mathrm{ROTR}(x, 18) \oplus
/// \mathrm{ROTR}(x, 41) $$
///
/// Where $\mathrm{ROTR}$ is bitwise rotation to the right.
#[docext]
pub fn uppercase_sigma_1(x: u64) -> u64 {
    x.rotate_right(14) ^ x.rotate_right(18) ^ x.rotate_right(41)
}

/// Helper function $\sigma_0^{512}$.
///
/// $$
/// \sigma_0^{512}(x) = \mathrm{ROTR}(x, 1) \oplus \mathrm{ROTR}(x, 8) \oplus
/// (x \gg 7) $$
///
/// Where $\mathrm{ROTR}$ is bitwise rotation to the right, and $\gg$ is the
/// bitwise right shift operation.
#[docext]
pub fn lowercase_sigma_0(x: u64) -> u64 {
    x.rotate_right(1) ^ x.rotate_right(8) ^ (x >> 7)
}

/// Helper function $\sigma_1^{512}$.
///
/// $$
/// \sigma_1^{512}(x) = \mathrm{ROTR}(x, 19) \oplus \mathrm{ROTR}(x, 61) \oplus
/// (x \gg 6) $$
///
/// Where $\mathrm{ROTR}$ is bitwise rotation to the right, and $\gg$ is the
/// bitwise right shift operation.
#[docext]
pub fn lowercase_sigma_1(x: u64) -> u64 {
    x.rotate_right(19) ^ x.rotate_right(61) ^ (x >> 6)
}

/// SHA-512 length padding.
///
/// The preimage is padded by appending a single 1 bit, followed by as many
/// bits as needed to pad to a multiple of 1024 - 128 = 896 bits, followed by
/// the _bit length_ of the preimage encoded as an unsigned big-endian 128
/// bit integer. The high 64 bits of the length field are always zero, since
/// no preimage handled by this crate approaches $2^{64}$ bits; this keeps
/// the implementation symmetric with the 1024-bit block size without
/// needing a 128-bit integer type.
fn pad(preimage: &[u8]) -> impl Iterator<Item = Block> + '_ {
    preimage
        .chunks(BLOCK_BYTES)
        .chain(iter::once([].as_slice()).take(if preimage.len() % BLOCK_BYTES == 0 {
            1
        } else {
            0
        }))
        .flat_map(move |chunk| {
            if chunk.len() == BLOCK_BYTES {
                vec![chunk.try_into().unwrap()]
            } else if BLOCK_BYTES - chunk.len() <= 16 {
                let mut block = [0u8; BLOCK_BYTES];
                block[..chunk.len()].copy_from_slice(chunk);
                block[chunk.len()] = 0x80;
                let mut next = [0u8; BLOCK_BYTES];
                next[BLOCK_BYTES - 8..]
                    .copy_from_slice(&u64::try_from(8 * preimage.len()).unwrap().to_be_bytes());
                vec![block, next]
            } else {
                let mut block = [0u8; BLOCK_BYTES];
                block[..chunk.len()].copy_from_slice(chunk);
                block[chunk.len()] = 0x80;
                block[BLOCK_BYTES - 8..]
                    .copy_from_slice(&u64::try_from(8 * preimage.len()).unwrap().to_be_bytes());
                vec![block]
            }
        })
}
