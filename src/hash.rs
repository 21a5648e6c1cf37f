pub mod sha2;

pub use sha2::Sha512;

/// A cryptographic hash function.
pub trait Hash {
    type Output;

    fn hash(&self, input: &[u8]) -> Self::Output;
}
