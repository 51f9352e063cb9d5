//! Digest helpers used by the resolver.

use crate::HashError;
use md5::{Digest, Md5};

/// Computes the hex MD5 digest of a string.
pub trait HashProvider: Send + Sync {
    /// Returns the lowercase hex MD5 digest of `input`.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] if the algorithm is unavailable on this host.
    fn md5_hex(&self, input: &str) -> Result<String, HashError>;
}

/// [`HashProvider`] backed by the RustCrypto `md-5` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct Md5Hasher;

impl HashProvider for Md5Hasher {
    fn md5_hex(&self, input: &str) -> Result<String, HashError> {
        let mut hasher = Md5::new();
        hasher.update(input.as_bytes());
        Ok(hex::encode(hasher.finalize()))
    }
}

/// The platform's 32-bit string hash: `h = 31 * h + unit` over UTF-16 code units.
pub(crate) fn string_hash(s: &str) -> i32 {
    s.encode_utf16()
        .fold(0i32, |h, unit| h.wrapping_mul(31).wrapping_add(i32::from(unit)))
}
