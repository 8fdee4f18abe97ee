//! The one configured content digest shared by every component.
//!
//! Addresses, salted word hashes, and signing digests must all come from the
//! same function, so the algorithm is a single explicit parameter rather
//! than a per-call choice.

use sha2::Digest;

/// Digest algorithm selector. One instance is configured per deployment and
/// threaded through every component that hashes; components never pick an
/// algorithm on their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HashAlg {
    /// SHA-256. The canonical default.
    Sha256,
    /// Keccak-256 (pre-NIST padding), for deployments keyed to
    /// Keccak-style addresses.
    Keccak256,
}

impl Default for HashAlg {
    fn default() -> Self {
        HashAlg::Sha256
    }
}

impl HashAlg {
    /// Compute the 32-byte digest of `data`.
    pub fn digest(&self, data: &[u8]) -> [u8; 32] {
        match self {
            HashAlg::Sha256 => sha2::Sha256::digest(data).into(),
            HashAlg::Keccak256 => sha3::Keccak256::digest(data).into(),
        }
    }

    /// Compute the digest of `data` as lowercase hex.
    pub fn digest_hex(&self, data: &[u8]) -> String {
        hex::encode(self.digest(data))
    }
}
