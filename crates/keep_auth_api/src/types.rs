//! Core value types and their wire encodings.
//!
//! Digests, public keys, and signatures travel as fixed-width lowercase
//! hex strings; salts and identifiers as opaque strings; challenge index
//! lists as small integer arrays.

use crate::{GuardianId, Identifier, KeepError, KeepResult};
use std::collections::HashSet;
use std::sync::Arc;

/// Minimum length of an account salt.
pub const MIN_SALT_LEN: usize = 16;

/// Wrapper newtype for serde encoding / decoding sized binary data as
/// fixed-width lowercase hex.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HexData<const N: usize>(pub Arc<[u8; N]>);

impl<const N: usize> std::fmt::Debug for HexData<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "HexData<{N}>({})", hex::encode(*self.0))
    }
}

impl<const N: usize> std::fmt::Display for HexData<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&hex::encode(*self.0))
    }
}

impl<const N: usize> std::str::FromStr for HexData<N> {
    type Err = KeepError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tmp = hex::decode(s).map_err(|e| KeepError::Other(e.to_string()))?;
        if tmp.len() != N {
            return Err(KeepError::Other(format!(
                "expected {} hex-encoded bytes, got {}",
                N,
                tmp.len()
            )));
        }
        let mut out = [0; N];
        out.copy_from_slice(&tmp);
        Ok(Self(Arc::new(out)))
    }
}

impl<const N: usize> HexData<N> {
    /// Get a clone of our inner `Arc<[u8; N]>`.
    pub fn cloned_inner(&self) -> Arc<[u8; N]> {
        self.0.clone()
    }
}

impl<const N: usize> From<[u8; N]> for HexData<N> {
    fn from(b: [u8; N]) -> Self {
        Self(Arc::new(b))
    }
}

impl<const N: usize> std::ops::Deref for HexData<N> {
    type Target = [u8; N];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<const N: usize> serde::Serialize for HexData<N> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&hex::encode(*self.0))
    }
}

impl<'de, const N: usize> serde::Deserialize<'de> for HexData<N> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let tmp: String = serde::Deserialize::deserialize(deserializer)?;
        tmp.parse().map_err(serde::de::Error::custom)
    }
}

/// A salted one-way word digest (the configured 32-byte width).
pub type WordHash = HexData<32>;

/// A public address: the configured digest of an account public key.
pub type Address = HexData<32>;

/// An ed25519 public key.
pub type PublicKey = HexData<32>;

/// An opaque per-account salt. Never secret, unique per identity.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Salt(pub Arc<str>);

impl Salt {
    /// Generate a fresh random salt (21 URL-safe characters).
    pub fn generate() -> Self {
        Self(nanoid::nanoid!().into())
    }

    /// Validate an externally supplied salt against the fixed minimum.
    pub fn parse(s: &str) -> KeepResult<Self> {
        if s.len() < MIN_SALT_LEN {
            return Err(KeepError::SaltTooShort);
        }
        Ok(Self(s.into()))
    }

    /// The salt as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Salt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// An ordered array of salted word digests, one per mnemonic position.
/// Position `i` always corresponds to word `i` for the lifetime of the
/// salt that produced it.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct WordHashArray(pub Vec<WordHash>);

impl WordHashArray {
    /// Number of word positions (9 or 12).
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if the array holds no positions.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The digest at position `index`, if in range.
    pub fn get(&self, index: usize) -> Option<&WordHash> {
        self.0.get(index)
    }
}

/// A partial verification challenge: which word positions are demanded,
/// for which account, under which salt. Created fresh per attempt and
/// consumed exactly once; positions only, never words.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Challenge {
    /// The challenged word positions, ascending.
    pub indices: Vec<usize>,

    /// The account identifier this challenge was issued for.
    pub issued_for: Identifier,

    /// The account's current salt, needed to hash the submitted words.
    pub salt: Salt,
}

/// The persisted account record. Owned by the external store; this core
/// reads and writes it only through the [crate::store] operations.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountRecord {
    /// Account identifier (the chosen username; display only, not secret).
    pub identifier: Identifier,

    /// Derived public address.
    pub address: Address,

    /// The account salt.
    pub salt: Salt,

    /// Salted word digests, one per mnemonic position.
    pub word_hashes: WordHashArray,

    /// The account ed25519 public key.
    pub public_key: PublicKey,
}

/// A pending guardian-approved re-keying of one account.
///
/// Mutated only by adding approvals (idempotent per guardian) until it
/// is finalized or expires.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoveryRequest {
    /// Request id.
    pub id: Arc<str>,

    /// The account being re-keyed.
    pub target: Identifier,

    /// Replacement salt, applied at finalize.
    pub new_salt: Salt,

    /// Replacement word digests, applied at finalize.
    pub new_word_hashes: WordHashArray,

    /// The designated guardian roster.
    pub guardians: HashSet<GuardianId>,

    /// Guardians that have approved so far.
    pub approvals: HashSet<GuardianId>,

    /// Approvals required before the request is finalizable.
    pub required_approvals: usize,

    /// Creation time, unix seconds.
    pub created_at: u64,

    /// Deadline, unix seconds; the request is unusable past this.
    pub expires_at: u64,
}

impl RecoveryRequest {
    /// True once the deadline has passed (`now` in unix seconds).
    pub fn is_expired(&self, now: u64) -> bool {
        now >= self.expires_at
    }

    /// True once approvals have reached the threshold.
    pub fn is_finalizable(&self, now: u64) -> bool {
        !self.is_expired(now) && self.approvals.len() >= self.required_approvals
    }
}

/// An authenticated session: the opaque token minted by the external
/// session issuer plus the account's public record. Passed explicitly to
/// whatever needs it; never ambient global state.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionContext {
    /// Opaque session token. This core never inspects it.
    pub token: Arc<str>,

    /// The authenticated account's record.
    pub account: AccountRecord,
}
