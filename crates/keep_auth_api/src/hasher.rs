//! Salted per-word hashing.
//!
//! `hash(word, salt) = H(normalize(word) ++ ":" ++ salt)` under the one
//! configured digest. Deterministic and one-way; used both for durable
//! storage and for live challenge verification, so a full phrase is never
//! compared (or stored) at once.

use crate::{Salt, WordHash, WordHashArray};
use word_bundle::HashAlg;

/// The salted word hasher. Cheap to copy; stateless between calls.
#[derive(Debug, Clone, Copy)]
pub struct WordHasher {
    alg: HashAlg,
}

impl WordHasher {
    /// Build a hasher over the configured digest algorithm.
    pub fn new(alg: HashAlg) -> Self {
        Self { alg }
    }

    /// The configured digest algorithm.
    pub fn alg(&self) -> HashAlg {
        self.alg
    }

    /// Normalize user word entry: trim surrounding whitespace, lowercase.
    /// Entry variance in case or spacing must not cause false negatives.
    pub fn normalize(word: &str) -> String {
        word.trim().to_lowercase()
    }

    /// Hash one word under the account salt.
    pub fn hash(&self, word: &str, salt: &Salt) -> WordHash {
        let normalized = Self::normalize(word);
        let preimage = format!("{}:{}", normalized, salt.as_str());
        self.alg.digest(preimage.as_bytes()).into()
    }

    /// Hash every word of a mnemonic in position order.
    pub fn hash_all(&self, words: &[String], salt: &Salt) -> WordHashArray {
        WordHashArray(words.iter().map(|w| self.hash(w, salt)).collect())
    }
}
