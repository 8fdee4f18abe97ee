//! Mnemonic encoding and decoding.
//!
//! Two schemes share one 11-bit packing: the nine-word scheme carries
//! 96 entropy bits + 3 checksum bits (99 bits = 9 x 11), the twelve-word
//! scheme is the industry-standard 128 + 4 layout. The scheme is decided
//! once, by word count, when a bundle is parsed.

use crate::wordlist;
use rand::RngCore;
use sha2::{Digest, Sha256};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Errors arising from mnemonic encoding / decoding.
#[derive(Debug, thiserror::Error)]
pub enum MnemonicError {
    /// A word is not in the dictionary.
    #[error("word not in dictionary: {0:?}")]
    InvalidWord(String),

    /// The embedded checksum does not match the recovered entropy.
    #[error("mnemonic checksum mismatch")]
    ChecksumMismatch,

    /// The word count is not one this library encodes.
    #[error("unsupported mnemonic length: {0} words (expected 9 or 12)")]
    UnsupportedLength(usize),

    /// Entropy byte length does not fit the scheme.
    #[error("entropy must be {expected} bytes for this scheme, got {got}")]
    BadEntropyLength {
        /// Required byte count.
        expected: usize,
        /// Supplied byte count.
        got: usize,
    },
}

/// Mnemonic result type.
pub type MnemonicResult<T> = Result<T, MnemonicError>;

/// Scheme tag: which of the two supported encodings a bundle uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MnemonicScheme {
    /// Nine words: 96 bits of entropy, 3-bit checksum.
    Nine,
    /// Twelve words: 128 bits of entropy, 4-bit checksum (the
    /// industry-standard layout, accepted for compatibility).
    Twelve,
}

impl MnemonicScheme {
    /// Number of words in a bundle of this scheme.
    pub fn word_count(&self) -> usize {
        match self {
            MnemonicScheme::Nine => 9,
            MnemonicScheme::Twelve => 12,
        }
    }

    /// Entropy length in bytes.
    pub fn entropy_len(&self) -> usize {
        match self {
            MnemonicScheme::Nine => 12,
            MnemonicScheme::Twelve => 16,
        }
    }

    /// Checksum length in bits.
    pub fn checksum_bits(&self) -> usize {
        match self {
            MnemonicScheme::Nine => 3,
            MnemonicScheme::Twelve => 4,
        }
    }

    /// Resolve the scheme from a word count.
    pub fn from_word_count(count: usize) -> MnemonicResult<Self> {
        match count {
            9 => Ok(MnemonicScheme::Nine),
            12 => Ok(MnemonicScheme::Twelve),
            oth => Err(MnemonicError::UnsupportedLength(oth)),
        }
    }
}

/// Checksum bits for a given entropy buffer: the top bits of the first
/// byte of its SHA-256 digest.
fn checksum_of(entropy: &[u8], cs_bits: usize) -> u8 {
    Sha256::digest(entropy)[0] >> (8 - cs_bits)
}

/// A validated mnemonic word sequence plus its scheme tag.
///
/// The words are secret material: they zeroize on drop and are redacted
/// from `Debug` output.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct Mnemonic {
    #[zeroize(skip)]
    scheme: MnemonicScheme,
    words: Vec<String>,
}

impl std::fmt::Debug for Mnemonic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mnemonic")
            .field("scheme", &self.scheme)
            .finish_non_exhaustive()
    }
}

impl Mnemonic {
    /// Generate a fresh mnemonic from operating-system entropy.
    pub fn generate(scheme: MnemonicScheme) -> Self {
        let mut entropy = vec![0u8; scheme.entropy_len()];
        rand::rngs::OsRng.fill_bytes(&mut entropy);
        let out = Self::from_entropy(scheme, &entropy)
            .expect("entropy length is correct by construction");
        entropy.zeroize();
        out
    }

    /// Encode raw entropy as a mnemonic of the given scheme.
    pub fn from_entropy(scheme: MnemonicScheme, entropy: &[u8]) -> MnemonicResult<Self> {
        if entropy.len() != scheme.entropy_len() {
            return Err(MnemonicError::BadEntropyLength {
                expected: scheme.entropy_len(),
                got: entropy.len(),
            });
        }

        let cs_bits = scheme.checksum_bits();
        let checksum = checksum_of(entropy, cs_bits);
        let ent_bits = entropy.len() * 8;

        // entropy_bits || checksum_bits, read 11 bits per word
        let bit_at = |i: usize| -> u16 {
            if i < ent_bits {
                u16::from((entropy[i / 8] >> (7 - (i % 8))) & 1)
            } else {
                u16::from((checksum >> (cs_bits - 1 - (i - ent_bits))) & 1)
            }
        };

        let words = (0..scheme.word_count())
            .map(|w| {
                let mut index = 0u16;
                for b in 0..11 {
                    index = (index << 1) | bit_at(w * 11 + b);
                }
                wordlist::WORDLIST[index as usize].to_string()
            })
            .collect();

        Ok(Self { scheme, words })
    }

    /// Parse and validate a word sequence. The scheme is chosen by word
    /// count; words are whitespace-trimmed and lowercased before dictionary
    /// lookup so user entry variance does not reject a correct phrase.
    pub fn from_words<I, W>(words: I) -> MnemonicResult<Self>
    where
        I: IntoIterator<Item = W>,
        W: AsRef<str>,
    {
        let words: Vec<String> = words
            .into_iter()
            .map(|w| w.as_ref().trim().to_lowercase())
            .collect();
        let scheme = MnemonicScheme::from_word_count(words.len())?;
        let out = Self { scheme, words };
        // validates dictionary membership and the checksum
        out.to_entropy()?;
        Ok(out)
    }

    /// Parse a whole phrase, splitting on any whitespace.
    pub fn from_phrase(phrase: &str) -> MnemonicResult<Self> {
        Self::from_words(phrase.split_whitespace())
    }

    /// Recover the raw entropy, verifying the checksum bit-for-bit.
    pub fn to_entropy(&self) -> MnemonicResult<Vec<u8>> {
        let indices = self
            .words
            .iter()
            .map(|w| {
                wordlist::index_of(w)
                    .ok_or_else(|| MnemonicError::InvalidWord(w.clone()))
            })
            .collect::<MnemonicResult<Vec<u16>>>()?;

        let cs_bits = self.scheme.checksum_bits();
        let ent_len = self.scheme.entropy_len();
        let ent_bits = ent_len * 8;

        let bit_at =
            |i: usize| -> u8 { ((indices[i / 11] >> (10 - (i % 11))) & 1) as u8 };

        let mut entropy = vec![0u8; ent_len];
        for i in 0..ent_bits {
            entropy[i / 8] |= bit_at(i) << (7 - (i % 8));
        }

        let mut embedded = 0u8;
        for i in ent_bits..ent_bits + cs_bits {
            embedded = (embedded << 1) | bit_at(i);
        }

        if embedded != checksum_of(&entropy, cs_bits) {
            return Err(MnemonicError::ChecksumMismatch);
        }

        Ok(entropy)
    }

    /// The scheme this bundle was parsed or generated with.
    pub fn scheme(&self) -> MnemonicScheme {
        self.scheme
    }

    /// The words, in position order.
    pub fn words(&self) -> &[String] {
        &self.words
    }

    /// Number of words (9 or 12).
    pub fn word_count(&self) -> usize {
        self.words.len()
    }

    /// The canonical single-space-joined phrase. Secret material: callers
    /// display it at most once and never persist it.
    pub fn phrase(&self) -> String {
        self.words.join(" ")
    }
}
