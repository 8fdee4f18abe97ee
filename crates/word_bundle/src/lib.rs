#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(warnings)]
//! Word-bundle parsing and generation library.
//!
//! A word bundle is a short mnemonic word sequence encoding a secret seed:
//! nine words carry 96 bits of entropy with a 3-bit checksum, twelve words
//! carry the industry-standard 128 bits with a 4-bit checksum. A validated
//! bundle deterministically derives an ed25519 identity keypair and a
//! hex-encoded public address.

pub mod wordlist;

mod digest;
pub use digest::*;

mod mnemonic;
pub use mnemonic::*;

mod derivation;
pub use derivation::*;
