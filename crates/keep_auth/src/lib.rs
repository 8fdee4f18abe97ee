#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(warnings)]
//! keep mnemonic authentication flows.
//!
//! Three state machines over the boundary contracts of `keep_auth_api`:
//!
//! - registration: generate an identity, show the mnemonic once, persist
//!   salted word digests;
//! - login: draw a partial word challenge, verify the response, mint a
//!   session;
//! - recovery: re-key a locked-out account through m-of-n guardian
//!   approval instead of phrase knowledge.
//!
//! No secret ever crosses a boundary: stores see only salts, digests and
//! public keys.

pub mod registration;

pub mod login;

pub mod recovery;

pub use keep_auth_api::*;

/// Current unix time in seconds, taken once at each flow boundary.
pub(crate) fn now_unix() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("system clock before unix epoch")
        .as_secs()
}
