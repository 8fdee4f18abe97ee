#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(warnings)]
//! keep mnemonic authentication core API library.
//!
//! Value types, the error taxonomy, the salted word hasher, the partial
//! word challenge, and the boundary contracts (account store, recovery
//! store, session issuer) that the flows in `keep_auth` are built on.
//! Everything here is transport-agnostic: plain data in, plain data or
//! typed errors out.

use std::sync::Arc;

mod error;
pub use error::*;

mod types;
pub use types::*;

mod hasher;
pub use hasher::*;

mod challenge;
pub use challenge::*;

pub mod store;
pub use store::*;

pub mod mem_store;

pub use word_bundle::HashAlg;

/// An account / username identifier.
pub type Identifier = Arc<str>;

/// A guardian identifier.
pub type GuardianId = Arc<str>;
