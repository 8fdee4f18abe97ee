//! Boundary contracts with the excluded collaborators: account persistence,
//! recovery-request persistence, and session-token issuance.
//!
//! The core is invoked with plain data and returns plain data or typed
//! errors; network I/O, timeouts, and cancellation live behind these
//! traits, never inside the hashing / derivation logic.

use crate::*;
use futures::future::BoxFuture;
use std::future::Future;
use std::sync::Arc;

/// Helper traits for store types - you probably don't need these unless
/// you are implementing a new storage backend.
pub mod traits {
    use super::*;

    /// Defines the account persistence boundary.
    pub trait AsAccountStore: 'static + Send + Sync {
        /// Fetch an account's salt.
        fn get_salt(
            &self,
            identifier: Identifier,
        ) -> BoxFuture<'static, KeepResult<Salt>>;

        /// Fetch an account's stored word digests.
        fn get_word_hashes(
            &self,
            identifier: Identifier,
        ) -> BoxFuture<'static, KeepResult<WordHashArray>>;

        /// Fetch an account's full public record.
        fn get_account(
            &self,
            identifier: Identifier,
        ) -> BoxFuture<'static, KeepResult<AccountRecord>>;

        /// Persist a new account record.
        /// Should error if the identifier is already registered.
        fn put_account(
            &self,
            record: AccountRecord,
        ) -> BoxFuture<'static, KeepResult<()>>;

        /// Atomically replace an account's salt and word digests.
        fn replace_credentials(
            &self,
            identifier: Identifier,
            new_salt: Salt,
            new_word_hashes: WordHashArray,
        ) -> BoxFuture<'static, KeepResult<()>>;
    }

    /// Defines the recovery-request persistence boundary.
    pub trait AsRecoveryStore: 'static + Send + Sync {
        /// Persist a new recovery request, returning its id.
        fn create_request(
            &self,
            request: RecoveryRequest,
        ) -> BoxFuture<'static, KeepResult<Arc<str>>>;

        /// Record one guardian approval with atomic add-to-set semantics:
        /// concurrent approvals from distinct guardians are both kept, a
        /// repeat from the same guardian collapses to one.
        fn add_approval(
            &self,
            request_id: Arc<str>,
            guardian: GuardianId,
        ) -> BoxFuture<'static, KeepResult<()>>;

        /// Fetch a recovery request by id.
        fn get_request(
            &self,
            request_id: Arc<str>,
        ) -> BoxFuture<'static, KeepResult<RecoveryRequest>>;

        /// Delete a recovery request. Errors with [KeepError::RequestNotFound]
        /// if absent, which makes it the atomic claim for finalization.
        fn delete_request(
            &self,
            request_id: Arc<str>,
        ) -> BoxFuture<'static, KeepResult<()>>;
    }

    /// Defines the session-token issuance boundary. Invoked only after
    /// successful verification; tokens are opaque to this core.
    pub trait AsSessionIssuer: 'static + Send + Sync {
        /// Mint an opaque session token for an authenticated account.
        fn issue_token(
            &self,
            identifier: Identifier,
        ) -> BoxFuture<'static, KeepResult<Arc<str>>>;
    }
}
use traits::*;

/// A handle to an account persistence backend.
#[derive(Clone)]
pub struct AccountStore(pub Arc<dyn AsAccountStore>);

impl AccountStore {
    /// Fetch an account's salt.
    pub fn get_salt(
        &self,
        identifier: Identifier,
    ) -> impl Future<Output = KeepResult<Salt>> + 'static + Send {
        AsAccountStore::get_salt(&*self.0, identifier)
    }

    /// Fetch an account's stored word digests.
    pub fn get_word_hashes(
        &self,
        identifier: Identifier,
    ) -> impl Future<Output = KeepResult<WordHashArray>> + 'static + Send {
        AsAccountStore::get_word_hashes(&*self.0, identifier)
    }

    /// Fetch an account's full public record.
    pub fn get_account(
        &self,
        identifier: Identifier,
    ) -> impl Future<Output = KeepResult<AccountRecord>> + 'static + Send {
        AsAccountStore::get_account(&*self.0, identifier)
    }

    /// Persist a new account record.
    pub fn put_account(
        &self,
        record: AccountRecord,
    ) -> impl Future<Output = KeepResult<()>> + 'static + Send {
        AsAccountStore::put_account(&*self.0, record)
    }

    /// Atomically replace an account's salt and word digests.
    pub fn replace_credentials(
        &self,
        identifier: Identifier,
        new_salt: Salt,
        new_word_hashes: WordHashArray,
    ) -> impl Future<Output = KeepResult<()>> + 'static + Send {
        AsAccountStore::replace_credentials(&*self.0, identifier, new_salt, new_word_hashes)
    }
}

/// A handle to a recovery-request persistence backend.
#[derive(Clone)]
pub struct RecoveryStore(pub Arc<dyn AsRecoveryStore>);

impl RecoveryStore {
    /// Persist a new recovery request, returning its id.
    pub fn create_request(
        &self,
        request: RecoveryRequest,
    ) -> impl Future<Output = KeepResult<Arc<str>>> + 'static + Send {
        AsRecoveryStore::create_request(&*self.0, request)
    }

    /// Record one guardian approval (idempotent per guardian).
    pub fn add_approval(
        &self,
        request_id: Arc<str>,
        guardian: GuardianId,
    ) -> impl Future<Output = KeepResult<()>> + 'static + Send {
        AsRecoveryStore::add_approval(&*self.0, request_id, guardian)
    }

    /// Fetch a recovery request by id.
    pub fn get_request(
        &self,
        request_id: Arc<str>,
    ) -> impl Future<Output = KeepResult<RecoveryRequest>> + 'static + Send {
        AsRecoveryStore::get_request(&*self.0, request_id)
    }

    /// Delete a recovery request (the atomic finalize claim).
    pub fn delete_request(
        &self,
        request_id: Arc<str>,
    ) -> impl Future<Output = KeepResult<()>> + 'static + Send {
        AsRecoveryStore::delete_request(&*self.0, request_id)
    }
}

/// A handle to the session-token issuer.
#[derive(Clone)]
pub struct SessionIssuer(pub Arc<dyn AsSessionIssuer>);

impl SessionIssuer {
    /// Mint an opaque session token for an authenticated account.
    pub fn issue_token(
        &self,
        identifier: Identifier,
    ) -> impl Future<Output = KeepResult<Arc<str>>> + 'static + Send {
        AsSessionIssuer::issue_token(&*self.0, identifier)
    }
}
