//! In-memory store backends - usually for testing, also suitable for
//! fully in-process embeddings.

use crate::store::traits::*;
use crate::*;
use futures::future::{BoxFuture, FutureExt};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Create an in-memory [AccountStore].
pub fn create_mem_account_store() -> AccountStore {
    AccountStore(Arc::new(PrivMemAccountStore(Arc::new(RwLock::new(
        HashMap::new(),
    )))))
}

/// Create an in-memory [RecoveryStore].
pub fn create_mem_recovery_store() -> RecoveryStore {
    RecoveryStore(Arc::new(PrivMemRecoveryStore(Arc::new(RwLock::new(
        HashMap::new(),
    )))))
}

/// Create a [SessionIssuer] minting random opaque tokens.
pub fn create_mem_session_issuer() -> SessionIssuer {
    SessionIssuer(Arc::new(PrivMemSessionIssuer))
}

// -- private -- //

struct PrivMemAccountStore(Arc<RwLock<HashMap<Identifier, AccountRecord>>>);

impl AsAccountStore for PrivMemAccountStore {
    fn get_salt(
        &self,
        identifier: Identifier,
    ) -> BoxFuture<'static, KeepResult<Salt>> {
        let res = self
            .0
            .read()
            .get(&identifier)
            .map(|r| r.salt.clone())
            .ok_or_else(|| KeepError::AccountNotFound(identifier.to_string()));
        async move { res }.boxed()
    }

    fn get_word_hashes(
        &self,
        identifier: Identifier,
    ) -> BoxFuture<'static, KeepResult<WordHashArray>> {
        let res = self
            .0
            .read()
            .get(&identifier)
            .map(|r| r.word_hashes.clone())
            .ok_or_else(|| KeepError::AccountNotFound(identifier.to_string()));
        async move { res }.boxed()
    }

    fn get_account(
        &self,
        identifier: Identifier,
    ) -> BoxFuture<'static, KeepResult<AccountRecord>> {
        let res = self
            .0
            .read()
            .get(&identifier)
            .cloned()
            .ok_or_else(|| KeepError::AccountNotFound(identifier.to_string()));
        async move { res }.boxed()
    }

    fn put_account(
        &self,
        record: AccountRecord,
    ) -> BoxFuture<'static, KeepResult<()>> {
        let res = (|| {
            if record.salt.as_str().len() < MIN_SALT_LEN {
                return Err(KeepError::SaltTooShort);
            }
            let mut lock = self.0.write();
            if lock.contains_key(&record.identifier) {
                return Err(KeepError::AccountExists(record.identifier.to_string()));
            }
            tracing::debug!(identifier = %record.identifier, "account registered");
            lock.insert(record.identifier.clone(), record);
            Ok(())
        })();
        async move { res }.boxed()
    }

    fn replace_credentials(
        &self,
        identifier: Identifier,
        new_salt: Salt,
        new_word_hashes: WordHashArray,
    ) -> BoxFuture<'static, KeepResult<()>> {
        let res = match self.0.write().get_mut(&identifier) {
            Some(record) => {
                record.salt = new_salt;
                record.word_hashes = new_word_hashes;
                tracing::debug!(identifier = %identifier, "credentials replaced");
                Ok(())
            }
            None => Err(KeepError::AccountNotFound(identifier.to_string())),
        };
        async move { res }.boxed()
    }
}

struct PrivMemRecoveryStore(Arc<RwLock<HashMap<Arc<str>, RecoveryRequest>>>);

impl AsRecoveryStore for PrivMemRecoveryStore {
    fn create_request(
        &self,
        request: RecoveryRequest,
    ) -> BoxFuture<'static, KeepResult<Arc<str>>> {
        let id = request.id.clone();
        let res = {
            let mut lock = self.0.write();
            if lock.contains_key(&id) {
                Err("request id already registered".into())
            } else {
                lock.insert(id.clone(), request);
                Ok(id)
            }
        };
        async move { res }.boxed()
    }

    fn add_approval(
        &self,
        request_id: Arc<str>,
        guardian: GuardianId,
    ) -> BoxFuture<'static, KeepResult<()>> {
        // single write lock: two distinct guardians racing are both kept,
        // a repeat insert from one guardian is a set no-op
        let res = match self.0.write().get_mut(&request_id) {
            Some(request) => {
                request.approvals.insert(guardian);
                Ok(())
            }
            None => Err(KeepError::RequestNotFound),
        };
        async move { res }.boxed()
    }

    fn get_request(
        &self,
        request_id: Arc<str>,
    ) -> BoxFuture<'static, KeepResult<RecoveryRequest>> {
        let res = self
            .0
            .read()
            .get(&request_id)
            .cloned()
            .ok_or(KeepError::RequestNotFound);
        async move { res }.boxed()
    }

    fn delete_request(
        &self,
        request_id: Arc<str>,
    ) -> BoxFuture<'static, KeepResult<()>> {
        let res = self
            .0
            .write()
            .remove(&request_id)
            .map(|_| ())
            .ok_or(KeepError::RequestNotFound);
        async move { res }.boxed()
    }
}

struct PrivMemSessionIssuer;

impl AsSessionIssuer for PrivMemSessionIssuer {
    fn issue_token(
        &self,
        _identifier: Identifier,
    ) -> BoxFuture<'static, KeepResult<Arc<str>>> {
        async move { Ok(nanoid::nanoid!().into()) }.boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use word_bundle::HashAlg;

    fn record(identifier: &str) -> AccountRecord {
        let hasher = WordHasher::new(HashAlg::Sha256);
        let salt = Salt::generate();
        let words: Vec<String> = (0..9).map(|i| format!("word{i}")).collect();
        AccountRecord {
            identifier: identifier.into(),
            address: [3; 32].into(),
            word_hashes: hasher.hash_all(&words, &salt),
            salt,
            public_key: [4; 32].into(),
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn duplicate_identifier_rejected() {
        let store = create_mem_account_store();
        store.put_account(record("alice")).await.unwrap();
        match store.put_account(record("alice")).await {
            Err(KeepError::AccountExists(id)) => assert_eq!("alice", id),
            oth => panic!("expected AccountExists, got {:?}", oth),
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn short_salt_rejected_at_the_boundary() {
        let store = create_mem_account_store();
        let mut rec = record("alice");
        rec.salt = Salt("short".into());
        assert!(matches!(
            store.put_account(rec).await,
            Err(KeepError::SaltTooShort)
        ));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn replace_credentials_swaps_salt_and_hashes() {
        let store = create_mem_account_store();
        let rec = record("alice");
        let old_salt = rec.salt.clone();
        store.put_account(rec).await.unwrap();

        let new_salt = Salt::generate();
        let hasher = WordHasher::new(HashAlg::Sha256);
        let words: Vec<String> = (0..9).map(|i| format!("new{i}")).collect();
        let new_hashes = hasher.hash_all(&words, &new_salt);
        store
            .replace_credentials("alice".into(), new_salt.clone(), new_hashes.clone())
            .await
            .unwrap();

        assert_ne!(old_salt, store.get_salt("alice".into()).await.unwrap());
        assert_eq!(new_salt, store.get_salt("alice".into()).await.unwrap());
        assert_eq!(new_hashes, store.get_word_hashes("alice".into()).await.unwrap());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn approval_is_idempotent_per_guardian() {
        let store = create_mem_recovery_store();
        let req = RecoveryRequest {
            id: "req-1".into(),
            target: "alice".into(),
            new_salt: Salt::generate(),
            new_word_hashes: WordHashArray(vec![[0; 32].into(); 9]),
            guardians: ["g1", "g2"].into_iter().map(Into::into).collect(),
            approvals: Default::default(),
            required_approvals: 2,
            created_at: 0,
            expires_at: u64::MAX,
        };
        store.create_request(req).await.unwrap();

        for _ in 0..3 {
            store.add_approval("req-1".into(), "g1".into()).await.unwrap();
        }
        let got = store.get_request("req-1".into()).await.unwrap();
        assert_eq!(1, got.approvals.len());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn concurrent_distinct_approvals_are_both_kept() {
        let store = create_mem_recovery_store();
        let req = RecoveryRequest {
            id: "req-1".into(),
            target: "alice".into(),
            new_salt: Salt::generate(),
            new_word_hashes: WordHashArray(vec![[0; 32].into(); 9]),
            guardians: (0..8).map(|i| format!("g{i}").into()).collect(),
            approvals: Default::default(),
            required_approvals: 8,
            created_at: 0,
            expires_at: u64::MAX,
        };
        store.create_request(req).await.unwrap();

        let mut tasks = Vec::new();
        for i in 0..8 {
            let store = store.clone();
            tasks.push(tokio::spawn(async move {
                store
                    .add_approval("req-1".into(), format!("g{i}").into())
                    .await
            }));
        }
        for t in tasks {
            t.await.unwrap().unwrap();
        }
        let got = store.get_request("req-1".into()).await.unwrap();
        assert_eq!(8, got.approvals.len());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn delete_is_an_atomic_claim() {
        let store = create_mem_recovery_store();
        let req = RecoveryRequest {
            id: "req-1".into(),
            target: "alice".into(),
            new_salt: Salt::generate(),
            new_word_hashes: WordHashArray(vec![[0; 32].into(); 9]),
            guardians: ["g1"].into_iter().map(Into::into).collect(),
            approvals: Default::default(),
            required_approvals: 1,
            created_at: 0,
            expires_at: u64::MAX,
        };
        store.create_request(req).await.unwrap();

        store.delete_request("req-1".into()).await.unwrap();
        assert!(matches!(
            store.delete_request("req-1".into()).await,
            Err(KeepError::RequestNotFound)
        ));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn issued_tokens_are_opaque_and_distinct() {
        let issuer = create_mem_session_issuer();
        let a = issuer.issue_token("alice".into()).await.unwrap();
        let b = issuer.issue_token("alice".into()).await.unwrap();
        assert_ne!(a, b);
    }
}
