//! Recovery flow:
//! `Initiated -> AwaitingApprovals -> Finalizable -> Finalized`,
//! with `Expired` reachable after the deadline.
//!
//! A user who lost their mnemonic cannot recover it - it was never
//! stored. They generate a brand-new identity and salt, and designated
//! guardians vouch for the re-keying. Once `m` of `n` guardians approve
//! and the deadline has not passed, a single finalize call swaps the
//! account's credentials and destroys the request.

use keep_auth_api::*;
use std::collections::HashSet;
use word_bundle::{Identity, MnemonicScheme};

/// A freshly initiated recovery: the request id plus the replacement
/// identity whose mnemonic the user must record now. Dropping this value
/// zeroizes the new mnemonic and signing key.
pub struct Initiated {
    request_id: std::sync::Arc<str>,
    identity: Identity,
    salt: Salt,
}

impl std::fmt::Debug for Initiated {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Initiated")
            .field("request_id", &self.request_id)
            .finish_non_exhaustive()
    }
}

impl Initiated {
    /// The persisted recovery request id, to hand to guardians.
    pub fn request_id(&self) -> std::sync::Arc<str> {
        self.request_id.clone()
    }

    /// The replacement mnemonic words, for one-time display. These become
    /// the account's credentials only after guardians approve and
    /// [finalize] succeeds.
    pub fn reveal_mnemonic(&self) -> &[String] {
        self.identity.mnemonic().words()
    }

    /// The replacement salt (persisted on the pending request).
    pub fn salt(&self) -> &Salt {
        &self.salt
    }
}

/// Where a recovery request stands, as observed at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryStatus {
    /// Below threshold; waiting on more guardians.
    AwaitingApprovals {
        /// Approvals recorded so far.
        approvals: usize,
        /// Approvals required.
        required: usize,
    },
    /// At or above threshold and not expired; ready to finalize.
    Finalizable,
    /// Past the deadline; only re-initiation can proceed.
    Expired,
}

fn status_of(request: &RecoveryRequest, now: u64) -> RecoveryStatus {
    if request.is_expired(now) {
        RecoveryStatus::Expired
    } else if request.is_finalizable(now) {
        RecoveryStatus::Finalizable
    } else {
        RecoveryStatus::AwaitingApprovals {
            approvals: request.approvals.len(),
            required: request.required_approvals,
        }
    }
}

/// Initiate recovery of `target`: generate a replacement identity and
/// salt, hash the new words, and persist a request requiring `required`
/// of the `guardians` roster within `ttl_secs`.
pub async fn initiate(
    target: impl Into<Identifier>,
    guardians: HashSet<GuardianId>,
    required: usize,
    ttl_secs: u64,
    scheme: MnemonicScheme,
    hasher: &WordHasher,
    store: &RecoveryStore,
) -> KeepResult<Initiated> {
    let target = target.into();
    if required == 0 || required > guardians.len() {
        return Err(KeepError::InvalidThreshold {
            required,
            guardians: guardians.len(),
        });
    }

    let identity = Identity::generate(scheme, hasher.alg())?;
    let salt = Salt::generate();
    let new_word_hashes = hasher.hash_all(identity.mnemonic().words(), &salt);

    let now = crate::now_unix();
    let request = RecoveryRequest {
        id: nanoid::nanoid!().into(),
        target: target.clone(),
        new_salt: salt.clone(),
        new_word_hashes,
        guardians,
        approvals: HashSet::new(),
        required_approvals: required,
        created_at: now,
        expires_at: now.saturating_add(ttl_secs),
    };

    let request_id = store.create_request(request).await?;
    tracing::debug!(target = %target, request_id = %request_id, "recovery initiated");

    Ok(Initiated {
        request_id,
        identity,
        salt,
    })
}

/// Record one guardian's approval. Idempotent: a repeat approval from the
/// same guardian is a no-op success, tolerating retries. Expiry is
/// checked here as well as at finalize.
pub async fn approve(
    request_id: std::sync::Arc<str>,
    guardian: GuardianId,
    store: &RecoveryStore,
) -> KeepResult<RecoveryStatus> {
    let request = store.get_request(request_id.clone()).await?;

    if request.is_expired(crate::now_unix()) {
        return Err(KeepError::RequestExpired);
    }
    if !request.guardians.contains(&guardian) {
        tracing::warn!(request_id = %request_id, "approval from non-guardian rejected");
        return Err(KeepError::UnknownGuardian);
    }

    store.add_approval(request_id.clone(), guardian).await?;

    let request = store.get_request(request_id).await?;
    Ok(status_of(&request, crate::now_unix()))
}

/// Observe a request's current status. Guardians and the requesting user
/// see counts only, never which guardians have approved.
pub async fn status(
    request_id: std::sync::Arc<str>,
    store: &RecoveryStore,
) -> KeepResult<RecoveryStatus> {
    let request = store.get_request(request_id).await?;
    Ok(status_of(&request, crate::now_unix()))
}

/// Finalize a recovery: atomically replace the target account's salt and
/// word digests with the pending ones and destroy the request.
///
/// The delete is the claim - exactly one of two concurrent finalize calls
/// can win it; the loser observes the request already gone and fails with
/// [KeepError::AlreadyFinalized]. An expired request is discarded here
/// and can never be finalized, threshold or not.
pub async fn finalize(
    request_id: std::sync::Arc<str>,
    recovery_store: &RecoveryStore,
    account_store: &AccountStore,
) -> KeepResult<()> {
    let request = recovery_store.get_request(request_id.clone()).await?;

    if request.is_expired(crate::now_unix()) {
        // discard: a re-initiation is the only way forward
        let _ = recovery_store.delete_request(request_id.clone()).await;
        tracing::warn!(request_id = %request_id, "expired recovery request discarded");
        return Err(KeepError::RequestExpired);
    }
    if request.approvals.len() < request.required_approvals {
        return Err(KeepError::ApprovalsOutstanding {
            approvals: request.approvals.len(),
            required: request.required_approvals,
        });
    }

    // claim the request; losing this race means someone else finalized
    match recovery_store.delete_request(request_id.clone()).await {
        Ok(()) => {}
        Err(KeepError::RequestNotFound) => return Err(KeepError::AlreadyFinalized),
        Err(e) => return Err(e),
    }

    account_store
        .replace_credentials(request.target.clone(), request.new_salt, request.new_word_hashes)
        .await?;

    tracing::debug!(target = %request.target, request_id = %request_id, "recovery finalized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use keep_auth_api::mem_store::{create_mem_account_store, create_mem_recovery_store};
    use crate::registration;

    fn roster(names: &[&str]) -> HashSet<GuardianId> {
        names.iter().map(|n| GuardianId::from(*n)).collect()
    }

    async fn setup() -> (AccountStore, RecoveryStore, WordHasher) {
        let accounts = create_mem_account_store();
        let hasher = WordHasher::new(HashAlg::Sha256);
        registration::begin("alice", MnemonicScheme::Nine, HashAlg::Sha256)
            .unwrap()
            .submit(&accounts, &hasher)
            .await
            .unwrap();
        (accounts, create_mem_recovery_store(), hasher)
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn zero_or_oversized_threshold_rejected() {
        let (_accounts, recovery, hasher) = setup().await;
        for required in [0usize, 4] {
            let err = initiate(
                "alice",
                roster(&["g1", "g2", "g3"]),
                required,
                3600,
                MnemonicScheme::Nine,
                &hasher,
                &recovery,
            )
            .await
            .unwrap_err();
            assert!(matches!(err, KeepError::InvalidThreshold { .. }));
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn below_threshold_cannot_finalize() {
        let (accounts, recovery, hasher) = setup().await;
        let initiated = initiate(
            "alice",
            roster(&["g1", "g2", "g3"]),
            2,
            3600,
            MnemonicScheme::Nine,
            &hasher,
            &recovery,
        )
        .await
        .unwrap();

        approve(initiated.request_id(), "g1".into(), &recovery)
            .await
            .unwrap();

        let err = finalize(initiated.request_id(), &recovery, &accounts)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            KeepError::ApprovalsOutstanding {
                approvals: 1,
                required: 2
            }
        ));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn finalize_succeeds_exactly_once() {
        let (accounts, recovery, hasher) = setup().await;
        let old_salt = accounts.get_salt("alice".into()).await.unwrap();

        let initiated = initiate(
            "alice",
            roster(&["g1", "g2", "g3"]),
            2,
            3600,
            MnemonicScheme::Nine,
            &hasher,
            &recovery,
        )
        .await
        .unwrap();

        let s1 = approve(initiated.request_id(), "g1".into(), &recovery)
            .await
            .unwrap();
        assert_eq!(
            RecoveryStatus::AwaitingApprovals {
                approvals: 1,
                required: 2
            },
            s1
        );
        let s2 = approve(initiated.request_id(), "g2".into(), &recovery)
            .await
            .unwrap();
        assert_eq!(RecoveryStatus::Finalizable, s2);

        finalize(initiated.request_id(), &recovery, &accounts)
            .await
            .unwrap();
        assert_ne!(old_salt, accounts.get_salt("alice".into()).await.unwrap());
        assert_eq!(*initiated.salt(), accounts.get_salt("alice".into()).await.unwrap());

        let err = finalize(initiated.request_id(), &recovery, &accounts)
            .await
            .unwrap_err();
        assert!(matches!(err, KeepError::AlreadyFinalized));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn repeat_approval_is_a_quiet_no_op() {
        let (_accounts, recovery, hasher) = setup().await;
        let initiated = initiate(
            "alice",
            roster(&["g1", "g2"]),
            2,
            3600,
            MnemonicScheme::Nine,
            &hasher,
            &recovery,
        )
        .await
        .unwrap();

        for _ in 0..4 {
            let status = approve(initiated.request_id(), "g1".into(), &recovery)
                .await
                .unwrap();
            assert_eq!(
                RecoveryStatus::AwaitingApprovals {
                    approvals: 1,
                    required: 2
                },
                status
            );
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn non_guardian_cannot_approve() {
        let (_accounts, recovery, hasher) = setup().await;
        let initiated = initiate(
            "alice",
            roster(&["g1", "g2"]),
            1,
            3600,
            MnemonicScheme::Nine,
            &hasher,
            &recovery,
        )
        .await
        .unwrap();

        let err = approve(initiated.request_id(), "mallory".into(), &recovery)
            .await
            .unwrap_err();
        assert!(matches!(err, KeepError::UnknownGuardian));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn expired_request_cannot_approve_or_finalize() {
        let (accounts, recovery, hasher) = setup().await;
        let initiated = initiate(
            "alice",
            roster(&["g1"]),
            1,
            0, // expires immediately
            MnemonicScheme::Nine,
            &hasher,
            &recovery,
        )
        .await
        .unwrap();

        let err = approve(initiated.request_id(), "g1".into(), &recovery)
            .await
            .unwrap_err();
        assert!(matches!(err, KeepError::RequestExpired));

        let err = finalize(initiated.request_id(), &recovery, &accounts)
            .await
            .unwrap_err();
        assert!(matches!(err, KeepError::RequestExpired));

        // discarded: a later finalize sees no request at all
        let err = finalize(initiated.request_id(), &recovery, &accounts)
            .await
            .unwrap_err();
        assert!(matches!(err, KeepError::RequestNotFound));
    }
}
