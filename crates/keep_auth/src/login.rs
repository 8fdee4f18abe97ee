//! Login flow: `Input -> ChallengeIssued -> Verified`.
//!
//! A failed verification returns the caller to `Input`, not to
//! `ChallengeIssued`: the challenge is consumed by value whatever the
//! outcome, so an attacker can never hammer one fixed index set.

use keep_auth_api::*;

/// A challenge issued for one login attempt. Single use: `verify`
/// consumes it, success or failure.
#[derive(Debug)]
pub struct IssuedChallenge {
    challenge: Challenge,
}

/// Begin a login attempt: fetch the account's salt and canonical word
/// count, then draw a fresh challenge. Nothing about the words themselves
/// leaves the store - positions only.
pub async fn begin(
    identifier: impl Into<Identifier>,
    store: &AccountStore,
) -> KeepResult<IssuedChallenge> {
    let identifier = identifier.into();
    let salt = store.get_salt(identifier.clone()).await?;
    let word_count = store.get_word_hashes(identifier.clone()).await?.len();
    let challenge = draw_challenge(word_count, identifier.clone(), salt)?;
    tracing::debug!(identifier = %identifier, indices = ?challenge.indices, "challenge issued");
    Ok(IssuedChallenge { challenge })
}

impl IssuedChallenge {
    /// The challenged word positions, ascending.
    pub fn indices(&self) -> &[usize] {
        &self.challenge.indices
    }

    /// The account identifier the challenge was issued for.
    pub fn issued_for(&self) -> &str {
        &self.challenge.issued_for
    }

    /// Verify the words submitted for the challenged positions.
    ///
    /// On success, mints an opaque token at the session-issuer boundary
    /// and returns the session context with the account's public record.
    /// On failure, the challenge is already gone - the caller must
    /// [begin] again and gets a freshly drawn challenge.
    pub async fn verify(
        self,
        submitted: &[String],
        store: &AccountStore,
        issuer: &SessionIssuer,
        hasher: &WordHasher,
    ) -> KeepResult<SessionContext> {
        let identifier = self.challenge.issued_for.clone();
        let stored = store.get_word_hashes(identifier.clone()).await?;

        match verify_challenge(&self.challenge, submitted, &stored, hasher) {
            Ok(()) => {
                let token = issuer.issue_token(identifier.clone()).await?;
                let account = store.get_account(identifier.clone()).await?;
                tracing::debug!(identifier = %identifier, "login verified");
                Ok(SessionContext { token, account })
            }
            Err(e) => {
                tracing::warn!(identifier = %identifier, "login verification failed");
                Err(e)
            }
        }
    }
}
