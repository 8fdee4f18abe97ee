//! Registration flow: `Input -> Generated -> Submitted`.
//!
//! The mnemonic exists in process memory between `begin` and `submit` and
//! nowhere else. It is displayed to the user exactly once; only the salt,
//! the salted word digests, the address, and the public key ever reach
//! the account store.

use keep_auth_api::*;
use word_bundle::{Identity, MnemonicScheme};

/// A freshly generated, not-yet-submitted registration.
///
/// Holds the identity and salt for the chosen username. Dropping this
/// value zeroizes the mnemonic and signing key.
pub struct Generated {
    username: Identifier,
    identity: Identity,
    salt: Salt,
}

impl std::fmt::Debug for Generated {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Generated")
            .field("username", &self.username)
            .field("address", &self.identity.address())
            .finish_non_exhaustive()
    }
}

/// Begin a registration: generate a fresh identity and salt for the
/// chosen username. The username is display material, never secret.
pub fn begin(
    username: impl Into<Identifier>,
    scheme: MnemonicScheme,
    alg: HashAlg,
) -> KeepResult<Generated> {
    let username = username.into();
    let identity = Identity::generate(scheme, alg)?;
    let salt = Salt::generate();
    tracing::debug!(username = %username, address = %identity.address(), "identity generated");
    Ok(Generated {
        username,
        identity,
        salt,
    })
}

impl Generated {
    /// The chosen username.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Change the username, keeping the generated identity and salt.
    /// This is the retry path after a duplicate-username rejection.
    pub fn with_username(mut self, username: impl Into<Identifier>) -> Self {
        self.username = username.into();
        self
    }

    /// The derived public address.
    pub fn address(&self) -> &str {
        self.identity.address()
    }

    /// The mnemonic words, for one-time display to the user. Never
    /// transmitted, never persisted; gone when this value drops.
    pub fn reveal_mnemonic(&self) -> &[String] {
        self.identity.mnemonic().words()
    }

    /// A sampled subset of word positions the caller may quiz the user on
    /// before submitting, to confirm the phrase was written down. Same
    /// sampler as login challenges; purely in-memory.
    pub fn confirm_indices(&self) -> KeepResult<Vec<usize>> {
        let challenge = draw_challenge(
            self.identity.mnemonic().word_count(),
            self.username.clone(),
            self.salt.clone(),
        )?;
        Ok(challenge.indices)
    }

    /// Submit the registration: hash every word under the fresh salt and
    /// persist `{username, salt, address, word hashes, public key}`.
    ///
    /// Success consumes the state, clearing all secret material. Failure
    /// (say, a duplicate username) hands the `Generated` state back so
    /// the same mnemonic can be retried without regenerating it.
    pub async fn submit(
        self,
        store: &AccountStore,
        hasher: &WordHasher,
    ) -> Result<AccountRecord, (Generated, KeepError)> {
        let record = AccountRecord {
            identifier: self.username.clone(),
            address: self.identity.address_bytes().into(),
            salt: self.salt.clone(),
            word_hashes: hasher.hash_all(self.identity.mnemonic().words(), &self.salt),
            public_key: self.identity.public_key().into(),
        };

        match store.put_account(record.clone()).await {
            Ok(()) => {
                tracing::debug!(username = %record.identifier, "registration submitted");
                Ok(record)
            }
            Err(e) => {
                tracing::warn!(username = %self.username, error = %e, "registration rejected");
                Err((self, e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keep_auth_api::mem_store::create_mem_account_store;

    #[tokio::test(flavor = "multi_thread")]
    async fn register_persists_only_public_material() {
        let store = create_mem_account_store();
        let hasher = WordHasher::new(HashAlg::Sha256);

        let generated = begin("alice", MnemonicScheme::Nine, HashAlg::Sha256).unwrap();
        let words: Vec<String> = generated.reveal_mnemonic().to_vec();
        assert_eq!(9, words.len());

        let record = generated.submit(&store, &hasher).await.unwrap();
        assert_eq!(9, record.word_hashes.len());

        // nothing stored matches a raw word
        let json = serde_json::to_string(&record).unwrap();
        for w in &words {
            assert!(!json.contains(&format!("\"{w}\"")), "word leaked: {w}");
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn duplicate_username_returns_generated_state_for_retry() {
        let store = create_mem_account_store();
        let hasher = WordHasher::new(HashAlg::Sha256);

        begin("alice", MnemonicScheme::Nine, HashAlg::Sha256)
            .unwrap()
            .submit(&store, &hasher)
            .await
            .unwrap();

        let generated = begin("alice", MnemonicScheme::Nine, HashAlg::Sha256).unwrap();
        let words_before: Vec<String> = generated.reveal_mnemonic().to_vec();

        let (generated, err) = generated.submit(&store, &hasher).await.unwrap_err();
        assert!(matches!(err, KeepError::AccountExists(_)));
        // the same mnemonic survives the rejection and can be retried
        assert_eq!(words_before, generated.reveal_mnemonic());

        let record = generated
            .with_username("alice2")
            .submit(&store, &hasher)
            .await
            .unwrap();
        assert_eq!("alice2", &*record.identifier);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn confirm_indices_are_in_range() {
        let generated = begin("bob", MnemonicScheme::Twelve, HashAlg::Sha256).unwrap();
        let indices = generated.confirm_indices().unwrap();
        assert_eq!(CHALLENGE_SIZE, indices.len());
        assert!(indices.iter().all(|&i| i < 12));
    }
}
