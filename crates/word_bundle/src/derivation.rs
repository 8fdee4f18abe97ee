//! Deterministic identity derivation from a validated mnemonic.
//!
//! Both schemes run the same pipeline: PBKDF2-HMAC-SHA512 over the UTF-8
//! phrase (salt literal `"mnemonic"`, 2048 rounds, 64-byte output) produces
//! the seed; the ed25519 master-key rule (HMAC-SHA512 keyed with
//! `"ed25519 seed"`) turns the seed into the root signing key. For the
//! twelve-word scheme this is exactly the industry-standard derivation.

use crate::{HashAlg, Mnemonic, MnemonicError};
use ed25519_dalek::{Signer, SigningKey, Verifier, VerifyingKey};
use hmac::{Hmac, Mac};
use sha2::Sha512;
use zeroize::{Zeroize, Zeroizing};

type HmacSha512 = Hmac<Sha512>;

const PBKDF2_ROUNDS: u32 = 2048;
const PBKDF2_SALT: &[u8] = b"mnemonic";
const MASTER_KEY_DOMAIN: &[u8] = b"ed25519 seed";

/// Errors arising from identity derivation.
#[derive(Debug, thiserror::Error)]
pub enum DerivationError {
    /// The supplied word sequence failed codec validation.
    #[error("invalid mnemonic: {0}")]
    InvalidMnemonic(#[from] MnemonicError),

    /// A signature failed to verify.
    #[error("signature verification failed")]
    BadSignature,
}

/// Derive the 64-byte seed for a mnemonic phrase.
fn seed_bytes(phrase: &str) -> Zeroizing<[u8; 64]> {
    let mut seed = Zeroizing::new([0u8; 64]);
    pbkdf2::pbkdf2_hmac::<Sha512>(
        phrase.as_bytes(),
        PBKDF2_SALT,
        PBKDF2_ROUNDS,
        &mut seed[..],
    );
    seed
}

/// A keyed identity: the mnemonic that produced it, the ed25519 root
/// signing key, and the public address under the configured digest.
///
/// Held only by its owner, only in memory; dropping it zeroizes the
/// mnemonic and the signing key.
pub struct Identity {
    mnemonic: Mnemonic,
    signing_key: SigningKey,
    alg: HashAlg,
    address_bytes: [u8; 32],
    address: String,
}

impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Identity")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

impl Identity {
    /// Derive the identity for a validated mnemonic. Deterministic: the
    /// same mnemonic and digest algorithm always yield the same keypair
    /// and address, on any machine.
    pub fn derive(mnemonic: Mnemonic, alg: HashAlg) -> Result<Self, DerivationError> {
        // re-validate so a hand-constructed word sequence cannot slip
        // through to key material
        mnemonic.to_entropy()?;

        let phrase = Zeroizing::new(mnemonic.phrase());
        let seed = seed_bytes(&phrase);

        let mut mac = HmacSha512::new_from_slice(MASTER_KEY_DOMAIN)
            .expect("hmac accepts any key length");
        mac.update(&seed[..]);
        let mut okm = mac.finalize().into_bytes();

        let mut secret = [0u8; 32];
        secret.copy_from_slice(&okm[..32]);
        let signing_key = SigningKey::from_bytes(&secret);
        secret.zeroize();
        okm.as_mut_slice().zeroize();

        let address_bytes = alg.digest(signing_key.verifying_key().as_bytes());
        let address = hex::encode(address_bytes);

        Ok(Self {
            mnemonic,
            signing_key,
            alg,
            address_bytes,
            address,
        })
    }

    /// Generate a brand-new identity from operating-system entropy.
    pub fn generate(
        scheme: crate::MnemonicScheme,
        alg: HashAlg,
    ) -> Result<Self, DerivationError> {
        Self::derive(Mnemonic::generate(scheme), alg)
    }

    /// The mnemonic backing this identity.
    pub fn mnemonic(&self) -> &Mnemonic {
        &self.mnemonic
    }

    /// The digest algorithm this identity was derived under.
    pub fn hash_alg(&self) -> HashAlg {
        self.alg
    }

    /// The ed25519 public key bytes.
    pub fn public_key(&self) -> [u8; 32] {
        self.signing_key.verifying_key().to_bytes()
    }

    /// The hex-encoded public address: the configured digest of the
    /// public key.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// The raw 32-byte address digest.
    pub fn address_bytes(&self) -> [u8; 32] {
        self.address_bytes
    }

    /// Sign a message: a detached ed25519 signature over the configured
    /// digest of the message, so the profile-signing digest is provably
    /// the same function used everywhere else.
    pub fn sign(&self, message: &[u8]) -> [u8; 64] {
        let digest = self.alg.digest(message);
        self.signing_key.sign(&digest).to_bytes()
    }
}

/// Verify a detached signature produced by [Identity::sign].
pub fn verify_signature(
    public_key: &[u8; 32],
    alg: HashAlg,
    message: &[u8],
    signature: &[u8; 64],
) -> Result<(), DerivationError> {
    let key = VerifyingKey::from_bytes(public_key)
        .map_err(|_| DerivationError::BadSignature)?;
    let digest = alg.digest(message);
    key.verify(&digest, &ed25519_dalek::Signature::from_bytes(signature))
        .map_err(|_| DerivationError::BadSignature)
}
