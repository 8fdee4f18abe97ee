//! Partial word challenge: generation and verification.
//!
//! A challenge demands `CHALLENGE_SIZE` of the `n` word positions, so one
//! observed exchange leaks at most that many positional digests while a
//! correct response still requires possession of the full mnemonic.

use crate::{Challenge, Identifier, KeepError, KeepResult, Salt, WordHashArray, WordHasher};

/// Number of word positions demanded per challenge.
pub const CHALLENGE_SIZE: usize = 3;

/// Draw a fresh challenge over `word_count` positions.
///
/// Indices are distinct and uniform (partial Fisher-Yates, no modulo
/// bias), sorted ascending for a deterministic presentation order.
pub fn draw_challenge(
    word_count: usize,
    issued_for: Identifier,
    salt: Salt,
) -> KeepResult<Challenge> {
    if word_count < CHALLENGE_SIZE {
        return Err(KeepError::Other(format!(
            "cannot draw {} positions from {} words",
            CHALLENGE_SIZE, word_count
        )));
    }

    let mut indices =
        rand::seq::index::sample(&mut rand::rngs::OsRng, word_count, CHALLENGE_SIZE)
            .into_vec();
    indices.sort_unstable();

    Ok(Challenge {
        indices,
        issued_for,
        salt,
    })
}

/// Verify submitted words against the stored digests for exactly the
/// challenged positions.
///
/// `submitted` is aligned to the challenge's index order. All positions
/// must match; any single mismatch fails the whole challenge with a
/// generic error carrying no positional detail. Stateless per call:
/// single-use of a challenge is enforced by the calling flow.
pub fn verify_challenge(
    challenge: &Challenge,
    submitted: &[String],
    stored: &WordHashArray,
    hasher: &WordHasher,
) -> KeepResult<()> {
    if submitted.len() != challenge.indices.len() {
        return Err(KeepError::ChallengeMismatch);
    }

    // evaluate every position before deciding, so the failure shape does
    // not depend on which word was wrong
    let mut ok = true;
    for (word, &index) in submitted.iter().zip(challenge.indices.iter()) {
        match stored.get(index) {
            Some(expected) => {
                ok &= &hasher.hash(word, &challenge.salt) == expected;
            }
            None => ok = false,
        }
    }

    if ok {
        Ok(())
    } else {
        Err(KeepError::ChallengeMismatch)
    }
}
