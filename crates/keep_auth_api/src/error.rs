//! The authentication error taxonomy.

/// Keep authentication error type.
///
/// Codec and derivation errors are terminal for the current attempt and
/// surfaced verbatim for user correction. Verification failures carry no
/// positional detail. Recovery-state errors carry enough to explain the
/// next step (re-initiate vs. wait), never which guardians have approved.
#[derive(Debug, thiserror::Error)]
pub enum KeepError {
    /// The supplied word sequence is not a valid mnemonic.
    #[error("invalid mnemonic: {0}")]
    InvalidMnemonic(#[from] word_bundle::MnemonicError),

    /// Identity derivation failed.
    #[error(transparent)]
    Derivation(#[from] word_bundle::DerivationError),

    /// Challenge verification failed. Deliberately generic: never
    /// indicates which challenged position was wrong.
    #[error("verification failed")]
    ChallengeMismatch,

    /// An account with this identifier is already registered.
    #[error("account already registered: {0}")]
    AccountExists(String),

    /// No account with this identifier.
    #[error("account not found: {0}")]
    AccountNotFound(String),

    /// A salt shorter than the fixed minimum was supplied.
    #[error("salt shorter than the fixed minimum length")]
    SaltTooShort,

    /// The recovery threshold is zero or exceeds the guardian roster.
    #[error("invalid approval threshold {required} for {guardians} guardians")]
    InvalidThreshold {
        /// Approvals required to finalize.
        required: usize,
        /// Guardians designated on the request.
        guardians: usize,
    },

    /// The approving party is not a designated guardian of the request.
    #[error("not a designated guardian")]
    UnknownGuardian,

    /// The recovery request passed its deadline; re-initiate.
    #[error("recovery request expired; initiate a new request")]
    RequestExpired,

    /// No recovery request with this id.
    #[error("recovery request not found")]
    RequestNotFound,

    /// The recovery request was already finalized.
    #[error("recovery request already finalized")]
    AlreadyFinalized,

    /// Not enough guardian approvals yet; wait for more before finalizing.
    #[error("approvals outstanding: {approvals} of {required}")]
    ApprovalsOutstanding {
        /// Approvals recorded so far.
        approvals: usize,
        /// Approvals required to finalize.
        required: usize,
    },

    /// Unspecified error from an external collaborator.
    #[error("{0}")]
    Other(String),
}

impl From<String> for KeepError {
    fn from(s: String) -> Self {
        KeepError::Other(s)
    }
}

impl From<&str> for KeepError {
    fn from(s: &str) -> Self {
        KeepError::Other(s.to_string())
    }
}

/// Keep result type.
pub type KeepResult<T> = Result<T, KeepError>;
