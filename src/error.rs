use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Errors raised by hashers and the [`PasswordChain`](crate::PasswordChain)
///
/// A wrong password is never an error. It is reported as `false` (or
/// [`VerifyOutcome::Rejected`](crate::VerifyOutcome::Rejected)).
#[derive(Debug, Error)]
pub enum Error {
    /// None of the registered hashers recognizes the hash
    #[error(
        "this hash can't be identified, \
         make sure it's valid and that its corresponding hasher is enabled"
    )]
    UnknownHash,

    /// The underlying primitive refused to initialize with the given configuration
    #[error("the {hasher} hash algorithm is not available: {reason}")]
    HasherUnavailable {
        /// Name of the hasher
        hasher: &'static str,
        /// What the primitive complained about
        reason: String,
    },

    /// An explicitly supplied salt can't be used by the hasher
    #[error("invalid salt for {hasher}: {reason}")]
    InvalidSalt {
        /// Name of the hasher
        hasher: &'static str,
        /// Why the salt was rejected
        reason: String,
    },

    /// A chain configuration lists no hashers
    #[error("a password chain needs at least one hasher")]
    EmptyChain,

    /// The primitive failed while producing a hash
    #[error(transparent)]
    PasswordHash(#[from] password_hash::Error),
}
