//! The hasher capability and the closed set of supported algorithms

mod argon2;
mod bcrypt;

pub use self::argon2::{Argon2Hasher, Argon2Params, Argon2Variant};
pub use self::bcrypt::{BcryptHasher, BcryptParams, BcryptPrefix};

use crate::Result;
use alloc::string::String;

/// Operations every password hashing algorithm provides
///
/// Passwords and hashes are taken as anything byte-like, so both `&str` and
/// `&[u8]` work. Hashes are expected to be UTF-8; anything else is simply
/// never identified and never verifies.
pub trait HashAlgorithm: Send + Sync {
    /// Short algorithm name, used in logs and errors
    fn name(&self) -> &'static str;

    /// Check whether `hash` is in this algorithm's encoding
    ///
    /// Total and linear in the length of the input: never panics, returns
    /// `false` for anything malformed.
    fn identify(&self, hash: impl AsRef<[u8]>) -> bool;

    /// Hash a password with the configured parameters
    ///
    /// A random salt is generated when `salt` is `None`.
    ///
    /// # Errors
    ///
    /// Fails if the salt can't be used or the primitive rejects the input.
    fn hash(&self, password: impl AsRef<[u8]>, salt: Option<&[u8]>) -> Result<String>;

    /// Check a password against a hash, using the parameters embedded in the hash
    fn verify(&self, password: impl AsRef<[u8]>, hash: impl AsRef<[u8]>) -> bool;

    /// Whether the hash was produced with parameters other than the configured ones
    fn needs_rehash(&self, hash: impl AsRef<[u8]>) -> bool;
}

/// One of the supported hashers
#[derive(Clone, Debug)]
pub enum Hasher {
    /// Argon2 (`$argon2id$...`, `$argon2i$...`, `$argon2d$...`)
    Argon2(Argon2Hasher),
    /// bcrypt (`$2b$...`, `$2a$...`, `$2x$...`, `$2y$...`)
    Bcrypt(BcryptHasher),
}

impl HashAlgorithm for Hasher {
    fn name(&self) -> &'static str {
        match self {
            Self::Argon2(hasher) => hasher.name(),
            Self::Bcrypt(hasher) => hasher.name(),
        }
    }

    fn identify(&self, hash: impl AsRef<[u8]>) -> bool {
        match self {
            Self::Argon2(hasher) => hasher.identify(hash),
            Self::Bcrypt(hasher) => hasher.identify(hash),
        }
    }

    fn hash(&self, password: impl AsRef<[u8]>, salt: Option<&[u8]>) -> Result<String> {
        match self {
            Self::Argon2(hasher) => hasher.hash(password, salt),
            Self::Bcrypt(hasher) => hasher.hash(password, salt),
        }
    }

    fn verify(&self, password: impl AsRef<[u8]>, hash: impl AsRef<[u8]>) -> bool {
        match self {
            Self::Argon2(hasher) => hasher.verify(password, hash),
            Self::Bcrypt(hasher) => hasher.verify(password, hash),
        }
    }

    fn needs_rehash(&self, hash: impl AsRef<[u8]>) -> bool {
        match self {
            Self::Argon2(hasher) => hasher.needs_rehash(hash),
            Self::Bcrypt(hasher) => hasher.needs_rehash(hash),
        }
    }
}

impl From<Argon2Hasher> for Hasher {
    fn from(hasher: Argon2Hasher) -> Self {
        Self::Argon2(hasher)
    }
}

impl From<BcryptHasher> for Hasher {
    fn from(hasher: BcryptHasher) -> Self {
        Self::Bcrypt(hasher)
    }
}

/// Hashes are textual; bytes that aren't UTF-8 can't be one
fn as_text(hash: &[u8]) -> Option<&str> {
    core::str::from_utf8(hash).ok()
}

/// Salts only ever come from the OS CSPRNG
fn fill_random(salt: &mut [u8]) {
    use rand::{rngs::OsRng, RngCore};

    OsRng.fill_bytes(salt);
}
