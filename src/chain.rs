use crate::{
    config::ChainConfig,
    hasher::{Argon2Hasher, HashAlgorithm, Hasher},
    Error, Result,
};
use alloc::{string::String, vec::Vec};

/// Result of [`PasswordChain::verify_and_update`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VerifyOutcome {
    /// The password doesn't match. No new hash is ever computed in this case.
    Rejected,
    /// The password matches
    Verified {
        /// Fresh hash from the current hasher, present when the stored one is outdated.
        /// The caller is expected to replace the stored hash with it.
        upgraded: Option<String>,
    },
}

impl VerifyOutcome {
    /// Whether the password matched
    #[must_use]
    pub fn is_verified(&self) -> bool {
        matches!(self, Self::Verified { .. })
    }

    /// The replacement hash, if one was computed
    #[must_use]
    pub fn upgraded_hash(&self) -> Option<&str> {
        match self {
            Self::Verified { upgraded } => upgraded.as_deref(),
            Self::Rejected => None,
        }
    }

    /// Split into `(verified, upgraded_hash)`
    #[must_use]
    pub fn into_parts(self) -> (bool, Option<String>) {
        match self {
            Self::Verified { upgraded } => (true, upgraded),
            Self::Rejected => (false, None),
        }
    }
}

/// Ordered set of hashers with a designated current one
///
/// New hashes always come from the current hasher. Verification picks the
/// first hasher (current first, then the fallbacks in order) that identifies
/// the hash, which lets stored credentials keep working while the preferred
/// algorithm or its parameters change.
#[derive(Clone, Debug)]
pub struct PasswordChain {
    current: Hasher,
    fallbacks: Vec<Hasher>,
}

impl PasswordChain {
    /// Create a chain from the current hasher and the ones kept around to verify older hashes
    #[must_use]
    pub fn new(current: impl Into<Hasher>, fallbacks: impl IntoIterator<Item = Hasher>) -> Self {
        Self {
            current: current.into(),
            fallbacks: fallbacks.into_iter().collect(),
        }
    }

    /// Argon2 with its default parameters
    #[must_use]
    pub fn recommended() -> Self {
        Self::new(Argon2Hasher::default(), [])
    }

    /// Build a chain from its configuration, the first entry becoming the current hasher
    ///
    /// # Errors
    ///
    /// [`Error::EmptyChain`] when no hashers are configured, or the first
    /// construction error of any configured hasher
    pub fn from_config(config: &ChainConfig) -> Result<Self> {
        let mut hashers = config.hashers.iter().map(|hasher| hasher.build());
        let current = hashers.next().ok_or(Error::EmptyChain)??;
        let fallbacks = hashers.collect::<Result<Vec<_>>>()?;

        Ok(Self { current, fallbacks })
    }

    /// The hasher new hashes are produced with
    #[must_use]
    pub fn current(&self) -> &Hasher {
        &self.current
    }

    /// All hashers in priority order, the current one first
    pub fn hashers(&self) -> impl Iterator<Item = &Hasher> {
        core::iter::once(&self.current).chain(&self.fallbacks)
    }

    /// The first hasher that recognizes `hash`
    pub fn identify(&self, hash: impl AsRef<[u8]>) -> Option<&Hasher> {
        let hash = hash.as_ref();
        self.hashers().find(|hasher| hasher.identify(hash))
    }

    /// Hash a password with the current hasher
    ///
    /// # Errors
    ///
    /// See [`HashAlgorithm::hash`]
    pub fn hash(&self, password: impl AsRef<[u8]>, salt: Option<&[u8]>) -> Result<String> {
        self.current.hash(password, salt)
    }

    /// Verify a password against a hash produced by any of the hashers
    ///
    /// # Errors
    ///
    /// [`Error::UnknownHash`] if no hasher recognizes the hash. A wrong password is `Ok(false)`.
    pub fn verify(&self, password: impl AsRef<[u8]>, hash: impl AsRef<[u8]>) -> Result<bool> {
        let hash = hash.as_ref();
        let hasher = self.classify(hash)?;
        Ok(hasher.verify(password, hash))
    }

    /// Verify a password and, if it matches an outdated hash, compute its replacement
    ///
    /// A hash is outdated when it was identified by a fallback hasher or when
    /// its own hasher reports that it needs a rehash. The replacement always
    /// comes from the current hasher.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownHash`] if no hasher recognizes the hash, or the error of
    /// the current hasher if the replacement can't be produced
    pub fn verify_and_update(
        &self,
        password: impl AsRef<[u8]>,
        hash: impl AsRef<[u8]>,
    ) -> Result<VerifyOutcome> {
        let (password, hash) = (password.as_ref(), hash.as_ref());
        let hasher = self.classify(hash)?;

        if !hasher.verify(password, hash) {
            return Ok(VerifyOutcome::Rejected);
        }

        let is_current = core::ptr::eq(hasher, &self.current);
        if is_current && !hasher.needs_rehash(hash) {
            return Ok(VerifyOutcome::Verified { upgraded: None });
        }

        tracing::debug!(
            from = hasher.name(),
            to = self.current.name(),
            fallback = !is_current,
            "upgrading password hash"
        );
        let upgraded = self.current.hash(password, None)?;

        Ok(VerifyOutcome::Verified {
            upgraded: Some(upgraded),
        })
    }

    fn classify(&self, hash: &[u8]) -> Result<&Hasher> {
        match self.identify(hash) {
            Some(hasher) => {
                tracing::debug!(hasher = hasher.name(), "identified password hash");
                Ok(hasher)
            }
            None => {
                tracing::warn!("no configured hasher recognizes the password hash");
                Err(Error::UnknownHash)
            }
        }
    }
}

impl Default for PasswordChain {
    fn default() -> Self {
        Self::recommended()
    }
}

impl From<Hasher> for PasswordChain {
    fn from(hasher: Hasher) -> Self {
        Self::new(hasher, [])
    }
}
