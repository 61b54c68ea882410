//! Deserializable description of a [`PasswordChain`](crate::PasswordChain)
//!
//! Rotating to a new algorithm or stronger parameters is a matter of putting a
//! new entry at the top of the list and keeping the old ones below it:
//!
//! ```
//! # use password_chain::{config::ChainConfig, PasswordChain};
//! let config: ChainConfig = serde_json::from_str(
//!     r#"{
//!         "hashers": [
//!             { "algorithm": "argon2", "time_cost": 3, "memory_cost": 65536, "parallelism": 4 },
//!             { "algorithm": "bcrypt", "rounds": 12, "prefix": "2b" }
//!         ]
//!     }"#,
//! )
//! .unwrap();
//! let chain = PasswordChain::from_config(&config).unwrap();
//! assert_eq!(chain.hashers().count(), 2);
//! ```

use crate::{
    hasher::{Argon2Hasher, Argon2Params, BcryptHasher, BcryptParams, Hasher},
    Result,
};
use alloc::vec::Vec;
use serde::{Deserialize, Serialize};

/// Configuration of a single hasher
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "algorithm", rename_all = "lowercase")]
pub enum HasherConfig {
    /// Argon2 with the given parameters
    Argon2(Argon2Params),
    /// bcrypt with the given parameters
    Bcrypt(BcryptParams),
}

impl HasherConfig {
    /// Construct the configured hasher
    ///
    /// # Errors
    ///
    /// Whatever the hasher's constructor rejects
    pub fn build(&self) -> Result<Hasher> {
        Ok(match *self {
            Self::Argon2(params) => Argon2Hasher::new(params)?.into(),
            Self::Bcrypt(params) => BcryptHasher::new(params)?.into(),
        })
    }
}

/// Configuration of a whole chain, the first hasher being the current one
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ChainConfig {
    /// Hashers in priority order
    pub hashers: Vec<HasherConfig>,
}
