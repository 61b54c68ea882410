use super::{as_text, fill_random, HashAlgorithm};
use crate::{Error, Result};
use ::argon2::{Algorithm, Argon2, Block, Params, Version};
use alloc::{
    string::{String, ToString},
    vec,
    vec::Vec,
};
use lazy_static::lazy_static;
use password_hash::{Output, PasswordHash, PasswordHasher, Salt, SaltString};
use regex::Regex;
use serde::{Deserialize, Serialize};

const NAME: &str = "argon2";
const VERSION: Version = Version::V0x13;

/// Bounds for the raw salt length. The upper one is what still fits into a PHC salt field.
const MIN_SALT_LEN: usize = 8;
const MAX_SALT_LEN: usize = 48;

lazy_static! {
    // Version segment is optional, legacy hashes don't carry one.
    // The regex crate matches in time linear to the input, no backtracking.
    static ref ENCODED_HASH: Regex = Regex::new(
        r"^\$argon2(?:id|i|d)\$(?:v=[0-9]+\$)?m=[0-9]+,t=[0-9]+,p=[0-9]+(?:\$[^$]+(?:\$.+?)?)?$"
    )
    .unwrap();
}

/// Argon2 variant
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Argon2Variant {
    /// Hybrid of `Argon2i` and `Argon2d`
    #[default]
    Argon2id,
    /// Data-independent memory access
    Argon2i,
    /// Data-dependent memory access
    Argon2d,
}

impl From<Argon2Variant> for Algorithm {
    fn from(value: Argon2Variant) -> Self {
        match value {
            Argon2Variant::Argon2id => Algorithm::Argon2id,
            Argon2Variant::Argon2i => Algorithm::Argon2i,
            Argon2Variant::Argon2d => Algorithm::Argon2d,
        }
    }
}

/// Argon2 parameters
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Argon2Params {
    /// Number of iterations
    pub time_cost: u32,
    /// Memory usage in KiB
    pub memory_cost: u32,
    /// Degree of parallelism (changes the resulting hash)
    pub parallelism: u32,
    /// Length of the digest in bytes
    pub hash_len: usize,
    /// Length of the randomly generated salt in bytes
    pub salt_len: usize,
    /// Variant to hash with. Only change it for interoperability with legacy systems.
    pub variant: Argon2Variant,
}

impl Default for Argon2Params {
    fn default() -> Self {
        Self {
            time_cost: Params::DEFAULT_T_COST,
            memory_cost: Params::DEFAULT_M_COST,
            parallelism: Params::DEFAULT_P_COST,
            hash_len: Params::DEFAULT_OUTPUT_LEN,
            salt_len: Salt::RECOMMENDED_LENGTH,
            variant: Argon2Variant::default(),
        }
    }
}

/// Argon2 hasher
#[derive(Clone, Debug)]
pub struct Argon2Hasher {
    params: Argon2Params,
    context: Argon2<'static>,
}

impl Argon2Hasher {
    /// Create a hasher, letting the primitive validate the parameters
    ///
    /// # Errors
    ///
    /// [`Error::HasherUnavailable`] if Argon2 can't work with these parameters
    pub fn new(params: Argon2Params) -> Result<Self> {
        let unavailable = |reason: String| Error::HasherUnavailable {
            hasher: NAME,
            reason,
        };

        if !(MIN_SALT_LEN..=MAX_SALT_LEN).contains(&params.salt_len) {
            return Err(unavailable(format!(
                "salt length must be between {MIN_SALT_LEN} and {MAX_SALT_LEN} bytes"
            )));
        }

        let argon2_params = Params::new(
            params.memory_cost,
            params.time_cost,
            params.parallelism,
            Some(params.hash_len),
        )
        .map_err(|err| unavailable(err.to_string()))?;

        Ok(Self {
            params,
            context: Argon2::new(params.variant.into(), VERSION, argon2_params),
        })
    }

    /// Configured parameters
    #[must_use]
    pub fn params(&self) -> &Argon2Params {
        &self.params
    }
}

impl Default for Argon2Hasher {
    fn default() -> Self {
        Self {
            params: Argon2Params::default(),
            context: Argon2::default(),
        }
    }
}

impl HashAlgorithm for Argon2Hasher {
    fn name(&self) -> &'static str {
        NAME
    }

    fn identify(&self, hash: impl AsRef<[u8]>) -> bool {
        as_text(hash.as_ref()).map_or(false, |hash| ENCODED_HASH.is_match(hash))
    }

    fn hash(&self, password: impl AsRef<[u8]>, salt: Option<&[u8]>) -> Result<String> {
        let salt = match salt {
            Some(salt) if !(MIN_SALT_LEN..=MAX_SALT_LEN).contains(&salt.len()) => {
                return Err(Error::InvalidSalt {
                    hasher: NAME,
                    reason: format!(
                        "expected between {MIN_SALT_LEN} and {MAX_SALT_LEN} bytes, got {}",
                        salt.len()
                    ),
                });
            }
            Some(salt) => SaltString::encode_b64(salt)?,
            None => {
                let mut salt = vec![0; self.params.salt_len];
                fill_random(&mut salt);
                SaltString::encode_b64(&salt)?
            }
        };

        let hash = self.context.hash_password(password.as_ref(), &salt)?;
        Ok(hash.to_string())
    }

    fn verify(&self, password: impl AsRef<[u8]>, hash: impl AsRef<[u8]>) -> bool {
        let Some(parsed) = parse(hash.as_ref()) else {
            return false;
        };

        match verify_embedded(password.as_ref(), &parsed) {
            Ok(matches) => matches,
            Err(error) => {
                tracing::debug!(%error, "argon2 rejected the hash");
                false
            }
        }
    }

    fn needs_rehash(&self, hash: impl AsRef<[u8]>) -> bool {
        let Some(parsed) = parse(hash.as_ref()) else {
            return true;
        };

        if parsed.algorithm != Algorithm::from(self.params.variant).ident()
            || parsed.version != Some(VERSION as u32)
        {
            return true;
        }

        let Ok(embedded) = Params::try_from(&parsed) else {
            return true;
        };

        let mut salt_buf = [0; Salt::MAX_LENGTH];
        let salt_len = parsed
            .salt
            .as_ref()
            .and_then(|salt| salt.decode_b64(&mut salt_buf).ok())
            .map(<[u8]>::len);

        embedded.m_cost() != self.params.memory_cost
            || embedded.t_cost() != self.params.time_cost
            || embedded.p_cost() != self.params.parallelism
            || parsed.hash.as_ref().map(Output::len) != Some(self.params.hash_len)
            || salt_len != Some(self.params.salt_len)
    }
}

fn parse(hash: &[u8]) -> Option<PasswordHash<'_>> {
    as_text(hash).and_then(|hash| PasswordHash::new(hash).ok())
}

/// Recompute the digest with the algorithm, version and cost embedded in the hash
///
/// The block buffer is reserved up front so an absurd memory cost is a
/// mismatch instead of an allocation failure.
fn verify_embedded(password: &[u8], parsed: &PasswordHash<'_>) -> password_hash::Result<bool> {
    let (Some(salt), Some(expected)) = (&parsed.salt, &parsed.hash) else {
        return Ok(false);
    };

    let algorithm = Algorithm::try_from(parsed.algorithm)?;
    // No version segment means the hash predates 0x13
    let version = Version::try_from(parsed.version.unwrap_or(Version::V0x10 as u32))?;
    let params = Params::try_from(parsed)?;

    let mut salt_buf = [0; Salt::MAX_LENGTH];
    let salt = salt.decode_b64(&mut salt_buf)?;

    let mut blocks = Vec::new();
    if blocks.try_reserve_exact(params.block_count()).is_err() {
        tracing::debug!(m_cost = params.m_cost(), "not enough memory to verify argon2 hash");
        return Ok(false);
    }
    blocks.resize(params.block_count(), Block::default());

    let mut output = vec![0; expected.len()];
    Argon2::new(algorithm, version, params).hash_password_into_with_memory(
        password,
        salt,
        &mut output,
        blocks.as_mut_slice(),
    )?;

    // `Output` compares in constant time
    Ok(Output::new(&output)? == *expected)
}
