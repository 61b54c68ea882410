use super::{as_text, fill_random, HashAlgorithm};
use crate::{Error, Result};
use alloc::{string::String, vec::Vec};
use lazy_static::lazy_static;
use password_hash::{Encoding, Output};
use regex::Regex;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

const NAME: &str = "bcrypt";

const MIN_ROUNDS: u32 = 4;
const MAX_ROUNDS: u32 = 31;
const SALT_LEN: usize = 16;
const ENCODED_SALT_LEN: usize = 22;
const DIGEST_LEN: usize = 23;
const ENCODED_DIGEST_LEN: usize = 31;
const MAX_PASSWORD_LEN: usize = 72;

lazy_static! {
    // Fixed width, anchored at both ends
    static ref ENCODED_HASH: Regex = Regex::new(concat!(
        r"^\$(?P<prefix>2[abxy])\$(?P<rounds>[0-9]{2})\$",
        r"(?P<salt>[A-Za-z0-9+/.]{22})(?P<digest>[A-Za-z0-9+/.]{31})$",
    ))
    .unwrap();
}

/// bcrypt version prefix used for new hashes
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub enum BcryptPrefix {
    /// `$2a$`
    #[serde(rename = "2a")]
    TwoA,
    /// `$2b$`
    #[default]
    #[serde(rename = "2b")]
    TwoB,
}

impl BcryptPrefix {
    /// The prefix as it appears in an encoded hash
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TwoA => "2a",
            Self::TwoB => "2b",
        }
    }
}

/// bcrypt parameters
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct BcryptParams {
    /// Work factor, the primitive runs `2^rounds` iterations
    pub rounds: u32,
    /// Prefix of newly produced hashes
    pub prefix: BcryptPrefix,
}

impl Default for BcryptParams {
    fn default() -> Self {
        Self {
            rounds: bcrypt::DEFAULT_COST,
            prefix: BcryptPrefix::default(),
        }
    }
}

/// Fields of a modular crypt format bcrypt hash, still encoded
struct Mcf<'a> {
    prefix: &'a str,
    rounds: u32,
    salt: &'a str,
    digest: &'a str,
}

impl<'a> Mcf<'a> {
    fn parse(hash: &'a [u8]) -> Option<Self> {
        let captures = ENCODED_HASH.captures(as_text(hash)?)?;

        Some(Self {
            prefix: captures.name("prefix")?.as_str(),
            rounds: captures.name("rounds")?.as_str().parse().ok()?,
            salt: captures.name("salt")?.as_str(),
            digest: captures.name("digest")?.as_str(),
        })
    }
}

/// Run the Blowfish primitive and keep the 23 bytes that end up in the hash
fn raw_digest(cost: u32, salt: [u8; SALT_LEN], password: &[u8]) -> [u8; DIGEST_LEN] {
    // Null-terminate the password
    let mut password_vec = Zeroizing::new(Vec::with_capacity(password.len() + 1));
    password_vec.extend_from_slice(password);
    password_vec.push(0);

    // Every mainstream implementation truncates, so do we
    let truncated = if password_vec.len() > MAX_PASSWORD_LEN {
        &password_vec[..MAX_PASSWORD_LEN]
    } else {
        &password_vec[..]
    };

    let raw_hash = bcrypt::bcrypt(cost, salt, truncated);
    let mut digest = [0; DIGEST_LEN];
    digest.copy_from_slice(&raw_hash[..DIGEST_LEN]);
    digest
}

/// bcrypt hasher
#[derive(Clone, Debug, Default)]
pub struct BcryptHasher {
    params: BcryptParams,
}

impl BcryptHasher {
    /// Create a hasher
    ///
    /// # Errors
    ///
    /// [`Error::HasherUnavailable`] if `rounds` is outside of `4..=31`
    pub fn new(params: BcryptParams) -> Result<Self> {
        if !(MIN_ROUNDS..=MAX_ROUNDS).contains(&params.rounds) {
            return Err(Error::HasherUnavailable {
                hasher: NAME,
                reason: format!(
                    "rounds must be between {MIN_ROUNDS} and {MAX_ROUNDS}, got {}",
                    params.rounds
                ),
            });
        }

        Ok(Self { params })
    }

    /// Configured parameters
    #[must_use]
    pub fn params(&self) -> &BcryptParams {
        &self.params
    }
}

impl HashAlgorithm for BcryptHasher {
    fn name(&self) -> &'static str {
        NAME
    }

    fn identify(&self, hash: impl AsRef<[u8]>) -> bool {
        as_text(hash.as_ref()).map_or(false, |hash| ENCODED_HASH.is_match(hash))
    }

    fn hash(&self, password: impl AsRef<[u8]>, salt: Option<&[u8]>) -> Result<String> {
        let salt: [u8; SALT_LEN] = match salt {
            Some(salt) => salt.try_into().map_err(|_| Error::InvalidSalt {
                hasher: NAME,
                reason: format!("expected {SALT_LEN} bytes, got {}", salt.len()),
            })?,
            None => {
                let mut salt = [0; SALT_LEN];
                fill_random(&mut salt);
                salt
            }
        };

        let digest = raw_digest(self.params.rounds, salt, password.as_ref());

        let mut salt_buf = [0; ENCODED_SALT_LEN];
        let mut digest_buf = [0; ENCODED_DIGEST_LEN];
        let encoded_salt = Encoding::Bcrypt
            .encode(&salt, &mut salt_buf)
            .map_err(password_hash::Error::from)?;
        let encoded_digest = Encoding::Bcrypt
            .encode(&digest, &mut digest_buf)
            .map_err(password_hash::Error::from)?;

        Ok(format!(
            "${}${:02}${encoded_salt}{encoded_digest}",
            self.params.prefix.as_str(),
            self.params.rounds,
        ))
    }

    fn verify(&self, password: impl AsRef<[u8]>, hash: impl AsRef<[u8]>) -> bool {
        let Some(mcf) = Mcf::parse(hash.as_ref()) else {
            return false;
        };

        // The primitive can't run outside of these
        if !(MIN_ROUNDS..=MAX_ROUNDS).contains(&mcf.rounds) {
            tracing::debug!(rounds = mcf.rounds, "bcrypt hash has an unusable cost");
            return false;
        }

        let mut salt = [0; SALT_LEN];
        let mut expected = [0; DIGEST_LEN];
        if Encoding::Bcrypt.decode(mcf.salt, &mut salt).is_err()
            || Encoding::Bcrypt.decode(mcf.digest, &mut expected).is_err()
        {
            tracing::debug!("bcrypt hash isn't valid bcrypt base64");
            return false;
        }

        let computed = raw_digest(mcf.rounds, salt, password.as_ref());

        // `Output` compares in constant time
        match (Output::new(&computed), Output::new(&expected)) {
            (Ok(computed), Ok(expected)) => computed == expected,
            _ => false,
        }
    }

    fn needs_rehash(&self, hash: impl AsRef<[u8]>) -> bool {
        Mcf::parse(hash.as_ref()).map_or(true, |mcf| {
            mcf.rounds != self.params.rounds || mcf.prefix != self.params.prefix.as_str()
        })
    }
}

#[cfg(test)]
mod test {
    use super::{BcryptHasher, BcryptParams, BcryptPrefix};
    use crate::{Error, HashAlgorithm};

    const PYTHON_HASH: &str = "$2b$04$EGdrhbKUv8Oc9vGiXX0HQOxSg445d458Muh7DAHskb6QbtCvdxcie";
    const NODE_HASH: &str = "$2a$04$n4Uy0eSnMfvnESYL.bLwuuj0U/ETSsoTpRT9GVk5bektyVVa5xnIi";

    fn with_rounds(rounds: u32) -> BcryptHasher {
        BcryptHasher::new(BcryptParams {
            rounds,
            ..BcryptParams::default()
        })
        .unwrap()
    }

    #[test]
    fn python_mcf_test() {
        assert!(with_rounds(4).verify("correctbatteryhorsestapler", PYTHON_HASH));
        assert!(!with_rounds(4).verify("INVALID_PASSWORD", PYTHON_HASH));
    }

    #[test]
    fn node_mcf_test() {
        assert!(with_rounds(4).verify("correctbatteryhorsestapler", NODE_HASH));
        assert!(with_rounds(4).verify(b"correctbatteryhorsestapler", NODE_HASH.as_bytes()));
    }

    #[test]
    fn verify_own() {
        let hasher = with_rounds(4);
        let hash = hasher.hash("herminetincture", None).unwrap();

        assert_eq!(hash.len(), 60);
        assert!(hash.starts_with("$2b$04$"));
        assert!(hasher.verify("herminetincture", &hash));
        assert!(hasher.verify("herminetincture", hash.as_bytes()));
        assert!(!hasher.verify("INVALID_PASSWORD", &hash));
    }

    #[test]
    fn matches_bcrypt_crate() {
        let salt = *b"0123456789abcdef";
        let ours = with_rounds(4).hash("herminetincture", Some(&salt)).unwrap();
        let theirs = bcrypt::hash_with_salt("herminetincture", 4, salt)
            .unwrap()
            .format_for_version(bcrypt::Version::TwoB);

        assert_eq!(ours, theirs);
        assert!(bcrypt::verify("herminetincture", &ours).unwrap());
    }

    #[test]
    fn long_passwords_are_truncated() {
        let hasher = with_rounds(4);
        let long = "a".repeat(100);
        let hash = hasher.hash(&long, None).unwrap();

        assert!(hasher.verify(&long, &hash));
        assert!(hasher.verify("a".repeat(72), &hash));
        assert!(!hasher.verify("a".repeat(71), &hash));
    }

    #[test]
    fn identify() {
        let hasher = with_rounds(4);

        assert!(hasher.identify(PYTHON_HASH));
        assert!(hasher.identify(PYTHON_HASH.as_bytes()));
        assert!(hasher.identify(NODE_HASH));
        assert!(hasher.identify(PYTHON_HASH.replacen("$2b$", "$2y$", 1)));
        assert!(hasher.identify(PYTHON_HASH.replacen("$2b$", "$2x$", 1)));

        assert!(!hasher.identify("INVALID_HASH"));
        assert!(!hasher.identify(b"INVALID_HASH"));
        assert!(!hasher.identify(""));
        assert!(!hasher.identify(b"\xc3\x28"));
        assert!(!hasher.identify(&PYTHON_HASH[..59]));
        assert!(!hasher.identify(format!("{PYTHON_HASH}a")));
        assert!(!hasher.identify(PYTHON_HASH.replacen("$2b$", "$2c$", 1)));
        assert!(!hasher.identify(PYTHON_HASH.replacen("$04$", "$4$", 1)));
        assert!(!hasher.identify(format!("{PYTHON_HASH}\n")));
        assert!(!hasher.identify(format!("$2b$04${}", ".".repeat(100_000))));
    }

    #[test]
    fn deterministic_with_salt() {
        let hasher = with_rounds(4);
        let salt = [7; 16];

        assert_eq!(
            hasher.hash("herminetincture", Some(&salt)).unwrap(),
            hasher.hash("herminetincture", Some(&salt)).unwrap()
        );
        assert!(matches!(
            hasher.hash("herminetincture", Some(b"too short")),
            Err(Error::InvalidSalt { hasher: "bcrypt", .. })
        ));
    }

    #[test]
    fn verify_rejects_garbage() {
        let hasher = with_rounds(4);

        assert!(!hasher.verify("correctbatteryhorsestapler", "INVALID_HASH"));
        assert!(!hasher.verify("correctbatteryhorsestapler", b"\xc3\x28"));
        // Cost the primitive can't run with
        assert!(!hasher.verify(
            "correctbatteryhorsestapler",
            PYTHON_HASH.replacen("$04$", "$99$", 1)
        ));
        assert!(!hasher.verify(
            "correctbatteryhorsestapler",
            PYTHON_HASH.replacen("$04$", "$03$", 1)
        ));
        // Matches the pattern, but `+` isn't part of the bcrypt alphabet
        assert!(!hasher.verify(
            "correctbatteryhorsestapler",
            PYTHON_HASH.replacen("EGdr", "EG+r", 1)
        ));
    }

    #[test]
    fn verifies_with_embedded_cost() {
        let hash = with_rounds(5).hash("herminetincture", None).unwrap();
        assert!(with_rounds(4).verify("herminetincture", &hash));
    }

    #[test]
    fn check_needs_rehash() {
        let hasher = BcryptHasher::default();
        let hash = hasher.hash("herminetincture", None).unwrap();

        assert!(!hasher.needs_rehash(&hash));
        assert!(!hasher.needs_rehash(hash.as_bytes()));
        assert!(hasher.needs_rehash("INVALID_HASH"));
        assert!(hasher.needs_rehash(b"INVALID_HASH"));

        let different_rounds = with_rounds(10).hash("herminetincture", None).unwrap();
        assert!(hasher.needs_rehash(different_rounds));

        let different_prefix = BcryptHasher::new(BcryptParams {
            prefix: BcryptPrefix::TwoA,
            ..BcryptParams::default()
        })
        .unwrap()
        .hash("herminetincture", None)
        .unwrap();
        assert!(different_prefix.starts_with("$2a$12$"));
        assert!(hasher.needs_rehash(different_prefix));
    }

    #[test]
    fn invalid_rounds() {
        for rounds in [0, 3, 32, 99] {
            assert!(matches!(
                BcryptHasher::new(BcryptParams {
                    rounds,
                    ..BcryptParams::default()
                }),
                Err(Error::HasherUnavailable { hasher: "bcrypt", .. })
            ));
        }
    }
}
