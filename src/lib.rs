#![doc = include_str!("../README.md")]
#![forbid(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::all, clippy::pedantic)]

extern crate alloc;

mod chain;
pub mod config;
mod error;
mod hasher;

pub use crate::chain::{PasswordChain, VerifyOutcome};
pub use crate::error::{Error, Result};
pub use crate::hasher::{
    Argon2Hasher, Argon2Params, Argon2Variant, BcryptHasher, BcryptParams, BcryptPrefix,
    HashAlgorithm, Hasher,
};
