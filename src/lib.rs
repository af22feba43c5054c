#![doc = include_str!("../README.md")]
#[cfg(doctest)]
pub struct ReadmeDoctests;

mod codec;
mod config;
mod error;
mod key;
mod params;
mod private;
mod public;
mod store;

#[doc(inline)]
pub use {
    codec::Serializable,
    config::{
        Config, DEFAULT_EXPANSION_PERCENT, DEFAULT_MAX_ATTEMPTS, DEFAULT_SALT_BYTES,
        DEFAULT_TAG_BYTES,
    },
    error::Error,
    key::{KeyMaterial, INDEX_KEY_BYTES, KEY_BYTES, PASSWORD_ROUNDS, SEAL_KEY_BYTES},
    params::{Params, MAX_SALT_BYTES, MAX_TAG_BYTES, MIN_SALT_BYTES, NONCE_BYTES},
    private::PrivStore,
    public::{PubStore, ShareSource},
    store::{build, build_with_rng, get},
};

mod kbkdf;
mod prf;
mod seal;
mod table;

#[cfg(feature = "serde")]
mod serde;

#[cfg(test)]
mod test_utils;

#[cfg(test)]
#[macro_use]
extern crate quickcheck;

// Tells unused_crate_dependencies to STFU about the "unused dev dependency"
#[cfg(test)]
use criterion as _;
#[cfg(all(test, not(feature = "serde")))]
use serde_json as _;
