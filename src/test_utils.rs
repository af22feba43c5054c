//! Shared fixtures for the unit tests.

use simplelog::{Config as LogConfig, WriteLogger};
use std::sync::Once;

use crate::key::KEY_BYTES;
use crate::{build, Config, KeyMaterial, PrivStore, PubStore};

static INIT: Once = Once::new();

// For use in manual testing and inspection.
pub(crate) fn init_logger() {
    INIT.call_once(|| {
        WriteLogger::init(log::LevelFilter::Info, LogConfig::default(), std::io::stdout()).unwrap()
    })
}

/// A fixed key, so failures are reproducible
pub(crate) fn key() -> KeyMaterial {
    let mut k = [0u8; KEY_BYTES];
    for (i, b) in k.iter_mut().enumerate() {
        *b = i as u8;
    }

    KeyMaterial::from_bytes(&k).unwrap()
}

/// The smallest interesting store: two entries
pub(crate) fn alice_and_bob() -> (PubStore, PrivStore) {
    build(
        &key(),
        [("alice", "wonderland"), ("bob", "builder")],
        &Config::default(),
    )
    .unwrap()
}
