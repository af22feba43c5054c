//! Sealing and opening of outputs.
//!
//! Every output is encrypted with AES-128-GCM under the sealing key.  The nonce is the store's
//! salt followed by the entry's counter, and the associated data is the input, so a ciphertext
//! only opens for the one counter *and* the one input it was sealed for.

use aes_gcm::aead::{Aead, KeyInit, Nonce, Payload};
use aes_gcm::Aes128Gcm;
use std::fmt;

use crate::{Error, KeyMaterial, Params};

/// Bytes of authentication tag GCM appends to every ciphertext
pub(crate) const SEAL_TAG_BYTES: usize = 16;

/// AEAD context for a store
pub(crate) struct Sealer {
    /// Keyed AES-128-GCM
    aead: Aes128Gcm,
}

impl Sealer {
    /// Key a sealer with the sealing half of a store key
    pub(crate) fn new(key: &KeyMaterial) -> Result<Self, Error> {
        let aead = Aes128Gcm::new_from_slice(key.seal_key()).map_err(|e| {
            Error::KeyError(format!("AES-128-GCM received a key of invalid length ({e})"))
        })?;

        Ok(Self { aead })
    }

    /// Encrypt `output` for the entry with the given input and counter
    pub(crate) fn seal(
        &self,
        params: &Params,
        counter: u64,
        input: &[u8],
        output: &[u8],
    ) -> Result<Vec<u8>, Error> {
        let nonce = params.nonce(counter)?;

        self.aead
            .encrypt(
                Nonce::<Aes128Gcm>::from_slice(&nonce),
                Payload {
                    msg: output,
                    aad: input,
                },
            )
            .map_err(|e| Error::CryptoError(format!("failed to seal output ({e})")))
    }

    /// Decrypt a sealed output
    ///
    /// Whatever goes wrong, the answer is `ItemNotFound`; a lookup must not be able to tell a bad
    /// counter from a bad ciphertext from a bad key.
    pub(crate) fn open(
        &self,
        params: &Params,
        counter: u64,
        input: &[u8],
        sealed: &[u8],
    ) -> Result<Vec<u8>, Error> {
        let nonce = params.nonce(counter).map_err(|_| Error::ItemNotFound)?;

        self.aead
            .decrypt(
                Nonce::<Aes128Gcm>::from_slice(&nonce),
                Payload {
                    msg: sealed,
                    aad: input,
                },
            )
            .map_err(|_| Error::ItemNotFound)
    }
}

impl fmt::Debug for Sealer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sealer")
            .field("key", &"**REDACTED**")
            .finish()
    }
}
