//! The master secret for a store, and how to get one.
//!
//! A store key is a single [`KEY_BYTES`]-long secret.  The first [`INDEX_KEY_BYTES`] of it key the
//! PRF that places inputs in the table; the remaining [`SEAL_KEY_BYTES`] key the AEAD that seals
//! each output.  Neither half depends on the size of the store.

use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use sha2::Sha256;
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::Error;

/// Length of the key for the indexing PRF
pub const INDEX_KEY_BYTES: usize = 16;

/// Length of the key for sealing the outputs (the AEAD is AES-128-GCM)
pub const SEAL_KEY_BYTES: usize = 16;

/// Length of a complete store key
pub const KEY_BYTES: usize = INDEX_KEY_BYTES + SEAL_KEY_BYTES;

/// Number of PBKDF2 rounds used by [`KeyMaterial::derive_from_password`]
pub const PASSWORD_ROUNDS: u32 = 4096;

/// A store key, split into its indexing and sealing halves
///
#[derive(Clone, ZeroizeOnDrop)]
pub struct KeyMaterial {
    /// Keys the indexing PRF (via the KBKDF)
    index_key: [u8; INDEX_KEY_BYTES],
    /// Keys the AEAD
    seal_key: [u8; SEAL_KEY_BYTES],
}

impl KeyMaterial {
    /// Split a [`KEY_BYTES`]-long master key into its two halves
    ///
    /// # Errors
    ///
    /// Returns a `KeyError` if `key` is not exactly [`KEY_BYTES`] long.
    ///
    pub fn from_bytes(key: &[u8]) -> Result<Self, Error> {
        if key.len() != KEY_BYTES {
            return Err(Error::KeyError(format!(
                "store key must be exactly {KEY_BYTES} bytes (got {})",
                key.len()
            )));
        }
        let (index, seal) = key.split_at(INDEX_KEY_BYTES);

        let mut km = Self {
            index_key: [0u8; INDEX_KEY_BYTES],
            seal_key: [0u8; SEAL_KEY_BYTES],
        };
        km.index_key.copy_from_slice(index);
        km.seal_key.copy_from_slice(seal);

        Ok(km)
    }

    /// Generate a fresh, random key from the operating system's CSPRNG
    ///
    /// # Errors
    ///
    /// Returns a `CryptoError` if the operating system could not supply random bytes.  There is
    /// deliberately no fallback.
    ///
    pub fn generate() -> Result<Self, Error> {
        Self::generate_with_rng(&mut OsRng)
    }

    /// Generate a fresh key from the given RNG
    ///
    /// # Errors
    ///
    /// Returns a `CryptoError` if the RNG could not fill the key.
    ///
    pub fn generate_with_rng<R: RngCore + CryptoRng>(rng: &mut R) -> Result<Self, Error> {
        let mut k = Zeroizing::new([0u8; KEY_BYTES]);
        rng.try_fill_bytes(&mut k[..])
            .map_err(|e| Error::CryptoError(format!("RNG failed to fill key ({e})")))?;

        Self::from_bytes(&k[..])
    }

    /// Derive a key from a password and an optional salt, using PBKDF2-HMAC-SHA256
    ///
    /// This salt has nothing to do with the salt in a store's [`Params`](crate::Params); that one
    /// is picked at random each time a store is built.
    ///
    #[must_use]
    pub fn derive_from_password(password: &[u8], salt: Option<&[u8]>) -> Self {
        let mut k = Zeroizing::new([0u8; KEY_BYTES]);
        pbkdf2::pbkdf2_hmac::<Sha256>(
            password,
            salt.unwrap_or_default(),
            PASSWORD_ROUNDS,
            &mut k[..],
        );

        let mut km = Self {
            index_key: [0u8; INDEX_KEY_BYTES],
            seal_key: [0u8; SEAL_KEY_BYTES],
        };
        let (index, seal) = k.split_at(INDEX_KEY_BYTES);
        km.index_key.copy_from_slice(index);
        km.seal_key.copy_from_slice(seal);

        km
    }

    /// The complete master key, suitable for storing somewhere safe
    #[must_use]
    pub fn to_bytes(&self) -> Zeroizing<[u8; KEY_BYTES]> {
        let mut k = Zeroizing::new([0u8; KEY_BYTES]);
        let (index, seal) = k.split_at_mut(INDEX_KEY_BYTES);
        index.copy_from_slice(&self.index_key);
        seal.copy_from_slice(&self.seal_key);

        k
    }

    pub(crate) fn index_key(&self) -> &[u8; INDEX_KEY_BYTES] {
        &self.index_key
    }

    pub(crate) fn seal_key(&self) -> &[u8; SEAL_KEY_BYTES] {
        &self.seal_key
    }
}

impl Zeroize for KeyMaterial {
    fn zeroize(&mut self) {
        self.index_key.zeroize();
        self.seal_key.zeroize();
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("key", &"**REDACTED**")
            .finish()
    }
}
