//! Key-based Key Derivation
//!
//! The indexing key is never used directly as a PRF key.  Instead, per NIST SP800-108 (counter
//! mode, CMAC as the PRF), we derive a purpose-specific subkey from it, so that adding another
//! keyed primitive later doesn't mean reusing the same key for two jobs.
//!

use aes::Aes128;
use cmac::{Cmac, Mac};
use std::fmt;
use zeroize::ZeroizeOnDrop;

use crate::Error;

/// The key-generating functionality of a KBKDF
///
#[allow(clippy::upper_case_acronyms)]
pub(crate) trait KBKDF {
    /// Generate a new key
    ///
    /// The derived key is written to `subkey`, which can be of arbitrary length (up to 2^16
    /// blocks).  The same `id` with the same root key always produces the same subkey, so make
    /// your `id`s distinct for each different use.
    ///
    /// # Errors
    ///
    /// Will fail if the requested subkey is too long, or an underlying cryptographic operation
    /// fails.
    ///
    fn derive_key(&self, subkey: &mut [u8], id: &[u8]) -> Result<(), Error>;
}

/// A KBKDF based on CMACAES128
///
#[derive(ZeroizeOnDrop)]
#[allow(clippy::upper_case_acronyms)]
pub(crate) struct CMACAES128 {
    /// The key from which all our new keys are derived
    root_key: [u8; 16],
}

/// The number of bytes that the underlying cryptographic primitive generates on each call
const KBKDF_BLOCK_SIZE: usize = 16;

impl CMACAES128 {
    /// Create a KBKDF from a 16 byte root key
    ///
    /// # Errors
    ///
    /// Returns a `KeyError` if `root_key` is not exactly 16 bytes long.
    ///
    pub(crate) fn new(root_key: &[u8]) -> Result<Self, Error> {
        let root_key: [u8; 16] = root_key.try_into().map_err(|_| {
            Error::KeyError(format!(
                "key for a CMACAES128 KBKDF must be exactly 16 bytes (got {})",
                root_key.len()
            ))
        })?;

        Ok(Self { root_key })
    }
}

impl KBKDF for CMACAES128 {
    fn derive_key(&self, subkey: &mut [u8], id: &[u8]) -> Result<(), Error> {
        // every block index has to fit in the u16 counter
        let _: u16 = num::Integer::div_ceil(&subkey.len(), &KBKDF_BLOCK_SIZE)
            .try_into()
            .map_err(|e| {
                Error::KeyError(format!(
                    "Attempted to derive key greater than maximum supported size ({e})"
                ))
            })?;
        let mut keygen = Cmac::<Aes128>::new_from_slice(&self.root_key).map_err(|e| {
            Error::KeyError(format!(
                "CAN'T HAPPEN: KBKDF key is of invalid length ({e})"
            ))
        })?;

        // chunks first, so the counter is never stepped past the last block
        for (segment, i) in subkey.chunks_mut(KBKDF_BLOCK_SIZE).zip(0u16..) {
            keygen.update(&i.to_be_bytes());
            keygen.update(b"\0");
            keygen.update(id);

            let block = keygen.finalize_reset().into_bytes();
            let len = segment.len();
            segment.copy_from_slice(block.get(..len).ok_or_else(|| {
                Error::InternalError(format!(
                    "key block did not have bytes in range 0..{len} in KBKDF.derive_key"
                ))
            })?);
        }

        Ok(())
    }
}

impl fmt::Debug for CMACAES128 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KBKDF")
            .field("key", &"**REDACTED**")
            .finish()
    }
}
