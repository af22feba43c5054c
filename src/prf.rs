//! Pseudo-random placement of inputs in the table
//!
//! Every input gets two table positions and a short tag, all computed by a keyed PRF over the
//! store's salt and the input.  To anyone without the indexing key, the positions (and so the
//! contents of rows nobody has asked about) look like random noise.
//!
//! This module defines the PRF trait, the CMAC-AES128 implementation of it, and the
//! [`Indexer`] which turns PRF output into an [`Index`].
//!

use aes::Aes128;
use cmac::{Cmac, Mac};
use std::fmt;

use crate::kbkdf::{CMACAES128, KBKDF};
use crate::params::{Params, MAX_TAG_BYTES};
use crate::{Error, KeyMaterial};

/// Size of a single PRF output block
const BLOCK_SIZE: usize = 16;

/// Domain separator for the block that supplies both positions
const POSITION_DOMAIN: u8 = 0;

/// Domain separator for the block that supplies the tag
const TAG_DOMAIN: u8 = 1;

/// First domain separator used when the two positions collide and `y` has to be redrawn
const RESAMPLE_DOMAIN: u8 = 2;

/// Operation of a PRF
pub(crate) trait PseudoRandomFunction {
    /// Fill `block` with data whose content depends (only) on the domain, salt and input
    ///
    /// Also the key passed to the PRF when it was initialised, of course.
    fn randomise(&self, domain: u8, salt: &[u8], input: &[u8], block: &mut [u8; BLOCK_SIZE]);
}

/// A PRF based on CMAC with AES128
///
/// CMAC takes arbitrary-length input, which suits us, since inputs are arbitrary byte strings.
pub(crate) struct CMACAES128PRF {
    /// Keyed MAC, stored so that we don't have to redo the key schedule for every call
    mac: Cmac<Aes128>,
}

impl CMACAES128PRF {
    /// Create a new PRF, keyed from the KBKDF
    pub(crate) fn new(kdf: &dyn KBKDF) -> Result<Self, Error> {
        let mut k = zeroize::Zeroizing::new([0u8; 16]);

        kdf.derive_key(&mut k[..], b"IndexPRF.subkey")?;

        let mac = Cmac::<Aes128>::new_from_slice(&k[..]).map_err(|e| {
            Error::KeyError(format!("CMACAES128PRF received a key of invalid length ({e})"))
        })?;

        Ok(Self { mac })
    }
}

impl PseudoRandomFunction for CMACAES128PRF {
    fn randomise(&self, domain: u8, salt: &[u8], input: &[u8], block: &mut [u8; BLOCK_SIZE]) {
        let mut mac = self.mac.clone();
        mac.update(&[domain]);
        mac.update(salt);
        mac.update(input);
        block.copy_from_slice(&mac.finalize().into_bytes());
    }
}

impl fmt::Debug for CMACAES128PRF {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CMACAES128PRF")
            .field("key", &"**REDACTED**")
            .finish()
    }
}

/// Where an input lives in the table, and the tag that confirms it
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Index {
    /// First row
    pub(crate) x: usize,
    /// Second row; never equal to `x`
    pub(crate) y: usize,
    /// Check value stored in the XOR of the two rows
    pub(crate) tag: Vec<u8>,
}

/// Computes the [`Index`] of inputs for any table built under one indexing key
#[derive(Debug)]
pub(crate) struct Indexer<PRF: PseudoRandomFunction = CMACAES128PRF> {
    /// The keyed PRF
    prf: PRF,
}

impl Indexer {
    /// Create an indexer from the indexing half of a store key
    pub(crate) fn new(key: &KeyMaterial) -> Result<Self, Error> {
        let kdf = CMACAES128::new(key.index_key())?;

        Ok(Self {
            prf: CMACAES128PRF::new(&kdf)?,
        })
    }
}

impl<PRF: PseudoRandomFunction> Indexer<PRF> {
    /// Work out the two rows and the tag for `input` in a table with the given parameters
    ///
    /// Deterministic: the same key, salt and input always give the same answer.
    pub(crate) fn index(&self, params: &Params, input: &[u8]) -> Index {
        let table_len = params.table_len() as u64;
        let salt = params.salt();
        let mut block = [0u8; BLOCK_SIZE];

        self.prf.randomise(POSITION_DOMAIN, salt, input, &mut block);
        let (hi, lo) = block.split_at(8);
        let x = reduce(hi, table_len);
        let mut y = reduce(lo, table_len);

        let mut domain = RESAMPLE_DOMAIN;
        while y == x {
            if domain == u8::MAX {
                // 253 collisions in a row; it's not going to happen, but the function has to
                // be total
                y = (x + 1) % table_len;
                break;
            }
            self.prf.randomise(domain, salt, input, &mut block);
            y = reduce(block.split_at(8).0, table_len);
            domain += 1;
        }

        self.prf.randomise(TAG_DOMAIN, salt, input, &mut block);
        let tag = block[..params.tag_bytes().min(MAX_TAG_BYTES)].to_vec();

        // both are < table_len, which fits in a u32
        Index {
            x: x as usize,
            y: y as usize,
            tag,
        }
    }
}

/// Interpret the first eight bytes of `bytes` as a big-endian integer, reduced mod `modulus`
fn reduce(bytes: &[u8], modulus: u64) -> u64 {
    let mut be = [0u8; 8];
    be.copy_from_slice(&bytes[..8]);

    u64::from_be_bytes(be) % modulus
}
