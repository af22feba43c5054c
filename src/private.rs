//! The key-holding half of a store.
//!
//! A [`PrivStore`] knows where each input lives and how to open what it finds there.  It never
//! holds any of the table itself; it asks a [`ShareSource`] for the share at the two rows it
//! computed, checks the tag, and opens the sealed output.

use std::fmt;
use subtle::ConstantTimeEq;

use crate::prf::{Index, Indexer};
use crate::public::ShareSource;
use crate::seal::Sealer;
use crate::{Error, KeyMaterial, Params};

/// The private part of a store
///
/// Cheap to rebuild: all it needs is the key and the published [`Params`] of the store it is
/// going to query.
pub struct PrivStore {
    /// Maps inputs to rows and tags
    indexer: Indexer,
    /// Opens sealed outputs
    sealer: Sealer,
    /// Geometry and salt of the matching public store
    params: Params,
}

impl PrivStore {
    /// Create the private half of a store from its key and public parameters
    ///
    /// # Errors
    ///
    /// Returns a `KeyError` if the key cannot be used to set up the PRF or the AEAD.
    ///
    pub fn new(key: &KeyMaterial, params: Params) -> Result<Self, Error> {
        Ok(Self::from_parts(
            Indexer::new(key)?,
            Sealer::new(key)?,
            params,
        ))
    }

    /// Create the private half of a store from a raw 32 byte key
    ///
    /// # Errors
    ///
    /// Returns a `KeyError` if `key` is the wrong length.
    ///
    pub fn from_key_bytes(key: &[u8], params: Params) -> Result<Self, Error> {
        Self::new(&KeyMaterial::from_bytes(key)?, params)
    }

    pub(crate) fn from_parts(indexer: Indexer, sealer: Sealer, params: Params) -> Self {
        Self {
            indexer,
            sealer,
            params,
        }
    }

    /// The public parameters this store was set up for
    #[must_use]
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// The two rows to ask for when looking up `input`
    ///
    /// The rows are always distinct, and are returned whether or not `input` is actually in the
    /// store.
    #[must_use]
    pub fn get_idx(&self, input: &[u8]) -> (usize, usize) {
        let Index { x, y, .. } = self.indexer.index(&self.params, input);

        (x, y)
    }

    /// Recover the output for `input` from the share returned for its rows
    ///
    /// # Errors
    ///
    /// Returns `ItemNotFound` if the share is too short, its tag doesn't match, or its sealed
    /// output doesn't open for `input`.
    ///
    pub fn get_output(&self, input: &[u8], pub_share: &[u8]) -> Result<Vec<u8>, Error> {
        let Index { tag, .. } = self.indexer.index(&self.params, input);
        let row_bytes = self.params.row_bytes();

        if pub_share.len() < row_bytes {
            return Err(Error::ItemNotFound);
        }
        let (row, sealed) = pub_share.split_at(row_bytes);
        let (row_tag, ctr) = row.split_at(self.params.tag_bytes());

        if !bool::from(row_tag.ct_eq(&tag)) {
            return Err(Error::ItemNotFound);
        }
        let counter = self
            .params
            .decode_counter(ctr)
            .map_err(|_| Error::ItemNotFound)?;

        self.sealer.open(&self.params, counter, input, sealed)
    }

    /// Look up `input`, fetching its share from `source`
    ///
    /// # Errors
    ///
    /// Returns `ItemNotFound` if `input` isn't in the store, or whatever `source` returns if it
    /// can't produce a share.
    ///
    pub fn get<S: ShareSource + ?Sized>(&self, source: &S, input: &[u8]) -> Result<Vec<u8>, Error> {
        let (x, y) = self.get_idx(input);
        let share = source.get_share(x, y)?;

        self.get_output(input, &share)
    }

    /// Full index (rows and tag) of `input`
    #[cfg(test)]
    pub(crate) fn index(&self, input: &[u8]) -> Index {
        self.indexer.index(&self.params, input)
    }
}

impl fmt::Debug for PrivStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivStore")
            .field("key", &"**REDACTED**")
            .field("params", &self.params)
            .finish()
    }
}
