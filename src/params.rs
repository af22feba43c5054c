//! Public parameters of a store.
//!
//! Everything here is safe to publish: the table geometry, the tag width, and the salt that was
//! mixed into every PRF evaluation and every AEAD nonce when the store was built.

use crate::codec::{put_len, Reader, Serializable};
use crate::seal::SEAL_TAG_BYTES;
use crate::Error;

/// Length of an AES-128-GCM nonce
///
/// The nonce is the salt followed by the counter, so the salt length determines how many bytes
/// are left over for counters (and therefore how many entries a store can hold).
pub const NONCE_BYTES: usize = 12;

/// Shortest salt we'll use; leaves room for an eight byte counter
pub const MIN_SALT_BYTES: usize = 4;

/// Longest salt we'll use; leaves room for a one byte counter
pub const MAX_SALT_BYTES: usize = NONCE_BYTES - 1;

/// Widest tag we can take from a single PRF block
pub const MAX_TAG_BYTES: usize = 16;

/// The table geometry and salt of a store
///
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Params {
    /// Number of rows in the table
    table_len: usize,
    /// Width of the tag at the front of each row
    tag_bytes: usize,
    /// Public per-store salt
    salt: Vec<u8>,
    /// Length of the longest output stored
    max_output_bytes: usize,
}

impl Params {
    /// Assemble a set of parameters, checking that they describe a usable store
    ///
    /// # Errors
    ///
    /// Returns a `ParamsError` if the table has fewer than two rows (or more than `u32::MAX`), the
    /// tag is empty or wider than [`MAX_TAG_BYTES`], the salt length is outside
    /// [`MIN_SALT_BYTES`]`..=`[`MAX_SALT_BYTES`], or a sealed output of `max_output_bytes` would be
    /// too long to encode.
    ///
    pub fn new(
        table_len: usize,
        tag_bytes: usize,
        salt: Vec<u8>,
        max_output_bytes: usize,
    ) -> Result<Self, Error> {
        if table_len < 2 || u32::try_from(table_len).is_err() {
            return Err(Error::ParamsError(format!(
                "table length must be between 2 and {} (got {table_len})",
                u32::MAX
            )));
        }
        if tag_bytes == 0 || tag_bytes > MAX_TAG_BYTES {
            return Err(Error::ParamsError(format!(
                "tag must be between 1 and {MAX_TAG_BYTES} bytes (got {tag_bytes})"
            )));
        }
        check_salt_bytes(salt.len())?;
        if max_output_bytes
            .checked_add(SEAL_TAG_BYTES)
            .and_then(|n| u32::try_from(n).ok())
            .is_none()
        {
            return Err(Error::ParamsError(format!(
                "outputs of {max_output_bytes} bytes are too long to store"
            )));
        }

        Ok(Self {
            table_len,
            tag_bytes,
            salt,
            max_output_bytes,
        })
    }

    /// Number of rows in the table
    #[must_use]
    pub fn table_len(&self) -> usize {
        self.table_len
    }

    /// Width of the tag part of a row
    #[must_use]
    pub fn tag_bytes(&self) -> usize {
        self.tag_bytes
    }

    /// Width of the counter part of a row
    #[must_use]
    pub fn ctr_bytes(&self) -> usize {
        NONCE_BYTES - self.salt.len()
    }

    /// Width of a complete table row
    #[must_use]
    pub fn row_bytes(&self) -> usize {
        self.tag_bytes + self.ctr_bytes()
    }

    /// The public salt
    #[must_use]
    pub fn salt(&self) -> &[u8] {
        &self.salt
    }

    /// Length of the longest output in the store
    #[must_use]
    pub fn max_output_bytes(&self) -> usize {
        self.max_output_bytes
    }

    /// How many distinct counters (and therefore entries) this layout supports
    #[must_use]
    pub fn capacity(&self) -> u128 {
        counter_capacity(self.ctr_bytes())
    }

    /// The AEAD nonce for the entry with the given counter: `salt || counter`
    pub(crate) fn nonce(&self, counter: u64) -> Result<[u8; NONCE_BYTES], Error> {
        let mut nonce = [0u8; NONCE_BYTES];
        let (salt, ctr) = nonce.split_at_mut(self.salt.len());
        salt.copy_from_slice(&self.salt);
        self.encode_counter(counter, ctr)?;

        Ok(nonce)
    }

    /// The value the two rows of an entry must XOR to: `tag || counter`
    pub(crate) fn row_value(&self, tag: &[u8], counter: u64) -> Result<Vec<u8>, Error> {
        if tag.len() != self.tag_bytes {
            return Err(Error::InternalError(format!(
                "tag of {} bytes given for {} byte tag field",
                tag.len(),
                self.tag_bytes
            )));
        }
        let mut row = vec![0u8; self.row_bytes()];
        let (t, ctr) = row.split_at_mut(self.tag_bytes);
        t.copy_from_slice(tag);
        self.encode_counter(counter, ctr)?;

        Ok(row)
    }

    /// Write `counter` little-endian into exactly `ctr_bytes()` bytes
    fn encode_counter(&self, counter: u64, out: &mut [u8]) -> Result<(), Error> {
        let ctr_bytes = self.ctr_bytes();
        if u128::from(counter) >= self.capacity() || out.len() != ctr_bytes {
            return Err(Error::InternalError(format!(
                "counter {counter} does not fit in {ctr_bytes} bytes"
            )));
        }
        out.copy_from_slice(&counter.to_le_bytes()[..ctr_bytes]);

        Ok(())
    }

    /// Read a counter back out of the counter part of a row
    pub(crate) fn decode_counter(&self, ctr: &[u8]) -> Result<u64, Error> {
        if ctr.len() != self.ctr_bytes() {
            return Err(Error::InternalError(format!(
                "counter field of {} bytes, expected {}",
                ctr.len(),
                self.ctr_bytes()
            )));
        }
        let mut le = [0u8; 8];
        le[..ctr.len()].copy_from_slice(ctr);

        Ok(u64::from_le_bytes(le))
    }

    /// Append the wire encoding to `out`
    pub(crate) fn write_to(&self, out: &mut Vec<u8>) {
        put_len(out, self.table_len);
        // all three are bounded well below 256 by `Params::new`
        out.push(self.row_bytes() as u8);
        out.push(self.tag_bytes as u8);
        out.push(self.salt.len() as u8);
        out.extend_from_slice(&self.salt);
        put_len(out, self.max_output_bytes);
    }

    /// Parse the wire encoding from the front of a reader
    pub(crate) fn read_from(r: &mut Reader<'_>) -> Result<Self, Error> {
        let table_len = r.len("table length")?;
        let row_bytes = usize::from(r.u8("row width")?);
        let tag_bytes = usize::from(r.u8("tag width")?);
        let salt_bytes = usize::from(r.u8("salt width")?);
        let salt = r.take(salt_bytes, "salt")?.to_vec();
        let max_output_bytes = r.len("maximum output width")?;

        let params = Self::new(table_len, tag_bytes, salt, max_output_bytes)
            .map_err(|e| Error::ParseError(e.to_string()))?;

        if params.row_bytes() == row_bytes {
            Ok(params)
        } else {
            Err(Error::ParseError(format!(
                "row width {row_bytes} does not match {tag_bytes} byte tag and {} byte counter",
                params.ctr_bytes()
            )))
        }
    }
}

impl Serializable for Params {
    fn from_slice(bytes: &[u8]) -> Result<Self, Error> {
        let mut r = Reader::new(bytes);
        let params = Self::read_from(&mut r)?;
        r.finish()?;

        Ok(params)
    }

    fn to_vec(&self) -> Vec<u8> {
        let mut v = Vec::with_capacity(11 + self.salt.len());
        self.write_to(&mut v);

        v
    }
}

/// Number of distinct counters that fit in `ctr_bytes` bytes
pub(crate) fn counter_capacity(ctr_bytes: usize) -> u128 {
    1u128 << (8 * ctr_bytes)
}

/// Make sure a salt of this length leaves between one and eight bytes for the counter
pub(crate) fn check_salt_bytes(salt_bytes: usize) -> Result<(), Error> {
    if (MIN_SALT_BYTES..=MAX_SALT_BYTES).contains(&salt_bytes) {
        Ok(())
    } else {
        Err(Error::ParamsError(format!(
            "salt must be between {MIN_SALT_BYTES} and {MAX_SALT_BYTES} bytes (got {salt_bytes})"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(salt_bytes: usize) -> Params {
        Params::new(100, 4, vec![0xa5; salt_bytes], 10).unwrap()
    }

    #[test]
    fn default_layout() {
        let p = params(8);

        assert_eq!(4, p.ctr_bytes());
        assert_eq!(8, p.row_bytes());
        assert_eq!(1u128 << 32, p.capacity());
    }

    #[test]
    fn widest_salt_leaves_one_counter_byte() {
        let p = params(MAX_SALT_BYTES);

        assert_eq!(1, p.ctr_bytes());
        assert_eq!(256, p.capacity());
    }

    #[test]
    fn nonce_is_salt_then_little_endian_counter() {
        let p = params(8);

        assert_eq!(
            [0xa5, 0xa5, 0xa5, 0xa5, 0xa5, 0xa5, 0xa5, 0xa5, 0x02, 0x01, 0, 0],
            p.nonce(0x0102).unwrap()
        );
    }

    #[test]
    fn row_value_is_tag_then_counter() {
        let p = params(8);

        assert_eq!(
            vec![1, 2, 3, 4, 7, 0, 0, 0],
            p.row_value(&[1, 2, 3, 4], 7).unwrap()
        );
    }

    #[test]
    fn counter_round_trips() {
        let p = params(9);
        let row = p.row_value(&[0; 4], 0x00ab_cdef).unwrap();

        assert_eq!(0x00ab_cdef, p.decode_counter(&row[4..]).unwrap());
    }

    #[test]
    fn counter_beyond_capacity_is_refused() {
        let p = params(MAX_SALT_BYTES);

        assert!(p.nonce(255).is_ok());
        assert!(matches!(p.nonce(256), Err(Error::InternalError(_))));
    }

    #[test]
    fn tiny_table_is_rejected() {
        assert!(matches!(
            Params::new(1, 4, vec![0; 8], 0),
            Err(Error::ParamsError(_))
        ));
    }

    #[test]
    fn bad_tag_widths_are_rejected() {
        assert!(Params::new(10, 0, vec![0; 8], 0).is_err());
        assert!(Params::new(10, 17, vec![0; 8], 0).is_err());
        assert!(Params::new(10, 16, vec![0; 8], 0).is_ok());
    }

    #[test]
    fn wire_format_is_stable() {
        let p = Params::new(0x0102, 3, vec![0xee; 8], 77).unwrap();

        assert_eq!(
            vec![0, 0, 1, 2, 7, 3, 8, 0xee, 0xee, 0xee, 0xee, 0xee, 0xee, 0xee, 0xee, 0, 0, 0, 77],
            p.to_vec()
        );
        assert_eq!(p, Params::from_slice(&p.to_vec()).unwrap());
    }

    #[test]
    fn max_output_must_leave_room_for_the_seal_tag() {
        let widest = u32::MAX as usize - SEAL_TAG_BYTES;

        assert!(matches!(
            Params::new(10, 4, vec![0; 8], widest + 1),
            Err(Error::ParamsError(_))
        ));
        assert!(matches!(
            Params::new(10, 4, vec![0; 8], usize::MAX),
            Err(Error::ParamsError(_))
        ));

        let p = Params::new(10, 4, vec![0; 8], widest).unwrap();
        assert_eq!(p, Params::from_slice(&p.to_vec()).unwrap());
    }

    #[test]
    fn mismatched_row_width_does_not_parse() {
        let mut v = params(8).to_vec();
        v[4] = 9;

        assert!(matches!(Params::from_slice(&v), Err(Error::ParseError(_))));
    }

    #[test]
    fn invalid_params_do_not_parse() {
        let mut v = params(8).to_vec();
        v[5] = 0;

        assert!(matches!(Params::from_slice(&v), Err(Error::ParseError(_))));
    }

    #[test]
    fn bad_salt_lengths_are_rejected() {
        assert!(Params::new(10, 4, vec![0; 3], 0).is_err());
        assert!(Params::new(10, 4, vec![0; 12], 0).is_err());
        assert!(Params::new(10, 4, vec![0; 4], 0).is_ok());
    }
}
