//! Binary encoding of the public parts of a store.
//!
//! All integers are big-endian.  Every read is bounds-checked, and anything that doesn't parse
//! cleanly is a `ParseError`; nothing in here panics on bad input.

use crate::Error;

/// Conversion to and from the binary wire format
pub trait Serializable {
    /// Parse a value out of exactly `bytes`
    ///
    /// # Errors
    ///
    /// Returns a `ParseError` if `bytes` is truncated, has trailing data, or describes something
    /// inconsistent.
    ///
    fn from_slice(bytes: &[u8]) -> Result<Self, Error>
    where
        Self: Sized;

    /// Encode the value
    fn to_vec(&self) -> Vec<u8>;
}

/// Cursor over a byte slice being parsed
#[derive(Debug)]
pub(crate) struct Reader<'a> {
    /// What's left to read
    bytes: &'a [u8],
}

impl<'a> Reader<'a> {
    /// Start reading at the front of `bytes`
    pub(crate) fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    /// Take the next `n` bytes
    pub(crate) fn take(&mut self, n: usize, what: &str) -> Result<&'a [u8], Error> {
        if n > self.bytes.len() {
            return Err(Error::ParseError(format!(
                "reached end of data while looking for {what}"
            )));
        }
        let (head, tail) = self.bytes.split_at(n);
        self.bytes = tail;

        Ok(head)
    }

    /// Take a single byte
    pub(crate) fn u8(&mut self, what: &str) -> Result<u8, Error> {
        let b = self.take(1, what)?;

        b.first()
            .copied()
            .ok_or_else(|| Error::ParseError(format!("no byte for {what}")))
    }

    /// Take a big-endian `u32`
    pub(crate) fn u32(&mut self, what: &str) -> Result<u32, Error> {
        let b = self.take(4, what)?;

        Ok(u32::from_be_bytes(b.try_into().map_err(|_| {
            Error::ParseError(format!("failed to convert {b:?} into u32 for {what}"))
        })?))
    }

    /// Take a big-endian `u32` and widen it to a `usize`
    pub(crate) fn len(&mut self, what: &str) -> Result<usize, Error> {
        let n = self.u32(what)?;

        usize::try_from(n)
            .map_err(|_| Error::ParseError(format!("{what} ({n}) does not fit in memory")))
    }

    /// Make sure everything has been read
    pub(crate) fn finish(self) -> Result<(), Error> {
        if self.bytes.is_empty() {
            Ok(())
        } else {
            Err(Error::ParseError(format!(
                "{} unexpected trailing bytes",
                self.bytes.len()
            )))
        }
    }
}

/// Append a `usize` to `out` as a big-endian `u32`
///
/// Everything we write this way (table length, counts, lengths) is bounded by `u32::MAX` by
/// `Params::new`, so a value that doesn't fit is a bug in the caller.
pub(crate) fn put_len(out: &mut Vec<u8>, n: usize) {
    debug_assert!(u32::try_from(n).is_ok(), "{n} does not fit in a u32 length field");
    #[allow(clippy::cast_possible_truncation)]
    let n = n as u32;
    out.extend_from_slice(&n.to_be_bytes());
}
