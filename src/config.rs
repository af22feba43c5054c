//! Knobs for building a store.
//!
//! The defaults are fine for most uses.  The ones worth knowing about:
//!
//! * `salt_bytes` trades salt length for counter length.  The AEAD nonce is twelve bytes, so an
//!   eight byte salt leaves four bytes of counter, which caps a store at 2^32 entries.
//! * `expansion_percent` sets the table length relative to the number of entries.  Each input is
//!   an edge between two rows, and the rows can only be assigned if the graph has (almost) no
//!   cycles, which needs a table comfortably more than twice as long as the input.
//! * `max_attempts` bounds how many salts we try before deciding the table is too small.

use crate::params::{check_salt_bytes, counter_capacity, MAX_TAG_BYTES, NONCE_BYTES};
use crate::Error;

/// Default tag width
pub const DEFAULT_TAG_BYTES: usize = 4;

/// Default salt width
pub const DEFAULT_SALT_BYTES: usize = 8;

/// Default table length, as a percentage of the number of entries
pub const DEFAULT_EXPANSION_PERCENT: u32 = 250;

/// Default number of salts to try before giving up
pub const DEFAULT_MAX_ATTEMPTS: u32 = 64;

/// Construction-time settings for a store
///
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Width of the per-entry tag
    tag_bytes: usize,
    /// Width of the public salt
    salt_bytes: usize,
    /// Table length as a percentage of the entry count (ignored if `table_len` is set)
    expansion_percent: u32,
    /// Exact table length
    table_len: Option<usize>,
    /// Salts to try before giving up
    max_attempts: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tag_bytes: DEFAULT_TAG_BYTES,
            salt_bytes: DEFAULT_SALT_BYTES,
            expansion_percent: DEFAULT_EXPANSION_PERCENT,
            table_len: None,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl Config {
    /// Use a tag of `tag_bytes` bytes; a stray lookup is mistaken for a hit with probability
    /// about 2^(-8 * `tag_bytes`)
    #[must_use]
    pub fn with_tag_bytes(mut self, tag_bytes: usize) -> Self {
        self.tag_bytes = tag_bytes;
        self
    }

    /// Use a salt of `salt_bytes` bytes, leaving `12 - salt_bytes` bytes for the counter
    #[must_use]
    pub fn with_salt_bytes(mut self, salt_bytes: usize) -> Self {
        self.salt_bytes = salt_bytes;
        self
    }

    /// Size the table at `percent`% of the number of entries
    #[must_use]
    pub fn with_expansion_percent(mut self, percent: u32) -> Self {
        self.expansion_percent = percent;
        self
    }

    /// Use exactly `table_len` rows, whatever the number of entries
    #[must_use]
    pub fn with_table_len(mut self, table_len: usize) -> Self {
        self.table_len = Some(table_len);
        self
    }

    /// Try at most `max_attempts` salts
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Tag width
    #[must_use]
    pub fn tag_bytes(&self) -> usize {
        self.tag_bytes
    }

    /// Salt width
    #[must_use]
    pub fn salt_bytes(&self) -> usize {
        self.salt_bytes
    }

    /// Salts to try
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// How many entries a store built with this config can hold
    #[must_use]
    pub fn capacity(&self) -> u128 {
        counter_capacity(NONCE_BYTES.saturating_sub(self.salt_bytes))
    }

    /// Check the settings make sense on their own
    ///
    /// # Errors
    ///
    /// Returns a `ParamsError` describing the first setting that is out of range.
    ///
    pub fn validate(&self) -> Result<(), Error> {
        if self.tag_bytes == 0 || self.tag_bytes > MAX_TAG_BYTES {
            return Err(Error::ParamsError(format!(
                "tag must be between 1 and {MAX_TAG_BYTES} bytes (got {})",
                self.tag_bytes
            )));
        }
        check_salt_bytes(self.salt_bytes)?;
        if self.expansion_percent < 100 {
            return Err(Error::ParamsError(format!(
                "table must be at least as long as the input (expansion {}%)",
                self.expansion_percent
            )));
        }
        if self.max_attempts == 0 {
            return Err(Error::ParamsError(
                "max_attempts must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// The table length to use for `entries` entries
    ///
    /// # Errors
    ///
    /// Returns a `ParamsError` if an explicit table length is shorter than the input, or the
    /// computed one doesn't fit in a `u32`.
    ///
    pub fn table_len_for(&self, entries: usize) -> Result<usize, Error> {
        let table_len = match self.table_len {
            Some(len) if len < entries => {
                return Err(Error::ParamsError(format!(
                    "table of {len} rows cannot hold {entries} entries"
                )))
            }
            Some(len) => len,
            None => {
                let scaled = (entries as u128 * u128::from(self.expansion_percent)).div_ceil(100);
                usize::try_from(scaled).map_err(|_| {
                    Error::ParamsError(format!("table for {entries} entries is too large"))
                })?
            }
        };
        let table_len = table_len.max(2);

        if u32::try_from(table_len).is_err() {
            return Err(Error::ParamsError(format!(
                "table of {table_len} rows is longer than the {} row maximum",
                u32::MAX
            )));
        }

        Ok(table_len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        Config::default().validate().unwrap();
        assert_eq!(1u128 << 32, Config::default().capacity());
    }

    #[test]
    fn table_len_scales_with_entries() {
        let c = Config::default();

        assert_eq!(2, c.table_len_for(0).unwrap());
        assert_eq!(3, c.table_len_for(1).unwrap());
        assert_eq!(250, c.table_len_for(100).unwrap());
        assert_eq!(
            130,
            c.with_expansion_percent(130).table_len_for(100).unwrap()
        );
    }

    #[test]
    fn explicit_table_len_wins() {
        let c = Config::default().with_table_len(1000);

        assert_eq!(1000, c.table_len_for(10).unwrap());
        assert!(matches!(
            c.table_len_for(1001),
            Err(Error::ParamsError(_))
        ));
    }

    #[test]
    fn out_of_range_settings_are_refused() {
        assert!(Config::default().with_tag_bytes(0).validate().is_err());
        assert!(Config::default().with_tag_bytes(17).validate().is_err());
        assert!(Config::default().with_salt_bytes(3).validate().is_err());
        assert!(Config::default().with_salt_bytes(12).validate().is_err());
        assert!(Config::default().with_expansion_percent(99).validate().is_err());
        assert!(Config::default().with_max_attempts(0).validate().is_err());
    }

    #[test]
    fn salt_width_sets_capacity() {
        assert_eq!(256, Config::default().with_salt_bytes(11).capacity());
        assert_eq!(1u128 << 64, Config::default().with_salt_bytes(4).capacity());
    }
}
