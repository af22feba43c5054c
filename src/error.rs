//! Defines the Error type for everything in the store.

use thiserror::Error;

/// Error type for all store operations
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum Error {
    /// The key provided was not useable, or a key derivation operation was not successful
    #[error("invalid key: {0}")]
    KeyError(String),

    /// Table parameters or construction settings are out of range or inconsistent
    #[error("invalid parameters: {0}")]
    ParamsError(String),

    /// There was a problem performing some sort of cryptographic operation
    #[error("a cryptographic primitive failed: {0}")]
    CryptoError(String),

    /// The serialized data provided as a public store was not valid
    #[error("could not parse public store: {0}")]
    ParseError(String),

    /// A row index fell outside the table
    #[error("row index out of range: {0}")]
    IndexError(String),

    /// The input map holds more entries than there are distinct counters
    #[error("input map is too large ({entries} entries, room for {capacity})")]
    MapTooLarge {
        /// Number of entries in the input map
        entries: usize,
        /// Number of distinct counters the nonce layout can encode
        capacity: u128,
    },

    /// The item is not in the store
    ///
    /// Absent inputs, tag mismatches and failed decryptions all produce this error, and nothing
    /// else, so a caller cannot tell them apart.
    #[error("item not found")]
    ItemNotFound,

    /// The same input appeared more than once in the source collection
    #[error("duplicate input in source collection")]
    DuplicateInput,

    /// No salt produced an allocatable table within the retry budget
    #[error("could not allocate table after {0} attempts; try a larger table")]
    ConstructionFailed(u32),

    /// Congratulations, you've found a bug!
    #[error("Internal error: {0} (please report as a bug)")]
    InternalError(String),
}
