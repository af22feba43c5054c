//! Building a store from a collection of entries.
//!
//! Construction sorts the entries, gives each a counter in that order, then tries salts until one
//! places every input on a pair of rows that can all be assigned consistently.  Only then are the
//! outputs sealed.

use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;

use crate::prf::{Index, Indexer};
use crate::seal::Sealer;
use crate::table::{self, Edge};
use crate::{Config, Error, KeyMaterial, Params, PrivStore, PubStore};

/// Build a store from `entries`, drawing salts from a freshly seeded CSPRNG
///
/// # Errors
///
/// See [`build_with_rng`]; this can also fail with a `CryptoError` if the operating system can't
/// seed the CSPRNG.
///
pub fn build<E, I, O>(
    key: &KeyMaterial,
    entries: E,
    config: &Config,
) -> Result<(PubStore, PrivStore), Error>
where
    E: IntoIterator<Item = (I, O)>,
    I: AsRef<[u8]>,
    O: AsRef<[u8]>,
{
    let mut rng = ChaCha20Rng::from_rng(OsRng)
        .map_err(|e| Error::CryptoError(format!("failed to seed CSPRNG ({e})")))?;

    build_with_rng(key, entries, config, &mut rng)
}

/// Build a store from `entries`, drawing salts from `rng`
///
/// The same key, entries, config and RNG state always give the same store.
///
/// # Errors
///
/// * `ParamsError` if `config` is out of range or an output is too long to encode;
/// * `DuplicateInput` if an input appears more than once;
/// * `MapTooLarge` if there are more entries than the counter can number;
/// * `ConstructionFailed` if no salt worked within `config.max_attempts()` tries;
/// * `CryptoError` if `rng` fails or an output can't be sealed.
///
pub fn build_with_rng<E, I, O, R>(
    key: &KeyMaterial,
    entries: E,
    config: &Config,
    rng: &mut R,
) -> Result<(PubStore, PrivStore), Error>
where
    E: IntoIterator<Item = (I, O)>,
    I: AsRef<[u8]>,
    O: AsRef<[u8]>,
    R: RngCore + CryptoRng,
{
    config.validate()?;

    let mut entries: Vec<(Vec<u8>, Vec<u8>)> = entries
        .into_iter()
        .map(|(i, o)| (i.as_ref().to_vec(), o.as_ref().to_vec()))
        .collect();
    entries.sort_unstable_by(|a, b| a.0.cmp(&b.0));
    if entries.windows(2).any(|w| w[0].0 == w[1].0) {
        return Err(Error::DuplicateInput);
    }

    let capacity = config.capacity();
    if entries.len() as u128 > capacity {
        return Err(Error::MapTooLarge {
            entries: entries.len(),
            capacity,
        });
    }

    let table_len = config.table_len_for(entries.len())?;
    let max_output_bytes = entries.iter().map(|(_, o)| o.len()).max().unwrap_or(0);

    let indexer = Indexer::new(key)?;
    let sealer = Sealer::new(key)?;

    for attempt in 1..=config.max_attempts() {
        let mut salt = vec![0u8; config.salt_bytes()];
        rng.try_fill_bytes(&mut salt)
            .map_err(|e| Error::CryptoError(format!("failed to generate salt ({e})")))?;
        let params = Params::new(table_len, config.tag_bytes(), salt, max_output_bytes)?;

        let edges = entries
            .iter()
            .zip(0u64..)
            .map(|((input, _), counter)| {
                let Index { x, y, tag } = indexer.index(&params, input);
                Ok(Edge {
                    x,
                    y,
                    value: params.row_value(&tag, counter)?,
                })
            })
            .collect::<Result<Vec<_>, Error>>()?;

        match table::allocate(table_len, params.row_bytes(), &edges) {
            Ok(table) => {
                let sealed = entries
                    .iter()
                    .zip(0u64..)
                    .map(|((input, output), counter)| sealer.seal(&params, counter, input, output))
                    .collect::<Result<Vec<_>, Error>>()?;

                log::info!(
                    "built store of {} entries in {table_len} rows after {attempt} attempt(s)",
                    entries.len()
                );

                let priv_store = PrivStore::from_parts(indexer, sealer, params.clone());
                return Ok((PubStore::new(params, table, sealed), priv_store));
            }
            Err(failure) => log::debug!(
                "allocation attempt {attempt} of {} failed: {failure:?}",
                config.max_attempts()
            ),
        }
    }

    Err(Error::ConstructionFailed(config.max_attempts()))
}

/// Look up `input` in a locally-held pair of stores
///
/// # Errors
///
/// Returns `ItemNotFound` if `input` isn't in the store.
///
pub fn get(pub_store: &PubStore, priv_store: &PrivStore, input: &[u8]) -> Result<Vec<u8>, Error> {
    priv_store.get(pub_store, input)
}
