//! The published half of a store.
//!
//! A [`PubStore`] holds the table, the adjacency index that says which input (if any) sits
//! between two rows, and one sealed output per input.  None of it is secret: it can be handed
//! to an untrusted party, which answers lookups with [`PubStore::get_share`] without ever
//! learning which input was asked about.

use std::fmt;
use std::sync::Arc;

use crate::codec::{put_len, Reader, Serializable};
use crate::params::Params;
use crate::seal::SEAL_TAG_BYTES;
use crate::table::Table;
use crate::Error;

/// Version byte at the front of an encoded [`PubStore`]
const WIRE_VERSION: u8 = 1;

/// Something that can answer "what's the share for rows `x` and `y`?"
///
/// [`PubStore`] answers locally.  Implement this over whatever transport you like to answer
/// remotely; a [`PrivStore`](crate::PrivStore) doesn't care where the share came from.
pub trait ShareSource {
    /// The XOR of rows `x` and `y`, followed by the sealed output of the input that connects them
    ///
    /// # Errors
    ///
    /// Returns `ItemNotFound` if no input connects exactly `x` and `y`, and `IndexError` if either
    /// row is outside the table.
    ///
    fn get_share(&self, x: usize, y: usize) -> Result<Vec<u8>, Error>;
}

/// The public part of a store
///
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PubStore {
    /// Table geometry and salt
    params: Params,
    /// Rows and adjacency index
    table: Table,
    /// Sealed outputs, indexed by counter
    sealed: Vec<Vec<u8>>,
}

impl PubStore {
    /// Bundle up a freshly-built table and its sealed outputs
    pub(crate) fn new(params: Params, table: Table, sealed: Vec<Vec<u8>>) -> Self {
        Self {
            params,
            table,
            sealed,
        }
    }

    /// The public parameters, which a [`PrivStore`](crate::PrivStore) needs to query this store
    #[must_use]
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Number of entries in the store
    #[must_use]
    pub fn len(&self) -> usize {
        self.sealed.len()
    }

    /// Whether the store has no entries at all
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sealed.is_empty()
    }

    /// Compute the share for the pair of rows `(x, y)`
    ///
    /// This is the XOR of the two rows followed by the sealed output of whichever input connects
    /// exactly those rows.
    ///
    /// # Errors
    ///
    /// Returns `IndexError` if `x` or `y` is outside the table, and `ItemNotFound` if no input
    /// connects them.
    ///
    pub fn get_share(&self, x: usize, y: usize) -> Result<Vec<u8>, Error> {
        log::trace!("get_share({x}, {y})");

        let mut share = self.table.xor_rows(x, y).ok_or_else(|| {
            Error::IndexError(format!(
                "({x}, {y}) is not within a table of {} rows",
                self.table.len()
            ))
        })?;
        if x == y {
            return Err(Error::ItemNotFound);
        }

        let edge = self.table.edge_between(x, y).ok_or(Error::ItemNotFound)?;
        let sealed = self.sealed.get(edge as usize).ok_or_else(|| {
            Error::InternalError(format!(
                "edge {edge} has no sealed output ({} outputs)",
                self.sealed.len()
            ))
        })?;
        share.extend_from_slice(sealed);

        Ok(share)
    }

    #[cfg(test)]
    pub(crate) fn table(&self) -> &Table {
        &self.table
    }

    #[cfg(test)]
    pub(crate) fn sealed_mut(&mut self) -> &mut Vec<Vec<u8>> {
        &mut self.sealed
    }
}

/// Hex dump of every row, then every sealed output, one per line
impl fmt::Display for PubStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} rows of {} bytes:",
            self.table.len(),
            self.params.row_bytes()
        )?;
        for i in 0..self.table.len() {
            if let Some(row) = self.table.row(i) {
                writeln!(f, "{i}: {}", hex::encode(row))?;
            }
        }
        writeln!(f, "{} sealed outputs:", self.sealed.len())?;
        for (i, s) in self.sealed.iter().enumerate() {
            writeln!(f, "{i}: {}", hex::encode(s))?;
        }

        Ok(())
    }
}

impl ShareSource for PubStore {
    fn get_share(&self, x: usize, y: usize) -> Result<Vec<u8>, Error> {
        PubStore::get_share(self, x, y)
    }
}

impl<S: ShareSource + ?Sized> ShareSource for &S {
    fn get_share(&self, x: usize, y: usize) -> Result<Vec<u8>, Error> {
        (**self).get_share(x, y)
    }
}

impl<S: ShareSource + ?Sized> ShareSource for Arc<S> {
    fn get_share(&self, x: usize, y: usize) -> Result<Vec<u8>, Error> {
        (**self).get_share(x, y)
    }
}

impl Serializable for PubStore {
    fn from_slice(bytes: &[u8]) -> Result<Self, Error> {
        let mut r = Reader::new(bytes);

        let version = r.u8("version")?;
        if version != WIRE_VERSION {
            return Err(Error::ParseError(format!(
                "unrecognised version byte {version}"
            )));
        }

        let params = Params::read_from(&mut r)?;
        let table_len = params.table_len();
        let row_bytes = params.row_bytes();

        // Read the rows before allocating anything sized by table_len, so a bogus length can't
        // make us allocate more than the input could possibly describe
        let rows_len = table_len.checked_mul(row_bytes).ok_or_else(|| {
            Error::ParseError(format!("{table_len} rows of {row_bytes} bytes is too large"))
        })?;
        let rows = r.take(rows_len, "table rows")?.to_vec();

        let mut adjacency: Vec<Vec<u32>> = vec![Vec::new(); table_len];
        let node_count = r.len("adjacency node count")?;
        let mut prev: Option<usize> = None;
        for _ in 0..node_count {
            let node = r.len("adjacency node")?;
            if node >= table_len || prev.is_some_and(|p| node <= p) {
                return Err(Error::ParseError(format!(
                    "adjacency node {node} is out of order or out of range"
                )));
            }
            prev = Some(node);

            let edge_count = r.len("adjacency edge count")?;
            let mut edges = Vec::new();
            for _ in 0..edge_count {
                edges.push(r.u32("adjacency edge")?);
            }
            if let Some(slot) = adjacency.get_mut(node) {
                *slot = edges;
            }
        }

        let sealed_count = r.len("sealed output count")?;
        if sealed_count > table_len || sealed_count as u128 > params.capacity() {
            return Err(Error::ParseError(format!(
                "{sealed_count} sealed outputs cannot fit a table of {table_len} rows"
            )));
        }
        let max_sealed = params.max_output_bytes().saturating_add(SEAL_TAG_BYTES);
        let mut sealed = Vec::new();
        for i in 0..sealed_count {
            let len = r.len("sealed output length")?;
            if len > max_sealed {
                return Err(Error::ParseError(format!(
                    "sealed output {i} is {len} bytes, longer than the {max_sealed} byte maximum"
                )));
            }
            sealed.push(r.take(len, "sealed output")?.to_vec());
        }
        r.finish()?;

        if let Some(e) = adjacency
            .iter()
            .flatten()
            .find(|&&e| e as usize >= sealed_count)
        {
            return Err(Error::ParseError(format!(
                "adjacency refers to edge {e}, but there are only {sealed_count} sealed outputs"
            )));
        }

        Ok(Self {
            params,
            table: Table::from_parts(row_bytes, rows, adjacency),
            sealed,
        })
    }

    fn to_vec(&self) -> Vec<u8> {
        let mut v = Vec::with_capacity(
            32 + self.table.rows().len()
                + self.sealed.iter().map(|s| s.len() + 4).sum::<usize>(),
        );

        v.push(WIRE_VERSION);
        self.params.write_to(&mut v);
        v.extend_from_slice(self.table.rows());

        let nodes: Vec<(usize, &Vec<u32>)> = self
            .table
            .adjacency()
            .iter()
            .enumerate()
            .filter(|(_, edges)| !edges.is_empty())
            .collect();
        put_len(&mut v, nodes.len());
        for (node, edges) in nodes {
            put_len(&mut v, node);
            put_len(&mut v, edges.len());
            for e in edges {
                v.extend_from_slice(&e.to_be_bytes());
            }
        }

        put_len(&mut v, self.sealed.len());
        for s in &self.sealed {
            put_len(&mut v, s.len());
            v.extend_from_slice(s);
        }

        v
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{alice_and_bob, key};
    use crate::{build, Config};

    #[test]
    fn serialization_round_trips() {
        let (pub_store, priv_store) = alice_and_bob();

        let v = pub_store.to_vec();
        let rt = PubStore::from_slice(&v).unwrap();

        assert_eq!(pub_store, rt);
        assert_eq!(v, rt.to_vec());
        assert_eq!(b"wonderland".to_vec(), priv_store.get(&rt, b"alice").unwrap());
        assert_eq!(b"builder".to_vec(), priv_store.get(&rt, b"bob").unwrap());
    }

    #[test]
    fn unwritten_rows_survive_serialization() {
        let (pub_store, _) = alice_and_bob();
        let rt = PubStore::from_slice(&pub_store.to_vec()).unwrap();

        let zero_rows = (0..pub_store.params().table_len())
            .filter(|&i| rt.table().row(i).unwrap().iter().all(|&b| b == 0))
            .count();

        // two inputs touch at most four rows, and each component's root stays zero
        assert!(zero_rows >= pub_store.params().table_len() - 4);
        assert_eq!(pub_store.table(), rt.table());
    }

    #[test]
    fn empty_store_round_trips() {
        let no_entries: Vec<(&[u8], &[u8])> = Vec::new();
        let (pub_store, _) = build(&key(), no_entries, &Config::default()).unwrap();

        assert!(pub_store.is_empty());
        assert_eq!(pub_store, PubStore::from_slice(&pub_store.to_vec()).unwrap());
    }

    #[test]
    fn truncated_store_does_not_parse() {
        let v = alice_and_bob().0.to_vec();

        for len in [0, 1, 10, v.len() / 2, v.len() - 1] {
            assert!(
                matches!(PubStore::from_slice(&v[..len]), Err(Error::ParseError(_))),
                "{len} bytes parsed"
            );
        }
    }

    #[test]
    fn trailing_junk_does_not_parse() {
        let mut v = alice_and_bob().0.to_vec();
        v.push(0);

        assert!(matches!(
            PubStore::from_slice(&v),
            Err(Error::ParseError(_))
        ));
    }

    #[test]
    fn unknown_version_does_not_parse() {
        let mut v = alice_and_bob().0.to_vec();
        v[0] = 2;

        assert!(matches!(
            PubStore::from_slice(&v),
            Err(Error::ParseError(_))
        ));
    }

    #[test]
    fn dangling_edge_does_not_parse() {
        let (pub_store, _) = alice_and_bob();
        let mut bad = pub_store.clone();
        bad.sealed_mut().pop();

        assert!(matches!(
            PubStore::from_slice(&bad.to_vec()),
            Err(Error::ParseError(_))
        ));
    }

    #[test]
    fn share_outside_table_is_an_index_error() {
        let (pub_store, _) = alice_and_bob();
        let len = pub_store.params().table_len();

        assert!(matches!(
            pub_store.get_share(0, len),
            Err(Error::IndexError(_))
        ));
        assert!(matches!(
            pub_store.get_share(len, 0),
            Err(Error::IndexError(_))
        ));
    }

    #[test]
    fn share_for_same_row_twice_is_not_found() {
        let (pub_store, priv_store) = alice_and_bob();
        let (x, _) = priv_store.get_idx(b"alice");

        assert!(matches!(
            pub_store.get_share(x, x),
            Err(Error::ItemNotFound)
        ));
    }

    #[test]
    fn share_is_row_xor_then_sealed_output() {
        let (pub_store, priv_store) = alice_and_bob();
        let (x, y) = priv_store.get_idx(b"alice");
        let row_bytes = pub_store.params().row_bytes();

        let share = pub_store.get_share(x, y).unwrap();

        assert_eq!(
            pub_store.table().xor_rows(x, y).unwrap(),
            share[..row_bytes].to_vec()
        );
        assert_eq!(b"wonderland".len() + SEAL_TAG_BYTES, share.len() - row_bytes);
    }

    #[test]
    fn display_dumps_rows_and_sealed_outputs() {
        let (mut pub_store, _) = alice_and_bob();
        let table_len = pub_store.params().table_len();
        let second_sealed = pub_store.sealed_mut()[1].clone();
        let dump = pub_store.to_string();
        let lines: Vec<&str> = dump.lines().collect();

        assert_eq!(table_len + pub_store.len() + 2, lines.len());
        assert_eq!(
            format!("{table_len} rows of {} bytes:", pub_store.params().row_bytes()),
            lines[0]
        );
        assert_eq!(
            format!("0: {}", hex::encode(pub_store.table().row(0).unwrap())),
            lines[1]
        );
        assert_eq!("2 sealed outputs:", lines[table_len + 1]);
        assert_eq!(
            format!("1: {}", hex::encode(second_sealed)),
            lines[table_len + 3]
        );
    }

    #[test]
    fn shares_can_come_through_an_arc() {
        let (pub_store, priv_store) = alice_and_bob();
        let shared: Arc<dyn ShareSource + Send + Sync> = Arc::new(pub_store);

        assert_eq!(
            b"builder".to_vec(),
            priv_store.get(&shared, b"bob").unwrap()
        );
    }
}
