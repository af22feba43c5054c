//! The cuckoo graph, and turning it into a table.
//!
//! Each row of the table is a node; each input is an edge between its two rows, carrying the
//! value those two rows have to XOR to.  Allocation walks every connected component from an
//! all-zero root, setting each newly-reached row to "parent row XOR edge value", which satisfies
//! every edge of a spanning tree by construction.  Any edge left over closes a cycle, and is only
//! acceptable if it happens to be satisfied already.
//!
//! Nodes and edges are plain indices into arenas; the walk uses an explicit stack, so there's no
//! recursion to blow up on a large component.

use std::collections::HashMap;

/// Why a table couldn't be allocated under the current salt
///
/// None of these are the caller's fault; construction picks another salt and tries again.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum AllocationFailure {
    /// Two inputs landed on the same pair of rows
    DuplicatePair {
        /// The edge that got there first
        first: usize,
        /// The edge that landed on top of it
        second: usize,
    },
    /// An edge closed a cycle whose XOR constraint doesn't hold
    InconsistentCycle {
        /// The edge that closed the cycle
        edge: usize,
    },
    /// A component has more edges than nodes
    Overloaded {
        /// Rows in the component
        nodes: usize,
        /// Inputs in the component
        edges: usize,
    },
}

/// One input's footprint in the graph
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Edge {
    /// First row
    pub(crate) x: usize,
    /// Second row
    pub(crate) y: usize,
    /// What `row[x] XOR row[y]` has to come out as
    pub(crate) value: Vec<u8>,
}

impl Edge {
    /// The end of this edge that isn't `node`
    fn other_end(&self, node: usize) -> usize {
        if self.x == node {
            self.y
        } else {
            self.x
        }
    }
}

/// Edges of the graph, plus the list of edges touching each node
#[derive(Debug)]
struct CuckooGraph<'a> {
    /// Edge arena; an edge's id is its position in here
    edges: &'a [Edge],
    /// For each node, the ids of the edges incident to it, in ascending order
    adjacency: Vec<Vec<u32>>,
}

impl<'a> CuckooGraph<'a> {
    /// Connect up the edges, refusing any pair of rows that is used twice
    fn new(table_len: usize, edges: &'a [Edge]) -> Result<Self, AllocationFailure> {
        let mut adjacency: Vec<Vec<u32>> = vec![Vec::new(); table_len];
        let mut pairs: HashMap<(usize, usize), usize> = HashMap::with_capacity(edges.len());

        for (id, edge) in edges.iter().enumerate() {
            let pair = (edge.x.min(edge.y), edge.x.max(edge.y));
            if let Some(&first) = pairs.get(&pair) {
                return Err(AllocationFailure::DuplicatePair { first, second: id });
            }
            pairs.insert(pair, id);

            // edge ids are counters, which the caller has already bounded well below u32::MAX
            #[allow(clippy::cast_possible_truncation)]
            let id = id as u32;
            adjacency[edge.x].push(id);
            adjacency[edge.y].push(id);
        }

        Ok(Self { edges, adjacency })
    }
}

/// A fully-populated table and its adjacency index
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Table {
    /// Width of each row
    row_bytes: usize,
    /// All the rows, end to end
    rows: Vec<u8>,
    /// For each row, the ids of the edges incident to it
    adjacency: Vec<Vec<u32>>,
}

impl Table {
    /// Reassemble a table from its parts
    ///
    /// The caller is responsible for checking that the parts agree with each other.
    pub(crate) fn from_parts(row_bytes: usize, rows: Vec<u8>, adjacency: Vec<Vec<u32>>) -> Self {
        Self {
            row_bytes,
            rows,
            adjacency,
        }
    }

    /// Number of rows
    pub(crate) fn len(&self) -> usize {
        self.adjacency.len()
    }

    /// The raw row data
    pub(crate) fn rows(&self) -> &[u8] {
        &self.rows
    }

    /// The adjacency index
    pub(crate) fn adjacency(&self) -> &[Vec<u32>] {
        &self.adjacency
    }

    /// A single row, if there is such a row
    pub(crate) fn row(&self, i: usize) -> Option<&[u8]> {
        let start = i.checked_mul(self.row_bytes)?;
        self.rows.get(start..start.checked_add(self.row_bytes)?)
    }

    /// `row[x] XOR row[y]`
    pub(crate) fn xor_rows(&self, x: usize, y: usize) -> Option<Vec<u8>> {
        Some(xor(self.row(x)?, self.row(y)?))
    }

    /// The edge that connects exactly `x` and `y`, if any input did
    pub(crate) fn edge_between(&self, x: usize, y: usize) -> Option<u32> {
        let (xs, ys) = (self.adjacency.get(x)?, self.adjacency.get(y)?);

        xs.iter().copied().find(|e| ys.contains(e))
    }
}

/// Assign rows so that every edge's XOR constraint holds
///
/// # Errors
///
/// Returns an [`AllocationFailure`] if no assignment exists for this graph.
///
pub(crate) fn allocate(
    table_len: usize,
    row_bytes: usize,
    edges: &[Edge],
) -> Result<Table, AllocationFailure> {
    let graph = CuckooGraph::new(table_len, edges)?;
    let mut rows = vec![0u8; table_len * row_bytes];
    let mut visited = vec![false; table_len];
    let mut used = vec![false; edges.len()];
    let mut stack: Vec<usize> = Vec::new();

    for root in 0..table_len {
        if visited[root] || graph.adjacency[root].is_empty() {
            continue;
        }
        visited[root] = true;
        stack.push(root);
        let mut nodes: usize = 1;
        let mut edge_count: usize = 0;

        while let Some(u) = stack.pop() {
            for &e in &graph.adjacency[u] {
                let e = e as usize;
                if used[e] {
                    continue;
                }
                used[e] = true;
                edge_count += 1;

                let edge = &graph.edges[e];
                let v = edge.other_end(u);
                let row_u = &rows[u * row_bytes..(u + 1) * row_bytes];

                if visited[v] {
                    let row_v = &rows[v * row_bytes..(v + 1) * row_bytes];
                    if xor(row_u, row_v) != edge.value {
                        return Err(AllocationFailure::InconsistentCycle { edge: e });
                    }
                } else {
                    let new_row = xor(row_u, &edge.value);
                    rows[v * row_bytes..(v + 1) * row_bytes].copy_from_slice(&new_row);
                    visited[v] = true;
                    nodes += 1;
                    stack.push(v);
                }
            }
        }

        if edge_count > nodes {
            return Err(AllocationFailure::Overloaded {
                nodes,
                edges: edge_count,
            });
        }
    }

    Ok(Table {
        row_bytes,
        rows,
        adjacency: graph.adjacency,
    })
}

/// Bytewise XOR of two equal-length slices
fn xor(a: &[u8], b: &[u8]) -> Vec<u8> {
    a.iter().zip(b).map(|(a, b)| a ^ b).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha20Rng;

    fn edge(x: usize, y: usize, value: &[u8]) -> Edge {
        Edge {
            x,
            y,
            value: value.to_vec(),
        }
    }

    fn assert_invariant(table: &Table, edges: &[Edge]) {
        for (id, e) in edges.iter().enumerate() {
            assert_eq!(Some(e.value.clone()), table.xor_rows(e.x, e.y), "edge {id}");
            assert_eq!(Some(id as u32), table.edge_between(e.x, e.y));
        }
    }

    #[test]
    fn tree_satisfies_every_edge() {
        let edges = [
            edge(0, 1, &[1, 1]),
            edge(1, 2, &[2, 2]),
            edge(3, 1, &[3, 3]),
            edge(4, 5, &[4, 4]),
        ];

        let table = allocate(8, 2, &edges).unwrap();

        assert_invariant(&table, &edges);
    }

    #[test]
    fn untouched_rows_and_roots_are_zero() {
        let edges = [edge(2, 5, &[0xff])];

        let table = allocate(7, 1, &edges).unwrap();

        assert_eq!(&[0u8, 0, 0, 0, 0, 0xff, 0][..], table.rows());
    }

    #[test]
    fn same_pair_twice_is_refused() {
        let edges = [edge(0, 1, &[1]), edge(2, 3, &[2]), edge(1, 0, &[3])];

        assert_eq!(
            Err(AllocationFailure::DuplicatePair {
                first: 0,
                second: 2
            }),
            allocate(4, 1, &edges)
        );
    }

    #[test]
    fn inconsistent_cycle_is_refused() {
        let edges = [edge(0, 1, &[1]), edge(1, 2, &[2]), edge(2, 0, &[4])];

        assert!(matches!(
            allocate(3, 1, &edges),
            Err(AllocationFailure::InconsistentCycle { .. })
        ));
    }

    #[test]
    fn consistent_cycle_is_accepted() {
        let edges = [edge(0, 1, &[1]), edge(1, 2, &[2]), edge(2, 0, &[3])];

        let table = allocate(3, 1, &edges).unwrap();

        assert_invariant(&table, &edges);
    }

    #[test]
    fn two_cycles_in_one_component_are_refused() {
        // Values are all consistent with rows [0, 1, 3, 7], so only the cycle count can object
        let r = [0u8, 1, 3, 7];
        let edges: Vec<Edge> = [(0, 1), (1, 2), (2, 0), (2, 3), (3, 0)]
            .iter()
            .map(|&(a, b)| edge(a, b, &[r[a] ^ r[b]]))
            .collect();

        assert_eq!(
            Err(AllocationFailure::Overloaded { nodes: 4, edges: 5 }),
            allocate(4, 1, &edges)
        );
    }

    #[test]
    fn random_sparse_graphs_allocate_correctly() {
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let mut successes = 0;

        for _ in 0..20 {
            let table_len = 250;
            let edges: Vec<Edge> = (0..100)
                .map(|_| {
                    let x = rng.gen_range(0..table_len);
                    let y = (x + rng.gen_range(1..table_len)) % table_len;
                    edge(x, y, &rng.gen::<[u8; 6]>())
                })
                .collect();

            if let Ok(table) = allocate(table_len, 6, &edges) {
                assert_invariant(&table, &edges);
                successes += 1;
            }
        }

        assert!(successes > 0);
    }

    #[test]
    fn out_of_range_rows_are_none() {
        let table = allocate(3, 2, &[edge(0, 1, &[1, 2])]).unwrap();

        assert_eq!(None, table.row(3));
        assert_eq!(None, table.xor_rows(0, 3));
        assert_eq!(None, table.edge_between(3, 0));
        assert_eq!(None, table.edge_between(1, 2));
    }
}
