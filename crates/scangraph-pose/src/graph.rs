use std::collections::{BTreeMap, VecDeque};

use crate::{RigidTransform, ScanIndex};

/// The raw pairwise records of a sequence, keyed by ordered scan pair.
///
/// The transform of record `(i, j)` maps points of scan `j` into scan `i`'s
/// frame. The same unordered pair never appears twice.
pub type PairwiseRecords = BTreeMap<(ScanIndex, ScanIndex), RigidTransform>;

/// One absolute pose per scan, mapping each scan's points into the root
/// frame. The root itself carries the identity.
pub type AbsolutePoses = BTreeMap<ScanIndex, RigidTransform>;

/// Error types for pose graph propagation.
#[derive(Debug, thiserror::Error)]
pub enum PoseGraphError {
    /// No pairwise records were provided
    #[error("no pairwise records to build a pose graph from")]
    EmptyRecords,

    /// The records do not cover a single connected set of scans
    #[error("pose graph rooted at scan {root} leaves {unreachable} of {total} scans unreachable")]
    Disconnected {
        /// The chosen root scan.
        root: ScanIndex,
        /// Number of scans the root cannot reach.
        unreachable: usize,
        /// Total number of scans referenced by the records.
        total: usize,
    },
}

/// Directed graph of relative transforms between scans.
///
/// Every record contributes a forward edge labeled with its transform and a
/// reverse edge labeled with the rigid inverse. The adjacency mapping is
/// built once and never mutated; neighbor iteration is in ascending scan
/// order, which fixes the tie-breaking of the traversal.
#[derive(Debug, Clone)]
pub struct PoseGraph {
    adjacency: BTreeMap<ScanIndex, BTreeMap<ScanIndex, RigidTransform>>,
}

impl PoseGraph {
    /// Build the graph from a set of pairwise records.
    pub fn from_records(records: &PairwiseRecords) -> Result<Self, PoseGraphError> {
        if records.is_empty() {
            return Err(PoseGraphError::EmptyRecords);
        }

        let mut adjacency: BTreeMap<ScanIndex, BTreeMap<ScanIndex, RigidTransform>> =
            BTreeMap::new();
        for ((first, second), first_from_second) in records {
            adjacency
                .entry(first.clone())
                .or_default()
                .insert(second.clone(), *first_from_second);
            adjacency
                .entry(second.clone())
                .or_default()
                .insert(first.clone(), first_from_second.inverse());
        }

        Ok(Self { adjacency })
    }

    /// Number of scans referenced by the graph.
    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    /// The scans referenced by the graph, in ascending order.
    pub fn nodes(&self) -> impl Iterator<Item = &ScanIndex> {
        self.adjacency.keys()
    }

    /// The root scan: the minimum index referenced by any record.
    pub fn root(&self) -> Option<&ScanIndex> {
        self.adjacency.keys().next()
    }

    /// Compute one absolute pose per scan by breadth-first traversal from
    /// the root, composing edge transforms along the discovery path.
    ///
    /// The traversal is unweighted, so every scan gets the composition along
    /// a shortest path (by edge count) from the root; ties are broken by
    /// ascending neighbor order. The root's pose is exactly the identity.
    /// Fails with [`PoseGraphError::Disconnected`] if any referenced scan is
    /// unreachable from the root.
    pub fn propagate(&self) -> Result<AbsolutePoses, PoseGraphError> {
        let Some(root) = self.root() else {
            return Err(PoseGraphError::EmptyRecords);
        };

        let mut poses = AbsolutePoses::new();
        poses.insert(root.clone(), RigidTransform::IDENTITY);

        let mut frontier = VecDeque::new();
        frontier.push_back((root.clone(), RigidTransform::IDENTITY));

        while let Some((current, root_from_current)) = frontier.pop_front() {
            let Some(neighbors) = self.adjacency.get(&current) else {
                continue;
            };
            for (neighbor, current_from_neighbor) in neighbors {
                if poses.contains_key(neighbor) {
                    continue;
                }
                let root_from_neighbor = root_from_current.compose(current_from_neighbor);
                poses.insert(neighbor.clone(), root_from_neighbor);
                frontier.push_back((neighbor.clone(), root_from_neighbor));
            }
        }

        if poses.len() != self.adjacency.len() {
            return Err(PoseGraphError::Disconnected {
                root: root.clone(),
                unreachable: self.adjacency.len() - poses.len(),
                total: self.adjacency.len(),
            });
        }

        Ok(poses)
    }
}

/// Derive one absolute pose per scan from a set of pairwise records.
///
/// Convenience for [`PoseGraph::from_records`] followed by
/// [`PoseGraph::propagate`]. Pure function: the result depends only on the
/// record set, not on how it was assembled.
///
/// ```
/// use std::collections::BTreeMap;
/// use scangraph_pose::{propagate, RigidTransform, ScanIndex};
///
/// let mut records = BTreeMap::new();
/// records.insert(
///     (ScanIndex::Ordinal(0), ScanIndex::Ordinal(1)),
///     RigidTransform::IDENTITY,
/// );
/// let poses = propagate(&records)?;
/// assert_eq!(poses.len(), 2);
/// assert_eq!(poses[&ScanIndex::Ordinal(0)], RigidTransform::IDENTITY);
/// # Ok::<(), scangraph_pose::PoseGraphError>(())
/// ```
pub fn propagate(records: &PairwiseRecords) -> Result<AbsolutePoses, PoseGraphError> {
    PoseGraph::from_records(records)?.propagate()
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{DMat3, DVec3};

    fn idx(n: u64) -> ScanIndex {
        ScanIndex::Ordinal(n)
    }

    fn shift(x: f64, y: f64, z: f64) -> RigidTransform {
        RigidTransform::new(DMat3::IDENTITY, DVec3::new(x, y, z))
    }

    fn turn(angle: f64, x: f64, y: f64, z: f64) -> RigidTransform {
        RigidTransform::new(DMat3::from_rotation_z(angle), DVec3::new(x, y, z))
    }

    #[test]
    fn test_empty_records_rejected() {
        assert!(matches!(
            propagate(&PairwiseRecords::new()),
            Err(PoseGraphError::EmptyRecords)
        ));
    }

    #[test]
    fn test_chain_composes_along_path() {
        let t01 = turn(0.3, 1.0, 0.0, 0.0);
        let t12 = turn(-0.1, 0.0, 2.0, 0.0);
        let mut records = PairwiseRecords::new();
        records.insert((idx(0), idx(1)), t01);
        records.insert((idx(1), idx(2)), t12);

        let poses = propagate(&records).unwrap();
        assert_eq!(poses.len(), 3);
        assert_eq!(poses[&idx(0)], RigidTransform::IDENTITY);
        assert_eq!(poses[&idx(1)], t01);
        assert_eq!(poses[&idx(2)], t01.compose(&t12));
    }

    #[test]
    fn test_star_uses_direct_edges() {
        let t01 = shift(1.0, 0.0, 0.0);
        let t02 = turn(0.5, 0.0, 1.0, 0.0);
        let mut records = PairwiseRecords::new();
        records.insert((idx(0), idx(1)), t01);
        records.insert((idx(0), idx(2)), t02);

        let poses = propagate(&records).unwrap();
        assert_eq!(poses[&idx(0)], RigidTransform::IDENTITY);
        assert_eq!(poses[&idx(1)], t01);
        assert_eq!(poses[&idx(2)], t02);
    }

    #[test]
    fn test_reverse_edge_reaches_smaller_index() {
        // the record points away from the root, so the traversal must use
        // the rigid inverse edge
        let t10 = turn(0.2, 0.0, 0.0, 3.0);
        let mut records = PairwiseRecords::new();
        records.insert((idx(1), idx(0)), t10);

        let poses = propagate(&records).unwrap();
        assert_eq!(poses[&idx(0)], RigidTransform::IDENTITY);
        assert_eq!(poses[&idx(1)], t10.inverse());
    }

    #[test]
    fn test_disconnected_islands_rejected() {
        let mut records = PairwiseRecords::new();
        records.insert((idx(0), idx(1)), shift(1.0, 0.0, 0.0));
        records.insert((idx(5), idx(6)), shift(0.0, 1.0, 0.0));

        match propagate(&records) {
            Err(PoseGraphError::Disconnected {
                root,
                unreachable,
                total,
            }) => {
                assert_eq!(root, idx(0));
                assert_eq!(unreachable, 2);
                assert_eq!(total, 4);
            }
            other => panic!("expected Disconnected, got {:?}", other),
        }
    }

    #[test]
    fn test_root_is_minimum_index() {
        let mut records = PairwiseRecords::new();
        records.insert((idx(7), idx(3)), shift(0.5, 0.0, 0.0));
        records.insert((idx(3), idx(9)), shift(0.0, 0.5, 0.0));

        let graph = PoseGraph::from_records(&records).unwrap();
        assert_eq!(graph.root(), Some(&idx(3)));
        assert_eq!(graph.node_count(), 3);
        assert_eq!(
            graph.nodes().collect::<Vec<_>>(),
            vec![&idx(3), &idx(7), &idx(9)]
        );

        let poses = graph.propagate().unwrap();
        assert_eq!(poses[&idx(3)], RigidTransform::IDENTITY);
    }

    #[test]
    fn test_insertion_order_does_not_matter() {
        let t01 = turn(0.7, 1.0, 2.0, 3.0);
        let t12 = turn(-0.4, 0.5, 0.0, 1.0);

        let mut forward = PairwiseRecords::new();
        forward.insert((idx(0), idx(1)), t01);
        forward.insert((idx(1), idx(2)), t12);

        let mut reversed = PairwiseRecords::new();
        reversed.insert((idx(1), idx(2)), t12);
        reversed.insert((idx(0), idx(1)), t01);

        assert_eq!(propagate(&forward).unwrap(), propagate(&reversed).unwrap());
    }

    #[test]
    fn test_propagate_is_deterministic() {
        let mut records = PairwiseRecords::new();
        records.insert((idx(0), idx(1)), turn(0.1, 1.0, 0.0, 0.0));
        records.insert((idx(0), idx(2)), turn(0.2, 0.0, 1.0, 0.0));
        records.insert((idx(1), idx(3)), turn(0.3, 0.0, 0.0, 1.0));
        records.insert((idx(2), idx(3)), turn(0.4, 1.0, 1.0, 0.0));

        let first = propagate(&records).unwrap();
        let second = propagate(&records).unwrap();
        // bitwise identity, not approximate agreement
        for (index, pose) in &first {
            assert_eq!(second[index].to_rows(), pose.to_rows());
        }
    }

    #[test]
    fn test_shortest_path_wins_over_long_path() {
        // 0-1-2 chain plus a direct 0-2 edge: scan 2 must take the one-hop
        // edge, not the two-hop composition
        let t01 = shift(1.0, 0.0, 0.0);
        let t12 = shift(1.0, 0.0, 0.0);
        let t02 = shift(0.0, 5.0, 0.0);
        let mut records = PairwiseRecords::new();
        records.insert((idx(0), idx(1)), t01);
        records.insert((idx(1), idx(2)), t12);
        records.insert((idx(0), idx(2)), t02);

        let poses = propagate(&records).unwrap();
        assert_eq!(poses[&idx(2)], t02);
    }

    #[test]
    fn test_internal_reverse_edges_are_rigid_inverses() {
        let t01 = turn(1.1, 4.0, -2.0, 0.5);
        let mut records = PairwiseRecords::new();
        records.insert((idx(0), idx(1)), t01);

        let graph = PoseGraph::from_records(&records).unwrap();
        let reverse = graph.adjacency[&idx(1)][&idx(0)];
        assert_eq!(reverse.rotation(), t01.rotation().transpose());
        assert_eq!(
            reverse.translation(),
            -(t01.rotation().transpose() * t01.translation())
        );
    }

    #[test]
    fn test_token_indices_propagate() {
        let t = shift(0.0, 0.0, 1.0);
        let mut records = PairwiseRecords::new();
        records.insert((ScanIndex::from("000000"), ScanIndex::from("000010")), t);

        let poses = propagate(&records).unwrap();
        assert_eq!(poses[&ScanIndex::from("000000")], RigidTransform::IDENTITY);
        assert_eq!(poses[&ScanIndex::from("000010")], t);
    }
}
