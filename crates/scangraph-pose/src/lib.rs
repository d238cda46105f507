#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Pose graph construction and propagation.
pub mod graph;

/// Scan identifiers.
pub mod index;

/// Rigid body transforms.
pub mod rigid;

pub use graph::{propagate, AbsolutePoses, PairwiseRecords, PoseGraph, PoseGraphError};
pub use index::ScanIndex;
pub use rigid::{RigidTransform, TransformError};
