#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Ground-truth log parsing.
pub mod gtlog;

/// Scan payload readers.
pub mod io;

/// Dataset naming templates.
pub mod naming;

/// Scan payloads.
pub mod pointcloud;

/// Sequence views over records and scans.
pub mod view;

pub use naming::{DatasetKind, IndexStyle};
pub use pointcloud::ScanCloud;
pub use view::{DatasetError, DatasetView, Record, ViewMode};
