use std::path::{Path, PathBuf};

use scangraph_pose::{propagate, AbsolutePoses, PairwiseRecords, PoseGraphError, RigidTransform, ScanIndex};

use crate::gtlog::{read_gt_log, GtLogError};
use crate::io::{read_scan, PayloadError};
use crate::naming::DatasetKind;
use crate::pointcloud::ScanCloud;

/// Error types for dataset access.
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    /// Pose graph construction failed; the view is unusable
    #[error(transparent)]
    Graph(#[from] PoseGraphError),

    /// The ground-truth log could not be read
    #[error("ground-truth log {}: {source}", .path.display())]
    GtLog {
        /// Path of the log file.
        path: PathBuf,
        /// The underlying parse failure.
        source: GtLogError,
    },

    /// The scan index is not referenced by any record of this sequence
    #[error("scan {0} is not part of this sequence")]
    ScanNotFound(ScanIndex),

    /// The ordered pair was never recorded
    #[error("no pairwise record for scans {0} and {1}")]
    PairNotFound(ScanIndex, ScanIndex),

    /// Positional access outside the valid range
    #[error("position {position} out of range for {len} records")]
    PositionOutOfRange {
        /// The requested position.
        position: usize,
        /// The number of records in the current mode.
        len: usize,
    },

    /// The scan payload file is missing, unreadable, or malformed
    #[error("scan payload {}: {source}", .path.display())]
    Payload {
        /// Path of the payload file.
        path: PathBuf,
        /// The underlying decode failure.
        source: PayloadError,
    },
}

/// What a view's sequence positions refer to, fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    /// Positions index the sorted pairwise records.
    Pairs,
    /// Positions index the sorted distinct scans.
    Scans,
}

/// One element of a view's sequence.
#[derive(Debug, Clone)]
pub enum Record {
    /// A pairwise record: both payloads plus the originally recorded
    /// relative transform (never a recomposed one).
    Pair {
        /// First scan of the pair.
        first: ScanIndex,
        /// Second scan of the pair.
        second: ScanIndex,
        /// Payload of the first scan.
        first_cloud: ScanCloud,
        /// Payload of the second scan.
        second_cloud: ScanCloud,
        /// The recorded transform mapping the second scan's points into the
        /// first scan's frame.
        first_from_second: RigidTransform,
    },
    /// A single scan with its propagated absolute pose.
    Scan {
        /// The scan index.
        index: ScanIndex,
        /// Payload of the scan.
        cloud: ScanCloud,
        /// Absolute pose mapping the scan's points into the root frame.
        world_from_scan: RigidTransform,
    },
}

/// A read-only view over one dataset sequence.
///
/// Owns the raw pairwise records parsed from the ground-truth log and the
/// absolute poses propagated from them, plus the sorted key lists backing
/// positional access. Everything is derived once at construction; the view
/// is immutable afterwards, so sharing `&DatasetView` across threads needs
/// no locking.
#[derive(Debug)]
pub struct DatasetView {
    sequence_dir: PathBuf,
    kind: DatasetKind,
    mode: ViewMode,
    records: PairwiseRecords,
    poses: AbsolutePoses,
    indices: Vec<ScanIndex>,
    pair_keys: Vec<(ScanIndex, ScanIndex)>,
}

impl DatasetView {
    /// Open the sequence at `<data_folder>/<dataset dir>/<sequence>`.
    ///
    /// Reads and parses `gt.log`, then propagates absolute poses. A log
    /// that does not cover a single connected set of scans aborts
    /// construction with [`DatasetError::Graph`].
    pub fn open(
        data_folder: impl AsRef<Path>,
        kind: DatasetKind,
        sequence: &str,
        mode: ViewMode,
    ) -> Result<Self, DatasetError> {
        let sequence_dir = data_folder.as_ref().join(kind.dir_name()).join(sequence);
        let log_path = sequence_dir.join("gt.log");
        let records = read_gt_log(&log_path, kind.index_style()).map_err(|source| {
            DatasetError::GtLog {
                path: log_path,
                source,
            }
        })?;
        Self::from_records(records, sequence_dir, kind, mode)
    }

    /// Build a view from records already in memory.
    ///
    /// `sequence_dir` is where the scan payload files live; they are only
    /// touched when a lookup needs them.
    pub fn from_records(
        records: PairwiseRecords,
        sequence_dir: PathBuf,
        kind: DatasetKind,
        mode: ViewMode,
    ) -> Result<Self, DatasetError> {
        let poses = propagate(&records)?;
        let indices: Vec<ScanIndex> = poses.keys().cloned().collect();
        let pair_keys: Vec<(ScanIndex, ScanIndex)> = records.keys().cloned().collect();

        log::debug!(
            "{}: {} pairwise records over {} scans",
            sequence_dir.display(),
            pair_keys.len(),
            indices.len()
        );

        Ok(Self {
            sequence_dir,
            kind,
            mode,
            records,
            poses,
            indices,
            pair_keys,
        })
    }

    /// The dataset this sequence belongs to.
    pub fn kind(&self) -> DatasetKind {
        self.kind
    }

    /// The view's mode, fixed at construction.
    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    /// The directory holding the sequence's scan payload files.
    pub fn sequence_dir(&self) -> &Path {
        &self.sequence_dir
    }

    /// Number of records in the current mode: pairwise records in pair
    /// mode, distinct scans in scan mode.
    pub fn len(&self) -> usize {
        match self.mode {
            ViewMode::Pairs => self.pair_keys.len(),
            ViewMode::Scans => self.indices.len(),
        }
    }

    /// Whether the view holds no records in the current mode.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The sorted distinct scan indices of the sequence.
    pub fn indices(&self) -> &[ScanIndex] {
        &self.indices
    }

    /// The sorted pairwise record keys of the sequence.
    pub fn pair_keys(&self) -> &[(ScanIndex, ScanIndex)] {
        &self.pair_keys
    }

    /// The propagated absolute poses, one per scan, root at the identity.
    pub fn poses(&self) -> &AbsolutePoses {
        &self.poses
    }

    /// The absolute pose of one scan, if it is part of the sequence.
    pub fn pose(&self, index: &ScanIndex) -> Option<&RigidTransform> {
        self.poses.get(index)
    }

    /// The payload file path for one scan.
    pub fn scan_path(&self, index: &ScanIndex) -> PathBuf {
        self.sequence_dir.join(self.kind.scan_filename(index))
    }

    /// Positional access against the sorted key list of the current mode.
    pub fn get(&self, position: usize) -> Result<Record, DatasetError> {
        match self.mode {
            ViewMode::Pairs => {
                let (first, second) =
                    self.pair_keys
                        .get(position)
                        .ok_or(DatasetError::PositionOutOfRange {
                            position,
                            len: self.pair_keys.len(),
                        })?;
                let (first_cloud, second_cloud, first_from_second) = self.pair(first, second)?;
                Ok(Record::Pair {
                    first: first.clone(),
                    second: second.clone(),
                    first_cloud,
                    second_cloud,
                    first_from_second,
                })
            }
            ViewMode::Scans => {
                let index = self
                    .indices
                    .get(position)
                    .ok_or(DatasetError::PositionOutOfRange {
                        position,
                        len: self.indices.len(),
                    })?;
                let (cloud, world_from_scan) = self.scan(index)?;
                Ok(Record::Scan {
                    index: index.clone(),
                    cloud,
                    world_from_scan,
                })
            }
        }
    }

    /// Iterate the records of the current mode in ascending sorted-key
    /// order. Each call starts a fresh traversal; payloads are loaded
    /// lazily as the iterator advances.
    pub fn records(&self) -> Records<'_> {
        Records {
            view: self,
            position: 0,
        }
    }

    /// The payload and absolute pose of one scan.
    pub fn scan(&self, index: &ScanIndex) -> Result<(ScanCloud, RigidTransform), DatasetError> {
        let world_from_scan = *self
            .poses
            .get(index)
            .ok_or_else(|| DatasetError::ScanNotFound(index.clone()))?;
        let cloud = self.load_cloud(index)?;
        Ok((cloud, world_from_scan))
    }

    /// Both payloads of a recorded pair and the originally recorded
    /// relative transform — ground truth is returned verbatim, never a
    /// recomposition through the pose graph.
    pub fn pair(
        &self,
        first: &ScanIndex,
        second: &ScanIndex,
    ) -> Result<(ScanCloud, ScanCloud, RigidTransform), DatasetError> {
        let first_from_second = *self
            .records
            .get(&(first.clone(), second.clone()))
            .ok_or_else(|| DatasetError::PairNotFound(first.clone(), second.clone()))?;
        let first_cloud = self.load_cloud(first)?;
        let second_cloud = self.load_cloud(second)?;
        Ok((first_cloud, second_cloud, first_from_second))
    }

    fn load_cloud(&self, index: &ScanIndex) -> Result<ScanCloud, DatasetError> {
        let path = self.scan_path(index);
        read_scan(&path).map_err(|source| DatasetError::Payload { path, source })
    }
}

/// Lazy iterator over a view's records. Created by [`DatasetView::records`].
#[derive(Debug)]
pub struct Records<'a> {
    view: &'a DatasetView,
    position: usize,
}

impl Iterator for Records<'_> {
    type Item = Result<Record, DatasetError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.position >= self.view.len() {
            return None;
        }
        let record = self.view.get(self.position);
        self.position += 1;
        Some(record)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.view.len() - self.position;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Records<'_> {}
