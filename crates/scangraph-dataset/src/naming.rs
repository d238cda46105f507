use std::fmt;
use std::str::FromStr;

use scangraph_pose::ScanIndex;

/// The dataset name is not one of the supported set
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown dataset name: {0}")]
pub struct UnknownDatasetError(pub String);

/// The token cannot be parsed as a scan index
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
#[error("invalid scan index token: {0}")]
pub struct InvalidIndexError(pub String);

/// How a dataset writes scan indices in its ground-truth log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexStyle {
    /// Indices are plain numbers.
    Numeric,
    /// Indices are literal tokens kept verbatim (zero padding matters for
    /// the filename template).
    Literal,
}

impl IndexStyle {
    /// Parse one index token from a ground-truth log header.
    pub fn parse(&self, token: &str) -> Result<ScanIndex, InvalidIndexError> {
        match self {
            Self::Numeric => token
                .parse::<u64>()
                .map(ScanIndex::Ordinal)
                .map_err(|_| InvalidIndexError(token.to_string())),
            Self::Literal => Ok(ScanIndex::Token(token.to_string())),
        }
    }
}

/// The closed set of supported datasets.
///
/// Each dataset keeps its sequences under a directory named after it and
/// names scan files by substituting the scan index into a fixed template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetKind {
    /// RESSO laser scans, `part{}.ply`.
    Resso,
    /// ETH laser scans, `Hokuyo_{}.ply`.
    Eth,
    /// Sun3D RGB-D fragments, `cloud_bin_{}.ply`.
    Sun3d,
    /// 7-Scenes RGB-D fragments, `cloud_bin_{}.ply`.
    SevenScenes,
    /// KITTI odometry scans, `{}.bin`.
    Kitti,
}

impl DatasetKind {
    /// Every supported dataset.
    pub const ALL: [DatasetKind; 5] = [
        DatasetKind::Resso,
        DatasetKind::Eth,
        DatasetKind::Sun3d,
        DatasetKind::SevenScenes,
        DatasetKind::Kitti,
    ];

    /// The dataset's directory name on disk.
    pub fn dir_name(&self) -> &'static str {
        match self {
            Self::Resso => "RESSO",
            Self::Eth => "ETH",
            Self::Sun3d => "Sun3D",
            Self::SevenScenes => "7-Scenes",
            Self::Kitti => "KITTI",
        }
    }

    /// The scan filename for one index.
    pub fn scan_filename(&self, index: &ScanIndex) -> String {
        match self {
            Self::Resso => format!("part{}.ply", index),
            Self::Eth => format!("Hokuyo_{}.ply", index),
            Self::Sun3d | Self::SevenScenes => format!("cloud_bin_{}.ply", index),
            Self::Kitti => format!("{}.bin", index),
        }
    }

    /// How this dataset writes scan indices in its ground-truth log.
    ///
    /// KITTI frame tokens are zero padded and must survive verbatim into
    /// the filename template; every other dataset numbers its scans.
    pub fn index_style(&self) -> IndexStyle {
        match self {
            Self::Kitti => IndexStyle::Literal,
            _ => IndexStyle::Numeric,
        }
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

impl FromStr for DatasetKind {
    type Err = UnknownDatasetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|kind| kind.dir_name() == s)
            .copied()
            .ok_or_else(|| UnknownDatasetError(s.to_string()))
    }
}
