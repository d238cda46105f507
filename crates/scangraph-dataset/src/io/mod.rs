use std::path::{Path, PathBuf};

use crate::pointcloud::ScanCloud;

/// PLY reader module.
pub mod ply;

/// Raw Velodyne scan reader module.
pub mod velodyne;

pub use ply::{read_ply, PlyError};
pub use velodyne::{read_velodyne, VelodyneError};

/// Error types for scan payload loading.
#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    /// PLY decoding failed
    #[error(transparent)]
    Ply(#[from] PlyError),

    /// Raw Velodyne decoding failed
    #[error(transparent)]
    Velodyne(#[from] VelodyneError),

    /// The filename suffix matches no known payload encoding
    #[error("unrecognized scan file extension: {}", .0.display())]
    UnknownFormat(PathBuf),
}

/// The closed set of scan payload encodings, selected by filename suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadFormat {
    /// Polygon file format, `.ply`.
    Ply,
    /// Raw little-endian f32 x/y/z/reflectance array, `.bin`.
    Velodyne,
}

impl PayloadFormat {
    /// Select the payload encoding from a filename suffix.
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?;
        if extension.eq_ignore_ascii_case("ply") {
            Some(Self::Ply)
        } else if extension.eq_ignore_ascii_case("bin") {
            Some(Self::Velodyne)
        } else {
            None
        }
    }

    /// Decode the scan at `path` with this encoding.
    pub fn read(&self, path: &Path) -> Result<ScanCloud, PayloadError> {
        match self {
            Self::Ply => Ok(read_ply(path)?),
            Self::Velodyne => Ok(read_velodyne(path)?),
        }
    }
}

/// Read a scan payload, selecting the decoder from the filename suffix.
pub fn read_scan(path: impl AsRef<Path>) -> Result<ScanCloud, PayloadError> {
    let path = path.as_ref();
    match PayloadFormat::from_path(path) {
        Some(format) => format.read(path),
        None => Err(PayloadError::UnknownFormat(path.to_path_buf())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_selection() {
        assert_eq!(
            PayloadFormat::from_path(Path::new("cloud_bin_0.ply")),
            Some(PayloadFormat::Ply)
        );
        assert_eq!(
            PayloadFormat::from_path(Path::new("000000.bin")),
            Some(PayloadFormat::Velodyne)
        );
        assert_eq!(
            PayloadFormat::from_path(Path::new("scan.PLY")),
            Some(PayloadFormat::Ply)
        );
        assert_eq!(PayloadFormat::from_path(Path::new("scan.pcd")), None);
        assert_eq!(PayloadFormat::from_path(Path::new("scan")), None);
    }

    #[test]
    fn test_read_scan_rejects_unknown_suffix() {
        assert!(matches!(
            read_scan("scan.xyz"),
            Err(PayloadError::UnknownFormat(_))
        ));
    }
}
