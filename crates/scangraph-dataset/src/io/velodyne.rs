use std::path::Path;

use crate::pointcloud::ScanCloud;

/// Bytes per point record: x, y, z, reflectance as little-endian f32.
pub const POINT_STRIDE: usize = 16;

/// Error types for the raw Velodyne scan reader.
#[derive(Debug, thiserror::Error)]
pub enum VelodyneError {
    /// Failed to read the scan file
    #[error("failed to read scan file")]
    Io(#[from] std::io::Error),

    /// The payload length is not a whole number of point records
    #[error("payload of {0} bytes is not a whole number of 16-byte point records")]
    TruncatedRecord(usize),
}

/// Read a raw Velodyne scan from disk.
///
/// The payload is a flat little-endian f32 array with four components per
/// point; the reflectance component is dropped and only x, y, z are kept.
pub fn read_velodyne(path: impl AsRef<Path>) -> Result<ScanCloud, VelodyneError> {
    let bytes = std::fs::read(path.as_ref())?;
    let cloud = decode_velodyne(&bytes)?;
    log::debug!(
        "decoded {} points from {}",
        cloud.len(),
        path.as_ref().display()
    );
    Ok(cloud)
}

/// Decode a raw Velodyne scan payload.
pub fn decode_velodyne(bytes: &[u8]) -> Result<ScanCloud, VelodyneError> {
    if bytes.len() % POINT_STRIDE != 0 {
        return Err(VelodyneError::TruncatedRecord(bytes.len()));
    }

    let points = bytes
        .chunks_exact(POINT_STRIDE)
        .map(|record| {
            let x = f32::from_le_bytes([record[0], record[1], record[2], record[3]]);
            let y = f32::from_le_bytes([record[4], record[5], record[6], record[7]]);
            let z = f32::from_le_bytes([record[8], record[9], record[10], record[11]]);
            [x as f64, y as f64, z as f64]
        })
        .collect();

    Ok(ScanCloud::from_points(points))
}
