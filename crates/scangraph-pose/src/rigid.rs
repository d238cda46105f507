use glam::{DMat3, DMat4, DVec3, DVec4};

/// Tolerance for the homogeneous bottom row check in [`RigidTransform::from_rows`].
const HOMOGENEOUS_TOL: f64 = 1e-9;

/// Tolerance for the rotation orthonormality check in [`RigidTransform::from_rows`].
///
/// Ground-truth logs store matrices with limited decimal precision, so the
/// check has to leave room for that.
const ROTATION_TOL: f64 = 1e-4;

/// Error types for rigid transform construction.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum TransformError {
    /// The bottom row of the homogeneous matrix is not [0, 0, 0, 1]
    #[error("bottom row of the homogeneous matrix is not [0, 0, 0, 1]")]
    NotHomogeneous,

    /// The upper-left 3x3 block is not a proper rotation
    #[error("upper-left 3x3 block is not a proper rotation")]
    NotRotation,
}

/// A rigid body transform: a proper rotation followed by a translation.
///
/// Equivalent to a 4x4 homogeneous matrix whose upper-left 3x3 block is
/// orthonormal and whose bottom row is [0, 0, 0, 1]. The pairwise transform
/// of a scan record maps points of the second scan into the first scan's
/// frame; an absolute pose maps a scan's points into the root frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RigidTransform {
    rotation: DMat3,
    translation: DVec3,
}

impl RigidTransform {
    /// The identity transform.
    pub const IDENTITY: Self = Self {
        rotation: DMat3::IDENTITY,
        translation: DVec3::ZERO,
    };

    /// Create a transform from a rotation matrix and a translation vector.
    ///
    /// PRECONDITION: `rotation` is orthonormal with determinant +1.
    pub fn new(rotation: DMat3, translation: DVec3) -> Self {
        Self {
            rotation,
            translation,
        }
    }

    /// Build a transform from the rows of a 4x4 homogeneous matrix.
    ///
    /// Validates the homogeneous bottom row and that the upper-left block is
    /// a proper rotation. The stored values are taken verbatim from the
    /// input, so [`RigidTransform::to_rows`] reproduces them bitwise.
    pub fn from_rows(rows: &[[f64; 4]; 4]) -> Result<Self, TransformError> {
        let bottom = rows[3];
        if (bottom[0]).abs() > HOMOGENEOUS_TOL
            || (bottom[1]).abs() > HOMOGENEOUS_TOL
            || (bottom[2]).abs() > HOMOGENEOUS_TOL
            || (bottom[3] - 1.0).abs() > HOMOGENEOUS_TOL
        {
            return Err(TransformError::NotHomogeneous);
        }

        let rotation = DMat3::from_cols(
            DVec3::new(rows[0][0], rows[1][0], rows[2][0]),
            DVec3::new(rows[0][1], rows[1][1], rows[2][1]),
            DVec3::new(rows[0][2], rows[1][2], rows[2][2]),
        );
        let gram = rotation * rotation.transpose();
        if !gram.abs_diff_eq(DMat3::IDENTITY, ROTATION_TOL) || rotation.determinant() < 0.0 {
            return Err(TransformError::NotRotation);
        }

        let translation = DVec3::new(rows[0][3], rows[1][3], rows[2][3]);
        Ok(Self {
            rotation,
            translation,
        })
    }

    /// The rotation part.
    pub fn rotation(&self) -> DMat3 {
        self.rotation
    }

    /// The translation part.
    pub fn translation(&self) -> DVec3 {
        self.translation
    }

    /// Compose with another transform: `self.compose(other)` applies `other`
    /// first, then `self`, matching the matrix product `self * other`.
    pub fn compose(&self, other: &Self) -> Self {
        Self {
            rotation: self.rotation * other.rotation,
            translation: self.rotation * other.translation + self.translation,
        }
    }

    /// The rigid inverse: transposed rotation, rotated and negated
    /// translation. Not a general matrix inverse.
    pub fn inverse(&self) -> Self {
        let inv_rotation = self.rotation.transpose();
        Self {
            rotation: inv_rotation,
            translation: -(inv_rotation * self.translation),
        }
    }

    /// Apply the transform to a point.
    pub fn transform_point(&self, point: DVec3) -> DVec3 {
        self.rotation * point + self.translation
    }

    /// The transform as a 4x4 homogeneous matrix.
    pub fn as_matrix(&self) -> DMat4 {
        let r = self.rotation;
        let t = self.translation;
        DMat4::from_cols(
            DVec4::new(r.x_axis.x, r.x_axis.y, r.x_axis.z, 0.0),
            DVec4::new(r.y_axis.x, r.y_axis.y, r.y_axis.z, 0.0),
            DVec4::new(r.z_axis.x, r.z_axis.y, r.z_axis.z, 0.0),
            DVec4::new(t.x, t.y, t.z, 1.0),
        )
    }

    /// The rows of the 4x4 homogeneous matrix.
    pub fn to_rows(&self) -> [[f64; 4]; 4] {
        let r = self.rotation;
        let t = self.translation;
        [
            [r.x_axis.x, r.y_axis.x, r.z_axis.x, t.x],
            [r.x_axis.y, r.y_axis.y, r.z_axis.y, t.y],
            [r.x_axis.z, r.y_axis.z, r.z_axis.z, t.z],
            [0.0, 0.0, 0.0, 1.0],
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn quarter_turn_z() -> RigidTransform {
        RigidTransform::new(
            DMat3::from_rotation_z(std::f64::consts::FRAC_PI_2),
            DVec3::new(1.0, 2.0, 3.0),
        )
    }

    #[test]
    fn test_identity_is_neutral() {
        let t = quarter_turn_z();
        assert_eq!(t.compose(&RigidTransform::IDENTITY), t);
        assert_eq!(RigidTransform::IDENTITY.compose(&t), t);
    }

    #[test]
    fn test_inverse_roundtrip() {
        let t = quarter_turn_z();
        let roundtrip = t.compose(&t.inverse());
        assert!(roundtrip
            .rotation()
            .abs_diff_eq(DMat3::IDENTITY, 1e-12));
        assert_relative_eq!(roundtrip.translation().length(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_inverse_is_rigid() {
        let t = quarter_turn_z();
        let inv = t.inverse();
        assert_eq!(inv.rotation(), t.rotation().transpose());
        assert_eq!(
            inv.translation(),
            -(t.rotation().transpose() * t.translation())
        );
    }

    #[test]
    fn test_transform_point() {
        let t = quarter_turn_z();
        let p = t.transform_point(DVec3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(p.x, 1.0, epsilon = 1e-12);
        assert_relative_eq!(p.y, 3.0, epsilon = 1e-12);
        assert_relative_eq!(p.z, 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_from_rows_roundtrip_is_exact() {
        let rows = quarter_turn_z().to_rows();
        let restored = RigidTransform::from_rows(&rows).unwrap();
        assert_eq!(restored.to_rows(), rows);
    }

    #[test]
    fn test_from_rows_rejects_bad_bottom_row() {
        let mut rows = RigidTransform::IDENTITY.to_rows();
        rows[3][0] = 0.5;
        assert_eq!(
            RigidTransform::from_rows(&rows),
            Err(TransformError::NotHomogeneous)
        );
    }

    #[test]
    fn test_from_rows_rejects_scaled_rotation() {
        let mut rows = RigidTransform::IDENTITY.to_rows();
        rows[0][0] = 2.0;
        assert_eq!(
            RigidTransform::from_rows(&rows),
            Err(TransformError::NotRotation)
        );
    }

    #[test]
    fn test_from_rows_rejects_reflection() {
        let mut rows = RigidTransform::IDENTITY.to_rows();
        rows[0][0] = -1.0;
        assert_eq!(
            RigidTransform::from_rows(&rows),
            Err(TransformError::NotRotation)
        );
    }

    #[test]
    fn test_as_matrix_matches_rows() {
        let t = quarter_turn_z();
        let m = t.as_matrix();
        let rows = t.to_rows();
        for (c, col) in [m.x_axis, m.y_axis, m.z_axis, m.w_axis].iter().enumerate() {
            assert_eq!(col.x, rows[0][c]);
            assert_eq!(col.y, rows[1][c]);
            assert_eq!(col.z, rows[2][c]);
            assert_eq!(col.w, rows[3][c]);
        }
    }
}
