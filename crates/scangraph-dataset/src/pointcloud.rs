/// A scan payload: 3-D points with optional per-point colors and normals.
#[derive(Debug, Clone, Default)]
pub struct ScanCloud {
    points: Vec<[f64; 3]>,
    colors: Option<Vec<[u8; 3]>>,
    normals: Option<Vec<[f64; 3]>>,
}

impl ScanCloud {
    /// Create a scan cloud from points, colors (optional), and normals
    /// (optional).
    pub fn new(
        points: Vec<[f64; 3]>,
        colors: Option<Vec<[u8; 3]>>,
        normals: Option<Vec<[f64; 3]>>,
    ) -> Self {
        Self {
            points,
            colors,
            normals,
        }
    }

    /// Create a scan cloud holding only points.
    pub fn from_points(points: Vec<[f64; 3]>) -> Self {
        Self {
            points,
            colors: None,
            normals: None,
        }
    }

    /// Number of points in the cloud.
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the cloud holds no points.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The points of the cloud.
    pub fn points(&self) -> &[[f64; 3]] {
        &self.points
    }

    /// Per-point colors, if the payload carried any.
    pub fn colors(&self) -> Option<&[[u8; 3]]> {
        self.colors.as_deref()
    }

    /// Per-point normals, if the payload carried any.
    pub fn normals(&self) -> Option<&[[f64; 3]]> {
        self.normals.as_deref()
    }

    /// Component-wise minimum over all points, or `None` for an empty cloud.
    pub fn min_bound(&self) -> Option<[f64; 3]> {
        self.fold_bound(f64::min)
    }

    /// Component-wise maximum over all points, or `None` for an empty cloud.
    pub fn max_bound(&self) -> Option<[f64; 3]> {
        self.fold_bound(f64::max)
    }

    /// Centroid of the points, or `None` for an empty cloud.
    pub fn center(&self) -> Option<[f64; 3]> {
        if self.points.is_empty() {
            return None;
        }
        let mut sum = [0.0; 3];
        for point in &self.points {
            sum[0] += point[0];
            sum[1] += point[1];
            sum[2] += point[2];
        }
        let n = self.points.len() as f64;
        Some([sum[0] / n, sum[1] / n, sum[2] / n])
    }

    fn fold_bound(&self, pick: fn(f64, f64) -> f64) -> Option<[f64; 3]> {
        self.points.iter().copied().reduce(|a, b| {
            [pick(a[0], b[0]), pick(a[1], b[1]), pick(a[2], b[2])]
        })
    }
}
