//! Pinhole camera model with the radial/tangential distortion layout used
//! by the calibration backend.

use nalgebra::Matrix3;
use serde::{Deserialize, Serialize};

use crate::{CalibError, ImageSize};

/// 3x3 intrinsic matrix `[[fx, 0, cx], [0, fy, cy], [0, 0, 1]]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct IntrinsicMatrix {
    k: Matrix3<f64>,
}

impl IntrinsicMatrix {
    pub fn new(fx: f64, fy: f64, cx: f64, cy: f64) -> Result<Self, CalibError> {
        Self::from_matrix(Matrix3::new(
            fx, 0.0, cx, //
            0.0, fy, cy, //
            0.0, 0.0, 1.0,
        ))
    }

    /// Accept a full matrix as returned by a solver. Only the focal lengths
    /// are validated; skew is kept as given.
    pub fn from_matrix(k: Matrix3<f64>) -> Result<Self, CalibError> {
        let (fx, fy) = (k[(0, 0)], k[(1, 1)]);
        if !(fx > 0.0 && fy > 0.0) {
            return Err(CalibError::InvalidIntrinsics { fx, fy });
        }
        Ok(Self { k })
    }

    pub fn fx(&self) -> f64 {
        self.k[(0, 0)]
    }

    pub fn fy(&self) -> f64 {
        self.k[(1, 1)]
    }

    pub fn cx(&self) -> f64 {
        self.k[(0, 2)]
    }

    pub fn cy(&self) -> f64 {
        self.k[(1, 2)]
    }

    pub fn matrix(&self) -> &Matrix3<f64> {
        &self.k
    }

    /// Row-major copy, the layout vision libraries expect for a `3x3` buffer.
    pub fn to_rows(&self) -> [[f64; 3]; 3] {
        let k = &self.k;
        [
            [k[(0, 0)], k[(0, 1)], k[(0, 2)]],
            [k[(1, 0)], k[(1, 1)], k[(1, 2)]],
            [k[(2, 0)], k[(2, 1)], k[(2, 2)]],
        ]
    }
}

/// Distortion vector `{k1, k2, p1, p2, k3}`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DistortionCoefficients {
    coeffs: [f64; 5],
}

impl DistortionCoefficients {
    pub fn new(coeffs: [f64; 5]) -> Self {
        Self { coeffs }
    }

    /// Two-term radial model; tangential terms and `k3` are zero.
    pub fn radial(k1: f64, k2: f64) -> Self {
        Self::new([k1, k2, 0.0, 0.0, 0.0])
    }

    pub fn k1(&self) -> f64 {
        self.coeffs[0]
    }

    pub fn k2(&self) -> f64 {
        self.coeffs[1]
    }

    pub fn as_array(&self) -> [f64; 5] {
        self.coeffs
    }
}

/// Which distortion terms are held fixed at zero during the solve.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolverModel {
    /// Fix `p1 = p2 = 0`.
    pub zero_tangent: bool,
    /// Fix `k3..k6 = 0`, leaving only `k1, k2` free.
    pub fix_k3_to_k6: bool,
}

impl Default for SolverModel {
    fn default() -> Self {
        Self {
            zero_tangent: true,
            fix_k3_to_k6: true,
        }
    }
}

impl SolverModel {
    /// Project a raw solver vector (any length, missing entries are zero)
    /// onto the five-term layout, forcing the fixed terms to zero.
    pub fn constrain(&self, raw: &[f64]) -> DistortionCoefficients {
        let mut coeffs = [0.0; 5];
        for (dst, src) in coeffs.iter_mut().zip(raw) {
            *dst = *src;
        }
        if self.zero_tangent {
            coeffs[2] = 0.0;
            coeffs[3] = 0.0;
        }
        if self.fix_k3_to_k6 {
            coeffs[4] = 0.0;
        }
        DistortionCoefficients::new(coeffs)
    }
}

/// Output of one joint calibration over all accepted views.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalibrationResult {
    pub intrinsics: IntrinsicMatrix,
    pub distortion: DistortionCoefficients,
    /// Overall reprojection RMSE in pixels as reported by the solver.
    pub rmse: f64,
    pub image_size: ImageSize,
    /// Number of views that went into the solve.
    pub views: usize,
}
