//! Spacetime geometry supplied to the relativistic variants.
//!
//! The EOS never builds a metric; the mesh hands one in per cell through
//! [`Spacetime`]. Newtonian and special-relativistic variants ignore it.

use crate::error::{EosError, EosResult};
use eos_core::{BlockShape, CellIndex, Real};
use nalgebra::{Matrix3, Matrix4, Vector3};
use ndarray::Array3;

/// Covariant metric `g_{mu nu}` and its inverse `g^{mu nu}` at one cell.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CellMetric {
    pub g: Matrix4<Real>,
    pub g_inv: Matrix4<Real>,
}

impl Default for CellMetric {
    fn default() -> Self {
        Self::minkowski()
    }
}

impl CellMetric {
    /// Flat metric with signature (-, +, +, +).
    pub fn minkowski() -> Self {
        let g = Matrix4::from_diagonal(&nalgebra::Vector4::new(-1.0, 1.0, 1.0, 1.0));
        Self { g, g_inv: g }
    }

    /// Build from the covariant components, inverting them.
    pub fn new(g: Matrix4<Real>) -> EosResult<Self> {
        let g_inv = g.try_inverse().ok_or_else(|| EosError::InvalidArg {
            what: "metric is singular".to_string(),
        })?;
        Ok(Self { g, g_inv })
    }

    /// 3+1 split seen by the normal observer, or `None` if `g^00 >= 0`.
    pub fn spatial_frame(&self) -> Option<SpatialFrame> {
        let g00 = self.g_inv[(0, 0)];
        if !(g00 < 0.0) || !g00.is_finite() {
            return None;
        }
        let alpha = (-1.0 / g00).sqrt();
        let alpha_sq = alpha * alpha;
        let beta_u = Vector3::new(
            alpha_sq * self.g_inv[(0, 1)],
            alpha_sq * self.g_inv[(0, 2)],
            alpha_sq * self.g_inv[(0, 3)],
        );
        let gamma_dd = self.g.fixed_view::<3, 3>(1, 1).into_owned();
        let gamma_uu = self.g_inv.fixed_view::<3, 3>(1, 1).into_owned()
            + beta_u * beta_u.transpose() / alpha_sq;
        Some(SpatialFrame {
            alpha,
            beta_u,
            gamma_dd,
            gamma_uu,
        })
    }
}

/// Lapse, shift and spatial metric of one cell.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpatialFrame {
    pub alpha: Real,
    pub beta_u: Vector3<Real>,
    pub gamma_dd: Matrix3<Real>,
    pub gamma_uu: Matrix3<Real>,
}

impl SpatialFrame {
    /// Unit lapse, zero shift, Euclidean spatial metric.
    pub fn flat() -> Self {
        Self {
            alpha: 1.0,
            beta_u: Vector3::zeros(),
            gamma_dd: Matrix3::identity(),
            gamma_uu: Matrix3::identity(),
        }
    }

    #[inline]
    pub fn lower(&self, v_u: &Vector3<Real>) -> Vector3<Real> {
        self.gamma_dd * v_u
    }

    #[inline]
    pub fn raise(&self, v_d: &Vector3<Real>) -> Vector3<Real> {
        self.gamma_uu * v_d
    }

    /// `gamma_ij v^i v^j`
    #[inline]
    pub fn norm_sq_u(&self, v_u: &Vector3<Real>) -> Real {
        v_u.dot(&self.lower(v_u))
    }

    /// `gamma^ij v_i v_j`
    #[inline]
    pub fn norm_sq_d(&self, v_d: &Vector3<Real>) -> Real {
        v_d.dot(&self.raise(v_d))
    }

    /// Lorentz factor of a normal-frame 4-velocity.
    #[inline]
    pub fn lorentz(&self, u_tilde: &Vector3<Real>) -> Real {
        (1.0 + self.norm_sq_u(u_tilde).max(0.0)).sqrt()
    }
}

/// Per-cell geometry provider.
pub trait Spacetime: Sync {
    /// Metric and inverse at a cell.
    fn metric(&self, index: CellIndex) -> CellMetric;

    /// Radial-like coordinate used by power-law floors.
    fn floor_scale(&self, _index: CellIndex) -> Real {
        1.0
    }

    /// Whether this geometry provides data for every cell of `shape`.
    fn covers(&self, _shape: BlockShape) -> bool {
        true
    }
}

/// Flat spacetime everywhere.
#[derive(Clone, Copy, Debug, Default)]
pub struct Minkowski;

impl Spacetime for Minkowski {
    fn metric(&self, _index: CellIndex) -> CellMetric {
        CellMetric::minkowski()
    }
}

/// Metric and floor scale stored per cell, filled by the mesh.
#[derive(Clone, Debug)]
pub struct MetricField {
    metric: Array3<CellMetric>,
    scale: Array3<Real>,
}

impl MetricField {
    /// Fill every cell of a block from a closure returning `(metric, scale)`.
    pub fn from_fn<F>(shape: BlockShape, mut f: F) -> Self
    where
        F: FnMut(CellIndex) -> (CellMetric, Real),
    {
        let dims = (shape.nk, shape.nj, shape.ni);
        let mut metric = Array3::from_elem(dims, CellMetric::minkowski());
        let mut scale = Array3::from_elem(dims, 1.0);
        for k in 0..shape.nk {
            for j in 0..shape.nj {
                for i in 0..shape.ni {
                    let (m, s) = f(CellIndex { k, j, i });
                    metric[[k, j, i]] = m;
                    scale[[k, j, i]] = s;
                }
            }
        }
        Self { metric, scale }
    }

    /// Replace the metric of one cell.
    pub fn set(&mut self, index: CellIndex, metric: CellMetric) {
        self.metric[[index.k, index.j, index.i]] = metric;
    }
}

impl Spacetime for MetricField {
    fn metric(&self, index: CellIndex) -> CellMetric {
        self.metric[[index.k, index.j, index.i]]
    }

    fn floor_scale(&self, index: CellIndex) -> Real {
        self.scale[[index.k, index.j, index.i]]
    }

    fn covers(&self, shape: BlockShape) -> bool {
        self.metric.shape() == [shape.nk, shape.nj, shape.ni]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minkowski_frame_is_flat() {
        let frame = CellMetric::minkowski().spatial_frame().unwrap();
        assert_eq!(frame, SpatialFrame::flat());
    }

    #[test]
    fn diagonal_metric_lapse() {
        let g = Matrix4::from_diagonal(&nalgebra::Vector4::new(-0.25, 4.0, 1.0, 1.0));
        let metric = CellMetric::new(g).unwrap();
        let frame = metric.spatial_frame().unwrap();
        assert!((frame.alpha - 0.5).abs() < 1e-14);
        assert_eq!(frame.beta_u, Vector3::zeros());
        assert!((frame.gamma_uu[(0, 0)] - 0.25).abs() < 1e-14);
    }

    #[test]
    fn shifted_metric_spatial_inverse() {
        // ds^2 = -dt^2 + (dx + 0.3 dt)^2 + dy^2 + dz^2: unit lapse, shift 0.3.
        let mut g = Matrix4::identity();
        g[(0, 0)] = -1.0 + 0.09;
        g[(0, 1)] = 0.3;
        g[(1, 0)] = 0.3;
        let metric = CellMetric::new(g).unwrap();
        let frame = metric.spatial_frame().unwrap();
        assert!((frame.alpha - 1.0).abs() < 1e-12);
        assert!((frame.beta_u[0] - 0.3).abs() < 1e-12);
        let product = frame.gamma_dd * frame.gamma_uu;
        assert!((product - Matrix3::identity()).norm() < 1e-12);
    }

    #[test]
    fn degenerate_metric_has_no_frame() {
        let mut metric = CellMetric::minkowski();
        metric.g_inv[(0, 0)] = 0.5;
        assert!(metric.spatial_frame().is_none());
    }

    #[test]
    fn singular_metric_rejected() {
        assert!(CellMetric::new(Matrix4::zeros()).is_err());
    }

    #[test]
    fn metric_field_lookup() {
        let shape = BlockShape::new(1, 1, 3);
        let field = MetricField::from_fn(shape, |idx| (CellMetric::minkowski(), 1.0 + idx.i as Real));
        assert!(field.covers(shape));
        assert!(!field.covers(BlockShape::new(1, 2, 3)));
        assert_eq!(field.floor_scale(CellIndex { k: 0, j: 0, i: 2 }), 3.0);
    }
}
