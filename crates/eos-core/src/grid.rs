//! Cell-indexed block storage shared by the EOS kernels and their callers.
//!
//! Arrays are laid out `[variable][k][j][i]`. The mesh owns the block; the
//! EOS only borrows it for the duration of a conversion call.

use crate::error::{CoreError, CoreResult};
use crate::numeric::Real;
use ndarray::{Array3, Array4};

/// Conserved variable indices.
pub const IDN: usize = 0;
pub const IM1: usize = 1;
pub const IM2: usize = 2;
pub const IM3: usize = 3;
pub const IEN: usize = 4;

/// Primitive variable indices (density shares `IDN`).
pub const IVX: usize = 1;
pub const IVY: usize = 2;
pub const IVZ: usize = 3;
pub const IPR: usize = 4;

/// Cell-centered field indices.
pub const IB1: usize = 0;
pub const IB2: usize = 1;
pub const IB3: usize = 2;

/// First slot of the per-component densities (heterogeneous mixtures).
pub const ICOMP: usize = 5;

/// Transverse field slots of an interface ("wave") vector.
pub const IBY: usize = 5;
pub const IBZ: usize = 6;
pub const NWAVE: usize = 7;

/// Largest number of mixture components supported.
pub const MAX_COMPONENTS: usize = 8;

/// Longest per-cell variable vector of any variant.
pub const NVAR_MAX: usize = ICOMP + MAX_COMPONENTS - 1;

/// Fixed-size per-cell scratch vector.
pub type CellVector = [Real; NVAR_MAX];

/// Coordinate direction of a cell interface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    X1,
    X2,
    X3,
}

impl Axis {
    /// 0-based spatial index of the axis.
    pub fn index(self) -> usize {
        match self {
            Axis::X1 => 0,
            Axis::X2 => 1,
            Axis::X3 => 2,
        }
    }

    /// Spatial indices of the two transverse directions, cyclically ordered.
    pub fn transverse(self) -> (usize, usize) {
        let n = self.index();
        ((n + 1) % 3, (n + 2) % 3)
    }

    pub const ALL: [Axis; 3] = [Axis::X1, Axis::X2, Axis::X3];
}

/// Number of cells along each block direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockShape {
    pub nk: usize,
    pub nj: usize,
    pub ni: usize,
}

impl BlockShape {
    pub fn new(nk: usize, nj: usize, ni: usize) -> Self {
        Self { nk, nj, ni }
    }

    pub fn cell_count(&self) -> usize {
        self.nk * self.nj * self.ni
    }
}

/// Position of a single cell inside a block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CellIndex {
    pub k: usize,
    pub j: usize,
    pub i: usize,
}

impl std::fmt::Display for CellIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "(k={}, j={}, i={})", self.k, self.j, self.i)
    }
}

/// Inclusive, axis-aligned index range `(is..=ie, js..=je, ks..=ke)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IndexRange {
    pub is: usize,
    pub ie: usize,
    pub js: usize,
    pub je: usize,
    pub ks: usize,
    pub ke: usize,
}

impl IndexRange {
    pub fn new(is: usize, ie: usize, js: usize, je: usize, ks: usize, ke: usize) -> Self {
        Self {
            is,
            ie,
            js,
            je,
            ks,
            ke,
        }
    }

    /// Every cell of a block.
    pub fn whole(shape: BlockShape) -> Self {
        Self::new(
            0,
            shape.ni.saturating_sub(1),
            0,
            shape.nj.saturating_sub(1),
            0,
            shape.nk.saturating_sub(1),
        )
    }

    /// Single-cell range.
    pub fn cell(index: CellIndex) -> Self {
        Self::new(index.i, index.i, index.j, index.j, index.k, index.k)
    }

    pub fn is_empty(&self) -> bool {
        self.ie < self.is || self.je < self.js || self.ke < self.ks
    }

    pub fn len(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            (self.ie - self.is + 1) * (self.je - self.js + 1) * (self.ke - self.ks + 1)
        }
    }

    /// Check that the range lies inside a block of the given shape.
    pub fn validate(&self, shape: BlockShape) -> CoreResult<()> {
        if self.is_empty() {
            return Ok(());
        }
        if self.ie >= shape.ni {
            return Err(CoreError::IndexOob {
                what: "ie",
                index: self.ie,
                len: shape.ni,
            });
        }
        if self.je >= shape.nj {
            return Err(CoreError::IndexOob {
                what: "je",
                index: self.je,
                len: shape.nj,
            });
        }
        if self.ke >= shape.nk {
            return Err(CoreError::IndexOob {
                what: "ke",
                index: self.ke,
                len: shape.nk,
            });
        }
        Ok(())
    }

    /// Cells in k-major, i-fastest order.
    pub fn cells(&self) -> impl Iterator<Item = CellIndex> + '_ {
        let empty = self.is_empty();
        let (ks, ke) = if empty { (1, 0) } else { (self.ks, self.ke) };
        (ks..=ke).flat_map(move |k| {
            (self.js..=self.je)
                .flat_map(move |j| (self.is..=self.ie).map(move |i| CellIndex { k, j, i }))
        })
    }
}

/// Magnetic field sampled on cell faces.
///
/// `x1f` has shape `(nk, nj, ni + 1)`, `x2f` `(nk, nj + 1, ni)` and
/// `x3f` `(nk + 1, nj, ni)`.
#[derive(Clone, Debug, PartialEq)]
pub struct FaceField {
    pub x1f: Array3<Real>,
    pub x2f: Array3<Real>,
    pub x3f: Array3<Real>,
}

impl FaceField {
    pub fn zeros(shape: BlockShape) -> Self {
        let BlockShape { nk, nj, ni } = shape;
        Self {
            x1f: Array3::zeros((nk, nj, ni + 1)),
            x2f: Array3::zeros((nk, nj + 1, ni)),
            x3f: Array3::zeros((nk + 1, nj, ni)),
        }
    }

    /// Spatially uniform field.
    pub fn uniform(shape: BlockShape, b: [Real; 3]) -> Self {
        let mut field = Self::zeros(shape);
        field.x1f.fill(b[0]);
        field.x2f.fill(b[1]);
        field.x3f.fill(b[2]);
        field
    }

    /// Cell-centered field as the average of the two bounding faces.
    pub fn cell_centered(&self, index: CellIndex) -> [Real; 3] {
        let CellIndex { k, j, i } = index;
        [
            0.5 * (self.x1f[[k, j, i]] + self.x1f[[k, j, i + 1]]),
            0.5 * (self.x2f[[k, j, i]] + self.x2f[[k, j + 1, i]]),
            0.5 * (self.x3f[[k, j, i]] + self.x3f[[k + 1, j, i]]),
        ]
    }
}

/// The arrays of one mesh block that an EOS reads and writes.
#[derive(Clone, Debug)]
pub struct BlockState {
    pub shape: BlockShape,
    pub cons: Array4<Real>,
    pub prim: Array4<Real>,
    pub prim_old: Array4<Real>,
    pub bcc: Array4<Real>,
    pub field: FaceField,
    pub fixed: Array3<bool>,
}

impl BlockState {
    /// Zero-initialized block with `nvar` conserved/primitive variables.
    pub fn new(nvar: usize, shape: BlockShape) -> Self {
        let BlockShape { nk, nj, ni } = shape;
        Self {
            shape,
            cons: Array4::zeros((nvar, nk, nj, ni)),
            prim: Array4::zeros((nvar, nk, nj, ni)),
            prim_old: Array4::zeros((nvar, nk, nj, ni)),
            bcc: Array4::zeros((3, nk, nj, ni)),
            field: FaceField::zeros(shape),
            fixed: Array3::from_elem((nk, nj, ni), false),
        }
    }

    pub fn nvar(&self) -> usize {
        self.cons.shape()[0]
    }

    /// Copy the current primitives into the previous-step snapshot.
    pub fn snapshot_primitives(&mut self) {
        self.prim_old.assign(&self.prim);
    }

    /// Gather `n` variables of one cell from a 4-index array.
    pub fn gather(array: &Array4<Real>, n: usize, index: CellIndex) -> CellVector {
        let mut out = [0.0; NVAR_MAX];
        for (v, slot) in out.iter_mut().enumerate().take(n) {
            *slot = array[[v, index.k, index.j, index.i]];
        }
        out
    }

    /// Scatter `n` variables of one cell into a 4-index array.
    pub fn scatter(array: &mut Array4<Real>, n: usize, index: CellIndex, values: &CellVector) {
        for (v, value) in values.iter().enumerate().take(n) {
            array[[v, index.k, index.j, index.i]] = *value;
        }
    }

    pub fn cell_field(&self, index: CellIndex) -> [Real; 3] {
        [
            self.bcc[[IB1, index.k, index.j, index.i]],
            self.bcc[[IB2, index.k, index.j, index.i]],
            self.bcc[[IB3, index.k, index.j, index.i]],
        ]
    }

    /// Check that every array matches the declared shape and variable count.
    pub fn validate(&self, nvar: usize) -> CoreResult<()> {
        let BlockShape { nk, nj, ni } = self.shape;
        let expected = vec![nvar, nk, nj, ni];
        for (what, array) in [
            ("cons", &self.cons),
            ("prim", &self.prim),
            ("prim_old", &self.prim_old),
        ] {
            if array.shape() != expected.as_slice() {
                return Err(CoreError::ShapeMismatch {
                    what,
                    expected: expected.clone(),
                    found: array.shape().to_vec(),
                });
            }
        }
        if self.bcc.shape() != [3, nk, nj, ni] {
            return Err(CoreError::ShapeMismatch {
                what: "bcc",
                expected: vec![3, nk, nj, ni],
                found: self.bcc.shape().to_vec(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_len_and_cells() {
        let range = IndexRange::new(1, 3, 0, 1, 2, 2);
        assert_eq!(range.len(), 6);
        let cells: Vec<_> = range.cells().collect();
        assert_eq!(cells.len(), 6);
        assert_eq!(cells[0], CellIndex { k: 2, j: 0, i: 1 });
        assert_eq!(cells[5], CellIndex { k: 2, j: 1, i: 3 });
    }

    #[test]
    fn empty_range_yields_nothing() {
        let range = IndexRange::new(3, 2, 0, 0, 0, 0);
        assert!(range.is_empty());
        assert_eq!(range.len(), 0);
        assert_eq!(range.cells().count(), 0);
    }

    #[test]
    fn range_validation_catches_overflow() {
        let shape = BlockShape::new(1, 2, 4);
        assert!(IndexRange::whole(shape).validate(shape).is_ok());
        let err = IndexRange::new(0, 4, 0, 1, 0, 0).validate(shape).unwrap_err();
        assert!(matches!(err, CoreError::IndexOob { what: "ie", .. }));
    }

    #[test]
    fn cell_centered_field_averages_faces() {
        let shape = BlockShape::new(1, 1, 2);
        let mut field = FaceField::zeros(shape);
        field.x1f[[0, 0, 0]] = 1.0;
        field.x1f[[0, 0, 1]] = 3.0;
        field.x2f.fill(-2.0);
        let b = field.cell_centered(CellIndex { k: 0, j: 0, i: 0 });
        assert_eq!(b, [2.0, -2.0, 0.0]);
    }

    #[test]
    fn gather_scatter_round_trip() {
        let shape = BlockShape::new(2, 2, 2);
        let mut block = BlockState::new(5, shape);
        let index = CellIndex { k: 1, j: 0, i: 1 };
        let mut values = [0.0; NVAR_MAX];
        values[..5].copy_from_slice(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        BlockState::scatter(&mut block.cons, 5, index, &values);
        assert_eq!(BlockState::gather(&block.cons, 5, index), values);
        assert!(block.validate(5).is_ok());
        assert!(block.validate(4).is_err());
    }

    #[test]
    fn axis_transverse_is_cyclic() {
        assert_eq!(Axis::X1.transverse(), (1, 2));
        assert_eq!(Axis::X2.transverse(), (2, 0));
        assert_eq!(Axis::X3.transverse(), (0, 1));
    }
}
