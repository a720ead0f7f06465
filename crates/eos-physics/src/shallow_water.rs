//! Shallow-water closure: depth `h` plays the role of density.

use crate::block::{self, CellKernel};
use crate::error::EosResult;
use crate::floors::Floors;
use crate::model::{EquationOfState, WaveSpeeds};
use crate::recovery::{Adjustments, CellInput, CellRecovery, ConversionReport, RecoveryStatus};
use crate::spacetime::{CellMetric, Spacetime};
use eos_core::{
    Axis, BlockState, CellVector, IDN, IM1, IM2, IM3, IVX, IVY, IVZ, IndexRange, NVAR_MAX, Real,
};

/// Conserved `(h, h u, h v, h w)`, primitive `(h, u, v, w)`; gravity is one
/// in code units so the gravity-wave speed is `sqrt(h)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShallowWater {
    floors: Floors,
}

impl ShallowWater {
    pub fn new(floors: Floors) -> Self {
        Self { floors }
    }
}

impl CellKernel for ShallowWater {
    fn name(&self) -> &'static str {
        "shallow_water"
    }

    fn nvar(&self) -> usize {
        4
    }

    fn recover(&self, input: &CellInput) -> CellRecovery {
        let mut cons = input.cons;
        let mut adj = Adjustments::default();
        let h = self.floors.density(cons[IDN]);
        if h != cons[IDN] {
            cons[IDN] = h;
            adj.density_floor = true;
        }
        let mut prim = [0.0; NVAR_MAX];
        prim[IDN] = h;
        prim[IVX] = cons[IM1] / h;
        prim[IVY] = cons[IM2] / h;
        prim[IVZ] = cons[IM3] / h;
        CellRecovery {
            prim,
            cons: adj.any().then_some(cons),
            status: RecoveryStatus::from_adjustments(adj),
        }
    }

    fn conserve(&self, prim: &CellVector, _bcc: [Real; 3], _metric: &CellMetric) -> Option<CellVector> {
        let mut cons = [0.0; NVAR_MAX];
        cons[IDN] = prim[IDN];
        cons[IM1] = prim[IDN] * prim[IVX];
        cons[IM2] = prim[IDN] * prim[IVY];
        cons[IM3] = prim[IDN] * prim[IVZ];
        Some(cons)
    }
}

impl EquationOfState for ShallowWater {
    fn name(&self) -> &'static str {
        CellKernel::name(self)
    }

    fn nvar(&self) -> usize {
        CellKernel::nvar(self)
    }

    fn conserved_to_primitive(
        &self,
        block: &mut BlockState,
        spacetime: &dyn Spacetime,
        range: IndexRange,
    ) -> EosResult<ConversionReport> {
        block::conserved_to_primitive(self, block, spacetime, range)
    }

    fn primitive_to_conserved(
        &self,
        block: &mut BlockState,
        spacetime: &dyn Spacetime,
        range: IndexRange,
    ) -> EosResult<()> {
        block::primitive_to_conserved(self, block, spacetime, range)
    }

    fn sound_speed(&self, prim: &[Real]) -> Real {
        prim[IDN].sqrt()
    }

    fn wave_speeds(&self, prim: &[Real], _bcc: [Real; 3], axis: Axis, _metric: &CellMetric) -> WaveSpeeds {
        WaveSpeeds::symmetric(prim[IVX + axis.index()], self.sound_speed(prim))
    }

    fn density_floor(&self) -> Real {
        self.floors.density
    }

    fn pressure_floor(&self) -> Real {
        self.floors.pressure
    }

    fn gamma(&self) -> Real {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spacetime::Minkowski;
    use eos_core::BlockShape;

    #[test]
    fn depth_and_velocity() {
        let eos = ShallowWater::new(Floors::default());
        let mut block = BlockState::new(4, BlockShape::new(1, 1, 2));
        block.cons[[IDN, 0, 0, 0]] = 4.0;
        block.cons[[IM1, 0, 0, 0]] = 2.0;
        block.cons[[IDN, 0, 0, 1]] = -1.0;
        let range = IndexRange::whole(block.shape);
        let report = eos.conserved_to_primitive(&mut block, &Minkowski, range).unwrap();
        assert_eq!(block.prim[[IVX, 0, 0, 0]], 0.5);
        assert_eq!(eos.sound_speed(&[4.0, 0.5, 0.0, 0.0]), 2.0);
        assert_eq!(block.prim[[IDN, 0, 0, 1]], Floors::default().density);
        assert_eq!(report.floored, 1);
    }
}
