//! Block-level drivers shared by every variant.
//!
//! Cells of the index range are gathered into per-cell inputs, mapped through
//! the variant's pure kernel in parallel, and scattered back sequentially.

use crate::error::{EosError, EosResult};
use crate::recovery::{CellInput, CellRecovery, ConversionReport, RecoveryStatus};
use crate::spacetime::{CellMetric, Spacetime};
use eos_core::timing::{Timer, conversion_timing};
use eos_core::{BlockState, CellIndex, CellVector, CoreError, IB1, IB2, IB3, IndexRange, Real};
use rayon::prelude::*;
use tracing::{debug, trace, warn};

/// Pure per-cell conversion kernel of one variant.
pub(crate) trait CellKernel: Sync {
    fn name(&self) -> &'static str;

    fn nvar(&self) -> usize;

    fn is_magnetic(&self) -> bool {
        false
    }

    /// Kernels that read the metric require a spacetime covering the block.
    fn needs_metric(&self) -> bool {
        false
    }

    /// Kernels that maintain the `fixed` marker.
    fn tracks_fixed(&self) -> bool {
        false
    }

    /// Recover the primitive state of one cell.
    fn recover(&self, input: &CellInput) -> CellRecovery;

    /// Conserved vector of one primitive state; `None` leaves the cell untouched.
    fn conserve(&self, prim: &CellVector, bcc: [Real; 3], metric: &CellMetric) -> Option<CellVector>;
}

fn check_block<K: CellKernel>(
    kernel: &K,
    block: &BlockState,
    spacetime: &dyn Spacetime,
    range: IndexRange,
) -> EosResult<()> {
    block.validate(kernel.nvar())?;
    range.validate(block.shape)?;
    if kernel.needs_metric() && !spacetime.covers(block.shape) {
        return Err(EosError::InvalidArg {
            what: format!("{}: spacetime does not cover the block", kernel.name()),
        });
    }
    if kernel.is_magnetic() {
        let expected = face_shapes(block);
        let found = [
            block.field.x1f.shape().to_vec(),
            block.field.x2f.shape().to_vec(),
            block.field.x3f.shape().to_vec(),
        ];
        for (what, (expected, found)) in ["x1f", "x2f", "x3f"]
            .into_iter()
            .zip(expected.into_iter().zip(found))
        {
            if expected != found {
                return Err(CoreError::ShapeMismatch {
                    what,
                    expected,
                    found,
                }
                .into());
            }
        }
    }
    Ok(())
}

fn face_shapes(block: &BlockState) -> [Vec<usize>; 3] {
    let s = block.shape;
    [
        vec![s.nk, s.nj, s.ni + 1],
        vec![s.nk, s.nj + 1, s.ni],
        vec![s.nk + 1, s.nj, s.ni],
    ]
}

/// Average the face field onto cell centers over `range`.
pub(crate) fn cell_centered_field(block: &mut BlockState, range: IndexRange) {
    for index in range.cells() {
        let b = block.field.cell_centered(index);
        let CellIndex { k, j, i } = index;
        block.bcc[[IB1, k, j, i]] = b[0];
        block.bcc[[IB2, k, j, i]] = b[1];
        block.bcc[[IB3, k, j, i]] = b[2];
    }
}

/// Run a kernel's recovery over a block.
pub(crate) fn conserved_to_primitive<K: CellKernel>(
    kernel: &K,
    block: &mut BlockState,
    spacetime: &dyn Spacetime,
    range: IndexRange,
) -> EosResult<ConversionReport> {
    check_block(kernel, block, spacetime, range)?;
    let timer = Timer::start();
    let nvar = kernel.nvar();

    if kernel.is_magnetic() {
        cell_centered_field(block, range);
    }

    let inputs: Vec<CellInput> = range
        .cells()
        .map(|index| CellInput {
            index,
            cons: BlockState::gather(&block.cons, nvar, index),
            prim_old: BlockState::gather(&block.prim_old, nvar, index),
            bcc: if kernel.is_magnetic() {
                block.cell_field(index)
            } else {
                [0.0; 3]
            },
            metric: if kernel.needs_metric() {
                spacetime.metric(index)
            } else {
                CellMetric::minkowski()
            },
            floor_scale: spacetime.floor_scale(index),
        })
        .collect();

    let results: Vec<CellRecovery> = inputs.par_iter().map(|input| kernel.recover(input)).collect();

    let mut report = ConversionReport::default();
    for (input, result) in inputs.iter().zip(&results) {
        let index = input.index;
        BlockState::scatter(&mut block.prim, nvar, index, &result.prim);
        if let Some(cons) = &result.cons {
            BlockState::scatter(&mut block.cons, nvar, index, cons);
        }
        let fixed = kernel.tracks_fixed() && result.status.needs_fix();
        if kernel.tracks_fixed() {
            block.fixed[[index.k, index.j, index.i]] = fixed;
        }
        match result.status {
            RecoveryStatus::Fallback(reason) => {
                warn!(eos = kernel.name(), cell = %index, %reason, "primitive recovery fell back to floors");
            }
            RecoveryStatus::Adjusted(adj) if adj.limited() => {
                trace!(eos = kernel.name(), cell = %index, ?adj, "relativistic limiter applied");
            }
            _ => {}
        }
        report.record(index, &result.status, fixed);
    }

    let elapsed = timer.stop_into(&conversion_timing::CONS_TO_PRIM);
    debug!(
        eos = kernel.name(),
        cells = report.cells,
        floored = report.floored,
        limited = report.limited,
        fallbacks = report.fallbacks,
        elapsed_s = elapsed.unwrap_or(0.0),
        "conserved to primitive"
    );
    Ok(report)
}

/// Run a kernel's forward map over a block.
pub(crate) fn primitive_to_conserved<K: CellKernel>(
    kernel: &K,
    block: &mut BlockState,
    spacetime: &dyn Spacetime,
    range: IndexRange,
) -> EosResult<()> {
    check_block(kernel, block, spacetime, range)?;
    let timer = Timer::start();
    let nvar = kernel.nvar();

    let inputs: Vec<(CellIndex, CellVector, [Real; 3], CellMetric)> = range
        .cells()
        .map(|index| {
            let bcc = if kernel.is_magnetic() {
                block.cell_field(index)
            } else {
                [0.0; 3]
            };
            let metric = if kernel.needs_metric() {
                spacetime.metric(index)
            } else {
                CellMetric::minkowski()
            };
            (index, BlockState::gather(&block.prim, nvar, index), bcc, metric)
        })
        .collect();

    let results: Vec<Option<CellVector>> = inputs
        .par_iter()
        .map(|(_, prim, bcc, metric)| kernel.conserve(prim, *bcc, metric))
        .collect();

    let mut skipped = 0usize;
    for ((index, ..), cons) in inputs.iter().zip(&results) {
        match cons {
            Some(cons) => BlockState::scatter(&mut block.cons, nvar, *index, cons),
            None => {
                skipped += 1;
                warn!(eos = kernel.name(), cell = %index, "conserved variables left unchanged");
            }
        }
    }

    let elapsed = timer.stop_into(&conversion_timing::PRIM_TO_CONS);
    debug!(
        eos = kernel.name(),
        cells = inputs.len(),
        skipped,
        elapsed_s = elapsed.unwrap_or(0.0),
        "primitive to conserved"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use eos_core::{BlockShape, FaceField};

    #[test]
    fn cell_centered_field_averages_faces() {
        let shape = BlockShape::new(1, 1, 2);
        let mut block = BlockState::new(5, shape);
        block.field = FaceField::zeros(shape);
        block.field.x1f[[0, 0, 0]] = 1.0;
        block.field.x1f[[0, 0, 1]] = 3.0;
        block.field.x1f[[0, 0, 2]] = 5.0;
        cell_centered_field(&mut block, IndexRange::whole(shape));
        assert_eq!(block.bcc[[IB1, 0, 0, 0]], 2.0);
        assert_eq!(block.bcc[[IB1, 0, 0, 1]], 4.0);
    }
}
