//! Special-relativistic hydrodynamics and MHD.
//!
//! Primitives carry `(rho, u^i, p)` with `u^i = W v^i`. Conserved variables
//! are `D = rho W`, `E = T^00` (rest mass included) and `M^i = T^0i`.

use super::{Inverter, NormalFrame, magnetosonic_sq};
use crate::block::{self, CellKernel};
use crate::error::{EosError, EosResult};
use crate::floors::Floors;
use crate::model::validation::validate_gamma;
use crate::model::{EquationOfState, WaveSpeeds};
use crate::recovery::{CellInput, CellRecovery, ConversionReport, RecoveryStatus};
use crate::settings::{InversionConfig, RelativisticLimits};
use crate::spacetime::{CellMetric, SpatialFrame, Spacetime};
use eos_core::{
    Axis, BlockState, CellVector, IBY, IBZ, IDN, IEN, IM1, IM2, IM3, IPR, IVX, IVY, IVZ,
    IndexRange, NVAR_MAX, Real, dot3, norm_sq3,
};
use ndarray::{ArrayView1, ArrayView2, ArrayViewMut1};

/// Lab-frame conserved variables of a primitive state with field `bcc`.
pub fn conserved(prim: &CellVector, bcc: [Real; 3], gamma: Real) -> CellVector {
    let rho = prim[IDN];
    let pgas = prim[IPR];
    let u = [prim[IVX], prim[IVY], prim[IVZ]];
    let lorentz_sq = 1.0 + norm_sq3(u);
    let lorentz = lorentz_sq.sqrt();
    let w = rho + gamma / (gamma - 1.0) * pgas;

    let b0 = dot3(u, bcc);
    let b = [
        (bcc[0] + b0 * u[0]) / lorentz,
        (bcc[1] + b0 * u[1]) / lorentz,
        (bcc[2] + b0 * u[2]) / lorentz,
    ];
    let b_sq = (norm_sq3(bcc) + b0 * b0) / lorentz_sq;
    let w_tot = w + b_sq;

    let mut cons = [0.0; NVAR_MAX];
    cons[IDN] = rho * lorentz;
    cons[IEN] = w_tot * lorentz_sq - (pgas + 0.5 * b_sq) - b0 * b0;
    cons[IM1] = w_tot * lorentz * u[0] - b0 * b[0];
    cons[IM2] = w_tot * lorentz * u[1] - b0 * b[1];
    cons[IM3] = w_tot * lorentz * u[2] - b0 * b[2];
    cons
}

/// Hydrodynamic characteristic speeds along one direction.
///
/// `rho_h` is the enthalpy density, `vx` the 3-velocity along the direction
/// and `lorentz_sq` the squared Lorentz factor.
pub fn sound_speeds(gamma: Real, rho_h: Real, pgas: Real, vx: Real, lorentz_sq: Real) -> WaveSpeeds {
    let cs_sq = gamma * pgas / rho_h;
    quadratic(cs_sq, vx, lorentz_sq)
}

fn quadratic(c_sq: Real, vx: Real, lorentz_sq: Real) -> WaveSpeeds {
    let sigma = c_sq / (lorentz_sq * (1.0 - c_sq));
    let relative = (sigma * (1.0 + sigma - vx * vx)).max(0.0).sqrt();
    WaveSpeeds::new((vx - relative) / (1.0 + sigma), (vx + relative) / (1.0 + sigma))
}

/// Fast magnetosonic speeds of one state along the direction `n` (0, 1 or 2).
///
/// Solves the exact quartic
/// `w (1 - cs^2) a^4 - (1 - l^2) [(b^2 + w cs^2) a^2 - cs^2 B_l^2] = 0`
/// with `a = W (l - v_n)` and `B_l = b^n - l b^0`, starting Newton from
/// `l = +1` and `l = -1`. Falls back to the comoving magnetosonic quadratic
/// if either iteration misbehaves.
pub fn fast_magnetosonic_speeds(gamma: Real, rho: Real, pgas: Real, u: [Real; 3], bcc: [Real; 3], n: usize) -> WaveSpeeds {
    let lorentz_sq = 1.0 + norm_sq3(u);
    let lorentz = lorentz_sq.sqrt();
    let w = rho + gamma / (gamma - 1.0) * pgas;
    let cs_sq = gamma * pgas / w;
    let b0 = dot3(u, bcc);
    let bn = (bcc[n] + b0 * u[n]) / lorentz;
    let b_sq = (norm_sq3(bcc) + b0 * b0) / lorentz_sq;
    let vn = u[n] / lorentz;

    let quartic = Quartic {
        e: w * (1.0 - cs_sq),
        f: b_sq + w * cs_sq,
        g: cs_sq,
        lorentz,
        vn,
        bn,
        b0,
    };
    match (quartic.outer_root(1.0), quartic.outer_root(-1.0)) {
        (Some(lp), Some(lm)) if lm <= lp => WaveSpeeds::new(lm, lp),
        _ => quadratic(magnetosonic_sq(cs_sq, b_sq, w), vn, lorentz_sq),
    }
}

struct Quartic {
    e: Real,
    f: Real,
    g: Real,
    lorentz: Real,
    vn: Real,
    bn: Real,
    b0: Real,
}

impl Quartic {
    fn eval(&self, l: Real) -> (Real, Real) {
        let a = self.lorentz * (l - self.vn);
        let bl = self.bn - l * self.b0;
        let p = self.f * a * a - self.g * bl * bl;
        let dp = 2.0 * self.f * a * self.lorentz + 2.0 * self.g * bl * self.b0;
        let q = self.e * a.powi(4) - (1.0 - l * l) * p;
        let dq = 4.0 * self.e * a.powi(3) * self.lorentz + 2.0 * l * p - (1.0 - l * l) * dp;
        (q, dq)
    }

    /// Outermost root reached by monotone Newton from `start = +1` or `-1`.
    fn outer_root(&self, start: Real) -> Option<Real> {
        let mut l = start;
        for _ in 0..100 {
            let (q, dq) = self.eval(l);
            if q == 0.0 {
                return Some(l);
            }
            // From the right the slope must be positive, from the left negative.
            if !(dq * start > 0.0) {
                return None;
            }
            let step = q / dq;
            l -= step;
            if !l.is_finite() || l.abs() > 1.0 {
                return None;
            }
            if step.abs() <= 1e-15 * (1.0 + l.abs()) {
                return Some(l);
            }
        }
        None
    }
}

/// Special-relativistic hydrodynamics.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SrHydro {
    floors: Floors,
    inverter: Inverter,
}

impl SrHydro {
    pub fn new(
        gamma: Real,
        floors: Floors,
        limits: RelativisticLimits,
        config: InversionConfig,
    ) -> EosResult<Self> {
        validate_gamma(gamma)?;
        Ok(Self {
            floors,
            inverter: Inverter {
                gamma,
                limits,
                config,
            },
        })
    }

    pub fn limits(&self) -> &RelativisticLimits {
        &self.inverter.limits
    }

    /// Characteristic speeds from enthalpy density, pressure, 3-velocity and `W^2`.
    pub fn sound_speeds(&self, rho_h: Real, pgas: Real, vx: Real, lorentz_sq: Real) -> WaveSpeeds {
        sound_speeds(self.inverter.gamma, rho_h, pgas, vx, lorentz_sq)
    }

    fn recover_cell(&self, input: &CellInput, bcc: [Real; 3], magnetic: bool) -> CellRecovery {
        let frame = NormalFrame::flat(&input.cons, bcc);
        let (prim, status) = self.inverter.recover(
            &frame,
            &SpatialFrame::flat(),
            &self.floors,
            &input.prim_old,
            magnetic,
        );
        let cons = (status != RecoveryStatus::Converged)
            .then(|| conserved(&prim, bcc, self.inverter.gamma));
        CellRecovery { prim, cons, status }
    }
}

pub(crate) fn enthalpy_density(gamma: Real, prim: &[Real]) -> Real {
    prim[IDN] + gamma / (gamma - 1.0) * prim[IPR]
}

fn hydro_wave_speeds(gamma: Real, prim: &[Real], axis: Axis) -> WaveSpeeds {
    let u = [prim[IVX], prim[IVY], prim[IVZ]];
    let lorentz_sq = 1.0 + norm_sq3(u);
    let vx = u[axis.index()] / lorentz_sq.sqrt();
    sound_speeds(gamma, enthalpy_density(gamma, prim), prim[IPR], vx, lorentz_sq)
}

impl CellKernel for SrHydro {
    fn name(&self) -> &'static str {
        "special_relativistic"
    }

    fn nvar(&self) -> usize {
        5
    }

    fn recover(&self, input: &CellInput) -> CellRecovery {
        self.recover_cell(input, [0.0; 3], false)
    }

    fn conserve(&self, prim: &CellVector, _bcc: [Real; 3], _metric: &CellMetric) -> Option<CellVector> {
        Some(conserved(prim, [0.0; 3], self.inverter.gamma))
    }
}

impl EquationOfState for SrHydro {
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

    fn wave_speeds(&self, prim: &[Real], _bcc: [Real; 3], axis: Axis, _metric: &CellMetric) -> WaveSpeeds {
        hydro_wave_speeds(self.inverter.gamma, prim, axis)
    }

    /// Lab-frame energy density `rho h W^2 - p`.
    fn energy(&self, prim: &[Real]) -> Real {
        let gamma = self.inverter.gamma;
        let lorentz_sq = 1.0 + norm_sq3([prim[IVX], prim[IVY], prim[IVZ]]);
        enthalpy_density(gamma, prim) * lorentz_sq - prim[IPR]
    }

    fn is_relativistic(&self) -> bool {
        true
    }

    /// Comoving sound speed `sqrt(gamma p / (rho h))`.
    fn sound_speed(&self, prim: &[Real]) -> Real {
        let gamma = self.inverter.gamma;
        (gamma * prim[IPR] / enthalpy_density(gamma, prim)).sqrt()
    }

    fn entropy(&self, prim: &[Real]) -> Real {
        prim[IPR] * prim[IDN].powf(-self.inverter.gamma)
    }

    /// Specific enthalpy `1 + gamma / (gamma - 1) p / rho`.
    fn enthalpy(&self, prim: &[Real]) -> Real {
        enthalpy_density(self.inverter.gamma, prim) / prim[IDN]
    }

    fn density_floor(&self) -> Real {
        self.floors.density
    }

    fn pressure_floor(&self) -> Real {
        self.floors.pressure
    }

    fn gamma(&self) -> Real {
        self.inverter.gamma
    }
}

/// Special-relativistic ideal MHD.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SrMagnetoHydro {
    hydro: SrHydro,
}

impl SrMagnetoHydro {
    pub fn new(
        gamma: Real,
        floors: Floors,
        limits: RelativisticLimits,
        config: InversionConfig,
    ) -> EosResult<Self> {
        Ok(Self {
            hydro: SrHydro::new(gamma, floors, limits, config)?,
        })
    }

    pub fn limits(&self) -> &RelativisticLimits {
        self.hydro.limits()
    }

    /// Fast magnetosonic speeds over a pencil of interface states.
    ///
    /// `prim` is indexed `[variable][i]` with the transverse field in
    /// `IBY`/`IBZ`; `bbx` holds the field normal to the interface and `ivx`
    /// selects the normal velocity slot. Cells `il..=iu` are written.
    #[allow(clippy::too_many_arguments)]
    pub fn fast_magnetosonic_speeds(
        &self,
        prim: ArrayView2<Real>,
        bbx: ArrayView1<Real>,
        il: usize,
        iu: usize,
        ivx: usize,
        mut lambdas_p: ArrayViewMut1<Real>,
        mut lambdas_m: ArrayViewMut1<Real>,
    ) -> EosResult<()> {
        if !(IVX..=IVZ).contains(&ivx) {
            return Err(EosError::InvalidArg {
                what: format!("ivx must be one of IVX, IVY, IVZ, got {ivx}"),
            });
        }
        let len = prim.shape()[1];
        if prim.shape()[0] <= IBZ
            || iu >= len
            || iu >= bbx.len()
            || iu >= lambdas_p.len()
            || iu >= lambdas_m.len()
        {
            return Err(EosError::InvalidArg {
                what: format!("pencil arrays too short for il={il}, iu={iu}"),
            });
        }
        let n = ivx - IVX;
        let ivy = IVX + (n + 1) % 3;
        let ivz = IVX + (n + 2) % 3;
        let gamma = self.hydro.inverter.gamma;
        for i in il..=iu {
            let u = [prim[[ivx, i]], prim[[ivy, i]], prim[[ivz, i]]];
            let b = [bbx[i], prim[[IBY, i]], prim[[IBZ, i]]];
            let speeds = fast_magnetosonic_speeds(gamma, prim[[IDN, i]], prim[[IPR, i]], u, b, 0);
            lambdas_p[i] = speeds.lambda_plus;
            lambdas_m[i] = speeds.lambda_minus;
        }
        Ok(())
    }
}

impl CellKernel for SrMagnetoHydro {
    fn name(&self) -> &'static str {
        "special_relativistic_mhd"
    }

    fn nvar(&self) -> usize {
        5
    }

    fn is_magnetic(&self) -> bool {
        true
    }

    fn recover(&self, input: &CellInput) -> CellRecovery {
        self.hydro.recover_cell(input, input.bcc, true)
    }

    fn conserve(&self, prim: &CellVector, bcc: [Real; 3], _metric: &CellMetric) -> Option<CellVector> {
        Some(conserved(prim, bcc, self.hydro.inverter.gamma))
    }
}

impl EquationOfState for SrMagnetoHydro {
    fn name(&self) -> &'static str {
        CellKernel::name(self)
    }

    fn nvar(&self) -> usize {
        CellKernel::nvar(self)
    }

    fn is_magnetic(&self) -> bool {
        true
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

    fn wave_speeds(&self, prim: &[Real], bcc: [Real; 3], axis: Axis, _metric: &CellMetric) -> WaveSpeeds {
        let u = [prim[IVX], prim[IVY], prim[IVZ]];
        fast_magnetosonic_speeds(
            self.hydro.inverter.gamma,
            prim[IDN],
            prim[IPR],
            u,
            bcc,
            axis.index(),
        )
    }

    /// Lab-frame hydrodynamic energy density; the field contribution needs `bcc`.
    fn energy(&self, prim: &[Real]) -> Real {
        self.hydro.energy(prim)
    }

    fn is_relativistic(&self) -> bool {
        true
    }

    fn sound_speed(&self, prim: &[Real]) -> Real {
        self.hydro.sound_speed(prim)
    }

    fn entropy(&self, prim: &[Real]) -> Real {
        self.hydro.entropy(prim)
    }

    fn enthalpy(&self, prim: &[Real]) -> Real {
        self.hydro.enthalpy(prim)
    }

    fn density_floor(&self) -> Real {
        self.hydro.floors.density
    }

    fn pressure_floor(&self) -> Real {
        self.hydro.floors.pressure
    }

    fn gamma(&self) -> Real {
        self.hydro.inverter.gamma
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recovery::FallbackReason;
    use crate::spacetime::Minkowski;
    use eos_core::BlockShape;
    use ndarray::{Array1, Array2};

    fn prim(rho: Real, pgas: Real, u: [Real; 3]) -> CellVector {
        let mut p = [0.0; NVAR_MAX];
        p[IDN] = rho;
        p[IPR] = pgas;
        p[IVX] = u[0];
        p[IVY] = u[1];
        p[IVZ] = u[2];
        p
    }

    fn hydro() -> SrHydro {
        SrHydro::new(
            4.0 / 3.0,
            Floors::default(),
            RelativisticLimits::default(),
            InversionConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn rest_state_conserved() {
        let cons = conserved(&prim(2.0, 0.3, [0.0; 3]), [0.0; 3], 4.0 / 3.0);
        assert_eq!(cons[IDN], 2.0);
        assert!((cons[IEN] - (2.0 + 3.0 * 0.3)).abs() < 1e-15);
        assert_eq!(cons[IM1], 0.0);
    }

    #[test]
    fn sound_speeds_at_rest_are_symmetric() {
        let eos = hydro();
        let rho_h = 1.0 + 4.0 * 0.25;
        let speeds = eos.sound_speeds(rho_h, 0.25, 0.0, 1.0);
        let cs = (4.0 / 3.0 * 0.25 / rho_h).sqrt();
        assert!((speeds.lambda_plus - cs).abs() < 1e-14);
        assert!((speeds.lambda_minus + cs).abs() < 1e-14);
    }

    #[test]
    fn speeds_stay_subluminal_at_high_lorentz_factor() {
        let eos = hydro();
        let p = prim(1.0, 10.0, [50.0, 0.0, 0.0]);
        let speeds = eos.wave_speeds(&p, [0.0; 3], Axis::X1, &CellMetric::minkowski());
        assert!(speeds.lambda_plus < 1.0 && speeds.lambda_minus > -1.0);
        assert!(speeds.lambda_minus < speeds.lambda_plus);
    }

    #[test]
    fn block_round_trip() {
        let eos = hydro();
        let shape = BlockShape::new(1, 2, 2);
        let mut block = BlockState::new(5, shape);
        for (n, value) in prim(1.5, 0.7, [1.0, -2.0, 0.3]).iter().enumerate().take(5) {
            block.prim.index_axis_mut(ndarray::Axis(0), n).fill(*value);
        }
        let range = IndexRange::whole(shape);
        eos.primitive_to_conserved(&mut block, &Minkowski, range).unwrap();
        let cons = block.cons.clone();
        block.prim.fill(0.0);
        let report = eos.conserved_to_primitive(&mut block, &Minkowski, range).unwrap();
        assert!(report.is_clean());
        assert!((block.prim[[IPR, 0, 1, 1]] - 0.7).abs() < 1e-10);
        assert!((block.prim[[IVY, 0, 0, 1]] + 2.0).abs() < 1e-10);
        assert_eq!(block.cons, cons);
    }

    #[test]
    fn nan_cell_falls_back_without_fixed_marker() {
        let eos = hydro();
        let mut block = BlockState::new(5, BlockShape::new(1, 1, 1));
        block.cons[[IDN, 0, 0, 0]] = Real::NAN;
        let range = IndexRange::whole(block.shape);
        let report = eos.conserved_to_primitive(&mut block, &Minkowski, range).unwrap();
        assert_eq!(report.fallbacks, 1);
        assert_eq!(report.fallback_cells[0].1, FallbackReason::NonFiniteInput);
        assert_eq!(report.fixed_cells, 0);
        assert!(block.cons[[IDN, 0, 0, 0]].is_finite());
        assert_eq!(block.prim[[IDN, 0, 0, 0]], Floors::default().density);
    }

    #[test]
    fn cold_magnetized_cell_is_raised_to_beta_floor() {
        let limits = RelativisticLimits::new(1000.0, Real::INFINITY, 0.1).unwrap();
        let eos = SrMagnetoHydro::new(4.0 / 3.0, Floors::default(), limits, InversionConfig::default())
            .unwrap();
        let b = [0.0, 1.0, 0.0];
        let cons = conserved(&prim(1.0, 1e-4, [0.0; 3]), b, 4.0 / 3.0);
        let input = CellInput {
            index: eos_core::CellIndex { k: 0, j: 0, i: 0 },
            cons,
            prim_old: [0.0; NVAR_MAX],
            bcc: b,
            metric: CellMetric::minkowski(),
            floor_scale: 1.0,
        };
        let out = CellKernel::recover(&eos, &input);
        assert!(matches!(out.status, RecoveryStatus::Adjusted(a) if a.beta_limit && !a.sigma_limit));
        assert!(!out.status.needs_fix());
        let u = [out.prim[IVX], out.prim[IVY], out.prim[IVZ]];
        let b_sq = (norm_sq3(b) + dot3(b, u).powi(2)) / (1.0 + norm_sq3(u));
        assert!((out.prim[IPR] - 0.05 * b_sq).abs() < 1e-12);
        assert!(out.cons.is_some());

        let shape = BlockShape::new(1, 1, 1);
        let mut block = BlockState::new(5, shape);
        block.field = eos_core::FaceField::uniform(shape, b);
        for (n, value) in cons.iter().enumerate().take(5) {
            block.cons[[n, 0, 0, 0]] = *value;
        }
        let report = eos
            .conserved_to_primitive(&mut block, &Minkowski, IndexRange::whole(shape))
            .unwrap();
        assert_eq!(report.limited, 1);
        assert_eq!(report.fixed_cells, 0);
        assert!(!block.fixed[[0, 0, 0]]);
    }

    #[test]
    fn quartic_reduces_to_hydro_without_field() {
        let gamma = 4.0 / 3.0;
        let u = [0.4, 0.2, 0.0];
        let fast = fast_magnetosonic_speeds(gamma, 1.0, 0.5, u, [0.0; 3], 0);
        let lorentz_sq: Real = 1.0 + 0.2;
        let rho_h = 1.0 + 4.0 * 0.5;
        let hydro = sound_speeds(gamma, rho_h, 0.5, 0.4 / lorentz_sq.sqrt(), lorentz_sq);
        assert!((fast.lambda_plus - hydro.lambda_plus).abs() < 1e-10);
        assert!((fast.lambda_minus - hydro.lambda_minus).abs() < 1e-10);
    }

    #[test]
    fn pencil_matches_cell_query() {
        let eos = SrMagnetoHydro::new(
            5.0 / 3.0,
            Floors::default(),
            RelativisticLimits::default(),
            InversionConfig::default(),
        )
        .unwrap();
        let mut pencil = Array2::zeros((7, 3));
        for i in 0..3 {
            pencil[[IDN, i]] = 1.0;
            pencil[[IPR, i]] = 0.2;
            pencil[[IVY, i]] = 0.1 * i as Real;
            pencil[[IBY, i]] = 0.5;
        }
        let bbx = Array1::from_elem(3, 0.8);
        let mut lp = Array1::zeros(3);
        let mut lm = Array1::zeros(3);
        eos.fast_magnetosonic_speeds(pencil.view(), bbx.view(), 0, 2, IVY, lp.view_mut(), lm.view_mut())
            .unwrap();
        // Normal is y: transverse order is (z, x), so IBY is B^z and IBZ is B^x.
        let cell = prim(1.0, 0.2, [0.0, 0.2, 0.0]);
        let speeds = eos.wave_speeds(&cell, [0.0, 0.8, 0.5], Axis::X2, &CellMetric::minkowski());
        assert!((lp[2] - speeds.lambda_plus).abs() < 1e-12);
        assert!((lm[2] - speeds.lambda_minus).abs() < 1e-12);
        assert!(eos
            .fast_magnetosonic_speeds(pencil.view(), bbx.view(), 0, 3, IVX, lp.view_mut(), lm.view_mut())
            .is_err());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn fast_speeds_bracket_sound_speeds(
            rho in 1e-2_f64..1e2,
            pgas in 1e-3_f64..1e1,
            ux in -5.0_f64..5.0,
            uy in -5.0_f64..5.0,
            bx in -3.0_f64..3.0,
            by in -3.0_f64..3.0,
        ) {
            let gamma = 4.0 / 3.0;
            let u = [ux, uy, 0.0];
            let b = [bx, by, 0.0];
            let fast = fast_magnetosonic_speeds(gamma, rho, pgas, u, b, 0);
            let lorentz_sq = 1.0 + ux * ux + uy * uy;
            let rho_h = rho + 4.0 * pgas;
            let sound = sound_speeds(gamma, rho_h, pgas, ux / lorentz_sq.sqrt(), lorentz_sq);
            prop_assert!(fast.lambda_plus <= 1.0 && fast.lambda_minus >= -1.0);
            prop_assert!(fast.lambda_plus >= sound.lambda_plus - 1e-9);
            prop_assert!(fast.lambda_minus <= sound.lambda_minus + 1e-9);
        }

        #[test]
        fn mhd_round_trip(
            rho in 1e-1_f64..1e1,
            pgas in 1e-2_f64..1e1,
            ux in -3.0_f64..3.0,
            uy in -3.0_f64..3.0,
            bx in -2.0_f64..2.0,
            bz in -2.0_f64..2.0,
        ) {
            let eos = SrMagnetoHydro::new(
                5.0 / 3.0,
                Floors::default(),
                RelativisticLimits::default(),
                InversionConfig::default(),
            )
            .unwrap();
            let mut p = [0.0; NVAR_MAX];
            p[IDN] = rho;
            p[IPR] = pgas;
            p[IVX] = ux;
            p[IVY] = uy;
            let bcc = [bx, 0.0, bz];
            let cons = conserved(&p, bcc, 5.0 / 3.0);
            let input = CellInput {
                index: eos_core::CellIndex { k: 0, j: 0, i: 0 },
                cons,
                prim_old: [0.0; NVAR_MAX],
                bcc,
                metric: CellMetric::minkowski(),
                floor_scale: 1.0,
            };
            let out = CellKernel::recover(&eos, &input);
            prop_assert_eq!(out.status, RecoveryStatus::Converged);
            prop_assert!((out.prim[IDN] - rho).abs() <= 1e-7 * rho);
            prop_assert!((out.prim[IPR] - pgas).abs() <= 1e-6 * (pgas + rho));
            prop_assert!((out.prim[IVX] - ux).abs() <= 1e-6 * (1.0 + ux.abs()));
        }
    }
}
