//! General-relativistic hydrodynamics and MHD on a supplied metric.
//!
//! Primitives carry `(rho, u~^i, p)` where `u~^i` is the spatial 4-velocity
//! seen by the normal observer. Conserved variables are `D = rho u^0`,
//! `E = T^0_0` and `M_i = T^0_i`. Inversion happens in the normal frame;
//! cells that fall back or hit a Lorentz, magnetization or beta limiter are
//! marked in `BlockState::fixed`.

use super::sr::enthalpy_density;
use super::{Inverter, NormalFrame, magnetosonic_sq, quadratic_speeds};
use crate::block::{self, CellKernel};
use crate::error::EosResult;
use crate::floors::{Floors, PowerLawFloor};
use crate::model::validation::validate_gamma;
use crate::model::{EquationOfState, WaveSpeeds};
use crate::recovery::{CellInput, CellRecovery, ConversionReport, FallbackReason, RecoveryStatus};
use crate::settings::{InversionConfig, RelativisticLimits};
use crate::spacetime::{CellMetric, SpatialFrame, Spacetime};
use eos_core::{
    Axis, BlockState, CellVector, IDN, IEN, IM1, IPR, IVX, IVZ, IndexRange, NVAR_MAX, Real,
};
use nalgebra::{Vector3, Vector4};

/// Coordinate 4-velocity `u^mu` of a primitive state.
fn coordinate_velocity(prim: &[Real], spatial: &SpatialFrame) -> Vector4<Real> {
    let u_tilde = Vector3::new(prim[IVX], prim[IVX + 1], prim[IVZ]);
    let lorentz = spatial.lorentz(&u_tilde);
    let u_sp = u_tilde - lorentz * spatial.beta_u / spatial.alpha;
    Vector4::new(lorentz / spatial.alpha, u_sp[0], u_sp[1], u_sp[2])
}

/// Comoving field `b^mu` from the coordinate field and `u^mu`.
fn comoving_field(bcc: [Real; 3], u_up: &Vector4<Real>, metric: &CellMetric) -> Vector4<Real> {
    let u_dn = metric.g * u_up;
    let b = Vector3::from(bcc);
    let b0 = b[0] * u_dn[1] + b[1] * u_dn[2] + b[2] * u_dn[3];
    Vector4::new(
        b0,
        (b[0] + b0 * u_up[1]) / u_up[0],
        (b[1] + b0 * u_up[2]) / u_up[0],
        (b[2] + b0 * u_up[3]) / u_up[0],
    )
}

/// Coordinate conserved variables `(rho u^0, T^0_0, T^0_i)` of a primitive state.
pub fn conserved(prim: &CellVector, bcc: [Real; 3], metric: &CellMetric, gamma: Real) -> Option<CellVector> {
    let spatial = metric.spatial_frame()?;
    let u_up = coordinate_velocity(prim, &spatial);
    let u_dn = metric.g * u_up;
    let b_up = comoving_field(bcc, &u_up, metric);
    let b_dn = metric.g * b_up;
    let b_sq = b_up.dot(&b_dn);

    let w_tot = enthalpy_density(gamma, prim) + b_sq;
    let p_tot = prim[IPR] + 0.5 * b_sq;
    let t0 = |mu: usize| {
        let delta = if mu == 0 { p_tot } else { 0.0 };
        w_tot * u_up[0] * u_dn[mu] + delta - b_up[0] * b_dn[mu]
    };

    let mut cons = [0.0; NVAR_MAX];
    cons[IDN] = prim[IDN] * u_up[0];
    cons[IEN] = t0(0);
    for i in 0..3 {
        cons[IM1 + i] = t0(i + 1);
    }
    Some(cons)
}

/// Hydrodynamic characteristic speeds along one coordinate direction.
///
/// `u0`, `u1` are the time and normal components of the coordinate
/// 4-velocity; `g00`, `g01`, `g11` the matching inverse-metric components.
#[allow(clippy::too_many_arguments)]
pub fn sound_speeds(
    gamma: Real,
    rho_h: Real,
    pgas: Real,
    u0: Real,
    u1: Real,
    g00: Real,
    g01: Real,
    g11: Real,
) -> WaveSpeeds {
    let cs_sq = gamma * pgas / rho_h;
    speeds_for(cs_sq, u0, u1, g00, g01, g11)
}

/// Fast magnetosonic speeds: the hydrodynamic quadratic with the comoving
/// magnetosonic speed in place of the sound speed.
#[allow(clippy::too_many_arguments)]
pub fn fast_magnetosonic_speeds(
    gamma: Real,
    rho_h: Real,
    pgas: Real,
    u0: Real,
    u1: Real,
    b_sq: Real,
    g00: Real,
    g01: Real,
    g11: Real,
) -> WaveSpeeds {
    let cs_sq = gamma * pgas / rho_h;
    speeds_for(magnetosonic_sq(cs_sq, b_sq, rho_h), u0, u1, g00, g01, g11)
}

fn speeds_for(c_sq: Real, u0: Real, u1: Real, g00: Real, g01: Real, g11: Real) -> WaveSpeeds {
    let a = u0 * u0 - (g00 + u0 * u0) * c_sq;
    let b = -2.0 * (u0 * u1 - (g01 + u0 * u1) * c_sq);
    let c = u1 * u1 - (g11 + u1 * u1) * c_sq;
    let (lambda_minus, lambda_plus) = quadratic_speeds(b / a, c / a);
    WaveSpeeds::new(lambda_minus, lambda_plus)
}

/// General-relativistic hydrodynamics.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GrHydro {
    floors: Floors,
    rho_floor: PowerLawFloor,
    pgas_floor: PowerLawFloor,
    inverter: Inverter,
}

impl GrHydro {
    pub fn new(
        gamma: Real,
        floors: Floors,
        rho_floor: PowerLawFloor,
        pgas_floor: PowerLawFloor,
        limits: RelativisticLimits,
        config: InversionConfig,
    ) -> EosResult<Self> {
        validate_gamma(gamma)?;
        Ok(Self {
            floors,
            rho_floor,
            pgas_floor,
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

    /// Density and pressure floors at a radial-like scale.
    pub fn floors_at(&self, scale: Real) -> Floors {
        Floors {
            density: self.rho_floor.value(self.floors.density, scale),
            pressure: self.pgas_floor.value(self.floors.pressure, scale),
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn sound_speeds(
        &self,
        rho_h: Real,
        pgas: Real,
        u0: Real,
        u1: Real,
        g00: Real,
        g01: Real,
        g11: Real,
    ) -> WaveSpeeds {
        sound_speeds(self.inverter.gamma, rho_h, pgas, u0, u1, g00, g01, g11)
    }

    fn recover_cell(&self, input: &CellInput, bcc: [Real; 3], magnetic: bool) -> CellRecovery {
        let floors = self.floors_at(input.floor_scale);
        let Some(spatial) = input.metric.spatial_frame() else {
            let mut prim = [0.0; NVAR_MAX];
            prim[IDN] = floors.density;
            prim[IPR] = floors.pressure;
            return CellRecovery {
                prim,
                cons: None,
                status: RecoveryStatus::Fallback(FallbackReason::DegenerateMetric),
            };
        };
        let frame = NormalFrame::curved(&input.cons, bcc, &spatial);
        let (prim, status) =
            self.inverter
                .recover(&frame, &spatial, &floors, &input.prim_old, magnetic);
        let cons = if status == RecoveryStatus::Converged {
            None
        } else {
            conserved(&prim, bcc, &input.metric, self.inverter.gamma)
        };
        CellRecovery { prim, cons, status }
    }

    fn speeds(&self, prim: &[Real], bcc: Option<[Real; 3]>, axis: Axis, metric: &CellMetric) -> WaveSpeeds {
        let Some(spatial) = metric.spatial_frame() else {
            return WaveSpeeds::default();
        };
        let gamma = self.inverter.gamma;
        let n = axis.index() + 1;
        let u_up = coordinate_velocity(prim, &spatial);
        let rho_h = enthalpy_density(gamma, prim);
        let (g00, g01, g11) = (metric.g_inv[(0, 0)], metric.g_inv[(0, n)], metric.g_inv[(n, n)]);
        match bcc {
            Some(bcc) => {
                let b_up = comoving_field(bcc, &u_up, metric);
                let b_sq = b_up.dot(&(metric.g * b_up));
                fast_magnetosonic_speeds(gamma, rho_h, prim[IPR], u_up[0], u_up[n], b_sq, g00, g01, g11)
            }
            None => sound_speeds(gamma, rho_h, prim[IPR], u_up[0], u_up[n], g00, g01, g11),
        }
    }

    /// Energy density `rho h W^2 - p` seen by the normal observer of `metric`,
    /// with `W^2 = 1 + gamma_ij u^i u^j`. Zero where the metric has no normal frame.
    pub fn normal_energy(&self, prim: &[Real], metric: &CellMetric) -> Real {
        let Some(spatial) = metric.spatial_frame() else {
            return 0.0;
        };
        let u = Vector3::new(prim[IVX], prim[IVX + 1], prim[IVZ]);
        let lorentz_sq = 1.0 + spatial.norm_sq_u(&u);
        enthalpy_density(self.inverter.gamma, prim) * lorentz_sq - prim[IPR]
    }
}

impl CellKernel for GrHydro {
    fn name(&self) -> &'static str {
        "general_relativistic"
    }

    fn nvar(&self) -> usize {
        5
    }

    fn needs_metric(&self) -> bool {
        true
    }

    fn tracks_fixed(&self) -> bool {
        true
    }

    fn recover(&self, input: &CellInput) -> CellRecovery {
        self.recover_cell(input, [0.0; 3], false)
    }

    fn conserve(&self, prim: &CellVector, _bcc: [Real; 3], metric: &CellMetric) -> Option<CellVector> {
        conserved(prim, [0.0; 3], metric, self.inverter.gamma)
    }
}

impl EquationOfState for GrHydro {
    fn name(&self) -> &'static str {
        CellKernel::name(self)
    }

    fn nvar(&self) -> usize {
        CellKernel::nvar(self)
    }

    fn is_relativistic(&self) -> bool {
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

    fn sound_speed(&self, prim: &[Real]) -> Real {
        let gamma = self.inverter.gamma;
        (gamma * prim[IPR] / enthalpy_density(gamma, prim)).sqrt()
    }

    fn wave_speeds(&self, prim: &[Real], _bcc: [Real; 3], axis: Axis, metric: &CellMetric) -> WaveSpeeds {
        self.speeds(prim, None, axis, metric)
    }

    fn entropy(&self, prim: &[Real]) -> Real {
        prim[IPR] * prim[IDN].powf(-self.inverter.gamma)
    }

    /// Normal-frame energy density in flat spacetime; see [`GrHydro::normal_energy`].
    fn energy(&self, prim: &[Real]) -> Real {
        self.normal_energy(prim, &CellMetric::minkowski())
    }

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

/// General-relativistic ideal MHD.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GrMagnetoHydro {
    hydro: GrHydro,
}

impl GrMagnetoHydro {
    pub fn new(
        gamma: Real,
        floors: Floors,
        rho_floor: PowerLawFloor,
        pgas_floor: PowerLawFloor,
        limits: RelativisticLimits,
        config: InversionConfig,
    ) -> EosResult<Self> {
        Ok(Self {
            hydro: GrHydro::new(gamma, floors, rho_floor, pgas_floor, limits, config)?,
        })
    }

    pub fn limits(&self) -> &RelativisticLimits {
        self.hydro.limits()
    }

    pub fn floors_at(&self, scale: Real) -> Floors {
        self.hydro.floors_at(scale)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn fast_magnetosonic_speeds(
        &self,
        rho_h: Real,
        pgas: Real,
        u0: Real,
        u1: Real,
        b_sq: Real,
        g00: Real,
        g01: Real,
        g11: Real,
    ) -> WaveSpeeds {
        fast_magnetosonic_speeds(
            self.hydro.inverter.gamma,
            rho_h,
            pgas,
            u0,
            u1,
            b_sq,
            g00,
            g01,
            g11,
        )
    }
}

impl CellKernel for GrMagnetoHydro {
    fn name(&self) -> &'static str {
        "general_relativistic_mhd"
    }

    fn nvar(&self) -> usize {
        5
    }

    fn is_magnetic(&self) -> bool {
        true
    }

    fn needs_metric(&self) -> bool {
        true
    }

    fn tracks_fixed(&self) -> bool {
        true
    }

    fn recover(&self, input: &CellInput) -> CellRecovery {
        self.hydro.recover_cell(input, input.bcc, true)
    }

    fn conserve(&self, prim: &CellVector, bcc: [Real; 3], metric: &CellMetric) -> Option<CellVector> {
        conserved(prim, bcc, metric, self.hydro.inverter.gamma)
    }
}

impl EquationOfState for GrMagnetoHydro {
    fn name(&self) -> &'static str {
        CellKernel::name(self)
    }

    fn nvar(&self) -> usize {
        CellKernel::nvar(self)
    }

    fn is_magnetic(&self) -> bool {
        true
    }

    fn is_relativistic(&self) -> bool {
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

    fn sound_speed(&self, prim: &[Real]) -> Real {
        self.hydro.sound_speed(prim)
    }

    fn wave_speeds(&self, prim: &[Real], bcc: [Real; 3], axis: Axis, metric: &CellMetric) -> WaveSpeeds {
        self.hydro.speeds(prim, Some(bcc), axis, metric)
    }

    fn entropy(&self, prim: &[Real]) -> Real {
        self.hydro.entropy(prim)
    }

    fn energy(&self, prim: &[Real]) -> Real {
        self.hydro.energy(prim)
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
