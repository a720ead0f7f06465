//! Non-relativistic adiabatic and isothermal gases, with and without field.
//!
//! Every conversion here is closed form. Density is floored in the conserved
//! vector itself, so velocity is always `momentum / floored density`; a
//! floored pressure rewrites the total energy to match.

use crate::block::{self, CellKernel};
use crate::error::EosResult;
use crate::floors::Floors;
use crate::model::validation::{validate_gamma, validate_non_negative};
use crate::model::{EquationOfState, WaveSpeeds};
use crate::recovery::{Adjustments, CellInput, CellRecovery, ConversionReport, RecoveryStatus};
use crate::spacetime::{CellMetric, Spacetime};
use eos_core::{
    Axis, BlockState, CellVector, IBY, IBZ, IDN, IEN, IM1, IM2, IM3, IPR, IVX, IVY, IVZ,
    IndexRange, NVAR_MAX, NWAVE, Real, norm_sq3, sqr,
};

/// Fast magnetosonic speed from the squared sound speed times density.
///
/// `asq` is `gamma * p` (adiabatic) or `iso_cs^2 * rho` (isothermal).
pub fn fast_speed(asq: Real, rho: Real, bx: Real, by: Real, bz: Real) -> Real {
    let ct2 = by * by + bz * bz;
    let qsq = bx * bx + ct2 + asq;
    let tmp = bx * bx + ct2 - asq;
    (0.5 * (qsq + (tmp * tmp + 4.0 * asq * ct2).sqrt()) / rho).sqrt()
}

/// Transverse field slots of a wave vector; zero when the slice is a bare primitive.
fn transverse_field(w: &[Real]) -> (Real, Real) {
    let slot = |n: usize| w.get(n).copied().unwrap_or(0.0);
    (slot(IBY), slot(IBZ))
}

/// Rotate a primitive state and cell field into an interface wave vector
/// normal to `axis`. Returns the vector and the normal field.
pub fn wave_vector(prim: &[Real], bcc: [Real; 3], axis: Axis, has_pressure: bool) -> ([Real; NWAVE], Real) {
    let n = axis.index();
    let (t1, t2) = axis.transverse();
    let mut w = [0.0; NWAVE];
    w[IDN] = prim[IDN];
    w[IVX] = prim[IVX + n];
    w[IVY] = prim[IVX + t1];
    w[IVZ] = prim[IVX + t2];
    if has_pressure {
        w[IPR] = prim[IPR];
    }
    w[IBY] = bcc[t1];
    w[IBZ] = bcc[t2];
    (w, bcc[n])
}

fn floor_density(cons: &mut CellVector, floors: &Floors, adj: &mut Adjustments) {
    let rho = floors.density(cons[IDN]);
    if rho != cons[IDN] {
        cons[IDN] = rho;
        adj.density_floor = true;
    }
}

fn velocity(cons: &CellVector, prim: &mut CellVector) -> Real {
    let di = 1.0 / cons[IDN];
    prim[IDN] = cons[IDN];
    prim[IVX] = cons[IM1] * di;
    prim[IVY] = cons[IM2] * di;
    prim[IVZ] = cons[IM3] * di;
    0.5 * di * (sqr(cons[IM1]) + sqr(cons[IM2]) + sqr(cons[IM3]))
}

fn momentum(prim: &CellVector, cons: &mut CellVector) -> Real {
    let rho = prim[IDN];
    cons[IDN] = rho;
    cons[IM1] = rho * prim[IVX];
    cons[IM2] = rho * prim[IVY];
    cons[IM3] = rho * prim[IVZ];
    0.5 * rho * (sqr(prim[IVX]) + sqr(prim[IVY]) + sqr(prim[IVZ]))
}

fn finish(prim: CellVector, cons: CellVector, adj: Adjustments) -> CellRecovery {
    CellRecovery {
        prim,
        cons: adj.any().then_some(cons),
        status: RecoveryStatus::from_adjustments(adj),
    }
}

/// Ideal-gas closure shared by the adiabatic variants.
#[derive(Clone, Copy, Debug, PartialEq)]
struct IdealGas {
    gamma: Real,
    floors: Floors,
}

impl IdealGas {
    fn new(gamma: Real, floors: Floors) -> EosResult<Self> {
        validate_gamma(gamma)?;
        Ok(Self { gamma, floors })
    }

    fn recover(&self, input: &CellInput, magnetic: bool) -> CellRecovery {
        let gm1 = self.gamma - 1.0;
        let mut cons = input.cons;
        let mut prim = [0.0; NVAR_MAX];
        let mut adj = Adjustments::default();

        floor_density(&mut cons, &self.floors, &mut adj);
        let e_k = velocity(&cons, &mut prim);
        let e_b = if magnetic { 0.5 * norm_sq3(input.bcc) } else { 0.0 };

        let pgas = gm1 * (cons[IEN] - e_k - e_b);
        prim[IPR] = self.floors.pressure(pgas);
        if prim[IPR] != pgas {
            cons[IEN] = prim[IPR] / gm1 + e_k + e_b;
            adj.pressure_floor = true;
        }
        finish(prim, cons, adj)
    }

    fn conserve(&self, prim: &CellVector, bcc: [Real; 3], magnetic: bool) -> CellVector {
        let mut cons = [0.0; NVAR_MAX];
        let e_k = momentum(prim, &mut cons);
        let e_b = if magnetic { 0.5 * norm_sq3(bcc) } else { 0.0 };
        cons[IEN] = prim[IPR] / (self.gamma - 1.0) + e_k + e_b;
        cons
    }

    fn sound_speed(&self, prim: &[Real]) -> Real {
        (self.gamma * prim[IPR] / prim[IDN]).sqrt()
    }

    fn entropy(&self, prim: &[Real]) -> Real {
        prim[IPR] * prim[IDN].powf(-self.gamma)
    }

    fn energy(&self, prim: &[Real]) -> Real {
        prim[IPR] / (self.gamma - 1.0)
            + 0.5 * prim[IDN] * (sqr(prim[IVX]) + sqr(prim[IVY]) + sqr(prim[IVZ]))
    }

    fn enthalpy(&self, prim: &[Real]) -> Real {
        self.gamma / (self.gamma - 1.0) * prim[IPR] / prim[IDN]
    }
}

/// Adiabatic hydrodynamics: `p = (gamma - 1) (E - rho v^2 / 2)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AdiabaticHydro {
    gas: IdealGas,
}

impl AdiabaticHydro {
    pub fn new(gamma: Real, floors: Floors) -> EosResult<Self> {
        Ok(Self {
            gas: IdealGas::new(gamma, floors)?,
        })
    }
}

impl CellKernel for AdiabaticHydro {
    fn name(&self) -> &'static str {
        "adiabatic"
    }

    fn nvar(&self) -> usize {
        5
    }

    fn recover(&self, input: &CellInput) -> CellRecovery {
        self.gas.recover(input, false)
    }

    fn conserve(&self, prim: &CellVector, bcc: [Real; 3], _metric: &CellMetric) -> Option<CellVector> {
        Some(self.gas.conserve(prim, bcc, false))
    }
}

impl EquationOfState for AdiabaticHydro {
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
        self.gas.sound_speed(prim)
    }

    fn wave_speeds(&self, prim: &[Real], bcc: [Real; 3], axis: Axis, _metric: &CellMetric) -> WaveSpeeds {
        let (w, _) = wave_vector(prim, bcc, axis, true);
        WaveSpeeds::symmetric(w[IVX], self.gas.sound_speed(&w))
    }

    fn entropy(&self, prim: &[Real]) -> Real {
        self.gas.entropy(prim)
    }

    fn energy(&self, prim: &[Real]) -> Real {
        self.gas.energy(prim)
    }

    fn enthalpy(&self, prim: &[Real]) -> Real {
        self.gas.enthalpy(prim)
    }

    fn density_floor(&self) -> Real {
        self.gas.floors.density
    }

    fn pressure_floor(&self) -> Real {
        self.gas.floors.pressure
    }

    fn gamma(&self) -> Real {
        self.gas.gamma
    }
}

/// Adiabatic ideal MHD; total energy includes `B^2 / 2`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MagnetoAdiabaticHydro {
    gas: IdealGas,
}

impl MagnetoAdiabaticHydro {
    pub fn new(gamma: Real, floors: Floors) -> EosResult<Self> {
        Ok(Self {
            gas: IdealGas::new(gamma, floors)?,
        })
    }
}

impl CellKernel for MagnetoAdiabaticHydro {
    fn name(&self) -> &'static str {
        "adiabatic_mhd"
    }

    fn nvar(&self) -> usize {
        5
    }

    fn is_magnetic(&self) -> bool {
        true
    }

    fn recover(&self, input: &CellInput) -> CellRecovery {
        self.gas.recover(input, true)
    }

    fn conserve(&self, prim: &CellVector, bcc: [Real; 3], _metric: &CellMetric) -> Option<CellVector> {
        Some(self.gas.conserve(prim, bcc, true))
    }
}

impl EquationOfState for MagnetoAdiabaticHydro {
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

    fn sound_speed(&self, prim: &[Real]) -> Real {
        self.gas.sound_speed(prim)
    }

    fn fast_magnetosonic_speed(&self, prim: &[Real], bx: Real) -> Real {
        let asq = self.gas.gamma * prim[IPR];
        let (by, bz) = transverse_field(prim);
        fast_speed(asq, prim[IDN], bx, by, bz)
    }

    fn wave_speeds(&self, prim: &[Real], bcc: [Real; 3], axis: Axis, _metric: &CellMetric) -> WaveSpeeds {
        let (w, bx) = wave_vector(prim, bcc, axis, true);
        WaveSpeeds::symmetric(w[IVX], self.fast_magnetosonic_speed(&w, bx))
    }

    fn entropy(&self, prim: &[Real]) -> Real {
        self.gas.entropy(prim)
    }

    fn energy(&self, prim: &[Real]) -> Real {
        self.gas.energy(prim)
    }

    fn enthalpy(&self, prim: &[Real]) -> Real {
        self.gas.enthalpy(prim)
    }

    fn density_floor(&self) -> Real {
        self.gas.floors.density
    }

    fn pressure_floor(&self) -> Real {
        self.gas.floors.pressure
    }

    fn gamma(&self) -> Real {
        self.gas.gamma
    }
}

/// Isothermal hydrodynamics: no energy equation, `p = cs^2 rho`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IsothermalHydro {
    iso_sound_speed: Real,
    floors: Floors,
}

impl IsothermalHydro {
    pub fn new(iso_sound_speed: Real, floors: Floors) -> EosResult<Self> {
        validate_non_negative("iso_sound_speed", iso_sound_speed)?;
        Ok(Self {
            iso_sound_speed,
            floors,
        })
    }

    /// The fixed isothermal sound speed.
    pub fn iso_sound_speed(&self) -> Real {
        self.iso_sound_speed
    }

    fn recover_cell(&self, input: &CellInput) -> CellRecovery {
        let mut cons = input.cons;
        let mut prim = [0.0; NVAR_MAX];
        let mut adj = Adjustments::default();
        floor_density(&mut cons, &self.floors, &mut adj);
        velocity(&cons, &mut prim);
        finish(prim, cons, adj)
    }

    fn conserve_cell(&self, prim: &CellVector) -> CellVector {
        let mut cons = [0.0; NVAR_MAX];
        momentum(prim, &mut cons);
        cons
    }
}

impl CellKernel for IsothermalHydro {
    fn name(&self) -> &'static str {
        "isothermal"
    }

    fn nvar(&self) -> usize {
        4
    }

    fn recover(&self, input: &CellInput) -> CellRecovery {
        self.recover_cell(input)
    }

    fn conserve(&self, prim: &CellVector, _bcc: [Real; 3], _metric: &CellMetric) -> Option<CellVector> {
        Some(self.conserve_cell(prim))
    }
}

impl EquationOfState for IsothermalHydro {
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

    fn sound_speed(&self, _prim: &[Real]) -> Real {
        self.iso_sound_speed
    }

    fn wave_speeds(&self, prim: &[Real], _bcc: [Real; 3], axis: Axis, _metric: &CellMetric) -> WaveSpeeds {
        WaveSpeeds::symmetric(prim[IVX + axis.index()], self.iso_sound_speed)
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

/// Isothermal ideal MHD.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MagnetoIsothermalHydro {
    hydro: IsothermalHydro,
}

impl MagnetoIsothermalHydro {
    pub fn new(iso_sound_speed: Real, floors: Floors) -> EosResult<Self> {
        Ok(Self {
            hydro: IsothermalHydro::new(iso_sound_speed, floors)?,
        })
    }

    pub fn iso_sound_speed(&self) -> Real {
        self.hydro.iso_sound_speed
    }
}

impl CellKernel for MagnetoIsothermalHydro {
    fn name(&self) -> &'static str {
        "isothermal_mhd"
    }

    fn nvar(&self) -> usize {
        4
    }

    fn is_magnetic(&self) -> bool {
        true
    }

    fn recover(&self, input: &CellInput) -> CellRecovery {
        self.hydro.recover_cell(input)
    }

    fn conserve(&self, prim: &CellVector, _bcc: [Real; 3], _metric: &CellMetric) -> Option<CellVector> {
        Some(self.hydro.conserve_cell(prim))
    }
}

impl EquationOfState for MagnetoIsothermalHydro {
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

    fn sound_speed(&self, _prim: &[Real]) -> Real {
        self.hydro.iso_sound_speed
    }

    fn fast_magnetosonic_speed(&self, prim: &[Real], bx: Real) -> Real {
        let asq = sqr(self.hydro.iso_sound_speed) * prim[IDN];
        let (by, bz) = transverse_field(prim);
        fast_speed(asq, prim[IDN], bx, by, bz)
    }

    fn wave_speeds(&self, prim: &[Real], bcc: [Real; 3], axis: Axis, _metric: &CellMetric) -> WaveSpeeds {
        let (w, bx) = wave_vector(prim, bcc, axis, false);
        WaveSpeeds::symmetric(w[IVX], self.fast_magnetosonic_speed(&w, bx))
    }

    fn density_floor(&self) -> Real {
        self.hydro.floors.density
    }

    fn pressure_floor(&self) -> Real {
        self.hydro.floors.pressure
    }

    fn gamma(&self) -> Real {
        0.0
    }
}
