//! Multi-component adiabatic gas with condensable species.
//!
//! Component 0 is the carrier gas and holds whatever mass the other
//! components do not. Conserved slots `ICOMP..` carry the partial densities
//! of components `1..N`; the matching primitive slots carry mass fractions.
//!
//! With mass fractions `q_i`, the mixture rules are
//!
//! - `cv = sum q_i cv_i`
//! - `R = R_u sum_gas q_i / mu_i` (condensed components have no partial pressure)
//! - `L = sum q_i latent_i`
//! - `p = (gamma_eff - 1)(e_int - rho L)` with `gamma_eff = 1 + R / cv`.

use crate::block::{self, CellKernel};
use crate::error::{EosError, EosResult};
use crate::floors::Floors;
use crate::model::validation::validate_positive;
use crate::model::{EquationOfState, WaveSpeeds};
use crate::recovery::{Adjustments, CellInput, CellRecovery, ConversionReport, RecoveryStatus};
use crate::spacetime::{CellMetric, Spacetime};
use eos_core::{
    Axis, BlockState, CellVector, ICOMP, IDN, IEN, IM1, IM2, IM3, IPR, IVX, IVY, IVZ,
    IndexRange, MAX_COMPONENTS, NVAR_MAX, Real, sqr,
};

/// Universal gas constant in J / (mol K).
pub const UNIVERSAL_GAS_CONSTANT: Real = 8.314_462_618;

/// One mixture component.
#[derive(Clone, Debug, PartialEq)]
pub struct Component {
    pub name: String,
    /// Molecular weight.
    pub mu: Real,
    /// Specific heat at constant volume.
    pub cv: Real,
    /// Latent energy offset per unit mass.
    pub latent: Real,
    /// Condensed phases carry mass and heat but no partial pressure.
    pub condensed: bool,
}

impl Component {
    pub fn gas(name: impl Into<String>, mu: Real, cv: Real) -> Self {
        Self {
            name: name.into(),
            mu,
            cv,
            latent: 0.0,
            condensed: false,
        }
    }

    pub fn condensate(name: impl Into<String>, mu: Real, cv: Real, latent: Real) -> Self {
        Self {
            name: name.into(),
            mu,
            cv,
            latent,
            condensed: true,
        }
    }
}

/// Validated component table.
#[derive(Clone, Debug, PartialEq)]
pub struct Mixture {
    names: Vec<String>,
    mu: Vec<Real>,
    cv: Vec<Real>,
    latent: Vec<Real>,
    condensed: Vec<bool>,
    gas_constant: Real,
}

impl Mixture {
    pub fn new(components: Vec<Component>, gas_constant: Real) -> EosResult<Self> {
        if components.is_empty() || components.len() > MAX_COMPONENTS {
            return Err(EosError::InvalidArg {
                what: format!(
                    "mixture needs 1..={} components, got {}",
                    MAX_COMPONENTS,
                    components.len()
                ),
            });
        }
        if components[0].condensed {
            return Err(EosError::InvalidArg {
                what: format!("carrier component '{}' cannot be condensed", components[0].name),
            });
        }
        validate_positive("gas_constant", gas_constant)?;
        for c in &components {
            validate_positive("component mu", c.mu)?;
            validate_positive("component cv", c.cv)?;
            if !c.latent.is_finite() {
                return Err(EosError::NonPhysical {
                    what: "component latent",
                    value: c.latent,
                });
            }
        }
        Ok(Self {
            names: components.iter().map(|c| c.name.clone()).collect(),
            mu: components.iter().map(|c| c.mu).collect(),
            cv: components.iter().map(|c| c.cv).collect(),
            latent: components.iter().map(|c| c.latent).collect(),
            condensed: components.iter().map(|c| c.condensed).collect(),
            gas_constant,
        })
    }

    pub fn len(&self) -> usize {
        self.mu.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mu.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn gas_constant(&self) -> Real {
        self.gas_constant
    }

    /// Mass fractions of all components from a primitive vector.
    fn fractions(&self, prim: &[Real]) -> [Real; MAX_COMPONENTS] {
        let mut q = [0.0; MAX_COMPONENTS];
        let mut rest = 1.0;
        for (n, slot) in q.iter_mut().enumerate().take(self.len()).skip(1) {
            *slot = prim[ICOMP + n - 1];
            rest -= *slot;
        }
        q[0] = rest;
        q
    }

    fn properties(&self, prim: &[Real]) -> MixtureProperties {
        let q = self.fractions(prim);
        let mut props = MixtureProperties::default();
        for n in 0..self.len() {
            props.cv += q[n] * self.cv[n];
            props.latent += q[n] * self.latent[n];
            if !self.condensed[n] {
                props.rgas += self.gas_constant * q[n] / self.mu[n];
            }
        }
        props
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct MixtureProperties {
    cv: Real,
    rgas: Real,
    latent: Real,
}

impl MixtureProperties {
    fn gamma(&self) -> Real {
        1.0 + self.rgas / self.cv
    }

    /// Internal energy density of a state with density `rho` and pressure `p`.
    fn internal_energy(&self, rho: Real, pgas: Real) -> Real {
        let thermal = if self.rgas > 0.0 {
            pgas * self.cv / self.rgas
        } else {
            0.0
        };
        thermal + rho * self.latent
    }
}

/// Adiabatic hydrodynamics of a mixture.
#[derive(Clone, Debug, PartialEq)]
pub struct HeterogeneousHydro {
    mixture: Mixture,
    floors: Floors,
}

impl HeterogeneousHydro {
    pub fn new(mixture: Mixture, floors: Floors) -> Self {
        Self { mixture, floors }
    }

    pub fn mixture(&self) -> &Mixture {
        &self.mixture
    }

    pub fn n_components(&self) -> usize {
        self.mixture.len()
    }

    pub fn mu(&self) -> &[Real] {
        &self.mixture.mu
    }

    pub fn cv(&self) -> &[Real] {
        &self.mixture.cv
    }

    pub fn latent(&self) -> &[Real] {
        &self.mixture.latent
    }

    pub fn condensed(&self) -> &[bool] {
        &self.mixture.condensed
    }

    /// `1 + R_mix / cv_mix` of a primitive state.
    pub fn effective_gamma(&self, prim: &[Real]) -> Real {
        self.mixture.properties(prim).gamma()
    }

    /// Temperature `p / (rho R_mix)`; zero if no gas phase is present.
    pub fn temperature(&self, prim: &[Real]) -> Real {
        let props = self.mixture.properties(prim);
        if props.rgas > 0.0 {
            prim[IPR] / (prim[IDN] * props.rgas)
        } else {
            0.0
        }
    }

    fn recover_cell(&self, input: &CellInput) -> CellRecovery {
        let ncomp = self.mixture.len();
        let mut cons = input.cons;
        let mut prim = [0.0; NVAR_MAX];
        let mut adj = Adjustments::default();

        let rho = self.floors.density(cons[IDN]);
        if rho != cons[IDN] {
            cons[IDN] = rho;
            adj.density_floor = true;
        }

        // Partial densities stay in [0, rho] and never sum above rho.
        let mut partial_sum = 0.0;
        for n in 1..ncomp {
            let slot = ICOMP + n - 1;
            let clamped = cons[slot].max(0.0).min(rho);
            if clamped != cons[slot] {
                cons[slot] = clamped;
                adj.density_floor = true;
            }
            partial_sum += clamped;
        }
        if partial_sum > rho {
            let scale = rho / partial_sum;
            for n in 1..ncomp {
                cons[ICOMP + n - 1] *= scale;
            }
            adj.density_floor = true;
        }

        let di = 1.0 / rho;
        prim[IDN] = rho;
        prim[IVX] = cons[IM1] * di;
        prim[IVY] = cons[IM2] * di;
        prim[IVZ] = cons[IM3] * di;
        for n in 1..ncomp {
            prim[ICOMP + n - 1] = cons[ICOMP + n - 1] * di;
        }
        let e_k = 0.5 * di * (sqr(cons[IM1]) + sqr(cons[IM2]) + sqr(cons[IM3]));

        let props = self.mixture.properties(&prim);
        let pgas = (props.gamma() - 1.0) * (cons[IEN] - e_k - rho * props.latent);
        prim[IPR] = self.floors.pressure(pgas);
        if prim[IPR] != pgas {
            cons[IEN] = props.internal_energy(rho, prim[IPR]) + e_k;
            adj.pressure_floor = true;
        }

        CellRecovery {
            prim,
            cons: adj.any().then_some(cons),
            status: RecoveryStatus::from_adjustments(adj),
        }
    }

    fn conserve_cell(&self, prim: &CellVector) -> CellVector {
        let mut cons = [0.0; NVAR_MAX];
        let rho = prim[IDN];
        cons[IDN] = rho;
        cons[IM1] = rho * prim[IVX];
        cons[IM2] = rho * prim[IVY];
        cons[IM3] = rho * prim[IVZ];
        for n in 1..self.mixture.len() {
            cons[ICOMP + n - 1] = rho * prim[ICOMP + n - 1];
        }
        cons[IEN] = self.energy(prim);
        cons
    }
}

impl CellKernel for HeterogeneousHydro {
    fn name(&self) -> &'static str {
        "heterogeneous"
    }

    fn nvar(&self) -> usize {
        ICOMP + self.mixture.len() - 1
    }

    fn recover(&self, input: &CellInput) -> CellRecovery {
        self.recover_cell(input)
    }

    fn conserve(&self, prim: &CellVector, _bcc: [Real; 3], _metric: &CellMetric) -> Option<CellVector> {
        Some(self.conserve_cell(prim))
    }
}

impl EquationOfState for HeterogeneousHydro {
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
        (self.effective_gamma(prim) * prim[IPR] / prim[IDN]).sqrt()
    }

    fn wave_speeds(&self, prim: &[Real], _bcc: [Real; 3], axis: Axis, _metric: &CellMetric) -> WaveSpeeds {
        WaveSpeeds::symmetric(prim[IVX + axis.index()], self.sound_speed(prim))
    }

    /// Specific entropy `cv ln T - R ln rho` relative to `T = rho = 1`.
    fn entropy(&self, prim: &[Real]) -> Real {
        let props = self.mixture.properties(prim);
        let temp = self.temperature(prim);
        if temp > 0.0 {
            props.cv * temp.ln() - props.rgas * prim[IDN].ln()
        } else {
            0.0
        }
    }

    /// Total energy density, including latent offsets.
    fn energy(&self, prim: &[Real]) -> Real {
        let props = self.mixture.properties(prim);
        let rho = prim[IDN];
        props.internal_energy(rho, prim[IPR])
            + 0.5 * rho * (sqr(prim[IVX]) + sqr(prim[IVY]) + sqr(prim[IVZ]))
    }

    /// Specific enthalpy `(e_int + p) / rho`.
    fn enthalpy(&self, prim: &[Real]) -> Real {
        let props = self.mixture.properties(prim);
        (props.internal_energy(prim[IDN], prim[IPR]) + prim[IPR]) / prim[IDN]
    }

    fn density_floor(&self) -> Real {
        self.floors.density
    }

    fn pressure_floor(&self) -> Real {
        self.floors.pressure
    }

    /// Adiabatic index of the pure carrier gas.
    fn gamma(&self) -> Real {
        1.0 + self.mixture.gas_constant / (self.mixture.mu[0] * self.mixture.cv[0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spacetime::Minkowski;
    use eos_core::BlockShape;

    fn air_water() -> HeterogeneousHydro {
        let mixture = Mixture::new(
            vec![
                Component::gas("air", 1.0, 2.5),
                Component::gas("vapor", 0.5, 3.0),
                Component::condensate("cloud", 0.5, 4.0, -10.0),
            ],
            1.0,
        )
        .unwrap();
        HeterogeneousHydro::new(mixture, Floors::default())
    }

    fn prim(rho: Real, pgas: Real, q1: Real, q2: Real) -> CellVector {
        let mut p = [0.0; NVAR_MAX];
        p[IDN] = rho;
        p[IVX] = 0.3;
        p[IPR] = pgas;
        p[ICOMP] = q1;
        p[ICOMP + 1] = q2;
        p
    }

    #[test]
    fn single_component_reduces_to_ideal_gas() {
        let mixture = Mixture::new(vec![Component::gas("air", 1.0, 1.5)], 1.0).unwrap();
        let eos = HeterogeneousHydro::new(mixture, Floors::default());
        assert_eq!(CellKernel::nvar(&eos), 5);
        let p = prim(1.0, 2.0, 0.0, 0.0);
        assert!((eos.effective_gamma(&p) - 5.0 / 3.0).abs() < 1e-14);
        assert!((eos.gamma() - 5.0 / 3.0).abs() < 1e-14);
        let cs = eos.sound_speed(&p);
        assert!((cs - (5.0 / 3.0 * 2.0_f64).sqrt()).abs() < 1e-14);
    }

    #[test]
    fn condensate_has_no_partial_pressure() {
        let eos = air_water();
        let dry = prim(1.0, 1.0, 0.0, 0.0);
        let cloudy = prim(1.0, 1.0, 0.0, 0.2);
        let rgas_dry = eos.mixture.properties(&dry).rgas;
        let rgas_cloudy = eos.mixture.properties(&cloudy).rgas;
        assert!((rgas_dry - 1.0).abs() < 1e-14);
        assert!((rgas_cloudy - 0.8).abs() < 1e-14);
        assert!(eos.effective_gamma(&cloudy) < eos.effective_gamma(&dry));
    }

    #[test]
    fn block_round_trip_with_latent_heat() {
        let eos = air_water();
        let shape = BlockShape::new(1, 1, 1);
        let mut block = BlockState::new(7, shape);
        let p = prim(1.2, 0.8, 0.1, 0.05);
        for (n, value) in p.iter().enumerate().take(7) {
            block.prim[[n, 0, 0, 0]] = *value;
        }
        let range = IndexRange::whole(shape);
        eos.primitive_to_conserved(&mut block, &Minkowski, range).unwrap();
        assert!((block.cons[[ICOMP, 0, 0, 0]] - 0.12).abs() < 1e-14);
        block.prim.fill(0.0);
        let report = eos.conserved_to_primitive(&mut block, &Minkowski, range).unwrap();
        assert!(report.is_clean());
        for (n, value) in p.iter().enumerate().take(7) {
            assert!((block.prim[[n, 0, 0, 0]] - value).abs() < 1e-12, "slot {n}");
        }
    }

    #[test]
    fn negative_partial_density_is_clamped() {
        let eos = air_water();
        let mut cons = [0.0; NVAR_MAX];
        cons[IDN] = 1.0;
        cons[IEN] = 3.0;
        cons[ICOMP] = -0.1;
        let input = CellInput {
            index: eos_core::CellIndex { k: 0, j: 0, i: 0 },
            cons,
            prim_old: [0.0; NVAR_MAX],
            bcc: [0.0; 3],
            metric: CellMetric::minkowski(),
            floor_scale: 1.0,
        };
        let out = eos.recover_cell(&input);
        assert_eq!(out.prim[ICOMP], 0.0);
        assert!(matches!(out.status, RecoveryStatus::Adjusted(a) if a.density_floor));
    }

    #[test]
    fn rejects_bad_tables() {
        assert!(Mixture::new(vec![], 1.0).is_err());
        assert!(Mixture::new(vec![Component::condensate("ice", 1.0, 1.0, 0.0)], 1.0).is_err());
        assert!(Mixture::new(vec![Component::gas("air", 0.0, 1.0)], 1.0).is_err());
        let too_many = (0..=MAX_COMPONENTS)
            .map(|n| Component::gas(format!("c{n}"), 1.0, 1.0))
            .collect();
        assert!(Mixture::new(too_many, 1.0).is_err());
    }

    #[test]
    fn enthalpy_consistent_with_energy() {
        let eos = air_water();
        let p = prim(2.0, 1.0, 0.1, 0.1);
        let e_int = eos.energy(&p) - 0.5 * 2.0 * 0.09;
        assert!((eos.enthalpy(&p) - (e_int + 1.0) / 2.0).abs() < 1e-14);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn pressure_round_trip(
            rho in 1e-2_f64..1e2,
            pgas in 1e-2_f64..1e2,
            q1 in 0.0_f64..0.4,
            q2 in 0.0_f64..0.4,
        ) {
            let mixture = Mixture::new(
                vec![
                    Component::gas("n2", 28.0, 743.0),
                    Component::gas("h2o", 18.0, 1410.0),
                    Component::condensate("h2o(l)", 18.0, 4180.0, -2.5e6),
                ],
                UNIVERSAL_GAS_CONSTANT,
            )
            .unwrap();
            let eos = HeterogeneousHydro::new(mixture, Floors::default());
            let mut p = [0.0; NVAR_MAX];
            p[IDN] = rho;
            p[IPR] = pgas;
            p[ICOMP] = q1;
            p[ICOMP + 1] = q2;
            let cons = eos.conserve_cell(&p);
            let input = CellInput {
                index: eos_core::CellIndex { k: 0, j: 0, i: 0 },
                cons,
                prim_old: [0.0; NVAR_MAX],
                bcc: [0.0; 3],
                metric: CellMetric::minkowski(),
                floor_scale: 1.0,
            };
            let out = eos.recover_cell(&input);
            prop_assert!(out.prim[IPR] >= eos.pressure_floor());
            let scale = cons[IEN].abs() + pgas;
            prop_assert!((out.prim[IPR] - pgas).abs() <= 1e-8 * scale);
        }
    }
}
