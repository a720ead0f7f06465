//! Closed set of equation-of-state variants selected at configuration time.

use crate::error::EosResult;
use crate::heterogeneous::HeterogeneousHydro;
use crate::model::{EquationOfState, WaveSpeeds};
use crate::newtonian::{AdiabaticHydro, IsothermalHydro, MagnetoAdiabaticHydro, MagnetoIsothermalHydro};
use crate::recovery::ConversionReport;
use crate::relativistic::gr::{GrHydro, GrMagnetoHydro};
use crate::relativistic::sr::{SrHydro, SrMagnetoHydro};
use crate::shallow_water::ShallowWater;
use crate::spacetime::{CellMetric, Spacetime};
use eos_core::{Axis, BlockState, IndexRange, Real};

/// One of the supported equations of state.
///
/// Dispatch is a `match`; the enum itself implements [`EquationOfState`] so
/// callers can hold either a concrete variant or an `Eos`.
#[derive(Clone, Debug, PartialEq)]
pub enum Eos {
    Adiabatic(AdiabaticHydro),
    AdiabaticMhd(MagnetoAdiabaticHydro),
    Isothermal(IsothermalHydro),
    IsothermalMhd(MagnetoIsothermalHydro),
    ShallowWater(ShallowWater),
    Heterogeneous(HeterogeneousHydro),
    SpecialRelativistic(SrHydro),
    SpecialRelativisticMhd(SrMagnetoHydro),
    GeneralRelativistic(GrHydro),
    GeneralRelativisticMhd(GrMagnetoHydro),
}

macro_rules! dispatch {
    ($self:ident, $eos:ident => $body:expr) => {
        match $self {
            Eos::Adiabatic($eos) => $body,
            Eos::AdiabaticMhd($eos) => $body,
            Eos::Isothermal($eos) => $body,
            Eos::IsothermalMhd($eos) => $body,
            Eos::ShallowWater($eos) => $body,
            Eos::Heterogeneous($eos) => $body,
            Eos::SpecialRelativistic($eos) => $body,
            Eos::SpecialRelativisticMhd($eos) => $body,
            Eos::GeneralRelativistic($eos) => $body,
            Eos::GeneralRelativisticMhd($eos) => $body,
        }
    };
}

impl Eos {
    /// Borrow the active variant as a trait object.
    pub fn as_dyn(&self) -> &dyn EquationOfState {
        dispatch!(self, eos => eos as &dyn EquationOfState)
    }

    /// Whether conversions read a per-cell metric.
    pub fn is_general_relativistic(&self) -> bool {
        matches!(self, Eos::GeneralRelativistic(_) | Eos::GeneralRelativisticMhd(_))
    }
}

impl EquationOfState for Eos {
    fn name(&self) -> &'static str {
        dispatch!(self, eos => EquationOfState::name(eos))
    }

    fn nvar(&self) -> usize {
        dispatch!(self, eos => EquationOfState::nvar(eos))
    }

    fn is_magnetic(&self) -> bool {
        dispatch!(self, eos => EquationOfState::is_magnetic(eos))
    }

    fn is_relativistic(&self) -> bool {
        dispatch!(self, eos => eos.is_relativistic())
    }

    fn conserved_to_primitive(
        &self,
        block: &mut BlockState,
        spacetime: &dyn Spacetime,
        range: IndexRange,
    ) -> EosResult<ConversionReport> {
        dispatch!(self, eos => eos.conserved_to_primitive(block, spacetime, range))
    }

    fn primitive_to_conserved(
        &self,
        block: &mut BlockState,
        spacetime: &dyn Spacetime,
        range: IndexRange,
    ) -> EosResult<()> {
        dispatch!(self, eos => eos.primitive_to_conserved(block, spacetime, range))
    }

    fn sound_speed(&self, prim: &[Real]) -> Real {
        dispatch!(self, eos => eos.sound_speed(prim))
    }

    fn fast_magnetosonic_speed(&self, prim: &[Real], bx: Real) -> Real {
        dispatch!(self, eos => eos.fast_magnetosonic_speed(prim, bx))
    }

    fn wave_speeds(&self, prim: &[Real], bcc: [Real; 3], axis: Axis, metric: &CellMetric) -> WaveSpeeds {
        dispatch!(self, eos => eos.wave_speeds(prim, bcc, axis, metric))
    }

    fn entropy(&self, prim: &[Real]) -> Real {
        dispatch!(self, eos => eos.entropy(prim))
    }

    fn energy(&self, prim: &[Real]) -> Real {
        dispatch!(self, eos => eos.energy(prim))
    }

    fn enthalpy(&self, prim: &[Real]) -> Real {
        dispatch!(self, eos => eos.enthalpy(prim))
    }

    fn density_floor(&self) -> Real {
        dispatch!(self, eos => eos.density_floor())
    }

    fn pressure_floor(&self) -> Real {
        dispatch!(self, eos => eos.pressure_floor())
    }

    fn gamma(&self) -> Real {
        dispatch!(self, eos => eos.gamma())
    }
}

macro_rules! impl_from_variant {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Eos {
                fn from(eos: $ty) -> Self {
                    Eos::$variant(eos)
                }
            }
        )*
    };
}

impl_from_variant! {
    AdiabaticHydro => Adiabatic,
    MagnetoAdiabaticHydro => AdiabaticMhd,
    IsothermalHydro => Isothermal,
    MagnetoIsothermalHydro => IsothermalMhd,
    ShallowWater => ShallowWater,
    HeterogeneousHydro => Heterogeneous,
    SrHydro => SpecialRelativistic,
    SrMagnetoHydro => SpecialRelativisticMhd,
    GrHydro => GeneralRelativistic,
    GrMagnetoHydro => GeneralRelativisticMhd,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::floors::Floors;
    use crate::settings::{InversionConfig, RelativisticLimits};

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn enum_is_shareable() {
        assert_send_sync::<Eos>();
    }

    #[test]
    fn dispatch_reaches_variant() {
        let eos: Eos = AdiabaticHydro::new(5.0 / 3.0, Floors::default()).unwrap().into();
        assert_eq!(eos.name(), "adiabatic");
        assert_eq!(eos.nvar(), 5);
        assert!(!eos.is_magnetic());
        assert!((eos.gamma() - 5.0 / 3.0).abs() < 1e-15);
        assert_eq!(eos.as_dyn().name(), "adiabatic");

        let sr: Eos = SrMagnetoHydro::new(
            4.0 / 3.0,
            Floors::default(),
            RelativisticLimits::default(),
            InversionConfig::default(),
        )
        .unwrap()
        .into();
        assert!(sr.is_magnetic());
        assert!(sr.is_relativistic());
        assert!(!sr.is_general_relativistic());
    }
}
