//! Turn a validated project into an immutable equation of state.

use crate::ProjectResult;
use crate::schema::{ComponentDef, EosDef, FloorsDef, InversionDef, LimitsDef, PowerLawDef, Project};
use eos_physics::{
    AdiabaticHydro, Component, Eos, Floors, GrHydro, GrMagnetoHydro, HeterogeneousHydro,
    InversionConfig, IsothermalHydro, MagnetoAdiabaticHydro, MagnetoIsothermalHydro, Mixture,
    PowerLawFloor, RelativisticLimits, ShallowWater, SrHydro, SrMagnetoHydro,
};
use tracing::debug;

/// Build the configured variant. Call after `validate_project`.
pub fn compile_eos(project: &Project) -> ProjectResult<Eos> {
    let config = inversion(&project.inversion)?;
    let eos: Eos = match &project.eos {
        EosDef::Adiabatic {
            gamma,
            magnetic,
            floors,
        } => {
            let floors = absolute(floors)?;
            if *magnetic {
                MagnetoAdiabaticHydro::new(*gamma, floors)?.into()
            } else {
                AdiabaticHydro::new(*gamma, floors)?.into()
            }
        }
        EosDef::Isothermal {
            iso_sound_speed,
            magnetic,
            floors,
        } => {
            let floors = absolute(floors)?;
            if *magnetic {
                MagnetoIsothermalHydro::new(*iso_sound_speed, floors)?.into()
            } else {
                IsothermalHydro::new(*iso_sound_speed, floors)?.into()
            }
        }
        EosDef::ShallowWater { floors } => ShallowWater::new(absolute(floors)?).into(),
        EosDef::Heterogeneous {
            gas_constant,
            components,
            floors,
        } => {
            let mixture = Mixture::new(components.iter().map(component).collect(), *gas_constant)?;
            HeterogeneousHydro::new(mixture, absolute(floors)?).into()
        }
        EosDef::SpecialRelativistic {
            gamma,
            magnetic,
            floors,
            limits,
        } => {
            let floors = absolute(floors)?;
            let limits = relativistic(limits)?;
            if *magnetic {
                SrMagnetoHydro::new(*gamma, floors, limits, config)?.into()
            } else {
                SrHydro::new(*gamma, floors, limits, config)?.into()
            }
        }
        EosDef::GeneralRelativistic {
            gamma,
            magnetic,
            floors,
            limits,
            rho_floor,
            pgas_floor,
        } => {
            let floors = absolute(floors)?;
            let limits = relativistic(limits)?;
            let rho_floor = power_law(rho_floor)?;
            let pgas_floor = power_law(pgas_floor)?;
            if *magnetic {
                GrMagnetoHydro::new(*gamma, floors, rho_floor, pgas_floor, limits, config)?.into()
            } else {
                GrHydro::new(*gamma, floors, rho_floor, pgas_floor, limits, config)?.into()
            }
        }
    };
    debug!(project = %project.name, eos = eos_physics::EquationOfState::name(&eos), "compiled equation of state");
    Ok(eos)
}

fn absolute(floors: &FloorsDef) -> ProjectResult<Floors> {
    Ok(Floors::new(floors.density, floors.pressure)?)
}

fn relativistic(limits: &LimitsDef) -> ProjectResult<RelativisticLimits> {
    Ok(RelativisticLimits::new(
        limits.gamma_max,
        limits.sigma_max.unwrap_or(f64::INFINITY),
        limits.beta_min,
    )?)
}

fn power_law(floor: &PowerLawDef) -> ProjectResult<PowerLawFloor> {
    Ok(PowerLawFloor::new(floor.min, floor.pow)?)
}

fn inversion(def: &InversionDef) -> ProjectResult<InversionConfig> {
    Ok(InversionConfig::new(def.max_iterations, def.tolerance)?)
}

fn component(def: &ComponentDef) -> Component {
    Component {
        name: def.name.clone(),
        mu: def.mu,
        cv: def.cv,
        latent: def.latent,
        condensed: def.condensed,
    }
}
