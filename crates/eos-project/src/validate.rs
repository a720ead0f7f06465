//! Configuration validation, run before compilation.

use crate::schema::{ComponentDef, EosDef, FloorsDef, InversionDef, LimitsDef, PowerLawDef, Project};
use eos_core::MAX_COMPONENTS;
use std::collections::HashSet;

pub const LATEST_VERSION: u32 = 1;

#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("Duplicate ID: {id} in {context}")]
    DuplicateId { id: String, context: String },

    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unsupported feature: {feature} - {reason}")]
    Unsupported { feature: String, reason: String },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

fn invalid(field: &str, value: impl ToString, reason: &str) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn require(ok: bool, field: &str, value: f64, reason: &str) -> Result<(), ValidationError> {
    if ok { Ok(()) } else { Err(invalid(field, value, reason)) }
}

pub fn validate_project(project: &Project) -> Result<(), ValidationError> {
    if project.version > LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: project.version,
        });
    }
    if project.name.trim().is_empty() {
        return Err(invalid("name", "\"\"", "must not be empty"));
    }

    validate_floors(project.eos.floors())?;
    validate_inversion(&project.inversion)?;

    match &project.eos {
        EosDef::Adiabatic { gamma, .. } => validate_gamma(*gamma),
        EosDef::Isothermal { iso_sound_speed, .. } => require(
            iso_sound_speed.is_finite() && *iso_sound_speed >= 0.0,
            "eos.iso_sound_speed",
            *iso_sound_speed,
            "must be finite and non-negative",
        ),
        EosDef::ShallowWater { .. } => Ok(()),
        EosDef::Heterogeneous {
            gas_constant,
            components,
            ..
        } => {
            require(
                gas_constant.is_finite() && *gas_constant > 0.0,
                "eos.gas_constant",
                *gas_constant,
                "must be positive",
            )?;
            validate_components(components)
        }
        EosDef::SpecialRelativistic { gamma, limits, .. } => {
            validate_gamma(*gamma)?;
            validate_limits(limits)
        }
        EosDef::GeneralRelativistic {
            gamma,
            limits,
            rho_floor,
            pgas_floor,
            ..
        } => {
            validate_gamma(*gamma)?;
            validate_limits(limits)?;
            validate_power_law("eos.rho_floor", rho_floor)?;
            validate_power_law("eos.pgas_floor", pgas_floor)
        }
    }
}

fn validate_gamma(gamma: f64) -> Result<(), ValidationError> {
    require(gamma.is_finite() && gamma > 1.0, "eos.gamma", gamma, "must exceed 1")
}

fn validate_floors(floors: &FloorsDef) -> Result<(), ValidationError> {
    require(
        floors.density.is_finite() && floors.density >= 0.0,
        "eos.floors.density",
        floors.density,
        "must be finite and non-negative",
    )?;
    require(
        floors.pressure.is_finite() && floors.pressure >= 0.0,
        "eos.floors.pressure",
        floors.pressure,
        "must be finite and non-negative",
    )
}

fn validate_limits(limits: &LimitsDef) -> Result<(), ValidationError> {
    require(
        limits.gamma_max > 1.0,
        "eos.limits.gamma_max",
        limits.gamma_max,
        "must exceed 1",
    )?;
    if let Some(sigma_max) = limits.sigma_max {
        require(sigma_max > 0.0, "eos.limits.sigma_max", sigma_max, "must be positive")?;
    }
    require(
        limits.beta_min.is_finite() && limits.beta_min >= 0.0,
        "eos.limits.beta_min",
        limits.beta_min,
        "must be finite and non-negative",
    )
}

fn validate_power_law(field: &str, floor: &PowerLawDef) -> Result<(), ValidationError> {
    require(
        floor.min.is_finite() && floor.min >= 0.0,
        &format!("{field}.min"),
        floor.min,
        "must be finite and non-negative",
    )?;
    require(floor.pow.is_finite(), &format!("{field}.pow"), floor.pow, "must be finite")
}

fn validate_inversion(inversion: &InversionDef) -> Result<(), ValidationError> {
    if inversion.max_iterations == 0 {
        return Err(invalid("inversion.max_iterations", 0, "must be positive"));
    }
    require(
        inversion.tolerance.is_finite() && inversion.tolerance > 0.0,
        "inversion.tolerance",
        inversion.tolerance,
        "must be positive",
    )
}

fn validate_components(components: &[ComponentDef]) -> Result<(), ValidationError> {
    if components.is_empty() {
        return Err(invalid("eos.components", 0, "at least one component required"));
    }
    if components.len() > MAX_COMPONENTS {
        return Err(ValidationError::Unsupported {
            feature: format!("{} components", components.len()),
            reason: format!("at most {MAX_COMPONENTS} are supported"),
        });
    }
    if components[0].condensed {
        return Err(ValidationError::Unsupported {
            feature: format!("condensed carrier '{}'", components[0].name),
            reason: "the first component carries the remainder and must be a gas".to_string(),
        });
    }

    let mut names = HashSet::new();
    for component in components {
        if !names.insert(component.name.as_str()) {
            return Err(ValidationError::DuplicateId {
                id: component.name.clone(),
                context: "eos.components".to_string(),
            });
        }
        let field = format!("eos.components.{}", component.name);
        require(component.mu > 0.0, &format!("{field}.mu"), component.mu, "must be positive")?;
        require(component.cv > 0.0, &format!("{field}.cv"), component.cv, "must be positive")?;
        require(
            component.latent.is_finite(),
            &format!("{field}.latent"),
            component.latent,
            "must be finite",
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FloorsDef;

    fn adiabatic(gamma: f64) -> Project {
        Project {
            version: LATEST_VERSION,
            name: "test".to_string(),
            eos: EosDef::Adiabatic {
                gamma,
                magnetic: false,
                floors: FloorsDef::default(),
            },
            inversion: InversionDef::default(),
        }
    }

    #[test]
    fn accepts_plain_adiabatic() {
        validate_project(&adiabatic(5.0 / 3.0)).unwrap();
    }

    #[test]
    fn rejects_gamma_at_one() {
        assert!(matches!(
            validate_project(&adiabatic(1.0)),
            Err(ValidationError::InvalidValue { .. })
        ));
    }

    #[test]
    fn rejects_future_version() {
        let mut project = adiabatic(1.4);
        project.version = LATEST_VERSION + 1;
        assert!(matches!(
            validate_project(&project),
            Err(ValidationError::UnsupportedVersion { .. })
        ));
    }

    #[test]
    fn rejects_duplicate_components() {
        let gas = |name: &str| ComponentDef {
            name: name.to_string(),
            mu: 1.0,
            cv: 2.5,
            latent: 0.0,
            condensed: false,
        };
        let mut project = adiabatic(1.4);
        project.eos = EosDef::Heterogeneous {
            gas_constant: 1.0,
            components: vec![gas("air"), gas("air")],
            floors: FloorsDef::default(),
        };
        assert!(matches!(
            validate_project(&project),
            Err(ValidationError::DuplicateId { .. })
        ));
    }

    #[test]
    fn rejects_negative_floor_and_tolerance() {
        let mut project = adiabatic(1.4);
        project.eos = EosDef::ShallowWater {
            floors: FloorsDef {
                density: -1.0,
                pressure: 0.0,
            },
        };
        assert!(validate_project(&project).is_err());

        let mut project = adiabatic(1.4);
        project.inversion.tolerance = 0.0;
        assert!(validate_project(&project).is_err());
    }
}
