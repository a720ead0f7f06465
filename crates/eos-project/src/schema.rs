//! Configuration file schema.

use eos_core::default_floor;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Project {
    pub version: u32,
    pub name: String,
    pub eos: EosDef,
    #[serde(default)]
    pub inversion: InversionDef,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EosDef {
    Adiabatic {
        gamma: f64,
        #[serde(default)]
        magnetic: bool,
        #[serde(default)]
        floors: FloorsDef,
    },
    Isothermal {
        iso_sound_speed: f64,
        #[serde(default)]
        magnetic: bool,
        #[serde(default)]
        floors: FloorsDef,
    },
    ShallowWater {
        #[serde(default)]
        floors: FloorsDef,
    },
    Heterogeneous {
        #[serde(default = "default_gas_constant")]
        gas_constant: f64,
        components: Vec<ComponentDef>,
        #[serde(default)]
        floors: FloorsDef,
    },
    SpecialRelativistic {
        gamma: f64,
        #[serde(default)]
        magnetic: bool,
        #[serde(default)]
        floors: FloorsDef,
        #[serde(default)]
        limits: LimitsDef,
    },
    GeneralRelativistic {
        gamma: f64,
        #[serde(default)]
        magnetic: bool,
        #[serde(default)]
        floors: FloorsDef,
        #[serde(default)]
        limits: LimitsDef,
        #[serde(default)]
        rho_floor: PowerLawDef,
        #[serde(default)]
        pgas_floor: PowerLawDef,
    },
}

impl EosDef {
    /// Snake-case tag of the variant, as written in files.
    pub fn kind(&self) -> &'static str {
        match self {
            EosDef::Adiabatic { .. } => "adiabatic",
            EosDef::Isothermal { .. } => "isothermal",
            EosDef::ShallowWater { .. } => "shallow_water",
            EosDef::Heterogeneous { .. } => "heterogeneous",
            EosDef::SpecialRelativistic { .. } => "special_relativistic",
            EosDef::GeneralRelativistic { .. } => "general_relativistic",
        }
    }

    pub fn floors(&self) -> &FloorsDef {
        match self {
            EosDef::Adiabatic { floors, .. }
            | EosDef::Isothermal { floors, .. }
            | EosDef::ShallowWater { floors }
            | EosDef::Heterogeneous { floors, .. }
            | EosDef::SpecialRelativistic { floors, .. }
            | EosDef::GeneralRelativistic { floors, .. } => floors,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct FloorsDef {
    #[serde(default = "default_floor")]
    pub density: f64,
    #[serde(default = "default_floor")]
    pub pressure: f64,
}

impl Default for FloorsDef {
    fn default() -> Self {
        Self {
            density: default_floor(),
            pressure: default_floor(),
        }
    }
}

/// Relativistic limiters. A missing `sigma_max` means no magnetization ceiling.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct LimitsDef {
    #[serde(default = "default_gamma_max")]
    pub gamma_max: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sigma_max: Option<f64>,
    #[serde(default)]
    pub beta_min: f64,
}

impl Default for LimitsDef {
    fn default() -> Self {
        Self {
            gamma_max: default_gamma_max(),
            sigma_max: None,
            beta_min: 0.0,
        }
    }
}

/// `min * scale^pow`; `min = 0` disables the power law.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct PowerLawDef {
    #[serde(default)]
    pub min: f64,
    #[serde(default)]
    pub pow: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComponentDef {
    pub name: String,
    pub mu: f64,
    pub cv: f64,
    #[serde(default)]
    pub latent: f64,
    #[serde(default)]
    pub condensed: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct InversionDef {
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
}

impl Default for InversionDef {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            tolerance: default_tolerance(),
        }
    }
}

fn default_gas_constant() -> f64 {
    eos_physics::UNIVERSAL_GAS_CONSTANT
}

fn default_gamma_max() -> f64 {
    1000.0
}

fn default_max_iterations() -> usize {
    100
}

fn default_tolerance() -> f64 {
    1e-12
}
