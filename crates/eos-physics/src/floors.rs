//! Floor policy: lower bounds that keep recovered primitives physical.

use crate::error::{EosError, EosResult};
use eos_core::{Real, default_floor};

/// Absolute density and pressure floors.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Floors {
    pub density: Real,
    pub pressure: Real,
}

impl Default for Floors {
    fn default() -> Self {
        Self {
            density: default_floor(),
            pressure: default_floor(),
        }
    }
}

impl Floors {
    pub fn new(density: Real, pressure: Real) -> EosResult<Self> {
        validate_floor("density_floor", density)?;
        validate_floor("pressure_floor", pressure)?;
        Ok(Self { density, pressure })
    }

    /// Clamp a density to the floor. NaN maps to the floor.
    #[inline]
    pub fn density(&self, rho: Real) -> Real {
        apply_floor(rho, self.density)
    }

    /// Clamp a pressure to the floor. NaN maps to the floor.
    #[inline]
    pub fn pressure(&self, pgas: Real) -> Real {
        apply_floor(pgas, self.pressure)
    }
}

/// `max(value, floor)` that also replaces NaN by the floor.
#[inline]
pub fn apply_floor(value: Real, floor: Real) -> Real {
    if value >= floor { value } else { floor }
}

/// Power-law floor `min * scale^pow`, combined with an absolute floor.
///
/// A zero coefficient disables the power law.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PowerLawFloor {
    pub min: Real,
    pub pow: Real,
}

impl PowerLawFloor {
    pub fn new(min: Real, pow: Real) -> EosResult<Self> {
        validate_floor("power-law floor coefficient", min)?;
        if !pow.is_finite() {
            return Err(EosError::NonPhysical {
                what: "power-law floor exponent",
                value: pow,
            });
        }
        Ok(Self { min, pow })
    }

    /// Floor at the given radial-like scale: `max(absolute, min * scale^pow)`.
    pub fn value(&self, absolute: Real, scale: Real) -> Real {
        if self.min <= 0.0 || !(scale > 0.0) {
            return absolute;
        }
        let power_law = self.min * scale.powf(self.pow);
        if power_law.is_finite() {
            absolute.max(power_law)
        } else {
            absolute
        }
    }
}

fn validate_floor(what: &'static str, value: Real) -> EosResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(EosError::NonPhysical { what, value });
    }
    Ok(())
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn floored_values_never_below_floor(value in -1e3_f64..1e3, floor in 0.0_f64..1.0) {
            prop_assert!(apply_floor(value, floor) >= floor);
        }

        #[test]
        fn power_law_never_below_absolute(
            min in 0.0_f64..1.0,
            pow in -3.0_f64..3.0,
            scale in 1e-3_f64..1e3,
            absolute in 0.0_f64..1e-2,
        ) {
            let floor = PowerLawFloor::new(min, pow).unwrap();
            prop_assert!(floor.value(absolute, scale) >= absolute);
        }
    }
}
