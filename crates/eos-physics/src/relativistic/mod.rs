//! Relativistic ideal gases, flat (`sr`) and curved (`gr`).
//!
//! Both families share one inversion written in the frame of the normal
//! observer: the conserved state of a cell is reduced to a density `dd`,
//! an energy `ee` (rest mass included), a covariant momentum `Q_i` and a
//! field `B^i`, all measured by that observer. In flat spacetime the normal
//! observer is the lab frame and the reduction is the identity.
//!
//! Hydro cells solve a bracketed scalar equation for the pressure. MHD cells
//! solve a damped 2D Newton system for `(Z = rho h W^2, v^2)` and fall back
//! to a bracketed scalar solve on `Z` when the Newton system stalls. The
//! recovered state then passes through floors and the Lorentz-factor,
//! magnetization and plasma-beta limiters. A cell that cannot be inverted
//! gets floor density and pressure with its previous velocity.

pub mod gr;
pub mod sr;

use crate::floors::Floors;
use crate::recovery::{Adjustments, FallbackReason, RecoveryStatus};
use crate::settings::{InversionConfig, RelativisticLimits};
use crate::spacetime::SpatialFrame;
use eos_core::{CellVector, IDN, IEN, IM1, IM3, IPR, IVX, IVY, IVZ, NVAR_MAX, Real};
use eos_solver::{expand_bracket, find_root, newton_solve};
use nalgebra::{Matrix2, Vector2, Vector3};

/// Conserved state seen by the normal observer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NormalFrame {
    /// Density `rho W`.
    pub dd: Real,
    /// Energy density, rest mass included.
    pub ee: Real,
    /// Covariant momentum density `Q_i`.
    pub q_d: Vector3<Real>,
    /// `gamma^ij Q_i Q_j`
    pub mm_sq: Real,
    /// Field `B^i` measured by the normal observer.
    pub bb_u: Vector3<Real>,
    /// `gamma_ij B^i B^j`
    pub bb_sq: Real,
    /// `Q_i B^i`
    pub tt: Real,
}

impl NormalFrame {
    pub fn new(dd: Real, ee: Real, q_d: Vector3<Real>, bb_u: Vector3<Real>, spatial: &SpatialFrame) -> Self {
        Self {
            dd,
            ee,
            q_d,
            mm_sq: spatial.norm_sq_d(&q_d),
            bb_u,
            bb_sq: spatial.norm_sq_u(&bb_u),
            tt: q_d.dot(&bb_u),
        }
    }

    /// Lab-frame conserved variables of special relativity.
    pub fn flat(cons: &CellVector, bcc: [Real; 3]) -> Self {
        Self::new(
            cons[IDN],
            cons[IEN],
            momentum(cons),
            Vector3::from(bcc),
            &SpatialFrame::flat(),
        )
    }

    /// Coordinate conserved variables `(rho u^0, T^0_0, T^0_i)` and coordinate
    /// field `B^i`, projected onto the normal observer.
    pub fn curved(cons: &CellVector, bcc: [Real; 3], spatial: &SpatialFrame) -> Self {
        let alpha = spatial.alpha;
        let t0_i = momentum(cons);
        Self::new(
            alpha * cons[IDN],
            -(cons[IEN] - spatial.beta_u.dot(&t0_i)),
            alpha * t0_i,
            alpha * Vector3::from(bcc),
            spatial,
        )
    }
}

fn momentum(cons: &CellVector) -> Vector3<Real> {
    Vector3::new(cons[IM1], cons[IM1 + 1], cons[IM3])
}

/// Spatial 4-velocity stored in the primitive vector.
pub(crate) fn four_velocity(prim: &CellVector) -> Vector3<Real> {
    Vector3::new(prim[IVX], prim[IVY], prim[IVZ])
}

/// Primitive state produced by an inversion, before floors and limiters.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Recovered {
    rho: Real,
    pgas: Real,
    u: Vector3<Real>,
    speed_limited: bool,
}

impl Recovered {
    fn is_finite(&self) -> bool {
        self.rho.is_finite() && self.pgas.is_finite() && self.u.iter().all(|x| x.is_finite())
    }
}

/// Comoving `b^2 = (B^2 + (B . u)^2) / W^2` from normal-frame quantities.
pub(crate) fn comoving_field_sq(bb_u: &Vector3<Real>, u: &Vector3<Real>, spatial: &SpatialFrame) -> Real {
    let lorentz_sq = 1.0 + spatial.norm_sq_u(u);
    let bb_dot_u = bb_u.dot(&spatial.lower(u));
    (spatial.norm_sq_u(bb_u) + bb_dot_u * bb_dot_u) / lorentz_sq
}

/// Inversion and limiter settings shared by the relativistic variants.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Inverter {
    pub gamma: Real,
    pub limits: RelativisticLimits,
    pub config: InversionConfig,
}

impl Inverter {
    fn k(&self) -> Real {
        (self.gamma - 1.0) / self.gamma
    }

    /// Recover one cell. Never fails: unrecoverable cells fall back.
    pub fn recover(
        &self,
        frame: &NormalFrame,
        spatial: &SpatialFrame,
        floors: &Floors,
        prim_old: &CellVector,
        magnetic: bool,
    ) -> (CellVector, RecoveryStatus) {
        match self.invert(frame, spatial, prim_old, magnetic) {
            Ok(state) => {
                let (prim, adj) = self.limit(state, &frame.bb_u, spatial, floors);
                (prim, RecoveryStatus::from_adjustments(adj))
            }
            Err(reason) => (
                self.fallback(prim_old, &frame.bb_u, spatial, floors),
                RecoveryStatus::Fallback(reason),
            ),
        }
    }

    fn invert(
        &self,
        frame: &NormalFrame,
        spatial: &SpatialFrame,
        prim_old: &CellVector,
        magnetic: bool,
    ) -> Result<Recovered, FallbackReason> {
        let inputs = [frame.dd, frame.ee, frame.mm_sq, frame.bb_sq, frame.tt];
        if inputs.iter().any(|x| !x.is_finite()) {
            return Err(FallbackReason::NonFiniteInput);
        }
        if !(frame.dd > 0.0) {
            return Err(FallbackReason::NonPositiveDensity);
        }
        if !(frame.ee > 0.0) {
            return Err(FallbackReason::NonPositiveEnergy);
        }
        let state = if magnetic && frame.bb_sq > 0.0 {
            self.invert_mhd(frame, spatial, prim_old)?
        } else {
            self.invert_hydro(frame, spatial, prim_old)?
        };
        if state.is_finite() {
            Ok(state)
        } else {
            Err(FallbackReason::Unphysical)
        }
    }

    /// Bracketed Newton solve of the pressure equation
    /// `f(p) = k [(E + p)(1 - v^2) - D sqrt(1 - v^2)] - p`, `v = S / (E + p)`.
    fn invert_hydro(
        &self,
        frame: &NormalFrame,
        spatial: &SpatialFrame,
        prim_old: &CellVector,
    ) -> Result<Recovered, FallbackReason> {
        let k = self.k();
        let (dd, ee) = (frame.dd, frame.ee);
        let s = frame.mm_sq.max(0.0).sqrt();
        let v_max = self.limits.v_max_sq().sqrt();

        let residual = |pgas: Real| {
            let ep = ee + pgas;
            let v_sq = (s / ep).powi(2);
            let root = (1.0 - v_sq).sqrt();
            let f = k * (ep * (1.0 - v_sq) - dd * root) - pgas;
            let df = k * (1.0 + v_sq - dd * v_sq / (ep * root)) - 1.0;
            (f, df)
        };

        // Below p_lo the velocity would exceed v_max; above p_hi the residual is negative.
        let p_speed = s / v_max - ee;
        let (p_lo, at_speed_limit) = if p_speed > 0.0 {
            (p_speed, true)
        } else {
            (0.0, false)
        };
        let p_hi = (self.gamma - 1.0) * ee;
        let (f_lo, _) = residual(p_lo);
        if !f_lo.is_finite() {
            return Err(FallbackReason::Unphysical);
        }

        let (pgas, speed_limited) = if f_lo <= 0.0 || p_hi <= p_lo {
            (p_lo, at_speed_limit)
        } else {
            let guess = Some(prim_old[IPR]);
            let root = find_root(residual, p_lo, p_hi, guess, &self.config.bracket())
                .map_err(|err| FallbackReason::from(&err))?;
            (root.x, false)
        };

        let ep = ee + pgas;
        let v_u = spatial.raise(&(frame.q_d / ep));
        let v_sq_raw = spatial.norm_sq_u(&v_u);
        let v_sq = v_sq_raw.min(self.limits.v_max_sq());
        let lorentz = 1.0 / (1.0 - v_sq).sqrt();
        let scale = if v_sq_raw > v_sq { (v_sq / v_sq_raw).sqrt() } else { 1.0 };
        Ok(Recovered {
            rho: dd / lorentz,
            pgas,
            u: lorentz * scale * v_u,
            speed_limited: speed_limited || v_sq_raw > v_sq,
        })
    }

    fn invert_mhd(
        &self,
        frame: &NormalFrame,
        spatial: &SpatialFrame,
        prim_old: &CellVector,
    ) -> Result<Recovered, FallbackReason> {
        let (z, v_sq, clamped) = match self.solve_2d(frame, spatial, prim_old) {
            Some((z, v_sq)) => (z, v_sq, false),
            None => self.solve_1d(frame, prim_old, spatial)?,
        };

        let dd = frame.dd;
        let root = (1.0 - v_sq).sqrt();
        let lorentz = 1.0 / root;
        let pgas = self.k() * (z * root * root - dd * root);
        let v_u = (spatial.raise(&frame.q_d) + (frame.tt / z) * frame.bb_u) / (z + frame.bb_sq);
        Ok(Recovered {
            rho: dd * root,
            pgas,
            u: lorentz * v_u,
            speed_limited: clamped || v_sq >= self.limits.v_max_sq(),
        })
    }

    /// Initial `(Z, v^2)` from the previous primitive state, if usable.
    fn guess(&self, frame: &NormalFrame, prim_old: &CellVector, spatial: &SpatialFrame) -> Vector2<Real> {
        let v_max_sq = self.limits.v_max_sq();
        let u = four_velocity(prim_old);
        let lorentz_sq = 1.0 + spatial.norm_sq_u(&u);
        let v_sq = 1.0 - 1.0 / lorentz_sq;
        let w = prim_old[IDN] + prim_old[IPR] / self.k();
        let z = w * lorentz_sq;
        if z.is_finite() && z > 0.0 && (0.0..=v_max_sq).contains(&v_sq) {
            return Vector2::new(z, v_sq);
        }
        let z = frame.ee.max(frame.dd);
        let v_sq = (frame.mm_sq / (z + frame.bb_sq).powi(2)).min(v_max_sq);
        Vector2::new(z, v_sq)
    }

    fn solve_2d(
        &self,
        frame: &NormalFrame,
        spatial: &SpatialFrame,
        prim_old: &CellVector,
    ) -> Option<(Real, Real)> {
        let k = self.k();
        let v_max_sq = self.limits.v_max_sq();
        let NormalFrame {
            dd,
            ee,
            mm_sq: mm,
            bb_sq: bb,
            tt,
            ..
        } = *frame;
        let tt_sq = tt * tt;
        let s1 = ee * ee;
        let s2 = ee;

        let residual = |x: &Vector2<Real>| {
            let (z, v_sq) = (x[0], x[1]);
            let pgas = k * (z * (1.0 - v_sq) - dd * (1.0 - v_sq).sqrt());
            let r1 = ((z + bb).powi(2) * v_sq - tt_sq * (2.0 * z + bb) / (z * z) - mm) / s1;
            let r2 = (z - pgas + 0.5 * (1.0 + v_sq) * bb - 0.5 * tt_sq / (z * z) - ee) / s2;
            Vector2::new(r1, r2)
        };
        let jacobian = |x: &Vector2<Real>| {
            let (z, v_sq) = (x[0], x[1]);
            let root = (1.0 - v_sq).sqrt();
            let z3 = z * z * z;
            Matrix2::new(
                (2.0 * (z + bb) * v_sq + 2.0 * tt_sq * (z + bb) / z3) / s1,
                (z + bb).powi(2) / s1,
                (1.0 - k * (1.0 - v_sq) + tt_sq / z3) / s2,
                (k * (z - dd / (2.0 * root)) + 0.5 * bb) / s2,
            )
        };
        let admissible = |x: &Vector2<Real>| x[0] > 0.0 && x[1] >= 0.0 && x[1] <= v_max_sq;

        let x0 = self.guess(frame, prim_old, spatial);
        let result = newton_solve(x0, residual, jacobian, admissible, &self.config.newton()).ok()?;
        let accepted = result.residual_norm <= self.config.accept_residual() && admissible(&result.x);
        accepted.then(|| (result.x[0], result.x[1]))
    }

    /// Scalar solve on `Z` with `v^2(Z)` eliminated through the momentum
    /// equation and clamped at `v_max^2`. Returns `(Z, v^2, clamped)`.
    fn solve_1d(
        &self,
        frame: &NormalFrame,
        prim_old: &CellVector,
        spatial: &SpatialFrame,
    ) -> Result<(Real, Real, bool), FallbackReason> {
        let k = self.k();
        let v_max_sq = self.limits.v_max_sq();
        let NormalFrame {
            dd,
            ee,
            mm_sq: mm,
            bb_sq: bb,
            tt,
            ..
        } = *frame;
        let tt_sq = tt * tt;

        let velocity_sq = move |z: Real| {
            let v_sq = (mm + tt_sq * (2.0 * z + bb) / (z * z)) / (z + bb).powi(2);
            if v_sq > v_max_sq {
                (v_max_sq, 0.0, true)
            } else {
                let dv_sq = -2.0 * v_sq / (z + bb) - 2.0 * tt_sq / (z * z * z * (z + bb));
                (v_sq, dv_sq, false)
            }
        };
        let residual = |z: Real| {
            let (v_sq, dv_sq, _) = velocity_sq(z);
            let root = (1.0 - v_sq).sqrt();
            let pgas = k * (z * (1.0 - v_sq) - dd * root);
            let dp = k * ((1.0 - v_sq) - z * dv_sq + dd * dv_sq / (2.0 * root));
            let f = z - pgas + 0.5 * (1.0 + v_sq) * bb - 0.5 * tt_sq / (z * z) - ee;
            let df = 1.0 - dp + 0.5 * bb * dv_sq + tt_sq / (z * z * z);
            (f, df)
        };

        let config = self.config.bracket();
        let hi = (self.gamma * ee).max(2.0 * dd);
        let (lo, hi) = expand_bracket(residual, dd, hi, 1e-3 * dd, &config)
            .map_err(|err| FallbackReason::from(&err))?;
        let guess = self.guess(frame, prim_old, spatial)[0];
        let root = find_root(residual, lo, hi, Some(guess), &config)
            .map_err(|err| FallbackReason::from(&err))?;
        let (v_sq, _, clamped) = velocity_sq(root.x);
        Ok((root.x, v_sq, clamped))
    }

    /// Apply floors and limiters to an inverted state.
    fn limit(
        &self,
        state: Recovered,
        bb_u: &Vector3<Real>,
        spatial: &SpatialFrame,
        floors: &Floors,
    ) -> (CellVector, Adjustments) {
        let mut adj = Adjustments {
            lorentz_limit: state.speed_limited,
            ..Default::default()
        };
        let mut rho = state.rho;
        let mut pgas = state.pgas;
        let mut u = state.u;

        if self.cap_lorentz(&mut u, spatial) {
            adj.lorentz_limit = true;
        }
        if !(rho >= floors.density) {
            rho = floors.density;
            adj.density_floor = true;
        }
        if !(pgas >= floors.pressure) {
            pgas = floors.pressure;
            adj.pressure_floor = true;
        }

        let b_sq = comoving_field_sq(bb_u, &u, spatial);
        if b_sq > 0.0 {
            if b_sq / rho > self.limits.sigma_max {
                rho = b_sq / self.limits.sigma_max;
                adj.sigma_limit = true;
            }
            let p_min = 0.5 * self.limits.beta_min * b_sq;
            if pgas < p_min {
                pgas = p_min;
                adj.beta_limit = true;
            }
        }
        (pack(rho, pgas, &u), adj)
    }

    /// Floor density and pressure with the previous velocity.
    fn fallback(
        &self,
        prim_old: &CellVector,
        bb_u: &Vector3<Real>,
        spatial: &SpatialFrame,
        floors: &Floors,
    ) -> CellVector {
        let mut u = four_velocity(prim_old);
        if !u.iter().all(|x| x.is_finite()) {
            u = Vector3::zeros();
        }
        let state = Recovered {
            rho: floors.density,
            pgas: floors.pressure,
            u,
            speed_limited: false,
        };
        self.limit(state, bb_u, spatial, floors).0
    }

    /// Rescale `u` so that `W <= gamma_max`. Returns true if it was rescaled.
    fn cap_lorentz(&self, u: &mut Vector3<Real>, spatial: &SpatialFrame) -> bool {
        let gamma_max = self.limits.gamma_max;
        let u_sq = spatial.norm_sq_u(u);
        let u_sq_max = gamma_max * gamma_max - 1.0;
        if u_sq > u_sq_max {
            *u *= (u_sq_max / u_sq).sqrt();
            true
        } else {
            false
        }
    }
}

fn pack(rho: Real, pgas: Real, u: &Vector3<Real>) -> CellVector {
    let mut prim = [0.0; NVAR_MAX];
    prim[IDN] = rho;
    prim[IVX] = u[0];
    prim[IVY] = u[1];
    prim[IVZ] = u[2];
    prim[IPR] = pgas;
    prim
}

/// Characteristic speeds `(lambda_minus, lambda_plus)` of the quadratic
/// dispersion relation `lambda^2 + a1 lambda + a0 = 0`, taking the root that
/// avoids cancellation.
pub(crate) fn quadratic_speeds(a1: Real, a0: Real) -> (Real, Real) {
    let s = (a1 * a1 - 4.0 * a0).max(0.0).sqrt();
    if a1 >= 0.0 {
        ((-a1 - s) / 2.0, -2.0 * a0 / (a1 + s))
    } else {
        (2.0 * a0 / (-a1 + s), (-a1 + s) / 2.0)
    }
}

/// Comoving magnetosonic speed squared `cs^2 + vA^2 (1 - cs^2)`.
pub(crate) fn magnetosonic_sq(cs_sq: Real, b_sq: Real, rho_h: Real) -> Real {
    let va_sq = b_sq / (b_sq + rho_h);
    cs_sq + va_sq * (1.0 - cs_sq)
}
