use serde::Serialize;

use crate::error::{Error, Result};

/// Fixed spatial dimension (2D).
pub const DIM: usize = 2;

/// Walls of the chamber: `x` in `[0, width]`, `y` in `[top, height]`.
///
/// `y` grows downward; `top` is the movable compressor wall.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds {
    pub width: f64,
    pub height: f64,
    pub top: f64,
}

impl Bounds {
    pub fn new(width: f64, height: f64, top: f64) -> Self {
        Self { width, height, top }
    }

    /// Legal center range on each axis for a disk of `radius`.
    #[inline]
    pub fn center_range(&self, radius: f64) -> [(f64, f64); DIM] {
        [
            (radius, self.width - radius),
            (self.top + radius, self.height - radius),
        ]
    }

    /// True when a disk of `radius` centered at `r` lies inside the chamber.
    pub fn contains(&self, r: &[f64; DIM], radius: f64) -> bool {
        self.center_range(radius)
            .iter()
            .zip(r.iter())
            .all(|(&(lo, hi), &x)| x >= lo && x <= hi)
    }
}

/// A gas particle: a hard disk in D=2.
///
/// Fields:
/// - `id`: index at creation, stable until the next re-initialization
/// - `r`: position [x, y]
/// - `v`: velocity [vx, vy]
/// - `radius`: disk radius (> 0)
/// - `mass`: particle mass (> 0)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Particle {
    /// Stable particle identifier.
    pub id: u32,
    /// Position (x, y).
    pub r: [f64; DIM],
    /// Velocity (vx, vy).
    pub v: [f64; DIM],
    /// Disk radius (> 0).
    pub radius: f64,
    /// Mass (> 0).
    pub mass: f64,
}

impl Particle {
    /// Create a new particle after validating invariants.
    ///
    /// Errors:
    /// - `Error::InvalidParam` if `radius` or `mass` is non-positive or any component is NaN/inf.
    pub fn new(id: u32, r: [f64; DIM], v: [f64; DIM], radius: f64, mass: f64) -> Result<Self> {
        if !radius.is_finite() || radius <= 0.0 {
            return Err(Error::InvalidParam("radius must be finite and > 0".into()));
        }
        if !mass.is_finite() || mass <= 0.0 {
            return Err(Error::InvalidParam("mass must be finite and > 0".into()));
        }
        if !r.iter().all(|x| x.is_finite()) {
            return Err(Error::InvalidParam("position must be finite".into()));
        }
        if !v.iter().all(|x| x.is_finite()) {
            return Err(Error::InvalidParam("velocity must be finite".into()));
        }
        Ok(Self {
            id,
            r,
            v,
            radius,
            mass,
        })
    }

    /// Returns the particle's kinetic energy: 1/2 m |v|^2.
    #[inline]
    pub fn kinetic_energy(&self) -> f64 {
        let vsq: f64 = self.v.iter().map(|&c| c * c).sum();
        0.5 * self.mass * vsq
    }

    /// Returns the particle's momentum m v.
    #[inline]
    pub fn momentum(&self) -> [f64; DIM] {
        [self.mass * self.v[0], self.mass * self.v[1]]
    }

    /// Advance one tick by explicit Euler and reflect off the four walls.
    ///
    /// Axes are checked independently: a corner hit reflects both components and
    /// reports two wall collisions. Returns the number of reflections (0..=2).
    pub fn integrate_and_reflect(&mut self, bounds: &Bounds) -> u32 {
        for k in 0..DIM {
            self.r[k] += self.v[k];
        }

        let mut hits = 0;
        for (k, (lo, hi)) in bounds.center_range(self.radius).into_iter().enumerate() {
            if self.r[k] <= lo {
                self.r[k] = lo;
                self.v[k] = -self.v[k];
                hits += 1;
            } else if self.r[k] >= hi {
                self.r[k] = hi;
                self.v[k] = -self.v[k];
                hits += 1;
            }
        }
        hits
    }

    /// Clamp the position into the legal domain without touching the velocity.
    pub fn clamp_into(&mut self, bounds: &Bounds) {
        for (k, (lo, hi)) in bounds.center_range(self.radius).into_iter().enumerate() {
            self.r[k] = self.r[k].max(lo).min(hi);
        }
    }
}
