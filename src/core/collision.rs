//! All-pairs collision detection and elastic response between particles.
//!
//! Pairs are visited in ascending `(i, j)` order with `i < j`, and each
//! response is applied in place before the next pair is examined: a particle
//! touching several neighbours in the same tick is resolved against each of
//! them in turn, using its already-updated state.

use crate::core::particle::{Bounds, Particle, DIM};

/// Below this center distance the collision normal is undefined.
const EPS_DIST: f64 = 1e-9;

/// What happened to a pair during resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairOutcome {
    /// Disks do not touch.
    Apart,
    /// Disks touch but approach too slowly to be worth resolving.
    TooSlow,
    /// Velocities exchanged along the normal and overlap removed.
    Resolved,
}

/// Pairwise collision resolver with a relative-speed cutoff.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionResolver {
    speed_threshold: f64,
}

impl CollisionResolver {
    pub fn new(speed_threshold: f64) -> Self {
        Self { speed_threshold }
    }

    #[inline]
    pub fn speed_threshold(&self) -> f64 {
        self.speed_threshold
    }

    /// Run one full pass over every unordered pair and return the number of
    /// resolved collisions.
    ///
    /// Frozen gas (`kelvin <= 0`) skips the pass entirely. Particles pushed apart
    /// are clamped back into `bounds` so the containment invariant survives the
    /// positional correction.
    pub fn resolve_all_pairs(&self, particles: &mut [Particle], bounds: &Bounds, kelvin: f64) -> u64 {
        if kelvin <= 0.0 {
            return 0;
        }
        let n = particles.len();
        let mut resolved = 0u64;
        for i in 0..n {
            for j in (i + 1)..n {
                let (head, tail) = particles.split_at_mut(j);
                let (a, b) = (&mut head[i], &mut tail[0]);
                if self.resolve_pair(a, b) == PairOutcome::Resolved {
                    a.clamp_into(bounds);
                    b.clamp_into(bounds);
                    resolved += 1;
                }
            }
        }
        resolved
    }

    /// Detect and resolve a single pair.
    pub fn resolve_pair(&self, a: &mut Particle, b: &mut Particle) -> PairOutcome {
        let dx = b.r[0] - a.r[0];
        let dy = b.r[1] - a.r[1];
        let contact = a.radius + b.radius;
        let dist_sq = dx * dx + dy * dy;
        if dist_sq > contact * contact {
            return PairOutcome::Apart;
        }

        let rel = [a.v[0] - b.v[0], a.v[1] - b.v[1]];
        if rel[0].hypot(rel[1]) < self.speed_threshold {
            return PairOutcome::TooSlow;
        }

        let dist = dist_sq.sqrt();
        // Coincident centers: fall back to the +x axis as the line of centers.
        let angle = if dist < EPS_DIST { 0.0 } else { dy.atan2(dx) };

        let ua = rotate(a.v, -angle);
        let ub = rotate(b.v, -angle);
        let (na, nb) = elastic_1d(a.mass, ua[0], b.mass, ub[0]);
        a.v = rotate([na, ua[1]], angle);
        b.v = rotate([nb, ub[1]], angle);

        let overlap = contact - dist;
        if overlap > 0.0 {
            let half = 0.5 * overlap;
            let n = [angle.cos(), angle.sin()];
            for k in 0..DIM {
                a.r[k] -= n[k] * half;
                b.r[k] += n[k] * half;
            }
        }
        PairOutcome::Resolved
    }
}

/// Closed-form 1D elastic collision of `m1` at `u1` with `m2` at `u2`.
#[inline]
pub fn elastic_1d(m1: f64, u1: f64, m2: f64, u2: f64) -> (f64, f64) {
    let total = m1 + m2;
    let v1 = ((m1 - m2) * u1 + 2.0 * m2 * u2) / total;
    let v2 = ((m2 - m1) * u2 + 2.0 * m1 * u1) / total;
    (v1, v2)
}

/// Rotate a vector counter-clockwise by `angle` radians.
#[inline]
fn rotate(v: [f64; DIM], angle: f64) -> [f64; DIM] {
    let (s, c) = angle.sin_cos();
    [v[0] * c - v[1] * s, v[0] * s + v[1] * c]
}
