use serde::Serialize;
use tracing::{debug, warn};

use crate::config::{celsius_to_kelvin, Normalized, Settings, WorldConfig};
use crate::core::collision::CollisionResolver;
use crate::core::particle::{Bounds, Particle, DIM};
use crate::core::pressure::{CollisionCounter, PressureMeter, PressureNormalization};
use crate::core::sampler::RandomSampler;
use crate::error::{Error, Result};

/// Rejection-sampling budget per particle.
const MAX_PLACEMENT_ATTEMPTS: usize = 100_000;

/// Collisions produced by a single tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StepStats {
    /// Wall reflections (a corner hit counts twice).
    pub wall_hits: u64,
    /// Resolved particle-particle collisions.
    pub pair_collisions: u64,
}

impl StepStats {
    #[inline]
    pub fn total(&self) -> u64 {
        self.wall_hits + self.pair_collisions
    }
}

/// Read-only view of the world for a presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorldSnapshot {
    pub tick: u64,
    /// Chamber walls; `bounds.top` is the compressor height.
    pub bounds: Bounds,
    pub radius: f64,
    pub temperature_celsius: f64,
    pub temperature_kelvin: f64,
    pub particle_count: usize,
    pub pressure: f64,
    pub positions: Vec<[f64; DIM]>,
}

/// A 2D chamber of identical disks under a movable compressor wall.
///
/// The world owns the particles and the collision counter. All mutation goes
/// through [`step`](Self::step), [`configure`](Self::configure) and
/// [`sample`](Self::sample), each of which runs to completion.
#[derive(Debug)]
pub struct SimulationWorld {
    config: WorldConfig,
    particles: Vec<Particle>,
    sampler: RandomSampler,
    resolver: CollisionResolver,
    counter: CollisionCounter,
    meter: PressureMeter,
    particle_count: usize,
    temperature_celsius: f64,
    boundary_top: f64,
    ticks: u64,
}

impl SimulationWorld {
    /// Build a world from `config`, placing `config.particle_count` particles
    /// (after clamping) with rejection sampling and thermal velocities.
    ///
    /// Errors:
    /// - `Error::InvalidParam` for invalid geometry or constants.
    /// - `Error::Placement` if the chamber is too crowded to place every particle.
    pub fn new(config: WorldConfig) -> Result<Self> {
        config.validate()?;
        let initial = config.initial();
        let mut world = Self {
            sampler: RandomSampler::new(config.seed),
            resolver: CollisionResolver::new(config.collision_speed_threshold),
            meter: PressureMeter::new(config.normalization),
            counter: CollisionCounter::default(),
            particles: Vec::new(),
            particle_count: 0,
            temperature_celsius: initial.temperature_celsius,
            boundary_top: initial.boundary_top,
            ticks: 0,
            config,
        };
        world.reinitialize(initial)?;
        Ok(world)
    }

    /// Advance one tick: integrate and reflect every particle in order, then
    /// run one pairwise collision pass.
    pub fn step(&mut self) -> StepStats {
        let bounds = self.bounds();
        let kelvin = self.temperature_kelvin();
        let mut wall_hits = 0u64;
        for p in &mut self.particles {
            wall_hits += u64::from(p.integrate_and_reflect(&bounds));
        }
        let pair_collisions = self
            .resolver
            .resolve_all_pairs(&mut self.particles, &bounds, kelvin);

        let stats = StepStats {
            wall_hits,
            pair_collisions,
        };
        self.counter.record(stats.total());
        self.ticks += 1;
        stats
    }

    /// Apply new runtime settings. Inputs are clamped, never rejected.
    ///
    /// - A different particle count re-creates the whole particle set.
    /// - Otherwise a different temperature re-draws every velocity, and a lower
    ///   compressor pushes the particles above it back down.
    ///
    /// Errors:
    /// - `Error::Placement` if re-initialization cannot place the particles; the
    ///   world is left unchanged in that case.
    pub fn configure(&mut self, count: f64, temperature_celsius: f64, boundary_top: f64) -> Result<()> {
        self.apply(Settings::new(count, temperature_celsius, boundary_top))
    }

    /// [`configure`](Self::configure) taking a [`Settings`] value.
    pub fn apply(&mut self, settings: Settings) -> Result<()> {
        let next = self.config.normalize(settings);

        if next.particle_count != self.particle_count {
            return self.reinitialize(next);
        }

        if next.temperature_celsius != self.temperature_celsius {
            self.temperature_celsius = next.temperature_celsius;
            self.resample_velocities();
        }

        if next.boundary_top != self.boundary_top {
            self.boundary_top = next.boundary_top;
            let snapped = self.compress();
            self.counter.record(snapped);
            debug!(boundary_top = self.boundary_top, snapped, "compressor moved");
        }
        Ok(())
    }

    /// Close the pressure window of `window_seconds` and return the rate.
    ///
    /// Errors: `Error::InvalidParam` for a non-positive or non-finite window.
    pub fn sample(&mut self, window_seconds: f64) -> Result<f64> {
        let kelvin = self.temperature_kelvin();
        self.meter
            .sample(&mut self.counter, self.particle_count, kelvin, window_seconds)
    }

    // ============ Accessors ============

    #[inline]
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Positions as a Vec of fixed-size arrays.
    pub fn positions(&self) -> Vec<[f64; DIM]> {
        self.particles.iter().map(|p| p.r).collect()
    }

    /// Velocities as a Vec of fixed-size arrays.
    pub fn velocities(&self) -> Vec<[f64; DIM]> {
        self.particles.iter().map(|p| p.v).collect()
    }

    #[inline]
    pub fn particle_count(&self) -> usize {
        self.particle_count
    }

    #[inline]
    pub fn radius(&self) -> f64 {
        self.config.radius
    }

    #[inline]
    pub fn temperature_celsius(&self) -> f64 {
        self.temperature_celsius
    }

    #[inline]
    pub fn temperature_kelvin(&self) -> f64 {
        celsius_to_kelvin(self.temperature_celsius)
    }

    #[inline]
    pub fn boundary_top(&self) -> f64 {
        self.boundary_top
    }

    /// Last sampled pressure.
    #[inline]
    pub fn pressure(&self) -> f64 {
        self.meter.last()
    }

    /// Collisions counted since the last sample.
    #[inline]
    pub fn pending_collisions(&self) -> u64 {
        self.counter.get()
    }

    /// Relative speed below which touching pairs are left alone.
    #[inline]
    pub fn speed_threshold(&self) -> f64 {
        self.resolver.speed_threshold()
    }

    #[inline]
    pub fn normalization(&self) -> PressureNormalization {
        self.meter.normalization()
    }

    /// Number of ticks since construction.
    #[inline]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    #[inline]
    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Current chamber walls.
    #[inline]
    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.config.width, self.config.height, self.boundary_top)
    }

    /// Compute total kinetic energy (diagnostic).
    pub fn kinetic_energy(&self) -> f64 {
        self.particles.iter().map(|p| p.kinetic_energy()).sum()
    }

    /// Total momentum (diagnostic).
    pub fn momentum(&self) -> [f64; DIM] {
        self.particles.iter().fold([0.0; DIM], |mut acc, p| {
            let m = p.momentum();
            for k in 0..DIM {
                acc[k] += m[k];
            }
            acc
        })
    }

    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            tick: self.ticks,
            bounds: self.bounds(),
            radius: self.config.radius,
            temperature_celsius: self.temperature_celsius,
            temperature_kelvin: self.temperature_kelvin(),
            particle_count: self.particle_count,
            pressure: self.pressure(),
            positions: self.positions(),
        }
    }

    // ============ Internal helpers ============

    /// Replace the particle set. The new set is built before anything is
    /// committed, so a placement failure leaves the world as it was.
    fn reinitialize(&mut self, next: Normalized) -> Result<()> {
        let kelvin = next.temperature_kelvin();
        let bounds = Bounds::new(self.config.width, self.config.height, next.boundary_top);
        let particles = self.place_particles(next.particle_count, &bounds, kelvin)?;

        self.particles = particles;
        self.particle_count = next.particle_count;
        self.temperature_celsius = next.temperature_celsius;
        self.boundary_top = next.boundary_top;
        debug!(
            count = self.particle_count,
            kelvin,
            boundary_top = self.boundary_top,
            "particles re-initialized"
        );
        Ok(())
    }

    fn place_particles(&mut self, count: usize, bounds: &Bounds, kelvin: f64) -> Result<Vec<Particle>> {
        let radius = self.config.radius;
        let ranges = bounds.center_range(radius);
        let mut particles: Vec<Particle> = Vec::with_capacity(count);
        for index in 0..count {
            let mut attempts = 0usize;
            let r = loop {
                if attempts >= MAX_PLACEMENT_ATTEMPTS {
                    warn!(index, count, "particle placement exhausted");
                    return Err(Error::Placement {
                        index,
                        requested: count,
                        attempts,
                    });
                }
                attempts += 1;
                let mut r = [0.0_f64; DIM];
                for (r_k, &(lo, hi)) in r.iter_mut().zip(ranges.iter()) {
                    *r_k = self.sampler.uniform(lo, hi);
                }
                if !overlaps_existing(&particles, &r, radius) {
                    break r;
                }
            };
            let v = self
                .sampler
                .thermal_velocity(kelvin, self.config.velocity_scale);
            particles.push(Particle::new(index as u32, r, v, radius, self.config.mass)?);
        }
        Ok(particles)
    }

    fn resample_velocities(&mut self) {
        let kelvin = self.temperature_kelvin();
        let scale = self.config.velocity_scale;
        for p in &mut self.particles {
            p.v = self.sampler.thermal_velocity(kelvin, scale);
        }
        debug!(kelvin, "velocities re-sampled");
    }

    /// Push particles caught above the compressor down to it and bounce them.
    /// Returns how many were moved.
    fn compress(&mut self) -> u64 {
        let floor = self.boundary_top;
        let mut snapped = 0u64;
        for p in &mut self.particles {
            let lo = floor + p.radius;
            if p.r[1] < lo {
                p.r[1] = lo;
                p.v[1] = -p.v[1];
                snapped += 1;
            }
        }
        snapped
    }
}

// ============ Utility helpers ============

/// True if a disk at `r` would come within `2 * radius` of any placed particle.
fn overlaps_existing(existing: &[Particle], r: &[f64; DIM], radius: f64) -> bool {
    let min_sq = (2.0 * radius) * (2.0 * radius);
    existing.iter().any(|p| {
        let dx = r[0] - p.r[0];
        let dy = r[1] - p.r[1];
        dx * dx + dy * dy <= min_sq
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config(seed: u64) -> WorldConfig {
        WorldConfig {
            width: 200.0,
            height: 150.0,
            particle_count: 40,
            temperature_celsius: 20.0,
            min_particles: 10,
            max_particles: 200,
            max_boundary_top: 100.0,
            seed: Some(seed),
            ..WorldConfig::default()
        }
    }

    fn assert_contained(world: &SimulationWorld) {
        let b = world.bounds();
        for p in world.particles() {
            assert!(b.contains(&p.r, p.radius), "particle {} escaped: {:?}", p.id, p.r);
        }
    }

    #[test]
    fn make_small_world_ok() -> Result<()> {
        let world = SimulationWorld::new(small_config(1234))?;
        assert_eq!(world.particle_count(), 40);
        assert_eq!(world.particles().len(), 40);
        assert!(world.kinetic_energy().is_finite() && world.kinetic_energy() > 0.0);
        assert_eq!(world.pending_collisions(), 0);
        assert_contained(&world);
        Ok(())
    }

    #[test]
    fn invalid_geometry_is_rejected() {
        let cfg = WorldConfig {
            radius: -1.0,
            ..small_config(1)
        };
        assert!(matches!(SimulationWorld::new(cfg), Err(Error::InvalidParam(_))));
    }

    #[test]
    fn overcrowded_chamber_fails_placement() {
        let cfg = WorldConfig {
            width: 20.0,
            height: 20.0,
            particle_count: 100,
            min_particles: 1,
            max_boundary_top: 0.0,
            ..small_config(9)
        };
        let err = SimulationWorld::new(cfg).unwrap_err();
        assert!(matches!(err, Error::Placement { requested: 100, .. }));
    }

    #[test]
    fn failed_reinitialization_keeps_previous_state() -> Result<()> {
        let cfg = WorldConfig {
            width: 40.0,
            height: 40.0,
            particle_count: 5,
            min_particles: 1,
            max_particles: 1000,
            max_boundary_top: 0.0,
            ..small_config(17)
        };
        let mut world = SimulationWorld::new(cfg)?;
        let before = world.particles().to_vec();
        assert!(world.configure(900.0, 20.0, 0.0).is_err());
        assert_eq!(world.particle_count(), 5);
        assert_eq!(world.particles(), &before[..]);
        Ok(())
    }

    #[test]
    fn same_seed_same_world() -> Result<()> {
        let mut a = SimulationWorld::new(small_config(77))?;
        let mut b = SimulationWorld::new(small_config(77))?;
        for _ in 0..50 {
            assert_eq!(a.step(), b.step());
        }
        assert_eq!(a.particles(), b.particles());
        Ok(())
    }

    #[test]
    fn step_counts_into_the_counter() -> Result<()> {
        let mut world = SimulationWorld::new(small_config(5))?;
        let mut total = 0;
        for _ in 0..200 {
            let before = world.pending_collisions();
            total += world.step().total();
            assert!(world.pending_collisions() >= before);
            assert_contained(&world);
        }
        assert_eq!(world.pending_collisions(), total);
        assert!(total > 0);
        assert_eq!(world.ticks(), 200);
        Ok(())
    }

    #[test]
    fn count_change_reinitializes() -> Result<()> {
        let mut world = SimulationWorld::new(small_config(6))?;
        world.configure(60.0, 20.0, 0.0)?;
        assert_eq!(world.particle_count(), 60);
        assert_eq!(world.particles().len(), 60);
        let ids: Vec<u32> = world.particles().iter().map(|p| p.id).collect();
        assert_eq!(ids, (0..60).collect::<Vec<u32>>());

        // Clamped at both ends.
        world.configure(1.0, 20.0, 0.0)?;
        assert_eq!(world.particle_count(), 10);
        world.configure(10_000.0, 20.0, 0.0)?;
        assert_eq!(world.particle_count(), 200);
        Ok(())
    }

    #[test]
    fn reinitialization_places_below_the_compressor() -> Result<()> {
        let mut world = SimulationWorld::new(small_config(8))?;
        world.configure(80.0, 20.0, 60.0)?;
        assert_eq!(world.boundary_top(), 60.0);
        for p in world.particles() {
            assert!(p.r[1] >= 60.0 + p.radius);
        }
        // Placement is not a wall collision.
        assert_eq!(world.pending_collisions(), 0);
        Ok(())
    }

    #[test]
    fn temperature_change_redraws_velocities_only() -> Result<()> {
        let mut world = SimulationWorld::new(small_config(10))?;
        let pos = world.positions();
        let vel = world.velocities();
        world.configure(40.0, 500.0, 0.0)?;
        assert_eq!(world.positions(), pos);
        assert_ne!(world.velocities(), vel);
        assert!((world.temperature_kelvin() - 773.15).abs() < 1e-9);
        Ok(())
    }

    #[test]
    fn absolute_zero_zeroes_velocities() -> Result<()> {
        let mut world = SimulationWorld::new(small_config(11))?;
        world.configure(40.0, -500.0, 0.0)?;
        assert_eq!(world.temperature_kelvin(), 0.0);
        assert!(world.velocities().iter().all(|v| *v == [0.0, 0.0]));
        world.step();
        assert!(world.velocities().iter().all(|v| *v == [0.0, 0.0]));
        Ok(())
    }

    #[test]
    fn lowering_the_compressor_snaps_and_counts() -> Result<()> {
        let mut world = SimulationWorld::new(small_config(12))?;
        let above = world
            .particles()
            .iter()
            .filter(|p| p.r[1] < 50.0 + p.radius)
            .count() as u64;
        assert!(above > 0);
        let vy_before: Vec<f64> = world
            .particles()
            .iter()
            .filter(|p| p.r[1] < 50.0 + p.radius)
            .map(|p| p.v[1])
            .collect();

        world.configure(40.0, 20.0, 50.0)?;
        assert_eq!(world.pending_collisions(), above);
        let snapped: Vec<&Particle> = world
            .particles()
            .iter()
            .filter(|p| p.r[1] == 50.0 + p.radius)
            .collect();
        assert_eq!(snapped.len() as u64, above);
        for (p, vy) in snapped.iter().zip(vy_before) {
            assert_eq!(p.v[1], -vy);
        }
        assert_contained(&world);
        Ok(())
    }

    #[test]
    fn raising_the_compressor_moves_nothing() -> Result<()> {
        let mut world = SimulationWorld::new(WorldConfig {
            boundary_top: 50.0,
            ..small_config(13)
        })?;
        let before = world.particles().to_vec();
        world.configure(40.0, 20.0, 10.0)?;
        assert_eq!(world.particles(), &before[..]);
        assert_eq!(world.pending_collisions(), 0);
        Ok(())
    }

    #[test]
    fn sample_drains_the_counter() -> Result<()> {
        let mut world = SimulationWorld::new(small_config(14))?;
        for _ in 0..100 {
            world.step();
        }
        let pending = world.pending_collisions();
        let rate = world.sample(2.0)?;
        assert!((rate - pending as f64 / (40.0 * 2.0)).abs() < 1e-12);
        assert_eq!(world.pending_collisions(), 0);
        assert_eq!(world.pressure(), rate);
        assert!(world.sample(0.0).is_err());
        Ok(())
    }

    #[test]
    fn snapshot_reflects_state() -> Result<()> {
        let mut world = SimulationWorld::new(small_config(15))?;
        world.step();
        let snap = world.snapshot();
        assert_eq!(snap.tick, 1);
        assert_eq!(snap.particle_count, 40);
        assert_eq!(snap.positions.len(), 40);
        assert_eq!(snap.radius, 2.0);
        assert_eq!(snap.bounds, Bounds::new(200.0, 150.0, 0.0));
        assert_eq!(world.speed_threshold(), 0.5);
        assert_eq!(world.normalization(), PressureNormalization::PerParticlePerSecond);

        let json = serde_json::to_value(&snap)?;
        assert_eq!(json["bounds"]["width"], 200.0);
        assert_eq!(json["bounds"]["top"], 0.0);
        assert!((snap.temperature_kelvin - 293.15).abs() < 1e-9);
        Ok(())
    }

    #[test]
    fn overlap_check_is_strict() -> Result<()> {
        let p = Particle::new(0, [10.0, 10.0], [0.0, 0.0], 2.0, 1.0)?;
        assert!(overlaps_existing(std::slice::from_ref(&p), &[14.0, 10.0], 2.0));
        assert!(!overlaps_existing(std::slice::from_ref(&p), &[14.001, 10.0], 2.0));
        assert!(!overlaps_existing(&[], &[10.0, 10.0], 2.0));
        Ok(())
    }
}
