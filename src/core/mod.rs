//! Core simulation types for the 2D gas chamber.
//!
//! Leaf to root: `sampler` draws random numbers, `particle` moves single disks
//! and bounces them off the walls, `collision` resolves disk pairs, `world`
//! ties them together into a tick, and `pressure` turns the collision tally
//! into a rate.

pub mod collision;
pub mod particle;
pub mod pressure;
pub mod sampler;
pub mod world;

pub use collision::{CollisionResolver, PairOutcome};
pub use particle::{Bounds, Particle};
pub use pressure::{CollisionCounter, PressureMeter, PressureNormalization, SampleClock};
pub use sampler::RandomSampler;
pub use world::{SimulationWorld, StepStats, WorldSnapshot};
