//! gassim2d: a tick-driven 2D ideal gas.
//!
//! Identical hard disks fly freely, reflect elastically off four walls (the top
//! one is a movable compressor) and collide elastically with each other. A
//! temperature setting drives Gaussian velocity sampling, and pressure is
//! reported as a collision rate.
//!
//! ```no_run
//! use gassim2d::{SimulationWorld, WorldConfig};
//!
//! # fn main() -> gassim2d::error::Result<()> {
//! let mut world = SimulationWorld::new(WorldConfig::default())?;
//! world.configure(500.0, 0.0, 100.0)?;
//! for _ in 0..60 {
//!     world.step();
//! }
//! let pressure = world.sample(1.0)?;
//! println!("pressure: {pressure:.2} collisions/particle/s");
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod core;
pub mod error;

pub use crate::config::{Settings, WorldConfig};
pub use crate::core::{PressureNormalization, SimulationWorld, StepStats, WorldSnapshot};
