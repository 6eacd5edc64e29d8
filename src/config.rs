//! World configuration and normalization of adapter input.
//!
//! `WorldConfig` fixes the geometry and physical constants of a world.
//! `Settings` carries the three values an adapter may change at runtime
//! (particle count, temperature, compressor height); they are never rejected,
//! only clamped into range by [`WorldConfig::normalize`].

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::pressure::PressureNormalization;
use crate::error::{Error, Result};

/// Offset between the Celsius and Kelvin scales.
pub const KELVIN_OFFSET: f64 = 273.15;

/// Absolute zero expressed in degrees Celsius.
pub const ABSOLUTE_ZERO_CELSIUS: f64 = -KELVIN_OFFSET;

/// Convert a Celsius temperature to Kelvin.
#[inline]
pub fn celsius_to_kelvin(celsius: f64) -> f64 {
    celsius + KELVIN_OFFSET
}

/// Static description of a simulation world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Domain width in simulation units.
    pub width: f64,
    /// Domain height in simulation units. `y` grows downward, the compressor sits at the top.
    pub height: f64,
    /// Radius shared by every particle.
    pub radius: f64,
    /// Mass shared by every particle.
    pub mass: f64,
    /// Initial particle count (clamped like any other count).
    pub particle_count: usize,
    /// Initial temperature in degrees Celsius.
    pub temperature_celsius: f64,
    /// Initial compressor height.
    pub boundary_top: f64,
    /// Pairs approaching slower than this are not resolved.
    pub collision_speed_threshold: f64,
    /// Per-axis velocity variance per Kelvin.
    pub velocity_scale: f64,
    /// Lower bound for the particle count.
    pub min_particles: usize,
    /// Upper bound for the particle count.
    pub max_particles: usize,
    /// Upper bound for the temperature in degrees Celsius; hotter input is capped here.
    pub max_temperature_celsius: f64,
    /// Upper bound for the compressor height.
    pub max_boundary_top: f64,
    /// How the pressure meter normalizes the collision count.
    pub normalization: PressureNormalization,
    /// RNG seed; `None` draws one from the thread RNG.
    pub seed: Option<u64>,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            radius: 2.0,
            mass: 1.0,
            particle_count: 500,
            temperature_celsius: 25.0,
            boundary_top: 0.0,
            collision_speed_threshold: 0.5,
            velocity_scale: 0.1,
            min_particles: 100,
            max_particles: 2500,
            max_temperature_celsius: 1000.0,
            max_boundary_top: 450.0,
            normalization: PressureNormalization::default(),
            seed: None,
        }
    }
}

impl WorldConfig {
    /// Load a configuration from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let cfg: Self = serde_json::from_str(&text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Check geometry and constants.
    ///
    /// Errors:
    /// - `Error::InvalidParam` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if !self.radius.is_finite() || self.radius <= 0.0 {
            return Err(Error::InvalidParam("radius must be finite and > 0".into()));
        }
        if !self.mass.is_finite() || self.mass <= 0.0 {
            return Err(Error::InvalidParam("mass must be finite and > 0".into()));
        }
        for (name, l) in [("width", self.width), ("height", self.height)] {
            if !l.is_finite() || l < 2.0 * self.radius {
                return Err(Error::InvalidParam(format!(
                    "{name} must be finite and at least 2 * radius"
                )));
            }
        }
        if self.min_particles > self.max_particles {
            return Err(Error::InvalidParam(
                "min_particles must not exceed max_particles".into(),
            ));
        }
        if !self.collision_speed_threshold.is_finite() || self.collision_speed_threshold < 0.0 {
            return Err(Error::InvalidParam(
                "collision_speed_threshold must be finite and >= 0".into(),
            ));
        }
        if !self.velocity_scale.is_finite() || self.velocity_scale < 0.0 {
            return Err(Error::InvalidParam(
                "velocity_scale must be finite and >= 0".into(),
            ));
        }
        if !self.max_temperature_celsius.is_finite()
            || self.max_temperature_celsius < ABSOLUTE_ZERO_CELSIUS
        {
            return Err(Error::InvalidParam(
                "max_temperature_celsius must be finite and above absolute zero".into(),
            ));
        }
        if !self.max_boundary_top.is_finite() || self.max_boundary_top < 0.0 {
            return Err(Error::InvalidParam(
                "max_boundary_top must be finite and >= 0".into(),
            ));
        }
        Ok(())
    }

    /// Highest legal compressor position: leaves at least one particle diameter of room.
    pub fn boundary_limit(&self) -> f64 {
        self.max_boundary_top
            .min(self.height - 2.0 * self.radius)
            .max(0.0)
    }

    /// Clamp a raw particle count into `[min_particles, max_particles]`.
    /// NaN maps to the lower bound.
    pub fn clamp_particle_count(&self, raw: f64) -> usize {
        let (lo, hi) = (self.min_particles, self.max_particles);
        if raw.is_nan() {
            return lo;
        }
        raw.round().clamp(lo as f64, hi as f64) as usize
    }

    /// Clamp a Celsius temperature into `[-273.15, max_temperature_celsius]`.
    ///
    /// Inputs below absolute zero become -273.15 (0 K). Inputs above
    /// `max_temperature_celsius` (1000 by default) are capped to it. NaN maps
    /// to absolute zero.
    pub fn clamp_temperature(&self, raw: f64) -> f64 {
        if raw.is_nan() {
            return ABSOLUTE_ZERO_CELSIUS;
        }
        raw.clamp(ABSOLUTE_ZERO_CELSIUS, self.max_temperature_celsius)
    }

    /// Clamp a compressor height into `[0, boundary_limit()]`. NaN maps to 0.
    pub fn clamp_boundary_top(&self, raw: f64) -> f64 {
        if raw.is_nan() {
            return 0.0;
        }
        raw.clamp(0.0, self.boundary_limit())
    }

    /// Normalize adapter input into values that can take effect.
    pub fn normalize(&self, settings: Settings) -> Normalized {
        Normalized {
            particle_count: self.clamp_particle_count(settings.particle_count),
            temperature_celsius: self.clamp_temperature(settings.temperature_celsius),
            boundary_top: self.clamp_boundary_top(settings.boundary_top),
        }
    }

    /// The configured initial values, normalized.
    pub fn initial(&self) -> Normalized {
        self.normalize(Settings::new(
            self.particle_count as f64,
            self.temperature_celsius,
            self.boundary_top,
        ))
    }
}

/// Raw runtime settings as received from an adapter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Settings {
    pub particle_count: f64,
    pub temperature_celsius: f64,
    pub boundary_top: f64,
}

impl Settings {
    pub fn new(particle_count: f64, temperature_celsius: f64, boundary_top: f64) -> Self {
        Self {
            particle_count,
            temperature_celsius,
            boundary_top,
        }
    }

    /// Parse textual widget values. Anything that is not a number becomes NaN,
    /// which normalization clamps to the lower bound of the field.
    pub fn parse_lenient(particle_count: &str, temperature_celsius: &str, boundary_top: &str) -> Self {
        fn num(s: &str) -> f64 {
            s.trim().parse::<f64>().unwrap_or(f64::NAN)
        }
        Self::new(num(particle_count), num(temperature_celsius), num(boundary_top))
    }
}

/// Settings after clamping; these are the values that take effect.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalized {
    pub particle_count: usize,
    pub temperature_celsius: f64,
    pub boundary_top: f64,
}

impl Normalized {
    #[inline]
    pub fn temperature_kelvin(&self) -> f64 {
        celsius_to_kelvin(self.temperature_celsius)
    }
}
