use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{Error, Result};

/// Monotone collision tally owned by the world and drained by the meter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollisionCounter(u64);

impl CollisionCounter {
    #[inline]
    pub fn record(&mut self, n: u64) {
        self.0 = self.0.saturating_add(n);
    }

    #[inline]
    pub fn get(&self) -> u64 {
        self.0
    }

    /// Return the current tally and reset it to zero.
    #[inline]
    pub fn take(&mut self) -> u64 {
        std::mem::take(&mut self.0)
    }
}

/// How a window's collision tally is turned into a pressure figure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PressureNormalization {
    /// collisions / (particles * seconds)
    #[default]
    PerParticlePerSecond,
    /// collisions / seconds
    PerSecond,
    /// collisions / particles, window assumed to be one second
    PerParticle,
}

impl PressureNormalization {
    fn rate(self, collisions: u64, particles: usize, window_seconds: f64) -> f64 {
        let c = collisions as f64;
        let n = particles.max(1) as f64;
        match self {
            Self::PerParticlePerSecond => c / (n * window_seconds),
            Self::PerSecond => c / window_seconds,
            Self::PerParticle => c / n,
        }
    }
}

/// Windowed collision-rate pressure statistic.
#[derive(Debug, Clone, Default)]
pub struct PressureMeter {
    normalization: PressureNormalization,
    last: f64,
    samples: u64,
}

impl PressureMeter {
    pub fn new(normalization: PressureNormalization) -> Self {
        Self {
            normalization,
            last: 0.0,
            samples: 0,
        }
    }

    /// Close the current window: compute the rate, store it and reset `counter`.
    ///
    /// The rate is forced to zero when `kelvin <= 0`, whatever the tally says.
    ///
    /// Errors:
    /// - `Error::InvalidParam` if `window_seconds` is not finite and > 0; the counter is left as is.
    pub fn sample(
        &mut self,
        counter: &mut CollisionCounter,
        particles: usize,
        kelvin: f64,
        window_seconds: f64,
    ) -> Result<f64> {
        if !window_seconds.is_finite() || window_seconds <= 0.0 {
            return Err(Error::InvalidParam(
                "window_seconds must be finite and > 0".into(),
            ));
        }
        let collisions = counter.take();
        let rate = if kelvin <= 0.0 {
            0.0
        } else {
            self.normalization.rate(collisions, particles, window_seconds)
        };
        self.last = rate;
        self.samples += 1;
        trace!(collisions, particles, window_seconds, rate, "pressure sample");
        Ok(rate)
    }

    /// Most recent rate, 0 before the first sample.
    #[inline]
    pub fn last(&self) -> f64 {
        self.last
    }

    /// Number of windows closed so far.
    #[inline]
    pub fn samples(&self) -> u64 {
        self.samples
    }

    #[inline]
    pub fn normalization(&self) -> PressureNormalization {
        self.normalization
    }
}

/// Fixed-period trigger for pressure sampling, decoupled from the tick rate.
///
/// Feed it the duration of each frame; it reports one period's length in
/// seconds whenever a full period has accumulated.
#[derive(Debug, Clone)]
pub struct SampleClock {
    period: Duration,
    elapsed: Duration,
}

impl SampleClock {
    /// Errors: `Error::InvalidParam` for a zero period.
    pub fn new(period: Duration) -> Result<Self> {
        if period.is_zero() {
            return Err(Error::InvalidParam("sampling period must be > 0".into()));
        }
        Ok(Self {
            period,
            elapsed: Duration::ZERO,
        })
    }

    /// Account for `dt`; returns the window in seconds when a sample is due.
    ///
    /// The overshoot past the period carries into the next window, so samples
    /// stay phase-locked to the period whatever the frame length. The reported
    /// window is always one period.
    pub fn advance(&mut self, dt: Duration) -> Option<f64> {
        self.elapsed += dt;
        if self.elapsed < self.period {
            return None;
        }
        self.elapsed -= self.period;
        Some(self.period.as_secs_f64())
    }

    #[inline]
    pub fn period(&self) -> Duration {
        self.period
    }
}
