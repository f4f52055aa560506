use serde::Deserialize;

use crate::error::ConfigError;
use crate::progress::Phase;

const LAYOUT_EPSILON: f32 = 1e-6;
const PERCENT_EPSILON: f64 = 1e-9;
const BYTES_PER_PIXEL: usize = 4;

/// A slice `[start, end]` of the global 0..1 progress signal.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct PhaseRange {
    pub start: f32,
    pub end: f32,
}

impl PhaseRange {
    pub const fn new(start: f32, end: f32) -> Self {
        Self { start, end }
    }

    /// Maps a phase-local fraction onto the global progress signal.
    pub fn map(&self, local: f32) -> f32 {
        if local >= 1.0 {
            self.end
        } else {
            self.start + local.max(0.0) * (self.end - self.start)
        }
    }

    pub fn width(&self) -> f32 {
        self.end - self.start
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct PhaseLayout {
    pub initialize: PhaseRange,
    pub obstacles: PhaseRange,
    pub resources: PhaseRange,
    pub render: PhaseRange,
    pub rasterize: PhaseRange,
}

impl Default for PhaseLayout {
    fn default() -> Self {
        Self {
            initialize: PhaseRange::new(0.0, 0.2),
            obstacles: PhaseRange::new(0.2, 0.5),
            resources: PhaseRange::new(0.5, 0.8),
            render: PhaseRange::new(0.8, 0.9),
            rasterize: PhaseRange::new(0.9, 1.0),
        }
    }
}

impl PhaseLayout {
    pub fn range(&self, phase: Phase) -> PhaseRange {
        match phase {
            Phase::Initializing => self.initialize,
            Phase::Obstacles => self.obstacles,
            Phase::Resources => self.resources,
            Phase::Rendering => self.render,
            Phase::Rasterizing => self.rasterize,
        }
    }

    /// Ranges must tile `[0, 1]` in phase order without gaps or overlaps.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut cursor = 0.0f32;

        for phase in Phase::ALL {
            let range = self.range(phase);
            let fail = |reason| Err(ConfigError::PhaseLayout { phase, reason });

            if !(0.0..=1.0).contains(&range.start) || !(0.0..=1.0).contains(&range.end) {
                return fail("bounds must lie within [0, 1]");
            }
            if range.end < range.start {
                return fail("end precedes start");
            }
            if (range.start - cursor).abs() > LAYOUT_EPSILON {
                return fail("range does not start where the previous phase ends");
            }

            cursor = range.end;
        }

        if (cursor - 1.0).abs() > LAYOUT_EPSILON {
            return Err(ConfigError::PhaseLayout {
                phase: Phase::Rasterizing,
                reason: "last phase must end at 1",
            });
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub width: usize,
    pub height: usize,
    pub obstacle_percent: f64,
    pub resource_percent: f64,
    /// Fixed seed for reproducible maps; drawn at random when absent.
    pub seed: Option<u64>,
    /// Placement log/progress interval, in successful placements.
    pub log_every: usize,
    /// Placement attempts allowed per grid cell before a phase is reported
    /// as stalled.
    pub attempt_factor: u64,
    pub phases: PhaseLayout,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            width: 10,
            height: 10,
            obstacle_percent: 0.1,
            resource_percent: 0.02,
            seed: None,
            log_every: 100,
            attempt_factor: 64,
            phases: PhaseLayout::default(),
        }
    }
}

impl GenerationConfig {
    pub fn new(width: usize, height: usize, obstacle_percent: f64, resource_percent: f64) -> Self {
        Self {
            width,
            height,
            obstacle_percent,
            resource_percent,
            ..Default::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Saturates instead of overflowing; `validate` rejects such sizes.
    pub fn cell_count(&self) -> usize {
        self.width.saturating_mul(self.height)
    }

    /// `(obstacles, resources)` to place, each rounded to the nearest cell
    /// with ties going to the even count (2.5 cells places 2).
    pub fn target_counts(&self) -> (usize, usize) {
        let total = self.cell_count() as f64;

        (
            (total * self.obstacle_percent).round_ties_even() as usize,
            (total * self.resource_percent).round_ties_even() as usize,
        )
    }

    /// Per-phase cap on sampled coordinates.
    pub fn attempt_budget(&self) -> u64 {
        (self.cell_count() as u64).saturating_mul(self.attempt_factor)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 {
            return Err(ConfigError::ZeroWidth);
        }
        if self.height == 0 {
            return Err(ConfigError::ZeroHeight);
        }

        // The pixel buffer takes u32 dimensions and four bytes per cell.
        let fits = u32::try_from(self.width).is_ok()
            && u32::try_from(self.height).is_ok()
            && self
                .width
                .checked_mul(self.height)
                .and_then(|cells| cells.checked_mul(BYTES_PER_PIXEL))
                .is_some();
        if !fits {
            return Err(ConfigError::TooLarge {
                width: self.width,
                height: self.height,
            });
        }

        for (name, value) in [
            ("obstacle", self.obstacle_percent),
            ("resource", self.resource_percent),
        ] {
            // NaN fails `contains` too
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::PercentOutOfRange { name, value });
            }
        }

        if self.obstacle_percent + self.resource_percent > 1.0 + PERCENT_EPSILON {
            return Err(ConfigError::PercentSum {
                obstacle: self.obstacle_percent,
                resource: self.resource_percent,
            });
        }

        let (obstacles, resources) = self.target_counts();
        if obstacles + resources > self.cell_count() {
            return Err(ConfigError::TooManyTiles {
                requested: obstacles + resources,
                available: self.cell_count(),
            });
        }

        if self.log_every == 0 {
            return Err(ConfigError::ZeroLogInterval);
        }
        if self.attempt_factor == 0 {
            return Err(ConfigError::ZeroAttemptFactor);
        }

        self.phases.validate()
    }
}
