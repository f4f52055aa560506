use crate::generator::GenerationState;
use crate::progress::Phase;
use crate::tile::Tile;

/// Reasons a [`GenerationConfig`](crate::config::GenerationConfig) is rejected
/// before any grid is allocated.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("width must be greater than zero")]
    ZeroWidth,
    #[error("height must be greater than zero")]
    ZeroHeight,
    #[error("{name} percent must be within [0, 1], got {value}")]
    PercentOutOfRange { name: &'static str, value: f64 },
    #[error("obstacle ({obstacle}) and resource ({resource}) percents add up to more than 1")]
    PercentSum { obstacle: f64, resource: f64 },
    #[error("a {width}x{height} map is too large to allocate")]
    TooLarge { width: usize, height: usize },
    #[error("{requested} tiles requested but the grid only has {available} cells")]
    TooManyTiles { requested: usize, available: usize },
    #[error("log interval must be greater than zero")]
    ZeroLogInterval,
    #[error("attempt factor must be greater than zero")]
    ZeroAttemptFactor,
    #[error("invalid progress range for {phase}: {reason}")]
    PhaseLayout { phase: Phase, reason: &'static str },
}

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),
    /// Rejection sampling ran out of its attempt budget.
    #[error("{tile} placement stalled at {placed}/{target} after {attempts} attempts")]
    PlacementStalled {
        tile: Tile,
        placed: usize,
        target: usize,
        attempts: u64,
    },
    #[error("generation failed during {phase}: {message}")]
    Failed { phase: Phase, message: String },
    #[error("generation worker panicked while {state:?}")]
    Panicked { state: GenerationState },
}

impl GenerationError {
    /// The phase the run was in when it failed, if it got that far.
    pub fn phase(&self) -> Option<Phase> {
        match self {
            GenerationError::InvalidConfig(_) | GenerationError::Panicked { .. } => None,
            GenerationError::PlacementStalled {
                tile: Tile::Resource,
                ..
            } => Some(Phase::Resources),
            GenerationError::PlacementStalled { .. } => Some(Phase::Obstacles),
            GenerationError::Failed { phase, .. } => Some(*phase),
        }
    }
}
