use log::Level;

use crate::error::GenerationError;
use crate::generator::{RunContext, Stop};
use crate::grid::{Grid, Size};
use crate::progress::Phase;
use crate::tile::TileCell;

/// Builds a fresh all-empty grid one row at a time.
pub struct TileInitializer {
    size: Size,
}

impl TileInitializer {
    pub fn new(size: Size) -> Self {
        Self { size }
    }

    /// Polls for cancellation before every row and reports progress after it.
    /// A cancelled run returns no grid at all.
    pub(crate) fn run(&self, ctx: &RunContext) -> Result<Grid<TileCell>, Stop> {
        let Size { width, height } = self.size;
        let mut cells = Vec::with_capacity(self.size.area());

        for y in 0..height {
            ctx.checkpoint()?;

            cells.extend((0..width).map(|_| TileCell::empty()));

            ctx.progress.report(Phase::Initializing, (y + 1) as f32 / height as f32);
            ctx.log(Level::Debug, &format!("Initialized row {}", y));
        }

        Grid::from_vec(width, height, cells).map_err(|message| {
            Stop::Failed(GenerationError::Failed {
                phase: Phase::Initializing,
                message: message.to_owned(),
            })
        })
    }
}
