use log::Level;
use rand::{Rng, SeedableRng};
use rand_xorshift::XorShiftRng;

use crate::error::GenerationError;
use crate::generator::{RunContext, Stop};
use crate::grid::Grid;
use crate::progress::Phase;
use crate::tile::{Tile, TileCell};

const SEED_STRIDE: u64 = 0x9E37_79B9_7F4A_7C15;

/// One placement phase: put `target` tiles of one type onto empty cells.
#[derive(Debug, Clone, Copy)]
pub struct PlacementJob {
    pub tile: Tile,
    pub target: usize,
    pub phase: Phase,
    pub seed: u64,
}

impl PlacementJob {
    /// Each job gets its own generator, derived from the run seed and the
    /// job's index, so concurrent phases never share RNG state.
    pub fn new(tile: Tile, target: usize, phase: Phase, run_seed: u64, index: u64) -> Self {
        Self {
            tile,
            target,
            phase,
            seed: run_seed ^ index.wrapping_add(1).wrapping_mul(SEED_STRIDE),
        }
    }
}

/// Rejection-sampling placement over a shared grid.
///
/// Cells are claimed with a compare-and-set, so any number of jobs may run
/// against the same grid at once.
pub struct PlacementEngine<'g> {
    grid: &'g Grid<TileCell>,
    attempt_budget: u64,
    log_every: usize,
}

impl<'g> PlacementEngine<'g> {
    pub fn new(grid: &'g Grid<TileCell>, attempt_budget: u64, log_every: usize) -> Self {
        Self {
            grid,
            attempt_budget,
            log_every: log_every.max(1),
        }
    }

    /// Runs both jobs in parallel and waits for both to finish.
    ///
    /// When one job fails the other is stopped at its next poll, and the
    /// failure is returned in preference to the induced stop.
    pub(crate) fn place_concurrently(
        &self,
        first: PlacementJob,
        second: PlacementJob,
        ctx: &RunContext,
    ) -> Result<(usize, usize), Stop> {
        let run = |job: PlacementJob| {
            ctx.log(Level::Info, &format!("Placing {} tiles...", job.tile));

            let result = self.place(job, ctx);
            if let Err(Stop::Failed(_)) = result {
                ctx.abort();
            }
            result
        };

        match rayon::join(|| run(first), || run(second)) {
            (Ok(a), Ok(b)) => Ok((a, b)),
            (Err(Stop::Failed(err)), _) | (_, Err(Stop::Failed(err))) => Err(Stop::Failed(err)),
            _ => Err(Stop::Cancelled),
        }
    }

    /// Places `job.target` tiles and returns how many were placed.
    pub(crate) fn place(&self, job: PlacementJob, ctx: &RunContext) -> Result<usize, Stop> {
        let mut rng = XorShiftRng::seed_from_u64(job.seed);
        let (width, height) = (self.grid.width(), self.grid.height());
        let mut placed = 0;
        let mut attempts = 0u64;

        while placed < job.target {
            ctx.checkpoint()?;

            if attempts >= self.attempt_budget {
                return Err(Stop::Failed(GenerationError::PlacementStalled {
                    tile: job.tile,
                    placed,
                    target: job.target,
                    attempts,
                }));
            }
            attempts += 1;

            let x = rng.gen_range(0..width);
            let y = rng.gen_range(0..height);

            let claimed = self
                .grid
                .get(x, y)
                .map_or(false, |cell| cell.claim(job.tile));

            if !claimed {
                continue;
            }

            placed += 1;

            if placed % self.log_every == 0 || placed == job.target {
                ctx.progress.report(job.phase, placed as f32 / job.target as f32);
                ctx.log(
                    Level::Debug,
                    &format!("Placed {}/{} {}", placed, job.target, job.tile),
                );
            }
        }

        if job.target == 0 {
            ctx.progress.report(job.phase, 1.0);
        }

        ctx.log(
            Level::Info,
            &format!("{} placed: {}/{} ({} attempts)", job.tile, placed, job.target, attempts),
        );

        Ok(placed)
    }
}
