use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use log::{info, log, warn, Level};
use parking_lot::Mutex;
use rand::{thread_rng, Rng};

use crate::cancel::CancellationToken;
use crate::config::{GenerationConfig, PhaseLayout};
use crate::error::GenerationError;
use crate::grid::{Grid, Size};
use crate::init::TileInitializer;
use crate::observer::{Callbacks, Observer};
use crate::placement::{PlacementEngine, PlacementJob};
use crate::progress::{Phase, ProgressAccumulator};
use crate::raster::{PixelBuffer, Rasterizer};
use crate::tile::{Tile, TileCell, TileCounts};

/// Lifecycle of a generation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationState {
    Idle,
    Initializing,
    Placing,
    Rendering,
    Rasterizing,
    Completed,
    Cancelled,
    Failed,
}

impl GenerationState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            GenerationState::Completed | GenerationState::Cancelled | GenerationState::Failed
        )
    }
}

#[derive(Debug, Clone)]
pub struct GeneratedMap {
    pub grid: Grid<Tile>,
    pub pixels: PixelBuffer,
    pub seed: u64,
    pub counts: TileCounts,
}

/// Terminal result of a run that did not fail.
#[derive(Debug)]
pub enum Outcome {
    Completed(GeneratedMap),
    Cancelled,
}

impl Outcome {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Outcome::Cancelled)
    }

    pub fn map(&self) -> Option<&GeneratedMap> {
        match self {
            Outcome::Completed(map) => Some(map),
            Outcome::Cancelled => None,
        }
    }

    pub fn into_map(self) -> Option<GeneratedMap> {
        match self {
            Outcome::Completed(map) => Some(map),
            Outcome::Cancelled => None,
        }
    }
}

/// Why a phase stopped early.
#[derive(Debug)]
pub(crate) enum Stop {
    Cancelled,
    Failed(GenerationError),
}

impl From<GenerationError> for Stop {
    fn from(err: GenerationError) -> Self {
        Stop::Failed(err)
    }
}

/// Everything a phase needs to poll, report and log.
pub(crate) struct RunContext<'a> {
    token: &'a CancellationToken,
    /// Set when a sibling phase failed; never visible to the caller's token.
    aborted: AtomicBool,
    observer: &'a dyn Observer,
    pub(crate) progress: ProgressAccumulator<'a>,
}

impl<'a> RunContext<'a> {
    pub(crate) fn new(
        token: &'a CancellationToken,
        observer: &'a dyn Observer,
        layout: PhaseLayout,
    ) -> Self {
        Self {
            token,
            aborted: AtomicBool::new(false),
            observer,
            progress: ProgressAccumulator::new(layout, observer),
        }
    }

    pub(crate) fn checkpoint(&self) -> Result<(), Stop> {
        if self.token.is_cancelled() || self.aborted.load(Ordering::Acquire) {
            Err(Stop::Cancelled)
        } else {
            Ok(())
        }
    }

    pub(crate) fn abort(&self) {
        self.aborted.store(true, Ordering::Release);
    }

    pub(crate) fn log(&self, level: Level, message: &str) {
        log!(level, "{}", message);
        self.observer.on_log(message);
    }
}

/// Generates a map on the calling thread.
///
/// Returns `Ok(Outcome::Cancelled)` if `token` trips before the run
/// completes; no grid or pixel buffer is exposed in that case.
pub fn generate_map<P, L>(
    config: &GenerationConfig,
    on_progress: P,
    on_log: L,
    token: &CancellationToken,
) -> Result<Outcome, GenerationError>
where
    P: Fn(f32) + Send + Sync,
    L: Fn(&str) + Send + Sync,
{
    generate_with_observer(config, &Callbacks::new(on_progress, on_log), token)
}

pub fn generate_with_observer(
    config: &GenerationConfig,
    observer: &dyn Observer,
    token: &CancellationToken,
) -> Result<Outcome, GenerationError> {
    let state = Mutex::new(GenerationState::Initializing);

    run(config, observer, token, &state)
}

fn run(
    config: &GenerationConfig,
    observer: &dyn Observer,
    token: &CancellationToken,
    state: &Mutex<GenerationState>,
) -> Result<Outcome, GenerationError> {
    if let Err(err) = config.validate() {
        warn!("Rejected configuration: {}", err);
        *state.lock() = GenerationState::Failed;
        return Err(err.into());
    }

    let seed = config.seed.unwrap_or_else(|| thread_rng().gen());
    info!("Using seed: {}", seed);

    let ctx = RunContext::new(token, observer, config.phases);

    match execute(config, seed, &ctx, state) {
        Ok(map) => {
            *state.lock() = GenerationState::Completed;
            ctx.log(Level::Info, "Generation finished.");
            Ok(Outcome::Completed(map))
        }
        Err(Stop::Cancelled) => {
            *state.lock() = GenerationState::Cancelled;
            ctx.log(Level::Warn, "Generation cancelled.");
            Ok(Outcome::Cancelled)
        }
        Err(Stop::Failed(err)) => {
            *state.lock() = GenerationState::Failed;
            ctx.log(Level::Error, &format!("Generation failed: {}", err));
            Err(err)
        }
    }
}

fn execute(
    config: &GenerationConfig,
    seed: u64,
    ctx: &RunContext,
    state: &Mutex<GenerationState>,
) -> Result<GeneratedMap, Stop> {
    *state.lock() = GenerationState::Initializing;
    ctx.log(
        Level::Info,
        &format!("Generating {}x{} map...", config.width, config.height),
    );

    let cells = TileInitializer::new(Size::new(config.width, config.height)).run(ctx)?;

    *state.lock() = GenerationState::Placing;

    let (obstacles, resources) = config.target_counts();
    let engine = PlacementEngine::new(&cells, config.attempt_budget(), config.log_every);

    engine.place_concurrently(
        PlacementJob::new(Tile::Obstacle, obstacles, Phase::Obstacles, seed, 0),
        PlacementJob::new(Tile::Resource, resources, Phase::Resources, seed, 1),
        ctx,
    )?;

    *state.lock() = GenerationState::Rendering;
    ctx.checkpoint()?;
    ctx.log(Level::Info, "Rendering map...");

    let grid = freeze(&cells, Phase::Rendering)?;

    ctx.observer
        .on_render(&grid)
        .map_err(|message| GenerationError::Failed {
            phase: Phase::Rendering,
            message,
        })?;
    ctx.progress.report(Phase::Rendering, 1.0);

    *state.lock() = GenerationState::Rasterizing;
    ctx.checkpoint()?;

    let pixels = Rasterizer::default().rasterize(&grid);
    ctx.progress.complete();

    Ok(GeneratedMap {
        counts: TileCounts::from_grid(&grid),
        grid,
        pixels,
        seed,
    })
}

/// Converts the shared placement grid into plain tiles once both phases joined.
///
/// An unknown code is reported against `phase`, the stage reading the grid,
/// since either placement phase could have written it.
fn freeze(cells: &Grid<TileCell>, phase: Phase) -> Result<Grid<Tile>, Stop> {
    cells
        .try_map(|x, y, cell| {
            cell.load().map_err(|code| GenerationError::Failed {
                phase,
                message: format!("cell ({}, {}) holds unknown tile code {}", x, y, code),
            })
        })
        .map_err(Stop::Failed)
}

/// A run executing on its own worker thread.
pub struct RunHandle {
    token: CancellationToken,
    state: Arc<Mutex<GenerationState>>,
    worker: JoinHandle<Result<Outcome, GenerationError>>,
}

impl RunHandle {
    /// Trips the run's token. Does nothing once the run has terminated.
    pub fn cancel(&self) {
        if !self.state().is_terminal() {
            self.token.cancel();
        }
    }

    pub fn state(&self) -> GenerationState {
        *self.state.lock()
    }

    pub fn is_finished(&self) -> bool {
        self.worker.is_finished()
    }

    pub fn join(self) -> Result<Outcome, GenerationError> {
        match self.worker.join() {
            Ok(result) => result,
            Err(_) => {
                let mut state = self.state.lock();
                let last = *state;
                *state = GenerationState::Failed;

                Err(GenerationError::Panicked { state: last })
            }
        }
    }
}

/// Owns at most one in-flight run.
///
/// Starting a new run while one is active cancels the active run and waits
/// for it to stop; its outcome is discarded.
#[derive(Default)]
pub struct Generator {
    active: Option<RunHandle>,
}

impl Generator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Transitions `Idle -> Initializing` and returns without waiting for the
    /// run.
    pub fn start(
        &mut self,
        config: GenerationConfig,
        observer: Arc<dyn Observer>,
    ) -> Result<(), GenerationError> {
        if let Some(previous) = self.active.take() {
            if !previous.state().is_terminal() {
                warn!("Cancelling the active run before starting a new one");
                previous.cancel();
            }
            let result = previous.join();
            log!(replaced_run_level(&result), "{}", describe_replaced_run(&result));
        }

        let token = CancellationToken::new();
        let state = Arc::new(Mutex::new(GenerationState::Initializing));

        let worker = {
            let token = token.clone();
            let state = Arc::clone(&state);

            std::thread::Builder::new()
                .name("map-generation".into())
                .spawn(move || run(&config, observer.as_ref(), &token, &state))
                .map_err(|err| GenerationError::Failed {
                    phase: Phase::Initializing,
                    message: format!("failed to spawn generation thread: {}", err),
                })?
        };

        self.active = Some(RunHandle {
            token,
            state,
            worker,
        });

        Ok(())
    }

    /// No-op when idle or when the run already terminated.
    pub fn cancel(&self) {
        if let Some(run) = &self.active {
            run.cancel();
        }
    }

    pub fn state(&self) -> GenerationState {
        self.active
            .as_ref()
            .map_or(GenerationState::Idle, RunHandle::state)
    }

    /// Blocks until the active run ends. Returns `None` when idle.
    pub fn wait(&mut self) -> Option<Result<Outcome, GenerationError>> {
        self.active.take().map(RunHandle::join)
    }
}

/// A crashed run is an error, a failed one a warning.
fn replaced_run_level(result: &Result<Outcome, GenerationError>) -> Level {
    match result {
        Ok(_) => Level::Debug,
        Err(GenerationError::Panicked { .. }) => Level::Error,
        Err(_) => Level::Warn,
    }
}

fn describe_replaced_run(result: &Result<Outcome, GenerationError>) -> String {
    match result {
        Ok(Outcome::Completed(_)) => "Replaced run had already completed".to_owned(),
        Ok(Outcome::Cancelled) => "Replaced run cancelled".to_owned(),
        Err(err) => format!("Replaced run failed: {}", err),
    }
}

impl Drop for Generator {
    fn drop(&mut self) {
        self.cancel();
    }
}
