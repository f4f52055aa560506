use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Barrier};

use parking_lot::Mutex;

use tilemap_generator::{
    generate_map, generate_with_observer, rasterize, CancellationToken, ConfigError,
    GenerationConfig, GenerationError, GenerationState, Generator, Grid, Observer, Outcome,
    Palette, Tile,
};

// Fixed seed for deterministic tests
const TEST_SEED: u64 = 42;

/// Records every event of a run.
#[derive(Default)]
struct Recorder {
    progress: Mutex<Vec<f32>>,
    logs: Mutex<Vec<String>>,
    rendered: Mutex<Option<Grid<Tile>>>,
}

impl Observer for Recorder {
    fn on_progress(&self, fraction: f32) {
        self.progress.lock().push(fraction);
    }

    fn on_log(&self, message: &str) {
        self.logs.lock().push(message.to_owned());
    }

    fn on_render(&self, grid: &Grid<Tile>) -> Result<(), String> {
        *self.rendered.lock() = Some(grid.clone());
        Ok(())
    }
}

/// Blocks the worker on its first log line until the test releases it.
struct Gate {
    barrier: Barrier,
    opened: AtomicBool,
    recorder: Recorder,
}

impl Gate {
    fn new() -> Self {
        Self {
            barrier: Barrier::new(2),
            opened: AtomicBool::new(false),
            recorder: Recorder::default(),
        }
    }
}

impl Observer for Gate {
    fn on_progress(&self, fraction: f32) {
        self.recorder.on_progress(fraction);
    }

    fn on_log(&self, message: &str) {
        self.recorder.on_log(message);

        if !self.opened.swap(true, Ordering::SeqCst) {
            self.barrier.wait();
        }
    }
}

fn run(config: &GenerationConfig) -> (Result<Outcome, GenerationError>, Recorder) {
    let recorder = Recorder::default();
    let result = generate_with_observer(config, &recorder, &CancellationToken::new());

    (result, recorder)
}

#[test]
fn test_small_map_end_to_end() {
    let config = GenerationConfig::new(10, 10, 0.1, 0.02).with_seed(TEST_SEED);
    let (result, recorder) = run(&config);

    let map = result.unwrap().into_map().expect("run should complete");

    assert_eq!(map.counts.obstacles, 10);
    assert_eq!(map.counts.resources, 2);
    assert_eq!(map.counts.empty, 88);
    assert_eq!(map.grid.size(), 100);
    assert_eq!(recorder.progress.lock().last(), Some(&1.0));
    assert_eq!(recorder.logs.lock().last().map(String::as_str), Some("Generation finished."));
}

#[test]
fn test_counts_match_rounded_targets() {
    for (width, height, obstacle, resource) in [
        (1, 1, 0.0, 0.0),
        (1, 1, 1.0, 0.0),
        (7, 3, 0.33, 0.25),
        (31, 17, 0.45, 0.45),
        (64, 64, 0.0, 1.0),
    ] {
        let config = GenerationConfig::new(width, height, obstacle, resource).with_seed(TEST_SEED);
        let (expected_obstacles, expected_resources) = config.target_counts();
        let (result, _) = run(&config);

        let map = result.unwrap().into_map().unwrap();

        assert_eq!(map.counts.obstacles, expected_obstacles);
        assert_eq!(map.counts.resources, expected_resources);
        assert_eq!(map.counts.total(), width * height);
        assert!(expected_obstacles + expected_resources <= width * height);
    }
}

#[test]
fn test_high_density_race_keeps_types_exclusive() {
    // Every cell gets claimed, and both phases run long enough on separate
    // workers to fight over the last free cells.
    let pool = rayon::ThreadPoolBuilder::new().num_threads(2).build().unwrap();

    for seed in 0..6 {
        let config = GenerationConfig::new(200, 150, 0.5, 0.5).with_seed(seed);
        let (result, _) = pool.install(|| run(&config));

        let map = result.unwrap().into_map().unwrap();

        assert_eq!(map.counts.obstacles, 15_000, "seed {}", seed);
        assert_eq!(map.counts.resources, 15_000, "seed {}", seed);
        assert_eq!(map.counts.empty, 0, "seed {}", seed);
    }
}

#[test]
fn test_tied_targets_round_to_even() {
    // 25 cells at 10% is 2.5 tiles
    let config = GenerationConfig::new(5, 5, 0.1, 0.1).with_seed(TEST_SEED);
    let (result, _) = run(&config);

    let map = result.unwrap().into_map().unwrap();

    assert_eq!(map.counts.obstacles, 2);
    assert_eq!(map.counts.resources, 2);
    assert_eq!(map.counts.empty, 21);
}

#[test]
fn test_progress_is_monotonic_and_ends_at_one() {
    let mut config = GenerationConfig::new(40, 30, 0.3, 0.2).with_seed(TEST_SEED);
    config.log_every = 7;

    let (result, recorder) = run(&config);
    assert!(result.is_ok());

    let progress = recorder.progress.lock();

    assert!(progress[0] > 0.0);
    assert!(progress.iter().all(|p| (0.0..=1.0).contains(p)));
    assert!(progress.windows(2).all(|w| w[0] <= w[1]), "{:?}", progress);
    assert_eq!(progress.last(), Some(&1.0));
}

#[test]
fn test_logs_follow_run_shape() {
    let config = GenerationConfig::new(3, 2, 0.5, 0.0).with_seed(TEST_SEED);
    let (result, recorder) = run(&config);
    assert!(result.is_ok());

    let logs = recorder.logs.lock();
    let position = |line: &str| logs.iter().position(|l| l == line).unwrap();

    assert_eq!(logs[0], "Generating 3x2 map...");
    assert!(position("Initialized row 0") < position("Initialized row 1"));
    assert!(position("Initialized row 1") < position("Placing Obstacle tiles..."));
    assert!(position("Placed 3/3 Obstacle") < position("Rendering map..."));
    assert!(logs.iter().any(|l| l.starts_with("Resource placed: 0/0")));
    assert_eq!(logs.last().map(String::as_str), Some("Generation finished."));
}

#[test]
fn test_render_hook_sees_final_grid() {
    let config = GenerationConfig::new(12, 9, 0.2, 0.2).with_seed(TEST_SEED);
    let (result, recorder) = run(&config);

    let map = result.unwrap().into_map().unwrap();

    assert_eq!(recorder.rendered.lock().as_ref(), Some(&map.grid));
}

#[test]
fn test_pixels_match_grid() {
    let config = GenerationConfig::new(20, 15, 0.25, 0.15).with_seed(TEST_SEED);
    let (result, _) = run(&config);
    let map = result.unwrap().into_map().unwrap();
    let palette = Palette::default();

    assert_eq!(map.pixels.dimensions(), (20, 15));
    assert_eq!(map.pixels, rasterize(&map.grid));

    for (x, y, tile) in &map.grid {
        assert_eq!(*map.pixels.get_pixel(x as u32, y as u32), palette.color(*tile));
    }
}

#[test]
fn test_zero_width_is_rejected_without_events() {
    let config = GenerationConfig::new(0, 5, 0.1, 0.02);
    let (result, recorder) = run(&config);

    assert!(matches!(
        result,
        Err(GenerationError::InvalidConfig(ConfigError::ZeroWidth))
    ));
    assert!(recorder.progress.lock().is_empty());
    assert!(recorder.logs.lock().is_empty());
}

#[test]
fn test_percent_sum_is_rejected() {
    let config = GenerationConfig::new(10, 10, 0.8, 0.3);
    let (result, _) = run(&config);

    assert!(matches!(
        result,
        Err(GenerationError::InvalidConfig(ConfigError::PercentSum { .. }))
    ));
}

#[test]
fn test_cancelled_token_yields_cancelled() {
    let token = CancellationToken::new();
    let logs = Mutex::new(Vec::new());
    let progress = Mutex::new(Vec::new());

    token.cancel();

    let outcome = generate_map(
        &GenerationConfig::new(10, 10, 0.1, 0.02),
        |p| progress.lock().push(p),
        |m| logs.lock().push(m.to_owned()),
        &token,
    )
    .unwrap();

    assert!(outcome.is_cancelled());
    assert!(outcome.map().is_none());
    assert!(progress.lock().is_empty());
    assert_eq!(logs.lock().last().map(String::as_str), Some("Generation cancelled."));
}

#[test]
fn test_cancel_right_after_start() {
    let gate = Arc::new(Gate::new());
    let mut generator = Generator::new();

    generator
        .start(GenerationConfig::new(10, 10, 0.1, 0.02), gate.clone())
        .unwrap();

    assert!(!generator.state().is_terminal());

    generator.cancel();
    gate.barrier.wait();

    let outcome = generator.wait().unwrap().unwrap();

    assert!(outcome.is_cancelled());
    assert!(gate
        .recorder
        .logs
        .lock()
        .iter()
        .any(|l| l == "Generation cancelled."));
    assert!(gate.recorder.progress.lock().iter().all(|p| *p < 1.0));
}

#[test]
fn test_generator_runs_to_completion() {
    let recorder = Arc::new(Recorder::default());
    let mut generator = Generator::new();

    generator
        .start(
            GenerationConfig::new(16, 16, 0.1, 0.1).with_seed(TEST_SEED),
            recorder.clone(),
        )
        .unwrap();

    let outcome = generator.wait().unwrap().unwrap();

    assert!(matches!(outcome, Outcome::Completed(_)));
    assert_eq!(generator.state(), GenerationState::Idle);
    assert_eq!(recorder.progress.lock().last(), Some(&1.0));
}

#[test]
fn test_restart_cancels_previous_run() {
    let first = Arc::new(Recorder::default());
    let second = Arc::new(Recorder::default());
    let mut generator = Generator::new();

    // Large enough that it cannot finish before the restart below.
    generator
        .start(GenerationConfig::new(1000, 1000, 0.1, 0.02), first.clone())
        .unwrap();
    generator
        .start(
            GenerationConfig::new(8, 8, 0.25, 0.25).with_seed(TEST_SEED),
            second.clone(),
        )
        .unwrap();

    let outcome = generator.wait().unwrap().unwrap();

    assert_eq!(outcome.map().map(|m| m.counts.obstacles), Some(16));
    assert_eq!(
        first.logs.lock().last().map(String::as_str),
        Some("Generation cancelled.")
    );
    assert_eq!(second.progress.lock().last(), Some(&1.0));
}

#[test]
fn test_cancel_after_completion_is_noop() {
    let recorder = Arc::new(Recorder::default());
    let mut generator = Generator::new();

    generator
        .start(GenerationConfig::new(4, 4, 0.25, 0.0).with_seed(TEST_SEED), recorder)
        .unwrap();

    while !generator.state().is_terminal() {
        std::thread::yield_now();
    }

    generator.cancel();

    assert_eq!(generator.state(), GenerationState::Completed);
    assert!(matches!(generator.wait(), Some(Ok(Outcome::Completed(_)))));
}
