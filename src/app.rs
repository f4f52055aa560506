use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info};

use tilemap_generator::{GeneratedMap, Generator, Observer, Outcome, Tile};

use crate::cli::AppConfig;

const PROGRESS_STEPS: u64 = 1000;
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Feeds run events into a terminal progress bar.
struct ProgressObserver {
    bar: ProgressBar,
}

impl Observer for ProgressObserver {
    fn on_progress(&self, fraction: f32) {
        self.bar.set_position((fraction as f64 * PROGRESS_STEPS as f64).round() as u64);
    }

    fn on_log(&self, message: &str) {
        debug!("{}", message);
        self.bar.set_message(message.to_owned());
    }
}

pub struct TileMapApp {
    config: AppConfig,
}

impl TileMapApp {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn run(&self) -> Result<(), Box<dyn std::error::Error>> {
        let progress = ProgressBar::new(PROGRESS_STEPS);
        progress.enable_steady_tick(Duration::from_millis(200));
        progress.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {percent:>3}% {msg}",
                )?
                .progress_chars("#>-"),
        );

        let observer = Arc::new(ProgressObserver {
            bar: progress.clone(),
        });

        let mut generator = Generator::new();
        generator.start(self.config.generation.clone(), observer)?;

        if let Some(limit) = self.config.cancel_after {
            let started = Instant::now();

            while !generator.state().is_terminal() {
                if started.elapsed() >= limit {
                    info!("Cancelling after {:?}", limit);
                    generator.cancel();
                    break;
                }
                thread::sleep(POLL_INTERVAL);
            }
        }

        let outcome = generator.wait().ok_or("generation was not started")??;

        match outcome {
            Outcome::Completed(map) => {
                progress.finish_with_message("done");
                self.report(&map);
            }
            Outcome::Cancelled => {
                progress.abandon_with_message("cancelled");
                info!("Generation cancelled, no map produced");
            }
        }

        Ok(())
    }

    fn report(&self, map: &GeneratedMap) {
        let (width, height) = map.pixels.dimensions();

        info!("Seed: {}", map.seed);
        info!(
            "{} obstacles, {} resources, {} empty",
            map.counts.obstacles, map.counts.resources, map.counts.empty
        );
        info!("Rasterized to {}x{} pixels", width, height);

        if self.config.preview {
            println!("{}", preview(map));
        }
    }
}

fn preview(map: &GeneratedMap) -> String {
    let mut output = String::with_capacity((map.grid.width() + 1) * map.grid.height());

    for (x, y, tile) in &map.grid {
        if x == 0 && y > 0 {
            output.push('\n');
        }

        output.push(match tile {
            Tile::Empty => '.',
            Tile::Obstacle => '#',
            Tile::Resource => '$',
        });
    }

    output
}
