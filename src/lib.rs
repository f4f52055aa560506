//! Procedural tile map generation.
//!
//! A run fills a `width x height` grid with empty tiles, places obstacles and
//! resources concurrently by rejection sampling, and rasterizes the result
//! into an RGBA pixel buffer. Progress and status lines are delivered through
//! an [`Observer`], and runs can be cancelled cooperatively with a
//! [`CancellationToken`].
//!
//! ```no_run
//! use tilemap_generator::{generate_map, CancellationToken, GenerationConfig};
//!
//! let config = GenerationConfig::new(64, 64, 0.1, 0.02);
//! let token = CancellationToken::new();
//! let outcome = generate_map(
//!     &config,
//!     |p| println!("{:.0}%", p * 100.0),
//!     |m| println!("{}", m),
//!     &token,
//! )?;
//!
//! if let Some(map) = outcome.map() {
//!     println!("{} obstacles", map.counts.obstacles);
//! }
//! # Ok::<(), tilemap_generator::GenerationError>(())
//! ```

pub mod cancel;
pub mod config;
pub mod error;
pub mod generator;
pub mod grid;
pub mod init;
pub mod observer;
pub mod placement;
pub mod progress;
pub mod raster;
pub mod tile;

pub use cancel::CancellationToken;
pub use config::{GenerationConfig, PhaseLayout, PhaseRange};
pub use error::{ConfigError, GenerationError};
pub use generator::{
    generate_map, generate_with_observer, GeneratedMap, GenerationState, Generator, Outcome,
    RunHandle,
};
pub use grid::{Grid, Size};
pub use observer::{Callbacks, NoopObserver, Observer};
pub use progress::Phase;
pub use raster::{rasterize, Palette, PixelBuffer, Rasterizer};
pub use tile::{Tile, TileCounts};
