use crate::grid::Grid;
use crate::tile::Tile;

/// Receives progress, status lines and the finished grid during a run.
///
/// The two placement phases run concurrently, so callbacks may arrive from
/// different threads. Events of a single phase are delivered in order.
pub trait Observer: Send + Sync {
    /// Global progress fraction in `[0, 1]`, non-decreasing over a run.
    fn on_progress(&self, fraction: f32);

    /// Human-readable status line.
    fn on_log(&self, message: &str);

    /// Hands the completed grid to a visual renderer before rasterization.
    fn on_render(&self, grid: &Grid<Tile>) -> Result<(), String> {
        let _ = grid;
        Ok(())
    }
}

/// Adapts a pair of closures into an [`Observer`].
pub struct Callbacks<P, L> {
    on_progress: P,
    on_log: L,
}

impl<P, L> Callbacks<P, L>
where
    P: Fn(f32) + Send + Sync,
    L: Fn(&str) + Send + Sync,
{
    pub fn new(on_progress: P, on_log: L) -> Self {
        Self {
            on_progress,
            on_log,
        }
    }
}

impl<P, L> Observer for Callbacks<P, L>
where
    P: Fn(f32) + Send + Sync,
    L: Fn(&str) + Send + Sync,
{
    fn on_progress(&self, fraction: f32) {
        (self.on_progress)(fraction)
    }

    fn on_log(&self, message: &str) {
        (self.on_log)(message)
    }
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl Observer for NoopObserver {
    fn on_progress(&self, _: f32) {}

    fn on_log(&self, _: &str) {}
}
