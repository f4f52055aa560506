use std::fmt;

use enum_map::{Enum, EnumMap};
use parking_lot::Mutex;

use crate::config::PhaseLayout;
use crate::observer::Observer;

/// The stages of a run that report progress, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Enum)]
pub enum Phase {
    Initializing,
    Obstacles,
    Resources,
    Rendering,
    Rasterizing,
}

impl Phase {
    pub const ALL: [Phase; 5] = [
        Phase::Initializing,
        Phase::Obstacles,
        Phase::Resources,
        Phase::Rendering,
        Phase::Rasterizing,
    ];
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Initializing => "initialization",
            Phase::Obstacles => "obstacle placement",
            Phase::Resources => "resource placement",
            Phase::Rendering => "rendering",
            Phase::Rasterizing => "rasterization",
        };

        f.write_str(name)
    }
}

#[derive(Debug, Default)]
struct ProgressState {
    local: EnumMap<Phase, f32>,
    reported: f32,
}

/// Folds phase-local fractions into the single global progress signal.
///
/// Each phase contributes `range.map(local) - range.start`. Summing the
/// contributions lets the two placement phases report concurrently while the
/// emitted sequence stays non-decreasing.
pub struct ProgressAccumulator<'a> {
    layout: PhaseLayout,
    observer: &'a dyn Observer,
    state: Mutex<ProgressState>,
}

impl<'a> ProgressAccumulator<'a> {
    pub fn new(layout: PhaseLayout, observer: &'a dyn Observer) -> Self {
        Self {
            layout,
            observer,
            state: Mutex::new(ProgressState::default()),
        }
    }

    /// Records `local` for `phase` and emits the resulting global fraction.
    pub fn report(&self, phase: Phase, local: f32) {
        let mut state = self.state.lock();

        let local = local.clamp(0.0, 1.0);
        if local > state.local[phase] {
            state.local[phase] = local;
        }

        let total: f32 = state
            .local
            .iter()
            .map(|(phase, &local)| {
                let range = self.layout.range(phase);
                range.map(local) - range.start
            })
            .sum();

        // Never exceed 1 before `complete`, never step backwards.
        let global = total.min(1.0).max(state.reported);
        state.reported = global;

        // Emitted under the lock so concurrent phases cannot reorder values.
        self.observer.on_progress(global);
    }

    /// Emits exactly `1.0`.
    pub fn complete(&self) {
        let mut state = self.state.lock();

        for (_, local) in state.local.iter_mut() {
            *local = 1.0;
        }
        state.reported = 1.0;

        self.observer.on_progress(1.0);
    }

    pub fn current(&self) -> f32 {
        self.state.lock().reported
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::Callbacks;

    fn recorder() -> (Mutex<Vec<f32>>, Mutex<Vec<String>>) {
        (Mutex::new(Vec::new()), Mutex::new(Vec::new()))
    }

    #[test]
    fn test_sequential_phases_follow_layout() {
        let (values, logs) = recorder();
        let observer = Callbacks::new(
            |p| values.lock().push(p),
            |m: &str| logs.lock().push(m.to_owned()),
        );
        let progress = ProgressAccumulator::new(PhaseLayout::default(), &observer);

        progress.report(Phase::Initializing, 0.5);
        progress.report(Phase::Initializing, 1.0);
        progress.report(Phase::Obstacles, 1.0);
        progress.report(Phase::Resources, 1.0);
        progress.report(Phase::Rendering, 1.0);
        progress.complete();

        let values = values.lock();
        let expected = [0.1, 0.2, 0.5, 0.8, 0.9, 1.0];

        assert_eq!(values.len(), expected.len());
        for (value, expected) in values.iter().zip(expected) {
            assert!((value - expected).abs() < 1e-5, "{} != {}", value, expected);
        }
        assert_eq!(*values.last().unwrap(), 1.0);
    }

    #[test]
    fn test_interleaved_phases_never_decrease() {
        let (values, logs) = recorder();
        let observer = Callbacks::new(
            |p| values.lock().push(p),
            |m: &str| logs.lock().push(m.to_owned()),
        );
        let progress = ProgressAccumulator::new(PhaseLayout::default(), &observer);

        progress.report(Phase::Initializing, 1.0);
        progress.report(Phase::Resources, 0.5);
        progress.report(Phase::Obstacles, 0.2);
        progress.report(Phase::Resources, 0.4);
        progress.report(Phase::Obstacles, 1.0);
        progress.report(Phase::Resources, 1.0);

        let values = values.lock();

        assert!(values.windows(2).all(|w| w[0] <= w[1]), "{:?}", values);
        assert!((values.last().unwrap() - 0.8).abs() < 1e-5);
    }

    #[test]
    fn test_out_of_range_fractions_are_clamped() {
        let (values, logs) = recorder();
        let observer = Callbacks::new(
            |p| values.lock().push(p),
            |m: &str| logs.lock().push(m.to_owned()),
        );
        let progress = ProgressAccumulator::new(PhaseLayout::default(), &observer);

        progress.report(Phase::Initializing, 7.0);
        progress.report(Phase::Obstacles, -1.0);

        assert!((progress.current() - 0.2).abs() < 1e-5);
        assert!(values.lock().iter().all(|v| (0.0..=1.0).contains(v)));
    }
}
