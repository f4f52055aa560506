use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

use enum_map::Enum;
use serde::{Deserialize, Serialize};

use crate::grid::Grid;

/// State of a single map cell. Codes follow declaration order: 0, 1, 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Enum, Serialize, Deserialize)]
#[repr(u8)]
pub enum Tile {
    Empty,
    Obstacle,
    Resource,
}

impl Tile {
    pub fn code(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for Tile {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Tile::Empty),
            1 => Ok(Tile::Obstacle),
            2 => Ok(Tile::Resource),
            other => Err(other),
        }
    }
}

impl fmt::Display for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Tile::Empty => "Empty",
            Tile::Obstacle => "Obstacle",
            Tile::Resource => "Resource",
        };

        f.write_str(name)
    }
}

/// A cell shared between concurrent placement phases.
///
/// The only transition allowed is `Empty -> Obstacle | Resource`, performed
/// with a single compare-and-set so two phases can never both claim a cell.
#[derive(Debug)]
pub struct TileCell(AtomicU8);

impl TileCell {
    pub fn empty() -> Self {
        Self(AtomicU8::new(Tile::Empty.code()))
    }

    /// Returns the decoded state, or the raw code if it is not a known tile.
    pub fn load(&self) -> Result<Tile, u8> {
        Tile::try_from(self.0.load(Ordering::Acquire))
    }

    /// Atomically turns an empty cell into `tile`. Returns `false` if the
    /// cell was already taken.
    pub fn claim(&self, tile: Tile) -> bool {
        if tile == Tile::Empty {
            return false;
        }

        self.0
            .compare_exchange(
                Tile::Empty.code(),
                tile.code(),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }
}

#[cfg(test)]
impl TileCell {
    pub(crate) fn with_code(code: u8) -> Self {
        Self(AtomicU8::new(code))
    }
}

impl Default for TileCell {
    fn default() -> Self {
        Self::empty()
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TileCounts {
    pub empty: usize,
    pub obstacles: usize,
    pub resources: usize,
}

impl TileCounts {
    pub fn from_grid(grid: &Grid<Tile>) -> Self {
        grid.iter().fold(Self::default(), |mut counts, (_, _, tile)| {
            match tile {
                Tile::Empty => counts.empty += 1,
                Tile::Obstacle => counts.obstacles += 1,
                Tile::Resource => counts.resources += 1,
            }
            counts
        })
    }

    pub fn total(&self) -> usize {
        self.empty + self.obstacles + self.resources
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Barrier;
    use std::thread;

    use super::*;

    #[test]
    fn test_codes_round_trip_and_reject_unknown() {
        for tile in [Tile::Empty, Tile::Obstacle, Tile::Resource] {
            assert_eq!(Tile::try_from(tile.code()), Ok(tile));
        }

        assert_eq!(Tile::try_from(3), Err(3));
        assert_eq!(Tile::try_from(255), Err(255));
    }

    #[test]
    fn test_claim_only_from_empty() {
        let cell = TileCell::empty();

        assert!(cell.claim(Tile::Obstacle));
        assert!(!cell.claim(Tile::Resource));
        assert!(!cell.claim(Tile::Obstacle));
        assert_eq!(cell.load(), Ok(Tile::Obstacle));
    }

    #[test]
    fn test_claim_empty_is_rejected() {
        let cell = TileCell::empty();

        assert!(!cell.claim(Tile::Empty));
        assert_eq!(cell.load(), Ok(Tile::Empty));
    }

    #[test]
    fn test_concurrent_claims_have_single_winner() {
        const CELLS: usize = 20_000;
        const CLAIMERS: usize = 4;

        let cells: Vec<TileCell> = (0..CELLS).map(|_| TileCell::empty()).collect();
        let barrier = Barrier::new(CLAIMERS);

        let wins: Vec<Vec<bool>> = thread::scope(|scope| {
            let handles: Vec<_> = (0..CLAIMERS)
                .map(|claimer| {
                    let (cells, barrier) = (&cells, &barrier);
                    let tile = if claimer % 2 == 0 { Tile::Obstacle } else { Tile::Resource };

                    scope.spawn(move || {
                        barrier.wait();
                        cells.iter().map(|cell| cell.claim(tile)).collect::<Vec<_>>()
                    })
                })
                .collect();

            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        for index in 0..CELLS {
            let winners = wins.iter().filter(|claims| claims[index]).count();
            assert_eq!(winners, 1, "cell {} claimed {} times", index, winners);
        }

        let obstacles = wins.iter().step_by(2).flatten().filter(|won| **won).count();
        let stored = cells.iter().filter(|cell| cell.load() == Ok(Tile::Obstacle)).count();
        assert_eq!(obstacles, stored);
    }

    #[test]
    fn test_counts() {
        let grid = Grid::new(4, 1, &mut |x, _| match x {
            0 => Tile::Obstacle,
            1 | 2 => Tile::Resource,
            _ => Tile::Empty,
        });

        let counts = TileCounts::from_grid(&grid);

        assert_eq!(counts, TileCounts { empty: 1, obstacles: 1, resources: 2 });
        assert_eq!(counts.total(), 4);
    }
}
