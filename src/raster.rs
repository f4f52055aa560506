use enum_map::{enum_map, EnumMap};
use image::{Rgba, RgbaImage};
use log::warn;

use crate::grid::Grid;
use crate::tile::Tile;

/// One RGBA8 pixel per grid cell, `(x, y)` matching the grid's coordinates.
pub type PixelBuffer = RgbaImage;

/// The fixed tile to colour table.
#[derive(Debug, Clone)]
pub struct Palette {
    colors: EnumMap<Tile, Rgba<u8>>,
    invalid: Rgba<u8>,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            colors: enum_map! {
                Tile::Empty => Rgba([0, 0, 0, 255]),
                Tile::Obstacle => Rgba([128, 128, 128, 255]),
                Tile::Resource => Rgba([0, 255, 0, 255]),
            },
            invalid: Rgba([255, 0, 255, 255]),
        }
    }
}

impl Palette {
    pub fn color(&self, tile: Tile) -> Rgba<u8> {
        self.colors[tile]
    }

    /// Sentinel for cells holding an unknown tile code.
    pub fn invalid(&self) -> Rgba<u8> {
        self.invalid
    }
}

#[derive(Debug, Clone, Default)]
pub struct Rasterizer {
    palette: Palette,
}

impl Rasterizer {
    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn rasterize(&self, grid: &Grid<Tile>) -> PixelBuffer {
        self.paint(grid, |tile| Ok(*tile))
    }

    /// Renders a grid of raw tile codes, e.g. one deserialized from outside
    /// the engine. Unknown codes are painted with [`Palette::invalid`].
    pub fn rasterize_raw(&self, grid: &Grid<u8>) -> PixelBuffer {
        self.paint(grid, |&code| Tile::try_from(code))
    }

    fn paint<T, F>(&self, grid: &Grid<T>, decode: F) -> PixelBuffer
    where
        F: Fn(&T) -> Result<Tile, u8>,
    {
        let mut image = RgbaImage::new(grid.width() as u32, grid.height() as u32);
        let mut unknown = 0usize;

        for (x, y, cell) in grid {
            let color = match decode(cell) {
                Ok(tile) => self.palette.color(tile),
                Err(_) => {
                    unknown += 1;
                    self.palette.invalid()
                }
            };

            image.put_pixel(x as u32, y as u32, color);
        }

        if unknown > 0 {
            warn!("{} cells held an unknown tile code", unknown);
        }

        image
    }
}

/// Rasterizes `grid` with the default palette.
pub fn rasterize(grid: &Grid<Tile>) -> PixelBuffer {
    Rasterizer::default().rasterize(grid)
}
