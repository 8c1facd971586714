use serde::{Deserialize, Serialize};

use crate::components::TileType;
use crate::error::{PhysicsError, Result};
use crate::physics_core::PixelRect;
use crate::vector::Vector;

/// Read-only view of one grid cell.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Tile {
    pub position: Vector<i32>,
    pub size: i32,
    pub tile_type: TileType,
}

impl Tile {
    pub fn bottom_left_pixel(&self) -> Vector<i32> {
        self.position.scale(self.size)
    }

    pub fn rect(&self) -> PixelRect {
        PixelRect::new(self.bottom_left_pixel(), Vector::new(self.size, self.size))
    }

    pub fn is_passable(&self) -> bool {
        self.tile_type.is_passable()
    }
}

/// Fixed-size grid of square tiles, row-major with row 0 at the bottom.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TileGrid {
    tile_size: i32,
    width: i32,
    height: i32,
    tiles: Vec<TileType>,
}

impl TileGrid {
    /// An all-air grid of `width` x `height` tiles.
    pub fn new(tile_size: i32, width: i32, height: i32) -> Result<Self> {
        if tile_size <= 0 || width <= 0 || height <= 0 {
            return Err(PhysicsError::InvalidArgument(format!(
                "grid needs positive dimensions, got tile size {tile_size} and {width}x{height} tiles"
            )));
        }
        Ok(Self {
            tile_size,
            width,
            height,
            tiles: vec![TileType::Air; (width * height) as usize],
        })
    }

    pub fn tile_size(&self) -> i32 {
        self.tile_size
    }

    /// Number of tiles along each axis.
    pub fn dimensions(&self) -> Vector<i32> {
        Vector::new(self.width, self.height)
    }

    pub fn size_in_pixels(&self) -> Vector<i32> {
        Vector::new(self.width * self.tile_size, self.height * self.tile_size)
    }

    pub fn size_in_meters(&self, meters_per_pixel: f64) -> Vector<f64> {
        self.size_in_pixels().to_meters(meters_per_pixel)
    }

    pub fn pixel_in_world(&self, pixel: Vector<i32>) -> bool {
        let size = self.size_in_pixels();
        pixel.x >= 0 && pixel.x < size.x && pixel.y >= 0 && pixel.y < size.y
    }

    pub fn tile_in_world(&self, tile: Vector<i32>) -> bool {
        tile.x >= 0 && tile.x < self.width && tile.y >= 0 && tile.y < self.height
    }

    /// Callers must pass an in-world pixel.
    pub fn tile_containing_pixel(&self, pixel: Vector<i32>) -> Vector<i32> {
        Vector::new(pixel.x / self.tile_size, pixel.y / self.tile_size)
    }

    pub fn bottom_left_pixel_of_tile(&self, tile: Vector<i32>) -> Vector<i32> {
        tile.scale(self.tile_size)
    }

    pub fn tile_type_at(&self, tile: Vector<i32>) -> Result<TileType> {
        if !self.tile_in_world(tile) {
            return Err(PhysicsError::OutOfBounds {
                what: "tile",
                position: tile,
            });
        }
        Ok(self.tiles[self.index(tile)])
    }

    pub fn tile_type_at_pixel(&self, pixel: Vector<i32>) -> Result<TileType> {
        if !self.pixel_in_world(pixel) {
            return Err(PhysicsError::OutOfBounds {
                what: "pixel",
                position: pixel,
            });
        }
        Ok(self.tiles[self.index(self.tile_containing_pixel(pixel))])
    }

    /// Authoring operation; the coordinate must lie in the world.
    pub fn set_tile_type(&mut self, tile: Vector<i32>, tile_type: TileType) {
        assert!(
            self.tile_in_world(tile),
            "set_tile_type outside the world: {tile:?}"
        );
        let idx = self.index(tile);
        self.tiles[idx] = tile_type;
    }

    /// Sets every tile in the inclusive tile range `from..=to`.
    pub fn fill(&mut self, from: Vector<i32>, to: Vector<i32>, tile_type: TileType) {
        for y in from.y.min(to.y)..=from.y.max(to.y) {
            for x in from.x.min(to.x)..=from.x.max(to.x) {
                self.set_tile_type(Vector::new(x, y), tile_type);
            }
        }
    }

    /// Tiles whose footprint meets the inclusive pixel rectangle, clipped to
    /// the world. Ordered by column, then row.
    pub fn tiles_overlapping(&self, bottom_left: Vector<i32>, top_right: Vector<i32>) -> Vec<Tile> {
        let size = self.size_in_pixels();
        if top_right.x < 0 || top_right.y < 0 || bottom_left.x >= size.x || bottom_left.y >= size.y
        {
            return Vec::new();
        }
        let low = self.tile_containing_pixel(Vector::new(
            bottom_left.x.clamp(0, size.x - 1),
            bottom_left.y.clamp(0, size.y - 1),
        ));
        let high = self.tile_containing_pixel(Vector::new(
            top_right.x.clamp(0, size.x - 1),
            top_right.y.clamp(0, size.y - 1),
        ));

        let mut out = Vec::with_capacity(((high.x - low.x + 1) * (high.y - low.y + 1)) as usize);
        for x in low.x..=high.x {
            for y in low.y..=high.y {
                let position = Vector::new(x, y);
                out.push(Tile {
                    position,
                    size: self.tile_size,
                    tile_type: self.tiles[self.index(position)],
                });
            }
        }
        out
    }

    fn index(&self, tile: Vector<i32>) -> usize {
        tile.y as usize * self.width as usize + tile.x as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> TileGrid {
        let mut grid = TileGrid::new(10, 4, 3).unwrap();
        grid.fill(Vector::new(0, 0), Vector::new(3, 0), TileType::Ground);
        grid.set_tile_type(Vector::new(2, 1), TileType::Magma);
        grid
    }

    #[test]
    fn lookups_by_tile_and_pixel_agree() {
        let grid = grid();
        assert_eq!(grid.tile_type_at(Vector::new(2, 1)).unwrap(), TileType::Magma);
        assert_eq!(grid.tile_type_at_pixel(Vector::new(25, 19)).unwrap(), TileType::Magma);
        assert_eq!(grid.tile_type_at_pixel(Vector::new(25, 20)).unwrap(), TileType::Air);
        assert_eq!(grid.tile_type_at_pixel(Vector::new(0, 0)).unwrap(), TileType::Ground);
    }

    #[test]
    fn out_of_bounds_queries_are_rejected() {
        let grid = grid();
        assert!(matches!(
            grid.tile_type_at(Vector::new(4, 0)),
            Err(PhysicsError::OutOfBounds { what: "tile", .. })
        ));
        assert!(matches!(
            grid.tile_type_at_pixel(Vector::new(-1, 5)),
            Err(PhysicsError::OutOfBounds { what: "pixel", .. })
        ));
        assert!(grid.tile_type_at_pixel(Vector::new(0, 30)).is_err());
    }

    #[test]
    fn overlapping_tiles_are_clipped_to_the_world() {
        let grid = grid();
        let tiles = grid.tiles_overlapping(Vector::new(35, 15), Vector::new(60, 45));
        let positions: Vec<_> = tiles.iter().map(|t| t.position).collect();
        assert_eq!(positions, vec![Vector::new(3, 1), Vector::new(3, 2)]);

        let inner = grid.tiles_overlapping(Vector::new(12, 5), Vector::new(21, 12));
        assert_eq!(inner.len(), 4);
        assert!(inner.iter().any(|t| t.tile_type == TileType::Magma));
    }

    #[test]
    fn rectangles_outside_the_world_touch_nothing() {
        let grid = grid();
        assert!(grid.tiles_overlapping(Vector::new(40, 0), Vector::new(50, 5)).is_empty());
        assert!(grid.tiles_overlapping(Vector::new(-20, -20), Vector::new(-1, 5)).is_empty());
    }

    #[test]
    #[should_panic]
    fn setting_a_tile_outside_the_world_panics() {
        let mut grid = grid();
        grid.set_tile_type(Vector::new(9, 9), TileType::Ground);
    }

    #[test]
    fn tile_rect_matches_grid_position() {
        let grid = grid();
        let tile = grid.tiles_overlapping(Vector::new(20, 10), Vector::new(20, 10))[0];
        assert_eq!(tile.rect(), PixelRect::new(Vector::new(20, 10), Vector::new(10, 10)));
        assert!(!grid.tiles_overlapping(Vector::new(0, 0), Vector::new(0, 0))[0].is_passable());
    }
}
