use std::collections::HashMap;

use crate::components::ActorId;
use crate::physics_core::PixelRect;

const DEFAULT_CELL_SIZE: i32 = 32;

/// Uniform-grid broad phase over actor pixel rectangles.
#[derive(Debug)]
pub struct SpatialHash {
    pub cell_size: i32,
    pub cells: HashMap<(i32, i32), Vec<ActorId>>,
}

impl Default for SpatialHash {
    fn default() -> Self {
        Self::new(DEFAULT_CELL_SIZE)
    }
}

impl SpatialHash {
    pub fn new(cell_size: i32) -> Self {
        Self {
            cell_size: cell_size.max(1),
            cells: HashMap::new(),
        }
    }

    pub fn insert(&mut self, id: ActorId, rect: PixelRect) {
        for cell in covered_cells(rect, self.cell_size) {
            self.cells.entry(cell).or_default().push(id);
        }
    }

    /// `rect` must be the rectangle `id` was inserted with.
    pub fn remove(&mut self, id: ActorId, rect: PixelRect) {
        for cell in covered_cells(rect, self.cell_size) {
            if let Some(ids) = self.cells.get_mut(&cell) {
                ids.retain(|other| *other != id);
                if ids.is_empty() {
                    self.cells.remove(&cell);
                }
            }
        }
    }

    /// Candidate ids whose cells meet `rect`, sorted and deduplicated.
    pub fn query_rect(&self, rect: PixelRect) -> Vec<ActorId> {
        let mut out = Vec::new();
        for cell in covered_cells(rect, self.cell_size) {
            if let Some(ids) = self.cells.get(&cell) {
                out.extend_from_slice(ids);
            }
        }
        out.sort_unstable();
        out.dedup();
        out
    }
}

fn covered_cells(rect: PixelRect, cell_size: i32) -> Vec<(i32, i32)> {
    let top_right = rect.top_right();
    let min_x = rect.origin.x.div_euclid(cell_size);
    let max_x = top_right.x.div_euclid(cell_size);
    let min_y = rect.origin.y.div_euclid(cell_size);
    let max_y = top_right.y.div_euclid(cell_size);
    let mut out = Vec::new();
    for cy in min_y..=max_y {
        for cx in min_x..=max_x {
            out.push((cx, cy));
        }
    }
    out
}
