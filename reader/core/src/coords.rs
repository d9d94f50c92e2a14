//! Board-to-visual coordinate mapping
//!
//! Maps grid cells to square pixel rectangles of `chunk_size` and back. The same
//! mapping drives drawing and hit-testing, so a tap lands on exactly the cell
//! that was drawn under it.

use serde::{Deserialize, Serialize};

use crate::board::{Cell, Wall, DEFAULT_GRID_SIZE};

/// Default pixel size of one grid cell
pub const DEFAULT_CHUNK_SIZE: u32 = 32;

/// Axis-aligned rectangle in surface units
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge
    pub x: f64,
    /// Top edge
    pub y: f64,
    /// Width
    pub width: f64,
    /// Height
    pub height: f64,
}

impl Rect {
    /// Center point `(x, y)`
    #[must_use]
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// Line segment in surface units
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Line {
    /// Start x
    pub x1: f64,
    /// Start y
    pub y1: f64,
    /// End x
    pub x2: f64,
    /// End y
    pub y2: f64,
}

/// Pure mapping between grid cells and surface coordinates
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CoordinateMapper {
    chunk_size: u32,
    grid_size: u32,
}

impl Default for CoordinateMapper {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE, DEFAULT_GRID_SIZE)
    }
}

impl CoordinateMapper {
    /// Create a mapper; a zero chunk or grid size is raised to one
    #[must_use]
    pub fn new(chunk_size: u32, grid_size: u32) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            grid_size: grid_size.max(1),
        }
    }

    /// Pixel size of one cell
    #[must_use]
    pub fn chunk_size(&self) -> u32 {
        self.chunk_size
    }

    /// Rows and columns on the grid
    #[must_use]
    pub fn grid_size(&self) -> u32 {
        self.grid_size
    }

    /// Width and height of the whole board
    #[must_use]
    pub fn extent(&self) -> f64 {
        f64::from(self.chunk_size) * f64::from(self.grid_size)
    }

    /// Rectangle covered by a cell
    #[must_use]
    pub fn cell_to_rect(&self, cell: Cell) -> Rect {
        let chunk = f64::from(self.chunk_size);
        Rect {
            x: chunk * f64::from(cell.col),
            y: chunk * f64::from(cell.row),
            width: chunk,
            height: chunk,
        }
    }

    /// Cell under a point, or `None` when the point is off the board
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn point_to_cell(&self, x: f64, y: f64) -> Option<Cell> {
        let extent = self.extent();
        let on_board = |v: f64| v.is_finite() && (0.0..extent).contains(&v);
        if !on_board(x) || !on_board(y) {
            return None;
        }

        let chunk = f64::from(self.chunk_size);
        let col = ((x / chunk).floor() as u32).min(self.grid_size - 1);
        let row = ((y / chunk).floor() as u32).min(self.grid_size - 1);
        Some(Cell::new(row, col))
    }

    /// Line drawn for a wall
    #[must_use]
    pub fn wall_to_line(&self, wall: &Wall) -> Line {
        let chunk = f64::from(self.chunk_size);
        let ((x1, y1), (x2, y2)) = wall.endpoints();
        Line {
            x1: chunk * x1,
            y1: chunk * y1,
            x2: chunk * x2,
            y2: chunk * y2,
        }
    }
}
