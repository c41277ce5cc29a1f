//! Coverage grid swept by the robot's footprint.
//!
//! Each cell stores the value it was cleaned with. A cell cleaned with value 0
//! still counts as fresh, so only sweeps made while the robot sensed something
//! claim cells for good.

use arena_kinematics::Point;

/// A `size × size` grid over a rectangular field.
#[derive(Debug, Clone, PartialEq)]
pub struct CoverageGrid {
    size: usize,
    cell_width: f64,
    cell_height: f64,
    cells: Vec<f64>,
    total: f64,
}

impl CoverageGrid {
    /// Creates an empty grid of `size × size` cells covering `width × height`.
    pub fn new(size: usize, width: f64, height: f64) -> Self {
        let divisions = size.max(1) as f64;
        Self {
            size,
            cell_width: width / divisions,
            cell_height: height / divisions,
            cells: vec![0.0; size * size],
            total: 0.0,
        }
    }

    /// Cells along each axis.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Sum of every value collected so far.
    pub fn total(&self) -> f64 {
        self.total
    }

    /// Value stored in cell `(column, row)`, `None` outside the grid.
    pub fn cell(&self, column: usize, row: usize) -> Option<f64> {
        (column < self.size && row < self.size).then(|| self.cells[row * self.size + column])
    }

    /// Number of cells holding a non-zero value.
    pub fn covered_cells(&self) -> usize {
        self.cells.iter().filter(|v| **v != 0.0).count()
    }

    /// Cleans every fresh cell whose center lies within `radius` of `center`.
    ///
    /// Returns the value collected by this sweep, `value` per fresh cell.
    pub fn sweep(&mut self, center: Point, radius: f64, value: f64) -> f64 {
        if self.size == 0 {
            return 0.0;
        }
        let last = (self.size - 1) as f64;
        let index = |coordinate: f64, cell: f64| (coordinate / cell - 0.5).clamp(0.0, last);
        let first_column = index(center.x - radius, self.cell_width).floor() as usize;
        let last_column = index(center.x + radius, self.cell_width).ceil() as usize;
        let first_row = index(center.y - radius, self.cell_height).floor() as usize;
        let last_row = index(center.y + radius, self.cell_height).ceil() as usize;

        let mut collected = 0.0;
        for row in first_row..=last_row {
            for column in first_column..=last_column {
                let cell_center = Point::new(
                    (column as f64 + 0.5) * self.cell_width,
                    (row as f64 + 0.5) * self.cell_height,
                );
                let slot = &mut self.cells[row * self.size + column];
                if *slot == 0.0 && cell_center.distance(center) <= radius {
                    *slot = value;
                    collected += value;
                }
            }
        }
        self.total += collected;
        collected
    }

    /// Empties every cell.
    pub fn reset(&mut self) {
        self.cells.iter_mut().for_each(|v| *v = 0.0);
        self.total = 0.0;
    }
}
