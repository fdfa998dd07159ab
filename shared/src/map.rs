//! The static game map: passable corridors and impassable walls.

use crate::point::{Point, PointSet};

/// Grid of passable/impassable cells plus bounds. Read-only for the
/// lifetime of a game session.
#[derive(Debug, Clone)]
pub struct Map {
    walls: PointSet,
    max_x: i32,
    max_y: i32,
}

impl Map {
    /// Builds a map from text rows: `#` is a wall, anything else is open.
    /// All rows must be the same length.
    pub fn from_rows(rows: &[&str]) -> Self {
        let max_y = rows.len() as i32;
        let max_x = rows.first().map_or(0, |r| r.len()) as i32;
        let mut walls = PointSet::with_max_x(max_x);
        for (y, row) in rows.iter().enumerate() {
            for (x, cell) in row.chars().enumerate() {
                if cell == '#' {
                    walls.insert(Point::new(x as f64, y as f64));
                }
            }
        }
        Self {
            walls,
            max_x,
            max_y,
        }
    }

    /// A bordered arena with pillars on even-even cells, enough structure
    /// for demos and tests without any asset loading.
    pub fn arena(width: i32, height: i32) -> Self {
        let mut walls = PointSet::with_max_x(width);
        for y in 0..height {
            for x in 0..width {
                let border = x == 0 || y == 0 || x == width - 1 || y == height - 1;
                let pillar = x % 2 == 0 && y % 2 == 0;
                if border || pillar {
                    walls.insert(Point::new(x as f64, y as f64));
                }
            }
        }
        Self {
            walls,
            max_x: width,
            max_y: height,
        }
    }

    pub fn max_x(&self) -> i32 {
        self.max_x
    }

    pub fn max_y(&self) -> i32 {
        self.max_y
    }

    /// Out-of-bounds counts as a wall.
    pub fn is_wall(&self, p: Point) -> bool {
        let (x, y) = p.grid();
        if x < 0 || y < 0 || x >= self.max_x || y >= self.max_y {
            return true;
        }
        self.walls.contains(p)
    }

    /// Grid coordinates of every open cell, row-major.
    pub fn open_cells(&self) -> Vec<Point> {
        let mut cells = Vec::new();
        for y in 0..self.max_y {
            for x in 0..self.max_x {
                let p = Point::new(x as f64, y as f64);
                if !self.is_wall(p) {
                    cells.push(p);
                }
            }
        }
        cells
    }
}
