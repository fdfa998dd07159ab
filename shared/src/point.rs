//! Grid-addressed coordinates and the containers keyed by them.

use crate::entity::Direction;
use crate::map::Map;
use std::collections::HashMap;

/// A position on the game grid. The fractional part is the offset within
/// the containing cell; entities sit at `(cell + 0.5)` when they are flush
/// with a cell centre.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// The containing grid cell as integer coordinates.
    pub fn grid(&self) -> (i32, i32) {
        (self.x.floor() as i32, self.y.floor() as i32)
    }

    /// The containing grid cell, with the fractional offset truncated away.
    pub fn grid_coord(&self) -> Point {
        Point::new(self.x.floor(), self.y.floor())
    }

    /// The centre of the containing grid cell.
    pub fn centred(&self) -> Point {
        Point::new(self.x.floor() + 0.5, self.y.floor() + 0.5)
    }

    /// Whether this point lies within `tolerance` of its cell centre on
    /// both axes.
    pub fn is_centred(&self, tolerance: f64) -> bool {
        let centre = self.centred();
        (self.x - centre.x).abs() <= tolerance && (self.y - centre.y).abs() <= tolerance
    }

    /// The point reached by travelling `distance` cells in `direction`.
    pub fn move_in_direction(&self, direction: Direction, distance: f64) -> Point {
        let (dx, dy) = direction.offset();
        Point::new(self.x + dx * distance, self.y + dy * distance)
    }

    pub fn in_same_cell(&self, other: &Point) -> bool {
        self.grid() == other.grid()
    }
}

/// An associative container keyed by the grid cell of a [`Point`], never by
/// the fractional offset. Keys linearise as `y * max_x + x`; `max_x` is
/// fixed at construction from the bound [`Map`] and never changes.
#[derive(Debug, Clone)]
pub struct PointMap<V> {
    max_x: i32,
    inner: HashMap<i32, V>,
}

impl<V> PointMap<V> {
    pub fn new(map: &Map) -> Self {
        Self::with_max_x(map.max_x())
    }

    pub fn with_max_x(max_x: i32) -> Self {
        Self {
            max_x,
            inner: HashMap::new(),
        }
    }

    fn key(&self, p: Point) -> i32 {
        let (x, y) = p.grid();
        y * self.max_x + x
    }

    fn point_from_key(&self, key: i32) -> Point {
        let x = key % self.max_x;
        let y = (key - x) / self.max_x;
        Point::new(x as f64, y as f64)
    }

    pub fn insert(&mut self, p: Point, value: V) -> Option<V> {
        let key = self.key(p);
        self.inner.insert(key, value)
    }

    pub fn get(&self, p: Point) -> Option<&V> {
        self.inner.get(&self.key(p))
    }

    pub fn get_mut(&mut self, p: Point) -> Option<&mut V> {
        let key = self.key(p);
        self.inner.get_mut(&key)
    }

    pub fn remove(&mut self, p: Point) -> Option<V> {
        let key = self.key(p);
        self.inner.remove(&key)
    }

    pub fn contains(&self, p: Point) -> bool {
        self.inner.contains_key(&self.key(p))
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn clear(&mut self) {
        self.inner.clear();
    }

    /// Keys as grid-coordinate points, in linearised-key order. Iteration
    /// order is deterministic but not otherwise meaningful.
    pub fn keys(&self) -> Vec<Point> {
        let mut keys: Vec<i32> = self.inner.keys().copied().collect();
        keys.sort_unstable();
        keys.into_iter().map(|k| self.point_from_key(k)).collect()
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.inner.values()
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut V> {
        self.inner.values_mut()
    }
}

/// The set form of [`PointMap`]: membership by grid cell only.
#[derive(Debug, Clone)]
pub struct PointSet {
    inner: PointMap<()>,
}

impl PointSet {
    pub fn new(map: &Map) -> Self {
        Self::with_max_x(map.max_x())
    }

    pub fn with_max_x(max_x: i32) -> Self {
        Self {
            inner: PointMap::with_max_x(max_x),
        }
    }

    /// Returns true if the cell was not already present.
    pub fn insert(&mut self, p: Point) -> bool {
        self.inner.insert(p, ()).is_none()
    }

    pub fn contains(&self, p: Point) -> bool {
        self.inner.contains(p)
    }

    pub fn remove(&mut self, p: Point) -> bool {
        self.inner.remove(p).is_some()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
