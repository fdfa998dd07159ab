//! Per-player mutable state and facing directions.

use crate::point::Point;
use crate::powerup::PowerUpKind;
use std::collections::VecDeque;

/// One of the four cardinal facing directions. Wire packets carry these as
/// the integer tags of [`Direction::to_int`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub fn from_int(value: i32) -> Option<Direction> {
        match value {
            0 => Some(Direction::Up),
            1 => Some(Direction::Down),
            2 => Some(Direction::Left),
            3 => Some(Direction::Right),
            _ => None,
        }
    }

    pub fn to_int(self) -> i32 {
        match self {
            Direction::Up => 0,
            Direction::Down => 1,
            Direction::Left => 2,
            Direction::Right => 3,
        }
    }

    pub fn inverse(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    /// Unit offset on the grid. `y` grows downwards, row-major.
    pub fn offset(self) -> (f64, f64) {
        match self {
            Direction::Up => (0.0, -1.0),
            Direction::Down => (0.0, 1.0),
            Direction::Left => (-1.0, 0.0),
            Direction::Right => (1.0, 0.0),
        }
    }
}

/// Mutable state for one player or ghoul. Identity is the integer client
/// id, which doubles as the index into the session's entity array and
/// never changes for the lifetime of the session.
///
/// Flags are mutated only by telemetry and power-up logic; the render pass
/// reads them through the accessors.
#[derive(Debug, Clone)]
pub struct Entity {
    client_id: usize,
    location: Point,
    direction: Direction,
    velocity: f64,
    bonus_speed: f64,
    score: u32,
    mipsman: bool,
    dead: bool,
    stunned: bool,
    invincible: bool,
    items: VecDeque<PowerUpKind>,
    spawn: Point,
    respawn_count: u32,
}

impl Entity {
    pub fn new(client_id: usize, spawn: Point, velocity: f64) -> Self {
        Self {
            client_id,
            location: spawn,
            direction: Direction::Up,
            velocity,
            bonus_speed: 0.0,
            score: 0,
            mipsman: false,
            dead: false,
            stunned: false,
            invincible: false,
            items: VecDeque::new(),
            spawn,
            respawn_count: 0,
        }
    }

    pub fn client_id(&self) -> usize {
        self.client_id
    }

    pub fn location(&self) -> Point {
        self.location
    }

    pub fn set_location(&mut self, location: Point) {
        self.location = location;
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn set_direction(&mut self, direction: Direction) {
        self.direction = direction;
    }

    pub fn spawn_point(&self) -> Point {
        self.spawn
    }

    pub fn velocity(&self) -> f64 {
        self.velocity
    }

    pub fn bonus_speed(&self) -> f64 {
        self.bonus_speed
    }

    pub fn apply_speed_bonus(&mut self, delta: f64) {
        self.bonus_speed += delta;
    }

    /// Base velocity plus any speed bonus; zero while stunned or dead.
    pub fn effective_velocity(&self) -> f64 {
        if self.stunned || self.dead {
            0.0
        } else {
            self.velocity + self.bonus_speed
        }
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn increment_score(&mut self, value: u32) {
        self.score += value;
    }

    /// Absolute overwrite from an authoritative score broadcast.
    pub fn set_score(&mut self, score: u32) {
        self.score = score;
    }

    pub fn is_mipsman(&self) -> bool {
        self.mipsman
    }

    pub fn set_mipsman(&mut self, mipsman: bool) {
        self.mipsman = mipsman;
    }

    pub fn is_dead(&self) -> bool {
        self.dead
    }

    pub fn is_stunned(&self) -> bool {
        self.stunned
    }

    pub fn set_stunned(&mut self, stunned: bool) {
        self.stunned = stunned;
    }

    pub fn is_invincible(&self) -> bool {
        self.invincible
    }

    pub fn set_invincible(&mut self, invincible: bool) {
        self.invincible = invincible;
    }

    pub fn give_item(&mut self, kind: PowerUpKind) {
        self.items.push_back(kind);
    }

    /// Pops the oldest held item.
    pub fn take_item(&mut self) -> Option<PowerUpKind> {
        self.items.pop_front()
    }

    pub fn items(&self) -> impl Iterator<Item = &PowerUpKind> {
        self.items.iter()
    }

    /// Marks the entity dead and starts its respawn countdown.
    pub fn kill(&mut self) {
        self.dead = true;
        self.stunned = false;
        self.respawn_count = 0;
    }

    /// Advances the respawn countdown of a dead entity. Returns true on the
    /// tick the entity comes back to life at its spawn point.
    pub fn advance_respawn(&mut self, threshold: u32) -> bool {
        if !self.dead {
            return false;
        }
        self.respawn_count += 1;
        if self.respawn_count >= threshold {
            self.dead = false;
            self.respawn_count = 0;
            self.location = self.spawn;
            return true;
        }
        false
    }
}
