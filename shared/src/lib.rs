use std::time::Duration;
use thiserror::Error;

pub mod entity;
pub mod map;
pub mod pellet;
pub mod point;
pub mod powerup;
pub mod protocol;
pub mod scheduler;
pub mod world;

pub use entity::{Direction, Entity};
pub use map::Map;
pub use pellet::Pellet;
pub use point::{Point, PointMap, PointSet};
pub use powerup::{ActivePowerUps, PowerUp, PowerUpKind};
pub use protocol::{EntityPosition, Input, Packet, ProtocolError};
pub use scheduler::Scheduler;

pub const DEFAULT_TICK_MS: u64 = 10;
pub const BASE_VELOCITY: f64 = 0.08;
pub const SPEED_BONUS: f64 = 0.02;
pub const CENTRE_TOLERANCE: f64 = 0.05;
pub const PELLET_VALUE: u32 = 1;
pub const PELLET_RESPAWN_TICKS: u32 = 5000;
pub const ENTITY_RESPAWN_TICKS: u32 = 100;
pub const CAPTURE_REWARD: u32 = 200;

/// Tunables for one game session, threaded explicitly into the telemetry
/// constructors on both sides of the wire. Host and replicas must agree on
/// these values for the locally ticked timers to stay in step.
#[derive(Debug, Clone)]
pub struct GameConfig {
    pub tick: Duration,
    pub base_velocity: f64,
    pub speed_bonus: f64,
    pub pellet_respawn_ticks: u32,
    pub entity_respawn_ticks: u32,
    pub capture_reward: u32,
    /// Grid cells seeded as power-up boxes on the authoritative side.
    pub power_up_box_cells: Vec<(i32, i32)>,
    /// Session length in ticks; the host stops the game when it elapses.
    /// `None` runs until stopped explicitly.
    pub game_length_ticks: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(DEFAULT_TICK_MS),
            base_velocity: BASE_VELOCITY,
            speed_bonus: SPEED_BONUS,
            pellet_respawn_ticks: PELLET_RESPAWN_TICKS,
            entity_respawn_ticks: ENTITY_RESPAWN_TICKS,
            capture_reward: CAPTURE_REWARD,
            power_up_box_cells: Vec::new(),
            game_length_ticks: None,
        }
    }
}

/// Session-fatal faults, as opposed to the recoverable [`ProtocolError`]s.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("telemetry mutated after stop_game")]
    Stopped,
    #[error("transport queue closed")]
    TransportClosed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_constants() {
        let config = GameConfig::default();
        assert_eq!(config.tick, Duration::from_millis(DEFAULT_TICK_MS));
        assert_eq!(config.base_velocity, BASE_VELOCITY);
        assert_eq!(config.speed_bonus, SPEED_BONUS);
        assert_eq!(config.pellet_respawn_ticks, PELLET_RESPAWN_TICKS);
        assert!(config.power_up_box_cells.is_empty());
    }
}
