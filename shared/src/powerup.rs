//! The four timed power-up effects and the table of active instances.
//!
//! Behaviour is dispatched by matching on [`PowerUpKind`]: `use` starts a
//! self- or map-targeted effect, `trigger` springs a placed trap on its
//! victim, and [`advance_effects`] drives every counter and reverses an
//! effect exactly once when it expires.

use crate::entity::Entity;
use crate::map::Map;
use crate::pellet::Pellet;
use crate::point::{Point, PointMap};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// The closed set of power-up variants, tagged on the wire by
/// [`PowerUpKind::to_int`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PowerUpKind {
    Web,
    Speed,
    BlueShell,
    Invincible,
}

impl PowerUpKind {
    pub fn from_int(value: i32) -> Option<PowerUpKind> {
        match value {
            0 => Some(PowerUpKind::Web),
            1 => Some(PowerUpKind::Speed),
            2 => Some(PowerUpKind::BlueShell),
            3 => Some(PowerUpKind::Invincible),
            _ => None,
        }
    }

    pub fn to_int(self) -> i32 {
        match self {
            PowerUpKind::Web => 0,
            PowerUpKind::Speed => 1,
            PowerUpKind::BlueShell => 2,
            PowerUpKind::Invincible => 3,
        }
    }

    /// Fixed effect duration in simulation ticks.
    pub fn effect_ticks(self) -> u32 {
        match self {
            PowerUpKind::Web => 20,
            PowerUpKind::Speed => 200,
            PowerUpKind::BlueShell => 20,
            PowerUpKind::Invincible => 200,
        }
    }
}

/// One single-use power-up instance. Created on use or trigger, registered
/// in the active table under its unique id, removed the tick its counter
/// reaches the effect duration.
#[derive(Debug, Clone)]
pub struct PowerUp {
    id: u64,
    kind: PowerUpKind,
    counter: u32,
    target: Option<usize>,
}

/// Active power-ups keyed by instance id.
pub type ActivePowerUps = HashMap<u64, PowerUp>;

impl PowerUp {
    pub fn new(kind: PowerUpKind) -> Self {
        Self {
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
            kind,
            counter: 0,
            target: None,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn kind(&self) -> PowerUpKind {
        self.kind
    }

    pub fn counter(&self) -> u32 {
        self.counter
    }

    pub fn target(&self) -> Option<usize> {
        self.target
    }

    fn activate(mut self, target: usize, active: &mut ActivePowerUps) {
        self.target = Some(target);
        self.counter = 0;
        active.insert(self.id, self);
    }
}

/// What a `use` did, so the authoritative side can serialise the matching
/// packet exactly once.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UseOutcome {
    /// A timed effect started on some entity.
    Activated,
    /// A trap box was placed at the given grid cell.
    TrapPlaced(Point),
    /// Nothing happened (blocked placement, no valid target); the item is
    /// still spent.
    Fizzled,
}

/// Uses a power-up on behalf of `user_id`, mutating entity flags, the
/// pellet map and the active table as the variant demands.
pub fn use_power_up(
    kind: PowerUpKind,
    user_id: usize,
    speed_bonus: f64,
    map: &Map,
    agents: &mut [Entity],
    pellets: &mut PointMap<Pellet>,
    active: &mut ActivePowerUps,
) -> UseOutcome {
    match kind {
        PowerUpKind::Speed => {
            agents[user_id].apply_speed_bonus(speed_bonus);
            PowerUp::new(kind).activate(user_id, active);
            UseOutcome::Activated
        }
        PowerUpKind::Invincible => {
            agents[user_id].set_invincible(true);
            PowerUp::new(kind).activate(user_id, active);
            UseOutcome::Activated
        }
        PowerUpKind::Web => {
            // Dropped one cell behind the user; the counter only starts
            // when the trap is sprung.
            let user = &agents[user_id];
            let cell = user
                .location()
                .centred()
                .move_in_direction(user.direction().inverse(), 1.0);
            if map.is_wall(cell) {
                return UseOutcome::Fizzled;
            }
            pellets.insert(cell, Pellet::trap_box(cell, PowerUp::new(kind)));
            UseOutcome::TrapPlaced(cell.grid_coord())
        }
        PowerUpKind::BlueShell => {
            // Homes in on whoever currently holds the hunted role.
            let victim = agents
                .iter()
                .position(|a| a.is_mipsman() && a.client_id() != user_id && !a.is_dead());
            match victim {
                Some(victim) if !agents[victim].is_invincible() => {
                    agents[victim].set_stunned(true);
                    PowerUp::new(kind).activate(victim, active);
                    UseOutcome::Activated
                }
                _ => UseOutcome::Fizzled,
            }
        }
    }
}

/// Springs a placed trap on the entity that stepped on it.
pub fn trigger_trap(
    trap: PowerUp,
    victim_id: usize,
    agents: &mut [Entity],
    active: &mut ActivePowerUps,
) {
    match trap.kind {
        PowerUpKind::Web => {
            if agents[victim_id].is_invincible() {
                return;
            }
            agents[victim_id].set_stunned(true);
            trap.activate(victim_id, active);
        }
        // Only webs are placeable; anything else fizzles on contact.
        _ => {}
    }
}

/// Advances every active counter by one tick, removing and reversing the
/// effects that reach their duration. The reversal runs exactly once per
/// instance.
pub fn advance_effects(active: &mut ActivePowerUps, agents: &mut [Entity], speed_bonus: f64) {
    let mut expired: Vec<u64> = Vec::new();
    for power_up in active.values_mut() {
        power_up.counter += 1;
        if power_up.counter >= power_up.kind.effect_ticks() {
            expired.push(power_up.id);
        }
    }
    for id in expired {
        let Some(power_up) = active.remove(&id) else {
            continue;
        };
        let Some(target) = power_up.target else {
            continue;
        };
        match power_up.kind {
            PowerUpKind::Speed => agents[target].apply_speed_bonus(-speed_bonus),
            PowerUpKind::Invincible => agents[target].set_invincible(false),
            PowerUpKind::Web | PowerUpKind::BlueShell => agents[target].set_stunned(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Direction;
    use assert_approx_eq::assert_approx_eq;

    fn setup() -> (Map, Vec<Entity>, PointMap<Pellet>, ActivePowerUps) {
        let map = Map::from_rows(&["#####", "#...#", "#...#", "#...#", "#####"]);
        let agents = vec![
            Entity::new(0, Point::new(1.5, 1.5), 0.08),
            Entity::new(1, Point::new(3.5, 3.5), 0.08),
        ];
        let pellets = PointMap::new(&map);
        (map, agents, pellets, ActivePowerUps::new())
    }

    #[test]
    fn kind_int_round_trip() {
        for value in 0..4 {
            let kind = PowerUpKind::from_int(value).unwrap();
            assert_eq!(kind.to_int(), value);
        }
        assert_eq!(PowerUpKind::from_int(4), None);
    }

    #[test]
    fn instance_ids_are_unique() {
        let a = PowerUp::new(PowerUpKind::Web);
        let b = PowerUp::new(PowerUpKind::Web);
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn speed_reverses_exactly() {
        let (map, mut agents, mut pellets, mut active) = setup();
        let before = agents[0].effective_velocity();
        let outcome = use_power_up(
            PowerUpKind::Speed,
            0,
            0.02,
            &map,
            &mut agents,
            &mut pellets,
            &mut active,
        );
        assert_eq!(outcome, UseOutcome::Activated);
        assert_approx_eq!(agents[0].effective_velocity(), before + 0.02);
        for _ in 0..PowerUpKind::Speed.effect_ticks() {
            advance_effects(&mut active, &mut agents, 0.02);
        }
        assert!(active.is_empty());
        assert_approx_eq!(agents[0].effective_velocity(), before);
    }

    #[test]
    fn invincible_flag_cycles() {
        let (map, mut agents, mut pellets, mut active) = setup();
        assert!(!agents[0].is_invincible());
        use_power_up(
            PowerUpKind::Invincible,
            0,
            0.02,
            &map,
            &mut agents,
            &mut pellets,
            &mut active,
        );
        assert!(agents[0].is_invincible());
        for _ in 0..PowerUpKind::Invincible.effect_ticks() {
            advance_effects(&mut active, &mut agents, 0.02);
        }
        assert!(!agents[0].is_invincible());
        assert!(active.is_empty());
    }

    #[test]
    fn web_places_trap_without_starting_counter() {
        let (map, mut agents, mut pellets, mut active) = setup();
        agents[0].set_location(Point::new(2.5, 2.5));
        agents[0].set_direction(Direction::Right);
        let outcome = use_power_up(
            PowerUpKind::Web,
            0,
            0.02,
            &map,
            &mut agents,
            &mut pellets,
            &mut active,
        );
        assert_eq!(outcome, UseOutcome::TrapPlaced(Point::new(1.0, 2.0)));
        assert!(active.is_empty());
        assert!(pellets.get(Point::new(1.0, 2.0)).unwrap().is_trap());
    }

    #[test]
    fn web_into_wall_fizzles() {
        let (map, mut agents, mut pellets, mut active) = setup();
        // facing away from the wall on their left leaves the drop cell in it
        agents[0].set_location(Point::new(1.5, 1.5));
        agents[0].set_direction(Direction::Right);
        let outcome = use_power_up(
            PowerUpKind::Web,
            0,
            0.02,
            &map,
            &mut agents,
            &mut pellets,
            &mut active,
        );
        assert_eq!(outcome, UseOutcome::Fizzled);
        assert!(pellets.is_empty());
    }

    #[test]
    fn sprung_web_stuns_until_expiry() {
        let (_, mut agents, _, mut active) = setup();
        let trap = PowerUp::new(PowerUpKind::Web);
        trigger_trap(trap, 1, &mut agents, &mut active);
        assert!(agents[1].is_stunned());
        assert_eq!(active.len(), 1);
        for _ in 0..PowerUpKind::Web.effect_ticks() {
            advance_effects(&mut active, &mut agents, 0.02);
        }
        assert!(!agents[1].is_stunned());
        assert!(active.is_empty());
    }

    #[test]
    fn blue_shell_stuns_the_mipsman() {
        let (map, mut agents, mut pellets, mut active) = setup();
        agents[1].set_mipsman(true);
        let outcome = use_power_up(
            PowerUpKind::BlueShell,
            0,
            0.02,
            &map,
            &mut agents,
            &mut pellets,
            &mut active,
        );
        assert_eq!(outcome, UseOutcome::Activated);
        assert!(agents[1].is_stunned());
        assert!(!agents[0].is_stunned());
    }

    #[test]
    fn blue_shell_respects_invincibility() {
        let (map, mut agents, mut pellets, mut active) = setup();
        agents[1].set_mipsman(true);
        agents[1].set_invincible(true);
        let outcome = use_power_up(
            PowerUpKind::BlueShell,
            0,
            0.02,
            &map,
            &mut agents,
            &mut pellets,
            &mut active,
        );
        assert_eq!(outcome, UseOutcome::Fizzled);
        assert!(!agents[1].is_stunned());
        assert!(active.is_empty());
    }
}
