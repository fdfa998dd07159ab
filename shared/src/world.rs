//! Per-tick logic the authoritative and replica telemetries must run
//! identically: pellet/box interaction derived from entity positions, and
//! the respawn timer sweep. Keeping both sides on the same code path is
//! what bounds replica drift to a single tick between snapshots.

use crate::entity::Entity;
use crate::map::Map;
use crate::pellet::Pellet;
use crate::point::{Point, PointMap};
use crate::powerup::{trigger_trap, ActivePowerUps};
use crate::CENTRE_TOLERANCE;

/// What happened at a pellet cell this tick. The authoritative side turns
/// `BoxOpened` into an inventory grant; replicas ignore the events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PelletEvent {
    Eaten { client_id: usize, value: u32 },
    BoxOpened { client_id: usize },
    TrapSprung { client_id: usize },
}

/// Entity spawn cells: open cells spread evenly across the map, centred.
/// Host and replicas must derive identical spawns, so this is the one
/// placement routine for both.
pub fn spawn_points(map: &Map, count: usize) -> Vec<Point> {
    let open = map.open_cells();
    (0..count)
        .map(|i| open[i * open.len() / count.max(1)].centred())
        .collect()
}

/// Resolves every entity against the pellet in its cell: the hunted entity
/// eats food and opens boxes, anyone springs a trap.
pub fn resolve_pellets(
    agents: &mut [Entity],
    pellets: &mut PointMap<Pellet>,
    active: &mut ActivePowerUps,
) -> Vec<PelletEvent> {
    let mut events = Vec::new();
    for id in 0..agents.len() {
        if agents[id].is_dead() {
            continue;
        }
        let location = agents[id].location();
        if !location.is_centred(CENTRE_TOLERANCE) {
            continue;
        }
        let Some(pellet) = pellets.get_mut(location) else {
            continue;
        };
        if !pellet.can_consume(&agents[id]) {
            continue;
        }
        if pellet.is_trap() {
            if let Some(trap) = pellet.spring_trap() {
                trigger_trap(trap, id, agents, active);
                events.push(PelletEvent::TrapSprung { client_id: id });
            }
        } else if pellet.is_box() {
            pellet.consume();
            events.push(PelletEvent::BoxOpened { client_id: id });
        } else {
            let value = pellet.value();
            pellet.consume();
            agents[id].increment_score(value);
            events.push(PelletEvent::Eaten {
                client_id: id,
                value,
            });
        }
    }
    events
}

/// Sweeps every pellet's respawn counter, replacing slots that reach the
/// threshold with freshly constructed pellets.
pub fn advance_respawns(pellets: &mut PointMap<Pellet>, threshold: u32) {
    for pellet in pellets.values_mut() {
        if pellet.advance_respawn(threshold) {
            *pellet = pellet.respawned();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::powerup::{PowerUp, PowerUpKind};

    fn open_map() -> Map {
        Map::from_rows(&["#####", "#...#", "#...#", "#...#", "#####"])
    }

    fn seeded(map: &Map) -> PointMap<Pellet> {
        let mut pellets = PointMap::new(map);
        for cell in map.open_cells() {
            pellets.insert(cell, Pellet::food(cell));
        }
        pellets
    }

    #[test]
    fn spawn_points_are_open_centred_and_shared() {
        let map = open_map();
        let spawns = spawn_points(&map, 3);
        assert_eq!(spawns.len(), 3);
        for p in &spawns {
            assert!(!map.is_wall(*p));
            assert!(p.is_centred(0.001));
        }
        assert_eq!(spawns, spawn_points(&map, 3));
    }

    #[test]
    fn mipsman_eats_the_pellet_underfoot() {
        let map = open_map();
        let mut pellets = seeded(&map);
        let mut agents = vec![Entity::new(0, Point::new(1.5, 1.5), 0.08)];
        agents[0].set_mipsman(true);
        let mut active = ActivePowerUps::new();

        let events = resolve_pellets(&mut agents, &mut pellets, &mut active);
        assert_eq!(
            events,
            vec![PelletEvent::Eaten {
                client_id: 0,
                value: 1
            }]
        );
        assert_eq!(agents[0].score(), 1);
        assert!(!pellets.get(Point::new(1.0, 1.0)).unwrap().is_active());
    }

    #[test]
    fn ghouls_leave_food_alone() {
        let map = open_map();
        let mut pellets = seeded(&map);
        let mut agents = vec![Entity::new(0, Point::new(1.5, 1.5), 0.08)];
        let mut active = ActivePowerUps::new();

        let events = resolve_pellets(&mut agents, &mut pellets, &mut active);
        assert!(events.is_empty());
        assert!(pellets.get(Point::new(1.0, 1.0)).unwrap().is_active());
    }

    #[test]
    fn off_centre_entities_do_not_consume() {
        let map = open_map();
        let mut pellets = seeded(&map);
        let mut agents = vec![Entity::new(0, Point::new(1.8, 1.5), 0.08)];
        agents[0].set_mipsman(true);
        let mut active = ActivePowerUps::new();

        assert!(resolve_pellets(&mut agents, &mut pellets, &mut active).is_empty());
    }

    #[test]
    fn anyone_springs_a_trap() {
        let map = open_map();
        let mut pellets = seeded(&map);
        let cell = Point::new(2.0, 2.0);
        pellets.insert(cell, Pellet::trap_box(cell, PowerUp::new(PowerUpKind::Web)));
        let mut agents = vec![Entity::new(0, Point::new(2.5, 2.5), 0.08)];
        let mut active = ActivePowerUps::new();

        let events = resolve_pellets(&mut agents, &mut pellets, &mut active);
        assert_eq!(events, vec![PelletEvent::TrapSprung { client_id: 0 }]);
        assert!(agents[0].is_stunned());
        assert_eq!(active.len(), 1);
    }

    #[test]
    fn respawn_sweep_replaces_expired_slots() {
        let map = open_map();
        let mut pellets = seeded(&map);
        let cell = Point::new(1.0, 1.0);
        pellets.get_mut(cell).unwrap().consume();

        advance_respawns(&mut pellets, 2);
        assert!(!pellets.get(cell).unwrap().is_active());
        advance_respawns(&mut pellets, 2);
        let fresh = pellets.get(cell).unwrap();
        assert!(fresh.is_active());
        assert_eq!(fresh.value(), crate::PELLET_VALUE);
    }
}
