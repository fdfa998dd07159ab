//! Consumable cell contents: food pellets and power-up boxes.

use crate::entity::Entity;
use crate::point::Point;
use crate::powerup::PowerUp;
use crate::PELLET_VALUE;

#[derive(Debug, Clone)]
enum PelletKind {
    Food,
    /// A box that grants a random power-up when opened, or springs the
    /// held power-up on contact when placed as a trap.
    PowerUpBox { trap: Option<PowerUp> },
}

/// One cell's consumable content. Respawning replaces the whole value with
/// a freshly constructed pellet, so every timer and the trap state reset
/// together.
#[derive(Debug, Clone)]
pub struct Pellet {
    location: Point,
    active: bool,
    respawn_count: u32,
    value: u32,
    kind: PelletKind,
}

impl Pellet {
    /// A plain food pellet at the centre of the given cell.
    pub fn food(location: Point) -> Self {
        Self {
            location: location.centred(),
            active: true,
            respawn_count: 0,
            value: PELLET_VALUE,
            kind: PelletKind::Food,
        }
    }

    /// A power-up box holding no trap: opening it grants a random power-up.
    pub fn power_up_box(location: Point) -> Self {
        Self {
            location: location.centred(),
            active: true,
            respawn_count: 0,
            value: 0,
            kind: PelletKind::PowerUpBox { trap: None },
        }
    }

    /// A box holding a placed trap, sprung on contact by any entity.
    pub fn trap_box(location: Point, trap: PowerUp) -> Self {
        Self {
            location: location.centred(),
            active: true,
            respawn_count: 0,
            value: 0,
            kind: PelletKind::PowerUpBox { trap: Some(trap) },
        }
    }

    pub fn location(&self) -> Point {
        self.location
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn value(&self) -> u32 {
        self.value
    }

    pub fn is_box(&self) -> bool {
        matches!(self.kind, PelletKind::PowerUpBox { .. })
    }

    pub fn is_trap(&self) -> bool {
        matches!(self.kind, PelletKind::PowerUpBox { trap: Some(_) })
    }

    /// Traps catch anyone; everything else is only consumable by the
    /// entity currently in the hunted role.
    pub fn can_consume(&self, entity: &Entity) -> bool {
        self.active && (self.is_trap() || entity.is_mipsman())
    }

    pub fn consume(&mut self) {
        self.active = false;
        self.respawn_count = 0;
    }

    /// Takes the held trap and consumes the box. A sprung box reverts to a
    /// plain food slot for respawn purposes.
    pub fn spring_trap(&mut self) -> Option<PowerUp> {
        let PelletKind::PowerUpBox { trap } = &mut self.kind else {
            return None;
        };
        let sprung = trap.take();
        if sprung.is_some() {
            self.kind = PelletKind::Food;
            self.consume();
        }
        sprung
    }

    /// Advances the respawn counter while inactive. Returns true when the
    /// threshold is reached and the slot should be replaced.
    pub fn advance_respawn(&mut self, threshold: u32) -> bool {
        if self.active {
            return false;
        }
        self.respawn_count += 1;
        self.respawn_count >= threshold
    }

    /// The freshly constructed replacement for this slot once the respawn
    /// threshold is reached. Grant boxes come back as grant boxes; food and
    /// sprung traps come back as food.
    pub fn respawned(&self) -> Pellet {
        match self.kind {
            PelletKind::PowerUpBox { trap: None } => Pellet::power_up_box(self.location),
            _ => Pellet::food(self.location),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::powerup::PowerUpKind;

    #[test]
    fn food_starts_active_at_cell_centre() {
        let p = Pellet::food(Point::new(3.0, 4.0));
        assert!(p.is_active());
        assert_eq!(p.location(), Point::new(3.5, 4.5));
        assert_eq!(p.value(), PELLET_VALUE);
        assert!(!p.is_box());
    }

    #[test]
    fn only_mipsman_consumes_food() {
        let p = Pellet::food(Point::new(0.0, 0.0));
        let mut ghoul = Entity::new(1, Point::new(0.5, 0.5), 0.08);
        assert!(!p.can_consume(&ghoul));
        ghoul.set_mipsman(true);
        assert!(p.can_consume(&ghoul));
    }

    #[test]
    fn traps_catch_anyone() {
        let trap = PowerUp::new(PowerUpKind::Web);
        let p = Pellet::trap_box(Point::new(0.0, 0.0), trap);
        let ghoul = Entity::new(1, Point::new(0.5, 0.5), 0.08);
        assert!(p.is_trap());
        assert!(p.can_consume(&ghoul));
    }

    #[test]
    fn respawn_counter_only_advances_while_inactive() {
        let mut p = Pellet::food(Point::new(0.0, 0.0));
        assert!(!p.advance_respawn(2));
        assert!(p.is_active());
        p.consume();
        assert!(!p.advance_respawn(2));
        assert!(p.advance_respawn(2));
    }

    #[test]
    fn consuming_resets_the_counter() {
        let mut p = Pellet::food(Point::new(0.0, 0.0));
        p.consume();
        assert!(!p.advance_respawn(3));
        // re-consume while already inactive zeroes the progress
        p.consume();
        assert!(!p.advance_respawn(3));
        assert!(!p.advance_respawn(3));
        assert!(p.advance_respawn(3));
    }

    #[test]
    fn sprung_trap_respawns_as_food() {
        let trap = PowerUp::new(PowerUpKind::Web);
        let mut p = Pellet::trap_box(Point::new(2.0, 2.0), trap);
        let sprung = p.spring_trap().unwrap();
        assert_eq!(sprung.kind(), PowerUpKind::Web);
        assert!(!p.is_active());
        assert!(p.spring_trap().is_none());
        let fresh = p.respawned();
        assert!(fresh.is_active());
        assert!(!fresh.is_box());
        assert_eq!(fresh.value(), PELLET_VALUE);
    }

    #[test]
    fn grant_box_respawns_as_grant_box() {
        let mut p = Pellet::power_up_box(Point::new(2.0, 2.0));
        p.consume();
        let fresh = p.respawned();
        assert!(fresh.is_box());
        assert!(!fresh.is_trap());
        assert!(fresh.is_active());
    }
}
