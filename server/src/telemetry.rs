//! The authoritative telemetry: the one simulation whose state is truth.
//!
//! Each tick drains the queued inputs, advances movement, collisions and
//! timers, and serialises the resulting state into the outgoing packet
//! queue. Invalid inputs are dropped silently; replicas never see a move
//! the host rejected.

use log::{debug, error, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shared::powerup::{advance_effects, use_power_up, ActivePowerUps, PowerUpKind, UseOutcome};
use shared::protocol::{EntityPosition, Input, Packet};
use shared::world::{self, PelletEvent};
use shared::{
    Direction, Entity, GameConfig, Map, Pellet, PointMap, SessionError, CENTRE_TOLERANCE,
};
use tokio::sync::mpsc;

pub struct HostTelemetry {
    config: GameConfig,
    map: Map,
    agents: Vec<Entity>,
    pellets: PointMap<Pellet>,
    active_power_ups: ActivePowerUps,
    inputs: mpsc::UnboundedReceiver<Input>,
    outgoing: mpsc::UnboundedSender<String>,
    rng: StdRng,
    tick_count: u64,
    stopped: bool,
}

impl HostTelemetry {
    pub fn new(
        config: GameConfig,
        map: Map,
        num_players: usize,
        inputs: mpsc::UnboundedReceiver<Input>,
        outgoing: mpsc::UnboundedSender<String>,
    ) -> Self {
        let mut agents: Vec<Entity> = world::spawn_points(&map, num_players)
            .into_iter()
            .enumerate()
            .map(|(id, spawn)| Entity::new(id, spawn, config.base_velocity))
            .collect();
        if let Some(first) = agents.first_mut() {
            first.set_mipsman(true);
        }

        let mut pellets = PointMap::new(&map);
        for cell in map.open_cells() {
            pellets.insert(cell, Pellet::food(cell));
        }
        for &(x, y) in &config.power_up_box_cells {
            let cell = shared::Point::new(x as f64, y as f64);
            if !map.is_wall(cell) {
                pellets.insert(cell, Pellet::power_up_box(cell));
            }
        }

        Self {
            config,
            map,
            agents,
            pellets,
            active_power_ups: ActivePowerUps::new(),
            inputs,
            outgoing,
            rng: StdRng::from_entropy(),
            tick_count: 0,
            stopped: false,
        }
    }

    /// One-time designation of which entity begins in the hunted role.
    pub fn set_mip_id(&mut self, id: usize) -> Result<(), SessionError> {
        if self.stopped {
            return Err(SessionError::Stopped);
        }
        if self.tick_count > 0 {
            warn!("ignoring mipsman designation after the game started");
            return Ok(());
        }
        if id >= self.agents.len() {
            warn!("ignoring mipsman designation for unknown client {id}");
            return Ok(());
        }
        for agent in &mut self.agents {
            agent.set_mipsman(agent.client_id() == id);
        }
        Ok(())
    }

    /// One simulation step. Returns false once the session has stopped.
    pub fn tick(&mut self) -> bool {
        if self.stopped {
            return false;
        }
        self.process_inputs();
        self.process_physics();
        if let Some(limit) = self.config.game_length_ticks {
            if self.tick_count >= limit {
                self.stop_game();
            }
        }
        !self.stopped
    }

    fn process_inputs(&mut self) {
        while let Ok(input) = self.inputs.try_recv() {
            self.apply_input(input);
        }
    }

    fn apply_input(&mut self, input: Input) {
        let Input {
            client_id,
            direction,
        } = input;
        if client_id >= self.agents.len() {
            debug!("dropping input for unknown client {client_id}");
            return;
        }
        if self.agents[client_id].is_dead() {
            debug!("dropping input for dead client {client_id}");
            return;
        }
        if !self.valid_move(client_id, direction) {
            debug!("rejecting move {direction:?} for client {client_id}");
            return;
        }

        let centre = self.agents[client_id].location().centred();
        self.agents[client_id].set_location(centre);
        self.agents[client_id].set_direction(direction);
        let mipsman_id = self.mipsman_id();
        self.send(Packet::Movement {
            input,
            x: centre.x,
            y: centre.y,
            mipsman_id,
        });
    }

    /// A turn is only legal from a cell centre, into a non-wall cell.
    fn valid_move(&self, client_id: usize, direction: Direction) -> bool {
        let entity = &self.agents[client_id];
        if !entity.location().is_centred(CENTRE_TOLERANCE) {
            return false;
        }
        let ahead = entity.location().centred().move_in_direction(direction, 1.0);
        !self.map.is_wall(ahead)
    }

    fn process_physics(&mut self) {
        for id in 0..self.agents.len() {
            self.step_entity(id);
        }

        let events = world::resolve_pellets(
            &mut self.agents,
            &mut self.pellets,
            &mut self.active_power_ups,
        );
        for event in events {
            if let PelletEvent::BoxOpened { client_id } = event {
                self.grant_power_up(client_id);
            }
        }

        self.resolve_captures();

        advance_effects(
            &mut self.active_power_ups,
            &mut self.agents,
            self.config.speed_bonus,
        );
        world::advance_respawns(&mut self.pellets, self.config.pellet_respawn_ticks);
        for agent in &mut self.agents {
            agent.advance_respawn(self.config.entity_respawn_ticks);
        }

        self.tick_count += 1;
        self.broadcast_snapshots();
    }

    fn step_entity(&mut self, id: usize) {
        let speed = self.agents[id].effective_velocity();
        if speed <= 0.0 {
            return;
        }
        let location = self.agents[id].location();
        let direction = self.agents[id].direction();
        let centre = location.centred();
        let mut next = location.move_in_direction(direction, speed);
        if self.map.is_wall(centre.move_in_direction(direction, 1.0)) {
            // cannot pass the centre of the last open cell
            match direction {
                Direction::Up => next.y = next.y.max(centre.y),
                Direction::Down => next.y = next.y.min(centre.y),
                Direction::Left => next.x = next.x.max(centre.x),
                Direction::Right => next.x = next.x.min(centre.x),
            }
        }
        self.agents[id].set_location(next);
    }

    /// Mipsman-vs-ghoul contact: the capturer takes the hunted role and the
    /// capture reward, the victim dies and respawns at its spawn point.
    fn resolve_captures(&mut self) {
        let Some(mip) = self.agents.iter().position(|a| a.is_mipsman()) else {
            return;
        };
        if self.agents[mip].is_dead() || self.agents[mip].is_invincible() {
            return;
        }
        let mip_location = self.agents[mip].location();
        let capturer = self.agents.iter().position(|a| {
            !a.is_mipsman() && !a.is_dead() && a.location().in_same_cell(&mip_location)
        });
        if let Some(capturer) = capturer {
            info!("client {capturer} caught the mipsman (client {mip})");
            self.agents[capturer].increment_score(self.config.capture_reward);
            self.agents[capturer].set_mipsman(true);
            self.agents[mip].set_mipsman(false);
            self.agents[mip].kill();
        }
    }

    fn grant_power_up(&mut self, client_id: usize) {
        let kind = match self.rng.gen_range(0..4) {
            0 => PowerUpKind::Web,
            1 => PowerUpKind::Speed,
            2 => PowerUpKind::BlueShell,
            _ => PowerUpKind::Invincible,
        };
        debug!("client {client_id} opened a box: {kind:?}");
        self.agents[client_id].give_item(kind);
        self.send(Packet::Inventory {
            grants: vec![(client_id, kind)],
        });
    }

    /// Pops and activates the oldest item the client holds. POW1/POW2 go
    /// out exactly once per activation; they are not replayable.
    pub fn use_item(&mut self, client_id: usize) -> Result<(), SessionError> {
        if self.stopped {
            return Err(SessionError::Stopped);
        }
        if client_id >= self.agents.len() {
            debug!("dropping item use for unknown client {client_id}");
            return Ok(());
        }
        let Some(kind) = self.agents[client_id].take_item() else {
            debug!("client {client_id} has no item to use");
            return Ok(());
        };
        let location = self.agents[client_id].location();
        let outcome = use_power_up(
            kind,
            client_id,
            self.config.speed_bonus,
            &self.map,
            &mut self.agents,
            &mut self.pellets,
            &mut self.active_power_ups,
        );
        match outcome {
            UseOutcome::Activated => self.send(Packet::Activate {
                client_id,
                kind,
                x: location.x,
                y: location.y,
            }),
            UseOutcome::TrapPlaced(cell) => self.send(Packet::TrapBox {
                x: cell.x,
                y: cell.y,
            }),
            UseOutcome::Fizzled => debug!("power-up {kind:?} fizzled for client {client_id}"),
        }
        Ok(())
    }

    fn mipsman_id(&self) -> usize {
        self.agents
            .iter()
            .position(|a| a.is_mipsman())
            .unwrap_or(0)
    }

    fn broadcast_snapshots(&mut self) {
        let entities: Vec<EntityPosition> = self
            .agents
            .iter()
            .map(|a| EntityPosition {
                id: a.client_id(),
                direction: a.direction(),
                x: a.location().x,
                y: a.location().y,
            })
            .collect();
        let mipsman_id = self.mipsman_id();
        self.send(Packet::Positions {
            entities,
            mipsman_id,
        });
        let scores: Vec<u32> = self.agents.iter().map(|a| a.score()).collect();
        self.send(Packet::Scores { scores });
    }

    fn send(&mut self, packet: Packet) {
        if self.outgoing.send(packet.encode()).is_err() {
            error!("outgoing packet queue closed, stopping session");
            self.stopped = true;
        }
    }

    /// Emits STOP and refuses all further mutation. Idempotent.
    pub fn stop_game(&mut self) {
        if self.stopped {
            return;
        }
        info!(
            "stopping authoritative session after {} ticks",
            self.tick_count
        );
        let _ = self.outgoing.send(Packet::Stop.encode());
        self.stopped = true;
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn agents(&self) -> &[Entity] {
        &self.agents
    }

    pub fn pellets(&self) -> &PointMap<Pellet> {
        &self.pellets
    }

    pub fn active_power_ups(&self) -> &ActivePowerUps {
        &self.active_power_ups
    }
}
