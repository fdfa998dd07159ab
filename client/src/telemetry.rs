//! The replica telemetry: reconstructs the authoritative state purely from
//! decoded packets, while ticking the local timers (pellet respawns,
//! power-up expiry) itself so the view stays smooth between arrivals.
//!
//! A tick drains the whole packet queue before any timer advances, so a
//! batch of K packets is applied atomically with respect to rendering.
//! Whatever the local timers drift is overwritten by the next POS3/SCOR
//! snapshot, bounding the error to one tick interval.

use log::{info, warn};
use shared::powerup::{advance_effects, use_power_up, ActivePowerUps, PowerUp, PowerUpKind};
use shared::protocol::{Input, Packet};
use shared::world;
use shared::{Entity, GameConfig, Map, Pellet, Point, PointMap};
use tokio::sync::mpsc;

pub struct ReplicaTelemetry {
    config: GameConfig,
    map: Map,
    client_id: usize,
    agents: Vec<Entity>,
    pellets: PointMap<Pellet>,
    active_power_ups: ActivePowerUps,
    incoming: mpsc::UnboundedReceiver<String>,
    stopped: bool,
}

impl ReplicaTelemetry {
    /// Entities spawn exactly where the host spawns them; pellets seed
    /// every open cell. From then on, packets are the only movement input.
    pub fn new(
        config: GameConfig,
        map: Map,
        num_players: usize,
        client_id: usize,
        incoming: mpsc::UnboundedReceiver<String>,
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

        Self {
            config,
            map,
            client_id,
            agents,
            pellets,
            active_power_ups: ActivePowerUps::new(),
            incoming,
            stopped: false,
        }
    }

    /// One replica step: apply every queued packet, then advance the local
    /// timers. Returns false once the session has stopped.
    pub fn tick(&mut self) -> bool {
        if self.stopped {
            return false;
        }
        self.process_packets();
        if self.stopped {
            return false;
        }
        self.advance_timers();
        true
    }

    /// Drains the queue completely. A bad packet is a logged protocol
    /// fault; the rest of the batch still applies.
    fn process_packets(&mut self) {
        while let Ok(raw) = self.incoming.try_recv() {
            match Packet::decode(&raw) {
                Ok(packet) => self.apply(packet),
                Err(e) => warn!("protocol fault: {e}"),
            }
        }
    }

    fn apply(&mut self, packet: Packet) {
        match packet {
            Packet::Movement {
                input:
                    Input {
                        client_id,
                        direction,
                    },
                x,
                y,
                mipsman_id,
            } => {
                if client_id >= self.agents.len() {
                    warn!("movement for unknown client {client_id}");
                    return;
                }
                self.agents[client_id].set_location(Point::new(x, y));
                self.agents[client_id].set_direction(direction);
                self.set_mipsman(mipsman_id);
            }
            Packet::Positions {
                entities,
                mipsman_id,
            } => {
                for e in entities {
                    if e.id >= self.agents.len() {
                        warn!("position snapshot for unknown client {}", e.id);
                        continue;
                    }
                    self.agents[e.id].set_location(Point::new(e.x, e.y));
                    self.agents[e.id].set_direction(e.direction);
                }
                self.set_mipsman(mipsman_id);
            }
            Packet::Inventory { grants } => {
                for (id, kind) in grants {
                    if id == self.client_id && id < self.agents.len() {
                        self.agents[id].give_item(kind);
                    }
                }
            }
            Packet::Activate {
                client_id,
                kind,
                x,
                y,
            } => {
                if client_id >= self.agents.len() {
                    warn!("power-up activation for unknown client {client_id}");
                    return;
                }
                self.agents[client_id].set_location(Point::new(x, y));
                use_power_up(
                    kind,
                    client_id,
                    self.config.speed_bonus,
                    &self.map,
                    &mut self.agents,
                    &mut self.pellets,
                    &mut self.active_power_ups,
                );
            }
            Packet::TrapBox { x, y } => {
                // replaces whatever pellet occupied the cell
                let cell = Point::new(x, y);
                self.pellets
                    .insert(cell, Pellet::trap_box(cell, PowerUp::new(PowerUpKind::Web)));
            }
            Packet::Scores { scores } => {
                if scores.len() != self.agents.len() {
                    warn!(
                        "score snapshot for {} entities, session has {}",
                        scores.len(),
                        self.agents.len()
                    );
                }
                for (id, score) in scores.into_iter().enumerate().take(self.agents.len()) {
                    self.agents[id].set_score(score);
                }
            }
            Packet::Stop => self.stop_game(),
        }
    }

    fn set_mipsman(&mut self, mipsman_id: usize) {
        for agent in &mut self.agents {
            agent.set_mipsman(agent.client_id() == mipsman_id);
        }
    }

    /// The same timer logic the host runs, so the view keeps moving at the
    /// host's cadence between packets.
    fn advance_timers(&mut self) {
        world::resolve_pellets(
            &mut self.agents,
            &mut self.pellets,
            &mut self.active_power_ups,
        );
        advance_effects(
            &mut self.active_power_ups,
            &mut self.agents,
            self.config.speed_bonus,
        );
        world::advance_respawns(&mut self.pellets, self.config.pellet_respawn_ticks);
    }

    pub fn stop_game(&mut self) {
        if !self.stopped {
            info!("replica session stopped");
            self.stopped = true;
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub fn client_id(&self) -> usize {
        self.client_id
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
