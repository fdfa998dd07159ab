//! Session control surface for a replica: wires the gameplay pipelines,
//! the replica telemetry and the fixed-tick scheduler together.

use crate::input::InputBuffer;
use crate::pipeline::ClientGameplayHandler;
use crate::telemetry::ReplicaTelemetry;
use log::info;
use shared::protocol::Input;
use shared::{GameConfig, Map, Scheduler};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::sync::RwLock;

pub struct ReplicaSession {
    telemetry: Arc<RwLock<ReplicaTelemetry>>,
    handler: ClientGameplayHandler,
    keypress_tx: mpsc::UnboundedSender<Input>,
    scheduler: Option<Scheduler>,
    tick: Duration,
    client_id: usize,
}

impl ReplicaSession {
    /// Builds the session over an already-bound transport: a send queue
    /// towards the host and a receive queue of host packets.
    pub fn new(
        config: GameConfig,
        map: Map,
        num_players: usize,
        client_id: usize,
        transport_out: mpsc::UnboundedSender<String>,
        transport_in: mpsc::UnboundedReceiver<String>,
    ) -> Self {
        let (keypress_tx, keypress_rx) = mpsc::unbounded_channel();
        let (telemetry_tx, telemetry_rx) = mpsc::unbounded_channel();
        let tick = config.tick;
        let telemetry = Arc::new(RwLock::new(ReplicaTelemetry::new(
            config,
            map,
            num_players,
            client_id,
            telemetry_rx,
        )));
        let handler =
            ClientGameplayHandler::spawn(keypress_rx, transport_out, transport_in, telemetry_tx);
        Self {
            telemetry,
            handler,
            keypress_tx,
            scheduler: None,
            tick,
            client_id,
        }
    }

    /// Shared handle to the mirrored state, for a read-only render pass.
    pub fn telemetry(&self) -> Arc<RwLock<ReplicaTelemetry>> {
        Arc::clone(&self.telemetry)
    }

    /// A buffer feeding this client's inputs into the outgoing pipeline.
    pub fn input_buffer(&self) -> InputBuffer {
        InputBuffer::new(self.client_id, self.keypress_tx.clone())
    }

    /// Spawns the replica tick loop. Idempotent: calling again while a
    /// loop exists is a no-op. The loop ends on its own when a STOP packet
    /// arrives.
    pub fn start_game(&mut self) {
        if self.scheduler.is_some() {
            return;
        }
        info!("starting replica tick loop for client {}", self.client_id);
        let telemetry = Arc::clone(&self.telemetry);
        self.scheduler = Some(Scheduler::spawn(self.tick, move || {
            let telemetry = Arc::clone(&telemetry);
            async move { telemetry.write().await.tick() }
        }));
    }

    /// Stops the tick loop and tears the pipelines down. Idempotent.
    pub async fn stop_game(&mut self) {
        self.telemetry.write().await.stop_game();
        if let Some(scheduler) = &self.scheduler {
            scheduler.stop();
        }
        self.handler.close();
    }

    pub fn pause(&self) {
        if let Some(scheduler) = &self.scheduler {
            scheduler.pause();
        }
    }

    pub fn resume(&self) {
        if let Some(scheduler) = &self.scheduler {
            scheduler.resume();
        }
    }
}
