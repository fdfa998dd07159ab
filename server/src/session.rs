//! Session control surface for the authoritative side: wires the
//! telemetry, the gameplay pipelines and the fixed-tick scheduler
//! together, and exposes start/stop/designate operations.

use crate::handler::ServerGameplayHandler;
use crate::telemetry::HostTelemetry;
use log::info;
use shared::protocol::Input;
use shared::{GameConfig, Map, Scheduler, SessionError};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::sync::RwLock;

pub struct HostSession {
    telemetry: Arc<RwLock<HostTelemetry>>,
    handler: ServerGameplayHandler,
    input_tx: mpsc::UnboundedSender<Input>,
    scheduler: Option<Scheduler>,
    tick: Duration,
}

impl HostSession {
    /// Builds the session over an already-bound transport: a receive queue
    /// of client input lines and a send queue broadcast to every replica.
    pub fn new(
        config: GameConfig,
        map: Map,
        num_players: usize,
        transport_in: mpsc::UnboundedReceiver<String>,
        transport_out: mpsc::UnboundedSender<String>,
    ) -> Self {
        let (input_tx, input_rx) = mpsc::unbounded_channel();
        let (packet_tx, packet_rx) = mpsc::unbounded_channel();
        let tick = config.tick;
        let telemetry = Arc::new(RwLock::new(HostTelemetry::new(
            config,
            map,
            num_players,
            input_rx,
            packet_tx,
        )));
        let handler =
            ServerGameplayHandler::spawn(transport_in, transport_out, input_tx.clone(), packet_rx);
        Self {
            telemetry,
            handler,
            input_tx,
            scheduler: None,
            tick,
        }
    }

    /// Shared handle to the live state, for a read-only render pass.
    pub fn telemetry(&self) -> Arc<RwLock<HostTelemetry>> {
        Arc::clone(&self.telemetry)
    }

    /// Spawns the fixed-tick game loop. Idempotent: calling again while a
    /// loop exists is a no-op.
    pub fn start_game(&mut self) {
        if self.scheduler.is_some() {
            return;
        }
        info!("starting authoritative game loop");
        let telemetry = Arc::clone(&self.telemetry);
        self.scheduler = Some(Scheduler::spawn(self.tick, move || {
            let telemetry = Arc::clone(&telemetry);
            async move { telemetry.write().await.tick() }
        }));
    }

    /// Stops the scheduler, emits STOP and tears the pipelines down.
    /// Idempotent.
    pub async fn stop_game(&mut self) {
        self.telemetry.write().await.stop_game();
        if let Some(scheduler) = &self.scheduler {
            scheduler.stop();
        }
        self.handler.close();
    }

    pub async fn set_mip_id(&self, id: usize) -> Result<(), SessionError> {
        self.telemetry.write().await.set_mip_id(id)
    }

    pub async fn use_item(&self, client_id: usize) -> Result<(), SessionError> {
        self.telemetry.write().await.use_item(client_id)
    }

    /// Queues a locally captured input, exactly as if it had arrived over
    /// the transport.
    pub async fn send_input(&self, input: Input) -> Result<(), SessionError> {
        if self.telemetry.read().await.is_stopped() {
            return Err(SessionError::Stopped);
        }
        self.input_tx
            .send(input)
            .map_err(|_| SessionError::TransportClosed)
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

#[cfg(test)]
mod tests {
    use super::*;
    use shared::Direction;
    use tokio::time::sleep;

    fn session() -> (
        HostSession,
        mpsc::UnboundedSender<String>,
        mpsc::UnboundedReceiver<String>,
    ) {
        let map = Map::from_rows(&["#######", "#.....#", "#######"]);
        let config = GameConfig {
            tick: Duration::from_millis(5),
            ..Default::default()
        };
        let (client_tx, transport_in) = mpsc::unbounded_channel();
        let (transport_out, broadcast_rx) = mpsc::unbounded_channel();
        let session = HostSession::new(config, map, 2, transport_in, transport_out);
        (session, client_tx, broadcast_rx)
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn start_is_idempotent_and_ticks() {
        let (mut session, _client_tx, _broadcast_rx) = session();
        session.start_game();
        session.start_game();
        sleep(Duration::from_millis(50)).await;

        let ticks = session.telemetry().read().await.tick_count();
        assert!(ticks > 0);
        session.stop_game().await;
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn transport_inputs_reach_the_simulation() {
        let (mut session, client_tx, _broadcast_rx) = session();
        session.start_game();

        client_tx
            .send(Input::new(1, Direction::Right).to_wire())
            .unwrap();
        sleep(Duration::from_millis(60)).await;

        let telemetry = session.telemetry();
        let guard = telemetry.read().await;
        assert_eq!(guard.agents()[1].direction(), Direction::Right);
        drop(guard);
        session.stop_game().await;
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn stop_rejects_further_operations() {
        let (mut session, _client_tx, mut broadcast_rx) = session();
        session.start_game();
        session.stop_game().await;
        sleep(Duration::from_millis(20)).await;

        assert_eq!(
            session.send_input(Input::new(0, Direction::Up)).await,
            Err(SessionError::Stopped)
        );
        assert_eq!(session.use_item(0).await, Err(SessionError::Stopped));

        let mut saw_stop = false;
        while let Ok(packet) = broadcast_rx.try_recv() {
            if packet == "STOP" {
                saw_stop = true;
            }
        }
        assert!(saw_stop);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn pause_suspends_the_tick_loop() {
        let (mut session, _client_tx, _broadcast_rx) = session();
        session.start_game();
        sleep(Duration::from_millis(30)).await;
        session.pause();
        sleep(Duration::from_millis(20)).await;
        let paused_at = session.telemetry().read().await.tick_count();
        sleep(Duration::from_millis(40)).await;
        assert_eq!(session.telemetry().read().await.tick_count(), paused_at);

        session.resume();
        sleep(Duration::from_millis(40)).await;
        assert!(session.telemetry().read().await.tick_count() > paused_at);
        session.stop_game().await;
    }
}
