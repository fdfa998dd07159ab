//! Server-side gameplay pipelines between the transport queues and the
//! authoritative telemetry.
//!
//! Two workers, one per direction: inbound wire strings parse into typed
//! inputs for the simulation, and the simulation's outbound packet queue
//! drains into the transport send queue. Both directions are strict FIFO;
//! the queues are also the serialisation boundary between the network side
//! and the scheduler thread.

use log::{error, warn};
use shared::protocol::Input;
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TryRecvError};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};

pub struct ServerGameplayHandler {
    shutdown: Arc<watch::Sender<bool>>,
    incoming: JoinHandle<()>,
    outgoing: JoinHandle<()>,
}

impl ServerGameplayHandler {
    pub fn spawn(
        mut transport_in: mpsc::UnboundedReceiver<String>,
        transport_out: mpsc::UnboundedSender<String>,
        inputs: mpsc::UnboundedSender<Input>,
        mut packets: mpsc::UnboundedReceiver<String>,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let shutdown = Arc::new(shutdown_tx);

        // Inbound: poll the transport receive queue, parse each line into a
        // typed input for the simulation. A bad line is logged and dropped.
        let incoming = {
            let shutdown_rx = shutdown_rx.clone();
            tokio::spawn(async move {
                loop {
                    if *shutdown_rx.borrow() {
                        break;
                    }
                    match transport_in.try_recv() {
                        Ok(raw) => match Input::from_wire(&raw) {
                            Ok(input) => {
                                if inputs.send(input).is_err() {
                                    break;
                                }
                            }
                            Err(e) => warn!("discarding client input {raw:?}: {e}"),
                        },
                        Err(TryRecvError::Empty) => sleep(Duration::from_millis(1)).await,
                        Err(TryRecvError::Disconnected) => break,
                    }
                }
            })
        };

        // Outbound: block on the simulation's packet queue and relay in
        // order. On shutdown, flush what the simulation already queued.
        let outgoing = {
            let mut shutdown_rx = shutdown_rx;
            tokio::spawn(async move {
                loop {
                    tokio::select! {
                        maybe = packets.recv() => match maybe {
                            Some(raw) => {
                                if transport_out.send(raw).is_err() {
                                    error!("transport send queue closed");
                                    break;
                                }
                            }
                            None => break,
                        },
                        changed = shutdown_rx.changed() => {
                            if changed.is_err() || *shutdown_rx.borrow() {
                                while let Ok(raw) = packets.try_recv() {
                                    let _ = transport_out.send(raw);
                                }
                                break;
                            }
                        }
                    }
                }
            })
        };

        Self {
            shutdown,
            incoming,
            outgoing,
        }
    }

    /// Signals both workers to exit after flushing.
    pub fn close(&self) {
        let _ = self.shutdown.send(true);
    }

    pub async fn join(self) {
        let _ = self.incoming.await;
        let _ = self.outgoing.await;
    }
}
