//! Client-side gameplay pipelines: the outgoing input serialiser and the
//! incoming packet demultiplexer.
//!
//! The outgoing worker blocks on the local keypress queue and writes wire
//! strings to the transport in input order. The incoming worker polls the
//! transport receive queue, classifies each line by its 4-byte code,
//! routes recognised packets to the replica telemetry, and shuts the
//! pipeline down after forwarding STOP. No reordering anywhere.

use log::{error, info, warn};
use shared::protocol::{self, Input};
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TryRecvError};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};

pub struct ClientGameplayHandler {
    shutdown: Arc<watch::Sender<bool>>,
    outgoing: JoinHandle<()>,
    incoming: JoinHandle<()>,
}

impl ClientGameplayHandler {
    pub fn spawn(
        mut keypresses: mpsc::UnboundedReceiver<Input>,
        transport_out: mpsc::UnboundedSender<String>,
        mut transport_in: mpsc::UnboundedReceiver<String>,
        telemetry_in: mpsc::UnboundedSender<String>,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let shutdown = Arc::new(shutdown_tx);

        // Outgoing: one locally queued input at a time, FIFO.
        let outgoing = {
            let mut shutdown_rx = shutdown_rx.clone();
            tokio::spawn(async move {
                loop {
                    tokio::select! {
                        maybe = keypresses.recv() => match maybe {
                            Some(input) => {
                                if transport_out.send(input.to_wire()).is_err() {
                                    error!("transport send queue closed");
                                    break;
                                }
                            }
                            None => break,
                        },
                        changed = shutdown_rx.changed() => {
                            if changed.is_err() || *shutdown_rx.borrow() {
                                while let Ok(input) = keypresses.try_recv() {
                                    let _ = transport_out.send(input.to_wire());
                                }
                                break;
                            }
                        }
                    }
                }
            })
        };

        // Incoming: poll, classify by code, forward. STOP is forwarded and
        // then ends both workers.
        let incoming = {
            let shutdown_rx = shutdown_rx;
            let shutdown = Arc::clone(&shutdown);
            tokio::spawn(async move {
                loop {
                    if *shutdown_rx.borrow() {
                        break;
                    }
                    match transport_in.try_recv() {
                        Ok(raw) => match raw.get(..protocol::CODE_LEN) {
                            Some(code) if protocol::KNOWN_CODES.contains(&code) => {
                                let is_stop = code == protocol::STOP_CODE;
                                if telemetry_in.send(raw).is_err() {
                                    break;
                                }
                                if is_stop {
                                    info!("received STOP, shutting the pipeline down");
                                    let _ = shutdown.send(true);
                                    break;
                                }
                            }
                            _ => warn!("discarding packet with unrecognised code: {raw:?}"),
                        },
                        Err(TryRecvError::Empty) => sleep(Duration::from_millis(1)).await,
                        Err(TryRecvError::Disconnected) => break,
                    }
                }
            })
        };

        Self {
            shutdown,
            outgoing,
            incoming,
        }
    }

    /// Signals both workers to exit after flushing.
    pub fn close(&self) {
        let _ = self.shutdown.send(true);
    }

    pub async fn join(self) {
        let _ = self.outgoing.await;
        let _ = self.incoming.await;
    }
}
