//! Local control capture: direction intents become queued inputs.

use log::debug;
use shared::protocol::Input;
use shared::{Direction, SessionError};
use tokio::sync::mpsc;

/// Turns raw direction intents into [`Input`] values on the outgoing
/// queue, suppressing repeats of the direction already requested so key
/// repeat does not flood the pipeline.
pub struct InputBuffer {
    client_id: usize,
    last_queued: Option<Direction>,
    queue: mpsc::UnboundedSender<Input>,
}

impl InputBuffer {
    pub fn new(client_id: usize, queue: mpsc::UnboundedSender<Input>) -> Self {
        Self {
            client_id,
            last_queued: None,
            queue,
        }
    }

    pub fn client_id(&self) -> usize {
        self.client_id
    }

    /// Queues a direction change for the outgoing pipeline.
    pub fn press(&mut self, direction: Direction) -> Result<(), SessionError> {
        if self.last_queued == Some(direction) {
            debug!("suppressing repeated {direction:?}");
            return Ok(());
        }
        self.queue
            .send(Input::new(self.client_id, direction))
            .map_err(|_| SessionError::TransportClosed)?;
        self.last_queued = Some(direction);
        Ok(())
    }
}
