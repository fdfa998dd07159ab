//! # Replica Client
//!
//! The replica side of the grid-chase session. It never simulates movement
//! or collisions itself: every position, role change and score comes from
//! the authoritative packet stream. What it does run locally are the
//! timers — pellet respawns and power-up expiry tick here at the same
//! cadence as on the host, so the view stays smooth even when packets
//! arrive in bursts, and the next snapshot reconciles any drift.
//!
//! ## Module Organization
//!
//! - [`telemetry`] — the mirrored game state and the packet-application
//!   path, one handler per wire code.
//! - [`pipeline`] — the two gameplay workers: local inputs out to the
//!   transport, classified packets in to the telemetry. STOP shuts both
//!   down after being forwarded.
//! - [`input`] — turns direction intents into queued inputs with repeat
//!   suppression.
//! - [`session`] — start/stop control surface wiring the above to the
//!   fixed-tick scheduler.

pub mod input;
pub mod pipeline;
pub mod session;
pub mod telemetry;
