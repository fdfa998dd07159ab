//! # Authoritative Host
//!
//! The authoritative side of the grid-chase session. Exactly one of these
//! runs per game; every other participant mirrors it from packets.
//!
//! ## Responsibilities
//!
//! - **Canonical simulation** ([`telemetry::HostTelemetry`]): validates and
//!   applies player inputs, moves entities with wall collision, resolves
//!   mipsman-vs-ghoul captures, and drives the pellet-respawn and power-up
//!   state machines. Rejected inputs simply never happen; they are not
//!   errors.
//! - **State broadcasting**: every tick serialises a full position snapshot
//!   (POS3) and the score table (SCOR) into the outgoing pipeline, plus
//!   one-shot POW0/POW1/POW2 packets for the events that cannot be derived
//!   from snapshots.
//! - **Gameplay pipelines** ([`handler::ServerGameplayHandler`]): two
//!   workers shuttling strings between the opaque transport queues and the
//!   simulation's typed queues, strict FIFO both ways.
//! - **Session control** ([`session::HostSession`]): idempotent
//!   start/stop, the one-time mipsman designation, pause/resume, and a
//!   shared read handle for the render pass.
//!
//! ## Concurrency
//!
//! The scheduler task is the only writer during normal play; everything
//! else reaches the simulation through FIFO queues or the `RwLock` around
//! the telemetry. The queue boundary is the serialisation boundary.

pub mod handler;
pub mod session;
pub mod telemetry;
