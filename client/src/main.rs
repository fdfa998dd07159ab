use clap::Parser;
use client::session::ReplicaSession;
use log::info;
use shared::{Direction, GameConfig, Map};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::sleep;

/// Replays a canned authoritative packet stream into a replica session and
/// prints the reconstructed state, demonstrating the incoming pipeline and
/// the local timers without a live host.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Number of entities in the session
    #[arg(short, long, default_value = "4")]
    players: usize,

    /// This client's id
    #[arg(short, long, default_value = "1")]
    client_id: usize,

    /// Tick interval in milliseconds
    #[arg(short, long, default_value = "10")]
    tick_ms: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    let map = Map::arena(9, 9);
    let config = GameConfig {
        tick: Duration::from_millis(args.tick_ms),
        ..Default::default()
    };

    let (transport_out, mut host_rx) = mpsc::unbounded_channel();
    let (host_tx, transport_in) = mpsc::unbounded_channel();

    let mut session = ReplicaSession::new(
        config,
        map,
        args.players,
        args.client_id,
        transport_out,
        transport_in,
    );
    session.start_game();

    // A local direction change goes out through the serialiser...
    let mut buffer = session.input_buffer();
    buffer.press(Direction::Right)?;

    // ...while a canned host stream comes back in.
    let stream = [
        "POS30:1:1.5:1.5|1:3:3.5:1.5|2:0:5.5:5.5|3:2:7.5:7.5|0".to_string(),
        format!("POW0{}:1", args.client_id),
        format!("POW1{}|1|3.5|1.5", args.client_id),
        "POW25|5".to_string(),
        "SCOR4|0|0|0".to_string(),
    ];
    for packet in stream {
        host_tx.send(packet)?;
    }

    sleep(Duration::from_millis(args.tick_ms * 10)).await;

    if let Some(outbound) = host_rx.recv().await {
        info!("sent to host: {outbound}");
    }

    let telemetry = session.telemetry();
    let state = telemetry.read().await;
    for agent in state.agents() {
        info!(
            "client {}: cell {:?}, direction {:?}, score {}{}",
            agent.client_id(),
            agent.location().grid(),
            agent.direction(),
            agent.score(),
            if agent.is_mipsman() { " (mipsman)" } else { "" }
        );
    }
    info!("{} power-up effects active", state.active_power_ups().len());
    drop(state);

    host_tx.send("STOP".to_string())?;
    sleep(Duration::from_millis(args.tick_ms * 5)).await;
    session.stop_game().await;
    info!("replica wound down");

    Ok(())
}
