use clap::Parser;
use log::{debug, info};
use server::session::HostSession;
use shared::protocol::Input;
use shared::{Direction, GameConfig, Map};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::sleep;

/// Runs a self-contained authoritative session over loopback queues:
/// scripted clients feed inputs, the broadcast side is drained like a real
/// transport would, and the final scores are printed on shutdown.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Number of connected players
    #[arg(short, long, default_value = "4")]
    players: usize,

    /// Tick interval in milliseconds
    #[arg(short, long, default_value = "10")]
    tick_ms: u64,

    /// How many ticks to run before stopping
    #[arg(short = 'n', long, default_value = "500")]
    ticks: u64,

    /// Arena side length in cells
    #[arg(short, long, default_value = "15")]
    size: i32,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    let map = Map::arena(args.size, args.size);
    let config = GameConfig {
        tick: Duration::from_millis(args.tick_ms),
        power_up_box_cells: vec![(1, 1), (args.size - 2, args.size - 2)],
        ..Default::default()
    };

    let (client_tx, transport_in) = mpsc::unbounded_channel();
    let (transport_out, mut broadcast_rx) = mpsc::unbounded_channel();

    let mut session = HostSession::new(config, map, args.players, transport_in, transport_out);
    session.set_mip_id(0).await?;

    // Drain the broadcast queue the way a transport sender would.
    let drain = tokio::spawn(async move {
        let mut sent: u64 = 0;
        while let Some(packet) = broadcast_rx.recv().await {
            debug!("broadcast: {packet}");
            sent += 1;
        }
        sent
    });

    session.start_game();
    info!("session running with {} players", args.players);

    // Scripted ghoul inputs so the demo actually chases.
    let directions = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];
    for step in 0..args.ticks {
        if step % 25 == 0 {
            for id in 0..args.players {
                let turn = directions[(step as usize / 25 + id) % directions.len()];
                let _ = client_tx.send(Input::new(id, turn).to_wire());
            }
        }
        sleep(Duration::from_millis(args.tick_ms)).await;
    }

    session.stop_game().await;

    let telemetry = session.telemetry();
    let state = telemetry.read().await;
    for agent in state.agents() {
        info!(
            "client {}: score {}, cell {:?}{}",
            agent.client_id(),
            agent.score(),
            agent.location().grid(),
            if agent.is_mipsman() { " (mipsman)" } else { "" }
        );
    }
    drop(state);

    drop(client_tx);
    let sent = drain.await?;
    info!("broadcast {sent} packets");

    Ok(())
}
