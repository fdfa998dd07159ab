//! End-to-end host/replica synchronization over in-process transports.
//!
//! The two sessions are cross-wired exactly the way the real transport
//! would: the host's broadcast queue is the replica's receive queue and
//! vice versa. Everything else — pipelines, schedulers, telemetry — runs
//! as in production.

use assert_approx_eq::assert_approx_eq;
use client::session::ReplicaSession;
use server::session::HostSession;
use shared::{Direction, GameConfig, Map};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::sleep;

fn corridor() -> Map {
    Map::from_rows(&["#######", "#.....#", "#######"])
}

fn config() -> GameConfig {
    GameConfig {
        tick: Duration::from_millis(5),
        ..Default::default()
    }
}

fn wire_sessions(map: Map, num_players: usize, client_id: usize) -> (HostSession, ReplicaSession) {
    let (replica_out, host_in) = mpsc::unbounded_channel();
    let (host_out, replica_in) = mpsc::unbounded_channel();
    let host = HostSession::new(config(), map.clone(), num_players, host_in, host_out);
    let replica = ReplicaSession::new(config(), map, num_players, client_id, replica_out, replica_in);
    (host, replica)
}

#[tokio::test(flavor = "multi_thread")]
async fn replica_tracks_the_authoritative_positions() {
    let (mut host, mut replica) = wire_sessions(corridor(), 2, 1);
    host.start_game();
    replica.start_game();

    let start = {
        let telemetry = host.telemetry();
        let state = telemetry.read().await;
        state.agents()[1].location()
    };

    replica.input_buffer().press(Direction::Right).unwrap();
    // long enough for the entity to run into the far wall on both sides
    sleep(Duration::from_millis(300)).await;

    let host_telemetry = host.telemetry();
    let replica_telemetry = replica.telemetry();
    let host_state = host_telemetry.read().await;
    let replica_state = replica_telemetry.read().await;

    let host_agent = &host_state.agents()[1];
    let replica_agent = &replica_state.agents()[1];

    // the input travelled replica -> host and actually moved the entity
    assert_eq!(host_agent.direction(), Direction::Right);
    assert!(host_agent.location().x > start.x);

    // the replica mirrors the host to within a couple of snapshot periods
    assert_approx_eq!(host_agent.location().x, replica_agent.location().x, 0.1);
    assert_approx_eq!(host_agent.location().y, replica_agent.location().y, 0.1);
    assert_eq!(replica_agent.direction(), Direction::Right);

    drop(host_state);
    drop(replica_state);
    host.stop_game().await;
    replica.stop_game().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn scores_propagate_to_the_replica() {
    // the mipsman spawns on a pellet and keeps eating as pellets respawn
    let map = Map::from_rows(&["#####", "#...#", "#...#", "#...#", "#####"]);
    let (mut host, mut replica) = wire_sessions(map, 2, 1);
    host.start_game();
    replica.start_game();

    sleep(Duration::from_millis(120)).await;

    let host_telemetry = host.telemetry();
    let replica_telemetry = replica.telemetry();
    let host_score = host_telemetry.read().await.agents()[0].score();
    let replica_score = replica_telemetry.read().await.agents()[0].score();

    assert!(host_score > 0);
    assert!(replica_score > 0);

    host.stop_game().await;
    replica.stop_game().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn host_stop_reaches_the_replica() {
    let (mut host, mut replica) = wire_sessions(corridor(), 2, 1);
    host.start_game();
    replica.start_game();
    sleep(Duration::from_millis(50)).await;

    host.stop_game().await;
    sleep(Duration::from_millis(100)).await;

    assert!(replica.telemetry().read().await.is_stopped());
}

#[tokio::test(flavor = "multi_thread")]
async fn designated_mipsman_is_broadcast() {
    // isolated cells: nobody can move, so the role never rotates
    let map = Map::from_rows(&["#####", "#.#.#", "#####", "#.#.#", "#####"]);
    let (replica_out, host_in) = mpsc::unbounded_channel();
    let (host_out, replica_in) = mpsc::unbounded_channel();
    let mut host = HostSession::new(config(), map.clone(), 3, host_in, host_out);
    let mut replica = ReplicaSession::new(config(), map, 3, 1, replica_out, replica_in);

    host.set_mip_id(2).await.unwrap();
    host.start_game();
    replica.start_game();
    sleep(Duration::from_millis(80)).await;

    let replica_telemetry = replica.telemetry();
    let state = replica_telemetry.read().await;
    let mipsmen: Vec<usize> = state
        .agents()
        .iter()
        .filter(|a| a.is_mipsman())
        .map(|a| a.client_id())
        .collect();
    assert_eq!(mipsmen, vec![2]);

    drop(state);
    host.stop_game().await;
    replica.stop_game().await;
}
