//! Session Tests
//!
//! End-to-end host/client scenarios over loopback sockets.

use std::net::SocketAddr;
use std::thread;
use std::time::{Duration, Instant};

use neon_garden::net::{discover_host, Link};
use neon_garden::protocol::{Adjustment, Command};
use neon_garden::{GardenConfig, Session};

fn config(layers: usize) -> GardenConfig {
    GardenConfig {
        layers,
        grid_size: 10,
        tick_interval_ms: 5,
        ..GardenConfig::default()
    }
}

fn start_host(layers: usize) -> (Session, SocketAddr) {
    let host = Session::host(config(layers), "127.0.0.1:0".parse().unwrap()).unwrap();
    let addr = host.host_addr().unwrap();
    (host, addr)
}

fn peer_count(session: &Session) -> usize {
    match session.dispatcher().link() {
        Link::Host(host) => host.peer_count(),
        _ => 0,
    }
}

fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(10));
    }
    false
}

// === Protocol Round Trip ===

#[test]
fn test_adjust_round_trip_over_loopback() {
    let (mut host, addr) = start_host(5);
    let client = Session::client(config(5), addr).unwrap();

    client
        .dispatcher()
        .dispatch(Command::Adjust(Adjustment::BloomIntensity(0.7)));

    let host_queue = host.dispatcher().queue().clone();
    assert!(wait_until(|| !host_queue.is_empty()));
    assert_eq!(
        host_queue.drain(),
        vec![Command::Adjust(Adjustment::BloomIntensity(0.7))]
    );

    host_queue.push(Command::Adjust(Adjustment::BloomIntensity(0.7)));
    host.tick();
    assert_eq!(host.params().snapshot().bloom_intensity, 0.7);
}

// === Client Collapse ===

#[test]
fn test_client_collapse_reaches_host() {
    let (mut host, addr) = start_host(5);
    let client = Session::client(config(5), addr).unwrap();
    assert!(wait_until(|| peer_count(&host) == 1));

    host.engine_mut()
        .store_mut()
        .get_mut(2)
        .unwrap()
        .memory_ghost_mut()
        .add_scalar(0.9);

    client
        .dispatcher()
        .dispatch(Command::Collapse { layer: 2 });

    let host_queue = host.dispatcher().queue().clone();
    assert!(wait_until(|| !host_queue.is_empty()));
    assert_eq!(host.engine_mut().apply_pending(), 1);

    let layer = host.engine().store().get(2).unwrap();
    assert_eq!(layer.memory_ghost().max(), 0.0);
    assert_eq!(layer.observer_attention(), 0.0);

    // The physics step refills the ghost by at most 5% of intensity.
    host.engine_mut().step();
    assert!(host.engine().store().get(2).unwrap().memory_ghost().max() <= 0.05 + 1e-6);

    // The host relays nothing: the client only holds its own local copy.
    thread::sleep(Duration::from_millis(100));
    assert_eq!(
        client.dispatcher().queue().drain(),
        vec![Command::Collapse { layer: 2 }]
    );
}

// === Host Broadcast ===

#[test]
fn test_host_broadcast_reaches_two_clients() {
    let (host, addr) = start_host(5);
    let mut first = Session::client(config(5), addr).unwrap();
    let mut second = Session::client(config(5), addr).unwrap();
    assert!(wait_until(|| peer_count(&host) == 2));

    host.dispatcher()
        .dispatch(Command::Adjust(Adjustment::NeonGlow(false)));

    for client in [&mut first, &mut second] {
        let queue = client.dispatcher().queue().clone();
        assert!(wait_until(|| !queue.is_empty()));
        assert!(client.params().snapshot().neon_glow);

        let report = client.tick();
        assert_eq!(report.applied, 1);
        assert!(!client.params().snapshot().neon_glow);
        assert!(!client.engine_mut().frame().neon_glow);
    }

    // The host applied its own command locally as well.
    assert_eq!(host.dispatcher().queue().len(), 1);
}

#[test]
fn test_host_midi_trigger_blooms_on_client() {
    let (host, addr) = start_host(4);
    let mut client = Session::client(config(4), addr).unwrap();
    assert!(wait_until(|| peer_count(&host) == 1));

    host.dispatcher().dispatch(Command::MidiTrigger { layer: 9 });

    let queue = client.dispatcher().queue().clone();
    assert!(wait_until(|| !queue.is_empty()));
    assert_eq!(client.tick().blooms, 1);
    assert_eq!(client.tick().blooms, 0);
}

#[test]
fn test_disconnected_client_is_pruned() {
    let (host, addr) = start_host(3);
    let client = Session::client(config(3), addr).unwrap();
    assert!(wait_until(|| peer_count(&host) == 1));

    drop(client);
    assert!(wait_until(|| peer_count(&host) == 0));

    // Broadcasting with no peers still applies locally.
    host.dispatcher().dispatch(Command::Collapse { layer: 0 });
    assert_eq!(host.dispatcher().queue().len(), 1);
}

// === Boundaries ===

#[test]
fn test_out_of_range_collapse_wraps_to_layer_zero() {
    let mut session = Session::offline(config(5)).unwrap();
    session
        .engine_mut()
        .store_mut()
        .get_mut(0)
        .unwrap()
        .memory_ghost_mut()
        .add_scalar(0.5);

    session.dispatcher().dispatch(Command::Collapse { layer: 5 });
    session.engine_mut().apply_pending();
    assert_eq!(
        session.engine().store().get(0).unwrap().memory_ghost().max(),
        0.0
    );
}

#[test]
fn test_discovery_timeout_means_no_host() {
    let found = discover_host(0, Duration::from_millis(200), 5000).unwrap();
    assert!(found.is_none());
}
