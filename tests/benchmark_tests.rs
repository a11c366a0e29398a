//! Performance benchmarks for the hot paths of the host.

use bincode::{deserialize, serialize};
use host::deck::{build_deck, draw_card, DEFAULT_WORDS};
use host::game::{GameConfig, GameState};
use host::registry::ControllerRegistry;
use host::sync::project;
use rand::rngs::StdRng;
use rand::SeedableRng;
use shared::{calculate_movement, is_special_position, Packet, TeamColor};
use std::collections::HashSet;
use std::time::Instant;
use tokio::sync::mpsc::unbounded_channel;

/// Benchmarks deck construction from the default word list
#[test]
fn benchmark_deck_build() {
    let words: Vec<String> = DEFAULT_WORDS.iter().map(|w| w.to_string()).collect();
    let mut rng = StdRng::seed_from_u64(1);

    let iterations = 1_000;
    let start = Instant::now();

    for _ in 0..iterations {
        let deck = build_deck(&words, &mut rng);
        assert!(!deck.is_empty());
    }

    let duration = start.elapsed();
    println!(
        "Deck build: {} iterations in {:?} ({:.2} µs/iter)",
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    assert!(duration.as_millis() < 1000);
}

/// Benchmarks card drawing with a growing used-word set
#[test]
fn benchmark_card_draw() {
    let words: Vec<String> = DEFAULT_WORDS.iter().map(|w| w.to_string()).collect();
    let mut rng = StdRng::seed_from_u64(2);
    let deck = build_deck(&words, &mut rng);
    let mut used = HashSet::new();

    let iterations: usize = 10_000;
    let start = Instant::now();

    for i in 0..iterations {
        let card = draw_card(&deck, &used, i % 10, &mut rng).unwrap();
        used.insert(host::deck::used_key(card.id, i % 10));
    }

    let duration = start.elapsed();
    println!(
        "Card draw: {} iterations in {:?} ({:.2} µs/iter)",
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    assert!(duration.as_millis() < 1000);
}

/// Benchmarks state projection for both teams
#[test]
fn benchmark_state_projection() {
    let words: Vec<String> = DEFAULT_WORDS.iter().map(|w| w.to_string()).collect();
    let mut rng = StdRng::seed_from_u64(3);
    let deck = build_deck(&words, &mut rng);
    let mut game = GameState::new(GameConfig::default(), deck);
    game.start_turn(&mut rng);

    let mut registry = ControllerRegistry::new();
    let (tx_a, _rx_a) = unbounded_channel();
    let (tx_b, _rx_b) = unbounded_channel();
    registry.admit("a", None, tx_a).unwrap();
    registry.admit("b", None, tx_b).unwrap();

    let iterations = 10_000;
    let start = Instant::now();

    for _ in 0..iterations {
        let blue = project(&game, &registry, TeamColor::Blue);
        let red = project(&game, &registry, TeamColor::Red);
        assert_eq!(blue.connection_count, red.connection_count);
    }

    let duration = start.elapsed();
    println!(
        "State projection: {} iterations in {:?} ({:.2} µs/iter)",
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    assert!(duration.as_millis() < 1000);
}

/// Benchmarks sync packet serialization and deserialization
#[test]
fn benchmark_sync_serialization() {
    let words: Vec<String> = DEFAULT_WORDS.iter().map(|w| w.to_string()).collect();
    let mut rng = StdRng::seed_from_u64(4);
    let deck = build_deck(&words, &mut rng);
    let mut game = GameState::new(GameConfig::default(), deck);
    game.start_turn(&mut rng);

    let mut registry = ControllerRegistry::new();
    let (tx, _rx) = unbounded_channel();
    registry.admit("a", None, tx).unwrap();

    let packet = Packet::SyncState {
        payload: Box::new(project(&game, &registry, TeamColor::Blue)),
    };

    let iterations = 10_000;
    let start = Instant::now();

    for _ in 0..iterations {
        let bytes = serialize(&packet).unwrap();
        let _: Packet = deserialize(&bytes).unwrap();
    }

    let duration = start.elapsed();
    println!(
        "Sync serialization: {} iterations in {:?} ({:.2} µs/iter)",
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    assert!(duration.as_millis() < 2000);
}

/// Benchmarks movement calculation and special-position checks
#[test]
fn benchmark_board_math() {
    let iterations: u32 = 100_000;
    let start = Instant::now();

    for i in 0..iterations {
        let movement = calculate_movement(i % 10, i % 4, false);
        let _ = is_special_position((i % 81) + movement.unsigned_abs());
    }

    let duration = start.elapsed();
    println!(
        "Board math: {} iterations in {:?} ({:.2} ns/iter)",
        iterations,
        duration,
        duration.as_nanos() as f64 / iterations as f64
    );

    assert!(duration.as_millis() < 100);
}

/// Stress test: rapid connect/disconnect churn on the registry
#[test]
fn stress_test_registry_churn() {
    let mut registry = ControllerRegistry::new();

    let iterations = 10_000;
    let start = Instant::now();

    for i in 0..iterations {
        let id = format!("controller-{}", i % 2);
        let (tx, _rx) = unbounded_channel();
        registry.admit(&id, None, tx).unwrap();
        if i % 3 == 0 {
            registry.remove(&id);
        }
    }

    let duration = start.elapsed();
    println!(
        "Registry churn: {} iterations in {:?} ({:.2} µs/iter)",
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    assert!(duration.as_millis() < 1000);
}
