//! Evolution Benchmarks
//!
//! Per-tick cost of the garden simulation and the stream decoder.

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use neon_garden::engine::{EvolutionEngine, SharedParams};
use neon_garden::input::AudioLevel;
use neon_garden::net::CommandQueue;
use neon_garden::protocol::{Adjustment, Command, CommandDecoder};
use neon_garden::GardenConfig;

fn engine(config: &GardenConfig) -> EvolutionEngine {
    EvolutionEngine::new(
        config,
        SharedParams::default(),
        Arc::new(CommandQueue::new()),
        AudioLevel::new(),
    )
}

fn benchmark_tick(c: &mut Criterion) {
    let config = GardenConfig::default();
    let mut engine = engine(&config);

    c.bench_function("tick_17_layers_30x30", |b| {
        b.iter(|| black_box(engine.tick()))
    });
}

fn benchmark_tick_with_commands(c: &mut Criterion) {
    let config = GardenConfig::default();
    let mut engine = engine(&config);
    let queue = Arc::clone(engine.queue());

    c.bench_function("tick_with_16_commands", |b| {
        b.iter(|| {
            for layer in 0..16 {
                queue.push(Command::MidiTrigger { layer });
            }
            black_box(engine.tick())
        })
    });
}

fn benchmark_frame(c: &mut Criterion) {
    let config = GardenConfig::default();
    let mut engine = engine(&config);
    engine.tick();

    c.bench_function("frame_17_layers", |b| b.iter(|| black_box(engine.frame())));
}

fn benchmark_decode(c: &mut Criterion) {
    let mut stream = Vec::new();
    for i in 0..100 {
        let command = match i % 3 {
            0 => Command::Adjust(Adjustment::BloomIntensity(0.7)),
            1 => Command::Collapse { layer: i },
            _ => Command::MidiTrigger { layer: i },
        };
        stream.extend(command.encode().unwrap());
    }

    c.bench_function("decode_100_commands_1k_chunks", |b| {
        b.iter(|| {
            let mut decoder = CommandDecoder::new();
            let decoded: usize = stream.chunks(1024).map(|chunk| decoder.feed(chunk).len()).sum();
            black_box(decoded)
        })
    });
}

criterion_group!(
    benches,
    benchmark_tick,
    benchmark_tick_with_commands,
    benchmark_frame,
    benchmark_decode
);
criterion_main!(benches);
