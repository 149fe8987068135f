//! Simulation tick benchmarks for tactics_core.
//!
//! Run with: `cargo bench -p tactics_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use tactics_core::level::{Difficulty, LevelData, UnitRecord};
use tactics_core::map::{Map, Obstacle, ObstacleKind};
use tactics_core::math::Vec2Fixed;
use tactics_core::prelude::*;
use tactics_core::unit::UnitKind;

fn brawl() -> Simulation {
    let friendly = (0..20)
        .map(|i| UnitRecord {
            kind: UnitKind::Knight,
            hp: UnitKind::Knight.base_hp(),
            position: Vec2Fixed::from_ints(200 + (i % 5) * 100, 200 + (i / 5) * 100),
        })
        .collect();
    let enemies = (0..20)
        .map(|i| UnitRecord {
            kind: UnitKind::Skeleton,
            hp: UnitKind::Skeleton.base_hp(),
            position: Vec2Fixed::from_ints(900 + (i % 5) * 100, 200 + (i / 5) * 100),
        })
        .collect();
    let data = LevelData {
        map_file: "bench.txt".to_string(),
        level: 1,
        difficulty: Difficulty::Hard,
        powerups: vec![],
        friendly,
        enemies,
        fog: FogGrid::new(),
    };
    let map = Map::new(
        (0..40)
            .map(|i| Obstacle {
                kind: ObstacleKind::Tree,
                position: Vec2Fixed::from_ints(500 + (i % 8) * 300, 600 + (i / 8) * 400),
            })
            .collect(),
    )
    .unwrap();
    Simulation::load(data, map).unwrap()
}

pub fn tick_benchmark(c: &mut Criterion) {
    c.bench_function("tick_40_units", |b| {
        let mut sim = brawl();
        b.iter(|| {
            sim.tick(black_box(100));
            black_box(sim.tick_count())
        });
    });

    c.bench_function("state_hash_40_units", |b| {
        let sim = brawl();
        b.iter(|| black_box(sim.state_hash()));
    });
}

criterion_group!(benches, tick_benchmark);
criterion_main!(benches);
