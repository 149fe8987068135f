//! Cross-module determinism and invariant tests.
//!
//! Two simulations fed identical inputs must stay bit-identical, and core
//! invariants must hold under arbitrary command streams.

use proptest::prelude::*;

use tactics_core::level::{Difficulty, LevelData, PowerupRecord, UnitRecord};
use tactics_core::map::{Map, Obstacle, ObstacleKind, MAP_SIZE};
use tactics_core::math::{Fixed, Vec2Fixed};
use tactics_core::prelude::*;
use tactics_core::simulation::Command;
use tactics_core::unit::{UnitKind, UNIT_SIZE};

fn battle_level() -> (LevelData, Map) {
    let friendly = vec![
        UnitRecord {
            kind: UnitKind::Knight,
            hp: 240,
            position: Vec2Fixed::from_ints(200, 200),
        },
        UnitRecord {
            kind: UnitKind::Archer,
            hp: 125,
            position: Vec2Fixed::from_ints(320, 200),
        },
        UnitRecord {
            kind: UnitKind::Cleric,
            hp: 70,
            position: Vec2Fixed::from_ints(440, 200),
        },
        UnitRecord {
            kind: UnitKind::Wizard,
            hp: 95,
            position: Vec2Fixed::from_ints(560, 200),
        },
    ];
    let enemies = vec![
        UnitRecord {
            kind: UnitKind::Skeleton,
            hp: 185,
            position: Vec2Fixed::from_ints(1400, 1300),
        },
        UnitRecord {
            kind: UnitKind::Orc,
            hp: 340,
            position: Vec2Fixed::from_ints(1500, 1300),
        },
    ];
    let data = LevelData {
        map_file: "battle.txt".to_string(),
        level: 1,
        difficulty: Difficulty::Normal,
        powerups: vec![PowerupRecord {
            kind: PowerupKind::Power,
            position: Vec2Fixed::from_ints(900, 760),
        }],
        friendly,
        enemies,
        fog: FogGrid::new(),
    };
    // Obstacles sit away from the squad's route so fights always resolve.
    let map = Map::new(vec![
        Obstacle {
            kind: ObstacleKind::Lake,
            position: Vec2Fixed::from_ints(400, 2200),
        },
        Obstacle {
            kind: ObstacleKind::Tree,
            position: Vec2Fixed::from_ints(2400, 400),
        },
    ])
    .unwrap();
    (data, map)
}

fn load_battle() -> Simulation {
    let (data, map) = battle_level();
    Simulation::load(data, map).unwrap()
}

fn command_from(selector: u8, x: i32, y: i32) -> Command {
    match selector % 6 {
        0 => Command::Move {
            destination: Vec2Fixed::from_ints(x, y),
        },
        1 => Command::AttackMove {
            destination: Vec2Fixed::from_ints(x, y),
        },
        2 => Command::Stop,
        3 => Command::StandGround,
        4 => Command::Attack {
            target: UnitHandle::enemy(0),
        },
        _ => Command::Heal {
            target: UnitHandle::friendly(0),
        },
    }
}

fn assert_invariants(sim: &Simulation) {
    let min = Fixed::ZERO;
    let max = Fixed::from_num(MAP_SIZE - UNIT_SIZE);
    for unit in sim.friendly_units().chain(sim.enemy_units()) {
        assert!(unit.hp() >= 0 && unit.hp() <= unit.max_hp());
        assert_eq!(unit.is_alive(), unit.hp() > 0);
        let position = unit.position();
        assert!(position.x >= min && position.x <= max);
        assert!(position.y >= min && position.y <= max);
    }
}

#[test]
fn scripted_battle_is_deterministic() {
    let mut a = load_battle();
    let mut b = load_battle();

    for sim in [&mut a, &mut b] {
        sim.select_in_rect(Vec2Fixed::from_ints(0, 0), Vec2Fixed::from_ints(700, 400));
        sim.issue_command(Command::AttackMove {
            destination: Vec2Fixed::from_ints(1400, 1300),
        });
        for _ in 0..6000 {
            sim.tick(100);
        }
    }

    assert_eq!(a.state_hash(), b.state_hash());
    assert_invariants(&a);
}

#[test]
fn squad_attack_move_resolves_the_fight() {
    let mut sim = load_battle();
    sim.select_in_rect(Vec2Fixed::from_ints(0, 0), Vec2Fixed::from_ints(700, 400));
    sim.issue_command(Command::AttackMove {
        destination: Vec2Fixed::from_ints(1400, 1300),
    });

    let mut ticks = 0u32;
    while sim.status() == MatchStatus::Playing && ticks < 30_000 {
        sim.tick(100);
        ticks += 1;
    }
    // Four-on-two with ranged support: the squad wins.
    assert_eq!(sim.status(), MatchStatus::Victory);
    assert_invariants(&sim);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn random_command_streams_stay_deterministic(
        steps in prop::collection::vec(
            (0u8..6, 0i32..2900, 0i32..2900, 1u32..40),
            1..20,
        )
    ) {
        let mut a = load_battle();
        let mut b = load_battle();

        for &(selector, x, y, ticks) in &steps {
            for sim in [&mut a, &mut b] {
                sim.select_in_rect(
                    Vec2Fixed::from_ints(0, 0),
                    Vec2Fixed::from_ints(MAP_SIZE, MAP_SIZE),
                );
                sim.issue_command(command_from(selector, x, y));
                for _ in 0..ticks {
                    sim.tick(100);
                }
            }
            prop_assert_eq!(a.state_hash(), b.state_hash());
        }
        assert_invariants(&a);
    }

    #[test]
    fn snapshots_resume_identically(ticks in 1u32..200) {
        let mut sim = load_battle();
        sim.select_in_rect(Vec2Fixed::from_ints(0, 0), Vec2Fixed::from_ints(700, 400));
        sim.issue_command(Command::AttackMove {
            destination: Vec2Fixed::from_ints(1400, 1300),
        });
        for _ in 0..ticks {
            sim.tick(100);
        }

        let bytes = sim.to_bytes().unwrap();
        let mut restored = Simulation::from_bytes(&bytes).unwrap();
        for _ in 0..50 {
            sim.tick(100);
            restored.tick(100);
        }
        prop_assert_eq!(sim.state_hash(), restored.state_hash());
    }
}
