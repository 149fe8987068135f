//! Headless tactics match runner.
//!
//! Runs a level without graphics: loads a level or save file, simulates a
//! fixed tick budget (or until the match is decided), and reports the
//! outcome. Designed for CI determinism checks and balance sweeps.
//!
//! # Usage
//!
//! ```bash
//! # Run a level for up to 10000 ticks
//! cargo run -p tactics_headless -- run --level data/level_one_easy.txt
//!
//! # Run and write a save file at the end
//! cargo run -p tactics_headless -- run --level data/level_one_easy.txt --save out.txt
//!
//! # Print a level summary without simulating
//! cargo run -p tactics_headless -- inspect --level data/level_one_easy.txt
//! ```
//!
//! Logs go to stderr; the result summary goes to stdout.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use tactics_core::prelude::*;

#[derive(Parser)]
#[command(name = "tactics_headless")]
#[command(about = "Headless tactics match runner for CI and balance checks")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate a level and report the outcome
    Run {
        /// Level or save file to load
        #[arg(short, long)]
        level: PathBuf,

        /// Maximum number of ticks to simulate
        #[arg(short, long, default_value = "10000")]
        ticks: u64,

        /// Simulated milliseconds per tick
        #[arg(long, default_value = "100")]
        tick_ms: u32,

        /// Write a save file when the run ends
        #[arg(short, long)]
        save: Option<PathBuf>,
    },

    /// Print a level summary without simulating
    Inspect {
        /// Level or save file to load
        #[arg(short, long)]
        level: PathBuf,
    },
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Game(#[from] GameError),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Run {
            level,
            ticks,
            tick_ms,
            save,
        } => run(&level, ticks, tick_ms, save.as_deref()),
        Commands::Inspect { level } => inspect(&level),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn read_file(path: &Path) -> Result<String, CliError> {
    fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Load a level file plus the map it names. The map path is resolved
/// relative to the level file's directory.
fn load_match(level_path: &Path) -> Result<Simulation, CliError> {
    let data = LevelData::parse(&read_file(level_path)?)?;

    let map_path = level_path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(&data.map_file);
    let map = Map::parse(&read_file(&map_path)?)?;

    Ok(Simulation::load(data, map)?)
}

fn run(level: &Path, ticks: u64, tick_ms: u32, save: Option<&Path>) -> Result<(), CliError> {
    let mut sim = load_match(level)?;
    info!(
        level = sim.level(),
        friendly = sim.remaining_friendly(),
        enemies = sim.remaining_enemies(),
        "match start"
    );

    while sim.tick_count() < ticks && sim.status() == MatchStatus::Playing {
        sim.tick(tick_ms);
    }

    let outcome = match sim.status() {
        MatchStatus::Playing => "undecided",
        MatchStatus::Victory => "victory",
        MatchStatus::Defeat => "defeat",
    };
    println!("outcome: {outcome}");
    println!("ticks: {}", sim.tick_count());
    println!("score: {}", sim.calc_score());
    println!(
        "remaining: {} friendly, {} enemies, {} powerups",
        sim.remaining_friendly(),
        sim.remaining_enemies(),
        sim.remaining_powerups()
    );
    println!("state_hash: {:016x}", sim.state_hash());

    if let Some(path) = save {
        fs::write(path, sim.save().write()).map_err(|source| CliError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), "save written");
    }
    Ok(())
}

fn inspect(level: &Path) -> Result<(), CliError> {
    let sim = load_match(level)?;

    println!("level: {}", sim.level());
    println!("difficulty: {:?}", sim.difficulty());
    println!("obstacles: {}", sim.map().obstacles().len());
    println!("powerups: {}", sim.remaining_powerups());

    println!("friendly units:");
    for unit in sim.friendly_units() {
        println!(
            "  {:?} hp {}/{} at ({}, {})",
            unit.kind(),
            unit.hp(),
            unit.max_hp(),
            unit.position().x.to_num::<i32>(),
            unit.position().y.to_num::<i32>()
        );
    }
    println!("enemy units:");
    for unit in sim.enemy_units() {
        println!(
            "  {:?} hp {}/{} at ({}, {})",
            unit.kind(),
            unit.hp(),
            unit.max_hp(),
            unit.position().x.to_num::<i32>(),
            unit.position().y.to_num::<i32>()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    fn write_level(dir: &Path) -> PathBuf {
        let map_path = dir.join("map.txt");
        let mut map = fs::File::create(&map_path).unwrap();
        write!(map, "1\n[Object]\n1\n500\n500\n").unwrap();

        let mut data = LevelData {
            map_file: "map.txt".to_string(),
            level: 1,
            difficulty: Difficulty::Easy,
            powerups: vec![],
            friendly: vec![],
            enemies: vec![],
            fog: FogGrid::new(),
        };
        data.friendly.push(tactics_core::level::UnitRecord {
            kind: UnitKind::Knight,
            hp: 240,
            position: Vec2Fixed::from_ints(200, 200),
        });
        data.enemies.push(tactics_core::level::UnitRecord {
            kind: UnitKind::Skeleton,
            hp: 185,
            position: Vec2Fixed::from_ints(340, 200),
        });

        let level_path = dir.join("level.txt");
        fs::write(&level_path, data.write()).unwrap();
        level_path
    }

    #[test]
    fn test_load_match_resolves_map_beside_level() {
        let dir = tempfile::tempdir().unwrap();
        let level_path = write_level(dir.path());

        let sim = load_match(&level_path).unwrap();
        assert_eq!(sim.remaining_friendly(), 1);
        assert_eq!(sim.remaining_enemies(), 1);
        assert_eq!(sim.map().obstacles().len(), 1);
    }

    #[test]
    fn test_missing_level_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.txt");
        assert!(matches!(
            load_match(&missing),
            Err(CliError::Read { .. })
        ));
    }

    #[test]
    fn test_run_to_decision_and_save() {
        let dir = tempfile::tempdir().unwrap();
        let level_path = write_level(dir.path());
        let save_path = dir.path().join("save.txt");

        run(&level_path, 50_000, 100, Some(&save_path)).unwrap();

        let saved = LevelData::parse(&fs::read_to_string(&save_path).unwrap()).unwrap();
        // The knight wins the duel, so only friendly units survive.
        assert_eq!(saved.enemies.len(), 0);
        assert_eq!(saved.friendly.len(), 1);
    }
}
