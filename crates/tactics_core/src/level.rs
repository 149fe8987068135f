//! Level and save-game serialization.
//!
//! Levels and saves share one line-oriented text format: a header naming
//! the map file, the level number and difficulty, declared entity counts,
//! then one tagged block per entity and finally the fog grid, one cell
//! code per line. Any malformed or missing line is a hard load failure
//! with the offending line number, never a silently-skipped record.

use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

use crate::error::{GameError, Result};
use crate::fog::FogGrid;
use crate::math::Vec2Fixed;
use crate::powerup::PowerupKind;
use crate::unit::UnitKind;

/// Cursor over the lines of a level or map file.
///
/// Tracks the current line number so parse errors can point at the exact
/// offending line.
pub struct LineReader<'a> {
    lines: std::str::Lines<'a>,
    line: usize,
}

impl<'a> LineReader<'a> {
    /// Start reading at the first line of `text`.
    #[must_use]
    pub fn new(text: &'a str) -> Self {
        Self {
            lines: text.lines(),
            line: 0,
        }
    }

    /// Number of the most recently consumed line, 1-based.
    #[must_use]
    pub fn line(&self) -> usize {
        self.line
    }

    fn next_line(&mut self, what: &str) -> Result<&'a str> {
        match self.lines.next() {
            Some(raw) => {
                self.line += 1;
                Ok(raw.trim())
            }
            None => Err(GameError::MalformedRecord {
                line: self.line + 1,
                message: format!("missing {what}"),
            }),
        }
    }

    /// Read one non-numeric line, such as a file name.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::MalformedRecord`] if the input is exhausted.
    pub fn read_text(&mut self, what: &str) -> Result<&'a str> {
        self.next_line(what)
    }

    /// Read one line as an `i32`.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::MalformedRecord`] if the input is exhausted or
    /// the line is not an integer.
    pub fn read_i32(&mut self, what: &str) -> Result<i32> {
        let raw = self.next_line(what)?;
        raw.parse().map_err(|_| GameError::MalformedRecord {
            line: self.line,
            message: format!("expected {what}, got {raw:?}"),
        })
    }

    /// Read one line as a `usize` count.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::MalformedRecord`] if the input is exhausted or
    /// the line is not a non-negative integer.
    pub fn read_usize(&mut self, what: &str) -> Result<usize> {
        let raw = self.next_line(what)?;
        raw.parse().map_err(|_| GameError::MalformedRecord {
            line: self.line,
            message: format!("expected {what}, got {raw:?}"),
        })
    }

    /// Consume one line and require it to be the given block header.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::CountMismatch`] if the input ends before the
    /// declared count of blocks was read, or [`GameError::MalformedRecord`]
    /// if the line is not the expected header.
    pub fn expect_header(
        &mut self,
        expected: &str,
        what: &'static str,
        declared: usize,
        found: usize,
    ) -> Result<()> {
        match self.lines.next() {
            Some(raw) => {
                self.line += 1;
                let raw = raw.trim();
                if raw == expected {
                    Ok(())
                } else {
                    Err(GameError::MalformedRecord {
                        line: self.line,
                        message: format!("expected {expected} header, got {raw:?}"),
                    })
                }
            }
            None => Err(GameError::CountMismatch {
                what,
                declared,
                found,
            }),
        }
    }
}

/// Enemy difficulty setting, fixed for the whole campaign run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Difficulty {
    /// Enemies use base HP.
    #[default]
    Easy,
    /// Enemies get 15% bonus HP.
    Normal,
    /// Enemies get 30% bonus HP.
    Hard,
}

impl Difficulty {
    /// Numeric code used by the save file format.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Difficulty::Easy => 0,
            Difficulty::Normal => 1,
            Difficulty::Hard => 2,
        }
    }

    /// Decode a numeric save-file code.
    #[must_use]
    pub const fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Difficulty::Easy),
            1 => Some(Difficulty::Normal),
            2 => Some(Difficulty::Hard),
            _ => None,
        }
    }

    /// Extra maximum HP granted to an enemy unit with the given base HP.
    #[must_use]
    pub const fn enemy_hp_bonus(self, base_hp: i32) -> i32 {
        match self {
            Difficulty::Easy => 0,
            Difficulty::Normal => base_hp * 15 / 100,
            Difficulty::Hard => base_hp * 30 / 100,
        }
    }
}

/// One powerup entry in a level file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PowerupRecord {
    /// Effect kind.
    pub kind: PowerupKind,
    /// Top-left corner in world coordinates.
    pub position: Vec2Fixed,
}

/// One unit entry in a level file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnitRecord {
    /// Unit kind; carries its allegiance.
    pub kind: UnitKind,
    /// Current HP at load time. Fresh levels store full HP; saves store
    /// whatever the unit had left.
    pub hp: i32,
    /// Top-left corner in world coordinates.
    pub position: Vec2Fixed,
}

/// Everything a level or save file describes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelData {
    /// Relative path of the map file this level plays on.
    pub map_file: String,
    /// Campaign level number, 1-based.
    pub level: u32,
    /// Enemy difficulty setting.
    pub difficulty: Difficulty,
    /// Powerups still on the field.
    pub powerups: Vec<PowerupRecord>,
    /// Living player units.
    pub friendly: Vec<UnitRecord>,
    /// Living enemy units.
    pub enemies: Vec<UnitRecord>,
    /// Fog grid at save time.
    pub fog: FogGrid,
}

impl LevelData {
    /// Parse a level or save file.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::MalformedRecord`] for unparsable lines or
    /// unknown codes, and [`GameError::CountMismatch`] when a declared
    /// count disagrees with the blocks actually present.
    pub fn parse(text: &str) -> Result<Self> {
        let mut reader = LineReader::new(text);

        let map_file = reader.read_text("map file name")?.to_string();
        let level = reader.read_i32("level number")?;
        if level < 1 {
            return Err(GameError::MalformedRecord {
                line: reader.line(),
                message: format!("level number must be positive, got {level}"),
            });
        }
        let difficulty_code = reader.read_i32("difficulty")?;
        let difficulty =
            Difficulty::from_code(difficulty_code).ok_or(GameError::MalformedRecord {
                line: reader.line(),
                message: format!("unknown difficulty {difficulty_code}"),
            })?;

        let num_friendly = reader.read_usize("friendly unit count")?;
        let num_enemy = reader.read_usize("enemy unit count")?;
        let num_powerups = reader.read_usize("powerup count")?;

        let mut powerups = Vec::with_capacity(num_powerups);
        for _ in 0..num_powerups {
            reader.expect_header("[Powerup]", "powerups", num_powerups, powerups.len())?;
            let code = reader.read_i32("powerup kind")?;
            let kind = PowerupKind::from_code(code).ok_or(GameError::MalformedRecord {
                line: reader.line(),
                message: format!("unknown powerup kind {code}"),
            })?;
            let x = reader.read_i32("powerup x")?;
            let y = reader.read_i32("powerup y")?;
            powerups.push(PowerupRecord {
                kind,
                position: Vec2Fixed::from_ints(x, y),
            });
        }

        let friendly = Self::parse_units(&mut reader, "[Unit]", "friendly units", num_friendly)?;
        let enemies = Self::parse_units(&mut reader, "[Enemy]", "enemy units", num_enemy)?;

        let mut fog_codes = Vec::with_capacity(crate::fog::FOG_GRID * crate::fog::FOG_GRID);
        for _ in 0..crate::fog::FOG_GRID * crate::fog::FOG_GRID {
            fog_codes.push(reader.read_i32("fog cell")?);
        }
        let fog = FogGrid::from_codes(&fog_codes).ok_or(GameError::MalformedRecord {
            line: reader.line(),
            message: "invalid fog cell code".to_string(),
        })?;

        Ok(Self {
            map_file,
            level: level as u32,
            difficulty,
            powerups,
            friendly,
            enemies,
            fog,
        })
    }

    fn parse_units(
        reader: &mut LineReader<'_>,
        header: &str,
        what: &'static str,
        count: usize,
    ) -> Result<Vec<UnitRecord>> {
        let mut units = Vec::with_capacity(count);
        for _ in 0..count {
            reader.expect_header(header, what, count, units.len())?;
            let code = reader.read_i32("unit kind")?;
            let kind = UnitKind::from_code(code).ok_or(GameError::MalformedRecord {
                line: reader.line(),
                message: format!("unknown unit kind {code}"),
            })?;
            let hp = reader.read_i32("unit hp")?;
            // The format only ever stores living entities.
            if hp < 1 {
                return Err(GameError::MalformedRecord {
                    line: reader.line(),
                    message: format!("unit hp must be positive, got {hp}"),
                });
            }
            let x = reader.read_i32("unit x")?;
            let y = reader.read_i32("unit y")?;
            units.push(UnitRecord {
                kind,
                hp,
                position: Vec2Fixed::from_ints(x, y),
            });
        }
        Ok(units)
    }

    /// Write the level back out in the same text format.
    #[must_use]
    pub fn write(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{}", self.map_file);
        let _ = writeln!(out, "{}", self.level);
        let _ = writeln!(out, "{}", self.difficulty.code());
        let _ = writeln!(out, "{}", self.friendly.len());
        let _ = writeln!(out, "{}", self.enemies.len());
        let _ = writeln!(out, "{}", self.powerups.len());

        for p in &self.powerups {
            let _ = writeln!(out, "[Powerup]");
            let _ = writeln!(out, "{}", p.kind.code());
            let _ = writeln!(out, "{}", p.position.x.to_num::<i32>());
            let _ = writeln!(out, "{}", p.position.y.to_num::<i32>());
        }
        Self::write_units(&mut out, "[Unit]", &self.friendly);
        Self::write_units(&mut out, "[Enemy]", &self.enemies);

        for code in self.fog.iter_codes() {
            let _ = writeln!(out, "{code}");
        }
        out
    }

    fn write_units(out: &mut String, header: &str, units: &[UnitRecord]) {
        for u in units {
            let _ = writeln!(out, "{header}");
            let _ = writeln!(out, "{}", u.kind.code());
            let _ = writeln!(out, "{}", u.hp);
            let _ = writeln!(out, "{}", u.position.x.to_num::<i32>());
            let _ = writeln!(out, "{}", u.position.y.to_num::<i32>());
        }
    }
}
