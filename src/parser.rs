use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use crate::data::{MapCell, Pos, MAX_SIZE};
use crate::level::Level;
use crate::map::GoalMap;
use crate::state::State;
use crate::vec2d::Vec2d;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserErr {
    Pos(usize, usize),
    TooLarge,
    MultiplePlayers,
    NoPlayer,
    BoxesGoals,
}

impl Display for ParserErr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match *self {
            ParserErr::Pos(r, c) => write!(f, "Invalid cell at pos: [{}, {}]", r, c),
            ParserErr::TooLarge => write!(f, "Map larger than {} rows/columns", MAX_SIZE),
            ParserErr::MultiplePlayers => write!(f, "More than one player"),
            ParserErr::NoPlayer => write!(f, "No player"),
            ParserErr::BoxesGoals => write!(f, "Different number of boxes and goals"),
        }
    }
}

impl Error for ParserErr {}

impl FromStr for Level {
    type Err = ParserErr;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s)
    }
}

/// Parses the XSB format: `#` wall, ` ` floor, `@` player, `$` box, `.` goal,
/// `*` box on goal, `+` player on goal.
pub fn parse(level: &str) -> Result<Level, ParserErr> {
    // trim so levels are easy to write as raw strings in tests
    let level = level.trim_matches('\n').trim_end();

    let mut grid = Vec::new();
    let mut goals = Vec::new();
    let mut boxes = Vec::new();
    let mut player_pos = None;

    for (r, line) in level.lines().enumerate() {
        if r >= MAX_SIZE {
            return Err(ParserErr::TooLarge);
        }
        grid.push(Vec::new());
        for (c, chr) in line.chars().enumerate() {
            if c >= MAX_SIZE {
                return Err(ParserErr::TooLarge);
            }
            let pos = Pos::new(r as u8, c as u8);

            let cell = match chr {
                '#' => MapCell::Wall,
                ' ' | '-' | '_' => MapCell::Empty,
                '@' | '$' => MapCell::Empty,
                '.' | '*' | '+' => MapCell::Goal,
                _ => return Err(ParserErr::Pos(r, c)),
            };
            match chr {
                '@' | '+' => {
                    if player_pos.is_some() {
                        return Err(ParserErr::MultiplePlayers);
                    }
                    player_pos = Some(pos);
                }
                '$' | '*' => boxes.push(pos),
                _ => {}
            }
            if cell == MapCell::Goal {
                goals.push(pos);
            }
            grid[r].push(cell);
        }
    }

    let player_pos = player_pos.ok_or(ParserErr::NoPlayer)?;

    // A box/goal count mismatch is a malformed level - the solvers never
    // see one, it's rejected here at the boundary.
    if boxes.len() != goals.len() {
        return Err(ParserErr::BoxesGoals);
    }

    let grid = Vec2d::new(&grid);
    Ok(Level::new(
        GoalMap::new(grid, goals),
        State::new(player_pos, boxes),
    ))
}
