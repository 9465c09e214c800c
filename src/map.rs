use std::fmt::{self, Debug, Display, Formatter};

use crate::data::{Contents, MapCell, Pos};
use crate::state::State;
use crate::vec2d::Vec2d;

/// The capability the solver components actually need from a map.
/// One concrete map type implements them - no hierarchy.
pub trait IsWall {
    fn is_wall(&self, pos: Pos) -> bool;
}

pub trait IsTarget {
    fn is_target(&self, pos: Pos) -> bool;
}

/// Static part of a level: walls and goal cells.
#[derive(Clone, PartialEq, Eq)]
pub struct GoalMap {
    pub grid: Vec2d<MapCell>,
    pub goals: Vec<Pos>,
}

impl GoalMap {
    pub fn new(grid: Vec2d<MapCell>, goals: Vec<Pos>) -> Self {
        GoalMap { grid, goals }
    }

    pub fn format_with_state<'a>(&'a self, state: &'a State) -> MapFormatter<'a> {
        MapFormatter { map: self, state }
    }
}

impl IsWall for GoalMap {
    fn is_wall(&self, pos: Pos) -> bool {
        self.grid[pos] == MapCell::Wall
    }
}

impl IsTarget for GoalMap {
    fn is_target(&self, pos: Pos) -> bool {
        self.grid[pos] == MapCell::Goal
    }
}

impl Display for GoalMap {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write_xsb(&self.grid, None, f)
    }
}

impl Debug for GoalMap {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

/// Renders a map with a state on top of it in the XSB format.
pub struct MapFormatter<'a> {
    map: &'a GoalMap,
    state: &'a State,
}

impl Display for MapFormatter<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write_xsb(&self.map.grid, Some(self.state), f)
    }
}

impl Debug for MapFormatter<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

fn write_xsb(grid: &Vec2d<MapCell>, state: Option<&State>, f: &mut Formatter<'_>) -> fmt::Result {
    let mut contents = grid.create_scratchpad(Contents::Empty);
    if let Some(state) = state {
        for &b in &state.boxes {
            contents[b] = Contents::Box;
        }
        contents[state.player_pos] = Contents::Player;
    }

    for r in 0..grid.rows() {
        for c in 0..grid.cols() {
            let pos = Pos::new(r, c);
            let chr = match (grid[pos], contents[pos]) {
                (MapCell::Wall, _) => '#',
                (MapCell::Empty, Contents::Empty) => ' ',
                (MapCell::Empty, Contents::Box) => '$',
                (MapCell::Empty, Contents::Player) => '@',
                (MapCell::Goal, Contents::Empty) => '.',
                (MapCell::Goal, Contents::Box) => '*',
                (MapCell::Goal, Contents::Player) => '+',
            };
            write!(f, "{}", chr)?;
        }
        writeln!(f)?;
    }
    Ok(())
}
