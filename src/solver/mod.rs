mod a_star;
mod advisors;
mod deadlock;
mod feature_space;
mod features;
mod fess;
mod hotspots;
mod macro_moves;

use std::error::Error;
use std::fmt::{self, Debug, Display, Formatter};

use log::debug;
use separator::Separatable;

use crate::config::{Method, SolverConfig};
use crate::data::{MapCell, Pos, MAX_BOXES};
use crate::level::Level;
use crate::map::GoalMap;
use crate::moves::Moves;
use crate::state::State;
use crate::Solve;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverErr {
    IncompleteBorder,
    UnreachableBoxes,
    UnreachableGoals,
    TooMany,
    BoxesGoals,
}

impl Display for SolverErr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match *self {
            SolverErr::IncompleteBorder => write!(f, "Incomplete border"),
            SolverErr::UnreachableBoxes => write!(
                f,
                "Unreachable boxes - some boxes are not on goal but can't be reached"
            ),
            SolverErr::UnreachableGoals => write!(
                f,
                "Unreachable goals - some goals don't have a box but can't be reached"
            ),
            SolverErr::TooMany => write!(f, "More than 254 reachable boxes or goals"),
            SolverErr::BoxesGoals => write!(f, "Different number of reachable boxes and goals"),
        }
    }
}

impl Error for SolverErr {}

/// Why a run ended without a solution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    /// Hit `max_states` or `time_limit` - retryable with larger limits.
    ResourceExhausted,
    /// The whole reachable (non-deadlocked) space was explored.
    SpaceExhausted,
}

impl Display for FailureReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match *self {
            FailureReason::ResourceExhausted => write!(f, "resource limit exhausted"),
            FailureReason::SpaceExhausted => write!(f, "search space exhausted"),
        }
    }
}

#[derive(Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    /// Candidate moves applied.
    pub expanded: u64,
    /// Unique states inserted into the search tree.
    pub created: u64,
    /// States discarded because an equal state was already known.
    pub duplicates: u64,
    /// States discarded by deadlock detection.
    pub deadlocks: u64,
}

impl Display for Stats {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "States created total: {}", self.created.separated_string())?;
        writeln!(f, "Moves expanded total: {}", self.expanded.separated_string())?;
        writeln!(
            f,
            "Reached duplicates total: {}",
            self.duplicates.separated_string()
        )?;
        writeln!(
            f,
            "Deadlocks detected total: {}",
            self.deadlocks.separated_string()
        )
    }
}

impl Debug for Stats {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "created {} / expanded {} / duplicates {} / deadlocks {}",
            self.created, self.expanded, self.duplicates, self.deadlocks
        )
    }
}

pub struct SolverOk {
    /// `Some` iff a solution was found; macros already carry their expansion.
    pub moves: Option<Moves>,
    /// `Some` iff `moves` is `None`.
    pub failure: Option<FailureReason>,
    pub stats: Stats,
    method: Method,
}

impl SolverOk {
    fn solved(moves: Moves, stats: Stats, method: Method) -> Self {
        Self {
            moves: Some(moves),
            failure: None,
            stats,
            method,
        }
    }

    fn failed(reason: FailureReason, stats: Stats, method: Method) -> Self {
        Self {
            moves: None,
            failure: Some(reason),
            stats,
            method,
        }
    }
}

impl Debug for SolverOk {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.moves {
            None => writeln!(f, "{}: no solution ({})", self.method, self.failure.unwrap())?,
            Some(moves) => writeln!(f, "{}: {} moves", self.method, moves.move_cnt())?,
        }
        write!(f, "{:?}", self.stats)
    }
}

impl Solve for Level {
    fn solve(
        &self,
        method: Method,
        config: SolverConfig,
        print_status: bool,
    ) -> Result<SolverOk, SolverErr> {
        debug!("Processing level...");
        let solver_level = process_level(self)?;
        debug!("Processed level");
        match method {
            Method::Fess => Ok(fess::search(&solver_level, config, print_status)),
            Method::AStar => Ok(a_star::search(&solver_level, config, print_status)),
        }
    }
}

#[derive(Debug)]
pub(crate) struct SolverLevel {
    pub(crate) map: GoalMap,
    pub(crate) state: State,
}

/// Structural validation before either engine runs.
///
/// Guarantees afterwards: the playable area is fully surrounded by walls,
/// every non-wall cell is player-reachable, and reachable box/goal counts
/// match - so the engines can skip bounds checks entirely.
pub(crate) fn process_level(level: &Level) -> Result<SolverLevel, SolverErr> {
    let mut to_visit = vec![level.state.player_pos];
    let mut visited = level.map.grid.create_scratchpad(false);
    visited[level.state.player_pos] = true;

    while let Some(cur) = to_visit.pop() {
        let (r, c) = (i32::from(cur.r), i32::from(cur.c));
        let neighbors = [(r + 1, c), (r - 1, c), (r, c + 1), (r, c - 1)];
        for &(nr, nc) in &neighbors {
            // the only place that needs signed bounds checks - everything
            // after this runs on a closed border
            if nr < 0
                || nc < 0
                || nr >= i32::from(level.map.grid.rows())
                || nc >= i32::from(level.map.grid.cols())
            {
                // we got out of bounds without hitting a wall
                return Err(SolverErr::IncompleteBorder);
            }

            let new_pos = Pos::new(nr as u8, nc as u8);
            if !visited[new_pos] && level.map.grid[new_pos] != MapCell::Wall {
                visited[new_pos] = true;
                to_visit.push(new_pos);
            }
        }
    }

    let mut reachable_goals = Vec::new();
    let mut reachable_boxes = Vec::new();
    for &pos in &level.state.boxes {
        if visited[pos] {
            reachable_boxes.push(pos);
        } else if !level.map.goals.contains(&pos) {
            return Err(SolverErr::UnreachableBoxes);
        }
    }
    for &pos in &level.map.goals {
        if visited[pos] {
            reachable_goals.push(pos);
        } else if !level.state.boxes.contains(&pos) {
            return Err(SolverErr::UnreachableGoals);
        }
    }

    if reachable_boxes.len() != reachable_goals.len() {
        return Err(SolverErr::BoxesGoals);
    }
    if reachable_boxes.len() > MAX_BOXES {
        return Err(SolverErr::TooMany);
    }

    // turn unreachable cells into walls so code iterating non-walls
    // only ever sees the playable area
    let mut processed_grid = level.map.grid.clone();
    for pos in processed_grid.positions() {
        if !visited[pos] {
            processed_grid[pos] = MapCell::Wall;
        }
    }

    Ok(SolverLevel {
        map: GoalMap::new(processed_grid, reachable_goals),
        state: State::new(level.state.player_pos, reachable_boxes),
    })
}

pub(crate) fn solved(map: &GoalMap, state: &State) -> bool {
    // all boxes on goals, not all goals boxed - the counts can differ
    // for levels with decorative unreachable goals
    state.boxes.iter().all(|&pos| map.grid[pos] == MapCell::Goal)
}
