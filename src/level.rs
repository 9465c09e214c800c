use std::fmt::{self, Debug, Display, Formatter};

use crate::data::MapCell;
use crate::map::GoalMap;
use crate::moves::Moves;
use crate::state::State;

#[derive(Clone, PartialEq)]
pub struct Level {
    pub map: GoalMap,
    pub state: State,
}

impl Level {
    pub fn new(map: GoalMap, state: State) -> Self {
        Level { map, state }
    }

    /// Replays a solution from the initial state, `None` if any move is illegal.
    pub fn replay(&self, moves: &Moves) -> Option<State> {
        let mut state = self.state.clone();
        for mov in moves {
            state = mov.apply(&self.map, &state)?;
        }
        Some(state)
    }

    /// All boxes on goals. Goals having boxes is not equivalent
    /// when box and goal counts differ - always test boxes.
    pub fn is_solved_by(&self, state: &State) -> bool {
        state.boxes.iter().all(|&b| self.map.grid[b] == MapCell::Goal)
    }
}

impl Display for Level {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.map.format_with_state(&self.state))
    }
}

impl Debug for Level {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Dir, Pos};
    use crate::moves::Move;

    #[test]
    fn replay_simple_solution() {
        let level: Level = "\
#####
#@$.#
#####
"
        .parse()
        .unwrap();

        let mut moves = Moves::default();
        moves.add(Move::Basic(Dir::Right));
        let end = level.replay(&moves).unwrap();
        assert!(level.is_solved_by(&end));
        assert_eq!(end.boxes, vec![Pos::new(1, 3)]);
    }

    #[test]
    fn replay_rejects_illegal() {
        let level: Level = "\
#####
#@$.#
#####
"
        .parse()
        .unwrap();

        let mut moves = Moves::default();
        moves.add(Move::Basic(Dir::Up));
        assert!(level.replay(&moves).is_none());
    }
}
