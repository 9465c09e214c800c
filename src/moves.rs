use std::fmt::{self, Debug, Display, Formatter};

use crate::data::{Dir, Pos};
use crate::map::{GoalMap, IsWall};
use crate::state::State;

/// A single search action.
///
/// `Basic` is one player move (a push if a box is in the way). `Macro` is an
/// atomic "push box from A to B" abstracting the intermediate pushes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Move {
    Basic(Dir),
    Macro(MacroMove),
}

/// Push box at `from` to `to` along `dirs`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MacroMove {
    pub from: Pos,
    pub to: Pos,
    pub dirs: Vec<Dir>,
    pub weight: u32,
}

impl Move {
    /// Applies the move to a state, `None` if it's illegal. Generated
    /// candidates are allowed to be illegal - callers just discard them.
    pub(crate) fn apply(&self, map: &GoalMap, state: &State) -> Option<State> {
        match self {
            Move::Basic(dir) => {
                let new_player = state.player_pos + *dir;
                if map.is_wall(new_player) {
                    return None;
                }
                match state.boxes.binary_search(&new_player) {
                    Ok(i) => {
                        let dest = new_player + *dir;
                        if map.is_wall(dest) || state.is_box(dest) {
                            return None;
                        }
                        let mut boxes = state.boxes.clone();
                        boxes[i] = dest;
                        Some(State::new(new_player, boxes))
                    }
                    Err(_) => Some(State::new(new_player, state.boxes.clone())),
                }
            }
            Move::Macro(m) => {
                let i = state.boxes.binary_search(&m.from).ok()?;
                if map.is_wall(m.to) || state.is_box(m.to) {
                    return None;
                }
                let mut boxes = state.boxes.clone();
                boxes[i] = m.to;
                // the player intentionally stays where it was - macros
                // abstract the walk (see DESIGN.md)
                Some(State::new(state.player_pos, boxes))
            }
        }
    }
}

impl Display for Move {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Move::Basic(dir) => write!(f, "{}", dir),
            Move::Macro(m) => {
                for dir in &m.dirs {
                    write!(f, "{}", dir)?;
                }
                Ok(())
            }
        }
    }
}

/// An ordered move sequence. Displaying it always expands macros into the
/// plain `U`/`D`/`L`/`R` vocabulary.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct Moves(Vec<Move>);

impl Moves {
    pub(crate) fn add(&mut self, mov: Move) {
        self.0.push(mov);
    }

    /// Number of direction tokens after macro expansion.
    pub fn move_cnt(&self) -> usize {
        self.0
            .iter()
            .map(|m| match m {
                Move::Basic(_) => 1,
                Move::Macro(m) => m.dirs.len(),
            })
            .sum()
    }

    /// The solution with macros expanded to single directions.
    pub fn expanded(&self) -> Vec<Dir> {
        let mut dirs = Vec::with_capacity(self.move_cnt());
        for mov in &self.0 {
            match mov {
                Move::Basic(dir) => dirs.push(*dir),
                Move::Macro(m) => dirs.extend_from_slice(&m.dirs),
            }
        }
        dirs
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Move> {
        self.0.iter()
    }
}

impl<'a> IntoIterator for &'a Moves {
    type Item = &'a Move;
    type IntoIter = std::slice::Iter<'a, Move>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl Display for Moves {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for dir in self.expanded() {
            write!(f, "{}", dir)?;
        }
        Ok(())
    }
}

impl Debug for Moves {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::Level;

    #[test]
    fn formatting_expands_macros() {
        let mut moves = Moves::default();
        moves.add(Move::Basic(Dir::Up));
        moves.add(Move::Macro(MacroMove {
            from: Pos::new(2, 2),
            to: Pos::new(2, 4),
            dirs: vec![Dir::Right, Dir::Right],
            weight: 2,
        }));
        moves.add(Move::Basic(Dir::Down));
        assert_eq!(moves.to_string(), "URRD");
        assert_eq!(moves.move_cnt(), 4);
        assert_eq!(
            moves.expanded(),
            vec![Dir::Up, Dir::Right, Dir::Right, Dir::Down]
        );
    }

    #[test]
    fn applying_basic_moves() {
        let level: Level = "\
#####
#@$.#
#####
"
        .parse()
        .unwrap();

        // push
        let pushed = Move::Basic(Dir::Right)
            .apply(&level.map, &level.state)
            .unwrap();
        assert_eq!(pushed.player_pos, Pos::new(1, 2));
        assert_eq!(pushed.boxes, vec![Pos::new(1, 3)]);

        // into a wall
        assert!(Move::Basic(Dir::Up)
            .apply(&level.map, &level.state)
            .is_none());
    }

    #[test]
    fn applying_macro_keeps_player() {
        let level: Level = "\
######
#@$  #
#   .#
######
"
        .parse()
        .unwrap();

        let mov = Move::Macro(MacroMove {
            from: Pos::new(1, 2),
            to: Pos::new(1, 4),
            dirs: vec![Dir::Right, Dir::Right],
            weight: 2,
        });
        let new_state = mov.apply(&level.map, &level.state).unwrap();
        assert_eq!(new_state.player_pos, level.state.player_pos);
        assert_eq!(new_state.boxes, vec![Pos::new(1, 4)]);

        // no box at source -> illegal
        assert!(mov.apply(&level.map, &new_state).is_none());
    }
}
