use fnv::FnvHashMap;

use crate::data::{Dir, Pos, DIRECTIONS};
use crate::map::{GoalMap, IsTarget, IsWall};
use crate::state::State;
use crate::vec2d::Vec2d;

/// Detects states that can never be completed.
///
/// Every check is sound - a solvable state is never flagged - but the detector
/// is not complete: plenty of dead states pass all checks. Checks run in a
/// fixed order, first hit wins. Verdicts are memoized per box set.
pub(crate) struct DeadlockDetector<'a> {
    map: &'a GoalMap,
    /// Non-goal cells with two perpendicular adjacent walls.
    corners: Vec2d<bool>,
    /// Per cell: directions with an adjacent wall.
    walls: Vec2d<[bool; 4]>,
    memo: FnvHashMap<Vec<Pos>, bool>,
}

impl<'a> DeadlockDetector<'a> {
    pub(crate) fn new(map: &'a GoalMap) -> Self {
        let corners = corner_cells(map);

        let mut walls = map.grid.create_scratchpad([false; 4]);
        for pos in map.grid.positions() {
            if map.is_wall(pos) {
                continue;
            }
            for (i, &dir) in DIRECTIONS.iter().enumerate() {
                walls[pos][i] = map.is_wall(pos + dir);
            }
        }

        DeadlockDetector {
            map,
            corners,
            walls,
            memo: FnvHashMap::default(),
        }
    }

    pub(crate) fn is_deadlock(&mut self, state: &State) -> bool {
        if let Some(&verdict) = self.memo.get(&state.boxes) {
            return verdict;
        }
        let verdict = self.check(state);
        self.memo.insert(state.boxes.clone(), verdict);
        verdict
    }

    fn check(&self, state: &State) -> bool {
        self.corner_deadlock(state)
            || self.wall_line_deadlock(state)
            || self.square_deadlock(state)
            || self.frozen_deadlock(state)
            || self.line_deadlock(state)
            || self.bipartite_deadlock(state)
    }

    /// Non-goal box in a static corner.
    fn corner_deadlock(&self, state: &State) -> bool {
        state.boxes.iter().any(|&b| self.corners[b])
    }

    /// Non-goal box against a wall with both neighbors along the wall blocked.
    /// The box could only move along the wall and both ways are shut.
    fn wall_line_deadlock(&self, state: &State) -> bool {
        for &b in &state.boxes {
            if self.map.is_target(b) {
                continue;
            }
            for (i, &dir) in DIRECTIONS.iter().enumerate() {
                if !self.walls[b][i] {
                    continue;
                }
                let [p1, p2] = dir.perpendicular();
                if self.blocked(state, b + p1) && self.blocked(state, b + p2) {
                    return true;
                }
            }
        }
        false
    }

    /// Four boxes filling a 2x2 square, not all of them on goals.
    /// None of the four can ever be pushed again.
    fn square_deadlock(&self, state: &State) -> bool {
        for &b in &state.boxes {
            let quad = [
                b,
                b + Dir::Right,
                b + Dir::Down,
                b + Dir::Down + Dir::Right,
            ];
            if quad.iter().all(|&p| state.is_box(p))
                && !quad.iter().all(|&p| self.map.is_target(p))
            {
                return true;
            }
        }
        false
    }

    /// Non-goal box with at least 3 of 4 neighbors blocked.
    fn frozen_deadlock(&self, state: &State) -> bool {
        for &b in &state.boxes {
            if self.map.is_target(b) {
                continue;
            }
            let blocked_cnt = b
                .neighbors()
                .iter()
                .filter(|&&n| self.blocked(state, n))
                .count();
            if blocked_cnt >= 3 {
                return true;
            }
        }
        false
    }

    /// Two or more adjacent boxes flush against the same wall with no goal
    /// under any of them.
    fn line_deadlock(&self, state: &State) -> bool {
        let grid = &self.map.grid;
        for r in 0..grid.rows() {
            for &wall_side in &[Dir::Up, Dir::Down] {
                if self.line_run(state, (0..grid.cols()).map(|c| Pos::new(r, c)), wall_side) {
                    return true;
                }
            }
        }
        for c in 0..grid.cols() {
            for &wall_side in &[Dir::Left, Dir::Right] {
                if self.line_run(state, (0..grid.rows()).map(|r| Pos::new(r, c)), wall_side) {
                    return true;
                }
            }
        }
        false
    }

    fn line_run(
        &self,
        state: &State,
        line: impl Iterator<Item = Pos>,
        wall_side: Dir,
    ) -> bool {
        let mut run_len = 0;
        let mut run_has_goal = false;
        for pos in line {
            let in_run =
                !self.map.is_wall(pos) && state.is_box(pos) && self.map.is_wall(pos + wall_side);
            if in_run {
                run_len += 1;
                run_has_goal |= self.map.is_target(pos);
            } else {
                if run_len >= 2 && !run_has_goal {
                    return true;
                }
                run_len = 0;
                run_has_goal = false;
            }
        }
        run_len >= 2 && !run_has_goal
    }

    /// Non-goal box that can't reach any goal even with unlimited pushing,
    /// treating the other boxes as immovable.
    fn bipartite_deadlock(&self, state: &State) -> bool {
        for &b in &state.boxes {
            if self.map.is_target(b) {
                continue;
            }
            let reachable = push_reachable_cells(self.map, b, |pos| {
                pos != b && state.is_box(pos)
            });
            if !reachable.iter().any(|&pos| self.map.is_target(pos)) {
                return true;
            }
        }
        false
    }

    fn blocked(&self, state: &State, pos: Pos) -> bool {
        self.map.is_wall(pos) || state.is_box(pos)
    }
}

/// Non-goal cells with two perpendicular adjacent walls - a box pushed there
/// is stuck forever. Also used by the A* solver's pruning.
pub(crate) fn corner_cells(map: &GoalMap) -> Vec2d<bool> {
    let mut corners = map.grid.create_scratchpad(false);
    for pos in map.grid.positions() {
        if map.is_wall(pos) || map.is_target(pos) {
            continue;
        }
        let vertical = map.is_wall(pos + Dir::Up) || map.is_wall(pos + Dir::Down);
        let horizontal = map.is_wall(pos + Dir::Left) || map.is_wall(pos + Dir::Right);
        corners[pos] = vertical && horizontal;
    }
    corners
}

/// Cells a lone box starting at `start` can be pushed to, ignoring player
/// reachability: a push to `pos + dir` only needs `pos - dir` and `pos + dir`
/// clear. Blocked cells come from the caller.
pub(crate) fn push_reachable_cells<F>(map: &GoalMap, start: Pos, is_blocked: F) -> Vec<Pos>
where
    F: Fn(Pos) -> bool,
{
    let mut visited = map.grid.create_scratchpad(false);
    visited[start] = true;
    let mut reached = vec![start];
    let mut to_visit = vec![start];

    while let Some(pos) = to_visit.pop() {
        for &dir in &DIRECTIONS {
            let dest = pos + dir;
            let player = pos - dir;
            if visited[dest]
                || map.is_wall(dest)
                || is_blocked(dest)
                || map.is_wall(player)
                || is_blocked(player)
            {
                continue;
            }
            visited[dest] = true;
            reached.push(dest);
            to_visit.push(dest);
        }
    }

    reached
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::Level;

    fn detector_verdict(level: &str) -> bool {
        let level: Level = level.parse().unwrap();
        let mut detector = DeadlockDetector::new(&level.map);
        detector.is_deadlock(&level.state)
    }

    #[test]
    fn corner_fires() {
        assert!(detector_verdict(
            "\
#####
#$ @#
# . #
#####
"
        ));
    }

    #[test]
    fn corner_on_goal_does_not_fire() {
        assert!(!detector_verdict(
            "\
#####
#* @#
#   #
#####
"
        ));
    }

    #[test]
    fn square_fires_off_goals() {
        assert!(detector_verdict(
            "\
#######
#@$$  #
# $$  #
#.... #
#######
"
        ));
    }

    #[test]
    fn square_on_goals_does_not_fire() {
        assert!(!detector_verdict(
            "\
#######
#@**  #
# **  #
#     #
#######
"
        ));
    }

    #[test]
    fn line_along_wall_fires() {
        assert!(detector_verdict(
            "\
########
#@$$   #
#    ..#
########
"
        ));
    }

    #[test]
    fn line_on_goals_does_not_fire() {
        // a pair flush against a wall can never move again - it's only
        // alive when every cell of the run is a goal
        assert!(!detector_verdict(
            "\
########
#  @   #
# **   #
########
"
        ));
    }

    #[test]
    fn unreachable_goal_fires_bipartite() {
        assert!(detector_verdict(
            "\
########
#@$    #
####.###
########
"
        ));
    }

    #[test]
    fn memoization_is_per_box_set() {
        let level: Level = "\
#####
#@$.#
#####
"
        .parse()
        .unwrap();
        let mut detector = DeadlockDetector::new(&level.map);
        assert!(!detector.is_deadlock(&level.state));
        // same boxes, different player - same verdict from the memo
        let moved = State::new(level.state.player_pos + Dir::Down, level.state.boxes.clone());
        assert!(!detector.is_deadlock(&moved));
    }

    #[test]
    fn solvable_states_not_flagged() {
        // every state reachable in this level is solvable - none may be flagged
        let level: Level = "\
######
#    #
# $. #
# @  #
######
"
        .parse()
        .unwrap();
        let mut detector = DeadlockDetector::new(&level.map);
        assert!(!detector.is_deadlock(&level.state));
    }

    #[test]
    fn sound_on_every_exhaustively_solvable_state() {
        use crate::data::{MapCell, DIRECTIONS};
        use crate::moves::Move;

        let level: Level = "\
######
# .. #
# $$ #
# @  #
######
"
        .parse()
        .unwrap();

        // enumerate the whole reachable state space with basic moves
        let mut states = vec![level.state.clone()];
        let mut index = FnvHashMap::default();
        index.insert(level.state.clone(), 0);
        let mut edges: Vec<Vec<usize>> = vec![Vec::new()];
        let mut i = 0;
        while i < states.len() {
            for &dir in &DIRECTIONS {
                if let Some(next) = Move::Basic(dir).apply(&level.map, &states[i]) {
                    let next_i = *index.entry(next.clone()).or_insert_with(|| {
                        states.push(next);
                        edges.push(Vec::new());
                        states.len() - 1
                    });
                    edges[i].push(next_i);
                }
            }
            i += 1;
        }

        // a state is solvable if some move sequence from it completes the level
        let mut solvable: Vec<bool> = states
            .iter()
            .map(|s| s.boxes.iter().all(|&b| level.map.grid[b] == MapCell::Goal))
            .collect();
        loop {
            let mut changed = false;
            for (i, nexts) in edges.iter().enumerate() {
                if !solvable[i] && nexts.iter().any(|&n| solvable[n]) {
                    solvable[i] = true;
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }

        assert!(solvable[0], "the test level itself must be solvable");
        let mut detector = DeadlockDetector::new(&level.map);
        for (i, state) in states.iter().enumerate() {
            if solvable[i] {
                assert!(
                    !detector.is_deadlock(state),
                    "flagged a solvable state:\n{}",
                    level.map.format_with_state(state)
                );
            }
        }
    }
}
