use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::time::Instant;

use fnv::FnvHashMap;
use log::{debug, info};

use crate::config::{Method, SolverConfig};
use crate::data::{Dir, Pos, DIRECTIONS};
use crate::map::{GoalMap, IsTarget, IsWall};
use crate::moves::{MacroMove, Move, Moves};
use crate::state::State;

use super::deadlock::corner_cells;
use super::{solved, FailureReason, SolverLevel, SolverOk, Stats};

/// Boxes up to this count get the exact assignment heuristic; above it the
/// cheaper nearest-goal sum is used.
const EXACT_MATCHING_LIMIT: usize = 6;

struct SearchNode {
    state: State,
    /// Pushes from the root.
    dist: u32,
    h: u32,
    /// Player distance to the nearest unplaced box - only breaks f ties.
    tie: u32,
}

impl SearchNode {
    fn f(&self) -> u32 {
        self.dist + self.h
    }
}

impl PartialEq for SearchNode {
    fn eq(&self, other: &Self) -> bool {
        (self.f(), self.tie) == (other.f(), other.tie)
    }
}

impl Eq for SearchNode {}

impl PartialOrd for SearchNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SearchNode {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.f(), self.tie).cmp(&(other.f(), other.tie))
    }
}

pub(crate) fn search(level: &SolverLevel, config: SolverConfig, print_status: bool) -> SolverOk {
    let map = &level.map;
    let corners = corner_cells(map);
    let mut stats = Stats::default();

    let started = Instant::now();

    let mut to_visit = BinaryHeap::new();
    // best known g per state - allows re-opening when a better path shows up
    let mut best_g: FnvHashMap<State, u32> = FnvHashMap::default();
    let mut prevs: FnvHashMap<State, (State, Pos, Dir)> = FnvHashMap::default();

    let (h, tie) = heuristic(map, &level.state);
    to_visit.push(Reverse(SearchNode {
        state: level.state.clone(),
        dist: 0,
        h,
        tie,
    }));
    best_g.insert(level.state.clone(), 0);
    stats.created += 1;

    while let Some(Reverse(cur)) = to_visit.pop() {
        if best_g[&cur.state] < cur.dist {
            // a better path to this state was found after it was queued
            stats.duplicates += 1;
            continue;
        }
        stats.expanded += 1;

        if solved(map, &cur.state) {
            debug!("Solved at depth {}, backtracking path", cur.dist);
            let moves = backtrack_moves(&prevs, &level.state, &cur.state);
            return SolverOk::solved(moves, stats, Method::AStar);
        }

        if best_g.len() >= config.max_states || started.elapsed() >= config.time_limit {
            debug!("Out of resources at depth {}", cur.dist);
            return SolverOk::failed(FailureReason::ResourceExhausted, stats, Method::AStar);
        }

        if print_status && stats.expanded % 10_000 == 0 {
            info!("A* depth {}: {:?}", cur.dist, stats);
        }

        for (new_state, from, dir) in expand_push(map, &cur.state) {
            let dest = from + dir;
            if corners[dest] || freezes(map, &new_state, dest) {
                stats.deadlocks += 1;
                continue;
            }

            let dist = cur.dist + 1;
            match best_g.get(&new_state) {
                Some(&known) if known <= dist => {
                    stats.duplicates += 1;
                    continue;
                }
                _ => {}
            }
            best_g.insert(new_state.clone(), dist);
            prevs.insert(new_state.clone(), (cur.state.clone(), from, dir));

            let (h, tie) = heuristic(map, &new_state);
            to_visit.push(Reverse(SearchNode {
                state: new_state,
                dist,
                h,
                tie,
            }));
            stats.created += 1;
        }
    }

    SolverOk::failed(FailureReason::SpaceExhausted, stats, Method::AStar)
}

/// All single-push successors: flood-fill the player's reachable area, then
/// push every box reachable from its far side.
fn expand_push(map: &GoalMap, state: &State) -> Vec<(State, Pos, Dir)> {
    let mut new_states = Vec::new();

    let mut box_grid = map.grid.create_scratchpad(255u8);
    for (i, &b) in state.boxes.iter().enumerate() {
        box_grid[b] = i as u8;
    }

    let mut reachable = map.grid.create_scratchpad(false);
    reachable[state.player_pos] = true;
    let mut to_visit = vec![state.player_pos];

    while let Some(player_pos) = to_visit.pop() {
        for &dir in &DIRECTIONS {
            let new_player_pos = player_pos + dir;
            let box_index = box_grid[new_player_pos];
            if box_index < 255 {
                let push_dest = new_player_pos + dir;
                if box_grid[push_dest] == 255 && !map.is_wall(push_dest) {
                    let mut new_boxes = state.boxes.clone();
                    new_boxes[usize::from(box_index)] = push_dest;
                    new_states.push((
                        State::new(new_player_pos, new_boxes),
                        new_player_pos,
                        dir,
                    ));
                }
            } else if !map.is_wall(new_player_pos) && !reachable[new_player_pos] {
                reachable[new_player_pos] = true;
                to_visit.push(new_player_pos);
            }
        }
    }

    new_states
}

/// Freeze check on the pushed box: blocked on both axes and not on a goal.
fn freezes(map: &GoalMap, state: &State, b: Pos) -> bool {
    if map.is_target(b) {
        return false;
    }
    let blocked =
        |pos: Pos| map.is_wall(pos) || state.is_box(pos);
    let vertical = blocked(b + Dir::Up) || blocked(b + Dir::Down);
    let horizontal = blocked(b + Dir::Left) || blocked(b + Dir::Right);
    vertical && horizontal
}

/// Box-goal assignment cost plus unplaced box count; the player-proximity
/// tie-break is returned separately.
fn heuristic(map: &GoalMap, state: &State) -> (u32, u32) {
    let match_cost = if state.boxes.len() <= EXACT_MATCHING_LIMIT {
        exact_matching_cost(&state.boxes, &map.goals)
    } else {
        state
            .boxes
            .iter()
            .map(|&b| {
                map.goals
                    .iter()
                    .map(|&goal| b.dist(goal))
                    .min()
                    .unwrap_or(0) as u32
            })
            .sum()
    };

    let unplaced: Vec<Pos> = state
        .boxes
        .iter()
        .cloned()
        .filter(|&b| !map.is_target(b))
        .collect();

    let tie = unplaced
        .iter()
        .map(|&b| state.player_pos.dist(b))
        .min()
        .unwrap_or(0) as u32;

    (match_cost + unplaced.len() as u32, tie)
}

/// Optimal assignment of boxes to goals by Manhattan distance - exact for
/// small box counts via a subset DP.
fn exact_matching_cost(boxes: &[Pos], goals: &[Pos]) -> u32 {
    let n = boxes.len().min(goals.len());
    if n == 0 {
        return 0;
    }
    let full = (1usize << n) - 1;
    let mut dp = vec![u32::max_value(); full + 1];
    dp[0] = 0;

    for mask in 0..full {
        if dp[mask] == u32::max_value() {
            continue;
        }
        let i = mask.count_ones() as usize; // next box to place
        for j in 0..n {
            if mask & (1 << j) != 0 {
                continue;
            }
            let next = mask | (1 << j);
            let cost = dp[mask] + boxes[i].dist(goals[j]) as u32;
            if cost < dp[next] {
                dp[next] = cost;
            }
        }
    }

    dp[full]
}

fn backtrack_moves(
    prevs: &FnvHashMap<State, (State, Pos, Dir)>,
    initial_state: &State,
    final_state: &State,
) -> Moves {
    let mut rev = Vec::new();
    let mut cur = final_state;
    while cur != initial_state {
        let (prev, from, dir) = &prevs[cur];
        rev.push(Move::Macro(MacroMove {
            from: *from,
            to: *from + *dir,
            dirs: vec![*dir],
            weight: 1,
        }));
        cur = prev;
    }

    let mut moves = Moves::default();
    for mov in rev.into_iter().rev() {
        moves.add(mov);
    }
    moves
}
