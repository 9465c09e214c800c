use crate::data::{Dir, Pos, DIRECTIONS};
use crate::map::{GoalMap, IsWall};
use crate::moves::MacroMove;
use crate::state::State;

use super::features::{floor_regions, Analyzers};

/// Runs all seven advisors. Each proposes at most one single-push macro it
/// wants tried early - the engine gives matching candidates weight 0.
/// Advisors only bias move ordering; every legal move stays available.
pub(crate) fn advise(map: &GoalMap, state: &State, an: &mut Analyzers<'_>) -> Vec<MacroMove> {
    let mut moves = Vec::new();
    moves.extend(packing_advisor(map, state, an));
    moves.extend(connectivity_advisor(map, state, an));
    moves.extend(room_advisor(map, state, an));
    moves.extend(hotspots_advisor(map, state, an));
    moves.extend(explorer_advisor(map, state));
    moves.extend(opener_advisor(map, state, an));
    moves.extend(out_of_plan_advisor(map, state, an));
    moves
}

/// A single push of the box at `from`, simulated the way macros apply
/// (the player stays put). `None` if the push is blocked.
fn try_push(map: &GoalMap, state: &State, from: Pos, dir: Dir) -> Option<(State, MacroMove)> {
    let dest = from + dir;
    let player_side = from - dir;
    if map.is_wall(dest)
        || state.is_box(dest)
        || map.is_wall(player_side)
        || state.is_box(player_side)
    {
        return None;
    }
    let i = state.boxes.binary_search(&from).ok()?;
    let mut boxes = state.boxes.clone();
    boxes[i] = dest;
    let simulated = State::new(state.player_pos, boxes);
    let mov = MacroMove {
        from,
        to: dest,
        dirs: vec![dir],
        weight: 0,
    };
    Some((simulated, mov))
}

/// Push a box adjacent to the next packing-order target onto it.
fn packing_advisor(map: &GoalMap, state: &State, an: &mut Analyzers<'_>) -> Option<MacroMove> {
    let next = an.packing.next_target(state)?;
    for &dir in &DIRECTIONS {
        let from = next - dir;
        if !state.is_box(from) {
            continue;
        }
        if let Some((_, mov)) = try_push(map, state, from, dir) {
            return Some(mov);
        }
    }
    None
}

/// A push that strictly lowers the number of floor components.
fn connectivity_advisor(map: &GoalMap, state: &State, an: &mut Analyzers<'_>) -> Option<MacroMove> {
    let cur = an.connectivity.feature(state);
    if cur <= 1 {
        return None;
    }
    for &b in &state.boxes {
        for &dir in &DIRECTIONS {
            if let Some((simulated, mov)) = try_push(map, state, b, dir) {
                if an.connectivity.feature(&simulated) < cur {
                    return Some(mov);
                }
            }
        }
    }
    None
}

/// A push that strictly lowers the number of obstructed tunnels.
fn room_advisor(map: &GoalMap, state: &State, an: &mut Analyzers<'_>) -> Option<MacroMove> {
    let cur = an.rooms.feature(state);
    if cur == 0 {
        return None;
    }
    for &b in &state.boxes {
        for &dir in &DIRECTIONS {
            if let Some((simulated, mov)) = try_push(map, state, b, dir) {
                if an.rooms.feature(&simulated) < cur {
                    return Some(mov);
                }
            }
        }
    }
    None
}

/// Relocate the most disruptive blocker.
fn hotspots_advisor(map: &GoalMap, state: &State, an: &mut Analyzers<'_>) -> Option<MacroMove> {
    let blocker = an.hotspots.most_disruptive(state)?;
    let cur = an.hotspots.count(state);
    for &dir in &DIRECTIONS {
        if let Some((simulated, mov)) = try_push(map, state, blocker, dir) {
            if an.hotspots.count(&simulated) < cur {
                return Some(mov);
            }
        }
    }
    None
}

/// A push that makes a player-inaccessible region accessible again.
fn explorer_advisor(map: &GoalMap, state: &State) -> Option<MacroMove> {
    let cur = floor_regions(map, state).inaccessible;
    if cur == 0 {
        return None;
    }
    for &b in &state.boxes {
        for &dir in &DIRECTIONS {
            if let Some((simulated, mov)) = try_push(map, state, b, dir) {
                if floor_regions(map, &simulated).inaccessible < cur {
                    return Some(mov);
                }
            }
        }
    }
    None
}

/// Move a box near the top hotspot farther away from it.
fn opener_advisor(map: &GoalMap, state: &State, an: &mut Analyzers<'_>) -> Option<MacroMove> {
    let hotspot = an.hotspots.most_disruptive(state)?;
    for &b in &state.boxes {
        if b == hotspot || b.dist(hotspot) > 2 {
            continue;
        }
        for &dir in &DIRECTIONS {
            if let Some((_, mov)) = try_push(map, state, b, dir) {
                if mov.to.dist(hotspot) > b.dist(hotspot) {
                    return Some(mov);
                }
            }
        }
    }
    None
}

/// Relocate the single highest-risk box anywhere legal.
fn out_of_plan_advisor(map: &GoalMap, state: &State, an: &mut Analyzers<'_>) -> Option<MacroMove> {
    let step = an.packing.feature(state);
    let risky = an.out_of_plan.riskiest(state, step)?;
    for &dir in &DIRECTIONS {
        if let Some((_, mov)) = try_push(map, state, risky, dir) {
            return Some(mov);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Dir;
    use crate::level::Level;

    #[test]
    fn packing_advisor_pushes_onto_target() {
        let level: Level = "\
######
#    #
# $. #
# @  #
######
"
        .parse()
        .unwrap();
        let mut an = Analyzers::new(&level.map);
        let mov = packing_advisor(&level.map, &level.state, &mut an).unwrap();
        assert_eq!(mov.from, Pos::new(2, 2));
        assert_eq!(mov.to, Pos::new(2, 3));
        assert_eq!(mov.dirs, vec![Dir::Right]);
        assert_eq!(mov.weight, 0);
    }

    #[test]
    fn advisors_are_silent_without_candidates() {
        // solved level: nothing to advise
        let level: Level = "\
#####
#@ *#
#####
"
        .parse()
        .unwrap();
        let mut an = Analyzers::new(&level.map);
        let moves = advise(&level.map, &level.state, &mut an);
        assert!(moves.is_empty());
    }

    #[test]
    fn connectivity_advisor_reconnects() {
        // the box splits the corridor; pushing it down merges the halves
        let level: Level = "\
#######
#@$   #
## ## #
## .# #
#######
"
        .parse()
        .unwrap();
        let mut an = Analyzers::new(&level.map);
        assert!(an.connectivity.feature(&level.state) > 1);
        let mov = connectivity_advisor(&level.map, &level.state, &mut an);
        assert!(mov.is_some());
    }
}
