use crate::data::{Dir, Pos};
use crate::map::{GoalMap, IsWall};
use crate::moves::MacroMove;
use crate::state::State;

/// How far away macro destinations are considered.
pub(crate) const DEFAULT_RADIUS: i32 = 3;

/// Emits "push box A to B" candidates for every box and every free
/// destination within `radius`.
///
/// Only destinations with a clear straight line, or an L-shaped path with
/// both legs at most 2 cells, are emitted. This is a bounded approximation
/// of real push reachability, not a proof - the move weighting downstream
/// was tuned against exactly this behavior, so it stays as it is.
pub(crate) fn generate(map: &GoalMap, state: &State, radius: i32) -> Vec<MacroMove> {
    let mut moves = Vec::new();

    for &b in &state.boxes {
        for dr in -radius..=radius {
            for dc in -radius..=radius {
                if dr == 0 && dc == 0 || dr.abs() + dc.abs() > radius {
                    continue;
                }
                let r = i32::from(b.r) + dr;
                let c = i32::from(b.c) + dc;
                if r < 0
                    || c < 0
                    || r >= i32::from(map.grid.rows())
                    || c >= i32::from(map.grid.cols())
                {
                    continue;
                }
                let dest = Pos::new(r as u8, c as u8);
                if map.is_wall(dest) || state.is_box(dest) {
                    continue;
                }
                if let Some(dirs) = path_dirs(map, state, b, dest) {
                    let weight = b.dist(dest).max(1) as u32;
                    moves.push(MacroMove {
                        from: b,
                        to: dest,
                        dirs,
                        weight,
                    });
                }
            }
        }
    }

    moves
}

/// Push directions from `from` to `to` if a clear enough path exists.
///
/// Besides the path itself, the cell behind the box must be clear wherever a
/// push starts or turns - the player has to get there. That is a local check
/// only; whether the player can actually walk there is not verified.
fn path_dirs(map: &GoalMap, state: &State, from: Pos, to: Pos) -> Option<Vec<Dir>> {
    let dr = i32::from(to.r) - i32::from(from.r);
    let dc = i32::from(to.c) - i32::from(from.c);

    let vertical = if dr < 0 { Dir::Up } else { Dir::Down };
    let horizontal = if dc < 0 { Dir::Left } else { Dir::Right };

    let free = |pos: Pos| !map.is_wall(pos) && !state.is_box(pos);
    let walk = |dirs: &[Dir]| -> bool {
        let mut pos = from;
        let mut last_dir = None;
        for &dir in dirs {
            // the player must fit behind the box when the direction changes
            if last_dir != Some(dir) && !free(pos - dir) {
                return false;
            }
            last_dir = Some(dir);
            pos = pos + dir;
            if !free(pos) {
                return false;
            }
        }
        true
    };

    if dr == 0 || dc == 0 {
        // straight line
        let (dir, len) = if dr == 0 {
            (horizontal, dc.abs())
        } else {
            (vertical, dr.abs())
        };
        let dirs = vec![dir; len as usize];
        if walk(&dirs) {
            return Some(dirs);
        }
        return None;
    }

    if dr.abs() > 2 || dc.abs() > 2 {
        return None;
    }

    // short L-shaped detour, vertical leg first, then horizontal leg first
    let mut vertical_first = vec![vertical; dr.abs() as usize];
    vertical_first.extend(std::iter::repeat(horizontal).take(dc.abs() as usize));
    if walk(&vertical_first) {
        return Some(vertical_first);
    }

    let mut horizontal_first = vec![horizontal; dc.abs() as usize];
    horizontal_first.extend(std::iter::repeat(vertical).take(dr.abs() as usize));
    if walk(&horizontal_first) {
        return Some(horizontal_first);
    }

    None
}
