use fnv::FnvHashSet;

use crate::data::Pos;
use crate::map::{GoalMap, IsTarget, IsWall};
use crate::state::State;

use super::deadlock::push_reachable_cells;

/// Precomputed pairwise blocking relation: `(y, x)` is in the table when a
/// box parked on `y` strictly reduces the targets a lone box at `x` could
/// still be pushed to.
pub(crate) struct HotspotsAnalyzer {
    blocks: FnvHashSet<(Pos, Pos)>,
}

impl HotspotsAnalyzer {
    pub(crate) fn new(map: &GoalMap) -> Self {
        let floor: Vec<Pos> = map
            .grid
            .positions()
            .filter(|&pos| !map.is_wall(pos))
            .collect();

        let mut blocks = FnvHashSet::default();
        for &x in &floor {
            let free_cnt = reachable_target_cnt(map, x, None);
            if free_cnt == 0 {
                continue;
            }
            for &y in &floor {
                if y == x {
                    continue;
                }
                if reachable_target_cnt(map, x, Some(y)) < free_cnt {
                    blocks.insert((y, x));
                }
            }
        }

        HotspotsAnalyzer { blocks }
    }

    /// Total number of blocking relationships between the current boxes.
    pub(crate) fn count(&self, state: &State) -> u32 {
        let mut cnt = 0;
        for &y in &state.boxes {
            for &x in &state.boxes {
                if y != x && self.blocks.contains(&(y, x)) {
                    cnt += 1;
                }
            }
        }
        cnt
    }

    /// The box blocking the most other boxes, if any blocks at all.
    /// Boxes are sorted, so ties resolve to the first one.
    pub(crate) fn most_disruptive(&self, state: &State) -> Option<Pos> {
        let mut best: Option<(u32, Pos)> = None;
        for &y in &state.boxes {
            let cnt = state
                .boxes
                .iter()
                .filter(|&&x| x != y && self.blocks.contains(&(y, x)))
                .count() as u32;
            if cnt > 0 && best.map_or(true, |(best_cnt, _)| cnt > best_cnt) {
                best = Some((cnt, y));
            }
        }
        best.map(|(_, y)| y)
    }
}

fn reachable_target_cnt(map: &GoalMap, from: Pos, blocked: Option<Pos>) -> usize {
    push_reachable_cells(map, from, |pos| Some(pos) == blocked)
        .iter()
        .filter(|&&pos| map.is_target(pos))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::Level;

    #[test]
    fn doorway_blocks() {
        // a box parked in the doorway cuts the upper boxes off the goal room
        let level: Level = "\
########
#@     #
# $  $ #
#### ###
#      #
#  ..  #
########
"
        .parse()
        .unwrap();
        let hotspots = HotspotsAnalyzer::new(&level.map);
        let doorway = Pos::new(3, 4);
        assert!(hotspots.blocks.contains(&(doorway, Pos::new(2, 2))));
        assert!(hotspots.blocks.contains(&(doorway, Pos::new(2, 5))));
    }

    #[test]
    fn open_room_has_no_hotspots_for_spread_boxes() {
        let level: Level = "\
#######
#@    #
# $ . #
#     #
#######
"
        .parse()
        .unwrap();
        let hotspots = HotspotsAnalyzer::new(&level.map);
        assert_eq!(hotspots.count(&level.state), 0);
        assert_eq!(hotspots.most_disruptive(&level.state), None);
    }
}
