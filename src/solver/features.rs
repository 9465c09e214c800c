use std::cmp::Reverse;

use fnv::FnvHashMap;

use crate::data::{Dir, Pos, DIRECTIONS};
use crate::map::{GoalMap, IsTarget, IsWall};
use crate::state::State;

use super::hotspots::HotspotsAnalyzer;

/// The 4D feature-space cell a state projects into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct FeatureVector {
    pub(crate) packing: u16,
    pub(crate) connectivity: u16,
    pub(crate) rooms: u16,
    pub(crate) out_of_plan: u16,
}

/// All per-level analyzers bundled so the engine and the advisors can share
/// them (and their memo caches).
pub(crate) struct Analyzers<'a> {
    pub(crate) packing: PackingAnalyzer,
    pub(crate) connectivity: ConnectivityAnalyzer<'a>,
    pub(crate) rooms: RoomAnalyzer,
    pub(crate) out_of_plan: OutOfPlanAnalyzer<'a>,
    pub(crate) hotspots: HotspotsAnalyzer,
}

impl<'a> Analyzers<'a> {
    pub(crate) fn new(map: &'a GoalMap) -> Self {
        let packing = PackingAnalyzer::new(map);
        let out_of_plan = OutOfPlanAnalyzer::new(map, packing.order().to_vec());
        Analyzers {
            packing,
            connectivity: ConnectivityAnalyzer::new(map),
            rooms: RoomAnalyzer::new(map),
            out_of_plan,
            hotspots: HotspotsAnalyzer::new(map),
        }
    }

    pub(crate) fn feature_vector(&mut self, state: &State) -> FeatureVector {
        let packing = self.packing.feature(state);
        FeatureVector {
            packing,
            connectivity: self.connectivity.feature(state),
            rooms: self.rooms.feature(state),
            out_of_plan: self.out_of_plan.feature(state, packing),
        }
    }
}

/// Precomputes a target fill order by difficulty and measures how long a
/// prefix of that order is already filled.
///
/// An out-of-order fill does not count - boxes parked on late targets while
/// early ones are open contribute nothing.
pub(crate) struct PackingAnalyzer {
    order: Vec<Pos>,
    memo: FnvHashMap<Vec<Pos>, u16>,
}

impl PackingAnalyzer {
    pub(crate) fn new(map: &GoalMap) -> Self {
        let mut order = map.goals.clone();
        // hardest targets first; Pos as tie-break keeps runs deterministic
        order.sort_by_key(|&goal| (Reverse(difficulty(map, goal)), goal));
        PackingAnalyzer {
            order,
            memo: FnvHashMap::default(),
        }
    }

    pub(crate) fn order(&self) -> &[Pos] {
        &self.order
    }

    /// Length of the longest filled prefix of the packing order.
    pub(crate) fn feature(&mut self, state: &State) -> u16 {
        if let Some(&f) = self.memo.get(&state.boxes) {
            return f;
        }
        let f = self
            .order
            .iter()
            .take_while(|&&goal| state.is_box(goal))
            .count() as u16;
        self.memo.insert(state.boxes.clone(), f);
        f
    }

    /// The first target of the order that still needs a box.
    pub(crate) fn next_target(&mut self, state: &State) -> Option<Pos> {
        let step = usize::from(self.feature(state));
        self.order.get(step).copied()
    }

}

/// Per-target difficulty: spatial constraint (walls), blocking potential
/// (adjacent targets a box must be pushed past), accessibility (open sides)
/// and isolation (distance to the nearest other target).
fn difficulty(map: &GoalMap, goal: Pos) -> i32 {
    let walls = goal
        .neighbors()
        .iter()
        .filter(|&&n| map.is_wall(n))
        .count() as i32;
    let accessibility = 4 - walls;
    let adjacent_targets = goal
        .neighbors()
        .iter()
        .filter(|&&n| !map.is_wall(n) && map.is_target(n))
        .count() as i32;
    let isolation = map
        .goals
        .iter()
        .filter(|&&other| other != goal)
        .map(|&other| goal.dist(other))
        .min()
        .unwrap_or(0);

    3 * walls + 2 * adjacent_targets - accessibility - isolation
}

/// Counts 4-connected components of free floor. 1 means the boxes don't
/// partition the board at all.
pub(crate) struct ConnectivityAnalyzer<'a> {
    map: &'a GoalMap,
    memo: FnvHashMap<State, u16>,
}

impl<'a> ConnectivityAnalyzer<'a> {
    pub(crate) fn new(map: &'a GoalMap) -> Self {
        ConnectivityAnalyzer {
            map,
            memo: FnvHashMap::default(),
        }
    }

    pub(crate) fn feature(&mut self, state: &State) -> u16 {
        if let Some(&f) = self.memo.get(state) {
            return f;
        }
        let f = floor_regions(self.map, state).total;
        self.memo.insert(state.clone(), f);
        f
    }
}

pub(crate) struct FloorRegions {
    pub(crate) total: u16,
    /// Components the player is not part of.
    pub(crate) inaccessible: u16,
}

pub(crate) fn floor_regions(map: &GoalMap, state: &State) -> FloorRegions {
    let mut visited = map.grid.create_scratchpad(false);
    let mut total = 0;
    let mut inaccessible = 0;

    for start in map.grid.positions() {
        if visited[start] || map.is_wall(start) || state.is_box(start) {
            continue;
        }
        total += 1;
        let mut contains_player = false;
        let mut to_visit = vec![start];
        visited[start] = true;
        while let Some(pos) = to_visit.pop() {
            contains_player |= pos == state.player_pos;
            for &dir in &DIRECTIONS {
                let next = pos + dir;
                if !visited[next] && !map.is_wall(next) && !state.is_box(next) {
                    visited[next] = true;
                    to_visit.push(next);
                }
            }
        }
        if !contains_player {
            inaccessible += 1;
        }
    }

    FloorRegions {
        total,
        inaccessible,
    }
}

/// Precomputes rooms and the 1-wide tunnels linking them; the feature is the
/// number of linking tunnels currently obstructed by a box.
pub(crate) struct RoomAnalyzer {
    tunnels: Vec<Vec<Pos>>,
    memo: FnvHashMap<Vec<Pos>, u16>,
}

impl RoomAnalyzer {
    pub(crate) fn new(map: &GoalMap) -> Self {
        let tunnels = find_tunnels(map);
        RoomAnalyzer {
            tunnels,
            memo: FnvHashMap::default(),
        }
    }

    #[cfg(test)]
    pub(crate) fn tunnels(&self) -> &[Vec<Pos>] {
        &self.tunnels
    }

    pub(crate) fn feature(&mut self, state: &State) -> u16 {
        if let Some(&f) = self.memo.get(&state.boxes) {
            return f;
        }
        let f = self
            .tunnels
            .iter()
            .filter(|tunnel| tunnel.iter().any(|&pos| state.is_box(pos)))
            .count() as u16;
        self.memo.insert(state.boxes.clone(), f);
        f
    }
}

fn is_tunnel_cell(map: &GoalMap, pos: Pos) -> bool {
    if map.is_wall(pos) {
        return false;
    }
    let vertical = map.is_wall(pos + Dir::Up) && map.is_wall(pos + Dir::Down);
    let horizontal = map.is_wall(pos + Dir::Left) && map.is_wall(pos + Dir::Right);
    vertical || horizontal
}

fn find_tunnels(map: &GoalMap) -> Vec<Vec<Pos>> {
    // rooms: flood-filled regions of non-tunnel floor that are big enough,
    // dense enough and not just a wide corridor
    let mut room_id = map.grid.create_scratchpad(usize::max_value());
    let mut room_cnt = 0;
    for start in map.grid.positions() {
        if map.is_wall(start) || is_tunnel_cell(map, start) || room_id[start] != usize::max_value()
        {
            continue;
        }
        let mut cells = vec![start];
        room_id[start] = room_cnt;
        let mut i = 0;
        while i < cells.len() {
            let pos = cells[i];
            i += 1;
            for &dir in &DIRECTIONS {
                let next = pos + dir;
                if !map.is_wall(next)
                    && !is_tunnel_cell(map, next)
                    && room_id[next] == usize::max_value()
                {
                    room_id[next] = room_cnt;
                    cells.push(next);
                }
            }
        }

        let (mut min_r, mut max_r, mut min_c, mut max_c) =
            (u8::max_value(), 0, u8::max_value(), 0);
        for &pos in &cells {
            min_r = min_r.min(pos.r);
            max_r = max_r.max(pos.r);
            min_c = min_c.min(pos.c);
            max_c = max_c.max(pos.c);
        }
        let area =
            (usize::from(max_r - min_r) + 1) * (usize::from(max_c - min_c) + 1);
        let density = cells.len() as f64 / area as f64;
        let is_room = cells.len() >= 4 && density > 0.3;
        if !is_room {
            // too small or too sparse - forget it again
            for &pos in &cells {
                room_id[pos] = usize::max_value();
            }
        } else {
            room_cnt += 1;
        }
    }

    // tunnel segments: components of 1-wide cells, kept when they link
    // two distinct rooms
    let mut visited = map.grid.create_scratchpad(false);
    let mut tunnels = Vec::new();
    for start in map.grid.positions() {
        if visited[start] || !is_tunnel_cell(map, start) {
            continue;
        }
        let mut segment = vec![start];
        visited[start] = true;
        let mut i = 0;
        while i < segment.len() {
            let pos = segment[i];
            i += 1;
            for &dir in &DIRECTIONS {
                let next = pos + dir;
                if !visited[next] && is_tunnel_cell(map, next) {
                    visited[next] = true;
                    segment.push(next);
                }
            }
        }

        let mut linked_rooms = Vec::new();
        for &pos in &segment {
            for &dir in &DIRECTIONS {
                let next = pos + dir;
                if !map.is_wall(next) && room_id[next] != usize::max_value() {
                    if !linked_rooms.contains(&room_id[next]) {
                        linked_rooms.push(room_id[next]);
                    }
                }
            }
        }
        if linked_rooms.len() >= 2 {
            segment.sort();
            tunnels.push(segment);
        }
    }

    tunnels
}

/// Risk scoring in tenths so thresholds don't depend on float rounding.
const RISK_ZONE: u32 = 4;
const RISK_CORNERED: u32 = 3;
const RISK_BLOCKS_NEXT: u32 = 2;
const RISK_LINE_ADJACENT: u32 = 2;
const RISK_LIMIT: u32 = 5;

/// Counts boxes that stray from the packing plan: once the first `step`
/// targets of the order are filled, parts of the board become unreachable
/// and boxes lingering there (or wedging the next target) are "out of plan".
pub(crate) struct OutOfPlanAnalyzer<'a> {
    map: &'a GoalMap,
    order: Vec<Pos>,
    /// Per packing step: cells unreachable from every still-open target.
    risk_zones: Vec<Vec<Pos>>,
    memo: FnvHashMap<(Vec<Pos>, u16), u16>,
}

impl<'a> OutOfPlanAnalyzer<'a> {
    pub(crate) fn new(map: &'a GoalMap, order: Vec<Pos>) -> Self {
        let mut risk_zones = Vec::with_capacity(order.len() + 1);
        for step in 0..=order.len() {
            risk_zones.push(risk_zone(map, &order, step));
        }
        OutOfPlanAnalyzer {
            map,
            order,
            risk_zones,
            memo: FnvHashMap::default(),
        }
    }

    pub(crate) fn feature(&mut self, state: &State, step: u16) -> u16 {
        let key = (state.boxes.clone(), step);
        if let Some(&f) = self.memo.get(&key) {
            return f;
        }
        let f = state
            .boxes
            .iter()
            .filter(|&&b| self.risk(state, b, usize::from(step)) > RISK_LIMIT)
            .count() as u16;
        self.memo.insert(key, f);
        f
    }

    /// The single highest-risk box, if any scores above the limit.
    pub(crate) fn riskiest(&self, state: &State, step: u16) -> Option<Pos> {
        state
            .boxes
            .iter()
            .map(|&b| (self.risk(state, b, usize::from(step)), b))
            .filter(|&(risk, _)| risk > RISK_LIMIT)
            // boxes are sorted, so on equal risk the first (smallest) wins
            .max_by_key(|&(risk, b)| (risk, Reverse(b)))
            .map(|(_, b)| b)
    }

    fn risk(&self, state: &State, b: Pos, step: usize) -> u32 {
        if self.map.is_target(b) {
            return 0;
        }

        let mut risk = 0;
        if self.risk_zones[step.min(self.risk_zones.len() - 1)].contains(&b) {
            risk += RISK_ZONE;
        }

        let walls: Vec<bool> = DIRECTIONS
            .iter()
            .map(|&dir| self.map.is_wall(b + dir))
            .collect();
        let cornered = (walls[0] || walls[2]) && (walls[1] || walls[3]);
        if cornered {
            risk += RISK_CORNERED;
        }

        if let Some(&next) = self.order.get(step) {
            if b.neighbors().contains(&next) {
                risk += RISK_BLOCKS_NEXT;
            }
        }

        let line_adjacent = DIRECTIONS.iter().any(|&dir| {
            if !state.is_box(b + dir) {
                return false;
            }
            // both flush against the same wall on one side of the pair's axis
            dir.perpendicular().iter().any(|&side| {
                self.map.is_wall(b + side) && self.map.is_wall(b + dir + side)
            })
        });
        if line_adjacent {
            risk += RISK_LINE_ADJACENT;
        }

        risk
    }
}

fn risk_zone(map: &GoalMap, order: &[Pos], step: usize) -> Vec<Pos> {
    let filled = &order[..step];
    let open = &order[step..];
    if open.is_empty() {
        return Vec::new();
    }

    let mut reachable = map.grid.create_scratchpad(false);
    let mut to_visit = Vec::new();
    for &goal in open {
        if !reachable[goal] && !filled.contains(&goal) {
            reachable[goal] = true;
            to_visit.push(goal);
        }
    }
    while let Some(pos) = to_visit.pop() {
        for &dir in &DIRECTIONS {
            let next = pos + dir;
            if !reachable[next] && !map.is_wall(next) && !filled.contains(&next) {
                reachable[next] = true;
                to_visit.push(next);
            }
        }
    }

    map.grid
        .positions()
        .filter(|&pos| !map.is_wall(pos) && !filled.contains(&pos) && !reachable[pos])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::Level;

    #[test]
    fn packing_prefix_is_monotone() {
        let level: Level = "\
######
#   .#
#@$ .#
#$   #
######
"
        .parse()
        .unwrap();
        let mut packing = PackingAnalyzer::new(&level.map);
        let order = packing.order().to_vec();
        assert_eq!(order.len(), 2);

        let empty = State::new(level.state.player_pos, vec![Pos::new(2, 2), Pos::new(3, 1)]);
        assert_eq!(packing.feature(&empty), 0);

        // filling in order grows the prefix
        let first = State::new(level.state.player_pos, vec![order[0], Pos::new(3, 1)]);
        assert_eq!(packing.feature(&first), 1);
        let both = State::new(level.state.player_pos, vec![order[0], order[1]]);
        assert_eq!(packing.feature(&both), 2);

        // an out-of-order fill does not count
        let second_only = State::new(level.state.player_pos, vec![order[1], Pos::new(3, 1)]);
        assert_eq!(packing.feature(&second_only), 0);

        // vacating an early target drops the whole prefix after it
        assert_eq!(packing.next_target(&second_only), Some(order[0]));
    }

    #[test]
    fn connectivity_open_board() {
        let level: Level = "\
######
#@  .#
# $  #
######
"
        .parse()
        .unwrap();
        let mut connectivity = ConnectivityAnalyzer::new(&level.map);
        assert_eq!(connectivity.feature(&level.state), 1);
    }

    #[test]
    fn connectivity_split_board() {
        let level: Level = "\
#####
#@$.#
#####
"
        .parse()
        .unwrap();
        let mut connectivity = ConnectivityAnalyzer::new(&level.map);
        assert_eq!(connectivity.feature(&level.state), 2);
    }

    #[test]
    fn tunnel_between_rooms() {
        let level: Level = "\
#########
#@  #  .#
#   $   #
#   #   #
#########
"
        .parse()
        .unwrap();
        let mut rooms = RoomAnalyzer::new(&level.map);
        assert_eq!(rooms.tunnels(), &[vec![Pos::new(2, 4)]]);
        assert_eq!(rooms.feature(&level.state), 1);

        // box pushed out of the tunnel frees it
        let clear = State::new(level.state.player_pos, vec![Pos::new(2, 5)]);
        assert_eq!(rooms.feature(&clear), 0);
    }

    #[test]
    fn no_tunnels_in_open_room() {
        let level: Level = "\
######
#@  .#
# $  #
######
"
        .parse()
        .unwrap();
        let rooms = RoomAnalyzer::new(&level.map);
        assert!(rooms.tunnels().is_empty());
    }

    #[test]
    fn out_of_plan_quiet_corridor() {
        let level: Level = "\
#######
#@$  .#
#######
"
        .parse()
        .unwrap();
        let mut analyzers = Analyzers::new(&level.map);
        let fv = analyzers.feature_vector(&level.state);
        assert_eq!(fv.out_of_plan, 0);
        assert_eq!(analyzers.out_of_plan.riskiest(&level.state, 0), None);
    }

    #[test]
    fn filled_target_seals_the_corridor() {
        let level: Level = "\
######
#@$$.#
####.#
#### #
######
"
        .parse()
        .unwrap();
        let packing = PackingAnalyzer::new(&level.map);
        assert_eq!(packing.order(), &[Pos::new(1, 4), Pos::new(2, 4)]);

        let oop = OutOfPlanAnalyzer::new(&level.map, packing.order().to_vec());
        // with nothing filled everything can still reach the open targets
        assert!(oop.risk_zones[0].is_empty());
        // once (1,4) is filled the top corridor can't reach (2,4) anymore
        assert!(oop.risk_zones[1].contains(&Pos::new(1, 1)));
    }
}
