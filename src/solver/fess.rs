use std::time::Instant;

use log::{debug, info};

use crate::config::{Method, SolverConfig};
use crate::data::DIRECTIONS;
use crate::moves::{Move, Moves};

use super::advisors;
use super::deadlock::DeadlockDetector;
use super::feature_space::{FeatureSpace, NodeId, SearchTree};
use super::features::{Analyzers, FeatureVector};
use super::macro_moves::{self, DEFAULT_RADIUS};
use super::{solved, FailureReason, SolverLevel, SolverOk, Stats};

pub(crate) fn search(level: &SolverLevel, config: SolverConfig, print_status: bool) -> SolverOk {
    debug!("Precomputing level analysis...");
    let engine = Engine {
        level,
        analyzers: Analyzers::new(&level.map),
        deadlocks: DeadlockDetector::new(&level.map),
        tree: SearchTree::new(),
        space: FeatureSpace::new(),
        stats: Stats::default(),
    };
    debug!("Precomputation done");
    engine.run(config, print_status)
}

struct Engine<'a> {
    level: &'a SolverLevel,
    analyzers: Analyzers<'a>,
    deadlocks: DeadlockDetector<'a>,
    tree: SearchTree,
    space: FeatureSpace,
    stats: Stats,
}

impl<'a> Engine<'a> {
    fn run(mut self, config: SolverConfig, print_status: bool) -> SolverOk {
        let started = Instant::now();

        let root_state = self.level.state.clone();
        let root = self
            .tree
            .add_state(root_state.clone(), 0, None, None)
            .unwrap();
        self.stats.created += 1;

        if solved(&self.level.map, &root_state) {
            return SolverOk::solved(Moves::default(), self.stats, Method::Fess);
        }

        let fv = self.analyzers.feature_vector(&root_state);
        self.space.add_state_to_cell(fv, root);
        self.assign_candidates(root);

        // how many cells in a row yielded nothing - once a whole lap of the
        // rotation is dry there is no unexpanded candidate left anywhere
        let mut dry_cells = 0;
        let mut iterations: u64 = 0;

        loop {
            if self.tree.len() >= config.max_states || started.elapsed() >= config.time_limit {
                debug!("Out of resources after {} iterations", iterations);
                return SolverOk::failed(
                    FailureReason::ResourceExhausted,
                    self.stats,
                    Method::Fess,
                );
            }

            iterations += 1;
            if print_status && iterations % 10_000 == 0 {
                info!("FESS iteration {}: {:?}", iterations, self.stats);
            }

            let fv = match self.space.next_cell_for_cycling() {
                Some(fv) => fv,
                None => {
                    return SolverOk::failed(
                        FailureReason::SpaceExhausted,
                        self.stats,
                        Method::Fess,
                    );
                }
            };

            let (id, mov, mov_weight) = match self.pick_candidate(fv) {
                Some(picked) => picked,
                None => {
                    dry_cells += 1;
                    if dry_cells >= self.space.cell_cnt() {
                        debug!("Search space exhausted after {} iterations", iterations);
                        return SolverOk::failed(
                            FailureReason::SpaceExhausted,
                            self.stats,
                            Method::Fess,
                        );
                    }
                    continue;
                }
            };
            dry_cells = 0;

            self.stats.expanded += 1;
            let parent_weight = self.tree.node(id).weight;
            let new_state = match mov.apply(&self.level.map, &self.tree.node(id).state) {
                Some(state) => state,
                // candidates are generated heuristically - illegal ones are
                // expected and just dropped
                None => continue,
            };

            if self.deadlocks.is_deadlock(&new_state) {
                self.stats.deadlocks += 1;
                continue;
            }

            let weight = parent_weight + mov_weight;
            let new_id = match self.tree.add_state(new_state.clone(), weight, Some(id), Some(mov))
            {
                Some(new_id) => new_id,
                None => {
                    self.stats.duplicates += 1;
                    continue;
                }
            };
            self.stats.created += 1;

            if solved(&self.level.map, &new_state) {
                debug!("Solved, reconstructing path");
                return SolverOk::solved(self.tree.path_moves(new_id), self.stats, Method::Fess);
            }

            let fv = self.analyzers.feature_vector(&new_state);
            self.space.add_state_to_cell(fv, new_id);
            self.assign_candidates(new_id);
        }
    }

    /// The globally cheapest unexpanded candidate among the cell's nodes:
    /// minimal accumulated weight + move weight, first found wins ties.
    fn pick_candidate(&mut self, fv: FeatureVector) -> Option<(NodeId, Move, u32)> {
        let mut best: Option<(NodeId, usize, u32)> = None;
        for &id in self.space.cell_nodes(fv) {
            let node = self.tree.node(id);
            if node.expanded {
                continue;
            }
            for (i, &(_, weight)) in node.candidates.iter().enumerate() {
                let total = node.weight + weight;
                if best.map_or(true, |(_, _, best_total)| total < best_total) {
                    best = Some((id, i, total));
                }
            }
        }

        let (id, index, total) = best?;
        let node = self.tree.node_mut(id);
        let (mov, _) = node.candidates.remove(index);
        if node.candidates.is_empty() {
            node.expanded = true;
        }
        let mov_weight = total - node.weight;
        Some((id, mov, mov_weight))
    }

    /// Gathers advisor proposals and attaches the weighted candidate list:
    /// moves an advisor wants cost 0, everything else keeps its distance
    /// weight. Nothing is filtered out - advice only reorders the search.
    fn assign_candidates(&mut self, id: NodeId) {
        let state = self.tree.node(id).state.clone();
        let advised = advisors::advise(&self.level.map, &state, &mut self.analyzers);

        let mut candidates = Vec::new();
        for &dir in &DIRECTIONS {
            let weight = if advised.iter().any(|m| m.dirs.first() == Some(&dir)) {
                0
            } else {
                1
            };
            candidates.push((Move::Basic(dir), weight));
        }
        for m in macro_moves::generate(&self.level.map, &state, DEFAULT_RADIUS) {
            let weight = if advised.iter().any(|a| a.from == m.from && a.to == m.to) {
                0
            } else {
                m.weight
            };
            candidates.push((Move::Macro(m), weight));
        }

        self.tree.node_mut(id).candidates = candidates;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::Level;
    use crate::solver::process_level;

    fn run(level: &str, config: SolverConfig) -> SolverOk {
        let level: Level = level.parse().unwrap();
        let solver_level = process_level(&level).unwrap();
        search(&solver_level, config, false)
    }

    #[test]
    fn one_push_level() {
        let result = run(
            "\
######
#    #
# $. #
# @  #
######
",
            SolverConfig::default(),
        );
        let moves = result.moves.unwrap();
        assert_eq!(moves.to_string(), "R");
    }

    #[test]
    fn corridor_level() {
        let result = run(
            "\
###
#.#
# #
# #
#$#
#@#
###
",
            SolverConfig::default(),
        );
        let moves = result.moves.unwrap();
        assert_eq!(moves.to_string(), "UUU");
    }

    #[test]
    fn corner_box_reports_failure() {
        let result = run(
            "\
#####
#$ @#
# . #
#####
",
            SolverConfig::default(),
        );
        assert!(result.moves.is_none());
        assert_eq!(result.failure, Some(FailureReason::SpaceExhausted));
    }

    #[test]
    fn max_states_one_exhausts_resources() {
        let result = run(
            "\
######
#@   #
# $$ #
# .. #
######
",
            SolverConfig {
                max_states: 1,
                ..SolverConfig::default()
            },
        );
        assert!(result.moves.is_none());
        assert_eq!(result.failure, Some(FailureReason::ResourceExhausted));
    }

    #[test]
    fn already_solved_level() {
        let result = run(
            "\
#####
#@ *#
#####
",
            SolverConfig::default(),
        );
        let moves = result.moves.unwrap();
        assert_eq!(moves.move_cnt(), 0);
    }

    #[test]
    fn solutions_replay_to_completion() {
        let level_str = "\
#######
#     #
# $$  #
# ..@ #
#     #
#######
";
        let level: Level = level_str.parse().unwrap();
        let result = run(level_str, SolverConfig::default());
        let moves = result.moves.unwrap();
        let end = level.replay(&moves).expect("solution must replay legally");
        assert!(level.is_solved_by(&end));
    }

    #[test]
    fn deterministic_across_runs() {
        let level = "\
#######
#     #
# $$  #
# ..@ #
#     #
#######
";
        let a = run(level, SolverConfig::default());
        let b = run(level, SolverConfig::default());
        assert_eq!(a.moves.unwrap().to_string(), b.moves.unwrap().to_string());
        assert_eq!(a.stats, b.stats);
    }
}
