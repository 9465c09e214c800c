// Opt in to warnings about new 2018 idioms
#![warn(rust_2018_idioms)]
// Additional warnings that are allow by default (`rustc -W help`)
#![warn(trivial_casts)]
#![warn(trivial_numeric_casts)]
#![warn(unused)]

pub mod config;
pub mod data;
pub mod level;
pub mod map;
pub mod moves;
pub mod parser;
pub mod solver;
pub mod state;
pub mod vec2d;

use std::error::Error;
use std::fs;
use std::path::Path;

use crate::config::{Method, SolverConfig};
use crate::level::Level;
use crate::solver::{SolverErr, SolverOk};

pub trait LoadLevel {
    fn load_level(&self) -> Result<Level, Box<dyn Error>>;
}

impl<P: AsRef<Path>> LoadLevel for P {
    fn load_level(&self) -> Result<Level, Box<dyn Error>> {
        let text = fs::read_to_string(self)?;
        let level = text.parse::<Level>()?;
        Ok(level)
    }
}

pub trait Solve {
    fn solve(
        &self,
        method: Method,
        config: SolverConfig,
        print_status: bool,
    ) -> Result<SolverOk, SolverErr>;
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::config::Method::{AStar, Fess};

    #[test]
    fn both_engines_solve_the_fixtures() {
        let levels = [
            "levels/custom/01-simplest.txt",
            "levels/custom/02-one-way.txt",
            "levels/custom/03-two-boxes.txt",
            "levels/custom/05-one-push.txt",
        ];

        for method in &[Fess, AStar] {
            for level_path in &levels {
                let level = level_path.load_level().unwrap();
                let result = level.solve(*method, SolverConfig::default(), false).unwrap();
                let moves = result
                    .moves
                    .unwrap_or_else(|| panic!("{} must solve {}", method, level_path));
                let end = level.replay(&moves).unwrap_or_else(|| {
                    panic!("illegal {} solution for {}", method, level_path)
                });
                assert!(
                    level.is_solved_by(&end),
                    "{} solution for {} doesn't solve it",
                    method,
                    level_path
                );
            }
        }
    }

    #[test]
    fn both_engines_report_unsolvable() {
        let level = "levels/custom/04-corner-dead.txt".load_level().unwrap();
        for method in &[Fess, AStar] {
            let result = level.solve(*method, SolverConfig::default(), false).unwrap();
            assert!(result.moves.is_none());
        }
    }

    #[test]
    fn engines_agree_and_repeat() {
        let level = "levels/custom/03-two-boxes.txt".load_level().unwrap();
        for method in &[Fess, AStar] {
            let first = level.solve(*method, SolverConfig::default(), false).unwrap();
            let second = level.solve(*method, SolverConfig::default(), false).unwrap();
            assert_eq!(
                first.moves.unwrap().to_string(),
                second.moves.unwrap().to_string()
            );
            assert_eq!(first.stats, second.stats);
        }
    }
}
