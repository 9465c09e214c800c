use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    /// Feature-space search (Shoham & Schaeffer 2020).
    Fess,
    /// A* over push states with an assignment heuristic.
    AStar,
}

impl Display for Method {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match *self {
            Method::Fess => write!(f, "fess"),
            Method::AStar => write!(f, "astar"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigErr {
    ZeroStates,
    ZeroTime,
}

impl Display for ConfigErr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match *self {
            ConfigErr::ZeroStates => write!(f, "max_states must be at least 1"),
            ConfigErr::ZeroTime => write!(f, "time_limit must be positive"),
        }
    }
}

impl Error for ConfigErr {}

/// Resource bounds for a single solver run.
///
/// Limits are checked once per outer search iteration - a single iteration's
/// macro generation or feature computation is never preempted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SolverConfig {
    pub max_states: usize,
    pub time_limit: Duration,
}

impl SolverConfig {
    pub fn new(max_states: usize, time_limit: Duration) -> Result<Self, ConfigErr> {
        if max_states == 0 {
            return Err(ConfigErr::ZeroStates);
        }
        if time_limit == Duration::from_secs(0) {
            return Err(ConfigErr::ZeroTime);
        }
        Ok(SolverConfig {
            max_states,
            time_limit,
        })
    }
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            max_states: 1_000_000,
            time_limit: Duration::from_secs(60),
        }
    }
}
