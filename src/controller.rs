use crate::agent::Agent;
use crate::agent::features::StateVector;
use crate::grid::{Direction, GridWorld, Path, Position};
use crate::planner::Planner;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Who steers the snake.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Mode {
    Manual,
    Planner,
    Learning,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Mode::Manual => "manual",
            Mode::Planner => "planner",
            Mode::Learning => "learning",
        };
        f.write_str(name)
    }
}

pub struct Controller {
    planner: Planner,
    agent: Agent,
    last_path: Path,
}

impl Controller {
    pub fn new(planner: Planner, agent: Agent) -> Self {
        Self {
            planner,
            agent,
            last_path: Path::new(),
        }
    }

    /// Path behind the most recent planner decision, for drawing.
    pub fn last_path(&self) -> &[Position] {
        &self.last_path
    }

    /// Next move for `world` under `mode`. Manual play keeps the current
    /// heading; key handling lives with the caller.
    pub fn choose_direction<W: GridWorld + ?Sized>(&mut self, mode: Mode, world: &W) -> Option<Direction> {
        match mode {
            Mode::Manual => world.heading(),
            Mode::Planner => {
                let decision = self.planner.decide(world);
                self.last_path = decision.path;
                decision.direction
            }
            Mode::Learning => {
                let state = StateVector::encode(world);
                Some(self.agent.select_action(&state))
            }
        }
    }
}
