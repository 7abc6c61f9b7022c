pub mod grid;
pub mod error;

pub use error::{Error, Result};
pub use grid::{Bounds, Direction, GridWorld, Path, Position, StepOutcome};

pub mod sequential;

pub use sequential::tensor::Tensor;
pub use sequential::Sequential;

pub mod planner;

pub use planner::{Planner, PlannerConfig, PlannerDecision};
pub use planner::astar::PathPlanner;
pub use planner::survival::SurvivalHeuristic;

pub mod agent;

pub use agent::{Agent, EpisodeState, TickReport};
pub use agent::config::AgentConfig;
pub use agent::features::{StateVector, Transition, ACTION_SIZE, STATE_SIZE};
pub use agent::replaybuffer::ReplayBuffer;

pub mod controller;
pub mod game;
pub mod stats;

pub use controller::{Controller, Mode};
pub use game::SnakeGame;
pub use stats::Scoreboard;
