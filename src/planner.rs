pub mod astar;
pub mod survival;

use astar::PathPlanner;
use survival::SurvivalHeuristic;
use crate::grid::{Direction, GridWorld, Path};

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Extra heuristic cost per obstacle next to a candidate cell. 0 gives shortest paths.
    pub proximity_weight: u32,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self { proximity_weight: 1 }
    }
}

/// Result of one planning tick.
#[derive(Clone, Debug, PartialEq)]
pub struct PlannerDecision {
    /// Path the move was taken from; empty when the survival fallback decided.
    pub path: Path,
    /// `None` when the head is boxed in.
    pub direction: Option<Direction>,
}

/// A* towards the goal, flood fill when the goal is cut off.
#[derive(Clone, Debug, Default)]
pub struct Planner {
    astar: PathPlanner,
    survival: SurvivalHeuristic,
}

impl Planner {
    pub fn new(config: &PlannerConfig) -> Self {
        Self {
            astar: PathPlanner::new(config.proximity_weight),
            survival: SurvivalHeuristic::new(),
        }
    }

    pub fn decide<W: GridWorld + ?Sized>(&self, world: &W) -> PlannerDecision {
        let bounds = world.bounds();
        let obstacles = world.obstacles();
        let head = world.head_position();

        let path = self.astar.search(head, world.goal_position(), &obstacles, bounds);
        if let &[from, to, ..] = path.as_slice() {
            return PlannerDecision {
                direction: Direction::between(from, to),
                path,
            };
        }

        PlannerDecision {
            path: Path::new(),
            direction: self.survival.evaluate(head, &obstacles, bounds),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::SnakeGame;
    use crate::grid::{Bounds, Position};

    #[test]
    fn test_follows_path_when_reachable() {
        let game = SnakeGame::from_parts(
            Bounds::new(5, 5),
            vec![Position::new(0, 0)],
            Vec::new(),
            Position::new(0, 3),
            None,
            7,
        );
        let decision = Planner::default().decide(&game);
        assert_eq!(decision.direction, Some(Direction::Down));
        assert_eq!(decision.path.len(), 4);
    }

    #[test]
    fn test_falls_back_when_goal_is_walled_off() {
        let walls = vec![Position::new(3, 2), Position::new(2, 3)];
        let game = SnakeGame::from_parts(
            Bounds::new(4, 4),
            vec![Position::new(0, 0), Position::new(1, 0)],
            walls,
            Position::new(3, 3),
            Some(Direction::Left),
            7,
        );
        let decision = Planner::new(&PlannerConfig { proximity_weight: 0 }).decide(&game);
        assert!(decision.path.is_empty());
        assert_eq!(decision.direction, Some(Direction::Down));
    }
}
