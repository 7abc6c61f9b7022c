use crate::grid::{Bounds, Direction, Position};

use std::collections::{HashSet, VecDeque};
use tracing::debug;

/// Fallback used when no path to the goal exists: move towards the largest
/// pocket of free space.
#[derive(Clone, Copy, Debug, Default)]
pub struct SurvivalHeuristic;

impl SurvivalHeuristic {
    pub fn new() -> Self {
        Self
    }

    /// Picks the safe move whose flood fill reaches the most cells. Ties keep
    /// the earlier direction in up, down, left, right order. `None` means every
    /// neighbor is blocked.
    pub fn evaluate(&self, head: Position, obstacles: &HashSet<Position>, bounds: Bounds) -> Option<Direction> {
        let mut best: Option<(Direction, usize)> = None;

        for direction in Direction::ALL {
            let cell = head.step(direction);
            if !bounds.contains(cell) || obstacles.contains(&cell) {
                continue;
            }

            let reachable = flood_fill(cell, obstacles, bounds);
            if best.is_none_or(|(_, count)| reachable > count) {
                best = Some((direction, reachable));
            }
        }

        match best {
            Some((direction, reachable)) => {
                debug!(?direction, reachable, "survival move");
                Some(direction)
            }
            None => {
                debug!(?head, "no safe move");
                None
            }
        }
    }
}

/// Number of free cells reachable from `start`, `start` included. Zero when
/// `start` itself is blocked.
pub fn flood_fill(start: Position, obstacles: &HashSet<Position>, bounds: Bounds) -> usize {
    if !bounds.contains(start) || obstacles.contains(&start) {
        return 0;
    }

    let mut visited = HashSet::from([start]);
    let mut queue = VecDeque::from([start]);

    while let Some(cell) = queue.pop_front() {
        for direction in Direction::ALL {
            let next = cell.step(direction);
            if bounds.contains(next) && !obstacles.contains(&next) && visited.insert(next) {
                queue.push_back(next);
            }
        }
    }

    visited.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(list: &[(i32, i32)]) -> HashSet<Position> {
        list.iter().map(|&c| Position::from(c)).collect()
    }

    #[test]
    fn test_flood_fill_open_grid() {
        assert_eq!(flood_fill(Position::new(2, 2), &HashSet::new(), Bounds::new(5, 5)), 25);
    }

    #[test]
    fn test_flood_fill_respects_walls() {
        // column x = 1 splits a 3x3 grid
        let obstacles = cells(&[(1, 0), (1, 1), (1, 2)]);
        assert_eq!(flood_fill(Position::new(0, 0), &obstacles, Bounds::new(3, 3)), 3);
        assert_eq!(flood_fill(Position::new(1, 1), &obstacles, Bounds::new(3, 3)), 0);
    }

    #[test]
    fn test_prefers_larger_region() {
        // head at (1,1); the left pocket is one cell, the right side is open
        let obstacles = cells(&[(1, 1), (1, 0), (1, 2), (0, 0), (0, 2)]);
        let choice = SurvivalHeuristic::new().evaluate(Position::new(1, 1), &obstacles, Bounds::new(5, 3));
        assert_eq!(choice, Some(Direction::Right));
    }

    #[test]
    fn test_ties_follow_enumeration_order() {
        let choice = SurvivalHeuristic::new().evaluate(Position::new(2, 2), &HashSet::new(), Bounds::new(5, 5));
        assert_eq!(choice, Some(Direction::Up));
    }

    #[test]
    fn test_trapped_head_has_no_move() {
        let obstacles = cells(&[(0, 0), (1, 0), (0, 1)]);
        assert_eq!(SurvivalHeuristic::new().evaluate(Position::new(0, 0), &obstacles, Bounds::new(3, 3)), None);
    }
}
