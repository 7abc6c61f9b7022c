//! Grid primitives shared by the planners, the agent and the game, plus the
//! [`GridWorld`] trait through which the core observes and drives a game.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn step(self, direction: Direction) -> Position {
        let (dx, dy) = direction.delta();
        Position::new(self.x + dx, self.y + dy)
    }

    pub fn manhattan(self, other: Position) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    pub fn is_adjacent(self, other: Position) -> bool {
        self.manhattan(other) == 1
    }
}

impl From<(i32, i32)> for Position {
    fn from((x, y): (i32, i32)) -> Self {
        Position::new(x, y)
    }
}

/// Absolute move on the grid. `Up` decreases `y`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Enumeration order used for neighbor generation, tie-breaks and action indices.
    pub const ALL: [Direction; 4] = [Direction::Up, Direction::Down, Direction::Left, Direction::Right];

    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    // relative turns as seen by something heading in `self`
    pub fn turn_left(self) -> Direction {
        match self {
            Direction::Up => Direction::Left,
            Direction::Left => Direction::Down,
            Direction::Down => Direction::Right,
            Direction::Right => Direction::Up,
        }
    }

    pub fn turn_right(self) -> Direction {
        self.turn_left().opposite()
    }

    pub fn index(self) -> usize {
        match self {
            Direction::Up => 0,
            Direction::Down => 1,
            Direction::Left => 2,
            Direction::Right => 3,
        }
    }

    /// Panics on an index outside `0..4`.
    pub fn from_index(index: usize) -> Direction {
        match Direction::ALL.get(index) {
            Some(&direction) => direction,
            None => panic!("action index {} out of range, expected 0..{}", index, Direction::ALL.len()),
        }
    }

    /// Direction of a single 4-adjacent move from `from` to `to`.
    pub fn between(from: Position, to: Position) -> Option<Direction> {
        Direction::ALL.into_iter().find(|&d| from.step(d) == to)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    pub width: i32,
    pub height: i32,
}

impl Bounds {
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    pub fn contains(&self, cell: Position) -> bool {
        cell.x >= 0 && cell.x < self.width && cell.y >= 0 && cell.y < self.height
    }

    pub fn cells(&self) -> impl Iterator<Item = Position> + '_ {
        (0..self.height).flat_map(move |y| (0..self.width).map(move |x| Position::new(x, y)))
    }
}

/// Start to goal, both inclusive. Empty when the goal is unreachable.
pub type Path = Vec<Position>;

/// What a single `step` did to the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StepOutcome {
    /// Cell the head moved into (or tried to, when the move was fatal).
    pub head: Position,
    pub terminal: bool,
}

/// The game as seen by the decision-making core.
pub trait GridWorld {
    fn bounds(&self) -> Bounds;
    /// Body segments and static walls.
    fn obstacles(&self) -> HashSet<Position>;
    fn head_position(&self) -> Position;
    fn goal_position(&self) -> Position;
    /// Current direction of travel, `None` before the first move.
    fn heading(&self) -> Option<Direction>;
    fn step(&mut self, direction: Direction) -> StepOutcome;

    /// Occupied or outside the grid. Worlds with cheaper lookups than
    /// building the obstacle set should override this.
    fn is_blocked(&self, cell: Position) -> bool {
        !self.bounds().contains(cell) || self.obstacles().contains(&cell)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_deltas_and_order() {
        let origin = Position::new(2, 2);
        let stepped: Vec<Position> = Direction::ALL.iter().map(|&d| origin.step(d)).collect();
        assert_eq!(
            stepped,
            vec![Position::new(2, 1), Position::new(2, 3), Position::new(1, 2), Position::new(3, 2)]
        );
        for (i, d) in Direction::ALL.iter().enumerate() {
            assert_eq!(d.index(), i);
            assert_eq!(Direction::from_index(i), *d);
        }
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_from_index_out_of_range() {
        Direction::from_index(4);
    }

    #[test]
    fn test_relative_turns() {
        assert_eq!(Direction::Right.turn_left(), Direction::Up);
        assert_eq!(Direction::Right.turn_right(), Direction::Down);
        assert_eq!(Direction::Up.turn_right(), Direction::Right);
        for d in Direction::ALL {
            assert_eq!(d.turn_left().turn_right(), d);
            assert_eq!(d.opposite().opposite(), d);
        }
    }

    #[test]
    fn test_distances() {
        let a = Position::new(0, 0);
        let b = Position::new(3, -2);
        assert_eq!(a.manhattan(b), 5);
        assert!(a.is_adjacent(Position::new(0, 1)));
        assert!(!a.is_adjacent(Position::new(1, 1)));
    }

    #[test]
    fn test_between() {
        let a = Position::new(1, 1);
        assert_eq!(Direction::between(a, Position::new(1, 0)), Some(Direction::Up));
        assert_eq!(Direction::between(a, Position::new(2, 2)), None);
    }

    #[test]
    fn test_bounds() {
        let bounds = Bounds::new(4, 3);
        assert!(bounds.contains(Position::new(3, 2)));
        assert!(!bounds.contains(Position::new(4, 0)));
        assert!(!bounds.contains(Position::new(0, -1)));
        assert_eq!(bounds.cells().count(), 12);
    }
}
