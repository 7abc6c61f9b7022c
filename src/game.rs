use crate::grid::{Bounds, Direction, GridWorld, Position, StepOutcome};

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use std::collections::{HashSet, VecDeque};

/// Headless snake used to drive the planners and the agent.
pub struct SnakeGame {
    bounds: Bounds,
    walls: HashSet<Position>,
    snake: VecDeque<Position>, // head at the front
    segments: HashSet<Position>, // for O(1) collision querying
    target: Position,
    heading: Option<Direction>,
    score: u32,
    alive: bool,
    rng: StdRng,
}

impl SnakeGame {
    pub fn new(width: i32, height: i32, seed: u64) -> Self {
        Self::with_walls(width, height, Vec::new(), seed)
    }

    /// Static walls never move and never hold the goal.
    pub fn with_walls(width: i32, height: i32, walls: Vec<Position>, seed: u64) -> Self {
        assert!(width > 0 && height > 0, "grid must have at least one cell");
        let bounds = Bounds::new(width, height);
        let head = Self::start_cell(bounds);
        assert!(!walls.contains(&head), "the start cell {:?} cannot be a wall", head);

        let mut instance = Self {
            bounds,
            walls: walls.into_iter().collect(),
            snake: VecDeque::from([head]),
            segments: HashSet::from([head]),
            target: head,
            heading: None,
            score: 0,
            alive: true,
            rng: StdRng::seed_from_u64(seed),
        };
        instance.place_target();
        instance
    }

    /// Builds an arbitrary position. `body` lists segments head first.
    pub fn from_parts(
        bounds: Bounds,
        body: Vec<Position>,
        walls: Vec<Position>,
        target: Position,
        heading: Option<Direction>,
        seed: u64,
    ) -> Self {
        assert!(!body.is_empty(), "the snake needs a head");
        Self {
            bounds,
            walls: walls.into_iter().collect(),
            segments: body.iter().copied().collect(),
            snake: body.into(),
            target,
            heading,
            score: 0,
            alive: true,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn snake(&self) -> &VecDeque<Position> {&self.snake}
    pub fn score(&self) -> u32 {self.score}
    pub fn alive(&self) -> bool {self.alive}

    pub fn reset(&mut self) {
        let head = Self::start_cell(self.bounds);
        self.snake = VecDeque::from([head]);
        self.segments = HashSet::from([head]);
        self.heading = None;
        self.score = 0;
        self.alive = true;
        self.place_target();
    }

    fn start_cell(bounds: Bounds) -> Position {
        Position::new(bounds.width / 2, bounds.height / 2)
    }

    // uniform over free cells; a full board ends the game
    fn place_target(&mut self) {
        let free: Vec<Position> = self
            .bounds
            .cells()
            .filter(|cell| !self.segments.contains(cell) && !self.walls.contains(cell))
            .collect();

        match free.choose(&mut self.rng) {
            Some(&cell) => self.target = cell,
            None => self.alive = false,
        }
    }

    fn check_self_collision(&self, cell: Position, growing: bool) -> bool {
        // the tail moves out of the way unless the snake is about to grow
        self.segments.contains(&cell) && (growing || self.snake.back() != Some(&cell))
    }
}

impl GridWorld for SnakeGame {
    fn bounds(&self) -> Bounds {
        self.bounds
    }

    fn obstacles(&self) -> HashSet<Position> {
        self.segments.union(&self.walls).copied().collect()
    }

    fn head_position(&self) -> Position {
        self.snake[0]
    }

    fn goal_position(&self) -> Position {
        self.target
    }

    fn heading(&self) -> Option<Direction> {
        self.heading
    }

    fn is_blocked(&self, cell: Position) -> bool {
        !self.bounds.contains(cell) || self.segments.contains(&cell) || self.walls.contains(&cell)
    }

    fn step(&mut self, direction: Direction) -> StepOutcome {
        let head = self.head_position();
        if !self.alive {
            return StepOutcome { head, terminal: true };
        }

        // reversing into the neck is ignored, a lone head may turn around
        let direction = match self.heading {
            Some(current) if direction == current.opposite() && self.snake.len() > 1 => current,
            _ => direction,
        };
        self.heading = Some(direction);

        let new_head = head.step(direction);
        let growing = new_head == self.target;

        if !self.bounds.contains(new_head)
            || self.walls.contains(&new_head)
            || self.check_self_collision(new_head, growing)
        {
            self.alive = false;
            return StepOutcome { head: new_head, terminal: true };
        }

        if !growing {
            if let Some(old_tail) = self.snake.pop_back() {
                self.segments.remove(&old_tail);
            }
        }
        self.snake.push_front(new_head);
        self.segments.insert(new_head);

        if growing {
            self.score += 1;
            self.place_target();
        }

        StepOutcome { head: new_head, terminal: !self.alive }
    }
}
