use super::config::RewardConfig;
use crate::grid::{Direction, GridWorld, Position};
use crate::sequential::tensor::Tensor;

pub const STATE_SIZE: usize = 9;
pub const ACTION_SIZE: usize = 4;

/// `[danger straight, left, right; heading up, down, left, right; goal dx, dy]`
#[derive(Clone, Debug, PartialEq)]
pub struct StateVector(Vec<f32>);

impl StateVector {
    /// Panics unless `values` has exactly `STATE_SIZE` entries.
    pub fn new(values: Vec<f32>) -> Self {
        assert_eq!(
            values.len(),
            STATE_SIZE,
            "state vector must have {} features, got {}",
            STATE_SIZE,
            values.len()
        );
        Self(values)
    }

    pub fn encode<W: GridWorld + ?Sized>(world: &W) -> Self {
        let bounds = world.bounds();
        let head = world.head_position();
        let goal = world.goal_position();

        // before the first move, dangers are judged as if heading right
        let facing = world.heading().unwrap_or(Direction::Right);
        let danger = |direction: Direction| world.is_blocked(head.step(direction)) as i32 as f32;

        let mut values = Vec::with_capacity(STATE_SIZE);
        values.push(danger(facing));
        values.push(danger(facing.turn_left()));
        values.push(danger(facing.turn_right()));
        for direction in Direction::ALL {
            values.push((world.heading() == Some(direction)) as i32 as f32);
        }
        values.push((goal.x - head.x) as f32 / bounds.width as f32);
        values.push((goal.y - head.y) as f32 / bounds.height as f32);

        Self::new(values)
    }

    pub fn values(&self) -> &[f32] {
        &self.0
    }

    pub fn to_tensor(&self) -> Tensor {
        Tensor::from_vec(self.0.clone(), 1, STATE_SIZE)
    }
}

/// The unit of experience stored in the replay buffer.
#[derive(Clone, Debug)]
pub struct Transition {
    pub state: StateVector,
    pub action: usize,
    pub reward: f32,
    pub next_state: StateVector,
    pub terminal: bool,
}

impl Transition {
    /// Panics if `action` is not a valid action index.
    pub fn new(state: StateVector, action: usize, reward: f32, next_state: StateVector, terminal: bool) -> Self {
        assert!(action < ACTION_SIZE, "action index {} out of range, expected 0..{}", action, ACTION_SIZE);
        Self {
            state,
            action,
            reward,
            next_state,
            terminal,
        }
    }
}

/// Reward for moving the head from `previous` to `current` while chasing `goal`.
pub fn reward(rewards: &RewardConfig, terminal: bool, previous: Position, current: Position, goal: Position) -> f32 {
    if terminal {
        rewards.collision
    } else if current == goal {
        rewards.goal
    } else if current.manhattan(goal) < previous.manhattan(goal) {
        rewards.closer
    } else {
        rewards.otherwise
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::SnakeGame;
    use crate::grid::Bounds;

    fn p(x: i32, y: i32) -> Position {
        Position::new(x, y)
    }

    #[test]
    fn test_encode_open_board() {
        let game = SnakeGame::from_parts(Bounds::new(10, 10), vec![p(5, 5)], Vec::new(), p(5, 0), Some(Direction::Up), 0);
        let state = StateVector::encode(&game);
        assert_eq!(state.values(), &[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, -0.5]);
    }

    #[test]
    fn test_encode_relative_danger() {
        // heading right along the top edge: left turn leaves the grid
        let game = SnakeGame::from_parts(
            Bounds::new(10, 10),
            vec![p(1, 0), p(0, 0)],
            vec![p(2, 0)],
            p(5, 5),
            Some(Direction::Right),
            0,
        );
        let state = StateVector::encode(&game);
        assert_eq!(&state.values()[..7], &[1.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_encode_without_heading() {
        let game = SnakeGame::from_parts(Bounds::new(4, 4), vec![p(3, 1)], Vec::new(), p(3, 3), None, 0);
        let state = StateVector::encode(&game);
        // straight (right) leaves the grid, no heading bit set
        assert_eq!(&state.values()[..7], &[1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        assert_eq!(state.to_tensor().cols(), STATE_SIZE);
    }

    #[test]
    #[should_panic(expected = "state vector must have")]
    fn test_wrong_length_state() {
        StateVector::new(vec![0.0; 5]);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_action_out_of_range() {
        let state = StateVector::new(vec![0.0; STATE_SIZE]);
        Transition::new(state.clone(), ACTION_SIZE, 0.0, state, false);
    }

    #[test]
    fn test_reward_landing_on_goal() {
        let rewards = RewardConfig::default();
        let goal = p(5, 5);
        assert_eq!(reward(&rewards, false, p(5, 4), goal, goal), 20.0);
        // previous distance does not matter
        assert_eq!(reward(&rewards, false, p(5, 5), goal, goal), 20.0);
    }

    #[test]
    fn test_reward_cases() {
        let rewards = RewardConfig::default();
        let goal = p(5, 5);
        assert_eq!(reward(&rewards, true, p(0, 0), goal, goal), -10.0);
        assert_eq!(reward(&rewards, false, p(0, 0), p(1, 0), goal), 2.0);
        assert_eq!(reward(&rewards, false, p(1, 0), p(0, 0), goal), -1.0);
    }
}
