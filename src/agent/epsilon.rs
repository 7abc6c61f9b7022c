use serde::{Deserialize, Serialize};

/// Linear exploration schedule from `start` down to `floor`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpsilonSchedule {
    start: f32,
    floor: f32,
    decay_steps: usize,
    steps_taken: usize,
}

impl EpsilonSchedule {
    pub fn new(start: f32, floor: f32, decay_steps: usize) -> Self {
        assert!(
            (0.0..=1.0).contains(&floor) && floor <= start && start <= 1.0,
            "epsilon schedule needs 0 <= floor ({}) <= start ({}) <= 1",
            floor, start
        );
        Self {
            start,
            floor,
            decay_steps,
            steps_taken: 0,
        }
    }

    pub fn value(&self) -> f32 {
        if self.steps_taken >= self.decay_steps {
            return self.floor;
        }
        let progress = self.steps_taken as f32 / self.decay_steps as f32;
        (self.start - (self.start - self.floor) * progress).max(self.floor)
    }

    pub fn decay(&mut self) {
        self.steps_taken = (self.steps_taken + 1).min(self.decay_steps);
    }

    /// Skips straight to the floor.
    pub fn exhaust(&mut self) {
        self.steps_taken = self.decay_steps;
    }
}
