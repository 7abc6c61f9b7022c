use super::features::Transition;
use crate::error::{Error, Result};

use rand::Rng;
use std::collections::VecDeque;

pub struct ReplayBuffer {
    buffer: VecDeque<Transition>,
    capacity: usize
}

impl ReplayBuffer {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "replay buffer capacity must be positive");
        Self {
            buffer: VecDeque::with_capacity(capacity),
            capacity
        }
    }

    pub fn add(&mut self, transition: Transition) {
        if self.buffer.len() == self.capacity {
            self.buffer.pop_front();
        }
        self.buffer.push_back(transition);
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// `batch_size` distinct transitions chosen uniformly, in no particular order.
    pub fn sample<R: Rng + ?Sized>(&self, batch_size: usize, rng: &mut R) -> Result<Vec<&Transition>> {
        if self.buffer.len() < batch_size {
            return Err(Error::InsufficientData {
                requested: batch_size,
                available: self.buffer.len(),
            });
        }

        let indices = rand::seq::index::sample(rng, self.buffer.len(), batch_size);
        Ok(indices.iter().map(|index| &self.buffer[index]).collect())
    }
}
