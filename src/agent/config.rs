//! Hyperparameters for the learning agent.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OptimizerKind {
    Sgd,
    Adam,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LossKind {
    MeanSquared,
    Huber,
}

/// Reward constants. Exactly one applies per tick, checked in field order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardConfig {
    pub collision: f32,
    pub goal: f32,
    pub closer: f32,
    pub otherwise: f32,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            collision: -10.0,
            goal: 20.0,
            closer: 2.0,
            otherwise: -1.0,
        }
    }
}

/// Every field has a default, so a JSON file only needs the values it changes.
///
/// ```rust
/// use gridsnake::agent::config::AgentConfig;
///
/// let config: AgentConfig = serde_json::from_str(r#"{ "batch_size": 32 }"#).unwrap();
/// assert_eq!(config.batch_size, 32);
/// assert_eq!(config.gamma, AgentConfig::default().gamma);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub hidden_size: usize,
    pub learning_rate: f32,
    pub optimizer: OptimizerKind,
    pub loss: LossKind,

    /// Discount factor for the TD target.
    pub gamma: f32,

    pub replay_capacity: usize,
    pub batch_size: usize,

    pub epsilon_start: f32,
    pub epsilon_floor: f32,
    /// Decay calls (one per finished episode) to go from start to floor.
    pub epsilon_decay_steps: usize,

    /// Finished episodes between target network syncs.
    pub target_sync_episodes: usize,

    /// Seeds weight initialisation, exploration and replay sampling.
    pub seed: u64,

    pub rewards: RewardConfig,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            hidden_size: 256,
            learning_rate: 0.001,
            optimizer: OptimizerKind::Adam,
            loss: LossKind::MeanSquared,
            gamma: 0.9,
            replay_capacity: 100_000,
            batch_size: 64,
            epsilon_start: 1.0,
            epsilon_floor: 0.01,
            epsilon_decay_steps: 200,
            target_sync_episodes: 10,
            seed: 0,
            rewards: RewardConfig::default(),
        }
    }
}
