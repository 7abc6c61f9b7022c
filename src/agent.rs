pub mod config;
pub mod epsilon;
pub mod features;
pub mod replaybuffer;

use config::{AgentConfig, LossKind, OptimizerKind};
use epsilon::EpsilonSchedule;
use features::{ACTION_SIZE, STATE_SIZE, StateVector, Transition};
use replaybuffer::ReplayBuffer;
use crate::error::{Error, Result};
use crate::grid::{Direction, GridWorld};
use crate::sequential::{
    tensor::Tensor,
    layer::{Dense, Layer, ReLU},
    loss::{Huber, Loss, MeanSquaredError},
    optimizer::{Adam, Optimizer, SGD},
    Sequential
};

use bincode::Options;
use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use tracing::{debug, info, warn};

// upper bound on a checkpoint read, so a corrupt length prefix fails instead of allocating
const MAX_CHECKPOINT_BYTES: u64 = 256 * 1024 * 1024;

fn checkpoint_codec() -> impl Options {
    bincode::DefaultOptions::new().with_limit(MAX_CHECKPOINT_BYTES)
}

/// Where the current episode is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpisodeState {
    Idle,
    Running,
    Terminal,
}

/// What one `tick` did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    pub direction: Direction,
    pub reward: f32,
    pub terminal: bool,
    pub loss: f32,
}

/// Deep Q-learning controller with an online and a target network.
pub struct Agent {
    q_network: Sequential,
    target_network: Sequential,
    replay_buffer: ReplayBuffer,
    epsilon: EpsilonSchedule,
    config: AgentConfig,
    rng: StdRng,

    state: EpisodeState,
    episodes_completed: usize,
    last_loss: Option<f32>,
}

impl Agent {
    pub fn new(config: AgentConfig) -> Self {
        let mut rng = StdRng::seed_from_u64(config.seed);
        let q_network = Self::build_network(&config, &mut rng);
        Self::from_network(q_network, config, rng)
    }

    fn build_network(config: &AgentConfig, rng: &mut StdRng) -> Sequential {
        let layers: Vec<Box<dyn Layer>> = vec![
            Box::new(Dense::new(STATE_SIZE, config.hidden_size, rng)),
            Box::new(ReLU::new()),
            Box::new(Dense::new(config.hidden_size, ACTION_SIZE, rng))
        ];
        let (loss, optimizer) = Self::build_training(config);
        Sequential::new(layers, loss, optimizer)
    }

    fn build_training(config: &AgentConfig) -> (Box<dyn Loss>, Box<dyn Optimizer>) {
        let loss: Box<dyn Loss> = match config.loss {
            LossKind::MeanSquared => Box::new(MeanSquaredError),
            LossKind::Huber => Box::new(Huber::new(1.0)),
        };
        let optimizer: Box<dyn Optimizer> = match config.optimizer {
            OptimizerKind::Sgd => Box::new(SGD::new(config.learning_rate)),
            OptimizerKind::Adam => Box::new(Adam::new(config.learning_rate)),
        };
        (loss, optimizer)
    }

    fn from_network(q_network: Sequential, config: AgentConfig, rng: StdRng) -> Self {
        let target_network = q_network.clone();
        Self {
            q_network,
            target_network,
            replay_buffer: ReplayBuffer::new(config.replay_capacity),
            epsilon: EpsilonSchedule::new(config.epsilon_start, config.epsilon_floor, config.epsilon_decay_steps),
            rng,
            config,
            state: EpisodeState::Idle,
            episodes_completed: 0,
            last_loss: None,
        }
    }

    pub fn state(&self) -> EpisodeState {
        self.state
    }

    pub fn epsilon(&self) -> f32 {
        self.epsilon.value()
    }

    pub fn last_loss(&self) -> Option<f32> {
        self.last_loss
    }

    pub fn episodes_completed(&self) -> usize {
        self.episodes_completed
    }

    pub fn replay_len(&self) -> usize {
        self.replay_buffer.len()
    }

    /// Q-values of the online network for one state.
    pub fn q_values(&mut self, state: &StateVector) -> Vec<f32> {
        self.q_network.predict(&state.to_tensor()).data().to_vec()
    }

    /// Highest-valued action, lowest index on ties.
    pub fn greedy_action(&mut self, state: &StateVector) -> Direction {
        let q_values = self.q_network.predict(&state.to_tensor());
        Direction::from_index(q_values.row_argmax()[0])
    }

    pub fn select_action(&mut self, state: &StateVector) -> Direction {
        if self.rng.random::<f32>() < self.epsilon.value() {
            Direction::from_index(self.rng.random_range(0..ACTION_SIZE))
        } else {
            self.greedy_action(state)
        }
    }

    /// Plays one move in `world`, learns from it and stores the transition.
    ///
    /// Panics if the episode is already terminal; call [`Agent::reset`] first.
    pub fn tick<W: GridWorld + ?Sized>(&mut self, world: &mut W) -> TickReport {
        assert_ne!(self.state, EpisodeState::Terminal, "tick on a finished episode, reset the agent first");
        self.state = EpisodeState::Running;

        let state = StateVector::encode(world);
        let direction = self.select_action(&state);
        let previous_head = world.head_position();
        let goal = world.goal_position();

        let outcome = world.step(direction);
        let reward = features::reward(&self.config.rewards, outcome.terminal, previous_head, outcome.head, goal);
        let next_state = StateVector::encode(world);

        let transition = Transition::new(state, direction.index(), reward, next_state, outcome.terminal);
        let loss = self.train_single(&transition);
        self.replay_buffer.add(transition);

        if outcome.terminal {
            self.finish_episode();
        }

        TickReport {
            direction,
            reward,
            terminal: outcome.terminal,
            loss,
        }
    }

    /// Ends a running episode without a collision.
    pub fn stop(&mut self) {
        if self.state == EpisodeState::Running {
            self.finish_episode();
        }
    }

    pub fn reset(&mut self) {
        self.state = EpisodeState::Idle;
    }

    fn finish_episode(&mut self) {
        self.state = EpisodeState::Terminal;
        let replay_loss = self.train_batch();
        self.epsilon.decay();
        self.episodes_completed += 1;

        if self.config.target_sync_episodes > 0 && self.episodes_completed % self.config.target_sync_episodes == 0 {
            self.sync_target();
        }
        debug!(
            episode = self.episodes_completed,
            epsilon = self.epsilon.value(),
            replay_loss = ?replay_loss,
            "episode finished"
        );
    }

    /// Single-transition update of the online network.
    pub fn train_single(&mut self, transition: &Transition) -> f32 {
        self.fit(&[transition])
    }

    /// One update on a uniformly sampled batch. `None` while the buffer is
    /// still smaller than the batch size.
    pub fn train_batch(&mut self) -> Option<f32> {
        let batch_size = self.config.batch_size;
        let batch: Vec<Transition> = match self.replay_buffer.sample(batch_size, &mut self.rng) {
            Ok(batch) => batch.into_iter().cloned().collect(),
            Err(Error::InsufficientData { available, .. }) => {
                debug!(available, batch_size, "skipping replay update");
                return None;
            }
            Err(e) => {
                warn!("replay sampling failed: {}", e);
                return None;
            }
        };
        let batch: Vec<&Transition> = batch.iter().collect();
        Some(self.fit(&batch))
    }

    // TD targets come from the target network; only the taken action's
    // column differs from the online prediction
    fn fit(&mut self, batch: &[&Transition]) -> f32 {
        let states = Tensor::from_rows(batch.iter().map(|t| t.state.values()), STATE_SIZE);
        let next_states = Tensor::from_rows(batch.iter().map(|t| t.next_state.values()), STATE_SIZE);

        let max_next_q = self.target_network.predict(&next_states).row_max();
        let mut q_targets = self.q_network.predict(&states);

        for (i, transition) in batch.iter().enumerate() {
            let target = if transition.terminal {
                transition.reward
            } else {
                transition.reward + self.config.gamma * max_next_q[i]
            };
            q_targets.set(i, transition.action, target);
        }

        let loss = self.q_network.train_on_batch(&states, &q_targets);
        self.last_loss = Some(loss);
        loss
    }

    /// Copies the online weights into the target network.
    pub fn sync_target(&mut self) {
        self.target_network.copy_weights_from(&self.q_network);
        info!(episode = self.episodes_completed, "target network synced");
    }

    pub fn target_in_sync(&self) -> bool {
        self.target_network.same_weights(&self.q_network)
    }

    /// Writes the online network to `path`.
    pub fn store<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let mut writer = BufWriter::new(File::create(path)?);
        checkpoint_codec().serialize_into(&mut writer, &self.q_network)?;
        writer.flush()?;
        info!(path = %path.display(), "saved agent weights");
        Ok(())
    }

    /// Restores an agent from a file written by [`Agent::store`]. Loss and
    /// optimizer come from `config`; exploration starts at the configured floor.
    pub fn load<P: AsRef<Path>>(path: P, config: AgentConfig) -> Result<Self> {
        let path = path.as_ref();
        let reader = BufReader::new(File::open(path)?);
        let agent = Self::restore(Self::decode_network(reader)?, config);
        info!(path = %path.display(), "loaded agent weights");
        Ok(agent)
    }

    // decodes a checkpoint and rejects networks that would not fit the state and action shapes
    fn decode_network<R: Read>(reader: R) -> Result<Sequential> {
        let q_network: Sequential = checkpoint_codec().deserialize_from(reader)?;

        let found_inputs = q_network.input_size().unwrap_or(0);
        let found_outputs = q_network.output_size().unwrap_or(0);
        if found_inputs != STATE_SIZE || found_outputs != ACTION_SIZE {
            return Err(Error::IncompatibleModel {
                expected_inputs: STATE_SIZE,
                expected_outputs: ACTION_SIZE,
                found_inputs,
                found_outputs,
            });
        }
        q_network.check_shapes()?;
        Ok(q_network)
    }

    fn restore(mut q_network: Sequential, config: AgentConfig) -> Self {
        let (loss, optimizer) = Self::build_training(&config);
        q_network.loss = loss;
        q_network.optimizer = optimizer;

        let rng = StdRng::seed_from_u64(config.seed);
        let mut agent = Self::from_network(q_network, config, rng);
        agent.epsilon.exhaust();
        agent
    }

    /// [`Agent::load`], falling back to fresh weights when the file is
    /// missing or unreadable.
    pub fn load_or_new<P: AsRef<Path>>(path: P, config: AgentConfig) -> Self {
        let path = path.as_ref();
        match Self::load(path, config.clone()) {
            Ok(agent) => agent,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "could not load agent, starting fresh");
                Self::new(config)
            }
        }
    }
}
