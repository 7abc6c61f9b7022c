use gridsnake::{Agent, AgentConfig, GridWorld, SnakeGame};

use anyhow::Context;
use serde::Serialize;
use std::fs::File;
use std::io::BufReader;
use tracing::info;

const WIDTH: i32 = 27;
const HEIGHT: i32 = 21;
const EPISODES: usize = 100;
const MAX_STEPS_PER_EPISODE: usize = 5_000;
const MODEL_PATH: &str = "input/snake_agent.bin";
const TELEMETRY_PATH: &str = "input/training.csv";

#[derive(Serialize)]
struct EpisodeRow {
    episode: usize,
    score: u32,
    steps: usize,
    total_reward: f32,
    epsilon: f32,
    loss: Option<f32>,
}

fn read_config(path: &str) -> anyhow::Result<AgentConfig> {
    let file = File::open(path).with_context(|| format!("opening agent config {}", path))?;
    serde_json::from_reader(BufReader::new(file)).with_context(|| format!("parsing agent config {}", path))
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()))
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => read_config(&path)?,
        None => AgentConfig::default(),
    };
    let mut game = SnakeGame::new(WIDTH, HEIGHT, config.seed);
    let mut agent = Agent::load_or_new(MODEL_PATH, config);

    if let Some(parent) = std::path::Path::new(TELEMETRY_PATH).parent() {
        std::fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    let mut telemetry = csv::Writer::from_path(TELEMETRY_PATH)
        .with_context(|| format!("opening telemetry file {}", TELEMETRY_PATH))?;

    info!(episodes = EPISODES, width = WIDTH, height = HEIGHT, "starting training");
    for episode in 1..=EPISODES {
        game.reset();
        agent.reset();

        let mut total_reward = 0.0;
        let mut steps = 0;
        while steps < MAX_STEPS_PER_EPISODE {
            let report = agent.tick(&mut game);
            total_reward += report.reward;
            steps += 1;
            if report.terminal {
                break;
            }
        }
        // an episode cut off by the step limit still gets its replay update
        agent.stop();

        let row = EpisodeRow {
            episode,
            score: game.score(),
            steps,
            total_reward,
            epsilon: agent.epsilon(),
            loss: agent.last_loss(),
        };
        info!(
            episode,
            score = row.score,
            total_reward,
            epsilon = row.epsilon,
            head = ?game.head_position(),
            "episode done"
        );
        telemetry.serialize(&row).context("writing telemetry row")?;
    }
    telemetry.flush().context("flushing telemetry")?;

    agent.store(MODEL_PATH).with_context(|| format!("saving model to {}", MODEL_PATH))?;
    info!("training finished");
    Ok(())
}
