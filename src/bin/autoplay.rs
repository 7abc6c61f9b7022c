use gridsnake::{Agent, AgentConfig, Controller, GridWorld, Mode, Planner, PlannerConfig, Scoreboard, SnakeGame};

use anyhow::Context;
use std::fs::File;
use std::io::BufReader;
use tracing::{debug, info};

const WIDTH: i32 = 27;
const HEIGHT: i32 = 21;
const GAMES_PER_MODE: u64 = 10;
const MAX_STEPS_PER_GAME: usize = 20_000;
const MODEL_PATH: &str = "input/snake_agent.bin";
const SCOREBOARD_PATH: &str = "input/scoreboard.json";

fn read_config(path: &str) -> anyhow::Result<PlannerConfig> {
    let file = File::open(path).with_context(|| format!("opening planner config {}", path))?;
    serde_json::from_reader(BufReader::new(file)).with_context(|| format!("parsing planner config {}", path))
}

/// Plays one game to the end (or the step limit) and returns its score.
fn play(controller: &mut Controller, mode: Mode, seed: u64) -> u32 {
    let mut game = SnakeGame::new(WIDTH, HEIGHT, seed);
    for _ in 0..MAX_STEPS_PER_GAME {
        let Some(direction) = controller.choose_direction(mode, &game) else {
            debug!(%mode, head = ?game.head_position(), "no safe move left");
            break;
        };
        if game.step(direction).terminal {
            break;
        }
    }
    game.score()
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()))
        .init();

    let planner_config = match std::env::args().nth(1) {
        Some(path) => read_config(&path)?,
        None => PlannerConfig::default(),
    };
    let agent = Agent::load_or_new(MODEL_PATH, AgentConfig::default());
    let mut controller = Controller::new(Planner::new(&planner_config), agent);
    let mut scoreboard = Scoreboard::load(SCOREBOARD_PATH);

    for mode in [Mode::Planner, Mode::Learning] {
        for seed in 0..GAMES_PER_MODE {
            let score = play(&mut controller, mode, seed);
            info!(%mode, seed, score, "game over");
            scoreboard.record(mode, score);
        }
    }

    for (mode, stats) in scoreboard.iter() {
        info!(
            %mode,
            runs = stats.runs,
            best = stats.highest_score,
            average = stats.average_score(),
            "scoreboard"
        );
    }
    scoreboard.save(SCOREBOARD_PATH).with_context(|| format!("saving scoreboard to {}", SCOREBOARD_PATH))?;
    Ok(())
}
