use crate::controller::Mode;
use crate::error::Result;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tracing::{info, warn};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ModeStats {
    pub runs: u32,
    pub highest_score: u32,
    pub total_score: u64,
    pub last_score: u32,
}

impl ModeStats {
    pub fn average_score(&self) -> f64 {
        if self.runs == 0 {
            0.0
        } else {
            self.total_score as f64 / self.runs as f64
        }
    }

    fn record(&mut self, score: u32) {
        self.runs += 1;
        self.total_score += u64::from(score);
        self.highest_score = self.highest_score.max(score);
        self.last_score = score;
    }
}

/// Per-mode results, persisted as JSON between runs.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Scoreboard {
    modes: BTreeMap<Mode, ModeStats>,
}

impl Scoreboard {
    pub fn record(&mut self, mode: Mode, score: u32) {
        self.modes.entry(mode).or_default().record(score);
    }

    pub fn get(&self, mode: Mode) -> Option<&ModeStats> {
        self.modes.get(&mode)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Mode, &ModeStats)> {
        self.modes.iter()
    }

    /// Reads a scoreboard; an absent or unreadable file gives an empty one.
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) => {
                info!(path = %path.display(), error = %e, "no scoreboard yet");
                return Self::default();
            }
        };
        match serde_json::from_reader(BufReader::new(file)) {
            Ok(board) => board,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "discarding corrupt scoreboard");
                Self::default()
            }
        }
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }
}
