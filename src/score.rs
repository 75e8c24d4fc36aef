//! Session score, pass detection and the persisted best score.

use crate::error::Result;
use crate::obstacles::ObstaclePair;
use log::{debug, warn};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io;
use std::path::PathBuf;

pub const BEST_SCORE_KEY: &str = "BestScore";

/// A tiny persistent slot store: named integers, absent keys read as zero.
pub trait ScoreStore {
    fn integer(&self, key: &str) -> u32;
    fn set_integer(&mut self, key: &str, value: u32) -> Result<()>;
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    values: HashMap<String, u32>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ScoreStore for MemoryStore {
    fn integer(&self, key: &str) -> u32 {
        self.values.get(key).copied().unwrap_or(0)
    }

    fn set_integer(&mut self, key: &str, value: u32) -> Result<()> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }
}

/// Keeps the slots as a pretty-printed JSON object and rewrites the file on
/// every set.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    values: BTreeMap<String, u32>,
}

impl JsonFileStore {
    /// Opens the store at `path`. A missing file is an empty store; an
    /// unreadable one is an error.
    pub fn open(path: PathBuf) -> Result<Self> {
        let values = match fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text)?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        debug!("Opened score store at {}", path.display());
        Ok(Self { path, values })
    }
}

impl ScoreStore for JsonFileStore {
    fn integer(&self, key: &str) -> u32 {
        self.values.get(key).copied().unwrap_or(0)
    }

    fn set_integer(&mut self, key: &str, value: u32) -> Result<()> {
        self.values.insert(key.to_string(), value);
        let text = serde_json::to_string_pretty(&self.values)?;
        fs::write(&self.path, text)?;
        Ok(())
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ScoreTracker {
    score: u32,
}

impl ScoreTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn reset(&mut self) {
        self.score = 0;
    }

    /// Scores every pair the player is now strictly past. Each pair counts
    /// once; returns how many were scored this call.
    pub fn update(&mut self, player_x: f64, pairs: &mut [ObstaclePair]) -> u32 {
        let mut scored = 0;
        for pair in pairs.iter_mut().filter(|p| !p.passed) {
            if player_x > pair.trailing_edge() {
                pair.passed = true;
                self.score += 1;
                scored += 1;
                debug!("Passed obstacle pair {}, score {}", pair.id, self.score);
            }
        }
        scored
    }

    /// Writes the session score as the new best if it beats the stored one.
    /// Returns the best score to display. A failed write is logged and the
    /// displayed best still reflects this session.
    pub fn record_best(&self, store: &mut dyn ScoreStore) -> u32 {
        let best = store.integer(BEST_SCORE_KEY);
        if self.score <= best {
            return best;
        }
        if let Err(e) = store.set_integer(BEST_SCORE_KEY, self.score) {
            warn!("Could not save best score {}: {e}", self.score);
        }
        self.score
    }
}
