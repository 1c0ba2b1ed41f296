//! Bot opponents and the unlock ladder.
//!
//! Progression is a plain value; where it is kept is up to the injected
//! [`TierStore`].

use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::error::StoreError;
use crate::game::board::Color;
use crate::game::outcome::Outcome;

/// One rung of the ladder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotTier {
    pub name: String,
    pub rating: u32,
}

/// Tiers in strictly increasing rating order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotLadder {
    tiers: Vec<BotTier>,
}

impl BotLadder {
    /// Sorts by rating and drops duplicate ratings.
    pub fn new(mut tiers: Vec<BotTier>) -> Self {
        tiers.sort_by_key(|t| t.rating);
        tiers.dedup_by_key(|t| t.rating);
        Self { tiers }
    }

    pub fn tiers(&self) -> &[BotTier] {
        &self.tiers
    }

    pub fn first_rating(&self) -> u32 {
        self.tiers.first().map(|t| t.rating).unwrap_or_default()
    }

    /// The tier directly above `rating`, if any.
    pub fn next_above(&self, rating: u32) -> Option<&BotTier> {
        self.tiers.iter().find(|t| t.rating > rating)
    }

    pub fn get(&self, rating: u32) -> Option<&BotTier> {
        self.tiers.iter().find(|t| t.rating == rating)
    }

    /// Tiers a player at `unlocked_rating` may challenge.
    pub fn unlocked(&self, unlocked_rating: u32) -> impl Iterator<Item = &BotTier> {
        self.tiers.iter().filter(move |t| t.rating <= unlocked_rating)
    }
}

impl Default for BotLadder {
    fn default() -> Self {
        let tiers = [
            ("Pawnstorm", 250),
            ("Rookie", 400),
            ("Knightly", 600),
            ("Bishop Bell", 800),
            ("Castellan", 1000),
            ("Queen's Gambit", 1200),
            ("Zugzwang", 1500),
            ("Endgame Oracle", 1800),
            ("Grandmaster Grey", 2000),
            ("Deep Rook", 2200),
        ];
        Self::new(
            tiers
                .iter()
                .map(|(name, rating)| BotTier {
                    name: name.to_string(),
                    rating: *rating,
                })
                .collect(),
        )
    }
}

/// A bot opponent for a game, either from the ladder or custom made.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Opponent {
    pub name: String,
    pub rating: u32,
    pub human_color: Color,
}

/// The unlock frontier for one player. Only ever moves up, one tier at a
/// time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierProgression {
    pub unlocked_rating: u32,
}

impl TierProgression {
    pub fn new(unlocked_rating: u32) -> Self {
        Self { unlocked_rating }
    }

    pub fn starting(ladder: &BotLadder) -> Self {
        Self::new(ladder.first_rating())
    }

    /// Fold a finished game into the progression. Returns the new frontier
    /// when it moved.
    pub fn record_result(
        &mut self,
        ladder: &BotLadder,
        outcome: Outcome,
        human_color: Color,
        bot_rating: u32,
    ) -> Option<u32> {
        if outcome.winner() != Some(human_color) || bot_rating != self.unlocked_rating {
            return None;
        }
        let next = ladder.next_above(self.unlocked_rating)?;
        self.unlocked_rating = next.rating;
        info!("Unlocked bot tier {} ({})", next.name, next.rating);
        Some(next.rating)
    }
}

/// Where the frontier lives between sessions.
pub trait TierStore: Send + Sync {
    /// `None` when nothing was stored yet.
    fn load(&self) -> Result<Option<u32>, StoreError>;
    fn save(&self, unlocked_rating: u32) -> Result<(), StoreError>;
}

#[derive(Debug, Default)]
pub struct MemoryTierStore {
    value: Mutex<Option<u32>>,
}

impl TierStore for MemoryTierStore {
    fn load(&self) -> Result<Option<u32>, StoreError> {
        self.value.lock().map(|v| *v).map_err(|_| StoreError::Poisoned)
    }

    fn save(&self, unlocked_rating: u32) -> Result<(), StoreError> {
        let mut value = self.value.lock().map_err(|_| StoreError::Poisoned)?;
        *value = Some(unlocked_rating);
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredTier {
    unlocked_rating: u32,
}

/// `{"unlocked_rating": n}` in a JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileTierStore {
    path: PathBuf,
}

impl JsonFileTierStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TierStore for JsonFileTierStore {
    fn load(&self) -> Result<Option<u32>, StoreError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let text = fs::read_to_string(&self.path)?;
        let stored: StoredTier = serde_json::from_str(&text)?;
        Ok(Some(stored.unlocked_rating))
    }

    fn save(&self, unlocked_rating: u32) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let text = serde_json::to_string_pretty(&StoredTier { unlocked_rating })?;
        fs::write(&self.path, text)?;
        Ok(())
    }
}

/// Load the frontier, falling back to the ladder's first tier. A stored
/// value below the ladder is lifted to it.
pub fn load_progression(store: &dyn TierStore, ladder: &BotLadder) -> TierProgression {
    match store.load() {
        Ok(Some(rating)) => TierProgression::new(rating.max(ladder.first_rating())),
        Ok(None) => TierProgression::starting(ladder),
        Err(e) => {
            warn!("Could not read bot progression: {}", e);
            TierProgression::starting(ladder)
        }
    }
}

/// Record a result and persist the frontier if it moved. A failed write is
/// logged; the in-memory value still advances.
pub fn record_and_persist(
    store: &dyn TierStore,
    ladder: &BotLadder,
    progression: &mut TierProgression,
    outcome: Outcome,
    opponent: &Opponent,
) -> Option<u32> {
    let unlocked =
        progression.record_result(ladder, outcome, opponent.human_color, opponent.rating)?;
    if let Err(e) = store.save(unlocked) {
        warn!("Could not save bot progression: {}", e);
    }
    Some(unlocked)
}
