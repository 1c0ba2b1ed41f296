//! Boundaries to the external collaborators: puzzle sequencing, game
//! analysis and bot creation.
//!
//! Every call is a future the caller owns. [`InFlight`] keeps at most one
//! call per kind outstanding and lets the caller cancel it, so a response
//! that arrives after the caller moved on is dropped instead of applied.

use async_trait::async_trait;
use futures::future::{abortable, AbortHandle, Abortable};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;

use crate::error::SupplierError;
use crate::game::puzzle::{Difficulty, Puzzle, PuzzleCatalog};

const SEQUENCE: &str = "puzzle sequence";
const ANALYSIS: &str = "game analysis";
const BOT_CREATION: &str = "bot creation";

/// What a rush asks the sequence supplier for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceRequest {
    pub difficulty: Difficulty,
    pub count: usize,
    pub player_rating: Option<u32>,
}

/// Supplies an ordered list of puzzle ids.
#[async_trait]
pub trait PuzzleSequenceSupplier: Send + Sync {
    async fn sequence(&self, request: SequenceRequest) -> Result<Vec<String>, SupplierError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveClassification {
    Brilliant,
    Great,
    Best,
    Excellent,
    Good,
    Book,
    Inaccuracy,
    Mistake,
    Miss,
    Blunder,
}

/// Accuracy per phase, each 0-100.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhaseAccuracy {
    pub opening: f32,
    pub middlegame: f32,
    pub endgame: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyMoment {
    /// Zero-based index into the move list.
    pub ply: usize,
    pub note: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameAnalysis {
    pub classifications: Vec<MoveClassification>,
    pub accuracy: PhaseAccuracy,
    pub key_moments: Vec<KeyMoment>,
}

impl GameAnalysis {
    /// Check a supplier response against the move list it describes.
    pub fn validate(&self, move_count: usize) -> Result<(), SupplierError> {
        let malformed = |message: String| SupplierError::Malformed {
            supplier: ANALYSIS,
            message,
        };
        if self.classifications.len() != move_count {
            return Err(malformed(format!(
                "{} classifications for {} moves",
                self.classifications.len(),
                move_count
            )));
        }
        let PhaseAccuracy {
            opening,
            middlegame,
            endgame,
        } = self.accuracy;
        if [opening, middlegame, endgame]
            .iter()
            .any(|p| !(0.0..=100.0).contains(p))
        {
            return Err(malformed("accuracy outside 0-100".to_string()));
        }
        if !(2..=3).contains(&self.key_moments.len()) {
            return Err(malformed(format!(
                "{} key moments, expected 2 or 3",
                self.key_moments.len()
            )));
        }
        if let Some(moment) = self.key_moments.iter().find(|m| m.ply >= move_count) {
            return Err(malformed(format!("key moment at ply {}", moment.ply)));
        }
        Ok(())
    }
}

#[async_trait]
pub trait GameAnalysisSupplier: Send + Sync {
    /// `moves` are in standard algebraic notation.
    async fn analyze(&self, moves: Vec<String>) -> Result<GameAnalysis, SupplierError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotRequest {
    pub name: String,
    pub style_prompt: String,
}

/// An opponent synthesized from a style prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomBot {
    pub name: String,
    pub rating: u32,
    pub personality: String,
    pub avatar: String,
}

impl CustomBot {
    pub fn validate(&self) -> Result<(), SupplierError> {
        if self.name.trim().is_empty() || self.rating == 0 {
            return Err(SupplierError::Malformed {
                supplier: BOT_CREATION,
                message: format!("bot '{}' rated {}", self.name, self.rating),
            });
        }
        Ok(())
    }
}

#[async_trait]
pub trait BotCreationSupplier: Send + Sync {
    async fn create(&self, request: BotRequest) -> Result<CustomBot, SupplierError>;
}

/// Ask for a sequence and resolve it against the catalog, keeping the
/// supplier's order. Unknown ids are skipped; nothing resolvable is a
/// failure.
pub async fn fetch_puzzles(
    supplier: &dyn PuzzleSequenceSupplier,
    catalog: &PuzzleCatalog,
    request: SequenceRequest,
) -> Result<Vec<Arc<Puzzle>>, SupplierError> {
    let ids = supplier.sequence(request).await?;
    if ids.is_empty() {
        return Err(SupplierError::Empty { supplier: SEQUENCE });
    }

    let mut puzzles = Vec::with_capacity(ids.len());
    for id in &ids {
        match catalog.get(id) {
            Some(puzzle) => puzzles.push(puzzle),
            None => warn!("Sequence named unknown puzzle {}", id),
        }
    }
    if puzzles.is_empty() {
        return Err(SupplierError::Malformed {
            supplier: SEQUENCE,
            message: format!("none of {} ids resolved", ids.len()),
        });
    }
    debug!("Resolved {} of {} puzzles", puzzles.len(), ids.len());
    Ok(puzzles)
}

/// Run an analysis request and validate the response.
pub async fn fetch_analysis(
    supplier: &dyn GameAnalysisSupplier,
    moves: Vec<String>,
) -> Result<GameAnalysis, SupplierError> {
    if moves.is_empty() {
        return Err(SupplierError::Failed {
            supplier: ANALYSIS,
            message: "no moves to analyze".to_string(),
        });
    }
    let count = moves.len();
    let analysis = supplier.analyze(moves).await?;
    analysis.validate(count)?;
    Ok(analysis)
}

/// Run a bot creation request and validate the response.
pub async fn fetch_bot(
    supplier: &dyn BotCreationSupplier,
    request: BotRequest,
) -> Result<CustomBot, SupplierError> {
    if request.name.trim().is_empty() {
        return Err(SupplierError::Failed {
            supplier: BOT_CREATION,
            message: "a bot needs a name".to_string(),
        });
    }
    let bot = supplier.create(request).await?;
    bot.validate()?;
    Ok(bot)
}

/// The sequence supplier backed by the local catalog: filter by
/// difficulty, order by rating (closest to the player first when a rating
/// is given), take `count`.
pub struct CatalogSequence {
    catalog: Arc<PuzzleCatalog>,
}

impl CatalogSequence {
    pub fn new(catalog: Arc<PuzzleCatalog>) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl PuzzleSequenceSupplier for CatalogSequence {
    async fn sequence(&self, request: SequenceRequest) -> Result<Vec<String>, SupplierError> {
        let mut matching: Vec<&Arc<Puzzle>> = self
            .catalog
            .iter()
            .filter(|p| p.difficulty == request.difficulty)
            .collect();
        match request.player_rating {
            Some(rating) => matching.sort_by_key(|p| (p.rating.abs_diff(rating), p.rating)),
            None => matching.sort_by_key(|p| p.rating),
        }

        let ids: Vec<String> = matching
            .into_iter()
            .take(request.count)
            .map(|p| p.id.clone())
            .collect();
        if ids.is_empty() {
            return Err(SupplierError::Empty { supplier: SEQUENCE });
        }
        Ok(ids)
    }
}

/// Stand-in for a collaborator that is not wired up.
#[derive(Debug, Default, Clone, Copy)]
pub struct Unconfigured;

#[async_trait]
impl GameAnalysisSupplier for Unconfigured {
    async fn analyze(&self, _moves: Vec<String>) -> Result<GameAnalysis, SupplierError> {
        Err(SupplierError::Unavailable { supplier: ANALYSIS })
    }
}

#[async_trait]
impl BotCreationSupplier for Unconfigured {
    async fn create(&self, _request: BotRequest) -> Result<CustomBot, SupplierError> {
        Err(SupplierError::Unavailable {
            supplier: BOT_CREATION,
        })
    }
}

/// The single outstanding request of one kind for one session.
#[derive(Debug)]
pub struct InFlight {
    supplier: &'static str,
    handle: Option<AbortHandle>,
}

impl InFlight {
    pub fn new(supplier: &'static str) -> Self {
        Self {
            supplier,
            handle: None,
        }
    }

    pub fn sequence() -> Self {
        Self::new(SEQUENCE)
    }

    pub fn analysis() -> Self {
        Self::new(ANALYSIS)
    }

    pub fn bot_creation() -> Self {
        Self::new(BOT_CREATION)
    }

    pub fn is_busy(&self) -> bool {
        self.handle.is_some()
    }

    /// Wrap `fut` so it can be cancelled. Fails while another request of
    /// this kind is outstanding.
    pub fn launch<F: Future>(&mut self, fut: F) -> Result<Abortable<F>, SupplierError> {
        if self.is_busy() {
            return Err(SupplierError::Busy {
                supplier: self.supplier,
            });
        }
        let (fut, handle) = abortable(fut);
        self.handle = Some(handle);
        Ok(fut)
    }

    /// The request completed; its response may be applied.
    pub fn settle(&mut self) {
        self.handle = None;
    }

    /// Drop the outstanding request, if any. Its future resolves to
    /// `Err(Aborted)`.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            debug!("Cancelling {} request", self.supplier);
            handle.abort();
        }
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.cancel();
    }
}
