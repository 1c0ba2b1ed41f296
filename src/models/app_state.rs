use actix::Addr;
use log::info;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::config::Config;
use crate::game::bots::{BotLadder, JsonFileTierStore, MemoryTierStore, TierStore};
use crate::game::puzzle::PuzzleCatalog;
use crate::suppliers::{
    BotCreationSupplier, CatalogSequence, GameAnalysisSupplier, PuzzleSequenceSupplier,
    Unconfigured,
};
use crate::websocket::ChessWebSocket;

/// Application state shared between connections
pub struct AppState {
    pub config: Config,
    pub sessions: Mutex<HashMap<String, Addr<ChessWebSocket>>>,
    pub catalog: Arc<PuzzleCatalog>,
    pub ladder: BotLadder,
    pub sequence: Arc<dyn PuzzleSequenceSupplier>,
    pub analysis: Arc<dyn GameAnalysisSupplier>,
    pub bot_creation: Arc<dyn BotCreationSupplier>,
    pub tier_store: Arc<dyn TierStore>,
}

impl AppState {
    /// Built-in catalog and ladder; analysis and bot creation are not
    /// wired to anything.
    pub fn new(config: Config) -> Self {
        let catalog = Arc::new(PuzzleCatalog::builtin());
        let tier_store: Arc<dyn TierStore> = match &config.tier_store {
            Some(path) => {
                info!("Bot progression stored in {}", path.display());
                Arc::new(JsonFileTierStore::new(path))
            }
            None => Arc::new(MemoryTierStore::default()),
        };
        Self {
            sessions: Mutex::new(HashMap::new()),
            sequence: Arc::new(CatalogSequence::new(Arc::clone(&catalog))),
            catalog,
            ladder: BotLadder::default(),
            analysis: Arc::new(Unconfigured),
            bot_creation: Arc::new(Unconfigured),
            tier_store,
            config,
        }
    }
}
