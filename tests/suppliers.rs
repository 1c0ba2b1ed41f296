use async_trait::async_trait;
use chess_rush::error::SupplierError;
use chess_rush::suppliers::{
    fetch_analysis, fetch_bot, BotCreationSupplier, BotRequest, CustomBot, GameAnalysis,
    GameAnalysisSupplier, InFlight, KeyMoment, MoveClassification, PhaseAccuracy,
};

/// Classifies every move as "best".
struct Flattering;

#[async_trait]
impl GameAnalysisSupplier for Flattering {
    async fn analyze(&self, moves: Vec<String>) -> Result<GameAnalysis, SupplierError> {
        Ok(GameAnalysis {
            classifications: vec![MoveClassification::Best; moves.len()],
            accuracy: PhaseAccuracy {
                opening: 100.0,
                middlegame: 98.5,
                endgame: 97.0,
            },
            key_moments: vec![
                KeyMoment {
                    ply: 0,
                    note: "solid start".to_string(),
                },
                KeyMoment {
                    ply: moves.len() - 1,
                    note: "finished cleanly".to_string(),
                },
            ],
        })
    }
}

/// Forgets to classify the last move.
struct Sloppy;

#[async_trait]
impl GameAnalysisSupplier for Sloppy {
    async fn analyze(&self, moves: Vec<String>) -> Result<GameAnalysis, SupplierError> {
        let mut analysis = Flattering.analyze(moves).await?;
        analysis.classifications.pop();
        Ok(analysis)
    }
}

struct Workshop {
    rating: u32,
}

#[async_trait]
impl BotCreationSupplier for Workshop {
    async fn create(&self, request: BotRequest) -> Result<CustomBot, SupplierError> {
        Ok(CustomBot {
            name: request.name,
            rating: self.rating,
            personality: request.style_prompt,
            avatar: "avatars/default.png".to_string(),
        })
    }
}

fn moves() -> Vec<String> {
    ["f3", "e5", "g4", "Qh4#"].iter().map(|m| m.to_string()).collect()
}

#[actix_rt::test]
async fn analysis_covers_every_move() {
    let analysis = fetch_analysis(&Flattering, moves()).await.unwrap();
    assert_eq!(analysis.classifications.len(), 4);
    assert_eq!(analysis.key_moments.len(), 2);
}

#[actix_rt::test]
async fn malformed_analysis_is_a_failure() {
    let result = fetch_analysis(&Sloppy, moves()).await;
    assert!(matches!(result, Err(SupplierError::Malformed { .. })));
}

#[actix_rt::test]
async fn empty_games_are_not_sent_for_analysis() {
    let result = fetch_analysis(&Flattering, Vec::new()).await;
    assert!(matches!(result, Err(SupplierError::Failed { .. })));
}

#[actix_rt::test]
async fn bots_are_validated() {
    let request = BotRequest {
        name: "Tal".to_string(),
        style_prompt: "sacrifices everything".to_string(),
    };
    let bot = fetch_bot(&Workshop { rating: 1500 }, request.clone())
        .await
        .unwrap();
    assert_eq!(bot.name, "Tal");
    assert_eq!(bot.rating, 1500);

    let unrated = fetch_bot(&Workshop { rating: 0 }, request).await;
    assert!(matches!(unrated, Err(SupplierError::Malformed { .. })));

    let nameless = BotRequest {
        name: "  ".to_string(),
        style_prompt: String::new(),
    };
    assert!(fetch_bot(&Workshop { rating: 900 }, nameless).await.is_err());
}

#[actix_rt::test]
async fn cancelled_analysis_never_delivers() {
    let mut slot = InFlight::analysis();
    let pending = slot
        .launch(async { fetch_analysis(&Flattering, moves()).await })
        .unwrap();
    assert!(slot.is_busy());
    slot.cancel();
    assert!(pending.await.is_err());

    let pending = slot
        .launch(async { fetch_analysis(&Flattering, moves()).await })
        .unwrap();
    let delivered = pending.await.unwrap();
    slot.settle();
    assert!(delivered.is_ok());
    assert!(!slot.is_busy());
}

#[test]
fn analysis_wire_format() {
    let json = r#"{
        "classifications": ["book", "blunder"],
        "accuracy": {"opening": 88.0, "middlegame": 40.0, "endgame": 0.0},
        "key_moments": [{"ply": 0, "note": "a"}, {"ply": 1, "note": "b"}]
    }"#;
    let analysis: GameAnalysis = serde_json::from_str(json).unwrap();
    assert_eq!(
        analysis.classifications,
        vec![MoveClassification::Book, MoveClassification::Blunder]
    );
    assert!(analysis.validate(2).is_ok());
}
