use async_trait::async_trait;
use chess_rush::error::{RushError, SupplierError};
use chess_rush::game::board::Square;
use chess_rush::game::puzzle::{Difficulty, Puzzle, PuzzleCatalog, PuzzleRecord};
use chess_rush::game::rush::{FinishReason, RushPhase, RushSession, RushTick};
use chess_rush::suppliers::{
    fetch_puzzles, CatalogSequence, PuzzleSequenceSupplier, SequenceRequest,
};
use std::sync::Arc;

fn sq(name: &str) -> Square {
    name.parse().unwrap()
}

fn back_rank(id: &str) -> Puzzle {
    Puzzle::try_from(PuzzleRecord {
        id: id.to_string(),
        fen: "6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1".to_string(),
        moves: vec!["a1a8".to_string()],
        rating: 700,
        difficulty: Difficulty::Easy,
        theme: "backRankMate".to_string(),
    })
    .unwrap()
}

fn queue(len: usize) -> Vec<Arc<Puzzle>> {
    (0..len)
        .map(|i| Arc::new(back_rank(&format!("p{}", i))))
        .collect()
}

fn request(count: usize) -> SequenceRequest {
    SequenceRequest {
        difficulty: Difficulty::Easy,
        count,
        player_rating: None,
    }
}

fn playing(duration_secs: u32, puzzles: Vec<Arc<Puzzle>>) -> (RushSession, uuid::Uuid) {
    let mut rush = RushSession::new(duration_secs);
    let req = rush.start(request(puzzles.len())).unwrap();
    rush.finish_loading(req.ticket, Ok(puzzles)).unwrap();
    (rush, req.ticket)
}

#[test]
fn correct_incorrect_correct_scores_two() {
    let (mut rush, _) = playing(180, queue(3));
    assert_eq!(rush.phase(), RushPhase::Playing);
    assert_eq!(rush.seconds_remaining(), 180);

    let first = rush.submit(sq("a1"), sq("a8")).unwrap();
    assert!(first.verdict.correct);
    let second = rush.submit(sq("a1"), sq("a7")).unwrap();
    assert!(!second.verdict.correct);
    assert_eq!(rush.current().unwrap().puzzle().id, "p2");
    let third = rush.submit(sq("a1"), sq("a8")).unwrap();
    assert!(third.finished);

    assert_eq!(rush.score(), 2);
    assert_eq!(rush.cursor(), 3);
    assert_eq!(rush.phase(), RushPhase::Finished);
    assert_eq!(rush.finish_reason(), Some(FinishReason::QueueExhausted));
    assert!(rush.seconds_remaining() > 0);

    let marks: Vec<bool> = rush.attempts().iter().map(|a| a.correct).collect();
    assert_eq!(marks, vec![true, false, true]);
    assert_eq!(rush.attempts()[1].played, "Ra7");
}

#[test]
fn timer_ends_the_rush_regardless_of_cursor() {
    let (mut rush, ticket) = playing(180, queue(30));
    rush.submit(sq("a1"), sq("a8")).unwrap();

    let mut time_up = 0;
    for _ in 0..180 {
        if rush.tick(ticket) == RushTick::TimeUp {
            time_up += 1;
        }
    }
    assert_eq!(time_up, 1);
    assert_eq!(rush.phase(), RushPhase::Finished);
    assert_eq!(rush.finish_reason(), Some(FinishReason::TimeUp));
    assert_eq!(rush.cursor(), 1);
    assert_eq!(rush.seconds_remaining(), 0);

    assert_eq!(rush.tick(ticket), RushTick::Idle);
    assert!(matches!(
        rush.submit(sq("a1"), sq("a8")),
        Err(RushError::WrongPhase { .. })
    ));
}

#[test]
fn snapshot_is_frozen_until_restart() {
    let (mut rush, ticket) = playing(2, queue(5));
    rush.submit(sq("a1"), sq("a8")).unwrap();
    rush.tick(ticket);
    rush.tick(ticket);
    assert_eq!(rush.phase(), RushPhase::Finished);
    let (score, cursor) = (rush.score(), rush.cursor());

    rush.tick(ticket);
    assert_eq!((rush.score(), rush.cursor()), (score, cursor));

    rush.restart();
    assert_eq!(rush.phase(), RushPhase::Idle);
    assert_eq!(rush.score(), 0);
    assert_eq!(rush.seconds_remaining(), 0);
    assert!(rush.attempts().is_empty());
}

#[test]
fn a_new_run_ignores_ticks_of_the_old_one() {
    let (mut rush, old) = playing(60, queue(2));
    rush.restart();
    let req = rush.start(request(2)).unwrap();
    rush.finish_loading(req.ticket, Ok(queue(2))).unwrap();

    assert_eq!(rush.tick(old), RushTick::Stale);
    assert_eq!(rush.seconds_remaining(), 60);
    assert_eq!(
        rush.tick(req.ticket),
        RushTick::Running {
            seconds_remaining: 59
        }
    );
}

/// Returns a fixed list of ids, in order.
struct Fixed(Vec<&'static str>);

#[async_trait]
impl PuzzleSequenceSupplier for Fixed {
    async fn sequence(&self, _request: SequenceRequest) -> Result<Vec<String>, SupplierError> {
        Ok(self.0.iter().map(|id| id.to_string()).collect())
    }
}

struct Failing;

#[async_trait]
impl PuzzleSequenceSupplier for Failing {
    async fn sequence(&self, _request: SequenceRequest) -> Result<Vec<String>, SupplierError> {
        Err(SupplierError::Failed {
            supplier: "puzzle sequence",
            message: "service down".to_string(),
        })
    }
}

#[actix_rt::test]
async fn supplier_order_is_kept() {
    let catalog = PuzzleCatalog::builtin();
    let supplier = Fixed(vec!["smothered", "fools-mate", "missing", "back-rank"]);
    let puzzles = fetch_puzzles(&supplier, &catalog, request(4)).await.unwrap();
    let ids: Vec<&str> = puzzles.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["smothered", "fools-mate", "back-rank"]);

    let mut rush = RushSession::new(180);
    let req = rush.start(request(4)).unwrap();
    rush.finish_loading(req.ticket, Ok(puzzles)).unwrap();
    assert_eq!(rush.current().unwrap().puzzle().id, "smothered");
}

#[actix_rt::test]
async fn unresolvable_sequences_fail() {
    let catalog = PuzzleCatalog::builtin();
    let supplier = Fixed(vec!["nope", "also-nope"]);
    let result = fetch_puzzles(&supplier, &catalog, request(2)).await;
    assert!(matches!(result, Err(SupplierError::Malformed { .. })));

    let empty = Fixed(Vec::new());
    let result = fetch_puzzles(&empty, &catalog, request(2)).await;
    assert!(matches!(result, Err(SupplierError::Empty { .. })));
}

#[actix_rt::test]
async fn supplier_failure_returns_to_idle() {
    let catalog = PuzzleCatalog::builtin();
    let mut rush = RushSession::new(180);
    let req = rush.start(request(3)).unwrap();
    let result = fetch_puzzles(&Failing, &catalog, req.sequence).await;

    let err = rush.finish_loading(req.ticket, result).unwrap_err();
    assert!(matches!(err, RushError::Supplier(SupplierError::Failed { .. })));
    assert_eq!(rush.phase(), RushPhase::Idle);
    assert!(rush.current().is_none());
    assert!(rush.start(request(3)).is_ok());
}

#[actix_rt::test]
async fn catalog_sequence_prefers_nearby_ratings() {
    let catalog = Arc::new(PuzzleCatalog::builtin());
    let supplier = CatalogSequence::new(Arc::clone(&catalog));
    let nearby = SequenceRequest {
        difficulty: Difficulty::Medium,
        count: 2,
        player_rating: Some(1000),
    };
    let ids = supplier.sequence(nearby).await.unwrap();
    assert_eq!(ids[0], "royal-fork");
    assert_eq!(ids.len(), 2);

    let none = SequenceRequest {
        difficulty: Difficulty::Hard,
        count: 0,
        player_rating: None,
    };
    assert!(supplier.sequence(none).await.is_err());
}
