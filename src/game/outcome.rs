use chess::BoardStatus;
use log::debug;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::game::board::{Board, Color};

/// How a game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outcome {
    Checkmate { winner: Color },
    Stalemate,
    Resignation { loser: Color },
    Timeout { loser: Color },
}

impl Outcome {
    pub fn winner(&self) -> Option<Color> {
        match *self {
            Outcome::Checkmate { winner } => Some(winner),
            Outcome::Stalemate => None,
            Outcome::Resignation { loser } | Outcome::Timeout { loser } => Some(loser.opponent()),
        }
    }

    /// Status string sent to clients.
    pub fn status(&self) -> &'static str {
        match self.winner() {
            Some(Color::White) => "white_wins",
            Some(Color::Black) => "black_wins",
            None => "draw",
        }
    }

    pub fn reason(&self) -> &'static str {
        match self {
            Outcome::Checkmate { .. } => "checkmate",
            Outcome::Stalemate => "stalemate",
            Outcome::Resignation { .. } => "resignation",
            Outcome::Timeout { .. } => "timeout",
        }
    }
}

/// Status of a position as seen by the `chess` crate, or `None` when the
/// crate refuses the position (missing king, both sides in check, ...).
/// The permissive rules here can reach positions it considers unreachable.
fn crate_status(board: &Board, side_to_move: Color) -> Option<(BoardStatus, bool)> {
    let fen = board.to_fen(side_to_move);
    match chess::Board::from_str(&fen) {
        Ok(position) => Some((position.status(), position.checkers().popcnt() > 0)),
        Err(e) => {
            debug!("Position {} not evaluated: {}", fen, e);
            None
        }
    }
}

/// Whether `color`'s king is attacked, with `color` to move.
pub fn in_check(board: &Board, color: Color) -> bool {
    crate_status(board, color).is_some_and(|(_, check)| check)
}

/// Outcome reached after `mover` played into `board`, if any.
pub fn detect(board: &Board, mover: Color) -> Option<Outcome> {
    let defender = mover.opponent();
    if board.king_square(defender).is_none() {
        return Some(Outcome::Checkmate { winner: mover });
    }
    if board.king_square(mover).is_none() {
        return Some(Outcome::Checkmate { winner: defender });
    }

    match crate_status(board, defender)?.0 {
        BoardStatus::Checkmate => Some(Outcome::Checkmate { winner: mover }),
        BoardStatus::Stalemate => Some(Outcome::Stalemate),
        BoardStatus::Ongoing => None,
    }
}

/// Status string for a running game, in the same vocabulary as
/// [`Outcome::status`].
pub fn game_status(board: &Board, turn: Color, outcome: Option<Outcome>) -> String {
    match outcome {
        Some(outcome) => outcome.status().to_string(),
        None if in_check(board, turn) => "check".to_string(),
        None => format!("{}_turn", turn),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fools_mate_is_detected() {
        let (board, side) =
            Board::from_fen("rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w - - 1 3")
                .unwrap();
        assert_eq!(side, Color::White);
        assert_eq!(
            detect(&board, Color::Black),
            Some(Outcome::Checkmate {
                winner: Color::Black
            })
        );
        assert!(in_check(&board, Color::White));
        assert_eq!(game_status(&board, Color::White, None), "check");
    }

    #[test]
    fn stalemate_is_detected() {
        let (board, _) = Board::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
        assert_eq!(detect(&board, Color::White), Some(Outcome::Stalemate));
    }

    #[test]
    fn captured_king_ends_the_game() {
        let (board, _) = Board::from_fen("4k3/8/8/8/8/8/8/7r w - - 0 1").unwrap();
        assert_eq!(
            detect(&board, Color::Black),
            Some(Outcome::Checkmate {
                winner: Color::Black
            })
        );
    }

    #[test]
    fn quiet_positions_have_no_outcome() {
        let board = Board::initial();
        assert_eq!(detect(&board, Color::Black), None);
        assert_eq!(game_status(&board, Color::White, None), "white_turn");
    }

    #[test]
    fn outcome_winners() {
        assert_eq!(
            Outcome::Timeout {
                loser: Color::White
            }
            .winner(),
            Some(Color::Black)
        );
        assert_eq!(
            Outcome::Resignation {
                loser: Color::Black
            }
            .status(),
            "white_wins"
        );
        assert_eq!(Outcome::Stalemate.status(), "draw");
    }
}
