//! Move notation: coordinate form (`e2e4`) and standard algebraic
//! notation (`Nxf7+`).

use serde::{Deserialize, Serialize};

use crate::error::MoveError;
use crate::game::board::{Board, Piece, Square};
use crate::game::outcome::{detect, in_check, Outcome};
use crate::game::rules::rivals;

/// One applied move, as kept in the history log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRecord {
    pub from: Square,
    pub to: Square,
    pub piece: Piece,
    pub captured: Option<Piece>,
    pub san: String,
    pub coordinate: String,
}

impl MoveRecord {
    /// Describe moving `from` -> `to` on `before`. Does not check legality.
    pub fn describe(before: &Board, from: Square, to: Square) -> Result<Self, MoveError> {
        let piece = before
            .piece_at(from)
            .ok_or(MoveError::EmptySource { square: from })?;
        let after = before.with_move(from, to)?;
        Ok(Self {
            from,
            to,
            piece,
            captured: before.piece_at(to),
            san: san(before, &after, piece, from, to),
            coordinate: coordinate(from, to),
        })
    }

    /// Whether this move is the one written as `expected`, in either
    /// notation.
    pub fn matches(&self, expected: &str) -> bool {
        let expected = strip_annotations(expected);
        let expected = strip_promotion(&expected);
        expected.eq_ignore_ascii_case(&self.coordinate) || expected == strip_annotations(&self.san)
    }
}

pub fn coordinate(from: Square, to: Square) -> String {
    format!("{}{}", from, to)
}

/// Parse `e2e4` into its two squares.
pub fn parse_coordinate(text: &str) -> Option<(Square, Square)> {
    let text = strip_promotion(text.trim());
    if text.len() != 4 || !text.is_ascii() {
        return None;
    }
    let from = text[..2].parse().ok()?;
    let to = text[2..].parse().ok()?;
    Some((from, to))
}

fn san(before: &Board, after: &Board, piece: Piece, from: Square, to: Square) -> String {
    let capture = before.piece_at(to).is_some();
    let mut out = String::with_capacity(7);

    match piece.kind.san_letter() {
        None => {
            if capture {
                out.push(from.file_char());
            }
        }
        Some(letter) => {
            out.push(letter);
            let others = rivals(before, piece, from, to);
            if !others.is_empty() {
                if others.iter().all(|sq| sq.col() != from.col()) {
                    out.push(from.file_char());
                } else if others.iter().all(|sq| sq.row() != from.row()) {
                    out.push(from.rank_char());
                } else {
                    out.push(from.file_char());
                    out.push(from.rank_char());
                }
            }
        }
    }

    if capture {
        out.push('x');
    }
    out.push_str(&to.to_string());

    if matches!(detect(after, piece.color), Some(Outcome::Checkmate { .. })) {
        out.push('#');
    } else if in_check(after, piece.color.opponent()) {
        out.push('+');
    }
    out
}

fn strip_annotations(text: &str) -> String {
    text.trim()
        .trim_end_matches(|c| matches!(c, '+' | '#' | '!' | '?'))
        .to_string()
}

fn strip_promotion(text: &str) -> String {
    let bytes = text.as_bytes();
    if bytes.len() == 5 && matches!(bytes[4].to_ascii_lowercase(), b'q' | b'r' | b'b' | b'n') {
        text[..4].to_string()
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(name: &str) -> Square {
        name.parse().unwrap()
    }

    #[test]
    fn pawn_and_piece_moves() {
        let board = Board::initial();
        let record = MoveRecord::describe(&board, sq("e2"), sq("e4")).unwrap();
        assert_eq!(record.san, "e4");
        assert_eq!(record.coordinate, "e2e4");
        assert_eq!(record.captured, None);

        let record = MoveRecord::describe(&board, sq("g1"), sq("f3")).unwrap();
        assert_eq!(record.san, "Nf3");
    }

    #[test]
    fn captures_and_mate_suffix() {
        let (board, _) = Board::from_fen(
            "r1bqkb1r/pppp1ppp/2n2n2/4p2Q/2B1P3/8/PPPP1PPP/RNB1K1NR w - - 4 4",
        )
        .unwrap();
        let record = MoveRecord::describe(&board, sq("h5"), sq("f7")).unwrap();
        assert_eq!(record.san, "Qxf7#");
        assert!(record.captured.is_some());
        assert!(record.matches("Qxf7#"));
        assert!(record.matches("Qxf7"));
        assert!(record.matches("h5f7"));
        assert!(!record.matches("h5h7"));
    }

    #[test]
    fn pawn_capture_uses_source_file() {
        let (board, _) = Board::from_fen("4k3/8/8/3p4/4P3/8/8/4K3 w - - 0 1").unwrap();
        let record = MoveRecord::describe(&board, sq("e4"), sq("d5")).unwrap();
        assert_eq!(record.san, "exd5");
    }

    #[test]
    fn disambiguates_by_file_then_rank() {
        let (board, _) = Board::from_fen("4k3/8/8/8/8/8/4K3/R6R w - - 0 1").unwrap();
        let record = MoveRecord::describe(&board, sq("a1"), sq("d1")).unwrap();
        assert_eq!(record.san, "Rad1");

        let (board, _) = Board::from_fen("R7/8/8/8/8/8/8/R3K2k w - - 0 1").unwrap();
        let record = MoveRecord::describe(&board, sq("a1"), sq("a4")).unwrap();
        assert_eq!(record.san, "R1a4");
    }

    #[test]
    fn check_suffix() {
        let (board, _) = Board::from_fen("4k3/8/8/8/8/8/8/R3K3 w - - 0 1").unwrap();
        let record = MoveRecord::describe(&board, sq("a1"), sq("a8")).unwrap();
        assert_eq!(record.san, "Ra8+");
    }

    #[test]
    fn coordinate_parsing() {
        assert_eq!(parse_coordinate("e2e4"), Some((sq("e2"), sq("e4"))));
        assert_eq!(parse_coordinate("e7e8q"), Some((sq("e7"), sq("e8"))));
        assert_eq!(parse_coordinate("e2"), None);
        assert_eq!(parse_coordinate("z9e4"), None);
    }
}
