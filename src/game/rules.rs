//! Per-piece movement rules.
//!
//! Legality here is geometric only: a move that leaves the mover's own
//! king attacked is still accepted. There is no castling, en passant or
//! promotion.

use crate::game::board::{Board, Color, Piece, PieceKind, Square};

/// Whether the piece on `from` may move to `to` on `board`.
pub fn is_legal(board: &Board, from: Square, to: Square) -> bool {
    let Some(piece) = board.piece_at(from) else {
        return false;
    };
    if from == to || board.color_at(to) == Some(piece.color) {
        return false;
    }

    let dr = to.row() as i8 - from.row() as i8;
    let dc = to.col() as i8 - from.col() as i8;

    match piece.kind {
        PieceKind::Pawn => pawn_move(board, piece.color, from, to, dr, dc),
        PieceKind::Rook => straight(dr, dc) && path_clear(board, from, to),
        PieceKind::Knight => matches!((dr.abs(), dc.abs()), (1, 2) | (2, 1)),
        PieceKind::Bishop => diagonal(dr, dc) && path_clear(board, from, to),
        PieceKind::Queen => (straight(dr, dc) || diagonal(dr, dc)) && path_clear(board, from, to),
        PieceKind::King => dr.abs() <= 1 && dc.abs() <= 1,
    }
}

/// Every square the piece on `from` can legally reach.
pub fn legal_destinations(board: &Board, from: Square) -> Vec<Square> {
    Square::all().filter(|to| is_legal(board, from, *to)).collect()
}

/// Other pieces of the same kind and color that could also reach `to`.
pub fn rivals(board: &Board, piece: Piece, from: Square, to: Square) -> Vec<Square> {
    board
        .pieces()
        .filter(|(sq, p)| *sq != from && *p == piece)
        .filter(|(sq, _)| is_legal(board, *sq, to))
        .map(|(sq, _)| sq)
        .collect()
}

fn pawn_move(board: &Board, color: Color, from: Square, to: Square, dr: i8, dc: i8) -> bool {
    let forward = color.forward();
    let target = board.piece_at(to);

    if dc == 0 {
        if dr == forward {
            return target.is_none();
        }
        if dr == 2 * forward && from.row() == color.pawn_home_row() {
            let between = from.offset(forward, 0);
            return target.is_none() && between.is_some_and(|sq| board.is_empty(sq));
        }
        return false;
    }

    // Diagonal steps only capture; friendly targets were rejected earlier.
    dr == forward && dc.abs() == 1 && target.is_some()
}

fn straight(dr: i8, dc: i8) -> bool {
    (dr == 0) != (dc == 0)
}

fn diagonal(dr: i8, dc: i8) -> bool {
    dr != 0 && dr.abs() == dc.abs()
}

/// Every square strictly between `from` and `to` is empty. Callers
/// guarantee the two squares share a row, column or diagonal.
fn path_clear(board: &Board, from: Square, to: Square) -> bool {
    let step_r = (to.row() as i8 - from.row() as i8).signum();
    let step_c = (to.col() as i8 - from.col() as i8).signum();

    let mut current = from.offset(step_r, step_c);
    while let Some(sq) = current {
        if sq == to {
            return true;
        }
        if !board.is_empty(sq) {
            return false;
        }
        current = sq.offset(step_r, step_c);
    }
    false
}
