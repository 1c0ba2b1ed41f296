use chess_rush::error::MoveError;
use chess_rush::game::board::{Board, Color, Square};
use chess_rush::game::rules::{is_legal, legal_destinations};

fn at(row: u8, col: u8) -> Square {
    Square::new(row, col).unwrap()
}

fn back_rank(rank: &str) -> Board {
    Board::from_placement(&format!("8/8/8/8/8/8/8/{}", rank)).unwrap()
}

#[test]
fn pawn_double_step_from_home_rank() {
    let board = Board::initial();
    assert!(is_legal(&board, at(6, 4), at(4, 4)));
    assert!(is_legal(&board, at(6, 4), at(5, 4)));
    assert!(!is_legal(&board, at(6, 4), at(3, 4)));
    // Pawns never move backwards or sideways.
    assert!(!is_legal(&board, at(1, 4), at(0, 4)));
    assert!(!is_legal(&board, at(6, 4), at(6, 5)));
}

#[test]
fn pawn_double_step_needs_both_squares_empty() {
    let (board, _) = Board::from_fen("4k3/8/8/8/8/4n3/4P3/4K3 w - - 0 1").unwrap();
    assert!(!is_legal(&board, at(6, 4), at(4, 4)));
    assert!(!is_legal(&board, at(6, 4), at(5, 4)));
}

#[test]
fn pawn_captures_only_diagonally_onto_enemies() {
    let (board, _) = Board::from_fen("4k3/8/8/8/3p1P2/4P3/8/4K3 w - - 0 1").unwrap();
    let e3 = at(5, 4);
    assert!(is_legal(&board, e3, at(4, 3)));
    assert!(!is_legal(&board, e3, at(4, 5)));
    assert!(is_legal(&board, e3, at(4, 4)));
    // Nothing to capture on the other diagonal.
    let (quiet, _) = Board::from_fen("4k3/8/8/8/8/4P3/8/4K3 w - - 0 1").unwrap();
    assert!(!is_legal(&quiet, e3, at(4, 3)));
}

#[test]
fn rook_path_scan() {
    let blocked = back_rank("R1N5");
    assert!(!is_legal(&blocked, at(7, 0), at(7, 4)));
    let blocked_by_enemy = back_rank("R1n5");
    assert!(!is_legal(&blocked_by_enemy, at(7, 0), at(7, 4)));
    assert!(is_legal(&blocked_by_enemy, at(7, 0), at(7, 2)));

    let open = back_rank("R7");
    assert!(is_legal(&open, at(7, 0), at(7, 4)));
    assert!(is_legal(&open, at(7, 0), at(0, 0)));
    assert!(!is_legal(&open, at(7, 0), at(6, 1)));
}

#[test]
fn knights_jump_and_kings_step() {
    let board = Board::initial();
    let g1 = at(7, 6);
    let mut knight: Vec<String> = legal_destinations(&board, g1)
        .iter()
        .map(ToString::to_string)
        .collect();
    knight.sort();
    assert_eq!(knight, vec!["f3", "h3"]);
    assert!(legal_destinations(&board, at(7, 4)).is_empty());
}

#[test]
fn no_friendly_capture_and_no_castling() {
    let (board, _) = Board::from_fen("4k3/8/8/8/8/8/8/R3K2R w KQ - 0 1").unwrap();
    assert!(!is_legal(&board, at(7, 4), at(7, 6)));
    assert!(!is_legal(&board, at(7, 0), at(7, 4)));
    assert!(is_legal(&board, at(7, 4), at(7, 5)));
}

#[test]
fn moving_into_check_is_not_rejected() {
    let (board, _) = Board::from_fen("4k3/8/8/8/8/8/r7/4K3 w - - 0 1").unwrap();
    assert!(is_legal(&board, at(7, 4), at(6, 4)));
}

#[test]
fn is_legal_is_pure() {
    let board = Board::initial();
    for from in Square::all() {
        for to in Square::all() {
            assert_eq!(is_legal(&board, from, to), is_legal(&board, from, to));
        }
    }
}

#[test]
fn with_move_keeps_piece_count() {
    let board = Board::initial();
    let total = board.piece_count();
    for (from, piece) in board.pieces() {
        for to in legal_destinations(&board, from) {
            let next = board.with_move(from, to).unwrap();
            assert_eq!(next.piece_count(), total);
            assert_eq!(next.piece_at(to), Some(piece));
            assert!(next.is_empty(from));
        }
    }
}

#[test]
fn round_trip_onto_empty_square_restores_board() {
    let board = Board::initial();
    let (a, b) = (at(7, 6), at(5, 5));
    let back = board.with_move(a, b).unwrap().with_move(b, a).unwrap();
    assert_eq!(back, board);
}

#[test]
fn round_trip_over_a_capture_loses_the_victim() {
    let (board, _) = Board::from_fen("4k3/8/8/3p4/4P3/8/8/4K3 w - - 0 1").unwrap();
    let (a, b) = (at(4, 4), at(3, 3));
    let captured = board.with_move(a, b).unwrap();
    assert_eq!(captured.piece_count(), board.piece_count() - 1);

    let back = captured.with_move(b, a).unwrap();
    assert_eq!(back.piece_at(a), board.piece_at(a));
    assert!(back.is_empty(b));
    assert_ne!(back, board);
}

#[test]
fn moving_from_an_empty_square_is_an_error() {
    let board = Board::initial();
    assert_eq!(
        board.with_move(at(4, 4), at(3, 4)),
        Err(MoveError::EmptySource { square: at(4, 4) })
    );
}

#[test]
fn fen_round_trip() {
    let fen = "rnbqkbnr/pppp1ppp/8/4p3/6P1/5P2/PPPPP2P/RNBQKBNR b - - 0 1";
    let (board, side) = Board::from_fen(fen).unwrap();
    assert_eq!(side, Color::Black);
    assert_eq!(board.to_fen(side), fen);
}
