//! Board and piece model.
//!
//! The board is an 8x8 grid of `Option<Piece>` addressed by [`Square`].
//! Row 0 is Black's back rank and row 7 is White's, so FEN placement
//! strings read in row order.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{BoardError, MoveError};

/// Side to move / owner of a piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub fn opponent(self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    /// Row delta of a forward pawn step.
    pub fn forward(self) -> i8 {
        match self {
            Color::White => -1,
            Color::Black => 1,
        }
    }

    /// Row the pawns of this color start on.
    pub fn pawn_home_row(self) -> u8 {
        match self {
            Color::White => 6,
            Color::Black => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Color::White => "white",
            Color::Black => "black",
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Color {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "white" | "w" => Ok(Color::White),
            "black" | "b" => Ok(Color::Black),
            _ => Err(BoardError::InvalidColor(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PieceKind {
    Pawn,
    Rook,
    Knight,
    Bishop,
    Queen,
    King,
}

impl PieceKind {
    /// Upper case SAN letter; pawns have none.
    pub fn san_letter(self) -> Option<char> {
        match self {
            PieceKind::Pawn => None,
            PieceKind::Rook => Some('R'),
            PieceKind::Knight => Some('N'),
            PieceKind::Bishop => Some('B'),
            PieceKind::Queen => Some('Q'),
            PieceKind::King => Some('K'),
        }
    }
}

/// A piece on the board. Ownership is part of the value, never stored
/// beside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Piece {
    pub kind: PieceKind,
    pub color: Color,
}

impl Piece {
    pub const fn new(kind: PieceKind, color: Color) -> Self {
        Self { kind, color }
    }

    /// FEN character: upper case for White, lower case for Black.
    pub fn to_fen_char(self) -> char {
        let c = match self.kind {
            PieceKind::Pawn => 'p',
            PieceKind::Rook => 'r',
            PieceKind::Knight => 'n',
            PieceKind::Bishop => 'b',
            PieceKind::Queen => 'q',
            PieceKind::King => 'k',
        };
        match self.color {
            Color::White => c.to_ascii_uppercase(),
            Color::Black => c,
        }
    }

    pub fn from_fen_char(c: char) -> Result<Self, BoardError> {
        let color = if c.is_ascii_uppercase() {
            Color::White
        } else {
            Color::Black
        };
        let kind = match c.to_ascii_lowercase() {
            'p' => PieceKind::Pawn,
            'r' => PieceKind::Rook,
            'n' => PieceKind::Knight,
            'b' => PieceKind::Bishop,
            'q' => PieceKind::Queen,
            'k' => PieceKind::King,
            _ => return Err(BoardError::InvalidPiece(c)),
        };
        Ok(Self { kind, color })
    }
}

/// Owner of a square's occupant, if any.
pub fn color_of(piece: Option<Piece>) -> Option<Color> {
    piece.map(|p| p.color)
}

/// A (row, col) coordinate, both in `0..8`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Square {
    row: u8,
    col: u8,
}

impl Square {
    pub fn new(row: u8, col: u8) -> Option<Self> {
        (row < 8 && col < 8).then_some(Self { row, col })
    }

    pub fn row(self) -> u8 {
        self.row
    }

    pub fn col(self) -> u8 {
        self.col
    }

    /// The square `dr` rows and `dc` columns away, if still on the board.
    pub fn offset(self, dr: i8, dc: i8) -> Option<Self> {
        let row = self.row as i8 + dr;
        let col = self.col as i8 + dc;
        if (0..8).contains(&row) && (0..8).contains(&col) {
            Some(Self {
                row: row as u8,
                col: col as u8,
            })
        } else {
            None
        }
    }

    /// All 64 squares in row-major order, starting at a8.
    pub fn all() -> impl Iterator<Item = Square> {
        (0..8u8).flat_map(|row| (0..8u8).map(move |col| Square { row, col }))
    }

    pub fn file_char(self) -> char {
        (b'a' + self.col) as char
    }

    pub fn rank_char(self) -> char {
        (b'8' - self.row) as char
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.file_char(), self.rank_char())
    }
}

impl FromStr for Square {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.trim().to_ascii_lowercase().into_bytes();
        match bytes.as_slice() {
            [file @ b'a'..=b'h', rank @ b'1'..=b'8'] => Ok(Square {
                row: b'8' - rank,
                col: file - b'a',
            }),
            _ => Err(BoardError::InvalidSquare(s.to_string())),
        }
    }
}

impl TryFrom<String> for Square {
    type Error = BoardError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Square> for String {
    fn from(square: Square) -> Self {
        square.to_string()
    }
}

const BACK_RANK: [PieceKind; 8] = [
    PieceKind::Rook,
    PieceKind::Knight,
    PieceKind::Bishop,
    PieceKind::Queen,
    PieceKind::King,
    PieceKind::Bishop,
    PieceKind::Knight,
    PieceKind::Rook,
];

/// An immutable snapshot of piece placement. Every square holds exactly
/// one `Option<Piece>`, so duplicates and gaps are unrepresentable.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Board {
    squares: [[Option<Piece>; 8]; 8],
}

impl Board {
    pub fn empty() -> Self {
        Self {
            squares: [[None; 8]; 8],
        }
    }

    /// The standard starting position.
    pub fn initial() -> Self {
        let mut squares = [[None; 8]; 8];
        for (col, kind) in BACK_RANK.iter().enumerate() {
            squares[0][col] = Some(Piece::new(*kind, Color::Black));
            squares[1][col] = Some(Piece::new(PieceKind::Pawn, Color::Black));
            squares[6][col] = Some(Piece::new(PieceKind::Pawn, Color::White));
            squares[7][col] = Some(Piece::new(*kind, Color::White));
        }
        Self { squares }
    }

    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        self.squares[square.row as usize][square.col as usize]
    }

    pub fn color_at(&self, square: Square) -> Option<Color> {
        color_of(self.piece_at(square))
    }

    pub fn is_empty(&self, square: Square) -> bool {
        self.piece_at(square).is_none()
    }

    /// A copy of this board with `square` set to `piece`.
    pub fn with_piece(&self, square: Square, piece: Option<Piece>) -> Board {
        let mut next = *self;
        next.squares[square.row as usize][square.col as usize] = piece;
        next
    }

    /// A copy of this board with the piece on `from` moved to `to`,
    /// replacing whatever stood there. Legality is not checked here.
    pub fn with_move(&self, from: Square, to: Square) -> Result<Board, MoveError> {
        let piece = self
            .piece_at(from)
            .ok_or(MoveError::EmptySource { square: from })?;
        Ok(self.with_piece(from, None).with_piece(to, Some(piece)))
    }

    /// Occupied squares in row-major order.
    pub fn pieces(&self) -> impl Iterator<Item = (Square, Piece)> + '_ {
        Square::all().filter_map(move |sq| self.piece_at(sq).map(|p| (sq, p)))
    }

    pub fn piece_count(&self) -> usize {
        self.pieces().count()
    }

    pub fn king_square(&self, color: Color) -> Option<Square> {
        self.pieces()
            .find(|(_, p)| p.kind == PieceKind::King && p.color == color)
            .map(|(sq, _)| sq)
    }

    /// Parse the placement field of a FEN string.
    pub fn from_placement(placement: &str) -> Result<Board, BoardError> {
        let rows: Vec<&str> = placement.split('/').collect();
        if rows.len() != 8 {
            return Err(BoardError::InvalidFen {
                message: format!("expected 8 ranks, found {}", rows.len()),
            });
        }

        let mut squares = [[None; 8]; 8];
        for (row, text) in rows.iter().enumerate() {
            let mut col = 0usize;
            for c in text.chars() {
                if let Some(skip) = c.to_digit(10) {
                    col += skip as usize;
                } else {
                    if col >= 8 {
                        return Err(BoardError::InvalidFen {
                            message: format!("rank {} is too long", 8 - row),
                        });
                    }
                    squares[row][col] = Some(Piece::from_fen_char(c)?);
                    col += 1;
                }
            }
            if col != 8 {
                return Err(BoardError::InvalidFen {
                    message: format!("rank {} does not cover 8 files", 8 - row),
                });
            }
        }
        Ok(Self { squares })
    }

    /// Parse the placement and side-to-move fields of a FEN string. The
    /// remaining fields are accepted and ignored.
    pub fn from_fen(fen: &str) -> Result<(Board, Color), BoardError> {
        let mut fields = fen.split_whitespace();
        let placement = fields.next().ok_or_else(|| BoardError::InvalidFen {
            message: "empty FEN".to_string(),
        })?;
        let board = Self::from_placement(placement)?;
        let side = match fields.next() {
            None | Some("w") => Color::White,
            Some("b") => Color::Black,
            Some(other) => {
                return Err(BoardError::InvalidFen {
                    message: format!("invalid side to move '{}'", other),
                })
            }
        };
        Ok((board, side))
    }

    /// FEN placement field.
    pub fn placement(&self) -> String {
        let mut out = String::with_capacity(72);
        for row in 0..8 {
            let mut gap = 0;
            for col in 0..8 {
                match self.squares[row][col] {
                    Some(piece) => {
                        if gap > 0 {
                            out.push_str(&gap.to_string());
                            gap = 0;
                        }
                        out.push(piece.to_fen_char());
                    }
                    None => gap += 1,
                }
            }
            if gap > 0 {
                out.push_str(&gap.to_string());
            }
            if row < 7 {
                out.push('/');
            }
        }
        out
    }

    /// Full FEN. Castling and en passant never apply in this engine.
    pub fn to_fen(&self, side_to_move: Color) -> String {
        let side = match side_to_move {
            Color::White => 'w',
            Color::Black => 'b',
        };
        format!("{} {} - - 0 1", self.placement(), side)
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::initial()
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Board({})", self.placement())
    }
}
