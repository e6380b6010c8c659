use std::fmt;

use serde::{Deserialize, Serialize};

use crate::coord::Coord;

// ---------------------------------------------------------------------------
// Color
// ---------------------------------------------------------------------------

/// The two sides in a chess game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Color {
    White,
    Black,
}

impl Color {
    /// Index for array lookups: White=0, Black=1.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl std::ops::Not for Color {
    type Output = Self;
    fn not(self) -> Self {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::White => write!(f, "white"),
            Color::Black => write!(f, "black"),
        }
    }
}

// ---------------------------------------------------------------------------
// PieceKind
// ---------------------------------------------------------------------------

/// The six piece kinds. An unoccupied square is not a kind, see [`Piece`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PieceKind {
    King,
    Queen,
    Rook,
    Knight,
    Bishop,
    Pawn,
}

impl PieceKind {
    /// All piece kinds in order.
    pub const ALL: [PieceKind; 6] = [
        PieceKind::King,
        PieceKind::Queen,
        PieceKind::Rook,
        PieceKind::Knight,
        PieceKind::Bishop,
        PieceKind::Pawn,
    ];

    /// Number of piece kinds.
    pub const COUNT: usize = 6;

    /// Index for array lookups: King=0 .. Pawn=5.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for PieceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PieceKind::King => write!(f, "king"),
            PieceKind::Queen => write!(f, "queen"),
            PieceKind::Rook => write!(f, "rook"),
            PieceKind::Knight => write!(f, "knight"),
            PieceKind::Bishop => write!(f, "bishop"),
            PieceKind::Pawn => write!(f, "pawn"),
        }
    }
}

// ---------------------------------------------------------------------------
// Piece
// ---------------------------------------------------------------------------

/// The contents of a board cell: either empty, or a piece with a color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Piece {
    Empty,
    Occupied { kind: PieceKind, color: Color },
}

impl Piece {
    /// Shorthand constructor for an occupied cell.
    #[inline]
    pub const fn occupied(kind: PieceKind, color: Color) -> Self {
        Piece::Occupied { kind, color }
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        matches!(self, Piece::Empty)
    }

    /// The piece kind, if occupied.
    #[inline]
    pub const fn kind(self) -> Option<PieceKind> {
        match self {
            Piece::Empty => None,
            Piece::Occupied { kind, .. } => Some(kind),
        }
    }

    /// The piece color, if occupied.
    #[inline]
    pub const fn color(self) -> Option<Color> {
        match self {
            Piece::Empty => None,
            Piece::Occupied { color, .. } => Some(color),
        }
    }

    /// FEN character: uppercase for white, lowercase for black.
    /// Empty cells have no character.
    pub fn to_char(self) -> Option<char> {
        let (kind, color) = match self {
            Piece::Empty => return None,
            Piece::Occupied { kind, color } => (kind, color),
        };
        let c = match kind {
            PieceKind::King => 'k',
            PieceKind::Queen => 'q',
            PieceKind::Rook => 'r',
            PieceKind::Knight => 'n',
            PieceKind::Bishop => 'b',
            PieceKind::Pawn => 'p',
        };
        Some(match color {
            Color::White => c.to_ascii_uppercase(),
            Color::Black => c,
        })
    }

    /// Parse a FEN piece character. Case selects the color.
    pub fn from_char(c: char) -> Option<Self> {
        let color = if c.is_ascii_uppercase() {
            Color::White
        } else {
            Color::Black
        };
        let kind = match c.to_ascii_lowercase() {
            'k' => PieceKind::King,
            'q' => PieceKind::Queen,
            'r' => PieceKind::Rook,
            'n' => PieceKind::Knight,
            'b' => PieceKind::Bishop,
            'p' => PieceKind::Pawn,
            _ => return None,
        };
        Some(Piece::Occupied { kind, color })
    }
}

// ---------------------------------------------------------------------------
// CastleFlags
// ---------------------------------------------------------------------------

/// Castling availability for one color: king-side and/or queen-side.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CastleFlags(pub u8);

impl CastleFlags {
    pub const NONE: CastleFlags = CastleFlags(0);
    pub const KING_SIDE: CastleFlags = CastleFlags(1 << 0);
    pub const QUEEN_SIDE: CastleFlags = CastleFlags(1 << 1);
    pub const BOTH: CastleFlags = CastleFlags(0b11);

    #[inline]
    pub fn has(self, flag: CastleFlags) -> bool {
        self.0 & flag.0 != 0
    }

    #[inline]
    pub fn insert(&mut self, flag: CastleFlags) {
        self.0 |= flag.0;
    }

    #[inline]
    pub fn remove(&mut self, flag: CastleFlags) {
        self.0 &= !flag.0;
    }
}

impl std::ops::BitOr for CastleFlags {
    type Output = Self;
    #[inline]
    fn bitor(self, rhs: Self) -> Self {
        CastleFlags(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for CastleFlags {
    #[inline]
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

// ---------------------------------------------------------------------------
// Move
// ---------------------------------------------------------------------------

/// A move request: source square and destination square.
///
/// No algebraic notation is involved: callers pass coordinate pairs and
/// the engine decides legality.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    pub from: Coord,
    pub to: Coord,
}

impl Move {
    #[inline]
    pub const fn new(from: Coord, to: Coord) -> Self {
        Move { from, to }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)
    }
}

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Parse errors for the textual formats (FEN, coordinates).
///
/// Precondition failures (out-of-bounds square, empty source, illegal move)
/// are reported as `false`/`None` from the relevant operation instead, and
/// never mutate the board.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid FEN string: {0}")]
    InvalidFen(String),

    #[error("invalid coordinate: {0}")]
    InvalidCoord(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
