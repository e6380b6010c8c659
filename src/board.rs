//! Mailbox board representation and FEN round-trip.
//!
//! `Board` owns the 64-cell piece grid and the position metadata: side to
//! move, castling availability per color, en-passant target, halfmove clock
//! and fullmove counter. Engines and callers share one board through
//! [`SharedBoard`] (`Rc<RefCell<Board>>`); a deep copy is a plain `clone`.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::coord::Coord;
use crate::text;
use crate::types::{CastleFlags, Color, Error, Piece, PieceKind};

/// Board width in squares.
pub const WIDTH: i32 = 8;

/// Number of cells in the grid.
pub const SIZE: usize = (WIDTH * WIDTH) as usize;

/// FEN of the standard starting position.
pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Shared ownership handle for a board: the engine holds one reference,
/// the caller may hold another. Single-threaded by design.
pub type SharedBoard = Rc<RefCell<Board>>;

// ---------------------------------------------------------------------------
// Board
// ---------------------------------------------------------------------------

/// A complete chess position.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Board {
    /// Piece grid, indexed by [`Board::index`].
    pub pieces: [Piece; SIZE],

    /// Whose turn it is.
    pub side_to_move: Color,

    /// Castling availability per color, indexed by `Color::index()`.
    pub castling: [CastleFlags; 2],

    /// The square a pawn just double-stepped over (the capture destination
    /// for en passant), if any.
    pub en_passant_target: Option<Coord>,

    /// Plies since the last pawn move or capture.
    pub halfmove_clock: u64,

    /// Completed move pairs; starts at 1, increments after Black moves.
    pub fullmove_count: u64,
}

impl Board {
    // -----------------------------------------------------------------------
    // Construction
    // -----------------------------------------------------------------------

    /// An empty board: no pieces, white to move, no castling availability.
    pub fn empty() -> Self {
        Board {
            pieces: [Piece::Empty; SIZE],
            side_to_move: Color::White,
            castling: [CastleFlags::NONE; 2],
            en_passant_target: None,
            halfmove_clock: 0,
            fullmove_count: 1,
        }
    }

    /// The standard starting position.
    pub fn starting() -> Self {
        Self::from_fen(STARTING_FEN).expect("starting FEN is always valid")
    }

    /// Wrap the board in a shared ownership handle.
    pub fn shared(self) -> SharedBoard {
        Rc::new(RefCell::new(self))
    }

    // -----------------------------------------------------------------------
    // Geometry
    // -----------------------------------------------------------------------

    /// Whether a coordinate lies on the grid.
    #[inline]
    pub fn in_bounds(pos: Coord) -> bool {
        pos.x >= 0 && pos.x < WIDTH && pos.y >= 0 && pos.y < WIDTH
    }

    /// Linear cell index for an in-bounds coordinate.
    #[inline]
    fn index(pos: Coord) -> usize {
        (pos.y * WIDTH + pos.x) as usize
    }

    // -----------------------------------------------------------------------
    // Piece access
    // -----------------------------------------------------------------------

    /// The raw cell contents. `None` only when out of bounds.
    #[inline]
    pub fn cell(&self, pos: Coord) -> Option<Piece> {
        if Self::in_bounds(pos) {
            Some(self.pieces[Self::index(pos)])
        } else {
            None
        }
    }

    /// The piece on a square. `None` when the square is out of bounds or
    /// holds no piece.
    pub fn piece_at(&self, pos: Coord) -> Option<(Color, PieceKind)> {
        match self.cell(pos)? {
            Piece::Empty => None,
            Piece::Occupied { kind, color } => Some((color, kind)),
        }
    }

    /// Write a cell. Returns `false` (and does not mutate) when the
    /// coordinate is out of bounds.
    pub fn set_piece(&mut self, pos: Coord, piece: Piece) -> bool {
        if !Self::in_bounds(pos) {
            return false;
        }
        self.pieces[Self::index(pos)] = piece;
        true
    }

    // -----------------------------------------------------------------------
    // Turn
    // -----------------------------------------------------------------------

    /// Flip the side to move without touching the clocks. Used by the
    /// caller-side promotion flow, where the committing move was applied
    /// with turn advancement deferred.
    pub fn advance_turn(&mut self) {
        self.side_to_move = !self.side_to_move;
    }
}

// ---------------------------------------------------------------------------
// FEN parsing
// ---------------------------------------------------------------------------

impl Board {
    /// Parse a FEN string.
    ///
    /// Six whitespace-separated fields: piece placement, side to move,
    /// castling, en passant, halfmove clock, fullmove counter. On failure
    /// no board is produced.
    pub fn from_fen(fen: &str) -> Result<Self, Error> {
        let fields = text::split(fen, " \t", true);
        if fields.len() != 6 {
            return Err(Error::InvalidFen(format!(
                "expected 6 fields, got {}",
                fields.len()
            )));
        }

        let mut board = Board::empty();

        // ----- Field 1: piece placement -----
        Self::parse_placement(fields[0], &mut board)?;

        // ----- Field 2: side to move -----
        board.side_to_move = match fields[1] {
            "w" => Color::White,
            "b" => Color::Black,
            other => {
                return Err(Error::InvalidFen(format!(
                    "invalid side to move: '{other}'"
                )));
            }
        };

        // ----- Field 3: castling availability -----
        board.castling = Self::parse_castling(fields[2])?;

        // ----- Field 4: en passant target -----
        // Stored verbatim: the square must parse, but no check is made that
        // a matching pawn exists.
        if fields[3] != "-" {
            let target = Coord::from_algebraic(fields[3]).ok_or_else(|| {
                Error::InvalidFen(format!("invalid en passant square: '{}'", fields[3]))
            })?;
            board.en_passant_target = Some(target);
        }

        // ----- Fields 5 & 6: counters -----
        board.halfmove_clock = text::parse_unsigned(fields[4]).ok_or_else(|| {
            Error::InvalidFen(format!("invalid halfmove clock: '{}'", fields[4]))
        })?;
        board.fullmove_count = text::parse_unsigned(fields[5]).ok_or_else(|| {
            Error::InvalidFen(format!("invalid fullmove count: '{}'", fields[5]))
        })?;
        if board.fullmove_count == 0 {
            return Err(Error::InvalidFen("fullmove count must be >= 1".to_string()));
        }

        Ok(board)
    }

    fn parse_placement(placement: &str, board: &mut Board) -> Result<(), Error> {
        let ranks = text::split_char(placement, '/', true);
        if ranks.len() != WIDTH as usize {
            return Err(Error::InvalidFen(format!(
                "expected 8 ranks, got {}",
                ranks.len()
            )));
        }

        for (i, rank_str) in ranks.iter().enumerate() {
            // FEN lists ranks from 8 down to 1.
            let y = WIDTH - 1 - i as i32;
            let mut x = 0i32;

            for c in rank_str.chars() {
                if x >= WIDTH {
                    return Err(Error::InvalidFen(format!(
                        "too many squares in rank {}",
                        y + 1
                    )));
                }
                if let Some(digit) = c.to_digit(10) {
                    if !(1..=8).contains(&digit) {
                        return Err(Error::InvalidFen(format!(
                            "invalid empty count '{c}' in rank {}",
                            y + 1
                        )));
                    }
                    x += digit as i32;
                    if x > WIDTH {
                        return Err(Error::InvalidFen(format!(
                            "too many squares in rank {}",
                            y + 1
                        )));
                    }
                } else if let Some(piece) = Piece::from_char(c) {
                    board.set_piece(Coord::new(x, y), piece);
                    x += 1;
                } else {
                    return Err(Error::InvalidFen(format!(
                        "invalid character '{c}' in piece placement"
                    )));
                }
            }

            if x != WIDTH {
                return Err(Error::InvalidFen(format!(
                    "rank {} has {} squares instead of 8",
                    y + 1,
                    x
                )));
            }
        }

        Ok(())
    }

    fn parse_castling(segment: &str) -> Result<[CastleFlags; 2], Error> {
        let mut castling = [CastleFlags::NONE; 2];
        if segment == "-" {
            return Ok(castling);
        }
        for c in segment.chars() {
            let color = if c.is_ascii_uppercase() {
                Color::White
            } else {
                Color::Black
            };
            let flag = match c.to_ascii_lowercase() {
                'k' => CastleFlags::KING_SIDE,
                'q' => CastleFlags::QUEEN_SIDE,
                _ => {
                    return Err(Error::InvalidFen(format!(
                        "invalid castling character '{c}'"
                    )));
                }
            };
            castling[color.index()].insert(flag);
        }
        Ok(castling)
    }
}

// ---------------------------------------------------------------------------
// FEN serialization
// ---------------------------------------------------------------------------

impl Board {
    /// Export the position as a FEN string, the exact inverse of
    /// [`Board::from_fen`]. Castling letters come out in canonical `KQkq`
    /// order; absent castling and en passant render as `-`.
    pub fn to_fen(&self) -> String {
        let mut fen = String::with_capacity(80);

        // ----- Field 1: piece placement, rank 8 down to rank 1 -----
        for y in (0..WIDTH).rev() {
            let mut empty_run = 0u8;
            for x in 0..WIDTH {
                match self.pieces[Self::index(Coord::new(x, y))] {
                    Piece::Empty => empty_run += 1,
                    piece => {
                        if empty_run > 0 {
                            fen.push((b'0' + empty_run) as char);
                            empty_run = 0;
                        }
                        // The piece is occupied here, so a character exists.
                        fen.push(piece.to_char().expect("occupied piece has a character"));
                    }
                }
            }
            if empty_run > 0 {
                fen.push((b'0' + empty_run) as char);
            }
            if y > 0 {
                fen.push('/');
            }
        }

        // ----- Field 2: side to move -----
        fen.push(' ');
        fen.push(match self.side_to_move {
            Color::White => 'w',
            Color::Black => 'b',
        });

        // ----- Field 3: castling -----
        fen.push(' ');
        let white = self.castling[Color::White.index()];
        let black = self.castling[Color::Black.index()];
        if white == CastleFlags::NONE && black == CastleFlags::NONE {
            fen.push('-');
        } else {
            if white.has(CastleFlags::KING_SIDE) {
                fen.push('K');
            }
            if white.has(CastleFlags::QUEEN_SIDE) {
                fen.push('Q');
            }
            if black.has(CastleFlags::KING_SIDE) {
                fen.push('k');
            }
            if black.has(CastleFlags::QUEEN_SIDE) {
                fen.push('q');
            }
        }

        // ----- Field 4: en passant -----
        fen.push(' ');
        match self.en_passant_target {
            Some(target) => fen.push_str(&target.to_algebraic()),
            None => fen.push('-'),
        }

        // ----- Fields 5 & 6: counters -----
        fen.push(' ');
        fen.push_str(&self.halfmove_clock.to_string());
        fen.push(' ');
        fen.push_str(&self.fullmove_count.to_string());

        fen
    }

    /// Render the board as an 8-line text grid (rank 8 at the top), for
    /// debugging and logs.
    pub fn board_string(&self) -> String {
        let mut s = String::with_capacity(200);
        for y in (0..WIDTH).rev() {
            s.push((b'1' + y as u8) as char);
            s.push(' ');
            for x in 0..WIDTH {
                let c = self.pieces[Self::index(Coord::new(x, y))]
                    .to_char()
                    .unwrap_or('.');
                s.push(c);
                if x < WIDTH - 1 {
                    s.push(' ');
                }
            }
            s.push('\n');
        }
        s.push_str("  a b c d e f g h");
        s
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.board_string())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(name: &str) -> Coord {
        Coord::from_algebraic(name).unwrap()
    }

    // ===================================================================
    // Starting position
    // ===================================================================

    #[test]
    fn starting_position_fen() {
        assert_eq!(Board::starting().to_fen(), STARTING_FEN);
    }

    #[test]
    fn starting_position_metadata() {
        let board = Board::starting();
        assert_eq!(board.side_to_move, Color::White);
        assert_eq!(board.castling[Color::White.index()], CastleFlags::BOTH);
        assert_eq!(board.castling[Color::Black.index()], CastleFlags::BOTH);
        assert_eq!(board.en_passant_target, None);
        assert_eq!(board.halfmove_clock, 0);
        assert_eq!(board.fullmove_count, 1);
    }

    #[test]
    fn starting_position_back_ranks() {
        let board = Board::starting();
        let white_rank: Vec<_> = "abcdefgh"
            .chars()
            .map(|f| board.piece_at(sq(&format!("{f}1"))).unwrap())
            .collect();
        let kinds: Vec<_> = white_rank.iter().map(|&(_, k)| k).collect();
        assert_eq!(
            kinds,
            vec![
                PieceKind::Rook,
                PieceKind::Knight,
                PieceKind::Bishop,
                PieceKind::Queen,
                PieceKind::King,
                PieceKind::Bishop,
                PieceKind::Knight,
                PieceKind::Rook,
            ]
        );
        assert!(white_rank.iter().all(|&(c, _)| c == Color::White));

        for f in "abcdefgh".chars() {
            assert_eq!(
                board.piece_at(sq(&format!("{f}7"))),
                Some((Color::Black, PieceKind::Pawn))
            );
        }
    }

    #[test]
    fn starting_position_middle_is_empty() {
        let board = Board::starting();
        for rank in 3..=6 {
            for f in "abcdefgh".chars() {
                assert_eq!(board.piece_at(sq(&format!("{f}{rank}"))), None);
            }
        }
    }

    // ===================================================================
    // Get / set
    // ===================================================================

    #[test]
    fn set_and_get_piece() {
        let mut board = Board::empty();
        let e4 = sq("e4");
        assert!(board.set_piece(e4, Piece::occupied(PieceKind::Knight, Color::White)));
        assert_eq!(board.piece_at(e4), Some((Color::White, PieceKind::Knight)));
        assert_eq!(
            board.cell(e4),
            Some(Piece::occupied(PieceKind::Knight, Color::White))
        );

        assert!(board.set_piece(e4, Piece::Empty));
        assert_eq!(board.piece_at(e4), None);
        assert_eq!(board.cell(e4), Some(Piece::Empty));
    }

    #[test]
    fn out_of_bounds_get_reports_no_piece() {
        let board = Board::starting();
        assert_eq!(board.piece_at(Coord::new(-1, 0)), None);
        assert_eq!(board.piece_at(Coord::new(0, 8)), None);
        assert_eq!(board.cell(Coord::new(8, 8)), None);
    }

    #[test]
    fn out_of_bounds_set_fails_without_mutating() {
        let mut board = Board::starting();
        let before = board.clone();
        assert!(!board.set_piece(
            Coord::new(8, 0),
            Piece::occupied(PieceKind::Queen, Color::White)
        ));
        assert_eq!(board, before);
    }

    #[test]
    fn empty_cell_is_no_piece() {
        let board = Board::empty();
        assert_eq!(board.piece_at(sq("d4")), None);
        assert_eq!(board.cell(sq("d4")), Some(Piece::Empty));
    }

    // ===================================================================
    // Turn
    // ===================================================================

    #[test]
    fn advance_turn_flips_side_only() {
        let mut board = Board::starting();
        board.advance_turn();
        assert_eq!(board.side_to_move, Color::Black);
        assert_eq!(board.halfmove_clock, 0);
        assert_eq!(board.fullmove_count, 1);
        board.advance_turn();
        assert_eq!(board.side_to_move, Color::White);
    }

    // ===================================================================
    // FEN round trips
    // ===================================================================

    #[test]
    fn fen_round_trip_starting() {
        let board = Board::from_fen(STARTING_FEN).unwrap();
        assert_eq!(board.to_fen(), STARTING_FEN);
    }

    #[test]
    fn fen_round_trip_empty_board() {
        let fen = "8/8/8/8/8/8/8/8 w - - 0 1";
        assert_eq!(Board::from_fen(fen).unwrap().to_fen(), fen);
    }

    #[test]
    fn fen_round_trip_kings_and_queens() {
        let fen = "3qk3/8/8/8/8/8/8/3QK3 w - - 0 1";
        assert_eq!(Board::from_fen(fen).unwrap().to_fen(), fen);
    }

    #[test]
    fn fen_round_trip_after_e4() {
        let fen = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1";
        assert_eq!(Board::from_fen(fen).unwrap().to_fen(), fen);
    }

    #[test]
    fn fen_round_trip_partial_castling() {
        let fen = "r3k2r/pppppppp/8/8/8/8/PPPPPPPP/R3K2R w Kq - 5 20";
        assert_eq!(Board::from_fen(fen).unwrap().to_fen(), fen);
    }

    #[test]
    fn fen_castling_letters_canonicalized() {
        let board = Board::from_fen("8/8/8/8/8/8/8/8 w qkQK - 0 1").unwrap();
        assert_eq!(board.to_fen(), "8/8/8/8/8/8/8/8 w KQkq - 0 1");
    }

    #[test]
    fn fen_whitespace_normalized() {
        let board =
            Board::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR  w  KQkq  -  0  1")
                .unwrap();
        assert_eq!(board.to_fen(), STARTING_FEN);
    }

    // ===================================================================
    // FEN field semantics
    // ===================================================================

    #[test]
    fn fen_en_passant_stored_verbatim() {
        // No check that a matching pawn exists, or that the rank is 3 or 6.
        let board = Board::from_fen("8/8/8/8/8/8/8/8 w - e4 0 1").unwrap();
        assert_eq!(board.en_passant_target, Some(sq("e4")));
        assert_eq!(board.to_fen(), "8/8/8/8/8/8/8/8 w - e4 0 1");
    }

    #[test]
    fn fen_counters_parsed() {
        let board = Board::from_fen("8/8/8/8/8/8/8/8 b - - 37 112").unwrap();
        assert_eq!(board.side_to_move, Color::Black);
        assert_eq!(board.halfmove_clock, 37);
        assert_eq!(board.fullmove_count, 112);
    }

    #[test]
    fn fen_no_king_validation() {
        // The parser accepts king-less boards; check detection handles them.
        assert!(Board::from_fen("8/8/8/8/8/8/8/8 w KQkq - 0 1").is_ok());
    }

    // ===================================================================
    // FEN rejection
    // ===================================================================

    #[test]
    fn fen_rejects_empty_string() {
        assert!(Board::from_fen("").is_err());
    }

    #[test]
    fn fen_rejects_seven_ranks() {
        assert!(Board::from_fen("8/8/8/8/8/8/8 w - - 0 1").is_err());
    }

    #[test]
    fn fen_rejects_bad_side_to_move() {
        assert!(Board::from_fen("8/8/8/8/8/8/8/8 f - - 0 1").is_err());
        assert!(Board::from_fen("8/8/8/8/8/8/8/8 wb - - 0 1").is_err());
    }

    #[test]
    fn fen_rejects_bad_castling() {
        assert!(Board::from_fen("8/8/8/8/8/8/8/8 w abAB - 0 1").is_err());
    }

    #[test]
    fn fen_rejects_bad_en_passant() {
        assert!(Board::from_fen("8/8/8/8/8/8/8/8 w - i1 0 1").is_err());
        assert!(Board::from_fen("8/8/8/8/8/8/8/8 w - a9 0 1").is_err());
        assert!(Board::from_fen("8/8/8/8/8/8/8/8 w - abc 0 1").is_err());
    }

    #[test]
    fn fen_rejects_bad_counters() {
        assert!(Board::from_fen("8/8/8/8/8/8/8/8 w - - x 1").is_err());
        assert!(Board::from_fen("8/8/8/8/8/8/8/8 w - - 0 +1").is_err());
        assert!(Board::from_fen("8/8/8/8/8/8/8/8 w - - 0 0").is_err());
    }

    #[test]
    fn fen_rejects_bad_placement() {
        // Unknown character.
        assert!(Board::from_fen("xnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w - - 0 1").is_err());
        // Rank too long.
        assert!(Board::from_fen("rnbqkbnrr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w - - 0 1").is_err());
        assert!(Board::from_fen("9/8/8/8/8/8/8/8 w - - 0 1").is_err());
        // Rank too short.
        assert!(Board::from_fen("rnbqkbn/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w - - 0 1").is_err());
        assert!(Board::from_fen("44/8/8/8/8/8/8/7 w - - 0 1").is_err());
        // Zero is not a valid empty count.
        assert!(Board::from_fen("80/8/8/8/8/8/8/8 w - - 0 1").is_err());
    }

    #[test]
    fn fen_rejects_wrong_field_count() {
        assert!(Board::from_fen("8/8/8/8/8/8/8/8 w - - 0").is_err());
        assert!(Board::from_fen("8/8/8/8/8/8/8/8 w - - 0 1 extra").is_err());
    }

    // ===================================================================
    // Display
    // ===================================================================

    #[test]
    fn board_string_starting() {
        let s = Board::starting().board_string();
        assert!(s.starts_with("8 r n b q k b n r"));
        assert!(s.ends_with("a b c d e f g h"));
    }
}
