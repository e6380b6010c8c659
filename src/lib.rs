//! Chess rules engine.
//!
//! The crate answers three intertwined questions about a position: what
//! pieces exist where, which moves are legal for a given piece, and whether
//! a side is in check or checkmate. It mutates the position when a
//! legal move is committed. Positions round-trip through Forsyth–Edwards
//! Notation (FEN).
//!
//! There is deliberately no search, no evaluation, and no draw judging;
//! this is the rules core that a renderer, a console, or a network layer
//! builds on.
//!
//! ```
//! use chess_rules::{Board, Coord, Engine, Move};
//!
//! let board = Board::starting().shared();
//! let mut engine = Engine::with_board(board);
//!
//! let mv = Move::new(Coord::new(4, 1), Coord::new(4, 3)); // e2 -> e4
//! assert!(engine.is_move_legal(mv));
//! assert!(engine.commit_move(mv, true, true));
//! ```

pub mod board;
pub mod coord;
pub mod engine;
pub mod movegen;
pub mod text;
pub mod types;

pub use board::{Board, SharedBoard};
pub use coord::Coord;
pub use engine::{Engine, KindFilter, PieceQuery};
pub use types::{CastleFlags, Color, Error, Move, Piece, PieceKind};
