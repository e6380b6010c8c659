//! The rules engine.
//!
//! An [`Engine`] binds to at most one shared board and answers queries about
//! it: which pieces exist where, which moves are legal, whether a side is in
//! check or checkmate. Committing a move mutates the board in place and
//! invalidates the engine's memoization caches.
//!
//! Legal-move generation runs in three passes: geometric candidates with
//! blockers folded in (`movegen`), then a self-check filter that runs only
//! when the moving piece belongs to the side to move: it speculatively commits each
//! candidate on a deep copy of the board and discards any that leave the
//! mover's king attacked. Check detection for the non-moving side reuses the
//! same generation with the filter suppressed, which is what keeps the
//! recursion finite.

use std::collections::HashMap;
use std::rc::Rc;

use tracing::{debug, trace};

use crate::board::{Board, SharedBoard, WIDTH};
use crate::coord::Coord;
use crate::movegen;
use crate::types::{CastleFlags, Color, Move, Piece, PieceKind};

// ---------------------------------------------------------------------------
// Piece queries
// ---------------------------------------------------------------------------

/// Cell filter for [`Engine::find_pieces`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum KindFilter {
    /// Any occupied square (the default).
    #[default]
    AnyPiece,
    /// Occupied by a specific kind.
    Kind(PieceKind),
    /// Unoccupied squares. Not used by the rules themselves; callers use it
    /// for free-square scans.
    Empty,
}

/// A conjunctive piece query: every present field must match.
#[derive(Clone, Copy, Default)]
pub struct PieceQuery<'a> {
    pub kind: KindFilter,
    pub color: Option<Color>,
    pub x: Option<i32>,
    pub y: Option<i32>,
    /// Arbitrary caller predicate, consulted last.
    pub filter: Option<&'a dyn Fn(Piece) -> bool>,
}

/// Callback invoked when a commit captures a piece. State travels in the
/// closure's captures.
pub type CaptureCallback = Box<dyn FnMut(Piece)>;

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// A rules engine bound to at most one board.
#[derive(Default)]
pub struct Engine {
    board: Option<SharedBoard>,

    /// Legal destinations memoized per source square.
    legal_move_cache: HashMap<Coord, Vec<Coord>>,
    /// Checking piece squares memoized per color (empty = not in check).
    check_cache: [Option<Vec<Coord>>; 2],
    /// Checkmate verdict for the side to move.
    checkmate_cache: Option<bool>,

    capture_callback: Option<CaptureCallback>,
    last_move: Option<Move>,
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    /// An engine already bound to a board.
    pub fn with_board(board: SharedBoard) -> Self {
        let mut engine = Self::new();
        engine.bind_board(Some(board));
        engine
    }

    // -----------------------------------------------------------------------
    // Board binding
    // -----------------------------------------------------------------------

    /// Bind a board (or unbind with `None`). Binding a different board
    /// clears every cache; re-binding the same shared handle is a no-op.
    pub fn bind_board(&mut self, board: Option<SharedBoard>) {
        let unchanged = match (&self.board, &board) {
            (Some(current), Some(next)) => Rc::ptr_eq(current, next),
            (None, None) => true,
            _ => false,
        };
        if unchanged {
            return;
        }

        debug!(bound = board.is_some(), "rebinding engine board");
        self.clear_cache();
        self.last_move = None;
        self.board = board;
    }

    /// The bound board, if any.
    pub fn board(&self) -> Option<SharedBoard> {
        self.board.clone()
    }

    /// Whether a board is bound.
    pub fn has_board(&self) -> bool {
        self.board.is_some()
    }

    // -----------------------------------------------------------------------
    // Read-through board accessors
    // -----------------------------------------------------------------------

    /// Side to move on the bound board.
    pub fn current_turn(&self) -> Option<Color> {
        self.board.as_ref().map(|b| b.borrow().side_to_move)
    }

    /// Piece on a square of the bound board.
    pub fn piece_at(&self, pos: Coord) -> Option<(Color, PieceKind)> {
        self.board.as_ref().and_then(|b| b.borrow().piece_at(pos))
    }

    /// En-passant target of the bound board.
    pub fn en_passant_target(&self) -> Option<Coord> {
        self.board.as_ref().and_then(|b| b.borrow().en_passant_target)
    }

    /// Castling availability for a color; none when unbound.
    pub fn castling(&self, color: Color) -> CastleFlags {
        self.board
            .as_ref()
            .map(|b| b.borrow().castling[color.index()])
            .unwrap_or(CastleFlags::NONE)
    }

    /// Halfmove clock of the bound board; 0 when unbound.
    pub fn halfmove_clock(&self) -> u64 {
        self.board.as_ref().map(|b| b.borrow().halfmove_clock).unwrap_or(0)
    }

    /// Fullmove count of the bound board; 0 when unbound.
    pub fn fullmove_count(&self) -> u64 {
        self.board.as_ref().map(|b| b.borrow().fullmove_count).unwrap_or(0)
    }

    // -----------------------------------------------------------------------
    // Capture callback
    // -----------------------------------------------------------------------

    /// Install a capture callback, returning the previous one.
    ///
    /// The callback fires synchronously from [`Engine::commit_move`] while
    /// the captured piece is still on its square; it must not re-enter the
    /// engine (doing so panics on the shared board's `RefCell`).
    pub fn set_capture_callback(
        &mut self,
        callback: impl FnMut(Piece) + 'static,
    ) -> Option<CaptureCallback> {
        self.capture_callback.replace(Box::new(callback))
    }

    /// Remove and return the capture callback.
    pub fn take_capture_callback(&mut self) -> Option<CaptureCallback> {
        self.capture_callback.take()
    }

    // -----------------------------------------------------------------------
    // Piece queries
    // -----------------------------------------------------------------------

    /// Coordinates of every square matching the query, scanning rank-major
    /// from a1. Empty squares only match when the query asks for them.
    pub fn find_pieces(&self, query: &PieceQuery<'_>) -> Vec<Coord> {
        let mut positions = Vec::new();
        let board_rc = match &self.board {
            Some(board) => board,
            None => return positions,
        };
        let board = board_rc.borrow();

        for y in 0..WIDTH {
            for x in 0..WIDTH {
                let pos = Coord::new(x, y);
                let piece = match board.cell(pos) {
                    Some(piece) => piece,
                    None => continue,
                };

                let kind_matches = match query.kind {
                    KindFilter::AnyPiece => !piece.is_empty(),
                    KindFilter::Kind(kind) => piece.kind() == Some(kind),
                    KindFilter::Empty => piece.is_empty(),
                };
                if !kind_matches {
                    continue;
                }
                if query.color.is_some() && piece.color() != query.color {
                    continue;
                }
                if query.x.is_some_and(|qx| qx != x) {
                    continue;
                }
                if query.y.is_some_and(|qy| qy != y) {
                    continue;
                }
                if let Some(filter) = query.filter {
                    if !filter(piece) {
                        continue;
                    }
                }

                positions.push(pos);
            }
        }

        positions
    }

    // -----------------------------------------------------------------------
    // Check detection
    // -----------------------------------------------------------------------

    /// Whether any opposing piece attacks a king of `color`, and the squares
    /// of the attacking pieces. Memoized until the board changes.
    pub fn compute_check(&mut self, color: Color) -> (bool, Vec<Coord>) {
        if self.board.is_none() {
            return (false, Vec::new());
        }
        if let Some(cached) = &self.check_cache[color.index()] {
            trace!(%color, "check cache hit");
            return (!cached.is_empty(), cached.clone());
        }

        let kings = self.find_pieces(&PieceQuery {
            kind: KindFilter::Kind(PieceKind::King),
            color: Some(color),
            ..Default::default()
        });
        let offenders = self.check_against_squares(color, &kings);

        self.check_cache[color.index()] = Some(offenders.clone());
        (!offenders.is_empty(), offenders)
    }

    /// Check detection against an explicit set of king squares. Used both by
    /// [`Engine::compute_check`] and by the castling through-check gate,
    /// which probes the king's crossing squares before the king moves.
    fn check_against_squares(&mut self, color: Color, kings: &[Coord]) -> Vec<Coord> {
        let mut offenders = Vec::new();
        if kings.is_empty() {
            return offenders;
        }

        let opposing = self.find_pieces(&PieceQuery {
            color: Some(!color),
            ..Default::default()
        });
        for piece_pos in opposing {
            if let Some(moves) = self.compute_legal_moves(piece_pos) {
                if moves.iter().any(|destination| kings.contains(destination)) {
                    offenders.push(piece_pos);
                }
            }
        }
        offenders
    }

    /// Whether `color` is checkmated: it must be the side to move, and no
    /// piece of that color may have any legal move.
    pub fn compute_checkmate(&mut self, color: Color) -> bool {
        let side_to_move = match self.current_turn() {
            Some(side) => side,
            None => return false,
        };
        if color != side_to_move {
            return false;
        }
        if let Some(cached) = self.checkmate_cache {
            trace!(%color, "checkmate cache hit");
            return cached;
        }

        let pieces = self.find_pieces(&PieceQuery {
            color: Some(color),
            ..Default::default()
        });
        let mut checkmate = true;
        for pos in pieces {
            if let Some(moves) = self.compute_legal_moves(pos) {
                if !moves.is_empty() {
                    checkmate = false;
                    break;
                }
            }
        }

        self.checkmate_cache = Some(checkmate);
        checkmate
    }

    // -----------------------------------------------------------------------
    // Legal move generation
    // -----------------------------------------------------------------------

    /// Legal destinations for the piece on `pos`. `None` when the square is
    /// empty or out of bounds. Memoized per source square until the board
    /// changes.
    pub fn compute_legal_moves(&mut self, pos: Coord) -> Option<Vec<Coord>> {
        let board_rc = self.board.clone()?;

        if let Some(cached) = self.legal_move_cache.get(&pos) {
            trace!(source = %pos, "legal move cache hit");
            return Some(cached.clone());
        }

        let (color, kind) = board_rc.borrow().piece_at(pos)?;
        let mut destinations = {
            let board = board_rc.borrow();
            movegen::piece_destinations(&board, pos)?
        };
        let is_mover = color == board_rc.borrow().side_to_move;

        // Castling candidates. The through-check probe only runs for the
        // side to move; speculative generation for the opponent would
        // otherwise recurse into itself.
        if kind == PieceKind::King {
            let candidates = {
                let board = board_rc.borrow();
                movegen::castling_candidates(&board, color, pos)
            };
            for candidate in candidates {
                if is_mover {
                    let kings = [pos, candidate.intermediate, candidate.destination];
                    if !self.check_against_squares(color, &kings).is_empty() {
                        continue;
                    }
                }
                destinations.push(candidate.destination);
            }
        }

        // Self-check filter, side to move only.
        if is_mover {
            destinations = filter_self_check(&board_rc, pos, color, destinations);
        }

        self.legal_move_cache.insert(pos, destinations.clone());
        Some(destinations)
    }

    /// Whether a move is legal: membership in the source's legal set.
    pub fn is_move_legal(&mut self, mv: Move) -> bool {
        match self.compute_legal_moves(mv.from) {
            Some(moves) => moves.contains(&mv.to),
            None => false,
        }
    }

    // -----------------------------------------------------------------------
    // Commit
    // -----------------------------------------------------------------------

    /// Apply a move to the bound board.
    ///
    /// Fails (returning `false`, without mutation) when no board is bound,
    /// the source square is empty, the destination is out of bounds, or,
    /// with `check_legality`, the move is not legal. With `advance_turn`
    /// the clocks are updated and the side to move flips; the promotion
    /// flow defers that until the replacement piece is chosen.
    pub fn commit_move(&mut self, mv: Move, check_legality: bool, advance_turn: bool) -> bool {
        let board_rc = match &self.board {
            Some(board) => board.clone(),
            None => return false,
        };

        let (color, kind) = match board_rc.borrow().piece_at(mv.from) {
            Some(piece) => piece,
            None => return false,
        };
        if !Board::in_bounds(mv.to) {
            return false;
        }

        if check_legality && !self.is_move_legal(mv) {
            return false;
        }

        let mut reset_halfmove = kind == PieceKind::Pawn;

        // Resolve the capture square: an en-passant capture removes the pawn
        // beside the mover, not the destination square's occupant.
        let (capture_square, captured) = {
            let board = board_rc.borrow();
            let capture_square =
                if kind == PieceKind::Pawn && board.en_passant_target == Some(mv.to) {
                    Coord::new(mv.to.x, mv.from.y)
                } else {
                    mv.to
                };
            let captured = board
                .cell(capture_square)
                .filter(|piece| !piece.is_empty());
            (capture_square, captured)
        };

        // The callback fires before any mutation: it observes the captured
        // piece still on its square.
        if let Some(captured_piece) = captured {
            reset_halfmove = true;
            if let Some(callback) = self.capture_callback.as_mut() {
                callback(captured_piece);
            }
        }

        {
            let mut board = board_rc.borrow_mut();

            if captured.is_some() {
                board.set_piece(capture_square, Piece::Empty);
                revoke_corner_rights(&mut board, capture_square);
            }

            let moving = board.cell(mv.from).unwrap_or(Piece::Empty);
            board.set_piece(mv.from, Piece::Empty);
            board.set_piece(mv.to, moving);

            // A double pawn push opens an en-passant window on the square it
            // stepped over; any other move closes the window.
            if kind == PieceKind::Pawn && (mv.to.y - mv.from.y).abs() == 2 {
                board.en_passant_target =
                    Some(Coord::new(mv.from.x, (mv.from.y + mv.to.y) / 2));
            } else {
                board.en_passant_target = None;
            }

            // Any king move spends both castling rights; a two-file king
            // move is a castle and drags the rook along.
            if kind == PieceKind::King {
                board.castling[color.index()] = CastleFlags::NONE;
                let dx = mv.to.x - mv.from.x;
                if dx.abs() == 2 {
                    let direction = dx.signum();
                    let rook_from =
                        Coord::new(if direction > 0 { WIDTH - 1 } else { 0 }, mv.from.y);
                    let rook_to = Coord::new(mv.to.x - direction, mv.to.y);
                    if let Some(rook) = board.cell(rook_from) {
                        board.set_piece(rook_from, Piece::Empty);
                        board.set_piece(rook_to, rook);
                    }
                }
            }

            // A rook leaving its home corner spends that wing's right.
            if kind == PieceKind::Rook {
                let back_rank = match color {
                    Color::White => 0,
                    Color::Black => WIDTH - 1,
                };
                if mv.from.y == back_rank {
                    if mv.from.x == 0 {
                        board.castling[color.index()].remove(CastleFlags::QUEEN_SIDE);
                    } else if mv.from.x == WIDTH - 1 {
                        board.castling[color.index()].remove(CastleFlags::KING_SIDE);
                    }
                }
            }

            if advance_turn {
                if reset_halfmove {
                    board.halfmove_clock = 0;
                } else {
                    board.halfmove_clock += 1;
                }
                board.side_to_move = !board.side_to_move;
                if board.side_to_move == Color::White {
                    board.fullmove_count += 1;
                }
            }
        }

        debug!(%mv, capture = captured.is_some(), "committed move");
        self.clear_cache();
        self.last_move = Some(mv);
        true
    }

    // -----------------------------------------------------------------------
    // Promotion flow
    // -----------------------------------------------------------------------

    /// The square of a pawn awaiting promotion, if the last committed move
    /// put one on its final rank. Valid while the turn has not advanced
    /// past the committing side (commit with `advance_turn = false`).
    pub fn pending_promotion(&self) -> Option<Coord> {
        let mv = self.last_move?;
        let board = self.board.as_ref()?.borrow();
        let (color, kind) = board.piece_at(mv.to)?;
        if kind != PieceKind::Pawn || color != board.side_to_move {
            return None;
        }
        let final_rank = match color {
            Color::White => WIDTH - 1,
            Color::Black => 0,
        };
        (mv.to.y == final_rank).then_some(mv.to)
    }

    /// Replace a pawn awaiting promotion and advance the turn. Kings and
    /// pawns are not valid replacements. Returns `false` when nothing is
    /// pending or the kind is not allowed.
    pub fn promote(&mut self, kind: PieceKind) -> bool {
        let target = match self.pending_promotion() {
            Some(target) => target,
            None => return false,
        };
        if matches!(kind, PieceKind::King | PieceKind::Pawn) {
            return false;
        }

        // pending_promotion already proved the board exists.
        let board_rc = self.board.clone().expect("promotion requires a board");
        {
            let mut board = board_rc.borrow_mut();
            let color = board.side_to_move;
            board.set_piece(target, Piece::occupied(kind, color));
            board.advance_turn();
        }

        debug!(square = %target, %kind, "promoted pawn");
        self.clear_cache();
        true
    }

    // -----------------------------------------------------------------------
    // Caches
    // -----------------------------------------------------------------------

    /// Drop every memoized result. Commit and rebinding do this on their
    /// own; call it directly after mutating the board through the shared
    /// handle.
    pub fn clear_cache(&mut self) {
        self.legal_move_cache.clear();
        self.check_cache = [None, None];
        self.checkmate_cache = None;
    }
}

// ---------------------------------------------------------------------------
// Commit helpers (free functions)
// ---------------------------------------------------------------------------

/// Pass 3: discard candidates that leave the mover in check, by committing
/// each one on a deep copy through a scratch engine. One scratch engine is
/// reused and rebound per candidate so its caches never leak across boards.
fn filter_self_check(
    board_rc: &SharedBoard,
    pos: Coord,
    color: Color,
    candidates: Vec<Coord>,
) -> Vec<Coord> {
    let mut scratch = Engine::new();
    let mut kept = Vec::with_capacity(candidates.len());

    for destination in candidates {
        // The mover's own candidates never include capturing a king;
        // speculative opponent generation keeps king-attacking squares so
        // that check detection works.
        if let Some((_, kind)) = board_rc.borrow().piece_at(destination) {
            if kind == PieceKind::King {
                continue;
            }
        }

        let speculative = board_rc.borrow().clone();
        scratch.bind_board(Some(speculative.shared()));
        scratch.commit_move(Move::new(pos, destination), false, false);

        let (in_check, _) = scratch.compute_check(color);
        if !in_check {
            kept.push(destination);
        }
    }

    kept
}

/// Capturing into a rook home corner spends the resident side's castling
/// right on that wing, whether or not the rook is still there.
fn revoke_corner_rights(board: &mut Board, square: Coord) {
    let color = if square.y == 0 {
        Color::White
    } else if square.y == WIDTH - 1 {
        Color::Black
    } else {
        return;
    };
    if square.x == 0 {
        board.castling[color.index()].remove(CastleFlags::QUEEN_SIDE);
    } else if square.x == WIDTH - 1 {
        board.castling[color.index()].remove(CastleFlags::KING_SIDE);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
