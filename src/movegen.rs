//! Geometric move candidates.
//!
//! Enumerates destination squares per piece kind with blocker and
//! same-color-landing filtering folded in. Everything here is answerable
//! from the board alone; the self-check filter and the castling
//! through-check gate live in the engine, which can run speculative
//! commits.

use crate::board::{Board, WIDTH};
use crate::coord::Coord;
use crate::types::{CastleFlags, Color, PieceKind};

/// Mirror factors for offsets: applied per axis to cover all quadrants.
const DIRECTION_FACTORS: [i32; 2] = [1, -1];

const ROOK_DIRECTIONS: [Coord; 4] = [
    Coord::new(1, 0),
    Coord::new(-1, 0),
    Coord::new(0, 1),
    Coord::new(0, -1),
];

const BISHOP_DIRECTIONS: [Coord; 4] = [
    Coord::new(1, 1),
    Coord::new(1, -1),
    Coord::new(-1, 1),
    Coord::new(-1, -1),
];

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Destinations reachable by the piece on `pos` before self-check
/// filtering. Castling is not included (see [`castling_candidates`]).
/// `None` when the square is empty or out of bounds.
pub fn piece_destinations(board: &Board, pos: Coord) -> Option<Vec<Coord>> {
    let (color, kind) = board.piece_at(pos)?;
    let mut destinations = Vec::new();

    match kind {
        PieceKind::King => king_destinations(board, pos, color, &mut destinations),
        PieceKind::Queen => {
            ray_destinations(board, pos, color, &ROOK_DIRECTIONS, &mut destinations);
            ray_destinations(board, pos, color, &BISHOP_DIRECTIONS, &mut destinations);
        }
        PieceKind::Rook => ray_destinations(board, pos, color, &ROOK_DIRECTIONS, &mut destinations),
        PieceKind::Bishop => {
            ray_destinations(board, pos, color, &BISHOP_DIRECTIONS, &mut destinations)
        }
        PieceKind::Knight => knight_destinations(board, pos, color, &mut destinations),
        PieceKind::Pawn => pawn_destinations(board, pos, color, &mut destinations),
    }

    Some(destinations)
}

// ---------------------------------------------------------------------------
// King
// ---------------------------------------------------------------------------

fn king_destinations(board: &Board, pos: Coord, color: Color, out: &mut Vec<Coord>) {
    for x_step in -1..=1 {
        for y_step in -1..=1 {
            let step = Coord::new(x_step, y_step);
            if step.taxicab_length() == 0 {
                continue;
            }
            let destination = pos + step;
            if !Board::in_bounds(destination) {
                continue;
            }
            if board.piece_at(destination).map(|(c, _)| c) == Some(color) {
                continue;
            }
            out.push(destination);
        }
    }
}

// ---------------------------------------------------------------------------
// Knight
// ---------------------------------------------------------------------------

fn knight_destinations(board: &Board, pos: Coord, color: Color, out: &mut Vec<Coord>) {
    const OFFSETS: [Coord; 2] = [Coord::new(2, 1), Coord::new(1, 2)];

    for x_factor in DIRECTION_FACTORS {
        for y_factor in DIRECTION_FACTORS {
            let mirror = Coord::new(x_factor, y_factor);
            for offset in OFFSETS {
                let destination = pos + mirror * offset;
                if !Board::in_bounds(destination) {
                    continue;
                }
                if board.piece_at(destination).map(|(c, _)| c) == Some(color) {
                    continue;
                }
                out.push(destination);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Sliders
// ---------------------------------------------------------------------------

/// Walk each direction until the edge or a blocker. An opposing blocker is
/// a capture destination; a same-color blocker is not. Blockers are never
/// crossed.
fn ray_destinations(
    board: &Board,
    pos: Coord,
    color: Color,
    directions: &[Coord],
    out: &mut Vec<Coord>,
) {
    for &direction in directions {
        let mut current = pos + direction;
        while Board::in_bounds(current) {
            match board.piece_at(current) {
                Some((blocker_color, _)) => {
                    if blocker_color != color {
                        out.push(current);
                    }
                    break;
                }
                None => out.push(current),
            }
            current += direction;
        }
    }
}

// ---------------------------------------------------------------------------
// Pawn
// ---------------------------------------------------------------------------

fn pawn_destinations(board: &Board, pos: Coord, color: Color, out: &mut Vec<Coord>) {
    let step = match color {
        Color::White => Coord::new(0, 1),
        Color::Black => Coord::new(0, -1),
    };

    let single_step = pos + step;
    if Board::in_bounds(single_step) && board.piece_at(single_step).is_none() {
        out.push(single_step);

        let starting_y = match color {
            Color::White => 1,
            Color::Black => WIDTH - 2,
        };
        let double_step = single_step + step;
        if pos.y == starting_y
            && Board::in_bounds(double_step)
            && board.piece_at(double_step).is_none()
        {
            out.push(double_step);
        }
    }

    // Diagonal captures: one forward step plus one sideways step, onto an
    // opposing piece or onto the en-passant target square.
    for capture_direction in DIRECTION_FACTORS {
        let capture_step = single_step + Coord::new(capture_direction, 0);
        match board.piece_at(capture_step) {
            Some((occupant_color, _)) => {
                if occupant_color != color {
                    out.push(capture_step);
                }
            }
            None => {
                if Board::in_bounds(capture_step) && board.en_passant_target == Some(capture_step)
                {
                    out.push(capture_step);
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Castling candidates
// ---------------------------------------------------------------------------

/// A castling destination plus the square the king crosses to get there.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CastlingCandidate {
    pub destination: Coord,
    pub intermediate: Coord,
}

/// Castling candidates for a king, from the castling flags and a path scan.
///
/// For each side still available, the file between the king and the board
/// edge is scanned: every occupied square must hold a same-color rook, and
/// anything else invalidates the side. Through-check is not judged here;
/// the engine applies it only when the king's color is to move.
pub fn castling_candidates(board: &Board, color: Color, king_pos: Coord) -> Vec<CastlingCandidate> {
    let flags = board.castling[color.index()];
    let mut candidates = Vec::new();

    for (flag, direction) in [
        (CastleFlags::KING_SIDE, 1),
        (CastleFlags::QUEEN_SIDE, -1),
    ] {
        if !flags.has(flag) {
            continue;
        }

        let step = Coord::new(direction, 0);
        let mut current = king_pos + step;
        let mut clear = true;
        while Board::in_bounds(current) {
            if let Some((occupant_color, kind)) = board.piece_at(current) {
                if occupant_color != color || kind != PieceKind::Rook {
                    clear = false;
                    break;
                }
            }
            current += step;
        }
        if !clear {
            continue;
        }

        let destination = king_pos + step * 2;
        if Board::in_bounds(destination) {
            candidates.push(CastlingCandidate {
                destination,
                intermediate: king_pos + step,
            });
        }
    }

    candidates
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
