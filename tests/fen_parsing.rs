//! FEN parsing and serialization suite.
//!
//! Every FEN that parses must serialize back to itself (after whitespace
//! normalization and castling-letter canonicalization); every malformed FEN
//! must be rejected without producing a board.

use chess_rules::{Board, Color};

fn assert_round_trip(fen: &str) {
    let board = Board::from_fen(fen).unwrap_or_else(|e| panic!("'{fen}' failed to parse: {e}"));
    assert_eq!(board.to_fen(), fen, "round trip mismatch for '{fen}'");
}

// =====================================================================
// Valid FEN strings
// =====================================================================

#[test]
fn starting_position_round_trips() {
    assert_round_trip("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1");
}

#[test]
fn empty_board_round_trips() {
    assert_round_trip("8/8/8/8/8/8/8/8 w - - 0 1");
}

#[test]
fn kings_and_queens_round_trip() {
    assert_round_trip("3qk3/8/8/8/8/8/8/3QK3 w - - 0 1");
}

#[test]
fn en_passant_target_round_trips() {
    assert_round_trip("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1");
}

#[test]
fn partial_castling_and_clocks_round_trip() {
    assert_round_trip("r3k2r/pppppppp/8/8/8/8/PPPPPPPP/R3K2R b Kq - 13 37");
}

#[test]
fn default_board_matches_starting_fen() {
    assert_eq!(
        Board::starting().to_fen(),
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"
    );
}

// =====================================================================
// Normalization
// =====================================================================

#[test]
fn duplicate_whitespace_is_collapsed() {
    let board = Board::from_fen("8/8/8/8/8/8/8/8  b  -  -  4  9").unwrap();
    assert_eq!(board.to_fen(), "8/8/8/8/8/8/8/8 b - - 4 9");
    assert_eq!(board.side_to_move, Color::Black);
}

#[test]
fn castling_letters_come_out_canonical() {
    let board = Board::from_fen("8/8/8/8/8/8/8/8 w qKkQ - 0 1").unwrap();
    assert_eq!(board.to_fen(), "8/8/8/8/8/8/8/8 w KQkq - 0 1");
}

// =====================================================================
// Invalid FEN strings
// =====================================================================

#[test]
fn invalid_fen_strings_are_rejected() {
    let cases = [
        "",
        "8/8/8/8/8/8/8 w - - 0 1",     // seven ranks
        "8/8/8/8/8/8/8/8 f - - 0 1",   // bad side to move
        "8/8/8/8/8/8/8/8 w abAB - 0 1", // bad castling letters
        "8/8/8/8/8/8/8/8 w - i1 0 1",  // file off the board
        "8/8/8/8/8/8/8/8 w - a9 0 1",  // rank off the board
        "8/8/8/8/8/8/8/8 w - abc 0 1", // not a coordinate
    ];
    for fen in cases {
        assert!(Board::from_fen(fen).is_err(), "'{fen}' should be rejected");
    }
}

#[test]
fn malformed_placement_is_rejected() {
    let cases = [
        "rnbqkbnrr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1", // rank overflow
        "rnbqkbn/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",   // rank underflow
        "xnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",  // unknown character
        "9/8/8/8/8/8/8/8 w - - 0 1",                                 // digit out of range
    ];
    for fen in cases {
        assert!(Board::from_fen(fen).is_err(), "'{fen}' should be rejected");
    }
}

#[test]
fn malformed_counters_are_rejected() {
    assert!(Board::from_fen("8/8/8/8/8/8/8/8 w - - x 1").is_err());
    assert!(Board::from_fen("8/8/8/8/8/8/8/8 w - - 0 0").is_err());
    assert!(Board::from_fen("8/8/8/8/8/8/8/8 w - - -1 1").is_err());
}

#[test]
fn rejection_produces_no_board() {
    // The constructor is the only way in; an Err carries nothing.
    let result = Board::from_fen("8/8/8/8/8/8/8/8 w - a9 0 1");
    assert!(result.is_err());
}
