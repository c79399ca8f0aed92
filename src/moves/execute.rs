use crate::board::{
    Board, CASTLE_BK, CASTLE_BQ, CASTLE_WK, CASTLE_WQ, Color, Piece,
};
use crate::hash::zobrist::{xor_castling_delta, zobrist_keys};
use crate::moves::types::{Move, MoveFlag};
use crate::square::Square;

/// The castling right forfeited when a rook leaves (or is captured on)
/// the given corner.
#[inline(always)]
fn corner_right(color: Color, sq: u8) -> u8 {
    match (color, sq) {
        (Color::White, 0) => CASTLE_WQ,  // a1
        (Color::White, 7) => CASTLE_WK,  // h1
        (Color::Black, 56) => CASTLE_BQ, // a8
        (Color::Black, 63) => CASTLE_BK, // h8
        _ => 0,
    }
}

/// Rook relocation for a castling move, keyed by the king's
/// destination.
#[inline(always)]
fn castling_rook_squares(king_to: u8) -> (Square, Square) {
    let (from, to) = match king_to {
        6 => (7u8, 5u8),    // white O-O: h1 -> f1
        2 => (0, 3),        // white O-O-O: a1 -> d1
        62 => (63, 61),     // black O-O: h8 -> f8
        58 => (56, 59),     // black O-O-O: a8 -> d8
        other => panic!("castling king destination {other} is not a castle square"),
    };
    (Square::from_index(from), Square::from_index(to))
}

/// Applies `mv` in place: bitboards, mailbox, king cache, castling
/// rights, en-passant target, clocks, side to move, and the Zobrist
/// hash are all updated incrementally. Reversal is by snapshot
/// (`Game::pop`), so no undo record is produced here.
pub fn make_move(board: &mut Board, mv: Move) {
    let keys = zobrist_keys();
    let color = board.side_to_move;

    if mv.flag == MoveFlag::Pass {
        board.side_to_move = !color;
        board.zobrist ^= keys.side_to_move;
        return;
    }

    let (mover_color, piece) = board
        .piece_at(mv.from)
        .unwrap_or_else(|| panic!("no piece on {} for move {}", mv.from, mv));
    debug_assert_eq!(mover_color, color, "moving an opponent piece");

    // En-passant victims sit behind the target square; for every other
    // move the victim (if any) is on the target itself.
    let victim = if mv.flag == MoveFlag::EnPassant {
        None
    } else {
        board.piece_at(mv.to)
    };

    // A pending en-passant target expires the instant any move is made.
    if let Some(ep) = board.en_passant.take() {
        board.zobrist ^= keys.ep_file[ep.file() as usize];
    }

    let mut reset_halfmove = false;

    if let Some((victim_color, victim_piece)) = victim {
        debug_assert_ne!(victim_piece, Piece::King, "king captured by {mv}");
        reset_halfmove = true;
        board.remove_piece(victim_color, victim_piece, mv.to);
    }

    board.remove_piece(color, piece, mv.from);
    match mv.promotion_piece() {
        Some(promoted) => board.place_piece(color, promoted, mv.to),
        None => board.place_piece(color, piece, mv.to),
    }

    let mut rights_to_clear = 0u8;

    match piece {
        Piece::Pawn => {
            reset_halfmove = true;
            if mv.to.rank().abs_diff(mv.from.rank()) == 2 {
                // Double push: the skipped square becomes capturable.
                let skipped = Square::from_index((mv.from.index() + mv.to.index()) / 2);
                board.en_passant = Some(skipped);
                board.zobrist ^= keys.ep_file[skipped.file() as usize];
            } else if mv.flag == MoveFlag::EnPassant {
                let captured = match color {
                    Color::White => mv.to.index() - 8,
                    Color::Black => mv.to.index() + 8,
                };
                board.remove_piece(!color, Piece::Pawn, Square::from_index(captured));
            }
        }
        Piece::Rook => {
            rights_to_clear |= corner_right(color, mv.from.index());
        }
        Piece::King => {
            board.set_king_square(color, mv.to);
            if mv.flag == MoveFlag::Castling {
                let (rook_from, rook_to) = castling_rook_squares(mv.to.index());
                board.remove_piece(color, Piece::Rook, rook_from);
                board.place_piece(color, Piece::Rook, rook_to);
            }
            rights_to_clear |= match color {
                Color::White => CASTLE_WK | CASTLE_WQ,
                Color::Black => CASTLE_BK | CASTLE_BQ,
            };
        }
        _ => {}
    }

    if let Some((victim_color, Piece::Rook)) = victim {
        rights_to_clear |= corner_right(victim_color, mv.to.index());
    }

    let new_rights = board.castling_rights & !rights_to_clear;
    if new_rights != board.castling_rights {
        xor_castling_delta(&mut board.zobrist, keys, board.castling_rights, new_rights);
        board.castling_rights = new_rights;
    }

    board.rebuild_occupancies();

    if reset_halfmove {
        board.halfmove_clock = 0;
    } else {
        board.halfmove_clock += 1;
    }
    if color == Color::Black {
        board.fullmove_number += 1;
    }
    board.side_to_move = !color;
    board.zobrist ^= keys.side_to_move;

    debug_assert_eq!(
        board.zobrist,
        board.compute_zobrist_full(),
        "incremental hash diverged after {mv}"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::START_FEN;
    use std::str::FromStr;

    fn mv(from: &str, to: &str, flag: MoveFlag) -> Move {
        Move::new(
            Square::from_str(from).unwrap(),
            Square::from_str(to).unwrap(),
            flag,
        )
    }

    #[test]
    fn double_push_sets_en_passant_target() {
        let mut board = Board::from_fen(START_FEN).unwrap();
        make_move(&mut board, mv("e2", "e4", MoveFlag::Quiet));
        assert_eq!(board.en_passant.unwrap().to_string(), "e3");
        assert_eq!(board.side_to_move, Color::Black);
        board.validate().unwrap();
    }

    #[test]
    fn single_push_clears_en_passant_target() {
        let mut board = Board::from_fen(START_FEN).unwrap();
        make_move(&mut board, mv("e2", "e4", MoveFlag::Quiet));
        make_move(&mut board, mv("a7", "a6", MoveFlag::Quiet));
        assert_eq!(board.en_passant, None);
        board.validate().unwrap();
    }

    #[test]
    fn en_passant_capture_removes_the_bypassed_pawn() {
        let mut board = Board::from_fen("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 1").unwrap();
        make_move(&mut board, mv("e5", "d6", MoveFlag::EnPassant));
        board.validate().unwrap();
        assert_eq!(board.bb(Color::Black, Piece::Pawn), 0);
        let d6 = Square::from_str("d6").unwrap();
        assert_eq!(board.piece_at(d6), Some((Color::White, Piece::Pawn)));
    }

    #[test]
    fn kingside_castle_moves_both_king_and_rook() {
        let mut board = Board::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        make_move(&mut board, mv("e1", "g1", MoveFlag::Castling));
        board.validate().unwrap();
        assert_eq!(board.king_square(Color::White).to_string(), "g1");
        let f1 = Square::from_str("f1").unwrap();
        assert_eq!(board.piece_at(f1), Some((Color::White, Piece::Rook)));
        assert!(!board.has_kingside_castle(Color::White));
        assert!(!board.has_queenside_castle(Color::White));
        // Black rights untouched.
        assert!(board.has_kingside_castle(Color::Black));
    }

    #[test]
    fn rook_capture_on_corner_clears_opponent_right() {
        let mut board = Board::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        make_move(&mut board, mv("a1", "a8", MoveFlag::Capture));
        board.validate().unwrap();
        assert!(!board.has_queenside_castle(Color::Black));
        assert!(board.has_kingside_castle(Color::Black));
        // Mover's own queenside right also gone (rook left a1).
        assert!(!board.has_queenside_castle(Color::White));
    }

    #[test]
    fn promotion_swaps_the_pawn_for_the_flag_piece() {
        let mut board = Board::from_fen("4k3/P7/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        make_move(&mut board, mv("a7", "a8", MoveFlag::PromoQueen));
        board.validate().unwrap();
        assert_eq!(board.bb(Color::White, Piece::Pawn), 0);
        let a8 = Square::from_str("a8").unwrap();
        assert_eq!(board.piece_at(a8), Some((Color::White, Piece::Queen)));
        assert_eq!(board.halfmove_clock, 0);
    }

    #[test]
    fn pass_only_toggles_side_and_hash() {
        let mut board = Board::from_fen(START_FEN).unwrap();
        let before = board.clone();
        make_move(&mut board, Move::pass());
        assert_eq!(board.side_to_move, Color::Black);
        assert_eq!(board.occ_all, before.occ_all);
        assert_ne!(board.zobrist, before.zobrist);
        make_move(&mut board, Move::pass());
        assert_eq!(board, before);
    }

    #[test]
    fn clocks_follow_capture_and_pawn_rules() {
        let mut board = Board::from_fen("4k3/8/8/8/8/8/4P3/R3K3 w - - 7 30").unwrap();
        make_move(&mut board, mv("a1", "a2", MoveFlag::Quiet));
        assert_eq!(board.halfmove_clock, 8);
        assert_eq!(board.fullmove_number, 30);
        make_move(&mut board, mv("e8", "e7", MoveFlag::Quiet));
        assert_eq!(board.halfmove_clock, 9);
        assert_eq!(board.fullmove_number, 31);
    }
}
