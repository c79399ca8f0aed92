use crate::bitboard::pop_lsb;
use crate::board::{Board, Color, Piece};
use crate::moves::attacks::{bishop_attacks, in_check, is_legal_castling, queen_attacks, rook_attacks};
use crate::moves::execute::make_move;
use crate::moves::tables::{RANK_1, RANK_2, RANK_7, RANK_8, tables};
use crate::moves::types::{Move, MoveBuffer, MoveFlag, MoveList};
use crate::square::Square;

// Squares that must be empty between king and rook.
const WHITE_KINGSIDE_GAP: u64 = 0x0000_0000_0000_0060; // f1 g1
const WHITE_QUEENSIDE_GAP: u64 = 0x0000_0000_0000_000E; // b1 c1 d1
const BLACK_KINGSIDE_GAP: u64 = 0x6000_0000_0000_0000; // f8 g8
const BLACK_QUEENSIDE_GAP: u64 = 0x0E00_0000_0000_0000; // b8 c8 d8

const PROMO_PUSH_FLAGS: [MoveFlag; 4] = [
    MoveFlag::PromoQueen,
    MoveFlag::PromoRook,
    MoveFlag::PromoBishop,
    MoveFlag::PromoKnight,
];
const PROMO_CAPTURE_FLAGS: [MoveFlag; 4] = [
    MoveFlag::PromoCaptureQueen,
    MoveFlag::PromoCaptureRook,
    MoveFlag::PromoCaptureBishop,
    MoveFlag::PromoCaptureKnight,
];

#[inline(always)]
fn push_targets(from: u8, mut targets: u64, enemy: u64, out: &mut impl MoveBuffer) {
    while targets != 0 {
        let to = pop_lsb(&mut targets);
        let flag = if enemy >> to & 1 != 0 {
            MoveFlag::Capture
        } else {
            MoveFlag::Quiet
        };
        out.push(Move::new(
            Square::from_index(from),
            Square::from_index(to),
            flag,
        ));
    }
}

pub fn generate_pawn_moves(board: &Board, out: &mut impl MoveBuffer) {
    let color = board.side_to_move;
    let pawns = board.bb(color, Piece::Pawn);
    let enemy = board.opponent_occupancy(color) & !board.bb(!color, Piece::King);
    let empty = !board.occupied();
    let t = tables();

    let (promo_rank, start_rank) = match color {
        Color::White => (RANK_8, RANK_2),
        Color::Black => (RANK_1, RANK_7),
    };

    // Single pushes, promotions included.
    let single = match color {
        Color::White => (pawns << 8) & empty,
        Color::Black => (pawns >> 8) & empty,
    };
    let mut bb = single;
    while bb != 0 {
        let to = pop_lsb(&mut bb);
        let from = match color {
            Color::White => to - 8,
            Color::Black => to + 8,
        };
        if promo_rank >> to & 1 != 0 {
            for flag in PROMO_PUSH_FLAGS {
                out.push(Move::new(
                    Square::from_index(from),
                    Square::from_index(to),
                    flag,
                ));
            }
        } else {
            out.push(Move::new(
                Square::from_index(from),
                Square::from_index(to),
                MoveFlag::Quiet,
            ));
        }
    }

    // Double pushes: both the skipped and the target square are empty.
    let double = match color {
        Color::White => (((pawns & start_rank) << 8) & empty) << 8 & empty,
        Color::Black => (((pawns & start_rank) >> 8) & empty) >> 8 & empty,
    };
    let mut bb = double;
    while bb != 0 {
        let to = pop_lsb(&mut bb);
        let from = match color {
            Color::White => to - 16,
            Color::Black => to + 16,
        };
        out.push(Move::new(
            Square::from_index(from),
            Square::from_index(to),
            MoveFlag::Quiet,
        ));
    }

    // Captures on the two forward diagonals, promotions included.
    let mut attackers = pawns;
    while attackers != 0 {
        let from = pop_lsb(&mut attackers);
        let mut targets = t.pawn[color as usize][from as usize] & enemy;
        while targets != 0 {
            let to = pop_lsb(&mut targets);
            if promo_rank >> to & 1 != 0 {
                for flag in PROMO_CAPTURE_FLAGS {
                    out.push(Move::new(
                        Square::from_index(from),
                        Square::from_index(to),
                        flag,
                    ));
                }
            } else {
                out.push(Move::new(
                    Square::from_index(from),
                    Square::from_index(to),
                    MoveFlag::Capture,
                ));
            }
        }
    }

    // En passant. Sanity-check the target and the bypassed pawn so a
    // stale FEN field cannot produce a phantom capture.
    if let Some(ep) = board.en_passant {
        let ep_idx = ep.index();
        if empty >> ep_idx & 1 != 0 {
            let victim_sq = match color {
                Color::White => ep_idx - 8,
                Color::Black => ep_idx + 8,
            };
            if board.bb(!color, Piece::Pawn) >> victim_sq & 1 != 0 {
                // A pawn can take en passant iff the ep square is in
                // its own attack pattern.
                let mut candidates = pawns;
                while candidates != 0 {
                    let from = pop_lsb(&mut candidates);
                    if t.pawn[color as usize][from as usize] & ep.bb() != 0 {
                        out.push(Move::new(Square::from_index(from), ep, MoveFlag::EnPassant));
                    }
                }
            }
        }
    }
}

pub fn generate_knight_moves(board: &Board, out: &mut impl MoveBuffer) {
    let color = board.side_to_move;
    let friendly = board.occupancy(color);
    let enemy_king = board.bb(!color, Piece::King);
    let enemy = board.opponent_occupancy(color) & !enemy_king;
    let t = tables();

    let mut knights = board.bb(color, Piece::Knight);
    while knights != 0 {
        let from = pop_lsb(&mut knights);
        let targets = t.knight[from as usize] & !friendly & !enemy_king;
        push_targets(from, targets, enemy, out);
    }
}

/// Bishop, rook and queen moves via occupancy-aware ray scans.
pub fn generate_slider_moves(board: &Board, out: &mut impl MoveBuffer) {
    let color = board.side_to_move;
    let friendly = board.occupancy(color);
    let enemy_king = board.bb(!color, Piece::King);
    let enemy = board.opponent_occupancy(color) & !enemy_king;
    let occupancy = board.occupied();

    for piece in [Piece::Bishop, Piece::Rook, Piece::Queen] {
        let mut sliders = board.bb(color, piece);
        while sliders != 0 {
            let from = pop_lsb(&mut sliders);
            let attacks = match piece {
                Piece::Bishop => bishop_attacks(from, occupancy),
                Piece::Rook => rook_attacks(from, occupancy),
                _ => queen_attacks(from, occupancy),
            };
            let targets = attacks & !friendly & !enemy_king;
            push_targets(from, targets, enemy, out);
        }
    }
}

pub fn generate_king_moves(board: &Board, out: &mut impl MoveBuffer) {
    let color = board.side_to_move;
    let from = board.king_square(color);
    let friendly = board.occupancy(color);
    let enemy_king = board.bb(!color, Piece::King);
    let enemy = board.opponent_occupancy(color) & !enemy_king;
    let t = tables();

    let targets = t.king[from.index() as usize] & !friendly & !enemy_king;
    push_targets(from.index(), targets, enemy, out);

    // Castling: right present, gap empty, transit squares safe.
    let occupancy = board.occupied();
    let (kingside_gap, queenside_gap) = match color {
        Color::White => (WHITE_KINGSIDE_GAP, WHITE_QUEENSIDE_GAP),
        Color::Black => (BLACK_KINGSIDE_GAP, BLACK_QUEENSIDE_GAP),
    };

    if board.has_kingside_castle(color) && occupancy & kingside_gap == 0 {
        let mv = Move::new(
            from,
            Square::from_index(from.index() + 2),
            MoveFlag::Castling,
        );
        if is_legal_castling(board, mv) {
            out.push(mv);
        }
    }
    if board.has_queenside_castle(color) && occupancy & queenside_gap == 0 {
        let mv = Move::new(
            from,
            Square::from_index(from.index() - 2),
            MoveFlag::Castling,
        );
        if is_legal_castling(board, mv) {
            out.push(mv);
        }
    }
}

/// All pseudo-legal moves for the side to move: piece movement rules
/// respected, own-king safety not yet verified (castling excepted, its
/// transit check happens at emission).
pub fn generate_pseudo_legal(board: &Board, out: &mut impl MoveBuffer) {
    out.clear();
    generate_pawn_moves(board, out);
    generate_knight_moves(board, out);
    generate_slider_moves(board, out);
    generate_king_moves(board, out);
}

/// All legal moves for the side to move: each pseudo-legal move is
/// applied to a scratch copy and kept only if the mover's king is safe
/// afterwards.
pub fn generate_legal(board: &Board, out: &mut impl MoveBuffer) {
    let mut pseudo = MoveList::new();
    generate_pseudo_legal(board, &mut pseudo);

    out.clear();
    let mover = board.side_to_move;
    let mut scratch = board.clone();
    for &mv in pseudo.iter() {
        scratch.clone_from(board);
        make_move(&mut scratch, mv);
        if !in_check(&scratch, mover) {
            out.push(mv);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn legal(fen: &str) -> Vec<Move> {
        let board = Board::from_fen(fen).unwrap();
        let mut moves = Vec::new();
        generate_legal(&board, &mut moves);
        moves
    }

    #[test]
    fn startpos_has_twenty_moves() {
        let moves = legal(crate::board::START_FEN);
        assert_eq!(moves.len(), 20);
        assert!(moves.iter().all(|m| m.flag == MoveFlag::Quiet));
    }

    #[test]
    fn promotion_push_expands_to_four_flags() {
        let moves = legal("4k3/P7/8/8/8/8/8/4K3 w - - 0 1");
        let promos: Vec<_> = moves
            .iter()
            .filter(|m| m.from == Square::from_str("a7").unwrap())
            .collect();
        assert_eq!(promos.len(), 4);
        assert!(promos.iter().all(|m| m.flag.is_promotion()));
    }

    #[test]
    fn blocked_pawn_cannot_double_push() {
        // Knight on e3 blocks the skipped square.
        let moves = legal("4k3/8/8/8/8/4n3/4P3/4K3 w - - 0 1");
        assert!(
            !moves
                .iter()
                .any(|m| m.from == Square::from_str("e2").unwrap()
                    && m.to == Square::from_str("e4").unwrap())
        );
    }

    #[test]
    fn castling_requires_empty_gap() {
        // Bishop on f1 blocks kingside.
        let moves = legal("4k3/8/8/8/8/8/8/R3KB1R w KQ - 0 1");
        assert!(!moves.iter().any(|m| m.flag == MoveFlag::Castling
            && m.to == Square::from_str("g1").unwrap()));
        assert!(moves.iter().any(|m| m.flag == MoveFlag::Castling
            && m.to == Square::from_str("c1").unwrap()));
    }

    #[test]
    fn castling_through_attack_is_rejected_at_generation() {
        // Black rook on f8 sees f1 down the open file.
        let moves = legal("4kr2/8/8/8/8/8/8/R3K2R w KQ - 0 1");
        assert!(!moves.iter().any(|m| m.flag == MoveFlag::Castling
            && m.to == Square::from_str("g1").unwrap()));
        assert!(moves.iter().any(|m| m.flag == MoveFlag::Castling
            && m.to == Square::from_str("c1").unwrap()));
    }
}
