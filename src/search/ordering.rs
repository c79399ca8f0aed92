use crate::board::{Board, Piece};
use crate::moves::types::{Move, MoveFlag};

const BAND_WEIGHT: i32 = 100_000;

/// Most-valuable-victim / least-valuable-attacker score for a capture;
/// 0 for anything else. En passant always takes a pawn with a pawn.
pub fn mvv_lva(board: &Board, mv: Move) -> i32 {
    if mv.flag == MoveFlag::EnPassant {
        return Piece::Pawn.value() * 10 - Piece::Pawn.attacker_rank();
    }
    if !mv.is_capture() {
        return 0;
    }
    let Some((_, victim)) = board.piece_at(mv.to) else {
        return 0;
    };
    let attacker = board
        .piece_at(mv.from)
        .map(|(_, p)| p)
        .unwrap_or(Piece::Pawn);
    victim.value() * 10 - attacker.attacker_rank()
}

/// Sorts best-first: promotion-captures, promotions, captures,
/// castling, en passant, quiets. Within the promotion bands, bigger
/// promotion pieces first; within captures, MVV-LVA. The sort is
/// stable, so equal keys keep generation order and the result stays
/// deterministic.
pub fn order_moves(moves: &mut [Move], board: &Board) {
    moves.sort_by_cached_key(|&mv| {
        let detail = match mv.flag.ordering_band() {
            5 | 4 => mv.promotion_piece().map_or(0, Piece::value),
            3 => mvv_lva(board, mv),
            _ => 0,
        };
        -(mv.flag.ordering_band() * BAND_WEIGHT + detail)
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moves::movegen::generate_legal;
    use std::str::FromStr;

    #[test]
    fn captures_sort_by_victim_value() {
        // White queen on d4 can take a pawn (a7), a rook (d8) or a
        // knight (h4).
        let board = Board::from_fen("3rk3/p7/8/8/3Q3n/8/8/4K3 w - - 0 1").unwrap();
        let mut moves = Vec::new();
        generate_legal(&board, &mut moves);
        order_moves(&mut moves, &board);

        let captures: Vec<String> = moves
            .iter()
            .filter(|m| m.is_capture())
            .map(|m| m.to.to_string())
            .collect();
        assert_eq!(captures, vec!["d8", "h4", "a7"]);
    }

    #[test]
    fn promotion_capture_outranks_everything() {
        // Pawn on b7 can promote quietly or capture the a8 rook.
        let board = Board::from_fen("r3k3/1P6/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        let mut moves = Vec::new();
        generate_legal(&board, &mut moves);
        order_moves(&mut moves, &board);

        assert_eq!(moves[0].to, crate::square::Square::from_str("a8").unwrap());
        assert_eq!(moves[0].flag, MoveFlag::PromoCaptureQueen);
        // Quiet queen promotion comes right after the capture band.
        assert_eq!(moves[4].flag, MoveFlag::PromoQueen);
    }

    #[test]
    fn ordering_is_deterministic() {
        let board = Board::from_fen("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq -")
            .unwrap();
        let mut a = Vec::new();
        generate_legal(&board, &mut a);
        let mut b = a.clone();
        order_moves(&mut a, &board);
        order_moves(&mut b, &board);
        assert_eq!(a, b);
    }
}
