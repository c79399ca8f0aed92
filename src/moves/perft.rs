use tracing::instrument;

use crate::board::Board;
use crate::moves::execute::make_move;
use crate::moves::movegen::generate_legal;
use crate::moves::types::{Move, MoveList};

/// Per-category tallies for a perft run. Tags are edge-based: a move is
/// counted at the ply it is played, checks and mates at the leaves.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PerftCounters {
    pub nodes: u64,
    pub captures: u64,
    pub ep_captures: u64,
    pub castles: u64,
    pub promotions: u64,
    pub checks: u64,
    pub checkmates: u64,
}

/// Leaf count of the legal move tree to `depth`. Depth-one subtrees
/// are counted in bulk from the move list, without playing the moves.
#[instrument(skip(board), fields(depth))]
pub fn perft(board: &mut Board, depth: u32) -> u64 {
    if depth == 0 {
        return 1;
    }
    let mut moves = MoveList::new();
    generate_legal(board, &mut moves);
    if depth == 1 {
        return moves.len() as u64;
    }

    let saved = board.clone();
    let mut nodes = 0;
    for &mv in moves.iter() {
        make_move(board, mv);
        nodes += perft(board, depth - 1);
        board.clone_from(&saved);
    }
    nodes
}

/// Root move breakdown: each legal root move with the leaf count of
/// its subtree. The sum of the counts equals `perft(board, depth)`.
#[instrument(skip(board), fields(depth))]
pub fn perft_divide(board: &mut Board, depth: u32) -> Vec<(Move, u64)> {
    assert!(depth >= 1, "divide needs at least depth 1");
    let mut moves = MoveList::new();
    generate_legal(board, &mut moves);

    let saved = board.clone();
    let mut out = Vec::with_capacity(moves.len());
    for &mv in moves.iter() {
        make_move(board, mv);
        let nodes = perft(board, depth - 1);
        board.clone_from(&saved);
        out.push((mv, nodes));
    }
    out
}

/// Perft with the full category breakdown. Slower than `perft`: every
/// leaf is visited to classify checks and mates.
pub fn perft_with_breakdown(board: &mut Board, depth: u32, out: &mut PerftCounters) {
    use crate::moves::attacks::in_check;

    if depth == 0 {
        out.nodes += 1;
        let side = board.side_to_move;
        if in_check(board, side) {
            out.checks += 1;
            let mut moves = MoveList::new();
            generate_legal(board, &mut moves);
            if moves.is_empty() {
                out.checkmates += 1;
            }
        }
        return;
    }

    let mut moves = MoveList::new();
    generate_legal(board, &mut moves);

    let saved = board.clone();
    for &mv in moves.iter() {
        if mv.is_capture() {
            out.captures += 1;
        }
        match mv.flag {
            crate::moves::types::MoveFlag::EnPassant => out.ep_captures += 1,
            crate::moves::types::MoveFlag::Castling => out.castles += 1,
            _ => {}
        }
        if mv.is_promotion() {
            out.promotions += 1;
        }

        make_move(board, mv);
        perft_with_breakdown(board, depth - 1, out);
        board.clone_from(&saved);
    }
}
