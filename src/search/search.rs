use std::sync::atomic::{AtomicBool, Ordering};

use tracing::debug;

use crate::game::Game;
use crate::moves::attacks::in_check;
use crate::moves::types::Move;
use crate::search::eval::static_eval;
use crate::search::ordering::order_moves;

pub const INF: i32 = 32_000;
pub const MATE_SCORE: i32 = 31_000;
/// Scores beyond this are mate-in-N; the ply offset makes shorter
/// mates score higher.
pub const MATE_THRESHOLD: i32 = MATE_SCORE - 1_000;
pub const DRAW_SCORE: i32 = 0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    pub best_move: Option<Move>,
    pub score: i32,
    pub nodes: u64,
}

/// Fixed-depth negamax with alpha-beta. Pure function of position and
/// depth: repeated calls return the same move and score.
pub fn search(game: &mut Game, depth: u32) -> SearchResult {
    let stop = AtomicBool::new(false);
    search_with_stop(game, depth, &stop)
}

/// Like `search`, polling `stop` between nodes. On cancellation the
/// best move completed so far is returned.
pub fn search_with_stop(game: &mut Game, depth: u32, stop: &AtomicBool) -> SearchResult {
    let depth = depth.max(1);
    let mut moves: Vec<Move> = game.legal_moves().to_vec();

    if moves.is_empty() {
        // Terminal position: report the score, there is no move.
        let score = if in_check(&game.board, game.board.side_to_move) {
            -MATE_SCORE
        } else {
            DRAW_SCORE
        };
        return SearchResult {
            best_move: None,
            score,
            nodes: 0,
        };
    }

    order_moves(&mut moves, &game.board);

    let mut nodes = 0u64;
    let mut best_move = None;
    let mut best = -INF;
    let mut alpha = -INF;
    let beta = INF;

    for mv in moves {
        game.push(mv);
        let value = -negamax(game, depth - 1, 1, -beta, -alpha, &mut nodes, stop);
        game.pop();

        if stop.load(Ordering::Relaxed) && best_move.is_some() {
            break;
        }
        if value > best {
            best = value;
            best_move = Some(mv);
        }
        alpha = alpha.max(best);
    }

    debug!(depth, nodes, score = best, "search finished");
    SearchResult {
        best_move,
        score: best,
        nodes,
    }
}

fn negamax(
    game: &mut Game,
    depth: u32,
    ply: i32,
    mut alpha: i32,
    beta: i32,
    nodes: &mut u64,
    stop: &AtomicBool,
) -> i32 {
    *nodes += 1;

    // Draw detection comes before anything else so a repeated
    // position is never searched further.
    if game.repetition_count() >= 3 || game.board.halfmove_clock >= 100 {
        return DRAW_SCORE;
    }

    let mut moves: Vec<Move> = game.legal_moves().to_vec();
    if moves.is_empty() {
        return if in_check(&game.board, game.board.side_to_move) {
            -MATE_SCORE + ply
        } else {
            DRAW_SCORE
        };
    }
    if depth == 0 {
        return static_eval(&game.board);
    }

    order_moves(&mut moves, &game.board);

    let mut best = -INF;
    for mv in moves {
        game.push(mv);
        let value = -negamax(game, depth - 1, ply + 1, -beta, -alpha, nodes, stop);
        game.pop();

        if stop.load(Ordering::Relaxed) {
            return best.max(value);
        }
        best = best.max(value);
        alpha = alpha.max(best);
        if alpha >= beta {
            break;
        }
    }
    best
}
