use std::collections::HashMap;

use crate::board::{Board, FenError};
use crate::moves::execute::make_move;
use crate::moves::movegen::generate_legal;
use crate::moves::tables::init_tables;
use crate::moves::types::{Move, MoveBuffer, MoveList};

/// One entry of the history stack: the full pre-move position plus the
/// move that left it. Restoring a snapshot is bit-exact by
/// construction.
#[derive(Debug, Clone)]
struct Snapshot {
    board: Board,
    mv: Move,
}

/// A playing session: the current position, the LIFO history that
/// makes `pop` exact, and the repetition counts keyed by Zobrist hash.
/// All mutation of the position goes through `push`/`pop`.
#[derive(Debug)]
pub struct Game {
    pub board: Board,
    stack: Vec<Snapshot>,
    repetition: HashMap<u64, u32>,
}

impl Game {
    /// Fresh session from the standard starting position.
    pub fn new() -> Self {
        init_tables();
        Game::with_board(Board::startpos())
    }

    /// Fresh session from a FEN position. The session state is only
    /// created if the FEN parses.
    pub fn from_fen(fen: &str) -> Result<Self, FenError> {
        init_tables();
        Ok(Game::with_board(Board::from_fen(fen)?))
    }

    fn with_board(board: Board) -> Self {
        let mut repetition = HashMap::new();
        // The root position counts as visited once.
        repetition.insert(board.zobrist, 1);
        Game {
            board,
            stack: Vec::new(),
            repetition,
        }
    }

    /// Discards history and repetition state and restarts from the
    /// standard starting position.
    pub fn new_game(&mut self) {
        self.set_board(Board::startpos());
    }

    /// Replaces the position, clearing history and repetition state.
    pub fn set_board(&mut self, board: Board) {
        self.stack.clear();
        self.repetition.clear();
        self.repetition.insert(board.zobrist, 1);
        self.board = board;
    }

    /// Applies `mv`, recording a snapshot so `pop` can reverse it
    /// exactly, and counts the resulting position as visited.
    pub fn push(&mut self, mv: Move) {
        self.stack.push(Snapshot {
            board: self.board.clone(),
            mv,
        });
        make_move(&mut self.board, mv);
        *self.repetition.entry(self.board.zobrist).or_insert(0) += 1;
    }

    /// Reverses the most recent `push`. Popping with no history is a
    /// caller bug and panics.
    pub fn pop(&mut self) -> Move {
        let count = self
            .repetition
            .get_mut(&self.board.zobrist)
            .expect("current position missing from repetition map");
        *count -= 1;
        if *count == 0 {
            self.repetition.remove(&self.board.zobrist);
        }

        let snapshot = self.stack.pop().expect("pop with empty history stack");
        self.board = snapshot.board;
        snapshot.mv
    }

    /// How often the current position has been on the board, the
    /// current occurrence included.
    pub fn repetition_count(&self) -> u32 {
        self.repetition
            .get(&self.board.zobrist)
            .copied()
            .unwrap_or(0)
    }

    pub fn is_threefold(&self) -> bool {
        self.repetition_count() >= 3
    }

    /// Number of plies currently on the history stack.
    pub fn ply(&self) -> usize {
        self.stack.len()
    }

    /// Legal moves in the current position.
    pub fn legal_moves(&self) -> MoveList {
        let mut moves = MoveList::new();
        generate_legal(&self.board, &mut moves);
        moves
    }

    /// Legal moves written into a caller-owned buffer.
    pub fn legal_moves_into(&self, out: &mut impl MoveBuffer) {
        generate_legal(&self.board, out);
    }

    /// Finds the legal move matching long-algebraic `text` (e.g.
    /// `e2e4`, `a7a8q`), if any.
    pub fn find_move(&self, text: &str) -> Option<Move> {
        self.legal_moves()
            .iter()
            .copied()
            .find(|m| m.to_uci() == text)
    }
}

impl Default for Game {
    fn default() -> Self {
        Game::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Color;
    use crate::moves::attacks::in_check;

    #[test]
    fn push_pop_round_trips_bit_exactly() {
        let mut game = Game::new();
        let before = game.board.clone();
        let reps_before = game.repetition_count();

        let mv = game.find_move("g1f3").unwrap();
        game.push(mv);
        assert_ne!(game.board, before);
        let popped = game.pop();

        assert_eq!(popped, mv);
        assert_eq!(game.board, before);
        assert_eq!(game.repetition_count(), reps_before);
        assert_eq!(game.ply(), 0);
    }

    #[test]
    fn repetition_counter_tracks_shuffles() {
        let mut game = Game::new();
        assert_eq!(game.repetition_count(), 1);

        // Knights out and back, twice: startpos recurs three times.
        for _ in 0..2 {
            for text in ["g1f3", "g8f6", "f3g1", "f6g8"] {
                let mv = game.find_move(text).unwrap();
                game.push(mv);
            }
        }
        assert_eq!(game.repetition_count(), 3);
        assert!(game.is_threefold());

        // Unwind fully; the map ends where it started.
        while game.ply() > 0 {
            game.pop();
        }
        assert_eq!(game.repetition_count(), 1);
        assert!(!game.is_threefold());
    }

    #[test]
    fn new_game_clears_session_state() {
        let mut game = Game::new();
        let mv = game.find_move("e2e4").unwrap();
        game.push(mv);
        game.new_game();
        assert_eq!(game.ply(), 0);
        assert_eq!(game.repetition_count(), 1);
        assert_eq!(game.board, Board::startpos());
    }

    #[test]
    fn find_move_rejects_illegal_text() {
        let game = Game::new();
        assert!(game.find_move("e2e5").is_none());
        assert!(game.find_move("nonsense").is_none());
        assert!(game.find_move("e2e4").is_some());
    }

    #[test]
    fn pushed_moves_never_leave_own_king_attacked() {
        let mut game =
            Game::from_fen("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq -")
                .unwrap();
        for mv in game.legal_moves() {
            let mover = game.board.side_to_move;
            game.push(mv);
            assert!(!in_check(&game.board, mover), "{mv} leaves king en prise");
            game.pop();
        }
        assert_eq!(game.board.side_to_move, Color::White);
    }
}
