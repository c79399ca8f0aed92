use std::str::FromStr;

use thiserror::Error;

use super::{Board, CASTLE_BK, CASTLE_BQ, CASTLE_WK, CASTLE_WQ, Color, Piece};
use crate::bitboard::BitboardExt;
use crate::square::Square;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FenError {
    #[error("FEN needs at least 4 fields, found {0}")]
    TooFewFields(usize),
    #[error("piece placement must have 8 ranks, found {0}")]
    BadRankCount(usize),
    #[error("rank {rank} overflows 8 files")]
    RankOverflow { rank: usize },
    #[error("invalid piece character `{0}`")]
    BadPiece(char),
    #[error("invalid side to move `{0}`, expected `w` or `b`")]
    BadSideToMove(String),
    #[error("invalid castling character `{0}`")]
    BadCastling(char),
    #[error("invalid en passant field `{0}`")]
    BadEnPassant(String),
    #[error("invalid move counter `{0}`")]
    BadCounter(String),
    #[error("each side needs exactly one king")]
    BadKingCount,
}

impl Board {
    /// Parses six-field FEN. The halfmove and fullmove fields may be
    /// omitted and default to 0 and 1. On error nothing is produced,
    /// so no existing position can be left half-updated.
    pub fn from_fen(fen: &str) -> Result<Self, FenError> {
        let fields: Vec<&str> = fen.split_whitespace().collect();
        if fields.len() < 4 {
            return Err(FenError::TooFewFields(fields.len()));
        }

        let mut board = Board::new_empty();

        // Field 1: piece placement, rank 8 first.
        let ranks: Vec<&str> = fields[0].split('/').collect();
        if ranks.len() != 8 {
            return Err(FenError::BadRankCount(ranks.len()));
        }
        for (i, rank_str) in ranks.iter().enumerate() {
            let rank = 7 - i as u8;
            let mut file = 0u8;
            for c in rank_str.chars() {
                if let Some(skip) = c.to_digit(10) {
                    file += skip as u8;
                } else {
                    let (color, piece) = Piece::from_char(c).ok_or(FenError::BadPiece(c))?;
                    if file >= 8 {
                        return Err(FenError::RankOverflow { rank: i });
                    }
                    board.place_piece(color, piece, Square::from_coords(file, rank));
                    file += 1;
                }
            }
            if file > 8 {
                return Err(FenError::RankOverflow { rank: i });
            }
        }

        // Field 2: side to move.
        board.side_to_move = match fields[1] {
            "w" => Color::White,
            "b" => Color::Black,
            other => return Err(FenError::BadSideToMove(other.to_string())),
        };

        // Field 3: castling rights.
        if fields[2] != "-" {
            for c in fields[2].chars() {
                board.castling_rights |= match c {
                    'K' => CASTLE_WK,
                    'Q' => CASTLE_WQ,
                    'k' => CASTLE_BK,
                    'q' => CASTLE_BQ,
                    _ => return Err(FenError::BadCastling(c)),
                };
            }
        }

        // Field 4: en passant target.
        board.en_passant = if fields[3] == "-" {
            None
        } else {
            Some(
                Square::from_str(fields[3])
                    .map_err(|_| FenError::BadEnPassant(fields[3].to_string()))?,
            )
        };

        // Fields 5 and 6 are optional.
        board.halfmove_clock = match fields.get(4) {
            Some(s) => s
                .parse()
                .map_err(|_| FenError::BadCounter(s.to_string()))?,
            None => 0,
        };
        board.fullmove_number = match fields.get(5) {
            Some(s) => s
                .parse()
                .map_err(|_| FenError::BadCounter(s.to_string()))?,
            None => 1,
        };

        for color in [Color::White, Color::Black] {
            let king = board.bb(color, Piece::King);
            if king.count_ones() != 1 {
                return Err(FenError::BadKingCount);
            }
            board.set_king_square(color, Square::from_index(king.lsb()));
        }
        board.rebuild_occupancies();
        board.zobrist = board.compute_zobrist_full();
        Ok(board)
    }

    /// Serializes the position back to six-field FEN.
    pub fn to_fen(&self) -> String {
        let mut out = String::new();
        for rank in (0..8).rev() {
            let mut empty = 0;
            for file in 0..8 {
                match self.piece_at(Square::from_coords(file, rank)) {
                    Some((color, piece)) => {
                        if empty > 0 {
                            out.push_str(&empty.to_string());
                            empty = 0;
                        }
                        out.push(piece.to_char(color));
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 {
                out.push_str(&empty.to_string());
            }
            if rank > 0 {
                out.push('/');
            }
        }

        out.push(' ');
        out.push(match self.side_to_move {
            Color::White => 'w',
            Color::Black => 'b',
        });

        out.push(' ');
        if self.castling_rights == 0 {
            out.push('-');
        } else {
            for (flag, c) in [
                (CASTLE_WK, 'K'),
                (CASTLE_WQ, 'Q'),
                (CASTLE_BK, 'k'),
                (CASTLE_BQ, 'q'),
            ] {
                if self.castling_rights & flag != 0 {
                    out.push(c);
                }
            }
        }

        out.push(' ');
        match self.en_passant {
            Some(sq) => out.push_str(&sq.to_string()),
            None => out.push('-'),
        }

        out.push_str(&format!(" {} {}", self.halfmove_clock, self.fullmove_number));
        out
    }
}
