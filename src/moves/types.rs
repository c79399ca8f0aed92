use std::fmt;
use std::ops::{Deref, DerefMut};

use arrayvec::ArrayVec;

use crate::board::Piece;
use crate::square::Square;

/// Special characteristic of a move. Exactly one flag per move; plain
/// captures and quiet moves carry no further payload, promotions encode
/// the replacement piece in the flag itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MoveFlag {
    Quiet,
    /// Null move: the side to move passes.
    Pass,
    Castling,
    EnPassant,
    Capture,
    PromoKnight,
    PromoBishop,
    PromoRook,
    PromoQueen,
    PromoCaptureKnight,
    PromoCaptureBishop,
    PromoCaptureRook,
    PromoCaptureQueen,
}

impl MoveFlag {
    /// True when the move removes an enemy piece, en passant included.
    #[inline(always)]
    pub fn is_capture(self) -> bool {
        matches!(
            self,
            MoveFlag::Capture
                | MoveFlag::EnPassant
                | MoveFlag::PromoCaptureKnight
                | MoveFlag::PromoCaptureBishop
                | MoveFlag::PromoCaptureRook
                | MoveFlag::PromoCaptureQueen
        )
    }

    #[inline(always)]
    pub fn is_promotion(self) -> bool {
        self.promotion_piece().is_some()
    }

    /// The piece a promoting pawn turns into.
    #[inline(always)]
    pub fn promotion_piece(self) -> Option<Piece> {
        match self {
            MoveFlag::PromoKnight | MoveFlag::PromoCaptureKnight => Some(Piece::Knight),
            MoveFlag::PromoBishop | MoveFlag::PromoCaptureBishop => Some(Piece::Bishop),
            MoveFlag::PromoRook | MoveFlag::PromoCaptureRook => Some(Piece::Rook),
            MoveFlag::PromoQueen | MoveFlag::PromoCaptureQueen => Some(Piece::Queen),
            _ => None,
        }
    }

    /// Coarse ordering band for the search: promotion-captures first,
    /// then quiet promotions, captures, castling, en passant, quiets.
    #[inline(always)]
    pub fn ordering_band(self) -> i32 {
        match self {
            MoveFlag::PromoCaptureKnight
            | MoveFlag::PromoCaptureBishop
            | MoveFlag::PromoCaptureRook
            | MoveFlag::PromoCaptureQueen => 5,
            MoveFlag::PromoKnight
            | MoveFlag::PromoBishop
            | MoveFlag::PromoRook
            | MoveFlag::PromoQueen => 4,
            MoveFlag::Capture => 3,
            MoveFlag::Castling => 2,
            MoveFlag::EnPassant => 1,
            MoveFlag::Quiet | MoveFlag::Pass => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Move {
    pub from: Square,
    pub to: Square,
    pub flag: MoveFlag,
}

impl Move {
    #[inline(always)]
    pub fn new(from: Square, to: Square, flag: MoveFlag) -> Self {
        Move { from, to, flag }
    }

    /// The null move: no piece moves, the turn passes.
    pub fn pass() -> Self {
        let a1 = Square::from_index(0);
        Move::new(a1, a1, MoveFlag::Pass)
    }

    #[inline(always)]
    pub fn is_capture(&self) -> bool {
        self.flag.is_capture()
    }

    #[inline(always)]
    pub fn is_promotion(&self) -> bool {
        self.flag.is_promotion()
    }

    #[inline(always)]
    pub fn promotion_piece(&self) -> Option<Piece> {
        self.flag.promotion_piece()
    }

    /// Long-algebraic form: `<from><to>` plus `q`/`r`/`b`/`n` for
    /// promotions.
    pub fn to_uci(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(piece) = self.promotion_piece() {
            let c = match piece {
                Piece::Queen => 'q',
                Piece::Rook => 'r',
                Piece::Bishop => 'b',
                Piece::Knight => 'n',
                _ => unreachable!("non-promotion piece in promotion flag"),
            };
            write!(f, "{c}")?;
        }
        Ok(())
    }
}

/// Enough room for any legal position (the known maximum is 218).
pub type MoveList = ArrayVec<Move, 256>;

/// Abstraction over the buffers move generation writes into, so hot
/// paths can use a fixed-capacity `ArrayVec` while tests and the CLI
/// use a plain `Vec`.
pub trait MoveBuffer: Deref<Target = [Move]> + DerefMut {
    fn push(&mut self, mv: Move);
    fn clear(&mut self);
}

impl MoveBuffer for Vec<Move> {
    fn push(&mut self, mv: Move) {
        Vec::push(self, mv);
    }
    fn clear(&mut self) {
        Vec::clear(self);
    }
}

impl<const N: usize> MoveBuffer for ArrayVec<Move, N> {
    fn push(&mut self, mv: Move) {
        ArrayVec::push(self, mv);
    }
    fn clear(&mut self) {
        ArrayVec::clear(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn uci_formatting() {
        let mv = Move::new(
            Square::from_str("e2").unwrap(),
            Square::from_str("e4").unwrap(),
            MoveFlag::Quiet,
        );
        assert_eq!(mv.to_uci(), "e2e4");

        let promo = Move::new(
            Square::from_str("a7").unwrap(),
            Square::from_str("a8").unwrap(),
            MoveFlag::PromoQueen,
        );
        assert_eq!(promo.to_uci(), "a7a8q");

        let under = Move::new(
            Square::from_str("g7").unwrap(),
            Square::from_str("h8").unwrap(),
            MoveFlag::PromoCaptureKnight,
        );
        assert_eq!(under.to_uci(), "g7h8n");
    }

    #[test]
    fn capture_predicate_covers_all_capture_flags() {
        assert!(MoveFlag::Capture.is_capture());
        assert!(MoveFlag::EnPassant.is_capture());
        assert!(MoveFlag::PromoCaptureQueen.is_capture());
        assert!(!MoveFlag::PromoQueen.is_capture());
        assert!(!MoveFlag::Castling.is_capture());
        assert!(!MoveFlag::Pass.is_capture());
    }

    #[test]
    fn ordering_bands_follow_flag_rank() {
        let order = [
            MoveFlag::PromoCaptureQueen,
            MoveFlag::PromoQueen,
            MoveFlag::Capture,
            MoveFlag::Castling,
            MoveFlag::EnPassant,
            MoveFlag::Quiet,
        ];
        for pair in order.windows(2) {
            assert!(pair[0].ordering_band() > pair[1].ordering_band());
        }
    }
}
