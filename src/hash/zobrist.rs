use once_cell::sync::OnceCell;
use rand::{RngCore, SeedableRng, rngs::StdRng};

use crate::board::{CASTLE_BK, CASTLE_BQ, CASTLE_WK, CASTLE_WQ};

#[cfg(feature = "deterministic_zobrist")]
const ZOBRIST_SEED: u64 = 0xC1AD_E11E_0B5C_u64;

/// The 781 hash keys: 12 x 64 piece/square keys, one side-to-move key,
/// four castling keys, eight en-passant file keys.
pub struct ZobristKeys {
    /// `[color][piece][square]`, {White=0, Black=1} x {P,N,B,R,Q,K}.
    pub piece: [[[u64; 64]; 6]; 2],
    /// XORed into the hash when Black is to move.
    pub side_to_move: u64,
    /// Indexed in WK, WQ, BK, BQ order.
    pub castling: [u64; 4],
    /// One key per file a..h; applied whenever an en-passant target is set.
    pub ep_file: [u64; 8],
}

/// Process-global keyset, generated on first use and immutable after.
pub fn zobrist_keys() -> &'static ZobristKeys {
    static KEYS: OnceCell<ZobristKeys> = OnceCell::new();
    KEYS.get_or_init(|| generate_keys(make_rng()))
}

fn make_rng() -> StdRng {
    #[cfg(feature = "deterministic_zobrist")]
    {
        StdRng::seed_from_u64(ZOBRIST_SEED)
    }
    #[cfg(not(feature = "deterministic_zobrist"))]
    {
        let mut seed = [0u8; 32];
        rand::rng().fill_bytes(&mut seed);
        StdRng::from_seed(seed)
    }
}

fn generate_keys(mut rng: StdRng) -> ZobristKeys {
    // Zero keys would make some state changes invisible to the hash.
    let mut next = move || loop {
        let v = rng.next_u64();
        if v != 0 {
            return v;
        }
    };

    let mut keys = ZobristKeys {
        piece: [[[0u64; 64]; 6]; 2],
        side_to_move: 0,
        castling: [0u64; 4],
        ep_file: [0u64; 8],
    };

    for color in 0..2 {
        for piece in 0..6 {
            for sq in 0..64 {
                keys.piece[color][piece][sq] = next();
            }
        }
    }
    keys.side_to_move = next();
    for k in keys.castling.iter_mut() {
        *k = next();
    }
    for k in keys.ep_file.iter_mut() {
        *k = next();
    }
    keys
}

/// XORs in the castling keys for every right that differs between
/// `old` and `new` rights masks.
#[inline]
pub fn xor_castling_delta(hash: &mut u64, keys: &ZobristKeys, old: u8, new: u8) {
    let delta = old ^ new;
    if delta & CASTLE_WK != 0 {
        *hash ^= keys.castling[0];
    }
    if delta & CASTLE_WQ != 0 {
        *hash ^= keys.castling[1];
    }
    if delta & CASTLE_BK != 0 {
        *hash ^= keys.castling[2];
    }
    if delta & CASTLE_BQ != 0 {
        *hash ^= keys.castling[3];
    }
}
