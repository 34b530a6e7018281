// SPDX-License-Identifier: GPL-3.0-or-later

use crate::error::MoveError;
use crate::misc::Prng;
use crate::position::Position;
use crate::types::{Move, Square, BLACK, WHITE};
use crate::uci;

use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;

// An opening book answers with a move for positions it knows. It is
// consulted before the search starts.
pub trait Book: Send {
    fn probe(&mut self, pos: &Position) -> Option<Move>;
}

// Book positions are hashed with their own random numbers, unrelated to
// the search keys, so a book stays valid whatever the engine's Zobrist
// layout is.
struct BookKeys {
    psq: [[u64; 64]; 16],
    castling: [u64; 16],
    enpassant: [u64; 8],
    turn: u64,
}

static BOOK_KEYS: Lazy<BookKeys> = Lazy::new(|| {
    let mut rng = Prng::new(0x2545_F491_4F6C_DD1D);
    let mut k = BookKeys {
        psq: [[0; 64]; 16],
        castling: [0; 16],
        enpassant: [0; 8],
        turn: 0,
    };

    for pc in k.psq.iter_mut() {
        for s in pc.iter_mut() {
            *s = rng.rand64();
        }
    }
    for cr in k.castling.iter_mut() {
        *cr = rng.rand64();
    }
    for f in k.enpassant.iter_mut() {
        *f = rng.rand64();
    }
    k.turn = rng.rand64();
    k
});

// key() computes the book key of a position.
pub fn key(pos: &Position) -> u64 {
    let keys = &*BOOK_KEYS;
    let mut k = 0;

    for s in Square::all() {
        let pc = pos.piece_on(s);
        if pc.0 != 0 {
            k ^= keys.psq[pc.index()][s.index()];
        }
    }

    k ^= keys.castling[(pos.castling_rights(WHITE) | pos.castling_rights(BLACK)).index()];

    if pos.ep_square() != Square::NONE {
        k ^= keys.enpassant[pos.ep_square().file() as usize];
    }

    if pos.side_to_move() == WHITE {
        k ^= keys.turn;
    }
    k
}

// A few main lines, enough to vary the first moves of a game.
pub const DEFAULT_LINES: [&str; 10] = [
    "e2e4 e7e5 g1f3 b8c6 f1b5 a7a6 b5a4 g8f6 e1g1 f8e7",
    "e2e4 e7e5 g1f3 b8c6 f1c4 f8c5 c2c3 g8f6 d2d4 e5d4",
    "e2e4 c7c5 g1f3 d7d6 d2d4 c5d4 f3d4 g8f6 b1c3 a7a6",
    "e2e4 c7c5 g1f3 b8c6 d2d4 c5d4 f3d4 g8f6 b1c3 e7e5",
    "e2e4 e7e6 d2d4 d7d5 b1c3 g8f6 c1g5 f8e7 e4e5 f6d7",
    "e2e4 c7c6 d2d4 d7d5 b1c3 d5e4 c3e4 c8f5 e4g3 f5g6",
    "d2d4 d7d5 c2c4 e7e6 b1c3 g8f6 c1g5 f8e7 e2e3 e8g8",
    "d2d4 g8f6 c2c4 e7e6 b1c3 f8b4 e2e3 e8g8 f1d3 d7d5",
    "d2d4 g8f6 c2c4 g7g6 b1c3 f8g7 e2e4 d7d6 g1f3 e8g8",
    "c2c4 e7e5 b1c3 g8f6 g1f3 b8c6 g2g3 d7d5 c4d5 f6d5",
];

// MemoryBook maps book keys to the moves played from that position, each
// with a weight. probe() picks a move at random, proportionally to the
// weights.
pub struct MemoryBook {
    entries: FxHashMap<u64, Vec<(Move, u16)>>,
    rng: Prng,
}

impl MemoryBook {
    pub fn new() -> MemoryBook {
        MemoryBook {
            entries: FxHashMap::default(),
            rng: Prng::new(0x9E37_79B9_7F4A_7C15),
        }
    }

    // from_lines() builds a book out of move sequences played from the
    // starting position. A move repeated in several lines gains weight.
    pub fn from_lines(lines: &[&str]) -> Result<MemoryBook, MoveError> {
        let mut book = MemoryBook::new();

        for line in lines {
            let mut pos = Position::new();
            for token in line.split_whitespace() {
                let m = uci::to_move(&pos, token)?;
                book.add(&pos, m, 1);
                let gives_check = pos.gives_check(m);
                pos.do_move(m, gives_check);
            }
        }
        Ok(book)
    }

    pub fn add(&mut self, pos: &Position, m: Move, weight: u16) {
        let moves = self.entries.entry(key(pos)).or_default();
        match moves.iter_mut().find(|(bm, _)| *bm == m) {
            Some((_, w)) => *w = w.saturating_add(weight),
            None => moves.push((m, weight)),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn moves(&self, pos: &Position) -> &[(Move, u16)] {
        self.entries.get(&key(pos)).map_or(&[], |v| v.as_slice())
    }
}

impl Default for MemoryBook {
    fn default() -> Self {
        Self::new()
    }
}

impl Book for MemoryBook {
    fn probe(&mut self, pos: &Position) -> Option<Move> {
        let moves = self.entries.get(&key(pos))?;
        let total: u64 = moves.iter().map(|&(_, w)| u64::from(w)).sum();
        if total == 0 {
            return None;
        }

        let mut pick = self.rng.rand64() % total;
        for &(m, w) in moves {
            if pick < u64::from(w) {
                // A key collision could hand us a move from another
                // position.
                return if pos.pseudo_legal(m) && pos.legal(m) {
                    Some(m)
                } else {
                    None
                };
            }
            pick -= u64::from(w);
        }
        None
    }
}
