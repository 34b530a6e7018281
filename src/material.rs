// SPDX-License-Identifier: GPL-3.0-or-later

use crate::position::Position;
use crate::types::{
    key::Key, scale_factor::ScaleFactor, BishopValueMg, Color, Phase, RookValueMg, Score,
    BISHOP, BLACK, ENDGAME_LIMIT, KNIGHT, MIDGAME_LIMIT, PAWN, PHASE_MIDGAME, QUEEN, ROOK, WHITE,
};

const TABLE_SIZE: usize = 8192;

// material::Entry caches what depends only on the material configuration
// of a position: the imbalance term, the game phase and the scale factors.
#[derive(Clone, Copy)]
pub struct Entry {
    key: Key,
    value: i16,
    factor: [u8; 2],
    game_phase: Phase,
}

impl Entry {
    fn new() -> Entry {
        Entry {
            key: Key(0),
            value: 0,
            factor: [ScaleFactor::NORMAL.0 as u8; 2],
            game_phase: 0,
        }
    }

    pub fn imbalance(&self) -> Score {
        Score::make(i32::from(self.value), i32::from(self.value))
    }

    pub fn game_phase(&self) -> Phase {
        self.game_phase
    }

    pub fn scale_factor(&self, c: Color) -> ScaleFactor {
        ScaleFactor(i32::from(self.factor[c.index()]))
    }
}

// Polynomial material imbalance parameters

#[rustfmt::skip]
const QUADRATIC_OURS: [[i32; 6]; 6] = [
    //            OUR PIECES
    // pair pawn knight bishop rook queen
    [1667,    0,    0,     0,    0,   0], // Bishop pair
    [  40,    0,    0,     0,    0,   0], // Pawn
    [  32,  255,   -3,     0,    0,   0], // Knight      OUR PIECES
    [   0,  104,    4,     0,    0,   0], // Bishop
    [ -26,   -2,   47,   105, -149,   0], // Rook
    [-189,   24,  117,   133, -134, -10], // Queen
];

#[rustfmt::skip]
const QUADRATIC_THEIRS: [[i32; 6]; 6] = [
    //           THEIR PIECES
    // pair pawn knight bishop rook queen
    [   0,    0,    0,     0,    0,   0], // Bishop pair
    [  36,    0,    0,     0,    0,   0], // Pawn
    [   9,   63,    0,     0,    0,   0], // Knight      OUR PIECES
    [  59,   65,   42,     0,    0,   0], // Bishop
    [  46,   39,   24,   -24,    0,   0], // Rook
    [  97,  100,  -42,   137,  268,   0], // Queen
];

// imbalance() calculates the imbalance by comparing the piece count of
// each piece type for both colors. Index 0 holds the bishop pair.
fn imbalance(pc: &[[i32; 6]; 2], us: Color) -> i32 {
    let ours = &pc[us.index()];
    let theirs = &pc[(!us).index()];
    let mut bonus = 0;

    // Second-degree polynomial material imbalance, by Tord Romstad
    for pt1 in 0..6 {
        if ours[pt1] == 0 {
            continue;
        }

        let v: i32 = (0..=pt1)
            .map(|pt2| QUADRATIC_OURS[pt1][pt2] * ours[pt2] + QUADRATIC_THEIRS[pt1][pt2] * theirs[pt2])
            .sum();

        bonus += ours[pt1] * v;
    }

    bonus
}

// Zero or just one pawn makes it difficult to win, even with a small
// material advantage. This catches trivial draws like KK, KBK and KNK.
fn scale_factor(pos: &Position, us: Color) -> ScaleFactor {
    let npm_us = pos.non_pawn_material_c(us);
    let npm_them = pos.non_pawn_material_c(!us);

    match pos.count(us, PAWN) {
        0 if npm_us - npm_them <= BishopValueMg => {
            if npm_us < RookValueMg {
                ScaleFactor::DRAW
            } else if npm_them <= BishopValueMg {
                ScaleFactor(4)
            } else {
                ScaleFactor(14)
            }
        }
        1 if npm_us - npm_them <= BishopValueMg => ScaleFactor::ONEPAWN,
        _ => ScaleFactor::NORMAL,
    }
}

fn game_phase(pos: &Position) -> Phase {
    // Map total non-pawn material into [PHASE_ENDGAME, PHASE_MIDGAME]
    let npm = pos.non_pawn_material().clamp(ENDGAME_LIMIT, MIDGAME_LIMIT);
    ((npm - ENDGAME_LIMIT).0 * PHASE_MIDGAME) / (MIDGAME_LIMIT - ENDGAME_LIMIT).0
}

// The material hash table, indexed by the low bits of the material key.
pub struct Table {
    entries: Vec<Entry>,
}

impl Table {
    pub fn new() -> Table {
        Table {
            entries: vec![Entry::new(); TABLE_SIZE],
        }
    }

    pub fn clear(&mut self) {
        self.entries.fill(Entry::new());
    }

    // probe() looks up the material configuration of the position. On a
    // miss the entry is computed and stored, so that the work is not
    // repeated when the same configuration occurs again.
    pub fn probe(&mut self, pos: &Position) -> &Entry {
        let key = pos.material_key();
        let e = &mut self.entries[(key.0 as usize) & (TABLE_SIZE - 1)];

        if e.key == key {
            return e;
        }

        let count = |c: Color| {
            [
                i32::from(pos.count(c, BISHOP) > 1),
                pos.count(c, PAWN),
                pos.count(c, KNIGHT),
                pos.count(c, BISHOP),
                pos.count(c, ROOK),
                pos.count(c, QUEEN),
            ]
        };
        let pc = [count(WHITE), count(BLACK)];

        e.key = key;
        e.game_phase = game_phase(pos);
        e.factor = [
            scale_factor(pos, WHITE).0 as u8,
            scale_factor(pos, BLACK).0 as u8,
        ];
        e.value = ((imbalance(&pc, WHITE) - imbalance(&pc, BLACK)) / 16) as i16;
        e
    }
}

impl Default for Table {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PHASE_ENDGAME;

    fn init() {
        crate::init();
    }

    #[test]
    fn test_start_position_is_balanced_midgame() {
        init();
        let pos = Position::new();
        let mut table = Table::new();
        let e = table.probe(&pos);
        assert_eq!(e.imbalance(), Score::ZERO);
        assert_eq!(e.game_phase(), PHASE_MIDGAME);
        assert_eq!(e.scale_factor(WHITE), ScaleFactor::NORMAL);
        assert_eq!(e.scale_factor(BLACK), ScaleFactor::NORMAL);
    }

    #[test]
    fn test_bare_kings_and_minor_pieces_are_drawish() {
        init();
        let mut table = Table::new();
        let pos = Position::from_fen("8/8/4k3/8/8/3NK3/8/8 w - - 0 1").unwrap();
        assert!(pos.non_pawn_material() < RookValueMg);
        let e = table.probe(&pos);
        assert_eq!(e.scale_factor(WHITE), ScaleFactor::DRAW);
        assert_eq!(e.game_phase(), PHASE_ENDGAME);

        let pos = Position::from_fen("8/8/4k3/8/8/4K3/4P3/8 w - - 0 1").unwrap();
        assert_eq!(table.probe(&pos).scale_factor(WHITE), ScaleFactor::ONEPAWN);
    }

    #[test]
    fn test_imbalance_is_antisymmetric() {
        init();
        let mut table = Table::new();
        let mut pos = Position::from_fen("r1bqk2r/pppp1ppp/2n5/8/8/8/PPPP1PPP/RNBQK1NR w KQkq - 0 1").unwrap();
        let white = table.probe(&pos).imbalance();
        pos.flip();
        let black = table.probe(&pos).imbalance();
        assert_eq!(white, -black);
        assert_ne!(white, Score::ZERO);
    }

    #[test]
    fn test_probe_hits_cache() {
        init();
        let pos = Position::new();
        let mut table = Table::new();
        let first = *table.probe(&pos);
        let second = *table.probe(&pos);
        assert_eq!(first.key, second.key);
        assert_eq!(first.value, second.value);
    }
}
