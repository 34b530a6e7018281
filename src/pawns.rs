// SPDX-License-Identifier: GPL-3.0-or-later

use crate::bitboard::{
    adjacent_files_bb, backmost_sq, distance_ring_bb, file_bb, forward_file_bb, forward_ranks_bb,
    frontmost_sq, passed_pawn_mask, pawn_attacks, pawn_attacks_bb, popcount, Bitboard,
};
use crate::position::Position;
use crate::types::{
    direction::pawn_push, key::Key, Black, CastlingRight, CastlingRightTrait, Color, ColorTrait,
    File, Score, Square, Value, White, FILE_A, FILE_B, FILE_G, FILE_H, PAWN, RANK_1, RANK_5,
};

use once_cell::sync::Lazy;

const TABLE_SIZE: usize = 16384;

macro_rules! S {
    ($x:expr, $y:expr) => {
        Score::make($x, $y)
    };
}

const ISOLATED: Score = S!(13, 18);
const BACKWARD: Score = S!(24, 12);
const DOUBLED: Score = S!(18, 38);

// Connected pawn bonus by [opposed][phalanx][#support][rank]
static CONNECTED: Lazy<[[[[Score; 8]; 3]; 2]; 2]> = Lazy::new(|| {
    const SEED: [i32; 8] = [0, 13, 24, 18, 76, 100, 175, 330];
    let mut connected = [[[[Score::ZERO; 8]; 3]; 2]; 2];

    for (opposed, by_phalanx) in connected.iter_mut().enumerate() {
        for (phalanx, by_support) in by_phalanx.iter_mut().enumerate() {
            for (support, by_rank) in by_support.iter_mut().enumerate() {
                for r in 1..7 {
                    let delta = if phalanx != 0 { (SEED[r + 1] - SEED[r]) / 2 } else { 0 };
                    let v = 17 * support as i32 + ((SEED[r] + delta) >> opposed);
                    by_rank[r] = Score::make(v, v * (r as i32 - 2) / 4);
                }
            }
        }
    }

    connected
});

// Shelter value of our most backward pawn on a file in front of the king,
// by relative rank. RANK_1 stands for no pawn at all.
const SHELTER: [Value; 8] = [
    Value(-64),
    Value(38),
    Value(22),
    Value(4),
    Value(-12),
    Value(-20),
    Value(-20),
    Value(0),
];

// Danger of the most advanced enemy pawn on a file in front of the king,
// by relative rank from our point of view.
const STORM: [Value; 8] = [
    Value(0),
    Value(0),
    Value(58),
    Value(34),
    Value(12),
    Value(0),
    Value(0),
    Value(0),
];

const MAX_SAFETY_BONUS: Value = Value(120);

// pawns::Entry holds what depends only on the pawn structure. King safety
// is cached per side and recomputed only when the king square or the
// castling rights change.
#[derive(Clone, Copy)]
pub struct Entry {
    key: Key,
    score: Score,
    passed_pawns: [Bitboard; 2],
    pawn_attacks: [Bitboard; 2],
    semiopen_files: [u8; 2],
    king_squares: [Square; 2],
    castling_rights: [CastlingRight; 2],
    king_safety: [Score; 2],
}

impl Entry {
    fn new() -> Entry {
        Entry {
            key: Key(0),
            score: Score::ZERO,
            passed_pawns: [Bitboard(0); 2],
            pawn_attacks: [Bitboard(0); 2],
            semiopen_files: [0; 2],
            king_squares: [Square::NONE; 2],
            castling_rights: [CastlingRight(0); 2],
            king_safety: [Score::ZERO; 2],
        }
    }

    pub fn pawns_score(&self) -> Score {
        self.score
    }

    pub fn passed_pawns(&self, c: Color) -> Bitboard {
        self.passed_pawns[c.index()]
    }

    pub fn pawn_attacks(&self, c: Color) -> Bitboard {
        self.pawn_attacks[c.index()]
    }

    pub fn semiopen_file(&self, c: Color, f: File) -> bool {
        self.semiopen_files[c.index()] & (1 << f) != 0
    }

    pub fn king_safety<Us: ColorTrait>(&mut self, pos: &Position, ksq: Square) -> Score {
        let us = Us::COLOR.index();
        if self.king_squares[us] != ksq || self.castling_rights[us] != pos.castling_rights(Us::COLOR) {
            self.king_squares[us] = ksq;
            self.castling_rights[us] = pos.castling_rights(Us::COLOR);
            self.king_safety[us] = do_king_safety::<Us>(pos, ksq);
        }
        self.king_safety[us]
    }
}

// shelter_storm() scores the pawns on the king file and the two adjacent
// files: our own as a shield, the enemy's as attackers.
fn shelter_storm(pos: &Position, us: Color, ksq: Square) -> Value {
    let them = !us;
    let center = ksq.file().clamp(FILE_B, FILE_G);
    let b = pos.pieces_p(PAWN)
        & (forward_ranks_bb(us, ksq) | ksq.rank_bb())
        & (adjacent_files_bb(center) | file_bb(center));
    let our_pawns = b & pos.pieces_c(us);
    let their_pawns = b & pos.pieces_c(them);
    let mut safety = MAX_SAFETY_BONUS;

    for f in (center - 1)..=(center + 1) {
        let ours = our_pawns & file_bb(f);
        let rk_us = if ours != 0 {
            backmost_sq(us, ours).relative_rank(us)
        } else {
            RANK_1
        };

        let theirs = their_pawns & file_bb(f);
        let rk_them = if theirs != 0 {
            frontmost_sq(them, theirs).relative_rank(us)
        } else {
            RANK_1
        };

        // Edge files are half as important.
        let weight = if f == FILE_A || f == FILE_H { 1 } else { 2 };
        safety += (SHELTER[rk_us as usize] - STORM[rk_them as usize]) * weight / 2;
    }

    safety
}

fn do_king_safety<Us: ColorTrait>(pos: &Position, ksq: Square) -> Score {
    let us = Us::COLOR;

    let pawns = pos.pieces_cp(us, PAWN);
    let mut min_king_pawn_distance = 0;
    if pawns != 0 {
        while distance_ring_bb(ksq, min_king_pawn_distance) & pawns == 0 {
            min_king_pawn_distance += 1;
        }
        min_king_pawn_distance += 1;
    }

    let mut bonus = shelter_storm(pos, us, ksq);

    // If we can castle use the bonus after castling if it is bigger
    if pos.has_castling_right(<Us::KingSide as CastlingRightTrait>::CR) {
        bonus = std::cmp::max(bonus, shelter_storm(pos, us, Square::G1.relative(us)));
    }
    if pos.has_castling_right(<Us::QueenSide as CastlingRightTrait>::CR) {
        bonus = std::cmp::max(bonus, shelter_storm(pos, us, Square::C1.relative(us)));
    }

    Score::make(bonus.0, -16 * min_king_pawn_distance)
}

fn evaluate<Us: ColorTrait>(pos: &Position, e: &mut Entry) -> Score {
    let us = Us::COLOR;
    let them = !us;
    let up = pawn_push(us);

    let our_pawns = pos.pieces_cp(us, PAWN);
    let their_pawns = pos.pieces_cp(them, PAWN);

    let mut score = Score::ZERO;
    e.passed_pawns[us.index()] = Bitboard(0);
    e.semiopen_files[us.index()] = 0xff;
    e.king_squares[us.index()] = Square::NONE;
    e.pawn_attacks[us.index()] = pawn_attacks_bb(us, our_pawns);

    for s in pos.square_list(us, PAWN) {
        let f = s.file();
        e.semiopen_files[us.index()] &= !(1u8 << f);

        let opposed = their_pawns & forward_file_bb(us, s);
        let stoppers = their_pawns & passed_pawn_mask(us, s);
        let lever = their_pawns & pawn_attacks(us, s);
        let doubled = our_pawns & (s - up);
        let neighbours = our_pawns & adjacent_files_bb(f);
        let phalanx = neighbours & s.rank_bb();
        let supported = neighbours & (s - up).rank_bb();

        // A pawn is backward when it is behind all pawns of the same color
        // on the adjacent files and cannot be safely advanced.
        let backward = if neighbours == 0 || lever != 0 || s.relative_rank(us) >= RANK_5 {
            false
        } else {
            let b = backmost_sq(us, neighbours | stoppers).rank_bb();
            (b | (b & adjacent_files_bb(f)).shift(up)) & stoppers != 0
        };

        if stoppers == 0 && our_pawns & forward_file_bb(us, s) == 0 {
            e.passed_pawns[us.index()] |= s;
        }

        if supported | phalanx != 0 {
            score += CONNECTED[usize::from(opposed != 0)][usize::from(phalanx != 0)]
                [popcount(supported) as usize][s.relative_rank(us) as usize];
        } else if neighbours == 0 {
            score -= ISOLATED;
        } else if backward {
            score -= BACKWARD;
        }

        if doubled != 0 && supported == 0 {
            score -= DOUBLED;
        }
    }

    score
}

// The pawn hash table, indexed by the low bits of the pawn key.
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

    // probe() looks up the pawn configuration of the position. If it is not
    // found, it is computed and stored in the table.
    pub fn probe(&mut self, pos: &Position) -> &mut Entry {
        let key = pos.pawn_key();
        let e = &mut self.entries[(key.0 as usize) & (TABLE_SIZE - 1)];

        if e.key == key {
            return e;
        }

        e.key = key;
        e.score = evaluate::<White>(pos, e) - evaluate::<Black>(pos, e);
        e
    }
}

impl Default for Table {
    fn default() -> Self {
        Self::new()
    }
}

pub fn init() {
    Lazy::force(&CONNECTED);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BLACK, FILE_D, FILE_E, WHITE};

    fn init() {
        crate::init();
    }

    #[test]
    fn test_start_position_is_symmetric() {
        init();
        let pos = Position::new();
        let mut table = Table::new();
        let e = table.probe(&pos);
        assert_eq!(e.pawns_score(), Score::ZERO);
        assert_eq!(e.passed_pawns(WHITE), Bitboard(0));
        assert!(!e.semiopen_file(WHITE, FILE_E));
        assert_eq!(e.pawn_attacks(WHITE), crate::bitboard::RANK3_BB);
    }

    #[test]
    fn test_passed_and_isolated() {
        init();
        // The d5 pawn is passed, the wing pawns block each other.
        let pos = Position::from_fen("4k3/6pp/8/3P4/8/8/6PP/4K3 w - - 0 1").unwrap();
        let mut table = Table::new();
        let e = table.probe(&pos);
        assert_eq!(e.passed_pawns(WHITE), Square::D5.bb());
        assert_eq!(e.passed_pawns(BLACK), Bitboard(0));
        assert!(e.semiopen_file(BLACK, FILE_D));
        assert!(!e.semiopen_file(WHITE, FILE_D));
    }

    #[test]
    fn test_doubled_pawns_are_penalized() {
        init();
        let mut table = Table::new();
        let healthy = Position::from_fen("4k3/8/8/8/8/8/PP6/4K3 w - - 0 1").unwrap();
        let doubled = Position::from_fen("4k3/8/8/8/8/P7/P7/4K3 w - - 0 1").unwrap();
        let h = table.probe(&healthy).pawns_score();
        let d = table.probe(&doubled).pawns_score();
        assert!(d.eg() < h.eg());
    }

    #[test]
    fn test_mirrored_structure_negates_score() {
        init();
        let mut table = Table::new();
        let mut pos = Position::from_fen("4k3/1p3pp1/p7/3P4/2P5/8/5PPP/4K3 w - - 0 1").unwrap();
        let white = table.probe(&pos).pawns_score();
        pos.flip();
        let black = table.probe(&pos).pawns_score();
        assert_eq!(white, -black);
    }

    #[test]
    fn test_king_shelter() {
        init();
        let mut table = Table::new();
        let sheltered = Position::from_fen("4k3/8/8/8/8/8/5PPP/6K1 w - - 0 1").unwrap();
        let exposed = Position::from_fen("4k3/8/8/8/5PPP/8/8/6K1 w - - 0 1").unwrap();
        let s = table.probe(&sheltered).king_safety::<White>(&sheltered, Square::G1);
        let x = table.probe(&exposed).king_safety::<White>(&exposed, Square::G1);
        assert!(s.mg() > x.mg());
    }
}
