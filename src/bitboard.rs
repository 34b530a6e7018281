// SPDX-License-Identifier: GPL-3.0-or-later

use crate::misc::Prng;
use crate::types::{
    direction::Direction, Color, File, PieceType, Square, BISHOP, BLACK, FILE_A, FILE_H, KING,
    KNIGHT, PAWN, QUEEN, ROOK, WHITE,
};
use crate::uci;
use once_cell::sync::Lazy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Bitboard(pub u64);

pub fn popcount(bb: Bitboard) -> u32 {
    bb.0.count_ones()
}

pub const FILEA_BB: Bitboard = Bitboard(0x0101_0101_0101_0101);
pub const FILEB_BB: Bitboard = Bitboard(0x0202_0202_0202_0202);
pub const FILEC_BB: Bitboard = Bitboard(0x0404_0404_0404_0404);
pub const FILED_BB: Bitboard = Bitboard(0x0808_0808_0808_0808);
pub const FILEE_BB: Bitboard = Bitboard(0x1010_1010_1010_1010);
pub const FILEF_BB: Bitboard = Bitboard(0x2020_2020_2020_2020);
pub const FILEG_BB: Bitboard = Bitboard(0x4040_4040_4040_4040);
pub const FILEH_BB: Bitboard = Bitboard(0x8080_8080_8080_8080);

pub const RANK1_BB: Bitboard = Bitboard(0xff);
pub const RANK2_BB: Bitboard = Bitboard(0xff00);
pub const RANK3_BB: Bitboard = Bitboard(0x00ff_0000);
pub const RANK4_BB: Bitboard = Bitboard(0xff00_0000);
pub const RANK5_BB: Bitboard = Bitboard(0x00ff_0000_0000);
pub const RANK6_BB: Bitboard = Bitboard(0xff00_0000_0000);
pub const RANK7_BB: Bitboard = Bitboard(0x00ff_0000_0000_0000);
pub const RANK8_BB: Bitboard = Bitboard(0xff00_0000_0000_0000);

const ROOK_DIRECTIONS: [Direction; 4] = [
    Direction::NORTH,
    Direction::EAST,
    Direction::SOUTH,
    Direction::WEST,
];

const BISHOP_DIRECTIONS: [Direction; 4] = [
    Direction::NORTH_EAST,
    Direction::SOUTH_EAST,
    Direction::SOUTH_WEST,
    Direction::NORTH_WEST,
];

// Size of the shared slider attack table addressed by the fixed-shift
// magics below. Bishops use 9 index bits, rooks 12; squares overlap in the
// table wherever their entries agree.
const ATTACK_TABLE_SIZE: usize = 88772;
const BISHOP_SHIFT: u32 = 64 - 9;
const ROOK_SHIFT: u32 = 64 - 12;

struct MagicInit {
    magic: u64,
    index: u32,
}

macro_rules! M {
    ($x:expr, $y:expr) => {
        MagicInit {
            magic: $x,
            index: $y,
        }
    };
}

const BISHOP_INIT: [MagicInit; 64] = [
    M!(0x007f_bfbf_bfbf_bfff, 5378),
    M!(0x0000_a060_4010_07fc, 4093),
    M!(0x0001_0040_0802_0000, 4314),
    M!(0x0000_8060_0400_0000, 6587),
    M!(0x0000_1004_0000_0000, 6491),
    M!(0x0000_21c1_00b2_0000, 6330),
    M!(0x0000_0400_4100_8000, 5609),
    M!(0x0000_0fb0_203f_ff80, 22236),
    M!(0x0000_0401_0040_1004, 6106),
    M!(0x0000_0200_8020_0802, 5625),
    M!(0x0000_0040_1020_2000, 16785),
    M!(0x0000_0080_6004_0000, 16817),
    M!(0x0000_0044_0200_0000, 6842),
    M!(0x0000_0008_0100_8000, 7003),
    M!(0x0000_07ef_e0bf_ff80, 4197),
    M!(0x0000_0008_2082_0020, 7356),
    M!(0x0000_4000_8080_8080, 4602),
    M!(0x0002_1f01_0040_0808, 4538),
    M!(0x0001_8000_c06f_3fff, 29531),
    M!(0x0000_2582_0080_1000, 45393),
    M!(0x0000_2400_8084_0000, 12420),
    M!(0x0000_1800_0c03_fff8, 15763),
    M!(0x0000_0a58_4020_8020, 5050),
    M!(0x0000_0200_0820_8020, 4346),
    M!(0x0000_8040_0081_0100, 6074),
    M!(0x0001_0119_0080_2008, 7866),
    M!(0x0000_8040_0081_0100, 32139),
    M!(0x0001_0040_3c04_03ff, 57673),
    M!(0x0007_8402_a880_2000, 55365),
    M!(0x0000_1010_0080_4400, 15818),
    M!(0x0000_0808_0010_4100, 5562),
    M!(0x0000_4004_c008_2008, 6390),
    M!(0x0001_0101_2000_8020, 7930),
    M!(0x0000_8080_9a00_4010, 13329),
    M!(0x0007_fefe_0881_0010, 7170),
    M!(0x0003_ff0f_833f_c080, 27267),
    M!(0x007f_e080_1900_3042, 53787),
    M!(0x003f_ffef_ea00_3000, 5097),
    M!(0x0000_1010_1000_2080, 6643),
    M!(0x0000_8020_0508_0804, 6138),
    M!(0x0000_8080_80a8_0040, 7418),
    M!(0x0000_1041_0020_0040, 7898),
    M!(0x0003_ffdf_7f83_3fc0, 42012),
    M!(0x0000_0088_4045_0020, 57350),
    M!(0x0000_7ffc_8018_0030, 22813),
    M!(0x007f_ffdd_8014_0028, 56693),
    M!(0x0002_0080_200a_0004, 5818),
    M!(0x0000_1010_1010_0020, 7098),
    M!(0x0007_ffdf_c180_5000, 4451),
    M!(0x0003_ffef_e0c0_2200, 4709),
    M!(0x0000_0008_2080_6000, 4794),
    M!(0x0000_0000_0840_3000, 13364),
    M!(0x0000_0001_0020_2000, 4570),
    M!(0x0000_0040_4080_2000, 4282),
    M!(0x0004_0100_4010_0400, 14964),
    M!(0x0000_6020_6018_03f4, 4026),
    M!(0x0003_ffdf_dfc2_8048, 4826),
    M!(0x0000_0008_2082_0020, 7354),
    M!(0x0000_0000_0820_8060, 4848),
    M!(0x0000_0000_0080_8020, 15946),
    M!(0x0000_0000_0100_2020, 14932),
    M!(0x0000_0004_0100_2008, 16588),
    M!(0x0000_0040_4040_4040, 6905),
    M!(0x007f_ff9f_df7f_f813, 16076),
];

const ROOK_INIT: [MagicInit; 64] = [
    M!(0x0028_0077_ffeb_fffe, 26304),
    M!(0x2004_0102_0109_7fff, 35520),
    M!(0x0010_0200_1005_3fff, 38592),
    M!(0x0040_0400_0800_4002, 8026),
    M!(0x7fd0_0441_ffff_d003, 22196),
    M!(0x4020_0088_87df_fffe, 80870),
    M!(0x0040_0088_8847_ffff, 76747),
    M!(0x0068_00fb_ff75_fffd, 30400),
    M!(0x0000_2801_0113_ffff, 11115),
    M!(0x0020_0402_01fc_ffff, 18205),
    M!(0x007f_e800_42ff_ffe8, 53577),
    M!(0x0000_1800_217f_ffe8, 62724),
    M!(0x0000_1800_073f_ffe8, 34282),
    M!(0x0000_1800_e05f_ffe8, 29196),
    M!(0x0000_1800_602f_ffe8, 23806),
    M!(0x0000_3000_2fff_ffa0, 49481),
    M!(0x0030_0018_010b_ffff, 2410),
    M!(0x0003_000c_0085_fffb, 36498),
    M!(0x0004_0008_0201_0008, 24478),
    M!(0x0004_0020_2002_0004, 10074),
    M!(0x0001_0020_0200_2001, 79315),
    M!(0x0001_0010_0080_1040, 51779),
    M!(0x0000_0040_4000_8001, 13586),
    M!(0x0000_0068_00cd_fff4, 19323),
    M!(0x0040_2000_1008_0010, 70612),
    M!(0x0000_0800_1004_0010, 83652),
    M!(0x0004_0100_0802_0008, 63110),
    M!(0x0000_0400_2020_0200, 34496),
    M!(0x0002_0080_1010_0100, 84966),
    M!(0x0000_0080_2001_0020, 54341),
    M!(0x0000_0080_2020_0040, 60421),
    M!(0x0000_8200_2000_4020, 86402),
    M!(0x00ff_fd18_0030_0030, 50245),
    M!(0x007f_ff7f_bfd4_0020, 76622),
    M!(0x003f_ffbd_0018_0018, 84676),
    M!(0x001f_ffde_8018_0018, 78757),
    M!(0x000f_ffe0_bfe8_0018, 37346),
    M!(0x0001_0000_8020_2001, 370),
    M!(0x0003_fffb_ff98_0180, 42182),
    M!(0x0001_fffd_ff90_00e0, 45385),
    M!(0x00ff_fefe_ebff_d800, 61659),
    M!(0x007f_fff7_ffc0_1400, 12790),
    M!(0x003f_ffbf_e4ff_e800, 16762),
    M!(0x001f_fff0_1fc0_3000, 0),
    M!(0x000f_ffe7_f8bf_e800, 38380),
    M!(0x0007_ffdf_df3f_f808, 11098),
    M!(0x0003_fff8_5fff_a804, 21803),
    M!(0x0001_fffd_75ff_a802, 39189),
    M!(0x00ff_ffd7_ffeb_ffd8, 58628),
    M!(0x007f_ff75_ff7f_bfd8, 44116),
    M!(0x003f_ff86_3fbf_7fd8, 78357),
    M!(0x001f_ffbf_dfd7_ffd8, 44481),
    M!(0x000f_fff8_1028_0028, 64134),
    M!(0x0007_ffd7_f7fe_ffd8, 41759),
    M!(0x0003_fffc_0c48_0048, 1394),
    M!(0x0001_ffff_afd7_ffd8, 40910),
    M!(0x00ff_ffe4_ffdf_a3ba, 66516),
    M!(0x007f_ffef_7ff3_d3da, 3897),
    M!(0x003f_ffbf_dfef_f7fa, 3930),
    M!(0x001f_ffef_f7fb_fc22, 72934),
    M!(0x0000_0204_0800_1001, 72662),
    M!(0x0007_fffe_ffff_77fd, 56325),
    M!(0x0003_ffff_bf7d_feec, 66501),
    M!(0x0001_ffff_9dff_a333, 14826),
];


#[derive(Clone, Copy, Default)]
struct Magic {
    mask: Bitboard,
    magic: u64,
    offset: usize,
    shift: u32,
}

impl Magic {
    // Compute the attack's index using the 'magic bitboards' approach
    fn index(&self, occupied: Bitboard) -> usize {
        self.offset + (u64::wrapping_mul((occupied & self.mask).0, self.magic) >> self.shift) as usize
    }
}

struct MagicTables {
    bishop: [Magic; 64],
    rook: [Magic; 64],
    attacks: Vec<Bitboard>,
}

impl MagicTables {
    fn new() -> MagicTables {
        let mut t = MagicTables {
            bishop: [Magic::default(); 64],
            rook: [Magic::default(); 64],
            attacks: vec![Bitboard(0); ATTACK_TABLE_SIZE],
        };
        Self::init(&mut t.bishop, &mut t.attacks, &BISHOP_INIT, BISHOP_DIRECTIONS, BISHOP_SHIFT);
        Self::init(&mut t.rook, &mut t.attacks, &ROOK_INIT, ROOK_DIRECTIONS, ROOK_SHIFT);
        t
    }

    fn init(
        magics: &mut [Magic; 64],
        table: &mut [Bitboard],
        magic_init: &[MagicInit; 64],
        dirs: [Direction; 4],
        shift: u32,
    ) {
        for s in Square::all() {
            let m = &mut magics[s.index()];
            m.mask = relevant_occupancies(dirs, s);
            m.magic = magic_init[s.index()].magic;
            m.offset = magic_init[s.index()].index as usize;
            m.shift = shift;

            // Use Carry-Rippler trick to enumerate all subsets of the mask
            // and fill the attacks table.
            let mut b = Bitboard(0);
            loop {
                table[m.index(b)] = sliding_attack(dirs, s, b);
                b = Bitboard(u64::wrapping_sub(b.0, m.mask.0)) & m.mask;
                if b == 0 {
                    break;
                }
            }
        }
    }
}

static MAGICS: Lazy<MagicTables> = Lazy::new(MagicTables::new);

struct Tables {
    square_distance: [[u8; 64]; 64],
    adjacent_files: [Bitboard; 8],
    forward_ranks: [[Bitboard; 8]; 2],
    forward_file: [[Bitboard; 64]; 2],
    pawn_attack_span: [[Bitboard; 64]; 2],
    passed_pawn_mask: [[Bitboard; 64]; 2],
    between: [[Bitboard; 64]; 64],
    line: [[Bitboard; 64]; 64],
    distance_ring: [[Bitboard; 8]; 64],
    pseudo_attacks: [[Bitboard; 64]; 8],
    pawn_attacks: [[Bitboard; 64]; 2],
}

static TABLES: Lazy<Box<Tables>> = Lazy::new(Tables::new);

impl Tables {
    #[allow(clippy::too_many_lines)]
    fn new() -> Box<Tables> {
        let mut t = Box::new(Tables {
            square_distance: [[0; 64]; 64],
            adjacent_files: [Bitboard(0); 8],
            forward_ranks: [[Bitboard(0); 8]; 2],
            forward_file: [[Bitboard(0); 64]; 2],
            pawn_attack_span: [[Bitboard(0); 64]; 2],
            passed_pawn_mask: [[Bitboard(0); 64]; 2],
            between: [[Bitboard(0); 64]; 64],
            line: [[Bitboard(0); 64]; 64],
            distance_ring: [[Bitboard(0); 8]; 64],
            pseudo_attacks: [[Bitboard(0); 64]; 8],
            pawn_attacks: [[Bitboard(0); 64]; 2],
        });

        for f in 0..8 {
            let left = if f > FILE_A { file_bb(f - 1) } else { Bitboard(0) };
            let right = if f < FILE_H { file_bb(f + 1) } else { Bitboard(0) };
            t.adjacent_files[f as usize] = left | right;
        }

        for r in 0..7 {
            let black_forward = t.forward_ranks[BLACK.index()][r] | rank_bb(r as u32);
            t.forward_ranks[BLACK.index()][r + 1] = black_forward;
            t.forward_ranks[WHITE.index()][r] = !black_forward;
        }

        for &c in &[WHITE, BLACK] {
            for s in Square::all() {
                let forward = t.forward_ranks[c.index()][s.rank() as usize];
                let forward_file = forward & s.file_bb();
                let span = forward & t.adjacent_files[s.file() as usize];
                t.forward_file[c.index()][s.index()] = forward_file;
                t.pawn_attack_span[c.index()][s.index()] = span;
                t.passed_pawn_mask[c.index()][s.index()] = forward_file | span;
            }
        }

        for s1 in Square::all() {
            for s2 in Square::all() {
                if s1 != s2 {
                    let d = raw_distance(s1, s2);
                    t.square_distance[s1.index()][s2.index()] = d as u8;
                    t.distance_ring[s1.index()][d as usize - 1] |= s2;
                }
            }
        }

        for s in Square::all() {
            for &(c, step) in &[(WHITE, 7), (WHITE, 9), (BLACK, -7), (BLACK, -9)] {
                let to = s + Direction(step);
                if to.is_ok() && raw_distance(s, to) < 3 {
                    t.pawn_attacks[c.index()][s.index()] |= to;
                }
            }
            for &step in &[6, 10, 15, 17, -6, -10, -15, -17] {
                let to = s + Direction(step);
                if to.is_ok() && raw_distance(s, to) < 3 {
                    t.pseudo_attacks[KNIGHT.index()][s.index()] |= to;
                }
            }
            for &step in &[1, 7, 8, 9, -1, -7, -8, -9] {
                let to = s + Direction(step);
                if to.is_ok() && raw_distance(s, to) < 3 {
                    t.pseudo_attacks[KING.index()][s.index()] |= to;
                }
            }
        }

        for s1 in Square::all() {
            let bishop = attacks_bb(BISHOP, s1, Bitboard(0));
            let rook = attacks_bb(ROOK, s1, Bitboard(0));
            t.pseudo_attacks[BISHOP.index()][s1.index()] = bishop;
            t.pseudo_attacks[ROOK.index()][s1.index()] = rook;
            t.pseudo_attacks[QUEEN.index()][s1.index()] = bishop | rook;

            for &pt in &[BISHOP, ROOK] {
                let s1_attacks = attacks_bb(pt, s1, Bitboard(0));
                for s2 in Square::all() {
                    if s1_attacks & s2 == 0 {
                        continue;
                    }
                    let s2_attacks = attacks_bb(pt, s2, Bitboard(0));
                    t.line[s1.index()][s2.index()] = (s1_attacks & s2_attacks) | s1 | s2;
                    t.between[s1.index()][s2.index()] =
                        attacks_bb(pt, s1, s2.bb()) & attacks_bb(pt, s2, s1.bb());
                }
            }
        }

        t
    }
}

// Forces construction of all lookup tables.
pub fn init() {
    Lazy::force(&MAGICS);
    Lazy::force(&TABLES);
}

fn raw_distance(s1: Square, s2: Square) -> u32 {
    std::cmp::max(
        s1.file().abs_diff(s2.file()),
        s1.rank().abs_diff(s2.rank()),
    )
}

// Reference ray casting. Used to fill the magic tables and to validate them.
pub fn sliding_attack(dirs: [Direction; 4], sq: Square, occupied: Bitboard) -> Bitboard {
    let mut attack = Bitboard(0);
    for &d in &dirs {
        let mut s = sq + d;
        while s.is_ok() && raw_distance(s, s - d) == 1 {
            attack |= s;
            if occupied & s != 0 {
                break;
            }
            s += d;
        }
    }
    attack
}

// Board edges are not considered in the relevant occupancies
fn relevant_occupancies(dirs: [Direction; 4], s: Square) -> Bitboard {
    let edges = ((RANK1_BB | RANK8_BB) & !s.rank_bb()) | ((FILEA_BB | FILEH_BB) & !s.file_bb());
    sliding_attack(dirs, s, Bitboard(0)) & !edges
}

// find_magic() is the offline generator for the literal tables above: it
// draws sparse random multipliers until one maps every occupancy subset of
// the square's mask into 2^bits slots without a destructive collision.
pub fn find_magic(pt: PieceType, s: Square, bits: u32, rng: &mut Prng) -> Option<u64> {
    let dirs = if pt == ROOK { ROOK_DIRECTIONS } else { BISHOP_DIRECTIONS };
    let mask = relevant_occupancies(dirs, s);

    let mut occupancy = Vec::with_capacity(4096);
    let mut reference = Vec::with_capacity(4096);
    let mut b = Bitboard(0);
    loop {
        occupancy.push(b);
        reference.push(sliding_attack(dirs, s, b));
        b = Bitboard(u64::wrapping_sub(b.0, mask.0)) & mask;
        if b == 0 {
            break;
        }
    }

    let size = 1usize << bits;
    let mut used = vec![None; size];
    for _ in 0..100_000_000u32 {
        let magic = rng.sparse_rand();
        if (u64::wrapping_mul(mask.0, magic) >> 56).count_ones() < 6 {
            continue;
        }
        used.iter_mut().for_each(|e| *e = None);
        let fits = occupancy.iter().zip(&reference).all(|(occ, att)| {
            let idx = (u64::wrapping_mul(occ.0, magic) >> (64 - bits)) as usize;
            match used[idx] {
                None => {
                    used[idx] = Some(*att);
                    true
                }
                Some(a) => a == *att,
            }
        });
        if fits {
            return Some(magic);
        }
    }
    None
}

impl std::convert::From<Square> for Bitboard {
    fn from(s: Square) -> Self {
        debug_assert!(s.is_ok());
        Bitboard(1u64 << s.0)
    }
}

impl Square {
    pub fn bb(self) -> Bitboard {
        Bitboard::from(self)
    }

    pub fn file_bb(self) -> Bitboard {
        file_bb(self.file())
    }

    pub fn rank_bb(self) -> Bitboard {
        rank_bb(self.rank())
    }
}

impl std::ops::BitOr<Bitboard> for Bitboard {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Bitboard(self.0 | rhs.0)
    }
}

impl std::ops::BitOr<Square> for Bitboard {
    type Output = Bitboard;
    fn bitor(self, rhs: Square) -> Self {
        self | Bitboard::from(rhs)
    }
}

impl std::ops::BitAnd<Bitboard> for Bitboard {
    type Output = Self;
    fn bitand(self, rhs: Self) -> Self {
        Bitboard(self.0 & rhs.0)
    }
}

impl std::ops::BitAnd<Square> for Bitboard {
    type Output = Bitboard;
    fn bitand(self, rhs: Square) -> Self {
        self & Bitboard::from(rhs)
    }
}

impl std::ops::BitXor<Bitboard> for Bitboard {
    type Output = Self;
    fn bitxor(self, rhs: Self) -> Self {
        Bitboard(self.0 ^ rhs.0)
    }
}

impl std::ops::BitXor<Square> for Bitboard {
    type Output = Bitboard;
    fn bitxor(self, rhs: Square) -> Self {
        self ^ Bitboard::from(rhs)
    }
}

impl std::ops::Not for Bitboard {
    type Output = Bitboard;
    fn not(self) -> Self {
        Bitboard(!self.0)
    }
}

impl std::ops::Shl<i32> for Bitboard {
    type Output = Bitboard;
    fn shl(self, rhs: i32) -> Self {
        Bitboard(self.0 << rhs)
    }
}

impl std::ops::Shr<i32> for Bitboard {
    type Output = Bitboard;
    fn shr(self, rhs: i32) -> Self {
        Bitboard(self.0 >> rhs)
    }
}

impl<RHS> std::ops::BitOrAssign<RHS> for Bitboard
where
    Bitboard: std::ops::BitOr<RHS, Output = Bitboard>,
{
    fn bitor_assign(&mut self, rhs: RHS) {
        *self = *self | rhs;
    }
}

impl<RHS> std::ops::BitAndAssign<RHS> for Bitboard
where
    Bitboard: std::ops::BitAnd<RHS, Output = Bitboard>,
{
    fn bitand_assign(&mut self, rhs: RHS) {
        *self = *self & rhs;
    }
}

impl<RHS> std::ops::BitXorAssign<RHS> for Bitboard
where
    Bitboard: std::ops::BitXor<RHS, Output = Bitboard>,
{
    fn bitxor_assign(&mut self, rhs: RHS) {
        *self = *self ^ rhs;
    }
}

impl std::cmp::PartialEq<u64> for Bitboard {
    fn eq(&self, rhs: &u64) -> bool {
        debug_assert!(*rhs == 0);
        self.0 == *rhs
    }
}

impl std::fmt::Display for Bitboard {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        for s in *self {
            write!(f, "{} ", uci::square(s))?;
        }
        Ok(())
    }
}

pub fn more_than_one(b: Bitboard) -> bool {
    (b.0 & u64::wrapping_sub(b.0, 1)) != 0
}

pub fn lsb(b: Bitboard) -> Square {
    debug_assert!(b != 0);
    Square(u64::trailing_zeros(b.0))
}

pub fn msb(b: Bitboard) -> Square {
    debug_assert!(b != 0);
    Square(63 ^ u64::leading_zeros(b.0))
}

pub fn pop_lsb(b: &mut Bitboard) -> Square {
    let s = lsb(*b);
    b.0 &= u64::wrapping_sub(b.0, 1);
    s
}

pub fn frontmost_sq(c: Color, b: Bitboard) -> Square {
    if c == WHITE {
        msb(b)
    } else {
        lsb(b)
    }
}

pub fn backmost_sq(c: Color, b: Bitboard) -> Square {
    if c == WHITE {
        lsb(b)
    } else {
        msb(b)
    }
}

impl IntoIterator for Bitboard {
    type Item = Square;
    type IntoIter = BitboardIntoIter;

    fn into_iter(self) -> Self::IntoIter {
        BitboardIntoIter(self)
    }
}

pub struct BitboardIntoIter(Bitboard);

impl Iterator for BitboardIntoIter {
    type Item = Square;

    fn next(&mut self) -> Option<Self::Item> {
        if self.0 != 0 {
            Some(pop_lsb(&mut self.0))
        } else {
            None
        }
    }
}

pub fn file_bb(f: File) -> Bitboard {
    FILEA_BB << f as i32
}

pub fn rank_bb(r: u32) -> Bitboard {
    RANK1_BB << (8 * r) as i32
}

impl Bitboard {
    // shift() moves a bitboard one step along direction d. Mainly for pawns.
    pub fn shift(self, d: Direction) -> Bitboard {
        match d {
            Direction::NORTH => self << 8,
            Direction::SOUTH => self >> 8,
            Direction::EAST => (self & !FILEH_BB) << 1,
            Direction::WEST => (self & !FILEA_BB) >> 1,
            Direction::NORTH_EAST => (self & !FILEH_BB) << 9,
            Direction::SOUTH_EAST => (self & !FILEH_BB) >> 7,
            Direction::NORTH_WEST => (self & !FILEA_BB) << 7,
            Direction::SOUTH_WEST => (self & !FILEA_BB) >> 9,
            _ => Bitboard(0),
        }
    }
}

// Squares attacked by all pawns of color c on the given bitboard.
pub fn pawn_attacks_bb(c: Color, b: Bitboard) -> Bitboard {
    if c == WHITE {
        b.shift(Direction::NORTH_WEST) | b.shift(Direction::NORTH_EAST)
    } else {
        b.shift(Direction::SOUTH_WEST) | b.shift(Direction::SOUTH_EAST)
    }
}

pub fn adjacent_files_bb(f: File) -> Bitboard {
    TABLES.adjacent_files[f as usize]
}

// between_bb() returns the squares strictly between s1 and s2, or an empty
// bitboard if they are not on a common rank, file or diagonal.
pub fn between_bb(s1: Square, s2: Square) -> Bitboard {
    TABLES.between[s1.index()][s2.index()]
}

// All squares on the ranks in front of s, from the point of view of c.
pub fn forward_ranks_bb(c: Color, s: Square) -> Bitboard {
    TABLES.forward_ranks[c.index()][s.rank() as usize]
}

pub fn forward_file_bb(c: Color, s: Square) -> Bitboard {
    TABLES.forward_file[c.index()][s.index()]
}

pub fn pawn_attack_span(c: Color, s: Square) -> Bitboard {
    TABLES.pawn_attack_span[c.index()][s.index()]
}

// A pawn of color c on s is passed if no enemy pawn is on this mask.
pub fn passed_pawn_mask(c: Color, s: Square) -> Bitboard {
    TABLES.passed_pawn_mask[c.index()][s.index()]
}

// The full line through s1 and s2, or empty if they are not aligned.
pub fn line_bb(s1: Square, s2: Square) -> Bitboard {
    TABLES.line[s1.index()][s2.index()]
}

pub fn aligned(s1: Square, s2: Square, s3: Square) -> bool {
    line_bb(s1, s2) & s3 != 0
}

pub fn pseudo_attacks(pt: PieceType, s: Square) -> Bitboard {
    TABLES.pseudo_attacks[pt.index()][s.index()]
}

pub fn pawn_attacks(c: Color, s: Square) -> Bitboard {
    TABLES.pawn_attacks[c.index()][s.index()]
}

pub fn distance_ring_bb(s: Square, d: i32) -> Bitboard {
    TABLES.distance_ring[s.index()][d as usize]
}

pub fn distance(s1: Square, s2: Square) -> u32 {
    u32::from(TABLES.square_distance[s1.index()][s2.index()])
}

// attacks_bb() returns the squares attacked by a piece of type pt placed on
// s, given the occupancy. Pawns are handled by pawn_attacks().
pub fn attacks_bb(pt: PieceType, s: Square, occupied: Bitboard) -> Bitboard {
    let m = &*MAGICS;
    match pt {
        BISHOP => m.attacks[m.bishop[s.index()].index(occupied)],
        ROOK => m.attacks[m.rook[s.index()].index(occupied)],
        QUEEN => {
            m.attacks[m.bishop[s.index()].index(occupied)]
                | m.attacks[m.rook[s.index()].index(occupied)]
        }
        _ => {
            debug_assert!(pt != PAWN);
            pseudo_attacks(pt, s)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subsets(mask: Bitboard) -> Vec<Bitboard> {
        let mut v = Vec::new();
        let mut b = Bitboard(0);
        loop {
            v.push(b);
            b = Bitboard(u64::wrapping_sub(b.0, mask.0)) & mask;
            if b == 0 {
                break;
            }
        }
        v
    }

    #[test]
    fn test_magic_attacks_match_ray_casting() {
        for s in Square::all() {
            for &(pt, dirs) in &[(ROOK, ROOK_DIRECTIONS), (BISHOP, BISHOP_DIRECTIONS)] {
                let mask = relevant_occupancies(dirs, s);
                for occ in subsets(mask) {
                    assert_eq!(
                        attacks_bb(pt, s, occ),
                        sliding_attack(dirs, s, occ),
                        "square {} occupancy {:x}",
                        s.0,
                        occ.0
                    );
                }
            }
        }
    }

    #[test]
    fn test_occupancy_outside_mask_is_ignored() {
        let s = Square::D4;
        let occ = Bitboard(0x0123_4567_89ab_cdef);
        assert_eq!(attacks_bb(ROOK, s, occ), sliding_attack(ROOK_DIRECTIONS, s, occ));
        assert_eq!(
            attacks_bb(QUEEN, s, occ),
            sliding_attack(ROOK_DIRECTIONS, s, occ) | sliding_attack(BISHOP_DIRECTIONS, s, occ)
        );
    }

    #[test]
    fn test_find_magic_produces_collision_free_multiplier() {
        let mut rng = Prng::new(728);
        let magic = find_magic(BISHOP, Square::A1, 6, &mut rng);
        assert!(magic.is_some());
    }

    #[test]
    fn test_leaper_attacks() {
        assert_eq!(popcount(pseudo_attacks(KNIGHT, Square::A1)), 2);
        assert_eq!(popcount(pseudo_attacks(KNIGHT, Square::D4)), 8);
        assert_eq!(popcount(pseudo_attacks(KING, Square::H8)), 3);
        assert_eq!(pawn_attacks(WHITE, Square::E4), Square::D5.bb() | Square::F5);
        assert_eq!(pawn_attacks(BLACK, Square::A7), Square::B6.bb());
    }

    #[test]
    fn test_between_and_line() {
        assert_eq!(between_bb(Square::C4, Square::F7), Square::D5.bb() | Square::E6);
        assert_eq!(between_bb(Square::A1, Square::B3), Bitboard(0));
        assert!(aligned(Square::A1, Square::C3, Square::H8));
        assert!(!aligned(Square::A1, Square::C3, Square::H7));
    }

    #[test]
    fn test_bit_scans() {
        let mut b = Square::C3.bb() | Square::G7;
        assert_eq!(lsb(b), Square::C3);
        assert_eq!(msb(b), Square::G7);
        assert!(more_than_one(b));
        assert_eq!(pop_lsb(&mut b), Square::C3);
        assert!(!more_than_one(b));
        assert_eq!(b.into_iter().collect::<Vec<_>>(), vec![Square::G7]);
    }

    #[test]
    fn test_masks() {
        assert_eq!(
            forward_file_bb(WHITE, Square::E6),
            Square::E7.bb() | Square::E8
        );
        assert_eq!(popcount(passed_pawn_mask(BLACK, Square::B3)), 6);
        assert_eq!(distance(Square::A1, Square::H8), 7);
        assert_eq!(popcount(distance_ring_bb(Square::D4, 0)), 8);
    }

    #[test]
    fn test_shift_does_not_wrap() {
        assert_eq!(FILEH_BB.shift(Direction::NORTH_EAST), Bitboard(0));
        assert_eq!(Square::A2.bb().shift(Direction::WEST), Bitboard(0));
        assert_eq!(Square::E2.bb().shift(Direction::NORTH), Square::E3.bb());
    }
}
