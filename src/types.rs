// SPDX-License-Identifier: GPL-3.0-or-later

pub mod bound;
pub mod depth;
pub mod direction;
pub mod key;
pub mod scale_factor;

pub const MAX_MOVES: usize = 256;
pub const MAX_PLY: i32 = 100;
pub const MAX_MATE_PLY: i32 = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color(pub u32);

pub const WHITE: Color = Color(0);
pub const BLACK: Color = Color(1);

impl Color {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::ops::Not for Color {
    type Output = Color;
    fn not(self) -> Self {
        Color(self.0 ^ 1)
    }
}

impl std::ops::BitXor<bool> for Color {
    type Output = Self;
    fn bitxor(self, rhs: bool) -> Self {
        Color(self.0 ^ u32::from(rhs))
    }
}

// Compile-time color tags, used to monomorphize move generation.
pub struct White;
pub struct Black;

pub trait ColorTrait {
    type KingSide: CastlingRightTrait;
    type QueenSide: CastlingRightTrait;
    const COLOR: Color;
}

impl ColorTrait for White {
    type KingSide = WhiteOO;
    type QueenSide = WhiteOOO;
    const COLOR: Color = WHITE;
}

impl ColorTrait for Black {
    type KingSide = BlackOO;
    type QueenSide = BlackOOO;
    const COLOR: Color = BLACK;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastlingSide {
    King,
    Queen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CastlingRight(pub u32);

pub const NO_CASTLING: CastlingRight = CastlingRight(0);
pub const WHITE_OO: CastlingRight = CastlingRight(1);
pub const WHITE_OOO: CastlingRight = CastlingRight(2);
pub const BLACK_OO: CastlingRight = CastlingRight(4);
pub const BLACK_OOO: CastlingRight = CastlingRight(8);
pub const ANY_CASTLING: CastlingRight = CastlingRight(15);

pub trait CastlingRightTrait {
    const CR: CastlingRight;
}

pub struct WhiteOO;
pub struct WhiteOOO;
pub struct BlackOO;
pub struct BlackOOO;

impl CastlingRightTrait for WhiteOO {
    const CR: CastlingRight = WHITE_OO;
}

impl CastlingRightTrait for WhiteOOO {
    const CR: CastlingRight = WHITE_OOO;
}

impl CastlingRightTrait for BlackOO {
    const CR: CastlingRight = BLACK_OO;
}

impl CastlingRightTrait for BlackOOO {
    const CR: CastlingRight = BLACK_OOO;
}

impl CastlingRight {
    pub fn make(c: Color, cs: CastlingSide) -> CastlingRight {
        CastlingRight(1u32 << ((cs as u32) + 2 * c.0))
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::ops::BitAnd<CastlingRight> for CastlingRight {
    type Output = Self;
    fn bitand(self, rhs: Self) -> Self {
        CastlingRight(self.0 & rhs.0)
    }
}

impl std::ops::BitOr<CastlingRight> for CastlingRight {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        CastlingRight(self.0 | rhs.0)
    }
}

impl std::ops::BitAndAssign<CastlingRight> for CastlingRight {
    fn bitand_assign(&mut self, rhs: Self) {
        *self = *self & rhs;
    }
}

impl std::ops::BitOrAssign<CastlingRight> for CastlingRight {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = *self | rhs;
    }
}

impl std::ops::Not for CastlingRight {
    type Output = CastlingRight;
    fn not(self) -> Self {
        CastlingRight(!self.0 & ANY_CASTLING.0)
    }
}

impl std::cmp::PartialEq<u32> for CastlingRight {
    fn eq(&self, rhs: &u32) -> bool {
        debug_assert!(*rhs == 0);
        self.0 == *rhs
    }
}

pub type Phase = i32;

pub const PHASE_ENDGAME: Phase = 0;
pub const PHASE_MIDGAME: Phase = 128;

pub const MG: usize = 0;
pub const EG: usize = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct PieceType(pub u32);

pub const NO_PIECE_TYPE: PieceType = PieceType(0);
pub const ALL_PIECES: PieceType = PieceType(0);

pub const PAWN: PieceType = PieceType(1);
pub const KNIGHT: PieceType = PieceType(2);
pub const BISHOP: PieceType = PieceType(3);
pub const ROOK: PieceType = PieceType(4);
pub const QUEEN: PieceType = PieceType(5);
pub const KING: PieceType = PieceType(6);

impl PieceType {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

pub struct Pawn;
pub struct Knight;
pub struct Bishop;
pub struct Rook;
pub struct Queen;
pub struct King;

pub trait PieceTypeTrait {
    const TYPE: PieceType;
}

impl PieceTypeTrait for Pawn {
    const TYPE: PieceType = PAWN;
}

impl PieceTypeTrait for Knight {
    const TYPE: PieceType = KNIGHT;
}

impl PieceTypeTrait for Bishop {
    const TYPE: PieceType = BISHOP;
}

impl PieceTypeTrait for Rook {
    const TYPE: PieceType = ROOK;
}

impl PieceTypeTrait for Queen {
    const TYPE: PieceType = QUEEN;
}

impl PieceTypeTrait for King {
    const TYPE: PieceType = KING;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Piece(pub u32);

pub const NO_PIECE: Piece = Piece(0);

pub const W_PAWN: Piece = Piece(1);
pub const W_KNIGHT: Piece = Piece(2);
pub const W_BISHOP: Piece = Piece(3);
pub const W_ROOK: Piece = Piece(4);
pub const W_QUEEN: Piece = Piece(5);
pub const W_KING: Piece = Piece(6);

pub const B_PAWN: Piece = Piece(9);
pub const B_KNIGHT: Piece = Piece(10);
pub const B_BISHOP: Piece = Piece(11);
pub const B_ROOK: Piece = Piece(12);
pub const B_QUEEN: Piece = Piece(13);
pub const B_KING: Piece = Piece(14);

pub const PIECES: [Piece; 12] = [
    W_PAWN, W_KNIGHT, W_BISHOP, W_ROOK, W_QUEEN, W_KING, B_PAWN, B_KNIGHT, B_BISHOP, B_ROOK,
    B_QUEEN, B_KING,
];

impl Piece {
    pub fn piece_type(self) -> PieceType {
        PieceType(self.0 & 7)
    }

    pub fn color(self) -> Color {
        Color(self.0 >> 3)
    }

    pub fn make(c: Color, pt: PieceType) -> Piece {
        Piece((c.0 << 3) + pt.0)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

// Swaps the color of a piece.
impl std::ops::Not for Piece {
    type Output = Self;
    fn not(self) -> Self {
        Piece(self.0 ^ 8)
    }
}

pub type File = u32;
pub type Rank = u32;

pub const FILE_A: File = 0;
pub const FILE_B: File = 1;
pub const FILE_C: File = 2;
pub const FILE_D: File = 3;
pub const FILE_E: File = 4;
pub const FILE_F: File = 5;
pub const FILE_G: File = 6;
pub const FILE_H: File = 7;

pub const RANK_1: Rank = 0;
pub const RANK_2: Rank = 1;
pub const RANK_3: Rank = 2;
pub const RANK_4: Rank = 3;
pub const RANK_5: Rank = 4;
pub const RANK_6: Rank = 5;
pub const RANK_7: Rank = 6;
pub const RANK_8: Rank = 7;

pub fn relative_rank(c: Color, r: Rank) -> Rank {
    r ^ (c.0 * 7)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Square(pub u32);

impl Square {
    pub const A1: Square = Square(0);
    pub const B1: Square = Square(1);
    pub const C1: Square = Square(2);
    pub const D1: Square = Square(3);
    pub const E1: Square = Square(4);
    pub const F1: Square = Square(5);
    pub const G1: Square = Square(6);
    pub const H1: Square = Square(7);
    pub const A2: Square = Square(8);
    pub const B2: Square = Square(9);
    pub const C2: Square = Square(10);
    pub const D2: Square = Square(11);
    pub const E2: Square = Square(12);
    pub const F2: Square = Square(13);
    pub const G2: Square = Square(14);
    pub const H2: Square = Square(15);
    pub const A3: Square = Square(16);
    pub const B3: Square = Square(17);
    pub const C3: Square = Square(18);
    pub const D3: Square = Square(19);
    pub const E3: Square = Square(20);
    pub const F3: Square = Square(21);
    pub const G3: Square = Square(22);
    pub const H3: Square = Square(23);
    pub const A4: Square = Square(24);
    pub const B4: Square = Square(25);
    pub const C4: Square = Square(26);
    pub const D4: Square = Square(27);
    pub const E4: Square = Square(28);
    pub const F4: Square = Square(29);
    pub const G4: Square = Square(30);
    pub const H4: Square = Square(31);
    pub const A5: Square = Square(32);
    pub const B5: Square = Square(33);
    pub const C5: Square = Square(34);
    pub const D5: Square = Square(35);
    pub const E5: Square = Square(36);
    pub const F5: Square = Square(37);
    pub const G5: Square = Square(38);
    pub const H5: Square = Square(39);
    pub const A6: Square = Square(40);
    pub const B6: Square = Square(41);
    pub const C6: Square = Square(42);
    pub const D6: Square = Square(43);
    pub const E6: Square = Square(44);
    pub const F6: Square = Square(45);
    pub const G6: Square = Square(46);
    pub const H6: Square = Square(47);
    pub const A7: Square = Square(48);
    pub const B7: Square = Square(49);
    pub const C7: Square = Square(50);
    pub const D7: Square = Square(51);
    pub const E7: Square = Square(52);
    pub const F7: Square = Square(53);
    pub const G7: Square = Square(54);
    pub const H7: Square = Square(55);
    pub const A8: Square = Square(56);
    pub const B8: Square = Square(57);
    pub const C8: Square = Square(58);
    pub const D8: Square = Square(59);
    pub const E8: Square = Square(60);
    pub const F8: Square = Square(61);
    pub const G8: Square = Square(62);
    pub const H8: Square = Square(63);

    pub const NONE: Square = Square(64);

    pub fn file(self) -> File {
        self.0 & 7
    }

    pub fn rank(self) -> Rank {
        self.0 >> 3
    }

    pub fn relative(self, c: Color) -> Self {
        Square(self.0 ^ (c.0 * 56))
    }

    pub fn relative_rank(self, c: Color) -> Rank {
        relative_rank(c, self.rank())
    }

    pub fn is_ok(self) -> bool {
        self >= Square::A1 && self <= Square::H8
    }

    pub fn make(f: File, r: Rank) -> Square {
        Square((r << 3) | f)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn all() -> impl Iterator<Item = Square> {
        (0..64).map(Square)
    }
}

pub fn relative_square(c: Color, s: Square) -> Square {
    s.relative(c)
}

// Vertical flip: a1 <-> a8.
impl std::ops::Not for Square {
    type Output = Self;
    fn not(self) -> Self {
        Square(self.0 ^ Square::A8.0)
    }
}

pub fn opposite_colors(s1: Square, s2: Square) -> bool {
    let s = s1.0 ^ s2.0;
    (((s >> 3) ^ s) & 1) != 0
}

// Iterates a piece list up to the first Square::NONE terminator.
pub struct SquareList<'a> {
    list: &'a [Square],
    idx: usize,
}

impl<'a> SquareList<'a> {
    pub fn construct(list: &'a [Square]) -> SquareList<'a> {
        SquareList { list, idx: 0 }
    }
}

impl Iterator for SquareList<'_> {
    type Item = Square;
    fn next(&mut self) -> Option<Self::Item> {
        match self.list.get(self.idx) {
            Some(&s) if s != Square::NONE => {
                self.idx += 1;
                Some(s)
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveType(pub u32);

pub const NORMAL: MoveType = MoveType(0);
pub const PROMOTION: MoveType = MoveType(1 << 14);
pub const ENPASSANT: MoveType = MoveType(2 << 14);
pub const CASTLING: MoveType = MoveType(3 << 14);

// A move needs 16 bits to be stored
//
// bit  0- 5: destination square (from 0 to 63)
// bit  6-11: origin square (from 0 to 63)
// bit 12-13: promotion piece type - 2 (from KNIGHT-2 to QUEEN-2)
// bit 14-15: special move flag: promotion (1), en passant (2), castling (3)
//
// Castling is encoded as "king captures friendly rook". The moving and the
// captured piece types are read from the board when needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Move(pub u32);

impl Move {
    pub const NONE: Move = Move(0);
    pub const NULL: Move = Move(65);

    pub fn from(self) -> Square {
        Square((self.0 >> 6) & 0x3f)
    }

    pub fn to(self) -> Square {
        Square(self.0 & 0x3f)
    }

    pub fn move_type(self) -> MoveType {
        MoveType(self.0 & (3 << 14))
    }

    pub fn promotion_type(self) -> PieceType {
        PieceType(((self.0 >> 12) & 3) + KNIGHT.0)
    }

    pub fn is_ok(self) -> bool {
        self.from() != self.to()
    }

    pub fn make(from: Square, to: Square) -> Move {
        Move((from.0 << 6) + to.0)
    }

    pub fn make_prom(from: Square, to: Square, pt: PieceType) -> Move {
        Move(PROMOTION.0 + ((pt.0 - KNIGHT.0) << 12) + (from.0 << 6) + to.0)
    }

    pub fn make_special(mt: MoveType, from: Square, to: Square) -> Move {
        Move(mt.0 + (from.0 << 6) + to.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Value(pub i32);

impl Value {
    pub const ZERO: Value = Value(0);
    pub const DRAW: Value = Value(0);
    pub const KNOWN_WIN: Value = Value(10000);
    pub const MATE: Value = Value(32000);
    pub const INFINITE: Value = Value(32001);
    pub const NONE: Value = Value(32002);

    pub const MATE_IN_MAX_PLY: Value = Value(Value::MATE.0 - MAX_MATE_PLY - MAX_PLY);
    pub const MATED_IN_MAX_PLY: Value = Value(-Value::MATE.0 + MAX_MATE_PLY + MAX_PLY);

    pub fn abs(self) -> Value {
        Value(self.0.abs())
    }
}

#[allow(non_upper_case_globals)]
pub const PawnValueMg: Value = Value(171);
#[allow(non_upper_case_globals)]
pub const KnightValueMg: Value = Value(764);
#[allow(non_upper_case_globals)]
pub const BishopValueMg: Value = Value(826);
#[allow(non_upper_case_globals)]
pub const RookValueMg: Value = Value(1282);
#[allow(non_upper_case_globals)]
pub const QueenValueMg: Value = Value(2526);

#[allow(non_upper_case_globals)]
pub const PawnValueEg: Value = Value(240);
#[allow(non_upper_case_globals)]
pub const KnightValueEg: Value = Value(848);
#[allow(non_upper_case_globals)]
pub const BishopValueEg: Value = Value(891);
#[allow(non_upper_case_globals)]
pub const RookValueEg: Value = Value(1373);
#[allow(non_upper_case_globals)]
pub const QueenValueEg: Value = Value(2646);

pub const MIDGAME_LIMIT: Value = Value(15258);
pub const ENDGAME_LIMIT: Value = Value(3915);

const PIECE_VALUE: [[Value; 16]; 2] = [
    [
        Value::ZERO,
        PawnValueMg,
        KnightValueMg,
        BishopValueMg,
        RookValueMg,
        QueenValueMg,
        Value::ZERO,
        Value::ZERO,
        Value::ZERO,
        PawnValueMg,
        KnightValueMg,
        BishopValueMg,
        RookValueMg,
        QueenValueMg,
        Value::ZERO,
        Value::ZERO,
    ],
    [
        Value::ZERO,
        PawnValueEg,
        KnightValueEg,
        BishopValueEg,
        RookValueEg,
        QueenValueEg,
        Value::ZERO,
        Value::ZERO,
        Value::ZERO,
        PawnValueEg,
        KnightValueEg,
        BishopValueEg,
        RookValueEg,
        QueenValueEg,
        Value::ZERO,
        Value::ZERO,
    ],
];

pub fn piece_value(phase: usize, pc: Piece) -> Value {
    PIECE_VALUE[phase][pc.index()]
}

impl std::ops::Neg for Value {
    type Output = Self;
    fn neg(self) -> Self {
        Value(-self.0)
    }
}

impl std::ops::Add<Value> for Value {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Value(self.0 + rhs.0)
    }
}

impl std::ops::Add<i32> for Value {
    type Output = Self;
    fn add(self, rhs: i32) -> Self {
        self + Value(rhs)
    }
}

impl std::ops::Sub<i32> for Value {
    type Output = Self;
    fn sub(self, rhs: i32) -> Self {
        self - Value(rhs)
    }
}

impl std::ops::Sub<Value> for Value {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Value(self.0 - rhs.0)
    }
}

impl std::ops::AddAssign<Value> for Value {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl std::ops::AddAssign<i32> for Value {
    fn add_assign(&mut self, rhs: i32) {
        *self = *self + rhs;
    }
}

impl std::ops::SubAssign<Value> for Value {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl std::ops::SubAssign<i32> for Value {
    fn sub_assign(&mut self, rhs: i32) {
        *self = *self - rhs;
    }
}

impl std::ops::Mul<i32> for Value {
    type Output = Self;
    fn mul(self, rhs: i32) -> Self {
        Value(self.0 * rhs)
    }
}

impl std::ops::Mul<Value> for i32 {
    type Output = Value;
    fn mul(self, rhs: Value) -> Value {
        Value(self * rhs.0)
    }
}

impl std::ops::Div<i32> for Value {
    type Output = Self;
    fn div(self, rhs: i32) -> Self {
        Value(self.0 / rhs)
    }
}

pub fn mate_in(ply: i32) -> Value {
    Value::MATE - ply
}

pub fn mated_in(ply: i32) -> Value {
    -Value::MATE + ply
}

// Midgame and endgame values packed in one integer: the endgame half in the
// upper 16 bits, the (signed) midgame half in the lower 16 bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Score(pub i32);

impl Score {
    pub const ZERO: Score = Score(0);

    pub fn eg(self) -> Value {
        Value(i32::from(((self.0 + 0x8000) >> 16) as i16))
    }

    pub fn mg(self) -> Value {
        Value(i32::from(self.0 as i16))
    }

    pub const fn make(mg: i32, eg: i32) -> Self {
        Score((eg << 16) + mg)
    }
}

impl std::ops::Add<Score> for Score {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Score(self.0 + rhs.0)
    }
}

impl std::ops::AddAssign<Score> for Score {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl std::ops::Sub<Score> for Score {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Score(self.0 - rhs.0)
    }
}

impl std::ops::SubAssign<Score> for Score {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl std::ops::Neg for Score {
    type Output = Self;
    fn neg(self) -> Self {
        Score(-self.0)
    }
}

impl std::ops::Mul<i32> for Score {
    type Output = Self;
    fn mul(self, rhs: i32) -> Self {
        Score::make(rhs * self.mg().0, rhs * self.eg().0)
    }
}

pub struct True {}
pub struct False {}

pub trait Bool {
    const BOOL: bool;
}

impl Bool for True {
    const BOOL: bool = true;
}

impl Bool for False {
    const BOOL: bool = false;
}

#[cfg(test)]
mod tests {
    use super::*;

    mod color_tests {
        use super::*;

        #[test]
        fn test_not() {
            assert_eq!(!WHITE, BLACK);
            assert_eq!(!BLACK, WHITE);
        }

        #[test]
        fn test_bitxor() {
            assert_eq!(WHITE ^ true, BLACK);
            assert_eq!(BLACK ^ false, BLACK);
        }

        #[test]
        fn test_castling_sides() {
            assert_eq!(<White as ColorTrait>::KingSide::CR, WHITE_OO);
            assert_eq!(<White as ColorTrait>::QueenSide::CR, WHITE_OOO);
            assert_eq!(<Black as ColorTrait>::KingSide::CR, BLACK_OO);
            assert_eq!(<Black as ColorTrait>::QueenSide::CR, BLACK_OOO);
        }
    }

    mod castling_right_tests {
        use super::*;

        #[test]
        fn test_make() {
            assert_eq!(CastlingRight::make(WHITE, CastlingSide::King), WHITE_OO);
            assert_eq!(CastlingRight::make(WHITE, CastlingSide::Queen), WHITE_OOO);
            assert_eq!(CastlingRight::make(BLACK, CastlingSide::King), BLACK_OO);
            assert_eq!(CastlingRight::make(BLACK, CastlingSide::Queen), BLACK_OOO);
        }

        #[test]
        fn test_bit_ops() {
            let mut combined = WHITE_OO | BLACK_OO;
            assert_eq!(combined, CastlingRight(5));

            combined &= WHITE_OO;
            assert_eq!(combined, WHITE_OO);

            combined |= BLACK_OOO;
            assert_eq!(combined, CastlingRight(9));
        }

        #[test]
        fn test_not_stays_in_range() {
            assert_eq!(!NO_CASTLING, ANY_CASTLING);
            assert_eq!(!WHITE_OO, CastlingRight(14));
        }
    }

    mod piece_tests {
        use super::*;

        #[test]
        fn test_piece_type_and_color() {
            assert_eq!(W_KNIGHT.piece_type(), KNIGHT);
            assert_eq!(B_QUEEN.piece_type(), QUEEN);
            assert_eq!(W_PAWN.color(), WHITE);
            assert_eq!(B_PAWN.color(), BLACK);
        }

        #[test]
        fn test_make() {
            for &pc in &PIECES {
                assert_eq!(Piece::make(pc.color(), pc.piece_type()), pc);
            }
        }

        #[test]
        fn test_not() {
            assert_eq!(!W_PAWN, B_PAWN);
            assert_eq!(!B_KING, W_KING);
        }

        #[test]
        fn test_piece_value_is_color_blind() {
            for &pc in &PIECES {
                assert_eq!(piece_value(MG, pc), piece_value(MG, !pc));
                assert_eq!(piece_value(EG, pc), piece_value(EG, !pc));
            }
        }
    }

    mod square_tests {
        use super::*;

        #[test]
        fn test_file_rank() {
            assert_eq!(Square::H1.file(), FILE_H);
            assert_eq!(Square::A8.rank(), RANK_8);
            assert_eq!(Square::make(FILE_E, RANK_4), Square::E4);
        }

        #[test]
        fn test_relative() {
            assert_eq!(Square::A1.relative(BLACK), Square::A8);
            assert_eq!(Square::H1.relative_rank(BLACK), RANK_8);
            assert_eq!(relative_square(WHITE, Square::C3), Square::C3);
        }

        #[test]
        fn test_is_ok() {
            assert!(Square::A1.is_ok());
            assert!(Square::H8.is_ok());
            assert!(!Square::NONE.is_ok());
        }

        #[test]
        fn test_not_flips_rank() {
            assert_eq!(!Square::A1, Square::A8);
            assert_eq!(!Square::E2, Square::E7);
        }

        #[test]
        fn test_opposite_colors() {
            assert!(opposite_colors(Square::A1, Square::B1));
            assert!(!opposite_colors(Square::A1, Square::H8));
        }

        #[test]
        fn test_square_list_stops_at_terminator() {
            let list = [Square::E4, Square::D5, Square::NONE, Square::A1];
            let v: Vec<Square> = SquareList::construct(&list).collect();
            assert_eq!(v, vec![Square::E4, Square::D5]);
        }
    }

    mod move_tests {
        use super::*;

        #[test]
        fn test_normal() {
            let m = Move::make(Square::E2, Square::E4);
            assert_eq!(m.from(), Square::E2);
            assert_eq!(m.to(), Square::E4);
            assert_eq!(m.move_type(), NORMAL);
            assert!(m.is_ok());
        }

        #[test]
        fn test_promotion() {
            for &pt in &[KNIGHT, BISHOP, ROOK, QUEEN] {
                let m = Move::make_prom(Square::B7, Square::A8, pt);
                assert_eq!(m.move_type(), PROMOTION);
                assert_eq!(m.promotion_type(), pt);
                assert_eq!(m.to(), Square::A8);
            }
        }

        #[test]
        fn test_special() {
            let m = Move::make_special(CASTLING, Square::E1, Square::H1);
            assert_eq!(m.move_type(), CASTLING);
            let m = Move::make_special(ENPASSANT, Square::C5, Square::B6);
            assert_eq!(m.move_type(), ENPASSANT);
        }

        #[test]
        fn test_sentinels_are_not_ok() {
            assert!(!Move::NONE.is_ok());
            assert!(!Move::NULL.is_ok());
        }
    }

    mod value_tests {
        use super::*;

        #[test]
        fn test_mate_bounds() {
            assert_eq!(mate_in(3), Value(31997));
            assert_eq!(mated_in(2), Value(-31998));
            assert!(mate_in(MAX_PLY) >= Value::MATE_IN_MAX_PLY);
            assert!(Value::INFINITE > Value::MATE);
        }

        #[test]
        fn test_score_packing() {
            let s = Score::make(-35, 120);
            assert_eq!(s.mg(), Value(-35));
            assert_eq!(s.eg(), Value(120));
            let t = s + Score::make(10, -20);
            assert_eq!(t.mg(), Value(-25));
            assert_eq!(t.eg(), Value(100));
            assert_eq!((-s).mg(), Value(35));
            assert_eq!((s * 2).eg(), Value(240));
        }
    }
}
