// SPDX-License-Identifier: GPL-3.0-or-later

use crate::bitboard::{
    aligned, attacks_bb, between_bb, lsb, more_than_one, passed_pawn_mask, pawn_attacks, popcount,
    pseudo_attacks, rank_bb, Bitboard, RANK1_BB, RANK8_BB,
};
use crate::error::FenError;
use crate::movegen::{Legal, MoveList};
use crate::psqt;
use crate::types::{
    direction::pawn_push, direction::Direction, key::Key, opposite_colors, piece_value,
    relative_rank, relative_square, BishopValueMg, CastlingRight, CastlingSide, Color,
    KnightValueMg, Move, PawnValueMg, Piece, PieceType, QueenValueMg, RookValueMg, Score, Square,
    SquareList, Value, ALL_PIECES, ANY_CASTLING, BISHOP, BLACK, BLACK_OO, BLACK_OOO, B_BISHOP,
    B_KING, CASTLING, ENPASSANT, KING, KNIGHT, MG, NORMAL, NO_CASTLING, NO_PIECE,
    NO_PIECE_TYPE, PAWN, PIECES, PROMOTION, QUEEN, RANK_1, RANK_2, RANK_6, RANK_7, RANK_8, ROOK,
    WHITE, WHITE_OO, WHITE_OOO, W_BISHOP, W_KING,
};
use crate::uci;

pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

pub mod zobrist {
    use crate::misc::Prng;
    use crate::types::{key::Key, CastlingRight, File, Piece, Square};
    use lazy_static::lazy_static;

    struct Keys {
        psq: [[Key; 64]; 16],
        enpassant: [Key; 8],
        castling: [Key; 16],
        side: Key,
        no_pawns: Key,
        exclusion: Key,
    }

    impl Keys {
        fn new() -> Keys {
            let mut rng = Prng::new(1_070_372);
            let mut k = Keys {
                psq: [[Key(0); 64]; 16],
                enpassant: [Key(0); 8],
                castling: [Key(0); 16],
                side: Key(0),
                no_pawns: Key(0),
                exclusion: Key(0),
            };

            for pc in (1..15).filter(|&i| i != 7 && i != 8) {
                for s in 0..64 {
                    k.psq[pc][s] = Key(rng.rand64());
                }
            }

            for f in 0..8 {
                k.enpassant[f] = Key(rng.rand64());
            }

            // One key per single right, combinations are the XOR of their
            // parts so that dropping a right is a single XOR.
            for bit in 0..4 {
                k.castling[1 << bit] = Key(rng.rand64());
            }
            for cr in 1..16usize {
                if cr.count_ones() > 1 {
                    k.castling[cr] = (0..4)
                        .filter(|b| cr & (1 << b) != 0)
                        .fold(Key(0), |acc, b| acc ^ k.castling[1 << b]);
                }
            }

            k.side = Key(rng.rand64());
            k.no_pawns = Key(rng.rand64());
            k.exclusion = Key(rng.rand64());
            k
        }
    }

    lazy_static! {
        static ref KEYS: Keys = Keys::new();
    }

    pub fn psq(pc: Piece, s: Square) -> Key {
        KEYS.psq[pc.index()][s.index()]
    }

    // Material keys reuse the psq table, indexed by piece count.
    pub fn material(pc: Piece, num: i32) -> Key {
        KEYS.psq[pc.index()][num as usize]
    }

    pub fn enpassant(f: File) -> Key {
        KEYS.enpassant[f as usize]
    }

    pub fn castling(cr: CastlingRight) -> Key {
        KEYS.castling[cr.index()]
    }

    pub fn side() -> Key {
        KEYS.side
    }

    pub fn no_pawns() -> Key {
        KEYS.no_pawns
    }

    // XORed into the position key while searching with an excluded move.
    pub fn exclusion() -> Key {
        KEYS.exclusion
    }

    pub fn init() {
        lazy_static::initialize(&KEYS);
    }
}

#[derive(Clone)]
pub struct StateInfo {
    // Copied when making a move
    pub pawn_key: Key,
    pub material_key: Key,
    pub non_pawn_material: [Value; 2],
    pub castling_rights: CastlingRight,
    pub rule50: i32,
    pub plies_from_null: i32,
    pub psq: Score,
    pub ep_square: Square,

    // Not copied when making a move (will be recomputed anyhow)
    pub key: Key,
    pub checkers_bb: Bitboard,
    pub captured_piece: Piece,
    pub blockers_for_king: [Bitboard; 2],
    pub pinners_for_king: [Bitboard; 2],
    pub check_squares: [Bitboard; 8],
}

impl StateInfo {
    pub fn new() -> StateInfo {
        StateInfo {
            pawn_key: Key(0),
            material_key: Key(0),
            non_pawn_material: [Value::ZERO; 2],
            castling_rights: NO_CASTLING,
            rule50: 0,
            plies_from_null: 0,
            psq: Score::ZERO,
            ep_square: Square::NONE,
            key: Key(0),
            checkers_bb: Bitboard(0),
            captured_piece: NO_PIECE,
            blockers_for_king: [Bitboard(0); 2],
            pinners_for_king: [Bitboard(0); 2],
            check_squares: [Bitboard(0); 8],
        }
    }
}

impl Default for StateInfo {
    fn default() -> Self {
        StateInfo::new()
    }
}

// The board. Piece lists are dense arrays terminated by Square::NONE with a
// reverse index from square to slot. Removal swaps the last entry into the
// freed slot, so after a do/undo pair the lists hold the same squares, not
// necessarily in the same order.
#[derive(Clone)]
pub struct Position {
    board: [Piece; 64],
    by_color_bb: [Bitboard; 2],
    by_type_bb: [Bitboard; 8],
    piece_count: [i32; 16],
    piece_list: [[Square; 16]; 16],
    index: [i32; 64],
    castling_rights_mask: [CastlingRight; 64],
    castling_rook_square: [Square; 16],
    castling_path: [Bitboard; 16],
    game_ply: i32,
    side_to_move: Color,
    states: Vec<StateInfo>,
}

impl Default for Position {
    fn default() -> Self {
        Position::new()
    }
}

impl Position {
    pub const PIECE_TO_CHAR: &'static str = " PNBRQK  pnbrqk";

    fn empty_board() -> Position {
        Position {
            board: [NO_PIECE; 64],
            by_color_bb: [Bitboard(0); 2],
            by_type_bb: [Bitboard(0); 8],
            piece_count: [0; 16],
            piece_list: [[Square::NONE; 16]; 16],
            index: [0; 64],
            castling_rights_mask: [NO_CASTLING; 64],
            castling_rook_square: [Square::NONE; 16],
            castling_path: [Bitboard(0); 16],
            game_ply: 0,
            side_to_move: WHITE,
            states: vec![StateInfo::new()],
        }
    }

    // The standard starting position.
    pub fn new() -> Position {
        let mut pos = Position::empty_board();
        pos.set_startpos();
        pos
    }

    pub fn from_fen(fen: &str) -> Result<Position, FenError> {
        let mut pos = Position::empty_board();
        pos.parse_fen(fen)?;
        Ok(pos)
    }

    #[inline(always)]
    fn st(&self) -> &StateInfo {
        debug_assert!(!self.states.is_empty());
        &self.states[self.states.len() - 1]
    }

    #[inline(always)]
    fn st_mut(&mut self) -> &mut StateInfo {
        let last = self.states.len() - 1;
        &mut self.states[last]
    }

    #[inline(always)]
    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    #[inline(always)]
    pub fn empty(&self, s: Square) -> bool {
        self.board[s.index()] == NO_PIECE
    }

    #[inline(always)]
    pub fn piece_on(&self, s: Square) -> Piece {
        self.board[s.index()]
    }

    #[inline(always)]
    pub fn moved_piece(&self, m: Move) -> Piece {
        self.board[m.from().index()]
    }

    #[inline(always)]
    pub fn pieces(&self) -> Bitboard {
        self.by_type_bb[ALL_PIECES.index()]
    }

    #[inline(always)]
    pub fn pieces_p(&self, pt: PieceType) -> Bitboard {
        self.by_type_bb[pt.index()]
    }

    #[inline(always)]
    pub fn pieces_pp(&self, pt1: PieceType, pt2: PieceType) -> Bitboard {
        self.pieces_p(pt1) | self.pieces_p(pt2)
    }

    #[inline(always)]
    pub fn pieces_c(&self, c: Color) -> Bitboard {
        self.by_color_bb[c.index()]
    }

    #[inline(always)]
    pub fn pieces_cp(&self, c: Color, pt: PieceType) -> Bitboard {
        self.pieces_c(c) & self.pieces_p(pt)
    }

    #[inline(always)]
    pub fn pieces_cpp(&self, c: Color, pt1: PieceType, pt2: PieceType) -> Bitboard {
        self.pieces_c(c) & self.pieces_pp(pt1, pt2)
    }

    #[inline(always)]
    pub fn count(&self, c: Color, pt: PieceType) -> i32 {
        self.piece_count[Piece::make(c, pt).index()]
    }

    #[inline(always)]
    pub fn squares(&self, c: Color, pt: PieceType) -> &[Square] {
        &self.piece_list[Piece::make(c, pt).index()]
    }

    #[inline(always)]
    pub fn square_list(&self, c: Color, pt: PieceType) -> SquareList<'_> {
        SquareList::construct(self.squares(c, pt))
    }

    #[inline(always)]
    pub fn square(&self, c: Color, pt: PieceType) -> Square {
        self.squares(c, pt)[0]
    }

    #[inline(always)]
    pub fn ep_square(&self) -> Square {
        self.st().ep_square
    }

    #[inline(always)]
    pub fn has_castling_right(&self, cr: CastlingRight) -> bool {
        self.st().castling_rights & cr != 0
    }

    #[inline(always)]
    pub fn castling_rights(&self, c: Color) -> CastlingRight {
        self.st().castling_rights & CastlingRight(3 << (2 * c.0))
    }

    #[inline(always)]
    pub fn can_castle(&self, c: Color) -> bool {
        self.castling_rights(c) != 0
    }

    #[inline(always)]
    pub fn castling_impeded(&self, cr: CastlingRight) -> bool {
        self.pieces() & self.castling_path[cr.index()] != 0
    }

    #[inline(always)]
    pub fn castling_rook_square(&self, cr: CastlingRight) -> Square {
        self.castling_rook_square[cr.index()]
    }

    #[inline(always)]
    pub fn attacks_from_pawn(&self, s: Square, c: Color) -> Bitboard {
        pawn_attacks(c, s)
    }

    pub fn attacks_from(&self, pt: PieceType, s: Square) -> Bitboard {
        debug_assert!(pt != PAWN);
        match pt {
            BISHOP | ROOK | QUEEN => attacks_bb(pt, s, self.pieces()),
            _ => pseudo_attacks(pt, s),
        }
    }

    #[inline(always)]
    pub fn attackers_to_occ(&self, s: Square, occ: Bitboard) -> Bitboard {
        (self.attacks_from_pawn(s, BLACK) & self.pieces_cp(WHITE, PAWN))
            | (self.attacks_from_pawn(s, WHITE) & self.pieces_cp(BLACK, PAWN))
            | (pseudo_attacks(KNIGHT, s) & self.pieces_p(KNIGHT))
            | (attacks_bb(ROOK, s, occ) & self.pieces_pp(ROOK, QUEEN))
            | (attacks_bb(BISHOP, s, occ) & self.pieces_pp(BISHOP, QUEEN))
            | (pseudo_attacks(KING, s) & self.pieces_p(KING))
    }

    #[inline(always)]
    pub fn attackers_to(&self, s: Square) -> Bitboard {
        self.attackers_to_occ(s, self.pieces())
    }

    #[inline(always)]
    pub fn checkers(&self) -> Bitboard {
        self.st().checkers_bb
    }

    #[inline(always)]
    pub fn in_check(&self) -> bool {
        self.checkers() != 0
    }

    #[inline(always)]
    pub fn blockers_for_king(&self, c: Color) -> Bitboard {
        self.st().blockers_for_king[c.index()]
    }

    #[inline(always)]
    pub fn pinners_for_king(&self, c: Color) -> Bitboard {
        self.st().pinners_for_king[c.index()]
    }

    #[inline(always)]
    pub fn check_squares(&self, pt: PieceType) -> Bitboard {
        self.st().check_squares[pt.index()]
    }

    #[inline(always)]
    pub fn pawn_passed(&self, c: Color, s: Square) -> bool {
        self.pieces_cp(!c, PAWN) & passed_pawn_mask(c, s) == 0
    }

    // A pawn push to a square from which the pawn is passed.
    pub fn passed_pawn_push(&self, m: Move) -> bool {
        self.moved_piece(m).piece_type() == PAWN && self.pawn_passed(self.side_to_move, m.to())
    }

    #[inline(always)]
    pub fn pawn_on_7th(&self, c: Color) -> bool {
        self.pieces_cp(c, PAWN) & rank_bb(relative_rank(c, RANK_7)) != 0
    }

    #[inline(always)]
    pub fn key(&self) -> Key {
        self.st().key
    }

    #[inline(always)]
    pub fn exclusion_key(&self) -> Key {
        self.st().key ^ zobrist::exclusion()
    }

    #[inline(always)]
    pub fn pawn_key(&self) -> Key {
        self.st().pawn_key
    }

    #[inline(always)]
    pub fn material_key(&self) -> Key {
        self.st().material_key
    }

    #[inline(always)]
    pub fn psq_score(&self) -> Score {
        self.st().psq
    }

    #[inline(always)]
    pub fn non_pawn_material_c(&self, c: Color) -> Value {
        self.st().non_pawn_material[c.index()]
    }

    #[inline(always)]
    pub fn non_pawn_material(&self) -> Value {
        self.non_pawn_material_c(WHITE) + self.non_pawn_material_c(BLACK)
    }

    #[inline(always)]
    pub fn game_ply(&self) -> i32 {
        self.game_ply
    }

    #[inline(always)]
    pub fn rule50_count(&self) -> i32 {
        self.st().rule50
    }

    pub fn opposite_bishops(&self) -> bool {
        self.piece_count[W_BISHOP.index()] == 1
            && self.piece_count[B_BISHOP.index()] == 1
            && opposite_colors(self.square(WHITE, BISHOP), self.square(BLACK, BISHOP))
    }

    pub fn capture_or_promotion(&self, m: Move) -> bool {
        debug_assert!(m.is_ok());
        match m.move_type() {
            NORMAL => !self.empty(m.to()),
            CASTLING => false,
            _ => true,
        }
    }

    pub fn capture(&self, m: Move) -> bool {
        debug_assert!(m.is_ok());
        match m.move_type() {
            CASTLING => false,
            ENPASSANT => true,
            _ => !self.empty(m.to()),
        }
    }

    // Type of the piece a move would capture, NO_PIECE_TYPE for quiet moves.
    pub fn captured_type(&self, m: Move) -> PieceType {
        match m.move_type() {
            CASTLING => NO_PIECE_TYPE,
            ENPASSANT => PAWN,
            _ => self.piece_on(m.to()).piece_type(),
        }
    }

    #[inline(always)]
    pub fn captured_piece(&self) -> Piece {
        self.st().captured_piece
    }

    // set() initializes the position from a FEN string. A malformed string
    // leaves the standard starting position in place and returns the error.
    pub fn set(&mut self, fen_str: &str) -> Result<(), FenError> {
        if let Err(e) = self.parse_fen(fen_str) {
            self.set_startpos();
            return Err(e);
        }
        Ok(())
    }

    pub fn set_startpos(&mut self) {
        let r = self.parse_fen(START_FEN);
        debug_assert!(r.is_ok());
    }

    fn clear(&mut self) {
        *self = Position::empty_board();
    }

    fn parse_fen(&mut self, fen_str: &str) -> Result<(), FenError> {
        self.clear();

        let mut iter = fen_str.split_whitespace();

        // 1. Piece placement
        let placement = iter
            .next()
            .ok_or(FenError::MissingField("piece placement"))?;
        let ranks: Vec<&str> = placement.split('/').collect();
        if ranks.len() != 8 {
            return Err(FenError::BadRankCount(ranks.len()));
        }
        for (i, rank_str) in ranks.iter().enumerate() {
            let r = 7 - i as u32;
            let mut f = 0u32;
            for c in rank_str.chars() {
                if let Some(d) = c.to_digit(10) {
                    if d == 0 || d > 8 {
                        return Err(FenError::BadRank(r + 1));
                    }
                    f += d;
                } else {
                    let pc = match Position::PIECE_TO_CHAR.find(c) {
                        Some(idx) if c != ' ' => Piece(idx as u32),
                        _ => return Err(FenError::BadPiece(c)),
                    };
                    if f >= 8 {
                        return Err(FenError::BadRank(r + 1));
                    }
                    if self.piece_count[pc.index()] >= 15 {
                        return Err(FenError::TooManyPieces(c));
                    }
                    self.put_piece(pc, Square::make(f, r));
                    f += 1;
                }
                if f > 8 {
                    return Err(FenError::BadRank(r + 1));
                }
            }
            if f != 8 {
                return Err(FenError::BadRank(r + 1));
            }
        }

        if self.count(WHITE, KING) != 1 || self.count(BLACK, KING) != 1 {
            return Err(FenError::KingCount);
        }
        if self.pieces_p(PAWN) & (RANK1_BB | RANK8_BB) != 0 {
            return Err(FenError::PawnOnBackRank);
        }

        // 2. Active color
        self.side_to_move = match iter.next() {
            Some("w") => WHITE,
            Some("b") => BLACK,
            Some(t) => return Err(FenError::BadSideToMove(t.to_string())),
            None => return Err(FenError::MissingField("active color")),
        };

        // 3. Castling availability. The rook is searched from the corner
        // towards the king.
        let castling = iter.next().unwrap_or("-");
        if castling != "-" {
            for c in castling.chars() {
                let color = if c.is_ascii_lowercase() { BLACK } else { WHITE };
                let rook = Piece::make(color, ROOK);
                let ksq = self.square(color, KING);
                if ksq.rank() != relative_rank(color, RANK_1) {
                    return Err(FenError::BadCastling(c));
                }
                let (start, step) = match c.to_ascii_uppercase() {
                    'K' => (Square::H1.relative(color), Direction::WEST),
                    'Q' => (Square::A1.relative(color), Direction::EAST),
                    _ => return Err(FenError::BadCastling(c)),
                };
                let mut rsq = start;
                while rsq != ksq && self.piece_on(rsq) != rook {
                    rsq += step;
                }
                if rsq == ksq {
                    return Err(FenError::BadCastling(c));
                }
                self.set_castling_right(color, rsq);
            }
        }

        // 4. En passant square. Only kept if a capture is actually possible.
        let enpassant = iter.next().unwrap_or("-");
        if enpassant != "-" {
            let ep_sq = uci::parse_square(enpassant)
                .ok_or_else(|| FenError::BadEnPassant(enpassant.to_string()))?;
            if ep_sq.rank() != relative_rank(self.side_to_move, RANK_6) {
                return Err(FenError::BadEnPassant(enpassant.to_string()));
            }
            let us = self.side_to_move;
            if self.attacks_from_pawn(ep_sq, !us) & self.pieces_cp(us, PAWN) != 0
                && self.pieces_cp(!us, PAWN) & (ep_sq + pawn_push(!us)) != 0
                && self.empty(ep_sq)
            {
                self.st_mut().ep_square = ep_sq;
            }
        }

        // 5-6. Halfmove clock and fullmove number
        let rule50 = match iter.next() {
            Some(t) => t
                .parse::<i32>()
                .map_err(|_| FenError::BadCounter(t.to_string()))?,
            None => 0,
        };
        let fullmove = match iter.next() {
            Some(t) => t
                .parse::<i32>()
                .map_err(|_| FenError::BadCounter(t.to_string()))?,
            None => 1,
        };
        self.st_mut().rule50 = rule50.max(0);
        self.game_ply = std::cmp::max(2 * (fullmove - 1), 0);
        if self.side_to_move == BLACK {
            self.game_ply += 1;
        }

        self.set_state();

        if self.attackers_to(self.square(!self.side_to_move, KING))
            & self.pieces_c(self.side_to_move)
            != 0
        {
            return Err(FenError::OpponentInCheck);
        }

        debug_assert!(self.is_ok());
        Ok(())
    }

    // set_castling_right() is a helper function used to set castling rights
    // given the corresponding color and the rook starting square.
    fn set_castling_right(&mut self, c: Color, rfrom: Square) {
        let kfrom = self.square(c, KING);
        let cs = if kfrom < rfrom {
            CastlingSide::King
        } else {
            CastlingSide::Queen
        };
        let cr = CastlingRight::make(c, cs);

        self.st_mut().castling_rights |= cr;
        self.castling_rights_mask[kfrom.index()] |= cr;
        self.castling_rights_mask[rfrom.index()] |= cr;
        self.castling_rook_square[cr.index()] = rfrom;

        let (kto, rto) = match cs {
            CastlingSide::King => (Square::G1, Square::F1),
            CastlingSide::Queen => (Square::C1, Square::D1),
        };
        let kto = relative_square(c, kto);
        let rto = relative_square(c, rto);

        for (a, b) in [(rfrom, rto), (kfrom, kto)] {
            let mut s = std::cmp::min(a, b);
            while s <= std::cmp::max(a, b) {
                if s != kfrom && s != rfrom {
                    self.castling_path[cr.index()] |= s;
                }
                s += Direction::EAST;
            }
        }
    }

    // set_check_info() sets king attacks to detect if a move gives check
    fn set_check_info(&mut self) {
        let (wb, wp) = self.slider_blockers(self.pieces_c(BLACK), self.square(WHITE, KING));
        let (bb, bp) = self.slider_blockers(self.pieces_c(WHITE), self.square(BLACK, KING));

        let ksq = self.square(!self.side_to_move, KING);
        let pawn = self.attacks_from_pawn(ksq, !self.side_to_move);
        let knight = pseudo_attacks(KNIGHT, ksq);
        let bishop = self.attacks_from(BISHOP, ksq);
        let rook = self.attacks_from(ROOK, ksq);

        let st = self.st_mut();
        st.blockers_for_king = [wb, bb];
        st.pinners_for_king = [wp, bp];
        st.check_squares[PAWN.index()] = pawn;
        st.check_squares[KNIGHT.index()] = knight;
        st.check_squares[BISHOP.index()] = bishop;
        st.check_squares[ROOK.index()] = rook;
        st.check_squares[QUEEN.index()] = bishop | rook;
        st.check_squares[KING.index()] = Bitboard(0);
    }

    // set_state() computes the hash keys of the position, and other data
    // that once computed is updated incrementally as moves are made.
    fn set_state(&mut self) {
        let checkers = self.attackers_to(self.square(self.side_to_move, KING))
            & self.pieces_c(!self.side_to_move);
        let (key, pawn_key, material_key) = self.compute_keys();

        let mut psq = Score::ZERO;
        for s in self.pieces() {
            psq += psqt::psq(self.piece_on(s), s);
        }

        let mut npm = [Value::ZERO; 2];
        for &c in &[WHITE, BLACK] {
            for pt in [KNIGHT, BISHOP, ROOK, QUEEN] {
                npm[c.index()] += self.count(c, pt) * piece_value(MG, Piece::make(c, pt));
            }
        }

        let st = self.st_mut();
        st.checkers_bb = checkers;
        st.key = key;
        st.pawn_key = pawn_key;
        st.material_key = material_key;
        st.psq = psq;
        st.non_pawn_material = npm;

        self.set_check_info();
    }

    // compute_keys() recomputes the position, pawn and material keys from
    // scratch. The incrementally updated keys must always match.
    pub fn compute_keys(&self) -> (Key, Key, Key) {
        let mut key = Key(0);
        let mut pawn_key = zobrist::no_pawns();
        let mut material_key = Key(0);

        for s in self.pieces() {
            let pc = self.piece_on(s);
            key ^= zobrist::psq(pc, s);
            if pc.piece_type() == PAWN {
                pawn_key ^= zobrist::psq(pc, s);
            }
        }

        if self.ep_square() != Square::NONE {
            key ^= zobrist::enpassant(self.ep_square().file());
        }

        if self.side_to_move == BLACK {
            key ^= zobrist::side();
        }

        key ^= zobrist::castling(self.st().castling_rights);

        for &pc in &PIECES {
            for cnt in 0..self.piece_count[pc.index()] {
                material_key ^= zobrist::material(pc, cnt);
            }
        }

        (key, pawn_key, material_key)
    }

    // fen() returns a FEN representation of the position.
    pub fn fen(&self) -> String {
        let mut ss = String::new();

        for r in (0..8).rev() {
            let mut f = 0;
            while f < 8 {
                let mut empty_cnt = 0u8;
                while f < 8 && self.empty(Square::make(f, r)) {
                    empty_cnt += 1;
                    f += 1;
                }
                if empty_cnt > 0 {
                    ss.push((b'0' + empty_cnt) as char);
                }
                if f < 8 {
                    ss.push(piece_char(self.piece_on(Square::make(f, r))));
                    f += 1;
                }
            }
            if r > 0 {
                ss.push('/');
            }
        }

        ss.push_str(if self.side_to_move == WHITE { " w " } else { " b " });

        for (cr, c) in [
            (WHITE_OO, 'K'),
            (WHITE_OOO, 'Q'),
            (BLACK_OO, 'k'),
            (BLACK_OOO, 'q'),
        ] {
            if self.has_castling_right(cr) {
                ss.push(c);
            }
        }

        if !self.has_castling_right(ANY_CASTLING) {
            ss.push('-');
        }

        match self.ep_square() {
            Square::NONE => ss.push_str(" - "),
            square => {
                ss.push(' ');
                ss.push_str(&uci::square(square));
                ss.push(' ');
            }
        }

        ss.push_str(&self.rule50_count().to_string());
        ss.push(' ');
        ss.push_str(&(1 + self.game_ply() / 2).to_string());

        ss
    }

    // flip() mirrors the position vertically and swaps the colors. The
    // evaluation of the flipped position is the negation of this one.
    pub fn flip(&mut self) {
        let fen = self.fen();
        let fields: Vec<&str> = fen.split_whitespace().collect();

        let placement = fields[0]
            .split('/')
            .rev()
            .map(|r| r.chars().map(swap_case).collect::<String>())
            .collect::<Vec<_>>()
            .join("/");
        let side = if fields[1] == "w" { "b" } else { "w" };
        let castling: String = fields[2].chars().map(swap_case).collect();
        let ep = match uci::parse_square(fields[3]) {
            Some(s) => uci::square(!s),
            None => "-".to_string(),
        };

        let flipped = format!(
            "{} {} {} {} {} {}",
            placement, side, castling, ep, fields[4], fields[5]
        );
        let r = self.set(&flipped);
        debug_assert!(r.is_ok());
    }

    // slider_blockers() returns the pieces (both colors) that are blocking
    // attacks on the square 's' from 'sliders', together with the sliders
    // pinning a piece of the color on 's'.
    pub fn slider_blockers(&self, sliders: Bitboard, s: Square) -> (Bitboard, Bitboard) {
        let mut blockers = Bitboard(0);
        let mut pinners = Bitboard(0);

        // Snipers are sliders that attack 's' when a piece is removed
        let snipers = ((pseudo_attacks(ROOK, s) & self.pieces_pp(QUEEN, ROOK))
            | (pseudo_attacks(BISHOP, s) & self.pieces_pp(QUEEN, BISHOP)))
            & sliders;

        for sniper_sq in snipers {
            let b = between_bb(s, sniper_sq) & self.pieces();

            if b != 0 && !more_than_one(b) {
                blockers |= b;
                if b & self.pieces_c(self.piece_on(s).color()) != 0 {
                    pinners |= sniper_sq;
                }
            }
        }
        (blockers, pinners)
    }

    // legal() tests whether a pseudo-legal move is legal
    pub fn legal(&self, m: Move) -> bool {
        debug_assert!(m.is_ok());

        let us = self.side_to_move;
        let from = m.from();

        debug_assert!(self.moved_piece(m).color() == us);

        // En passant captures are a tricky special case. Because they are
        // uncommon, we do it simply by testing whether the king is attacked
        // after the move is made.
        if m.move_type() == ENPASSANT {
            let ksq = self.square(us, KING);
            let to = m.to();
            let capsq = to - pawn_push(us);
            let occupied = (self.pieces() ^ from ^ capsq) | to;

            debug_assert!(to == self.ep_square());
            debug_assert!(self.piece_on(capsq) == Piece::make(!us, PAWN));

            return attacks_bb(ROOK, ksq, occupied) & self.pieces_cpp(!us, QUEEN, ROOK) == 0
                && attacks_bb(BISHOP, ksq, occupied) & self.pieces_cpp(!us, QUEEN, BISHOP) == 0;
        }

        // If the moving piece is a king, check whether the destination
        // square is attacked by the opponent. Castling moves are checked
        // for legality during move generation.
        if self.piece_on(from).piece_type() == KING {
            return m.move_type() == CASTLING
                || self.attackers_to(m.to()) & self.pieces_c(!us) == 0;
        }

        // A non-king move is legal if and only if it is not pinned or it
        // is moving along the ray towards or away from the king.
        self.blockers_for_king(us) & from == 0 || aligned(from, m.to(), self.square(us, KING))
    }

    // pseudo_legal() takes a random move and tests whether the move is
    // pseudo legal. It is used to validate moves from the transposition
    // table, which can be stale after a key collision.
    pub fn pseudo_legal(&self, m: Move) -> bool {
        if !m.is_ok() {
            return false;
        }

        let us = self.side_to_move();
        let from = m.from();
        let to = m.to();
        let pc = self.moved_piece(m);

        // Use a slower but simpler function for uncommon cases
        if m.move_type() != NORMAL {
            return MoveList::new::<Legal>(self).contains(m);
        }

        // It is not a promotion, so promotion piece must be empty
        if m.promotion_type() != KNIGHT {
            return false;
        }

        // If the 'from' square is not occupied by a piece belonging to the
        // side to move, the move is obviously not legal.
        if pc == NO_PIECE || pc.color() != us {
            return false;
        }

        // The destination square cannot be occupied by a friendly piece
        if self.pieces_c(us) & to != 0 {
            return false;
        }

        // Handle the special case of a pawn move
        if pc.piece_type() == PAWN {
            // We have already handled promotion moves, so destination
            // cannot be on the 8th/1st rank.
            if to.rank() == relative_rank(us, RANK_8) {
                return false;
            }

            if self.attacks_from_pawn(from, us) & self.pieces_c(!us) & to == 0
                && !((from + pawn_push(us) == to) && self.empty(to))
                && !(from + 2 * pawn_push(us) == to
                    && from.rank() == relative_rank(us, RANK_2)
                    && self.empty(to)
                    && self.empty(to - pawn_push(us)))
            {
                return false;
            }
        } else if self.attacks_from(pc.piece_type(), from) & to == 0 {
            return false;
        }

        // Evasions generator already takes care of avoiding certain kinds of
        // illegal moves and legal() relies on this. We therefore have to take
        // care that the same kind of moves are filtered out here.
        if self.checkers() != 0 {
            if pc.piece_type() != KING {
                // Double check? In this case a king move is required
                if more_than_one(self.checkers()) {
                    return false;
                }

                // Our move must be a blocking evasion or a capture of the
                // checking piece
                if (between_bb(lsb(self.checkers()), self.square(us, KING)) | self.checkers()) & to
                    == 0
                {
                    return false;
                }
            }
            // In case of king moves under check we have to remove king so as
            // to catch invalid moves like b1a1 when opposite queen is on c1.
            else if self.attackers_to_occ(to, self.pieces() ^ from) & self.pieces_c(!us) != 0 {
                return false;
            }
        }

        true
    }

    // gives_check() tests whether a pseudo-legal move gives a check
    pub fn gives_check(&self, m: Move) -> bool {
        debug_assert!(m.is_ok());
        debug_assert!(self.moved_piece(m).color() == self.side_to_move());

        let from = m.from();
        let to = m.to();
        let them = !self.side_to_move;
        let ksq = self.square(them, KING);

        // Is there a direct check?
        if self.st().check_squares[self.piece_on(from).piece_type().index()] & to != 0 {
            return true;
        }

        // Is there a discovered check?
        if self.blockers_for_king(them) & from != 0 && !aligned(from, to, ksq) {
            return true;
        }

        match m.move_type() {
            NORMAL => false,

            PROMOTION => attacks_bb(m.promotion_type(), to, self.pieces() ^ from) & ksq != 0,

            // En passant capture with check? We have already handled the
            // case of direct checks and ordinary discovered check, so the
            // only case we need to handle is the unusual case of a
            // discovered check through the captured pawn.
            ENPASSANT => {
                let us = self.side_to_move;
                let capsq = Square::make(to.file(), from.rank());
                let b = (self.pieces() ^ from ^ capsq) | to;

                (attacks_bb(ROOK, ksq, b) & self.pieces_cpp(us, QUEEN, ROOK))
                    | (attacks_bb(BISHOP, ksq, b) & self.pieces_cpp(us, QUEEN, BISHOP))
                    != 0
            }

            _ => {
                // Castling is encoded as king captures rook
                let kfrom = from;
                let rfrom = to;
                let us = self.side_to_move;
                let (kto, rto) = if rfrom > kfrom {
                    (Square::G1, Square::F1)
                } else {
                    (Square::C1, Square::D1)
                };
                let kto = relative_square(us, kto);
                let rto = relative_square(us, rto);

                pseudo_attacks(ROOK, rto) & ksq != 0
                    && attacks_bb(ROOK, rto, (self.pieces() ^ kfrom ^ rfrom) | rto | kto) & ksq
                        != 0
            }
        }
    }

    // do_move() makes a move and pushes a new StateInfo holding everything
    // needed to take it back. The move is assumed to be legal.
    pub fn do_move(&mut self, m: Move, gives_check: bool) {
        debug_assert!(m.is_ok());

        let mut k = self.st().key ^ zobrist::side();

        // Copy the old state, the fields that are recomputed get overwritten
        let st_copy = self.st().clone();
        self.states.push(st_copy);

        // Increment ply counters. The rule50 field will be reset to zero
        // later on in case of a capture or a pawn move.
        self.game_ply += 1;
        self.st_mut().rule50 += 1;
        self.st_mut().plies_from_null += 1;

        let us = self.side_to_move();
        let them = !us;
        let from = m.from();
        let mut to = m.to();
        let pc = self.piece_on(from);
        let mut captured = if m.move_type() == ENPASSANT {
            Piece::make(them, PAWN)
        } else {
            self.piece_on(to)
        };

        debug_assert!(pc.color() == us);

        if m.move_type() == CASTLING {
            debug_assert!(pc == Piece::make(us, KING));
            debug_assert!(captured == Piece::make(us, ROOK));

            let (rfrom, rto) = self.do_castling::<true>(us, from, &mut to);

            self.st_mut().psq += psqt::psq(captured, rto) - psqt::psq(captured, rfrom);
            k ^= zobrist::psq(captured, rfrom) ^ zobrist::psq(captured, rto);
            captured = NO_PIECE;
        }

        // Capture removal first
        if captured != NO_PIECE {
            let mut capsq = to;

            // If the captured piece is a pawn, update pawn hash key, otherwise
            // update non-pawn material.
            if captured.piece_type() == PAWN {
                if m.move_type() == ENPASSANT {
                    capsq -= pawn_push(us);

                    debug_assert!(to == self.st().ep_square);
                    debug_assert!(to.relative_rank(us) == RANK_6);
                    debug_assert!(self.piece_on(capsq) == Piece::make(them, PAWN));
                }

                self.st_mut().pawn_key ^= zobrist::psq(captured, capsq);
            } else {
                self.st_mut().non_pawn_material[them.index()] -= piece_value(MG, captured);
            }

            self.remove_piece(captured, capsq);

            k ^= zobrist::psq(captured, capsq);
            let mk = zobrist::material(captured, self.piece_count[captured.index()]);
            self.st_mut().material_key ^= mk;

            self.st_mut().psq -= psqt::psq(captured, capsq);
            self.st_mut().rule50 = 0;
        }

        k ^= zobrist::psq(pc, from) ^ zobrist::psq(pc, to);

        // Reset en passant square
        if self.st().ep_square != Square::NONE {
            k ^= zobrist::enpassant(self.st().ep_square.file());
            self.st_mut().ep_square = Square::NONE;
        }

        // Update castling rights if needed
        let cr = self.castling_rights_mask[from.index()] | self.castling_rights_mask[to.index()];
        if self.st().castling_rights != 0 && cr != 0 {
            k ^= zobrist::castling(self.st().castling_rights & cr);
            self.st_mut().castling_rights &= !cr;
        }

        // Then relocation
        if m.move_type() != CASTLING {
            self.move_piece(pc, from, to);
        }

        if pc.piece_type() == PAWN {
            // Set en-passant square if the moved pawn can be captured
            if to.0 ^ from.0 == 16
                && self.attacks_from_pawn(to - pawn_push(us), us) & self.pieces_cp(them, PAWN) != 0
            {
                let ep = to - pawn_push(us);
                self.st_mut().ep_square = ep;
                k ^= zobrist::enpassant(ep.file());
            } else if m.move_type() == PROMOTION {
                // And finally the promotion substitution
                let promotion = Piece::make(us, m.promotion_type());

                debug_assert!(to.relative_rank(us) == RANK_8);

                self.remove_piece(pc, to);
                self.put_piece(promotion, to);

                k ^= zobrist::psq(pc, to) ^ zobrist::psq(promotion, to);
                self.st_mut().pawn_key ^= zobrist::psq(pc, to);
                let mk = zobrist::material(promotion, self.piece_count[promotion.index()] - 1)
                    ^ zobrist::material(pc, self.piece_count[pc.index()]);
                self.st_mut().material_key ^= mk;

                self.st_mut().psq += psqt::psq(promotion, to) - psqt::psq(pc, to);
                self.st_mut().non_pawn_material[us.index()] += piece_value(MG, promotion);
            }

            self.st_mut().pawn_key ^= zobrist::psq(pc, from) ^ zobrist::psq(pc, to);
            self.st_mut().rule50 = 0;
        }

        self.st_mut().psq += psqt::psq(pc, to) - psqt::psq(pc, from);
        self.st_mut().captured_piece = captured;
        self.st_mut().key = k;

        // Calculate checkers bitboard (if move gives check)
        self.st_mut().checkers_bb = if gives_check {
            self.attackers_to(self.square(them, KING)) & self.pieces_c(us)
        } else {
            Bitboard(0)
        };

        self.side_to_move = them;

        self.set_check_info();

        debug_assert!(self.is_ok());
    }

    // undo_move() unmakes a move in the reverse order of do_move():
    // promotion reversal, relocation, then capture restoration.
    pub fn undo_move(&mut self, m: Move) {
        debug_assert!(m.is_ok());

        self.side_to_move = !self.side_to_move;

        let us = self.side_to_move;
        let from = m.from();
        let mut to = m.to();
        let mut pc = self.piece_on(to);

        debug_assert!(self.empty(from) || m.move_type() == CASTLING);
        debug_assert!(self.st().captured_piece.piece_type() != KING);

        if m.move_type() == PROMOTION {
            debug_assert!(to.relative_rank(us) == RANK_8);
            debug_assert!(pc.piece_type() == m.promotion_type());

            self.remove_piece(pc, to);
            pc = Piece::make(us, PAWN);
            self.put_piece(pc, to);
        }

        if m.move_type() == CASTLING {
            self.do_castling::<false>(us, from, &mut to);
        } else {
            self.move_piece(pc, to, from);

            let cap_piece = self.st().captured_piece;
            if cap_piece != NO_PIECE {
                let mut capsq = to;

                if m.move_type() == ENPASSANT {
                    capsq -= pawn_push(us);

                    debug_assert!(pc.piece_type() == PAWN);
                    debug_assert!(self.piece_on(capsq) == NO_PIECE);
                }

                self.put_piece(cap_piece, capsq);
            }
        }

        self.states.pop();
        self.game_ply -= 1;

        debug_assert!(self.is_ok());
    }

    // do_castling() is a helper used to do/undo a castling move. It returns
    // the rook origin and destination, 'to' becomes the king destination.
    fn do_castling<const DOIT: bool>(
        &mut self,
        us: Color,
        from: Square,
        to: &mut Square,
    ) -> (Square, Square) {
        let king_side = *to > from;
        let rfrom = *to;
        let rto = relative_square(us, if king_side { Square::F1 } else { Square::D1 });
        *to = relative_square(us, if king_side { Square::G1 } else { Square::C1 });

        let king = Piece::make(us, KING);
        let rook = Piece::make(us, ROOK);

        // Remove both pieces first since squares could overlap
        self.remove_piece(king, if DOIT { from } else { *to });
        self.remove_piece(rook, if DOIT { rfrom } else { rto });
        self.put_piece(king, if DOIT { *to } else { from });
        self.put_piece(rook, if DOIT { rto } else { rfrom });

        (rfrom, rto)
    }

    // do(undo)_null_move() is used to do(undo) a "null move": it flips the
    // side to move without executing any move on the board.
    pub fn do_null_move(&mut self) {
        debug_assert!(self.checkers() == 0);

        let st_copy = self.st().clone();
        self.states.push(st_copy);

        if self.st().ep_square != Square::NONE {
            let ep_key = zobrist::enpassant(self.st().ep_square.file());
            self.st_mut().key ^= ep_key;
            self.st_mut().ep_square = Square::NONE;
        }

        self.st_mut().key ^= zobrist::side();
        self.st_mut().rule50 += 1;
        self.st_mut().plies_from_null = 0;
        self.st_mut().captured_piece = NO_PIECE;

        self.side_to_move = !self.side_to_move;

        self.set_check_info();

        debug_assert!(self.is_ok());
    }

    pub fn undo_null_move(&mut self) {
        debug_assert!(self.checkers() == 0);

        self.states.pop();
        self.side_to_move = !self.side_to_move;
    }

    // see_ge() tests if the SEE value of move is greater than or equal to
    // the given threshold. We use an algorithm similar to alpha-beta pruning
    // with a null window.
    pub fn see_ge(&self, m: Move, value: Value) -> bool {
        debug_assert!(m.is_ok());

        // Only deal with normal moves, assume others pass a simple see
        if m.move_type() != NORMAL {
            return Value::ZERO >= value;
        }

        let from = m.from();
        let to = m.to();

        // The opponent may be able to recapture so this is the best result
        // we can hope for.
        let mut swap = piece_value(MG, self.piece_on(to)) - value;
        if swap < Value::ZERO {
            return false;
        }

        // Now assume the worst possible result: that the opponent can
        // capture our piece for free.
        swap = piece_value(MG, self.piece_on(from)) - swap;
        if swap <= Value::ZERO {
            return true;
        }

        // Find all attackers to the destination square, with the moving piece
        // removed, but possibly an X-ray attacker added behind it.
        let mut occ = self.pieces() ^ from ^ to;
        let mut stm = self.piece_on(from).color();
        let mut attackers = self.attackers_to_occ(to, occ);
        let mut res = 1;

        loop {
            stm = !stm;
            attackers &= occ;
            let mut stm_attackers = attackers & self.pieces_c(stm);
            if stm_attackers == 0 {
                break;
            }

            // Pinned pieces may not recapture while their pinner is on board
            if self.pinners_for_king(stm) & !occ == 0 {
                stm_attackers &= !self.blockers_for_king(stm);
            }
            if stm_attackers == 0 {
                break;
            }

            res ^= 1;

            // Locate and remove the next least valuable attacker, and add
            // to the attackers the possibly X-ray attackers behind it.
            let next = [
                (PAWN, PawnValueMg),
                (KNIGHT, KnightValueMg),
                (BISHOP, BishopValueMg),
                (ROOK, RookValueMg),
                (QUEEN, QueenValueMg),
            ]
            .into_iter()
            .find(|&(pt, _)| stm_attackers & self.pieces_p(pt) != 0);

            match next {
                Some((pt, v)) => {
                    swap = v - swap;
                    if swap.0 < res {
                        break;
                    }
                    occ ^= lsb(stm_attackers & self.pieces_p(pt));
                    if pt == PAWN || pt == BISHOP || pt == QUEEN {
                        attackers |= attacks_bb(BISHOP, to, occ) & self.pieces_pp(BISHOP, QUEEN);
                    }
                    if pt == ROOK || pt == QUEEN {
                        attackers |= attacks_bb(ROOK, to, occ) & self.pieces_pp(ROOK, QUEEN);
                    }
                }
                // King: the capture only stands if the opponent has no
                // attackers left.
                None => {
                    return if attackers & !self.pieces_c(stm) != 0 {
                        res == 0
                    } else {
                        res != 0
                    };
                }
            }
        }
        res != 0
    }

    // is_draw() tests whether the position is drawn by insufficient
    // material, the 50-move rule or repetition. It does not detect
    // stalemates. A position repeated once strictly after the root, or twice
    // at or before it, is a draw.
    pub fn is_draw(&self, ply: i32) -> bool {
        if self.pieces_p(PAWN) == 0 && self.non_pawn_material() <= BishopValueMg {
            return true;
        }

        if self.st().rule50 > 99
            && (self.checkers() == 0 || !MoveList::new::<Legal>(self).is_empty())
        {
            return true;
        }

        let end = std::cmp::min(self.st().rule50, self.st().plies_from_null);

        if end < 4 {
            return false;
        }

        let mut k = self.states.len() - 3;
        let mut cnt = 0;

        let mut i = 4;
        while i <= end {
            k -= 2;

            if self.states[k].key == self.st().key {
                cnt += 1;
                if cnt + i32::from(ply > i) == 2 {
                    return true;
                }
            }

            i += 2;
        }

        false
    }

    fn put_piece(&mut self, pc: Piece, s: Square) {
        self.board[s.index()] = pc;
        self.by_type_bb[ALL_PIECES.index()] |= s;
        self.by_type_bb[pc.piece_type().index()] |= s;
        self.by_color_bb[pc.color().index()] |= s;
        self.index[s.index()] = self.piece_count[pc.index()];
        self.piece_count[pc.index()] += 1;
        self.piece_list[pc.index()][self.index[s.index()] as usize] = s;
        self.piece_count[Piece::make(pc.color(), ALL_PIECES).index()] += 1;
    }

    // Swap-with-last removal: the list's last square refills the freed slot
    // and the vacated tail becomes the terminator.
    fn remove_piece(&mut self, pc: Piece, s: Square) {
        self.board[s.index()] = NO_PIECE;
        self.by_type_bb[ALL_PIECES.index()] ^= s;
        self.by_type_bb[pc.piece_type().index()] ^= s;
        self.by_color_bb[pc.color().index()] ^= s;
        self.piece_count[pc.index()] -= 1;
        let last_square = self.piece_list[pc.index()][self.piece_count[pc.index()] as usize];
        self.index[last_square.index()] = self.index[s.index()];
        self.piece_list[pc.index()][self.index[last_square.index()] as usize] = last_square;
        self.piece_list[pc.index()][self.piece_count[pc.index()] as usize] = Square::NONE;
        self.piece_count[Piece::make(pc.color(), ALL_PIECES).index()] -= 1;
    }

    fn move_piece(&mut self, pc: Piece, from: Square, to: Square) {
        let from_to_bb = from.bb() ^ to.bb();
        self.by_type_bb[ALL_PIECES.index()] ^= from_to_bb;
        self.by_type_bb[pc.piece_type().index()] ^= from_to_bb;
        self.by_color_bb[pc.color().index()] ^= from_to_bb;
        self.board[from.index()] = NO_PIECE;
        self.board[to.index()] = pc;
        self.index[to.index()] = self.index[from.index()];
        self.piece_list[pc.index()][self.index[to.index()] as usize] = to;
    }

    // is_ok() performs consistency checks on the position object. Meant to
    // be called from debug_assert!.
    pub fn is_ok(&self) -> bool {
        if self.piece_on(self.square(WHITE, KING)) != W_KING
            || self.piece_on(self.square(BLACK, KING)) != B_KING
            || (self.ep_square() != Square::NONE
                && self.ep_square().relative_rank(self.side_to_move()) != RANK_6)
        {
            return false;
        }

        if self.count(WHITE, KING) != 1
            || self.count(BLACK, KING) != 1
            || self.attackers_to(self.square(!self.side_to_move(), KING))
                & self.pieces_c(self.side_to_move())
                != 0
        {
            return false;
        }

        if self.pieces_p(PAWN) & (RANK1_BB | RANK8_BB) != 0
            || self.pieces_c(WHITE) & self.pieces_c(BLACK) != 0
            || self.pieces_c(WHITE) | self.pieces_c(BLACK) != self.pieces()
        {
            return false;
        }

        for p1 in 1..=6 {
            for p2 in 1..=6 {
                if p1 != p2 && self.pieces_p(PieceType(p1)) & self.pieces_p(PieceType(p2)) != 0 {
                    return false;
                }
            }
        }

        for &pc in &PIECES {
            if self.piece_count[pc.index()]
                != popcount(self.pieces_cp(pc.color(), pc.piece_type())) as i32
            {
                return false;
            }

            for i in 0..self.piece_count[pc.index()] {
                let s = self.piece_list[pc.index()][i as usize];
                if self.board[s.index()] != pc || self.index[s.index()] != i {
                    return false;
                }
            }
        }

        true
    }
}

fn piece_char(pc: Piece) -> char {
    Position::PIECE_TO_CHAR
        .chars()
        .nth(pc.index())
        .unwrap_or(' ')
}

fn swap_case(c: char) -> char {
    if c.is_ascii_uppercase() {
        c.to_ascii_lowercase()
    } else {
        c.to_ascii_uppercase()
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        writeln!(f, "\n +---+---+---+---+---+---+---+---+")?;
        for r in (0..8).rev() {
            for file in 0..8 {
                write!(f, " | {}", piece_char(self.piece_on(Square::make(file, r))))?;
            }
            writeln!(f, " | {}\n +---+---+---+---+---+---+---+---+", r + 1)?;
        }
        writeln!(f, "   a   b   c   d   e   f   g   h")?;
        write!(
            f,
            "\nFen: {}\nKey: {}\nCheckers: {}",
            self.fen(),
            self.key(),
            self.checkers()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KIWIPETE: &str = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";
    const CASTLE_EP: &str = "r3k2r/p1p1p3/8/1pP5/3pP2P/5b2/PP1P2PP/R3K2R w KQkq b6 2 32";

    fn sorted_squares(pos: &Position, c: Color, pt: PieceType) -> Vec<Square> {
        let mut v: Vec<Square> = pos.square_list(c, pt).collect();
        v.sort();
        v
    }

    fn assert_set_equal(a: &Position, b: &Position) {
        assert_eq!(a.fen(), b.fen());
        assert_eq!(a.key(), b.key());
        assert_eq!(a.pawn_key(), b.pawn_key());
        assert_eq!(a.material_key(), b.material_key());
        assert_eq!(a.psq_score(), b.psq_score());
        assert_eq!(a.checkers(), b.checkers());
        assert_eq!(a.pieces(), b.pieces());
        for &c in &[WHITE, BLACK] {
            assert_eq!(a.pieces_c(c), b.pieces_c(c));
            assert_eq!(a.non_pawn_material_c(c), b.non_pawn_material_c(c));
            assert_eq!(a.blockers_for_king(c), b.blockers_for_king(c));
            for pt in [PAWN, KNIGHT, BISHOP, ROOK, QUEEN, KING] {
                assert_eq!(a.count(c, pt), b.count(c, pt));
                assert_eq!(sorted_squares(a, c, pt), sorted_squares(b, c, pt));
            }
        }
        for s in Square::all() {
            assert_eq!(a.piece_on(s), b.piece_on(s));
        }
    }

    fn assert_keys_consistent(pos: &Position) {
        let (key, pawn_key, material_key) = pos.compute_keys();
        assert_eq!(pos.key(), key, "{}", pos.fen());
        assert_eq!(pos.pawn_key(), pawn_key);
        assert_eq!(pos.material_key(), material_key);
    }

    fn walk(pos: &mut Position, depth: u32) {
        assert_keys_consistent(pos);
        if depth == 0 {
            return;
        }
        let before = pos.clone();
        for m in MoveList::new::<Legal>(pos).iter() {
            pos.do_move(m, pos.gives_check(m));
            let us = pos.side_to_move();
            let attacked = pos.attackers_to(pos.square(us, KING)) & pos.pieces_c(!us) != 0;
            assert_eq!(pos.in_check(), attacked);
            walk(pos, depth - 1);
            pos.undo_move(m);
            assert_set_equal(pos, &before);
        }
    }

    #[test]
    fn test_fen_round_trip() {
        for fen in [
            START_FEN,
            KIWIPETE,
            CASTLE_EP,
            "8/8/8/8/8/8/8/K6k b - - 12 80",
        ] {
            let pos = Position::from_fen(fen).expect("valid fen");
            assert_eq!(pos.fen(), fen);
        }
    }

    #[test]
    fn test_malformed_fen_falls_back_to_start() {
        let mut pos = Position::from_fen(KIWIPETE).expect("valid fen");
        for bad in [
            "",
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP w KQkq - 0 1",
            "rnbqkbnr/pppppppp/9/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNX w KQkq - 0 1",
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR x KQkq - 0 1",
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQQBNR w - - 0 1",
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq e9 0 1",
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - x 1",
            "4k3/8/8/8/8/8/8/4K2R w Q - 0 1",
            "4k3/4R3/8/8/8/8/8/4K3 w - - 0 1",
        ] {
            assert!(pos.set(bad).is_err(), "accepted {bad:?}");
            assert_eq!(pos.fen(), START_FEN);
        }
    }

    #[test]
    fn test_ep_square_dropped_when_not_capturable() {
        let pos =
            Position::from_fen("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1")
                .expect("valid fen");
        assert_eq!(pos.ep_square(), Square::NONE);
    }

    #[test]
    fn test_do_undo_restores_set_equal_position() {
        let mut pos = Position::from_fen(KIWIPETE).expect("valid fen");
        walk(&mut pos, 3);
        let mut pos = Position::from_fen(CASTLE_EP).expect("valid fen");
        walk(&mut pos, 3);
    }

    #[test]
    fn test_piece_list_order_may_change_after_undo() {
        // Capturing the first listed knight swaps the last one into its slot
        let mut pos =
            Position::from_fen("4k3/8/8/8/8/2n1n3/3P4/4K3 w - - 0 1").expect("valid fen");
        let before: Vec<Square> = pos.square_list(BLACK, KNIGHT).collect();
        assert_eq!(before, vec![Square::C3, Square::E3]);
        let m = Move::make(Square::D2, Square::C3);
        pos.do_move(m, pos.gives_check(m));
        pos.undo_move(m);
        let after: Vec<Square> = pos.square_list(BLACK, KNIGHT).collect();
        assert_eq!(after, vec![Square::E3, Square::C3]);
        assert_eq!(sorted_squares(&pos, BLACK, KNIGHT), before);
    }

    #[test]
    fn test_null_move_flips_side_and_clears_ep() {
        let mut pos = Position::from_fen(CASTLE_EP).expect("valid fen");
        let key = pos.key();
        pos.do_null_move();
        assert_eq!(pos.side_to_move(), BLACK);
        assert_eq!(pos.ep_square(), Square::NONE);
        assert_keys_consistent(&pos);
        pos.undo_null_move();
        assert_eq!(pos.key(), key);
        assert_eq!(pos.ep_square(), Square::B6);
    }

    #[test]
    fn test_castling_and_en_passant_scenario() {
        let pos = Position::from_fen(CASTLE_EP).expect("valid fen");
        let moves: Vec<Move> = MoveList::new::<Legal>(&pos).iter().collect();
        let castles: Vec<Move> = moves
            .iter()
            .copied()
            .filter(|m| m.move_type() == CASTLING)
            .collect();
        assert_eq!(
            castles,
            vec![Move::make_special(CASTLING, Square::E1, Square::H1)]
        );
        let eps: Vec<Move> = moves
            .iter()
            .copied()
            .filter(|m| m.move_type() == ENPASSANT)
            .collect();
        assert_eq!(
            eps,
            vec![Move::make_special(ENPASSANT, Square::C5, Square::B6)]
        );
    }

    #[test]
    fn test_castling_rights_revoked() {
        let mut pos = Position::from_fen(KIWIPETE).expect("valid fen");
        let m = Move::make(Square::H1, Square::G1);
        pos.do_move(m, pos.gives_check(m));
        assert!(!pos.has_castling_right(WHITE_OO));
        assert!(pos.has_castling_right(WHITE_OOO));
        assert_keys_consistent(&pos);
    }

    #[test]
    fn test_see() {
        let pos = Position::from_fen("1k1r4/1pp4p/p7/4p3/8/P5P1/1PP4P/2K1R3 w - - 0 1")
            .expect("valid fen");
        let rxe5 = Move::make(Square::E1, Square::E5);
        assert!(pos.see_ge(rxe5, Value::ZERO));
        assert!(pos.see_ge(rxe5, PawnValueMg));

        let pos = Position::from_fen("1k1r3q/1ppn3p/p4b2/4p3/8/P2N2P1/1PP1R1BP/2K1Q3 w - - 0 1")
            .expect("valid fen");
        let nxe5 = Move::make(Square::D3, Square::E5);
        assert!(!pos.see_ge(nxe5, Value::ZERO));
    }

    #[test]
    fn test_gives_check() {
        let pos = Position::from_fen("4k3/8/8/8/8/8/8/R3K3 w Q - 0 1").expect("valid fen");
        assert!(pos.gives_check(Move::make(Square::A1, Square::A8)));
        assert!(!pos.gives_check(Move::make(Square::A1, Square::A2)));
        let pos = Position::from_fen("3k4/8/8/8/8/8/8/R3K3 w Q - 0 1").expect("valid fen");
        assert!(pos.gives_check(Move::make_special(CASTLING, Square::E1, Square::A1)));
    }

    #[test]
    fn test_repetition_draw() {
        let mut pos = Position::from_fen("4k3/8/8/8/8/8/8/4K2R w - - 0 1").expect("valid fen");
        let cycle = [
            Move::make(Square::E1, Square::F1),
            Move::make(Square::E8, Square::F8),
            Move::make(Square::F1, Square::E1),
            Move::make(Square::F8, Square::E8),
        ];
        for &m in &cycle {
            pos.do_move(m, pos.gives_check(m));
        }
        // One repetition inside the tree is enough, at the root we need two
        assert!(pos.is_draw(5));
        assert!(!pos.is_draw(0));
        for &m in &cycle {
            pos.do_move(m, pos.gives_check(m));
        }
        assert!(pos.is_draw(0));
    }

    #[test]
    fn test_insufficient_material_and_rule50() {
        let pos = Position::from_fen("4k3/8/8/8/8/8/8/4KB2 w - - 0 1").expect("valid fen");
        assert!(pos.is_draw(1));
        let pos = Position::from_fen("4k3/8/8/8/8/8/8/4K2R w - - 100 80").expect("valid fen");
        assert!(pos.is_draw(1));
        let pos = Position::from_fen("4k3/8/8/8/8/8/8/4K2R w - - 99 80").expect("valid fen");
        assert!(!pos.is_draw(1));
    }

    #[test]
    fn test_flip() {
        let mut pos = Position::from_fen(CASTLE_EP).expect("valid fen");
        pos.flip();
        assert_eq!(
            pos.fen(),
            "r3k2r/pp1p2pp/5B2/3Pp2p/1Pp5/8/P1P1P3/R3K2R b KQkq b3 2 32"
        );
        pos.flip();
        assert_eq!(pos.fen(), CASTLE_EP);
    }
}
