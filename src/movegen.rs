// SPDX-License-Identifier: GPL-3.0-or-later

use crate::bitboard::{
    between_bb, file_bb, line_bb, lsb, more_than_one, pseudo_attacks, rank_bb, Bitboard,
};
use crate::position::Position;
use crate::types::{
    direction::pawn_push, direction::Direction, relative_rank, relative_square, CastlingRight,
    CastlingSide, Color, Move, PieceType, Square, BISHOP, CASTLING, ENPASSANT, KING, KNIGHT,
    MAX_MOVES, PAWN, QUEEN, RANK_3, RANK_7, RANK_8, ROOK, WHITE,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenKind {
    Captures,
    Quiets,
    QuietChecks,
    Evasions,
    NonEvasions,
    Legal,
}

pub trait GenType {
    const KIND: GenKind;
}

// Captures and queen promotions
pub struct Captures;
// Non-captures and underpromotions
pub struct Quiets;
// Non-captures and knight underpromotions that give check
pub struct QuietChecks;
// Check evasions, only used when in check
pub struct Evasions;
// Captures and non-captures, only used when not in check
pub struct NonEvasions;
// All legal moves
pub struct Legal;

impl GenType for Captures {
    const KIND: GenKind = GenKind::Captures;
}

impl GenType for Quiets {
    const KIND: GenKind = GenKind::Quiets;
}

impl GenType for QuietChecks {
    const KIND: GenKind = GenKind::QuietChecks;
}

impl GenType for Evasions {
    const KIND: GenKind = GenKind::Evasions;
}

impl GenType for NonEvasions {
    const KIND: GenKind = GenKind::NonEvasions;
}

impl GenType for Legal {
    const KIND: GenKind = GenKind::Legal;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExtMove {
    pub m: Move,
    pub value: i32,
}

fn push(list: &mut [ExtMove], idx: usize, m: Move) -> usize {
    list[idx].m = m;
    idx + 1
}

fn generate_castling(
    pos: &Position,
    list: &mut [ExtMove],
    mut idx: usize,
    us: Color,
    cs: CastlingSide,
    checks: bool,
) -> usize {
    let cr = CastlingRight::make(us, cs);
    if !pos.has_castling_right(cr) || pos.castling_impeded(cr) {
        return idx;
    }

    let kfrom = pos.square(us, KING);
    let rfrom = pos.castling_rook_square(cr);
    let kto = relative_square(
        us,
        match cs {
            CastlingSide::King => Square::G1,
            CastlingSide::Queen => Square::C1,
        },
    );
    let enemies = pos.pieces_c(!us);

    debug_assert!(pos.checkers() == 0);

    // The king may not pass through or land on an attacked square
    let step = if kto > kfrom {
        Direction::WEST
    } else {
        Direction::EAST
    };
    let mut s = kto;
    while s != kfrom {
        if pos.attackers_to(s) & enemies != 0 {
            return idx;
        }
        s += step;
    }

    let m = Move::make_special(CASTLING, kfrom, rfrom);

    if checks && !pos.gives_check(m) {
        return idx;
    }

    idx = push(list, idx, m);
    idx
}

fn make_promotions(
    kind: GenKind,
    list: &mut [ExtMove],
    mut idx: usize,
    to: Square,
    ksq: Square,
    d: Direction,
) -> usize {
    let from = to - d;

    if matches!(
        kind,
        GenKind::Captures | GenKind::Evasions | GenKind::NonEvasions
    ) {
        idx = push(list, idx, Move::make_prom(from, to, QUEEN));
    }

    if matches!(
        kind,
        GenKind::Quiets | GenKind::Evasions | GenKind::NonEvasions
    ) {
        idx = push(list, idx, Move::make_prom(from, to, ROOK));
        idx = push(list, idx, Move::make_prom(from, to, BISHOP));
        idx = push(list, idx, Move::make_prom(from, to, KNIGHT));
    }

    // Knight promotion is the only promotion that can give a direct check
    // that's not already included in the queen promotion.
    if kind == GenKind::QuietChecks && pseudo_attacks(KNIGHT, to) & ksq != 0 {
        idx = push(list, idx, Move::make_prom(from, to, KNIGHT));
    }

    idx
}

#[allow(clippy::too_many_lines)]
fn generate_pawn_moves(
    kind: GenKind,
    pos: &Position,
    list: &mut [ExtMove],
    mut idx: usize,
    us: Color,
    target: Bitboard,
) -> usize {
    let them = !us;
    let trank8 = rank_bb(relative_rank(us, RANK_8));
    let trank7 = rank_bb(relative_rank(us, RANK_7));
    let trank3 = rank_bb(relative_rank(us, RANK_3));
    let up = pawn_push(us);
    let (up_right, up_left) = if us == WHITE {
        (Direction::NORTH_EAST, Direction::NORTH_WEST)
    } else {
        (Direction::SOUTH_WEST, Direction::SOUTH_EAST)
    };

    let pawns_on7 = pos.pieces_cp(us, PAWN) & trank7;
    let pawns_not_on7 = pos.pieces_cp(us, PAWN) & !trank7;

    let enemies = match kind {
        GenKind::Evasions => pos.pieces_c(them) & target,
        GenKind::Captures => target,
        _ => pos.pieces_c(them),
    };

    let mut empty_squares = Bitboard(0);

    // Single and double pawn pushes, no promotions
    if kind != GenKind::Captures {
        empty_squares = if kind == GenKind::Quiets || kind == GenKind::QuietChecks {
            target
        } else {
            !pos.pieces()
        };

        let mut b1 = pawns_not_on7.shift(up) & empty_squares;
        let mut b2 = (b1 & trank3).shift(up) & empty_squares;

        // Consider only blocking squares
        if kind == GenKind::Evasions {
            b1 &= target;
            b2 &= target;
        }

        if kind == GenKind::QuietChecks {
            let ksq = pos.square(them, KING);

            b1 &= pos.attacks_from_pawn(ksq, them);
            b2 &= pos.attacks_from_pawn(ksq, them);

            // Add pawn pushes which give discovered check. This is possible
            // only if the pawn is not on the same file as the enemy king,
            // because we don't generate captures.
            let dc_candidates = pos.blockers_for_king(them) & pos.pieces_c(us);
            if pawns_not_on7 & dc_candidates != 0 {
                let dc1 = (pawns_not_on7 & dc_candidates).shift(up)
                    & empty_squares
                    & !file_bb(ksq.file());
                let dc2 = (dc1 & trank3).shift(up) & empty_squares;

                b1 |= dc1;
                b2 |= dc2;
            }
        }

        for to in b1 {
            idx = push(list, idx, Move::make(to - up, to));
        }

        for to in b2 {
            idx = push(list, idx, Move::make(to - up - up, to));
        }
    }

    // Promotions and underpromotions
    if pawns_on7 != 0 && (kind != GenKind::Evasions || target & trank8 != 0) {
        if kind == GenKind::Captures {
            empty_squares = !pos.pieces();
        }

        if kind == GenKind::Evasions {
            empty_squares &= target;
        }

        let b1 = pawns_on7.shift(up_right) & enemies;
        let b2 = pawns_on7.shift(up_left) & enemies;
        let b3 = pawns_on7.shift(up) & empty_squares;

        let ksq = pos.square(them, KING);

        for s in b1 {
            idx = make_promotions(kind, list, idx, s, ksq, up_right);
        }

        for s in b2 {
            idx = make_promotions(kind, list, idx, s, ksq, up_left);
        }

        for s in b3 {
            idx = make_promotions(kind, list, idx, s, ksq, up);
        }
    }

    // Standard and en passant captures
    if matches!(
        kind,
        GenKind::Captures | GenKind::Evasions | GenKind::NonEvasions
    ) {
        let b1 = pawns_not_on7.shift(up_right) & enemies;
        let b2 = pawns_not_on7.shift(up_left) & enemies;

        for to in b1 {
            idx = push(list, idx, Move::make(to - up_right, to));
        }

        for to in b2 {
            idx = push(list, idx, Move::make(to - up_left, to));
        }

        let ep = pos.ep_square();
        if ep != Square::NONE {
            debug_assert!(ep.rank() == relative_rank(us, crate::types::RANK_6));

            // An en passant capture can be an evasion only if the checking
            // piece is the double pushed pawn and so is in the target.
            // Otherwise this is a discovered check and we are forced to do
            // otherwise.
            if kind == GenKind::Evasions && target & (ep - up) == 0 {
                return idx;
            }

            let b1 = pawns_not_on7 & pos.attacks_from_pawn(ep, them);

            debug_assert!(b1 != 0);

            for from in b1 {
                idx = push(list, idx, Move::make_special(ENPASSANT, from, ep));
            }
        }
    }

    idx
}

fn generate_moves(
    pos: &Position,
    list: &mut [ExtMove],
    mut idx: usize,
    us: Color,
    pt: PieceType,
    checks: bool,
    target: Bitboard,
) -> usize {
    debug_assert!(pt != KING && pt != PAWN);

    for from in pos.square_list(us, pt) {
        if checks {
            if (pt == BISHOP || pt == ROOK || pt == QUEEN)
                && pseudo_attacks(pt, from) & target & pos.check_squares(pt) == 0
            {
                continue;
            }

            // Discovered check candidates are already generated
            if pos.blockers_for_king(!us) & from != 0 {
                continue;
            }
        }

        let mut b = pos.attacks_from(pt, from) & target;

        if checks {
            b &= pos.check_squares(pt);
        }

        for to in b {
            idx = push(list, idx, Move::make(from, to));
        }
    }

    idx
}

fn generate_all(
    kind: GenKind,
    pos: &Position,
    list: &mut [ExtMove],
    mut idx: usize,
    us: Color,
    target: Bitboard,
) -> usize {
    let checks = kind == GenKind::QuietChecks;

    idx = generate_pawn_moves(kind, pos, list, idx, us, target);
    for pt in [KNIGHT, BISHOP, ROOK, QUEEN] {
        idx = generate_moves(pos, list, idx, us, pt, checks, target);
    }

    if kind != GenKind::QuietChecks && kind != GenKind::Evasions {
        let ksq = pos.square(us, KING);
        for to in pos.attacks_from(KING, ksq) & target {
            idx = push(list, idx, Move::make(ksq, to));
        }
    }

    if kind != GenKind::Captures && kind != GenKind::Evasions && pos.can_castle(us) {
        idx = generate_castling(pos, list, idx, us, CastlingSide::King, checks);
        idx = generate_castling(pos, list, idx, us, CastlingSide::Queen, checks);
    }

    idx
}

// generate_quiet_checks() generates all pseudo-legal non-captures and knight
// underpromotions that give check.
fn generate_quiet_checks(pos: &Position, list: &mut [ExtMove], mut idx: usize) -> usize {
    debug_assert!(pos.checkers() == 0);

    let us = pos.side_to_move();
    let dc = pos.blockers_for_king(!us) & pos.pieces_c(us);

    for from in dc {
        let pt = pos.piece_on(from).piece_type();

        // Pawn pushes are generated together with the other pawn moves
        if pt == PAWN {
            continue;
        }

        let mut b = pos.attacks_from(pt, from) & !pos.pieces();

        if pt == KING {
            b &= !pseudo_attacks(QUEEN, pos.square(!us, KING));
        }

        for to in b {
            idx = push(list, idx, Move::make(from, to));
        }
    }

    generate_all(GenKind::QuietChecks, pos, list, idx, us, !pos.pieces())
}

// generate_evasions() generates all pseudo-legal check evasions when the
// side to move is in check.
fn generate_evasions(pos: &Position, list: &mut [ExtMove], mut idx: usize) -> usize {
    debug_assert!(pos.checkers() != 0);

    let us = pos.side_to_move();
    let ksq = pos.square(us, KING);
    let mut slider_attacks = Bitboard(0);
    let sliders = pos.checkers() & !pos.pieces_pp(KNIGHT, PAWN);

    // Find all the squares attacked by slider checkers. We will remove them
    // from the king evasions in order to skip known illegal moves, which
    // avoids any useless legality checks later on.
    for check_sq in sliders {
        slider_attacks |= line_bb(check_sq, ksq) ^ check_sq;
    }

    // Generate evasions for king, capture and non capture moves
    let b = pos.attacks_from(KING, ksq) & !pos.pieces_c(us) & !slider_attacks;
    for to in b {
        idx = push(list, idx, Move::make(ksq, to));
    }

    // Double check, only a king move can save the day
    if more_than_one(pos.checkers()) {
        return idx;
    }

    // Generate blocking evasions or captures of the checking piece
    let check_sq = lsb(pos.checkers());
    let target = between_bb(check_sq, ksq) | check_sq;

    generate_all(GenKind::Evasions, pos, list, idx, us, target)
}

// generate_legal() generates all the legal moves in the given position.
// Evasions already restrict moves to blocking or capturing the checker, so
// only king moves, moves of pinned pieces and en passant captures need the
// full legality test. pos.legal() looks up king destinations against
// attackers with the king removed and keeps pinned pieces on their line.
fn generate_legal(pos: &Position, list: &mut [ExtMove], idx: usize) -> usize {
    let us = pos.side_to_move();
    let pinned = pos.blockers_for_king(us) & pos.pieces_c(us);
    let ksq = pos.square(us, KING);

    let end = if pos.checkers() != 0 {
        generate_evasions(pos, list, idx)
    } else {
        generate::<NonEvasions>(pos, list, idx)
    };

    let mut cur = idx;
    let mut end = end;
    while cur != end {
        let m = list[cur].m;
        if (pinned & m.from() != 0 || m.from() == ksq || m.move_type() == ENPASSANT)
            && !pos.legal(m)
        {
            end -= 1;
            list[cur].m = list[end].m;
        } else {
            cur += 1;
        }
    }

    end
}

// generate::<T>() writes the moves of kind T into list starting at idx and
// returns the index one past the last move written.
pub fn generate<T: GenType>(pos: &Position, list: &mut [ExtMove], idx: usize) -> usize {
    match T::KIND {
        GenKind::QuietChecks => generate_quiet_checks(pos, list, idx),
        GenKind::Evasions => generate_evasions(pos, list, idx),
        GenKind::Legal => generate_legal(pos, list, idx),
        kind => {
            debug_assert!(pos.checkers() == 0);

            let us = pos.side_to_move();
            let target = match kind {
                GenKind::Captures => pos.pieces_c(!us),
                GenKind::Quiets => !pos.pieces(),
                _ => !pos.pieces_c(us),
            };

            generate_all(kind, pos, list, idx, us, target)
        }
    }
}

// MoveList wraps generate() and offers the convenient list interface used by
// perft, legality checks and the front-end.
pub struct MoveList {
    list: [ExtMove; MAX_MOVES],
    size: usize,
}

impl MoveList {
    pub fn new<T: GenType>(pos: &Position) -> MoveList {
        let mut list = [ExtMove::default(); MAX_MOVES];
        let size = generate::<T>(pos, &mut list, 0);
        MoveList { list, size }
    }

    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn contains(&self, m: Move) -> bool {
        self.iter().any(|x| x == m)
    }

    pub fn iter(&self) -> impl Iterator<Item = Move> + '_ {
        self.list[..self.size].iter().map(|em| em.m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::START_FEN;

    fn moves<T: GenType>(fen: &str) -> Vec<Move> {
        let pos = Position::from_fen(fen).expect("valid fen");
        MoveList::new::<T>(&pos).iter().collect()
    }

    #[test]
    fn test_startpos_counts() {
        assert_eq!(moves::<Legal>(START_FEN).len(), 20);
        assert_eq!(moves::<Quiets>(START_FEN).len(), 20);
        assert!(moves::<Captures>(START_FEN).is_empty());
    }

    #[test]
    fn test_captures_plus_quiets_are_non_evasions() {
        let fen = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";
        let mut split = moves::<Captures>(fen);
        split.extend(moves::<Quiets>(fen));
        let mut all = moves::<NonEvasions>(fen);
        split.sort_by_key(|m| m.0);
        all.sort_by_key(|m| m.0);
        assert_eq!(split, all);
    }

    #[test]
    fn test_promotions_split_between_captures_and_quiets() {
        let fen = "4k3/1P6/8/8/8/8/8/4K3 w - - 0 1";
        let captures = moves::<Captures>(fen);
        assert_eq!(captures, vec![Move::make_prom(Square::B7, Square::B8, QUEEN)]);
        let quiets = moves::<Quiets>(fen);
        for pt in [ROOK, BISHOP, KNIGHT] {
            assert!(quiets.contains(&Move::make_prom(Square::B7, Square::B8, pt)));
        }
        assert!(!quiets.contains(&Move::make_prom(Square::B7, Square::B8, QUEEN)));
    }

    #[test]
    fn test_evasions_are_supersets_of_legal() {
        // Black king in check from the rook on e1
        let fen = "4k3/8/8/8/8/8/3n4/K3R3 b - - 0 1";
        let evasions = moves::<Evasions>(fen);
        for m in moves::<Legal>(fen) {
            assert!(evasions.contains(&m));
        }
        assert!(evasions.contains(&Move::make(Square::D2, Square::E4)));
    }

    #[test]
    fn test_double_check_only_king_moves() {
        let fen = "4k3/8/5N2/8/8/8/8/K3R3 b - - 0 1";
        let pos = Position::from_fen(fen).expect("valid fen");
        assert!(more_than_one(pos.checkers()));
        for m in moves::<Evasions>(fen) {
            assert_eq!(m.from(), Square::E8);
        }
    }

    #[test]
    fn test_quiet_checks_give_check() {
        let fen = "4k3/8/8/8/8/8/2N5/R3K2B w Q - 0 1";
        let pos = Position::from_fen(fen).expect("valid fen");
        let checks = moves::<QuietChecks>(fen);
        assert!(!checks.is_empty());
        for m in &checks {
            assert!(pos.gives_check(*m), "{:?}", m);
            assert!(!pos.capture(*m));
        }
        for m in moves::<Quiets>(fen) {
            if pos.legal(m) && pos.gives_check(m) && m.move_type() != crate::types::PROMOTION {
                assert!(checks.contains(&m), "{:?} missing", m);
            }
        }
    }

    #[test]
    fn test_pinned_piece_cannot_leave_line() {
        let fen = "4r1k1/8/8/8/8/8/4N3/4K3 w - - 0 1";
        assert!(moves::<Legal>(fen).iter().all(|m| m.from() != Square::E2));
    }
}
