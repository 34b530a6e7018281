// SPDX-License-Identifier: GPL-3.0-or-later

use crate::movegen::{generate, Captures, Evasions, ExtMove, QuietChecks, Quiets};
use crate::position::Position;
use crate::types::{
    depth::{Depth, ONE_PLY},
    piece_value, Move, Piece, Square, Value, MAX_MOVES, MG, PROMOTION, WHITE,
};

use ndarray::Array2;

// HistoryStats records how often quiet moves of a given piece to a given
// square have produced a cutoff. Entries saturate at +-MAX.
pub struct HistoryStats {
    table: Array2<i32>,
}

impl HistoryStats {
    pub const MAX: i32 = 2000;

    pub fn new() -> HistoryStats {
        HistoryStats {
            table: Array2::zeros((16, 64)),
        }
    }

    pub fn clear(&mut self) {
        self.table.fill(0);
    }

    pub fn get(&self, pc: Piece, to: Square) -> i32 {
        self.table[[pc.index(), to.index()]]
    }

    pub fn update(&mut self, pc: Piece, to: Square, bonus: i32) {
        let entry = &mut self.table[[pc.index(), to.index()]];
        if (*entry + bonus).abs() < Self::MAX {
            *entry += bonus;
        }
    }
}

impl Default for HistoryStats {
    fn default() -> Self {
        Self::new()
    }
}

// GainStats keeps the largest static evaluation gain seen for a quiet move
// of a piece to a square, slowly decaying towards smaller gains. Used by
// futility pruning.
pub struct GainStats {
    table: Array2<i32>,
}

impl GainStats {
    pub fn new() -> GainStats {
        GainStats {
            table: Array2::zeros((16, 64)),
        }
    }

    pub fn clear(&mut self) {
        self.table.fill(0);
    }

    pub fn get(&self, pc: Piece, to: Square) -> Value {
        Value(self.table[[pc.index(), to.index()]])
    }

    pub fn update(&mut self, pc: Piece, to: Square, gain: Value) {
        let entry = &mut self.table[[pc.index(), to.index()]];
        *entry = std::cmp::max(gain.0, *entry - 1);
    }
}

impl Default for GainStats {
    fn default() -> Self {
        Self::new()
    }
}

// RefutationStats stores, for the piece and destination of the previous
// move, the last two quiet moves that refuted it.
pub struct RefutationStats {
    table: Array2<[Move; 2]>,
}

impl RefutationStats {
    pub fn new() -> RefutationStats {
        RefutationStats {
            table: Array2::from_elem((16, 64), [Move::NONE; 2]),
        }
    }

    pub fn clear(&mut self) {
        self.table.fill([Move::NONE; 2]);
    }

    pub fn get(&self, pc: Piece, to: Square) -> [Move; 2] {
        self.table[[pc.index(), to.index()]]
    }

    pub fn update(&mut self, pc: Piece, to: Square, m: Move) {
        let entry = &mut self.table[[pc.index(), to.index()]];
        if entry[0] != m {
            entry[1] = entry[0];
            entry[0] = m;
        }
    }
}

impl Default for RefutationStats {
    fn default() -> Self {
        Self::new()
    }
}

// Quiet moves with negative history are sorted only from this depth on.
const SORT_NEGATIVE_DEPTH: Depth = Depth(3 * ONE_PLY.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    MainSearch = 0,
    CapturesInit = 1,
    GoodCaptures = 2,
    Killer1 = 3,
    Killer2 = 4,
    Refutation1 = 5,
    Refutation2 = 6,
    QuietInit = 7,
    QuietPositive = 8,
    QuietNegative = 9,
    BadCaptures = 10,
    Evasion = 11,
    EvasionsInit = 12,
    AllEvasions = 13,
    QSearch = 14,
    QCapturesInit = 15,
    QCaptures = 16,
    QChecks = 17,
    Recapture = 18,
    Recaptures = 19,
    Stop = 20,
}

impl Stage {
    fn next(self) -> Self {
        Stage::from(self as u8 + 1)
    }

    fn from(value: u8) -> Self {
        match value {
            0 => Stage::MainSearch,
            1 => Stage::CapturesInit,
            2 => Stage::GoodCaptures,
            3 => Stage::Killer1,
            4 => Stage::Killer2,
            5 => Stage::Refutation1,
            6 => Stage::Refutation2,
            7 => Stage::QuietInit,
            8 => Stage::QuietPositive,
            9 => Stage::QuietNegative,
            10 => Stage::BadCaptures,
            11 => Stage::Evasion,
            12 => Stage::EvasionsInit,
            13 => Stage::AllEvasions,
            14 => Stage::QSearch,
            15 => Stage::QCapturesInit,
            16 => Stage::QCaptures,
            17 => Stage::QChecks,
            18 => Stage::Recapture,
            19 => Stage::Recaptures,
            _ => Stage::Stop,
        }
    }
}

// insertion_sort() sorts moves in descending order of their value.
fn insertion_sort(list: &mut [ExtMove]) {
    for p in 1..list.len() {
        let tmp = list[p];
        let mut q = p;
        while q > 0 && list[q - 1].value < tmp.value {
            list[q] = list[q - 1];
            q -= 1;
        }
        list[q] = tmp;
    }
}

// pick_best() finds the best move in the list and moves it to the front.
// Calling pick_best() is faster than sorting all the moves in advance if
// there are few moves, e.g. the possible captures.
fn pick_best(list: &mut [ExtMove]) -> Move {
    if let Some((q, _)) = list.iter().enumerate().max_by_key(|&(_, x)| x.value) {
        list.swap(0, q);
    }
    list[0].m
}

// Most Valuable Victim, Least Valuable Attacker: the victim's value minus
// the raw type code of the moving piece.
fn mvv_lva(pos: &Position, m: Move) -> i32 {
    let victim = Piece::make(WHITE, pos.captured_type(m));
    let mut value = piece_value(MG, victim).0 - pos.moved_piece(m).piece_type().0 as i32;
    if m.move_type() == PROMOTION {
        value += piece_value(MG, Piece::make(WHITE, m.promotion_type())).0;
    }
    value
}

fn score_captures(pos: &Position, list: &mut [ExtMove]) {
    for em in list.iter_mut() {
        em.value = mvv_lva(pos, em.m);
    }
}

fn score_quiets(pos: &Position, history: &HistoryStats, list: &mut [ExtMove]) {
    for em in list.iter_mut() {
        em.value = history.get(pos.moved_piece(em.m), em.m.to());
    }
}

// Captures first, by MVV/LVA, then quiet evasions by history.
fn score_evasions(pos: &Position, history: &HistoryStats, list: &mut [ExtMove]) {
    for em in list.iter_mut() {
        em.value = if pos.capture(em.m) {
            mvv_lva(pos, em.m)
        } else {
            history.get(pos.moved_piece(em.m), em.m.to()) - (1 << 28)
        }
    }
}

// MoveSorter hands out one pseudo-legal move at a time. next_move() walks a
// sequence of stages, generating each category of moves only when the
// previous ones are used up, so that a cutoff on an early move saves the
// cost of generating the rest. Once exhausted it returns Move::NONE forever.
pub struct MoveSorter {
    cur: usize,
    end_moves: usize,
    end_bad_captures: usize,
    end_positive: usize,
    stage: Stage,
    depth: Depth,
    tt_move: Move,
    killers: [Move; 2],
    refutations: [Move; 2],
    specials: [Move; 4],
    specials_len: usize,
    recapture_square: Square,
    list: [ExtMove; MAX_MOVES],
}

impl MoveSorter {
    fn with_stage(stage: Stage, tt_move: Move, depth: Depth) -> MoveSorter {
        MoveSorter {
            cur: 0,
            end_moves: 0,
            end_bad_captures: 0,
            end_positive: 0,
            stage: if tt_move == Move::NONE && stage != Stage::Recapture {
                stage.next()
            } else {
                stage
            },
            depth,
            tt_move,
            killers: [Move::NONE; 2],
            refutations: [Move::NONE; 2],
            specials: [Move::NONE; 4],
            specials_len: 0,
            recapture_square: Square::NONE,
            list: [ExtMove::default(); MAX_MOVES],
        }
    }

    // Sorter for the main search. The hash move is dropped unless it is
    // pseudo-legal here, which also protects against key collisions.
    pub fn new(
        pos: &Position,
        ttm: Move,
        depth: Depth,
        killers: [Move; 2],
        refutations: [Move; 2],
    ) -> MoveSorter {
        let tt_move = if ttm != Move::NONE && pos.pseudo_legal(ttm) {
            ttm
        } else {
            Move::NONE
        };
        let stage = if pos.in_check() {
            Stage::Evasion
        } else {
            Stage::MainSearch
        };

        let mut ms = MoveSorter::with_stage(stage, tt_move, depth);
        ms.killers = killers;
        ms.refutations = refutations;
        ms
    }

    // Sorter for quiescence search. Below QS_RECAPTURES depth only
    // recaptures on the given square are searched.
    pub fn new_qsearch(pos: &Position, ttm: Move, depth: Depth, recapture: Square) -> MoveSorter {
        let valid = ttm != Move::NONE && pos.pseudo_legal(ttm);

        if pos.in_check() {
            let tt_move = if valid { ttm } else { Move::NONE };
            return MoveSorter::with_stage(Stage::Evasion, tt_move, depth);
        }

        if depth > Depth::QS_RECAPTURES {
            // No quiet hash move once checks are no longer generated.
            let tt_move = if valid && (depth > Depth::QS_NO_CHECKS || pos.capture_or_promotion(ttm))
            {
                ttm
            } else {
                Move::NONE
            };
            return MoveSorter::with_stage(Stage::QSearch, tt_move, depth);
        }

        let mut ms = MoveSorter::with_stage(Stage::Recapture, Move::NONE, depth);
        ms.recapture_square = recapture;
        ms
    }

    fn special_candidate(&self, pos: &Position, m: Move) -> bool {
        m != Move::NONE
            && m != self.tt_move
            && !self.specials[..self.specials_len].contains(&m)
            && pos.pseudo_legal(m)
            && !pos.capture_or_promotion(m)
    }

    fn yield_special(&mut self, m: Move) -> Move {
        self.specials[self.specials_len] = m;
        self.specials_len += 1;
        m
    }

    fn already_tried(&self, m: Move) -> bool {
        m == self.tt_move || self.specials[..self.specials_len].contains(&m)
    }

    pub fn next_move(&mut self, pos: &Position, history: &HistoryStats) -> Move {
        loop {
            match self.stage {
                Stage::MainSearch | Stage::Evasion | Stage::QSearch => {
                    self.stage = self.stage.next();
                    return self.tt_move;
                }

                Stage::CapturesInit => {
                    self.cur = 0;
                    self.end_bad_captures = 0;
                    self.end_moves = generate::<Captures>(pos, &mut self.list, 0);
                    score_captures(pos, &mut self.list[..self.end_moves]);
                    self.stage = self.stage.next();
                }

                Stage::GoodCaptures => {
                    while self.cur < self.end_moves {
                        let m = pick_best(&mut self.list[self.cur..self.end_moves]);
                        self.cur += 1;
                        if m != self.tt_move {
                            if pos.see_ge(m, Value::ZERO) {
                                return m;
                            }

                            // Losing capture. Move it to the beginning of
                            // the array.
                            self.list[self.end_bad_captures].m = m;
                            self.end_bad_captures += 1;
                        }
                    }
                    self.stage = self.stage.next();
                }

                Stage::Killer1 | Stage::Killer2 => {
                    let m = self.killers[self.stage as usize - Stage::Killer1 as usize];
                    self.stage = self.stage.next();
                    if self.special_candidate(pos, m) {
                        return self.yield_special(m);
                    }
                }

                Stage::Refutation1 | Stage::Refutation2 => {
                    let m = self.refutations[self.stage as usize - Stage::Refutation1 as usize];
                    self.stage = self.stage.next();
                    if self.special_candidate(pos, m) {
                        return self.yield_special(m);
                    }
                }

                Stage::QuietInit => {
                    self.cur = self.end_bad_captures;
                    self.end_moves = generate::<Quiets>(pos, &mut self.list, self.cur);
                    score_quiets(pos, history, &mut self.list[self.cur..self.end_moves]);

                    // Partition: positive history scores in front.
                    let mut split = self.cur;
                    for i in self.cur..self.end_moves {
                        if self.list[i].value > 0 {
                            self.list.swap(i, split);
                            split += 1;
                        }
                    }
                    self.end_positive = split;
                    insertion_sort(&mut self.list[self.cur..self.end_positive]);
                    self.stage = self.stage.next();
                }

                Stage::QuietPositive => {
                    while self.cur < self.end_positive {
                        let m = self.list[self.cur].m;
                        self.cur += 1;
                        if !self.already_tried(m) {
                            return m;
                        }
                    }
                    if self.depth >= SORT_NEGATIVE_DEPTH {
                        insertion_sort(&mut self.list[self.end_positive..self.end_moves]);
                    }
                    self.stage = self.stage.next();
                }

                Stage::QuietNegative => {
                    while self.cur < self.end_moves {
                        let m = self.list[self.cur].m;
                        self.cur += 1;
                        if !self.already_tried(m) {
                            return m;
                        }
                    }
                    self.cur = 0; // Point to beginning of bad captures
                    self.stage = self.stage.next();
                }

                Stage::BadCaptures => {
                    if self.cur < self.end_bad_captures {
                        let m = self.list[self.cur].m;
                        self.cur += 1;
                        return m;
                    }
                    self.stage = Stage::Stop;
                }

                Stage::EvasionsInit => {
                    self.cur = 0;
                    self.end_moves = generate::<Evasions>(pos, &mut self.list, 0);
                    score_evasions(pos, history, &mut self.list[..self.end_moves]);
                    self.stage = self.stage.next();
                }

                Stage::AllEvasions => {
                    while self.cur < self.end_moves {
                        let m = pick_best(&mut self.list[self.cur..self.end_moves]);
                        self.cur += 1;
                        if m != self.tt_move {
                            return m;
                        }
                    }
                    self.stage = Stage::Stop;
                }

                Stage::QCapturesInit => {
                    self.cur = 0;
                    self.end_moves = generate::<Captures>(pos, &mut self.list, 0);
                    score_captures(pos, &mut self.list[..self.end_moves]);
                    self.stage = self.stage.next();
                }

                Stage::QCaptures => {
                    while self.cur < self.end_moves {
                        let m = pick_best(&mut self.list[self.cur..self.end_moves]);
                        self.cur += 1;
                        if m != self.tt_move {
                            return m;
                        }
                    }
                    if self.depth < Depth::QS_CHECKS {
                        self.stage = Stage::Stop;
                        continue;
                    }
                    self.cur = 0;
                    self.end_moves = generate::<QuietChecks>(pos, &mut self.list, 0);
                    self.stage = self.stage.next();
                }

                Stage::QChecks => {
                    while self.cur < self.end_moves {
                        let m = self.list[self.cur].m;
                        self.cur += 1;
                        if m != self.tt_move {
                            return m;
                        }
                    }
                    self.stage = Stage::Stop;
                }

                Stage::Recapture => {
                    self.cur = 0;
                    self.end_moves = generate::<Captures>(pos, &mut self.list, 0);
                    score_captures(pos, &mut self.list[..self.end_moves]);
                    self.stage = self.stage.next();
                }

                Stage::Recaptures => {
                    while self.cur < self.end_moves {
                        let m = pick_best(&mut self.list[self.cur..self.end_moves]);
                        self.cur += 1;
                        if m.to() == self.recapture_square {
                            return m;
                        }
                    }
                    self.stage = Stage::Stop;
                }

                Stage::Stop => return Move::NONE,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::movegen::{Legal, MoveList, NonEvasions};
    use crate::types::{B_QUEEN, W_KNIGHT};

    const KIWIPETE: &str = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";

    fn init() {
        crate::init();
    }

    fn drain(ms: &mut MoveSorter, pos: &Position, history: &HistoryStats) -> Vec<Move> {
        let mut out = Vec::new();
        loop {
            let m = ms.next_move(pos, history);
            if m == Move::NONE {
                break;
            }
            out.push(m);
        }
        out
    }

    fn sorted(mut v: Vec<Move>) -> Vec<Move> {
        v.sort_by_key(|m| m.0);
        v
    }

    mod stats_tests {
        use super::*;

        #[test]
        fn test_history_saturates() {
            let mut h = HistoryStats::new();
            for _ in 0..100 {
                h.update(W_KNIGHT, Square::F3, 100);
            }
            assert!(h.get(W_KNIGHT, Square::F3) < HistoryStats::MAX);
            assert!(h.get(W_KNIGHT, Square::F3) >= HistoryStats::MAX - 100);
            h.update(W_KNIGHT, Square::F3, -300);
            assert!(h.get(W_KNIGHT, Square::F3) < HistoryStats::MAX - 200);
            h.clear();
            assert_eq!(h.get(W_KNIGHT, Square::F3), 0);
        }

        #[test]
        fn test_gain_decays() {
            let mut g = GainStats::new();
            g.update(B_QUEEN, Square::D4, Value(50));
            assert_eq!(g.get(B_QUEEN, Square::D4), Value(50));
            g.update(B_QUEEN, Square::D4, Value(10));
            assert_eq!(g.get(B_QUEEN, Square::D4), Value(49));
            g.update(B_QUEEN, Square::D4, Value(80));
            assert_eq!(g.get(B_QUEEN, Square::D4), Value(80));
        }

        #[test]
        fn test_refutations_rotate() {
            let mut r = RefutationStats::new();
            let m1 = Move::make(Square::G1, Square::F3);
            let m2 = Move::make(Square::B1, Square::C3);
            r.update(W_KNIGHT, Square::E5, m1);
            r.update(W_KNIGHT, Square::E5, m1);
            assert_eq!(r.get(W_KNIGHT, Square::E5), [m1, Move::NONE]);
            r.update(W_KNIGHT, Square::E5, m2);
            assert_eq!(r.get(W_KNIGHT, Square::E5), [m2, m1]);
        }
    }

    mod sorter_tests {
        use super::*;

        #[test]
        fn test_main_search_yields_every_move_once() {
            init();
            let pos = Position::from_fen(KIWIPETE).unwrap();
            let mut history = HistoryStats::new();
            history.update(pos.moved_piece(Move::make(Square::A2, Square::A3)), Square::A3, 50);
            history.update(pos.moved_piece(Move::make(Square::G2, Square::H3)), Square::H3, -40);

            let tt = Move::make(Square::E5, Square::F7);
            let killers = [Move::make(Square::A1, Square::B1), Move::make(Square::A2, Square::A4)];
            // A capture and an illegal move must be ignored as refutations.
            let refutations = [Move::make(Square::D5, Square::E6), Move::make(Square::H1, Square::H5)];

            let mut ms = MoveSorter::new(&pos, tt, 4 * ONE_PLY, killers, refutations);
            let got = drain(&mut ms, &pos, &history);

            assert_eq!(got[0], tt);
            let expected: Vec<Move> = MoveList::new::<NonEvasions>(&pos).iter().collect();
            assert_eq!(sorted(got.clone()), sorted(expected));

            let mut unique = got.clone();
            unique.sort_by_key(|m| m.0);
            unique.dedup();
            assert_eq!(unique.len(), got.len());
        }

        #[test]
        fn test_killers_come_before_other_quiets() {
            init();
            let pos = Position::from_fen(KIWIPETE).unwrap();
            let history = HistoryStats::new();
            let killer = Move::make(Square::A1, Square::B1);

            let mut ms = MoveSorter::new(&pos, Move::NONE, 4 * ONE_PLY, [killer, Move::NONE], [Move::NONE; 2]);
            let got = drain(&mut ms, &pos, &history);
            let k = got.iter().position(|&m| m == killer).unwrap();
            assert!(got[..k].iter().all(|&m| pos.capture_or_promotion(m)));
        }

        #[test]
        fn test_positive_history_first_and_bad_captures_last() {
            init();
            let pos = Position::from_fen(KIWIPETE).unwrap();
            let mut history = HistoryStats::new();
            let favourite = Move::make(Square::G2, Square::G3);
            history.update(pos.moved_piece(favourite), favourite.to(), 100);

            let mut ms = MoveSorter::new(&pos, Move::NONE, 4 * ONE_PLY, [Move::NONE; 2], [Move::NONE; 2]);
            let got = drain(&mut ms, &pos, &history);
            let first_quiet = got.iter().position(|&m| !pos.capture(m)).unwrap();
            assert_eq!(got[first_quiet], favourite);

            // Qxf6 loses the queen for a knight.
            let bad = Move::make(Square::F3, Square::F6);
            assert!(!pos.see_ge(bad, Value::ZERO));
            let b = got.iter().position(|&m| m == bad).unwrap();
            assert!(got[b..].iter().all(|&m| pos.capture(m)));
        }

        #[test]
        fn test_stays_exhausted() {
            init();
            let pos = Position::new();
            let history = HistoryStats::new();
            let mut ms = MoveSorter::new(&pos, Move::NONE, ONE_PLY, [Move::NONE; 2], [Move::NONE; 2]);
            assert_eq!(drain(&mut ms, &pos, &history).len(), 20);
            for _ in 0..3 {
                assert_eq!(ms.next_move(&pos, &history), Move::NONE);
            }
        }

        #[test]
        fn test_bogus_hash_move_is_dropped() {
            init();
            let pos = Position::new();
            let history = HistoryStats::new();
            let bogus = Move::make(Square::E2, Square::E5);
            let mut ms = MoveSorter::new(&pos, bogus, ONE_PLY, [Move::NONE; 2], [Move::NONE; 2]);
            let got = drain(&mut ms, &pos, &history);
            assert!(!got.contains(&bogus));
            assert_eq!(got.len(), 20);
        }

        #[test]
        fn test_evasions_complete() {
            init();
            let pos = Position::from_fen("rnb1kbnr/pppp1ppp/8/4p3/5PPq/8/PPPPP2P/RNBQKBNR w KQkq - 1 3")
                .unwrap();
            assert!(pos.in_check());
            let history = HistoryStats::new();
            let mut ms = MoveSorter::new(&pos, Move::NONE, ONE_PLY, [Move::NONE; 2], [Move::NONE; 2]);
            let got = drain(&mut ms, &pos, &history);
            let expected: Vec<Move> = MoveList::new::<Evasions>(&pos).iter().collect();
            assert_eq!(sorted(got), sorted(expected));
        }

        #[test]
        fn test_qsearch_captures_then_checks() {
            init();
            let pos = Position::from_fen(KIWIPETE).unwrap();
            let history = HistoryStats::new();

            let mut ms = MoveSorter::new_qsearch(&pos, Move::NONE, Depth::QS_CHECKS, Square::NONE);
            let got = drain(&mut ms, &pos, &history);
            let mut expected: Vec<Move> = MoveList::new::<Captures>(&pos).iter().collect();
            expected.extend(MoveList::new::<QuietChecks>(&pos).iter());
            assert_eq!(sorted(got), sorted(expected));

            let mut ms = MoveSorter::new_qsearch(&pos, Move::NONE, Depth::QS_NO_CHECKS, Square::NONE);
            let got = drain(&mut ms, &pos, &history);
            let expected: Vec<Move> = MoveList::new::<Captures>(&pos).iter().collect();
            assert_eq!(sorted(got), sorted(expected));
        }

        #[test]
        fn test_recaptures_only_target_square() {
            init();
            let pos = Position::from_fen(KIWIPETE).unwrap();
            let history = HistoryStats::new();

            // The hash move is never searched in recapture mode.
            let tt = Move::make(Square::E5, Square::F7);
            let mut ms = MoveSorter::new_qsearch(&pos, tt, Depth::QS_RECAPTURES, Square::E6);
            let got = drain(&mut ms, &pos, &history);
            assert_eq!(got, vec![Move::make(Square::D5, Square::E6)]);

            let mut ms = MoveSorter::new_qsearch(&pos, Move::NONE, Depth::QS_RECAPTURES, Square::H3);
            let got = drain(&mut ms, &pos, &history);
            assert_eq!(
                sorted(got),
                sorted(vec![
                    Move::make(Square::G2, Square::H3),
                    Move::make(Square::F3, Square::H3)
                ])
            );
        }

        #[test]
        fn test_sorter_moves_are_legal_or_filtered() {
            init();
            let pos = Position::from_fen(KIWIPETE).unwrap();
            let history = HistoryStats::new();
            let mut ms = MoveSorter::new(&pos, Move::NONE, ONE_PLY, [Move::NONE; 2], [Move::NONE; 2]);
            let legal = MoveList::new::<Legal>(&pos);
            let got: Vec<Move> = drain(&mut ms, &pos, &history)
                .into_iter()
                .filter(|&m| pos.legal(m))
                .collect();
            assert_eq!(got.len(), legal.len());
        }
    }
}
