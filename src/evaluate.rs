// SPDX-License-Identifier: GPL-3.0-or-later

use crate::bitboard::{
    distance, pawn_attacks_bb, popcount, Bitboard, FILEC_BB, FILED_BB, FILEE_BB, FILEF_BB,
    RANK2_BB, RANK3_BB, RANK4_BB, RANK5_BB, RANK6_BB, RANK7_BB,
};
use crate::material;
use crate::pawns;
use crate::position::Position;
use crate::types::{
    scale_factor::ScaleFactor, BishopValueMg, Black, Color, ColorTrait, PieceType, Score, Value,
    White, BISHOP, BLACK, KING, KNIGHT, PAWN, PHASE_MIDGAME, QUEEN, ROOK, WHITE,
};
use crate::ucioption::OptionsMap;

use std::fmt::Write;

// The evaluator turns a position into a score from the point of view of
// the side to move, together with a margin expressing how uncertain the
// score is. Search treats it as an oracle.
pub trait Evaluator: Send {
    fn evaluate(&mut self, pos: &Position) -> (Value, Value);

    // Reads the evaluation weight options.
    fn configure(&mut self, _options: &OptionsMap) {}

    // Forgets cached state, e.g. on a new game.
    fn clear(&mut self) {}
}

pub const TEMPO: Value = Value(20);

macro_rules! S {
    ($x:expr, $y:expr) => {
        Score::make($x, $y)
    };
}

// A weight in percent, separately for middle game and endgame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Weight {
    mg: i32,
    eg: i32,
}

impl Weight {
    const NORMAL: Weight = Weight { mg: 100, eg: 100 };

    fn apply(self, s: Score) -> Score {
        Score::make(s.mg().0 * self.mg / 100, s.eg().0 * self.eg / 100)
    }
}

#[derive(Debug, Clone, Copy)]
struct Weights {
    mobility: Weight,
    pawn_structure: Weight,
    passed_pawns: Weight,
    space: Weight,
    king_danger_us: Weight,
    king_danger_them: Weight,
}

impl Default for Weights {
    fn default() -> Self {
        Weights {
            mobility: Weight::NORMAL,
            pawn_structure: Weight::NORMAL,
            passed_pawns: Weight::NORMAL,
            space: Weight::NORMAL,
            king_danger_us: Weight::NORMAL,
            king_danger_them: Weight::NORMAL,
        }
    }
}

// Mobility bonus per reachable square, and the square count at which a
// piece is considered to have average mobility.
const MOBILITY: [(Score, i32); 7] = [
    (S!(0, 0), 0),
    (S!(0, 0), 0),
    (S!(9, 8), 4),   // Knight
    (S!(8, 9), 6),   // Bishop
    (S!(4, 10), 7),  // Rook
    (S!(2, 5), 13),  // Queen
    (S!(0, 0), 0),
];

// Weight of an attacker on the enemy king zone, by piece type.
const KING_ATTACK_WEIGHT: [i32; 7] = [0, 0, 2, 2, 3, 5, 0];

const MAX_KING_DANGER: i32 = 500;

// Passed pawn bonus by relative rank.
const PASSED: [Score; 8] = [
    S!(0, 0),
    S!(5, 18),
    S!(12, 23),
    S!(10, 31),
    S!(57, 62),
    S!(163, 167),
    S!(271, 250),
    S!(0, 0),
];

const SPACE_PER_SQUARE: i32 = 2;

struct EvalInfo {
    attacked_by: [[Bitboard; 7]; 2],
    king_zone: [Bitboard; 2],
    king_attackers_count: [i32; 2],
    king_attackers_weight: [i32; 2],
    mobility: [Score; 2],
}

impl EvalInfo {
    fn new() -> EvalInfo {
        EvalInfo {
            attacked_by: [[Bitboard(0); 7]; 2],
            king_zone: [Bitboard(0); 2],
            king_attackers_count: [0; 2],
            king_attackers_weight: [0; 2],
            mobility: [Score::ZERO; 2],
        }
    }
}

// The default evaluator: incremental material and piece-square score,
// material imbalance, pawn structure, mobility, king safety, passed pawns
// and space, blended by game phase.
pub struct Evaluation {
    material: material::Table,
    pawns: pawns::Table,
    weights: Weights,
}

impl Evaluation {
    pub fn new() -> Evaluation {
        Evaluation {
            material: material::Table::new(),
            pawns: pawns::Table::new(),
            weights: Weights::default(),
        }
    }

    // trace() breaks the evaluation down by term, from white's point of
    // view.
    pub fn trace(&mut self, pos: &Position) -> String {
        let (v, margin) = self.evaluate(pos);
        let white_v = if pos.side_to_move() == WHITE { v } else { -v };
        let me = *self.material.probe(pos);

        let mut out = String::new();
        let _ = writeln!(out, "Material + PSQ: {}", fmt_score(pos.psq_score()));
        let _ = writeln!(out, "Imbalance:      {}", fmt_score(me.imbalance()));
        let pe = self.pawns.probe(pos);
        let _ = writeln!(out, "Pawns:          {}", fmt_score(pe.pawns_score()));
        let _ = writeln!(out, "Game phase:     {}", me.game_phase());
        let _ = writeln!(out, "Total (white):  {}", white_v.0);
        let _ = writeln!(out, "Margin:         {}", margin.0);
        out
    }
}

fn fmt_score(s: Score) -> String {
    format!("{:>6} {:>6}", s.mg().0, s.eg().0)
}

impl Default for Evaluation {
    fn default() -> Self {
        Self::new()
    }
}

fn weight(options: &OptionsMap, mg: &str, eg: &str) -> Weight {
    Weight {
        mg: options.spin(mg) as i32,
        eg: options.spin(eg) as i32,
    }
}

impl Evaluator for Evaluation {
    fn configure(&mut self, options: &OptionsMap) {
        self.weights = Weights {
            mobility: weight(options, "Mobility (Middle Game)", "Mobility (Endgame)"),
            pawn_structure: weight(options, "Pawn Structure (Middle Game)", "Pawn Structure (Endgame)"),
            passed_pawns: weight(options, "Passed Pawns (Middle Game)", "Passed Pawns (Endgame)"),
            space: weight(options, "Space", "Space"),
            king_danger_us: weight(options, "Cowardice", "Cowardice"),
            king_danger_them: weight(options, "Aggressiveness", "Aggressiveness"),
        };
    }

    fn clear(&mut self) {
        self.material.clear();
        self.pawns.clear();
    }

    fn evaluate(&mut self, pos: &Position) -> (Value, Value) {
        let me = *self.material.probe(pos);
        let pe = self.pawns.probe(pos);
        let w = self.weights;

        let mut score = pos.psq_score() + me.imbalance() + w.pawn_structure.apply(pe.pawns_score());

        let mut ei = EvalInfo::new();
        init_eval_info::<White>(pos, &mut ei, pe);
        init_eval_info::<Black>(pos, &mut ei, pe);

        for pt in [KNIGHT, BISHOP, ROOK, QUEEN] {
            evaluate_pieces::<White>(pos, &mut ei, pt);
            evaluate_pieces::<Black>(pos, &mut ei, pt);
        }
        score += w.mobility.apply(ei.mobility[WHITE.index()] - ei.mobility[BLACK.index()]);

        // King safety. Danger on the side to move's king is weighted by
        // cowardice, danger on the opponent's king by aggressiveness.
        let us = pos.side_to_move();
        let mut margins = [Value::ZERO; 2];
        for c in [WHITE, BLACK] {
            let shelter = if c == WHITE {
                pe.king_safety::<White>(pos, pos.square(WHITE, KING))
            } else {
                pe.king_safety::<Black>(pos, pos.square(BLACK, KING))
            };
            let danger = king_danger(&ei, c);
            let wt = if c == us { w.king_danger_us } else { w.king_danger_them };
            let s = shelter - wt.apply(S!(danger, danger / 4));
            margins[c.index()] = Value(wt.apply(S!(danger, 0)).mg().0);
            score += if c == WHITE { s } else { -s };
        }

        let passed = evaluate_passed::<White>(pos, &ei, pe) - evaluate_passed::<Black>(pos, &ei, pe);
        score += w.passed_pawns.apply(passed);

        if me.game_phase() > 0 {
            let space = evaluate_space::<White>(pos, &ei) - evaluate_space::<Black>(pos, &ei);
            score += w.space.apply(S!(space * SPACE_PER_SQUARE, 0));
        }

        // Interpolate between middle game and endgame, scaling the endgame
        // part for drawish material.
        let strong = if score.eg() > Value::ZERO { WHITE } else { BLACK };
        let phase = me.game_phase();
        let mut sf = me.scale_factor(strong);

        // Opposite colored bishops are drawish, more so when they are the
        // only pieces left.
        if phase < PHASE_MIDGAME && sf == ScaleFactor::NORMAL && pos.opposite_bishops() {
            sf = if pos.non_pawn_material_c(WHITE) == BishopValueMg
                && pos.non_pawn_material_c(BLACK) == BishopValueMg
            {
                if pos.count(WHITE, PAWN) + pos.count(BLACK, PAWN) <= 1 {
                    ScaleFactor(8)
                } else {
                    ScaleFactor(32)
                }
            } else {
                ScaleFactor(50)
            };
        }
        let eg = score.eg().0 * sf.0 / ScaleFactor::NORMAL.0;
        let v = Value((score.mg().0 * phase + eg * (PHASE_MIDGAME - phase)) / PHASE_MIDGAME);

        let v = if us == WHITE { v } else { -v };
        (v + TEMPO, margins[us.index()])
    }
}

fn init_eval_info<Us: ColorTrait>(pos: &Position, ei: &mut EvalInfo, pe: &pawns::Entry) {
    let us = Us::COLOR;
    let ksq = pos.square(us, KING);
    let idx = us.index();

    ei.attacked_by[idx][KING.index()] = pos.attacks_from(KING, ksq);
    ei.attacked_by[idx][PAWN.index()] = pe.pawn_attacks(us);
    ei.king_zone[idx] = ei.attacked_by[idx][KING.index()] | ksq;
    ei.attacked_by[idx][0] = ei.attacked_by[idx][KING.index()] | ei.attacked_by[idx][PAWN.index()];
}

fn evaluate_pieces<Us: ColorTrait>(pos: &Position, ei: &mut EvalInfo, pt: PieceType) {
    let us = Us::COLOR;
    let them = !us;

    // Squares occupied by our pieces or attacked by enemy pawns do not
    // count for mobility.
    let mobility_area = !(pos.pieces_c(us) | pawn_attacks_bb(them, pos.pieces_cp(them, PAWN)));
    let (bonus, average) = MOBILITY[pt.index()];

    for s in pos.square_list(us, pt) {
        let b = pos.attacks_from(pt, s);
        ei.attacked_by[us.index()][pt.index()] |= b;
        ei.attacked_by[us.index()][0] |= b;

        if b & ei.king_zone[them.index()] != 0 {
            ei.king_attackers_count[us.index()] += 1;
            ei.king_attackers_weight[us.index()] += KING_ATTACK_WEIGHT[pt.index()];
        }

        let mob = popcount(b & mobility_area) as i32;
        ei.mobility[us.index()] += bonus * (mob - average);
    }
}

// king_danger() grows quadratically with the weight of the pieces attacking
// the zone around the king of color c. A lone attacker is ignored.
fn king_danger(ei: &EvalInfo, c: Color) -> i32 {
    let attacker = (!c).index();
    if ei.king_attackers_count[attacker] < 2 {
        return 0;
    }
    let units = ei.king_attackers_weight[attacker] * ei.king_attackers_count[attacker];
    std::cmp::min(units * units / 4, MAX_KING_DANGER)
}

fn evaluate_passed<Us: ColorTrait>(pos: &Position, ei: &EvalInfo, pe: &pawns::Entry) -> Score {
    let us = Us::COLOR;
    let them = !us;
    let up = crate::types::direction::pawn_push(us);
    let mut score = Score::ZERO;

    for s in pe.passed_pawns(us) {
        let r = s.relative_rank(us) as usize;
        let mut bonus = PASSED[r];

        let block_sq = s + up;
        if r > 2 && block_sq.is_ok() {
            let rr = (r * (r - 1)) as i32;
            // King proximity matters in the endgame.
            let their_dist = distance(pos.square(them, KING), block_sq) as i32;
            let our_dist = distance(pos.square(us, KING), block_sq) as i32;
            bonus += S!(0, (their_dist * 5 - our_dist * 2) * rr);

            // Blocked or contested path halves the bonus.
            if !pos.empty(block_sq) || ei.attacked_by[them.index()][0] & block_sq != 0 {
                bonus = Score::make(bonus.mg().0 / 2, bonus.eg().0 / 2);
            }
        }

        score += bonus;
    }

    score
}

// evaluate_space() counts the safe squares for minor pieces on the four
// central files in our half of the board, doubling those behind our pawns.
fn evaluate_space<Us: ColorTrait>(pos: &Position, ei: &EvalInfo) -> i32 {
    let us = Us::COLOR;
    let them = !us;

    let space_mask = (FILEC_BB | FILED_BB | FILEE_BB | FILEF_BB)
        & if us == WHITE {
            RANK2_BB | RANK3_BB | RANK4_BB
        } else {
            RANK7_BB | RANK6_BB | RANK5_BB
        };

    let safe = space_mask
        & !pos.pieces_cp(us, PAWN)
        & !ei.attacked_by[them.index()][PAWN.index()];

    let our_pawns = pos.pieces_cp(us, PAWN);
    let mut behind = our_pawns;
    for _ in 0..3 {
        behind |= if us == WHITE { behind >> 8 } else { behind << 8 };
    }

    let weight = popcount(pos.pieces_cpp(us, KNIGHT, BISHOP)) as i32;
    (popcount(safe) + popcount(behind & safe)) as i32 * weight / 4
}

#[cfg(test)]
mod tests {
    use super::*;

    const POSITIONS: [&str; 6] = [
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
        "r2q1rk1/pP1p2pp/Q4n2/bbp1p3/Np6/1B3NBn/pPPP1PPP/R3K2R b KQ - 0 1",
        "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8",
        "r4rk1/1pp1qppp/p1np1n2/2b1p1B1/2B1P1b1/P1NP1N2/1PP1QPPP/R4RK1 w - - 0 10",
        "4k3/1p3pp1/p7/3P4/2P5/8/5PPP/4K3 b - - 0 30",
    ];

    fn init() {
        crate::init();
    }

    #[test]
    fn test_start_position_is_tempo() {
        init();
        let mut eval = Evaluation::new();
        let (v, margin) = eval.evaluate(&Position::new());
        assert_eq!(v, TEMPO);
        assert_eq!(margin, Value::ZERO);
    }

    #[test]
    fn test_mirror_symmetry() {
        init();
        let mut eval = Evaluation::new();
        for fen in POSITIONS {
            let mut pos = Position::from_fen(fen).unwrap();
            if pos.in_check() {
                continue;
            }
            let psq = pos.psq_score();
            let (v, margin) = eval.evaluate(&pos);
            pos.flip();
            assert_eq!(pos.psq_score(), -psq, "{}", fen);
            assert_eq!(eval.evaluate(&pos), (v, margin), "{}", fen);
        }
    }

    #[test]
    fn test_extra_queen_is_winning() {
        init();
        let mut eval = Evaluation::new();
        let pos = Position::from_fen("4k3/pppppppp/8/8/8/8/PPPPPPPP/3QK3 w - - 0 1").unwrap();
        assert!(eval.evaluate(&pos).0 > Value(1500));
        let pos = Position::from_fen("4k3/pppppppp/8/8/8/8/PPPPPPPP/3QK3 b - - 0 1").unwrap();
        assert!(eval.evaluate(&pos).0 < Value(-1500));
    }

    #[test]
    fn test_weights_change_the_score() {
        init();
        // A centralized queen against a bare king: only mobility separates
        // the two weightings.
        let pos = Position::from_fen("4k3/8/8/8/3Q4/8/8/4K3 w - - 0 1").unwrap();
        let mut eval = Evaluation::new();
        let normal = eval.evaluate(&pos).0;

        let mut options = OptionsMap::new();
        options.set("Mobility (Middle Game)", "0").unwrap();
        options.set("Mobility (Endgame)", "0").unwrap();
        eval.configure(&options);
        assert!(eval.evaluate(&pos).0 < normal);

        eval.configure(&OptionsMap::new());
        assert_eq!(eval.evaluate(&pos).0, normal);
    }

    #[test]
    fn test_drawish_material_scales_down() {
        init();
        let mut eval = Evaluation::new();
        let pos = Position::from_fen("8/8/4k3/8/8/3NK3/8/8 w - - 0 1").unwrap();
        let (v, _) = eval.evaluate(&pos);
        assert!(v.abs() < Value(200));
    }

    #[test]
    fn test_opposite_bishops_scale_down() {
        init();
        let mut eval = Evaluation::new();
        let same = Position::from_fen("4k3/8/8/3b4/8/8/2PPP3/4KB2 w - - 0 1").unwrap();
        let opposite = Position::from_fen("4k3/8/8/4b3/8/8/2PPP3/4KB2 w - - 0 1").unwrap();
        assert!(!same.opposite_bishops());
        assert!(opposite.opposite_bishops());
        assert!(eval.evaluate(&opposite).0 < eval.evaluate(&same).0);
    }
}
