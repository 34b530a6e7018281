// SPDX-License-Identifier: GPL-3.0-or-later

use crate::bitboard::{attacks_bb, between_bb, pawn_attacks};
use crate::book::Book;
use crate::error::TtError;
use crate::evaluate::{Evaluation, Evaluator};
use crate::movegen::{Legal, MoveList};
use crate::movepick::{GainStats, HistoryStats, MoveSorter, RefutationStats};
use crate::position::Position;
use crate::threads::{Signals, Timer};
use crate::timeman::TimeManager;
use crate::tt::{TTEntry, TranspositionTable};
use crate::types::{
    bound::Bound,
    depth::{Depth, ONE_PLY},
    mate_in, mated_in, piece_value, Bool, False, Move, True, Value, BISHOP, CASTLING, EG, ENPASSANT,
    KING, MAX_PLY, MG, NORMAL, NO_PIECE, PAWN, PROMOTION, QUEEN, ROOK,
    PawnValueEg, PawnValueMg, RookValueMg,
};
use crate::uci;
use crate::ucioption::OptionsMap;

use log::{debug, info};
use once_cell::sync::Lazy;
use std::sync::Arc;
use std::time::Instant;

// Index of the root frame in the search stack. The frames below it let
// the root look back at "previous moves" that do not exist.
const ROOT_SS: usize = 2;
const STACK_SIZE: usize = MAX_PLY as usize + 10;

// Dynamic razoring margin based on depth
fn razor_margin(d: Depth) -> Value {
    Value(512 + 16 * d.0)
}

const RAZOR_DEPTH: Depth = Depth(4 * ONE_PLY.0);
const THREAT_DEPTH: Depth = Depth(5 * ONE_PLY.0);
const FUTILITY_MARGIN_QS: Value = Value(128);

// Minimum depth for internal iterative deepening and singular extension,
// indexed by PV node.
const IID_DEPTH: [Depth; 2] = [Depth(8 * ONE_PLY.0), Depth(5 * ONE_PLY.0)];
const IID_MARGIN: Value = Value(256);
const SINGULAR_DEPTH: [Depth; 2] = [Depth(8 * ONE_PLY.0), Depth(6 * ONE_PLY.0)];

struct SearchTables {
    // [pv][depth in plies][move count], in Depth units
    reductions: [[[i32; 64]; 64]; 2],
    // [depth in half plies][move count]
    futility_margins: [[i32; 64]; 16],
    // [depth in half plies]
    futility_move_counts: [i32; 32],
}

static TABLES: Lazy<SearchTables> = Lazy::new(|| {
    let mut t = SearchTables {
        reductions: [[[0; 64]; 64]; 2],
        futility_margins: [[0; 64]; 16],
        futility_move_counts: [0; 32],
    };

    for hd in 1..64 {
        for mc in 1..64 {
            let x = (hd as f64).ln() * (mc as f64).ln();
            let pv_red = x / 3.0;
            let non_pv_red = x / 2.0;
            t.reductions[1][hd][mc] = if pv_red >= 1.0 {
                (pv_red * f64::from(ONE_PLY.0)).floor() as i32
            } else {
                0
            };
            t.reductions[0][hd][mc] = if non_pv_red >= 1.0 {
                (non_pv_red * f64::from(ONE_PLY.0)).floor() as i32
            } else {
                0
            };
        }
    }

    for d in 1..16 {
        for mc in 0..64 {
            let lg = (f64::from(d * d) / 2.0).log2() + 1.001;
            t.futility_margins[d as usize][mc] = 112 * lg as i32 - 8 * mc as i32 + 45;
        }
    }

    for d in 0..32 {
        t.futility_move_counts[d] = (3.001 + 0.3 * (d as f64).powf(1.8)) as i32;
    }

    t
});

fn futility_margin(d: Depth, mc: i32) -> Value {
    if d < 7 * ONE_PLY {
        Value(TABLES.futility_margins[std::cmp::max(d.0, 1) as usize][std::cmp::min(mc, 63) as usize])
    } else {
        2 * Value::INFINITE
    }
}

fn futility_move_count(d: Depth) -> i32 {
    if d < 16 * ONE_PLY {
        TABLES.futility_move_counts[std::cmp::max(d.0, 0) as usize]
    } else {
        MAX_MOVES_I32
    }
}

const MAX_MOVES_I32: i32 = crate::types::MAX_MOVES as i32;

fn reduction(pv: bool, d: Depth, mc: i32) -> Depth {
    Depth(
        TABLES.reductions[usize::from(pv)][std::cmp::min(d / ONE_PLY, 63) as usize]
            [std::cmp::min(mc, 63) as usize],
    )
}

pub fn init() {
    Lazy::force(&TABLES);
}

// Node roles, resolved at compile time.
pub trait NodeType {
    const PV: bool;
    const ROOT: bool;
}

pub struct Root;
pub struct Pv;
pub struct NonPv;

impl NodeType for Root {
    const PV: bool = true;
    const ROOT: bool = true;
}

impl NodeType for Pv {
    const PV: bool = true;
    const ROOT: bool = false;
}

impl NodeType for NonPv {
    const PV: bool = false;
    const ROOT: bool = false;
}

// LimitsType carries what the GUI sent with "go".
#[derive(Debug, Clone)]
pub struct LimitsType {
    pub searchmoves: Vec<Move>,
    pub time: [i64; 2],
    pub inc: [i64; 2],
    pub movestogo: i32,
    pub depth: i32,
    pub nodes: u64,
    pub movetime: i64,
    pub mate: i32,
    pub infinite: bool,
    pub ponder: bool,
    pub start_time: Instant,
}

impl LimitsType {
    pub fn new() -> LimitsType {
        LimitsType {
            searchmoves: Vec::new(),
            time: [0; 2],
            inc: [0; 2],
            movestogo: 0,
            depth: 0,
            nodes: 0,
            movetime: 0,
            mate: 0,
            infinite: false,
            ponder: false,
            start_time: Instant::now(),
        }
    }

    pub fn use_time_management(&self) -> bool {
        self.mate == 0 && self.movetime == 0 && self.depth == 0 && self.nodes == 0 && !self.infinite
    }
}

impl Default for LimitsType {
    fn default() -> Self {
        Self::new()
    }
}

// A root move with its score and principal variation. pv[0] is the move
// itself.
#[derive(Debug, Clone)]
pub struct RootMove {
    pub score: Value,
    pub prev_score: Value,
    pub pv: Vec<Move>,
}

impl RootMove {
    pub fn new(m: Move) -> RootMove {
        RootMove {
            score: -Value::INFINITE,
            prev_score: -Value::INFINITE,
            pv: vec![m],
        }
    }
}

// One frame of the search stack, indexed by distance from the root.
#[derive(Debug, Clone)]
pub struct Stack {
    pub ply: i32,
    pub current_move: Move,
    pub excluded_move: Move,
    pub killers: [Move; 2],
    pub static_eval: Value,
    pub eval_margin: Value,
    pub reduction: Depth,
    pub skip_null_move: bool,
    pub threat_move: Move,
    pub pv: Vec<Move>,
}

impl Stack {
    fn new() -> Stack {
        Stack {
            ply: 0,
            current_move: Move::NONE,
            excluded_move: Move::NONE,
            killers: [Move::NONE; 2],
            static_eval: Value::NONE,
            eval_margin: Value::NONE,
            reduction: Depth::ZERO,
            skip_null_move: false,
            threat_move: Move::NONE,
            pv: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchResult {
    pub best_move: Move,
    pub ponder_move: Move,
    pub score: Value,
    pub depth: i32,
    pub nodes: u64,
}

// Everything a search reads and writes, owned by the thread running it.
pub struct SearchContext {
    pub tt: TranspositionTable,
    pub history: HistoryStats,
    pub gains: GainStats,
    pub refutations: RefutationStats,
    pub evaluator: Box<dyn Evaluator>,
    pub book: Option<Box<dyn Book>>,
    pub options: OptionsMap,
    pub signals: Arc<Signals>,
    pub timer: Option<Timer>,
    pub limits: LimitsType,
    pub time: TimeManager,
    pub root_moves: Vec<RootMove>,
    stack: Vec<Stack>,
    nodes: u64,
    sel_depth: i32,
    best_move_changes: i32,
    draw_value: [Value; 2],
    silent: bool,
}

impl SearchContext {
    pub fn new(options: OptionsMap) -> Result<SearchContext, TtError> {
        let mb = options.spin("Hash") as usize;
        let mut evaluator = Evaluation::new();
        evaluator.configure(&options);

        Ok(SearchContext {
            tt: TranspositionTable::new(mb)?,
            history: HistoryStats::new(),
            gains: GainStats::new(),
            refutations: RefutationStats::new(),
            evaluator: Box::new(evaluator),
            book: None,
            options,
            signals: Arc::new(Signals::new()),
            timer: None,
            limits: LimitsType::new(),
            time: TimeManager::new(),
            root_moves: Vec::new(),
            stack: vec![Stack::new(); STACK_SIZE],
            nodes: 0,
            sel_depth: 0,
            best_move_changes: 0,
            draw_value: [Value::DRAW; 2],
            silent: false,
        })
    }

    // Suppresses the "info" lines, e.g. while benchmarking.
    pub fn set_silent(&mut self, silent: bool) {
        self.silent = silent;
    }

    pub fn nodes(&self) -> u64 {
        self.nodes
    }

    // clear() forgets everything learned from earlier searches.
    pub fn clear(&mut self) {
        self.tt.clear();
        self.history.clear();
        self.gains.clear();
        self.refutations.clear();
        self.evaluator.clear();
    }

    fn count_node(&mut self) {
        self.nodes += 1;
        if self.nodes & 4095 == 0 && self.limits.nodes != 0 && self.nodes >= self.limits.nodes {
            self.signals.raise_stop();
        }
    }
}

// value_to_tt() adjusts a mate score from "plies to mate from the root" to
// "plies to mate from the current position". Non-mate scores are unchanged.
pub fn value_to_tt(v: Value, ply: i32) -> Value {
    if v >= Value::MATE_IN_MAX_PLY {
        v + ply
    } else if v <= Value::MATED_IN_MAX_PLY {
        v - ply
    } else {
        v
    }
}

// value_from_tt() is the inverse of value_to_tt().
pub fn value_from_tt(v: Value, ply: i32) -> Value {
    if v == Value::NONE {
        Value::NONE
    } else if v >= Value::MATE_IN_MAX_PLY {
        v - ply
    } else if v <= Value::MATED_IN_MAX_PLY {
        v + ply
    } else {
        v
    }
}

// ok_to_use_tt() tells whether a stored result is good enough to cut off
// the search of a non-PV node: deep enough (or a proven mate) and with a
// bound on the right side of beta.
pub fn ok_to_use_tt(tte: &TTEntry, depth: Depth, beta: Value, ply: i32) -> bool {
    let v = value_from_tt(tte.value(), ply);

    (tte.depth() >= depth
        || v >= std::cmp::max(Value::MATE_IN_MAX_PLY, beta)
        || v < std::cmp::min(Value::MATED_IN_MAX_PLY, beta))
        && ((tte.bound() & Bound::LOWER != 0 && v >= beta)
            || (tte.bound() & Bound::UPPER != 0 && v < beta))
}

// refine_eval() uses the stored bound to improve on the static evaluation.
fn refine_eval(tte: &TTEntry, default_eval: Value, ply: i32) -> Value {
    let v = value_from_tt(tte.value(), ply);

    if (tte.bound() & Bound::LOWER != 0 && v >= default_eval)
        || (tte.bound() & Bound::UPPER != 0 && v < default_eval)
    {
        v
    } else {
        default_eval
    }
}

// connected_moves() tests whether two moves are connected in the sense
// that the first move somehow made the second move possible. The first
// move is assumed to be the move that was made to reach the current
// position, the second the threat found by the null move search.
fn connected_moves(pos: &Position, m1: Move, m2: Move) -> bool {
    if !m1.is_ok() || !m2.is_ok() {
        return false;
    }

    let (f1, t1, f2, t2) = (m1.from(), m1.to(), m2.from(), m2.to());

    // Case 1: The moving piece is the same in both moves
    if f2 == t1 {
        return true;
    }

    // Case 2: The destination square for m2 was vacated by m1
    if t2 == f1 {
        return true;
    }

    // Case 3: Moving through the vacated square
    let p2 = pos.piece_on(f2).piece_type();
    if (p2 == BISHOP || p2 == ROOK || p2 == QUEEN) && between_bb(f2, t2) & f1 != 0 {
        return true;
    }

    // Case 4: The destination square for m2 is defended by the moving piece
    // in m1
    let p1 = pos.piece_on(t1);
    let defended = if p1.piece_type() == PAWN {
        pawn_attacks(p1.color(), t1)
    } else if p1.piece_type() == KING {
        pos.attacks_from(KING, t1)
    } else {
        attacks_bb(p1.piece_type(), t1, pos.pieces())
    };
    defended & t2 != 0
}

// refutes_threat() tells whether move m defends against the threat found
// by a failed null move search. Such moves are not pruned.
fn refutes_threat(pos: &Position, m: Move, threat: Move) -> bool {
    let (mfrom, mto, tfrom, tto) = (m.from(), m.to(), threat.from(), threat.to());

    // Case 1: Don't prune moves which move the threatened piece
    if mfrom == tto {
        return true;
    }

    // Case 2: If the threatened piece has value less than or equal to the
    // value of the threat piece, don't prune moves which defend it.
    if pos.capture(threat)
        && (piece_value(MG, pos.piece_on(tfrom)) >= piece_value(MG, pos.piece_on(tto))
            || pos.piece_on(tfrom).piece_type() == KING)
    {
        let pc = pos.moved_piece(m);
        let occ = pos.pieces() ^ mfrom;
        let defends = match pc.piece_type() {
            PAWN => pawn_attacks(pc.color(), mto),
            KING => pos.attacks_from(KING, mto),
            pt => attacks_bb(pt, mto, occ),
        };
        if defends & tto != 0 {
            return true;
        }
    }

    // Case 3: If the moving piece in the threatened move is a slider, don't
    // prune safe moves which block its ray.
    let tpt = pos.piece_on(tfrom).piece_type();
    (tpt == BISHOP || tpt == ROOK || tpt == QUEEN)
        && between_bb(tfrom, tto) & mto != 0
        && pos.see_ge(m, Value::ZERO)
}

fn update_pv(ctx: &mut SearchContext, ss: usize, m: Move) {
    let child = std::mem::take(&mut ctx.stack[ss + 1].pv);
    let pv = &mut ctx.stack[ss].pv;
    pv.clear();
    pv.push(m);
    pv.extend_from_slice(&child);
    ctx.stack[ss + 1].pv = child;
}

// update_stats() rewards the quiet move that caused a cutoff and penalizes
// the quiet moves tried before it.
fn update_stats(
    ctx: &mut SearchContext,
    pos: &Position,
    ss: usize,
    best_move: Move,
    depth: Depth,
    quiets: &[Move],
) {
    let killers = &mut ctx.stack[ss].killers;
    if killers[0] != best_move {
        killers[1] = killers[0];
        killers[0] = best_move;
    }

    let bonus = depth.0 * depth.0;
    ctx.history.update(pos.moved_piece(best_move), best_move.to(), bonus);
    for &m in quiets.iter().filter(|&&m| m != best_move) {
        ctx.history.update(pos.moved_piece(m), m.to(), -bonus);
    }

    let prev = ctx.stack[ss - 1].current_move;
    if prev.is_ok() {
        let to = prev.to();
        ctx.refutations.update(pos.piece_on(to), to, best_move);
    }
}

// search<>() is the main search function for both PV and non-PV nodes and
// for the root.
fn search<NT: NodeType>(
    ctx: &mut SearchContext,
    pos: &mut Position,
    ss: usize,
    mut alpha: Value,
    mut beta: Value,
    depth: Depth,
) -> Value {
    let pv_node = NT::PV;
    let root_node = NT::ROOT;

    debug_assert!(alpha >= -Value::INFINITE && alpha < beta && beta <= Value::INFINITE);
    debug_assert!(pv_node || alpha == beta - 1);
    debug_assert!(depth > Depth::ZERO);

    // Step 1. Initialize node
    let in_check = pos.in_check();
    let us = pos.side_to_move();
    let ply = (ss - ROOT_SS) as i32;
    let mut best_move = Move::NONE;
    let mut threat_move = Move::NONE;

    ctx.count_node();
    ctx.stack[ss].ply = ply;
    ctx.stack[ss].current_move = Move::NONE;
    ctx.stack[ss].threat_move = Move::NONE;
    ctx.stack[ss].reduction = Depth::ZERO;
    ctx.stack[ss + 1].excluded_move = Move::NONE;
    ctx.stack[ss + 1].skip_null_move = false;
    ctx.stack[ss + 2].killers = [Move::NONE; 2];
    if pv_node {
        ctx.stack[ss].pv.clear();
        ctx.sel_depth = std::cmp::max(ctx.sel_depth, ply);
    }

    if !root_node {
        // Step 2. Check for aborted search and immediate draw
        if ctx.signals.stop() || pos.is_draw(ply) || ply > MAX_PLY {
            return ctx.draw_value[us.index()];
        }

        // Step 3. Mate distance pruning. Even if we mate at the next move
        // our score would be at best mate_in(ply + 1), but if alpha is
        // already bigger because a shorter mate was found upward in the
        // tree then there is no need to search further.
        alpha = std::cmp::max(mated_in(ply), alpha);
        beta = std::cmp::min(mate_in(ply + 1), beta);
        if alpha >= beta {
            return alpha;
        }
    }

    let old_alpha = alpha;

    // Step 4. Transposition table lookup. We don't want the score of a
    // partial search to overwrite a previous full search TT value, so we
    // use a different position key in case of an excluded move.
    let excluded_move = ctx.stack[ss].excluded_move;
    let pos_key = if excluded_move != Move::NONE {
        pos.exclusion_key()
    } else {
        pos.key()
    };

    let tte = ctx.tt.probe(pos_key);
    let mut tt_move = if root_node {
        ctx.root_moves[0].pv[0]
    } else {
        tte.map_or(Move::NONE, |e| e.mv())
    };

    // At PV nodes we check for exact scores, while at non-PV nodes we check
    // for a fail high/low. Biggest advantage at probing at PV nodes is to
    // have a smooth experience in analysis mode.
    if !root_node {
        if let Some(e) = tte {
            let usable = if pv_node {
                e.depth() >= depth && e.bound() == Bound::EXACT
            } else {
                ok_to_use_tt(&e, depth, beta, ply)
            };

            if usable {
                let tt_value = value_from_tt(e.value(), ply);
                ctx.tt.refresh(pos_key);
                ctx.stack[ss].current_move = tt_move;

                if tt_value >= beta
                    && tt_move != Move::NONE
                    && pos.pseudo_legal(tt_move)
                    && !pos.capture_or_promotion(tt_move)
                    && tt_move != ctx.stack[ss].killers[0]
                {
                    ctx.stack[ss].killers[1] = ctx.stack[ss].killers[0];
                    ctx.stack[ss].killers[0] = tt_move;
                }
                return tt_value;
            }
        }
    }

    // Step 5. Evaluate the position statically and update parent's gain
    // statistics
    let refined_value;
    if in_check {
        ctx.stack[ss].static_eval = Value::NONE;
        ctx.stack[ss].eval_margin = Value::NONE;
        refined_value = Value::NONE;
    } else if let Some(e) = tte.filter(|e| e.static_value() != Value::NONE) {
        ctx.stack[ss].static_eval = e.static_value();
        ctx.stack[ss].eval_margin = e.static_margin();
        refined_value = refine_eval(&e, e.static_value(), ply);
    } else {
        let (v, margin) = ctx.evaluator.evaluate(pos);
        ctx.stack[ss].static_eval = v;
        ctx.stack[ss].eval_margin = margin;
        refined_value = v;
        ctx.tt.store(pos_key, Value::NONE, Bound::NONE, Depth::NONE, Move::NONE, v, margin);
    }

    // Update gain for the parent non-capture move given the static position
    // evaluation before and after the move.
    let prev_move = ctx.stack[ss - 1].current_move;
    if prev_move.is_ok()
        && prev_move.move_type() == NORMAL
        && pos.captured_piece() == NO_PIECE
        && ctx.stack[ss - 1].static_eval != Value::NONE
        && ctx.stack[ss].static_eval != Value::NONE
    {
        let to = prev_move.to();
        let gain = -(ctx.stack[ss - 1].static_eval + ctx.stack[ss].static_eval);
        ctx.gains.update(pos.piece_on(to), to, gain);
    }

    // Step 6. Razoring (is omitted in PV nodes)
    if !pv_node
        && depth < RAZOR_DEPTH
        && !in_check
        && refined_value + razor_margin(depth) < beta
        && tt_move == Move::NONE
        && beta.abs() < Value::MATE_IN_MAX_PLY
        && !pos.pawn_on_7th(us)
    {
        let rbeta = beta - razor_margin(depth);
        let v = qsearch::<NonPv, False>(ctx, pos, ss, rbeta - 1, rbeta, Depth::ZERO);
        if v < rbeta {
            // Logically we should return (v + razor_margin(depth)), but
            // surprisingly this did slightly weaker in tests.
            return v;
        }
    }

    // Step 7. Static null move pruning (is omitted in PV nodes). We're
    // betting that the opponent doesn't have a move that will reduce the
    // score by more than futility_margin(depth) if we do a null move.
    if !pv_node
        && !ctx.stack[ss].skip_null_move
        && depth < RAZOR_DEPTH
        && !in_check
        && refined_value - futility_margin(depth, 0) >= beta
        && beta.abs() < Value::MATE_IN_MAX_PLY
        && pos.non_pawn_material_c(us) != Value::ZERO
    {
        return refined_value - futility_margin(depth, 0);
    }

    // Step 8. Null move search with verification search (is omitted in PV
    // nodes)
    if !pv_node
        && !ctx.stack[ss].skip_null_move
        && depth > ONE_PLY
        && !in_check
        && refined_value >= beta
        && beta.abs() < Value::MATE_IN_MAX_PLY
        && pos.non_pawn_material_c(us) != Value::ZERO
    {
        ctx.stack[ss].current_move = Move::NULL;

        // Null move dynamic reduction based on depth
        let mut r = 3 * ONE_PLY + depth / 4;

        // Null move dynamic reduction based on value
        if refined_value - PawnValueMg > beta {
            r += ONE_PLY;
        }

        pos.do_null_move();
        ctx.stack[ss + 1].skip_null_move = true;
        let null_value = if depth - r < ONE_PLY {
            -qsearch::<NonPv, False>(ctx, pos, ss + 1, -beta, -alpha, Depth::ZERO)
        } else {
            -search::<NonPv>(ctx, pos, ss + 1, -beta, -alpha, depth - r)
        };
        ctx.stack[ss + 1].skip_null_move = false;
        pos.undo_null_move();

        if null_value >= beta {
            // Do not return unproven mate scores
            let null_value = if null_value >= Value::MATE_IN_MAX_PLY {
                beta
            } else {
                null_value
            };

            if depth < 6 * ONE_PLY {
                return null_value;
            }

            // Do verification search at high depths
            ctx.stack[ss].skip_null_move = true;
            let v = search::<NonPv>(ctx, pos, ss, alpha, beta, depth - r);
            ctx.stack[ss].skip_null_move = false;

            if v >= beta {
                return null_value;
            }
        } else {
            // The null move failed low, which means that we may be faced
            // with some kind of threat. If the previous move was reduced,
            // check if the move that refuted the null move was somehow
            // connected to the move which was reduced. If a connection is
            // found, return a fail low score (which will cause the reduced
            // move to fail high in the parent node, which will trigger a
            // re-search with full depth).
            threat_move = ctx.stack[ss + 1].current_move;
            ctx.stack[ss].threat_move = threat_move;

            if depth < THREAT_DEPTH
                && ctx.stack[ss - 1].reduction != Depth::ZERO
                && threat_move != Move::NONE
                && connected_moves(pos, ctx.stack[ss - 1].current_move, threat_move)
            {
                return beta - 1;
            }
        }
    }

    // Step 9. Internal iterative deepening
    if tt_move == Move::NONE
        && depth >= IID_DEPTH[usize::from(pv_node)]
        && (pv_node || (!in_check && ctx.stack[ss].static_eval + IID_MARGIN >= beta))
    {
        let d = if pv_node {
            depth - 2 * ONE_PLY
        } else {
            depth / 2
        };

        ctx.stack[ss].skip_null_move = true;
        if pv_node {
            search::<Pv>(ctx, pos, ss, alpha, beta, d);
        } else {
            search::<NonPv>(ctx, pos, ss, alpha, beta, d);
        }
        ctx.stack[ss].skip_null_move = false;

        tt_move = ctx.tt.probe(pos_key).map_or(Move::NONE, |e| e.mv());
    }

    // Step 10. Loop through moves. Loop through all pseudo-legal moves
    // until no moves remain or a beta cutoff occurs.
    let futility_base = ctx.stack[ss].static_eval + ctx.stack[ss].eval_margin;
    let singular_extension_node = !root_node
        && depth >= SINGULAR_DEPTH[usize::from(pv_node)]
        && tt_move != Move::NONE
        && excluded_move == Move::NONE
        && tte.map_or(false, |e| {
            e.bound() & Bound::LOWER != 0 && e.depth() >= depth - 3 * ONE_PLY
        });

    let refutations = if prev_move.is_ok() {
        let to = prev_move.to();
        ctx.refutations.get(pos.piece_on(to), to)
    } else {
        [Move::NONE; 2]
    };
    let killers = ctx.stack[ss].killers;
    let mut mp = MoveSorter::new(pos, tt_move, depth, killers, refutations);

    let mut best_value = -Value::INFINITE;
    let mut move_count = 0;
    let mut quiets = [Move::NONE; 64];
    let mut quiet_count = 0;

    loop {
        let m = mp.next_move(pos, &ctx.history);
        if m == Move::NONE {
            break;
        }

        if m == excluded_move {
            continue;
        }

        // At root obey the "searchmoves" option and skip moves not listed
        // in the root move list. Root moves are legal by construction.
        if root_node {
            if !ctx.root_moves.iter().any(|rm| rm.pv[0] == m) {
                continue;
            }
        } else if !pos.legal(m) {
            continue;
        }

        move_count += 1;

        if root_node && !ctx.silent && ctx.time.elapsed() > 2000 {
            println!(
                "info depth {} currmove {} currmovenumber {}",
                depth / ONE_PLY,
                uci::move_str(m),
                move_count
            );
        }

        let is_pv_move = pv_node && move_count == 1;
        let capture_or_promotion = pos.capture_or_promotion(m);
        let gives_check = pos.gives_check(m);
        let passed_pawn_push = pos.passed_pawn_push(m);
        let dangerous = gives_check || passed_pawn_push || m.move_type() == CASTLING;

        // Step 11. Decide the new search depth
        let mut ext = Depth::ZERO;
        if gives_check && pos.see_ge(m, Value::ZERO) {
            ext = if pv_node { ONE_PLY } else { ONE_PLY / 2 };
        } else if passed_pawn_push {
            ext = if pv_node { ONE_PLY } else { ONE_PLY / 2 };
        } else if pv_node && m.move_type() == CASTLING {
            ext = ONE_PLY / 2;
        }

        // Singular extension search. If all moves but one fail low on a
        // search of (alpha-s, beta-s), and just one fails high on (alpha,
        // beta), then that move is singular and should be extended. To
        // verify this we do a reduced search on all the other moves but the
        // tt_move, if result is lower than tt_value minus a margin then we
        // extend tt_move.
        if singular_extension_node && m == tt_move && ext < ONE_PLY {
            if let Some(e) = tte {
                let tt_value = value_from_tt(e.value(), ply);

                if tt_value.abs() < Value::KNOWN_WIN {
                    let rbeta = tt_value - depth.0;
                    ctx.stack[ss].excluded_move = m;
                    ctx.stack[ss].skip_null_move = true;
                    let v = search::<NonPv>(ctx, pos, ss, rbeta - 1, rbeta, depth / 2);
                    ctx.stack[ss].skip_null_move = false;
                    ctx.stack[ss].excluded_move = Move::NONE;

                    if v < rbeta {
                        ext = ONE_PLY;
                    }
                }
            }
        }

        let new_depth = depth - ONE_PLY + ext;

        // Step 12. Futility pruning (is omitted in PV nodes)
        if !pv_node
            && !capture_or_promotion
            && !in_check
            && !dangerous
            && m != tt_move
            && best_value > Value::MATED_IN_MAX_PLY
        {
            // Move count based pruning
            if depth < 16 * ONE_PLY
                && move_count >= futility_move_count(depth)
                && (threat_move == Move::NONE || !refutes_threat(pos, m, threat_move))
            {
                continue;
            }

            // Value based pruning. We use 'predicted_depth' that is the
            // depth the move will be searched at after reductions.
            let predicted_depth = new_depth - reduction(false, depth, move_count);
            let futility_value = futility_base
                + futility_margin(predicted_depth, move_count)
                + ctx.gains.get(pos.moved_piece(m), m.to());

            if futility_value < beta {
                best_value = std::cmp::max(best_value, futility_value);
                continue;
            }

            // Prune moves with negative SEE at low depths
            if predicted_depth < 2 * ONE_PLY && !pos.see_ge(m, Value::ZERO) {
                continue;
            }
        }

        // Step 13. Make the move
        ctx.stack[ss].current_move = m;
        if !capture_or_promotion && quiet_count < quiets.len() {
            quiets[quiet_count] = m;
            quiet_count += 1;
        }
        if pv_node {
            ctx.stack[ss + 1].pv.clear();
        }

        pos.do_move(m, gives_check);

        // Step 14. Reduced depth search (LMR). If the move fails high will
        // be re-searched at full depth.
        let mut value = -Value::INFINITE;
        let full_depth_search;
        if depth > 3 * ONE_PLY
            && !is_pv_move
            && !capture_or_promotion
            && !dangerous
            && m != tt_move
            && m != killers[0]
            && m != killers[1]
        {
            let r = reduction(pv_node, depth, move_count);
            ctx.stack[ss].reduction = r;
            let d = std::cmp::max(new_depth - r, ONE_PLY);
            value = -search::<NonPv>(ctx, pos, ss + 1, -(alpha + 1), -alpha, d);
            full_depth_search = value > alpha && r != Depth::ZERO;
            ctx.stack[ss].reduction = Depth::ZERO;
        } else {
            full_depth_search = !is_pv_move;
        }

        // Step 15. Full depth search, when LMR is skipped or fails high
        if full_depth_search {
            value = if new_depth < ONE_PLY {
                if gives_check {
                    -qsearch::<NonPv, True>(ctx, pos, ss + 1, -(alpha + 1), -alpha, Depth::ZERO)
                } else {
                    -qsearch::<NonPv, False>(ctx, pos, ss + 1, -(alpha + 1), -alpha, Depth::ZERO)
                }
            } else {
                -search::<NonPv>(ctx, pos, ss + 1, -(alpha + 1), -alpha, new_depth)
            };
        }

        // For PV nodes only, do a full PV search on the first move or after
        // a fail high, otherwise let the parent node fail low with value <=
        // alpha and try another move.
        if pv_node && (is_pv_move || (value > alpha && (root_node || value < beta))) {
            value = if new_depth < ONE_PLY {
                if gives_check {
                    -qsearch::<Pv, True>(ctx, pos, ss + 1, -beta, -alpha, Depth::ZERO)
                } else {
                    -qsearch::<Pv, False>(ctx, pos, ss + 1, -beta, -alpha, Depth::ZERO)
                }
            } else {
                -search::<Pv>(ctx, pos, ss + 1, -beta, -alpha, new_depth)
            };
        }

        // Step 16. Undo move
        pos.undo_move(m);

        debug_assert!(value > -Value::INFINITE && value < Value::INFINITE);

        // Step 17. Check for new best move. If the search was aborted the
        // return value cannot be trusted, so we don't update the best move
        // and the PV.
        if ctx.signals.stop() {
            return Value::ZERO;
        }

        if root_node {
            let child_pv = ctx.stack[ss + 1].pv.clone();
            if let Some(rm) = ctx.root_moves.iter_mut().find(|rm| rm.pv[0] == m) {
                // PV move or new best move?
                if is_pv_move || value > alpha {
                    rm.score = value;
                    rm.pv.truncate(1);
                    rm.pv.extend_from_slice(&child_pv);

                    // We record how often the best move has been changed in
                    // each iteration. This information is used for time
                    // management: when the best move changes frequently, we
                    // allocate some more time.
                    if !is_pv_move {
                        ctx.best_move_changes += 1;
                    }
                } else {
                    // All other moves but the PV are set to the lowest
                    // value. The sort is stable, so the order of the rest is
                    // preserved.
                    rm.score = -Value::INFINITE;
                }
            }
        }

        if value > best_value {
            best_value = value;

            if value > alpha {
                best_move = m;

                if pv_node {
                    update_pv(ctx, ss, m);
                }

                if pv_node && value < beta {
                    // Update alpha! Always alpha < beta
                    alpha = value;
                } else {
                    debug_assert!(value >= beta);
                    break;
                }
            }
        }
    }

    // Step 18. Check for mate and stalemate. All legal moves have been
    // searched and if there are no legal moves, it must be mate or
    // stalemate. If we are in a singular extension search then return a
    // fail low score.
    if move_count == 0 {
        return if excluded_move != Move::NONE {
            alpha
        } else if in_check {
            mated_in(ply)
        } else {
            ctx.draw_value[us.index()]
        };
    }

    // Step 19. Update tables. If the search is not aborted, update the
    // transposition table, history counters, and killer moves.
    if !ctx.signals.stop() {
        let bound = if best_value <= old_alpha {
            Bound::UPPER
        } else if best_value >= beta {
            Bound::LOWER
        } else {
            Bound::EXACT
        };
        let stored_move = if best_value <= old_alpha {
            Move::NONE
        } else {
            best_move
        };

        ctx.tt.store(
            pos_key,
            value_to_tt(best_value, ply),
            bound,
            depth,
            stored_move,
            ctx.stack[ss].static_eval,
            ctx.stack[ss].eval_margin,
        );

        // Update killers and history for non capture cut-off moves
        if best_value >= beta && !in_check && !pos.capture_or_promotion(best_move) {
            update_stats(ctx, pos, ss, best_move, depth, &quiets[..quiet_count]);
        }
    }

    best_value
}

// qsearch() is the quiescence search function, which is called by the main
// search function when the remaining depth is zero (or, to be more
// precise, less than ONE_PLY).
fn qsearch<NT: NodeType, InCheck: Bool>(
    ctx: &mut SearchContext,
    pos: &mut Position,
    ss: usize,
    mut alpha: Value,
    beta: Value,
    depth: Depth,
) -> Value {
    let pv_node = NT::PV;
    let in_check = InCheck::BOOL;

    debug_assert!(!NT::ROOT);
    debug_assert!(alpha >= -Value::INFINITE && alpha < beta && beta <= Value::INFINITE);
    debug_assert!(pv_node || alpha == beta - 1);
    debug_assert!(depth <= Depth::ZERO);
    debug_assert!(in_check == pos.in_check());

    let old_alpha = alpha;
    let us = pos.side_to_move();
    let ply = (ss - ROOT_SS) as i32;
    let mut best_move = Move::NONE;

    ctx.count_node();
    ctx.stack[ss].ply = ply;
    ctx.stack[ss].current_move = Move::NONE;
    if pv_node {
        ctx.stack[ss].pv.clear();
        ctx.sel_depth = std::cmp::max(ctx.sel_depth, ply);
    }

    if ctx.signals.stop() {
        return Value::ZERO;
    }

    // Check for an instant draw or maximum ply reached
    if pos.is_draw(ply) || ply > MAX_PLY {
        return ctx.draw_value[us.index()];
    }

    // Decide whether or not to include checks, this fixes also the type of
    // TT entry depth that we are going to use. Note that in qsearch we use
    // only two types of depth in TT: QS_CHECKS or QS_NO_CHECKS.
    let tt_depth = if in_check || depth >= Depth::QS_CHECKS {
        Depth::QS_CHECKS
    } else {
        Depth::QS_NO_CHECKS
    };

    // Transposition table lookup. At PV nodes, we don't use the TT for
    // pruning, but only for move ordering.
    let key = pos.key();
    let tte = ctx.tt.probe(key);
    let tt_move = tte.map_or(Move::NONE, |e| e.mv());

    if !pv_node {
        if let Some(e) = tte {
            if ok_to_use_tt(&e, tt_depth, beta, ply) {
                ctx.stack[ss].current_move = tt_move;
                return value_from_tt(e.value(), ply);
            }
        }
    }

    // Evaluate the position statically
    let mut best_value;
    let futility_base;
    let enough_material;
    if in_check {
        best_value = -Value::INFINITE;
        futility_base = -Value::INFINITE;
        enough_material = false;
        ctx.stack[ss].static_eval = Value::NONE;
        ctx.stack[ss].eval_margin = Value::NONE;
    } else {
        let (v, margin) = match tte.filter(|e| e.static_value() != Value::NONE) {
            Some(e) => (e.static_value(), e.static_margin()),
            None => ctx.evaluator.evaluate(pos),
        };
        ctx.stack[ss].static_eval = v;
        ctx.stack[ss].eval_margin = margin;
        best_value = v;

        // Stand pat. Return immediately if static value is at least beta
        if best_value >= beta {
            if tte.is_none() {
                ctx.tt.store(
                    key,
                    value_to_tt(best_value, ply),
                    Bound::LOWER,
                    Depth::NONE,
                    Move::NONE,
                    v,
                    margin,
                );
            }
            return best_value;
        }

        if pv_node && best_value > alpha {
            alpha = best_value;
        }

        futility_base = v + margin + FUTILITY_MARGIN_QS;
        enough_material = pos.non_pawn_material_c(!us) > RookValueMg;
    }

    // Initialize a MoveSorter for the current position. Because the depth
    // is <= 0 here, only captures, queen promotions and checks (only if
    // depth >= QS_CHECKS) will be generated.
    let prev = ctx.stack[ss - 1].current_move;
    let recapture = if prev.is_ok() { prev.to() } else { crate::types::Square::NONE };
    let mut mp = MoveSorter::new_qsearch(pos, tt_move, depth, recapture);

    loop {
        let m = mp.next_move(pos, &ctx.history);
        if m == Move::NONE {
            break;
        }

        let gives_check = pos.gives_check(m);

        // Futility pruning
        if !pv_node
            && !in_check
            && !gives_check
            && m != tt_move
            && enough_material
            && m.move_type() != PROMOTION
            && !pos.passed_pawn_push(m)
        {
            let futility_value = futility_base
                + piece_value(EG, pos.piece_on(m.to()))
                + if m.move_type() == ENPASSANT {
                    PawnValueEg
                } else {
                    Value::ZERO
                };

            if futility_value < beta {
                best_value = std::cmp::max(best_value, futility_value);
                continue;
            }

            // Prune moves with negative or equal SEE
            if futility_base < beta && depth < Depth::ZERO && !pos.see_ge(m, Value(1)) {
                best_value = std::cmp::max(best_value, futility_base);
                continue;
            }
        }

        // Detect non-capture evasions that are candidates to be pruned
        let evasion_prunable = !pv_node
            && in_check
            && best_value > Value::MATED_IN_MAX_PLY
            && !pos.capture(m)
            && !pos.can_castle(us);

        // Don't search moves with negative SEE values
        if !pv_node
            && (!in_check || evasion_prunable)
            && m != tt_move
            && m.move_type() != PROMOTION
            && !pos.see_ge(m, Value::ZERO)
        {
            continue;
        }

        // Check for legality only before to do the move
        if !pos.legal(m) {
            continue;
        }

        ctx.stack[ss].current_move = m;
        if pv_node {
            ctx.stack[ss + 1].pv.clear();
        }

        pos.do_move(m, gives_check);
        let value = if gives_check {
            -qsearch::<NT, True>(ctx, pos, ss + 1, -beta, -alpha, depth - ONE_PLY)
        } else {
            -qsearch::<NT, False>(ctx, pos, ss + 1, -beta, -alpha, depth - ONE_PLY)
        };
        pos.undo_move(m);

        debug_assert!(value > -Value::INFINITE && value < Value::INFINITE);

        // Check for new best move
        if value > best_value {
            best_value = value;

            if value > alpha {
                if pv_node {
                    update_pv(ctx, ss, m);
                }

                if pv_node && value < beta {
                    alpha = value;
                    best_move = m;
                } else {
                    // Fail high
                    if !ctx.signals.stop() {
                        ctx.tt.store(
                            key,
                            value_to_tt(value, ply),
                            Bound::LOWER,
                            tt_depth,
                            m,
                            ctx.stack[ss].static_eval,
                            ctx.stack[ss].eval_margin,
                        );
                    }
                    return value;
                }
            }
        }
    }

    // All legal moves have been searched. A special case: If we're in check
    // and no legal moves were found, it is checkmate.
    if in_check && best_value == -Value::INFINITE {
        return mated_in(ply);
    }

    if !ctx.signals.stop() {
        let bound = if pv_node && best_value > old_alpha {
            Bound::EXACT
        } else {
            Bound::UPPER
        };
        ctx.tt.store(
            key,
            value_to_tt(best_value, ply),
            bound,
            tt_depth,
            best_move,
            ctx.stack[ss].static_eval,
            ctx.stack[ss].eval_margin,
        );
    }

    best_value
}

fn pv_info(ctx: &SearchContext, depth: i32, value: Value, alpha: Value, beta: Value) -> String {
    let elapsed = ctx.time.elapsed();
    let nps = ctx.nodes as i64 * 1000 / std::cmp::max(elapsed, 1);
    let bound = if value >= beta {
        " lowerbound"
    } else if value <= alpha {
        " upperbound"
    } else {
        ""
    };
    let pv: Vec<String> = ctx.root_moves[0].pv.iter().map(|&m| uci::move_str(m)).collect();

    format!(
        "info depth {} seldepth {} score {}{} nodes {} nps {} time {} hashfull {} pv {}",
        depth,
        std::cmp::max(ctx.sel_depth, depth),
        uci::value(value),
        bound,
        ctx.nodes,
        nps,
        elapsed,
        ctx.tt.hashfull(),
        pv.join(" ")
    )
}

// id_loop() is the main iterative deepening loop. It calls search()
// repeatedly with increasing depth until the allocated thinking time has
// been consumed, the user stops the search, or the maximum search depth is
// reached. Returns the last completed depth.
fn id_loop(ctx: &mut SearchContext, pos: &mut Position) -> i32 {
    let max_depth = if ctx.limits.depth > 0 {
        std::cmp::min(ctx.limits.depth, MAX_PLY)
    } else {
        MAX_PLY
    };

    let mut completed_depth = 0;
    let mut best_value = -Value::INFINITE;
    let mut prev_best_move_changes;
    let mut depth = 0;

    while depth < max_depth && !ctx.signals.stop() {
        depth += 1;

        prev_best_move_changes = ctx.best_move_changes;
        ctx.best_move_changes = 0;
        for rm in ctx.root_moves.iter_mut() {
            rm.prev_score = rm.score;
        }
        let completed = ctx.root_moves.clone();

        // Start with a small aspiration window and, in case of fail
        // high/low, research with a bigger window until not failing
        // high/low anymore.
        let mut delta = Value(16);
        let (mut alpha, mut beta) = if depth >= 5 && best_value.abs() < Value::KNOWN_WIN {
            let prev = ctx.root_moves[0].prev_score;
            (
                std::cmp::max(prev - delta, -Value::INFINITE),
                std::cmp::min(prev + delta, Value::INFINITE),
            )
        } else {
            (-Value::INFINITE, Value::INFINITE)
        };

        loop {
            best_value = search::<Root>(ctx, pos, ROOT_SS, alpha, beta, depth * ONE_PLY);

            // Bring the best move to the front. The sort is stable, so moves
            // that have not been searched keep their relative order.
            ctx.root_moves.sort_by(|a, b| b.score.cmp(&a.score));

            if ctx.signals.stop() {
                break;
            }

            if best_value <= alpha {
                if !ctx.silent {
                    println!("{}", pv_info(ctx, depth, best_value, alpha, beta));
                }
                beta = (alpha + beta) / 2;
                alpha = std::cmp::max(best_value - delta, -Value::INFINITE);
            } else if best_value >= beta {
                beta = std::cmp::min(best_value + delta, Value::INFINITE);
            } else {
                break;
            }

            delta += delta / 2;
        }

        // An aborted iteration is discarded, unless there is nothing to
        // fall back on.
        if ctx.signals.stop() {
            if completed_depth > 0 {
                ctx.root_moves = completed;
            }
            break;
        }

        completed_depth = depth;
        best_value = ctx.root_moves[0].score;

        if !ctx.silent {
            println!(
                "{}",
                pv_info(ctx, depth, best_value, -Value::INFINITE, Value::INFINITE)
            );
        }
        debug!(
            "depth {} score {} nodes {} time {} ms",
            depth,
            best_value.0,
            ctx.nodes,
            ctx.time.elapsed()
        );

        let mut stop = false;

        // Have we found a "mate in x"?
        if ctx.limits.mate > 0
            && best_value >= Value::MATE_IN_MAX_PLY
            && (Value::MATE - best_value).0 <= 2 * ctx.limits.mate
        {
            stop = true;
        }

        if ctx.limits.movetime > 0 && ctx.time.elapsed() >= ctx.limits.movetime {
            stop = true;
        }

        // Do we have time for the next iteration? Can we stop searching now?
        if ctx.limits.use_time_management() && !ctx.signals.stop() && !ctx.signals.stop_on_ponderhit() {
            if depth > 4 && depth < 50 {
                ctx.time.pv_instability(ctx.best_move_changes, prev_best_move_changes);
            }

            // Stop search if most of the available time is already
            // consumed. We probably don't have enough time to search the
            // first move at the next iteration anyway.
            if ctx.time.elapsed() > ctx.time.available_time() * 62 / 100 {
                stop = true;
            }

            // A single legal move needs no thinking
            if ctx.root_moves.len() == 1 {
                stop = true;
            }
        }

        if stop {
            // If we are allowed to ponder do not stop the search now but
            // keep pondering until the GUI sends "ponderhit" or "stop".
            if ctx.signals.ponder() {
                ctx.signals.set_stop_on_ponderhit();
            } else {
                ctx.signals.raise_stop();
            }
        }
    }

    completed_depth
}

// When the PV ends after the best move, try to find a reply in the TT so
// that we have something to ponder on.
fn extract_ponder_from_tt(ctx: &SearchContext, pos: &mut Position, best: Move) -> Move {
    let gives_check = pos.gives_check(best);
    pos.do_move(best, gives_check);
    let ponder = ctx
        .tt
        .probe(pos.key())
        .map(|e| e.mv())
        .filter(|&m| m != Move::NONE && MoveList::new::<Legal>(pos).contains(m))
        .unwrap_or(Move::NONE);
    pos.undo_move(best);
    ponder
}

fn book_move(ctx: &mut SearchContext, pos: &Position) -> Option<Move> {
    if !ctx.options.check("OwnBook") || i64::from(pos.game_ply()) >= ctx.options.spin("Book Max Ply") {
        return None;
    }

    let m = ctx.book.as_mut()?.probe(pos)?;
    if ctx.root_moves.iter().any(|rm| rm.pv[0] == m) {
        info!("book move {}", uci::move_str(m));
        Some(m)
    } else {
        None
    }
}

// think() searches the position within the given limits and returns the
// best move found. The caller resets the signals before a new search.
pub fn think(ctx: &mut SearchContext, pos: &mut Position, limits: LimitsType) -> SearchResult {
    let us = pos.side_to_move();

    ctx.limits = limits;
    ctx.nodes = 0;
    ctx.sel_depth = 0;
    ctx.best_move_changes = 0;
    ctx.time.init(&ctx.limits, us, pos.game_ply(), &ctx.options);

    let contempt = Value(ctx.options.spin("Contempt") as i32 * PawnValueMg.0 / 100);
    ctx.draw_value[us.index()] = Value::DRAW - contempt;
    ctx.draw_value[(!us).index()] = Value::DRAW + contempt;

    let searchmoves = &ctx.limits.searchmoves;
    ctx.root_moves = MoveList::new::<Legal>(pos)
        .iter()
        .filter(|m| searchmoves.is_empty() || searchmoves.contains(m))
        .map(RootMove::new)
        .collect();

    if ctx.root_moves.is_empty() {
        let score = if pos.in_check() {
            mated_in(0)
        } else {
            Value::DRAW
        };
        if !ctx.silent {
            println!("info depth 0 score {}", uci::value(score));
        }
        return SearchResult {
            best_move: Move::NONE,
            ponder_move: Move::NONE,
            score,
            depth: 0,
            nodes: 0,
        };
    }

    if let Some(m) = book_move(ctx, pos) {
        return SearchResult {
            best_move: m,
            ponder_move: Move::NONE,
            score: Value::ZERO,
            depth: 0,
            nodes: 0,
        };
    }

    ctx.tt.new_generation();
    ctx.history.clear();
    ctx.gains.clear();
    ctx.refutations.clear();
    for frame in ctx.stack.iter_mut() {
        *frame = Stack::new();
    }

    if let Some(timer) = &ctx.timer {
        if ctx.limits.use_time_management() {
            timer.arm(ctx.limits.start_time, ctx.time.maximum());
        } else if ctx.limits.movetime > 0 {
            timer.arm(ctx.limits.start_time, ctx.limits.movetime);
        }
    }

    let depth = id_loop(ctx, pos);

    if let Some(timer) = &ctx.timer {
        timer.disarm();
    }

    let best = &ctx.root_moves[0];
    let best_move = best.pv[0];
    let score = best.score;
    let ponder_move = match best.pv.get(1) {
        Some(&m) => m,
        None => extract_ponder_from_tt(ctx, pos, best_move),
    };

    SearchResult {
        best_move,
        ponder_move,
        score,
        depth,
        nodes: ctx.nodes,
    }
}

// perft() counts the leaf nodes of the legal move tree. Used to verify the
// move generator.
pub fn perft(pos: &mut Position, depth: u32) -> u64 {
    if depth == 0 {
        return 1;
    }

    let list = MoveList::new::<Legal>(pos);
    if depth == 1 {
        return list.len() as u64;
    }

    let mut nodes = 0;
    for m in list.iter() {
        let gives_check = pos.gives_check(m);
        pos.do_move(m, gives_check);
        nodes += perft(pos, depth - 1);
        pos.undo_move(m);
    }
    nodes
}

// perft_divide() splits the perft count by root move.
pub fn perft_divide(pos: &mut Position, depth: u32) -> Vec<(Move, u64)> {
    let list = MoveList::new::<Legal>(pos);
    list.iter()
        .map(|m| {
            let gives_check = pos.gives_check(m);
            pos.do_move(m, gives_check);
            let n = if depth > 1 { perft(pos, depth - 1) } else { 1 };
            pos.undo_move(m);
            (m, n)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Square, BLACK, WHITE};

    fn context() -> SearchContext {
        crate::init();
        let mut ctx = SearchContext::new(OptionsMap::new()).unwrap();
        ctx.set_silent(true);
        ctx
    }

    fn go_depth(ctx: &mut SearchContext, fen: &str, depth: i32) -> SearchResult {
        let mut pos = Position::from_fen(fen).unwrap();
        let mut limits = LimitsType::new();
        limits.depth = depth;
        ctx.signals.reset(false);
        let result = think(ctx, &mut pos, limits);
        assert_eq!(pos.fen(), fen);
        result
    }

    fn entry(tt: &mut TranspositionTable, v: Value, b: Bound, d: Depth) -> TTEntry {
        let key = crate::types::key::Key(0x1234_5678_0000_0001);
        tt.store(key, v, b, d, Move::NONE, Value::ZERO, Value::ZERO);
        tt.probe(key).unwrap()
    }

    mod tt_tests {
        use super::*;

        #[test]
        fn test_mate_scores_are_ply_relative() {
            let v = mate_in(7);
            assert_eq!(value_from_tt(value_to_tt(v, 3), 5), mate_in(9));
            let v = mated_in(4);
            assert_eq!(value_from_tt(value_to_tt(v, 2), 2), v);
            assert_eq!(value_to_tt(Value(35), 10), Value(35));
            assert_eq!(value_from_tt(Value::NONE, 10), Value::NONE);
        }

        #[test]
        fn test_lower_bound_cuts_only_above_beta() {
            let mut tt = TranspositionTable::new(1).unwrap();
            let e = entry(&mut tt, Value(100), Bound::LOWER, 6 * ONE_PLY);
            assert!(ok_to_use_tt(&e, 6 * ONE_PLY, Value(50), 0));
            assert!(ok_to_use_tt(&e, 6 * ONE_PLY, Value(100), 0));
            assert!(!ok_to_use_tt(&e, 6 * ONE_PLY, Value(101), 0));
            // Too shallow
            assert!(!ok_to_use_tt(&e, 7 * ONE_PLY, Value(50), 0));
        }

        #[test]
        fn test_upper_bound_cuts_only_below_beta() {
            let mut tt = TranspositionTable::new(1).unwrap();
            let e = entry(&mut tt, Value(-20), Bound::UPPER, 4 * ONE_PLY);
            assert!(ok_to_use_tt(&e, 4 * ONE_PLY, Value(0), 0));
            assert!(!ok_to_use_tt(&e, 4 * ONE_PLY, Value(-20), 0));
        }

        #[test]
        fn test_exact_bound_cuts_both_ways() {
            let mut tt = TranspositionTable::new(1).unwrap();
            let e = entry(&mut tt, Value(30), Bound::EXACT, 2 * ONE_PLY);
            assert!(ok_to_use_tt(&e, ONE_PLY, Value(10), 0));
            assert!(ok_to_use_tt(&e, ONE_PLY, Value(40), 0));
        }

        #[test]
        fn test_mate_scores_ignore_depth() {
            let mut tt = TranspositionTable::new(1).unwrap();
            let e = entry(&mut tt, mate_in(5), Bound::LOWER, ONE_PLY);
            assert!(ok_to_use_tt(&e, 20 * ONE_PLY, Value(500), 0));
        }

        #[test]
        fn test_eval_only_entry_is_never_used() {
            let mut tt = TranspositionTable::new(1).unwrap();
            let e = entry(&mut tt, Value::NONE, Bound::NONE, Depth::NONE);
            assert!(!ok_to_use_tt(&e, Depth::QS_NO_CHECKS, Value(0), 0));
            assert_eq!(refine_eval(&e, Value(42), 0), Value(42));
        }

        #[test]
        fn test_refine_eval() {
            let mut tt = TranspositionTable::new(1).unwrap();
            let e = entry(&mut tt, Value(200), Bound::LOWER, ONE_PLY);
            assert_eq!(refine_eval(&e, Value(100), 0), Value(200));
            assert_eq!(refine_eval(&e, Value(300), 0), Value(300));
        }
    }

    mod table_tests {
        use super::*;

        #[test]
        fn test_reductions_grow() {
            init();
            assert_eq!(reduction(false, ONE_PLY, 1), Depth::ZERO);
            assert!(reduction(false, 10 * ONE_PLY, 20) > reduction(true, 10 * ONE_PLY, 20));
            assert!(reduction(false, 12 * ONE_PLY, 30) >= reduction(false, 6 * ONE_PLY, 30));
        }

        #[test]
        fn test_futility_tables() {
            init();
            assert!(futility_margin(ONE_PLY, 0) < futility_margin(3 * ONE_PLY, 0));
            assert!(futility_margin(3 * ONE_PLY, 10) < futility_margin(3 * ONE_PLY, 0));
            assert_eq!(futility_margin(7 * ONE_PLY, 0), 2 * Value::INFINITE);
            assert!(futility_move_count(ONE_PLY) < futility_move_count(8 * ONE_PLY));
            assert_eq!(futility_move_count(16 * ONE_PLY), MAX_MOVES_I32);
        }
    }

    mod search_tests {
        use super::*;

        #[test]
        fn test_mate_in_one() {
            let mut ctx = context();
            let r = go_depth(&mut ctx, "6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1", 3);
            assert_eq!(r.best_move, Move::make(Square::A1, Square::A8));
            assert_eq!(r.score, mate_in(1));
        }

        #[test]
        fn test_checkmated_root() {
            let mut ctx = context();
            let r = go_depth(&mut ctx, "rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3", 4);
            assert_eq!(r.best_move, Move::NONE);
            assert_eq!(r.score, mated_in(0));
        }

        #[test]
        fn test_stalemated_root() {
            let mut ctx = context();
            let r = go_depth(&mut ctx, "7k/5Q2/6K1/8/8/8/8/8 b - - 0 1", 4);
            assert_eq!(r.best_move, Move::NONE);
            assert_eq!(r.score, Value::DRAW);
        }

        #[test]
        fn test_avoids_stalemate_when_winning() {
            let mut ctx = context();
            let r = go_depth(&mut ctx, "7k/8/6K1/8/8/8/8/5Q2 w - - 0 1", 4);
            let mut pos = Position::from_fen("7k/8/6K1/8/8/8/8/5Q2 w - - 0 1").unwrap();
            let gives_check = pos.gives_check(r.best_move);
            pos.do_move(r.best_move, gives_check);
            assert!(pos.in_check() || !MoveList::new::<Legal>(&pos).is_empty());
            assert!(r.score > Value(1000));
        }

        #[test]
        fn test_wins_hanging_queen() {
            let mut ctx = context();
            let r = go_depth(&mut ctx, "4k3/8/8/3q4/8/8/3R4/4K3 w - - 0 1", 4);
            assert_eq!(r.best_move, Move::make(Square::D2, Square::D5));
        }

        #[test]
        fn test_node_limit_stops_search() {
            let mut ctx = context();
            let mut pos = Position::new();
            let mut limits = LimitsType::new();
            limits.nodes = 10_000;
            ctx.signals.reset(false);
            let r = think(&mut ctx, &mut pos, limits);
            assert!(r.best_move.is_ok());
            assert!(r.nodes < 10_000 + 4096 + 1000);
            assert!(ctx.signals.stop());
        }

        #[test]
        fn test_searchmoves_restricts_root() {
            let mut ctx = context();
            let mut pos = Position::new();
            let mut limits = LimitsType::new();
            limits.depth = 3;
            let only = Move::make(Square::A2, Square::A3);
            limits.searchmoves = vec![only];
            ctx.signals.reset(false);
            let r = think(&mut ctx, &mut pos, limits);
            assert_eq!(r.best_move, only);
        }

        #[test]
        fn test_contempt_sets_draw_values() {
            let mut ctx = context();
            ctx.options.set("Contempt", "50").unwrap();
            go_depth(&mut ctx, "4k3/8/8/8/8/8/8/4K2R b K - 0 1", 1);
            assert_eq!(ctx.draw_value[BLACK.index()], Value(-85));
            assert_eq!(ctx.draw_value[WHITE.index()], Value(85));
        }

        #[test]
        fn test_ponder_move_follows_best_move() {
            let mut ctx = context();
            let r = go_depth(&mut ctx, crate::position::START_FEN, 5);
            assert!(r.best_move.is_ok());
            let mut pos = Position::new();
            let gives_check = pos.gives_check(r.best_move);
            pos.do_move(r.best_move, gives_check);
            if r.ponder_move != Move::NONE {
                assert!(MoveList::new::<Legal>(&pos).contains(r.ponder_move));
            }
            assert_eq!(r.depth, 5);
        }
    }

    mod perft_tests {
        use super::*;

        #[test]
        fn test_perft_start_position() {
            crate::init();
            let mut pos = Position::new();
            assert_eq!(perft(&mut pos, 1), 20);
            assert_eq!(perft(&mut pos, 2), 400);
            assert_eq!(perft(&mut pos, 3), 8902);
        }

        #[test]
        fn test_divide_sums_to_perft() {
            crate::init();
            let mut pos = Position::from_fen(
                "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
            )
            .unwrap();
            let divide = perft_divide(&mut pos, 2);
            assert_eq!(divide.len(), 48);
            assert_eq!(divide.iter().map(|&(_, n)| n).sum::<u64>(), 2039);
        }
    }
}
