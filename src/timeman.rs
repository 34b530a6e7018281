// SPDX-License-Identifier: GPL-3.0-or-later

use crate::search::LimitsType;
use crate::types::Color;
use crate::ucioption::OptionsMap;

use std::time::Instant;

#[derive(PartialEq, Eq, Copy, Clone)]
enum TimeType {
    OptimumTime,
    MaxTime,
}
use self::TimeType::{MaxTime, OptimumTime};

// Plan time management at most this many moves ahead
const MOVE_HORIZON: i32 = 50;
// When in trouble, we can step over reserved time with this ratio
const MAX_RATIO: f64 = 7.3;
// But we must not steal time from remaining moves over this ratio
const STEAL_RATIO: f64 = 0.34;

// importance() is a skew-logistic function based on naive statistical
// analysis of "how many games are still undecided after n half moves".
// The game is considered "undecided" as long as neither side has >275cp
// advantage.
fn importance(ply: i32) -> f64 {
    const XSCALE: f64 = 6.85;
    const XSHIFT: f64 = 64.5;
    const SKEW: f64 = 0.171;

    let scaled_ply = (f64::from(ply) - XSHIFT) / XSCALE;
    (1.0 + scaled_ply.exp()).powf(-SKEW) + f64::MIN_POSITIVE
}

fn remaining(my_time: i64, movestogo: i32, ply: i32, slow_mover: i64, time_type: TimeType) -> i64 {
    let (max_ratio, steal_ratio) = match time_type {
        OptimumTime => (1.0, 0.0),
        MaxTime => (MAX_RATIO, STEAL_RATIO),
    };

    let this_move = importance(ply) * slow_mover as f64 / 100.0;
    let other_moves: f64 = (1..movestogo).map(|i| importance(ply + 2 * i)).sum();

    let ratio1 = max_ratio * this_move / (max_ratio * this_move + other_moves);
    let ratio2 = (this_move + steal_ratio * other_moves) / (this_move + other_moves);

    (my_time as f64 * ratio1.min(ratio2)) as i64
}

// The time manager computes, once per root search, how long we would like
// to think (optimum) and how long we may think at most (maximum). Iterative
// deepening compares the elapsed time against available_time(), the timer
// thread against maximum().
#[derive(Debug, Clone, Copy)]
pub struct TimeManager {
    start: Instant,
    optimum: i64,
    maximum: i64,
    unstable_pv_extra: i64,
}

impl TimeManager {
    pub fn new() -> TimeManager {
        TimeManager {
            start: Instant::now(),
            optimum: 0,
            maximum: 0,
            unstable_pv_extra: 0,
        }
    }

    // init() calculates the allowed thinking time out of the time control
    // and current game ply. We support four different kinds of time
    // controls:
    //
    //  inc == 0 && movestogo == 0 means: x basetime  [sudden death!]
    //  inc == 0 && movestogo != 0 means: x moves in y minutes
    //  inc >  0 && movestogo == 0 means: x basetime + z increment
    //  inc >  0 && movestogo != 0 means: x moves in y minutes + z increment
    pub fn init(&mut self, limits: &LimitsType, us: Color, ply: i32, options: &OptionsMap) {
        let min_think_time = options.spin("Minimum Thinking Time");
        let move_overhead = options.spin("Move Overhead");
        let slow_mover = options.spin("Slow Mover");

        let time = limits.time[us.index()];
        let inc = limits.inc[us.index()];

        self.start = limits.start_time;
        self.unstable_pv_extra = 0;
        self.optimum = std::cmp::max(time, min_think_time);
        self.maximum = self.optimum;

        let max_mtg = if limits.movestogo != 0 {
            std::cmp::min(limits.movestogo, MOVE_HORIZON)
        } else {
            MOVE_HORIZON
        };

        // We calculate optimum time usage for different hypothetical "moves
        // to go" values and choose the minimum of calculated search time
        // values. Usually the greatest hyp_mtg gives the minimum values.
        for hyp_mtg in 1..=max_mtg {
            let overhead = 2 + i64::from(std::cmp::min(hyp_mtg, 40));
            let hyp_my_time =
                std::cmp::max(time + inc * i64::from(hyp_mtg - 1) - move_overhead * overhead, 0);

            let t1 = min_think_time + remaining(hyp_my_time, hyp_mtg, ply, slow_mover, OptimumTime);
            let t2 = min_think_time + remaining(hyp_my_time, hyp_mtg, ply, slow_mover, MaxTime);

            self.optimum = std::cmp::min(t1, self.optimum);
            self.maximum = std::cmp::min(t2, self.maximum);
        }

        if options.check("Ponder") {
            self.optimum += self.optimum / 4;
        }

        // Make sure that maximum time is not over the optimum
        self.optimum = std::cmp::min(self.optimum, self.maximum);
    }

    // pv_instability() grants extra time when the best move changed during
    // the last iterations. Recent changes weigh more.
    pub fn pv_instability(&mut self, cur_changes: i32, prev_changes: i32) {
        self.unstable_pv_extra = i64::from(cur_changes) * (self.optimum / 2)
            + i64::from(prev_changes) * (self.optimum / 3);
    }

    pub fn available_time(&self) -> i64 {
        self.optimum + self.unstable_pv_extra
    }

    pub fn optimum(&self) -> i64 {
        self.optimum
    }

    pub fn maximum(&self) -> i64 {
        self.maximum
    }

    pub fn elapsed(&self) -> i64 {
        self.start.elapsed().as_millis() as i64
    }
}

impl Default for TimeManager {
    fn default() -> Self {
        Self::new()
    }
}
