// SPDX-License-Identifier: GPL-3.0-or-later

use crate::position::Position;
use crate::search::{self, LimitsType, SearchContext};
use crate::uci;

use log::debug;
use parking_lot::{Condvar, Mutex, MutexGuard};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

pub const TIMER_RESOLUTION: Duration = Duration::from_millis(5);

const SEARCH_STACK_SIZE: usize = 64 * 1024 * 1024;

// Flags shared between the front-end, the timer and the search. The search
// polls them without locking and tolerates stale reads.
pub struct Signals {
    stop: AtomicBool,
    stop_on_ponderhit: AtomicBool,
    ponder: AtomicBool,
    lock: Mutex<()>,
    wake: Condvar,
}

impl Signals {
    pub fn new() -> Signals {
        Signals {
            stop: AtomicBool::new(false),
            stop_on_ponderhit: AtomicBool::new(false),
            ponder: AtomicBool::new(false),
            lock: Mutex::new(()),
            wake: Condvar::new(),
        }
    }

    // reset() prepares the flags for a new search.
    pub fn reset(&self, ponder: bool) {
        self.stop.store(false, Ordering::Relaxed);
        self.stop_on_ponderhit.store(false, Ordering::Relaxed);
        self.ponder.store(ponder, Ordering::Relaxed);
    }

    pub fn stop(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }

    pub fn ponder(&self) -> bool {
        self.ponder.load(Ordering::Relaxed)
    }

    pub fn stop_on_ponderhit(&self) -> bool {
        self.stop_on_ponderhit.load(Ordering::Relaxed)
    }

    pub fn raise_stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
        let _guard = self.lock.lock();
        self.wake.notify_all();
    }

    // Set when the search would have stopped but we are still pondering:
    // the stop is deferred until the opponent plays the expected move.
    pub fn set_stop_on_ponderhit(&self) {
        self.stop_on_ponderhit.store(true, Ordering::Relaxed);
    }

    // ponderhit() switches a ponder search to a normal one.
    pub fn ponderhit(&self) {
        self.ponder.store(false, Ordering::Relaxed);
        if self.stop_on_ponderhit() {
            self.raise_stop();
        } else {
            let _guard = self.lock.lock();
            self.wake.notify_all();
        }
    }

    // In ponder or infinite mode the best move may not be sent before the
    // GUI says so. Blocks until a stop or, unless infinite, a ponderhit.
    pub fn wait_for_stop_or_ponderhit(&self, infinite: bool) {
        let mut guard = self.lock.lock();
        self.set_stop_on_ponderhit();
        while !self.stop() && (infinite || self.ponder()) {
            self.wake.wait(&mut guard);
        }
    }
}

impl Default for Signals {
    fn default() -> Self {
        Self::new()
    }
}

struct TimerState {
    // Search start and hard limit in milliseconds while armed.
    deadline: Option<(Instant, i64)>,
    exit: bool,
}

struct TimerShared {
    state: Mutex<TimerState>,
    wake: Condvar,
}

// The timer is a background thread that, while armed, wakes every
// TIMER_RESOLUTION and raises the stop signal once the hard time limit is
// exceeded. Pondering suspends the check.
pub struct Timer {
    shared: Arc<TimerShared>,
    handle: Option<JoinHandle<()>>,
}

impl Timer {
    pub fn new(signals: Arc<Signals>) -> Timer {
        let shared = Arc::new(TimerShared {
            state: Mutex::new(TimerState {
                deadline: None,
                exit: false,
            }),
            wake: Condvar::new(),
        });

        let thread_shared = Arc::clone(&shared);
        let handle = std::thread::Builder::new()
            .name("timer".to_string())
            .spawn(move || timer_loop(&thread_shared, &signals))
            .ok();

        Timer { shared, handle }
    }

    pub fn arm(&self, start: Instant, limit_ms: i64) {
        let mut state = self.shared.state.lock();
        state.deadline = Some((start, limit_ms));
        self.shared.wake.notify_all();
    }

    pub fn disarm(&self) {
        let mut state = self.shared.state.lock();
        state.deadline = None;
        self.shared.wake.notify_all();
    }
}

fn timer_loop(shared: &TimerShared, signals: &Signals) {
    let mut state = shared.state.lock();
    loop {
        if state.exit {
            return;
        }

        if state.deadline.is_none() {
            shared.wake.wait(&mut state);
            continue;
        }

        shared.wake.wait_for(&mut state, TIMER_RESOLUTION);

        if let Some((start, limit)) = state.deadline {
            let elapsed = start.elapsed().as_millis() as i64;
            if elapsed >= limit && !signals.ponder() {
                debug!("time limit of {} ms reached after {} ms", limit, elapsed);
                signals.raise_stop();
                state.deadline = None;
            }
        }
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        {
            let mut state = self.shared.state.lock();
            state.exit = true;
            self.shared.wake.notify_all();
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

struct Job {
    pos: Position,
    limits: LimitsType,
}

struct MainState {
    job: Option<Job>,
    searching: bool,
    exit: bool,
}

struct MainShared {
    state: Mutex<MainState>,
    wake: Condvar,
    ctx: Mutex<SearchContext>,
    signals: Arc<Signals>,
}

// The main thread sleeps until the front-end hands it a search, runs it,
// prints the best move and goes back to sleep.
pub struct MainThread {
    shared: Arc<MainShared>,
    handle: Option<JoinHandle<()>>,
}

impl MainThread {
    pub fn new(mut ctx: SearchContext) -> MainThread {
        let signals = Arc::clone(&ctx.signals);
        ctx.timer = Some(Timer::new(Arc::clone(&signals)));

        let shared = Arc::new(MainShared {
            state: Mutex::new(MainState {
                job: None,
                searching: false,
                exit: false,
            }),
            wake: Condvar::new(),
            ctx: Mutex::new(ctx),
            signals,
        });

        let thread_shared = Arc::clone(&shared);
        let handle = std::thread::Builder::new()
            .name("search".to_string())
            .stack_size(SEARCH_STACK_SIZE)
            .spawn(move || idle_loop(&thread_shared))
            .ok();

        MainThread { shared, handle }
    }

    pub fn signals(&self) -> &Arc<Signals> {
        &self.shared.signals
    }

    pub fn start_searching(&self, pos: Position, limits: LimitsType) {
        self.wait_for_search_finished();

        let mut state = self.shared.state.lock();
        self.shared.signals.reset(limits.ponder);
        state.job = Some(Job { pos, limits });
        state.searching = true;
        self.shared.wake.notify_all();
    }

    pub fn wait_for_search_finished(&self) {
        let mut state = self.shared.state.lock();
        while state.searching {
            self.shared.wake.wait(&mut state);
        }
    }

    // The search context may only be touched while no search is running.
    pub fn context(&self) -> MutexGuard<'_, SearchContext> {
        self.wait_for_search_finished();
        self.shared.ctx.lock()
    }
}

fn idle_loop(shared: &MainShared) {
    loop {
        let job = {
            let mut state = shared.state.lock();
            while state.job.is_none() && !state.exit {
                shared.wake.wait(&mut state);
            }
            if state.exit {
                return;
            }
            state.job.take()
        };

        if let Some(Job { mut pos, limits }) = job {
            let ponder = limits.ponder;
            let infinite = limits.infinite;
            let mut ctx = shared.ctx.lock();
            let result = search::think(&mut ctx, &mut pos, limits);
            drop(ctx);

            if !shared.signals.stop() && (ponder || infinite) {
                shared.signals.wait_for_stop_or_ponderhit(infinite);
            }

            if result.ponder_move.is_ok() {
                println!(
                    "bestmove {} ponder {}",
                    uci::move_str(result.best_move),
                    uci::move_str(result.ponder_move)
                );
            } else {
                println!("bestmove {}", uci::move_str(result.best_move));
            }
        }

        let mut state = shared.state.lock();
        state.searching = false;
        shared.wake.notify_all();
    }
}

impl Drop for MainThread {
    fn drop(&mut self) {
        self.shared.signals.raise_stop();
        {
            let mut state = self.shared.state.lock();
            state.exit = true;
            self.shared.wake.notify_all();
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
