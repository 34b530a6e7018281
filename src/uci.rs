// SPDX-License-Identifier: GPL-3.0-or-later

use crate::book::{MemoryBook, DEFAULT_LINES};
use crate::error::{MoveError, TtError};
use crate::evaluate::{Evaluation, Evaluator};
use crate::misc;
use crate::movegen::{Legal, MoveList};
use crate::position::{Position, START_FEN};
use crate::search::{self, LimitsType, SearchContext};
use crate::threads::MainThread;
use crate::types::{
    Move, PawnValueMg, Square, Value, BLACK, CASTLING, FILE_C, FILE_G, PROMOTION, WHITE,
};
use crate::ucioption::{OptionsMap, EVAL_WEIGHTS};

use log::{info, warn};
use std::io::BufRead;
use std::time::Instant;

const BENCH_FENS: [&str; 8] = [
    START_FEN,
    "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 10",
    "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 11",
    "4rrk1/pp1n3p/3q2pQ/2p1pb2/2PP4/2P3N1/P2B2PP/4RRK1 b - - 7 19",
    "r3r1k1/2p2ppp/p1p1bn2/8/1q2P3/2NPQN2/PPP3PP/R4RK1 b - - 2 15",
    "r1bbk1nr/pp3p1p/2n5/1N4p1/2Np1B2/8/PPP2PPP/2KR1B1R w kq - 0 13",
    "8/8/8/5k2/8/3K4/2P5/8 w - - 0 1",
    "rnbqkb1r/ppp1pppp/5n2/3p4/3P4/5N2/PPP1PPPP/RNBQKB1R w KQkq - 2 3",
];

const BENCH_DEPTH: i32 = 8;

// square() converts a square to its algebraic name, e.g. "e4".
pub fn square(s: Square) -> String {
    let mut name = String::with_capacity(2);
    name.push((b'a' + s.file() as u8) as char);
    name.push((b'1' + s.rank() as u8) as char);
    name
}

pub fn parse_square(s: &str) -> Option<Square> {
    let b = s.as_bytes();
    if b.len() != 2 || !(b'a'..=b'h').contains(&b[0]) || !(b'1'..=b'8').contains(&b[1]) {
        return None;
    }
    Some(Square::make(u32::from(b[0] - b'a'), u32::from(b[1] - b'1')))
}

// move_str() converts a move to long algebraic notation. Castling is
// encoded internally as "king captures rook" and printed as the king's
// two-square step.
pub fn move_str(m: Move) -> String {
    if m == Move::NONE {
        return "(none)".to_string();
    }
    if m == Move::NULL {
        return "0000".to_string();
    }

    let from = m.from();
    let mut to = m.to();

    if m.move_type() == CASTLING {
        let file = if to > from { FILE_G } else { FILE_C };
        to = Square::make(file, from.rank());
    }

    let mut s = square(from) + &square(to);
    if m.move_type() == PROMOTION {
        s.push(b" pnbrqk"[m.promotion_type().0 as usize] as char);
    }
    s
}

// to_move() converts a string in long algebraic notation to the matching
// legal move. King-captures-rook castling notation is accepted too.
pub fn to_move(pos: &Position, s: &str) -> Result<Move, MoveError> {
    let s = s.to_ascii_lowercase();
    let well_formed = (s.len() == 4 || s.len() == 5)
        && s.is_char_boundary(2)
        && s.is_char_boundary(4)
        && parse_square(&s[0..2]).is_some()
        && parse_square(&s[2..4]).is_some()
        && (s.len() == 4 || "nbrq".contains(&s[4..]));
    if !well_formed {
        return Err(MoveError::Unparsable(s));
    }

    MoveList::new::<Legal>(pos)
        .iter()
        .find(|&m| {
            move_str(m) == s
                || (m.move_type() == CASTLING && square(m.from()) + &square(m.to()) == s)
        })
        .ok_or(MoveError::Illegal(s))
}

// value() converts a score to the UCI format: "cp <x>" in centipawns or
// "mate <y>" in moves (not plies).
pub fn value(v: Value) -> String {
    if v.abs() < Value::MATE_IN_MAX_PLY {
        format!("cp {}", v.0 * 100 / PawnValueMg.0)
    } else if v > Value::ZERO {
        format!("mate {}", (Value::MATE.0 - v.0 + 1) / 2)
    } else {
        format!("mate {}", (-Value::MATE.0 - v.0) / 2)
    }
}

// position() sets up the position given in FEN or the starting position
// and then plays the move list. A bad FEN resets to the starting position
// and drops the moves, an illegal move ends the list.
fn position(pos: &mut Position, args: &[&str]) {
    let mut tokens = args.iter();

    let fen = match tokens.next() {
        Some(&"startpos") => {
            tokens.next(); // consume "moves" token if any
            START_FEN.to_string()
        }
        Some(&"fen") => {
            let fields: Vec<&str> = tokens
                .by_ref()
                .take_while(|&&t| t != "moves")
                .copied()
                .collect();
            fields.join(" ")
        }
        _ => return,
    };

    match Position::from_fen(&fen) {
        Ok(p) => *pos = p,
        Err(e) => {
            warn!("bad FEN '{}': {}", fen, e);
            *pos = Position::new();
            return;
        }
    }

    for token in tokens {
        match to_move(pos, token) {
            Ok(m) => {
                let gives_check = pos.gives_check(m);
                pos.do_move(m, gives_check);
            }
            Err(e) => {
                warn!("{}", e);
                break;
            }
        }
    }
}

fn next_number(tokens: &mut std::slice::Iter<&str>) -> i64 {
    tokens.next().and_then(|t| t.parse().ok()).unwrap_or(0)
}

// go() parses the limits of a "go" command. The clock starts as soon as
// the command is read.
fn go(pos: &Position, args: &[&str]) -> LimitsType {
    let mut limits = LimitsType::new();
    limits.start_time = Instant::now();

    let mut tokens = args.iter();
    while let Some(&token) = tokens.next() {
        match token {
            "wtime" => limits.time[WHITE.index()] = next_number(&mut tokens),
            "btime" => limits.time[BLACK.index()] = next_number(&mut tokens),
            "winc" => limits.inc[WHITE.index()] = next_number(&mut tokens),
            "binc" => limits.inc[BLACK.index()] = next_number(&mut tokens),
            "movestogo" => limits.movestogo = next_number(&mut tokens) as i32,
            "depth" => limits.depth = next_number(&mut tokens) as i32,
            "nodes" => limits.nodes = next_number(&mut tokens).max(0) as u64,
            "movetime" => limits.movetime = next_number(&mut tokens),
            "mate" => limits.mate = next_number(&mut tokens) as i32,
            "infinite" => limits.infinite = true,
            "ponder" => limits.ponder = true,
            "searchmoves" => {
                for &t in tokens.by_ref() {
                    match to_move(pos, t) {
                        Ok(m) => limits.searchmoves.push(m),
                        Err(e) => warn!("searchmoves: {}", e),
                    }
                }
            }
            _ => {}
        }
    }
    limits
}

// setoption() stores a new option value and applies its side effects. Only
// a failed hash allocation is fatal.
fn setoption(ctx: &mut SearchContext, args: &[&str]) -> Result<(), TtError> {
    let args = match args.split_first() {
        Some((&"name", rest)) => rest,
        _ => args,
    };
    let (name, value) = match args.iter().position(|&t| t == "value") {
        Some(i) => (args[..i].join(" "), args[i + 1..].join(" ")),
        None => (args.join(" "), String::new()),
    };

    if let Err(e) = ctx.options.set(&name, &value) {
        warn!("{}", e);
        return Ok(());
    }

    if name.eq_ignore_ascii_case("Hash") {
        ctx.tt.resize(ctx.options.spin("Hash") as usize)?;
    } else if name.eq_ignore_ascii_case("Clear Hash") {
        ctx.tt.clear();
    } else if EVAL_WEIGHTS.iter().any(|w| w.eq_ignore_ascii_case(&name)) {
        ctx.evaluator.configure(&ctx.options);
    }
    Ok(())
}

fn perft(pos: &mut Position, depth: u32) {
    let start = Instant::now();
    let mut nodes = 0;
    for (m, n) in search::perft_divide(pos, depth) {
        println!("{}: {}", move_str(m), n);
        nodes += n;
    }
    let ms = start.elapsed().as_millis() as u64;
    println!("\nNodes searched: {}", nodes);
    println!("Time (ms): {}", ms);
    println!("Nodes/second: {}", nodes * 1000 / ms.max(1));
}

// bench() searches a fixed set of positions to a fixed depth and reports
// the total node count, a quick signature of the search.
fn bench(ctx: &mut SearchContext, depth: i32) {
    let start = Instant::now();
    let mut nodes = 0;

    ctx.clear();
    ctx.set_silent(true);
    for (i, fen) in BENCH_FENS.iter().enumerate() {
        let mut pos = match Position::from_fen(fen) {
            Ok(p) => p,
            Err(e) => {
                warn!("bench position {}: {}", i + 1, e);
                continue;
            }
        };
        let mut limits = LimitsType::new();
        limits.depth = depth;
        ctx.signals.reset(false);
        let result = search::think(ctx, &mut pos, limits);
        println!(
            "Position {}/{}: {} nodes, bestmove {}",
            i + 1,
            BENCH_FENS.len(),
            result.nodes,
            move_str(result.best_move)
        );
        nodes += result.nodes;
    }
    ctx.set_silent(false);

    let ms = start.elapsed().as_millis() as u64;
    println!("\n===========================");
    println!("Total time (ms) : {}", ms);
    println!("Nodes searched  : {}", nodes);
    println!("Nodes/second    : {}", nodes * 1000 / ms.max(1));
}

// main_loop() waits for a command from stdin, parses it and calls the
// appropriate function. Commands given on the command line are executed
// once and the engine exits.
pub fn main_loop(args: &[String]) -> Result<(), TtError> {
    let mut ctx = SearchContext::new(OptionsMap::new())?;
    match MemoryBook::from_lines(&DEFAULT_LINES) {
        Ok(book) => ctx.book = Some(Box::new(book)),
        Err(e) => warn!("opening book disabled: {}", e),
    }

    let thread = MainThread::new(ctx);
    let mut pos = Position::new();

    let mut stdin = std::io::stdin().lock();
    let mut line = String::new();

    loop {
        let cmd = if !args.is_empty() {
            args.join(" ")
        } else {
            line.clear();
            match stdin.read_line(&mut line) {
                Ok(0) | Err(_) => "quit".to_string(),
                Ok(_) => line.trim().to_string(),
            }
        };

        let tokens: Vec<&str> = cmd.split_whitespace().collect();
        let (token, rest) = match tokens.split_first() {
            Some((&t, rest)) => (t, rest),
            None => continue,
        };

        match token {
            "quit" | "stop" => thread.signals().raise_stop(),
            "ponderhit" => thread.signals().ponderhit(),
            "uci" => {
                println!("id name {}", misc::engine_info(true));
                print!("{}", thread.context().options);
                println!("uciok");
            }
            "isready" => println!("readyok"),
            "ucinewgame" => thread.context().clear(),
            "setoption" => setoption(&mut thread.context(), rest)?,
            "position" => position(&mut pos, rest),
            "go" => thread.start_searching(pos.clone(), go(&pos, rest)),
            "d" => println!("{}", pos),
            "flip" => pos.flip(),
            "eval" => {
                let mut evaluation = Evaluation::new();
                evaluation.configure(&thread.context().options);
                println!("{}", evaluation.trace(&pos));
            }
            "perft" => {
                let depth = rest.first().and_then(|t| t.parse().ok()).unwrap_or(4);
                perft(&mut pos, depth);
            }
            "bench" => {
                let depth = rest.first().and_then(|t| t.parse().ok()).unwrap_or(BENCH_DEPTH);
                bench(&mut thread.context(), depth);
            }
            _ => {
                info!("unknown command: {}", cmd);
                println!("Unknown command: {}", cmd);
            }
        }

        if token == "quit" || !args.is_empty() {
            break;
        }
    }

    thread.wait_for_search_finished();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() {
        crate::init();
    }

    #[test]
    fn test_square_names() {
        assert_eq!(square(Square::A1), "a1");
        assert_eq!(square(Square::H8), "h8");
        assert_eq!(parse_square("e4"), Some(Square::E4));
        assert_eq!(parse_square("i4"), None);
        assert_eq!(parse_square("e9"), None);
        assert_eq!(parse_square("e"), None);
    }

    #[test]
    fn test_move_str() {
        assert_eq!(move_str(Move::NONE), "(none)");
        assert_eq!(move_str(Move::NULL), "0000");
        assert_eq!(move_str(Move::make(Square::E2, Square::E4)), "e2e4");
        assert_eq!(
            move_str(Move::make_special(CASTLING, Square::E1, Square::H1)),
            "e1g1"
        );
        assert_eq!(
            move_str(Move::make_special(CASTLING, Square::E8, Square::A8)),
            "e8c8"
        );
        assert_eq!(
            move_str(Move::make_prom(Square::B7, Square::B8, crate::types::KNIGHT)),
            "b7b8n"
        );
    }

    #[test]
    fn test_to_move() {
        setup();
        let pos = Position::from_fen("r3k2r/1P6/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        let oo = to_move(&pos, "e1g1").unwrap();
        assert_eq!(oo.move_type(), CASTLING);
        assert_eq!(to_move(&pos, "e1h1"), Ok(oo));
        assert_eq!(move_str(to_move(&pos, "b7a8Q").unwrap()), "b7a8q");

        assert_eq!(
            to_move(&pos, "e1e3"),
            Err(MoveError::Illegal("e1e3".to_string()))
        );
        assert_eq!(to_move(&pos, "xx"), Err(MoveError::Unparsable("xx".to_string())));
        assert_eq!(
            to_move(&pos, "b7a8k"),
            Err(MoveError::Unparsable("b7a8k".to_string()))
        );
    }

    #[test]
    fn test_value() {
        assert_eq!(value(Value(171)), "cp 100");
        assert_eq!(value(Value(-342)), "cp -200");
        assert_eq!(value(crate::types::mate_in(1)), "mate 1");
        assert_eq!(value(crate::types::mate_in(3)), "mate 2");
        assert_eq!(value(crate::types::mated_in(2)), "mate -1");
        assert_eq!(value(crate::types::mated_in(0)), "mate 0");
    }

    #[test]
    fn test_position_command() {
        setup();
        let mut pos = Position::new();
        position(&mut pos, &["startpos", "moves", "e2e4", "e7e5", "g1f3"]);
        assert_eq!(
            pos.fen(),
            "rnbqkbnr/pppp1ppp/8/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R b KQkq - 1 2"
        );

        let fen = "4k3/8/8/8/8/8/8/4K2R w K - 0 1";
        let mut args = vec!["fen"];
        args.extend(fen.split_whitespace());
        args.extend(["moves", "e1g1"]);
        position(&mut pos, &args);
        assert_eq!(pos.fen(), "4k3/8/8/8/8/8/8/5RK1 b - - 1 1");
    }

    #[test]
    fn test_position_errors_are_not_fatal() {
        setup();
        let mut pos = Position::new();
        position(&mut pos, &["fen", "not", "a", "fen"]);
        assert_eq!(pos.fen(), START_FEN);

        // Moves after the first illegal one are ignored
        position(&mut pos, &["startpos", "moves", "e2e4", "e2e4", "e7e5"]);
        assert_eq!(
            pos.fen(),
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1"
        );
    }

    #[test]
    fn test_bad_fen_resets_to_start() {
        setup();
        let mut pos = Position::new();
        position(&mut pos, &["startpos", "moves", "e2e4"]);
        assert_ne!(pos.fen(), START_FEN);

        position(&mut pos, &["fen", "garbage", "moves", "e2e4"]);
        assert_eq!(pos.fen(), START_FEN);

        let fen = "4k3/8/8/8/8/8/8/4K2R w K - 0 1";
        let mut args = vec!["fen"];
        args.extend(fen.split_whitespace());
        position(&mut pos, &args);
        position(&mut pos, &["fen", "4k3/8/8", "w", "-", "-", "0", "1"]);
        assert_eq!(pos.fen(), START_FEN);
    }

    #[test]
    fn test_go_command() {
        setup();
        let pos = Position::new();
        let limits = go(
            &pos,
            &["wtime", "60000", "btime", "50000", "winc", "1000", "binc", "900", "movestogo", "20"],
        );
        assert_eq!(limits.time, [60000, 50000]);
        assert_eq!(limits.inc, [1000, 900]);
        assert_eq!(limits.movestogo, 20);
        assert!(limits.use_time_management());

        let limits = go(&pos, &["depth", "7", "searchmoves", "e2e4", "d2d4"]);
        assert_eq!(limits.depth, 7);
        assert_eq!(limits.searchmoves.len(), 2);
        assert!(!limits.use_time_management());

        let limits = go(&pos, &["infinite"]);
        assert!(limits.infinite && !limits.use_time_management());
        assert!(go(&pos, &["ponder", "movetime", "100"]).ponder);
        assert_eq!(go(&pos, &["nodes", "5000"]).nodes, 5000);
        assert_eq!(go(&pos, &["mate", "3"]).mate, 3);
    }

    #[test]
    fn test_setoption_command() {
        setup();
        let mut ctx = SearchContext::new(OptionsMap::new()).unwrap();
        setoption(&mut ctx, &["name", "Hash", "value", "2"]).unwrap();
        assert_eq!(ctx.tt.size_mb(), 2);

        setoption(&mut ctx, &["name", "Minimum", "Thinking", "Time", "value", "150"]).unwrap();
        assert_eq!(ctx.options.spin("Minimum Thinking Time"), 150);

        // Rejected values are logged and ignored
        setoption(&mut ctx, &["name", "Hash", "value", "0"]).unwrap();
        setoption(&mut ctx, &["name", "NoSuchOption", "value", "1"]).unwrap();
        assert_eq!(ctx.options.spin("Hash"), 2);

        setoption(&mut ctx, &["name", "Clear", "Hash"]).unwrap();
    }

    #[test]
    fn test_eval_weight_reaches_evaluator() {
        setup();
        let mut ctx = SearchContext::new(OptionsMap::new()).unwrap();
        let pos = Position::from_fen("4k3/8/8/8/3Q4/8/8/4K3 w - - 0 1").unwrap();
        let before = ctx.evaluator.evaluate(&pos).0;
        setoption(&mut ctx, &["name", "Mobility", "(Middle", "Game)", "value", "0"]).unwrap();
        setoption(&mut ctx, &["name", "Mobility", "(Endgame)", "value", "0"]).unwrap();
        assert!(ctx.evaluator.evaluate(&pos).0 < before);
    }

    #[test]
    fn test_bench_is_deterministic() {
        setup();
        let mut ctx = SearchContext::new(OptionsMap::new()).unwrap();
        let mut pos = Position::from_fen(BENCH_FENS[2]).unwrap();
        let mut limits = LimitsType::new();
        limits.depth = 5;
        ctx.set_silent(true);
        ctx.clear();
        ctx.signals.reset(false);
        let first = search::think(&mut ctx, &mut pos, limits.clone());
        ctx.clear();
        ctx.signals.reset(false);
        let second = search::think(&mut ctx, &mut pos, limits);
        assert_eq!(first.nodes, second.nodes);
        assert_eq!(first.best_move, second.best_move);
    }
}
