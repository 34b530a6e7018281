// SPDX-License-Identifier: GPL-3.0-or-later

use fishcore::{misc, uci};

use log::error;
use mimalloc::MiMalloc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

fn main() {
    // Diagnostics go to stderr, stdout belongs to the protocol.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    println!("{}", misc::engine_info(false));

    fishcore::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if let Err(e) = uci::main_loop(&args) {
        error!("{}", e);
        std::process::exit(1);
    }
}
