// SPDX-License-Identifier: GPL-3.0-or-later

pub mod bitboard;
pub mod book;
pub mod error;
pub mod evaluate;
pub mod material;
pub mod misc;
pub mod movegen;
pub mod movepick;
pub mod pawns;
pub mod position;
pub mod psqt;
pub mod search;
pub mod threads;
pub mod timeman;
pub mod tt;
pub mod types;
pub mod uci;
pub mod ucioption;

// init() builds the lookup tables. They are also built on first use, so
// calling it is only a way to pay the cost up front.
pub fn init() {
    bitboard::init();
    position::zobrist::init();
    psqt::init();
    pawns::init();
    search::init();
}
