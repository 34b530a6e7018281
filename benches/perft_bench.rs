// SPDX-License-Identifier: GPL-3.0-or-later

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use fishcore::position::Position;
use fishcore::search::{self, LimitsType, SearchContext};
use fishcore::ucioption::OptionsMap;

const KIWIPETE: &str = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";

fn bench_perft_start(c: &mut Criterion) {
    fishcore::init();
    let mut pos = Position::new();
    c.bench_function("perft start depth 4", |b| {
        b.iter(|| black_box(search::perft(&mut pos, 4)))
    });
}

fn bench_perft_kiwipete(c: &mut Criterion) {
    fishcore::init();
    let mut pos = Position::from_fen(KIWIPETE).unwrap();
    c.bench_function("perft kiwipete depth 3", |b| {
        b.iter(|| black_box(search::perft(&mut pos, 3)))
    });
}

fn bench_search(c: &mut Criterion) {
    fishcore::init();
    let mut ctx = SearchContext::new(OptionsMap::new()).unwrap();
    ctx.set_silent(true);
    let mut pos = Position::new();
    c.bench_function("search start depth 6", |b| {
        b.iter(|| {
            ctx.clear();
            ctx.signals.reset(false);
            let mut limits = LimitsType::new();
            limits.depth = 6;
            black_box(search::think(&mut ctx, &mut pos, limits))
        })
    });
}

criterion_group!(benches, bench_perft_start, bench_perft_kiwipete, bench_search);
criterion_main!(benches);
