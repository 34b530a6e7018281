// SPDX-License-Identifier: GPL-3.0-or-later

use crate::error::TtError;
use crate::types::{bound::Bound, depth::Depth, key::Key, Move, Value};

use log::info;

pub const CLUSTER_SIZE: usize = 4;

// A TTEntry is 16 bytes:
//
// key        32 bit
// move       16 bit
// bound       8 bit
// generation  8 bit
// value      16 bit
// depth      16 bit
// static eval 16 bit
// eval margin 16 bit
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TTEntry {
    key32: u32,
    move16: u16,
    bound8: u8,
    gen8: u8,
    value16: i16,
    depth16: i16,
    eval16: i16,
    margin16: i16,
}

impl TTEntry {
    pub fn mv(&self) -> Move {
        Move(u32::from(self.move16))
    }

    pub fn value(&self) -> Value {
        Value(i32::from(self.value16))
    }

    pub fn depth(&self) -> Depth {
        Depth(i32::from(self.depth16))
    }

    pub fn bound(&self) -> Bound {
        Bound(u32::from(self.bound8))
    }

    pub fn generation(&self) -> u8 {
        self.gen8
    }

    pub fn static_value(&self) -> Value {
        Value(i32::from(self.eval16))
    }

    pub fn static_margin(&self) -> Value {
        Value(i32::from(self.margin16))
    }

    #[allow(clippy::too_many_arguments)]
    fn save(&mut self, k: u32, v: Value, b: Bound, d: Depth, m: Move, g: u8, ev: Value, em: Value) {
        self.key32 = k;
        self.move16 = m.0 as u16;
        self.bound8 = b.0 as u8;
        self.gen8 = g;
        self.value16 = v.0 as i16;
        self.depth16 = d.0 as i16;
        self.eval16 = ev.0 as i16;
        self.margin16 = em.0 as i16;
    }
}

type Cluster = [TTEntry; CLUSTER_SIZE];

// The transposition table is a power-of-two number of clusters. The low
// bits of a key select the cluster and the high 32 bits identify the entry
// inside it.
pub struct TranspositionTable {
    table: Vec<Cluster>,
    mb: usize,
    generation: u8,
}

impl TranspositionTable {
    pub fn new(mb: usize) -> Result<TranspositionTable, TtError> {
        let mut tt = TranspositionTable {
            table: Vec::new(),
            mb: 0,
            generation: 0,
        };
        tt.resize(mb)?;
        Ok(tt)
    }

    fn cluster_count(mb: usize) -> usize {
        let clusters = (mb << 20) / std::mem::size_of::<Cluster>();
        if clusters == 0 {
            1
        } else {
            1 << (usize::BITS - 1 - clusters.leading_zeros())
        }
    }

    // resize() sets the size of the table, measured in megabytes. The old
    // content is lost. Failing to allocate is fatal to the caller.
    pub fn resize(&mut self, mb: usize) -> Result<(), TtError> {
        let count = Self::cluster_count(mb);
        if count == self.table.len() {
            return Ok(());
        }

        let mut table: Vec<Cluster> = Vec::new();
        table
            .try_reserve_exact(count)
            .map_err(|_| TtError::Allocation { mb })?;
        table.resize(count, [TTEntry::default(); CLUSTER_SIZE]);

        self.table = table;
        self.mb = mb;
        info!("hash table resized to {} MB ({} clusters)", mb, count);
        Ok(())
    }

    pub fn size_mb(&self) -> usize {
        self.mb
    }

    pub fn clusters(&self) -> usize {
        self.table.len()
    }

    pub fn clear(&mut self) {
        for cluster in self.table.iter_mut() {
            *cluster = [TTEntry::default(); CLUSTER_SIZE];
        }
        info!("hash table cleared");
    }

    // new_generation() is called once per root search. Entries from older
    // searches become the first candidates for replacement.
    pub fn new_generation(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    pub fn generation(&self) -> u8 {
        self.generation
    }

    fn cluster_index(&self, key: Key) -> usize {
        (key.0 as usize) & (self.table.len() - 1)
    }

    pub fn probe(&self, key: Key) -> Option<TTEntry> {
        let key32 = key.high32();
        self.table[self.cluster_index(key)]
            .iter()
            .find(|tte| tte.key32 == key32)
            .copied()
    }

    // refresh() marks a used entry as belonging to the current search so
    // that it is not replaced too early.
    pub fn refresh(&mut self, key: Key) {
        let key32 = key.high32();
        let generation = self.generation;
        let idx = self.cluster_index(key);
        if let Some(tte) = self.table[idx].iter_mut().find(|tte| tte.key32 == key32) {
            tte.gen8 = generation;
        }
    }

    // store() writes a new entry. An empty or matching slot is used when
    // available, otherwise the least valuable entry of the cluster is
    // replaced: entries of older searches go first, then non-exact ones,
    // then shallower ones.
    #[allow(clippy::too_many_arguments)]
    pub fn store(
        &mut self,
        key: Key,
        v: Value,
        b: Bound,
        d: Depth,
        m: Move,
        static_value: Value,
        static_margin: Value,
    ) {
        let key32 = key.high32();
        let generation = self.generation;
        let idx = self.cluster_index(key);
        let cluster = &mut self.table[idx];

        let mut replace = 0;
        for i in 0..CLUSTER_SIZE {
            let tte = cluster[i];

            if tte.key32 == 0 || tte.key32 == key32 {
                // Keep the old move when we have none
                let m = if m == Move::NONE { tte.mv() } else { m };
                cluster[i].save(key32, v, b, d, m, generation, static_value, static_margin);
                return;
            }

            let rep = cluster[replace];
            let c1 = if rep.gen8 == generation { 2 } else { 0 };
            let c2 = if tte.gen8 == generation || tte.bound() == Bound::EXACT {
                -2
            } else {
                0
            };
            let c3 = if tte.depth16 < rep.depth16 { 1 } else { 0 };

            if c1 + c2 + c3 > 0 {
                replace = i;
            }
        }

        cluster[replace].save(key32, v, b, d, m, generation, static_value, static_margin);
    }

    // hashfull() returns an approximation of the table occupation during a
    // search, in permille.
    pub fn hashfull(&self) -> i32 {
        let sample = std::cmp::min(1000, self.table.len());
        let mut cnt = 0;
        for cluster in &self.table[..sample] {
            cnt += cluster
                .iter()
                .filter(|tte| tte.key32 != 0 && tte.gen8 == self.generation)
                .count();
        }
        (cnt * 1000 / (sample * CLUSTER_SIZE)) as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{depth::ONE_PLY, Square};

    fn key(cluster: u64, high: u64) -> Key {
        Key((high << 32) | cluster)
    }

    #[test]
    fn test_cluster_count_is_power_of_two() {
        for mb in [1, 3, 16, 100] {
            let tt = TranspositionTable::new(mb).unwrap();
            assert!(tt.clusters().is_power_of_two());
            assert!(tt.clusters() * 64 <= mb << 20);
            assert!(tt.clusters() * 128 > mb << 20);
        }
    }

    #[test]
    fn test_entry_layout() {
        assert_eq!(std::mem::size_of::<TTEntry>(), 16);
        assert_eq!(std::mem::size_of::<Cluster>(), 64);
    }

    #[test]
    fn test_store_then_probe() {
        let mut tt = TranspositionTable::new(1).unwrap();
        let k = key(5, 0xDEAD_BEEF);
        let m = Move::make(Square::E2, Square::E4);
        tt.store(k, Value(-57), Bound::LOWER, 7 * ONE_PLY, m, Value(12), Value(30));

        let tte = tt.probe(k).unwrap();
        assert_eq!(tte.value(), Value(-57));
        assert_eq!(tte.bound(), Bound::LOWER);
        assert_eq!(tte.depth(), 7 * ONE_PLY);
        assert_eq!(tte.mv(), m);
        assert_eq!(tte.static_value(), Value(12));
        assert_eq!(tte.static_margin(), Value(30));
        assert_eq!(tte.generation(), tt.generation());

        // Same cluster, different verification bits.
        assert!(tt.probe(key(5, 0xBEEF_DEAD)).is_none());
    }

    #[test]
    fn test_keeps_move_when_storing_none() {
        let mut tt = TranspositionTable::new(1).unwrap();
        let k = key(9, 77);
        let m = Move::make(Square::G1, Square::F3);
        tt.store(k, Value(10), Bound::EXACT, 4 * ONE_PLY, m, Value::NONE, Value::NONE);
        tt.store(k, Value(20), Bound::UPPER, 5 * ONE_PLY, Move::NONE, Value::NONE, Value::NONE);

        let tte = tt.probe(k).unwrap();
        assert_eq!(tte.mv(), m);
        assert_eq!(tte.value(), Value(20));
        assert_eq!(tte.bound(), Bound::UPPER);
    }

    #[test]
    fn test_replaces_old_generation_first() {
        let mut tt = TranspositionTable::new(1).unwrap();
        let m = Move::make(Square::A2, Square::A3);

        // Fill a cluster in generation 0, the first entry very deep.
        tt.store(key(3, 1), Value(0), Bound::UPPER, 40 * ONE_PLY, m, Value(0), Value(0));
        for high in 2..=CLUSTER_SIZE as u64 {
            tt.new_generation();
            tt.store(key(3, high), Value(0), Bound::UPPER, ONE_PLY, m, Value(0), Value(0));
        }

        tt.new_generation();
        tt.store(key(3, 99), Value(0), Bound::UPPER, ONE_PLY, m, Value(0), Value(0));
        assert!(tt.probe(key(3, 99)).is_some());
        assert_eq!(
            (1..=CLUSTER_SIZE as u64)
                .filter(|&h| tt.probe(key(3, h)).is_some())
                .count(),
            CLUSTER_SIZE - 1
        );
    }

    #[test]
    fn test_replaces_shallowest_in_same_generation() {
        let mut tt = TranspositionTable::new(1).unwrap();
        let m = Move::make(Square::A2, Square::A3);
        let depths = [6, 2, 8, 4];
        for (i, &d) in depths.iter().enumerate() {
            tt.store(key(11, i as u64 + 1), Value(0), Bound::UPPER, Depth(d), m, Value(0), Value(0));
        }
        tt.store(key(11, 50), Value(0), Bound::UPPER, Depth(10), m, Value(0), Value(0));
        assert!(tt.probe(key(11, 2)).is_none());
        assert!(tt.probe(key(11, 50)).is_some());
    }

    #[test]
    fn test_clear_and_hashfull() {
        let mut tt = TranspositionTable::new(1).unwrap();
        assert_eq!(tt.hashfull(), 0);
        for c in 0..1000u64 {
            tt.store(key(c, 1), Value(0), Bound::EXACT, ONE_PLY, Move::NONE, Value(0), Value(0));
        }
        assert_eq!(tt.hashfull(), 250);
        tt.new_generation();
        assert_eq!(tt.hashfull(), 0);
        tt.clear();
        assert!(tt.probe(key(0, 1)).is_none());
    }

    #[test]
    fn test_refresh_updates_generation() {
        let mut tt = TranspositionTable::new(1).unwrap();
        let k = key(1, 42);
        tt.store(k, Value(0), Bound::EXACT, ONE_PLY, Move::NONE, Value(0), Value(0));
        tt.new_generation();
        tt.refresh(k);
        assert_eq!(tt.probe(k).unwrap().generation(), tt.generation());
    }

    #[test]
    fn test_resize() {
        let mut tt = TranspositionTable::new(1).unwrap();
        let before = tt.clusters();
        tt.resize(4).unwrap();
        assert_eq!(tt.clusters(), before * 4);
        assert_eq!(tt.size_mb(), 4);
    }
}
