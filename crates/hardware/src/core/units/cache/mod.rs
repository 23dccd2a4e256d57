//! Set-Associative Cache Timing Model.
//!
//! Models a configurable set-associative cache with per-line LRU stamps,
//! write-back + write-allocate semantics, and miss penalties. The cache is a
//! timing model: line data lives solely in the flat main memory, which a
//! single writer keeps equivalent to mirroring bytes per line. A hit costs
//! one cycle; a miss costs the configured penalty, plus one more penalty
//! when the evicted victim was dirty and had to be written back.

use crate::config::CacheConfig;

/// Cache line state: tag, validity, dirtiness, and recency stamp.
#[derive(Clone, Copy, Debug, Default)]
struct CacheLine {
    tag: u64,
    valid: bool,
    dirty: bool,
    lru_stamp: u64,
}

/// Outcome of a single cache access.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CacheAccess {
    /// Whether the block was resident.
    pub hit: bool,
    /// Cycles charged for this access.
    pub latency: u64,
}

/// Set-associative cache with stamp-based LRU replacement.
pub struct Cache {
    lines: Vec<CacheLine>,
    num_sets: usize,
    ways: usize,
    block_bytes: usize,
    miss_penalty: u64,
    stamp: u64,
}

impl Cache {
    /// Hit latency in cycles.
    pub const HIT_LATENCY: u64 = 1;

    /// Creates a cache from its configured shape.
    ///
    /// Geometry is validated by `Config::validate` before construction.
    pub fn new(config: &CacheConfig) -> Self {
        let num_lines = config.size / config.block_size;
        let num_sets = num_lines / config.associativity;
        Self {
            lines: vec![CacheLine::default(); num_lines],
            num_sets,
            ways: config.associativity,
            block_bytes: config.block_size,
            miss_penalty: config.miss_penalty,
            stamp: 0,
        }
    }

    fn set_and_tag(&self, addr: u64) -> (usize, u64) {
        let block = addr / self.block_bytes as u64;
        let set = (block as usize) % self.num_sets;
        let tag = block / self.num_sets as u64;
        (set, tag)
    }

    /// True if the block containing `addr` is resident.
    pub fn contains(&self, addr: u64) -> bool {
        let (set, tag) = self.set_and_tag(addr);
        let base = set * self.ways;
        self.lines[base..base + self.ways]
            .iter()
            .any(|line| line.valid && line.tag == tag)
    }

    /// Accesses the cache for `addr`.
    ///
    /// On a hit the line's recency stamp is refreshed (and the dirty bit set
    /// for writes). On a miss the block is allocated — also for writes
    /// (write-allocate) — evicting the least recently used way of the set;
    /// a dirty victim charges one extra penalty for its write-back.
    pub fn access(&mut self, addr: u64, is_write: bool) -> CacheAccess {
        let (set, tag) = self.set_and_tag(addr);
        let base = set * self.ways;
        self.stamp += 1;

        for line in &mut self.lines[base..base + self.ways] {
            if line.valid && line.tag == tag {
                line.lru_stamp = self.stamp;
                if is_write {
                    line.dirty = true;
                }
                return CacheAccess {
                    hit: true,
                    latency: Self::HIT_LATENCY,
                };
            }
        }

        // Miss: pick the LRU way (invalid ways have stamp 0 and win).
        let victim = self.lines[base..base + self.ways]
            .iter()
            .enumerate()
            .min_by_key(|(_, line)| if line.valid { line.lru_stamp } else { 0 })
            .map_or(0, |(way, _)| way);

        let line = &mut self.lines[base + victim];
        let mut latency = self.miss_penalty;
        if line.valid && line.dirty {
            latency += self.miss_penalty;
        }
        *line = CacheLine {
            tag,
            valid: true,
            dirty: is_write,
            lru_stamp: self.stamp,
        };

        CacheAccess { hit: false, latency }
    }
}
