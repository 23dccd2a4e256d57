//! Load/Store Queue.
//!
//! Memory operations enter the queue at decode, in program order, and keep
//! that order for their whole life. The queue provides:
//! 1. **Resolution:** Effective addresses arrive from the LSU when address
//!    generation completes.
//! 2. **Load planning:** A resolved load either forwards from the newest
//!    older store that fully covers it, reads the D-cache, or is blocked —
//!    by an older store with an unresolved address, or by a partial
//!    overlap that must drain first.
//! 3. **In-order store commit:** Stores write memory only when they retire
//!    from the queue head at ROB commit.

use std::collections::VecDeque;

use crate::core::pipeline::rob::Tag;

/// Kind of memory operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MemKind {
    /// Load word.
    Load,
    /// Store word.
    Store,
}

/// How a resolved load obtains its value this cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadPlan {
    /// The newest older store fully covers the load: take its data.
    Forward(u32),
    /// No overlapping older store: read the D-cache.
    Memory,
    /// An older store is unresolved or partially overlaps: wait.
    Blocked,
}

/// One queue entry.
#[derive(Clone, Copy, Debug)]
pub struct LsqEntry {
    /// Program-order tag.
    pub tag: Tag,
    /// Load or store.
    pub kind: MemKind,
    /// Effective address, once resolved.
    pub addr: Option<u64>,
    /// Store data (stores only).
    pub data: u32,
    /// Access size in bytes.
    pub size: u64,
    /// Loads: value obtained or access in flight. Stores: resolved.
    pub completed: bool,
}

/// Program-order queue of in-flight memory operations.
pub struct LoadStoreQueue {
    entries: VecDeque<LsqEntry>,
    capacity: usize,
}

impl LoadStoreQueue {
    /// Creates a queue with room for `capacity` operations.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Number of occupied entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no operations are in flight.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True when no more operations can enter.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.capacity
    }

    /// Appends an operation in program order. Returns false when full.
    pub fn allocate(&mut self, tag: Tag, kind: MemKind) -> bool {
        if self.is_full() {
            return false;
        }
        debug_assert!(self.entries.back().is_none_or(|e| e.tag < tag));
        self.entries.push_back(LsqEntry {
            tag,
            kind,
            addr: None,
            data: 0,
            size: 4,
            completed: false,
        });
        true
    }

    /// Records the effective address (and store data) for `tag`.
    pub fn resolve(&mut self, tag: Tag, addr: u64, data: u32) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.tag == tag) {
            entry.addr = Some(addr);
            entry.data = data;
            if entry.kind == MemKind::Store {
                entry.completed = true;
            }
        }
    }

    /// The oldest resolved load that has not started obtaining its value.
    pub fn next_load(&self) -> Option<&LsqEntry> {
        self.entries
            .iter()
            .find(|e| e.kind == MemKind::Load && e.addr.is_some() && !e.completed)
    }

    /// Plans how the load `tag` obtains its value.
    ///
    /// Scans older entries: an unresolved older store blocks speculation;
    /// otherwise the newest older store whose `[addr, addr+size)` fully
    /// covers the load's range forwards its data; a partial overlap blocks
    /// until that store commits.
    pub fn plan_load(&self, tag: Tag) -> LoadPlan {
        let Some(load) = self.entries.iter().find(|e| e.tag == tag) else {
            return LoadPlan::Blocked;
        };
        let Some(load_addr) = load.addr else {
            return LoadPlan::Blocked;
        };
        let load_end = load_addr + load.size;

        let mut plan = LoadPlan::Memory;
        for entry in self.entries.iter().take_while(|e| e.tag < tag) {
            if entry.kind != MemKind::Store {
                continue;
            }
            let Some(store_addr) = entry.addr else {
                // Older store with unknown address: the load may not pass it.
                return LoadPlan::Blocked;
            };
            let store_end = store_addr + entry.size;
            if load_addr < store_end && load_end > store_addr {
                plan = if store_addr <= load_addr && store_end >= load_end {
                    let offset = (load_addr - store_addr) as u32;
                    LoadPlan::Forward(entry.data >> (offset * 8))
                } else {
                    LoadPlan::Blocked
                };
                // Keep scanning: a newer (still older-than-load) store wins.
            }
        }
        plan
    }

    /// Marks a load as in flight / satisfied so it is not re-planned.
    pub fn mark_completed(&mut self, tag: Tag) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.tag == tag) {
            entry.completed = true;
        }
    }

    /// Removes a load once its value is on the bus.
    pub fn remove(&mut self, tag: Tag) {
        self.entries.retain(|e| e.tag != tag);
    }

    /// Retires the store `tag` from the queue head at commit.
    ///
    /// In-order commit guarantees every older memory operation has already
    /// left the queue, so the store must be at the head.
    pub fn pop_store(&mut self, tag: Tag) -> Option<LsqEntry> {
        let head = self.entries.front()?;
        debug_assert_eq!(head.tag, tag);
        debug_assert_eq!(head.kind, MemKind::Store);
        if head.tag == tag {
            self.entries.pop_front()
        } else {
            None
        }
    }

    /// Drops every operation younger than `tag` (misprediction squash).
    pub fn squash_after(&mut self, tag: Tag) {
        self.entries.retain(|e| e.tag <= tag);
    }
}
