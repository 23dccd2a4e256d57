//! Instruction pipeline implementation.
//!
//! The pipeline is organized arena-plus-index: the [`engine::Engine`] owns
//! every shared structure (ROB, rename map, reservation stations, LSQ,
//! CDB, caches) and is the sole mutator; the six stage functions receive
//! short-lived borrows of it, one call per cycle each, in reverse pipeline
//! order. Components refer to instructions by program-order tag, never by
//! shared mutable reference.
//!
//! 1. **Engine:** Cycle orchestration, squash, run loop.
//! 2. **ROB:** Reorder buffer for in-order commit.
//! 3. **Rename:** Architectural register → producer-tag map with snapshots.
//! 4. **Stations:** Per-class reservation stations.
//! 5. **LSQ:** Program-order load/store queue with forwarding.
//! 6. **CDB:** Width-limited result broadcast.
//! 7. **Latches:** Inter-stage buffers.

/// Width-limited common data bus.
pub mod cdb;

/// Pipeline driver owning all arenas.
pub mod engine;

/// Inter-stage pipeline latches.
pub mod latches;

/// Program-order load/store queue.
pub mod lsq;

/// Register rename map and squash snapshots.
pub mod rename;

/// Reorder buffer for in-order commit.
pub mod rob;

/// Per-class reservation stations.
pub mod station;

/// The six pipeline stage functions.
pub mod stages;
