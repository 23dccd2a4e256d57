//! Register rename map.
//!
//! Maps each architectural register to the tag of its latest in-flight
//! producer, or `None` when the committed value in the register file is
//! current. Decode snapshots source producer tags from this map and
//! overwrites the destination's producer; commit clears an entry only when
//! it still points at the committing instruction (WAW discipline).
//!
//! Branches capture a snapshot of the whole map at decode. On a
//! misprediction squash the snapshot is restored, pruned against the ROB:
//! a snapshot tag whose instruction has since committed means the value is
//! architectural and the slot is cleared rather than re-pointed at a
//! retired entry.

use crate::common::reg::NUM_REGS;
use crate::core::pipeline::rob::{Rob, Tag};

/// Copy of the rename map captured at a branch's decode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenameSnapshot {
    producers: [Option<Tag>; NUM_REGS],
}

/// The rename map: architectural register → latest in-flight producer.
pub struct RenameMap {
    producers: [Option<Tag>; NUM_REGS],
}

impl Default for RenameMap {
    fn default() -> Self {
        Self::new()
    }
}

impl RenameMap {
    /// Creates a rename map with no pending producers.
    pub fn new() -> Self {
        Self {
            producers: [None; NUM_REGS],
        }
    }

    /// Marks `reg` as produced by `tag`. No-op for `$zero`.
    pub fn set_producer(&mut self, reg: usize, tag: Tag) {
        if reg != 0 {
            self.producers[reg] = Some(tag);
        }
    }

    /// The latest pending producer for `reg`, or `None` if the register
    /// file holds the current value.
    pub fn producer(&self, reg: usize) -> Option<Tag> {
        self.producers[reg]
    }

    /// Clears `reg`'s producer, but only if it still points at `tag`.
    ///
    /// A committing instruction must not clear a tag set by a newer rename
    /// of the same register.
    pub fn clear_if_match(&mut self, reg: usize, tag: Tag) {
        if self.producers[reg] == Some(tag) {
            self.producers[reg] = None;
        }
    }

    /// Captures the current map.
    pub fn snapshot(&self) -> RenameSnapshot {
        RenameSnapshot {
            producers: self.producers,
        }
    }

    /// Restores a snapshot, pruning tags that have left the ROB.
    ///
    /// With branch resolution at the ROB head every snapshot tag has
    /// already committed and this degenerates to a full clear; pruning
    /// keeps the operation correct for earlier resolution points.
    pub fn restore(&mut self, snapshot: &RenameSnapshot, rob: &Rob) {
        for (reg, snap) in snapshot.producers.iter().enumerate() {
            self.producers[reg] = snap.filter(|tag| rob.find_entry(*tag).is_some());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::pipeline::rob::RobEntry;

    #[test]
    fn test_zero_register_never_renamed() {
        let mut map = RenameMap::new();
        map.set_producer(0, Tag(3));
        assert_eq!(map.producer(0), None);
    }

    #[test]
    fn test_set_and_clear() {
        let mut map = RenameMap::new();
        map.set_producer(5, Tag(10));
        assert_eq!(map.producer(5), Some(Tag(10)));
        map.clear_if_match(5, Tag(10));
        assert_eq!(map.producer(5), None);
    }

    #[test]
    fn test_clear_mismatch_preserves_newer_rename() {
        let mut map = RenameMap::new();
        map.set_producer(3, Tag(10));
        // A newer instruction renames the same register.
        map.set_producer(3, Tag(20));

        // The old producer commits; the newer rename must survive.
        map.clear_if_match(3, Tag(10));
        assert_eq!(map.producer(3), Some(Tag(20)));
    }

    #[test]
    fn test_snapshot_restore_prunes_retired_tags() {
        let mut rob = Rob::new(4);
        let live = rob.allocate(RobEntry::default()).unwrap();
        let retired = rob.allocate(RobEntry::default()).unwrap();

        let mut map = RenameMap::new();
        map.set_producer(1, live);
        map.set_producer(2, retired);
        let snapshot = map.snapshot();

        // Squash everything younger than `live`, so `retired` leaves the ROB.
        rob.squash_after(live);
        map.set_producer(1, Tag(99));
        map.set_producer(3, Tag(100));

        map.restore(&snapshot, &rob);
        assert_eq!(map.producer(1), Some(live));
        assert_eq!(map.producer(2), None); // pruned: no longer in flight
        assert_eq!(map.producer(3), None); // not in snapshot
    }
}
