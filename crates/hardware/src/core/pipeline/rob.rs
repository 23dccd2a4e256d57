//! Reorder Buffer (ROB) for in-order commit.
//!
//! The ROB is a circular buffer tracking every in-flight instruction from
//! decode through commit. It provides:
//! 1. **Allocation:** Assigns the monotonic program-order tag at decode.
//! 2. **Completion:** Marks instructions done when their result broadcasts.
//! 3. **In-order Commit:** Retires instructions from the head in program order.
//! 4. **Squash:** Frees every entry younger than a mispredicted branch.
//!
//! The tag doubles as the sequence number: program order, producer
//! identity, and squash predicates are all comparisons on one key.

use crate::common::error::Fault;
use crate::core::pipeline::rename::RenameSnapshot;
use crate::isa::Opcode;

/// Monotonic program-order tag, assigned at decode.
///
/// Serves both as the sequence number and as the producer tag consumed by
/// reservation-station operands. Tag 0 is never allocated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Tag(pub u64);

/// Lifecycle state of an ROB entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum RobState {
    /// Allocated; result not yet available.
    #[default]
    Issued,
    /// Result available; waiting to reach the head.
    Completed,
    /// Faulted; the fault is surfaced when the entry reaches the head.
    Faulted,
}

/// A single entry in the Reorder Buffer.
#[derive(Clone, Debug, Default)]
pub struct RobEntry {
    /// Program-order tag of this entry.
    pub tag: Tag,
    /// Program counter of the instruction.
    pub pc: u64,
    /// Operation (used for commit-time classification).
    pub opcode: Option<Opcode>,
    /// Destination architectural register, if any.
    pub dst: Option<usize>,
    /// Result value to write at commit.
    pub result: u32,
    /// Current lifecycle state.
    pub state: RobState,
    /// Fault recorded at execution, if any.
    pub fault: Option<Fault>,
    /// True when this is the exit sentinel.
    pub halt: bool,
    /// True for stores (commit writes the D-cache).
    pub is_store: bool,
    /// True for control transfers that consulted the predictor.
    pub is_branch: bool,
    /// Predicted direction.
    pub pred_taken: bool,
    /// Predicted next PC.
    pub pred_target: u64,
    /// Resolved direction.
    pub actual_taken: bool,
    /// Resolved next PC.
    pub actual_target: u64,
    /// Global history register at predict time (for recovery and training).
    pub history_at_predict: u64,
    /// Rename-map snapshot captured at decode (branches only).
    pub snapshot: Option<RenameSnapshot>,
    /// Whether this slot is occupied.
    pub valid: bool,
}

/// Reorder Buffer — circular buffer for in-order commit.
pub struct Rob {
    entries: Vec<RobEntry>,
    head: usize,
    tail: usize,
    count: usize,
    next_tag: u64,
}

impl Rob {
    /// Creates a new ROB with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let mut entries = Vec::with_capacity(capacity);
        entries.resize_with(capacity, RobEntry::default);
        Self {
            entries,
            head: 0,
            tail: 0,
            count: 0,
            next_tag: 1,
        }
    }

    /// Returns the ROB capacity.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    /// Returns the number of occupied entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    /// Returns true if the ROB is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Returns true if the ROB is full.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.count == self.entries.len()
    }

    /// Allocates the next entry in program order. Returns `None` when full.
    pub fn allocate(&mut self, entry: RobEntry) -> Option<Tag> {
        if self.is_full() {
            return None;
        }
        let tag = Tag(self.next_tag);
        self.next_tag += 1;

        self.entries[self.tail] = RobEntry {
            tag,
            state: RobState::Issued,
            valid: true,
            ..entry
        };
        self.tail = (self.tail + 1) % self.entries.len();
        self.count += 1;
        debug_assert!(self.count <= self.entries.len());
        Some(tag)
    }

    /// Marks an entry Completed with its result value.
    pub fn complete(&mut self, tag: Tag, result: u32) {
        if let Some(entry) = self.find_entry_mut(tag) {
            entry.state = RobState::Completed;
            entry.result = result;
        }
    }

    /// Marks an entry Faulted.
    pub fn fault(&mut self, tag: Tag, fault: Fault) {
        if let Some(entry) = self.find_entry_mut(tag) {
            entry.state = RobState::Faulted;
            entry.fault = Some(fault);
        }
    }

    /// Records the resolved direction and target of a control transfer.
    pub fn set_branch_outcome(&mut self, tag: Tag, taken: bool, target: u64) {
        if let Some(entry) = self.find_entry_mut(tag) {
            entry.actual_taken = taken;
            entry.actual_target = target;
        }
    }

    /// Marks an entry as the exit sentinel.
    pub fn set_halt(&mut self, tag: Tag) {
        if let Some(entry) = self.find_entry_mut(tag) {
            entry.halt = true;
        }
    }

    /// Returns the head entry (oldest), if any.
    pub fn peek_head(&self) -> Option<&RobEntry> {
        if self.count == 0 {
            None
        } else {
            Some(&self.entries[self.head])
        }
    }

    /// Retires the head entry if it is no longer Issued.
    ///
    /// Returns `None` when the ROB is empty or the head is not ready; the
    /// caller stops committing for the cycle in either case.
    pub fn commit_head(&mut self) -> Option<RobEntry> {
        if self.count == 0 || self.entries[self.head].state == RobState::Issued {
            return None;
        }
        let committed = self.entries[self.head].clone();
        self.entries[self.head].valid = false;
        self.head = (self.head + 1) % self.entries.len();
        self.count -= 1;
        Some(committed)
    }

    /// Frees every entry with a tag greater than `tag`.
    ///
    /// Used on misprediction squash; with resolution at the head, this
    /// empties the ROB, but the predicate form keeps the operation correct
    /// for any resolution point.
    pub fn squash_after(&mut self, tag: Tag) {
        while self.count > 0 {
            let last = if self.tail == 0 {
                self.entries.len() - 1
            } else {
                self.tail - 1
            };
            if self.entries[last].tag <= tag {
                break;
            }
            self.entries[last].valid = false;
            self.tail = last;
            self.count -= 1;
        }
    }

    /// Finds the entry with the given tag.
    pub fn find_entry(&self, tag: Tag) -> Option<&RobEntry> {
        if self.count == 0 {
            return None;
        }
        let mut idx = self.head;
        for _ in 0..self.count {
            if self.entries[idx].valid && self.entries[idx].tag == tag {
                return Some(&self.entries[idx]);
            }
            idx = (idx + 1) % self.entries.len();
        }
        None
    }

    fn find_entry_mut(&mut self, tag: Tag) -> Option<&mut RobEntry> {
        if self.count == 0 {
            return None;
        }
        let mut idx = self.head;
        for _ in 0..self.count {
            if self.entries[idx].valid && self.entries[idx].tag == tag {
                return Some(&mut self.entries[idx]);
            }
            idx = (idx + 1) % self.entries.len();
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alu_entry(pc: u64, dst: usize) -> RobEntry {
        RobEntry {
            pc,
            opcode: Some(Opcode::Add),
            dst: Some(dst),
            ..Default::default()
        }
    }

    #[test]
    fn test_allocate_and_commit() {
        let mut rob = Rob::new(4);
        assert!(rob.is_empty());

        let tag = rob.allocate(alu_entry(0x1000, 8)).unwrap();
        assert_eq!(rob.len(), 1);

        // Can't commit while still Issued.
        assert!(rob.commit_head().is_none());

        rob.complete(tag, 42);
        let entry = rob.commit_head().unwrap();
        assert_eq!(entry.pc, 0x1000);
        assert_eq!(entry.result, 42);
        assert!(rob.is_empty());
    }

    #[test]
    fn test_full_rob() {
        let mut rob = Rob::new(2);
        rob.allocate(alu_entry(0x1000, 1)).unwrap();
        rob.allocate(alu_entry(0x1004, 2)).unwrap();
        assert!(rob.is_full());
        assert!(rob.allocate(alu_entry(0x1008, 3)).is_none());
    }

    #[test]
    fn test_in_order_commit() {
        let mut rob = Rob::new(4);
        let t1 = rob.allocate(alu_entry(0x1000, 1)).unwrap();
        let t2 = rob.allocate(alu_entry(0x1004, 2)).unwrap();

        // Complete t2 first (out of order).
        rob.complete(t2, 200);
        assert!(rob.commit_head().is_none());

        rob.complete(t1, 100);
        assert_eq!(rob.commit_head().unwrap().result, 100);
        assert_eq!(rob.commit_head().unwrap().result, 200);
    }

    #[test]
    fn test_tags_monotonic() {
        let mut rob = Rob::new(2);
        let t1 = rob.allocate(alu_entry(0, 1)).unwrap();
        rob.complete(t1, 0);
        rob.commit_head().unwrap();
        let t2 = rob.allocate(alu_entry(4, 1)).unwrap();
        assert!(t2 > t1);
    }

    #[test]
    fn test_fault_surfaces_at_head() {
        let mut rob = Rob::new(4);
        let t1 = rob.allocate(alu_entry(0x1000, 1)).unwrap();
        rob.fault(t1, Fault::Overflow);
        let entry = rob.commit_head().unwrap();
        assert_eq!(entry.state, RobState::Faulted);
        assert_eq!(entry.fault, Some(Fault::Overflow));
    }

    #[test]
    fn test_squash_after() {
        let mut rob = Rob::new(8);
        let t1 = rob.allocate(alu_entry(0x1000, 1)).unwrap();
        rob.allocate(alu_entry(0x1004, 2)).unwrap();
        rob.allocate(alu_entry(0x1008, 3)).unwrap();

        rob.squash_after(t1);
        assert_eq!(rob.len(), 1);

        // The surviving entry still commits normally.
        rob.complete(t1, 7);
        assert_eq!(rob.commit_head().unwrap().result, 7);

        // Freed slots are reallocatable with fresh, larger tags.
        let t4 = rob.allocate(alu_entry(0x100c, 4)).unwrap();
        assert!(t4 > t1);
    }

    #[test]
    fn test_circular_wraparound() {
        let mut rob = Rob::new(2);
        for i in 0..10u32 {
            let tag = rob.allocate(alu_entry(u64::from(i) * 4, 1)).unwrap();
            rob.complete(tag, i);
            assert_eq!(rob.commit_head().unwrap().result, i);
        }
    }

    #[test]
    fn test_occupancy_bounded() {
        let mut rob = Rob::new(4);
        for _ in 0..4 {
            rob.allocate(alu_entry(0, 1));
        }
        assert_eq!(rob.len(), rob.capacity());
        assert!(rob.allocate(alu_entry(0, 1)).is_none());
        assert_eq!(rob.len(), 4);
    }
}
