//! Reservation stations.
//!
//! One station per functional-unit class holds issued-but-not-executed
//! instructions. Each operand slot is either a value (ready) or the tag of
//! its in-flight producer; the common data bus fills pending slots as
//! results broadcast. The dispatch rule selects the oldest entry whose
//! operands are all ready — out-of-order execution falls out of younger
//! ready entries overtaking older waiting ones.

use crate::core::pipeline::rob::Tag;
use crate::isa::{FuClass, Opcode};

/// One operand slot: a value, or the producer tag it is waiting on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Operand {
    /// Operand value; meaningful once `tag` is `None`.
    pub value: u32,
    /// Pending producer, if the value has not arrived yet.
    pub tag: Option<Tag>,
}

impl Operand {
    /// A ready operand with a known value.
    pub fn ready(value: u32) -> Self {
        Self { value, tag: None }
    }

    /// An operand waiting on `tag`.
    pub fn pending(tag: Tag) -> Self {
        Self {
            value: 0,
            tag: Some(tag),
        }
    }

    /// True once the value is available.
    #[inline]
    pub fn is_ready(&self) -> bool {
        self.tag.is_none()
    }
}

/// An issued instruction waiting in (or dispatched from) a station.
#[derive(Clone, Copy, Debug)]
pub struct StationEntry {
    /// Program-order tag (also the ROB destination of the result).
    pub tag: Tag,
    /// Program counter.
    pub pc: u64,
    /// Operation.
    pub opcode: Opcode,
    /// First operand.
    pub a: Operand,
    /// Second operand.
    pub b: Operand,
    /// Immediate (shift amounts, `li`/`la` values).
    pub imm: i64,
    /// Memory displacement.
    pub disp: i32,
    /// Statically resolved target for direct control transfers.
    pub static_target: Option<u64>,
    /// Predicted direction (carried through for resolution bookkeeping).
    pub pred_taken: bool,
    /// Predicted next PC.
    pub pred_target: u64,
    /// Cycle the entry was installed (diagnostics).
    pub issued_cycle: u64,
}

impl StationEntry {
    /// True when both operand slots hold values.
    #[inline]
    pub fn operands_ready(&self) -> bool {
        self.a.is_ready() && self.b.is_ready()
    }
}

/// A fixed-capacity reservation station for one functional-unit class.
pub struct Station {
    class: FuClass,
    entries: Vec<StationEntry>,
    capacity: usize,
}

impl Station {
    /// Creates a station for `class` with room for `capacity` entries.
    pub fn new(class: FuClass, capacity: usize) -> Self {
        Self {
            class,
            entries: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// The class this station feeds.
    #[inline]
    pub fn class(&self) -> FuClass {
        self.class
    }

    /// Number of occupied entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no entries are waiting.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True if an entry can be installed.
    #[inline]
    pub fn has_free(&self) -> bool {
        self.entries.len() < self.capacity
    }

    /// Installs an issued instruction. Returns false when full.
    pub fn insert(&mut self, entry: StationEntry) -> bool {
        if !self.has_free() {
            return false;
        }
        debug_assert_eq!(entry.opcode.class(), self.class);
        self.entries.push(entry);
        true
    }

    /// Removes and returns the oldest entry whose operands are ready.
    ///
    /// Greedy-oldest (lowest tag) is the dispatch tie-break rule.
    pub fn take_ready_oldest(&mut self) -> Option<StationEntry> {
        let pos = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.operands_ready())
            .min_by_key(|(_, e)| e.tag)
            .map(|(i, _)| i)?;
        Some(self.entries.swap_remove(pos))
    }

    /// True if some entry is waiting on an operand.
    pub fn has_waiting(&self) -> bool {
        self.entries.iter().any(|e| !e.operands_ready())
    }

    /// Fills every operand slot waiting on `tag` with `value`.
    pub fn broadcast(&mut self, tag: Tag, value: u32) {
        for entry in &mut self.entries {
            for slot in [&mut entry.a, &mut entry.b] {
                if slot.tag == Some(tag) {
                    slot.value = value;
                    slot.tag = None;
                }
            }
        }
    }

    /// Drops every entry younger than `tag` (misprediction squash).
    pub fn squash_after(&mut self, tag: Tag) {
        self.entries.retain(|e| e.tag <= tag);
    }
}
