//! Functional-unit pools.
//!
//! Each class (ALU, FPU, LSU) owns a fixed number of units with a common
//! latency. A unit holds at most one instruction; occupancy counts down
//! one per cycle and the entry is harvested when it reaches zero. A unit
//! freed in a cycle may accept new work in the same cycle's dispatch,
//! which is what lets a latency-L chain sustain one result every L cycles.

use crate::config::UnitConfig;
use crate::core::pipeline::rob::Tag;
use crate::core::pipeline::station::StationEntry;
use crate::isa::FuClass;
use crate::stats::FuUtilization;

/// One in-flight instruction inside a unit.
#[derive(Clone, Debug)]
struct InFlight {
    entry: StationEntry,
    remaining: u64,
}

/// A single functional unit.
#[derive(Clone, Debug, Default)]
struct FuncUnit {
    slot: Option<InFlight>,
    busy_cycles: u64,
}

/// A pool of identical functional units of one class.
pub struct FuPool {
    class: FuClass,
    latency: u64,
    units: Vec<FuncUnit>,
}

impl FuPool {
    /// Creates a pool from the unit-class configuration.
    pub fn new(class: FuClass, config: &UnitConfig) -> Self {
        Self {
            class,
            latency: config.latency,
            units: vec![FuncUnit::default(); config.count],
        }
    }

    /// The class this pool serves.
    #[inline]
    pub fn class(&self) -> FuClass {
        self.class
    }

    /// True if at least one unit is idle.
    pub fn any_free(&self) -> bool {
        self.units.iter().any(|u| u.slot.is_none())
    }

    /// True if any unit currently holds an instruction.
    pub fn any_busy(&self) -> bool {
        self.units.iter().any(|u| u.slot.is_some())
    }

    /// Binds a station entry to a free unit.
    ///
    /// # Panics
    ///
    /// Panics if no unit is free; the dispatch rule checks `any_free` first.
    pub fn dispatch(&mut self, entry: StationEntry) {
        let unit = self
            .units
            .iter_mut()
            .find(|u| u.slot.is_none())
            .unwrap_or_else(|| panic!("dispatch to busy {} pool", self.class.name()));
        unit.slot = Some(InFlight {
            entry,
            remaining: self.latency,
        });
    }

    /// Advances every occupied unit one cycle and harvests completions.
    ///
    /// Returned entries are those whose occupancy reached zero this cycle.
    pub fn tick(&mut self) -> Vec<StationEntry> {
        let mut done = Vec::new();
        for unit in &mut self.units {
            if let Some(flight) = &mut unit.slot {
                // A unit occupied longer than its latency is a scheduler bug.
                debug_assert!(flight.remaining >= 1 && flight.remaining <= self.latency);
                unit.busy_cycles += 1;
                flight.remaining -= 1;
                if flight.remaining == 0 {
                    let finished = unit.slot.take().map(|f| f.entry);
                    if let Some(entry) = finished {
                        done.push(entry);
                    }
                }
            }
        }
        done
    }

    /// Drops all in-flight work younger than `tag` (misprediction squash).
    pub fn squash_after(&mut self, tag: Tag) {
        for unit in &mut self.units {
            if unit
                .slot
                .as_ref()
                .is_some_and(|flight| flight.entry.tag > tag)
            {
                unit.slot = None;
            }
        }
    }

    /// Per-unit busy histogram over `cycles` total cycles.
    pub fn utilization(&self, cycles: u64) -> Vec<FuUtilization> {
        let denom = cycles.max(1);
        self.units
            .iter()
            .enumerate()
            .map(|(i, unit)| FuUtilization {
                unit: format!("{}{}", self.class.name(), i),
                busy_cycles: unit.busy_cycles,
                utilization: unit.busy_cycles as f64 / denom as f64,
            })
            .collect()
    }
}
