//! Pending-list buffering and the VFPDB preferred-index resolver.
//!
//! Detailed timings are buffered in strict discovery order: all CE extension
//! DTDs first (in block order), then all base-block DTDs. The wire format
//! expresses "preferred timing #N" as an index into the *virtual*
//! concatenation of base-block DTDs followed by extension DTDs, which is the
//! opposite of discovery order, so resolution is a post-pass over the buffer.

use crate::constants::MAX_MODES_DEFINED;
use crate::error::{EdidError, Result};
use crate::types::timing::{ModeSource, TimingRecord};

#[derive(Debug, Clone, Copy)]
pub struct PendingEntry {
    pub timing: TimingRecord,
    pub force_add: bool,
}

/// Ordered buffer of discovered detailed timings, bounded by
/// [`MAX_MODES_DEFINED`]. Overflow is a reported error, never a silent drop.
#[derive(Debug, Default)]
pub struct PendingList {
    entries: Vec<PendingEntry>,
}

impl PendingList {
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn entries(&self) -> &[PendingEntry] {
        &self.entries
    }

    pub fn append(&mut self, timing: TimingRecord, force_add: bool) -> Result<usize> {
        if self.entries.len() >= MAX_MODES_DEFINED {
            return Err(EdidError::CapacityExceeded {
                registry: "pending timing list",
                capacity: MAX_MODES_DEFINED,
            });
        }
        self.entries.push(PendingEntry { timing, force_add });
        Ok(self.entries.len() - 1)
    }

    /// Resolve a VFPDB DTD preference mask. A set bit at position `b` refers
    /// to the `b`-th base-block DTD when `b < base_dtd_count`, otherwise to
    /// the `(b - base_dtd_count)`-th extension DTD, counting each group by
    /// its own source tag in pending order.
    pub fn resolve_preferred(&mut self, dtd_mask: u16, base_dtd_count: usize) {
        if dtd_mask == 0 {
            return;
        }
        let mut base_seen = 0usize;
        let mut ext_seen = 0usize;
        for entry in &mut self.entries {
            let bit = match entry.timing.source {
                ModeSource::BaseDtd => {
                    let ordinal = base_seen;
                    base_seen += 1;
                    if ordinal >= 16 {
                        continue;
                    }
                    ordinal
                }
                ModeSource::CeDtd => {
                    let ordinal = ext_seen;
                    ext_seen += 1;
                    let virtual_index = base_dtd_count + ordinal;
                    if virtual_index >= 16 {
                        continue;
                    }
                    virtual_index
                }
                _ => continue,
            };
            if dtd_mask & (1 << bit) != 0 {
                tracing::debug!(
                    pending.bit = bit,
                    pending.source = ?entry.timing.source,
                    "marking preferred timing from preference block"
                );
                entry.timing.preferred = true;
            }
        }
    }

    /// Drain the buffer in discovery order for final insertion.
    pub fn drain(&mut self) -> impl Iterator<Item = PendingEntry> + '_ {
        self.entries.drain(..)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timing(source: ModeSource, tag: u32) -> TimingRecord {
        TimingRecord {
            pixel_clock_hz: 100_000_000,
            h_active: 1000 + tag,
            v_active: 1000,
            source,
            ..TimingRecord::default()
        }
    }

    #[test]
    fn vfpdb_indirection_across_discovery_order() {
        // Discovery order: 3 extension DTDs then 2 base DTDs.
        let mut pending = PendingList::default();
        for i in 0..3 {
            pending.append(timing(ModeSource::CeDtd, i), true).unwrap();
        }
        for i in 0..2 {
            pending.append(timing(ModeSource::BaseDtd, 10 + i), true).unwrap();
        }

        // Bit 0 -> 1st base DTD; bit 3 -> 2nd extension DTD (base_dtd_count=2).
        pending.resolve_preferred(0b1001, 2);

        let entries = pending.entries();
        assert!(entries[3].timing.preferred, "1st base DTD");
        assert!(entries[1].timing.preferred, "2nd extension DTD");
        assert!(!entries[0].timing.preferred);
        assert!(!entries[2].timing.preferred);
        assert!(!entries[4].timing.preferred);
    }

    #[test]
    fn overflow_is_reported_not_dropped() {
        let mut pending = PendingList::default();
        for i in 0..MAX_MODES_DEFINED {
            pending
                .append(timing(ModeSource::CeDtd, i as u32), false)
                .unwrap();
        }
        let err = pending.append(timing(ModeSource::BaseDtd, 999), false).unwrap_err();
        assert!(err.is_capacity());
        assert_eq!(pending.len(), MAX_MODES_DEFINED);
    }
}
