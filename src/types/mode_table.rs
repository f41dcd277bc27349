//! The caller-visible mode table and its insertion protocol.
//!
//! Dedup identity is intentionally not VIC identity: two rows are the same
//! mode when they agree on active geometry, rounded refresh rate, refresh
//! classification, interlace and sampling tag. A VIC that was merged in the
//! VIC registry can still fan out into several rows here, one per sampling
//! mode it supports. The match and replace rules are injectable so an
//! embedder with different dedup needs can supply its own policy.

use serde::{Deserialize, Serialize};

use super::timing::{BitDepths, SamplingModes, TimingRecord};

/// One row of the caller-visible table: a timing transmitted with exactly one
/// sampling mode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModeRow {
    pub timing: TimingRecord,
    pub sampling: SamplingModes,
    pub bit_depths: BitDepths,
    pub preferred: bool,
    pub tiled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RejectReason {
    ZeroGeometry,
    ZeroPixelClock,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum InsertOutcome {
    Inserted,
    ReplacedExisting,
    KeptExisting,
    Rejected(RejectReason),
}

/// Dedup and override rules for [`ModeTable::add_entry`].
pub trait ModePolicy {
    /// Do two rows describe the same logical mode?
    fn matches(&self, existing: &ModeRow, candidate: &ModeRow) -> bool;

    /// Merge `candidate` over `existing` after a forced match. Must never
    /// clear an already-set preferred flag.
    fn replace(&self, existing: &mut ModeRow, candidate: &ModeRow);
}

/// Reference policy: geometry + rounded refresh + refresh classification +
/// interlace + sampling tag.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultModePolicy;

impl ModePolicy for DefaultModePolicy {
    fn matches(&self, existing: &ModeRow, candidate: &ModeRow) -> bool {
        let (a, b) = (&existing.timing, &candidate.timing);
        a.h_active == b.h_active
            && a.v_active == b.v_active
            && a.refresh_hz_rounded() == b.refresh_hz_rounded()
            && a.refresh_class() == b.refresh_class()
            && a.interlaced == b.interlaced
            && existing.sampling == candidate.sampling
    }

    fn replace(&self, existing: &mut ModeRow, candidate: &ModeRow) {
        let was_preferred = existing.preferred;
        *existing = *candidate;
        existing.preferred |= was_preferred;
    }
}

/// Caller-owned sink for decoded modes. Insertion is by value; the table
/// never retains references into parser state.
pub struct ModeTable {
    rows: Vec<ModeRow>,
    policy: Box<dyn ModePolicy + Send + Sync>,
}

impl Default for ModeTable {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ModeTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModeTable").field("rows", &self.rows).finish()
    }
}

impl ModeTable {
    #[must_use]
    pub fn new() -> Self {
        Self::with_policy(Box::new(DefaultModePolicy))
    }

    #[must_use]
    pub fn with_policy(policy: Box<dyn ModePolicy + Send + Sync>) -> Self {
        Self {
            rows: Vec::new(),
            policy,
        }
    }

    #[must_use]
    pub fn rows(&self) -> &[ModeRow] {
        &self.rows
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn into_rows(self) -> Vec<ModeRow> {
        self.rows
    }

    /// Insert a row under the dedup/override protocol.
    ///
    /// - no matching row: append.
    /// - match and `force_add` unset: keep the existing row (duplicate).
    /// - match and `force_add` set: replace in place, unless the existing row
    ///   is preferred and the candidate is not; a previously-marked preferred
    ///   mode is never demoted by a later, lower-priority duplicate.
    pub fn add_entry(&mut self, candidate: ModeRow, force_add: bool) -> InsertOutcome {
        if candidate.timing.h_active == 0 || candidate.timing.v_active == 0 {
            return InsertOutcome::Rejected(RejectReason::ZeroGeometry);
        }
        if candidate.timing.pixel_clock_hz == 0 {
            return InsertOutcome::Rejected(RejectReason::ZeroPixelClock);
        }

        let existing = self
            .rows
            .iter_mut()
            .find(|row| self.policy.matches(row, &candidate));
        match existing {
            None => {
                self.rows.push(candidate);
                InsertOutcome::Inserted
            }
            Some(_) if !force_add => InsertOutcome::KeptExisting,
            Some(row) => {
                if row.preferred && !candidate.preferred {
                    InsertOutcome::KeptExisting
                } else {
                    self.policy.replace(row, &candidate);
                    InsertOutcome::ReplacedExisting
                }
            }
        }
    }
}
