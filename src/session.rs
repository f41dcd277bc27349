//! Per-call parse state.

use serde::Serialize;

use crate::error::EdidError;
use crate::pending::PendingList;
use crate::types::capability::DisplayCapabilities;
use crate::types::mode_table::ModeTable;
use crate::vic::VicRegistry;

/// A non-fatal problem encountered while parsing; the offending sub-block was
/// skipped and parsing continued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseStatus {
    /// Which part of the walk reported the problem.
    pub context: &'static str,
    pub error: EdidError,
}

/// Everything one parse call owns. Created at the start of the call,
/// destroyed at its end; never shared across calls.
pub struct ParseSession {
    pub caps: DisplayCapabilities,
    pub table: ModeTable,
    pub(crate) vics: VicRegistry,
    pub(crate) pending: PendingList,
    /// DTDs found in the base block; denominators for VFPDB resolution.
    pub(crate) base_dtd_count: usize,
    /// VFPDB DTD back-references accumulated across CTA blocks.
    pub(crate) vfpdb_dtd_mask: u16,
    pub(crate) total_timings: usize,
    /// Latched once any preferred mode reaches the table.
    pub(crate) preferred_added: bool,
    pub statuses: Vec<ParseStatus>,
}

impl ParseSession {
    #[must_use]
    pub fn new(table: ModeTable) -> Self {
        Self {
            caps: DisplayCapabilities::default(),
            table,
            vics: VicRegistry::default(),
            pending: PendingList::default(),
            base_dtd_count: 0,
            vfpdb_dtd_mask: 0,
            total_timings: 0,
            preferred_added: false,
            statuses: Vec::new(),
        }
    }

    /// Record a recoverable error and keep going. Capacity errors are
    /// deduplicated so a full registry reports once, not per block.
    pub fn note(&mut self, context: &'static str, error: EdidError) {
        if error.is_capacity()
            && self
                .statuses
                .iter()
                .any(|s| s.error.is_capacity() && s.error == error)
        {
            return;
        }
        tracing::debug!(status.context = context, status.error = %error, "recoverable parse error");
        self.statuses.push(ParseStatus { context, error });
    }
}
