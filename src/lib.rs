#![deny(clippy::all, clippy::pedantic)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![cfg_attr(
    test,
    allow(
        clippy::useless_vec,
        clippy::uninlined_format_args,
        clippy::cast_possible_truncation,
        clippy::float_cmp,
        clippy::cast_precision_loss
    )
)]
#![allow(clippy::module_name_repetitions)]
//
// Strategic lint exceptions - these are allowed project-wide for pragmatic reasons:
//
// Documentation lints: Many internal/self-documenting functions don't need extensive docs.
// Public APIs should still have proper documentation.
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]
//
// Cast safety: All casts in this codebase are carefully reviewed and bounded by
// wire-format constraints (byte-sized fields, 24-bit clock counts, etc). Using
// try_into() everywhere would add complexity without safety benefits here.
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
//
// Style/complexity: Block-walk orchestration naturally yields long match-heavy
// functions. Breaking them up would hurt readability.
#![allow(clippy::too_many_lines)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::similar_names)]
// e.g., h_active, v_active, h_blank are intentionally similar
//
// Pattern matching: These pedantic lints often suggest changes that reduce clarity.
#![allow(clippy::manual_let_else)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::if_same_then_else)]
#![allow(clippy::collapsible_match)]
//
// Low-value pedantic lints that add noise:
#![allow(clippy::struct_excessive_bools)] // Capability records naturally have many flags
#![allow(clippy::needless_continue)]
#![allow(clippy::needless_range_loop)]
#![allow(clippy::default_trait_access)]
#![allow(clippy::field_reassign_with_default)]
#![allow(clippy::unreadable_literal)] // Magic numbers in binary formats are clearer as hex
#![allow(clippy::len_without_is_empty)]
#![allow(clippy::map_unwrap_or)]
#![allow(clippy::return_self_not_must_use)]
//
// Return value wrapping: Some decoders use Result for consistency even when they
// currently can't fail, allowing future error conditions without breaking API.
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::unused_self)]

//! Decoder for EDID (1.2 through 1.4) and DisplayID (1.3, 2.0, 2.1) display
//! identification blobs, including CTA-861 extensions and HDMI vendor
//! blocks.
//!
//! One [`parse`] call produces a [`ParseReport`]: a flat, deduplicated,
//! priority-ordered mode table plus a structured [`DisplayCapabilities`]
//! record. The decoder is best-effort on malformed input - bad sub-blocks
//! are skipped and reported as [`ParseStatus`] entries - and never reads out
//! of bounds or panics on attacker-controlled bytes.

/// The edid-core crate version (matches `Cargo.toml`).
pub const EDID_CORE_VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod constants;
mod cursor;
pub mod decode;
pub mod error;
mod insert;
pub mod locator;
mod parse;
mod pending;
pub mod session;
pub mod tables;
pub mod types;
pub mod vic;

pub use error::{EdidError, Result};
pub use insert::insert_mode;
pub use parse::{parse, parse_with_table, ParseReport};
pub use session::{ParseSession, ParseStatus};
pub use types::capability::{
    AudioDescriptor, AudioFormat, Colorimetry, DisplayCapabilities, DscCapabilities, Eotfs,
    HdrStaticMetadata, RangeLimits, SpeakerAllocation, TileTopology, VendorIdentity, VrrRange,
};
pub use types::mode_table::{DefaultModePolicy, InsertOutcome, ModePolicy, ModeRow, ModeTable};
pub use types::timing::{
    AspectRatio, BitDepths, CeAttributes, ModeSource, RefreshClass, S3dFormats, SamplingModes,
    SignalStandard, TimingRecord, VicSlot,
};
