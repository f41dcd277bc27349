//! Public types exposed by the `edid-core` crate.

pub mod capability;
pub mod mode_table;
pub mod timing;

pub use capability::{
    AudioDescriptor, AudioFormat, Colorimetry, DisplayCapabilities, DscCapabilities, Eotfs,
    HdrStaticMetadata, RangeLimits, SpeakerAllocation, TileTopology, VendorIdentity, VrrRange,
};
pub use mode_table::{
    DefaultModePolicy, InsertOutcome, ModePolicy, ModeRow, ModeTable, RejectReason,
};
pub use timing::{
    AspectRatio, BitDepths, CeAttributes, ModeSource, RefreshClass, S3dFormats, SamplingModes,
    SignalStandard, TimingRecord, VicSlot,
};
