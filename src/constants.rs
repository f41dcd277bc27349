//! Capacity bounds, wire tags and tolerances shared across the crate.

/// Size of one EDID block (base block or extension block).
pub const EDID_BLOCK_SIZE: usize = 128;

/// The fixed 8-byte EDID header signature.
pub const EDID_SIGNATURE: [u8; 8] = [0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x00];

/// Upper bound on distinct VIC registry entries per parse session.
pub const MAX_VIC_DEFINED: usize = 64;

/// Upper bound on buffered pending timings per parse session.
pub const MAX_MODES_DEFINED: usize = 128;

/// Highest VIC id with a defined reference timing (CTA-861-H table 3).
pub const MAX_VIC_ID: u8 = 219;

// EDID extension block tags (byte 0 of the 128-byte extension).
pub const EXT_TAG_CTA: u8 = 0x02;
pub const EXT_TAG_DISPLAYID: u8 = 0x70;

// CTA-861 data block tags (bits 7..5 of the header byte).
pub const CTA_TAG_AUDIO: u8 = 0x01;
pub const CTA_TAG_VIDEO: u8 = 0x02;
pub const CTA_TAG_VENDOR: u8 = 0x03;
pub const CTA_TAG_SPEAKER: u8 = 0x04;
pub const CTA_TAG_EXTENDED: u8 = 0x07;

// CTA-861 extended tags (first payload byte of a tag-7 block).
pub const CTA_EXT_VIDEO_CAPABILITY: u8 = 0x00;
pub const CTA_EXT_COLORIMETRY: u8 = 0x05;
pub const CTA_EXT_HDR_STATIC: u8 = 0x06;
pub const CTA_EXT_VFPDB: u8 = 0x0D;
pub const CTA_EXT_YCBCR420_VIDEO: u8 = 0x0E;
pub const CTA_EXT_YCBCR420_CAP_MAP: u8 = 0x0F;
pub const CTA_EXT_DID_TYPE_VII: u8 = 0x22;
pub const CTA_EXT_HF_SCDB: u8 = 0x79;

// 24-bit vendor registration ids carried by CTA vendor data blocks.
pub const OUI_HDMI: u32 = 0x00_0C03;
pub const OUI_HDMI_FORUM: u32 = 0xC4_5DD8;
pub const OUI_HDR10_PLUS: u32 = 0x90_848B;

// DisplayID 1.x data block tags.
pub const DID1_TAG_TYPE_I_TIMING: u8 = 0x03;
pub const DID1_TAG_TYPE_III_TIMING: u8 = 0x05;
pub const DID1_TAG_TILED_TOPOLOGY: u8 = 0x12;

// DisplayID 2.x data block tags.
pub const DID2_TAG_TYPE_VII_TIMING: u8 = 0x22;
pub const DID2_TAG_TYPE_VIII_TIMING: u8 = 0x23;
pub const DID2_TAG_DYNAMIC_RANGE: u8 = 0x25;
pub const DID2_TAG_INTERFACE_FEATURES: u8 = 0x26;
pub const DID2_TAG_TILED_TOPOLOGY: u8 = 0x28;

// Shared by both DisplayID revisions: embedded CTA data-block collection.
pub const DID_TAG_CTA_EMBEDDED: u8 = 0x81;

/// Half-width of the acceptance window around the canonical CE rates
/// (24/30/60 Hz families) when classifying a refresh rate, in millihertz.
pub const REFRESH_CLASS_TOLERANCE_MILLIHZ: u32 = 600;

/// VFPDB short video references 129..=144 address DTDs 1..=16.
pub const SVR_DTD_FIRST: u8 = 129;
pub const SVR_DTD_LAST: u8 = 144;
