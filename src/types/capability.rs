//! The structured capability record accumulated during a parse.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::timing::{BitDepths, SamplingModes};

bitflags! {
    /// Colorimetry data block support bits (CTA-861 extended tag 5).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
    pub struct Colorimetry: u16 {
        const XV_YCC601    = 1 << 0;
        const XV_YCC709    = 1 << 1;
        const S_YCC601     = 1 << 2;
        const OP_YCC601    = 1 << 3;
        const OP_RGB       = 1 << 4;
        const BT2020_CYCC  = 1 << 5;
        const BT2020_YCC   = 1 << 6;
        const BT2020_RGB   = 1 << 7;
        const DCI_P3       = 1 << 15;
    }
}

bitflags! {
    /// Electro-optical transfer functions from the HDR static metadata block.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
    pub struct Eotfs: u8 {
        const TRADITIONAL_SDR = 1 << 0;
        const TRADITIONAL_HDR = 1 << 1;
        const SMPTE_ST2084    = 1 << 2;
        const HLG             = 1 << 3;
    }
}

bitflags! {
    /// Speaker allocation data block bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
    pub struct SpeakerAllocation: u8 {
        const FRONT_LR        = 1 << 0;
        const LFE             = 1 << 1;
        const FRONT_CENTER    = 1 << 2;
        const REAR_LR         = 1 << 3;
        const REAR_CENTER     = 1 << 4;
        const FRONT_LRC       = 1 << 5;
        const REAR_LRC        = 1 << 6;
        const FRONT_LRW       = 1 << 7;
    }
}

/// CTA short audio descriptor format codes this crate distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AudioFormat {
    Lpcm,
    Ac3,
    Mpeg1,
    Mp3,
    Mpeg2,
    Aac,
    Dts,
    Atrac,
    OneBit,
    EAc3,
    DtsHd,
    TrueHd,
    Dst,
    WmaPro,
    Extension,
    Reserved(u8),
}

impl AudioFormat {
    #[must_use]
    pub fn from_code(code: u8) -> Self {
        match code {
            1 => AudioFormat::Lpcm,
            2 => AudioFormat::Ac3,
            3 => AudioFormat::Mpeg1,
            4 => AudioFormat::Mp3,
            5 => AudioFormat::Mpeg2,
            6 => AudioFormat::Aac,
            7 => AudioFormat::Dts,
            8 => AudioFormat::Atrac,
            9 => AudioFormat::OneBit,
            10 => AudioFormat::EAc3,
            11 => AudioFormat::DtsHd,
            12 => AudioFormat::TrueHd,
            13 => AudioFormat::Dst,
            14 => AudioFormat::WmaPro,
            15 => AudioFormat::Extension,
            n => AudioFormat::Reserved(n),
        }
    }
}

/// One decoded CTA short audio descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioDescriptor {
    pub format: AudioFormat,
    pub max_channels: u8,
    /// Sample-rate support bits as carried on the wire (32/44.1/48/88.2/96/176.4/192 kHz).
    pub sample_rates: u8,
    /// Format-dependent third byte (bit depths for LPCM, max bitrate / 8 kbps otherwise).
    pub detail: u8,
}

/// Display range limits from the base-block monitor descriptor (tag 0xFD).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeLimits {
    pub v_rate_min_hz: u16,
    pub v_rate_max_hz: u16,
    pub h_rate_min_khz: u16,
    pub h_rate_max_khz: u16,
    pub max_pixel_clock_mhz: u16,
}

/// Variable refresh range advertised by the HF-VSDB (or derived from range
/// limits on continuous-frequency displays).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VrrRange {
    pub min_hz: u16,
    pub max_hz: u16,
}

/// Display Stream Compression capabilities from the HF-VSDB.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DscCapabilities {
    pub dsc_1p2: bool,
    pub native_420: bool,
    pub all_bpp: bool,
    pub bpc_10: bool,
    pub bpc_12: bool,
    pub max_slices: u8,
    pub max_frl_rate: u8,
}

/// Tiled-display topology (DisplayID tiled topology data block).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileTopology {
    pub h_tiles: u8,
    pub v_tiles: u8,
    pub h_location: u8,
    pub v_location: u8,
    pub tile_width: u32,
    pub tile_height: u32,
    pub single_enclosure: bool,
}

impl TileTopology {
    /// Tile geometry and candidate geometry are compared by reduced aspect
    /// ratio, not exact pixel match; some panels' tile block size does not
    /// equal any advertised timing.
    #[must_use]
    pub fn same_aspect(&self, width: u32, height: u32) -> bool {
        if self.tile_width == 0 || self.tile_height == 0 || width == 0 || height == 0 {
            return false;
        }
        u64::from(self.tile_width) * u64::from(height)
            == u64::from(self.tile_height) * u64::from(width)
    }
}

/// Base-block product identity.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VendorIdentity {
    /// Three-letter PNP manufacturer id.
    pub pnp_id: String,
    pub product_code: u16,
    pub serial_number: u32,
    pub week_of_manufacture: Option<u8>,
    pub year_of_manufacture: Option<u16>,
    pub model_year: Option<u16>,
    pub monitor_name: Option<String>,
}

/// Everything the parse learns about the display that is not a timing mode.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DisplayCapabilities {
    pub vendor: VendorIdentity,
    /// Bit-depth mask applying to RGB/444/422 mode rows.
    pub bit_depths_all: BitDepths,
    /// Separate bit-depth mask for YCbCr 4:2:0 rows; `None` means the display
    /// never advertised one (rows default to 8-bit only).
    pub bit_depths_420: Option<BitDepths>,
    /// Globally advertised sampling support (CTA header flags + HF-VSDB).
    pub sampling: SamplingModes,
    pub srgb_default: bool,
    pub continuous_frequency: bool,
    pub preferred_is_native: bool,
    pub screen_size_cm: Option<(u8, u8)>,
    pub gamma: Option<f64>,
    pub range_limits: Option<RangeLimits>,
    pub colorimetry: Colorimetry,
    pub hdr: Option<HdrStaticMetadata>,
    pub vrr: Option<VrrRange>,
    pub allm: bool,
    pub uhd_vic: bool,
    pub hdr10_plus: bool,
    pub dsc: Option<DscCapabilities>,
    pub max_frl_rate: u8,
    pub max_tmds_character_rate_mhz: u16,
    /// HDMI VSDB source physical address (A.B.C.D packed big-endian).
    pub physical_address: Option<u16>,
    pub audio: SmallVec<[AudioDescriptor; 8]>,
    pub speakers: SpeakerAllocation,
    pub tile: Option<TileTopology>,
}

impl DisplayCapabilities {
    /// True when any of the HDMI 2.1a gate features for direct 4K2K VIC
    /// transmission is advertised (Annex E).
    #[must_use]
    pub fn allows_native_4k2k_vics(&self) -> bool {
        self.uhd_vic || self.allm || self.hdr10_plus
    }

    /// Bit-depth mask for a row transmitted with the given sampling mode.
    #[must_use]
    pub fn bit_depths_for(&self, sampling: SamplingModes) -> BitDepths {
        if sampling == SamplingModes::YCBCR420 {
            self.bit_depths_420.unwrap_or(BitDepths::BPC8)
        } else {
            self.bit_depths_all
        }
    }
}

/// HDR static metadata block contents (CTA-861 extended tag 6). Luminance
/// values are decoded from their wire encodings into cd/m².
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct HdrStaticMetadata {
    pub eotfs: Eotfs,
    pub max_luminance: Option<f64>,
    pub max_frame_average_luminance: Option<f64>,
    pub min_luminance: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tile_aspect_matches_scaled_geometry() {
        let tile = TileTopology {
            h_tiles: 2,
            v_tiles: 1,
            h_location: 0,
            v_location: 0,
            tile_width: 1920,
            tile_height: 2160,
            single_enclosure: true,
        };
        assert!(tile.same_aspect(960, 1080));
        assert!(!tile.same_aspect(1920, 1080));
        assert!(!tile.same_aspect(0, 1080));
    }

    #[test]
    fn missing_420_mask_defaults_to_8bit() {
        let caps = DisplayCapabilities {
            bit_depths_all: BitDepths::BPC8 | BitDepths::BPC10,
            ..DisplayCapabilities::default()
        };
        assert_eq!(caps.bit_depths_for(SamplingModes::YCBCR420), BitDepths::BPC8);
        assert_eq!(
            caps.bit_depths_for(SamplingModes::RGB),
            BitDepths::BPC8 | BitDepths::BPC10
        );
    }
}
