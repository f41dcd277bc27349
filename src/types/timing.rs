//! Canonical decoded timing records and the CE attribute sub-record.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::constants::REFRESH_CLASS_TOLERANCE_MILLIHZ;

bitflags! {
    /// Pixel-encoding sampling modes a timing can be transmitted with.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
    pub struct SamplingModes: u8 {
        const RGB      = 1 << 0;
        const YCBCR444 = 1 << 1;
        const YCBCR422 = 1 << 2;
        const YCBCR420 = 1 << 3;
    }
}

bitflags! {
    /// Supported bits-per-component mask.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
    pub struct BitDepths: u8 {
        const BPC6  = 1 << 0;
        const BPC8  = 1 << 1;
        const BPC10 = 1 << 2;
        const BPC12 = 1 << 3;
        const BPC14 = 1 << 4;
        const BPC16 = 1 << 5;
    }
}

bitflags! {
    /// Stereoscopic 3D transmission formats (HDMI VSDB 3D_Structure mask).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
    pub struct S3dFormats: u16 {
        const FRAME_PACKING     = 1 << 0;
        const FIELD_ALTERNATIVE = 1 << 1;
        const LINE_ALTERNATIVE  = 1 << 2;
        const SIDE_BY_SIDE_FULL = 1 << 3;
        const L_DEPTH           = 1 << 4;
        const L_DEPTH_GFX       = 1 << 5;
        const TOP_AND_BOTTOM    = 1 << 6;
        const SIDE_BY_SIDE_HALF = 1 << 8;
    }
}

/// Picture aspect ratio as declared by the producing block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AspectRatio {
    A1_1,
    A4_3,
    A5_4,
    A15_9,
    A16_9,
    A16_10,
    A64_27,
    A256_135,
    Undefined,
}

impl AspectRatio {
    /// Reduced numerator/denominator, or `None` for `Undefined`.
    #[must_use]
    pub fn as_fraction(self) -> Option<(u32, u32)> {
        match self {
            AspectRatio::A1_1 => Some((1, 1)),
            AspectRatio::A4_3 => Some((4, 3)),
            AspectRatio::A5_4 => Some((5, 4)),
            AspectRatio::A15_9 => Some((15, 9)),
            AspectRatio::A16_9 => Some((16, 9)),
            AspectRatio::A16_10 => Some((16, 10)),
            AspectRatio::A64_27 => Some((64, 27)),
            AspectRatio::A256_135 => Some((256, 135)),
            AspectRatio::Undefined => None,
        }
    }
}

/// Which timing standard family defined this mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SignalStandard {
    #[default]
    Undefined,
    Cta861,
    Dmt,
    Cvt,
    Gtf,
    DisplayId,
}

/// Which sub-block produced a timing; drives pending-list bookkeeping and
/// priority in the insertion engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModeSource {
    BaseDtd,
    CeDtd,
    CeShortVideo,
    StandardTiming,
    EstablishedTiming,
    DisplayIdDetailed,
    DisplayIdEnumerated,
}

/// Refresh-rate classification used by the mode-table dedup key. Rates within
/// a tolerance window of a canonical CE rate are "integer"; rates within the
/// window of the 1000/1001-scaled rate are "NTSC-fractional".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RefreshClass {
    Integer,
    NtscFractional,
    None,
}

impl RefreshClass {
    #[must_use]
    pub fn classify(refresh_millihz: u32) -> Self {
        const CANONICAL_MILLIHZ: [u32; 3] = [24_000, 30_000, 60_000];
        let tol = REFRESH_CLASS_TOLERANCE_MILLIHZ;
        for base in CANONICAL_MILLIHZ {
            // The base and 1000/1001 windows overlap (the gap is as small as
            // 24 millihertz at 24 Hz), so the nearer of the two wins.
            let fractional = (u64::from(base) * 1000 / 1001) as u32;
            let to_base = refresh_millihz.abs_diff(base);
            let to_fractional = refresh_millihz.abs_diff(fractional);
            if to_base.min(to_fractional) > tol {
                continue;
            }
            return if to_fractional < to_base {
                RefreshClass::NtscFractional
            } else {
                RefreshClass::Integer
            };
        }
        RefreshClass::None
    }
}

/// One VIC-id/aspect-ratio pairing. A logical CE format can be declared under
/// two different aspect-ratio codes sharing identical timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VicSlot {
    pub vic: u8,
    pub aspect: AspectRatio,
    pub native: bool,
}

/// CE-specific attributes carried alongside a timing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CeAttributes {
    pub sampling: SamplingModes,
    pub vic_slots: [Option<VicSlot>; 2],
    /// 4K2K HDMI-VIC alias slot (HDMI 1.4b VICs 1..=4).
    pub hdmi_vic_4k2k: Option<u8>,
    pub s3d: S3dFormats,
    pub bit_depths: BitDepths,
}

/// Canonical decoded video timing mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingRecord {
    pub pixel_clock_hz: u64,
    pub h_active: u32,
    pub h_blank: u32,
    pub h_front_porch: u32,
    pub h_sync_width: u32,
    pub v_active: u32,
    pub v_blank: u32,
    pub v_front_porch: u32,
    pub v_sync_width: u32,
    /// Field rate for interlaced timings, frame rate otherwise.
    pub refresh_millihz: u32,
    pub interlaced: bool,
    pub h_sync_positive: bool,
    pub v_sync_positive: bool,
    pub source: ModeSource,
    pub preferred: bool,
    pub ce: CeAttributes,
}

impl TimingRecord {
    #[must_use]
    pub fn h_total(&self) -> u32 {
        self.h_active + self.h_blank
    }

    #[must_use]
    pub fn v_total(&self) -> u32 {
        self.v_active + self.v_blank
    }

    /// Refresh rate derived from the pixel clock and totals. Interlaced
    /// timings count vertical lines per field, so the quotient is already the
    /// field rate.
    #[must_use]
    pub fn computed_refresh_millihz(&self) -> u32 {
        let total = u64::from(self.h_total()) * u64::from(self.v_total());
        if total == 0 {
            return 0;
        }
        let millihz = self.pixel_clock_hz * 1000 / total;
        u32::try_from(millihz).unwrap_or(u32::MAX)
    }

    #[must_use]
    pub fn refresh_hz_rounded(&self) -> u32 {
        (self.refresh_millihz + 500) / 1000
    }

    #[must_use]
    pub fn refresh_class(&self) -> RefreshClass {
        RefreshClass::classify(self.refresh_millihz)
    }

    /// Scale the timing by a pixel-repetition factor: active/blank widths and
    /// the pixel clock multiply, the line and field cadence stay unchanged.
    #[must_use]
    pub fn with_pixel_repetition(&self, factor: u32) -> Self {
        let mut t = *self;
        t.pixel_clock_hz *= u64::from(factor);
        t.h_active *= factor;
        t.h_blank *= factor;
        t.h_front_porch *= factor;
        t.h_sync_width *= factor;
        t
    }
}

impl Default for TimingRecord {
    fn default() -> Self {
        Self {
            pixel_clock_hz: 0,
            h_active: 0,
            h_blank: 0,
            h_front_porch: 0,
            h_sync_width: 0,
            v_active: 0,
            v_blank: 0,
            v_front_porch: 0,
            v_sync_width: 0,
            refresh_millihz: 0,
            interlaced: false,
            h_sync_positive: false,
            v_sync_positive: false,
            source: ModeSource::BaseDtd,
            preferred: false,
            ce: CeAttributes::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refresh_classification_windows() {
        assert_eq!(RefreshClass::classify(60_000), RefreshClass::Integer);
        assert_eq!(RefreshClass::classify(59_940), RefreshClass::NtscFractional);
        assert_eq!(RefreshClass::classify(23_976), RefreshClass::NtscFractional);
        assert_eq!(RefreshClass::classify(30_000), RefreshClass::Integer);
        assert_eq!(RefreshClass::classify(75_000), RefreshClass::None);
        assert_eq!(RefreshClass::classify(50_000), RefreshClass::None);
        // Near misses resolve to the nearer canonical rate, not the first
        // window scanned.
        assert_eq!(RefreshClass::classify(59_950), RefreshClass::NtscFractional);
        assert_eq!(RefreshClass::classify(59_990), RefreshClass::Integer);
        assert_eq!(RefreshClass::classify(23_980), RefreshClass::NtscFractional);
    }

    #[test]
    fn computed_refresh_is_field_rate_for_interlace() {
        // 1920x1080i60: 74.25 MHz, 2200 total, 562.5 lines per field pair.
        let t = TimingRecord {
            pixel_clock_hz: 74_250_000,
            h_active: 1920,
            h_blank: 280,
            v_active: 540,
            v_blank: 22,
            interlaced: true,
            ..TimingRecord::default()
        };
        let r = t.computed_refresh_millihz();
        assert!((59_900..=60_100).contains(&r), "got {r}");
    }

    #[test]
    fn pixel_repetition_scales_horizontal_only() {
        let t = TimingRecord {
            pixel_clock_hz: 27_000_000,
            h_active: 720,
            h_blank: 138,
            v_active: 480,
            v_blank: 45,
            ..TimingRecord::default()
        };
        let doubled = t.with_pixel_repetition(2);
        assert_eq!(doubled.h_active, 1440);
        assert_eq!(doubled.pixel_clock_hz, 54_000_000);
        assert_eq!(doubled.v_active, 480);
    }
}
