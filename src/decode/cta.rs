//! CTA-861 extension decoding: the block header and each data-block payload
//! format. Payload slices arrive from the locator with their extended-tag or
//! OUI prefix bytes still attached; offsets below are relative to that.

use smallvec::SmallVec;

use crate::constants::{EDID_BLOCK_SIZE, SVR_DTD_FIRST, SVR_DTD_LAST};
use crate::error::{EdidError, Result};
use crate::types::capability::{
    AudioDescriptor, AudioFormat, Colorimetry, DscCapabilities, Eotfs, HdrStaticMetadata,
    SpeakerAllocation, VrrRange,
};
use crate::types::timing::{BitDepths, S3dFormats};

/// Flags and layout of one CTA extension block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CtaHeader {
    pub revision: u8,
    pub dtd_offset: usize,
    pub underscan: bool,
    pub basic_audio: bool,
    pub ycbcr444: bool,
    pub ycbcr422: bool,
    pub native_dtd_count: u8,
}

/// Split a 128-byte CTA extension into header, data-block collection and
/// detailed-timing area. A zero dtd offset means the block carries neither.
pub fn split(ext: &[u8]) -> Result<(CtaHeader, &[u8], &[u8])> {
    if ext.len() < EDID_BLOCK_SIZE {
        return Err(EdidError::Truncated {
            offset: ext.len(),
            needed: EDID_BLOCK_SIZE - ext.len(),
        });
    }
    let flags = ext[3];
    let header = CtaHeader {
        revision: ext[1],
        dtd_offset: usize::from(ext[2]),
        underscan: flags & 0x80 != 0,
        basic_audio: flags & 0x40 != 0,
        ycbcr444: flags & 0x20 != 0,
        ycbcr422: flags & 0x10 != 0,
        native_dtd_count: flags & 0x0F,
    };
    if header.dtd_offset == 0 {
        return Ok((header, &[], &[]));
    }
    if !(4..EDID_BLOCK_SIZE).contains(&header.dtd_offset) {
        return Err(EdidError::MalformedBlock {
            block: "cta extension",
            reason: "detailed timing offset outside block".to_owned(),
        });
    }
    // Byte 127 is the checksum; DTDs never reach into it.
    Ok((header, &ext[4..header.dtd_offset], &ext[header.dtd_offset..127]))
}

/// Video format preference (VFPDB) short video references, split into VIC
/// preferences and the DTD back-reference bit mask.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct VideoPreferences {
    pub vics: SmallVec<[u8; 8]>,
    pub dtd_mask: u16,
}

pub fn video_format_preferences(payload: &[u8]) -> VideoPreferences {
    let mut prefs = VideoPreferences::default();
    for &svr in payload.iter().skip(1) {
        match svr {
            0 | 128 | 254 | 255 => {}
            SVR_DTD_FIRST..=SVR_DTD_LAST => {
                prefs.dtd_mask |= 1 << (svr - SVR_DTD_FIRST);
            }
            _ => prefs.vics.push(svr),
        }
    }
    prefs
}

/// YCbCr 4:2:0 capability map: which entries of the SVD list (in block order,
/// 0-based) may also be transmitted with 4:2:0 sampling.
#[derive(Debug, Clone, Copy)]
pub enum Ycbcr420CapMap<'a> {
    /// An empty map means every listed SVD.
    All,
    Bitmap(&'a [u8]),
}

impl Ycbcr420CapMap<'_> {
    pub fn decode(payload: &[u8]) -> Ycbcr420CapMap<'_> {
        match payload.get(1..) {
            None | Some([]) => Ycbcr420CapMap::All,
            Some(bits) => Ycbcr420CapMap::Bitmap(bits),
        }
    }

    #[must_use]
    pub fn supports(&self, svd_index: usize) -> bool {
        match self {
            Ycbcr420CapMap::All => true,
            Ycbcr420CapMap::Bitmap(bits) => bits
                .get(svd_index / 8)
                .is_some_and(|b| b & (1 << (svd_index % 8)) != 0),
        }
    }
}

/// Decoded HDMI (licensing LLC) vendor-specific data block.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct HdmiVsdb {
    pub physical_address: u16,
    /// Deep-color depths for RGB (and 4:4:4 when DC_Y444 is set).
    pub deep_color: BitDepths,
    pub max_tmds_mhz: Option<u16>,
    pub s3d_present: bool,
    pub s3d: S3dFormats,
    pub hdmi_vics: SmallVec<[u8; 4]>,
}

/// The fields past the physical address are all optional; the block is cut
/// wherever the source stopped writing.
#[must_use]
pub fn hdmi_vsdb(payload: &[u8]) -> Option<HdmiVsdb> {
    let mut out = HdmiVsdb {
        physical_address: u16::from(*payload.get(3)?) << 8 | u16::from(*payload.get(4)?),
        ..HdmiVsdb::default()
    };
    let Some(&caps) = payload.get(5) else {
        return Some(out);
    };
    out.deep_color = BitDepths::BPC8;
    if caps & 0x10 != 0 {
        out.deep_color |= BitDepths::BPC10;
    }
    if caps & 0x20 != 0 {
        out.deep_color |= BitDepths::BPC12;
    }
    if caps & 0x40 != 0 {
        out.deep_color |= BitDepths::BPC16;
    }
    match payload.get(6) {
        Some(&rate) if rate > 0 => out.max_tmds_mhz = Some(u16::from(rate) * 5),
        Some(_) => {}
        None => return Some(out),
    }
    let Some(&latency_flags) = payload.get(7) else {
        return Some(out);
    };
    if latency_flags & 0x20 == 0 {
        // No HDMI_Video section.
        return Some(out);
    }
    let mut pos = 8usize;
    if latency_flags & 0x80 != 0 {
        pos += 2;
    }
    if latency_flags & 0x40 != 0 {
        pos += 2;
    }
    let &video_flags = payload.get(pos)?;
    out.s3d_present = video_flags & 0x80 != 0;
    let s3d_multi = (video_flags >> 5) & 0b11;
    let &lens = payload.get(pos + 1)?;
    let vic_len = usize::from(lens >> 5);
    pos += 2;
    for &vic in payload.get(pos..pos + vic_len)? {
        out.hdmi_vics.push(vic);
    }
    pos += vic_len;
    if out.s3d_present {
        if s3d_multi == 1 || s3d_multi == 2 {
            let hi = *payload.get(pos)?;
            let lo = *payload.get(pos + 1)?;
            out.s3d = S3dFormats::from_bits_truncate(u16::from(hi) << 8 | u16::from(lo));
        } else {
            // Mandatory formats when no explicit structure mask follows.
            out.s3d = S3dFormats::FRAME_PACKING
                | S3dFormats::TOP_AND_BOTTOM
                | S3dFormats::SIDE_BY_SIDE_HALF;
        }
    }
    Some(out)
}

/// HDMI Forum capabilities shared by the HF-VSDB and the HF-SCDB.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct HdmiForumCaps {
    pub version: u8,
    pub max_tmds_character_rate_mhz: u16,
    pub max_frl_rate: u8,
    pub uhd_vic: bool,
    pub allm: bool,
    pub bit_depths_420: Option<BitDepths>,
    pub vrr: Option<VrrRange>,
    pub dsc: Option<DscCapabilities>,
}

/// Decode the HDMI Forum field run starting at the Version byte. Every field
/// past the version is gated on the declared block length, and a short block
/// keeps whatever prefix was present.
#[must_use]
pub fn hdmi_forum_caps(fields: &[u8]) -> Option<HdmiForumCaps> {
    let mut out = HdmiForumCaps {
        version: *fields.first()?,
        ..HdmiForumCaps::default()
    };
    if let Some(&rate) = fields.get(1) {
        out.max_tmds_character_rate_mhz = u16::from(rate) * 5;
    }
    if let Some(&b) = fields.get(3) {
        out.max_frl_rate = b >> 4;
        out.uhd_vic = b & 0x08 != 0;
        let mut depths = BitDepths::empty();
        if b & 0x01 != 0 {
            depths |= BitDepths::BPC10;
        }
        if b & 0x02 != 0 {
            depths |= BitDepths::BPC12;
        }
        if b & 0x04 != 0 {
            depths |= BitDepths::BPC16;
        }
        if !depths.is_empty() {
            // 8-bit 4:2:0 is implied by any deep-color 4:2:0 bit.
            out.bit_depths_420 = Some(depths | BitDepths::BPC8);
        }
    }
    if let Some(&b) = fields.get(4) {
        out.allm = b & 0x02 != 0;
    }
    if let (Some(&hi), Some(&lo)) = (fields.get(5), fields.get(6)) {
        let min = u16::from(hi & 0x3F);
        let max = u16::from(hi >> 6) << 8 | u16::from(lo);
        if max > 0 {
            out.vrr = Some(VrrRange { min_hz: min, max_hz: max });
        }
    }
    if let Some(&b) = fields.get(7) {
        if b & 0x80 != 0 {
            let mut dsc = DscCapabilities {
                dsc_1p2: true,
                native_420: b & 0x40 != 0,
                all_bpp: b & 0x08 != 0,
                bpc_10: b & 0x01 != 0,
                bpc_12: b & 0x02 != 0,
                ..DscCapabilities::default()
            };
            if let Some(&s) = fields.get(8) {
                dsc.max_slices = s & 0x0F;
                dsc.max_frl_rate = s >> 4;
            }
            out.dsc = Some(dsc);
        }
    }
    Some(out)
}

/// HDR static metadata (extended tag 6). Luminance code points use the
/// CTA-861.3 exponential / square encodings.
#[must_use]
pub fn hdr_static_metadata(payload: &[u8]) -> HdrStaticMetadata {
    let mut out = HdrStaticMetadata {
        eotfs: Eotfs::from_bits_truncate(payload.get(1).copied().unwrap_or(0)),
        ..HdrStaticMetadata::default()
    };
    let lum = |code: u8| 50.0 * f64::powf(2.0, f64::from(code) / 32.0);
    if let Some(&c) = payload.get(3) {
        if c > 0 {
            out.max_luminance = Some(lum(c));
        }
    }
    if let Some(&c) = payload.get(4) {
        if c > 0 {
            out.max_frame_average_luminance = Some(lum(c));
        }
    }
    if let (Some(&c), Some(max)) = (payload.get(5), out.max_luminance) {
        let frac = f64::from(c) / 255.0;
        out.min_luminance = Some(max * frac * frac / 100.0);
    }
    out
}

#[must_use]
pub fn colorimetry(payload: &[u8]) -> Colorimetry {
    let mut bits = u16::from(payload.get(1).copied().unwrap_or(0));
    if payload.get(2).copied().unwrap_or(0) & 0x80 != 0 {
        bits |= Colorimetry::DCI_P3.bits();
    }
    Colorimetry::from_bits_truncate(bits)
}

/// Short audio descriptors, three bytes each; a trailing partial descriptor
/// is ignored.
#[must_use]
pub fn audio_descriptors(payload: &[u8]) -> SmallVec<[AudioDescriptor; 8]> {
    payload
        .chunks_exact(3)
        .filter(|sad| (sad[0] >> 3) & 0x0F != 0)
        .map(|sad| AudioDescriptor {
            format: AudioFormat::from_code((sad[0] >> 3) & 0x0F),
            max_channels: (sad[0] & 0x07) + 1,
            sample_rates: sad[1] & 0x7F,
            detail: sad[2],
        })
        .collect()
}

#[must_use]
pub fn speaker_allocation(payload: &[u8]) -> SpeakerAllocation {
    SpeakerAllocation::from_bits_truncate(payload.first().copied().unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_rejects_bad_dtd_offset() {
        let mut ext = [0u8; 128];
        ext[0] = 0x02;
        ext[1] = 3;
        ext[2] = 2; // inside the header
        assert!(split(&ext).is_err());

        ext[2] = 0;
        let (header, collection, dtds) = split(&ext).unwrap();
        assert_eq!(header.dtd_offset, 0);
        assert!(collection.is_empty() && dtds.is_empty());
    }

    #[test]
    fn split_areas() {
        let mut ext = [0u8; 128];
        ext[0] = 0x02;
        ext[1] = 3;
        ext[2] = 20;
        ext[3] = 0x30; // 444 + 422
        let (header, collection, dtds) = split(&ext).unwrap();
        assert!(header.ycbcr444 && header.ycbcr422);
        assert_eq!(collection.len(), 16);
        assert_eq!(dtds.len(), 127 - 20);
    }

    #[test]
    fn vfpdb_splits_dtd_references() {
        // Ext tag, VIC 16, DTD #1, DTD #3, VIC 97.
        let prefs = video_format_preferences(&[0x0D, 16, 129, 131, 97]);
        assert_eq!(prefs.vics.as_slice(), &[16, 97]);
        assert_eq!(prefs.dtd_mask, 0b101);
    }

    #[test]
    fn cap_map_empty_means_all() {
        let map = Ycbcr420CapMap::decode(&[0x0F]);
        assert!(map.supports(0) && map.supports(40));

        let map = Ycbcr420CapMap::decode(&[0x0F, 0b0000_0101]);
        assert!(map.supports(0));
        assert!(!map.supports(1));
        assert!(map.supports(2));
        assert!(!map.supports(8));
    }

    #[test]
    fn hdmi_vsdb_deep_color_and_vics() {
        // OUI, phys addr 1.0.0.0, DC_36|DC_30, 340 MHz, video present,
        // 3D present without mask, 2 HDMI VICs.
        let payload = [
            0x03, 0x0C, 0x00, 0x10, 0x00, 0x30, 68, 0x20, 0x80, 0x40, 1, 2,
        ];
        let vsdb = hdmi_vsdb(&payload).unwrap();
        assert_eq!(vsdb.physical_address, 0x1000);
        assert_eq!(
            vsdb.deep_color,
            BitDepths::BPC8 | BitDepths::BPC10 | BitDepths::BPC12
        );
        assert_eq!(vsdb.max_tmds_mhz, Some(340));
        assert_eq!(vsdb.hdmi_vics.as_slice(), &[1, 2]);
        assert!(vsdb.s3d.contains(S3dFormats::FRAME_PACKING));
    }

    #[test]
    fn hdmi_vsdb_truncated_keeps_prefix() {
        let vsdb = hdmi_vsdb(&[0x03, 0x0C, 0x00, 0x21, 0x00]).unwrap();
        assert_eq!(vsdb.physical_address, 0x2100);
        assert_eq!(vsdb.max_tmds_mhz, None);
        assert!(vsdb.hdmi_vics.is_empty());
    }

    #[test]
    fn hf_fields_are_length_gated() {
        // Version + rate only.
        let caps = hdmi_forum_caps(&[1, 120]).unwrap();
        assert_eq!(caps.max_tmds_character_rate_mhz, 600);
        assert_eq!(caps.max_frl_rate, 0);
        assert!(caps.vrr.is_none());

        // Full run: FRL 6 + UHD_VIC + 420 at 10/12 bpc, ALLM, VRR 48..144, DSC 1.2.
        let caps = hdmi_forum_caps(&[1, 120, 0x80, 0x6B, 0x02, 48, 144, 0x83, 0x48])
            .unwrap();
        assert_eq!(caps.max_frl_rate, 6);
        assert!(caps.uhd_vic && caps.allm);
        assert_eq!(
            caps.bit_depths_420,
            Some(BitDepths::BPC8 | BitDepths::BPC10 | BitDepths::BPC12)
        );
        assert_eq!(caps.vrr, Some(VrrRange { min_hz: 48, max_hz: 144 }));
        let dsc = caps.dsc.unwrap();
        assert!(dsc.dsc_1p2 && dsc.bpc_10 && dsc.bpc_12);
        assert_eq!(dsc.max_slices, 8);
        assert_eq!(dsc.max_frl_rate, 4);
    }

    #[test]
    fn hdr_luminance_decoding() {
        let hdr = hdr_static_metadata(&[0x06, 0x05, 0x01, 96, 80, 51]);
        assert!(hdr.eotfs.contains(Eotfs::SMPTE_ST2084));
        // 50 * 2^(96/32) = 400 cd/m².
        let max = hdr.max_luminance.unwrap();
        assert!((max - 400.0).abs() < 1e-9);
        let min = hdr.min_luminance.unwrap();
        assert!((min - max * (51.0 / 255.0) * (51.0 / 255.0) / 100.0).abs() < 1e-9);
    }

    #[test]
    fn audio_descriptor_fields() {
        let sads = audio_descriptors(&[0x0F, 0x7F, 0x07, 0x15, 0x07, 192]);
        assert_eq!(sads.len(), 2);
        assert_eq!(sads[0].format, AudioFormat::Lpcm);
        assert_eq!(sads[0].max_channels, 8);
        assert_eq!(sads[1].format, AudioFormat::Ac3);
        assert_eq!(sads[1].max_channels, 6);
        assert_eq!(sads[1].detail, 192);
    }
}
