//! DisplayID section and data-block decoding, shared by standalone DisplayID
//! blobs and the 0x70 EDID extension carrier.

use crate::cursor::Cursor;
use crate::error::{EdidError, Result};
use crate::types::capability::TileTopology;
use crate::types::timing::{AspectRatio, ModeSource, SamplingModes, TimingRecord};

use super::formulas;

/// Section header size: version, payload length, product type, extension
/// count. A trailing checksum byte follows the payload.
pub const SECTION_HEADER: usize = 4;
pub const TYPE_I_TIMING_SIZE: usize = 20;
pub const TYPE_III_TIMING_SIZE: usize = 3;

/// One DisplayID section: the version byte and the data-block area.
#[derive(Debug, Clone, Copy)]
pub struct Section<'a> {
    pub version: u8,
    pub extension_count: u8,
    pub blocks: &'a [u8],
    /// Bytes consumed from the input, checksum included.
    pub total_len: usize,
}

impl Section<'_> {
    /// 0x20/0x21 structure revisions. 1.x sections report 0x12/0x13.
    #[must_use]
    pub fn is_v2(&self) -> bool {
        self.version >= 0x20
    }
}

/// Parse one section at the start of `data`. The declared payload length and
/// the checksum byte must both fit the buffer.
pub fn section(data: &[u8]) -> Result<Section<'_>> {
    let mut cur = Cursor::new(data);
    let version = cur.read_u8()?;
    if !matches!(version, 0x12 | 0x13 | 0x20 | 0x21) {
        return Err(EdidError::BadSignature {
            reason: format!("unsupported displayid structure version {version:#04x}"),
        });
    }
    let payload_len = usize::from(cur.read_u8()?);
    cur.skip(1)?; // product type
    let extension_count = cur.read_u8()?;
    let blocks = cur.take_declared(payload_len)?;
    cur.read_u8()?; // checksum byte, validated separately
    Ok(Section {
        version,
        extension_count,
        blocks,
        total_len: cur.position(),
    })
}

/// The checksum byte covers the header and payload.
#[must_use]
pub fn section_checksum_ok(data: &[u8], section: &Section<'_>) -> bool {
    data.get(..section.total_len)
        .is_some_and(formulas::checksum_ok)
}

fn aspect_code(code: u8) -> AspectRatio {
    match code {
        0 => AspectRatio::A1_1,
        1 => AspectRatio::A5_4,
        2 => AspectRatio::A4_3,
        3 => AspectRatio::A15_9,
        4 => AspectRatio::A16_9,
        5 => AspectRatio::A16_10,
        6 => AspectRatio::A64_27,
        7 => AspectRatio::A256_135,
        _ => AspectRatio::Undefined,
    }
}

/// Decode one 20-byte type I (1.x) / type VII (2.x) detailed timing.
/// All geometry fields are stored minus one; the pixel clock is a 24-bit
/// little-endian count of 10 kHz units.
pub fn type_i_timing(chunk: &[u8]) -> Result<TimingRecord> {
    let mut cur = Cursor::new(chunk);
    let clock_10khz = cur.read_u24_le()?;
    let options = cur.read_u8()?;

    let h_active = u32::from(cur.read_u16_le()?) + 1;
    let h_blank = u32::from(cur.read_u16_le()?) + 1;
    let h_sync_offset_raw = cur.read_u16_le()?;
    let h_sync_width = u32::from(cur.read_u16_le()?) + 1;
    let v_active = u32::from(cur.read_u16_le()?) + 1;
    let v_blank = u32::from(cur.read_u16_le()?) + 1;
    let v_sync_offset_raw = cur.read_u16_le()?;
    let v_sync_width = u32::from(cur.read_u16_le()?) + 1;

    let mut timing = TimingRecord {
        pixel_clock_hz: (u64::from(clock_10khz) + 1) * 10_000,
        h_active,
        h_blank,
        h_front_porch: u32::from(h_sync_offset_raw & 0x7FFF) + 1,
        h_sync_width,
        v_active,
        v_blank,
        v_front_porch: u32::from(v_sync_offset_raw & 0x7FFF) + 1,
        v_sync_width,
        interlaced: options & 0x10 != 0,
        h_sync_positive: h_sync_offset_raw & 0x8000 != 0,
        v_sync_positive: v_sync_offset_raw & 0x8000 != 0,
        source: ModeSource::DisplayIdDetailed,
        preferred: options & 0x80 != 0,
        ..TimingRecord::default()
    };
    timing.refresh_millihz = timing.computed_refresh_millihz();

    if timing.h_active == 0 || timing.v_active == 0 || timing.refresh_millihz == 0 {
        return Err(EdidError::MalformedBlock {
            block: "displayid detailed timing",
            reason: "degenerate geometry".to_owned(),
        });
    }
    Ok(timing)
}

/// Decode one 3-byte type III (1.x) / type VIII (2.x) short timing into a
/// CVT-derived full timing.
pub fn type_iii_timing(chunk: &[u8]) -> Result<TimingRecord> {
    let b: &[u8; TYPE_III_TIMING_SIZE] = chunk
        .get(..TYPE_III_TIMING_SIZE)
        .and_then(|s| s.try_into().ok())
        .ok_or(EdidError::Truncated {
            offset: 0,
            needed: TYPE_III_TIMING_SIZE.saturating_sub(chunk.len()),
        })?;

    let preferred = b[0] & 0x80 != 0;
    let aspect = aspect_code(b[0] & 0x0F);
    let width = (u32::from(b[1]) + 1) * 8;
    let reduced_blanking = b[2] & 0x80 != 0;
    let refresh = u32::from(b[2] & 0x7F) + 1;

    let (num, den) = aspect.as_fraction().unwrap_or((16, 9));
    let height = width * den / num;

    let mut timing = formulas::cvt(width, height, refresh, reduced_blanking)?;
    timing.source = ModeSource::DisplayIdEnumerated;
    timing.preferred = preferred;
    Ok(timing)
}

/// Tiled display topology block payload (1.x tag 0x12 / 2.x tag 0x28).
pub fn tiled_topology(payload: &[u8]) -> Result<TileTopology> {
    let b: &[u8; 8] = Cursor::new(payload).take_array()?;
    // b[0] capabilities, b[1..3] topology nibbles, b[3..7] tile size.
    Ok(TileTopology {
        h_tiles: (b[1] >> 4) + 1,
        v_tiles: (b[1] & 0x0F) + 1,
        h_location: b[2] >> 4,
        v_location: b[2] & 0x0F,
        tile_width: u32::from(u16::from_le_bytes([b[3], b[4]])) + 1,
        tile_height: u32::from(u16::from_le_bytes([b[5], b[6]])) + 1,
        single_enclosure: b[0] & 0x80 != 0,
    })
}

/// Interface-features block (2.x tag 0x26): sampling support and per-mode
/// bit-depth masks.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct InterfaceFeatures {
    pub sampling: SamplingModes,
    pub bit_depths: crate::types::timing::BitDepths,
    pub bit_depths_420: Option<crate::types::timing::BitDepths>,
}

pub fn interface_features(payload: &[u8]) -> Result<InterfaceFeatures> {
    use crate::types::timing::BitDepths;

    let b = Cursor::new(payload).take(3)?;
    let depth_mask = |byte: u8| {
        let mut m = BitDepths::empty();
        if byte & 0x01 != 0 {
            m |= BitDepths::BPC6;
        }
        if byte & 0x02 != 0 {
            m |= BitDepths::BPC8;
        }
        if byte & 0x04 != 0 {
            m |= BitDepths::BPC10;
        }
        if byte & 0x08 != 0 {
            m |= BitDepths::BPC12;
        }
        if byte & 0x10 != 0 {
            m |= BitDepths::BPC16;
        }
        m
    };
    // b[0]: RGB depths, b[1]: YCbCr 4:4:4 depths, b[2]: YCbCr 4:2:0 depths.
    let rgb = depth_mask(b[0]);
    let ycbcr444 = depth_mask(b[1]);
    let ycbcr420 = depth_mask(b[2]);

    let mut sampling = SamplingModes::RGB;
    if !ycbcr444.is_empty() {
        sampling |= SamplingModes::YCBCR444;
    }
    if !ycbcr420.is_empty() {
        sampling |= SamplingModes::YCBCR420;
    }
    Ok(InterfaceFeatures {
        sampling,
        bit_depths: rgb | ycbcr444,
        bit_depths_420: (!ycbcr420.is_empty()).then_some(ycbcr420),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn type_i_1080p60() -> [u8; TYPE_I_TIMING_SIZE] {
        let mut b = [0u8; TYPE_I_TIMING_SIZE];
        let clock = 148_500u32 / 10 - 1; // 10 kHz units, minus one
        b[0] = (clock & 0xFF) as u8;
        b[1] = ((clock >> 8) & 0xFF) as u8;
        b[2] = (clock >> 16) as u8;
        b[3] = 0x84; // preferred, 16:9
        b[4..6].copy_from_slice(&1919u16.to_le_bytes());
        b[6..8].copy_from_slice(&279u16.to_le_bytes());
        b[8..10].copy_from_slice(&(87u16 | 0x8000).to_le_bytes());
        b[10..12].copy_from_slice(&43u16.to_le_bytes());
        b[12..14].copy_from_slice(&1079u16.to_le_bytes());
        b[14..16].copy_from_slice(&44u16.to_le_bytes());
        b[16..18].copy_from_slice(&(3u16 | 0x8000).to_le_bytes());
        b[18..20].copy_from_slice(&4u16.to_le_bytes());
        b
    }

    #[test]
    fn type_i_minus_one_fields() {
        let t = type_i_timing(&type_i_1080p60()).unwrap();
        assert_eq!(t.pixel_clock_hz, 148_500_000);
        assert_eq!((t.h_active, t.v_active), (1920, 1080));
        assert_eq!((t.h_blank, t.v_blank), (280, 45));
        assert_eq!(t.h_front_porch, 88);
        assert_eq!(t.v_sync_width, 5);
        assert!(t.preferred);
        assert!(t.h_sync_positive && t.v_sync_positive);
        assert_eq!(t.refresh_hz_rounded(), 60);
    }

    #[test]
    fn type_iii_cvt_expansion() {
        // 16:9, width (159+1)*8 = 1280, RB, refresh 59+1 = 60.
        let t = type_iii_timing(&[0x04, 159, 0x80 | 59]).unwrap();
        assert_eq!(t.h_active, 1280);
        assert_eq!(t.v_active, 720);
        assert_eq!(t.h_blank, 160);
        assert_eq!(t.source, ModeSource::DisplayIdEnumerated);
        assert!(!t.preferred);
    }

    #[test]
    fn section_rejects_unknown_version() {
        let data = [0x15, 0x00, 0x00, 0x00, 0xEB];
        assert!(matches!(
            section(&data),
            Err(EdidError::BadSignature { .. })
        ));
    }

    #[test]
    fn section_length_validation() {
        // Version 2.0, 3 payload bytes, one extension, checksum byte.
        let mut data = vec![0x20, 3, 0, 1, 0xAA, 0xBB, 0xCC];
        data.push(0u8.wrapping_sub(data.iter().copied().fold(0u8, u8::wrapping_add)));
        let s = section(&data).unwrap();
        assert!(s.is_v2());
        assert_eq!(s.extension_count, 1);
        assert_eq!(s.blocks, &[0xAA, 0xBB, 0xCC]);
        assert_eq!(s.total_len, 8);
        assert!(section_checksum_ok(&data, &s));

        assert!(matches!(
            section(&[0x20, 40, 0, 0, 0xAA]),
            Err(EdidError::BadLength { .. })
        ));
    }

    #[test]
    fn tiled_topology_plus_one_sizes() {
        // 2x1 grid, location (1,0), tiles 1920x2160, single enclosure.
        let payload = [
            0x80,
            0x10,
            0x10,
            0x7F, 0x07, // 1919 -> 1920
            0x6F, 0x08, // 2159 -> 2160
            0x00,
        ];
        let tile = tiled_topology(&payload).unwrap();
        assert_eq!((tile.h_tiles, tile.v_tiles), (2, 1));
        assert_eq!((tile.h_location, tile.v_location), (1, 0));
        assert_eq!((tile.tile_width, tile.tile_height), (1920, 2160));
        assert!(tile.single_enclosure);
    }

    #[test]
    fn interface_features_sampling() {
        // RGB 8/10, 444 8, 420 8.
        let f = interface_features(&[0x06, 0x02, 0x02]).unwrap();
        assert!(f.sampling.contains(SamplingModes::YCBCR444));
        assert!(f.sampling.contains(SamplingModes::YCBCR420));
        assert!(f.bit_depths_420.is_some());
    }
}
