//! 18-byte detailed timing descriptor decoding.
//!
//! Bit numbering follows EDID 1.4 section 3.10.2. The same layout appears in
//! base blocks, CTA extension tails and DisplayID-embedded descriptors; the
//! caller supplies the [`ModeSource`] tag.

use crate::error::{EdidError, Result};
use crate::types::timing::{ModeSource, TimingRecord};

pub const DTD_SIZE: usize = 18;

/// Decode one detailed timing descriptor. Returns `Ok(None)` for a display
/// descriptor (pixel clock bytes zero), which is not a timing.
pub fn decode_dtd(raw: &[u8], source: ModeSource) -> Result<Option<TimingRecord>> {
    let b: &[u8; DTD_SIZE] = raw
        .get(..DTD_SIZE)
        .and_then(|s| s.try_into().ok())
        .ok_or(EdidError::Truncated {
            offset: 0,
            needed: DTD_SIZE.saturating_sub(raw.len()),
        })?;

    let pixel_clock_hz = u64::from(u16::from_le_bytes([b[0], b[1]])) * 10_000;
    if pixel_clock_hz == 0 {
        return Ok(None);
    }

    let flags = b[17];
    let h_active = u32::from(b[2]) | (u32::from(b[4] >> 4) << 8);
    let h_blank = u32::from(b[3]) | (u32::from(b[4] & 0x0F) << 8);
    let v_active = u32::from(b[5]) | (u32::from(b[7] >> 4) << 8);
    let v_blank = u32::from(b[6]) | (u32::from(b[7] & 0x0F) << 8);
    let h_front_porch = u32::from(b[8]) | (u32::from(b[11] >> 6) << 8);
    let h_sync_width = u32::from(b[9]) | (u32::from((b[11] >> 4) & 0b11) << 8);
    let v_front_porch = u32::from(b[10] >> 4) | (u32::from((b[11] >> 2) & 0b11) << 4);
    let v_sync_width = u32::from(b[10] & 0x0F) | (u32::from(b[11] & 0b11) << 4);
    let interlaced = flags & 0x80 != 0;

    // Sync polarity is only meaningful for digital separate sync.
    let digital_separate = flags & 0b0001_1000 == 0b0001_1000;
    let v_sync_positive = digital_separate && flags & 0b100 != 0;
    let h_sync_positive = digital_separate && flags & 0b010 != 0;

    let mut timing = TimingRecord {
        pixel_clock_hz,
        h_active,
        h_blank,
        h_front_porch,
        h_sync_width,
        v_active,
        v_blank,
        v_front_porch,
        v_sync_width,
        interlaced,
        h_sync_positive,
        v_sync_positive,
        source,
        ..TimingRecord::default()
    };
    timing.refresh_millihz = timing.computed_refresh_millihz();

    if timing.h_active == 0 || timing.v_active == 0 {
        return Err(EdidError::MalformedBlock {
            block: "detailed timing descriptor",
            reason: format!("zero active geometry {}x{}", timing.h_active, timing.v_active),
        });
    }
    Ok(Some(timing))
}
