//! EDID base-block field decoding.
//!
//! Byte offsets follow EDID 1.4 section 3. Each helper validates the slice it
//! reads instead of assuming a well-formed 128-byte block.

use crate::constants::{EDID_BLOCK_SIZE, EDID_SIGNATURE};
use crate::error::{EdidError, Result};
use crate::types::capability::{RangeLimits, VendorIdentity};
use crate::types::timing::{BitDepths, SamplingModes};

pub fn require_block(blob: &[u8]) -> Result<&[u8]> {
    blob.get(..EDID_BLOCK_SIZE).ok_or(EdidError::Truncated {
        offset: blob.len(),
        needed: EDID_BLOCK_SIZE - blob.len().min(EDID_BLOCK_SIZE),
    })
}

#[must_use]
pub fn signature_ok(blob: &[u8]) -> bool {
    blob.get(..8) == Some(&EDID_SIGNATURE[..])
}

/// EDID minor revision (byte 19); drives standard-timing aspect decoding.
#[must_use]
pub fn revision(base: &[u8]) -> u8 {
    base.get(19).copied().unwrap_or(0)
}

/// Manufacturer id, product code, serial and manufacture date.
pub fn vendor_identity(base: &[u8]) -> Result<VendorIdentity> {
    let base = require_block(base)?;
    let packed = [base[8], base[9]];
    // Three 5-bit letters, 'A' encoded as 1.
    let letters = [
        (packed[0] >> 2) & 0x1F,
        ((packed[0] & 0b11) << 3) | (packed[1] >> 5),
        packed[1] & 0x1F,
    ];
    let pnp_id: String = letters
        .iter()
        .map(|l| char::from(l.wrapping_add(b'A' - 1).clamp(b'A', b'Z')))
        .collect();

    let week = base[16];
    let year_byte = base[17];
    let year = u16::from(year_byte) + 1990;
    Ok(VendorIdentity {
        pnp_id,
        product_code: u16::from_le_bytes([base[10], base[11]]),
        serial_number: u32::from_le_bytes([base[12], base[13], base[14], base[15]]),
        week_of_manufacture: (1..=0x36).contains(&week).then_some(week),
        year_of_manufacture: (week != 0xFF).then_some(year),
        model_year: (week == 0xFF).then_some(year),
        monitor_name: None,
    })
}

/// Video input definition (byte 20): digital flag plus declared color depth.
pub fn video_input(base: &[u8]) -> Result<(bool, BitDepths)> {
    let base = require_block(base)?;
    let b = base[20];
    if b & 0x80 == 0 {
        // Analog inputs carry no bit-depth declaration.
        return Ok((false, BitDepths::empty()));
    }
    let depth = match (b >> 4) & 0b111 {
        0b001 => BitDepths::BPC6,
        0b010 => BitDepths::BPC8,
        0b011 => BitDepths::BPC10,
        0b100 => BitDepths::BPC12,
        0b101 => BitDepths::BPC14,
        0b110 => BitDepths::BPC16,
        _ => BitDepths::empty(),
    };
    Ok((true, depth))
}

#[derive(Debug, Clone, Copy)]
pub struct FeatureSupport {
    pub sampling: SamplingModes,
    pub srgb_default: bool,
    pub preferred_is_native: bool,
    pub continuous_frequency: bool,
}

/// Feature support byte 24. For digital inputs bits 4:3 advertise YCbCr
/// sampling; RGB 4:4:4 is always supported.
pub fn feature_support(base: &[u8], digital: bool) -> Result<FeatureSupport> {
    let base = require_block(base)?;
    let b = base[24];
    let mut sampling = SamplingModes::RGB;
    if digital {
        if b & 0x10 != 0 {
            sampling |= SamplingModes::YCBCR444;
        }
        if b & 0x08 != 0 {
            sampling |= SamplingModes::YCBCR422;
        }
    }
    Ok(FeatureSupport {
        sampling,
        srgb_default: b & 0x04 != 0,
        preferred_is_native: b & 0x02 != 0,
        continuous_frequency: b & 0x01 != 0,
    })
}

pub fn screen_size(base: &[u8]) -> Result<Option<(u8, u8)>> {
    let base = require_block(base)?;
    let (h, v) = (base[21], base[22]);
    Ok((h != 0 && v != 0).then_some((h, v)))
}

pub fn gamma(base: &[u8]) -> Result<Option<f64>> {
    let base = require_block(base)?;
    Ok(match base[23] {
        0xFF => None,
        v => Some((f64::from(v) + 100.0) / 100.0),
    })
}

/// Established timings I & II bytes (35..38).
pub fn established_timing_bits(base: &[u8]) -> Result<[u8; 3]> {
    let base = require_block(base)?;
    Ok([base[35], base[36], base[37]])
}

/// Decode the eight standard timing slots (bytes 38..54) into
/// (width, height, refresh) triples. Unused slots (0x0101) are skipped.
pub fn standard_timings(base: &[u8]) -> Result<Vec<(u32, u32, u32)>> {
    let base = require_block(base)?;
    let rev = revision(base);
    let mut out = Vec::new();
    for i in 0..8 {
        let a = base[38 + 2 * i];
        let b = base[38 + 2 * i + 1];
        if let Some(t) = standard_timing(rev, a, b) {
            out.push(t);
        }
    }
    Ok(out)
}

fn standard_timing(revision: u8, a: u8, b: u8) -> Option<(u32, u32, u32)> {
    if a == 0 || (a, b) == (1, 1) {
        return None;
    }
    let width = (u32::from(a) + 31) * 8;
    let height = match b >> 6 {
        0b00 if revision < 3 => width, // 1:1 before EDID 1.3
        0b00 => width * 10 / 16,
        0b01 => width * 3 / 4,
        0b10 => width * 4 / 5,
        _ => width * 9 / 16,
    };
    let refresh = u32::from(b & 0x3F) + 60;
    Some((width, height, refresh))
}

/// The four 18-byte descriptor slots (bytes 54..126).
pub fn descriptor_slots(base: &[u8]) -> Result<[&[u8]; 4]> {
    let base = require_block(base)?;
    Ok([
        &base[54..72],
        &base[72..90],
        &base[90..108],
        &base[108..126],
    ])
}

/// Monitor descriptor tag, or `None` when the slot holds a detailed timing.
#[must_use]
pub fn descriptor_tag(slot: &[u8]) -> Option<u8> {
    if slot.len() >= 4 && slot[0] == 0 && slot[1] == 0 {
        Some(slot[3])
    } else {
        None
    }
}

/// Display range limits descriptor (tag 0xFD).
pub fn range_limits(slot: &[u8]) -> Result<RangeLimits> {
    if slot.len() < 18 {
        return Err(EdidError::Truncated {
            offset: slot.len(),
            needed: 18 - slot.len(),
        });
    }
    let min_v_off = u16::from(slot[4] & 0b01 != 0) * 255;
    let max_v_off = u16::from(slot[4] & 0b10 != 0) * 255;
    let min_h_off = u16::from(slot[4] & 0b0100 != 0) * 255;
    let max_h_off = u16::from(slot[4] & 0b1000 != 0) * 255;
    Ok(RangeLimits {
        v_rate_min_hz: u16::from(slot[5]) + min_v_off,
        v_rate_max_hz: u16::from(slot[6]) + max_v_off.max(min_v_off),
        h_rate_min_khz: u16::from(slot[7]) + min_h_off,
        h_rate_max_khz: u16::from(slot[8]) + max_h_off.max(min_h_off),
        max_pixel_clock_mhz: u16::from(slot[9]) * 10,
    })
}

/// Monitor name descriptor (tag 0xFC): ASCII up to a 0x0A terminator.
#[must_use]
pub fn monitor_name(slot: &[u8]) -> Option<String> {
    let payload = slot.get(5..18)?;
    let end = payload.iter().position(|&b| b == 0x0A).unwrap_or(payload.len());
    let name: String = payload[..end]
        .iter()
        .map(|&b| if b.is_ascii_graphic() || b == b' ' { char::from(b) } else { ' ' })
        .collect();
    let trimmed = name.trim().to_owned();
    (!trimmed.is_empty()).then_some(trimmed)
}

/// Established Timings III descriptor (tag 0xF7): the six timing-bit bytes.
pub fn established_timings_iii_bits(slot: &[u8]) -> Result<[u8; 6]> {
    let bytes = slot.get(6..12).ok_or(EdidError::Truncated {
        offset: slot.len(),
        needed: 12usize.saturating_sub(slot.len()),
    })?;
    Ok([bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5]])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_block() -> Vec<u8> {
        let mut b = vec![0u8; EDID_BLOCK_SIZE];
        b[..8].copy_from_slice(&EDID_SIGNATURE);
        // "DEL" packed: D=4, E=5, L=12.
        b[8] = (4 << 2) | (5 >> 3);
        b[9] = ((5 & 0b111) << 5) | 12;
        b[10..12].copy_from_slice(&0xA0A0u16.to_le_bytes());
        b[12..16].copy_from_slice(&123456u32.to_le_bytes());
        b[16] = 12;
        b[17] = 33; // 2023
        b[18] = 1;
        b[19] = 4;
        b[20] = 0x80 | (0b011 << 4); // digital, 10 bpc
        b[21] = 60;
        b[22] = 34;
        b[23] = 120; // gamma 2.2
        b[24] = 0x18 | 0x02; // 444 + 422, preferred native
        b
    }

    #[test]
    fn vendor_identity_unpacks_pnp_letters() {
        let v = vendor_identity(&base_block()).unwrap();
        assert_eq!(v.pnp_id, "DEL");
        assert_eq!(v.product_code, 0xA0A0);
        assert_eq!(v.serial_number, 123456);
        assert_eq!(v.week_of_manufacture, Some(12));
        assert_eq!(v.year_of_manufacture, Some(2023));
        assert_eq!(v.model_year, None);
    }

    #[test]
    fn digital_input_bit_depth() {
        let (digital, depth) = video_input(&base_block()).unwrap();
        assert!(digital);
        assert_eq!(depth, BitDepths::BPC10);
    }

    #[test]
    fn feature_support_sampling_bits() {
        let f = feature_support(&base_block(), true).unwrap();
        assert_eq!(
            f.sampling,
            SamplingModes::RGB | SamplingModes::YCBCR444 | SamplingModes::YCBCR422
        );
        assert!(f.preferred_is_native);
        assert!(!f.continuous_frequency);
    }

    #[test]
    fn standard_timing_aspect_decoding() {
        assert_eq!(standard_timing(4, 0x81, 0xC0), Some((1280, 720, 60)));
        assert_eq!(standard_timing(4, 0x61, 0x40), Some((1024, 768, 60)));
        assert_eq!(standard_timing(4, 0xD1, 0xC0), Some((1920, 1080, 60)));
        assert_eq!(standard_timing(4, 0, 0), None);
        assert_eq!(standard_timing(4, 1, 1), None);
        // Revision < 3: aspect code 0 means square.
        assert_eq!(standard_timing(2, 0x31, 0x00), Some((640, 640, 60)));
    }

    #[test]
    fn monitor_name_stops_at_terminator() {
        let mut slot = [0u8; 18];
        slot[3] = 0xFC;
        slot[5..10].copy_from_slice(b"U2723");
        slot[10] = 0x0A;
        slot[11..18].copy_from_slice(&[0x20; 7]);
        assert_eq!(monitor_name(&slot).as_deref(), Some("U2723"));
    }

    #[test]
    fn range_limits_offsets() {
        let mut slot = [0u8; 18];
        slot[3] = 0xFD;
        slot[4] = 0b0010; // max vertical +255
        slot[5] = 48;
        slot[6] = 30; // 285 with offset
        slot[7] = 30;
        slot[8] = 140;
        slot[9] = 60; // 600 MHz
        let r = range_limits(&slot).unwrap();
        assert_eq!(r.v_rate_min_hz, 48);
        assert_eq!(r.v_rate_max_hz, 285);
        assert_eq!(r.max_pixel_clock_mhz, 600);
    }

    #[test]
    fn short_block_is_truncated() {
        assert!(matches!(
            vendor_identity(&[0u8; 57]),
            Err(EdidError::Truncated { .. })
        ));
    }
}
