//! CVT/GTF timing generation and the block checksum routine.
//!
//! Consumed as pure functions by the timing decoder adapter; no parser state
//! is visible here. Formulas follow VESA CVT 1.2 and GTF 1.1 with default
//! parameter sets.

use crate::error::{EdidError, Result};
use crate::types::timing::{ModeSource, TimingRecord};

/// Byte-sum-to-zero verification over one block.
#[must_use]
pub fn checksum_ok(block: &[u8]) -> bool {
    block.iter().fold(0u8, |acc, b| acc.wrapping_add(*b)) == 0
}

/// VESA GTF with default C/M/K/J parameters.
///
/// Used for standard timings with no DMT table entry.
pub fn gtf(width: u32, height: u32, refresh_hz: u32) -> Result<TimingRecord> {
    if width == 0 || height == 0 || refresh_hz == 0 {
        return Err(EdidError::MalformedBlock {
            block: "gtf request",
            reason: format!("degenerate {width}x{height}@{refresh_hz}"),
        });
    }
    // Default GTF constants: C=40, M=600, K=128, J=20 -> C'=30, M'=300.
    const C_PRIME: f64 = 30.0;
    const M_PRIME: f64 = 300.0;
    const MIN_VSYNC_BP_US: f64 = 550.0;
    const V_SYNC_RQD: f64 = 3.0;
    const MIN_V_PORCH: f64 = 1.0;
    const CELL_GRAN: f64 = 8.0;

    let v_field_rate = f64::from(refresh_hz);
    let h_pixels = (f64::from(width) / CELL_GRAN).round() * CELL_GRAN;
    let v_lines = f64::from(height);

    let h_period_est =
        (1.0 / v_field_rate - MIN_VSYNC_BP_US / 1_000_000.0) / (v_lines + MIN_V_PORCH) * 1_000_000.0;
    let v_sync_bp = (MIN_VSYNC_BP_US / h_period_est).round();
    let total_v_lines = v_lines + v_sync_bp + MIN_V_PORCH;
    let v_field_rate_est = 1.0 / h_period_est / total_v_lines * 1_000_000.0;
    let h_period = h_period_est / (v_field_rate / v_field_rate_est);

    let ideal_duty_cycle = C_PRIME - M_PRIME * h_period / 1000.0;
    let h_blank = (h_pixels * ideal_duty_cycle / (100.0 - ideal_duty_cycle)
        / (2.0 * CELL_GRAN))
        .round()
        * 2.0
        * CELL_GRAN;
    let total_pixels = h_pixels + h_blank;
    let pixel_freq_mhz = total_pixels / h_period;

    let h_sync = ((total_pixels * 8.0 / 100.0) / CELL_GRAN).round() * CELL_GRAN;
    let h_front_porch = h_blank / 2.0 - h_sync;

    let mut timing = TimingRecord {
        pixel_clock_hz: (pixel_freq_mhz * 1_000_000.0) as u64,
        h_active: h_pixels as u32,
        h_blank: h_blank as u32,
        h_front_porch: h_front_porch.max(0.0) as u32,
        h_sync_width: h_sync as u32,
        v_active: height,
        v_blank: (v_sync_bp + MIN_V_PORCH) as u32,
        v_front_porch: MIN_V_PORCH as u32,
        v_sync_width: V_SYNC_RQD as u32,
        interlaced: false,
        h_sync_positive: false,
        v_sync_positive: true,
        source: ModeSource::StandardTiming,
        ..TimingRecord::default()
    };
    timing.refresh_millihz = timing.computed_refresh_millihz();
    Ok(timing)
}

/// VESA CVT 1.2; `reduced_blanking` selects the RB1 timing set used by
/// DisplayID type III descriptors.
pub fn cvt(width: u32, height: u32, refresh_hz: u32, reduced_blanking: bool) -> Result<TimingRecord> {
    if width == 0 || height == 0 || refresh_hz == 0 {
        return Err(EdidError::MalformedBlock {
            block: "cvt request",
            reason: format!("degenerate {width}x{height}@{refresh_hz}"),
        });
    }
    if reduced_blanking {
        cvt_reduced(width, height, refresh_hz)
    } else {
        cvt_standard(width, height, refresh_hz)
    }
}

fn cvt_reduced(width: u32, height: u32, refresh_hz: u32) -> Result<TimingRecord> {
    // CVT-RB1 constants.
    const RB_MIN_V_BLANK_US: f64 = 460.0;
    const RB_H_BLANK: u32 = 160;
    const RB_H_SYNC: u32 = 32;
    const RB_H_FRONT_PORCH: u32 = 48;
    const RB_V_FPORCH: f64 = 3.0;
    const V_SYNC_RQD: f64 = 6.0;
    const CLOCK_STEP_KHZ: f64 = 250.0;

    let h_total = f64::from(width + RB_H_BLANK);
    let v_field_rate = f64::from(refresh_hz);

    let h_period_est = ((1_000_000.0 / v_field_rate) - RB_MIN_V_BLANK_US) / f64::from(height);
    let vbi_lines = (RB_MIN_V_BLANK_US / h_period_est).floor() + 1.0;
    let min_vbi = RB_V_FPORCH + V_SYNC_RQD + 6.0; // min back porch 6
    let v_blank = if vbi_lines < min_vbi { min_vbi } else { vbi_lines };
    let v_total = v_blank + f64::from(height);

    let clock_khz =
        ((v_field_rate * v_total * h_total / 1000.0) / CLOCK_STEP_KHZ).floor() * CLOCK_STEP_KHZ;

    let mut timing = TimingRecord {
        pixel_clock_hz: (clock_khz * 1000.0) as u64,
        h_active: width,
        h_blank: RB_H_BLANK,
        h_front_porch: RB_H_FRONT_PORCH,
        h_sync_width: RB_H_SYNC,
        v_active: height,
        v_blank: v_blank as u32,
        v_front_porch: RB_V_FPORCH as u32,
        v_sync_width: V_SYNC_RQD as u32,
        interlaced: false,
        h_sync_positive: true,
        v_sync_positive: false,
        source: ModeSource::DisplayIdEnumerated,
        ..TimingRecord::default()
    };
    timing.refresh_millihz = timing.computed_refresh_millihz();
    Ok(timing)
}

fn cvt_standard(width: u32, height: u32, refresh_hz: u32) -> Result<TimingRecord> {
    const C_PRIME: f64 = 30.0;
    const M_PRIME: f64 = 300.0;
    const MIN_VSYNC_BP_US: f64 = 550.0;
    const MIN_V_PORCH: f64 = 3.0;
    const CELL_GRAN: f64 = 8.0;
    const CLOCK_STEP_KHZ: f64 = 250.0;

    let v_sync_rqd = cvt_vsync_width(width, height);
    let v_field_rate = f64::from(refresh_hz);
    let h_pixels = (f64::from(width) / CELL_GRAN).floor() * CELL_GRAN;
    let v_lines = f64::from(height);

    let h_period_est = ((1.0 / v_field_rate) - MIN_VSYNC_BP_US / 1_000_000.0)
        / (v_lines + MIN_V_PORCH)
        * 1_000_000.0;
    let mut v_sync_bp = (MIN_VSYNC_BP_US / h_period_est).floor() + 1.0;
    if v_sync_bp < v_sync_rqd + 3.0 {
        v_sync_bp = v_sync_rqd + 3.0;
    }

    let ideal_duty_cycle = C_PRIME - M_PRIME * h_period_est / 1000.0;
    let duty = if ideal_duty_cycle < 20.0 { 20.0 } else { ideal_duty_cycle };
    let h_blank = (h_pixels * duty / (100.0 - duty) / (2.0 * CELL_GRAN)).floor() * 2.0 * CELL_GRAN;
    let total_pixels = h_pixels + h_blank;

    let clock_khz = ((total_pixels / h_period_est * 1000.0) / CLOCK_STEP_KHZ).floor() * CLOCK_STEP_KHZ;

    let h_sync = ((total_pixels * 8.0 / 100.0) / CELL_GRAN).floor() * CELL_GRAN;
    let h_front_porch = h_blank / 2.0 - h_sync;

    let mut timing = TimingRecord {
        pixel_clock_hz: (clock_khz * 1000.0) as u64,
        h_active: h_pixels as u32,
        h_blank: h_blank as u32,
        h_front_porch: h_front_porch.max(0.0) as u32,
        h_sync_width: h_sync as u32,
        v_active: height,
        v_blank: (v_sync_bp + MIN_V_PORCH) as u32,
        v_front_porch: MIN_V_PORCH as u32,
        v_sync_width: v_sync_rqd as u32,
        interlaced: false,
        h_sync_positive: false,
        v_sync_positive: true,
        source: ModeSource::DisplayIdEnumerated,
        ..TimingRecord::default()
    };
    timing.refresh_millihz = timing.computed_refresh_millihz();
    Ok(timing)
}

/// CVT vertical sync width is keyed to the picture aspect ratio.
fn cvt_vsync_width(width: u32, height: u32) -> f64 {
    let (w, h) = (u64::from(width), u64::from(height));
    if w * 3 == h * 4 {
        4.0
    } else if w * 9 == h * 16 {
        5.0
    } else if w * 10 == h * 16 {
        6.0
    } else if w * 4 == h * 5 {
        7.0
    } else if w * 9 == h * 15 {
        7.0
    } else {
        10.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checksum_detects_corruption() {
        let mut block = vec![0u8; 128];
        block[0] = 0x55;
        block[127] = 0x55u8.wrapping_neg();
        assert!(checksum_ok(&block));
        block[5] ^= 1;
        assert!(!checksum_ok(&block));
    }

    #[test]
    fn gtf_produces_plausible_1024x768() {
        let t = gtf(1024, 768, 60).unwrap();
        assert_eq!(t.h_active, 1024);
        assert_eq!(t.v_active, 768);
        let r = t.refresh_hz_rounded();
        assert!((59..=61).contains(&r), "rate {r}");
        // GTF 1024x768@60 lands near 64.1 MHz.
        assert!((60_000_000..70_000_000).contains(&t.pixel_clock_hz));
    }

    #[test]
    fn cvt_rb_1920x1080_60() {
        let t = cvt(1920, 1080, 60, true).unwrap();
        assert_eq!(t.h_blank, 160);
        assert_eq!(t.h_active, 1920);
        let r = t.refresh_hz_rounded();
        assert!((59..=60).contains(&r), "rate {r}");
        // CVT-RB 1080p60 is 138.5 MHz nominal.
        assert!((135_000_000..143_000_000).contains(&t.pixel_clock_hz));
    }

    #[test]
    fn degenerate_requests_are_errors() {
        assert!(gtf(0, 768, 60).is_err());
        assert!(cvt(1920, 0, 60, false).is_err());
        assert!(cvt(1920, 1080, 0, true).is_err());
    }
}
