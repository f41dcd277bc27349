//! Mode-table insertion engine: tiled classification and per-mode sampling
//! fan-out in front of the table's dedup/override protocol.

use crate::types::capability::DisplayCapabilities;
use crate::types::mode_table::{InsertOutcome, ModeRow, ModeTable};
use crate::types::timing::{SamplingModes, TimingRecord};

/// Insert one canonical timing, fanning it out into one table row per
/// sampling mode it can be transmitted with.
///
/// A timing whose CE sampling mask indicates RGB (or carries no sampling data
/// at all, i.e. a non-CE mode) is inserted as RGB, then again as YCbCr444 and
/// YCbCr422 when the display advertises those. A YCbCr420-capable timing adds
/// a 420 row carrying the separate 420 bit-depth mask. Returns the number of
/// rows inserted or replaced.
pub fn insert_mode(
    table: &mut ModeTable,
    caps: &DisplayCapabilities,
    timing: &TimingRecord,
    force_add: bool,
) -> usize {
    let tiled = caps
        .tile
        .is_some_and(|tile| tile.same_aspect(timing.h_active, timing.v_active));

    let mut mask = timing.ce.sampling;
    if mask.is_empty() {
        mask = SamplingModes::RGB;
    }

    let mut fanout: [Option<SamplingModes>; 4] = [None; 4];
    let mut n = 0;
    if mask.contains(SamplingModes::RGB) {
        fanout[n] = Some(SamplingModes::RGB);
        n += 1;
        if caps.sampling.contains(SamplingModes::YCBCR444) {
            fanout[n] = Some(SamplingModes::YCBCR444);
            n += 1;
        }
        if caps.sampling.contains(SamplingModes::YCBCR422) {
            fanout[n] = Some(SamplingModes::YCBCR422);
            n += 1;
        }
    } else {
        // CE masks without RGB: keep only the explicitly declared modes.
        for tag in [SamplingModes::YCBCR444, SamplingModes::YCBCR422] {
            if mask.contains(tag) {
                fanout[n] = Some(tag);
                n += 1;
            }
        }
    }
    if mask.contains(SamplingModes::YCBCR420) {
        fanout[n] = Some(SamplingModes::YCBCR420);
        n += 1;
    }

    let mut touched = 0usize;
    for tag in fanout.iter().take(n).flatten() {
        let row = ModeRow {
            timing: *timing,
            sampling: *tag,
            bit_depths: caps.bit_depths_for(*tag),
            preferred: timing.preferred,
            tiled,
        };
        let outcome = table.add_entry(row, force_add);
        tracing::trace!(
            insert.h = timing.h_active,
            insert.v = timing.v_active,
            insert.refresh_millihz = timing.refresh_millihz,
            insert.sampling = ?tag,
            insert.outcome = ?outcome,
            "mode table insert"
        );
        if matches!(outcome, InsertOutcome::Inserted | InsertOutcome::ReplacedExisting) {
            touched += 1;
        }
    }
    touched
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::capability::TileTopology;
    use crate::types::timing::{BitDepths, ModeSource};

    fn timing_1080p() -> TimingRecord {
        let mut t = TimingRecord {
            pixel_clock_hz: 148_500_000,
            h_active: 1920,
            h_blank: 280,
            v_active: 1080,
            v_blank: 45,
            refresh_millihz: 60_000,
            source: ModeSource::CeShortVideo,
            ..TimingRecord::default()
        };
        t.ce.sampling = SamplingModes::RGB;
        t
    }

    #[test]
    fn rgb_mode_fans_out_per_advertised_sampling() {
        let caps = DisplayCapabilities {
            sampling: SamplingModes::RGB | SamplingModes::YCBCR444 | SamplingModes::YCBCR422,
            bit_depths_all: BitDepths::BPC8 | BitDepths::BPC10,
            ..DisplayCapabilities::default()
        };
        let mut table = ModeTable::new();
        let added = insert_mode(&mut table, &caps, &timing_1080p(), true);
        assert_eq!(added, 3);
        assert_eq!(table.len(), 3);
        let tags: Vec<_> = table.rows().iter().map(|r| r.sampling).collect();
        assert_eq!(
            tags,
            vec![SamplingModes::RGB, SamplingModes::YCBCR444, SamplingModes::YCBCR422]
        );
        assert!(table.rows().iter().all(|r| r.bit_depths.contains(BitDepths::BPC10)));
    }

    #[test]
    fn no_sampling_data_is_treated_as_rgb() {
        let caps = DisplayCapabilities::default();
        let mut t = timing_1080p();
        t.ce.sampling = SamplingModes::empty();
        let mut table = ModeTable::new();
        insert_mode(&mut table, &caps, &t, false);
        assert_eq!(table.len(), 1);
        assert_eq!(table.rows()[0].sampling, SamplingModes::RGB);
    }

    #[test]
    fn ycbcr420_row_uses_separate_bit_depth_mask() {
        let caps = DisplayCapabilities {
            bit_depths_all: BitDepths::BPC8 | BitDepths::BPC12,
            bit_depths_420: None,
            ..DisplayCapabilities::default()
        };
        let mut t = timing_1080p();
        t.ce.sampling = SamplingModes::RGB | SamplingModes::YCBCR420;
        let mut table = ModeTable::new();
        insert_mode(&mut table, &caps, &t, true);
        assert_eq!(table.len(), 2);
        let row_420 = table
            .rows()
            .iter()
            .find(|r| r.sampling == SamplingModes::YCBCR420)
            .unwrap();
        assert_eq!(row_420.bit_depths, BitDepths::BPC8);
    }

    #[test]
    fn ntsc_fractional_rate_does_not_collapse_into_integer_rate() {
        let caps = DisplayCapabilities::default();
        let sixty = timing_1080p();
        let mut fractional = timing_1080p();
        fractional.pixel_clock_hz = 148_351_648;
        fractional.refresh_millihz = 59_940;
        let mut table = ModeTable::new();
        insert_mode(&mut table, &caps, &sixty, false);
        insert_mode(&mut table, &caps, &fractional, false);
        assert_eq!(table.len(), 2, "59.94 Hz and 60 Hz must stay distinct rows");
    }

    #[test]
    fn tile_aspect_match_tags_rows() {
        let caps = DisplayCapabilities {
            tile: Some(TileTopology {
                h_tiles: 2,
                v_tiles: 2,
                h_location: 0,
                v_location: 0,
                tile_width: 960,
                tile_height: 540,
                single_enclosure: true,
            }),
            ..DisplayCapabilities::default()
        };
        let mut table = ModeTable::new();
        insert_mode(&mut table, &caps, &timing_1080p(), false);
        assert!(table.rows()[0].tiled);
    }
}
