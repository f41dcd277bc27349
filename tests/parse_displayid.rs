//! End-to-end DisplayID parsing: standalone sections and the EDID carrier.

use edid_core::{parse, BitDepths, ModeRow, ModeSource, SamplingModes};

fn data_block(tag: u8, payload: &[u8]) -> Vec<u8> {
    let mut v = vec![tag, 0, payload.len() as u8];
    v.extend_from_slice(payload);
    v
}

fn section(version: u8, extension_count: u8, blocks: &[Vec<u8>]) -> Vec<u8> {
    let payload: Vec<u8> = blocks.iter().flatten().copied().collect();
    let mut v = vec![version, payload.len() as u8, 0, extension_count];
    v.extend_from_slice(&payload);
    let sum = v.iter().fold(0u8, |a, &b| a.wrapping_add(b));
    v.push(0u8.wrapping_sub(sum));
    v
}

/// 20-byte type I/VII descriptor for 1080p60 CEA timing.
fn type_vii_1080p60(preferred: bool) -> Vec<u8> {
    let clock = 148_500_000u32 / 10_000 - 1;
    let mut b = vec![0u8; 20];
    b[0] = (clock & 0xFF) as u8;
    b[1] = ((clock >> 8) & 0xFF) as u8;
    b[2] = (clock >> 16) as u8;
    b[3] = if preferred { 0x84 } else { 0x04 };
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

fn rows_at<'a>(
    modes: &'a [ModeRow],
    w: u32,
    h: u32,
    refresh: u32,
) -> impl Iterator<Item = &'a ModeRow> {
    modes.iter().filter(move |row| {
        row.timing.h_active == w
            && row.timing.v_active == h
            && row.timing.refresh_hz_rounded() == refresh
    })
}

#[test]
fn displayid_v2_detailed_timing_with_interface_features() {
    let blocks = vec![
        // RGB 8/10 bpc, 4:4:4 at 8 bpc, 4:2:0 at 8 bpc.
        data_block(0x26, &[0x06, 0x02, 0x02]),
        data_block(0x22, &type_vii_1080p60(true)),
    ];
    let report = parse(&section(0x21, 0, &blocks)).unwrap();
    assert!(report.statuses.is_empty(), "{:?}", report.statuses);

    let caps = &report.capabilities;
    assert!(caps.sampling.contains(SamplingModes::YCBCR444));
    assert!(caps.sampling.contains(SamplingModes::YCBCR420));
    assert_eq!(caps.bit_depths_420, Some(BitDepths::BPC8));
    assert!(caps.bit_depths_all.contains(BitDepths::BPC10));

    // The detailed timing fans out over RGB and the advertised 4:4:4.
    let samplings: Vec<_> = rows_at(&report.modes, 1920, 1080, 60)
        .map(|m| m.sampling)
        .collect();
    assert!(samplings.contains(&SamplingModes::RGB));
    assert!(samplings.contains(&SamplingModes::YCBCR444));
    assert!(!samplings.contains(&SamplingModes::YCBCR422));
    assert!(rows_at(&report.modes, 1920, 1080, 60).all(|m| m.preferred));
}

#[test]
fn displayid_v1_type_iii_short_timing() {
    // 16:9, (159+1)*8 = 1280 wide, reduced blanking, 60 Hz.
    let blocks = vec![data_block(0x05, &[0x04, 159, 0x80 | 59])];
    let report = parse(&section(0x12, 0, &blocks)).unwrap();
    assert!(report.statuses.is_empty(), "{:?}", report.statuses);

    let row = rows_at(&report.modes, 1280, 720, 60).next().unwrap();
    assert_eq!(row.timing.source, ModeSource::DisplayIdEnumerated);
    assert_eq!(row.timing.h_blank, 160); // CVT-RB blank budget
}

#[test]
fn chained_sections_are_all_visited() {
    let first = section(0x20, 1, &[data_block(0x22, &type_vii_1080p60(false))]);
    // Tile grid 2x1, this tile at (1,0), tile size 1920x1080.
    let tile_payload = [0x80, 0x10, 0x10, 0x7F, 0x07, 0x37, 0x04, 0x00];
    let second = section(0x20, 0, &[data_block(0x28, &tile_payload)]);

    let mut blob = first;
    blob.extend_from_slice(&second);
    let report = parse(&blob).unwrap();
    assert!(report.statuses.is_empty(), "{:?}", report.statuses);

    let tile = report.capabilities.tile.unwrap();
    assert_eq!((tile.h_tiles, tile.v_tiles), (2, 1));
    assert_eq!((tile.tile_width, tile.tile_height), (1920, 1080));
    assert!(tile.single_enclosure);

    // Timings flush after the tile block is known, so the matching-aspect
    // rows come back tagged.
    assert!(rows_at(&report.modes, 1920, 1080, 60).all(|m| m.tiled));
}

#[test]
fn embedded_cta_collection_registers_vics() {
    // A CTA data-block collection carried inside a DisplayID section.
    let mut cta_collection = vec![(2u8 << 5) | 2, 16, 4]; // SVDs 1080p60, 720p60
    cta_collection.extend([(7u8 << 5) | 2, 0x0D, 16]); // VFPDB prefers VIC 16
    let blocks = vec![data_block(0x81, &cta_collection)];
    let report = parse(&section(0x20, 0, &blocks)).unwrap();
    assert!(report.statuses.is_empty(), "{:?}", report.statuses);

    assert!(rows_at(&report.modes, 1280, 720, 60).next().is_some());
    let row = rows_at(&report.modes, 1920, 1080, 60).next().unwrap();
    assert_eq!(row.timing.ce.vic_slots[0].map(|s| s.vic), Some(16));
    assert!(row.preferred);
}

#[test]
fn bad_second_section_is_reported_not_fatal() {
    let first = section(0x20, 1, &[data_block(0x22, &type_vii_1080p60(false))]);
    let mut blob = first;
    blob.extend_from_slice(&[0x55, 0x01]); // not a section header

    let report = parse(&blob).unwrap();
    assert!(report
        .statuses
        .iter()
        .any(|s| s.context == "displayid extension section"));
    assert!(rows_at(&report.modes, 1920, 1080, 60).next().is_some());
}

#[test]
fn displayid_inside_edid_extension() {
    const SIGNATURE: [u8; 8] = [0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x00];
    let mut base = [0u8; 128];
    base[..8].copy_from_slice(&SIGNATURE);
    base[18] = 1;
    base[19] = 4;
    base[20] = 0xA0;
    for i in (38..54).step_by(2) {
        base[i] = 0x01;
        base[i + 1] = 0x01;
    }
    for slot in 0..4 {
        base[54 + slot * 18 + 3] = 0x10;
    }
    base[126] = 1;
    let sum = base[..127].iter().fold(0u8, |a, &b| a.wrapping_add(b));
    base[127] = 0u8.wrapping_sub(sum);

    let mut ext = [0u8; 128];
    ext[0] = 0x70;
    let payload = section(0x20, 0, &[data_block(0x22, &type_vii_1080p60(true))]);
    ext[1..1 + payload.len()].copy_from_slice(&payload);
    let sum = ext[..127].iter().fold(0u8, |a, &b| a.wrapping_add(b));
    ext[127] = 0u8.wrapping_sub(sum);

    let mut blob = base.to_vec();
    blob.extend_from_slice(&ext);
    let report = parse(&blob).unwrap();
    assert!(report.statuses.is_empty(), "{:?}", report.statuses);
    assert!(rows_at(&report.modes, 1920, 1080, 60).next().is_some());
}
