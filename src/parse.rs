//! Top-level parse orchestration.
//!
//! One call walks the blob in a fixed visitation order, accumulates
//! capabilities and timings in a [`ParseSession`], and returns the flattened
//! report. Sub-block failures are recorded as statuses and never abort the
//! walk; `Err` escapes only when the blob as a whole is unrecognizable.

use serde::Serialize;

use crate::constants::{
    CTA_EXT_COLORIMETRY, CTA_EXT_DID_TYPE_VII, CTA_EXT_HDR_STATIC, CTA_EXT_HF_SCDB,
    CTA_EXT_VFPDB, CTA_EXT_YCBCR420_CAP_MAP, CTA_EXT_YCBCR420_VIDEO, CTA_TAG_AUDIO,
    CTA_TAG_SPEAKER, CTA_TAG_VIDEO, DID1_TAG_TILED_TOPOLOGY, DID1_TAG_TYPE_III_TIMING,
    DID1_TAG_TYPE_I_TIMING, DID2_TAG_INTERFACE_FEATURES, DID2_TAG_TILED_TOPOLOGY,
    DID2_TAG_TYPE_VII_TIMING, DID2_TAG_TYPE_VIII_TIMING, DID_TAG_CTA_EMBEDDED, EDID_BLOCK_SIZE,
    EXT_TAG_CTA, EXT_TAG_DISPLAYID, OUI_HDMI, OUI_HDMI_FORUM, OUI_HDR10_PLUS,
};
use crate::decode::{base, cta, displayid, dtd, formulas};
use crate::error::{EdidError, Result};
use crate::insert::insert_mode;
use crate::locator::{cta_blocks, displayid_blocks, find_cta_block, CtaSelector};
use crate::session::{ParseSession, ParseStatus};
use crate::tables::{
    lookup_dmt, vic_for_hdmi_vic, ESTABLISHED_TIMINGS, ESTABLISHED_TIMINGS_III,
};
use crate::types::capability::{DisplayCapabilities, VrrRange};
use crate::types::mode_table::{ModeRow, ModeTable};
use crate::types::timing::{BitDepths, ModeSource, SamplingModes};
use crate::vic::VicRegistration;

/// Result of one parse call: the deduplicated priority-ordered mode table,
/// the capability record and any recoverable problems encountered.
#[derive(Debug, Serialize)]
pub struct ParseReport {
    pub capabilities: DisplayCapabilities,
    pub modes: Vec<ModeRow>,
    pub statuses: Vec<ParseStatus>,
    /// Timing declarations processed, before deduplication and fan-out.
    pub timings_decoded: usize,
}

/// Parse an EDID or DisplayID blob with the default mode-table policy.
pub fn parse(blob: &[u8]) -> Result<ParseReport> {
    parse_with_table(blob, ModeTable::new())
}

/// Parse into a caller-supplied mode table (custom dedup/override policy).
pub fn parse_with_table(blob: &[u8], table: ModeTable) -> Result<ParseReport> {
    let mut session = ParseSession::new(table);
    session.caps.sampling = SamplingModes::RGB;

    if base::signature_ok(blob) {
        parse_edid(blob, &mut session)?;
    } else if matches!(blob.first(), Some(0x12 | 0x13 | 0x20 | 0x21)) {
        parse_displayid(blob, &mut session)?;
    } else {
        return Err(EdidError::BadSignature {
            reason: "neither an edid header nor a displayid version byte".to_owned(),
        });
    }

    finalize_capabilities(&mut session);
    tracing::debug!(
        report.modes = session.table.len(),
        report.timings = session.total_timings,
        report.statuses = session.statuses.len(),
        "parse complete"
    );
    Ok(ParseReport {
        capabilities: session.caps,
        modes: session.table.into_rows(),
        statuses: session.statuses,
        timings_decoded: session.total_timings,
    })
}

fn finalize_capabilities(s: &mut ParseSession) {
    if s.caps.bit_depths_all.is_empty() {
        s.caps.bit_depths_all = BitDepths::BPC8;
    }
    // Continuous-frequency panels without an HF-VSDB still expose a usable
    // refresh range through the legacy range-limits descriptor.
    if s.caps.vrr.is_none() && s.caps.continuous_frequency {
        if let Some(rl) = s.caps.range_limits {
            if rl.v_rate_min_hz > 0 && rl.v_rate_max_hz > rl.v_rate_min_hz {
                s.caps.vrr = Some(VrrRange {
                    min_hz: rl.v_rate_min_hz,
                    max_hz: rl.v_rate_max_hz,
                });
            }
        }
    }
}

// ---------------------------------------------------------------------------
// EDID container

fn parse_edid(blob: &[u8], s: &mut ParseSession) -> Result<()> {
    let base_block = base::require_block(blob)?;
    if !formulas::checksum_ok(base_block) {
        log::warn!("edid base block checksum mismatch, continuing");
        s.note("base block", EdidError::ChecksumMismatch { block: 0 });
    }

    match base::vendor_identity(base_block) {
        Ok(vendor) => s.caps.vendor = vendor,
        Err(e) => s.note("vendor identity", e),
    }
    let digital = match base::video_input(base_block) {
        Ok((digital, depths)) => {
            if !depths.is_empty() {
                s.caps.bit_depths_all |= depths;
            }
            digital
        }
        Err(e) => {
            s.note("video input definition", e);
            false
        }
    };
    match base::feature_support(base_block, digital) {
        Ok(f) => {
            s.caps.sampling |= f.sampling;
            s.caps.srgb_default = f.srgb_default;
            s.caps.preferred_is_native = f.preferred_is_native;
            s.caps.continuous_frequency = f.continuous_frequency;
        }
        Err(e) => s.note("feature support", e),
    }
    s.caps.screen_size_cm = base::screen_size(base_block).unwrap_or(None);
    s.caps.gamma = base::gamma(base_block).unwrap_or(None);

    // Monitor descriptors: name, range limits and the Established Timings
    // III bit set, which is expanded only after every declared timing.
    let mut et3_bits: Option<[u8; 6]> = None;
    for slot in base::descriptor_slots(base_block)? {
        match base::descriptor_tag(slot) {
            Some(0xFD) => match base::range_limits(slot) {
                Ok(rl) => s.caps.range_limits = Some(rl),
                Err(e) => s.note("range limits descriptor", e),
            },
            Some(0xFC) => {
                if s.caps.vendor.monitor_name.is_none() {
                    s.caps.vendor.monitor_name = base::monitor_name(slot);
                }
            }
            Some(0xF7) => match base::established_timings_iii_bits(slot) {
                Ok(bits) => et3_bits = Some(bits),
                Err(e) => s.note("established timings iii descriptor", e),
            },
            _ => {}
        }
    }

    // Extension blocks, checksummed up front.
    let declared_extensions = usize::from(base_block[126]);
    let mut extensions: Vec<&[u8]> = Vec::with_capacity(declared_extensions);
    for i in 1..=declared_extensions {
        match blob.get(i * EDID_BLOCK_SIZE..(i + 1) * EDID_BLOCK_SIZE) {
            Some(ext) => {
                if !formulas::checksum_ok(ext) {
                    s.note("extension block", EdidError::ChecksumMismatch { block: i });
                }
                extensions.push(ext);
            }
            None => {
                s.note(
                    "extension map",
                    EdidError::Truncated {
                        offset: blob.len(),
                        needed: (i + 1) * EDID_BLOCK_SIZE - blob.len(),
                    },
                );
                break;
            }
        }
    }

    // CTA extensions first, DisplayID extensions after; the SVD ordering the
    // 4:2:0 capability map indexes spans all CTA blocks.
    let mut svd_order: Vec<u8> = Vec::new();
    for ext in extensions.iter().filter(|e| e[0] == EXT_TAG_CTA) {
        visit_cta_extension(ext, s, &mut svd_order);
    }
    for ext in extensions.iter().filter(|e| e[0] == EXT_TAG_DISPLAYID) {
        // The DisplayID section starts right after the extension tag byte;
        // byte 127 is the EDID block checksum.
        visit_displayid_payload(&ext[1..127], s, &mut svd_order);
    }

    // Base-block detailed timings, discovered after every extension so the
    // preference indirection can count both groups.
    for slot in base::descriptor_slots(base_block)? {
        if base::descriptor_tag(slot).is_some() {
            continue;
        }
        match dtd::decode_dtd(slot, ModeSource::BaseDtd) {
            Ok(Some(mut timing)) => {
                if s.base_dtd_count == 0 {
                    // The first base-block detailed timing is preferred.
                    timing.preferred = true;
                }
                s.base_dtd_count += 1;
                s.total_timings += 1;
                if let Err(e) = s.pending.append(timing, true) {
                    s.note("base block timings", e);
                }
            }
            Ok(None) => {}
            Err(e) => s.note("base block timings", e),
        }
    }

    s.pending.resolve_preferred(s.vfpdb_dtd_mask, s.base_dtd_count);
    flush_pending(s);

    // Legacy timing sets come last and never override earlier rows.
    match base::established_timing_bits(base_block) {
        Ok(bits) => {
            for &(byte, bit, w, h, r) in ESTABLISHED_TIMINGS {
                if bits[byte] & bit != 0 {
                    insert_formula_timing(s, w, h, r, false, ModeSource::EstablishedTiming);
                }
            }
        }
        Err(e) => s.note("established timings", e),
    }
    match base::standard_timings(base_block) {
        Ok(timings) => {
            for (w, h, r) in timings {
                insert_formula_timing(s, w, h, r, false, ModeSource::StandardTiming);
            }
        }
        Err(e) => s.note("standard timings", e),
    }
    if let Some(bits) = et3_bits {
        for &(byte, bit, w, h, r, rb) in ESTABLISHED_TIMINGS_III {
            if bits[byte] & bit != 0 {
                insert_formula_timing(s, w, h, r, rb, ModeSource::EstablishedTiming);
            }
        }
    }
    Ok(())
}

/// Resolve a legacy width/height/refresh declaration against the DMT table,
/// falling back to GTF, and insert it without override rights.
fn insert_formula_timing(
    s: &mut ParseSession,
    width: u32,
    height: u32,
    refresh_hz: u32,
    reduced_blanking: bool,
    source: ModeSource,
) {
    let timing = match lookup_dmt(width, height, refresh_hz, reduced_blanking) {
        Some(entry) => entry.to_timing(source),
        None => match formulas::gtf(width, height, refresh_hz) {
            Ok(mut t) => {
                t.source = source;
                t
            }
            Err(e) => {
                s.note("formula timing", e);
                return;
            }
        },
    };
    s.total_timings += 1;
    insert_mode(&mut s.table, &s.caps, &timing, false);
}

fn flush_pending(s: &mut ParseSession) {
    let entries: Vec<_> = s.pending.drain().collect();
    for mut entry in entries {
        if entry.timing.preferred {
            if s.preferred_added {
                entry.timing.preferred = false;
            } else {
                s.preferred_added = true;
            }
        }
        insert_mode(&mut s.table, &s.caps, &entry.timing, entry.force_add);
    }
}

// ---------------------------------------------------------------------------
// CTA-861

fn visit_cta_extension(ext: &[u8], s: &mut ParseSession, svd_order: &mut Vec<u8>) {
    let (header, collection, dtd_area) = match cta::split(ext) {
        Ok(parts) => parts,
        Err(e) => {
            s.note("cta extension", e);
            return;
        }
    };
    if header.ycbcr444 {
        s.caps.sampling |= SamplingModes::YCBCR444;
    }
    if header.ycbcr422 {
        s.caps.sampling |= SamplingModes::YCBCR422;
    }

    visit_cta_collection(collection, s, svd_order);

    // Detailed timings trail the data blocks; padding starts at the first
    // zeroed pixel clock.
    for chunk in dtd_area.chunks_exact(dtd::DTD_SIZE) {
        match dtd::decode_dtd(chunk, ModeSource::CeDtd) {
            Ok(Some(timing)) => {
                s.total_timings += 1;
                if let Err(e) = s.pending.append(timing, true) {
                    s.note("cta extension timings", e);
                }
            }
            Ok(None) => break,
            Err(e) => {
                s.note("cta extension timings", e);
                break;
            }
        }
    }
}

/// Walk one CTA data-block collection. Display-level capability blocks are
/// visited before the video blocks: the 4K2K alias gate and the sampling
/// fan-out both depend on flags that may sit later in the same collection.
fn visit_cta_collection(collection: &[u8], s: &mut ParseSession, svd_order: &mut Vec<u8>) {
    if find_cta_block(collection, CtaSelector::vendor(OUI_HDR10_PLUS), 0).is_some() {
        s.caps.hdr10_plus = true;
    }
    let mut hf_fields: Option<&[u8]> = None;
    if let Some(payload) = find_cta_block(collection, CtaSelector::vendor(OUI_HDMI_FORUM), 0) {
        hf_fields = payload.get(3..);
    } else if let Some(payload) = find_cta_block(collection, CtaSelector::extended(CTA_EXT_HF_SCDB), 0)
    {
        hf_fields = payload.get(1..);
    }
    if let Some(caps) = hf_fields.and_then(cta::hdmi_forum_caps) {
        s.caps.max_tmds_character_rate_mhz =
            s.caps.max_tmds_character_rate_mhz.max(caps.max_tmds_character_rate_mhz);
        s.caps.max_frl_rate = s.caps.max_frl_rate.max(caps.max_frl_rate);
        s.caps.uhd_vic |= caps.uhd_vic;
        s.caps.allm |= caps.allm;
        if caps.bit_depths_420.is_some() {
            s.caps.bit_depths_420 = caps.bit_depths_420;
            s.caps.sampling |= SamplingModes::YCBCR420;
        }
        if caps.vrr.is_some() {
            s.caps.vrr = caps.vrr;
        }
        if caps.dsc.is_some() {
            s.caps.dsc = caps.dsc;
        }
    }

    let hdmi = find_cta_block(collection, CtaSelector::vendor(OUI_HDMI), 0)
        .and_then(cta::hdmi_vsdb);
    if let Some(vsdb) = &hdmi {
        s.caps.physical_address = Some(vsdb.physical_address);
        if !vsdb.deep_color.is_empty() {
            s.caps.bit_depths_all |= vsdb.deep_color;
        }
        if let Some(mhz) = vsdb.max_tmds_mhz {
            s.caps.max_tmds_character_rate_mhz = s.caps.max_tmds_character_rate_mhz.max(mhz);
        }
    }

    if let Some(payload) = find_cta_block(collection, CtaSelector::extended(CTA_EXT_HDR_STATIC), 0)
    {
        s.caps.hdr = Some(cta::hdr_static_metadata(payload));
    }
    if let Some(payload) = find_cta_block(collection, CtaSelector::extended(CTA_EXT_COLORIMETRY), 0)
    {
        s.caps.colorimetry |= cta::colorimetry(payload);
    }
    for (tag, payload) in cta_blocks(collection) {
        match tag {
            CTA_TAG_AUDIO => s.caps.audio.extend(cta::audio_descriptors(payload)),
            CTA_TAG_SPEAKER => s.caps.speakers |= cta::speaker_allocation(payload),
            _ => {}
        }
    }

    // Video path, in wire order: SVDs, 4:2:0-only SVDs, the 4:2:0 capability
    // map over the accumulated SVD list, then format preferences.
    for (tag, payload) in cta_blocks(collection) {
        if tag != CTA_TAG_VIDEO {
            continue;
        }
        for &raw in payload {
            svd_order.push(raw);
            s.total_timings += 1;
            register_vic(s, raw, VicRegistration {
                sampling: SamplingModes::RGB,
                ..VicRegistration::default()
            }, "svd list");
        }
    }
    if let Some(payload) =
        find_cta_block(collection, CtaSelector::extended(CTA_EXT_YCBCR420_VIDEO), 0)
    {
        for &raw in payload.iter().skip(1) {
            s.caps.sampling |= SamplingModes::YCBCR420;
            s.total_timings += 1;
            register_vic(s, raw, VicRegistration {
                sampling: SamplingModes::YCBCR420,
                ..VicRegistration::default()
            }, "ycbcr420 video block");
        }
    }
    if let Some(payload) =
        find_cta_block(collection, CtaSelector::extended(CTA_EXT_YCBCR420_CAP_MAP), 0)
    {
        let map = cta::Ycbcr420CapMap::decode(payload);
        for (index, &raw) in svd_order.iter().enumerate() {
            if !map.supports(index) {
                continue;
            }
            s.caps.sampling |= SamplingModes::YCBCR420;
            register_vic(s, raw, VicRegistration {
                sampling: SamplingModes::YCBCR420,
                ..VicRegistration::default()
            }, "ycbcr420 capability map");
        }
    }
    if let Some(payload) = find_cta_block(collection, CtaSelector::extended(CTA_EXT_VFPDB), 0) {
        let prefs = cta::video_format_preferences(payload);
        s.vfpdb_dtd_mask |= prefs.dtd_mask;
        for &raw in &prefs.vics {
            register_vic(s, raw, VicRegistration {
                sampling: SamplingModes::RGB,
                preferred: true,
                ..VicRegistration::default()
            }, "video format preference block");
        }
    }

    if let Some(vsdb) = hdmi {
        if !vsdb.s3d.is_empty() {
            // The structure mask covers the first 16 SVDs of the EDID.
            for &raw in svd_order.iter().take(16) {
                register_vic(s, raw, VicRegistration {
                    s3d: vsdb.s3d,
                    ..VicRegistration::default()
                }, "hdmi 3d structure mask");
            }
        }
        for &hdmi_vic in &vsdb.hdmi_vics {
            let Some(vic) = vic_for_hdmi_vic(hdmi_vic) else {
                s.note(
                    "hdmi 4k2k list",
                    EdidError::InvalidVicId { vic: hdmi_vic },
                );
                continue;
            };
            s.total_timings += 1;
            register_vic(s, vic, VicRegistration {
                sampling: SamplingModes::RGB,
                ..VicRegistration::default()
            }, "hdmi 4k2k list");
        }
    }

    // CTA carrier for DisplayID detailed timings (type VII descriptors).
    if let Some(payload) =
        find_cta_block(collection, CtaSelector::extended(CTA_EXT_DID_TYPE_VII), 0)
    {
        for chunk in payload
            .get(2..)
            .unwrap_or(&[])
            .chunks_exact(displayid::TYPE_I_TIMING_SIZE)
        {
            match displayid::type_i_timing(chunk) {
                Ok(timing) => {
                    s.total_timings += 1;
                    if let Err(e) = s.pending.append(timing, true) {
                        s.note("cta type vii timings", e);
                    }
                }
                Err(e) => s.note("cta type vii timings", e),
            }
        }
    }
}

fn register_vic(
    s: &mut ParseSession,
    raw: u8,
    registration: VicRegistration,
    context: &'static str,
) {
    if let Err(e) = s.vics.register(raw, registration, &s.caps, &mut s.table) {
        s.note(context, e);
    }
}

// ---------------------------------------------------------------------------
// DisplayID container

fn parse_displayid(blob: &[u8], s: &mut ParseSession) -> Result<()> {
    let mut svd_order: Vec<u8> = Vec::new();
    let mut offset = 0usize;
    let mut index = 0usize;
    loop {
        let data = &blob[offset..];
        let section = match displayid::section(data) {
            Ok(section) => section,
            Err(e) if index == 0 => return Err(e),
            Err(e) => {
                s.note("displayid extension section", e);
                break;
            }
        };
        if !displayid::section_checksum_ok(data, &section) {
            s.note("displayid section", EdidError::ChecksumMismatch { block: index });
        }
        visit_displayid_area(&section, s, &mut svd_order);
        offset += section.total_len;
        index += 1;
        if offset >= blob.len() {
            break;
        }
    }
    flush_pending(s);
    Ok(())
}

/// Entry point for the 0x70 EDID extension carrier: one section, flushed by
/// the enclosing EDID walk.
fn visit_displayid_payload(payload: &[u8], s: &mut ParseSession, svd_order: &mut Vec<u8>) {
    let section = match displayid::section(payload) {
        Ok(section) => section,
        Err(e) => {
            s.note("displayid extension", e);
            return;
        }
    };
    if !displayid::section_checksum_ok(payload, &section) {
        s.note("displayid extension", EdidError::ChecksumMismatch { block: 0 });
    }
    visit_displayid_area(&section, s, svd_order);
}

fn visit_displayid_area(
    section: &displayid::Section<'_>,
    s: &mut ParseSession,
    svd_order: &mut Vec<u8>,
) {
    let v2 = section.is_v2();
    let (detailed_tag, short_tag, tile_tag) = if v2 {
        (DID2_TAG_TYPE_VII_TIMING, DID2_TAG_TYPE_VIII_TIMING, DID2_TAG_TILED_TOPOLOGY)
    } else {
        (DID1_TAG_TYPE_I_TIMING, DID1_TAG_TYPE_III_TIMING, DID1_TAG_TILED_TOPOLOGY)
    };

    for (tag, _revision, payload) in displayid_blocks(section.blocks) {
        if tag == detailed_tag {
            for chunk in payload.chunks_exact(displayid::TYPE_I_TIMING_SIZE) {
                match displayid::type_i_timing(chunk) {
                    Ok(timing) => {
                        s.total_timings += 1;
                        if let Err(e) = s.pending.append(timing, true) {
                            s.note("displayid detailed timings", e);
                        }
                    }
                    Err(e) => s.note("displayid detailed timings", e),
                }
            }
        } else if tag == short_tag {
            if v2 {
                // Type VIII carries one-byte CTA video codes.
                for &raw in payload {
                    s.total_timings += 1;
                    register_vic(s, raw, VicRegistration {
                        sampling: SamplingModes::RGB,
                        ..VicRegistration::default()
                    }, "displayid enumerated timings");
                }
            } else {
                for chunk in payload.chunks_exact(displayid::TYPE_III_TIMING_SIZE) {
                    match displayid::type_iii_timing(chunk) {
                        Ok(timing) => {
                            s.total_timings += 1;
                            if let Err(e) = s.pending.append(timing, false) {
                                s.note("displayid short timings", e);
                            }
                        }
                        Err(e) => s.note("displayid short timings", e),
                    }
                }
            }
        } else if tag == tile_tag {
            match displayid::tiled_topology(payload) {
                Ok(tile) => s.caps.tile = Some(tile),
                Err(e) => s.note("tiled topology block", e),
            }
        } else if v2 && tag == DID2_TAG_INTERFACE_FEATURES {
            match displayid::interface_features(payload) {
                Ok(features) => {
                    s.caps.sampling |= features.sampling;
                    if !features.bit_depths.is_empty() {
                        s.caps.bit_depths_all |= features.bit_depths;
                    }
                    if features.bit_depths_420.is_some() {
                        s.caps.bit_depths_420 = features.bit_depths_420;
                    }
                }
                Err(e) => s.note("interface features block", e),
            }
        } else if tag == DID_TAG_CTA_EMBEDDED {
            visit_cta_collection(payload, s, svd_order);
        }
    }
}
