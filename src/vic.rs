//! CE video-identification-code aggregation.
//!
//! The same logical CE format can be discovered through up to six different
//! sub-blocks (SVD list, 420-capable SVD list, 420 capability map, VFPDB,
//! HDMI VSDB 4K2K list, DisplayID-embedded CTA blocks). All of them funnel
//! into one registry entry per logical format; attribute bits accumulate and
//! are never cleared. Each successful registration immediately expands into
//! pixel-repetition variants forwarded to the mode table.

use crate::constants::MAX_VIC_DEFINED;
use crate::error::{EdidError, Result};
use crate::insert::insert_mode;
use crate::tables::{self, CeShortVideoEntry, REP_1X, REP_2X, REP_4X};
use crate::types::capability::DisplayCapabilities;
use crate::types::mode_table::ModeTable;
use crate::types::timing::{S3dFormats, SamplingModes, SignalStandard, TimingRecord, VicSlot};

/// Attributes carried by one registration call.
#[derive(Debug, Clone, Copy, Default)]
pub struct VicRegistration {
    pub sampling: SamplingModes,
    pub native: bool,
    pub preferred: bool,
    pub s3d: S3dFormats,
}

/// One logical CE video format. Slot 1 is only populated when the same
/// reference timing is re-declared under a second aspect-ratio code.
#[derive(Debug)]
pub struct VicRegistryEntry {
    pub slots: [Option<VicSlot>; 2],
    pub hdmi_vic_4k2k: Option<u8>,
    pub preferred: bool,
    pub standard: SignalStandard,
    pub sampling: SamplingModes,
    pub s3d: S3dFormats,
    pub reference: &'static CeShortVideoEntry,
}

impl VicRegistryEntry {
    fn holds_vic(&self, vic: u8) -> bool {
        self.slots.iter().flatten().any(|slot| slot.vic == vic)
    }
}

/// Two reference entries describe the same physical timing when everything
/// but the VIC id and aspect-ratio code agrees.
fn same_reference_timing(a: &CeShortVideoEntry, b: &CeShortVideoEntry) -> bool {
    std::ptr::eq(a, b)
        || (a.h_active == b.h_active
            && a.h_blank == b.h_blank
            && a.v_active == b.v_active
            && a.v_blank == b.v_blank
            && a.pixel_clock_khz == b.pixel_clock_khz
            && a.refresh_millihz == b.refresh_millihz
            && a.interlaced == b.interlaced)
}

#[derive(Debug, Default)]
pub struct VicRegistry {
    entries: Vec<VicRegistryEntry>,
}

impl VicRegistry {
    #[must_use]
    pub fn entries(&self) -> &[VicRegistryEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn find(&self, vic: u8) -> Option<&VicRegistryEntry> {
        self.entries.iter().find(|e| e.holds_vic(vic))
    }

    /// Register one VIC discovery and expand it into the mode table.
    ///
    /// `raw_code` is the wire byte: values 129..=192 carry the native-format
    /// flag for VICs 1..=64 in their top bit; higher ids are used directly.
    pub fn register(
        &mut self,
        raw_code: u8,
        registration: VicRegistration,
        caps: &DisplayCapabilities,
        table: &mut ModeTable,
    ) -> Result<()> {
        let (vic, native_bit) = normalize_vic(raw_code);
        let reference = tables::ce_timing(vic).ok_or(EdidError::InvalidVicId { vic })?;
        let native = registration.native || native_bit;

        // HDMI 2.1a Annex E: without UHD_VIC/ALLM/HDR10+ the 4K2K formats are
        // only reachable through the HDMI-VIC namespace, so the alias goes in
        // the dedicated slot and the primary slots stay undefined.
        let suppressed_alias = if caps.allows_native_4k2k_vics() {
            None
        } else {
            tables::hdmi_vic_alias(vic)
        };

        let index = self.entries.iter().position(|entry| {
            if let Some(alias) = suppressed_alias {
                return entry.hdmi_vic_4k2k == Some(alias)
                    || same_reference_timing(entry.reference, reference);
            }
            entry.holds_vic(vic) || same_reference_timing(entry.reference, reference)
        });

        let index = match index {
            Some(i) => {
                let entry = &mut self.entries[i];
                entry.sampling |= registration.sampling;
                entry.s3d |= registration.s3d;
                entry.preferred |= registration.preferred;
                entry.standard = SignalStandard::Cta861;
                if let Some(alias) = suppressed_alias {
                    entry.hdmi_vic_4k2k = Some(alias);
                } else if let Some(slot) = entry
                    .slots
                    .iter_mut()
                    .flatten()
                    .find(|slot| slot.vic == vic)
                {
                    slot.native |= native;
                } else if entry.slots[1].is_none() {
                    // Same timing under a second aspect-ratio code.
                    entry.slots[1] = Some(VicSlot {
                        vic,
                        aspect: reference.aspect,
                        native,
                    });
                }
                i
            }
            None => {
                if self.entries.len() >= MAX_VIC_DEFINED {
                    return Err(EdidError::CapacityExceeded {
                        registry: "vic registry",
                        capacity: MAX_VIC_DEFINED,
                    });
                }
                let primary = if suppressed_alias.is_some() {
                    None
                } else {
                    Some(VicSlot {
                        vic,
                        aspect: reference.aspect,
                        native,
                    })
                };
                tracing::debug!(
                    vic.id = vic,
                    vic.native = native,
                    vic.suppressed_alias = ?suppressed_alias,
                    "new vic registry entry"
                );
                self.entries.push(VicRegistryEntry {
                    slots: [primary, None],
                    hdmi_vic_4k2k: suppressed_alias,
                    preferred: registration.preferred,
                    standard: SignalStandard::Cta861,
                    sampling: registration.sampling,
                    s3d: registration.s3d,
                    reference,
                });
                self.entries.len() - 1
            }
        };

        self.expand(index, vic, caps, table);
        Ok(())
    }

    /// Expand one registry entry into its pixel-repetition variants and
    /// forward them to the insertion engine with `force_add` set.
    fn expand(&self, index: usize, current_vic: u8, caps: &DisplayCapabilities, table: &mut ModeTable) {
        let entry = &self.entries[index];
        for (factor, bit) in [(1u32, REP_1X), (2, REP_2X), (4, REP_4X)] {
            if entry.reference.repetition_mask & bit == 0 {
                continue;
            }
            let mut sampling = entry.sampling;
            // 4:2:0 is disallowed for interlaced formats and for any
            // pixel-repeated variant.
            if entry.reference.interlaced || factor > 1 {
                sampling.remove(SamplingModes::YCBCR420);
            }
            if sampling.is_empty() && !entry.sampling.is_empty() {
                continue;
            }

            let mut timing = entry.reference.to_timing().with_pixel_repetition(factor);
            if self.geometry_already_registered(index, &timing, sampling) {
                tracing::debug!(
                    vic.id = current_vic,
                    vic.repetition = factor,
                    "repetition variant collides with another vic, skipped"
                );
                continue;
            }

            timing.preferred = entry.preferred;
            timing.ce.sampling = sampling;
            timing.ce.vic_slots = entry.slots;
            timing.ce.hdmi_vic_4k2k = entry.hdmi_vic_4k2k;
            timing.ce.s3d = entry.s3d;
            timing.ce.bit_depths = caps.bit_depths_all;
            insert_mode(table, caps, &timing, true);
        }
    }

    /// A repetition variant is dropped when its geometry coincides with a
    /// *different* registry entry's reference timing. The entry under
    /// expansion is excluded by position rather than by slot-0 VIC so that a
    /// 4K2K-suppressed entry, whose primary slots are empty, does not collide
    /// with its own reference timing.
    fn geometry_already_registered(
        &self,
        index: usize,
        candidate: &TimingRecord,
        sampling: SamplingModes,
    ) -> bool {
        self.entries.iter().enumerate().any(|(i, other)| {
            if i == index {
                return false;
            }
            let r = other.reference;
            r.h_active == candidate.h_active
                && r.v_active == candidate.v_active
                && r.h_active + r.h_blank == candidate.h_total()
                && r.v_active + r.v_blank == candidate.v_total()
                && r.refresh_millihz == candidate.refresh_millihz
                && r.interlaced == candidate.interlaced
                && other.sampling.intersects(sampling)
        })
    }
}

/// Split the raw wire byte into canonical VIC id and native-format bit.
#[must_use]
pub fn normalize_vic(raw: u8) -> (u8, bool) {
    if (129..=192).contains(&raw) {
        (raw - 128, true)
    } else {
        (raw, false)
    }
}
