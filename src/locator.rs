//! Generic tagged-block search over the two container wire formats.
//!
//! CTA-861 data blocks carry a one-byte tag+length header and are packed
//! back-to-back until the collection budget runs out. DisplayID data blocks
//! carry a three-byte header (tag, revision/flags, payload length) and an
//! all-zero header is a padding sentinel terminating the scan. Both walks
//! halt on a length field that would cross the enclosing buffer; the caller
//! sees "not found" instead of an out-of-bounds read.

use crate::constants::{CTA_TAG_EXTENDED, CTA_TAG_VENDOR};

/// Selector for a CTA-861 data block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CtaSelector {
    pub tag: u8,
    /// Required second-byte extended tag when `tag == CTA_TAG_EXTENDED`.
    pub extended: Option<u8>,
    /// Required 24-bit vendor registration id when `tag == CTA_TAG_VENDOR`.
    pub oui: Option<u32>,
}

impl CtaSelector {
    #[must_use]
    pub fn tag(tag: u8) -> Self {
        Self {
            tag,
            extended: None,
            oui: None,
        }
    }

    #[must_use]
    pub fn extended(extended: u8) -> Self {
        Self {
            tag: CTA_TAG_EXTENDED,
            extended: Some(extended),
            oui: None,
        }
    }

    #[must_use]
    pub fn vendor(oui: u32) -> Self {
        Self {
            tag: CTA_TAG_VENDOR,
            extended: None,
            oui: Some(oui),
        }
    }

    fn matches(&self, tag: u8, payload: &[u8]) -> bool {
        if tag != self.tag {
            return false;
        }
        if let Some(ext) = self.extended {
            return payload.first() == Some(&ext);
        }
        if let Some(oui) = self.oui {
            if payload.len() < 3 {
                return false;
            }
            let got =
                u32::from(payload[0]) | (u32::from(payload[1]) << 8) | (u32::from(payload[2]) << 16);
            return got == oui;
        }
        true
    }
}

/// Walk a CTA data-block collection, yielding `(tag, payload)` pairs.
/// The payload includes the extended-tag / OUI bytes when present.
pub fn cta_blocks(collection: &[u8]) -> impl Iterator<Item = (u8, &[u8])> {
    let mut pos = 0usize;
    std::iter::from_fn(move || {
        let header = *collection.get(pos)?;
        let tag = header >> 5;
        let len = usize::from(header & 0x1F);
        let start = pos + 1;
        let end = start.checked_add(len)?;
        if end > collection.len() {
            // Declared length walks past the collection budget: halt the
            // scan rather than read out of bounds.
            tracing::debug!(
                locator.offset = pos,
                locator.declared = len,
                locator.available = collection.len() - start.min(collection.len()),
                "cta block length exceeds budget, halting scan"
            );
            return None;
        }
        pos = end;
        Some((tag, &collection[start..end]))
    })
}

/// Find the Nth CTA block matching `selector` (0-based occurrence index).
/// Returns the block payload, including extended-tag / OUI prefix bytes.
#[must_use]
pub fn find_cta_block(collection: &[u8], selector: CtaSelector, occurrence: usize) -> Option<&[u8]> {
    cta_blocks(collection)
        .filter(|(tag, payload)| selector.matches(*tag, payload))
        .map(|(_, payload)| payload)
        .nth(occurrence)
}

/// Count matching CTA blocks without returning payloads; drives
/// "for each instance" loops over repeatable block types.
#[must_use]
pub fn count_cta_blocks(collection: &[u8], selector: CtaSelector) -> usize {
    cta_blocks(collection)
        .filter(|(tag, payload)| selector.matches(*tag, payload))
        .count()
}

/// Walk a DisplayID data-block area, yielding `(tag, revision, payload)`.
pub fn displayid_blocks(area: &[u8]) -> impl Iterator<Item = (u8, u8, &[u8])> {
    let mut pos = 0usize;
    std::iter::from_fn(move || {
        let header = area.get(pos..pos + 3)?;
        let (tag, revision, len) = (header[0], header[1], usize::from(header[2]));
        if tag == 0 && revision == 0 && len == 0 {
            // Padding sentinel terminates the block area.
            return None;
        }
        let start = pos + 3;
        let end = start.checked_add(len)?;
        if end > area.len() {
            tracing::debug!(
                locator.offset = pos,
                locator.declared = len,
                "displayid block length exceeds budget, halting scan"
            );
            return None;
        }
        pos = end;
        Some((tag, revision, &area[start..end]))
    })
}

/// Find the Nth DisplayID data block with the given tag.
#[must_use]
pub fn find_displayid_block(area: &[u8], tag: u8, occurrence: usize) -> Option<&[u8]> {
    displayid_blocks(area)
        .filter(|(t, _, _)| *t == tag)
        .map(|(_, _, payload)| payload)
        .nth(occurrence)
}

/// Count DisplayID data blocks with the given tag.
#[must_use]
pub fn count_displayid_blocks(area: &[u8], tag: u8) -> usize {
    displayid_blocks(area).filter(|(t, _, _)| *t == tag).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{CTA_TAG_AUDIO, CTA_TAG_VIDEO};

    fn block(tag: u8, payload: &[u8]) -> Vec<u8> {
        let mut v = vec![(tag << 5) | (payload.len() as u8 & 0x1F)];
        v.extend_from_slice(payload);
        v
    }

    #[test]
    fn finds_nth_occurrence() {
        let mut collection = block(CTA_TAG_AUDIO, &[1, 2, 3]);
        collection.extend(block(CTA_TAG_VIDEO, &[0x10]));
        collection.extend(block(CTA_TAG_AUDIO, &[4, 5, 6]));

        let sel = CtaSelector::tag(CTA_TAG_AUDIO);
        assert_eq!(find_cta_block(&collection, sel, 0), Some(&[1, 2, 3][..]));
        assert_eq!(find_cta_block(&collection, sel, 1), Some(&[4, 5, 6][..]));
        assert_eq!(find_cta_block(&collection, sel, 2), None);
        assert_eq!(count_cta_blocks(&collection, sel), 2);
    }

    #[test]
    fn extended_tag_matches_second_byte() {
        let collection = block(CTA_TAG_EXTENDED, &[0x0D, 0xAA]);
        assert_eq!(
            find_cta_block(&collection, CtaSelector::extended(0x0D), 0),
            Some(&[0x0D, 0xAA][..])
        );
        assert_eq!(find_cta_block(&collection, CtaSelector::extended(0x0E), 0), None);
    }

    #[test]
    fn vendor_block_matches_oui() {
        let collection = block(CTA_TAG_VENDOR, &[0x03, 0x0C, 0x00, 0x42]);
        assert_eq!(
            find_cta_block(&collection, CtaSelector::vendor(0x00_0C03), 0),
            Some(&[0x03, 0x0C, 0x00, 0x42][..])
        );
        assert_eq!(
            find_cta_block(&collection, CtaSelector::vendor(0xC4_5DD8), 0),
            None
        );
    }

    #[test]
    fn oversized_length_halts_without_oob() {
        // Header declares 31 payload bytes; only 2 present.
        let collection = [(CTA_TAG_VIDEO << 5) | 0x1F, 0xAA, 0xBB];
        assert_eq!(
            find_cta_block(&collection, CtaSelector::tag(CTA_TAG_VIDEO), 0),
            None
        );
    }

    #[test]
    fn displayid_sentinel_terminates() {
        let mut area = vec![0x03, 0x00, 0x02, 0xAA, 0xBB];
        area.extend([0x00, 0x00, 0x00]); // padding sentinel
        area.extend([0x03, 0x00, 0x01, 0xCC]); // unreachable past sentinel
        assert_eq!(find_displayid_block(&area, 0x03, 0), Some(&[0xAA, 0xBB][..]));
        assert_eq!(find_displayid_block(&area, 0x03, 1), None);
        assert_eq!(count_displayid_blocks(&area, 0x03), 1);
    }

    #[test]
    fn displayid_bad_length_halts() {
        let area = [0x03, 0x00, 0x7F, 0xAA];
        assert_eq!(find_displayid_block(&area, 0x03, 0), None);
    }
}
