//! Canon CR3 (ISO base media container)
//!
//! Unlike the TIFF formats, CR3 stores previews in boxes: a THMB box
//! with a small thumbnail, a Canon-UUID box wrapping a PRVW box with
//! the screen-sized preview, and the mdat box which usually opens with
//! a full-resolution JPEG. Orientation lives in the CMT1 metadata block
//! at a fixed offset.

use crate::endian::Endian;
use crate::error::Result;
use crate::jpeg;
use crate::options::ExtractionOptions;
use crate::preview::{PreviewInfo, PreviewQuality};
use crate::selection;

const BRAND_CR3: &[u8; 4] = b"cr3 ";
const BRAND_CRX: &[u8; 4] = b"crx ";

const PREVIEW_UUID: [u8; 16] = [
    0xea, 0xf4, 0x2b, 0x5e, 0x1c, 0x98, 0x4b, 0x88, 0xb9, 0xfb, 0xb7, 0xdc, 0x40, 0x6e, 0x4d, 0x16,
];

// Orientation offset within the CMT1 block
const CMT1_ORIENTATION_AT: usize = 0x140;

struct BoxHeader {
    kind: [u8; 4],
    size: usize,
}

fn parse_box(data: &[u8], offset: usize) -> Option<BoxHeader> {
    let size32 = Endian::Big.read_u32(data, offset)? as usize;
    let kind: [u8; 4] = data.get(offset + 4..offset + 8)?.try_into().ok()?;
    let size = if size32 == 1 {
        // 64-bit size follows the type, clamped to what is actually here
        let size64 = Endian::Big.read_u64(data, offset + 8)?;
        (size64 as usize).min(data.len() - offset)
    } else if size32 == 0 {
        // Box extends to the end of the file
        data.len() - offset
    } else {
        size32
    };
    Some(BoxHeader { kind, size })
}

fn find_fourcc(data: &[u8], fourcc: &[u8; 4]) -> Option<usize> {
    data.windows(4).position(|w| w == fourcc)
}

pub(crate) fn can_parse(data: &[u8]) -> bool {
    if data.len() < 20 {
        return false;
    }
    if &data[4..8] != b"ftyp" {
        return false;
    }
    let brand = &data[8..12];
    brand == BRAND_CR3 || brand == BRAND_CRX
}

pub(crate) fn extract_previews(data: &[u8]) -> Result<Vec<PreviewInfo>> {
    let mut previews = Vec::new();
    if !can_parse(data) {
        return Ok(previews);
    }

    let orientation = extract_orientation(data);
    // Candidate order is part of the contract: THMB, PRVW, MDAT
    if let Some(p) = thumbnail_preview(data, orientation) {
        previews.push(p);
    }
    if let Some(p) = uuid_preview(data, orientation) {
        previews.push(p);
    }
    if let Some(p) = mdat_preview(data, orientation) {
        previews.push(p);
    }
    Ok(previews)
}

/// THMB box scan; thumbnail JPEG data sits 16 bytes past the fourcc
fn thumbnail_preview(data: &[u8], orientation: u16) -> Option<PreviewInfo> {
    let fourcc_at = find_fourcc(data, b"THMB")?;
    if fourcc_at + 20 >= data.len() {
        return None;
    }
    let search_from = fourcc_at + 16;
    let start = search_from + jpeg::find_soi(&data[search_from..])?;
    let end = jpeg::find_eoi(data, start)?;
    let bytes = &data[start..end];
    if !jpeg::is_valid(bytes) {
        return None;
    }
    let (width, height) = jpeg::dimensions(bytes).unwrap_or((160, 120));
    Some(PreviewInfo {
        offset: start,
        size: end - start,
        width,
        height,
        is_jpeg: true,
        quality: PreviewQuality::Thumbnail,
        priority: 1,
        orientation,
        label: "Cr3Thmb".into(),
        ..Default::default()
    })
}

/// Walk top-level boxes for the Canon preview UUID and pull the JPEG
/// out of the PRVW box inside it
fn uuid_preview(data: &[u8], orientation: u16) -> Option<PreviewInfo> {
    let mut offset = 0;
    while offset + 8 <= data.len() {
        let bx = parse_box(data, offset)?;
        if bx.size == 0 {
            return None;
        }
        if &bx.kind == b"uuid"
            && bx.size >= 32
            && data.get(offset + 8..offset + 24)? == PREVIEW_UUID
        {
            return prvw_jpeg(data, offset + 24, orientation);
        }
        if bx.size < 8 {
            return None;
        }
        offset += bx.size;
    }
    None
}

/// The uuid payload carries an 8-byte header, then the PRVW box: 8-byte
/// box header plus a 16-byte internal header before the JPEG
fn prvw_jpeg(data: &[u8], uuid_data: usize, orientation: u16) -> Option<PreviewInfo> {
    let prvw_box = uuid_data + 8;
    let prvw_size = Endian::Big.read_u32(data, prvw_box)? as usize;
    if data.get(prvw_box + 4..prvw_box + 8)? != b"PRVW" || prvw_size <= 20 {
        return None;
    }
    let search_from = prvw_box + 24;
    if search_from >= data.len() {
        return None;
    }
    let start = search_from + jpeg::find_soi(&data[search_from..])?;
    // The stream must end inside the PRVW box
    let limit = data.len().min(prvw_box + prvw_size);
    let end = jpeg::find_eoi(&data[..limit], start)?;
    let max_size = prvw_size - (start - prvw_box);
    if end <= start || end - start > max_size {
        return None;
    }
    let bytes = &data[start..end];
    if !jpeg::is_valid(bytes) {
        return None;
    }
    let (width, height) = jpeg::dimensions(bytes).unwrap_or((0, 0));
    Some(PreviewInfo {
        offset: start,
        size: end - start,
        width,
        height,
        is_jpeg: true,
        quality: PreviewQuality::Preview,
        priority: 5,
        orientation,
        label: "Cr3Prvw".into(),
        ..Default::default()
    })
}

/// The mdat box usually opens with the full-resolution JPEG; only
/// streams over 1 MiB qualify
fn mdat_preview(data: &[u8], orientation: u16) -> Option<PreviewInfo> {
    let mut offset = 0;
    while offset + 8 <= data.len() {
        let bx = parse_box(data, offset)?;
        if bx.size == 0 {
            return None;
        }
        if &bx.kind == b"mdat" {
            let content = offset + 8;
            let limit = data.len().min(offset + bx.size);
            if content >= limit {
                return None;
            }
            let start = content + jpeg::find_soi(&data[content..limit])?;
            let end = jpeg::find_eoi(&data[..limit], start)?;
            if end <= start || end - start <= 1024 * 1024 {
                return None;
            }
            let bytes = &data[start..end];
            if !jpeg::is_valid(bytes) {
                return None;
            }
            let (width, height) = jpeg::dimensions(bytes).unwrap_or((5472, 3648));
            return Some(PreviewInfo {
                offset: start,
                size: end - start,
                width,
                height,
                is_jpeg: true,
                quality: PreviewQuality::Full,
                priority: 10,
                orientation,
                label: "Cr3Mdat".into(),
                ..Default::default()
            });
        }
        if bx.size < 8 {
            return None;
        }
        offset += bx.size;
    }
    None
}

/// Orientation from the CMT1 metadata block, little-endian u16 at a
/// fixed offset from the fourcc; anything outside 1-8 falls back to 1
fn extract_orientation(data: &[u8]) -> u16 {
    if let Some(at) = find_fourcc(data, b"CMT1") {
        if let Some(value) = Endian::Little.read_u16(data, at + CMT1_ORIENTATION_AT) {
            if (1..=8).contains(&value) {
                return value;
            }
        }
    }
    1
}

pub(crate) fn select_best<'a>(
    previews: &'a [PreviewInfo],
    options: &ExtractionOptions,
) -> Option<&'a PreviewInfo> {
    selection::best_in_range_or_first(previews, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{jpeg_body, Cr3Builder};

    #[test]
    fn test_can_parse_brands() {
        assert!(can_parse(&Cr3Builder::new().build()));
        assert!(can_parse(&Cr3Builder::new().brand(*b"cr3 ").build()));
        assert!(!can_parse(&Cr3Builder::new().brand(*b"isom").build()));
        assert!(!can_parse(b"short"));
    }

    #[test]
    fn test_three_candidates_in_order() {
        let thumb = jpeg_body(6 * 1024, 160, 120);
        let prvw = jpeg_body(900 * 1024, 1620, 1080);
        let full = jpeg_body(2 * 1024 * 1024, 5472, 3648);
        let mut b = Cr3Builder::new();
        b.thumbnail(&thumb).preview(&prvw).full(&full);
        let data = b.build();

        let previews = extract_previews(&data).unwrap();
        assert_eq!(previews.len(), 3);
        assert_eq!(previews[0].label, "Cr3Thmb");
        assert_eq!(previews[0].priority, 1);
        assert_eq!(previews[1].label, "Cr3Prvw");
        assert_eq!(previews[1].quality, PreviewQuality::Preview);
        assert_eq!(previews[2].label, "Cr3Mdat");
        assert_eq!(previews[2].priority, 10);

        // Each candidate's bytes round-trip
        for (p, source) in previews.iter().zip([&thumb, &prvw, &full]) {
            assert_eq!(&data[p.offset..p.offset + p.size], &source[..]);
        }
    }

    #[test]
    fn test_prvw_dimensions_sniffed_from_sof() {
        let prvw = jpeg_body(400 * 1024, 1620, 1080);
        let mut b = Cr3Builder::new();
        b.preview(&prvw);
        let previews = extract_previews(&b.build()).unwrap();
        assert_eq!(previews.len(), 1);
        assert_eq!((previews[0].width, previews[0].height), (1620, 1080));
    }

    #[test]
    fn test_small_mdat_jpeg_not_full() {
        // Under the 1 MiB floor the mdat stream is not a full preview
        let small = jpeg_body(200 * 1024, 1024, 683);
        let mut b = Cr3Builder::new();
        b.full(&small);
        let previews = extract_previews(&b.build()).unwrap();
        assert!(previews.is_empty());
    }

    #[test]
    fn test_orientation_from_cmt1() {
        let thumb = jpeg_body(6 * 1024, 160, 120);
        let mut b = Cr3Builder::new();
        b.orientation(6).thumbnail(&thumb);
        let previews = extract_previews(&b.build()).unwrap();
        assert_eq!(previews[0].orientation, 6);

        let mut plain = Cr3Builder::new();
        plain.thumbnail(&thumb);
        let previews = extract_previews(&plain.build()).unwrap();
        assert_eq!(previews[0].orientation, 1);
    }

    #[test]
    fn test_select_prefers_in_range() {
        let thumb = jpeg_body(6 * 1024, 160, 120);
        let prvw = jpeg_body(900 * 1024, 1620, 1080);
        let full = jpeg_body(4 * 1024 * 1024, 5472, 3648);
        let mut b = Cr3Builder::new();
        b.thumbnail(&thumb).preview(&prvw).full(&full);
        let previews = extract_previews(&b.build()).unwrap();

        let options = ExtractionOptions::default();
        let best = select_best(&previews, &options).unwrap();
        assert_eq!(best.label, "Cr3Prvw");
    }
}
