//! JPEG stream validation and classification
//!
//! RAW containers reference embedded JPEG streams by offset/length pairs
//! that cannot be trusted. This module confirms a candidate span actually
//! is a JPEG stream (SOI at the start, EOI before the end), locates
//! markers inside arbitrary spans, sniffs image dimensions from the SOF
//! marker, and classifies a candidate into a quality tier.

use byteorder::{BigEndian, ByteOrder};

use crate::preview::PreviewQuality;

/// Start-of-image marker (0xFFD8)
pub const SOI: [u8; 2] = [0xFF, 0xD8];
/// End-of-image marker (0xFFD9)
pub const EOI: [u8; 2] = [0xFF, 0xD9];

// Classification thresholds. Byte-size checks take priority when
// dimensions are unknown (0).
const THUMBNAIL_MAX_BYTES: usize = 64 * 1024;
const FULL_MIN_BYTES: usize = 3 * 1024 * 1024;
const THUMBNAIL_MAX_WIDTH: u32 = 320;
const THUMBNAIL_MAX_HEIGHT: u32 = 240;
const FULL_MIN_DIM: u32 = 2048;

/// Find the first SOI marker within `data`, returning its offset
pub fn find_soi(data: &[u8]) -> Option<usize> {
    data.windows(2).position(|w| w == SOI)
}

/// Find the first EOI marker at or after `from`, returning the offset
/// one past the marker (the exclusive end of the JPEG stream)
pub fn find_eoi(data: &[u8], from: usize) -> Option<usize> {
    let start = from.max(2);
    if start >= data.len() {
        return None;
    }
    data[start..]
        .windows(2)
        .position(|w| w == EOI)
        .map(|pos| start + pos + 2)
}

/// True if `data` is a structurally plausible JPEG stream: SOI at the
/// very start and an EOI somewhere after it.
pub fn is_valid(data: &[u8]) -> bool {
    if data.len() < 4 || data[0..2] != SOI {
        return false;
    }
    // Scan backward; real streams end at or very near the EOI.
    data[2..].windows(2).rev().any(|w| w == EOI)
}

/// Sniff pixel dimensions from the first SOF marker (baseline,
/// extended-sequential or progressive). Returns None for streams
/// truncated before the frame header.
pub fn dimensions(data: &[u8]) -> Option<(u32, u32)> {
    if data.len() < 4 || data[0..2] != SOI {
        return None;
    }
    let mut pos = 2;
    while pos + 4 <= data.len() {
        if data[pos] != 0xFF {
            pos += 1;
            continue;
        }
        let marker = data[pos + 1];
        match marker {
            // Padding / standalone markers carry no length field
            0xFF | 0x00 | 0x01 | 0xD0..=0xD9 => {
                pos += 2;
                continue;
            }
            // SOF0/SOF1/SOF2: [len u16][precision u8][height u16][width u16]
            0xC0 | 0xC1 | 0xC2 => {
                if pos + 9 > data.len() {
                    return None;
                }
                let height = BigEndian::read_u16(&data[pos + 5..pos + 7]) as u32;
                let width = BigEndian::read_u16(&data[pos + 7..pos + 9]) as u32;
                return Some((width, height));
            }
            // Entropy-coded data follows SOS; stop looking
            0xDA => return None,
            _ => {
                let len = BigEndian::read_u16(&data[pos + 2..pos + 4]) as usize;
                if len < 2 {
                    return None;
                }
                pos += 2 + len;
            }
        }
    }
    None
}

/// Classify a candidate by dimensions and byte size into a quality tier
pub fn classify(width: u32, height: u32, byte_size: usize) -> PreviewQuality {
    if width == 0 || height == 0 {
        // Dimensions unknown; decide on byte size alone
        return if byte_size <= THUMBNAIL_MAX_BYTES {
            PreviewQuality::Thumbnail
        } else if byte_size > FULL_MIN_BYTES {
            PreviewQuality::Full
        } else {
            PreviewQuality::Preview
        };
    }

    if byte_size <= THUMBNAIL_MAX_BYTES
        || (width <= THUMBNAIL_MAX_WIDTH && height <= THUMBNAIL_MAX_HEIGHT)
    {
        return PreviewQuality::Thumbnail;
    }

    if byte_size > FULL_MIN_BYTES || width > FULL_MIN_DIM || height > FULL_MIN_DIM {
        return PreviewQuality::Full;
    }

    PreviewQuality::Preview
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::jpeg_body;

    #[test]
    fn test_marker_search() {
        let data = [0x00, 0x11, 0xFF, 0xD8, 0xAA, 0xBB, 0xFF, 0xD9, 0x00];
        assert_eq!(find_soi(&data), Some(2));
        assert_eq!(find_eoi(&data, 2), Some(8));
        assert_eq!(find_soi(&[0u8; 16]), None);
        assert_eq!(find_eoi(&data, 8), None);
    }

    #[test]
    fn test_is_valid() {
        assert!(is_valid(&jpeg_body(1024, 640, 480)));
        assert!(!is_valid(&[0xFF, 0xD8, 0x00])); // no EOI
        assert!(!is_valid(&[0x00, 0xFF, 0xD8, 0xFF, 0xD9])); // SOI not first
        assert!(!is_valid(&[]));
    }

    #[test]
    fn test_dimensions_from_sof() {
        let body = jpeg_body(4096, 1620, 1080);
        assert_eq!(dimensions(&body), Some((1620, 1080)));
        assert_eq!(dimensions(&[0xFF, 0xD8, 0xFF, 0xD9]), None);
    }

    #[test]
    fn test_classify_by_dimensions() {
        assert_eq!(classify(160, 120, 10 * 1024), PreviewQuality::Thumbnail);
        assert_eq!(classify(1620, 1080, 400 * 1024), PreviewQuality::Preview);
        assert_eq!(classify(2256, 1504, 1800 * 1024), PreviewQuality::Full);
        assert_eq!(classify(6000, 4000, 8 * 1024 * 1024), PreviewQuality::Full);
    }

    #[test]
    fn test_classify_by_size_when_dimensions_unknown() {
        assert_eq!(classify(0, 0, 20 * 1024), PreviewQuality::Thumbnail);
        assert_eq!(classify(0, 0, 900 * 1024), PreviewQuality::Preview);
        assert_eq!(classify(0, 0, 5 * 1024 * 1024), PreviewQuality::Full);
    }
}
