//! Panasonic RW2
//!
//! Recognized by the vendor header (II, magic 0x0055, first IFD at 8)
//! or by a Panasonic make tag in standard TIFF. Previews are complete
//! JPEGs referenced from the regular IFD chain.

use crate::error::Result;
use crate::jpeg;
use crate::preview::{PreviewInfo, PreviewQuality};
use crate::selection;
use crate::tiff::{TiffReader, TIFF_MAGIC};

use super::{base_info, checked_range, in_target_range};

const RW2_HEADER: [u8; 8] = [0x49, 0x49, 0x55, 0x00, 0x08, 0x00, 0x00, 0x00];

pub(crate) fn can_parse(data: &[u8]) -> bool {
    if data.len() < 8 {
        return false;
    }
    if data[..8] == RW2_HEADER {
        return true;
    }
    let Some(order) = crate::endian::Endian::detect(data) else {
        return false;
    };
    if order.read_u16(data, 2) != Some(TIFF_MAGIC) {
        return false;
    }
    let Some(reader) = TiffReader::new(data) else {
        return false;
    };
    matches!(reader.make(), Some(make) if make.starts_with("Panasonic"))
}

pub(crate) fn extract_previews(data: &[u8]) -> Result<Vec<PreviewInfo>> {
    let mut previews = Vec::new();
    if !can_parse(data) {
        return Ok(previews);
    }
    let Some(reader) = TiffReader::new(data) else {
        return Ok(previews);
    };
    let orientation = reader.orientation();

    for raw in reader.find_previews() {
        if raw.offset == 0 || raw.size == 0 {
            continue;
        }
        let bytes = checked_range(data, raw.offset, raw.size)?;
        if !jpeg::is_valid(bytes) {
            continue;
        }
        let mut info = base_info(&raw, orientation);
        info.quality = jpeg::classify(raw.width, raw.height, raw.size);
        info.label = "Rw2Preview".into();
        info.priority = if in_target_range(raw.size) {
            10
        } else if info.quality == PreviewQuality::Preview {
            8
        } else {
            5
        };
        previews.push(info);
    }
    Ok(previews)
}

pub(crate) fn select_best(previews: &[PreviewInfo]) -> Option<&PreviewInfo> {
    selection::best_by_size(previews)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{jpeg_body, rw2_builder, TiffBuilder};
    use crate::tiff::tags;

    #[test]
    fn test_can_parse_vendor_header() {
        let mut b = rw2_builder();
        let ifd0 = b.add_ifd();
        b.strips(ifd0, &jpeg_body(500 * 1024, 1920, 1440));
        let data = b.build();
        assert_eq!(&data[..8], &RW2_HEADER);
        assert!(can_parse(&data));
    }

    #[test]
    fn test_can_parse_panasonic_make() {
        let mut b = TiffBuilder::new();
        let ifd0 = b.add_ifd();
        b.ascii(ifd0, tags::MAKE, "Panasonic");
        b.strips(ifd0, &jpeg_body(500 * 1024, 1920, 1440));
        assert!(can_parse(&b.build()));
        assert!(!can_parse(b"II\x2a\x00\x08\x00\x00\x00"));
    }

    #[test]
    fn test_priority_tiers() {
        let mut b = rw2_builder();
        let ifd0 = b.add_ifd();
        b.strips(ifd0, &jpeg_body(500 * 1024, 1920, 1440));
        let ifd1 = b.add_ifd();
        b.strips(ifd1, &jpeg_body(10 * 1024, 160, 120));
        let previews = extract_previews(&b.build()).unwrap();

        assert_eq!(previews[0].priority, 10);
        assert_eq!(previews[1].priority, 5);
        assert_eq!(select_best(&previews).unwrap().size, 500 * 1024);
    }
}
