//! Adobe DNG
//!
//! The one format that actually documents its preview layout: IFD0
//! holds a thumbnail, SubIFDs hold the larger previews, and
//! NewSubfileType == 1 marks reduced-resolution images. Identified by
//! the DNGVersion tag, with the Software tag as a fallback for files
//! Adobe converted without one.

use crate::error::Result;
use crate::jpeg;
use crate::preview::{IfdSlot, PreviewInfo, PreviewQuality};
use crate::selection;
use crate::tiff::{tags, TiffReader, TIFF_MAGIC};

use super::{base_info, checked_range, in_target_range};

pub(crate) fn can_parse(data: &[u8]) -> bool {
    let Some(order) = crate::endian::Endian::detect(data) else {
        return false;
    };
    if order.read_u16(data, 2) != Some(TIFF_MAGIC) {
        return false;
    }
    let Some(reader) = TiffReader::new(data) else {
        return false;
    };
    let Some(ifd0) = reader.parse_ifd(reader.first_ifd) else {
        return false;
    };
    if ifd0.has(tags::DNG_VERSION) {
        return true;
    }
    matches!(reader.software(), Some(software) if software.starts_with("Adobe"))
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
        if raw.subfile_type == 1 {
            info.quality = jpeg::classify(raw.width, raw.height, raw.size);
            info.label = "DngReduced".into();
            info.priority = if in_target_range(raw.size) { 10 } else { 8 };
        } else if let IfdSlot::Sub(i) = raw.slot {
            info.quality = jpeg::classify(raw.width, raw.height, raw.size);
            info.label = format!("DngSubIfd{i}");
            info.priority = 9;
        } else if raw.slot == IfdSlot::Main(0) {
            info.quality = PreviewQuality::Thumbnail;
            info.label = "DngIfd0".into();
            info.priority = 2;
        } else {
            info.quality = jpeg::classify(raw.width, raw.height, raw.size);
            info.label = "DngOther".into();
            info.priority = 5;
        }
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
    use crate::test_utils::{jpeg_body, TiffBuilder};

    fn dng_with_version() -> (TiffBuilder, usize) {
        let mut b = TiffBuilder::new();
        let ifd0 = b.add_ifd();
        b.long(ifd0, tags::DNG_VERSION, 0x0104_0000);
        (b, ifd0)
    }

    #[test]
    fn test_can_parse_version_tag_or_adobe_software() {
        let (mut b, ifd0) = dng_with_version();
        b.strips(ifd0, &jpeg_body(40 * 1024, 256, 171));
        assert!(can_parse(&b.build()));

        let mut adobe = TiffBuilder::new();
        let ifd0 = adobe.add_ifd();
        adobe.ascii(ifd0, tags::SOFTWARE, "Adobe DNG Converter 16.2");
        adobe.strips(ifd0, &jpeg_body(40 * 1024, 256, 171));
        assert!(can_parse(&adobe.build()));

        let mut plain = TiffBuilder::new();
        let ifd0 = plain.add_ifd();
        plain.strips(ifd0, &jpeg_body(40 * 1024, 256, 171));
        assert!(!can_parse(&plain.build()));
    }

    #[test]
    fn test_sub_ifd_beats_ifd0_thumbnail() {
        let (mut b, ifd0) = dng_with_version();
        b.strips(ifd0, &jpeg_body(40 * 1024, 256, 171));
        let sub = b.add_sub_ifd(ifd0);
        b.long(sub, tags::NEW_SUBFILE_TYPE, 1);
        b.short(sub, tags::COMPRESSION, 7);
        b.strips(sub, &jpeg_body(1200 * 1024, 1024, 683));
        let previews = extract_previews(&b.build()).unwrap();

        assert_eq!(previews.len(), 2);
        let reduced = previews.iter().find(|p| p.label == "DngReduced").unwrap();
        assert_eq!(reduced.priority, 10);
        let thumb = previews.iter().find(|p| p.label == "DngIfd0").unwrap();
        assert_eq!(thumb.priority, 2);

        let best = select_best(&previews).unwrap();
        assert_eq!(best.label, "DngReduced");
    }

    #[test]
    fn test_oversized_reduced_image_demoted() {
        let (mut b, ifd0) = dng_with_version();
        b.long(ifd0, tags::NEW_SUBFILE_TYPE, 1);
        b.strips(ifd0, &jpeg_body(5 * 1024 * 1024, 8192, 5464));
        let previews = extract_previews(&b.build()).unwrap();
        assert_eq!(previews[0].priority, 8);
    }
}
