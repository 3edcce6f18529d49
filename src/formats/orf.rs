//! Olympus ORF
//!
//! Olympus replaces the TIFF magic with "RO" ("IIRO" / "MMOR" headers)
//! but keeps the IFD structure intact, so the generic walk applies
//! unchanged. Some bodies write standard TIFF with an OLYMPUS make tag
//! instead.

use crate::error::Result;
use crate::jpeg;
use crate::preview::PreviewInfo;
use crate::selection;
use crate::tiff::{TiffReader, ORF_MAGIC, TIFF_MAGIC};

use super::{base_info, checked_range, in_target_range};

pub(crate) fn can_parse(data: &[u8]) -> bool {
    if data.len() < 8 {
        return false;
    }
    let Some(order) = crate::endian::Endian::detect(data) else {
        return false;
    };
    match order.read_u16(data, 2) {
        Some(ORF_MAGIC) => true,
        Some(TIFF_MAGIC) => {
            let Some(reader) = TiffReader::new(data) else {
                return false;
            };
            matches!(reader.make(), Some(make) if make.starts_with("OLYMPUS"))
        }
        _ => false,
    }
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
        info.label = "OrfPreview".into();
        info.priority = if in_target_range(raw.size) { 10 } else { 6 };
        previews.push(info);
    }
    Ok(previews)
}

pub(crate) fn select_best(previews: &[PreviewInfo]) -> Option<&PreviewInfo> {
    selection::best_by_size(previews)
}
