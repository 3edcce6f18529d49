//! Canon CR2
//!
//! A TIFF container with a "CR" signature at offset 8 and a fixed
//! four-IFD layout: IFD0 holds the full-size JPEG preview, IFD1 a
//! 160x120 thumbnail, IFD2/IFD3 the RAW sensor data.

use crate::error::Result;
use crate::jpeg;
use crate::options::ExtractionOptions;
use crate::preview::{IfdSlot, PreviewInfo, PreviewQuality};
use crate::selection;
use crate::tiff::{TiffReader, TIFF_MAGIC};

use super::{base_info, checked_range, in_target_range};

const CR2_SIGNATURE: u16 = 0x5243; // "CR"

pub(crate) fn can_parse(data: &[u8]) -> bool {
    if data.len() < 10 {
        return false;
    }
    let Some(order) = crate::endian::Endian::detect(data) else {
        return false;
    };
    order.read_u16(data, 2) == Some(TIFF_MAGIC) && order.read_u16(data, 8) == Some(CR2_SIGNATURE)
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

    let mut sub_counter = 0usize;
    for raw in reader.find_previews() {
        if raw.offset == 0 || raw.size == 0 {
            continue;
        }
        let bytes = checked_range(data, raw.offset, raw.size)?;
        if !jpeg::is_valid(bytes) {
            continue;
        }

        let mut info = base_info(&raw, orientation);
        match raw.slot {
            IfdSlot::Main(0) => {
                info.quality = PreviewQuality::Preview;
                info.label = "Cr2Ifd0".into();
                info.priority = if in_target_range(raw.size) { 10 } else { 5 };
            }
            IfdSlot::Main(1) => {
                info.quality = PreviewQuality::Thumbnail;
                info.label = "Cr2Ifd1".into();
                info.priority = 1;
            }
            IfdSlot::Sub(_) => {
                info.quality = jpeg::classify(raw.width, raw.height, raw.size);
                info.label = format!("Cr2SubIfd{sub_counter}");
                sub_counter += 1;
                info.priority = 3;
            }
            IfdSlot::Main(i) => {
                info.quality = jpeg::classify(raw.width, raw.height, raw.size);
                info.label = format!("Cr2Ifd{i}");
                info.priority = 3;
            }
            IfdSlot::Private => {
                info.quality = jpeg::classify(raw.width, raw.height, raw.size);
                info.label = "Cr2Private".into();
                info.priority = 3;
            }
        }
        previews.push(info);
    }
    Ok(previews)
}

pub(crate) fn select_best<'a>(
    previews: &'a [PreviewInfo],
    options: &ExtractionOptions,
) -> Option<&'a PreviewInfo> {
    selection::best_by_priority(previews, options, false)
}
