//! Nikon NEF
//!
//! Standard TIFF identified by the Make tag. The full-size JPEG lives
//! in a SubIFD, addressed either by strip tags or by Nikon's
//! JpgFromRaw pair (0x0201/0x0202) inside the SubIFD itself; recent Z
//! bodies are known to order their candidates unpredictably, which the
//! selection layer compensates for with the model table.

use crate::error::Result;
use crate::jpeg;
use crate::options::ExtractionOptions;
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
    matches!(reader.make(), Some(make) if make.starts_with("NIKON"))
}

/// Camera model from the Model tag, for the selection layer's lookup
pub(crate) fn camera_model(data: &[u8]) -> Option<String> {
    TiffReader::new(data)?.model()
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
            IfdSlot::Sub(_) => {
                info.quality = jpeg::classify(raw.width, raw.height, raw.size);
                info.label = format!("NefSubIfd{sub_counter}");
                sub_counter += 1;
                info.priority = if in_target_range(raw.size) {
                    10
                } else if info.quality == PreviewQuality::Preview {
                    8
                } else {
                    5
                };
            }
            IfdSlot::Main(1) => {
                info.quality = PreviewQuality::Thumbnail;
                info.label = "NefIfd1".into();
                info.priority = 2;
            }
            IfdSlot::Main(0) => {
                info.quality = jpeg::classify(raw.width, raw.height, raw.size);
                info.label = "NefIfd0".into();
                info.priority = 7;
            }
            IfdSlot::Main(i) => {
                info.quality = jpeg::classify(raw.width, raw.height, raw.size);
                info.label = format!("NefIfd{i}");
                info.priority = 3;
            }
            IfdSlot::Private => {
                info.quality = jpeg::classify(raw.width, raw.height, raw.size);
                info.label = "NefPrivate".into();
                info.priority = 3;
            }
        }
        previews.push(info);
    }

    jpg_from_raw_previews(&reader, data, orientation, &mut previews)?;
    Ok(previews)
}

/// Scan SubIFDs for the JpgFromRaw tag pair, deduplicating against the
/// strip-based candidates by (offset, size)
fn jpg_from_raw_previews(
    reader: &TiffReader<'_>,
    data: &[u8],
    orientation: u16,
    previews: &mut Vec<PreviewInfo>,
) -> Result<()> {
    for ifd in reader.main_ifds() {
        for (i, sub_offset) in reader.sub_ifd_offsets(&ifd).iter().enumerate() {
            let Some(sub) = reader.parse_ifd(*sub_offset) else {
                continue;
            };
            let (Some(offset), Some(size)) = (
                reader.tag_u32(&sub, tags::JPEG_INTERCHANGE_FORMAT),
                reader.tag_u32(&sub, tags::JPEG_INTERCHANGE_FORMAT_LENGTH),
            ) else {
                continue;
            };
            if offset == 0 || size == 0 {
                continue;
            }
            let (offset, size) = (offset as usize, size as usize);
            let bytes = checked_range(data, offset, size)?;
            if !jpeg::is_valid(bytes) {
                continue;
            }
            if previews.iter().any(|p| p.offset == offset && p.size == size) {
                continue;
            }
            previews.push(PreviewInfo {
                offset,
                size,
                is_jpeg: true,
                slot: IfdSlot::Sub(i),
                quality: jpeg::classify(0, 0, size),
                priority: if in_target_range(size) { 12 } else { 7 },
                orientation,
                label: format!("NefJpgFromRaw{i}"),
                ..Default::default()
            });
        }
    }
    Ok(())
}

pub(crate) fn select_best<'a>(
    previews: &'a [PreviewInfo],
    options: &ExtractionOptions,
) -> Option<&'a PreviewInfo> {
    selection::best_by_priority(previews, options, false)
}
