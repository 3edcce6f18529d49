//! Sony ARW
//!
//! TIFF identified by the Make tag or by Sony's SR2Private tag.
//! Previews show up in four places: the regular IFD chain, SubIFDs,
//! IFDs referenced by the SR2SubIFD tag, and JPEG streams buried in the
//! opaque SR2Private block, which is located by a raw marker scan.
//! Orientation needs its own walk because Sony bodies scatter the tag
//! across IFD0, IFD1 and SubIFDs.

use crate::endian::Endian;
use crate::error::Result;
use crate::jpeg;
use crate::options::ExtractionOptions;
use crate::preview::{IfdSlot, PreviewInfo, PreviewQuality};
use crate::selection;
use crate::tiff::{tags, Ifd, TiffReader, TIFF_MAGIC};

use super::{base_info, checked_range, in_target_range};

pub(crate) fn can_parse(data: &[u8]) -> bool {
    let Some(order) = Endian::detect(data) else {
        return false;
    };
    if order.read_u16(data, 2) != Some(TIFF_MAGIC) {
        return false;
    }
    let Some(reader) = TiffReader::new(data) else {
        return false;
    };
    if matches!(reader.make(), Some(make) if make.starts_with("SONY")) {
        return true;
    }
    reader
        .parse_ifd(reader.first_ifd)
        .map(|ifd0| ifd0.has(tags::SONY_SR2_PRIVATE))
        .unwrap_or(false)
}

pub(crate) fn extract_previews(data: &[u8]) -> Result<Vec<PreviewInfo>> {
    let mut previews = Vec::new();
    if !can_parse(data) {
        return Ok(previews);
    }
    let Some(reader) = TiffReader::new(data) else {
        return Ok(previews);
    };
    let orientation = arw_orientation(&reader);

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
        if raw.subfile_type == 1 {
            info.quality = jpeg::classify(raw.width, raw.height, raw.size);
            info.label = "ArwPreview".into();
            info.priority = if in_target_range(raw.size) {
                10
            } else if info.quality == PreviewQuality::Preview {
                8
            } else {
                5
            };
        } else {
            match raw.slot {
                IfdSlot::Main(1) => {
                    info.quality = PreviewQuality::Thumbnail;
                    info.label = "ArwIfd1".into();
                    info.priority = 2;
                }
                IfdSlot::Sub(_) => {
                    info.quality = jpeg::classify(raw.width, raw.height, raw.size);
                    info.label = format!("ArwSubIfd{sub_counter}");
                    sub_counter += 1;
                    // Modern bodies put a near-full-size JPEG here
                    info.priority = if raw.size >= 1024 * 1024 { 9 } else { 6 };
                }
                IfdSlot::Main(0) => {
                    info.quality = jpeg::classify(raw.width, raw.height, raw.size);
                    info.label = "ArwIfd0".into();
                    info.priority = 7;
                }
                IfdSlot::Main(i) => {
                    info.quality = jpeg::classify(raw.width, raw.height, raw.size);
                    info.label = format!("ArwIfd{i}");
                    info.priority = 4;
                }
                IfdSlot::Private => {
                    info.quality = jpeg::classify(raw.width, raw.height, raw.size);
                    info.label = "ArwPrivate".into();
                    info.priority = 4;
                }
            }
        }
        previews.push(info);
    }

    sr2_previews(&reader, data, orientation, &mut previews)?;
    Ok(previews)
}

fn push_unique(previews: &mut Vec<PreviewInfo>, candidate: PreviewInfo) {
    let duplicate = previews
        .iter()
        .any(|p| p.offset == candidate.offset && p.size == candidate.size);
    if !duplicate {
        previews.push(candidate);
    }
}

/// SR2SubIFD strips and SR2Private marker scans, walking the main chain
fn sr2_previews(
    reader: &TiffReader<'_>,
    data: &[u8],
    orientation: u16,
    previews: &mut Vec<PreviewInfo>,
) -> Result<()> {
    for ifd in reader.main_ifds() {
        if let Some(entry) = ifd.entry(tags::SONY_SR2_PRIVATE) {
            // The value field addresses the block, the count carries its
            // byte length
            if let Some(offset) = reader.order.read_u32(&entry.raw, 0) {
                let (offset, length) = (offset as usize, entry.count as usize);
                if offset > 0 && length > 0 {
                    let block = checked_range(data, offset, length)?;
                    scan_sr2_block(data, offset, block, orientation, previews);
                }
            }
        }

        if let Some(entry) = ifd.entry(tags::SONY_SR2_SUB_IFD) {
            for sub_offset in reader.values_u32(entry) {
                if sub_offset == 0 {
                    continue;
                }
                let Some(sub) = reader.parse_ifd(sub_offset) else {
                    continue;
                };
                sr2_sub_ifd_preview(reader, data, &sub, orientation, previews)?;
            }
        }
    }
    Ok(())
}

fn sr2_sub_ifd_preview(
    reader: &TiffReader<'_>,
    data: &[u8],
    sub: &Ifd,
    orientation: u16,
    previews: &mut Vec<PreviewInfo>,
) -> Result<()> {
    let (Some(offset), Some(size)) = (
        reader.tag_u32(sub, tags::STRIP_OFFSETS),
        reader.tag_u32(sub, tags::STRIP_BYTE_COUNTS),
    ) else {
        return Ok(());
    };
    if offset == 0 || size == 0 {
        return Ok(());
    }
    let (offset, size) = (offset as usize, size as usize);
    let bytes = checked_range(data, offset, size)?;
    if !jpeg::is_valid(bytes) {
        return Ok(());
    }
    push_unique(
        previews,
        PreviewInfo {
            offset,
            size,
            is_jpeg: true,
            slot: IfdSlot::Private,
            quality: jpeg::classify(0, 0, size),
            priority: if in_target_range(size) { 11 } else { 7 },
            orientation,
            label: "ArwSr2SubIfd".into(),
            ..Default::default()
        },
    );
    Ok(())
}

/// The SR2Private block is opaque; find embedded JPEGs by their markers
fn scan_sr2_block(
    data: &[u8],
    block_offset: usize,
    block: &[u8],
    orientation: u16,
    previews: &mut Vec<PreviewInfo>,
) {
    let mut from = 0;
    while let Some(rel) = jpeg::find_soi(&block[from..]) {
        let start = block_offset + from + rel;
        let Some(end) = jpeg::find_eoi(data, start) else {
            break;
        };
        let size = end - start;
        let bytes = &data[start..end];
        if jpeg::is_valid(bytes) {
            push_unique(
                previews,
                PreviewInfo {
                    offset: start,
                    size,
                    is_jpeg: true,
                    slot: IfdSlot::Private,
                    quality: jpeg::classify(0, 0, size),
                    priority: if in_target_range(size) { 12 } else { 8 },
                    orientation,
                    label: "ArwSr2Private".into(),
                    ..Default::default()
                },
            );
        }
        from = from + rel + 2;
        if from >= block.len() {
            break;
        }
    }
}

/// Sony orientation: IFD0 wins outright; IFD1 and SubIFD values count
/// only when they differ from the default. Capped at 10 main IFDs.
fn arw_orientation(reader: &TiffReader<'_>) -> u16 {
    for (i, ifd) in reader.main_ifds().iter().take(10).enumerate() {
        if let Some(value) = reader.tag_u32(ifd, tags::ORIENTATION) {
            if (1..=8).contains(&value) {
                if i == 0 {
                    return value as u16;
                }
                if i == 1 && value != 1 {
                    return value as u16;
                }
            }
        }
        for sub_offset in reader.sub_ifd_offsets(ifd) {
            let Some(sub) = reader.parse_ifd(sub_offset) else {
                continue;
            };
            if let Some(value) = reader.tag_u32(&sub, tags::ORIENTATION) {
                if (2..=8).contains(&value) {
                    return value as u16;
                }
            }
        }
    }
    1
}

pub(crate) fn select_best<'a>(
    previews: &'a [PreviewInfo],
    options: &ExtractionOptions,
) -> Option<&'a PreviewInfo> {
    selection::best_by_priority(previews, options, true)
}
