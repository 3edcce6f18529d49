//! Fujifilm RAF
//!
//! Not a TIFF at all: a fixed header starting with the
//! "FUJIFILMCCD-RAW" magic, with the embedded JPEG's big-endian
//! offset/length pair at bytes 84 and 88. One candidate per file.

use crate::endian::Endian;
use crate::error::Result;
use crate::jpeg;
use crate::preview::PreviewInfo;

use super::{checked_range, in_target_range};

const MAGIC: &[u8; 15] = b"FUJIFILMCCD-RAW";

// Header field positions
const JPEG_OFFSET_AT: usize = 84;
const JPEG_LENGTH_AT: usize = 88;

pub(crate) fn can_parse(data: &[u8]) -> bool {
    data.len() >= 16 && &data[..15] == MAGIC
}

pub(crate) fn extract_previews(data: &[u8]) -> Result<Vec<PreviewInfo>> {
    let mut previews = Vec::new();
    if !can_parse(data) || data.len() < 100 {
        return Ok(previews);
    }

    let (Some(offset), Some(size)) = (
        Endian::Big.read_u32(data, JPEG_OFFSET_AT),
        Endian::Big.read_u32(data, JPEG_LENGTH_AT),
    ) else {
        return Ok(previews);
    };
    if offset == 0 || size == 0 {
        return Ok(previews);
    }

    let (offset, size) = (offset as usize, size as usize);
    let bytes = checked_range(data, offset, size)?;
    if !jpeg::is_valid(bytes) {
        return Ok(previews);
    }

    let (width, height) = jpeg::dimensions(bytes).unwrap_or((0, 0));
    previews.push(PreviewInfo {
        offset,
        size,
        width,
        height,
        is_jpeg: true,
        quality: jpeg::classify(width, height, size),
        priority: if in_target_range(size) { 10 } else { 7 },
        label: "RafHeader".into(),
        ..Default::default()
    });
    Ok(previews)
}

pub(crate) fn select_best(previews: &[PreviewInfo]) -> Option<&PreviewInfo> {
    previews.first()
}
