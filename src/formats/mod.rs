//! Per-format RAW parsers and format detection
//!
//! Each format module exposes the same three operations: a cheap
//! signature check, candidate discovery with format-specific priorities,
//! and best-candidate selection. Dispatch is by enum; adding a format
//! means adding a variant and wiring the three match arms.

pub mod arw;
pub mod cr2;
pub mod cr3;
pub mod dng;
pub mod nef;
pub mod orf;
pub mod raf;
pub mod rw2;

use crate::error::{Error, Result};
use crate::options::ExtractionOptions;
use crate::preview::PreviewInfo;
use crate::tiff::RawPreview;

/// Byte-size range shared by the priority rules of every TIFF-based
/// format: candidates inside it are what ingestion pipelines want
pub(crate) const TARGET_MIN: usize = 200 * 1024;
pub(crate) const TARGET_MAX: usize = 3 * 1024 * 1024;

pub(crate) fn in_target_range(size: usize) -> bool {
    (TARGET_MIN..=TARGET_MAX).contains(&size)
}

/// Resolve a discovered candidate range against the file span
///
/// A non-empty range that leaves the file is structural corruption (a
/// truncated or overwritten file), not a missing preview.
pub(crate) fn checked_range(data: &[u8], offset: usize, size: usize) -> Result<&[u8]> {
    let end = offset
        .checked_add(size)
        .filter(|&end| end <= data.len())
        .ok_or_else(|| {
            Error::CorruptedFile(format!(
                "preview range {}..+{} exceeds file of {} bytes",
                offset,
                size,
                data.len()
            ))
        })?;
    Ok(&data[offset..end])
}

/// Carry the container-level fields of a discovered candidate into a
/// [`PreviewInfo`]; the caller fills quality, priority and label
pub(crate) fn base_info(raw: &RawPreview, orientation: u16) -> PreviewInfo {
    PreviewInfo {
        offset: raw.offset,
        size: raw.size,
        width: raw.width,
        height: raw.height,
        is_jpeg: raw.is_jpeg,
        subfile_type: raw.subfile_type,
        slot: raw.slot,
        orientation,
        ..Default::default()
    }
}

/// Supported RAW formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RawFormat {
    Cr2,
    Cr3,
    Nef,
    Arw,
    Dng,
    Raf,
    Orf,
    Rw2,
}

impl RawFormat {
    /// Uppercase format name as used at the API boundary
    pub fn name(&self) -> &'static str {
        match self {
            RawFormat::Cr2 => "CR2",
            RawFormat::Cr3 => "CR3",
            RawFormat::Nef => "NEF",
            RawFormat::Arw => "ARW",
            RawFormat::Dng => "DNG",
            RawFormat::Raf => "RAF",
            RawFormat::Orf => "ORF",
            RawFormat::Rw2 => "RW2",
        }
    }

    /// Probe the buffer against each format's signature check
    ///
    /// Order matters: CR2 before the generic TIFF formats (a CR2 is a
    /// valid TIFF), NEF/ARW by maker tags before DNG's version-tag
    /// check, the loosest signatures (ORF, RW2) last.
    pub fn detect(data: &[u8]) -> Option<RawFormat> {
        if cr2::can_parse(data) {
            Some(RawFormat::Cr2)
        } else if cr3::can_parse(data) {
            Some(RawFormat::Cr3)
        } else if nef::can_parse(data) {
            Some(RawFormat::Nef)
        } else if arw::can_parse(data) {
            Some(RawFormat::Arw)
        } else if dng::can_parse(data) {
            Some(RawFormat::Dng)
        } else if raf::can_parse(data) {
            Some(RawFormat::Raf)
        } else if orf::can_parse(data) {
            Some(RawFormat::Orf)
        } else if rw2::can_parse(data) {
            Some(RawFormat::Rw2)
        } else {
            None
        }
    }

    /// Discover every preview candidate in the buffer
    pub fn extract_previews(&self, data: &[u8]) -> Result<Vec<PreviewInfo>> {
        match self {
            RawFormat::Cr2 => cr2::extract_previews(data),
            RawFormat::Cr3 => cr3::extract_previews(data),
            RawFormat::Nef => nef::extract_previews(data),
            RawFormat::Arw => arw::extract_previews(data),
            RawFormat::Dng => dng::extract_previews(data),
            RawFormat::Raf => raf::extract_previews(data),
            RawFormat::Orf => orf::extract_previews(data),
            RawFormat::Rw2 => rw2::extract_previews(data),
        }
    }

    /// Format-specific best-candidate selection
    pub fn select_best<'a>(
        &self,
        previews: &'a [PreviewInfo],
        options: &ExtractionOptions,
    ) -> Option<&'a PreviewInfo> {
        match self {
            RawFormat::Cr2 => cr2::select_best(previews, options),
            RawFormat::Cr3 => cr3::select_best(previews, options),
            RawFormat::Nef => nef::select_best(previews, options),
            RawFormat::Arw => arw::select_best(previews, options),
            RawFormat::Dng => dng::select_best(previews),
            RawFormat::Raf => raf::select_best(previews),
            RawFormat::Orf => orf::select_best(previews),
            RawFormat::Rw2 => rw2::select_best(previews),
        }
    }
}

impl std::fmt::Display for RawFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
