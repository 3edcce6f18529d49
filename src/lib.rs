//! Extract embedded JPEG previews from camera RAW files
//!
//! Every mainstream RAW format carries one or more ready-to-use JPEG
//! renditions of the shot: a thumbnail, a screen-sized preview, often a
//! full-resolution one. Pulling those out is orders of magnitude
//! cheaper than demosaicing the sensor data, and it is how ingestion
//! and culling tools show images instantly. This crate memory-maps the
//! file, walks the container (TIFF/IFD chains for CR2, NEF, ARW, DNG,
//! ORF and RW2; ISO-BMFF boxes for CR3; a fixed header for RAF),
//! validates candidate JPEG streams and picks the best one for the
//! caller's size and quality targets.
//!
//! All container offsets are treated as untrusted input: reads are
//! bounds-checked, directory sizes and chain lengths are capped, and a
//! candidate range pointing outside the file reports the file as
//! corrupted instead of panicking.
//!
//! # Example
//!
//! ```no_run
//! use raw_preview::{extract_preview, ExtractionOptions};
//!
//! let extraction = extract_preview("/photos/IMG_0001.CR2", &ExtractionOptions::default())?;
//! println!(
//!     "{} {}x{} ({} bytes)",
//!     extraction.format,
//!     extraction.info.width,
//!     extraction.info.height,
//!     extraction.data.len()
//! );
//! # Ok::<(), raw_preview::Error>(())
//! ```

pub mod endian;
pub mod error;
pub mod formats;
pub mod jpeg;
pub mod mmap;
pub mod options;
pub mod preview;
pub mod selection;
pub mod tiff;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

use std::path::Path;

pub use error::{Error, ErrorCode, Result};
pub use formats::RawFormat;
pub use mmap::MappedRaw;
pub use options::ExtractionOptions;
pub use preview::{IfdSlot, PreviewInfo, PreviewQuality};
pub use selection::Tier;

use options::Deadline;

/// Minimum input size worth probing; no supported header fits in less
const MIN_INPUT_LEN: usize = 16;

/// A successfully extracted preview: the owning format, the candidate's
/// metadata, and the JPEG bytes
#[derive(Debug, Clone)]
pub struct Extraction {
    pub format: RawFormat,
    pub info: PreviewInfo,
    pub data: Vec<u8>,
}

/// Detect the RAW format of a file without extracting anything
pub fn detect_format<P: AsRef<Path>>(path: P) -> Result<Option<RawFormat>> {
    let map = MappedRaw::open(path, ExtractionOptions::default().max_mapped_bytes)?;
    Ok(RawFormat::detect(map.data()))
}

/// Detect the RAW format of an in-memory buffer
pub fn detect_format_from_buffer(data: &[u8]) -> Option<RawFormat> {
    RawFormat::detect(data)
}

/// Extract the best preview from a file according to `options`
pub fn extract_preview<P: AsRef<Path>>(
    path: P,
    options: &ExtractionOptions,
) -> Result<Extraction> {
    options.validate()?;
    let map = MappedRaw::open(path, options.max_mapped_bytes)?;
    extract_preview_from_buffer(map.data(), options)
}

/// Extract the best preview from an in-memory buffer
pub fn extract_preview_from_buffer(data: &[u8], options: &ExtractionOptions) -> Result<Extraction> {
    options.validate()?;
    let deadline = Deadline::new(options.timeout);

    if data.len() < MIN_INPUT_LEN {
        return Err(Error::UnsupportedFormat);
    }
    if data.len() as u64 > options.max_mapped_bytes {
        return Err(Error::MemoryLimit {
            size: data.len() as u64,
            max: options.max_mapped_bytes,
        });
    }

    let format = RawFormat::detect(data).ok_or(Error::UnsupportedFormat)?;
    deadline.check("format detection")?;

    let previews = format.extract_previews(data)?;
    if previews.is_empty() {
        return Err(Error::NoPreviewsFound);
    }
    deadline.check("preview discovery")?;

    // The format's own pick stands when it lands in the caller's target
    // range; otherwise re-rank all candidates against the options
    let format_best = format.select_best(&previews, options);
    let selected = match format_best {
        Some(p) if p.size >= options.target_min_size && p.size <= options.target_max_size => p,
        _ => selection::rerank_for_options(&previews, options).ok_or(Error::NoPreviewsFound)?,
    };

    finish(data, format, selected, options, &deadline)
}

/// Extract the medium-tier preview by candidate position
///
/// Unlike [`extract_preview`] this ignores priorities and indexes the
/// discovered candidate list directly, using the per-format slot rules
/// (and the Nikon model table for NEF).
pub fn extract_medium_preview<P: AsRef<Path>>(
    path: P,
    options: &ExtractionOptions,
) -> Result<Extraction> {
    tier_preview(path, options, Tier::Medium)
}

/// Extract the full-tier preview by candidate position
pub fn extract_full_preview<P: AsRef<Path>>(
    path: P,
    options: &ExtractionOptions,
) -> Result<Extraction> {
    tier_preview(path, options, Tier::Full)
}

fn tier_preview<P: AsRef<Path>>(
    path: P,
    options: &ExtractionOptions,
    tier: Tier,
) -> Result<Extraction> {
    options.validate()?;
    let deadline = Deadline::new(options.timeout);
    let map = MappedRaw::open(path, options.max_mapped_bytes)?;
    let data = map.data();

    let format = RawFormat::detect(data).ok_or(Error::UnsupportedFormat)?;
    deadline.check("format detection")?;

    let previews = format.extract_previews(data)?;
    if previews.is_empty() {
        return Err(Error::NoPreviewsFound);
    }
    deadline.check("preview discovery")?;

    let model = match format {
        RawFormat::Nef => formats::nef::camera_model(data),
        _ => None,
    };
    let selected = selection::select_tier(format, model.as_deref(), &previews, tier)
        .ok_or(Error::NoPreviewsFound)?;

    finish(data, format, selected, options, &deadline)
}

/// Extract every preview candidate a file holds, in discovery order
pub fn extract_all_previews<P: AsRef<Path>>(
    path: P,
    options: &ExtractionOptions,
) -> Result<Vec<Extraction>> {
    options.validate()?;
    let deadline = Deadline::new(options.timeout);
    let map = MappedRaw::open(path, options.max_mapped_bytes)?;
    let data = map.data();

    let format = RawFormat::detect(data).ok_or(Error::UnsupportedFormat)?;
    deadline.check("format detection")?;

    let previews = format.extract_previews(data)?;
    if previews.is_empty() {
        return Err(Error::NoPreviewsFound);
    }
    deadline.check("preview discovery")?;

    previews
        .iter()
        .map(|p| finish(data, format, p, options, &deadline))
        .collect()
}

/// The one place candidate metadata becomes an owned result: re-check
/// bounds, validate the stream per the options, copy the bytes
fn finish(
    data: &[u8],
    format: RawFormat,
    info: &PreviewInfo,
    options: &ExtractionOptions,
    deadline: &Deadline,
) -> Result<Extraction> {
    deadline.check("preview extraction")?;

    let bytes = info.bytes(data).ok_or_else(|| {
        Error::CorruptedFile(format!(
            "selected preview range {}..+{} exceeds file of {} bytes",
            info.offset,
            info.size,
            data.len()
        ))
    })?;

    let valid = if options.strict_validation {
        jpeg::is_valid(bytes)
    } else {
        bytes.len() >= 2 && bytes[..2] == jpeg::SOI
    };
    if !valid {
        return Err(Error::CorruptedFile(
            "selected preview failed JPEG validation".into(),
        ));
    }

    Ok(Extraction {
        format,
        info: info.clone(),
        data: bytes.to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{cr2_builder, jpeg_body};
    use crate::tiff::tags;

    #[test]
    fn test_buffer_extraction_round_trip() {
        let full = jpeg_body(1800 * 1024, 2256, 1504);
        let mut b = cr2_builder();
        let ifd0 = b.add_ifd();
        b.short(ifd0, tags::COMPRESSION, 6);
        b.strips(ifd0, &full);
        let data = b.build();

        let extraction =
            extract_preview_from_buffer(&data, &ExtractionOptions::default()).unwrap();
        assert_eq!(extraction.format, RawFormat::Cr2);
        assert_eq!(extraction.data, full);
    }

    #[test]
    fn test_tiny_buffer_unsupported() {
        let err = extract_preview_from_buffer(b"II\x2a\x00", &ExtractionOptions::default())
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::UnsupportedFormat);
    }

    #[test]
    fn test_buffer_over_memory_budget() {
        let data = vec![0u8; 64];
        let options = ExtractionOptions::new().max_mapped_bytes(32);
        let err = extract_preview_from_buffer(&data, &options).unwrap_err();
        assert_eq!(err.code(), ErrorCode::OutOfMemory);
    }

    #[test]
    fn test_expired_deadline_times_out() {
        let full = jpeg_body(1800 * 1024, 2256, 1504);
        let mut b = cr2_builder();
        let ifd0 = b.add_ifd();
        b.strips(ifd0, &full);
        let data = b.build();

        let options = ExtractionOptions::new().timeout(std::time::Duration::ZERO);
        let err = extract_preview_from_buffer(&data, &options).unwrap_err();
        assert_eq!(err.code(), ErrorCode::Timeout);
    }
}
