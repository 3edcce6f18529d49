// End-to-end extraction tests using the test_utils fixture builders

use std::fs;
use std::path::PathBuf;

use raw_preview::test_utils::{
    cr2_builder, jpeg_body, raf_fixture, rw2_builder, Cr3Builder, TiffBuilder,
};
use raw_preview::tiff::tags;
use raw_preview::{
    detect_format, detect_format_from_buffer, extract_all_previews, extract_full_preview,
    extract_medium_preview, extract_preview, extract_preview_from_buffer, ErrorCode,
    ExtractionOptions, PreviewQuality, RawFormat,
};

/// Write fixture bytes to a unique temp file; caller removes it
fn temp_fixture(name: &str, data: &[u8]) -> PathBuf {
    let path = std::env::temp_dir().join(format!("raw_preview_it_{}_{}", std::process::id(), name));
    fs::write(&path, data).unwrap();
    path
}

fn nikon_fixture(model: &str) -> Vec<u8> {
    // Three candidates: a full-size IFD0 JPEG, an IFD1 thumbnail and a
    // mid-size SubIFD preview
    let ifd0_jpeg = jpeg_body(3100 * 1024, 8256, 5504);
    let thumb = jpeg_body(50 * 1024, 160, 120);
    let sub_jpeg = jpeg_body(1900 * 1024, 2048, 1365);

    let mut b = TiffBuilder::new();
    let ifd0 = b.add_ifd();
    b.ascii(ifd0, tags::MAKE, "NIKON CORPORATION");
    b.ascii(ifd0, tags::MODEL, model);
    b.short(ifd0, tags::COMPRESSION, 6);
    b.strips(ifd0, &ifd0_jpeg);
    let sub = b.add_sub_ifd(ifd0);
    b.short(sub, tags::COMPRESSION, 6);
    b.strips(sub, &sub_jpeg);
    let ifd1 = b.add_ifd();
    b.jpeg_interchange(ifd1, &thumb);
    b.build()
}

#[test]
fn test_cr2_file_round_trip() {
    let full = jpeg_body(1800 * 1024, 2256, 1504);
    let mut b = cr2_builder();
    let ifd0 = b.add_ifd();
    b.short(ifd0, tags::IMAGE_WIDTH, 2256);
    b.short(ifd0, tags::IMAGE_LENGTH, 1504);
    b.short(ifd0, tags::COMPRESSION, 6);
    b.strips(ifd0, &full);
    let data = b.build();

    let path = temp_fixture("cr2_round_trip.cr2", &data);
    let extraction = extract_preview(&path, &ExtractionOptions::default()).unwrap();
    fs::remove_file(&path).ok();

    assert_eq!(extraction.format, RawFormat::Cr2);
    assert_eq!(extraction.info.width, 2256);
    assert_eq!(extraction.info.height, 1504);
    // Extracted bytes must equal the slice that went into the container
    assert_eq!(extraction.data, full);
}

#[test]
fn test_detect_file_and_buffer_agree() {
    let jpeg = jpeg_body(300 * 1024, 1620, 1080);
    let data = raf_fixture(&jpeg);

    let path = temp_fixture("detect_agree.raf", &data);
    let from_file = detect_format(&path).unwrap();
    fs::remove_file(&path).ok();

    assert_eq!(from_file, Some(RawFormat::Raf));
    assert_eq!(detect_format_from_buffer(&data), Some(RawFormat::Raf));
}

#[test]
fn test_missing_file_not_found() {
    let path = std::env::temp_dir().join("raw_preview_it_no_such_file.nef");
    let err = extract_preview(&path, &ExtractionOptions::default()).unwrap_err();
    assert_eq!(err.code(), ErrorCode::FileNotFound);
    assert_eq!(err.code().as_str(), "FILE_NOT_FOUND");
}

#[test]
fn test_plain_text_unsupported() {
    let data = b"This is not a camera RAW file, just some text padding.".to_vec();
    assert_eq!(detect_format_from_buffer(&data), None);
    let err = extract_preview_from_buffer(&data, &ExtractionOptions::default()).unwrap_err();
    assert_eq!(err.code(), ErrorCode::UnsupportedFormat);
}

#[test]
fn test_cr3_all_previews_and_tiers() {
    let thumb = jpeg_body(20 * 1024, 160, 120);
    let preview = jpeg_body(700 * 1024, 1620, 1080);
    let full = jpeg_body(2 * 1024 * 1024, 6000, 4000);
    let mut b = Cr3Builder::new();
    b.thumbnail(&thumb).preview(&preview).full(&full);
    let data = b.build();

    let path = temp_fixture("cr3_tiers.cr3", &data);
    let all = extract_all_previews(&path, &ExtractionOptions::default()).unwrap();
    let full_tier = extract_full_preview(&path, &ExtractionOptions::default()).unwrap();
    let medium_tier = extract_medium_preview(&path, &ExtractionOptions::default()).unwrap();
    fs::remove_file(&path).ok();

    // THMB, PRVW and mdat, in discovery order
    assert_eq!(all.len(), 3);
    assert_eq!(all[0].data, thumb);
    assert_eq!(all[1].data, preview);
    assert_eq!(all[2].data, full);

    // CR3 slot rule: full = index 2 (mdat), medium = index 1 (PRVW)
    assert_eq!(full_tier.data, full);
    assert_eq!(medium_tier.data, preview);
    assert!(full_tier.data.len() >= medium_tier.data.len());
}

#[test]
fn test_cr2_tier_slots() {
    let full = jpeg_body(1800 * 1024, 2256, 1504);
    let thumb = jpeg_body(8 * 1024, 160, 120);
    let mut b = cr2_builder();
    let ifd0 = b.add_ifd();
    b.short(ifd0, tags::IMAGE_WIDTH, 2256);
    b.short(ifd0, tags::IMAGE_LENGTH, 1504);
    b.short(ifd0, tags::COMPRESSION, 6);
    b.strips(ifd0, &full);
    let ifd1 = b.add_ifd();
    b.jpeg_interchange(ifd1, &thumb);
    let data = b.build();

    let path = temp_fixture("cr2_tiers.cr2", &data);
    let full_tier = extract_full_preview(&path, &ExtractionOptions::default()).unwrap();
    let medium_tier = extract_medium_preview(&path, &ExtractionOptions::default()).unwrap();
    fs::remove_file(&path).ok();

    // CR2 slot rule: full = directory 0, medium = directory 1
    assert_eq!((full_tier.info.width, full_tier.info.height), (2256, 1504));
    assert_eq!(full_tier.data, full);
    assert_eq!(medium_tier.data, thumb);
}

#[test]
fn test_all_previews_round_trip_per_format() {
    // Every well-formed sample yields at least one candidate and each
    // candidate's bytes equal the exact sub-range of the source file
    let full = jpeg_body(1800 * 1024, 2256, 1504);
    let thumb = jpeg_body(8 * 1024, 160, 120);
    let mut cr2 = cr2_builder();
    let ifd0 = cr2.add_ifd();
    cr2.short(ifd0, tags::COMPRESSION, 6);
    cr2.strips(ifd0, &full);
    let ifd1 = cr2.add_ifd();
    cr2.jpeg_interchange(ifd1, &thumb);

    let raf_jpeg = jpeg_body(300 * 1024, 1620, 1080);

    let rw2_jpeg = jpeg_body(500 * 1024, 1920, 1440);
    let mut rw2 = rw2_builder();
    let rw2_ifd = rw2.add_ifd();
    rw2.short(rw2_ifd, tags::COMPRESSION, 6);
    rw2.strips(rw2_ifd, &rw2_jpeg);

    let fixtures: Vec<(&str, Vec<u8>, RawFormat, usize)> = vec![
        ("all.cr2", cr2.build(), RawFormat::Cr2, 2),
        ("all.nef", nikon_fixture("NIKON Z 8"), RawFormat::Nef, 3),
        ("all.raf", raf_fixture(&raf_jpeg), RawFormat::Raf, 1),
        ("all.rw2", rw2.build(), RawFormat::Rw2, 1),
    ];

    for (name, data, format, expected) in fixtures {
        let path = temp_fixture(name, &data);
        let all = extract_all_previews(&path, &ExtractionOptions::default()).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(all.len(), expected, "{name}: candidate count");
        for e in &all {
            assert_eq!(e.format, format, "{name}: format");
            assert_eq!(
                e.data,
                &data[e.info.offset..e.info.offset + e.info.size],
                "{name}: bytes must match the source range"
            );
        }
    }
}

#[test]
fn test_nef_smart_model_tiers() {
    // The Z 8 is in the smart-selection table: full is the largest
    // candidate, medium the second-largest, regardless of slot order
    let data = nikon_fixture("NIKON Z 8");

    let path = temp_fixture("nef_z8.nef", &data);
    let full_tier = extract_full_preview(&path, &ExtractionOptions::default()).unwrap();
    let medium_tier = extract_medium_preview(&path, &ExtractionOptions::default()).unwrap();
    fs::remove_file(&path).ok();

    assert_eq!(full_tier.format, RawFormat::Nef);
    assert_eq!(full_tier.data.len(), 3100 * 1024);
    assert_eq!(medium_tier.data.len(), 1900 * 1024);
}

#[test]
fn test_nef_traditional_model_tiers() {
    // The D750 uses fixed slots: full = first candidate, medium = second
    let data = nikon_fixture("NIKON D750");

    let path = temp_fixture("nef_d750.nef", &data);
    let full_tier = extract_full_preview(&path, &ExtractionOptions::default()).unwrap();
    let medium_tier = extract_medium_preview(&path, &ExtractionOptions::default()).unwrap();
    fs::remove_file(&path).ok();

    assert_eq!(full_tier.data.len(), 3100 * 1024);
    assert_eq!(medium_tier.data.len(), 1900 * 1024);
}

#[test]
fn test_truncated_strip_reports_corruption() {
    let full = jpeg_body(600 * 1024, 1620, 1080);
    let mut b = cr2_builder();
    let ifd0 = b.add_ifd();
    b.short(ifd0, tags::COMPRESSION, 6);
    // Byte count points far past the end of the file
    b.strip_pair_raw(ifd0, 8, 50 * 1024 * 1024);
    let ifd1 = b.add_ifd();
    b.jpeg_interchange(ifd1, &full);
    let data = b.build();

    let err = extract_preview_from_buffer(&data, &ExtractionOptions::default()).unwrap_err();
    assert_eq!(err.code(), ErrorCode::CorruptedFile);
    assert_eq!(err.code().as_str(), "CORRUPTED_FILE");
}

#[test]
fn test_options_rerank_overrides_format_pick() {
    // CR2's own pick is the oversized IFD0 preview; with a small target
    // range the thumbnail is the only in-range candidate
    let huge = jpeg_body(5 * 1024 * 1024, 5472, 3648);
    let thumb = jpeg_body(8 * 1024, 160, 120);
    let mut b = cr2_builder();
    let ifd0 = b.add_ifd();
    b.short(ifd0, tags::COMPRESSION, 6);
    b.strips(ifd0, &huge);
    let ifd1 = b.add_ifd();
    b.jpeg_interchange(ifd1, &thumb);
    let data = b.build();

    let default_pick =
        extract_preview_from_buffer(&data, &ExtractionOptions::default()).unwrap();
    assert_eq!(default_pick.data.len(), 5 * 1024 * 1024);

    let options = ExtractionOptions::new()
        .target_size(1024, 10 * 1024)
        .prefer_quality(PreviewQuality::Thumbnail);
    let small_pick = extract_preview_from_buffer(&data, &options).unwrap();
    assert_eq!(small_pick.data.len(), 8 * 1024);
    assert_eq!(small_pick.info.quality, PreviewQuality::Thumbnail);
}

#[test]
fn test_inverted_target_range_invalid_argument() {
    let options = ExtractionOptions::new().target_size(1024 * 1024, 1024);
    let err = extract_preview_from_buffer(&[0u8; 64], &options).unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidArgument);
}

#[test]
fn test_file_over_memory_budget() {
    let jpeg = jpeg_body(300 * 1024, 1620, 1080);
    let data = raf_fixture(&jpeg);

    let path = temp_fixture("raf_budget.raf", &data);
    let options = ExtractionOptions::new().max_mapped_bytes(1024);
    let err = extract_preview(&path, &options).unwrap_err();
    fs::remove_file(&path).ok();

    assert_eq!(err.code(), ErrorCode::OutOfMemory);
}
