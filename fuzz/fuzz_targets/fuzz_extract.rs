#![no_main]

use libfuzzer_sys::fuzz_target;
use raw_preview::{
    detect_format_from_buffer, extract_preview_from_buffer, ExtractionOptions, PreviewQuality,
};

fuzz_target!(|data: &[u8]| {
    // Any input must be detected or rejected without panicking
    let _ = detect_format_from_buffer(data);

    // Full pipeline: discovery walks every offset table in the input,
    // so this exercises the bounds checks end to end
    let _ = extract_preview_from_buffer(data, &ExtractionOptions::default());

    // Loose validation takes the other branch of the final check
    let loose = ExtractionOptions::new()
        .strict_validation(false)
        .prefer_quality(PreviewQuality::Thumbnail)
        .target_size(1, 64 * 1024);
    let _ = extract_preview_from_buffer(data, &loose);
});
