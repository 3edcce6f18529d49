#![no_main]

use libfuzzer_sys::fuzz_target;
use raw_preview::tiff::TiffReader;

fuzz_target!(|data: &[u8]| {
    // IFD chains, SubIFD arrays and string tags from arbitrary bytes
    if let Some(reader) = TiffReader::new(data) {
        let _ = reader.make();
        let _ = reader.model();
        let _ = reader.software();
        let _ = reader.orientation();
        let _ = reader.find_previews();
        for ifd in reader.main_ifds() {
            let _ = reader.sub_ifd_offsets(&ifd);
        }
    }
});
