//! Synthetic RAW fixtures for unit and integration tests
//!
//! Real camera files are too large to ship, so tests assemble minimal
//! containers byte by byte: a JPEG body generator with controllable size
//! and dimensions, a little-endian TIFF builder that lays out IFD
//! chains, sub-IFDs and data blobs with correct offsets, and builders
//! for the CR3 box format and the RAF fixed-offset header.

use crate::tiff::{tags, types, TIFF_MAGIC};

/// Build a structurally valid JPEG stream of exactly `total_size` bytes
/// with the given SOF dimensions
///
/// Layout: SOI, SOF0 frame header, zero filler, EOI. The filler
/// contains no 0xFF bytes, so marker scans see only the real markers.
pub fn jpeg_body(total_size: usize, width: u32, height: u32) -> Vec<u8> {
    assert!(total_size >= 32, "jpeg_body needs at least 32 bytes");
    let mut out = Vec::with_capacity(total_size);
    out.extend_from_slice(&[0xFF, 0xD8]);
    // SOF0: len 17, precision 8, height, width, 3 components
    out.extend_from_slice(&[0xFF, 0xC0, 0x00, 0x11, 0x08]);
    out.extend_from_slice(&(height as u16).to_be_bytes());
    out.extend_from_slice(&(width as u16).to_be_bytes());
    out.extend_from_slice(&[0x03, 0x01, 0x11, 0x00, 0x02, 0x11, 0x01, 0x03, 0x11, 0x01]);
    out.resize(total_size - 2, 0);
    out.extend_from_slice(&[0xFF, 0xD9]);
    out
}

#[derive(Clone)]
enum Payload {
    Inline([u8; 4]),
    AsciiData(Vec<u8>),
    BlobOffset(usize),
    SubOffsets(Vec<usize>),
}

#[derive(Clone)]
struct Entry {
    tag: u16,
    kind: u16,
    count: u32,
    payload: Payload,
}

struct IfdSpec {
    parent: Option<usize>,
    link_tag: u16,
    entries: Vec<Entry>,
}

/// Little-endian TIFF container builder
///
/// Declare IFDs and entries, then `build()` lays everything out in two
/// passes: directories first (main chain linked in declaration order),
/// then overflow values and blobs, with all offsets patched to their
/// final positions.
pub struct TiffBuilder {
    magic: u16,
    sub_header: Vec<u8>,
    ifds: Vec<IfdSpec>,
    blobs: Vec<Vec<u8>>,
}

impl TiffBuilder {
    pub fn new() -> Self {
        Self {
            magic: TIFF_MAGIC,
            sub_header: Vec::new(),
            ifds: Vec::new(),
            blobs: Vec::new(),
        }
    }

    /// Override the header magic (Panasonic/Olympus variants)
    pub fn magic(mut self, magic: u16) -> Self {
        self.magic = magic;
        self
    }

    /// Extra bytes between the 8-byte TIFF header and the first IFD
    /// (the CR2 "CR" signature block lives here)
    pub fn sub_header(mut self, bytes: &[u8]) -> Self {
        self.sub_header = bytes.to_vec();
        self
    }

    /// Add a main-chain IFD, returning its handle
    pub fn add_ifd(&mut self) -> usize {
        self.ifds.push(IfdSpec {
            parent: None,
            link_tag: tags::SUB_IFDS,
            entries: Vec::new(),
        });
        self.ifds.len() - 1
    }

    /// Add a sub-IFD referenced from `parent` via the SubIFDs tag
    pub fn add_sub_ifd(&mut self, parent: usize) -> usize {
        self.add_sub_ifd_with_tag(parent, tags::SUB_IFDS)
    }

    /// Add a sub-IFD referenced from `parent` via an arbitrary LONG tag
    /// (Sony's SR2SubIFD, for instance)
    pub fn add_sub_ifd_with_tag(&mut self, parent: usize, link_tag: u16) -> usize {
        self.ifds.push(IfdSpec {
            parent: Some(parent),
            link_tag,
            entries: Vec::new(),
        });
        self.ifds.len() - 1
    }

    pub fn short(&mut self, ifd: usize, tag: u16, value: u16) {
        let mut raw = [0u8; 4];
        raw[..2].copy_from_slice(&value.to_le_bytes());
        self.ifds[ifd].entries.push(Entry {
            tag,
            kind: types::SHORT,
            count: 1,
            payload: Payload::Inline(raw),
        });
    }

    pub fn long(&mut self, ifd: usize, tag: u16, value: u32) {
        self.ifds[ifd].entries.push(Entry {
            tag,
            kind: types::LONG,
            count: 1,
            payload: Payload::Inline(value.to_le_bytes()),
        });
    }

    pub fn ascii(&mut self, ifd: usize, tag: u16, text: &str) {
        let mut bytes = text.as_bytes().to_vec();
        bytes.push(0);
        let count = bytes.len() as u32;
        let payload = if bytes.len() <= 4 {
            let mut raw = [0u8; 4];
            raw[..bytes.len()].copy_from_slice(&bytes);
            Payload::Inline(raw)
        } else {
            Payload::AsciiData(bytes)
        };
        self.ifds[ifd].entries.push(Entry {
            tag,
            kind: types::ASCII,
            count,
            payload,
        });
    }

    /// Append `data` as a blob and reference it from this IFD via the
    /// StripOffsets / StripByteCounts pair
    pub fn strips(&mut self, ifd: usize, data: &[u8]) {
        let blob = self.add_blob(data);
        self.ifds[ifd].entries.push(Entry {
            tag: tags::STRIP_OFFSETS,
            kind: types::LONG,
            count: 1,
            payload: Payload::BlobOffset(blob),
        });
        self.long(ifd, tags::STRIP_BYTE_COUNTS, data.len() as u32);
    }

    /// Append `data` as a blob referenced via the JPEGInterchangeFormat
    /// pair
    pub fn jpeg_interchange(&mut self, ifd: usize, data: &[u8]) {
        let blob = self.add_blob(data);
        self.ifds[ifd].entries.push(Entry {
            tag: tags::JPEG_INTERCHANGE_FORMAT,
            kind: types::LONG,
            count: 1,
            payload: Payload::BlobOffset(blob),
        });
        self.long(ifd, tags::JPEG_INTERCHANGE_FORMAT_LENGTH, data.len() as u32);
    }

    /// Write a raw StripOffsets / StripByteCounts pair without a backing
    /// blob, for corruption scenarios
    pub fn strip_pair_raw(&mut self, ifd: usize, offset: u32, size: u32) {
        self.long(ifd, tags::STRIP_OFFSETS, offset);
        self.long(ifd, tags::STRIP_BYTE_COUNTS, size);
    }

    /// Append `data` as a Sony SR2Private block; the tag's count field
    /// carries the block length, its value the offset
    pub fn sr2_private(&mut self, ifd: usize, data: &[u8]) {
        let count = data.len() as u32;
        let blob = self.add_blob(data);
        self.ifds[ifd].entries.push(Entry {
            tag: tags::SONY_SR2_PRIVATE,
            kind: types::LONG,
            count,
            payload: Payload::BlobOffset(blob),
        });
    }

    /// Append an opaque blob, returning its handle; the final offset is
    /// known only after `build()`
    pub fn add_blob(&mut self, data: &[u8]) -> usize {
        self.blobs.push(data.to_vec());
        self.blobs.len() - 1
    }

    /// Lay out and serialize the container
    pub fn build(&self) -> Vec<u8> {
        let n = self.ifds.len();
        let mut entry_lists: Vec<Vec<Entry>> =
            self.ifds.iter().map(|i| i.entries.clone()).collect();

        // Attach sub-IFD link entries to their parents
        for parent in 0..n {
            let mut groups: Vec<(u16, Vec<usize>)> = Vec::new();
            for (child, spec) in self.ifds.iter().enumerate() {
                if spec.parent == Some(parent) {
                    match groups.iter_mut().find(|(t, _)| *t == spec.link_tag) {
                        Some((_, v)) => v.push(child),
                        None => groups.push((spec.link_tag, vec![child])),
                    }
                }
            }
            for (tag, children) in groups {
                entry_lists[parent].push(Entry {
                    tag,
                    kind: types::LONG,
                    count: children.len() as u32,
                    payload: Payload::SubOffsets(children),
                });
            }
        }
        for list in &mut entry_lists {
            list.sort_by_key(|e| e.tag);
        }

        // First pass: directory offsets
        let header_len = 8 + self.sub_header.len();
        let mut ifd_offsets = Vec::with_capacity(n);
        let mut pos = header_len;
        for list in &entry_lists {
            ifd_offsets.push(pos);
            pos += 2 + list.len() * 12 + 4;
        }

        // Overflow area (long ASCII values, multi-value offset arrays)
        // precedes the blobs
        let mut overflow_len = 0;
        for list in &entry_lists {
            for e in list {
                match &e.payload {
                    Payload::AsciiData(bytes) => overflow_len += bytes.len(),
                    Payload::SubOffsets(children) if children.len() > 1 => {
                        overflow_len += children.len() * 4
                    }
                    _ => {}
                }
            }
        }
        let mut blob_offsets = Vec::with_capacity(self.blobs.len());
        let mut bpos = pos + overflow_len;
        for blob in &self.blobs {
            blob_offsets.push(bpos);
            bpos += blob.len();
        }

        // Second pass: emit
        let mains: Vec<usize> = (0..n).filter(|&i| self.ifds[i].parent.is_none()).collect();
        let first_main = mains.first().map(|&m| ifd_offsets[m]).unwrap_or(8);

        let mut out = Vec::with_capacity(bpos);
        out.extend_from_slice(b"II");
        out.extend_from_slice(&self.magic.to_le_bytes());
        out.extend_from_slice(&(first_main as u32).to_le_bytes());
        out.extend_from_slice(&self.sub_header);

        let mut overflow = Vec::with_capacity(overflow_len);
        let mut overflow_pos = pos;

        for (i, list) in entry_lists.iter().enumerate() {
            out.extend_from_slice(&(list.len() as u16).to_le_bytes());
            for e in list {
                out.extend_from_slice(&e.tag.to_le_bytes());
                out.extend_from_slice(&e.kind.to_le_bytes());
                out.extend_from_slice(&e.count.to_le_bytes());
                let raw: [u8; 4] = match &e.payload {
                    Payload::Inline(raw) => *raw,
                    Payload::AsciiData(bytes) => {
                        let r = (overflow_pos as u32).to_le_bytes();
                        overflow.extend_from_slice(bytes);
                        overflow_pos += bytes.len();
                        r
                    }
                    Payload::BlobOffset(id) => (blob_offsets[*id] as u32).to_le_bytes(),
                    Payload::SubOffsets(children) => {
                        if children.len() == 1 {
                            (ifd_offsets[children[0]] as u32).to_le_bytes()
                        } else {
                            let r = (overflow_pos as u32).to_le_bytes();
                            for &c in children {
                                overflow
                                    .extend_from_slice(&(ifd_offsets[c] as u32).to_le_bytes());
                            }
                            overflow_pos += children.len() * 4;
                            r
                        }
                    }
                };
                out.extend_from_slice(&raw);
            }
            let next = if self.ifds[i].parent.is_none() {
                mains
                    .iter()
                    .position(|&m| m == i)
                    .and_then(|k| mains.get(k + 1))
                    .map(|&m| ifd_offsets[m] as u32)
                    .unwrap_or(0)
            } else {
                0
            };
            out.extend_from_slice(&next.to_le_bytes());
        }
        out.extend_from_slice(&overflow);
        for blob in &self.blobs {
            out.extend_from_slice(blob);
        }
        out
    }
}

impl Default for TiffBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// CR2 builder: TIFF little-endian with the "CR" signature block
/// between the header and the first IFD
pub fn cr2_builder() -> TiffBuilder {
    // "CR", version 2.0, raw IFD pointer (unused here)
    TiffBuilder::new().sub_header(&[b'C', b'R', 0x02, 0x00, 0x00, 0x00, 0x00, 0x00])
}

/// RW2 builder: Panasonic vendor magic, first IFD directly after the
/// 8-byte header
pub fn rw2_builder() -> TiffBuilder {
    TiffBuilder::new().magic(crate::tiff::RW2_MAGIC)
}

/// Canon CR3 (ISO BMFF) fixture builder
///
/// Boxes are appended in call order after the leading ftyp box. All box
/// sizes and fourcc scans match what the extractor expects: THMB data
/// at fourcc + 16, PRVW JPEG after the 8-byte uuid-data header plus the
/// 8-byte PRVW box header plus 16 internal bytes, CMT1 orientation at
/// fourcc + 0x140.
pub struct Cr3Builder {
    brand: [u8; 4],
    boxes: Vec<Vec<u8>>,
}

impl Cr3Builder {
    pub fn new() -> Self {
        Self {
            brand: *b"crx ",
            boxes: Vec::new(),
        }
    }

    pub fn brand(mut self, brand: [u8; 4]) -> Self {
        self.brand = brand;
        self
    }

    fn push_box(&mut self, fourcc: &[u8; 4], content: &[u8]) {
        let mut b = Vec::with_capacity(8 + content.len());
        b.extend_from_slice(&((8 + content.len()) as u32).to_be_bytes());
        b.extend_from_slice(fourcc);
        b.extend_from_slice(content);
        self.boxes.push(b);
    }

    /// THMB thumbnail box; JPEG data follows a 12-byte header
    pub fn thumbnail(&mut self, jpeg: &[u8]) -> &mut Self {
        let mut content = vec![0u8; 12];
        content.extend_from_slice(jpeg);
        self.push_box(b"THMB", &content);
        self
    }

    /// Preview uuid box: Canon preview UUID, 8-byte data header, then a
    /// PRVW box whose JPEG sits after a 16-byte internal header
    pub fn preview(&mut self, jpeg: &[u8]) -> &mut Self {
        const PREVIEW_UUID: [u8; 16] = [
            0xea, 0xf4, 0x2b, 0x5e, 0x1c, 0x98, 0x4b, 0x88, 0xb9, 0xfb, 0xb7, 0xdc, 0x40, 0x6e,
            0x4d, 0x16,
        ];
        let mut prvw = Vec::with_capacity(24 + jpeg.len());
        prvw.extend_from_slice(&((8 + 16 + jpeg.len()) as u32).to_be_bytes());
        prvw.extend_from_slice(b"PRVW");
        prvw.extend_from_slice(&[0u8; 16]);
        prvw.extend_from_slice(jpeg);

        let mut content = Vec::with_capacity(16 + 8 + prvw.len());
        content.extend_from_slice(&PREVIEW_UUID);
        content.extend_from_slice(&[0u8; 8]);
        content.extend_from_slice(&prvw);
        self.push_box(b"uuid", &content);
        self
    }

    /// mdat box holding the full-resolution JPEG
    pub fn full(&mut self, jpeg: &[u8]) -> &mut Self {
        self.push_box(b"mdat", jpeg);
        self
    }

    /// free box embedding a CMT1 block with the orientation value at
    /// its fixed offset
    pub fn orientation(&mut self, value: u16) -> &mut Self {
        let mut content = Vec::with_capacity(0x142);
        content.extend_from_slice(b"CMT1");
        content.resize(0x140, 0);
        content.extend_from_slice(&value.to_le_bytes());
        self.push_box(b"free", &content);
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&20u32.to_be_bytes());
        out.extend_from_slice(b"ftyp");
        out.extend_from_slice(&self.brand);
        out.extend_from_slice(&[0u8; 4]);
        out.extend_from_slice(&self.brand);
        for b in &self.boxes {
            out.extend_from_slice(b);
        }
        out
    }
}

impl Default for Cr3Builder {
    fn default() -> Self {
        Self::new()
    }
}

/// Fujifilm RAF fixture: magic string, big-endian offset/length pair at
/// bytes 84/88, JPEG body at offset 128
pub fn raf_fixture(jpeg: &[u8]) -> Vec<u8> {
    const JPEG_AT: usize = 128;
    let mut out = vec![0u8; JPEG_AT];
    out[..15].copy_from_slice(b"FUJIFILMCCD-RAW");
    out[84..88].copy_from_slice(&(JPEG_AT as u32).to_be_bytes());
    out[88..92].copy_from_slice(&(jpeg.len() as u32).to_be_bytes());
    out.extend_from_slice(jpeg);
    out
}
