//! Generic TIFF/IFD container parsing
//!
//! Most RAW formats (CR2, NEF, ARW, DNG, ORF, RW2) are TIFF containers:
//! a byte-order marker, a magic value, and a chain of image file
//! directories (IFDs) whose entries reference image strips and embedded
//! JPEG streams by offset/length. All of those offsets are untrusted, so
//! parsing never indexes directly and caps both entry counts and chain
//! length.

use std::collections::{HashMap, HashSet};

use crate::endian::Endian;
use crate::preview::IfdSlot;

/// Tag numbers used during preview discovery
pub mod tags {
    pub const NEW_SUBFILE_TYPE: u16 = 0x00FE;
    pub const IMAGE_WIDTH: u16 = 0x0100;
    pub const IMAGE_LENGTH: u16 = 0x0101;
    pub const COMPRESSION: u16 = 0x0103;
    pub const MAKE: u16 = 0x010F;
    pub const MODEL: u16 = 0x0110;
    pub const STRIP_OFFSETS: u16 = 0x0111;
    pub const ORIENTATION: u16 = 0x0112;
    pub const STRIP_BYTE_COUNTS: u16 = 0x0117;
    pub const SOFTWARE: u16 = 0x0131;
    pub const SUB_IFDS: u16 = 0x014A;
    pub const JPEG_INTERCHANGE_FORMAT: u16 = 0x0201;
    pub const JPEG_INTERCHANGE_FORMAT_LENGTH: u16 = 0x0202;
    pub const SONY_SR2_PRIVATE: u16 = 0x7200;
    pub const SONY_SR2_SUB_IFD: u16 = 0x7201;
    pub const DNG_VERSION: u16 = 0xC612;
}

/// TIFF value types
pub mod types {
    pub const BYTE: u16 = 1;
    pub const ASCII: u16 = 2;
    pub const SHORT: u16 = 3;
    pub const LONG: u16 = 4;
    pub const RATIONAL: u16 = 5;
}

/// Classic TIFF magic
pub const TIFF_MAGIC: u16 = 0x002A;
/// Panasonic RW2 uses a vendor magic in the TIFF header slot
pub const RW2_MAGIC: u16 = 0x0055;
/// Olympus ORF replaces "*\0" with "RO"/"OR" in its header
pub const ORF_MAGIC: u16 = 0x4F52;

/// Refuse directories claiming more entries than this; a hostile count
/// would otherwise drive a near-unbounded scan
pub const MAX_IFD_TAGS: usize = 1000;
/// Refuse IFD chains longer than this (cycles are also detected)
pub const MAX_IFD_CHAIN: usize = 32;

// Multi-value reads are only ever SubIFD offset lists in practice
const MAX_VALUES: usize = 256;

/// One 12-byte directory entry
///
/// `raw` is the 4-byte value field verbatim; it holds the value itself
/// when the payload fits, otherwise an offset into the file.
#[derive(Debug, Clone, Copy)]
pub struct IfdEntry {
    pub tag: u16,
    pub kind: u16,
    pub count: u32,
    pub raw: [u8; 4],
}

/// A parsed image file directory
#[derive(Debug, Clone)]
pub struct Ifd {
    pub entries: HashMap<u16, IfdEntry>,
    pub next_ifd: u32,
}

impl Ifd {
    pub fn entry(&self, tag: u16) -> Option<&IfdEntry> {
        self.entries.get(&tag)
    }

    pub fn has(&self, tag: u16) -> bool {
        self.entries.contains_key(&tag)
    }
}

/// A preview candidate as discovered in the container, before any
/// format-specific prioritization
#[derive(Debug, Clone)]
pub struct RawPreview {
    pub offset: usize,
    pub size: usize,
    pub width: u32,
    pub height: u32,
    pub is_jpeg: bool,
    pub subfile_type: u32,
    pub slot: IfdSlot,
}

fn type_size(kind: u16) -> usize {
    match kind {
        types::BYTE | types::ASCII => 1,
        types::SHORT => 2,
        types::LONG => 4,
        types::RATIONAL => 8,
        _ => 0,
    }
}

/// Zero-copy reader over a TIFF-family container
#[derive(Debug)]
pub struct TiffReader<'a> {
    data: &'a [u8],
    pub order: Endian,
    pub first_ifd: u32,
}

impl<'a> TiffReader<'a> {
    /// Parse the 8-byte header. Accepts the classic magic plus the
    /// Panasonic and Olympus vendor variants.
    pub fn new(data: &'a [u8]) -> Option<Self> {
        let order = Endian::detect(data)?;
        let magic = order.read_u16(data, 2)?;
        if magic != TIFF_MAGIC && magic != RW2_MAGIC && magic != ORF_MAGIC {
            return None;
        }
        let first_ifd = order.read_u32(data, 4)?;
        Some(Self {
            data,
            order,
            first_ifd,
        })
    }

    /// The underlying span
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Parse the directory at `offset`. Returns None on truncated data
    /// or a hostile entry count.
    pub fn parse_ifd(&self, offset: u32) -> Option<Ifd> {
        let offset = offset as usize;
        let count = self.order.read_u16(self.data, offset)? as usize;
        if count == 0 || count > MAX_IFD_TAGS {
            return None;
        }

        let mut entries = HashMap::with_capacity(count);
        for i in 0..count {
            let pos = offset.checked_add(2 + i * 12)?;
            let tag = self.order.read_u16(self.data, pos)?;
            let kind = self.order.read_u16(self.data, pos + 2)?;
            let value_count = self.order.read_u32(self.data, pos + 4)?;
            let raw: [u8; 4] = self.data.get(pos + 8..pos + 12)?.try_into().ok()?;
            entries.insert(
                tag,
                IfdEntry {
                    tag,
                    kind,
                    count: value_count,
                    raw,
                },
            );
        }

        let next_ifd = self
            .order
            .read_u32(self.data, offset + 2 + count * 12)
            .unwrap_or(0);
        Some(Ifd { entries, next_ifd })
    }

    /// Walk the main IFD chain from the header, bounded by
    /// [`MAX_IFD_CHAIN`] and a cycle check
    pub fn main_ifds(&self) -> Vec<Ifd> {
        let mut ifds = Vec::new();
        let mut seen = HashSet::new();
        let mut next = self.first_ifd;
        while next != 0 && ifds.len() < MAX_IFD_CHAIN && seen.insert(next) {
            match self.parse_ifd(next) {
                Some(ifd) => {
                    next = ifd.next_ifd;
                    ifds.push(ifd);
                }
                None => break,
            }
        }
        ifds
    }

    /// Offsets of the sub-directories referenced by this IFD's SubIFDs
    /// tag, if any
    pub fn sub_ifd_offsets(&self, ifd: &Ifd) -> Vec<u32> {
        ifd.entry(tags::SUB_IFDS)
            .map(|e| self.values_u32(e))
            .unwrap_or_default()
    }

    /// Resolve all integer values of an entry (BYTE, SHORT or LONG)
    pub fn values_u32(&self, entry: &IfdEntry) -> Vec<u32> {
        let unit = type_size(entry.kind);
        if !matches!(entry.kind, types::BYTE | types::SHORT | types::LONG) {
            return Vec::new();
        }
        let count = (entry.count as usize).min(MAX_VALUES);
        let inline = (entry.count as usize).saturating_mul(unit) <= 4;

        let mut out = Vec::with_capacity(count);
        for i in 0..count {
            let value = if inline {
                self.read_value(&entry.raw, i * unit, unit)
            } else {
                let base = self.order.read_u32(&entry.raw, 0).unwrap_or(u32::MAX) as usize;
                base.checked_add(i * unit)
                    .and_then(|pos| self.read_value(self.data, pos, unit))
            };
            match value {
                Some(v) => out.push(v),
                None => break,
            }
        }
        out
    }

    /// Resolve the first integer value of an entry
    pub fn value_u32(&self, entry: &IfdEntry) -> Option<u32> {
        self.values_u32(entry).into_iter().next()
    }

    /// Resolve the first integer value of `tag` in `ifd`
    pub fn tag_u32(&self, ifd: &Ifd, tag: u16) -> Option<u32> {
        self.value_u32(ifd.entry(tag)?)
    }

    fn read_value(&self, span: &[u8], offset: usize, unit: usize) -> Option<u32> {
        match unit {
            1 => span.get(offset).map(|&b| b as u32),
            2 => self.order.read_u16(span, offset).map(u32::from),
            4 => self.order.read_u32(span, offset),
            _ => None,
        }
    }

    /// Resolve an ASCII entry to a NUL-trimmed string
    pub fn ascii(&self, entry: &IfdEntry) -> Option<String> {
        if entry.kind != types::ASCII {
            return None;
        }
        let count = entry.count as usize;
        let bytes = if count <= 4 {
            entry.raw.get(..count)?
        } else {
            let base = self.order.read_u32(&entry.raw, 0)? as usize;
            self.data.get(base..base.checked_add(count)?)?
        };
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        Some(String::from_utf8_lossy(&bytes[..end]).trim().to_string())
    }

    /// Resolve an ASCII `tag` in `ifd`
    pub fn ascii_tag(&self, ifd: &Ifd, tag: u16) -> Option<String> {
        self.ascii(ifd.entry(tag)?)
    }

    /// Camera make from IFD0
    pub fn make(&self) -> Option<String> {
        let ifd0 = self.parse_ifd(self.first_ifd)?;
        self.ascii_tag(&ifd0, tags::MAKE)
    }

    /// Camera model from IFD0
    pub fn model(&self) -> Option<String> {
        let ifd0 = self.parse_ifd(self.first_ifd)?;
        self.ascii_tag(&ifd0, tags::MODEL)
    }

    /// Software string from IFD0
    pub fn software(&self) -> Option<String> {
        let ifd0 = self.parse_ifd(self.first_ifd)?;
        self.ascii_tag(&ifd0, tags::SOFTWARE)
    }

    /// EXIF orientation from IFD0; out-of-range values fall back to 1
    pub fn orientation(&self) -> u16 {
        self.parse_ifd(self.first_ifd)
            .and_then(|ifd0| self.tag_u32(&ifd0, tags::ORIENTATION))
            .filter(|&v| (1..=8).contains(&v))
            .map(|v| v as u16)
            .unwrap_or(1)
    }

    /// The preview candidate referenced by this IFD, if it references
    /// one at all
    ///
    /// Strip offsets take precedence; the JPEGInterchangeFormat pair is
    /// the fallback and implies a JPEG stream.
    pub fn preview_in(&self, ifd: &Ifd, slot: IfdSlot) -> Option<RawPreview> {
        let width = self.tag_u32(ifd, tags::IMAGE_WIDTH).unwrap_or(0);
        let height = self.tag_u32(ifd, tags::IMAGE_LENGTH).unwrap_or(0);
        let compression = self.tag_u32(ifd, tags::COMPRESSION).unwrap_or(0);
        let subfile_type = self.tag_u32(ifd, tags::NEW_SUBFILE_TYPE).unwrap_or(0);

        let (offset, size, is_jpeg) = if ifd.has(tags::STRIP_OFFSETS) {
            let offset = self.tag_u32(ifd, tags::STRIP_OFFSETS)?;
            let size = self.tag_u32(ifd, tags::STRIP_BYTE_COUNTS)?;
            (offset, size, compression == 6 || compression == 7)
        } else if ifd.has(tags::JPEG_INTERCHANGE_FORMAT) {
            let offset = self.tag_u32(ifd, tags::JPEG_INTERCHANGE_FORMAT)?;
            let size = self.tag_u32(ifd, tags::JPEG_INTERCHANGE_FORMAT_LENGTH)?;
            (offset, size, true)
        } else {
            return None;
        };

        if size == 0 {
            return None;
        }

        Some(RawPreview {
            offset: offset as usize,
            size: size as usize,
            width,
            height,
            is_jpeg,
            subfile_type,
            slot,
        })
    }

    /// Discover every preview candidate in the container: one per main
    /// IFD plus one per sub-directory referenced via the SubIFDs tag
    pub fn find_previews(&self) -> Vec<RawPreview> {
        let mut found = Vec::new();
        for (i, ifd) in self.main_ifds().iter().enumerate() {
            if let Some(p) = self.preview_in(ifd, IfdSlot::Main(i)) {
                found.push(p);
            }
            for (j, sub_offset) in self.sub_ifd_offsets(ifd).iter().enumerate() {
                if let Some(sub) = self.parse_ifd(*sub_offset) {
                    if let Some(p) = self.preview_in(&sub, IfdSlot::Sub(j)) {
                        found.push(p);
                    }
                }
            }
        }
        found
    }
}
