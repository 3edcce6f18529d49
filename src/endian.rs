//! Bounds-checked multi-byte integer reads over raw spans
//!
//! Every offset/length in a RAW container is untrusted, so all reads go
//! through `Option`-returning accessors instead of direct indexing.

use byteorder::{BigEndian, ByteOrder, LittleEndian};

/// Byte order for reading multi-byte values from a container
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Little,
    Big,
}

impl Endian {
    /// Detect byte order from a TIFF-style order marker at the start of
    /// the span ("II" = little endian, "MM" = big endian).
    pub fn detect(data: &[u8]) -> Option<Endian> {
        match data.get(0..2)? {
            b"II" => Some(Endian::Little),
            b"MM" => Some(Endian::Big),
            _ => None,
        }
    }

    /// Read a u16 at `offset`, or None if the span is too short
    pub fn read_u16(self, data: &[u8], offset: usize) -> Option<u16> {
        let bytes = data.get(offset..offset.checked_add(2)?)?;
        Some(match self {
            Endian::Little => LittleEndian::read_u16(bytes),
            Endian::Big => BigEndian::read_u16(bytes),
        })
    }

    /// Read a u32 at `offset`, or None if the span is too short
    pub fn read_u32(self, data: &[u8], offset: usize) -> Option<u32> {
        let bytes = data.get(offset..offset.checked_add(4)?)?;
        Some(match self {
            Endian::Little => LittleEndian::read_u32(bytes),
            Endian::Big => BigEndian::read_u32(bytes),
        })
    }

    /// Read a u64 at `offset`, or None if the span is too short
    pub fn read_u64(self, data: &[u8], offset: usize) -> Option<u64> {
        let bytes = data.get(offset..offset.checked_add(8)?)?;
        Some(match self {
            Endian::Little => LittleEndian::read_u64(bytes),
            Endian::Big => BigEndian::read_u64(bytes),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect() {
        assert_eq!(Endian::detect(b"II*\0"), Some(Endian::Little));
        assert_eq!(Endian::detect(b"MM\0*"), Some(Endian::Big));
        assert_eq!(Endian::detect(b"XX"), None);
        assert_eq!(Endian::detect(b"I"), None);
    }

    #[test]
    fn test_reads() {
        let data = [0x12, 0x34, 0x56, 0x78, 0x9a, 0xbc, 0xde, 0xf0];
        assert_eq!(Endian::Big.read_u16(&data, 0), Some(0x1234));
        assert_eq!(Endian::Little.read_u16(&data, 0), Some(0x3412));
        assert_eq!(Endian::Big.read_u32(&data, 2), Some(0x5678_9abc));
        assert_eq!(Endian::Little.read_u32(&data, 2), Some(0xbc9a_7856));
        assert_eq!(Endian::Big.read_u64(&data, 0), Some(0x1234_5678_9abc_def0));
    }

    #[test]
    fn test_out_of_bounds() {
        let data = [0u8; 4];
        assert_eq!(Endian::Little.read_u32(&data, 1), None);
        assert_eq!(Endian::Little.read_u16(&data, 3), None);
        assert_eq!(Endian::Little.read_u16(&data, usize::MAX), None);
    }
}
