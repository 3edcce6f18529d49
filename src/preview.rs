//! Preview candidate data model

/// Quality tier of an embedded preview
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PreviewQuality {
    /// Small embedded thumbnail (typically 160x120)
    Thumbnail,
    /// Screen-sized preview
    Preview,
    /// Full-resolution or near-full-resolution preview
    Full,
}

impl PreviewQuality {
    /// Lowercase name used at the API boundary
    pub fn as_str(&self) -> &'static str {
        match self {
            PreviewQuality::Thumbnail => "thumbnail",
            PreviewQuality::Preview => "preview",
            PreviewQuality::Full => "full",
        }
    }
}

impl std::fmt::Display for PreviewQuality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which container structure a candidate was discovered in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IfdSlot {
    /// Top-level directory at this index in the chain
    Main(usize),
    /// Nested sub-directory at this index within its parent's list
    Sub(usize),
    /// Format-specific private structure (maker-note tags, SR2 blocks,
    /// CR3 boxes, RAF fixed offsets)
    Private,
}

/// One embedded preview discovered inside a RAW container
///
/// `offset` and `size` are relative to the source span the candidate was
/// discovered in; [`PreviewInfo::in_bounds`] must hold before the range
/// is ever read.
#[derive(Debug, Clone)]
pub struct PreviewInfo {
    /// Byte offset of the JPEG stream within the source span
    pub offset: usize,
    /// Byte length of the JPEG stream
    pub size: usize,
    /// Pixel width (0 if unknown)
    pub width: u32,
    /// Pixel height (0 if unknown)
    pub height: u32,
    /// Whether the range was confirmed to be a JPEG stream
    pub is_jpeg: bool,
    /// TIFF NewSubfileType value (1 = reduced-resolution image)
    pub subfile_type: u32,
    /// Which container structure the candidate came from
    pub slot: IfdSlot,
    /// Quality tier
    pub quality: PreviewQuality,
    /// Format-specific priority; higher wins at selection time
    pub priority: i32,
    /// EXIF orientation (1-8, 1 = normal)
    pub orientation: u16,
    /// Provenance label, e.g. "Cr2Ifd0", "Cr3Prvw", "NefSubIfd1"
    pub label: String,
}

impl Default for PreviewInfo {
    fn default() -> Self {
        Self {
            offset: 0,
            size: 0,
            width: 0,
            height: 0,
            is_jpeg: false,
            subfile_type: 0,
            slot: IfdSlot::Private,
            quality: PreviewQuality::Thumbnail,
            priority: 0,
            orientation: 1,
            label: String::new(),
        }
    }
}

impl PreviewInfo {
    /// True if the candidate's full byte range lies inside a span of
    /// `len` bytes
    pub fn in_bounds(&self, len: usize) -> bool {
        self.size > 0
            && self
                .offset
                .checked_add(self.size)
                .map(|end| end <= len)
                .unwrap_or(false)
    }

    /// Borrow the candidate's byte range from the source span, if in
    /// bounds
    pub fn bytes<'a>(&self, data: &'a [u8]) -> Option<&'a [u8]> {
        if self.in_bounds(data.len()) {
            Some(&data[self.offset..self.offset + self.size])
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_bounds() {
        let p = PreviewInfo {
            offset: 10,
            size: 20,
            ..Default::default()
        };
        assert!(p.in_bounds(30));
        assert!(!p.in_bounds(29));

        let overflow = PreviewInfo {
            offset: usize::MAX,
            size: 2,
            ..Default::default()
        };
        assert!(!overflow.in_bounds(usize::MAX));

        let empty = PreviewInfo::default();
        assert!(!empty.in_bounds(100));
    }

    #[test]
    fn test_bytes_slice() {
        let data: Vec<u8> = (0..32).collect();
        let p = PreviewInfo {
            offset: 4,
            size: 4,
            ..Default::default()
        };
        assert_eq!(p.bytes(&data), Some(&data[4..8]));

        let oob = PreviewInfo {
            offset: 30,
            size: 4,
            ..Default::default()
        };
        assert_eq!(oob.bytes(&data), None);
    }
}
