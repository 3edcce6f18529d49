//! Extraction options and the per-call time budget

use std::time::{Duration, Instant};

use crate::error::{Error, Result};
use crate::preview::PreviewQuality;

/// Options controlling a single extraction call
///
/// Built with a consuming builder; the defaults match typical ingestion
/// use (screen-sized preview, 5 second budget).
///
/// # Example
///
/// ```
/// use raw_preview::{ExtractionOptions, PreviewQuality};
///
/// let options = ExtractionOptions::new()
///     .target_size(500 * 1024, 4 * 1024 * 1024)
///     .prefer_quality(PreviewQuality::Full);
/// ```
#[derive(Debug, Clone)]
pub struct ExtractionOptions {
    /// Lower bound of the desired preview byte size
    pub target_min_size: usize,
    /// Upper bound of the desired preview byte size
    pub target_max_size: usize,
    /// Preferred quality tier
    pub preferred_quality: PreviewQuality,
    /// Whether the caller's cache layer should be consulted; carried for
    /// the surrounding pipeline, unused inside this crate
    pub use_cache: bool,
    /// Per-call time budget
    pub timeout: Duration,
    /// Maximum file/buffer size this call will map or parse
    pub max_mapped_bytes: u64,
    /// Whether the caller wants extra metadata attached; carried for the
    /// surrounding pipeline, unused inside this crate
    pub include_metadata: bool,
    /// Full JPEG structure validation of the selected candidate (when
    /// false, only the SOI marker is checked)
    pub strict_validation: bool,
}

impl Default for ExtractionOptions {
    fn default() -> Self {
        Self {
            target_min_size: 200 * 1024,
            target_max_size: 3 * 1024 * 1024,
            preferred_quality: PreviewQuality::Preview,
            use_cache: false,
            timeout: Duration::from_secs(5),
            max_mapped_bytes: 512 * 1024 * 1024,
            include_metadata: false,
            strict_validation: true,
        }
    }
}

impl ExtractionOptions {
    /// Create options with defaults (same as `Default`, more explicit)
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the desired preview byte-size range
    pub fn target_size(mut self, min: usize, max: usize) -> Self {
        self.target_min_size = min;
        self.target_max_size = max;
        self
    }

    /// Set the preferred quality tier
    pub fn prefer_quality(mut self, quality: PreviewQuality) -> Self {
        self.preferred_quality = quality;
        self
    }

    /// Set the per-call time budget
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the maximum input size this call will map or parse
    pub fn max_mapped_bytes(mut self, max: u64) -> Self {
        self.max_mapped_bytes = max;
        self
    }

    /// Enable or disable strict JPEG validation
    pub fn strict_validation(mut self, strict: bool) -> Self {
        self.strict_validation = strict;
        self
    }

    /// Validate caller-supplied values before use
    pub(crate) fn validate(&self) -> Result<()> {
        if self.target_min_size > self.target_max_size {
            return Err(Error::InvalidArgument(format!(
                "target size range is inverted: min {} > max {}",
                self.target_min_size, self.target_max_size
            )));
        }
        if self.max_mapped_bytes == 0 {
            return Err(Error::InvalidArgument(
                "max_mapped_bytes must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

/// Monotonic per-call deadline, checked at phase boundaries
///
/// Cancellation is not cooperative mid-phase; exceeding the budget aborts
/// only the call that owns this deadline.
#[derive(Debug)]
pub(crate) struct Deadline {
    start: Instant,
    budget: Duration,
}

impl Deadline {
    pub fn new(budget: Duration) -> Self {
        Self {
            start: Instant::now(),
            budget,
        }
    }

    pub fn check(&self, phase: &'static str) -> Result<()> {
        if self.start.elapsed() >= self.budget {
            Err(Error::Timeout { phase })
        } else {
            Ok(())
        }
    }
}
