//! Configuration for detection behavior.
//!
//! - [`DetectConfig`] - Read sizing (high-water mark) and read limit
//!
//! # Example
//!
//! ```
//! use encsniff::DetectConfig;
//!
//! // Smaller reads for a memory-constrained process
//! let config = DetectConfig::new(64 * 1024)?;
//!
//! // Only look at the first 4 MiB of the source
//! let config = DetectConfig::default().with_max_bytes(Some(4 * 1024 * 1024));
//!
//! # Ok::<(), encsniff::DetectError>(())
//! ```

use crate::error::DetectError;

/// Default high-water mark (1 MiB).
pub const DEFAULT_HIGH_WATER_MARK: usize = 1024 * 1024;

/// Largest accepted high-water mark (256 MiB).
pub const MAX_HIGH_WATER_MARK: usize = 256 * 1024 * 1024;

/// Configuration for a detection operation.
///
/// The high-water mark is the maximum number of bytes buffered but not yet
/// consumed by the classifier. Each read requests at most this many bytes and
/// the buffer is reused, so peak memory does not grow with the source size.
///
/// Small values issue many small reads and waste throughput; large values cost
/// memory and reduce overlap between I/O and analysis. 1 MiB is a reasonable
/// default for files; pipes rarely deliver more than 64 KiB per read anyway.
///
/// # Example
///
/// ```
/// use encsniff::DetectConfig;
///
/// let config = DetectConfig::default()
///     .with_high_water_mark(256 * 1024)
///     .with_max_bytes(Some(1 << 20));
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DetectConfig {
    /// Maximum bytes requested per read.
    high_water_mark: usize,

    /// Total bytes to read from the source; `None` reads to end.
    max_bytes: Option<u64>,
}

impl DetectConfig {
    /// Creates a new configuration with the given high-water mark.
    ///
    /// # Errors
    ///
    /// Returns [`DetectError::InvalidConfig`] if `high_water_mark` is zero or
    /// larger than [`MAX_HIGH_WATER_MARK`].
    ///
    /// # Example
    ///
    /// ```
    /// use encsniff::DetectConfig;
    ///
    /// let config = DetectConfig::new(4096)?;
    /// assert_eq!(config.high_water_mark(), 4096);
    /// # Ok::<(), encsniff::DetectError>(())
    /// ```
    pub fn new(high_water_mark: usize) -> Result<Self, DetectError> {
        let config = Self {
            high_water_mark,
            max_bytes: None,
        };
        config.validate()?;
        Ok(config)
    }

    /// Sets the high-water mark.
    ///
    /// Note: This does not validate the configuration. Use
    /// [`DetectConfig::validate`] to check it.
    pub fn with_high_water_mark(mut self, bytes: usize) -> Self {
        self.high_water_mark = bytes;
        self
    }

    /// Limits the number of bytes read from the source.
    ///
    /// `None` reads until end-of-stream.
    pub fn with_max_bytes(mut self, max_bytes: Option<u64>) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    /// Returns the high-water mark in bytes.
    pub fn high_water_mark(&self) -> usize {
        self.high_water_mark
    }

    /// Returns the read limit, if any.
    pub fn max_bytes(&self) -> Option<u64> {
        self.max_bytes
    }

    /// Validates the current configuration.
    ///
    /// # Example
    ///
    /// ```
    /// use encsniff::DetectConfig;
    ///
    /// let config = DetectConfig::default().with_high_water_mark(0);
    /// assert!(config.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<(), DetectError> {
        if self.high_water_mark == 0 {
            return Err(DetectError::InvalidConfig {
                message: "high_water_mark must be non-zero",
            });
        }

        if self.high_water_mark > MAX_HIGH_WATER_MARK {
            return Err(DetectError::InvalidConfig {
                message: "high_water_mark cannot exceed 256 MiB",
            });
        }

        Ok(())
    }
}

impl Default for DetectConfig {
    fn default() -> Self {
        Self {
            high_water_mark: DEFAULT_HIGH_WATER_MARK,
            max_bytes: None,
        }
    }
}
