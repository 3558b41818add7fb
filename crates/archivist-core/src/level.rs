//! Compression level validation and per-codec conversion.
//!
//! Levels follow the deflate convention: `-1` selects the codec default,
//! `0` means no (or minimal) compression and `9` the best compression.
//! Each codec maps this scale onto its own level type; codecs without a
//! notion of "stored" use their fastest setting for `0`.

use crate::ArchiveError;
use crate::Result;

/// A validated compression level in `-1..=9`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CompressionLevel(i8);

impl CompressionLevel {
    /// The "use codec default" sentinel.
    pub const DEFAULT: Self = Self(-1);
    /// No compression where the format allows it.
    pub const NONE: Self = Self(0);
    /// Best compression.
    pub const BEST: Self = Self(9);

    /// Default preset used by the lzma encoder.
    const LZMA_DEFAULT_PRESET: u32 = 6;

    /// Validates a raw level.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::InvalidCompressionLevel`] outside `-1..=9`.
    ///
    /// # Examples
    ///
    /// ```
    /// use archivist_core::CompressionLevel;
    ///
    /// assert!(CompressionLevel::new(-1).is_ok());
    /// assert!(CompressionLevel::new(9).is_ok());
    /// assert!(CompressionLevel::new(10).is_err());
    /// ```
    pub fn new(level: i32) -> Result<Self> {
        i8::try_from(level)
            .ok()
            .filter(|l| (-1..=9).contains(l))
            .map(Self)
            .ok_or(ArchiveError::InvalidCompressionLevel { level })
    }

    /// Returns the raw level value.
    #[must_use]
    pub const fn get(self) -> i32 {
        self.0 as i32
    }

    /// Returns `true` for the "codec default" sentinel.
    #[must_use]
    pub const fn is_default(self) -> bool {
        self.0 < 0
    }

    /// Returns the explicit level, or `None` for the default sentinel.
    #[allow(clippy::cast_sign_loss)]
    fn explicit(self) -> Option<u32> {
        (!self.is_default()).then_some(self.0 as u32)
    }

    /// Converts to a flate2 (deflate / gzip) compression level.
    #[must_use]
    pub fn to_flate2(self) -> flate2::Compression {
        self.explicit()
            .map_or_else(flate2::Compression::default, flate2::Compression::new)
    }

    /// Converts to a bzip2 block-size level (bzip2 has no level 0).
    #[must_use]
    pub fn to_bzip2(self) -> bzip2::Compression {
        match self.explicit() {
            None => bzip2::Compression::default(),
            Some(0) => bzip2::Compression::fast(),
            Some(n) => bzip2::Compression::new(n),
        }
    }

    /// Converts to an lzma preset.
    #[must_use]
    pub fn to_lzma_preset(self) -> u32 {
        self.explicit().unwrap_or(Self::LZMA_DEFAULT_PRESET)
    }

    /// Converts to a zip deflate level, or `None` for the codec default.
    #[must_use]
    pub fn to_zip(self) -> Option<i64> {
        self.explicit().map(i64::from)
    }
}

impl Default for CompressionLevel {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<i32> for CompressionLevel {
    type Error = ArchiveError;

    fn try_from(level: i32) -> Result<Self> {
        Self::new(level)
    }
}

impl std::fmt::Display for CompressionLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_default() {
            f.write_str("default")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_level_range() {
        for level in -1..=9 {
            assert_eq!(CompressionLevel::new(level).unwrap().get(), level);
        }
        for level in [-2, 10, 100, i32::MIN, i32::MAX] {
            assert!(matches!(
                CompressionLevel::new(level),
                Err(ArchiveError::InvalidCompressionLevel { level: l }) if l == level
            ));
        }
    }

    #[test]
    fn test_default_sentinel() {
        assert!(CompressionLevel::default().is_default());
        assert_eq!(CompressionLevel::default().get(), -1);
        assert!(!CompressionLevel::NONE.is_default());
        assert_eq!(CompressionLevel::default().to_string(), "default");
        assert_eq!(CompressionLevel::BEST.to_string(), "9");
    }

    #[test]
    fn test_to_flate2() {
        assert_eq!(
            CompressionLevel::DEFAULT.to_flate2(),
            flate2::Compression::default()
        );
        assert_eq!(CompressionLevel::NONE.to_flate2(), flate2::Compression::none());
        assert_eq!(CompressionLevel::BEST.to_flate2(), flate2::Compression::best());
    }

    #[test]
    fn test_to_bzip2() {
        assert_eq!(
            CompressionLevel::DEFAULT.to_bzip2(),
            bzip2::Compression::default()
        );
        assert_eq!(CompressionLevel::NONE.to_bzip2(), bzip2::Compression::fast());
        assert_eq!(CompressionLevel::BEST.to_bzip2(), bzip2::Compression::best());
        assert_eq!(
            CompressionLevel::new(4).unwrap().to_bzip2(),
            bzip2::Compression::new(4)
        );
    }

    #[test]
    fn test_to_lzma_and_zip() {
        assert_eq!(CompressionLevel::DEFAULT.to_lzma_preset(), 6);
        assert_eq!(CompressionLevel::new(2).unwrap().to_lzma_preset(), 2);
        assert_eq!(CompressionLevel::DEFAULT.to_zip(), None);
        assert_eq!(CompressionLevel::BEST.to_zip(), Some(9));
    }
}
