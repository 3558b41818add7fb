//! Archive format registry.
//!
//! Maps each supported format to its recognized file extensions and to the
//! constructor of a fresh [`ArchivingAlgorithm`] instance.
//!
//! # Supported Formats
//!
//! | Format   | Display     | Extensions                          |
//! |----------|-------------|-------------------------------------|
//! | `Zip`    | `ZIP`       | `.zip`                              |
//! | `Jar`    | `JAR`       | `.jar`                              |
//! | `Gzip`   | `GZIP`      | `.gz`, `.gzip`                      |
//! | `TarGz`  | `TAR+GZIP`  | `.tar.gz`, `.tar.gzip`, `.tgz`      |
//! | `TarBz2` | `TAR+BZIP2` | `.tar.bz2`, `.tar.bzip2`, `.tbz2`   |
//! | `TarLz`  | `TAR+LZMA`  | `.tar.lz`, `.tar.lzma`, `.tlz`      |
//!
//! Extension matching is case-sensitive and suffix-based.

use std::fmt;
use std::str::FromStr;

use crate::ArchiveError;
use crate::Result;
use crate::algorithm::ArchivingAlgorithm;
use crate::algorithm::gzip::GzipAlgorithm;
use crate::algorithm::tar::TarAlgorithm;
use crate::algorithm::codec::Codec;
use crate::algorithm::zip::ZipAlgorithm;
use crate::config::OperationConfig;

/// Wildcard marker used by file-chooser style extension filters.
const WILDCARD: &str = "*";

/// Constructor of a fresh algorithm instance.
type AlgorithmConstructor = fn(OperationConfig) -> Box<dyn ArchivingAlgorithm>;

/// Supported archive formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArchiveFormat {
    /// ZIP archive (deflate).
    Zip,
    /// Java archive; a ZIP archive with its own extension.
    Jar,
    /// Single-file gzip stream.
    Gzip,
    /// Gzip-compressed tar archive.
    TarGz,
    /// Bzip2-compressed tar archive.
    TarBz2,
    /// LZMA-compressed tar archive.
    TarLz,
}

impl ArchiveFormat {
    /// All formats, in presentation order.
    pub const ALL: [Self; 6] = [
        Self::Zip,
        Self::Jar,
        Self::Gzip,
        Self::TarGz,
        Self::TarBz2,
        Self::TarLz,
    ];

    /// Returns the canonical name of this format.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Zip => "Zip",
            Self::Jar => "Jar",
            Self::Gzip => "Gzip",
            Self::TarGz => "TarGz",
            Self::TarBz2 => "TarBz2",
            Self::TarLz => "TarLz",
        }
    }

    /// Returns the display (friendly) name of this format.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Zip => "ZIP",
            Self::Jar => "JAR",
            Self::Gzip => "GZIP",
            Self::TarGz => "TAR+GZIP",
            Self::TarBz2 => "TAR+BZIP2",
            Self::TarLz => "TAR+LZMA",
        }
    }

    /// Returns the recognized extensions, default first, without wildcard.
    #[must_use]
    pub const fn extensions(self) -> &'static [&'static str] {
        match self {
            Self::Zip => &[".zip"],
            Self::Jar => &[".jar"],
            Self::Gzip => &[".gz", ".gzip"],
            Self::TarGz => &[".tar.gz", ".tar.gzip", ".tgz"],
            Self::TarBz2 => &[".tar.bz2", ".tar.bzip2", ".tbz2"],
            Self::TarLz => &[".tar.lz", ".tar.lzma", ".tlz"],
        }
    }

    /// Returns the recognized extensions, optionally prefixed with `*`.
    ///
    /// # Examples
    ///
    /// ```
    /// use archivist_core::ArchiveFormat;
    ///
    /// assert_eq!(ArchiveFormat::Gzip.extension_names(false), [".gz", ".gzip"]);
    /// assert_eq!(ArchiveFormat::Gzip.extension_names(true), ["*.gz", "*.gzip"]);
    /// ```
    #[must_use]
    pub fn extension_names(self, include_wildcard: bool) -> Vec<String> {
        self.extensions()
            .iter()
            .map(|ext| {
                if include_wildcard {
                    format!("{WILDCARD}{ext}")
                } else {
                    (*ext).to_string()
                }
            })
            .collect()
    }

    /// Returns the default extension (the first recognized one).
    #[must_use]
    pub const fn default_extension(self) -> &'static str {
        self.extensions()[0]
    }

    /// Returns `true` for formats that hold exactly one compressed file.
    #[must_use]
    pub const fn is_single_stream(self) -> bool {
        matches!(self, Self::Gzip)
    }

    /// Returns `true` if `name` ends with one of this format's extensions.
    ///
    /// The check is case-sensitive: `out.ZIP` does not match `Zip`.
    #[must_use]
    pub fn matches_extension(self, name: &str) -> bool {
        self.extensions().iter().any(|ext| name.ends_with(*ext))
    }

    /// Appends the default extension unless `name` already carries one.
    ///
    /// # Examples
    ///
    /// ```
    /// use archivist_core::ArchiveFormat;
    ///
    /// assert_eq!(ArchiveFormat::Zip.with_extension("out"), "out.zip");
    /// assert_eq!(ArchiveFormat::Zip.with_extension("out.zip"), "out.zip");
    /// assert_eq!(ArchiveFormat::Zip.with_extension("out.ZIP"), "out.ZIP.zip");
    /// ```
    #[must_use]
    pub fn with_extension(self, name: &str) -> String {
        if self.matches_extension(name) {
            name.to_string()
        } else {
            format!("{name}{}", self.default_extension())
        }
    }

    /// Strips the longest matching recognized extension from `name`.
    #[must_use]
    pub fn strip_extension(self, name: &str) -> Option<&str> {
        self.extensions()
            .iter()
            .filter(|ext| name.len() > ext.len())
            .filter_map(|ext| name.strip_suffix(*ext))
            .min_by_key(|stem| stem.len())
    }

    /// Resolves a free-form token to a format.
    ///
    /// Accepts the canonical name (`TarGz`) or the display name (`TAR+GZIP`),
    /// ignoring ASCII case.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::UnknownFormat`] if no format matches.
    pub fn from_token(token: &str) -> Result<Self> {
        let token = token.trim();
        Self::ALL
            .into_iter()
            .find(|format| {
                format.name().eq_ignore_ascii_case(token)
                    || format.display_name().eq_ignore_ascii_case(token)
            })
            .ok_or_else(|| ArchiveError::UnknownFormat {
                token: token.to_string(),
            })
    }

    /// Detects the format from a file name by its extension.
    ///
    /// The format with the longest matching extension wins, so
    /// `data.tar.gz` resolves to `TarGz` rather than `Gzip`.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::UnknownFormat`] if no extension matches.
    pub fn detect(file_name: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .filter_map(|format| {
                format
                    .extensions()
                    .iter()
                    .filter(|ext| file_name.ends_with(**ext))
                    .map(|ext| ext.len())
                    .max()
                    .map(|len| (format, len))
            })
            .max_by_key(|(_, len)| *len)
            .map(|(format, _)| format)
            .ok_or_else(|| ArchiveError::UnknownFormat {
                token: file_name.to_string(),
            })
    }

    /// Returns a brand-new algorithm instance for this format.
    ///
    /// Instances hold per-run state and are never shared.
    #[must_use]
    pub fn algorithm(self, config: OperationConfig) -> Box<dyn ArchivingAlgorithm> {
        (self.constructor())(config)
    }

    fn constructor(self) -> AlgorithmConstructor {
        match self {
            Self::Zip => new_zip,
            Self::Jar => new_jar,
            Self::Gzip => new_gzip,
            Self::TarGz => new_tar_gz,
            Self::TarBz2 => new_tar_bz2,
            Self::TarLz => new_tar_lz,
        }
    }
}

fn new_zip(config: OperationConfig) -> Box<dyn ArchivingAlgorithm> {
    Box::new(ZipAlgorithm::new(ArchiveFormat::Zip, config))
}

fn new_jar(config: OperationConfig) -> Box<dyn ArchivingAlgorithm> {
    Box::new(ZipAlgorithm::new(ArchiveFormat::Jar, config))
}

fn new_gzip(config: OperationConfig) -> Box<dyn ArchivingAlgorithm> {
    Box::new(GzipAlgorithm::new(config))
}

fn new_tar_gz(config: OperationConfig) -> Box<dyn ArchivingAlgorithm> {
    Box::new(TarAlgorithm::new(Codec::Gzip, config))
}

fn new_tar_bz2(config: OperationConfig) -> Box<dyn ArchivingAlgorithm> {
    Box::new(TarAlgorithm::new(Codec::Bzip2, config))
}

fn new_tar_lz(config: OperationConfig) -> Box<dyn ArchivingAlgorithm> {
    Box::new(TarAlgorithm::new(Codec::Lzma, config))
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({WILDCARD}{})",
            self.display_name(),
            self.default_extension()
        )
    }
}

impl FromStr for ArchiveFormat {
    type Err = ArchiveError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_token(s)
    }
}
