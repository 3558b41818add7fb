//! Compressor streams wrapped around tar archives.
//!
//! Each [`Codec`] knows how to build an encoder over the output file, a
//! decoder over the raw archive bytes, and how to recognize its own stream
//! header before any extraction starts.

use std::fs::File;
use std::io;
use std::io::Read;
use std::io::Seek;
use std::io::SeekFrom;
use std::io::Write;

use bzip2::read::BzDecoder;
use bzip2::write::BzEncoder;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use xz2::read::XzDecoder;
use xz2::stream::LzmaOptions;
use xz2::stream::Stream;
use xz2::write::XzEncoder;

use crate::ArchiveError;
use crate::CompressionLevel;
use crate::Result;

/// Gzip member magic.
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Bzip2 stream magic.
const BZIP2_MAGIC: [u8; 3] = *b"BZh";

/// Size of the LZMA_Alone header: properties, dictionary size, length.
const LZMA_HEADER_LEN: usize = 13;

/// Largest valid LZMA properties byte: `(pb * 5 + lp) * 9 + lc` with
/// `lc <= 8`, `lp <= 4`, `pb <= 4`.
const LZMA_MAX_PROPERTIES: u8 = 224;

/// Decoder memory limit; LZMA_Alone streams carry their own dictionary size.
const LZMA_MEMORY_LIMIT: u64 = u64::MAX;

/// Compressor stream codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Codec {
    /// Deflate in a gzip container.
    Gzip,
    /// Bzip2.
    Bzip2,
    /// Legacy LZMA_Alone (`.lzma`) container.
    Lzma,
}

/// Compressing writer that can be finished explicitly.
///
/// Finishing flushes the trailer; dropping an encoder without finishing it
/// may truncate the stream.
pub trait Encoder: Write + Send {
    /// Writes the stream trailer and returns the underlying file.
    fn finish_stream(self: Box<Self>) -> io::Result<File>;
}

impl Encoder for GzEncoder<File> {
    fn finish_stream(self: Box<Self>) -> io::Result<File> {
        self.finish()
    }
}

impl Encoder for BzEncoder<File> {
    fn finish_stream(self: Box<Self>) -> io::Result<File> {
        self.finish()
    }
}

impl Encoder for XzEncoder<File> {
    fn finish_stream(self: Box<Self>) -> io::Result<File> {
        self.finish()
    }
}

impl Codec {
    /// Short codec name used in errors and logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Gzip => "gzip",
            Self::Bzip2 => "bzip2",
            Self::Lzma => "lzma",
        }
    }

    /// Builds an encoder writing into `file` at `level`.
    pub fn encoder(self, file: File, level: CompressionLevel) -> Result<Box<dyn Encoder>> {
        Ok(match self {
            Self::Gzip => Box::new(GzEncoder::new(file, level.to_flate2())),
            Self::Bzip2 => Box::new(BzEncoder::new(file, level.to_bzip2())),
            Self::Lzma => {
                let options = LzmaOptions::new_preset(level.to_lzma_preset())
                    .map_err(|e| self.stream_error(&e))?;
                let stream =
                    Stream::new_lzma_encoder(&options).map_err(|e| self.stream_error(&e))?;
                Box::new(XzEncoder::new_stream(file, stream))
            }
        })
    }

    /// Builds a decoder reading compressed bytes from `reader`.
    pub fn decoder<'a, R: Read + 'a>(self, reader: R) -> Result<Box<dyn Read + 'a>> {
        Ok(match self {
            Self::Gzip => Box::new(GzDecoder::new(reader)),
            Self::Bzip2 => Box::new(BzDecoder::new(reader)),
            Self::Lzma => {
                let stream = Stream::new_lzma_decoder(LZMA_MEMORY_LIMIT)
                    .map_err(|e| self.stream_error(&e))?;
                Box::new(XzDecoder::new_stream(reader, stream))
            }
        })
    }

    /// Verifies that `file` starts with this codec's stream header, then
    /// rewinds it.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::Compressor`] if the header is missing or
    /// malformed, including for files shorter than the header.
    pub fn check_header(self, file: &mut File) -> Result<()> {
        let mut header = [0u8; LZMA_HEADER_LEN];
        let needed = match self {
            Self::Gzip => GZIP_MAGIC.len(),
            Self::Bzip2 => BZIP2_MAGIC.len(),
            Self::Lzma => LZMA_HEADER_LEN,
        };
        let read = read_up_to(file, &mut header[..needed])?;
        file.seek(SeekFrom::Start(0))?;

        let header = &header[..read];
        let valid = read == needed
            && match self {
                Self::Gzip => header == GZIP_MAGIC,
                Self::Bzip2 => header == BZIP2_MAGIC,
                Self::Lzma => lzma_properties_valid(header[0]),
            };
        if valid {
            Ok(())
        } else {
            Err(ArchiveError::Compressor {
                codec: self.name(),
                reason: format!("missing {} stream header", self.name()),
            })
        }
    }

    fn stream_error(self, err: &xz2::stream::Error) -> ArchiveError {
        ArchiveError::Compressor {
            codec: self.name(),
            reason: err.to_string(),
        }
    }
}

/// Decodes the LZMA properties byte and checks `lc + lp <= 4`.
const fn lzma_properties_valid(byte: u8) -> bool {
    if byte > LZMA_MAX_PROPERTIES {
        return false;
    }
    let lc = byte % 9;
    let lp = (byte / 9) % 5;
    lc + lp <= 4
}

/// Reads until `buf` is full or EOF, returning the byte count.
fn read_up_to<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::tempfile;

    fn compressed(codec: Codec, data: &[u8]) -> File {
        let mut encoder = codec.encoder(tempfile().unwrap(), CompressionLevel::DEFAULT).unwrap();
        encoder.write_all(data).unwrap();
        let mut file = encoder.finish_stream().unwrap();
        file.seek(SeekFrom::Start(0)).unwrap();
        file
    }

    #[test]
    fn test_codecs_decode_their_own_output() {
        let data = b"the quick brown fox jumps over the lazy dog".repeat(50);
        for codec in [Codec::Gzip, Codec::Bzip2, Codec::Lzma] {
            let mut file = compressed(codec, &data);
            codec.check_header(&mut file).unwrap();

            let mut decoded = Vec::new();
            codec
                .decoder(&mut file)
                .unwrap()
                .read_to_end(&mut decoded)
                .unwrap();
            assert_eq!(decoded, data, "{}", codec.name());
        }
    }

    #[test]
    fn test_header_mismatch_is_compressor_error() {
        let mut file = compressed(Codec::Gzip, b"data");
        let err = Codec::Bzip2.check_header(&mut file).unwrap_err();
        assert!(matches!(err, ArchiveError::Compressor { codec: "bzip2", .. }));

        let mut file = compressed(Codec::Bzip2, b"data");
        assert!(Codec::Gzip.check_header(&mut file).is_err());
    }

    #[test]
    fn test_short_file_is_rejected() {
        let mut file = tempfile().unwrap();
        file.write_all(&[0x5d, 0, 0]).unwrap();
        file.seek(SeekFrom::Start(0)).unwrap();
        assert!(Codec::Lzma.check_header(&mut file).is_err());

        let mut empty = tempfile().unwrap();
        assert!(Codec::Gzip.check_header(&mut empty).is_err());
    }

    #[test]
    fn test_lzma_properties() {
        assert!(lzma_properties_valid(0x5d));
        assert!(!lzma_properties_valid(b't'));
        assert!(!lzma_properties_valid(225));
    }

    #[test]
    fn test_check_header_rewinds() {
        let mut file = compressed(Codec::Gzip, b"data");
        Codec::Gzip.check_header(&mut file).unwrap();
        assert_eq!(file.stream_position().unwrap(), 0);
    }
}
