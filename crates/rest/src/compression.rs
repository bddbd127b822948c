//! Bounded gzip stream transform.
//!
//! A symmetric pair of streaming transforms over a header-carrying byte
//! stream envelope ([`Content`]):
//!
//! - [`GzipContent`] compresses: source headers are copied to the output
//!   envelope minus any prior encoding marker, the `gzip` marker is
//!   appended, and the body streams through a compression filter in fixed
//!   chunks. The output length cannot be known without doing the work, so
//!   [`GzipContent::content_length`] reports unknown.
//! - [`GzipCompressedContent`] decompresses: headers are copied minus the
//!   encoding marker, and the body streams through a decompression filter
//!   under an optional output-byte ceiling. The ceiling is the
//!   decompression-bomb defense: the copy loop counts bytes written and
//!   returns [`TransformError::PayloadTooLarge`] before the ceiling would
//!   be exceeded, so the destination never receives more than the
//!   configured number of bytes. A `None` ceiling is an explicit caller
//!   opt-out that copies the whole stream.
//!
//! Both transforms own their streams; drop closes both ends on every exit
//! path, including the ceiling abort.

use std::io::{self, Read, Write};

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use http::HeaderMap;
use http::header::{self, HeaderValue};
use thiserror::Error;

/// Chunk size for the streaming copy loops.
const COPY_CHUNK_SIZE: usize = 8 * 1024;

/// The encoding marker governing whether these transforms apply.
pub const GZIP_ENCODING: &str = "gzip";

/// Errors from the stream transforms.
///
/// All variants abort the one request they occur in; none is process-fatal.
#[derive(Debug, Error)]
pub enum TransformError {
    /// The decompressed payload would exceed the configured ceiling.
    #[error("decompressed payload exceeds the configured maximum of {limit} bytes")]
    PayloadTooLarge {
        /// The configured ceiling in bytes.
        limit: u64,
    },

    /// The compressed input is not a valid gzip stream.
    #[error("corrupt compressed stream: {source}")]
    CorruptStream {
        /// The underlying decode error.
        #[source]
        source: io::Error,
    },

    /// An I/O failure on the underlying source or destination, propagated
    /// unchanged.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Result type for stream transforms.
pub type TransformResult<T> = Result<T, TransformError>;

/// A byte stream with its envelope headers.
#[derive(Debug)]
pub struct Content<R> {
    /// Envelope headers accompanying the stream.
    pub headers: HeaderMap,
    /// The byte stream itself.
    pub body: R,
}

impl<R: Read> Content<R> {
    /// Wraps a stream with its headers.
    pub fn new(headers: HeaderMap, body: R) -> Self {
        Self { headers, body }
    }
}

impl<'a> Content<&'a [u8]> {
    /// Wraps an in-memory byte slice with empty headers.
    pub fn from_bytes(bytes: &'a [u8]) -> Self {
        Self {
            headers: HeaderMap::new(),
            body: bytes,
        }
    }
}

/// The compressing transform: wraps unencoded content and produces a gzip
/// stream on demand.
#[derive(Debug)]
pub struct GzipContent<R> {
    headers: HeaderMap,
    body: R,
}

impl<R: Read> GzipContent<R> {
    /// Wraps `content`, copying its headers minus any prior encoding
    /// marker and appending the gzip marker.
    pub fn new(content: Content<R>) -> Self {
        let mut headers = content.headers;
        headers.remove(header::CONTENT_ENCODING);
        headers.insert(
            header::CONTENT_ENCODING,
            HeaderValue::from_static(GZIP_ENCODING),
        );
        // A stale length would describe the uncompressed body.
        headers.remove(header::CONTENT_LENGTH);
        Self {
            headers,
            body: content.body,
        }
    }

    /// The output envelope headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// The compressed length is unknown until the stream has been copied.
    pub fn content_length(&self) -> Option<u64> {
        None
    }

    /// Streams the body through the compression filter into `dst`.
    ///
    /// Returns the number of uncompressed bytes consumed from the source.
    /// Source and destination I/O errors propagate unchanged.
    pub fn write_to<W: Write>(mut self, dst: W) -> TransformResult<u64> {
        let mut encoder = GzEncoder::new(dst, Compression::default());
        let copied = io::copy(&mut self.body, &mut encoder)?;
        let mut dst = encoder.finish()?;
        dst.flush()?;
        Ok(copied)
    }
}

/// The decompressing transform: wraps a gzip stream and produces the
/// original bytes, bounded by an optional output ceiling.
#[derive(Debug)]
pub struct GzipCompressedContent<R> {
    headers: HeaderMap,
    body: R,
    max_decompressed_bytes: Option<u64>,
}

impl<R: Read> GzipCompressedContent<R> {
    /// Wraps compressed `content`, copying its headers minus the encoding
    /// marker. `max_decompressed_bytes` is the output ceiling; `None`
    /// explicitly opts out of the bound.
    pub fn new(content: Content<R>, max_decompressed_bytes: Option<u64>) -> Self {
        let mut headers = content.headers;
        headers.remove(header::CONTENT_ENCODING);
        headers.remove(header::CONTENT_LENGTH);
        Self {
            headers,
            body: content.body,
            max_decompressed_bytes,
        }
    }

    /// The output envelope headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Streams the decompressed body into `dst`.
    ///
    /// Returns the number of decompressed bytes written. The ceiling check
    /// is an ordinary control branch ahead of each write: a chunk that
    /// would push the total past the ceiling is never written, so `dst`
    /// receives at most `max_decompressed_bytes` bytes before the abort.
    pub fn write_to<W: Write>(self, mut dst: W) -> TransformResult<u64> {
        let mut decoder = GzDecoder::new(self.body);
        let mut buf = [0u8; COPY_CHUNK_SIZE];
        let mut written: u64 = 0;

        loop {
            let n = match decoder.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) => return Err(classify_decode_error(e)),
            };
            if let Some(limit) = self.max_decompressed_bytes
                && written + n as u64 > limit
            {
                return Err(TransformError::PayloadTooLarge { limit });
            }
            dst.write_all(&buf[..n])?;
            written += n as u64;
        }

        dst.flush()?;
        Ok(written)
    }
}

/// The decoder surfaces malformed deflate data as I/O errors with these
/// kinds; a truncated stream reads as an unexpected EOF. Anything else is a
/// genuine source I/O failure and propagates unchanged.
fn classify_decode_error(e: io::Error) -> TransformError {
    match e.kind() {
        io::ErrorKind::InvalidInput | io::ErrorKind::InvalidData | io::ErrorKind::UnexpectedEof => {
            TransformError::CorruptStream { source: e }
        }
        _ => TransformError::Io(e),
    }
}

/// Compresses an in-memory payload. Convenience over [`GzipContent`] for
/// the response path, which already holds serialized bytes.
pub fn gzip_bytes(bytes: &[u8]) -> TransformResult<Vec<u8>> {
    let mut out = Vec::new();
    GzipContent::new(Content::from_bytes(bytes)).write_to(&mut out)?;
    Ok(out)
}

/// Decompresses an in-memory payload under an optional ceiling.
/// Convenience over [`GzipCompressedContent`] for the request path.
pub fn gunzip_bytes(bytes: &[u8], max_decompressed_bytes: Option<u64>) -> TransformResult<Vec<u8>> {
    let mut out = Vec::new();
    GzipCompressedContent::new(Content::from_bytes(bytes), max_decompressed_bytes)
        .write_to(&mut out)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A destination that panics the moment it receives more bytes than
    /// the test allows, proving the abort happens before the bomb
    /// materializes.
    struct BoundedSink {
        received: u64,
        hard_limit: u64,
    }

    impl Write for BoundedSink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.received += buf.len() as u64;
            assert!(
                self.received <= self.hard_limit,
                "destination received {} bytes, hard limit {}",
                self.received,
                self.hard_limit
            );
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_round_trip_without_ceiling() {
        let payload: Vec<u8> = (0..100_000u32).map(|i| (i % 251) as u8).collect();
        let compressed = gzip_bytes(&payload).unwrap();
        assert!(compressed.len() < payload.len());

        let decompressed = gunzip_bytes(&compressed, None).unwrap();
        assert_eq!(decompressed, payload);
    }

    #[test]
    fn test_round_trip_empty_payload() {
        let compressed = gzip_bytes(&[]).unwrap();
        let decompressed = gunzip_bytes(&compressed, None).unwrap();
        assert!(decompressed.is_empty());
    }

    #[test]
    fn test_ceiling_aborts_before_bomb_materializes() {
        // 4 MiB of zeros compresses to a few KiB.
        let bomb_plain = vec![0u8; 4 * 1024 * 1024];
        let bomb = gzip_bytes(&bomb_plain).unwrap();
        assert!(bomb.len() < 64 * 1024);

        let limit = 1024u64;
        let sink = BoundedSink {
            received: 0,
            hard_limit: limit,
        };
        let content = GzipCompressedContent::new(Content::from_bytes(&bomb), Some(limit));
        let err = content.write_to(sink).unwrap_err();
        assert!(matches!(err, TransformError::PayloadTooLarge { limit: 1024 }));
    }

    #[test]
    fn test_payload_exactly_at_ceiling_passes() {
        let payload = vec![7u8; 2048];
        let compressed = gzip_bytes(&payload).unwrap();
        let decompressed = gunzip_bytes(&compressed, Some(2048)).unwrap();
        assert_eq!(decompressed, payload);
    }

    #[test]
    fn test_corrupt_stream_is_classified() {
        let garbage = b"this is not a gzip stream at all";
        let err = gunzip_bytes(garbage, None).unwrap_err();
        assert!(matches!(err, TransformError::CorruptStream { .. }));

        // A valid stream cut short is also corrupt, not a size problem.
        let mut truncated = gzip_bytes(&vec![3u8; 10_000]).unwrap();
        truncated.truncate(truncated.len() / 2);
        let err = gunzip_bytes(&truncated, None).unwrap_err();
        assert!(matches!(err, TransformError::CorruptStream { .. }));
    }

    #[test]
    fn test_encode_replaces_encoding_marker() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/fhir+json"));
        headers.insert(header::CONTENT_ENCODING, HeaderValue::from_static("identity"));

        let content = GzipContent::new(Content::new(headers, &b"{}"[..]));
        assert_eq!(
            content.headers().get(header::CONTENT_ENCODING).unwrap(),
            GZIP_ENCODING
        );
        assert_eq!(
            content.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/fhir+json"
        );
        assert_eq!(content.content_length(), None);
    }

    #[test]
    fn test_decode_strips_encoding_marker() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_ENCODING, HeaderValue::from_static(GZIP_ENCODING));
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/fhir+json"));

        let content = GzipCompressedContent::new(Content::new(headers, &[][..]), None);
        assert!(content.headers().get(header::CONTENT_ENCODING).is_none());
        assert!(content.headers().get(header::CONTENT_TYPE).is_some());
    }
}
