//! Content-Encoding decoding with a raw-bytes fallback.
//!
//! The fetcher advertises `Accept-Encoding` itself, so response bodies arrive
//! exactly as the server encoded them. Decoding happens here, keyed off the
//! declared `Content-Encoding`. A body that fails to decode is returned
//! unmodified: a mis-declared encoding must not abort an otherwise-successful
//! fetch.

use std::io::Read;

use tracing::debug;

/// Decodes `raw` according to the declared `Content-Encoding`.
///
/// Recognizes `gzip` (and `x-gzip`), `deflate` (zlib-wrapped or raw), and
/// `br`. Unknown encodings, multi-codings, and decode failures all yield the
/// raw bytes unchanged.
#[must_use]
pub fn decode_body(encoding: Option<&str>, raw: &[u8]) -> Vec<u8> {
    let Some(encoding) = encoding else {
        return raw.to_vec();
    };

    // Only single codings are handled; "gzip, br" style stacks are rare in
    // practice and fall through to the raw bytes.
    let coding = encoding.trim().to_ascii_lowercase();
    let decoded = match coding.as_str() {
        "" | "identity" => return raw.to_vec(),
        "gzip" | "x-gzip" => decode_gzip(raw),
        "deflate" => decode_deflate(raw),
        "br" => decode_brotli(raw),
        other => {
            debug!(encoding = %other, "unknown content-encoding, returning raw bytes");
            return raw.to_vec();
        }
    };

    match decoded {
        Some(bytes) => bytes,
        None => {
            debug!(encoding = %coding, "declared encoding failed to decode, returning raw bytes");
            raw.to_vec()
        }
    }
}

fn decode_gzip(raw: &[u8]) -> Option<Vec<u8>> {
    let mut out = Vec::new();
    flate2::read::GzDecoder::new(raw)
        .read_to_end(&mut out)
        .ok()?;
    Some(out)
}

/// HTTP "deflate" is usually a zlib stream, but some servers send raw
/// deflate; browsers accept both, so try both.
fn decode_deflate(raw: &[u8]) -> Option<Vec<u8>> {
    let mut out = Vec::new();
    if flate2::read::ZlibDecoder::new(raw)
        .read_to_end(&mut out)
        .is_ok()
    {
        return Some(out);
    }

    let mut out = Vec::new();
    flate2::read::DeflateDecoder::new(raw)
        .read_to_end(&mut out)
        .ok()?;
    Some(out)
}

fn decode_brotli(raw: &[u8]) -> Option<Vec<u8>> {
    let mut out = Vec::new();
    brotli::Decompressor::new(raw, 4096)
        .read_to_end(&mut out)
        .ok()?;
    Some(out)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io::Write;

    use super::*;

    const PAYLOAD: &[u8] = b"<html><body><img src=\"photo.jpg\"></body></html>";

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut encoder =
            flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    fn zlib(data: &[u8]) -> Vec<u8> {
        let mut encoder =
            flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    fn raw_deflate(data: &[u8]) -> Vec<u8> {
        let mut encoder =
            flate2::write::DeflateEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    fn br(data: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        {
            let mut writer = brotli::CompressorWriter::new(&mut out, 4096, 5, 22);
            writer.write_all(data).unwrap();
        }
        out
    }

    #[test]
    fn test_no_encoding_passes_through() {
        assert_eq!(decode_body(None, PAYLOAD), PAYLOAD);
        assert_eq!(decode_body(Some("identity"), PAYLOAD), PAYLOAD);
    }

    #[test]
    fn test_gzip_body_is_decoded() {
        assert_eq!(decode_body(Some("gzip"), &gzip(PAYLOAD)), PAYLOAD);
        assert_eq!(decode_body(Some("x-gzip"), &gzip(PAYLOAD)), PAYLOAD);
    }

    #[test]
    fn test_gzip_encoding_is_case_insensitive() {
        assert_eq!(decode_body(Some("GZIP"), &gzip(PAYLOAD)), PAYLOAD);
    }

    #[test]
    fn test_deflate_zlib_body_is_decoded() {
        assert_eq!(decode_body(Some("deflate"), &zlib(PAYLOAD)), PAYLOAD);
    }

    #[test]
    fn test_deflate_raw_body_is_decoded() {
        assert_eq!(decode_body(Some("deflate"), &raw_deflate(PAYLOAD)), PAYLOAD);
    }

    #[test]
    fn test_brotli_body_is_decoded() {
        assert_eq!(decode_body(Some("br"), &br(PAYLOAD)), PAYLOAD);
    }

    #[test]
    fn test_mis_declared_encoding_falls_back_to_raw() {
        // Server claims gzip but the body is plain bytes; the fetch must not
        // fail - the raw bytes come back unmodified.
        assert_eq!(decode_body(Some("gzip"), PAYLOAD), PAYLOAD);
        assert_eq!(decode_body(Some("br"), PAYLOAD), PAYLOAD);
        assert_eq!(decode_body(Some("deflate"), PAYLOAD), PAYLOAD);
    }

    #[test]
    fn test_unknown_encoding_falls_back_to_raw() {
        assert_eq!(decode_body(Some("zstd"), PAYLOAD), PAYLOAD);
    }

    #[test]
    fn test_truncated_gzip_falls_back_to_raw() {
        let mut encoded = gzip(PAYLOAD);
        encoded.truncate(encoded.len() / 2);
        assert_eq!(decode_body(Some("gzip"), &encoded), encoded);
    }
}
