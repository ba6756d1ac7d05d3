//! Text decoding with BOM/charset detection.
//!
//! Strategy:
//! 1. BOM markers (UTF-8, UTF-16 LE/BE)
//! 2. Strict UTF-8 (fast path for most source files)
//! 3. `chardetng` guess, decoded with replacement characters

use chardetng::EncodingDetector;
use encoding_rs::{Encoding, UTF_16BE, UTF_16LE, UTF_8};

const DEFAULT_SAMPLE_SIZE: usize = 8192;

/// Detect the encoding of a byte buffer from its first few KiB.
pub fn detect_encoding(bytes: &[u8]) -> &'static Encoding {
    let sample = &bytes[..bytes.len().min(DEFAULT_SAMPLE_SIZE)];

    if let Some((encoding, _)) = Encoding::for_bom(sample) {
        return encoding;
    }

    if std::str::from_utf8(bytes).is_ok() {
        return UTF_8;
    }

    let mut detector = EncodingDetector::new();
    detector.feed(sample, bytes.len() <= DEFAULT_SAMPLE_SIZE);
    detector.guess(None, true)
}

/// Decode bytes to a `String`, never failing. Invalid sequences become U+FFFD.
pub fn decode_bytes(bytes: &[u8]) -> String {
    let encoding = detect_encoding(bytes);
    // `decode` sniffs and strips a BOM itself.
    let (decoded, _used, _had_errors) = encoding.decode(bytes);
    decoded.into_owned()
}

/// Heuristic binary check: a null byte outside UTF-16 content, or under 70%
/// printable ASCII in the sample.
pub fn looks_binary(bytes: &[u8]) -> bool {
    let sample = &bytes[..bytes.len().min(DEFAULT_SAMPLE_SIZE)];
    if sample.is_empty() {
        return false;
    }

    if let Some((encoding, _)) = Encoding::for_bom(sample) {
        if encoding == UTF_16LE || encoding == UTF_16BE {
            return false;
        }
    }

    if sample.contains(&0) {
        return true;
    }

    if std::str::from_utf8(sample).is_ok() {
        return false;
    }

    let printable_count = sample
        .iter()
        .filter(|&&b| (32..=126).contains(&b) || b == 9 || b == 10 || b == 13)
        .count();

    (printable_count as f64 / sample.len() as f64) < 0.70
}
