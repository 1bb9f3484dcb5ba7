//! Record file encoding
//!
//! Records are RON. Writing optionally compresses with brotli; reading
//! auto-detects the format, so hand-edited plain files load too.

use super::{Record, RecordError};
use std::io::Cursor;

/// Maximum length of a record name
const MAX_NAME_LEN: usize = 256;

/// Serialize a record, brotli-compressed when `compress` is set
pub fn encode_record(record: &Record, compress: bool) -> Result<Vec<u8>, RecordError> {
    validate_record(record)?;

    let config = ron::ser::PrettyConfig::new()
        .depth_limit(3)
        .indentor("  ".to_string());
    let ron_data = ron::ser::to_string_pretty(record, config)
        .map_err(|e| RecordError::Serialization(e.to_string()))?;

    if !compress {
        return Ok(ron_data.into_bytes());
    }

    // quality 6, window 22 - good balance of speed/ratio
    let mut compressed = Vec::new();
    brotli::BrotliCompress(
        &mut Cursor::new(ron_data.as_bytes()),
        &mut compressed,
        &brotli::enc::BrotliEncoderParams {
            quality: 6,
            lgwin: 22,
            ..Default::default()
        },
    )
    .map_err(|e| RecordError::Compression(e.to_string()))?;

    Ok(compressed)
}

/// Deserialize a record from plain or compressed RON
///
/// The first byte picks which format to try first; if that fails the
/// other one is tried before giving up with the first error.
pub fn decode_record(data: &[u8]) -> Result<Record, RecordError> {
    let looks_plain = data
        .first()
        .map(|&b| b == b'(' || b == b'/' || b.is_ascii_whitespace() || b.is_ascii_alphabetic())
        .unwrap_or(false);

    let record = if looks_plain {
        decode_plain(data).or_else(|e| decode_compressed(data).map_err(|_| e))?
    } else {
        decode_compressed(data).or_else(|e| decode_plain(data).map_err(|_| e))?
    };

    validate_record(&record)?;
    Ok(record)
}

fn decode_plain(data: &[u8]) -> Result<Record, RecordError> {
    let text = std::str::from_utf8(data)
        .map_err(|e| RecordError::Serialization(format!("invalid UTF-8: {}", e)))?;
    ron::from_str(text).map_err(|e| RecordError::Serialization(e.to_string()))
}

fn decode_compressed(data: &[u8]) -> Result<Record, RecordError> {
    let mut decompressed = Vec::new();
    brotli::BrotliDecompress(&mut Cursor::new(data), &mut decompressed)
        .map_err(|e| RecordError::Compression(e.to_string()))?;
    decode_plain(&decompressed)
}

/// Checks applied on both write and read, so nothing is stored that
/// cannot be loaded again
fn validate_record(record: &Record) -> Result<(), RecordError> {
    if record.name.len() > MAX_NAME_LEN {
        return Err(RecordError::Validation(format!(
            "record {} name exceeds {} bytes",
            record.id, MAX_NAME_LEN
        )));
    }
    Ok(())
}
