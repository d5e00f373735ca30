//! Line decoding and `key:value` parsing

use contracts::ParsedSample;

use crate::error::{IngestionError, Result};

/// Decode raw bytes read from the link into a line
///
/// The device speaks ASCII; any other byte rejects the whole line. Trailing whitespace,
/// including the `\r\n` terminator, is stripped.
pub fn decode_line(bytes: &[u8]) -> Result<String> {
    if let Some(offset) = bytes.iter().position(|b| !b.is_ascii()) {
        return Err(IngestionError::Decode {
            byte: bytes[offset],
            offset,
        });
    }
    let text: String = bytes.iter().map(|&b| b as char).collect();
    Ok(text.trim_end().to_string())
}

/// Parse a comma-separated `key:value` line
///
/// Tokens that do not split into exactly two non-empty parts on `:` are discarded.
/// Values are kept as text; a later occurrence of a key overwrites the earlier one.
pub fn parse_line(line: &str) -> ParsedSample {
    let mut sample = ParsedSample::new();
    for token in line.split(',') {
        let mut parts = token.split(':');
        if let (Some(key), Some(value), None) = (parts.next(), parts.next(), parts.next()) {
            if !key.is_empty() && !value.is_empty() {
                sample.insert(key, value);
            }
        }
    }
    sample
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_well_formed() {
        let sample = parse_line("a:1,b:2.5,time:1000");
        let pairs: Vec<_> = sample.iter().collect();
        assert_eq!(pairs, vec![("a", "1"), ("b", "2.5"), ("time", "1000")]);
    }

    #[test]
    fn test_parse_drops_malformed_token() {
        let sample = parse_line("a:1,bad,time:5");
        let pairs: Vec<_> = sample.iter().collect();
        assert_eq!(pairs, vec![("a", "1"), ("time", "5")]);
    }

    #[test]
    fn test_parse_last_write_wins() {
        let sample = parse_line("x:1,x:2");
        assert_eq!(sample.len(), 1);
        assert_eq!(sample.get("x"), Some("2"));
    }

    #[test]
    fn test_parse_rejects_extra_colons_and_empty_parts() {
        let sample = parse_line("a:b:c,:1,k:,ok:3");
        let pairs: Vec<_> = sample.iter().collect();
        assert_eq!(pairs, vec![("ok", "3")]);
    }

    #[test]
    fn test_parse_no_valid_tokens() {
        let sample = parse_line("READY");
        assert!(sample.is_empty());
        assert!(!sample.has_time());

        assert!(parse_line("").is_empty());
    }

    #[test]
    fn test_parse_keeps_malformed_numbers_as_text() {
        // Numeric validation is deferred to dispatch
        let sample = parse_line("temp:abc,time:10");
        assert_eq!(sample.get("temp"), Some("abc"));
        assert_eq!(sample.device_millis().unwrap(), Some(10));
    }

    #[test]
    fn test_decode_strips_terminator() {
        assert_eq!(decode_line(b"temp:1,time:5\r\n").unwrap(), "temp:1,time:5");
        assert_eq!(decode_line(b"READY\n").unwrap(), "READY");
        assert_eq!(decode_line(b"").unwrap(), "");
    }

    #[test]
    fn test_decode_rejects_non_ascii() {
        let err = decode_line(b"temp:\xff\n").unwrap_err();
        assert!(matches!(
            err,
            IngestionError::Decode {
                byte: 0xff,
                offset: 5
            }
        ));
    }
}
