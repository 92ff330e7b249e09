//! Body digests compatible with services that hash `json.dumps` output.
//!
//! Those services serialize with `", "` and `": "` separators, escape every
//! non-ASCII character as `\uXXXX` (surrogate pairs above the BMP) and keep
//! key order. The digest is the lower-case hex MD5 of that text.

use std::io::{self, Write};

use serde::Serialize;
use serde_json::ser::{Formatter, Serializer};
use serde_json::Value;

/// `serde_json` formatter producing the separators and escapes above.
#[derive(Debug, Default, Clone, Copy)]
pub struct SpacedAsciiFormatter;

impl Formatter for SpacedAsciiFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        writer.write_all(b": ")
    }

    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        for c in fragment.chars() {
            if c.is_ascii() && c != '\x7f' {
                writer.write_all(&[c as u8])?;
                continue;
            }
            let mut units = [0u16; 2];
            for unit in c.encode_utf16(&mut units) {
                write!(writer, "\\u{unit:04x}")?;
            }
        }
        Ok(())
    }
}

/// Serialize `value` in the spaced, ASCII-only form.
pub fn to_spaced_ascii(value: &Value) -> String {
    let mut out = Vec::new();
    let mut serializer = Serializer::with_formatter(&mut out, SpacedAsciiFormatter);
    // Writing into a Vec cannot fail and a Value always serializes.
    if value.serialize(&mut serializer).is_err() {
        return String::new();
    }
    // Every byte written is ASCII.
    String::from_utf8_lossy(&out).into_owned()
}

/// Hex MD5 of arbitrary bytes.
pub fn md5_hex(bytes: impl AsRef<[u8]>) -> String {
    hex::encode(*md5::compute(bytes))
}

/// Digest of a request body. An empty body hashes as `{}`.
///
/// Returns `None` when the body is not JSON.
pub fn body_digest(body: &[u8]) -> Option<String> {
    let value = if body.iter().all(u8::is_ascii_whitespace) {
        Value::Object(Default::default())
    } else {
        serde_json::from_slice(body).ok()?
    };
    Some(md5_hex(to_spaced_ascii(&value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_spaced_ascii() {
        let value = json!({"key": "value", "list": [1, 2.5, null], "nested": {"b": true, "a": "x"}});
        assert_eq!(
            to_spaced_ascii(&value),
            r#"{"key": "value", "list": [1, 2.5, null], "nested": {"b": true, "a": "x"}}"#
        );
    }

    #[test]
    fn test_non_ascii_escaped() {
        assert_eq!(to_spaced_ascii(&json!("café")), r#""caf\u00e9""#);
        assert_eq!(to_spaced_ascii(&json!("😀")), r#""\ud83d\ude00""#);
        assert_eq!(to_spaced_ascii(&json!("a\"b\n\u{7f}")), r#""a\"b\n\u007f""#);
    }

    #[test]
    fn test_body_digest() {
        assert_eq!(body_digest(b""), Some(md5_hex("{}")));
        assert_eq!(body_digest(b"{}"), Some("99914b932bd37a50b983c5e7c90ae93b".to_string()));
        assert_eq!(
            body_digest(br#"{"key":"value"}"#),
            Some(md5_hex(r#"{"key": "value"}"#))
        );
        assert_eq!(body_digest(b"key=value"), None);
    }
}
