//! Source encodings
//!
//! Python source files declare their encoding in one of two ways: a byte order mark, or a
//! coding directive comment in one of the first two lines (PEP 263). Without either, the
//! file is UTF-8. The BOM is not part of the source text and is stripped.

use super::TokenizeError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::Path;

static CODING_DIRECTIVE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[ \t\x0C]*#.*?coding[:=][ \t]*([-_.a-zA-Z0-9]+)").unwrap());

const BOMS: &[(&[u8], &str)] = &[
    (&[0xEF, 0xBB, 0xBF], "utf-8"),
    (&[0xFF, 0xFE, 0x00, 0x00], "utf-32-le"),
    (&[0x00, 0x00, 0xFE, 0xFF], "utf-32-be"),
    (&[0xFF, 0xFE], "utf-16-le"),
    (&[0xFE, 0xFF], "utf-16-be"),
];

/// Split a leading byte order mark off `bytes`
pub fn strip_bom(bytes: &[u8]) -> (Option<&'static str>, &[u8]) {
    for (bom, encoding) in BOMS {
        if let Some(rest) = bytes.strip_prefix(*bom) {
            return (Some(*encoding), rest);
        }
    }
    (None, bytes)
}

/// The encoding named by a coding directive in the first two lines, normalized
pub fn get_encoding_directive(bytes: &[u8]) -> Option<String> {
    let head: String = bytes.iter().map(|&b| b as char).collect();
    for line in head.split('\n').take(2) {
        if let Some(captures) = CODING_DIRECTIVE.captures(line) {
            return captures.get(1).map(|m| normalize_encoding(m.as_str()));
        }
    }
    None
}

/// Map the common aliases onto the names this module decodes
pub fn normalize_encoding(name: &str) -> String {
    let lower = name.to_ascii_lowercase().replace('_', "-");
    if lower == "utf-8" || lower == "utf8" || lower == "u8" || lower.starts_with("utf-8-") {
        return "utf-8".to_string();
    }
    let latin_1 = ["latin-1", "latin1", "iso-8859-1", "iso8859-1", "l1", "iso-latin-1"];
    if latin_1
        .iter()
        .any(|alias| lower == *alias || lower.starts_with(&format!("{}-", alias)))
    {
        return "latin-1".to_string();
    }
    if lower == "ascii" || lower == "us-ascii" {
        return "ascii".to_string();
    }
    lower
}

/// Decode `bytes` as `encoding`
pub fn decode(bytes: &[u8], encoding: &str) -> Result<String, TokenizeError> {
    let decode_error = |reason: String| TokenizeError::Decode {
        encoding: encoding.to_string(),
        reason,
    };
    match encoding {
        "utf-8" => String::from_utf8(bytes.to_vec()).map_err(|e| decode_error(e.to_string())),
        "latin-1" => Ok(bytes.iter().map(|&b| b as char).collect()),
        "ascii" => match bytes.iter().position(|b| !b.is_ascii()) {
            Some(pos) => Err(decode_error(format!("non-ascii byte at offset {}", pos))),
            None => Ok(bytes.iter().map(|&b| b as char).collect()),
        },
        "utf-16-le" | "utf-16-be" => {
            if bytes.len() % 2 != 0 {
                return Err(decode_error("odd number of bytes".to_string()));
            }
            let units = bytes.chunks_exact(2).map(|pair| {
                if encoding == "utf-16-le" {
                    u16::from_le_bytes([pair[0], pair[1]])
                } else {
                    u16::from_be_bytes([pair[0], pair[1]])
                }
            });
            char::decode_utf16(units)
                .collect::<Result<String, _>>()
                .map_err(|e| decode_error(e.to_string()))
        }
        "utf-32-le" | "utf-32-be" => {
            if bytes.len() % 4 != 0 {
                return Err(decode_error("length is not a multiple of 4".to_string()));
            }
            bytes
                .chunks_exact(4)
                .map(|quad| {
                    let quad = [quad[0], quad[1], quad[2], quad[3]];
                    let code = if encoding == "utf-32-le" {
                        u32::from_le_bytes(quad)
                    } else {
                        u32::from_be_bytes(quad)
                    };
                    char::from_u32(code)
                        .ok_or_else(|| decode_error(format!("invalid code point {:#x}", code)))
                })
                .collect()
        }
        other => Err(TokenizeError::UnknownEncoding(other.to_string())),
    }
}

/// Decode raw file contents, returning `(encoding, text)`
pub fn decode_source(bytes: &[u8]) -> Result<(String, String), TokenizeError> {
    let (bom, rest) = strip_bom(bytes);
    let encoding = match bom {
        Some(encoding) => encoding.to_string(),
        None => get_encoding_directive(rest).unwrap_or_else(|| "utf-8".to_string()),
    };
    let text = decode(rest, &encoding)?;
    Ok((encoding, text))
}

/// Read a source file, returning `(encoding, text)`
pub fn read_file_with_encoding(path: &Path) -> Result<(String, String), TokenizeError> {
    let bytes = fs::read(path).map_err(|e| TokenizeError::Io(format!("{}: {}", path.display(), e)))?;
    decode_source(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_utf8_bom() {
        let (bom, rest) = strip_bom(b"\xEF\xBB\xBFx = 1\n");
        assert_eq!(bom, Some("utf-8"));
        assert_eq!(rest, b"x = 1\n");
    }

    #[test]
    fn test_no_bom() {
        let (bom, rest) = strip_bom(b"x");
        assert_eq!(bom, None);
        assert_eq!(rest, b"x");
    }

    #[test]
    fn test_coding_directive() {
        assert_eq!(
            get_encoding_directive(b"# -*- coding: latin-1 -*-\nx = 1\n"),
            Some("latin-1".to_string())
        );
        assert_eq!(
            get_encoding_directive(b"#!/usr/bin/env python\n# vim: set fileencoding=utf8 :\n"),
            Some("utf-8".to_string())
        );
    }

    #[test]
    fn test_coding_directive_only_in_first_two_lines() {
        assert_eq!(
            get_encoding_directive(b"\n\n# coding: latin-1\n"),
            None
        );
    }

    #[test]
    fn test_decode_latin_1() {
        let (encoding, text) = decode_source(b"# coding: latin-1\ns = '\xE9'\n").unwrap();
        assert_eq!(encoding, "latin-1");
        assert_eq!(text, "# coding: latin-1\ns = '\u{e9}'\n");
    }

    #[test]
    fn test_decode_utf16_with_bom() {
        let (encoding, text) = decode_source(b"\xFF\xFEx\x00").unwrap();
        assert_eq!(encoding, "utf-16-le");
        assert_eq!(text, "x");
    }

    #[test]
    fn test_unknown_encoding() {
        assert_eq!(
            decode_source(b"# coding: klingon\n"),
            Err(TokenizeError::UnknownEncoding("klingon".to_string()))
        );
    }

    #[test]
    fn test_invalid_utf8() {
        assert!(matches!(
            decode_source(b"x = '\xE9'\n"),
            Err(TokenizeError::Decode { .. })
        ));
    }
}
