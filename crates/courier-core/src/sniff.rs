//! Content-type sniffing
//!
//! Implements the subset of the WHATWG MIME sniffing algorithm that servers
//! use to default a missing `Content-Type`: at most the first 512 bytes are
//! inspected, and the result always names a valid MIME type, falling back to
//! `application/octet-stream`.

use once_cell::sync::Lazy;
use regex::Regex;

/// Number of leading bytes considered when sniffing
pub const SNIFF_LEN: usize = 512;

const TEXT_PLAIN_UTF8: &str = "text/plain; charset=utf-8";
const OCTET_STREAM: &str = "application/octet-stream";
const APPLICATION_JSON: &str = "application/json";

static CHARSET_PARAM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(;\s?charset=.*)").expect("charset pattern is valid"));

enum Signature {
    /// Case-insensitive HTML tag, must be followed by a space or `>`
    Html(&'static [u8]),
    /// Exact prefix after optional leading whitespace
    Text(&'static [u8], &'static str),
    /// Exact prefix at offset zero
    Exact(&'static [u8], &'static str),
    /// Prefix compared through a byte mask
    Masked {
        mask: &'static [u8],
        pattern: &'static [u8],
        content_type: &'static str,
    },
}

const HTML_TAGS: &[&[u8]] = &[
    b"<!DOCTYPE HTML",
    b"<HTML",
    b"<HEAD",
    b"<SCRIPT",
    b"<IFRAME",
    b"<H1",
    b"<DIV",
    b"<FONT",
    b"<TABLE",
    b"<A",
    b"<STYLE",
    b"<TITLE",
    b"<B",
    b"<BODY",
    b"<BR",
    b"<P",
    b"<!--",
];

static SIGNATURES: Lazy<Vec<Signature>> = Lazy::new(|| {
    let mut signatures: Vec<Signature> = HTML_TAGS.iter().map(|&tag| Signature::Html(tag)).collect();
    signatures.extend([
        Signature::Text(b"<?xml", "text/xml; charset=utf-8"),
        Signature::Exact(b"%PDF-", "application/pdf"),
        Signature::Exact(b"%!PS-Adobe-", "application/postscript"),
        Signature::Exact(b"\xFE\xFF", "text/plain; charset=utf-16be"),
        Signature::Exact(b"\xFF\xFE", "text/plain; charset=utf-16le"),
        Signature::Exact(b"\xEF\xBB\xBF", TEXT_PLAIN_UTF8),
        Signature::Exact(b"\x00\x00\x01\x00", "image/x-icon"),
        Signature::Exact(b"\x00\x00\x02\x00", "image/x-icon"),
        Signature::Exact(b"BM", "image/bmp"),
        Signature::Exact(b"GIF87a", "image/gif"),
        Signature::Exact(b"GIF89a", "image/gif"),
        Signature::Masked {
            mask: b"\xFF\xFF\xFF\xFF\x00\x00\x00\x00\xFF\xFF\xFF\xFF\xFF\xFF",
            pattern: b"RIFF\x00\x00\x00\x00WEBPVP",
            content_type: "image/webp",
        },
        Signature::Exact(b"\x89PNG\x0D\x0A\x1A\x0A", "image/png"),
        Signature::Exact(b"\xFF\xD8\xFF", "image/jpeg"),
        Signature::Masked {
            mask: b"\xFF\xFF\xFF\xFF\x00\x00\x00\x00\xFF\xFF\xFF\xFF",
            pattern: b"RIFF\x00\x00\x00\x00WAVE",
            content_type: "audio/wave",
        },
        Signature::Exact(b"ID3", "audio/mpeg"),
        Signature::Exact(b"OggS\x00", "application/ogg"),
        Signature::Exact(b"\x1A\x45\xDF\xA3", "video/webm"),
        Signature::Exact(b"\x1F\x8B\x08", "application/x-gzip"),
        Signature::Exact(b"PK\x03\x04", "application/zip"),
        Signature::Exact(b"Rar!\x1A\x07\x00", "application/x-rar-compressed"),
        Signature::Exact(b"Rar!\x1A\x07\x01\x00", "application/x-rar-compressed"),
        Signature::Exact(b"\x00\x61\x73\x6D", "application/wasm"),
    ]);
    signatures
});

impl Signature {
    fn matches(&self, data: &[u8], first_non_ws: usize) -> Option<&'static str> {
        match self {
            Signature::Html(tag) => {
                let data = &data[first_non_ws..];
                if data.len() < tag.len() + 1 {
                    return None;
                }
                let prefix_matches = tag.iter().zip(data).all(|(&expected, &actual)| {
                    if expected.is_ascii_uppercase() {
                        actual.to_ascii_uppercase() == expected
                    } else {
                        actual == expected
                    }
                });
                let terminated = matches!(data[tag.len()], b' ' | b'>');
                (prefix_matches && terminated).then_some("text/html; charset=utf-8")
            }
            Signature::Text(prefix, content_type) => {
                data[first_non_ws..].starts_with(prefix).then_some(*content_type)
            }
            Signature::Exact(prefix, content_type) => {
                data.starts_with(prefix).then_some(*content_type)
            }
            Signature::Masked {
                mask,
                pattern,
                content_type,
            } => {
                if data.len() < pattern.len() {
                    return None;
                }
                let matched = pattern
                    .iter()
                    .zip(mask.iter())
                    .zip(data)
                    .all(|((&p, &m), &d)| d & m == p);
                matched.then_some(*content_type)
            }
        }
    }
}

fn is_whitespace(byte: u8) -> bool {
    matches!(byte, b'\t' | b'\n' | b'\x0C' | b'\r' | b' ')
}

fn is_binary(byte: u8) -> bool {
    matches!(byte, 0x00..=0x08 | 0x0B | 0x0E..=0x1A | 0x1C..=0x1F)
}

fn is_mp4(data: &[u8]) -> bool {
    if data.len() < 12 {
        return false;
    }
    let box_size = u32::from_be_bytes([data[0], data[1], data[2], data[3]]) as usize;
    if box_size % 4 != 0 || data.len() < box_size || &data[4..8] != b"ftyp" {
        return false;
    }
    (8..box_size)
        .step_by(4)
        .filter(|&offset| offset != 12)
        .any(|offset| data.get(offset..offset + 3) == Some(b"mp4".as_slice()))
}

/// Determine the content type of `data`
///
/// Always returns a valid MIME type; unrecognized binary data yields
/// `application/octet-stream`.
pub fn detect_content_type(data: &[u8]) -> &'static str {
    let data = &data[..data.len().min(SNIFF_LEN)];
    let first_non_ws = data
        .iter()
        .position(|&byte| !is_whitespace(byte))
        .unwrap_or(data.len());

    if let Some(content_type) = SIGNATURES
        .iter()
        .find_map(|signature| signature.matches(data, first_non_ws))
    {
        return content_type;
    }

    if is_mp4(data) {
        return "video/mp4";
    }

    if data[first_non_ws..].iter().copied().any(is_binary) {
        OCTET_STREAM
    } else {
        TEXT_PLAIN_UTF8
    }
}

/// Build a JSON content type that keeps the charset sniffed from `body`
///
/// `{"a":1}` sniffs as `text/plain; charset=utf-8`, so the result is
/// `application/json; charset=utf-8`.
pub fn json_content_type(body: &[u8]) -> String {
    let sniffed = detect_content_type(body);
    match CHARSET_PARAM.find(sniffed) {
        Some(charset) => format!("{APPLICATION_JSON}{}", charset.as_str()),
        None => APPLICATION_JSON.to_string(),
    }
}
