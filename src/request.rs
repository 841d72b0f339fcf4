//! Request input: query tokenizer, percent coding, and path segments.
//!
//! Keys are lowercased here so every dialect can match them directly;
//! values are left exactly as decoded.

use alloc::borrow::ToOwned;
use alloc::string::String;
use alloc::vec::Vec;

/// One decoded `key=value` pair from the query string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryPair {
    /// Lowercased, percent-decoded key.
    pub key: String,
    /// Percent-decoded value. Case is preserved.
    pub value: String,
}

/// The raw transformation request as seen by the resolution pipeline.
///
/// Holds the decoded query pairs (in request order) and the decoded path
/// segments. Empty segments from leading, trailing, or doubled slashes are
/// dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Request {
    path: String,
    segments: Vec<String>,
    query: Vec<QueryPair>,
}

impl Request {
    /// Build a request from a path and a raw query string (with or without leading `?`).
    pub fn new(path: &str, query: &str) -> Self {
        let segments = path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(percent_decode)
            .collect();
        let query = split_query(query)
            .map(|pair| {
                let (raw_key, raw_value) = split_pair(pair);
                QueryPair {
                    key: percent_decode(raw_key).to_ascii_lowercase(),
                    value: percent_decode(raw_value),
                }
            })
            .collect();
        Self {
            path: path.to_owned(),
            segments,
            query,
        }
    }

    /// Build a request from a combined `path?query` string.
    pub fn from_uri(uri: &str) -> Self {
        match uri.split_once('?') {
            Some((path, query)) => Self::new(path, query),
            None => Self::new(uri, ""),
        }
    }

    /// The raw path as supplied.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Decoded, non-empty path segments.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Decoded query pairs in request order.
    pub fn query(&self) -> &[QueryPair] {
        &self.query
    }

    /// Iterate query keys.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.query.iter().map(|p| p.key.as_str())
    }

    /// Rebuild the path without the segments at the given indices.
    ///
    /// Keeps a leading slash if the original path had one.
    pub fn path_without(&self, consumed: &[usize]) -> String {
        let mut out = String::with_capacity(self.path.len());
        for (i, seg) in self.segments.iter().enumerate() {
            if consumed.contains(&i) {
                continue;
            }
            if !out.is_empty() || self.path.starts_with('/') {
                out.push('/');
            }
            out.push_str(seg);
        }
        if out.is_empty() && self.path.starts_with('/') {
            out.push('/');
        }
        out
    }
}

// ---- Tokenizer ----

/// Non-empty `&`-separated pairs. A leading `?` is ignored.
pub(crate) fn split_query(query: &str) -> impl Iterator<Item = &str> {
    let query = query.strip_prefix('?').unwrap_or(query);
    query.split('&').filter(|s| !s.is_empty())
}

/// `key=value` at the first `=`. A bare key has an empty value.
pub(crate) fn split_pair(pair: &str) -> (&str, &str) {
    match pair.split_once('=') {
        Some((k, v)) => (k, v),
        None => (pair, ""),
    }
}

/// Decode `%XX` escapes, and `+` as a space.
///
/// Invalid escapes are kept literally; invalid UTF-8 is replaced.
pub fn percent_decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b'%' if i + 2 < bytes.len() => {
                if let (Some(hi), Some(lo)) = (hex_digit(bytes[i + 1]), hex_digit(bytes[i + 2])) {
                    out.push(hi << 4 | lo);
                    i += 3;
                } else {
                    out.push(b'%');
                    i += 1;
                }
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Percent-encode a query component. Unreserved characters pass through.
pub fn percent_encode(s: &str) -> String {
    const HEX: &[u8; 16] = b"0123456789ABCDEF";
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char);
            }
            _ => {
                out.push('%');
                out.push(HEX[(b >> 4) as usize] as char);
                out.push(HEX[(b & 0x0F) as usize] as char);
            }
        }
    }
    out
}

fn hex_digit(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}
