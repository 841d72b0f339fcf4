//! Background color parsing and normalization.
//!
//! Every dialect spells colors differently (`bg=fff`, `background=%23FF0000`,
//! `im=BackgroundColor,color=rgb(255,0,0)`), while the downstream API wants one
//! spelling. Colors are parsed into [`Rgba`] and written back as lowercase hex.

use alloc::format;
use alloc::string::String;

/// An 8-bit sRGB color with alpha.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    /// Lowercase `#rrggbb`, or `#rrggbbaa` when not fully opaque.
    pub fn to_hex(self) -> String {
        if self.a == 0xFF {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

/// Parse a color string into [`Rgba`].
///
/// Accepts:
/// - `#RGB`, `#RGBA`, `#RRGGBB`, `#RRGGBBAA`, with or without `#`
/// - `rgb(r,g,b)` and `rgba(r,g,b,a)` with `a` in `0..=1`
/// - the basic CSS named colors plus `transparent` (case-insensitive)
pub fn parse_color(s: &str) -> Option<Rgba> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    let lower = s.to_ascii_lowercase();

    if let Some(c) = parse_functional(&lower) {
        return Some(c);
    }
    if let Some(c) = lookup_named(&lower) {
        return Some(c);
    }
    parse_hex(lower.strip_prefix('#').unwrap_or(&lower))
}

/// Normalize any accepted color spelling to lowercase hex.
pub fn normalize_color(s: &str) -> Option<String> {
    parse_color(s).map(Rgba::to_hex)
}

fn parse_hex(hex: &str) -> Option<Rgba> {
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let b = hex.as_bytes();
    match b.len() {
        3 | 4 => {
            let nib = |i: usize| hex_val(b[i]).map(|n| n << 4 | n);
            Some(Rgba {
                r: nib(0)?,
                g: nib(1)?,
                b: nib(2)?,
                a: if b.len() == 4 { nib(3)? } else { 0xFF },
            })
        }
        6 | 8 => {
            let byte = |i: usize| Some(hex_val(b[i])? << 4 | hex_val(b[i + 1])?);
            Some(Rgba {
                r: byte(0)?,
                g: byte(2)?,
                b: byte(4)?,
                a: if b.len() == 8 { byte(6)? } else { 0xFF },
            })
        }
        _ => None,
    }
}

fn parse_functional(s: &str) -> Option<Rgba> {
    let (inner, has_alpha) = if let Some(rest) = s.strip_prefix("rgba(") {
        (rest.strip_suffix(')')?, true)
    } else if let Some(rest) = s.strip_prefix("rgb(") {
        (rest.strip_suffix(')')?, false)
    } else {
        return None;
    };

    let mut parts = inner.split(',').map(str::trim);
    let channel = |p: Option<&str>| p?.parse::<u8>().ok();
    let r = channel(parts.next())?;
    let g = channel(parts.next())?;
    let b = channel(parts.next())?;
    let a = if has_alpha {
        let alpha: f64 = parts.next()?.parse().ok()?;
        if !(0.0..=1.0).contains(&alpha) {
            return None;
        }
        num_traits::Float::round(alpha * 255.0) as u8
    } else {
        0xFF
    };
    if parts.next().is_some() {
        return None;
    }
    Some(Rgba { r, g, b, a })
}

fn hex_val(ch: u8) -> Option<u8> {
    match ch {
        b'0'..=b'9' => Some(ch - b'0'),
        b'a'..=b'f' => Some(ch - b'a' + 10),
        b'A'..=b'F' => Some(ch - b'A' + 10),
        _ => None,
    }
}

fn lookup_named(name: &str) -> Option<Rgba> {
    NAMED_COLORS
        .binary_search_by_key(&name, |&(n, _)| n)
        .ok()
        .map(|idx| {
            let [r, g, b, a] = NAMED_COLORS[idx].1;
            Rgba { r, g, b, a }
        })
}

/// Sorted for binary search.
const NAMED_COLORS: &[(&str, [u8; 4])] = &[
    ("aqua", [0, 255, 255, 255]),
    ("black", [0, 0, 0, 255]),
    ("blue", [0, 0, 255, 255]),
    ("fuchsia", [255, 0, 255, 255]),
    ("gray", [128, 128, 128, 255]),
    ("green", [0, 128, 0, 255]),
    ("grey", [128, 128, 128, 255]),
    ("lime", [0, 255, 0, 255]),
    ("maroon", [128, 0, 0, 255]),
    ("navy", [0, 0, 128, 255]),
    ("olive", [128, 128, 0, 255]),
    ("orange", [255, 165, 0, 255]),
    ("purple", [128, 0, 128, 255]),
    ("red", [255, 0, 0, 255]),
    ("silver", [192, 192, 192, 255]),
    ("teal", [0, 128, 128, 255]),
    ("transparent", [0, 0, 0, 0]),
    ("white", [255, 255, 255, 255]),
    ("yellow", [255, 255, 0, 255]),
];
