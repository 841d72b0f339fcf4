//! Overlay (composite/watermark) fragments and their merged descriptors.
//!
//! A composite directive is split into one [`OverlayFragment`] per clause,
//! each tagged with the directive's occurrence number. [`collapse`] folds the
//! fragments of each occurrence into one [`Overlay`], resolving the placement
//! keyword into edge offsets.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use serde::{Deserialize, Serialize};

/// Where an overlay sits on the canvas.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Placement {
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
    Center,
}

impl Placement {
    /// Parse a compass or edge name (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s.trim().to_ascii_lowercase().as_str() {
            "north" | "top" | "n" => Self::North,
            "northeast" | "topright" | "ne" => Self::NorthEast,
            "east" | "right" | "e" => Self::East,
            "southeast" | "bottomright" | "se" => Self::SouthEast,
            "south" | "bottom" | "s" => Self::South,
            "southwest" | "bottomleft" | "sw" => Self::SouthWest,
            "west" | "left" | "w" => Self::West,
            "northwest" | "topleft" | "nw" => Self::NorthWest,
            "center" | "centre" | "middle" | "c" => Self::Center,
            _ => return None,
        })
    }

    /// Edge offsets as `[top, right, bottom, left]`.
    ///
    /// Compass points set one edge, corners set two, center sets none.
    pub fn offsets(self, offset: f64) -> [Option<f64>; 4] {
        let o = Some(offset);
        match self {
            Self::North => [o, None, None, None],
            Self::East => [None, o, None, None],
            Self::South => [None, None, o, None],
            Self::West => [None, None, None, o],
            Self::NorthEast => [o, o, None, None],
            Self::SouthEast => [None, o, o, None],
            Self::SouthWest => [None, None, o, o],
            Self::NorthWest => [o, None, None, o],
            Self::Center => [None, None, None, None],
        }
    }
}

/// Partial overlay properties from one or more directive clauses.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OverlayFragment {
    /// Which composite directive this fragment belongs to.
    pub occurrence: u32,
    pub url: Option<String>,
    pub placement: Option<Placement>,
    /// Custom placement distance; replaces the default offset.
    pub offset: Option<f64>,
    /// `0.0..=1.0`.
    pub opacity: Option<f64>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub fit: Option<String>,
    pub background: Option<String>,
    pub rotate: Option<u16>,
    pub repeat: Option<bool>,
    pub top: Option<f64>,
    pub right: Option<f64>,
    pub bottom: Option<f64>,
    pub left: Option<f64>,
}

impl OverlayFragment {
    pub fn new(occurrence: u32) -> Self {
        Self {
            occurrence,
            ..Self::default()
        }
    }

    /// Overwrite fields that `other` sets.
    pub fn merge_from(&mut self, other: &Self) {
        fn take<T: Clone>(dst: &mut Option<T>, src: &Option<T>) {
            if src.is_some() {
                dst.clone_from(src);
            }
        }
        take(&mut self.url, &other.url);
        take(&mut self.placement, &other.placement);
        take(&mut self.offset, &other.offset);
        take(&mut self.opacity, &other.opacity);
        take(&mut self.width, &other.width);
        take(&mut self.height, &other.height);
        take(&mut self.fit, &other.fit);
        take(&mut self.background, &other.background);
        take(&mut self.rotate, &other.rotate);
        take(&mut self.repeat, &other.repeat);
        take(&mut self.top, &other.top);
        take(&mut self.right, &other.right);
        take(&mut self.bottom, &other.bottom);
        take(&mut self.left, &other.left);
    }

    /// Resolve into a descriptor. `None` without a url.
    pub fn resolve(&self, default_offset: f64) -> Option<Overlay> {
        let url = self.url.clone().filter(|u| !u.is_empty())?;
        let [mut top, mut right, mut bottom, mut left] = self
            .placement
            .map(|p| p.offsets(self.offset.unwrap_or(default_offset)))
            .unwrap_or_default();
        // Edges given directly win over the placement table.
        top = self.top.or(top);
        right = self.right.or(right);
        bottom = self.bottom.or(bottom);
        left = self.left.or(left);
        Some(Overlay {
            url,
            top,
            right,
            bottom,
            left,
            width: self.width,
            height: self.height,
            opacity: self.opacity,
            repeat: self.repeat,
            fit: self.fit.clone(),
            background: self.background.clone(),
            rotate: self.rotate,
        })
    }
}

impl fmt::Display for OverlayFragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.occurrence)?;
        if let Some(url) = &self.url {
            write!(f, " url={url}")?;
        }
        if let Some(p) = self.placement {
            write!(f, " placement={p:?}")?;
        }
        if let Some(o) = self.opacity {
            write!(f, " opacity={o}")?;
        }
        Ok(())
    }
}

/// One resolved overlay, in the downstream array shape.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Overlay {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bottom: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repeat: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotate: Option<u16>,
}

impl Overlay {
    /// A descriptor the downstream API accepts: non-empty url, opacity in range.
    pub fn is_valid(&self) -> bool {
        !self.url.is_empty() && self.opacity.is_none_or(|o| (0.0..=1.0).contains(&o))
    }
}

/// Result of folding fragments per occurrence.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Collapsed {
    /// Descriptors in first-seen occurrence order.
    pub overlays: Vec<Overlay>,
    /// Occurrences dropped for lacking a url.
    pub dropped: Vec<u32>,
}

/// Fold fragments into one descriptor per occurrence.
pub fn collapse<'a>(
    fragments: impl IntoIterator<Item = &'a OverlayFragment>,
    default_offset: f64,
) -> Collapsed {
    let mut merged: Vec<OverlayFragment> = Vec::new();
    for frag in fragments {
        match merged.iter_mut().find(|m| m.occurrence == frag.occurrence) {
            Some(m) => m.merge_from(frag),
            None => merged.push(frag.clone()),
        }
    }

    let mut out = Collapsed::default();
    for m in &merged {
        match m.resolve(default_offset) {
            Some(overlay) => out.overlays.push(overlay),
            None => out.dropped.push(m.occurrence),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    fn frag(occurrence: u32, f: impl FnOnce(&mut OverlayFragment)) -> OverlayFragment {
        let mut o = OverlayFragment::new(occurrence);
        f(&mut o);
        o
    }

    #[test]
    fn southeast_default_offset() {
        assert_eq!(
            Placement::SouthEast.offsets(5.0),
            [None, Some(5.0), Some(5.0), None]
        );
    }

    #[test]
    fn center_sets_no_offsets() {
        assert_eq!(Placement::Center.offsets(5.0), [None; 4]);
    }

    #[test]
    fn compass_points_set_one_edge() {
        for p in [Placement::North, Placement::East, Placement::South, Placement::West] {
            assert_eq!(p.offsets(5.0).iter().flatten().count(), 1, "{p:?}");
        }
        for p in [
            Placement::NorthEast,
            Placement::SouthEast,
            Placement::SouthWest,
            Placement::NorthWest,
        ] {
            assert_eq!(p.offsets(5.0).iter().flatten().count(), 2, "{p:?}");
        }
    }

    #[test]
    fn custom_offset_replaces_default() {
        let frags = [
            frag(0, |f| f.url = Some("https://x.test/wm.png".to_string())),
            frag(0, |f| f.placement = Some(Placement::SouthEast)),
            frag(0, |f| f.offset = Some(20.0)),
        ];
        let c = collapse(&frags, 5.0);
        assert_eq!(c.overlays.len(), 1);
        let o = &c.overlays[0];
        assert_eq!((o.bottom, o.right, o.top, o.left), (Some(20.0), Some(20.0), None, None));
    }

    #[test]
    fn occurrences_stay_separate_and_ordered() {
        let frags = [
            frag(3, |f| f.url = Some("b.png".to_string())),
            frag(1, |f| f.url = Some("a.png".to_string())),
            frag(3, |f| f.opacity = Some(0.5)),
        ];
        let c = collapse(&frags, 5.0);
        let urls: Vec<&str> = c.overlays.iter().map(|o| o.url.as_str()).collect();
        assert_eq!(urls, ["b.png", "a.png"]);
        assert_eq!(c.overlays[0].opacity, Some(0.5));
    }

    #[test]
    fn missing_url_is_dropped() {
        let frags = [frag(0, |f| f.placement = Some(Placement::North))];
        let c = collapse(&frags, 5.0);
        assert!(c.overlays.is_empty());
        assert_eq!(c.dropped, [0]);
    }

    #[test]
    fn direct_edge_overrides_placement() {
        let frags = [frag(0, |f| {
            f.url = Some("a.png".to_string());
            f.placement = Some(Placement::NorthWest);
            f.left = Some(0.0);
        })];
        let o = &collapse(&frags, 5.0).overlays[0];
        assert_eq!((o.top, o.left), (Some(5.0), Some(0.0)));
    }

    #[test]
    fn serializes_without_absent_fields() {
        let o = Overlay {
            url: "a.png".to_string(),
            top: None,
            right: Some(5.0),
            bottom: Some(5.0),
            left: None,
            width: None,
            height: None,
            opacity: Some(0.5),
            repeat: None,
            fit: None,
            background: None,
            rotate: None,
        };
        let json = serde_json::to_string(&o).unwrap();
        assert_eq!(json, r#"{"url":"a.png","right":5.0,"bottom":5.0,"opacity":0.5}"#);
        let back: Overlay = serde_json::from_str(&json).unwrap();
        assert_eq!(back, o);
    }

    #[test]
    fn placement_names() {
        assert_eq!(Placement::parse("SouthEast"), Some(Placement::SouthEast));
        assert_eq!(Placement::parse("bottomright"), Some(Placement::SouthEast));
        assert_eq!(Placement::parse("middle"), Some(Placement::Center));
        assert_eq!(Placement::parse("upward"), None);
    }
}
