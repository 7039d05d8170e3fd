//! Depth zones
//!
//! A level's z axis is split into named half-open spans `[z_min, z_max)`.
//! Spans never overlap, so every z maps to exactly one zone; anything not
//! covered falls back to `Zone::Unknown`.

use serde::{Deserialize, Serialize};

/// Collision-rule region of the playfield
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Zone {
    Start,
    Road,
    #[serde(alias = "safe")]
    Median,
    Water,
    Goal,
    /// Not covered by any span
    Unknown,
}

impl Zone {
    pub fn as_str(&self) -> &'static str {
        match self {
            Zone::Start => "start",
            Zone::Road => "road",
            Zone::Median => "median",
            Zone::Water => "water",
            Zone::Goal => "goal",
            Zone::Unknown => "unknown",
        }
    }

    /// Zones where nothing can hurt the frog
    pub fn is_safe(&self) -> bool {
        matches!(self, Zone::Start | Zone::Median | Zone::Goal)
    }
}

/// A named z-range `[z_min, z_max)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoneSpan {
    pub zone: Zone,
    pub z_min: f32,
    pub z_max: f32,
}

impl ZoneSpan {
    pub fn new(zone: Zone, z_min: f32, z_max: f32) -> Self {
        Self { zone, z_min, z_max }
    }

    #[inline]
    pub fn contains(&self, z: f32) -> bool {
        z >= self.z_min && z < self.z_max
    }
}

/// Validated, sorted set of non-overlapping zone spans
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneMap {
    spans: Vec<ZoneSpan>,
}

impl ZoneMap {
    pub fn new(mut spans: Vec<ZoneSpan>) -> Result<Self, String> {
        if spans.is_empty() {
            return Err("no zones defined".into());
        }
        for span in &spans {
            if span.zone == Zone::Unknown {
                return Err("`unknown` is a fallback and cannot be configured".into());
            }
            if !span.z_min.is_finite() || !span.z_max.is_finite() || span.z_min >= span.z_max {
                return Err(format!(
                    "{} zone has an empty or invalid range [{}, {})",
                    span.zone.as_str(),
                    span.z_min,
                    span.z_max
                ));
            }
        }

        spans.sort_by(|a, b| a.z_min.total_cmp(&b.z_min));

        for pair in spans.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if b.z_min < a.z_max {
                return Err(format!(
                    "{} zone [{}, {}) overlaps {} zone [{}, {})",
                    a.zone.as_str(),
                    a.z_min,
                    a.z_max,
                    b.zone.as_str(),
                    b.z_min,
                    b.z_max
                ));
            }
            if b.z_min > a.z_max {
                log::warn!(
                    "Gap between {} and {} zones at z=[{}, {}) classifies as unknown",
                    a.zone.as_str(),
                    b.zone.as_str(),
                    a.z_max,
                    b.z_min
                );
            }
        }

        Ok(Self { spans })
    }

    /// Zone containing `z`
    pub fn classify(&self, z: f32) -> Zone {
        // Spans are sorted and disjoint: find the last span starting at or before z
        let idx = self.spans.partition_point(|s| s.z_min <= z);
        if idx == 0 {
            return Zone::Unknown;
        }
        let span = &self.spans[idx - 1];
        if span.contains(z) { span.zone } else { Zone::Unknown }
    }

    /// Every configured span whose range contains `z` (at most one)
    pub fn spans_containing(&self, z: f32) -> impl Iterator<Item = &ZoneSpan> {
        self.spans.iter().filter(move |s| s.contains(z))
    }

    /// Full configured depth `(z_min, z_max)`
    pub fn depth_range(&self) -> (f32, f32) {
        let first = self.spans.first().map(|s| s.z_min).unwrap_or(0.0);
        let last = self.spans.iter().map(|s| s.z_max).fold(first, f32::max);
        (first, last)
    }

    pub fn spans(&self) -> &[ZoneSpan] {
        &self.spans
    }
}
