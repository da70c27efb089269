//! Color schemes and scales shared by the charts.

use std::collections::HashMap;
use std::fmt;

/// RGB color as (r, g, b) with values in 0..=255.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb`
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#')?;
        if hex.len() != 6 {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
        Some(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }

    fn channels(self) -> [f64; 3] {
        [f64::from(self.r), f64::from(self.g), f64::from(self.b)]
    }

    fn from_channels([r, g, b]: [f64; 3]) -> Self {
        let byte = |v: f64| v.round().clamp(0.0, 255.0) as u8;
        Rgb::new(byte(r), byte(g), byte(b))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

// ─── Sequential schemes (ColorBrewer 9-class) ───────────────────────────

const REDS: [Rgb; 9] = [
    Rgb::new(0xff, 0xf5, 0xf0),
    Rgb::new(0xfe, 0xe0, 0xd2),
    Rgb::new(0xfc, 0xbb, 0xa1),
    Rgb::new(0xfc, 0x92, 0x72),
    Rgb::new(0xfb, 0x6a, 0x4a),
    Rgb::new(0xef, 0x3b, 0x2c),
    Rgb::new(0xcb, 0x18, 0x1d),
    Rgb::new(0xa5, 0x0f, 0x15),
    Rgb::new(0x67, 0x00, 0x0d),
];

const PURPLES: [Rgb; 9] = [
    Rgb::new(0xfc, 0xfb, 0xfd),
    Rgb::new(0xef, 0xed, 0xf5),
    Rgb::new(0xda, 0xda, 0xeb),
    Rgb::new(0xbc, 0xbd, 0xdc),
    Rgb::new(0x9e, 0x9a, 0xc8),
    Rgb::new(0x80, 0x7d, 0xba),
    Rgb::new(0x6a, 0x51, 0xa3),
    Rgb::new(0x54, 0x27, 0x8f),
    Rgb::new(0x3f, 0x00, 0x7d),
];

/// Sequential single-hue interpolators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interpolator {
    Reds,
    Purples,
}

impl Interpolator {
    fn stops(self) -> &'static [Rgb] {
        match self {
            Self::Reds => &REDS,
            Self::Purples => &PURPLES,
        }
    }

    /// Color at `t` in [0, 1]; values outside are clamped. Stops are joined
    /// with a uniform cubic B-spline, so only the end stops are hit exactly.
    pub fn at(self, t: f64) -> Rgb {
        let stops = self.stops();
        let n = stops.len() - 1;
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let i = ((t * n as f64).floor() as usize).min(n - 1);
        let v1 = stops[i].channels();
        let v2 = stops[i + 1].channels();
        let v0 = if i > 0 {
            stops[i - 1].channels()
        } else {
            std::array::from_fn(|c| 2.0 * v1[c] - v2[c])
        };
        let v3 = if i < n - 1 {
            stops[i + 2].channels()
        } else {
            std::array::from_fn(|c| 2.0 * v2[c] - v1[c])
        };
        let local = t * n as f64 - i as f64;
        Rgb::from_channels(std::array::from_fn(|c| basis(local, v0[c], v1[c], v2[c], v3[c])))
    }
}

fn basis(t1: f64, v0: f64, v1: f64, v2: f64, v3: f64) -> f64 {
    let t2 = t1 * t1;
    let t3 = t2 * t1;
    ((1.0 - 3.0 * t1 + 3.0 * t2 - t3) * v0
        + (4.0 - 6.0 * t2 + 3.0 * t3) * v1
        + (1.0 + 3.0 * t1 + 3.0 * t2 - 3.0 * t3) * v2
        + t3 * v3)
        / 6.0
}

/// Maps `[min, max]` linearly onto an interpolator
#[derive(Debug, Clone, Copy)]
pub struct SequentialScale {
    pub domain: (f64, f64),
    pub interpolator: Interpolator,
}

impl SequentialScale {
    pub fn new(domain: (f64, f64), interpolator: Interpolator) -> Self {
        Self {
            domain,
            interpolator,
        }
    }

    pub fn color(&self, value: f64) -> Rgb {
        let (d0, d1) = self.domain;
        let t = if d1 == d0 { 0.0 } else { (value - d0) / (d1 - d0) };
        self.interpolator.at(t)
    }
}

// ─── Categorical schemes ────────────────────────────────────────────────

pub const TABLEAU10: [&str; 10] = [
    "#4e79a7", "#f28e2c", "#e15759", "#76b7b2", "#59a14f", "#edc949", "#af7aa1", "#ff9da7",
    "#9c755f", "#bab0ab",
];

pub const CATEGORY10: [&str; 10] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
    "#bcbd22", "#17becf",
];

/// Color for keys that no scale knows about
pub const UNKNOWN_COLOR: &str = "#999999";

/// Ordinal scale: keys take range colors in domain order, cycling
#[derive(Debug, Clone, Default)]
pub struct OrdinalScale {
    range: Vec<String>,
    index: HashMap<String, usize>,
    domain: Vec<String>,
}

impl OrdinalScale {
    pub fn new<I, S>(range: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            range: range.into_iter().map(Into::into).collect(),
            index: HashMap::new(),
            domain: Vec::new(),
        }
    }

    /// Tableau10 followed by Category10, first 19 colors
    pub fn tableau_category() -> Self {
        Self::new(TABLEAU10.iter().chain(CATEGORY10.iter()).take(19).copied())
    }

    pub fn category10() -> Self {
        Self::new(CATEGORY10)
    }

    /// Add unseen keys to the end of the domain
    pub fn extend<I, S>(&mut self, keys: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for key in keys {
            let key = key.as_ref();
            if !self.index.contains_key(key) {
                self.index.insert(key.to_string(), self.domain.len());
                self.domain.push(key.to_string());
            }
        }
    }

    pub fn with_domain<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.extend(keys);
        self
    }

    pub fn domain(&self) -> &[String] {
        &self.domain
    }

    pub fn color(&self, key: &str) -> Option<&str> {
        if self.range.is_empty() {
            return None;
        }
        self.index
            .get(key)
            .map(|&i| self.range[i % self.range.len()].as_str())
    }
}

/// Side (armed group) palette shared by the symbol map and the stacked chart
#[derive(Debug, Clone)]
pub struct SidePalette {
    scale: OrdinalScale,
    overrides: Vec<(String, String)>,
}

impl SidePalette {
    /// Palette over the given sides, in first-appearance order
    pub fn new<I, S>(sides: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            scale: OrdinalScale::tableau_category().with_domain(sides),
            overrides: vec![
                ("Civilians".to_string(), "orange".to_string()),
                ("NUG".to_string(), "purple".to_string()),
            ],
        }
    }

    /// Copy of this palette that also knows `sides`
    pub fn extended<I, S>(&self, sides: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut palette = self.clone();
        palette.scale.extend(sides);
        palette
    }

    /// Ordinal color without the named-side overrides
    pub fn base_color(&self, side: &str) -> &str {
        self.scale.color(side).unwrap_or(UNKNOWN_COLOR)
    }

    pub fn color(&self, side: &str) -> &str {
        self.overrides
            .iter()
            .find(|(name, _)| name == side)
            .map(|(_, color)| color.as_str())
            .or_else(|| self.scale.color(side))
            .unwrap_or(UNKNOWN_COLOR)
    }

    pub fn sides(&self) -> &[String] {
        self.scale.domain()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_round_trip() {
        let c = Rgb::from_hex("#a50f15").unwrap();
        assert_eq!(c, Rgb::new(0xa5, 0x0f, 0x15));
        assert_eq!(c.to_string(), "#a50f15");
        assert_eq!(Rgb::from_hex("a50f15"), None);
        assert_eq!(Rgb::from_hex("#zz0000"), None);
    }

    #[test]
    fn test_interpolator_endpoints() {
        assert_eq!(Interpolator::Reds.at(0.0), REDS[0]);
        assert_eq!(Interpolator::Reds.at(1.0), REDS[8]);
        assert_eq!(Interpolator::Reds.at(2.0), REDS[8]);
        assert_eq!(Interpolator::Reds.at(f64::NAN), REDS[0]);
    }

    #[test]
    fn test_interpolator_smooths_between_stops() {
        // (bcbddc + 4·9e9ac8 + 807dba) / 6
        assert_eq!(Interpolator::Purples.at(0.5), Rgb::new(0x9e, 0x9b, 0xc9));
        assert_ne!(Interpolator::Purples.at(0.5), PURPLES[4]);
        assert_eq!(Interpolator::Reds.at(0.999_999), Interpolator::Reds.at(1.0));
    }

    #[test]
    fn test_sequential_zero_width_domain() {
        let scale = SequentialScale::new((0.0, 0.0), Interpolator::Reds);
        assert_eq!(scale.color(5.0), REDS[0]);
    }

    #[test]
    fn test_ordinal_assigns_in_order_and_cycles() {
        let scale = OrdinalScale::new(["#000000", "#ffffff"]).with_domain(["a", "b", "c", "a"]);
        assert_eq!(scale.domain(), ["a", "b", "c"]);
        assert_eq!(scale.color("a"), Some("#000000"));
        assert_eq!(scale.color("b"), Some("#ffffff"));
        assert_eq!(scale.color("c"), Some("#000000"));
        assert_eq!(scale.color("d"), None);
    }

    #[test]
    fn test_side_palette_overrides() {
        let palette = SidePalette::new(["KIO", "Civilians", "NUG"]);
        assert_eq!(palette.color("KIO"), TABLEAU10[0]);
        assert_eq!(palette.color("Civilians"), "orange");
        assert_eq!(palette.color("NUG"), "purple");
        assert_eq!(palette.color("unknown"), UNKNOWN_COLOR);
        assert_eq!(palette.base_color("Civilians"), TABLEAU10[1]);
        assert_eq!(palette.base_color("unknown"), UNKNOWN_COLOR);

        let extended = palette.extended(["KNU"]);
        assert_eq!(extended.color("KNU"), TABLEAU10[3]);
        assert_eq!(palette.color("KNU"), UNKNOWN_COLOR);
    }
}
