//! Position scales with d3-compatible tick and nice behavior.

use std::collections::HashMap;
use std::hash::Hash;

const E10: f64 = 7.0710678118654755; // sqrt(50)
const E5: f64 = 3.1622776601683795; // sqrt(10)
const E2: f64 = 1.4142135623730951; // sqrt(2)

/// Returns (i1, i2, inc); a negative `inc` means ticks are `i / -inc`
fn tick_spec(start: f64, stop: f64, count: usize) -> Option<(i64, i64, f64)> {
    if count == 0 || !(stop > start) {
        return None;
    }
    let step = (stop - start) / count as f64;
    let power = step.log10().floor();
    let error = step / 10f64.powf(power);
    let factor = if error >= E10 {
        10.0
    } else if error >= E5 {
        5.0
    } else if error >= E2 {
        2.0
    } else {
        1.0
    };

    if power < 0.0 {
        let inc = 10f64.powf(-power) / factor;
        let mut i1 = (start * inc).round() as i64;
        let mut i2 = (stop * inc).round() as i64;
        if (i1 as f64) / inc < start {
            i1 += 1;
        }
        if (i2 as f64) / inc > stop {
            i2 -= 1;
        }
        Some((i1, i2, -inc))
    } else {
        let inc = 10f64.powf(power) * factor;
        let mut i1 = (start / inc).round() as i64;
        let mut i2 = (stop / inc).round() as i64;
        if (i1 as f64) * inc < start {
            i1 += 1;
        }
        if (i2 as f64) * inc > stop {
            i2 -= 1;
        }
        Some((i1, i2, inc))
    }
}

/// Signed tick increment; negative values encode `1 / -inc`
fn tick_increment(start: f64, stop: f64, count: usize) -> f64 {
    tick_spec(start, stop, count).map_or(0.0, |(_, _, inc)| inc)
}

/// Nicely-rounded tick values covering `[start, stop]`
pub fn ticks(start: f64, stop: f64, count: usize) -> Vec<f64> {
    if start == stop {
        return vec![start];
    }
    let (lo, hi, reverse) = if start < stop {
        (start, stop, false)
    } else {
        (stop, start, true)
    };
    let Some((i1, i2, inc)) = tick_spec(lo, hi, count) else {
        return Vec::new();
    };
    if i2 < i1 {
        return Vec::new();
    }
    let mut out: Vec<f64> = (i1..=i2)
        .map(|i| if inc < 0.0 { i as f64 / -inc } else { i as f64 * inc })
        .collect();
    if reverse {
        out.reverse();
    }
    out
}

/// Continuous linear mapping from a numeric domain to a pixel range
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearScale {
    pub domain: (f64, f64),
    pub range: (f64, f64),
}

impl LinearScale {
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        Self { domain, range }
    }

    pub fn scale(&self, value: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        let t = if d1 == d0 { 0.5 } else { (value - d0) / (d1 - d0) };
        r0 + t * (r1 - r0)
    }

    /// Extend the domain to round tick boundaries
    pub fn nice(mut self, count: usize) -> Self {
        let (mut start, mut stop) = self.domain;
        if !(stop > start) {
            return self;
        }
        let mut prestep = f64::NAN;
        for _ in 0..10 {
            let step = tick_increment(start, stop, count);
            if step == prestep {
                break;
            } else if step > 0.0 {
                start = (start / step).floor() * step;
                stop = (stop / step).ceil() * step;
            } else if step < 0.0 {
                start = (start * step).ceil() / step;
                stop = (stop * step).floor() / step;
            } else {
                break;
            }
            prestep = step;
        }
        self.domain = (start, stop);
        self
    }

    pub fn ticks(&self, count: usize) -> Vec<f64> {
        ticks(self.domain.0, self.domain.1, count)
    }

    /// Step between adjacent ticks, used to pick label precision
    pub fn tick_step(&self, count: usize) -> f64 {
        let inc = tick_increment(self.domain.0, self.domain.1, count);
        if inc < 0.0 {
            1.0 / -inc
        } else {
            inc
        }
    }
}

/// Discrete bands over an ordered domain
#[derive(Debug, Clone)]
pub struct BandScale<K: Eq + Hash> {
    index: HashMap<K, usize>,
    start: f64,
    step: f64,
    bandwidth: f64,
}

impl<K: Eq + Hash + Clone> BandScale<K> {
    /// `padding` applies to both inner and outer padding, centered
    pub fn new(domain: &[K], range: (f64, f64), padding: f64) -> Self {
        let mut index = HashMap::with_capacity(domain.len());
        for key in domain {
            let next = index.len();
            index.entry(key.clone()).or_insert(next);
        }
        let n = index.len() as f64;
        let (r0, r1) = range;
        let step = (r1 - r0) / (n - padding + padding * 2.0).max(1.0);
        let start = r0 + (r1 - r0 - step * (n - padding)) * 0.5;
        Self {
            index,
            start,
            step,
            bandwidth: step * (1.0 - padding),
        }
    }

    /// Start of the band for `key`
    pub fn position(&self, key: &K) -> Option<f64> {
        self.index
            .get(key)
            .map(|&i| self.start + self.step * i as f64)
    }

    pub fn bandwidth(&self) -> f64 {
        self.bandwidth
    }

    pub fn step(&self) -> f64 {
        self.step
    }
}

/// Default tick label: grouped thousands, decimals from the tick step
pub fn format_tick(value: f64, step: f64) -> String {
    let decimals = if step > 0.0 && step < 1.0 {
        (-step.log10().floor()) as usize
    } else {
        0
    };
    let raw = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match raw.split_once('.') {
        Some((i, f)) => (i.to_string(), Some(f.to_string())),
        None => (raw, None),
    };
    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let sign = if value < 0.0 && value.abs() >= 0.5 * 10f64.powi(-(decimals as i32)) {
        "-"
    } else {
        ""
    };
    match frac_part {
        Some(f) => format!("{sign}{grouped}.{f}"),
        None => format!("{sign}{grouped}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticks_match_d3() {
        assert_eq!(ticks(0.0, 10.0, 10), (0..=10).map(f64::from).collect::<Vec<_>>());
        assert_eq!(ticks(0.0, 9000.0, 10), (0..=9).map(|i| f64::from(i) * 1000.0).collect::<Vec<_>>());
        assert_eq!(ticks(0.0, 1.0, 5), vec![0.0, 0.2, 0.4, 0.6, 0.8, 1.0]);
        assert_eq!(ticks(1.0, 0.0, 5), vec![1.0, 0.8, 0.6, 0.4, 0.2, 0.0]);
        assert_eq!(ticks(3.0, 3.0, 10), vec![3.0]);
    }

    #[test]
    fn test_nice_rounds_outward() {
        let s = LinearScale::new((0.0, 8763.0), (340.0, 40.0)).nice(10);
        assert_eq!(s.domain, (0.0, 9000.0));
        let s = LinearScale::new((0.13, 0.97), (0.0, 1.0)).nice(10);
        assert!((s.domain.0 - 0.1).abs() < 1e-12);
        assert!((s.domain.1 - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_linear_scale_inverted_range() {
        let s = LinearScale::new((0.0, 100.0), (340.0, 40.0));
        assert_eq!(s.scale(0.0), 340.0);
        assert_eq!(s.scale(100.0), 40.0);
        assert_eq!(s.scale(50.0), 190.0);
        assert_eq!(LinearScale::new((5.0, 5.0), (0.0, 10.0)).scale(5.0), 5.0);
    }

    #[test]
    fn test_band_scale_padding() {
        let band = BandScale::new(&[2021, 2022, 2023, 2024], (0.0, 100.0), 0.2);
        // step = 100 / (4 - 0.2 + 0.4) = 23.8095...
        let step = 100.0 / 4.2;
        assert!((band.step() - step).abs() < 1e-9);
        assert!((band.bandwidth() - step * 0.8).abs() < 1e-9);
        assert!((band.position(&2021).unwrap() - step * 0.2).abs() < 1e-9);
        assert!(band.position(&1999).is_none());
    }

    #[test]
    fn test_band_scale_without_padding() {
        let band = BandScale::new(&["a".to_string(), "b".to_string()], (0.0, 330.0), 0.0);
        assert_eq!(band.bandwidth(), 165.0);
        assert_eq!(band.position(&"b".to_string()), Some(165.0));
    }

    #[test]
    fn test_format_tick() {
        assert_eq!(format_tick(12000.0, 1000.0), "12,000");
        assert_eq!(format_tick(0.2, 0.2), "0.2");
        assert_eq!(format_tick(-1500.0, 500.0), "-1,500");
        assert_eq!(format_tick(999.0, 1.0), "999");
    }
}
