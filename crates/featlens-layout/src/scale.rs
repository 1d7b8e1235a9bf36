#![forbid(unsafe_code)]

//! Linear scales and nice tick generation.
//!
//! Tick steps are powers of ten times 1, 2, or 5, chosen so that roughly
//! `count` ticks cover the domain. Tick values are computed as
//! `i / inc` for sub-unit steps so that `0.2` prints as `0.2` and not
//! `0.20000000000000004`.

use serde::{Deserialize, Serialize};

const E10: f64 = 7.0710678118654755; // sqrt(50)
const E5: f64 = 3.1622776601683795; // sqrt(10)
const E2: f64 = std::f64::consts::SQRT_2;

/// Maps a continuous domain onto a pixel range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearScale {
    domain: (f64, f64),
    range: (f64, f64),
    clamp: bool,
}

impl LinearScale {
    #[must_use]
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        Self {
            domain,
            range,
            clamp: false,
        }
    }

    /// Clamp inputs to the domain (and outputs of `invert` to the domain).
    #[must_use]
    pub fn with_clamp(mut self, clamp: bool) -> Self {
        self.clamp = clamp;
        self
    }

    #[must_use]
    pub fn domain(&self) -> (f64, f64) {
        self.domain
    }

    #[must_use]
    pub fn range(&self) -> (f64, f64) {
        self.range
    }

    /// Domain value -> pixel. A zero-width domain maps to the range midpoint.
    #[must_use]
    pub fn scale(&self, value: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        if d0 == d1 {
            return (r0 + r1) / 2.0;
        }
        let mut t = (value - d0) / (d1 - d0);
        if self.clamp {
            t = t.clamp(0.0, 1.0);
        }
        r0 + t * (r1 - r0)
    }

    /// Pixel -> domain value.
    #[must_use]
    pub fn invert(&self, pixel: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        if r0 == r1 {
            return (d0 + d1) / 2.0;
        }
        let mut t = (pixel - r0) / (r1 - r0);
        if self.clamp {
            t = t.clamp(0.0, 1.0);
        }
        d0 + t * (d1 - d0)
    }

    /// About `count` nice tick values inside the domain.
    #[must_use]
    pub fn ticks(&self, count: usize) -> Vec<f64> {
        ticks(self.domain.0, self.domain.1, count)
    }

    /// Step between ticks for `count`, used for label precision.
    #[must_use]
    pub fn tick_step(&self, count: usize) -> f64 {
        let (lo, hi) = if self.domain.0 <= self.domain.1 {
            self.domain
        } else {
            (self.domain.1, self.domain.0)
        };
        tick_step(lo, hi, count)
    }
}

/// Round half toward positive infinity.
fn round_half_up(x: f64) -> f64 {
    (x + 0.5).floor()
}

/// `(i1, i2, inc)`; a negative `inc` means ticks are `i / -inc`.
fn tick_spec(start: f64, stop: f64, count: f64) -> (f64, f64, f64) {
    let step = (stop - start) / count.max(0.0);
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

    let (mut i1, mut i2, inc);
    if power < 0.0 {
        let v = 10f64.powf(-power) / factor;
        i1 = round_half_up(start * v);
        i2 = round_half_up(stop * v);
        if i1 / v < start {
            i1 += 1.0;
        }
        if i2 / v > stop {
            i2 -= 1.0;
        }
        inc = -v;
    } else {
        let v = 10f64.powf(power) * factor;
        i1 = round_half_up(start / v);
        i2 = round_half_up(stop / v);
        if i1 * v < start {
            i1 += 1.0;
        }
        if i2 * v > stop {
            i2 -= 1.0;
        }
        inc = v;
    }

    if i2 < i1 && (0.5..2.0).contains(&count) {
        return tick_spec(start, stop, count * 2.0);
    }
    (i1, i2, inc)
}

/// Nice ticks between `start` and `stop`, in the direction of the arguments.
#[must_use]
pub fn ticks(start: f64, stop: f64, count: usize) -> Vec<f64> {
    if count == 0 || !start.is_finite() || !stop.is_finite() {
        return Vec::new();
    }
    if start == stop {
        return vec![start];
    }
    let reverse = stop < start;
    let (i1, i2, inc) = if reverse {
        tick_spec(stop, start, count as f64)
    } else {
        tick_spec(start, stop, count as f64)
    };
    if !(i2 >= i1) {
        return Vec::new();
    }
    let n = (i2 - i1) as usize + 1;
    let at = |i: f64| if inc < 0.0 { i / -inc } else { i * inc };
    if reverse {
        (0..n).map(|k| at(i2 - k as f64)).collect()
    } else {
        (0..n).map(|k| at(i1 + k as f64)).collect()
    }
}

/// Distance between consecutive ticks for the given domain and count.
#[must_use]
pub fn tick_step(start: f64, stop: f64, count: usize) -> f64 {
    if count == 0 || start == stop || !start.is_finite() || !stop.is_finite() {
        return 0.0;
    }
    let (_, _, inc) = tick_spec(start, stop, count as f64);
    if inc < 0.0 { 1.0 / -inc } else { inc }
}

/// Format a tick label with just enough decimals for `step`.
#[must_use]
pub fn format_tick(value: f64, step: f64) -> String {
    let decimals = if step > 0.0 && step < 1.0 {
        (-step.log10().floor()) as usize
    } else {
        0
    };
    let s = format!("{value:.decimals$}");
    // Avoid "-0" / "-0.0".
    if s.trim_start_matches('-').chars().all(|c| c == '0' || c == '.') {
        s.trim_start_matches('-').to_string()
    } else {
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_domain_ticks() {
        assert_eq!(ticks(0.0, 1.0, 5), vec![0.0, 0.2, 0.4, 0.6, 0.8, 1.0]);
    }

    #[test]
    fn integer_domain_ticks() {
        assert_eq!(ticks(0.0, 100.0, 5), vec![0.0, 20.0, 40.0, 60.0, 80.0, 100.0]);
        assert_eq!(ticks(0.0, 37.0, 5), vec![0.0, 10.0, 20.0, 30.0]);
    }

    #[test]
    fn reversed_ticks() {
        assert_eq!(ticks(1.0, 0.0, 5), vec![1.0, 0.8, 0.6, 0.4, 0.2, 0.0]);
    }

    #[test]
    fn degenerate_ticks() {
        assert!(ticks(0.0, 1.0, 0).is_empty());
        assert_eq!(ticks(3.0, 3.0, 5), vec![3.0]);
        assert!(ticks(f64::NAN, 1.0, 5).is_empty());
    }

    #[test]
    fn scale_and_invert() {
        let s = LinearScale::new((0.0, 10.0), (100.0, 200.0));
        assert_eq!(s.scale(5.0), 150.0);
        assert_eq!(s.invert(150.0), 5.0);
        assert_eq!(s.scale(20.0), 300.0);
        let clamped = s.with_clamp(true);
        assert_eq!(clamped.scale(20.0), 200.0);
        assert_eq!(clamped.invert(0.0), 0.0);
    }

    #[test]
    fn inverted_range_for_y_axis() {
        let s = LinearScale::new((0.0, 50.0), (300.0, 0.0));
        assert_eq!(s.scale(0.0), 300.0);
        assert_eq!(s.scale(50.0), 0.0);
    }

    #[test]
    fn zero_width_domain_maps_to_midpoint() {
        let s = LinearScale::new((1.0, 1.0), (0.0, 100.0));
        assert_eq!(s.scale(1.0), 50.0);
    }

    #[test]
    fn tick_labels() {
        assert_eq!(format_tick(0.4, 0.2), "0.4");
        assert_eq!(format_tick(20.0, 20.0), "20");
        assert_eq!(format_tick(0.05, 0.05), "0.05");
        assert_eq!(format_tick(-0.0, 0.1), "0.0");
        assert_eq!(tick_step(0.0, 1.0, 5), 0.2);
    }
}
