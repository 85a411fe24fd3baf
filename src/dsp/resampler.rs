//! Resampling of coarse receiver sweeps onto the fixed display-width
//! frequency axis.
//!
//! Sweeps carry one RSSI reading per receiver step; the display wants a fixed
//! number of columns. A natural cubic spline through the (frequency, power)
//! control points supplies the in-between values. Sweeps with four or more
//! points get the cubic fit; two- and three-point sweeps fall back to a
//! linear fit, which is the highest order those counts support.

use crate::dsp::Band;
use crate::util::{lerp, linspace};

/// Minimum control-point count for a stable cubic fit.
const MIN_CUBIC_POINTS: usize = 4;

/// Immutable linear space of frequencies over a band.
#[derive(Debug, Clone, PartialEq)]
pub struct FrequencyAxis {
    points: Vec<f64>,
}

impl FrequencyAxis {
    /// `len` evenly spaced frequencies from `start_hz` to `end_hz` inclusive.
    pub fn new(start_hz: f64, end_hz: f64, len: usize) -> Self {
        debug_assert!(start_hz < end_hz);
        debug_assert!(len >= 2);
        Self {
            points: linspace(start_hz, end_hz, len),
        }
    }

    /// Axis matching the receiver's reporting grid: one point per sweep bin.
    pub fn source(band: &Band) -> Self {
        Self::new(band.start_hz as f64, band.end_hz as f64, band.bin_count())
    }

    /// Axis matching the display: one point per image column.
    pub fn target(band: &Band, width: usize) -> Self {
        Self::new(band.start_hz as f64, band.end_hz as f64, width)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn points(&self) -> &[f64] {
        &self.points
    }

    /// Spacing between adjacent points. Axes are uniform by construction.
    fn spacing(&self) -> f64 {
        (self.points[self.points.len() - 1] - self.points[0]) / (self.points.len() - 1) as f64
    }
}

/// Maps sweeps from the receiver grid onto the display grid.
///
/// Scratch buffers for the spline fit are kept across calls, so a single
/// instance serves a whole sweep stream without reallocating.
#[derive(Debug, Clone)]
pub struct SweepResampler {
    source: FrequencyAxis,
    target: FrequencyAxis,
    y: Vec<f64>,
    // natural-spline second derivatives and the tridiagonal scratch rows
    c: Vec<f64>,
    mu: Vec<f64>,
    z: Vec<f64>,
    out: Vec<f32>,
}

impl SweepResampler {
    pub fn new(band: &Band, width: usize) -> Self {
        let source = FrequencyAxis::source(band);
        let target = FrequencyAxis::target(band, width);
        let n = source.len();
        Self {
            y: Vec::with_capacity(n),
            c: vec![0.0; n],
            mu: vec![0.0; n],
            z: vec![0.0; n],
            out: vec![0.0; width],
            source,
            target,
        }
    }

    /// Interpolates one sweep onto the display axis.
    ///
    /// Returns `None` when the sweep already has at least as many points as
    /// the display axis; such sweeps are not downsampled here and the caller
    /// skips the display update.
    pub fn resample(&mut self, rssi_dbm: &[f32]) -> Option<&[f32]> {
        let n = self.source.len();
        debug_assert_eq!(rssi_dbm.len(), n);
        if n >= self.target.len() {
            return None;
        }

        self.y.clear();
        self.y.extend(rssi_dbm.iter().map(|&v| v as f64));

        if n >= MIN_CUBIC_POINTS {
            self.fit_spline();
            self.evaluate_cubic();
        } else {
            self.evaluate_linear();
        }
        Some(&self.out)
    }

    /// Natural cubic spline second derivatives via the standard tridiagonal
    /// solve, with the free-end condition c[0] = c[n-1] = 0.
    fn fit_spline(&mut self) {
        let n = self.source.len();
        let h = self.source.spacing();
        let y = &self.y;

        self.c.resize(n, 0.0);
        self.mu.resize(n, 0.0);
        self.z.resize(n, 0.0);
        self.mu[0] = 0.0;
        self.z[0] = 0.0;

        for i in 1..n - 1 {
            let alpha = 3.0 / h * (y[i + 1] - y[i]) - 3.0 / h * (y[i] - y[i - 1]);
            let l = 4.0 * h - h * self.mu[i - 1];
            self.mu[i] = h / l;
            self.z[i] = (alpha - h * self.z[i - 1]) / l;
        }

        self.c[n - 1] = 0.0;
        for i in (0..n - 1).rev() {
            self.c[i] = self.z[i] - self.mu[i] * self.c[i + 1];
        }
    }

    fn evaluate_cubic(&mut self) {
        let n = self.source.len();
        let h = self.source.spacing();
        let x0 = self.source.points()[0];
        let (y, c) = (&self.y, &self.c);

        for (out, &xk) in self.out.iter_mut().zip(self.target.points()) {
            let pos = (xk - x0) / h;
            let i = (pos.floor() as usize).min(n - 1);
            if i >= n - 1 {
                *out = y[n - 1] as f32;
                continue;
            }
            let dx = xk - (x0 + i as f64 * h);
            let b = (y[i + 1] - y[i]) / h - h * (c[i + 1] + 2.0 * c[i]) / 3.0;
            let d = (c[i + 1] - c[i]) / (3.0 * h);
            *out = (y[i] + dx * (b + dx * (c[i] + dx * d))) as f32;
        }
    }

    fn evaluate_linear(&mut self) {
        let n = self.source.len();
        let h = self.source.spacing();
        let x0 = self.source.points()[0];
        let y = &self.y;

        for (out, &xk) in self.out.iter_mut().zip(self.target.points()) {
            let pos = ((xk - x0) / h).clamp(0.0, (n - 1) as f64);
            let i = (pos.floor() as usize).min(n - 2);
            let frac = pos - i as f64;
            *out = lerp(y[i], y[i + 1], frac) as f32;
        }
    }
}
