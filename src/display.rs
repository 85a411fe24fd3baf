//! Display-adapter seam.
//!
//! Rendering lives outside this crate. What it needs from us is the complete
//! image after each accepted sweep plus the static calibration data derived
//! once at startup: the initial color-scale bounds and the axis tick layout.

use crate::dsp::waterfall::{WaterfallConfig, WaterfallSnapshot};
use crate::dsp::{Band, SCALE_CEILING_DBM, SCALE_FLOOR_DBM};
use crate::util::linspace;
use anyhow::Result;
use tracing::debug;

/// Tick count on both axes.
pub const AXIS_TICKS: usize = 10;

/// Static calibration handed to a rendering surface at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayMetadata {
    pub title: &'static str,
    /// Color map is calibrated to these bounds once; data is not clamped.
    pub scale_floor_dbm: f32,
    pub scale_ceiling_dbm: f32,
    /// Image columns carrying a frequency tick.
    pub freq_tick_columns: Vec<usize>,
    /// Tick labels in kHz, rounded.
    pub freq_tick_khz: Vec<u64>,
    /// Image rows carrying a time tick.
    pub time_tick_rows: Vec<usize>,
}

impl DisplayMetadata {
    pub fn new(band: &Band, config: &WaterfallConfig) -> Self {
        let columns = linspace(0.0, (config.width - 1) as f64, AXIS_TICKS);
        let rows = linspace(0.0, (config.height - 1) as f64, AXIS_TICKS);
        let khz = linspace(
            (band.start_hz as f64 / 1000.0).round(),
            (band.end_hz as f64 / 1000.0).round(),
            AXIS_TICKS,
        );
        Self {
            title: "Spectrum [dBm]",
            scale_floor_dbm: SCALE_FLOOR_DBM,
            scale_ceiling_dbm: SCALE_CEILING_DBM,
            freq_tick_columns: columns.iter().map(|&c| c.round() as usize).collect(),
            freq_tick_khz: khz.iter().map(|&k| k.round() as u64).collect(),
            time_tick_rows: rows.iter().map(|&r| r.round() as usize).collect(),
        }
    }
}

/// Receives the image after each accepted sweep.
pub trait DisplaySink {
    fn present(&mut self, frame: &WaterfallSnapshot) -> Result<()>;
}

/// Stand-in surface that logs what a renderer would draw.
#[derive(Debug, Default)]
pub struct TraceSink {
    frames: u64,
}

impl TraceSink {
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl DisplaySink for TraceSink {
    fn present(&mut self, frame: &WaterfallSnapshot) -> Result<()> {
        self.frames += 1;
        if let Some(row) = frame.newest_row() {
            let peak = row.iter().copied().fold(f32::MIN, f32::max);
            let mean = row.iter().sum::<f32>() / row.len() as f32;
            debug!(
                frame = self.frames,
                write_row = frame.write_row,
                peak_dbm = peak,
                mean_dbm = mean,
                "frame presented"
            );
        }
        Ok(())
    }
}
