//! Scrolling waterfall image fed by resampled sweeps.
//!
//! The image is a fixed H×M arena of dBm values. Rows are written through a
//! circular head index, so steady-state scrolling costs one row copy instead
//! of shifting the whole buffer; the chronological view is materialized only
//! when a snapshot is handed to the display side.

use super::resampler::SweepResampler;
use super::{
    Band, ProcessorUpdate, Reconfigurable, SCALE_FLOOR_DBM, Sweep, SweepError, SweepProcessor,
};
use tracing::debug;

pub const MIN_DISPLAY_WIDTH: usize = 2;
pub const DEFAULT_DISPLAY_WIDTH: usize = 256;
pub const DEFAULT_DISPLAY_HEIGHT: usize = 256;

#[derive(Debug, Clone, Copy)]
pub struct WaterfallConfig {
    /// Image columns (target frequency bins).
    pub width: usize,
    /// Image rows (time steps retained).
    pub height: usize,
    /// Fill value for rows no sweep has reached yet.
    pub floor_dbm: f32,
}

impl Default for WaterfallConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_DISPLAY_WIDTH,
            height: DEFAULT_DISPLAY_HEIGHT,
            floor_dbm: SCALE_FLOOR_DBM,
        }
    }
}

impl WaterfallConfig {
    fn normalized(mut self) -> Self {
        self.width = self.width.max(MIN_DISPLAY_WIDTH);
        self.height = self.height.max(1);
        if !self.floor_dbm.is_finite() {
            self.floor_dbm = SCALE_FLOOR_DBM;
        }
        self
    }
}

/// Complete image handed to the display after each accepted sweep.
///
/// Rows are in time order: oldest first, newest last. While the buffer is
/// still filling, rows past `filled_rows` hold the configured floor value, so
/// the frame shape never changes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WaterfallSnapshot {
    pub width: usize,
    pub height: usize,
    /// Row-major dBm values, `height * width` long.
    pub rows: Vec<f32>,
    /// Row the next sweep lands on; pinned at `height - 1` once full.
    pub write_row: usize,
    /// Rows holding real sweep data, saturating at `height`.
    pub filled_rows: usize,
    /// Total sweeps accepted over the processor's lifetime.
    pub sweeps_processed: u64,
}

impl WaterfallSnapshot {
    pub fn row(&self, index: usize) -> &[f32] {
        &self.rows[index * self.width..(index + 1) * self.width]
    }

    pub fn newest_row(&self) -> Option<&[f32]> {
        (self.filled_rows > 0).then(|| self.row(self.filled_rows - 1))
    }
}

/// Owns the scrolling image and the resampler feeding it.
#[derive(Debug, Clone)]
pub struct WaterfallProcessor {
    cfg: WaterfallConfig,
    band: Band,
    bins: usize,
    resampler: SweepResampler,
    rows: Vec<f32>,
    head: usize,
    count: usize,
    written: u64,
    snap: WaterfallSnapshot,
}

impl WaterfallProcessor {
    pub fn new(band: Band, config: WaterfallConfig) -> Self {
        let cfg = config.normalized();
        Self {
            bins: band.bin_count(),
            resampler: SweepResampler::new(&band, cfg.width),
            rows: vec![cfg.floor_dbm; cfg.width * cfg.height],
            head: 0,
            count: 0,
            written: 0,
            snap: WaterfallSnapshot::default(),
            cfg,
            band,
        }
    }

    pub fn config(&self) -> WaterfallConfig {
        self.cfg
    }

    pub fn band(&self) -> Band {
        self.band
    }

    /// Row the next accepted sweep lands on, in display coordinates.
    /// Advances while filling, then stays pinned at the last row.
    pub fn write_row(&self) -> usize {
        self.count.min(self.cfg.height - 1)
    }

    /// True once every row holds sweep data and the image scrolls.
    pub fn is_full(&self) -> bool {
        self.count == self.cfg.height
    }

    fn validate(&self, sweep: &Sweep<'_>) -> Result<(), SweepError> {
        if sweep.len() != self.bins {
            return Err(SweepError::LengthMismatch {
                expected: self.bins,
                actual: sweep.len(),
            });
        }
        if let Some(index) = sweep.rssi_dbm.iter().position(|v| !v.is_finite()) {
            return Err(SweepError::NonFinitePower { index });
        }
        Ok(())
    }

    fn rebuild(&mut self) {
        self.bins = self.band.bin_count();
        self.resampler = SweepResampler::new(&self.band, self.cfg.width);
        self.rows = vec![self.cfg.floor_dbm; self.cfg.width * self.cfg.height];
        self.head = 0;
        self.count = 0;
        self.written = 0;
        self.snap = WaterfallSnapshot::default();
    }

    fn sync_snapshot(&mut self) {
        let (w, h) = (self.cfg.width, self.cfg.height);
        self.snap.rows.resize(w * h, self.cfg.floor_dbm);
        let start = if self.count < h { 0 } else { self.head };
        for i in 0..self.count {
            let src = ((start + i) % h) * w;
            self.snap.rows[i * w..(i + 1) * w].copy_from_slice(&self.rows[src..src + w]);
        }
        self.snap.width = w;
        self.snap.height = h;
        self.snap.write_row = self.write_row();
        self.snap.filled_rows = self.count;
        self.snap.sweeps_processed = self.written;
    }
}

impl SweepProcessor for WaterfallProcessor {
    type Output = WaterfallSnapshot;

    fn process_sweep(
        &mut self,
        sweep: &Sweep<'_>,
    ) -> Result<ProcessorUpdate<Self::Output>, SweepError> {
        self.validate(sweep)?;

        let Some(row) = self.resampler.resample(sweep.rssi_dbm) else {
            debug!(
                bins = self.bins,
                width = self.cfg.width,
                "sweep at or above display resolution, skipping"
            );
            return Ok(ProcessorUpdate::None);
        };

        let w = self.cfg.width;
        let dst = self.head * w;
        self.rows[dst..dst + w].copy_from_slice(row);
        self.head = (self.head + 1) % self.cfg.height;
        self.count = (self.count + 1).min(self.cfg.height);
        self.written += 1;
        if self.is_full() && self.written == self.cfg.height as u64 {
            debug!(height = self.cfg.height, "buffer full, scrolling from now on");
        }

        self.sync_snapshot();
        Ok(ProcessorUpdate::Snapshot(self.snap.clone()))
    }

    fn reset(&mut self) {
        self.rebuild();
    }
}

impl Reconfigurable<WaterfallConfig> for WaterfallProcessor {
    fn update_config(&mut self, config: WaterfallConfig) {
        let c = config.normalized();
        if c.width != self.cfg.width
            || c.height != self.cfg.height
            || c.floor_dbm != self.cfg.floor_dbm
        {
            self.cfg = c;
            self.rebuild();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_band() -> Band {
        Band::new(554_000_000, 570_000_000, 2_000_000)
    }

    fn small_config() -> WaterfallConfig {
        WaterfallConfig {
            width: 16,
            height: 8,
            ..Default::default()
        }
    }

    /// Constant sweeps interpolate to constant rows, so each row tags the
    /// sweep that produced it.
    fn feed(processor: &mut WaterfallProcessor, level: f32) -> ProcessorUpdate<WaterfallSnapshot> {
        let rssi = vec![level; processor.band().bin_count()];
        processor
            .process_sweep(&Sweep::now(processor.band(), &rssi))
            .expect("well-formed sweep")
    }

    #[test]
    fn cursor_advances_then_pins_at_last_row() {
        let mut p = WaterfallProcessor::new(test_band(), small_config());
        for i in 0..7 {
            assert_eq!(p.write_row(), i);
            feed(&mut p, -60.0);
            assert!(!p.is_full());
        }
        assert_eq!(p.write_row(), 7);

        feed(&mut p, -60.0);
        assert!(p.is_full());
        assert_eq!(p.write_row(), 7);

        feed(&mut p, -60.0);
        assert!(p.is_full());
        assert_eq!(p.write_row(), 7);
    }

    #[test]
    fn snapshot_keeps_floor_rows_while_filling() {
        let mut p = WaterfallProcessor::new(test_band(), small_config());
        let snap: WaterfallSnapshot = Option::from(feed(&mut p, -42.0)).expect("snapshot");
        assert_eq!(snap.filled_rows, 1);
        assert_eq!(snap.newest_row().unwrap()[0], -42.0);
        for row in 1..snap.height {
            assert!(snap.row(row).iter().all(|&v| v == SCALE_FLOOR_DBM));
        }
    }

    #[test]
    fn full_buffer_is_a_sliding_window_in_time_order() {
        let mut p = WaterfallProcessor::new(test_band(), small_config());
        let mut last = None;
        for i in 1..=12 {
            last = Option::from(feed(&mut p, -(i as f32)));
        }
        let snap: WaterfallSnapshot = last.expect("snapshot");
        assert_eq!(snap.filled_rows, 8);
        assert_eq!(snap.sweeps_processed, 12);
        // last 8 of 12 sweeps: 5..=12, oldest first
        for (row, sweep) in (5..=12).enumerate() {
            assert_eq!(snap.row(row)[0], -(sweep as f32));
        }
    }

    #[test]
    fn three_hundred_sweeps_leave_the_last_256_rows() {
        let mut p = WaterfallProcessor::new(test_band(), WaterfallConfig::default());
        let mut last = None;
        for i in 1..=300 {
            last = Option::from(feed(&mut p, -(i as f32) / 4.0));
            if i == 255 {
                // cursor at the last row, one sweep short of scrolling
                assert_eq!(p.write_row(), 255);
                assert!(!p.is_full());
            }
            if i == 256 {
                assert!(p.is_full());
                assert_eq!(p.write_row(), 255);
            }
        }
        let snap: WaterfallSnapshot = last.expect("snapshot");
        assert_eq!(snap.write_row, 255);
        assert_eq!(snap.row(0)[0], -45.0 / 4.0);
        assert_eq!(snap.row(255)[0], -300.0 / 4.0);
    }

    #[test]
    fn sweep_at_display_resolution_is_skipped_without_touching_state() {
        // 9-bin band against a 9-column display: N == M
        let cfg = WaterfallConfig {
            width: 9,
            height: 8,
            ..Default::default()
        };
        let mut p = WaterfallProcessor::new(test_band(), cfg);
        let rssi = vec![-50.0; 9];
        let update = p
            .process_sweep(&Sweep::now(test_band(), &rssi))
            .expect("well-formed sweep");
        assert_eq!(update, ProcessorUpdate::None);
        assert_eq!(p.write_row(), 0);
        assert!(!p.is_full());
    }

    #[test]
    fn malformed_sweeps_are_rejected_and_leave_the_buffer_unchanged() {
        let mut p = WaterfallProcessor::new(test_band(), small_config());

        let short = vec![-50.0; 5];
        assert_eq!(
            p.process_sweep(&Sweep::now(test_band(), &short)),
            Err(SweepError::LengthMismatch {
                expected: 9,
                actual: 5
            })
        );

        let mut poisoned = vec![-50.0; 9];
        poisoned[3] = f32::NAN;
        assert_eq!(
            p.process_sweep(&Sweep::now(test_band(), &poisoned)),
            Err(SweepError::NonFinitePower { index: 3 })
        );

        assert_eq!(p.write_row(), 0);
    }

    #[test]
    fn reconfigure_resizes_and_restarts() {
        let mut p = WaterfallProcessor::new(test_band(), small_config());
        feed(&mut p, -60.0);
        p.update_config(WaterfallConfig {
            width: 32,
            height: 4,
            ..Default::default()
        });
        assert_eq!(p.write_row(), 0);
        let snap: WaterfallSnapshot = Option::from(feed(&mut p, -30.0)).expect("snapshot");
        assert_eq!(snap.width, 32);
        assert_eq!(snap.height, 4);
        assert_eq!(snap.newest_row().unwrap().len(), 32);
    }

    #[test]
    fn degenerate_config_is_clamped() {
        let cfg = WaterfallConfig {
            width: 0,
            height: 0,
            floor_dbm: f32::NAN,
        }
        .normalized();
        assert_eq!(cfg.width, MIN_DISPLAY_WIDTH);
        assert_eq!(cfg.height, 1);
        assert_eq!(cfg.floor_dbm, SCALE_FLOOR_DBM);
    }
}
