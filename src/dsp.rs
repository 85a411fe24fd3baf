pub mod resampler;
pub mod waterfall;

use std::time::Instant;

// Initial color-scale bounds (dBm). The display calibrates its color map to
// this range once at startup; later readings may exceed it and are passed
// through unclamped.
pub const SCALE_FLOOR_DBM: f32 = -100.0;
pub const SCALE_CEILING_DBM: f32 = -20.0;

/// Frequency band one sweep covers, as negotiated with the receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Band {
    pub start_hz: u64,
    pub end_hz: u64,
    pub step_hz: u64,
}

impl Band {
    pub fn new(start_hz: u64, end_hz: u64, step_hz: u64) -> Self {
        Self {
            start_hz,
            end_hz,
            step_hz,
        }
    }

    /// Number of frequency points the receiver reports per sweep.
    pub fn bin_count(&self) -> usize {
        let steps = (self.end_hz - self.start_hz) as f64 / self.step_hz as f64;
        steps.round() as usize + 1
    }
}

/// One full scan across the band: RSSI readings in dBm, ordered by frequency.
#[derive(Debug, Clone, Copy)]
pub struct Sweep<'a> {
    pub band: Band,
    pub rssi_dbm: &'a [f32],
    pub timestamp: Instant,
}

impl<'a> Sweep<'a> {
    pub fn new(band: Band, rssi_dbm: &'a [f32], timestamp: Instant) -> Self {
        Self {
            band,
            rssi_dbm,
            timestamp,
        }
    }

    pub fn now(band: Band, rssi_dbm: &'a [f32]) -> Self {
        Self::new(band, rssi_dbm, Instant::now())
    }

    pub fn len(&self) -> usize {
        self.rssi_dbm.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessorUpdate<T> {
    None,
    Snapshot(T),
}

impl<T> From<ProcessorUpdate<T>> for Option<T> {
    fn from(update: ProcessorUpdate<T>) -> Self {
        match update {
            ProcessorUpdate::Snapshot(s) => Some(s),
            ProcessorUpdate::None => None,
        }
    }
}

/// Malformed sweep input, rejected before any state is touched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SweepError {
    #[error("sweep holds {actual} readings, configured band expects {expected}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("non-finite power reading at bin {index}")]
    NonFinitePower { index: usize },
}

pub trait SweepProcessor {
    type Output;

    /// Consumes one sweep. `Ok(ProcessorUpdate::None)` means the sweep was
    /// dropped without touching state (e.g. too fine for the display axis).
    fn process_sweep(
        &mut self,
        sweep: &Sweep<'_>,
    ) -> Result<ProcessorUpdate<Self::Output>, SweepError>;

    fn reset(&mut self);
}

pub trait Reconfigurable<Cfg> {
    fn update_config(&mut self, config: Cfg);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bin_count_matches_negotiated_band() {
        let band = Band::new(554_000_000, 570_000_000, 2_000_000);
        assert_eq!(band.bin_count(), 9);
    }

    #[test]
    fn update_converts_to_option() {
        let update: ProcessorUpdate<u32> = ProcessorUpdate::Snapshot(7);
        assert_eq!(Option::from(update), Some(7));
        let none: ProcessorUpdate<u32> = ProcessorUpdate::None;
        assert_eq!(Option::<u32>::from(none), None);
    }
}
