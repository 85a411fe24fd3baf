//! Sweep producers.
//!
//! Hardware acquisition (device discovery, serial framing) lives outside this
//! crate; anything that can hand over one RSSI reading per band bin can drive
//! the pipeline. The synthetic source below stands in for a receiver when
//! none is attached, and the spawn helper runs any source on its own thread
//! behind a bounded queue so the processing side consumes sweeps serially.

use crate::dsp::Band;
use async_channel::Receiver;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};
use std::thread;
use std::time::Duration;
use tracing::info;

const CHANNEL_CAPACITY: usize = 64;

const NOISE_FLOOR_DBM: f32 = -95.0;
const CARRIER_DBM: f32 = -35.0;
const NOISE_SIGMA_DB: f32 = 1.5;
const CARRIER_DRIFT_PER_SWEEP: f32 = 0.004;

/// Produces one full scan across its band per call.
pub trait SweepSource {
    fn band(&self) -> Band;

    /// Next sweep's RSSI readings in dBm, one per band bin.
    fn next_sweep(&mut self) -> Vec<f32>;
}

/// Simulated receiver: a narrowband carrier drifting across the band over a
/// Gaussian noise floor.
#[derive(Debug, Clone)]
pub struct SyntheticSource {
    band: Band,
    bins: usize,
    rng: StdRng,
    noise: Normal<f32>,
    carrier_pos: f32,
}

impl SyntheticSource {
    pub fn new(band: Band) -> Self {
        Self::with_seed(band, rand::random())
    }

    pub fn with_seed(band: Band, seed: u64) -> Self {
        Self {
            bins: band.bin_count(),
            band,
            rng: StdRng::seed_from_u64(seed),
            noise: Normal::new(0.0, NOISE_SIGMA_DB).expect("sigma is positive"),
            carrier_pos: 0.25,
        }
    }
}

impl SweepSource for SyntheticSource {
    fn band(&self) -> Band {
        self.band
    }

    fn next_sweep(&mut self) -> Vec<f32> {
        let center = self.carrier_pos * (self.bins - 1) as f32;
        let carrier_width = (self.bins as f32 / 24.0).max(0.6);

        let mut sweep = Vec::with_capacity(self.bins);
        for bin in 0..self.bins {
            let d = (bin as f32 - center) / carrier_width;
            let carrier = (CARRIER_DBM - NOISE_FLOOR_DBM) * (-0.5 * d * d).exp();
            sweep.push(NOISE_FLOOR_DBM + carrier + self.noise.sample(&mut self.rng));
        }

        self.carrier_pos = (self.carrier_pos + CARRIER_DRIFT_PER_SWEEP).fract();
        sweep
    }
}

/// Runs `source` on a named producer thread, forwarding sweeps into a bounded
/// queue. The thread stops when the receiver is dropped or after `limit`
/// sweeps.
pub fn spawn<S>(
    mut source: S,
    interval: Duration,
    limit: Option<u64>,
) -> std::io::Result<(Receiver<Vec<f32>>, thread::JoinHandle<()>)>
where
    S: SweepSource + Send + 'static,
{
    let (tx, rx) = async_channel::bounded(CHANNEL_CAPACITY);
    let handle = thread::Builder::new()
        .name("sweepfall-source".into())
        .spawn(move || {
            let band = source.band();
            info!(
                start_hz = band.start_hz,
                end_hz = band.end_hz,
                "sweep source running"
            );
            let mut produced = 0u64;
            while limit.is_none_or(|l| produced < l) {
                if tx.send_blocking(source.next_sweep()).is_err() {
                    break;
                }
                produced += 1;
                if !interval.is_zero() {
                    thread::sleep(interval);
                }
            }
            info!(produced, "sweep source finished");
        })?;
    Ok((rx, handle))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_band() -> Band {
        Band::new(554_000_000, 570_000_000, 2_000_000)
    }

    #[test]
    fn sweeps_match_the_negotiated_bin_count() {
        let mut source = SyntheticSource::with_seed(test_band(), 7);
        for _ in 0..5 {
            let sweep = source.next_sweep();
            assert_eq!(sweep.len(), 9);
            assert!(sweep.iter().all(|v| v.is_finite()));
            assert!(sweep.iter().all(|&v| (-130.0..=0.0).contains(&v)));
        }
    }

    #[test]
    fn carrier_rises_above_the_noise_floor() {
        let mut source = SyntheticSource::with_seed(test_band(), 42);
        let sweep = source.next_sweep();
        let peak = sweep.iter().copied().fold(f32::MIN, f32::max);
        assert!(peak > NOISE_FLOOR_DBM + 20.0, "peak {peak} too quiet");
    }

    #[test]
    fn same_seed_reproduces_the_stream() {
        let mut a = SyntheticSource::with_seed(test_band(), 99);
        let mut b = SyntheticSource::with_seed(test_band(), 99);
        assert_eq!(a.next_sweep(), b.next_sweep());
        assert_eq!(a.next_sweep(), b.next_sweep());
    }

    #[test]
    fn spawn_honors_the_sweep_limit() {
        let source = SyntheticSource::with_seed(test_band(), 3);
        let (rx, handle) = spawn(source, Duration::ZERO, Some(4)).expect("spawn");
        let mut received = 0;
        while let Ok(sweep) = rx.recv_blocking() {
            assert_eq!(sweep.len(), 9);
            received += 1;
        }
        assert_eq!(received, 4);
        handle.join().expect("producer exits cleanly");
    }
}
