mod cli;
mod display;
mod dsp;
mod source;
mod util;

use anyhow::{Result, anyhow};
use async_channel::Receiver;
use display::{DisplayMetadata, DisplaySink, TraceSink};
use dsp::waterfall::{WaterfallConfig, WaterfallProcessor};
use dsp::{ProcessorUpdate, Reconfigurable, Sweep, SweepProcessor};
use source::SyntheticSource;
use std::time::Duration;
use tracing::{info, warn};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let matches = cli::command().get_matches();
    let band = cli::validate_band(
        matches
            .get_one::<u64>("start-freq")
            .copied()
            .unwrap_or(cli::DEFAULT_START_HZ),
        matches
            .get_one::<u64>("end-freq")
            .copied()
            .unwrap_or(cli::DEFAULT_END_HZ),
        matches
            .get_one::<u64>("step")
            .copied()
            .unwrap_or(cli::DEFAULT_STEP_HZ),
    );

    let mut processor = WaterfallProcessor::new(band, WaterfallConfig::default());
    processor.update_config(WaterfallConfig {
        width: matches.get_one::<usize>("width").copied().unwrap_or(256),
        height: matches.get_one::<usize>("height").copied().unwrap_or(256),
        ..Default::default()
    });
    let config = processor.config();
    let metadata = DisplayMetadata::new(&band, &config);

    info!(
        start_hz = band.start_hz,
        end_hz = band.end_hz,
        step_hz = band.step_hz,
        bins = band.bin_count(),
        "configured sweep band"
    );
    info!(
        width = config.width,
        height = config.height,
        floor_dbm = metadata.scale_floor_dbm,
        ceiling_dbm = metadata.scale_ceiling_dbm,
        title = metadata.title,
        "display calibration"
    );
    if band.bin_count() >= config.width {
        warn!(
            bins = band.bin_count(),
            width = config.width,
            "every sweep will be skipped; widen --width or coarsen --step"
        );
    }

    let interval = Duration::from_millis(
        matches
            .get_one::<u64>("interval-ms")
            .copied()
            .unwrap_or(50),
    );
    let limit = matches
        .get_one::<u64>("sweeps")
        .copied()
        .filter(|&count| count > 0);
    let seed = matches.get_one::<u64>("seed").copied();

    let synthetic = match seed {
        Some(seed) => SyntheticSource::with_seed(band, seed),
        None => SyntheticSource::new(band),
    };
    let (sweeps, producer) = source::spawn(synthetic, interval, limit)?;

    let mut sink = TraceSink::default();
    run_loop(&mut processor, &mut sink, &sweeps)?;
    info!(frames = sink.frames(), "display sink finished");
    drop(sweeps);

    producer
        .join()
        .map_err(|_| anyhow!("sweep source thread panicked"))
}

/// Consumes sweeps serially until the producer side closes the queue.
fn run_loop(
    processor: &mut WaterfallProcessor,
    sink: &mut dyn DisplaySink,
    sweeps: &Receiver<Vec<f32>>,
) -> Result<()> {
    let band = processor.band();
    let (mut accepted, mut skipped, mut rejected) = (0u64, 0u64, 0u64);

    while let Ok(rssi) = sweeps.recv_blocking() {
        match processor.process_sweep(&Sweep::now(band, &rssi)) {
            Ok(ProcessorUpdate::Snapshot(frame)) => {
                accepted += 1;
                sink.present(&frame)?;
            }
            Ok(ProcessorUpdate::None) => skipped += 1,
            Err(err) => {
                rejected += 1;
                warn!(%err, "sweep rejected");
            }
        }
    }

    info!(accepted, skipped, rejected, "sweep stream ended");
    Ok(())
}
