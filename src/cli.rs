//! Command-line surface and validation of the requested band against the
//! receiver's supported range.

use crate::dsp::Band;
use clap::{Arg, Command, value_parser};
use tracing::warn;

// Full range of RF input the receiver supports.
pub const RF_LOWER_HZ: u64 = 45_000_000;
pub const RF_UPPER_HZ: u64 = 866_000_000;
pub const MIN_STEP_HZ: u64 = 1_000;

pub const DEFAULT_START_HZ: u64 = 554_000_000;
pub const DEFAULT_END_HZ: u64 = 570_000_000;
pub const DEFAULT_STEP_HZ: u64 = 2_000_000;

pub fn command() -> Command {
    Command::new("sweepfall")
        .about("Live scrolling spectrogram for frequency-sweep receivers")
        .arg(
            Arg::new("start-freq")
                .short('s')
                .long("start-freq")
                .value_name("HZ")
                .value_parser(value_parser!(u64))
                .default_value("554000000")
                .help("Lower bound of the frequency band to scan [Hz]"),
        )
        .arg(
            Arg::new("end-freq")
                .short('e')
                .long("end-freq")
                .value_name("HZ")
                .value_parser(value_parser!(u64))
                .default_value("570000000")
                .help("Upper bound of the frequency band to scan [Hz]"),
        )
        .arg(
            Arg::new("step")
                .short('d')
                .long("step")
                .value_name("HZ")
                .value_parser(value_parser!(u64))
                .default_value("2000000")
                .help("Bandwidth of a single sweep step [Hz]"),
        )
        .arg(
            Arg::new("width")
                .long("width")
                .value_name("COLUMNS")
                .value_parser(value_parser!(usize))
                .default_value("256")
                .help("Spectrogram width in frequency bins"),
        )
        .arg(
            Arg::new("height")
                .long("height")
                .value_name("ROWS")
                .value_parser(value_parser!(usize))
                .default_value("256")
                .help("Spectrogram height in time rows"),
        )
        .arg(
            Arg::new("interval-ms")
                .long("interval-ms")
                .value_name("MS")
                .value_parser(value_parser!(u64))
                .default_value("50")
                .help("Delay between simulated sweeps [ms]"),
        )
        .arg(
            Arg::new("sweeps")
                .long("sweeps")
                .value_name("COUNT")
                .value_parser(value_parser!(u64))
                .default_value("0")
                .help("Stop after this many sweeps (0 = run until interrupted)"),
        )
        .arg(
            Arg::new("seed")
                .long("seed")
                .value_name("SEED")
                .value_parser(value_parser!(u64))
                .help("Seed for the simulated receiver (random if omitted)"),
        )
}

/// Checks the requested band against receiver limits, substituting defaults
/// for values the hardware cannot honor.
pub fn validate_band(start_hz: u64, end_hz: u64, step_hz: u64) -> Band {
    let start = if start_hz > RF_LOWER_HZ && start_hz < RF_UPPER_HZ {
        start_hz
    } else {
        warn!(
            requested = start_hz,
            fallback = DEFAULT_START_HZ,
            "start frequency outside receiver range"
        );
        DEFAULT_START_HZ
    };

    let end = if end_hz > RF_LOWER_HZ && end_hz < RF_UPPER_HZ && end_hz > start {
        end_hz
    } else {
        warn!(
            requested = end_hz,
            fallback = DEFAULT_END_HZ,
            "end frequency outside receiver range or below start"
        );
        DEFAULT_END_HZ
    };

    // A start above the fallback end leaves no usable band; restart from the
    // default band entirely.
    let (start, end) = if start < end {
        (start, end)
    } else {
        warn!(
            start,
            end, "no usable band after validation, using default band"
        );
        (DEFAULT_START_HZ, DEFAULT_END_HZ)
    };

    let step = if step_hz > MIN_STEP_HZ && step_hz < end - start {
        step_hz
    } else {
        warn!(
            requested = step_hz,
            fallback = DEFAULT_STEP_HZ,
            "step outside usable range for the selected band"
        );
        DEFAULT_STEP_HZ
    };

    Band::new(start, end, step)
}
