//! CircuitLive - analog circuit emulation on raw audio streams
//!
//! # Usage
//!
//! ```bash
//! ffmpeg -i input.wav -f f32le -ac 1 -ar 48000 - | circuitlive clipper.cir | ffmpeg -f f32le -ac 1 -ar 48000 -i - output.wav
//! ```

use std::path::PathBuf;

use clap::Parser;
use circuitlive_core::{
    audio::{process_audio, BUFFER_SIZE},
    error::Result,
    Netlist, ProcessSettings, SimulatorConfig, DEFAULT_SAMPLE_RATE,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Run an audio stream through an analog circuit netlist
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the netlist file
    #[arg(value_name = "NETLIST")]
    netlist: PathBuf,

    /// Sample rate in Hz
    #[arg(short, long, default_value_t = DEFAULT_SAMPLE_RATE)]
    sample_rate: f64,

    /// Number of interleaved channels in the stream
    #[arg(short, long, default_value_t = 1)]
    channels: usize,

    /// Frames per processing block
    #[arg(short, long, default_value_t = BUFFER_SIZE)]
    block_size: usize,

    /// Input gain in dB (sample to circuit volts)
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    input_gain: f64,

    /// Output gain in dB (probe volts to sample)
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    output_gain: f64,

    /// Dry/wet mix in percent
    #[arg(long, default_value_t = 100.0)]
    mix: f64,

    /// Newton-Raphson iteration cap per sample
    #[arg(long, default_value_t = circuitlive_core::solver::MAX_ITERATIONS)]
    max_iterations: usize,

    /// Newton-Raphson convergence tolerance
    #[arg(long, default_value_t = circuitlive_core::solver::CONVERGENCE_TOLERANCE)]
    tolerance: f64,
}

fn main() -> Result<()> {
    // stdout carries audio, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = SimulatorConfig::new()
        .with_max_iterations(args.max_iterations)
        .with_tolerance(args.tolerance);
    config.validate()?;

    let settings = ProcessSettings::new()
        .with_sample_rate(args.sample_rate)
        .with_channels(args.channels)
        .with_block_size(args.block_size)
        .with_input_gain_db(args.input_gain)
        .with_output_gain_db(args.output_gain)
        .with_mix_percent(args.mix);
    settings.validate()?;

    let mut netlist = Netlist::with_settings(config, settings);
    if let Err(e) = netlist.init_file(&args.netlist) {
        if e.is_load_failure() {
            return Err(e);
        }
        warn!(error = %e, "netlist rejected, passing audio through unchanged");
    }

    let frames = process_audio(&mut netlist, args.channels, args.block_size)?;
    info!(frames, "stream finished");

    if let Some(sim) = netlist.simulator() {
        if sim.nonconverged_samples() > 0 {
            warn!(
                samples = sim.nonconverged_samples(),
                "Newton-Raphson hit the iteration cap"
            );
        }
    }

    Ok(())
}
