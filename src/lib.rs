//! # CircuitLive Core
//!
//! Real-time emulation of analog circuits for audio processing.
//!
//! This library provides:
//! - A line-oriented netlist format for describing circuits
//! - Modified Nodal Analysis (MNA) based circuit simulation
//! - Linear components (R, C, L, sources, ideal op-amps) and diodes
//! - Per-channel block processing with gain and dry/wet mix
//! - A lock-free netlist hand-off for hosts that reload circuits while playing
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`dsl`] - Parser for the netlist format
//! - [`circuit`] - Circuit topology and validation
//! - [`components`] - Component models and their MNA stamps
//! - [`solver`] - Matrix assembly, LU solver, Newton-Raphson and the sample loop
//! - [`netlist`] - Load/reset lifecycle around a simulator
//! - [`host`] - Loader/processor pair for real-time hosts
//! - [`audio`] - Raw PCM stream I/O (CLI only)
//!
//! ## Usage
//!
//! ### Native CLI
//!
//! ```bash
//! ffmpeg -i input.wav -f f32le -ac 2 -ar 48000 - \
//!   | circuitlive --channels 2 clipper.cir \
//!   | ffmpeg -f f32le -ac 2 -ar 48000 -i - output.wav
//! ```
//!
//! ### Library
//!
//! ```
//! use circuitlive_core::{Netlist, ProcessSettings};
//!
//! let mut netlist = Netlist::new();
//! netlist.prepare(&ProcessSettings::default().with_channels(1)).unwrap();
//! netlist.init("Vi 1 0 0\nR 1 2 1k\nR 2 0 1k\nVo 2 0 0").unwrap();
//!
//! let mut block = vec![1.0f32; 64];
//! netlist.process_block(&mut [block.as_mut_slice()]);
//! assert!((block[63] - 0.5).abs() < 1e-6);
//! ```
//!
//! ## Circuit Simulation Method
//!
//! For each time step Ts = 1/effective_sample_rate:
//!
//! 1. Drive the audio input sources and refresh the reactive companion sources
//! 2. Solve Ax = b for node voltages and auxiliary currents
//! 3. For circuits with diodes, restamp, refactor and resolve until the
//!    update is small enough (at most 16 iterations)
//!
//! Reactive elements (C, L) are discretized using the trapezoidal rule, which
//! maps the analog response through the bilinear transform.

pub mod circuit;
pub mod components;
pub mod config;
pub mod dsl;
pub mod error;
pub mod host;
pub mod netlist;
pub mod solver;

#[cfg(feature = "cli")]
pub mod audio;

// Re-export main types for convenience
pub use circuit::Circuit;
pub use config::{Oversampling, ProcessSettings, SimulatorConfig};
pub use error::{CircuitError, Result};
pub use host::{NetlistLoader, NetlistProcessor};
pub use netlist::Netlist;
pub use solver::{ProcessMode, Simulator};

// WASM bindings
#[cfg(feature = "wasm")]
mod wasm;

#[cfg(feature = "wasm")]
pub use wasm::WasmCircuitSim;

/// Default sample rate in Hz
pub const DEFAULT_SAMPLE_RATE: f64 = 48000.0;

/// Thermal voltage of the reference diode at about 300 K
pub const THERMAL_VOLTAGE: f64 = 0.025852;
