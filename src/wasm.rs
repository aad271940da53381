//! WASM bindings for CircuitLive Core.
//!
//! This module provides JavaScript-friendly bindings for use in web browsers
//! with Web Audio API's AudioWorklet.
//!
//! ## Usage (JavaScript)
//!
//! ```javascript
//! import init, { WasmCircuitSim } from 'circuitlive_core';
//!
//! await init();
//!
//! const netlist = `
//!   Vi 1 0 0
//!   R  1 2 10k
//!   C  2 0 10n
//!   Vo 2 0 0
//! `;
//!
//! const sim = new WasmCircuitSim(netlist, 48000);
//!
//! // In AudioWorkletProcessor.process():
//! const input = inputBuffer.getChannelData(0);
//! const output = outputBuffer.getChannelData(0);
//! sim.process_block(input, output);
//! ```

use wasm_bindgen::prelude::*;

use crate::config::{ProcessSettings, SimulatorConfig};
use crate::netlist::Netlist;

/// Initialize panic hook for better error messages in browser console.
#[wasm_bindgen(start)]
pub fn init_panic_hook() {
    console_error_panic_hook::set_once();
}

/// Mono circuit simulator for an AudioWorklet.
#[wasm_bindgen]
pub struct WasmCircuitSim {
    netlist: Netlist,
}

#[wasm_bindgen]
impl WasmCircuitSim {
    /// Create a new simulator from netlist text.
    ///
    /// Fails if the netlist does not parse or has no output probe.
    #[wasm_bindgen(constructor)]
    pub fn new(netlist: &str, sample_rate: f64) -> Result<WasmCircuitSim, JsValue> {
        let config = SimulatorConfig::default();
        Self::with_config(netlist, sample_rate, config.max_iterations, config.tolerance)
    }

    /// Create a new simulator with custom Newton-Raphson configuration.
    #[wasm_bindgen]
    pub fn with_config(
        netlist: &str,
        sample_rate: f64,
        max_iterations: usize,
        tolerance: f64,
    ) -> Result<WasmCircuitSim, JsValue> {
        let config = SimulatorConfig::new()
            .with_max_iterations(max_iterations)
            .with_tolerance(tolerance);
        config.validate().map_err(|e| JsValue::from_str(&e.to_string()))?;

        let settings = ProcessSettings::new().with_sample_rate(sample_rate);
        settings.validate().map_err(|e| JsValue::from_str(&e.to_string()))?;

        let mut inner = Netlist::with_settings(config, settings);
        inner
            .init(netlist)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;

        Ok(WasmCircuitSim { netlist: inner })
    }

    /// Process a block of mono samples from `input` into `output`.
    #[wasm_bindgen]
    pub fn process_block(&mut self, input: &[f32], output: &mut [f32]) {
        let len = input.len().min(output.len());
        output[..len].copy_from_slice(&input[..len]);
        self.netlist.process_block(&mut [&mut output[..len]]);
    }

    /// Process a block of audio samples, returning the result.
    #[wasm_bindgen]
    pub fn process_block_alloc(&mut self, input: &[f32]) -> Vec<f32> {
        let mut output = input.to_vec();
        self.netlist.process_block(&mut [output.as_mut_slice()]);
        output
    }

    #[wasm_bindgen]
    pub fn set_input_gain_db(&mut self, db: f64) {
        self.netlist.set_input_gain_db(db);
    }

    #[wasm_bindgen]
    pub fn set_output_gain_db(&mut self, db: f64) {
        self.netlist.set_output_gain_db(db);
    }

    #[wasm_bindgen]
    pub fn set_mix_percent(&mut self, percent: f64) {
        self.netlist.set_mix_percent(percent);
    }

    /// Get the sample rate this simulator was configured with.
    #[wasm_bindgen(getter)]
    pub fn sample_rate(&self) -> f64 {
        self.netlist.settings().sample_rate
    }

    /// Last reading of the `index`-th probe, or `undefined`.
    #[wasm_bindgen]
    pub fn probe_voltage(&self, index: usize) -> Option<f64> {
        self.netlist.simulator()?.probe_voltage(index)
    }
}

/// Get the library version.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Get the default sample rate.
#[wasm_bindgen]
pub fn default_sample_rate() -> f64 {
    crate::DEFAULT_SAMPLE_RATE
}
