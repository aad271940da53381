//! Main simulator interface.

use tracing::{debug, info, warn};

use crate::circuit::{Circuit, NodeId};
use crate::components::Component;
use crate::config::{Oversampling, ProcessSettings, SimulatorConfig};

use super::assembly;
use super::channel::ChannelState;
use super::mna::MnaMatrix;
use super::newton::{NewtonOutcome, NewtonRaphson};

/// How each sample is solved. Chosen once per topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessMode {
    /// No nonlinear components: one solve against the cached factorization
    Linear,
    /// Diodes present: Newton-Raphson with a full restamp per iteration
    Iterating,
}

/// The main circuit simulator.
#[derive(Debug, Clone)]
pub struct Simulator {
    /// The circuit being simulated
    circuit: Circuit,
    /// MNA matrix system
    matrix: MnaMatrix,
    /// Newton-Raphson solver
    newton: NewtonRaphson,
    mode: ProcessMode,
    /// Saved `(x, b)` per audio channel
    channels: Vec<ChannelState>,
    /// Host sample rate in Hz
    sample_rate: f64,
    oversampling: Oversampling,
    /// Rate the circuit is stepped at; sizes the companion resistances
    effective_sample_rate: f64,
    /// Linear input gain (sample to volts)
    input_gain: f64,
    /// Linear output gain (volts to sample)
    output_gain: f32,
    /// Wet fraction of the mix, 0 to 1
    wet: f32,
    last_outcome: Option<NewtonOutcome>,
    nonconverged: u64,
}

impl Simulator {
    /// Size, stamp and factor the system for `circuit`, then seed the channels.
    pub fn new(circuit: Circuit, config: &SimulatorConfig, settings: &ProcessSettings) -> Self {
        let matrix = MnaMatrix::new(circuit.num_nodes, circuit.num_aux);
        let newton = NewtonRaphson::new(matrix.size, config);
        let mode = if circuit.is_nonlinear() {
            ProcessMode::Iterating
        } else {
            ProcessMode::Linear
        };

        info!(
            nodes = circuit.num_nodes,
            aux = circuit.num_aux,
            components = circuit.components.len(),
            ?mode,
            "circuit topology built"
        );

        let mut sim = Self {
            circuit,
            matrix,
            newton,
            mode,
            channels: Vec::new(),
            sample_rate: settings.sample_rate,
            oversampling: settings.oversampling,
            effective_sample_rate: settings.effective_sample_rate(),
            input_gain: 1.0,
            output_gain: 1.0,
            wet: 1.0,
            last_outcome: None,
            nonconverged: 0,
        };
        sim.solve_system();
        sim.prepare_channels(settings.channels);
        sim.set_input_gain_db(settings.input_gain_db);
        sim.set_output_gain_db(settings.output_gain_db);
        sim.set_mix_percent(settings.mix_percent);
        sim
    }

    /// Stamp every component at the current time step, factor and solve once.
    ///
    /// A zero pivot is reported but not rejected; the system then produces
    /// non-finite output.
    pub fn solve_system(&mut self) {
        let ts = 1.0 / self.effective_sample_rate;
        assembly::set_time_step(&mut self.circuit, ts);
        assembly::stamp_all(&self.circuit, &mut self.matrix);

        let min_pivot = self.matrix.factor();
        if min_pivot == 0.0 || min_pivot.is_nan() {
            warn!(min_pivot, "MNA matrix is singular; check for floating nodes");
        } else {
            debug!(min_pivot, "MNA matrix factored");
        }

        self.matrix.solve();
    }

    /// Zero the matrix, RHS and solution.
    pub fn clear_system(&mut self) {
        self.matrix.clear_all();
    }

    /// Set the host sample rate. Rebuilds the system if the effective rate changes.
    pub fn set_sample_rate(&mut self, sample_rate: f64) {
        self.sample_rate = sample_rate;
        self.update_effective_rate();
    }

    /// Set the oversampling factor. Rebuilds the system if the effective rate changes.
    pub fn set_oversampling(&mut self, oversampling: Oversampling) {
        self.oversampling = oversampling;
        self.update_effective_rate();
    }

    fn update_effective_rate(&mut self) {
        let rate = self.sample_rate * f64::from(self.oversampling.factor());
        if rate != self.effective_sample_rate {
            info!(
                from = self.effective_sample_rate,
                to = rate,
                "effective sample rate changed, refactoring"
            );
            self.effective_sample_rate = rate;
            self.clear_system();
            self.solve_system();
        }
    }

    /// Size the per-channel state.
    ///
    /// Existing channels keep their state; new ones are seeded from the
    /// current solution.
    pub fn prepare_channels(&mut self, count: usize) {
        if count == self.channels.len() {
            return;
        }
        let seed = ChannelState::seeded(&self.matrix);
        self.channels.resize(count, seed);
    }

    pub fn set_input_gain_db(&mut self, db: f64) {
        self.input_gain = 10f64.powf(db / 20.0);
    }

    pub fn set_output_gain_db(&mut self, db: f64) {
        self.output_gain = 10f64.powf(db / 20.0) as f32;
    }

    /// Set the dry/wet mix in percent, clamped to 0..=100.
    pub fn set_mix_percent(&mut self, percent: f64) {
        self.wet = (percent.clamp(0.0, 100.0) / 100.0) as f32;
    }

    /// Advance the circuit by one time step with the input sources at `input_voltage`.
    ///
    /// Works on the matrix's own `(x, b)`. Returns the output probe voltage.
    pub fn step(&mut self, input_voltage: f64) -> f64 {
        assembly::drive_sources(&mut self.circuit, input_voltage);
        assembly::update_companions(&mut self.circuit, &self.matrix);

        match self.mode {
            ProcessMode::Linear => {
                assembly::stamp_dynamic_rows(&self.circuit, &mut self.matrix);
                self.matrix.solve();
            }
            ProcessMode::Iterating => {
                let outcome = self.newton.solve(&mut self.circuit, &mut self.matrix);
                if !outcome.converged {
                    self.nonconverged += 1;
                }
                self.last_outcome = Some(outcome);
            }
        }

        assembly::read_probes(&mut self.circuit, &self.matrix)
    }

    /// Process one sample: input gain, circuit step, output gain, dry/wet mix.
    #[inline]
    pub fn process_sample(&mut self, dry: f32) -> f32 {
        let processed = self.step(f64::from(dry) * self.input_gain) as f32 * self.output_gain;
        mix(dry, processed, self.wet)
    }

    /// Process one block in place, one buffer per channel.
    ///
    /// Buffers beyond the prepared channel count are left untouched.
    pub fn process_block(&mut self, buffers: &mut [&mut [f32]]) {
        for (idx, buffer) in buffers.iter_mut().enumerate().take(self.channels.len()) {
            self.channels[idx].exchange(&mut self.matrix);
            for sample in buffer.iter_mut() {
                *sample = self.process_sample(*sample);
            }
            self.channels[idx].exchange(&mut self.matrix);
        }
    }

    pub fn mode(&self) -> ProcessMode {
        self.mode
    }

    /// Get a reference to the circuit.
    pub fn circuit(&self) -> &Circuit {
        &self.circuit
    }

    /// Host sample rate in Hz.
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn oversampling(&self) -> Oversampling {
        self.oversampling
    }

    pub fn effective_sample_rate(&self) -> f64 {
        self.effective_sample_rate
    }

    pub fn input_gain(&self) -> f64 {
        self.input_gain
    }

    pub fn output_gain(&self) -> f32 {
        self.output_gain
    }

    pub fn wet(&self) -> f32 {
        self.wet
    }

    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    /// Saved state of one channel.
    pub fn channel_state(&self, channel: usize) -> Option<&ChannelState> {
        self.channels.get(channel)
    }

    /// Solution vector the matrix currently holds.
    pub fn solution(&self) -> &[f64] {
        &self.matrix.x
    }

    /// Voltage of a node in the matrix's current solution.
    pub fn node_voltage(&self, node: NodeId) -> Option<f64> {
        self.matrix.x.get(node.index()).copied()
    }

    /// Last reading of the `index`-th probe, in file order.
    pub fn probe_voltage(&self, index: usize) -> Option<f64> {
        let idx = *self.circuit.roles.probes.get(index)?;
        match &self.circuit.components[idx] {
            Component::VoltageProbe(p) => Some(p.voltage),
            _ => None,
        }
    }

    /// Last reading of the output probe.
    pub fn output_voltage(&self) -> f64 {
        self.probe_voltage(0).unwrap_or(0.0)
    }

    /// Newton outcome of the most recent sample, if the circuit is nonlinear.
    pub fn last_outcome(&self) -> Option<NewtonOutcome> {
        self.last_outcome
    }

    /// Samples whose Newton iteration hit the cap without converging.
    pub fn nonconverged_samples(&self) -> u64 {
        self.nonconverged
    }
}

/// Linear dry/wet blend. `wet = 0` yields `dry` and `wet = 1` yields
/// `processed`, both exactly.
#[inline]
pub fn mix(dry: f32, processed: f32, wet: f32) -> f32 {
    processed * wet + (1.0 - wet) * dry
}
