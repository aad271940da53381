//! Netlist lifecycle: load, prepare, process, reset.
//!
//! A [`Netlist`] is either initialized, holding a ready [`Simulator`], or
//! uninitialized. Processing an uninitialized netlist leaves the audio
//! untouched, so a bad netlist degrades to a pass-through.

use std::path::Path;

use tracing::{debug, info};

use crate::circuit::Circuit;
use crate::config::{Oversampling, ProcessSettings, SimulatorConfig};
use crate::dsl;
use crate::error::Result;
use crate::solver::Simulator;

/// A loaded (or not) circuit plus the settings it runs with.
#[derive(Debug, Clone, Default)]
pub struct Netlist {
    simulator: Option<Simulator>,
    config: SimulatorConfig,
    settings: ProcessSettings,
}

impl Netlist {
    /// Create an uninitialized netlist with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an uninitialized netlist that will run with the given settings.
    pub fn with_settings(config: SimulatorConfig, settings: ProcessSettings) -> Self {
        Self {
            simulator: None,
            config,
            settings,
        }
    }

    /// Build the circuit from netlist text.
    ///
    /// Any previous circuit is dropped first, so on error the netlist is
    /// left uninitialized rather than half-built. Settings given through
    /// [`Netlist::with_settings`] are validated here.
    pub fn init(&mut self, text: &str) -> Result<()> {
        self.reset();
        self.settings.validate()?;

        let ast = dsl::parse(text)?;
        let circuit = Circuit::from_ast(&ast)?;
        info!(
            components = circuit.components.len(),
            nonlinear = circuit.is_nonlinear(),
            "netlist parsed"
        );

        self.simulator = Some(Simulator::new(circuit, &self.config, &self.settings));
        Ok(())
    }

    /// Read a netlist file and build the circuit from it.
    ///
    /// If the file cannot be read the netlist is left as it was.
    pub fn init_file(&mut self, path: &Path) -> Result<()> {
        let text = dsl::read_file(path)?;
        self.init(&text)
    }

    /// Drop the circuit and all solver state.
    pub fn reset(&mut self) {
        if self.simulator.take().is_some() {
            debug!("netlist reset");
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.simulator.is_some()
    }

    /// Validate and apply host settings.
    ///
    /// Rebuilds the system when the effective sample rate changes and seeds
    /// any new channels. Rejected settings leave the netlist as it was.
    pub fn prepare(&mut self, settings: &ProcessSettings) -> Result<()> {
        settings.validate()?;
        self.apply_settings(settings);
        Ok(())
    }

    /// [`Netlist::prepare`] for settings that are already validated.
    pub(crate) fn apply_settings(&mut self, settings: &ProcessSettings) {
        self.settings.clone_from(settings);
        if let Some(sim) = self.simulator.as_mut() {
            sim.set_sample_rate(settings.sample_rate);
            sim.set_oversampling(settings.oversampling);
            sim.prepare_channels(settings.channels);
            sim.set_input_gain_db(settings.input_gain_db);
            sim.set_output_gain_db(settings.output_gain_db);
            sim.set_mix_percent(settings.mix_percent);
        }
    }

    /// Process one block in place. A no-op when uninitialized.
    pub fn process_block(&mut self, buffers: &mut [&mut [f32]]) {
        if let Some(sim) = self.simulator.as_mut() {
            sim.process_block(buffers);
        }
    }

    pub fn set_input_gain_db(&mut self, db: f64) {
        self.settings.input_gain_db = db;
        if let Some(sim) = self.simulator.as_mut() {
            sim.set_input_gain_db(db);
        }
    }

    pub fn set_output_gain_db(&mut self, db: f64) {
        self.settings.output_gain_db = db;
        if let Some(sim) = self.simulator.as_mut() {
            sim.set_output_gain_db(db);
        }
    }

    pub fn set_mix_percent(&mut self, percent: f64) {
        self.settings.mix_percent = percent;
        if let Some(sim) = self.simulator.as_mut() {
            sim.set_mix_percent(percent);
        }
    }

    pub fn set_oversampling(&mut self, oversampling: Oversampling) {
        self.settings.oversampling = oversampling;
        if let Some(sim) = self.simulator.as_mut() {
            sim.set_oversampling(oversampling);
        }
    }

    pub fn settings(&self) -> &ProcessSettings {
        &self.settings
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    pub fn simulator(&self) -> Option<&Simulator> {
        self.simulator.as_ref()
    }

    pub fn simulator_mut(&mut self) -> Option<&mut Simulator> {
        self.simulator.as_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CircuitError;
    use std::io::Write;

    const VALID: &str = "\
# Diode clipper with an RC input stage
Vi 1 0 0
R 1 2 1k
C 2 3 100n
R 3 0 10k
D 3 0 0
Vo 3 0 0
";

    #[test]
    fn test_init_and_reset() {
        let mut netlist = Netlist::new();
        assert!(!netlist.is_initialized());

        netlist.init(VALID).unwrap();
        assert!(netlist.is_initialized());
        let sim = netlist.simulator().unwrap();
        assert_eq!(sim.circuit().matrix_size(), 4 + 2);

        netlist.reset();
        assert!(!netlist.is_initialized());
    }

    #[test]
    fn test_uninitialized_is_pass_through() {
        let mut netlist = Netlist::new();
        let input: Vec<f32> = (0..32).map(|k| k as f32 / 32.0).collect();
        let mut block = input.clone();
        netlist.process_block(&mut [block.as_mut_slice()]);
        assert_eq!(block, input);
    }

    #[test]
    fn test_failed_init_drops_previous_circuit() {
        let mut netlist = Netlist::new();
        netlist.init(VALID).unwrap();

        let err = netlist.init("Vi 1 0 0\nR 1 0 1k\n").unwrap_err();
        assert!(matches!(err, CircuitError::MissingProbe));
        assert!(!netlist.is_initialized());
    }

    #[test]
    fn test_unreadable_file_keeps_circuit() {
        let mut netlist = Netlist::new();
        netlist.init(VALID).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let err = netlist.init_file(&dir.path().join("missing.cir")).unwrap_err();
        assert!(err.is_load_failure());
        assert!(netlist.is_initialized());
    }

    #[test]
    fn test_init_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(VALID.as_bytes()).unwrap();

        let mut netlist = Netlist::new();
        netlist.init_file(file.path()).unwrap();
        assert!(netlist.is_initialized());
    }

    /// Every single-line corruption of a valid netlist must leave it
    /// uninitialized: no partial topology survives.
    #[test]
    fn test_single_line_mutations_leave_uninitialized() {
        let lines: Vec<&str> = VALID.lines().filter(|l| !l.starts_with('#')).collect();

        for (idx, line) in lines.iter().enumerate() {
            let fields: Vec<&str> = line.split_whitespace().collect();
            let mutations = [
                // unknown symbol
                format!("X{} {} {} {}", fields[0], fields[1], fields[2], fields[3]),
                // missing token
                fields[..3].join(" "),
                // non-numeric value
                format!("{} {} {} abc", fields[0], fields[1], fields[2]),
                // non-numeric node
                format!("{} one {} {}", fields[0], fields[2], fields[3]),
            ];

            for mutated in mutations {
                let text = lines
                    .iter()
                    .enumerate()
                    .map(|(i, &l)| if i == idx { mutated.as_str() } else { l })
                    .collect::<Vec<_>>()
                    .join("\n");

                let mut netlist = Netlist::new();
                netlist.init(VALID).unwrap();
                assert!(
                    netlist.init(&text).is_err(),
                    "mutation accepted: {:?}",
                    mutated
                );
                assert!(!netlist.is_initialized(), "mutation left a circuit: {:?}", mutated);
            }
        }
    }

    #[test]
    fn test_prepare_forwards_settings() {
        let mut netlist = Netlist::new();
        netlist.init(VALID).unwrap();

        let settings = ProcessSettings::new()
            .with_sample_rate(44100.0)
            .with_oversampling(Oversampling::X2)
            .with_channels(2)
            .with_mix_percent(50.0);
        netlist.prepare(&settings).unwrap();

        let sim = netlist.simulator().unwrap();
        assert_eq!(sim.effective_sample_rate(), 88200.0);
        assert_eq!(sim.num_channels(), 2);
        assert_eq!(sim.wet(), 0.5);
        assert_eq!(netlist.settings(), &settings);
    }

    #[test]
    fn test_settings_survive_reload() {
        let mut netlist = Netlist::new();
        netlist.set_input_gain_db(6.0);
        netlist
            .prepare(&ProcessSettings::new().with_channels(3).with_input_gain_db(6.0))
            .unwrap();
        netlist.init(VALID).unwrap();

        let sim = netlist.simulator().unwrap();
        assert_eq!(sim.num_channels(), 3);
        assert!((sim.input_gain() - 10f64.powf(6.0 / 20.0)).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_settings_are_rejected() {
        let mut netlist = Netlist::new();
        netlist.init(VALID).unwrap();

        let err = netlist
            .prepare(&ProcessSettings::new().with_sample_rate(0.0))
            .unwrap_err();
        assert!(matches!(err, CircuitError::InvalidSimulationParam { .. }));
        assert_eq!(netlist.settings(), &ProcessSettings::default());
        assert_eq!(netlist.simulator().unwrap().sample_rate(), 48000.0);

        let mut zero_rate = Netlist::with_settings(
            SimulatorConfig::default(),
            ProcessSettings::new().with_sample_rate(0.0),
        );
        assert!(zero_rate.init(VALID).is_err());
        assert!(!zero_rate.is_initialized());
    }
}
