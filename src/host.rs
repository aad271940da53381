//! Netlist hand-off between a loader thread and the audio thread.
//!
//! The loader parses and builds a complete [`Netlist`] off the audio thread
//! and publishes it through a lock-free mailbox. The processor picks up
//! whatever is pending at the start of a block, so the audio thread only
//! ever sees fully built netlists.
//!
//! ```no_run
//! use circuitlive_core::host;
//! use circuitlive_core::{ProcessSettings, SimulatorConfig};
//!
//! let (loader, mut processor) = host::channel(SimulatorConfig::default(), ProcessSettings::default());
//! loader.load_file("fuzz.cir".as_ref()).ok();
//!
//! let mut block = vec![0.0f32; 512];
//! processor.process_block(&mut [block.as_mut_slice()]);
//! ```

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use arc_swap::{ArcSwap, ArcSwapOption};
use tracing::{info, warn};

use crate::config::{Oversampling, ProcessSettings, SimulatorConfig};
use crate::dsl;
use crate::error::Result;
use crate::netlist::Netlist;

struct Shared {
    /// Netlist waiting to be installed by the processor
    pending: ArcSwapOption<Netlist>,
    /// Netlist the processor replaced; dropped by the loader, not the audio thread
    retired: ArcSwapOption<Netlist>,
    /// Set by the processor after filling `retired`, cleared by the loader after emptying it
    retired_full: AtomicBool,
    /// Settings the next netlist should be prepared with
    settings: ArcSwap<ProcessSettings>,
}

impl Shared {
    /// Drop whatever the processor handed back. Loader side only.
    fn collect_retired(&self) {
        let retired = self.retired.swap(None);
        self.retired_full.store(false, Ordering::Release);
        drop(retired);
    }
}

/// Create a connected loader/processor pair.
pub fn channel(config: SimulatorConfig, settings: ProcessSettings) -> (NetlistLoader, NetlistProcessor) {
    let shared = Arc::new(Shared {
        pending: ArcSwapOption::empty(),
        retired: ArcSwapOption::empty(),
        retired_full: AtomicBool::new(false),
        settings: ArcSwap::from_pointee(settings.clone()),
    });

    let loader = NetlistLoader {
        shared: Arc::clone(&shared),
        config: config.clone(),
    };
    let processor = NetlistProcessor {
        shared,
        current: Arc::new(Netlist::with_settings(config, settings.clone())),
        held: None,
        settings,
    };
    (loader, processor)
}

/// Builds netlists off the audio thread. Cheap to clone.
#[derive(Clone)]
pub struct NetlistLoader {
    shared: Arc<Shared>,
    config: SimulatorConfig,
}

impl NetlistLoader {
    /// Load a netlist file and publish it.
    ///
    /// If the file cannot be read nothing is published and the running
    /// netlist stays in place. Any other error publishes an uninitialized
    /// netlist, which passes audio through.
    pub fn load_file(&self, path: &Path) -> Result<()> {
        let text = dsl::read_file(path).map_err(|e| {
            warn!(error = %e, "netlist load abandoned, keeping current circuit");
            e
        })?;
        info!(path = %path.display(), "loading netlist");
        self.load_str(&text)
    }

    /// Build a netlist from text and publish it, even if it failed to initialize.
    pub fn load_str(&self, text: &str) -> Result<()> {
        self.shared.collect_retired();

        let settings = self.shared.settings.load_full();
        let mut netlist = Netlist::with_settings(self.config.clone(), (*settings).clone());
        let result = netlist.init(text);
        match &result {
            Ok(()) => info!("netlist ready, publishing"),
            Err(e) => warn!(error = %e, "netlist rejected, publishing pass-through"),
        }

        self.shared.pending.store(Some(Arc::new(netlist)));
        // The processor may have retired a netlist while this one was building.
        self.shared.collect_retired();
        result
    }

    /// Whether a published netlist has not been picked up yet.
    pub fn has_pending(&self) -> bool {
        self.shared.pending.load().is_some()
    }
}

/// Audio-thread side. Never blocks and never frees memory.
pub struct NetlistProcessor {
    shared: Arc<Shared>,
    current: Arc<Netlist>,
    /// Replaced netlist waiting for the loader's retired slot to free up
    held: Option<Arc<Netlist>>,
    settings: ProcessSettings,
}

impl NetlistProcessor {
    /// Validate and apply host settings. Call from the host's prepare step, not per block.
    ///
    /// Rejected settings change nothing.
    pub fn prepare(&mut self, settings: ProcessSettings) -> Result<()> {
        settings.validate()?;
        self.shared.settings.store(Arc::new(settings.clone()));
        if let Some(netlist) = Arc::get_mut(&mut self.current) {
            netlist.apply_settings(&settings);
        }
        self.settings = settings;
        Ok(())
    }

    /// Process one block in place, installing a pending netlist first.
    pub fn process_block(&mut self, buffers: &mut [&mut [f32]]) {
        self.install_pending();
        if let Some(netlist) = Arc::get_mut(&mut self.current) {
            netlist.process_block(buffers);
        }
    }

    /// Swap in a published netlist, if any. Returns whether one was installed.
    ///
    /// The install is deferred while the previously replaced netlist is
    /// still waiting for the loader to collect it.
    pub fn install_pending(&mut self) -> bool {
        self.release_held();
        if self.held.is_some() {
            return false;
        }

        let Some(mut next) = self.shared.pending.swap(None) else {
            return false;
        };

        if let Some(netlist) = Arc::get_mut(&mut next) {
            // The host may have prepared again since the loader read the settings.
            netlist.apply_settings(&self.settings);
        }

        self.held = Some(std::mem::replace(&mut self.current, next));
        self.release_held();
        true
    }

    /// Hand the replaced netlist to the loader if the retired slot is empty.
    fn release_held(&mut self) {
        // Only the loader empties the slot, so an empty slot stays empty until filled here.
        if self.held.is_some() && !self.shared.retired_full.load(Ordering::Acquire) {
            self.shared.retired.store(self.held.take());
            self.shared.retired_full.store(true, Ordering::Release);
        }
    }

    pub fn set_input_gain_db(&mut self, db: f64) {
        self.settings.input_gain_db = db;
        if let Some(netlist) = Arc::get_mut(&mut self.current) {
            netlist.set_input_gain_db(db);
        }
    }

    pub fn set_output_gain_db(&mut self, db: f64) {
        self.settings.output_gain_db = db;
        if let Some(netlist) = Arc::get_mut(&mut self.current) {
            netlist.set_output_gain_db(db);
        }
    }

    pub fn set_mix_percent(&mut self, percent: f64) {
        self.settings.mix_percent = percent;
        if let Some(netlist) = Arc::get_mut(&mut self.current) {
            netlist.set_mix_percent(percent);
        }
    }

    /// Change the oversampling factor. Refactors the running circuit.
    pub fn set_oversampling(&mut self, oversampling: Oversampling) {
        self.settings.oversampling = oversampling;
        if let Some(netlist) = Arc::get_mut(&mut self.current) {
            netlist.set_oversampling(oversampling);
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.current.is_initialized()
    }

    /// The netlist currently being processed.
    pub fn netlist(&self) -> &Netlist {
        &self.current
    }
}
