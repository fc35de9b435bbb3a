/*!
 * Process Manager Builder
 * Builder pattern for ProcessManager construction
 */

use super::manager::{log_boot, ProcessManager};
use super::table::ProcessTable;
use crate::core::config::{ConfigError, KernelConfig};
use crate::core::limits::saturating_u64;
use crate::scheduler::accountant::EpochAccountant;
use crate::scheduler::clock::{Clock, MonotonicClock};
use crate::scheduler::dispatcher::Dispatcher;
use std::sync::Arc;
use std::time::Duration;

/// Builder for ProcessManager
pub struct ProcessManagerBuilder {
    config: KernelConfig,
    clock: Option<Arc<dyn Clock>>,
}

impl ProcessManagerBuilder {
    pub fn new() -> Self {
        Self {
            config: KernelConfig::default(),
            clock: None,
        }
    }

    /// Replace the whole configuration
    pub fn with_config(mut self, config: KernelConfig) -> Self {
        self.config = config;
        self
    }

    /// Time source for accounting (monotonic by default)
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn with_cpus(mut self, num_cpus: usize) -> Self {
        self.config.num_cpus = num_cpus;
        self
    }

    pub fn with_epoch_length(mut self, epoch_length: Duration) -> Self {
        self.config.epoch_length_ms = saturating_u64(epoch_length.as_millis());
        self
    }

    pub fn with_quantum(mut self, quantum: Duration) -> Self {
        self.config.quantum_us = saturating_u64(quantum.as_micros());
        self
    }

    /// Validate the configuration and boot the process table
    pub fn build(self) -> Result<ProcessManager, ConfigError> {
        self.config.validate()?;

        let clock: Arc<dyn Clock> = match self.clock {
            Some(clock) => clock,
            None => Arc::new(MonotonicClock::new()),
        };
        let accountant = Arc::new(EpochAccountant::new(
            Arc::clone(&clock),
            self.config.epoch_length(),
        ));
        let table = Arc::new(ProcessTable::boot(self.config.num_cpus, clock.now_ns()));
        let dispatcher = Arc::new(Dispatcher::new(
            Arc::clone(&table),
            Arc::clone(&accountant),
            self.config.quantum(),
        ));

        let manager = ProcessManager {
            table,
            accountant,
            dispatcher,
            config: self.config,
        };
        log_boot(&manager);
        Ok(manager)
    }
}

impl Default for ProcessManagerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
