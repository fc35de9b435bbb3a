/*!
 * Dispatcher Task
 *
 * Background tokio task that drives the dispatcher at quantum rate, so
 * accounting advances without anyone calling `tick` by hand.
 */

use super::dispatcher::Dispatcher;
use crate::core::limits::saturating_u64;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{Interval, MissedTickBehavior};
use tracing::{info, trace, warn};

/// Control messages for the dispatcher task
#[derive(Debug, Clone)]
pub enum DispatcherCommand {
    /// New tick interval in microseconds
    UpdateQuantum(u64),
    Pause,
    Resume,
    /// Run one round immediately
    Trigger,
    Shutdown,
}

/// Handle to the dispatcher background task
pub struct DispatcherTask {
    command_tx: mpsc::UnboundedSender<DispatcherCommand>,
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl DispatcherTask {
    /// Spawn onto the current tokio runtime
    pub fn spawn(dispatcher: Arc<Dispatcher>) -> Self {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let quantum = dispatcher.quantum();

        let handle = tokio::spawn(async move {
            run_dispatch_loop(dispatcher, quantum, command_rx).await;
        });

        info!(
            quantum_us = saturating_u64(quantum.as_micros()),
            "Dispatcher task spawned"
        );

        Self {
            command_tx,
            handle: Some(handle),
        }
    }

    pub fn update_quantum(&self, quantum_micros: u64) {
        let _ = self
            .command_tx
            .send(DispatcherCommand::UpdateQuantum(quantum_micros));
    }

    pub fn pause(&self) {
        let _ = self.command_tx.send(DispatcherCommand::Pause);
    }

    pub fn resume(&self) {
        let _ = self.command_tx.send(DispatcherCommand::Resume);
    }

    pub fn trigger(&self) {
        let _ = self.command_tx.send(DispatcherCommand::Trigger);
    }

    /// Stop the loop and wait for it to finish
    pub async fn shutdown(mut self) {
        let _ = self.command_tx.send(DispatcherCommand::Shutdown);

        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                warn!(error = %e, "Dispatcher task shutdown error");
            } else {
                info!("Dispatcher task shutdown complete");
            }
        }
    }
}

fn ticker(quantum: Duration) -> Interval {
    // A zero period panics inside tokio
    let mut interval = tokio::time::interval(quantum.max(Duration::from_micros(1)));
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    interval
}

async fn run_dispatch_loop(
    dispatcher: Arc<Dispatcher>,
    quantum: Duration,
    mut command_rx: mpsc::UnboundedReceiver<DispatcherCommand>,
) {
    let mut active = true;
    let mut interval = ticker(quantum);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                if active {
                    dispatcher.tick();
                }
            }

            cmd = command_rx.recv() => {
                match cmd {
                    Some(DispatcherCommand::UpdateQuantum(micros)) => {
                        info!(quantum_us = micros, "Dispatcher quantum updated");
                        interval = ticker(Duration::from_micros(micros));
                    }
                    Some(DispatcherCommand::Pause) => {
                        info!("Dispatcher task paused");
                        active = false;
                    }
                    Some(DispatcherCommand::Resume) => {
                        info!("Dispatcher task resumed");
                        active = true;
                    }
                    Some(DispatcherCommand::Trigger) => {
                        dispatcher.tick();
                        trace!("Manual dispatcher trigger");
                    }
                    Some(DispatcherCommand::Shutdown) | None => {
                        info!("Dispatcher task shutting down");
                        break;
                    }
                }
            }
        }
    }
}

impl Drop for DispatcherTask {
    fn drop(&mut self) {
        if self.handle.is_some() {
            let _ = self.command_tx.send(DispatcherCommand::Shutdown);
        }
    }
}
