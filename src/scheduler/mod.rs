/*!
 * Scheduler Module
 * CPU sets, time sources, epoch-windowed accounting and the dispatcher
 */

pub mod accountant;
pub mod clock;
pub mod cpuset;
pub mod dispatcher;
pub mod epoch;
pub mod stats;
pub mod task;

// Re-export public API
pub use accountant::EpochAccountant;
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use cpuset::{CpuSet, ParseCpuSetError};
pub use dispatcher::Dispatcher;
pub use epoch::{EpochAccount, EpochWindow};
pub use stats::{AccountingStats, ParseSchedStatError, SchedStat};
pub use task::{DispatcherCommand, DispatcherTask};
