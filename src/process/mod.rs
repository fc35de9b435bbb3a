/*!
 * Process Module
 * Process records, lifecycle hooks, ancestry and niceness propagation
 */

pub mod ancestry;
pub mod manager;
pub mod manager_builder;
pub mod nice;
pub mod record;
pub mod table;
pub mod traits;
pub mod types;

// Re-export for convenience
pub use ancestry::resolve_ancestor;
pub use manager::ProcessManager;
pub use manager_builder::ProcessManagerBuilder;
pub use nice::{decay, propagate_nice, Propagation};
pub use record::ProcessRecord;
pub use table::ProcessTable;
pub use traits::{ProcessLifecycle, ProcessLineage, SchedulingControl};
pub use types::{ProcessInfo, ProcessState};
