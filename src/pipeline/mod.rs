//! End-to-end load pipeline
//!
//! Wires the stages together for one source file:
//!
//! 1. **Config**: read the schema and connection descriptors
//! 2. **Extract**: read the bounded columns of the source file
//! 3. **Validate**: collect per-row reports for null and date violations
//! 4. **Cleanse**: drop reported rows and normalize dates
//! 5. **Load**: create the table and insert in checkpointed batches
//!
//! # Example
//!
//! ```rust,ignore
//! use tabload::pipeline::{PipelineConfig, PipelineExecutor};
//!
//! let config = PipelineConfig::new("schema.json", "connection.json", "people.csv")
//!     .with_batch_size(5_000)
//!     .with_work_dir("/var/lib/tabload");
//!
//! let mut executor = PipelineExecutor::new(config)?;
//! let report = executor.run()?;
//! report.print_summary();
//! ```
//!
//! # Recovery
//!
//! A failed batch leaves `__checkpoint_file.ckpt` and `load_progress.txt` in
//! the working directory. The error carries the original index of the first
//! row that was not loaded. Runs never resume automatically.

mod config;
mod error;
mod executor;

pub use config::{DEFAULT_PROCESS_NAME, PipelineConfig};
pub use error::{PipelineError, PipelineResult};
pub use executor::{PipelineExecutor, PipelineReport};

/// Run a pipeline with the given configuration
///
/// This is a convenience function for simple pipeline execution.
pub fn run_pipeline(config: PipelineConfig) -> PipelineResult<PipelineReport> {
    let mut executor = PipelineExecutor::new(config)?;
    executor.run()
}
