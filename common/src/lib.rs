//! BMD101 ingestion and ECG signal pipeline.
//!
//! This crate contains the platform-agnostic core shared between the Pico 2
//! firmware and the desktop simulator:
//!
//! - [`ring`]: UART byte ring bridging bursty reads to the parser
//! - [`protocol`]: BMD101 wire constants and frame encoding
//! - [`parser`]: sync/length/payload/checksum frame state machine
//! - [`payload`]: payload code walker (signal quality, heart rate, raw ECG)
//! - [`filter`]: selectable conditioning (pass-through, IIR, moving average)
//! - [`samples`]: conditioned sample ring and heartbeat (pulse) detection
//! - [`timer`]: cooperative millisecond deadlines
//! - [`inference`]: classifier contract and inference session scheduling
//! - [`io`]: collaborator traits implemented by the board
//! - [`pipeline`]: the owning pipeline object and its polling entry point
//!
//! # no_std Compatibility
//!
//! The crate is `no_std` outside of tests. Diagnostics go to `defmt` or `log`
//! when the matching feature is enabled and compile away otherwise.
//!
//! # Testing
//!
//! Run tests on the host with:
//! ```bash
//! cargo test -p ecg-common
//! ```

// Use no_std only when NOT testing (tests need std for the test harness)
#![cfg_attr(not(test), no_std)]
// Crate-level lints
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]

// Must come first so the logging macros are visible to every module
mod fmt;

pub mod config;
pub mod filter;
pub mod inference;
pub mod io;
pub mod parser;
pub mod payload;
pub mod pipeline;
pub mod protocol;
pub mod ring;
pub mod samples;
pub mod timer;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used items
pub use config::{ConfigError, PipelineConfig};
pub use filter::FilterMode;
pub use inference::{Classifier, Diagnosis, SessionState};
pub use io::{AuxPort, Board, EcgView, HeartbeatLed};
pub use payload::SignalQuality;
pub use pipeline::{Pipeline, PipelineStats};
pub use samples::WaveExtrema;
