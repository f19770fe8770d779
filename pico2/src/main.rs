//! BMD101 ECG Monitor Firmware for Raspberry Pi Pico 2 (RP2350)
//!
//! Streams the BMD101 heart sensor through the shared ECG pipeline and drives
//! the PIM715 Display Pack's RGB LED as a heartbeat indicator.
//!
//! # Architecture
//!
//! - Main task: owns the pipeline, reads sensor bursts, polls buttons
//! - Aux tasks: bridge the UART1 console to non-blocking byte channels
//!
//! # Button Controls
//!
//! - **X**: Cycle the filter selector (No Filter → IIR → Moving Avg)
//! - **Y**: Start an inference session (same as sending `k` on the console)
//!
//! Only builds for the RP2350 target; on the host the binary is a stub so the
//! workspace still builds and the library tests run.

#![cfg_attr(target_arch = "arm", no_std)]
#![cfg_attr(target_arch = "arm", no_main)]
// Crate-level lints (match lib.rs for consistency)
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]

// Modules only used in the binary (not testable on host)
#[cfg(target_arch = "arm")]
mod board;
#[cfg(target_arch = "arm")]
mod firmware;
#[cfg(target_arch = "arm")]
mod tasks;

#[cfg(not(target_arch = "arm"))]
fn main() {
    eprintln!("ecg-pico2 runs on the RP2350: build with --target thumbv8m.main-none-eabihf");
}
