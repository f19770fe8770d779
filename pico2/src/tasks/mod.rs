//! Async tasks for the ECG monitor firmware.
//!
//! This module contains Embassy async tasks that run concurrently with the
//! pipeline loop:
//! - `aux`: auxiliary console RX/TX bridged through byte channels

pub mod aux;

pub use aux::{AUX_RX, AUX_TX, aux_rx_task, aux_tx_task};
