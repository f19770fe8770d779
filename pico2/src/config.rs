//! Board configuration.
//!
//! Pin map (Pico 2 + PIM715 Display Pack 2.8"):
//!
//! | Function | Pin |
//! |----------|-----|
//! | BMD101 TX -> UART0 RX | GP1 |
//! | UART0 TX (unused by the sensor) | GP0 |
//! | Aux console UART1 TX | GP4 |
//! | Aux console UART1 RX | GP5 |
//! | Heartbeat LED (blue, active low) | GP28 |
//! | Button X (filter) | GP14 |
//! | Button Y (inference) | GP15 |

use ecg_common::PipelineConfig;
use ecg_common::config::{DEFAULT_MAX_BURST, UART_RING_CAPACITY};

// =============================================================================
// Serial Links
// =============================================================================

/// BMD101 fixed output rate.
pub const SENSOR_BAUD: u32 = 57_600;

/// Auxiliary console rate.
pub const AUX_BAUD: u32 = 115_200;

/// Driver-side receive buffer for the sensor UART.
pub const SENSOR_RX_BUF_SIZE: usize = 1024;

/// Largest burst read from the sensor UART in one poll.
pub const SENSOR_READ_SIZE: usize = DEFAULT_MAX_BURST;

/// Driver-side buffers for the auxiliary UART.
pub const AUX_RX_BUF_SIZE: usize = 64;
pub const AUX_TX_BUF_SIZE: usize = 256;

/// Depth of the byte channels bridging the aux tasks and the pipeline.
pub const AUX_CHANNEL_DEPTH: usize = 64;

/// Readiness polls per aux byte. The TX task shares the executor with the
/// pipeline loop and cannot drain the channel mid-poll, so a full channel
/// drops the byte on the first attempt.
pub const AUX_TX_READY_SPINS: u32 = 1;

const _: () = assert!(SENSOR_READ_SIZE <= UART_RING_CAPACITY);

// =============================================================================
// Timing
// =============================================================================

/// Longest wait for sensor bytes before buttons are polled anyway.
pub const SENSOR_IDLE_POLL_MS: u64 = 20;

/// Button debounce duration in milliseconds.
pub const DEBOUNCE_MS: u64 = 50;

/// Interval between statistics lines on the debug probe.
pub const STATS_INTERVAL_MS: u64 = 10_000;

// =============================================================================
// Pipeline
// =============================================================================

/// Pipeline configuration for this board.
pub const fn pipeline_config() -> PipelineConfig {
    PipelineConfig {
        max_burst: SENSOR_READ_SIZE,
        tx_ready_spins: AUX_TX_READY_SPINS,
        ..PipelineConfig::new()
    }
}

// =============================================================================
// View
// =============================================================================

/// Height in pixels the waveform is scaled to (PIM715 is 320x240).
pub const WAVE_HEIGHT_PX: u16 = 200;

// =============================================================================
// Tests
// =============================================================================
