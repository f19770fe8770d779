//! Auxiliary console tasks.
//!
//! The pipeline only ever calls non-blocking `try_read`/`try_write`. These two
//! tasks move bytes between the UART1 driver and a pair of channels so the
//! pipeline loop never awaits on the console.

use defmt::{info, warn};
use embassy_rp::uart::{BufferedUartRx, BufferedUartTx};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embedded_io_async::{Read, Write};

use ecg_pico2::config::AUX_CHANNEL_DEPTH;

/// Bytes received on the console, waiting for the pipeline.
pub static AUX_RX: Channel<CriticalSectionRawMutex, u8, AUX_CHANNEL_DEPTH> = Channel::new();

/// Bytes queued by the pipeline (echo, count reports, labels).
pub static AUX_TX: Channel<CriticalSectionRawMutex, u8, AUX_CHANNEL_DEPTH> = Channel::new();

/// Console receive task - forwards every byte, dropping when the pipeline lags.
#[embassy_executor::task]
pub async fn aux_rx_task(mut rx: BufferedUartRx) {
    info!("Aux RX task started");

    let mut buf = [0u8; 16];
    loop {
        match rx.read(&mut buf).await {
            Ok(n) => {
                for &byte in &buf[..n] {
                    if AUX_RX.try_send(byte).is_err() {
                        warn!("Aux RX channel full, dropping byte");
                    }
                }
            }
            Err(e) => {
                warn!("Aux UART read error: {:?}", e);
            }
        }
    }
}

/// Console transmit task - drains the TX channel into the UART.
#[embassy_executor::task]
pub async fn aux_tx_task(mut tx: BufferedUartTx) {
    info!("Aux TX task started");

    loop {
        let byte = AUX_TX.receive().await;
        if let Err(e) = tx.write_all(&[byte]).await {
            warn!("Aux UART write error: {:?}", e);
        }
    }
}
