//! Firmware entry point.
//!
//! The main task owns the [`Pipeline`] and the board. It waits for sensor
//! bytes (bounded by [`SENSOR_IDLE_POLL_MS`] so buttons stay responsive when
//! the sensor is silent), polls the buttons and hands each burst to the
//! pipeline with the current millisecond clock.

use defmt::{error, info, warn};
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::peripherals::{UART0, UART1};
use embassy_rp::uart::{BufferedInterruptHandler, BufferedUart, BufferedUartRx, Config as UartConfig};
use embassy_time::{Duration, Instant, with_timeout};
use embedded_io_async::Read;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use ecg_common::Pipeline;
use ecg_pico2::button::ButtonState;
use ecg_pico2::classifier::board_classifier;
use ecg_pico2::config::{
    AUX_BAUD,
    AUX_RX_BUF_SIZE,
    AUX_TX_BUF_SIZE,
    SENSOR_BAUD,
    SENSOR_IDLE_POLL_MS,
    SENSOR_READ_SIZE,
    SENSOR_RX_BUF_SIZE,
    STATS_INTERVAL_MS,
    pipeline_config,
};
use ecg_pico2::selector::FilterSelector;

use crate::board::PicoBoard;
use crate::tasks::{aux_rx_task, aux_tx_task};

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
    UART1_IRQ => BufferedInterruptHandler<UART1>;
});

static SENSOR_RX_BUF: StaticCell<[u8; SENSOR_RX_BUF_SIZE]> = StaticCell::new();
static AUX_RX_BUF: StaticCell<[u8; AUX_RX_BUF_SIZE]> = StaticCell::new();
static AUX_TX_BUF: StaticCell<[u8; AUX_TX_BUF_SIZE]> = StaticCell::new();
static PIPELINE: StaticCell<Pipeline> = StaticCell::new();

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("ECG monitor starting...");
    let p = embassy_rp::init(Default::default());

    // Initialize RGB LED (active-low: Low = ON)
    // PIM715: Red=26, Green=27, Blue=28
    let _led_r = Output::new(p.PIN_26, Level::High); // Off
    let _led_g = Output::new(p.PIN_27, Level::High); // Off
    let led_b = Output::new(p.PIN_28, Level::High); // Off (used for heartbeat)

    // Initialize buttons (active-low with pull-up)
    let btn_x = Input::new(p.PIN_14, Pull::Up);
    let btn_y = Input::new(p.PIN_15, Pull::Up);
    let mut btn_x_state = ButtonState::new();
    let mut btn_y_state = ButtonState::new();

    // BMD101 on UART0 (receive only)
    let mut sensor_config = UartConfig::default();
    sensor_config.baudrate = SENSOR_BAUD;
    let mut sensor = BufferedUartRx::new(
        p.UART0,
        Irqs,
        p.PIN_1,
        SENSOR_RX_BUF.init([0; SENSOR_RX_BUF_SIZE]),
        sensor_config,
    );
    info!("Sensor UART at {} baud", SENSOR_BAUD);

    // Aux console on UART1
    let mut aux_config = UartConfig::default();
    aux_config.baudrate = AUX_BAUD;
    let aux = BufferedUart::new(
        p.UART1,
        p.PIN_4,
        p.PIN_5,
        Irqs,
        AUX_TX_BUF.init([0; AUX_TX_BUF_SIZE]),
        AUX_RX_BUF.init([0; AUX_RX_BUF_SIZE]),
        aux_config,
    );
    let (aux_tx, aux_rx) = aux.split();
    spawner.spawn(aux_rx_task(aux_rx)).unwrap();
    spawner.spawn(aux_tx_task(aux_tx)).unwrap();
    info!("Aux console tasks spawned");

    let config = pipeline_config();
    let pipeline = match Pipeline::new(config) {
        Ok(pipeline) => PIPELINE.init(pipeline),
        Err(e) => {
            error!("Invalid pipeline config: {}", e);
            return;
        }
    };
    let mut selector = FilterSelector::new(config.filter_selector);
    let mut board = PicoBoard::new(led_b, board_classifier());
    info!("Pipeline ready, filter: {}", selector.mode().label());

    let mut buf = [0u8; SENSOR_READ_SIZE];
    let mut last_stats = Instant::now();

    loop {
        let n = match with_timeout(Duration::from_millis(SENSOR_IDLE_POLL_MS), sensor.read(&mut buf)).await {
            Ok(Ok(n)) => n,
            Ok(Err(e)) => {
                warn!("Sensor UART read error: {:?}", e);
                0
            }
            // Sensor silent, fall through to the buttons
            Err(_) => 0,
        };

        let now = Instant::now();
        let now_ms = now.as_millis();

        // X: Cycle filter selector
        if btn_x_state.just_pressed(btn_x.is_low(), now_ms) {
            pipeline.set_filter_selector(selector.advance());
            info!("Filter: {}", selector.mode().label());
        }

        // Y: Start an inference session (same as 'k' on the console)
        if btn_y_state.just_pressed(btn_y.is_low(), now_ms) && !pipeline.request_inference() {
            info!("Inference not armed (no contact or already running)");
        }

        pipeline.poll(&buf[..n], now_ms as u32, &mut board);

        if now.duration_since(last_stats) >= Duration::from_millis(STATS_INTERVAL_MS) {
            info!("Stats: {:?}", pipeline.stats());
            last_stats = now;
        }
    }
}
