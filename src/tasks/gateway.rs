//! HTTP command gateway on UARTE1.
//!
//! The network co-processor forwards each HTTP request line, terminated
//! by `\n`, and relays whatever is written back as the response.

use ble_hid_mouse::command::{enqueue, MoveSender};
use ble_hid_mouse::config::HTTP_MAX_LINE;
use ble_hid_mouse::http::{handle_request_line, LineBuffer};
use defmt::{info, warn};
use embassy_nrf::peripherals::UARTE1;
use embassy_nrf::uarte::Uarte;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_time::Timer;

#[embassy_executor::task]
pub async fn gateway_task(
    mut uart: Uarte<'static, UARTE1>,
    moves: MoveSender<'static, CriticalSectionRawMutex>,
) -> ! {
    info!("HTTP gateway listening on UARTE1");

    let mut lines: LineBuffer<HTTP_MAX_LINE> = LineBuffer::new();
    let mut byte = [0u8; 1];
    loop {
        if let Err(e) = uart.read(&mut byte).await {
            warn!("gateway read failed: {:?}", e);
            Timer::after_millis(10).await;
            continue;
        }

        let Some(line) = lines.push(byte[0]) else {
            continue;
        };
        let handled = handle_request_line(line);
        if let Some(cmd) = handled.command {
            enqueue(&moves, cmd);
        }

        match handled.response.render() {
            Ok(text) => {
                if let Err(e) = uart.write(text.as_bytes()).await {
                    warn!("gateway write failed: {:?}", e);
                }
            }
            Err(_) => warn!("gateway response does not fit"),
        }
    }
}
