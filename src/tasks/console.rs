//! Console poller on UARTE0.

use ble_hid_mouse::console::{map_symbol, ConsoleAction};
use defmt::{debug, info, warn};
use embassy_nrf::peripherals::UARTE0;
use embassy_nrf::uarte::Uarte;
use embassy_time::Timer;

use crate::nrf::gap::Gap;
use crate::nrf::Notifier;

#[embassy_executor::task]
pub async fn console_task(
    mut uart: Uarte<'static, UARTE0>,
    notifier: &'static Notifier,
    gap: &'static Gap,
) -> ! {
    info!("console ready: a/d/w/s move, r restarts advertising");

    let mut byte = [0u8; 1];
    loop {
        if let Err(e) = uart.read(&mut byte).await {
            warn!("console read failed: {:?}", e);
            Timer::after_millis(10).await;
            continue;
        }

        match map_symbol(byte[0]) {
            ConsoleAction::Move(cmd) => {
                if notifier.is_subscribed() {
                    let _ = notifier.submit(cmd);
                } else {
                    debug!("console: no subscriber, {:?} dropped", cmd);
                }
            }
            ConsoleAction::RestartAdvertising => gap.start_advertising(),
            ConsoleAction::Ignore => {}
        }
    }
}
