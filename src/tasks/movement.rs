//! Drains queued moves into the notifier.

use ble_hid_mouse::command::MoveReceiver;
use defmt::{debug, info};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

use crate::nrf::Notifier;

#[embassy_executor::task]
pub async fn movement_task(
    moves: MoveReceiver<'static, CriticalSectionRawMutex>,
    notifier: &'static Notifier,
) -> ! {
    info!("movement task started");

    loop {
        let cmd = moves.receive().await;
        if notifier.is_subscribed() {
            let _ = notifier.submit(cmd);
        } else {
            debug!("no subscriber, {:?} dropped", cmd);
        }
    }
}
