//! BLE HID mouse firmware for the nRF52840 (S140 SoftDevice).
//!
//! Boot order: SoftDevice up, attribute tree registered, wait for the
//! identity address, GAP parameters applied, advertising started. Moves
//! come from the UARTE0 console and the HTTP gateway on UARTE1.

#![no_std]
#![no_main]

mod nrf;
mod tasks;

use core::mem;

use ble_hid_mouse::ble::advertising::AdvertisingParams;
use ble_hid_mouse::config::{APPEARANCE_MOUSE, DEVICE_NAME, HOST_SYNC_TIMEOUT_MS};
use ble_hid_mouse::gatt::{register_tree, Registration, ATTRIBUTE_TREE};
use ble_hid_mouse::{Dispatcher, Error, ReportNotifier};
use defmt::{info, unwrap, warn};
use embassy_executor::Spawner;
use embassy_nrf::interrupt::{self, InterruptExt, Priority};
use embassy_nrf::{bind_interrupts, peripherals, uarte};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;
use embassy_time::{with_timeout, Duration};
use nrf_softdevice::ble::{self, Address};
use nrf_softdevice::{raw, Softdevice};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use crate::nrf::bonder::Bonder;
use crate::nrf::gap::{configure_gap, gap_task, Gap};
use crate::nrf::host::{SoftdeviceHost, SoftdeviceTransport};
use crate::nrf::server::{HidServer, SoftdeviceRegistrar};
use crate::nrf::{Link, Notifier};
use crate::tasks::console::console_task;
use crate::tasks::gateway::gateway_task;
use crate::tasks::movement::movement_task;
use crate::tasks::Moves;

bind_interrupts!(struct Irqs {
    UARTE0_UART0 => uarte::InterruptHandler<peripherals::UARTE0>;
    UARTE1 => uarte::InterruptHandler<peripherals::UARTE1>;
});

static LINK: Link = Link::new();
static MOVES: Moves = Channel::new();
static BONDER: Bonder = Bonder::new();
static HOST_READY: Signal<CriticalSectionRawMutex, Address> = Signal::new();

static REGISTRATION: StaticCell<Registration> = StaticCell::new();
static NOTIFIER: StaticCell<Notifier> = StaticCell::new();
static SERVER: StaticCell<HidServer> = StaticCell::new();
static GAP: StaticCell<Gap> = StaticCell::new();

fn softdevice_config() -> nrf_softdevice::Config {
    nrf_softdevice::Config {
        clock: Some(raw::nrf_clock_lf_cfg_t {
            source: raw::NRF_CLOCK_LF_SRC_RC as u8,
            rc_ctiv: 16,
            rc_temp_ctiv: 2,
            accuracy: raw::NRF_CLOCK_LF_ACCURACY_500_PPM as u8,
        }),
        conn_gap: Some(raw::ble_gap_conn_cfg_t {
            conn_count: 1,
            event_length: 24,
        }),
        conn_gatt: Some(raw::ble_gatt_conn_cfg_t { att_mtu: 23 }),
        gatts_attr_tab_size: Some(raw::ble_gatts_cfg_attr_tab_size_t {
            attr_tab_size: raw::BLE_GATTS_ATTR_TAB_SIZE_DEFAULT,
        }),
        gap_role_count: Some(raw::ble_gap_cfg_role_count_t {
            adv_set_count: 1,
            periph_role_count: 1,
            central_role_count: 0,
            central_sec_count: 0,
            _bitfield_1: raw::ble_gap_cfg_role_count_t::new_bitfield_1(0),
        }),
        gap_device_name: Some(raw::ble_gap_cfg_device_name_t {
            p_value: DEVICE_NAME.as_ptr() as _,
            current_len: DEVICE_NAME.len() as u16,
            max_len: DEVICE_NAME.len() as u16,
            write_perm: unsafe { mem::zeroed() },
            _bitfield_1: raw::ble_gap_cfg_device_name_t::new_bitfield_1(
                raw::BLE_GATTS_VLOC_STACK as u8,
            ),
        }),
        ..Default::default()
    }
}

#[embassy_executor::task]
async fn softdevice_task(sd: &'static Softdevice) -> ! {
    HOST_READY.signal(ble::get_address(sd));
    sd.run().await
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("ble-hid-mouse starting");

    // The SoftDevice reserves priorities 0, 1 and 4.
    let mut nrf_config = embassy_nrf::config::Config::default();
    nrf_config.gpiote_interrupt_priority = Priority::P2;
    nrf_config.time_interrupt_priority = Priority::P2;
    let p = embassy_nrf::init(nrf_config);
    interrupt::UARTE0_UART0.set_priority(Priority::P3);
    interrupt::UARTE1.set_priority(Priority::P3);

    let sd = Softdevice::enable(&softdevice_config());

    let registration = match register_tree(&mut SoftdeviceRegistrar::new(&mut *sd), ATTRIBUTE_TREE) {
        Ok(r) => REGISTRATION.init(r),
        Err(e) => defmt::panic!("{:?}", Error::from(e)),
    };
    let sd: &'static Softdevice = sd;
    unwrap!(spawner.spawn(softdevice_task(sd)));

    match with_timeout(Duration::from_millis(HOST_SYNC_TIMEOUT_MS), HOST_READY.wait()).await {
        Ok(addr) => info!("host ready, address {:?}", addr),
        Err(_) => defmt::panic!("{:?}", Error::HostSync),
    }

    if let Err(e) = configure_gap(APPEARANCE_MOUSE, &AdvertisingParams::HID_MOUSE) {
        warn!("GAP parameters not applied: {:?}", e);
    }

    let notifier = NOTIFIER.init(ReportNotifier::new(
        registration,
        &LINK,
        SoftdeviceTransport::new(sd),
    ));
    let server = SERVER.init(HidServer::new(registration, notifier));
    let gap = GAP.init(Gap::new(
        Dispatcher::new(registration, &LINK),
        SoftdeviceHost::new(&BONDER),
    ));
    BONDER.attach(gap, registration);

    gap.start_advertising();
    unwrap!(spawner.spawn(gap_task(sd, gap, server, &BONDER)));

    let mut uart_config = uarte::Config::default();
    uart_config.parity = uarte::Parity::EXCLUDED;
    uart_config.baudrate = uarte::Baudrate::BAUD115200;

    let console = uarte::Uarte::new(p.UARTE0, Irqs, p.P0_08, p.P0_06, uart_config.clone());
    let gateway = uarte::Uarte::new(p.UARTE1, Irqs, p.P1_01, p.P1_02, uart_config);

    unwrap!(spawner.spawn(console_task(console, notifier, gap)));
    unwrap!(spawner.spawn(gateway_task(gateway, MOVES.sender())));
    unwrap!(spawner.spawn(movement_task(MOVES.receiver(), notifier)));

    info!("ble-hid-mouse running");
}
