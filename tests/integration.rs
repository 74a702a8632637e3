//! End-to-end behaviour of the engine against a mock host controller.

use std::cell::RefCell;

use ble_hid_mouse::ble::advertising::{ad_type, AdvertisingParams, AdvertisingPayload};
use ble_hid_mouse::ble::bonds::BondTable;
use ble_hid_mouse::ble::connection::SharedLink;
use ble_hid_mouse::ble::dispatcher::Phase;
use ble_hid_mouse::ble::host::{HostController, ReportTransport};
use ble_hid_mouse::ble::{AttrHandle, ConnHandle, PeerAddress};
use ble_hid_mouse::command::{enqueue, MoveChannel};
use ble_hid_mouse::error::{HostError, TransmitError};
use ble_hid_mouse::gatt::{
    register_tree, AccessContract, AccessOp, AccessOutcome, AttributeRegistrar,
    CharacteristicHandles, CharacteristicInit, ServiceDef, ServiceHandles, ATTRIBUTE_TREE,
};
use ble_hid_mouse::hid::MOUSE_REPORT_MAP;
use ble_hid_mouse::http::handle_request_line;
use ble_hid_mouse::{Delivery, Dispatcher, EventReply, HostEvent, MoveCommand, ReportNotifier};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

type Link = SharedLink<CriticalSectionRawMutex>;

/// Numbers attributes in declaration order, one handle each plus a CCCD
/// after every notifiable value.
#[derive(Default)]
struct Registrar {
    next: u16,
}

impl AttributeRegistrar for Registrar {
    fn add_service(
        &mut self,
        _service: &ServiceDef,
        characteristics: &[CharacteristicInit<'_>],
    ) -> Result<ServiceHandles, HostError> {
        self.next += 1;
        let mut out = ServiceHandles::new();
        for c in characteristics {
            self.next += 2;
            let mut handles = CharacteristicHandles {
                value: self.next,
                ..Default::default()
            };
            if c.def.properties.has_cccd() {
                self.next += 1;
                handles.cccd = Some(self.next);
            }
            for _ in &c.descriptors {
                self.next += 1;
                handles.descriptors.push(self.next).unwrap();
            }
            out.push(handles).unwrap();
        }
        Ok(out)
    }
}

#[derive(Default)]
struct MockHost {
    adverts: Vec<AdvertisingPayload>,
    stops: usize,
    bonds: BondTable<u32, 4>,
}

impl HostController for MockHost {
    fn start_advertising(
        &mut self,
        payload: &AdvertisingPayload,
        _params: &AdvertisingParams,
    ) -> Result<(), HostError> {
        self.adverts.push(payload.clone());
        Ok(())
    }

    fn stop_advertising(&mut self) -> Result<(), HostError> {
        self.stops += 1;
        Ok(())
    }

    fn delete_bond(&mut self, peer: &PeerAddress) -> Result<(), HostError> {
        self.bonds
            .remove(peer)
            .map(|_| ())
            .ok_or(HostError::new(0x05))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Sent {
    Notify(ConnHandle, AttrHandle, Vec<u8>),
    Indicate(ConnHandle, AttrHandle, Vec<u8>),
}

#[derive(Default)]
struct Air {
    sent: RefCell<Vec<Sent>>,
}

impl ReportTransport for Air {
    fn notify(&self, conn: ConnHandle, handle: AttrHandle, data: &[u8]) -> Result<(), TransmitError> {
        self.sent.borrow_mut().push(Sent::Notify(conn, handle, data.to_vec()));
        Ok(())
    }

    fn indicate(&self, conn: ConnHandle, handle: AttrHandle, data: &[u8])
        -> Result<(), TransmitError> {
        self.sent.borrow_mut().push(Sent::Indicate(conn, handle, data.to_vec()));
        Ok(())
    }
}

fn subscribe(handle: ConnHandle, attr_handle: AttrHandle, notify: bool, indicate: bool) -> HostEvent {
    HostEvent::Subscribe {
        handle,
        attr_handle,
        notify,
        indicate,
    }
}

#[test]
fn notify_scenario_delivers_report_bytes() {
    let registration = register_tree(&mut Registrar::default(), ATTRIBUTE_TREE).unwrap();
    let link = Link::new();
    let mut dispatcher = Dispatcher::new(&registration, &link);
    let mut host = MockHost::default();
    let air = Air::default();
    let notifier = ReportNotifier::new(&registration, &link, &air);

    dispatcher.start_advertising(&mut host).unwrap();
    dispatcher.dispatch(HostEvent::Connected { handle: 3 }, &mut host);
    dispatcher.dispatch(subscribe(3, registration.report_handle(), true, false), &mut host);

    assert_eq!(notifier.submit_move(0, 20, 0, 0), Ok(Delivery::Notified));
    assert_eq!(
        air.sent.borrow().as_slice(),
        &[Sent::Notify(3, registration.report_handle(), vec![0x00, 0x14, 0x00, 0x00])]
    );
}

#[test]
fn report_read_returns_last_submission() {
    let registration = register_tree(&mut Registrar::default(), ATTRIBUTE_TREE).unwrap();
    let link = Link::new();
    let air = Air::default();
    let notifier = ReportNotifier::new(&registration, &link, &air);

    notifier.submit_move(0x01, -5, 7, 0).unwrap();
    notifier.submit_move(0x02, 3, -1, 1).unwrap();

    match notifier.access(AccessContract::Report, AccessOp::Read) {
        Ok(AccessOutcome::Value(v)) => assert_eq!(v.as_slice(), &[0x02, 0x03, 0xFF, 0x01]),
        other => panic!("unexpected {other:?}"),
    }
    // Nobody subscribed, so nothing went out.
    assert!(air.sent.borrow().is_empty());
}

#[test]
fn indication_wins_when_both_enabled() {
    let registration = register_tree(&mut Registrar::default(), ATTRIBUTE_TREE).unwrap();
    let link = Link::new();
    let mut dispatcher = Dispatcher::new(&registration, &link);
    let mut host = MockHost::default();
    let air = Air::default();
    let notifier = ReportNotifier::new(&registration, &link, &air);

    dispatcher.dispatch(HostEvent::Connected { handle: 1 }, &mut host);
    let cccd = registration.report_cccd().unwrap();
    dispatcher.dispatch(subscribe(1, cccd, true, true), &mut host);

    assert_eq!(notifier.submit_move(0, 1, 1, 0), Ok(Delivery::Indicated));
    assert!(matches!(air.sent.borrow()[0], Sent::Indicate(1, _, _)));
}

#[test]
fn disconnect_before_subscribe_restarts_advertising_once() {
    let registration = register_tree(&mut Registrar::default(), ATTRIBUTE_TREE).unwrap();
    let link = Link::new();
    let mut dispatcher = Dispatcher::new(&registration, &link);
    let mut host = MockHost::default();

    dispatcher.start_advertising(&mut host).unwrap();
    dispatcher.dispatch(HostEvent::Connected { handle: 7 }, &mut host);
    assert!(!link.is_subscribed());
    dispatcher.dispatch(
        HostEvent::Disconnected {
            handle: 7,
            reason: Some(0x13),
        },
        &mut host,
    );

    assert!(!link.is_subscribed());
    assert_eq!(link.get().handle(), None);
    // Boot start plus exactly one restart.
    assert_eq!(host.adverts.len(), 2);
    assert_eq!(dispatcher.phase(), Phase::Advertising);
}

#[test]
fn repeat_pairing_drops_bond_and_retries() {
    let registration = register_tree(&mut Registrar::default(), ATTRIBUTE_TREE).unwrap();
    let link = Link::new();
    let mut dispatcher = Dispatcher::new(&registration, &link);
    let mut host = MockHost::default();
    let peer = PeerAddress::new(1, [0x11, 0x22, 0x33, 0x44, 0x55, 0xC6]);
    host.bonds.insert(peer, 42);

    dispatcher.dispatch(HostEvent::Connected { handle: 2 }, &mut host);
    let reply = dispatcher.dispatch(HostEvent::RepeatPairing { handle: 2, peer }, &mut host);

    assert_eq!(reply, EventReply::RetryPairing);
    assert!(!host.bonds.contains(&peer));
    assert_eq!(dispatcher.phase(), Phase::Connected);
}

#[test]
fn advertisement_carries_mouse_identity() {
    let registration = register_tree(&mut Registrar::default(), ATTRIBUTE_TREE).unwrap();
    let link = Link::new();
    let mut dispatcher = Dispatcher::new(&registration, &link);
    let mut host = MockHost::default();

    dispatcher.start_advertising(&mut host).unwrap();
    let payload = &host.adverts[0];
    assert_eq!(payload.field(ad_type::FLAGS), Some(&[0x05][..]));
    assert_eq!(payload.field(ad_type::COMPLETE_LOCAL_NAME), Some(&b"ble_mouse"[..]));
    assert_eq!(payload.field(ad_type::APPEARANCE), Some(&[0xC2, 0x03][..]));
    assert_eq!(payload.field(ad_type::COMPLETE_UUID16), Some(&[0x12, 0x18][..]));
}

#[test]
fn advertising_expiry_leaves_device_idle() {
    let registration = register_tree(&mut Registrar::default(), ATTRIBUTE_TREE).unwrap();
    let link = Link::new();
    let mut dispatcher = Dispatcher::new(&registration, &link);
    let mut host = MockHost::default();

    dispatcher.start_advertising(&mut host).unwrap();
    dispatcher.dispatch(HostEvent::AdvertisingComplete, &mut host);
    assert_eq!(dispatcher.phase(), Phase::Idle);
    assert_eq!(host.stops, 1);

    // Manual restart.
    dispatcher.start_advertising(&mut host).unwrap();
    assert_eq!(host.adverts.len(), 2);
}

#[test]
fn http_request_reaches_subscriber() {
    let registration = register_tree(&mut Registrar::default(), ATTRIBUTE_TREE).unwrap();
    let link = Link::new();
    let mut dispatcher = Dispatcher::new(&registration, &link);
    let mut host = MockHost::default();
    let air = Air::default();
    let notifier = ReportNotifier::new(&registration, &link, &air);
    let moves: MoveChannel<CriticalSectionRawMutex> = MoveChannel::new();

    dispatcher.dispatch(HostEvent::Connected { handle: 4 }, &mut host);
    dispatcher.dispatch(subscribe(4, registration.report_handle(), true, false), &mut host);

    let handled = handle_request_line("GET /mouse?x=5&y=-3&click=true HTTP/1.1");
    assert_eq!(handled.response.status, 200);
    let cmd = handled.command.unwrap();
    assert_eq!(cmd, MoveCommand::new(5, -3, 0x01));
    assert!(enqueue(&moves.sender(), cmd));

    let queued = moves.try_receive().unwrap();
    assert_eq!(notifier.submit(queued), Ok(Delivery::Notified));
    assert_eq!(
        air.sent.borrow()[0],
        Sent::Notify(4, registration.report_handle(), vec![0x01, 0x05, 0xFD, 0x00])
    );
}

#[test]
fn fixed_attributes_are_stable() {
    let registration = register_tree(&mut Registrar::default(), ATTRIBUTE_TREE).unwrap();
    let link = Link::new();
    let air = Air::default();
    let notifier = ReportNotifier::new(&registration, &link, &air);

    for _ in 0..2 {
        match notifier.access(AccessContract::ReportMap, AccessOp::Read) {
            Ok(AccessOutcome::Value(v)) => assert_eq!(v.as_slice(), MOUSE_REPORT_MAP),
            other => panic!("unexpected {other:?}"),
        }
    }

    let before = notifier.snapshot();
    assert_eq!(
        notifier.access(AccessContract::HidControlPoint, AccessOp::Write(&[0x00])),
        Ok(AccessOutcome::Accepted)
    );
    assert_eq!(notifier.snapshot(), before);
}
