mod common;

use common::{display, drain, TestClient};
use lattice_client::SeatChange;
use lattice_core::protocol::{ObjectId, Request, SeatCapabilities, SeatRequest, SubchannelKind};
use pretty_assertions::assert_eq;

#[test]
fn test_bind_reports_current_state() {
    let mut display = display();
    let mut client = TestClient::connect(&mut display);
    let seat = client.bind_seat(&mut display, 3);

    let mirror = client.queue.seat(seat).unwrap();
    assert_eq!(mirror.capabilities(), SeatCapabilities::POINTER | SeatCapabilities::KEYBOARD);
    assert_eq!(mirror.name(), Some("seat0"));
}

#[test]
fn test_version_one_binding_gets_no_name() {
    let mut display = display();
    let mut client = TestClient::connect(&mut display);
    let seat = client.bind_seat(&mut display, 1);

    display.seat_mut().set_name("seat1");
    client.roundtrip(&mut display).unwrap();
    let mirror = client.queue.seat(seat).unwrap();
    assert!(mirror.has_pointer());
    assert_eq!(mirror.name(), None);
}

#[test]
fn test_added_capability_reaches_every_connection_as_union() {
    let mut display = display();
    let mut clients: Vec<(TestClient, ObjectId)> = (0..3)
        .map(|_| {
            let mut client = TestClient::connect(&mut display);
            let seat = client.bind_seat(&mut display, 3);
            (client, seat)
        })
        .collect();
    let mut subscriptions: Vec<_> = clients
        .iter_mut()
        .map(|(client, seat)| client.queue.seat_mut(*seat).unwrap().subscribe())
        .collect();

    assert!(display.seat_mut().set_has_touch(true));
    for ((client, seat), rx) in clients.iter_mut().zip(subscriptions.iter_mut()) {
        client.roundtrip(&mut display).unwrap();
        assert_eq!(
            drain(rx),
            vec![SeatChange::Capabilities(
                SeatCapabilities::POINTER | SeatCapabilities::KEYBOARD | SeatCapabilities::TOUCH
            )]
        );
        assert!(client.queue.seat(*seat).unwrap().has_touch());
    }
}

#[test]
fn test_unchanged_capabilities_are_not_rebroadcast() {
    let mut display = display();
    let mut client = TestClient::connect(&mut display);
    client.bind_seat(&mut display, 3);

    assert!(!display.seat_mut().set_has_pointer(true));
    assert!(!display.seat_mut().set_name("seat0"));
    assert_eq!(client.roundtrip(&mut display), Ok(0));
}

#[test]
fn test_released_seat_no_longer_receives_updates() {
    let mut display = display();
    let mut client = TestClient::connect(&mut display);
    let seat = client.bind_seat(&mut display, 3);
    client.send(
        seat,
        SeatRequest::BindSubchannel {
            kind: SubchannelKind::Pointer,
            id: client.connection.new_object_id(),
        },
    );
    client.roundtrip(&mut display).unwrap();
    assert_eq!(display.seat().subchannel_count(SubchannelKind::Pointer), 1);

    client.send(seat, Request::Release);
    client.roundtrip(&mut display).unwrap();
    assert!(client.queue.seat(seat).is_none());
    assert_eq!(display.seat().bound_resources().count(), 0);

    display.seat_mut().set_has_touch(true);
    assert_eq!(client.roundtrip(&mut display), Ok(0));
}

#[test]
fn test_disconnect_of_one_client_keeps_others_bound() {
    let mut display = display();
    let mut a = TestClient::connect(&mut display);
    let mut b = TestClient::connect(&mut display);
    a.bind_seat(&mut display, 3);
    let seat_b = b.bind_seat(&mut display, 3);

    display.disconnect(a.id);
    assert_eq!(display.seat().bound_resources().count(), 1);

    display.seat_mut().set_has_keyboard(false);
    b.roundtrip(&mut display).unwrap();
    assert!(!b.queue.seat(seat_b).unwrap().has_keyboard());
}
