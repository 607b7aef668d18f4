mod common;

use common::{display, drain, TestClient};
use lattice_client::{role_catalog, ModelChange, RoleValue, WindowIcon, WindowRole};
use lattice_compositor::{Display, WindowRequestEvent};
use lattice_core::protocol::{ObjectId, WindowId, WindowRequest, WindowState};
use pretty_assertions::assert_eq;
use rstest::rstest;
use tokio::sync::mpsc::UnboundedReceiver;

struct Fixture {
    display: Display,
    client: TestClient,
    object: ObjectId,
}

impl Fixture {
    fn new() -> Self {
        let mut display = display();
        let mut client = TestClient::connect(&mut display);
        let object = client.bind_window_model(&mut display);
        Self {
            display,
            client,
            object,
        }
    }

    fn subscribe(&mut self) -> UnboundedReceiver<ModelChange> {
        self.client.model_mut(self.object).subscribe()
    }

    fn roundtrip(&mut self) {
        self.client.roundtrip(&mut self.display).expect("roundtrip");
    }

    /// Creates a window and lets the client see it, including its initial batch.
    fn create_window(&mut self) -> WindowId {
        let id = self.display.window_management_mut().create_window().unwrap();
        self.roundtrip();
        id
    }

    fn data(&self, row: i32, role: WindowRole) -> RoleValue {
        self.client.model(self.object).data(row, role)
    }
}

#[test]
fn test_role_catalog_names() {
    let catalog = role_catalog();
    let names: Vec<&str> = catalog.iter().map(|(_, name)| *name).collect();
    assert_eq!(
        names,
        vec![
            "DisplayRole",
            "DecorationRole",
            "AppId",
            "IsActive",
            "IsFullscreenable",
            "IsFullscreen",
            "IsMaximizable",
            "IsMaximized",
            "IsMinimizable",
            "IsMinimized",
            "IsKeepAbove",
            "IsKeepBelow",
            "VirtualDesktop",
            "IsOnAllDesktops",
            "IsDemandingAttention",
            "SkipTaskbar",
            "IsShadeable",
            "IsShaded",
            "IsMovable",
            "IsResizable",
        ]
    );
}

#[test]
fn test_add_remove_rows() {
    let mut f = Fixture::new();
    assert_eq!(f.client.model(f.object).row_count(), 0);
    let mut changes = f.subscribe();

    let id = f.display.window_management_mut().create_window().unwrap();
    f.roundtrip();
    assert_eq!(f.client.model(f.object).row_count(), 1);
    assert_eq!(drain(&mut changes)[0], ModelChange::RowsInserted { first: 0, last: 0 });

    f.display.window_management_mut().close_window(id).unwrap();
    f.roundtrip();
    assert_eq!(f.client.model(f.object).row_count(), 0);
    assert_eq!(drain(&mut changes), vec![ModelChange::RowsRemoved { first: 0, last: 0 }]);
}

#[test]
fn test_row_count_tracks_creates_minus_closes() {
    let mut f = Fixture::new();
    let ids: Vec<WindowId> = (0..5).map(|_| f.create_window()).collect();
    f.display.window_management_mut().close_window(ids[1]).unwrap();
    f.display.window_management_mut().close_window(ids[3]).unwrap();
    f.roundtrip();

    let model = f.client.model(f.object);
    assert_eq!(model.row_count(), 3);
    let remaining: Vec<WindowId> = (0..model.row_count() as i32)
        .map(|row| model.item(row).unwrap().id())
        .collect();
    assert_eq!(remaining, vec![ids[0], ids[2], ids[4]]);
    assert!(model.item(3).is_none());
}

#[test]
fn test_creation_batch_changes_only_decoration() {
    let mut f = Fixture::new();
    let mut changes = f.subscribe();
    f.create_window();
    assert_eq!(
        drain(&mut changes),
        vec![
            ModelChange::RowsInserted { first: 0, last: 0 },
            ModelChange::DataChanged {
                row: 0,
                roles: vec![WindowRole::Decoration],
            },
        ]
    );
    assert_eq!(f.data(0, WindowRole::Decoration), RoleValue::Icon(WindowIcon::Fallback));
}

#[rstest]
#[case(WindowRole::Display, RoleValue::String(String::new()))]
#[case(WindowRole::AppId, RoleValue::String(String::new()))]
#[case(WindowRole::VirtualDesktop, RoleValue::UInt(0))]
#[case(WindowRole::IsActive, RoleValue::Bool(false))]
#[case(WindowRole::IsFullscreenable, RoleValue::Bool(false))]
#[case(WindowRole::IsFullscreen, RoleValue::Bool(false))]
#[case(WindowRole::IsMaximizable, RoleValue::Bool(false))]
#[case(WindowRole::IsMaximized, RoleValue::Bool(false))]
#[case(WindowRole::IsMinimizable, RoleValue::Bool(false))]
#[case(WindowRole::IsMinimized, RoleValue::Bool(false))]
#[case(WindowRole::IsKeepAbove, RoleValue::Bool(false))]
#[case(WindowRole::IsKeepBelow, RoleValue::Bool(false))]
#[case(WindowRole::IsOnAllDesktops, RoleValue::Bool(false))]
#[case(WindowRole::IsDemandingAttention, RoleValue::Bool(false))]
#[case(WindowRole::SkipTaskbar, RoleValue::Bool(false))]
#[case(WindowRole::IsShadeable, RoleValue::Bool(false))]
#[case(WindowRole::IsShaded, RoleValue::Bool(false))]
#[case(WindowRole::IsMovable, RoleValue::Bool(false))]
#[case(WindowRole::IsResizable, RoleValue::Bool(false))]
fn test_default_data(#[case] role: WindowRole, #[case] expected: RoleValue) {
    let mut f = Fixture::new();
    f.create_window();
    assert_eq!(f.data(0, role), expected);
}

#[rstest]
#[case(WindowRole::IsActive)]
#[case(WindowRole::IsFullscreenable)]
#[case(WindowRole::IsFullscreen)]
#[case(WindowRole::IsMaximizable)]
#[case(WindowRole::IsMaximized)]
#[case(WindowRole::IsMinimizable)]
#[case(WindowRole::IsMinimized)]
#[case(WindowRole::IsKeepAbove)]
#[case(WindowRole::IsKeepBelow)]
#[case(WindowRole::IsOnAllDesktops)]
#[case(WindowRole::IsDemandingAttention)]
#[case(WindowRole::SkipTaskbar)]
#[case(WindowRole::IsShadeable)]
#[case(WindowRole::IsShaded)]
#[case(WindowRole::IsMovable)]
#[case(WindowRole::IsResizable)]
fn test_boolean_role_toggle(#[case] role: WindowRole) {
    let mut f = Fixture::new();
    let id = f.create_window();
    let flag = role.state_flag().unwrap();
    let mut changes = f.subscribe();

    f.display.window_management_mut().set_state(id, flag, true).unwrap();
    f.roundtrip();
    assert_eq!(drain(&mut changes), vec![ModelChange::DataChanged { row: 0, roles: vec![role] }]);
    assert_eq!(f.data(0, role), RoleValue::Bool(true));

    f.display.window_management_mut().set_state(id, flag, false).unwrap();
    f.roundtrip();
    assert_eq!(drain(&mut changes), vec![ModelChange::DataChanged { row: 0, roles: vec![role] }]);
    assert_eq!(f.data(0, role), RoleValue::Bool(false));
}

#[test]
fn test_title_app_id_and_desktop() {
    let mut f = Fixture::new();
    let id = f.create_window();
    let mut changes = f.subscribe();
    let wm = f.display.window_management_mut();

    wm.set_title(id, "foo").unwrap();
    wm.set_app_id(id, "org.example.testapp").unwrap();
    wm.set_virtual_desktop(id, 1).unwrap();
    f.roundtrip();

    assert_eq!(
        drain(&mut changes),
        vec![
            ModelChange::DataChanged {
                row: 0,
                roles: vec![WindowRole::Display]
            },
            ModelChange::DataChanged {
                row: 0,
                roles: vec![WindowRole::AppId]
            },
            ModelChange::DataChanged {
                row: 0,
                roles: vec![WindowRole::VirtualDesktop]
            },
        ]
    );
    assert_eq!(f.data(0, WindowRole::Display).as_str(), Some("foo"));
    assert_eq!(f.data(0, WindowRole::AppId).as_str(), Some("org.example.testapp"));
    assert_eq!(f.data(0, WindowRole::VirtualDesktop).as_u32(), Some(1));
}

#[test]
fn test_setting_current_value_is_silent() {
    let mut f = Fixture::new();
    let id = f.create_window();
    f.display.window_management_mut().set_virtual_desktop(id, 1).unwrap();
    f.roundtrip();
    let mut changes = f.subscribe();

    assert!(!f.display.window_management_mut().set_virtual_desktop(id, 1).unwrap());
    assert!(!f.display.window_management_mut().set_title(id, "").unwrap());
    f.roundtrip();
    assert!(drain(&mut changes).is_empty());
}

#[test]
fn test_late_binding_replays_windows() {
    let mut display = display();
    let id = display.window_management_mut().create_window().unwrap();
    display.window_management_mut().set_title(id, "early").unwrap();
    display
        .window_management_mut()
        .set_state(id, WindowState::MAXIMIZED | WindowState::ON_ALL_DESKTOPS, true)
        .unwrap();

    let mut client = TestClient::connect(&mut display);
    let object = client.bind_window_model(&mut display);
    let model = client.model(object);
    assert_eq!(model.row_count(), 1);
    assert_eq!(model.data(0, WindowRole::Display).as_str(), Some("early"));
    assert_eq!(model.data(0, WindowRole::IsMaximized), RoleValue::Bool(true));
    assert_eq!(model.data(0, WindowRole::IsOnAllDesktops), RoleValue::Bool(true));
    assert_eq!(model.data(0, WindowRole::Decoration), RoleValue::Icon(WindowIcon::Fallback));
}

fn requests(rx: &mut UnboundedReceiver<WindowRequestEvent>) -> Vec<WindowRequest> {
    drain(rx).into_iter().map(|e| e.request).collect()
}

#[test]
fn test_requests() {
    let mut f = Fixture::new();
    let id = f.create_window();
    let mut forwarded = f.display.window_management_mut().subscribe_requests();
    let mut changes = f.subscribe();

    {
        let model = f.client.model(f.object);
        for row in [-1, 1] {
            model.request_activate(row);
            model.request_close(row);
            model.request_move(row);
            model.request_resize(row);
            model.request_virtual_desktop(row, 1);
            model.request_toggle_minimized(row);
            model.request_toggle_maximized(row);
            model.request_toggle_shaded(row);
        }
    }
    f.roundtrip();
    assert!(requests(&mut forwarded).is_empty());
    assert!(drain(&mut changes).is_empty());

    {
        let model = f.client.model(f.object);
        model.request_activate(0);
        model.request_close(0);
        model.request_move(0);
        model.request_resize(0);
        model.request_virtual_desktop(0, 1);
        model.request_toggle_minimized(0);
        model.request_toggle_maximized(0);
        model.request_toggle_shaded(0);
    }
    f.roundtrip();
    assert_eq!(
        requests(&mut forwarded),
        vec![
            WindowRequest::Activate { window: id },
            WindowRequest::Close { window: id },
            WindowRequest::Move { window: id },
            WindowRequest::Resize { window: id },
            WindowRequest::SetVirtualDesktop { window: id, desktop: 1 },
            WindowRequest::SetState {
                window: id,
                state: WindowState::MINIMIZED,
                enabled: true
            },
            WindowRequest::SetState {
                window: id,
                state: WindowState::MAXIMIZED,
                enabled: true
            },
            WindowRequest::SetState {
                window: id,
                state: WindowState::SHADED,
                enabled: true
            },
        ]
    );
    // Requests never touch local state.
    assert!(drain(&mut changes).is_empty());
    assert_eq!(f.data(0, WindowRole::IsMinimized), RoleValue::Bool(false));
    assert_eq!(f.display.window_management().window(id).unwrap().state(), WindowState::empty());
}

#[rstest]
#[case(WindowState::MINIMIZED)]
#[case(WindowState::MAXIMIZED)]
#[case(WindowState::SHADED)]
fn test_toggle_follows_compositor_state(#[case] flag: WindowState) {
    let mut f = Fixture::new();
    let id = f.create_window();
    let mut forwarded = f.display.window_management_mut().subscribe_requests();
    f.display.window_management_mut().set_state(id, flag, true).unwrap();
    f.roundtrip();

    {
        let model = f.client.model(f.object);
        if flag == WindowState::MINIMIZED {
            model.request_toggle_minimized(0);
        } else if flag == WindowState::MAXIMIZED {
            model.request_toggle_maximized(0);
        } else {
            model.request_toggle_shaded(0);
        }
    }
    f.roundtrip();
    assert_eq!(
        requests(&mut forwarded),
        vec![WindowRequest::SetState {
            window: id,
            state: flag,
            enabled: false
        }]
    );
}

#[test]
fn test_request_for_closed_window_is_dropped() {
    let mut f = Fixture::new();
    let id = f.create_window();
    let mut forwarded = f.display.window_management_mut().subscribe_requests();

    // The client still shows the window when it sends the request.
    f.client.model(f.object).request_activate(0);
    f.display.window_management_mut().close_window(id).unwrap();
    f.roundtrip();
    assert!(requests(&mut forwarded).is_empty());
    assert_eq!(f.client.model(f.object).row_count(), 0);
}

#[test]
fn test_models_on_two_connections_agree() {
    let mut display = display();
    let mut a = TestClient::connect(&mut display);
    let mut b = TestClient::connect(&mut display);
    let wa = a.bind_window_model(&mut display);
    let wb = b.bind_window_model(&mut display);

    let id = display.window_management_mut().create_window().unwrap();
    display.window_management_mut().set_title(id, "shared").unwrap();
    a.roundtrip(&mut display).unwrap();
    b.roundtrip(&mut display).unwrap();

    assert_eq!(a.model(wa).items(), b.model(wb).items());
    assert_eq!(b.model(wb).data(0, WindowRole::Display).as_str(), Some("shared"));
}
