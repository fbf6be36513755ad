use std::{cell::RefCell, fs::File, os::fd::OwnedFd, rc::Rc};

use cgmath::{Point2, Vector2};
use slotmap::KeyData;

use super::{
    ButtonState, Capabilities, KeyState, KeyboardResource, Keymap, Modifiers, PointerResource, Protocol, Seat,
    SeatResource,
};
use crate::{
    output::OutputId,
    view::{View, ViewId, Views},
};

pub(crate) type Log = Rc<RefCell<Vec<String>>>;

/// Resources which record the events sent to them.
#[derive(Debug)]
pub(crate) struct Fake;

#[derive(Debug, Clone)]
pub(crate) struct FakeResource {
    name: &'static str,
    log: Log,
}

impl FakeResource {
    pub fn new(name: &'static str, log: &Log) -> Self {
        Self { name, log: log.clone() }
    }

    fn record(&self, event: String) {
        self.log.borrow_mut().push(format!("{}: {}", self.name, event));
    }
}

impl Protocol for Fake {
    type ClientId = u32;
    type Surface = &'static str;
    type Seat = FakeResource;
    type Pointer = FakeResource;
    type Keyboard = FakeResource;
}

impl SeatResource for FakeResource {
    fn send_capabilities(&self, capabilities: Capabilities) {
        self.record(format!("capabilities {}", capabilities.bits()));
    }

    fn send_name(&self, name: &str) {
        self.record(format!("name {name}"));
    }
}

impl PointerResource<Fake> for FakeResource {
    fn send_enter(&self, serial: u32, surface: &&'static str, position: Point2<f32>) {
        self.record(format!("enter {serial} {surface} {},{}", position.x, position.y));
    }

    fn send_leave(&self, _serial: u32, surface: &&'static str) {
        self.record(format!("leave {surface}"));
    }

    fn send_motion(&self, _time: u32, position: Point2<f32>) {
        self.record(format!("motion {},{}", position.x, position.y));
    }

    fn send_button(&self, serial: u32, _time: u32, button: u32, state: ButtonState) {
        self.record(format!("button {button} {state:?} {serial}"));
    }

    fn send_frame(&self) {}
}

impl KeyboardResource<Fake> for FakeResource {
    fn send_keymap(&self, keymap: &Keymap) {
        self.record(format!("keymap {} {}", keymap.format, keymap.size));
    }

    fn send_enter(&self, _serial: u32, surface: &&'static str, _keys: &[u32]) {
        self.record(format!("enter {surface}"));
    }

    fn send_leave(&self, _serial: u32, surface: &&'static str) {
        self.record(format!("leave {surface}"));
    }

    fn send_key(&self, _serial: u32, _time: u32, key: u32, state: KeyState) {
        self.record(format!("key {key} {state:?}"));
    }

    fn send_modifiers(&self, _serial: u32, modifiers: Modifiers) {
        self.record(format!("modifiers {}", modifiers.depressed));
    }
}

pub(crate) fn output(n: u64) -> OutputId {
    KeyData::from_ffi(n).into()
}

fn view(views: &mut Views<Fake>, client: u32, surface: &'static str, x: f32, y: f32) -> ViewId {
    views.insert(View {
        client,
        surface,
        output: output(1),
        position: Point2::new(x, y),
        size: Vector2::new(100.0, 100.0),
    })
}

fn keymap(size: u32) -> Keymap {
    Keymap {
        format: 1,
        fd: OwnedFd::from(File::open("/dev/null").unwrap()),
        size,
    }
}

fn take(log: &Log) -> Vec<String> {
    std::mem::take(&mut *log.borrow_mut())
}

/// A client binding a seat without devices learns there are none and the seat's name.
#[test]
fn bind_without_devices() {
    let log = Log::default();
    let mut seat = Seat::<Fake>::new("default");

    seat.bind(1, FakeResource::new("seat", &log));

    assert_eq!(take(&log), ["seat: capabilities 0", "seat: name default"]);
}

/// Binding only notifies the binding client, device changes notify everyone.
#[test]
fn capabilities_follow_devices() {
    let log = Log::default();
    let mut seat = Seat::<Fake>::new("default");
    seat.bind(1, FakeResource::new("a", &log));
    take(&log);

    seat.bind(2, FakeResource::new("b", &log));
    assert_eq!(take(&log), ["b: capabilities 0", "b: name default"]);

    seat.init_pointer();
    assert_eq!(seat.capabilities(), Capabilities::POINTER);
    assert_eq!(take(&log), ["a: capabilities 1", "b: capabilities 1"]);

    // Already has a pointer.
    seat.init_pointer();
    assert!(take(&log).is_empty());

    seat.init_keyboard();
    assert_eq!(seat.capabilities(), Capabilities::POINTER | Capabilities::KEYBOARD);
    assert_eq!(take(&log), ["a: capabilities 3", "b: capabilities 3"]);

    seat.release_pointer();
    seat.release_pointer();
    assert_eq!(seat.capabilities(), Capabilities::KEYBOARD);
    assert_eq!(take(&log), ["a: capabilities 2", "b: capabilities 2"]);

    seat.unbind(&1, |resource| resource.name == "a");
    seat.release_keyboard();
    assert_eq!(take(&log), ["b: capabilities 0"]);
}

/// A pointer requested while there is no pointer never receives events, even once a pointer exists again.
#[test]
fn pointer_without_device_is_inert() {
    let log = Log::default();
    let mut views = Views::<Fake>::new();
    let mut seat = Seat::<Fake>::new("default");
    let a_view = view(&mut views, 1, "a-surface", 0.0, 0.0);
    let b_view = view(&mut views, 2, "b-surface", 200.0, 0.0);

    seat.init_pointer();
    assert!(seat.get_pointer(&1, FakeResource::new("a", &log)));

    seat.release_pointer();
    assert!(!seat.get_pointer(&2, FakeResource::new("b", &log)));

    seat.init_pointer();
    assert!(seat.get_pointer(&1, FakeResource::new("a", &log)));

    seat.notify_pointer_motion_abs(&mut views, output(1), Point2::new(210.0, 10.0), 0);
    assert_eq!(seat.pointer().unwrap().focus(), Some(b_view));
    assert!(take(&log).is_empty());

    seat.notify_pointer_motion_abs(&mut views, output(1), Point2::new(10.0, 10.0), 1);
    assert_eq!(seat.pointer().unwrap().focus(), Some(a_view));
    let events = take(&log);
    assert!(events[0].starts_with("a: enter"));
    assert_eq!(events[1], "a: motion 10,10");
}

#[test]
fn focus_moves_between_views() {
    let log = Log::default();
    let mut views = Views::<Fake>::new();
    let mut seat = Seat::<Fake>::new("default");
    view(&mut views, 1, "a-surface", 0.0, 0.0);
    view(&mut views, 2, "b-surface", 200.0, 0.0);

    seat.init_pointer();
    seat.get_pointer(&1, FakeResource::new("a", &log));
    seat.get_pointer(&2, FakeResource::new("b", &log));

    seat.notify_pointer_motion_abs(&mut views, output(1), Point2::new(50.0, 25.0), 0);
    seat.notify_pointer_motion_abs(&mut views, output(1), Point2::new(250.0, 25.0), 1);

    let events = take(&log);
    assert_eq!(events.len(), 5);
    assert!(events[0].starts_with("a: enter") && events[0].ends_with("a-surface 50,25"));
    assert_eq!(events[2], "a: leave a-surface");
    assert!(events[3].starts_with("b: enter") && events[3].ends_with("b-surface 50,25"));
    assert_eq!(events[4], "b: motion 50,25");
}

/// A destroyed focus is dropped quietly.
#[test]
fn stale_focus_is_ignored() {
    let log = Log::default();
    let mut views = Views::<Fake>::new();
    let mut seat = Seat::<Fake>::new("default");
    let focus = view(&mut views, 1, "a-surface", 0.0, 0.0);

    seat.init_pointer();
    seat.get_pointer(&1, FakeResource::new("a", &log));
    seat.notify_pointer_motion_abs(&mut views, output(1), Point2::new(10.0, 10.0), 0);
    assert_eq!(seat.pointer().unwrap().focus(), Some(focus));
    take(&log);

    views.remove(focus);
    seat.notify_pointer_button(&mut views, 1, 0x110, ButtonState::Pressed, 5);
    seat.notify_pointer_motion_abs(&mut views, output(1), Point2::new(20.0, 20.0), 2);

    assert!(take(&log).is_empty());
    assert_eq!(seat.pointer().unwrap().focus(), None);
}

/// The grab position and serial are taken from the press which starts a sequence of held buttons.
#[test]
fn button_count_and_grab_serial() {
    let log = Log::default();
    let mut views = Views::<Fake>::new();
    let mut seat = Seat::<Fake>::new("default");
    view(&mut views, 1, "a-surface", 0.0, 0.0);

    seat.init_pointer();
    seat.get_pointer(&1, FakeResource::new("a", &log));
    seat.notify_pointer_motion_abs(&mut views, output(1), Point2::new(10.0, 20.0), 0);
    take(&log);

    seat.notify_pointer_button(&mut views, 1, 1, ButtonState::Pressed, 42);
    let pointer = seat.pointer().unwrap();
    assert_eq!(pointer.button_count(), 1);
    assert_eq!(pointer.grab_serial(), 42);
    assert_eq!(pointer.grab_position(), Point2::new(10.0, 20.0));
    assert_eq!(take(&log), ["a: button 1 Pressed 42"]);

    seat.notify_pointer_motion_abs(&mut views, output(1), Point2::new(30.0, 30.0), 2);
    seat.notify_pointer_button(&mut views, 3, 2, ButtonState::Pressed, 43);
    let pointer = seat.pointer().unwrap();
    assert_eq!(pointer.button_count(), 2);
    assert_eq!(pointer.grab_serial(), 42);
    assert_eq!(pointer.grab_position(), Point2::new(10.0, 20.0));

    seat.notify_pointer_button(&mut views, 4, 2, ButtonState::Released, 44);
    assert_eq!(seat.pointer().unwrap().button_count(), 1);
    assert_eq!(seat.pointer().unwrap().grab_serial(), 42);

    seat.notify_pointer_button(&mut views, 5, 1, ButtonState::Released, 45);
    seat.notify_pointer_button(&mut views, 6, 1, ButtonState::Released, 46);
    assert_eq!(seat.pointer().unwrap().button_count(), 0);

    seat.notify_pointer_button(&mut views, 7, 1, ButtonState::Pressed, 47);
    assert_eq!(seat.pointer().unwrap().grab_serial(), 47);
    assert_eq!(seat.pointer().unwrap().grab_position(), Point2::new(30.0, 30.0));
}

#[test]
fn leave_resets_pointer() {
    let log = Log::default();
    let mut views = Views::<Fake>::new();
    let mut seat = Seat::<Fake>::new("default");
    view(&mut views, 1, "a-surface", 0.0, 0.0);

    seat.init_pointer();
    seat.get_pointer(&1, FakeResource::new("a", &log));
    seat.notify_pointer_motion_abs(&mut views, output(1), Point2::new(10.0, 20.0), 0);
    seat.notify_pointer_button(&mut views, 1, 1, ButtonState::Pressed, 9);
    seat.notify_pointer_button(&mut views, 1, 2, ButtonState::Pressed, 10);
    take(&log);

    seat.notify_pointer_leave(&mut views);

    let pointer = seat.pointer().unwrap();
    assert_eq!(pointer.focus(), None);
    assert_eq!(pointer.button_count(), 0);
    assert_eq!(pointer.grab_serial(), 0);
    assert_eq!(take(&log), ["a: leave a-surface"]);
}

#[test]
fn move_grab_follows_pointer() {
    let log = Log::default();
    let mut views = Views::<Fake>::new();
    let mut seat = Seat::<Fake>::new("default");
    let moved = view(&mut views, 1, "a-surface", 0.0, 0.0);

    seat.init_pointer();
    seat.get_pointer(&1, FakeResource::new("a", &log));
    seat.notify_pointer_motion_abs(&mut views, output(1), Point2::new(10.0, 10.0), 0);

    // Nothing is held yet.
    assert!(!seat.start_move(&views, moved, 1));

    seat.notify_pointer_button(&mut views, 1, 1, ButtonState::Pressed, 7);
    assert!(!seat.start_move(&views, moved, 6));
    assert!(seat.start_move(&views, moved, 7));
    take(&log);

    seat.notify_pointer_motion_abs(&mut views, output(1), Point2::new(30.0, 40.0), 2);
    assert_eq!(views.get(moved).unwrap().position, Point2::new(20.0, 30.0));
    // The client does not see motion while it is being moved.
    assert!(take(&log).is_empty());

    seat.notify_pointer_button(&mut views, 3, 1, ButtonState::Released, 8);
    seat.notify_pointer_motion_abs(&mut views, output(1), Point2::new(50.0, 50.0), 4);
    assert_eq!(views.get(moved).unwrap().position, Point2::new(20.0, 30.0));
    assert_eq!(take(&log), ["a: motion 30,20"]);
}

#[test]
fn leave_cancels_move() {
    let log = Log::default();
    let mut views = Views::<Fake>::new();
    let mut seat = Seat::<Fake>::new("default");
    let moved = view(&mut views, 1, "a-surface", 0.0, 0.0);

    seat.init_pointer();
    seat.get_pointer(&1, FakeResource::new("a", &log));
    seat.notify_pointer_motion_abs(&mut views, output(1), Point2::new(10.0, 10.0), 0);
    seat.notify_pointer_button(&mut views, 1, 1, ButtonState::Pressed, 3);
    assert!(seat.start_move(&views, moved, 3));

    seat.notify_pointer_leave(&mut views);
    seat.notify_pointer_motion_abs(&mut views, output(1), Point2::new(60.0, 60.0), 2);

    assert_eq!(views.get(moved).unwrap().position, Point2::new(0.0, 0.0));
    assert_eq!(seat.pointer().unwrap().focus(), Some(moved));
}

/// Keyboard focus follows the pointer and needs both devices.
#[test]
fn keyboard_focus_follows_pointer() {
    let log = Log::default();
    let mut views = Views::<Fake>::new();
    let mut seat = Seat::<Fake>::new("default");
    let focus = view(&mut views, 1, "a-surface", 0.0, 0.0);

    seat.init_keyboard();
    seat.get_keyboard(&1, FakeResource::new("kbd", &log));

    // No pointer.
    seat.notify_keyboard_enter(&views);
    assert_eq!(seat.keyboard().unwrap().focus(), None);

    // No pointer focus.
    seat.init_pointer();
    seat.notify_keyboard_enter(&views);
    assert_eq!(seat.keyboard().unwrap().focus(), None);

    seat.notify_pointer_motion_abs(&mut views, output(1), Point2::new(10.0, 10.0), 0);
    seat.notify_keyboard_enter(&views);
    assert_eq!(seat.keyboard().unwrap().focus(), Some(focus));

    seat.notify_keyboard_key(&views, 1, 30, KeyState::Pressed);
    seat.notify_keyboard_modifiers(
        &views,
        Modifiers {
            depressed: 4,
            ..Modifiers::default()
        },
    );
    seat.notify_keyboard_leave(&views);
    assert_eq!(seat.keyboard().unwrap().focus(), None);

    // Keys without focus go nowhere.
    seat.notify_keyboard_key(&views, 2, 30, KeyState::Released);

    assert_eq!(
        take(&log),
        [
            "kbd: enter a-surface",
            "kbd: modifiers 0",
            "kbd: key 30 Pressed",
            "kbd: modifiers 4",
            "kbd: leave a-surface",
        ]
    );
}

#[test]
fn keymap_reaches_all_keyboards() {
    let log = Log::default();
    let mut seat = Seat::<Fake>::new("default");

    // Dropped, there is no keyboard.
    seat.notify_keyboard_keymap(keymap(1));

    seat.init_keyboard();
    assert!(seat.get_keyboard(&1, FakeResource::new("a", &log)));
    assert!(take(&log).is_empty());

    seat.notify_keyboard_keymap(keymap(2));
    assert_eq!(take(&log), ["a: keymap 1 2"]);

    // New keyboards get the current keymap right away.
    assert!(seat.get_keyboard(&2, FakeResource::new("b", &log)));
    assert_eq!(take(&log), ["b: keymap 1 2"]);
}

#[test]
fn removed_pointer_resource_prunes_junction() {
    let log = Log::default();
    let mut seat = Seat::<Fake>::new("default");

    seat.init_pointer();
    seat.get_pointer(&1, FakeResource::new("first", &log));
    seat.get_pointer(&1, FakeResource::new("second", &log));
    assert_eq!(seat.pointer().unwrap().state().resources().len(), 1);

    seat.remove_pointer(&1, |resource| resource.name == "first");
    assert_eq!(seat.pointer().unwrap().state().resources().resources(&1).len(), 1);

    seat.remove_pointer(&1, |resource| resource.name == "second");
    assert!(seat.pointer().unwrap().state().resources().is_empty());
}
