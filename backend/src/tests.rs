use std::{
    cell::{Cell, RefCell},
    fs::File,
    os::{fd::OwnedFd, unix::net::UnixStream},
    rc::Rc,
};

use cgmath::{Quaternion, Vector3};

use crate::{
    Backend, BackendHandler, ButtonState, Capabilities, CuboidWindow, CuboidWindowHandler, Event, Geometry, InputEvent,
    VirtualObject, VirtualObjectHandler, VirtualObjectId,
};

#[derive(Debug, Default)]
struct Ctx {
    log: Vec<String>,
}

impl BackendHandler for Ctx {
    fn gain_ray_capability(&mut self) {
        self.log.push("gain ray".into());
    }

    fn lose_ray_capability(&mut self) {
        self.log.push("lose ray".into());
    }

    fn gain_keyboard_capability(&mut self) {
        self.log.push("gain keyboard".into());
    }

    fn lose_keyboard_capability(&mut self) {
        self.log.push("lose keyboard".into());
    }

    fn keyboard_keymap(&mut self, format: u32, _fd: OwnedFd, size: u32) {
        self.log.push(format!("keymap {format} {size}"));
    }
}

fn offline() -> (Backend<Ctx>, UnixStream) {
    Backend::offline().unwrap()
}

struct LogInput;

impl VirtualObjectHandler<Ctx> for LogInput {
    fn input(&mut self, ctx: &mut Ctx, object: &VirtualObject, event: InputEvent) {
        ctx.log.push(format!("{:?} {:?}", object.id(), event));
    }
}

/// Commits on the first configure only.
#[derive(Default)]
struct SetupOnce {
    setups: Rc<Cell<u32>>,
}

impl CuboidWindowHandler<Ctx> for SetupOnce {
    fn configured(&mut self, ctx: &mut Ctx, window: &mut CuboidWindow) {
        ctx.log.push(format!("configured {:?}", window.half_size()));

        if self.setups.get() == 0 {
            self.setups.set(1);
            window.commit();
        }
    }
}

fn geometry(x: f32) -> Geometry {
    Geometry {
        half_size: Vector3::new(x, x, x),
        quaternion: Quaternion::new(1.0, 0.0, 0.0, 0.0),
    }
}

#[test]
fn destroy_emits_signal_once() {
    let (mut backend, _server) = offline();
    let mut ctx = Ctx::default();
    let id = backend.create_virtual_object(LogInput).unwrap();

    // A subscriber clearing its reference when the object goes away.
    let reference = Rc::new(RefCell::new(Some(id)));
    let count = Rc::new(Cell::new(0));
    let _listener = {
        let reference = reference.clone();
        let count = count.clone();

        backend
            .virtual_object(id)
            .unwrap()
            .destroy_signal()
            .connect(move |destroyed| {
                assert_eq!(*reference.borrow(), Some(*destroyed));
                reference.borrow_mut().take();
                count.set(count.get() + 1);
            })
    };

    assert!(backend.destroy(id));
    assert!(!backend.destroy(id));
    assert_eq!(count.get(), 1);
    assert_eq!(*reference.borrow(), None);

    // Input for the destroyed object goes nowhere.
    backend.inner.events.push_back(Event::Input {
        object: id,
        event: InputEvent::RayLeave { serial: 1 },
    });
    assert_eq!(backend.dispatch_pending(&mut ctx).unwrap(), 1);
    assert!(ctx.log.is_empty());
}

#[test]
fn input_reaches_handler() {
    let (mut backend, _server) = offline();
    let mut ctx = Ctx::default();
    let id = backend.create_virtual_object(LogInput).unwrap();

    backend.inner.events.push_back(Event::Input {
        object: id,
        event: InputEvent::RayLeave { serial: 4 },
    });
    backend.dispatch_pending(&mut ctx).unwrap();

    assert_eq!(ctx.log, [format!("{:?} {:?}", id, InputEvent::RayLeave { serial: 4 })]);
}

/// Every queued callback fires once, in order, and only one frame request is in flight.
#[test]
fn frame_callbacks_fire_in_order() {
    let (mut backend, _server) = offline();
    let mut ctx = Ctx::default();
    let id = backend.create_virtual_object(LogInput).unwrap();

    backend.frame_callback(id, |ctx: &mut Ctx, time| ctx.log.push(format!("first {time}")));
    assert!(backend.virtual_object(id).unwrap().frame_requested);
    let cancelled = backend
        .frame_callback(id, |ctx: &mut Ctx, time| ctx.log.push(format!("cancelled {time}")))
        .unwrap();
    backend.frame_callback(id, |ctx: &mut Ctx, time| ctx.log.push(format!("third {time}")));

    assert!(backend.destroy_frame_callback(cancelled));
    assert!(!backend.destroy_frame_callback(cancelled));

    backend.inner.events.push_back(Event::Frame { object: id, time: 16 });
    backend.dispatch_pending(&mut ctx).unwrap();

    assert_eq!(ctx.log, ["first 16", "third 16"]);
    assert!(!backend.virtual_object(id).unwrap().frame_requested);

    // A second done does not fire anything again.
    backend.inner.events.push_back(Event::Frame { object: id, time: 32 });
    backend.dispatch_pending(&mut ctx).unwrap();
    assert_eq!(ctx.log.len(), 2);
}

#[test]
fn destroyed_object_drops_frame_callbacks() {
    let (mut backend, _server) = offline();
    let mut ctx = Ctx::default();
    let id = backend.create_virtual_object(LogInput).unwrap();

    let callback = backend
        .frame_callback(id, |ctx: &mut Ctx, _| ctx.log.push("fired".into()))
        .unwrap();
    assert_eq!(backend.frame_callbacks.len(), 1);

    backend.destroy(id);
    assert_eq!(backend.frame_callbacks.len(), 0);
    assert!(!backend.destroy_frame_callback(callback));
    assert!(backend.frame_callback(id, |_: &mut Ctx, _| {}).is_none());

    backend.inner.events.push_back(Event::Frame { object: id, time: 1 });
    backend.dispatch_pending(&mut ctx).unwrap();
    assert!(ctx.log.is_empty());
}

/// Setup happens on the first configure, later configures only update the proposed geometry.
#[test]
fn cuboid_window_configure_then_commit() {
    let (mut backend, _server) = offline();
    let mut ctx = Ctx::default();
    let handler = SetupOnce::default();
    let setups = handler.setups.clone();
    let id = backend.create_cuboid_window(geometry(0.5), handler).unwrap();

    // Committing before the first configure does nothing.
    assert!(backend.commit(id));
    let window = backend.cuboid_window(id).unwrap();
    assert!(!window.is_configured());
    assert_eq!(window.committed(), None);

    backend.inner.events.push_back(Event::Configure {
        object: id,
        serial: 7,
        geometry: geometry(1.0),
    });
    backend.dispatch_pending(&mut ctx).unwrap();

    let window = backend.cuboid_window(id).unwrap();
    assert!(window.is_configured());
    assert_eq!(window.committed(), Some(geometry(1.0)));
    assert_eq!(setups.get(), 1);

    backend.inner.events.push_back(Event::Configure {
        object: id,
        serial: 8,
        geometry: geometry(2.0),
    });
    backend.dispatch_pending(&mut ctx).unwrap();

    let window = backend.cuboid_window(id).unwrap();
    assert_eq!(window.half_size(), Vector3::new(2.0, 2.0, 2.0));
    assert_eq!(window.committed(), Some(geometry(1.0)));
    assert_eq!(setups.get(), 1);
    assert_eq!(ctx.log.len(), 2);

    backend.cuboid_window_mut(id).unwrap().commit();
    assert_eq!(backend.cuboid_window(id).unwrap().committed(), Some(geometry(2.0)));
}

#[test]
fn cuboid_window_move_requires_held_button() {
    let (mut backend, _server) = offline();
    let id = backend.create_cuboid_window(geometry(1.0), SetupOnce::default()).unwrap();

    assert!(!backend.cuboid_window(id).unwrap().start_move(5));

    backend.inner.seat.ray_enter(id);
    backend.inner.seat.ray_button(5, ButtonState::Pressed);
    let window = backend.cuboid_window(id).unwrap();
    assert!(!window.start_move(4));
    assert!(window.start_move(5));

    backend.inner.seat.ray_button(6, ButtonState::Released);
    assert!(!backend.cuboid_window(id).unwrap().start_move(5));
}

#[test]
fn plain_objects_are_not_windows() {
    let (mut backend, _server) = offline();
    let id = backend.create_virtual_object(LogInput).unwrap();

    assert!(backend.virtual_object(id).is_some());
    assert!(backend.cuboid_window(id).is_none());
    assert!(backend.cuboid_window_mut(id).is_none());
}

#[test]
fn capability_changes_reach_context() {
    let (mut backend, _server) = offline();
    let mut ctx = Ctx::default();
    let qh = backend.queue.handle();
    let seat = backend.inner.globals.seat.clone();

    let (gained, lost) = backend
        .inner
        .seat
        .update_capabilities(Capabilities::RAY | Capabilities::KEYBOARD, &seat, &qh);
    assert_eq!(gained, Capabilities::RAY | Capabilities::KEYBOARD);
    assert!(lost.is_empty());
    backend.inner.events.push_back(Event::Capabilities { gained, lost });

    let (gained, lost) = backend.inner.seat.update_capabilities(Capabilities::KEYBOARD, &seat, &qh);
    assert!(gained.is_empty());
    assert_eq!(lost, Capabilities::RAY);
    backend.inner.events.push_back(Event::Capabilities { gained, lost });

    let fd = OwnedFd::from(File::open("/dev/null").unwrap());
    backend.inner.events.push_back(Event::Keymap { format: 1, fd, size: 0 });

    assert_eq!(backend.dispatch_pending(&mut ctx).unwrap(), 3);
    assert_eq!(ctx.log, ["gain ray", "gain keyboard", "lose ray", "keymap 1 0"]);
    assert_eq!(backend.capabilities(), Capabilities::KEYBOARD);
}

#[test]
fn unknown_object_ids_are_ignored() {
    let (mut backend, _server) = offline();
    let mut ctx = Ctx::default();
    let stale = VirtualObjectId::default();

    backend.inner.events.push_back(Event::Configure {
        object: stale,
        serial: 1,
        geometry: geometry(1.0),
    });
    backend.inner.events.push_back(Event::Moved {
        object: stale,
        face_direction: Vector3::new(0.0, 0.0, 1.0),
    });

    assert_eq!(backend.dispatch_pending(&mut ctx).unwrap(), 2);
    assert!(ctx.log.is_empty());
}
