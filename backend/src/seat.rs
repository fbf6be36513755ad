//! The seat of the spatial compositor.
//!
//! The backend seat provides a ray (a 3D pointer) and a keyboard. Input is delivered to the virtual object the
//! device is focused on. The ray also tracks pressed buttons so a window move can be validated against the serial
//! of the press which started it.

use std::{cell::Cell, rc::Rc};

use bitflags::bitflags;
use cgmath::Point3;
use wayland_client::{Connection, Dispatch, Proxy, QueueHandle, WEnum};

use crate::{
    protocol::{
        client::{
            zgn_keyboard::{self, ZgnKeyboard},
            zgn_ray::{self, ZgnRay},
            zgn_seat::{self, ZgnSeat},
            zgn_virtual_object::ZgnVirtualObject,
        },
        decode_keys, decode_vec3,
    },
    virtual_object::{ButtonState, InputEvent, KeyState, VirtualObjectId},
    Event, Inner,
};

bitflags! {
    /// Devices the spatial compositor's seat currently has.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Capabilities: u32 {
        const RAY = 1;
        const KEYBOARD = 2;
    }
}

/// Serial of the ray button press which is currently held.
///
/// Shared with every cuboid window so a move request can be validated without access to the seat.
#[derive(Debug, Clone, Default)]
pub(crate) struct RayGrab(Rc<Cell<Option<u32>>>);

impl RayGrab {
    pub fn serial(&self) -> Option<u32> {
        self.0.get()
    }

    fn set(&self, serial: Option<u32>) {
        self.0.set(serial);
    }
}

#[derive(Debug, Default)]
pub(crate) struct SeatState {
    capabilities: Capabilities,
    ray: Option<ZgnRay>,
    keyboard: Option<ZgnKeyboard>,
    ray_focus: Option<VirtualObjectId>,
    keyboard_focus: Option<VirtualObjectId>,
    pressed_buttons: u32,
    grab: RayGrab,
}

impl SeatState {
    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    pub fn grab(&self) -> &RayGrab {
        &self.grab
    }

    pub fn ray_focus(&self) -> Option<VirtualObjectId> {
        self.ray_focus
    }

    pub fn keyboard_focus(&self) -> Option<VirtualObjectId> {
        self.keyboard_focus
    }

    /// Applies a new set of capabilities, acquiring and releasing the devices.
    ///
    /// Returns the capabilities which were gained and lost.
    pub fn update_capabilities(
        &mut self,
        capabilities: Capabilities,
        seat: &ZgnSeat,
        qh: &QueueHandle<Inner>,
    ) -> (Capabilities, Capabilities) {
        let gained = capabilities - self.capabilities;
        let lost = self.capabilities - capabilities;
        self.capabilities = capabilities;

        if lost.contains(Capabilities::RAY) {
            if let Some(ray) = self.ray.take() {
                ray.release();
            }

            self.ray_leave();
        }

        if lost.contains(Capabilities::KEYBOARD) {
            if let Some(keyboard) = self.keyboard.take() {
                keyboard.release();
            }

            self.keyboard_focus = None;
        }

        if gained.contains(Capabilities::RAY) {
            self.ray = Some(seat.get_ray(qh, ()));
        }

        if gained.contains(Capabilities::KEYBOARD) {
            self.keyboard = Some(seat.get_keyboard(qh, ()));
        }

        (gained, lost)
    }

    pub fn ray_enter(&mut self, object: VirtualObjectId) {
        self.ray_focus = Some(object);
    }

    /// The ray left its focus; any held buttons are forgotten.
    pub fn ray_leave(&mut self) {
        self.ray_focus = None;
        self.pressed_buttons = 0;
        self.grab.set(None);
    }

    pub fn ray_button(&mut self, serial: u32, state: ButtonState) {
        match state {
            ButtonState::Pressed => {
                if self.pressed_buttons == 0 {
                    self.grab.set(Some(serial));
                }

                self.pressed_buttons += 1;
            }

            ButtonState::Released => {
                self.pressed_buttons = self.pressed_buttons.saturating_sub(1);

                if self.pressed_buttons == 0 {
                    self.grab.set(None);
                }
            }
        }
    }

    pub fn keyboard_enter(&mut self, object: VirtualObjectId) {
        self.keyboard_focus = Some(object);
    }

    pub fn keyboard_leave(&mut self) {
        self.keyboard_focus = None;
    }
}

fn object_id(object: &ZgnVirtualObject) -> Option<VirtualObjectId> {
    object.data::<VirtualObjectId>().copied()
}

impl Dispatch<ZgnSeat, ()> for Inner {
    fn event(
        state: &mut Self,
        seat: &ZgnSeat,
        event: zgn_seat::Event,
        _: &(),
        _conn: &Connection,
        qh: &QueueHandle<Self>,
    ) {
        match event {
            zgn_seat::Event::Capabilities { capabilities } => {
                let bits = match capabilities {
                    WEnum::Value(capabilities) => capabilities.bits(),
                    WEnum::Unknown(bits) => bits,
                };

                let (gained, lost) =
                    state
                        .seat
                        .update_capabilities(Capabilities::from_bits_truncate(bits), seat, qh);
                tracing::debug!(?gained, ?lost, "Backend seat capabilities changed");

                if !(gained.is_empty() && lost.is_empty()) {
                    state.events.push_back(Event::Capabilities { gained, lost });
                }
            }
        }
    }
}

impl Dispatch<ZgnRay, ()> for Inner {
    fn event(
        state: &mut Self,
        _ray: &ZgnRay,
        event: zgn_ray::Event,
        _: &(),
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
        let event = match event {
            zgn_ray::Event::Enter {
                serial,
                virtual_object,
                origin,
                direction,
            } => {
                let Some(object) = object_id(&virtual_object) else {
                    return;
                };
                let (Some(origin), Some(direction)) = (decode_vec3(&origin), decode_vec3(&direction)) else {
                    tracing::warn!("Malformed ray enter event");
                    return;
                };

                state.seat.ray_enter(object);
                InputEvent::RayEnter {
                    serial,
                    origin: Point3::new(origin.x, origin.y, origin.z),
                    direction,
                }
            }

            zgn_ray::Event::Leave { serial, .. } => {
                let event = InputEvent::RayLeave { serial };

                // Deliver the leave to the object which had focus before forgetting it.
                if let Some(object) = state.seat.ray_focus() {
                    state.events.push_back(Event::Input { object, event });
                }

                state.seat.ray_leave();
                return;
            }

            zgn_ray::Event::Motion {
                time,
                origin,
                direction,
            } => {
                let (Some(origin), Some(direction)) = (decode_vec3(&origin), decode_vec3(&direction)) else {
                    tracing::warn!("Malformed ray motion event");
                    return;
                };

                InputEvent::RayMotion {
                    time,
                    origin: Point3::new(origin.x, origin.y, origin.z),
                    direction,
                }
            }

            zgn_ray::Event::Button {
                serial,
                time,
                button,
                state: button_state,
            } => {
                let button_state = match button_state {
                    WEnum::Value(zgn_ray::ButtonState::Pressed) => ButtonState::Pressed,
                    WEnum::Value(zgn_ray::ButtonState::Released) => ButtonState::Released,
                    _ => {
                        tracing::warn!(?button_state, "Unknown ray button state");
                        return;
                    }
                };

                state.seat.ray_button(serial, button_state);
                InputEvent::RayButton {
                    serial,
                    time,
                    button,
                    state: button_state,
                }
            }
        };

        if let Some(object) = state.seat.ray_focus() {
            state.events.push_back(Event::Input { object, event });
        }
    }
}

impl Dispatch<ZgnKeyboard, ()> for Inner {
    fn event(
        state: &mut Self,
        _keyboard: &ZgnKeyboard,
        event: zgn_keyboard::Event,
        _: &(),
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
        let event = match event {
            zgn_keyboard::Event::Keymap { format, fd, size } => {
                let format = match format {
                    WEnum::Value(format) => format as u32,
                    WEnum::Unknown(format) => format,
                };

                state.events.push_back(Event::Keymap { format, fd, size });
                return;
            }

            zgn_keyboard::Event::Enter {
                serial,
                virtual_object,
                keys,
            } => {
                let Some(object) = object_id(&virtual_object) else {
                    return;
                };

                state.seat.keyboard_enter(object);
                InputEvent::KeyboardEnter {
                    serial,
                    keys: decode_keys(&keys),
                }
            }

            zgn_keyboard::Event::Leave { serial, .. } => {
                if let Some(object) = state.seat.keyboard_focus() {
                    state.events.push_back(Event::Input {
                        object,
                        event: InputEvent::KeyboardLeave { serial },
                    });
                }

                state.seat.keyboard_leave();
                return;
            }

            zgn_keyboard::Event::Key {
                serial,
                time,
                key,
                state: key_state,
            } => {
                let key_state = match key_state {
                    WEnum::Value(zgn_keyboard::KeyState::Pressed) => KeyState::Pressed,
                    WEnum::Value(zgn_keyboard::KeyState::Released) => KeyState::Released,
                    _ => {
                        tracing::warn!(?key_state, "Unknown key state");
                        return;
                    }
                };

                InputEvent::KeyboardKey {
                    serial,
                    time,
                    key,
                    state: key_state,
                }
            }

            zgn_keyboard::Event::Modifiers {
                serial,
                mods_depressed,
                mods_latched,
                mods_locked,
                group,
            } => InputEvent::KeyboardModifiers {
                serial,
                depressed: mods_depressed,
                latched: mods_latched,
                locked: mods_locked,
                group,
            },
        };

        if let Some(object) = state.seat.keyboard_focus() {
            state.events.push_back(Event::Input { object, event });
        }
    }
}
