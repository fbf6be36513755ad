//! Wayland protocol handling
//!
//! This module contains the `Dispatch` implementations of every global the compositor advertises and connects
//! the seat to the Wayland resource types.
//!
//! Rendering is done by the spatial compositor, so nothing here reads buffer contents. Damage and regions are
//! accepted and ignored.

mod compositor;
mod data_device;
pub(crate) mod output;
mod seat;
pub(crate) mod shm;
mod xdg_shell;

use std::os::fd::AsFd;

use cgmath::Point2;
use wayland_protocols::xdg::shell::server::xdg_wm_base::XdgWmBase;
use wayland_server::{
    backend::ClientId,
    protocol::{
        wl_compositor::WlCompositor,
        wl_data_device_manager::WlDataDeviceManager,
        wl_keyboard::{self, WlKeyboard},
        wl_pointer::{self, WlPointer},
        wl_seat::{self, WlSeat},
        wl_shm::WlShm,
        wl_surface::WlSurface,
    },
    DisplayHandle, Resource,
};

use crate::{
    seat::{
        ButtonState, Capabilities, KeyState, KeyboardResource, Keymap, Modifiers, PointerResource, Protocol,
        SeatResource,
    },
    Compositor,
};

const COMPOSITOR_VERSION: u32 = 4;
const SHM_VERSION: u32 = 1;
const SEAT_VERSION: u32 = 7;
const XDG_WM_BASE_VERSION: u32 = 3;
const DATA_DEVICE_MANAGER_VERSION: u32 = 3;

/// The seat's view of Wayland.
#[derive(Debug)]
pub struct Wayland;

impl Protocol for Wayland {
    type ClientId = ClientId;
    type Surface = WlSurface;
    type Seat = WlSeat;
    type Pointer = WlPointer;
    type Keyboard = WlKeyboard;
}

/// Advertises the globals every client may bind.
///
/// Outputs are advertised when created.
pub(crate) fn create_globals(display: &DisplayHandle) {
    display.create_global::<Compositor, WlCompositor, _>(COMPOSITOR_VERSION, ());
    display.create_global::<Compositor, WlShm, _>(SHM_VERSION, ());
    display.create_global::<Compositor, WlSeat, _>(SEAT_VERSION, ());
    display.create_global::<Compositor, XdgWmBase, _>(XDG_WM_BASE_VERSION, ());
    display.create_global::<Compositor, WlDataDeviceManager, _>(DATA_DEVICE_MANAGER_VERSION, ());
}

impl SeatResource for WlSeat {
    fn send_capabilities(&self, capabilities: Capabilities) {
        let mut wl_capabilities = wl_seat::Capability::empty();
        wl_capabilities.set(wl_seat::Capability::Pointer, capabilities.contains(Capabilities::POINTER));
        wl_capabilities.set(wl_seat::Capability::Keyboard, capabilities.contains(Capabilities::KEYBOARD));

        self.capabilities(wl_capabilities);
    }

    fn send_name(&self, name: &str) {
        if self.version() >= 2 {
            self.name(name.to_owned());
        }
    }
}

impl PointerResource<Wayland> for WlPointer {
    fn send_enter(&self, serial: u32, surface: &WlSurface, position: Point2<f32>) {
        self.enter(serial, surface, position.x.into(), position.y.into());
    }

    fn send_leave(&self, serial: u32, surface: &WlSurface) {
        self.leave(serial, surface);
    }

    fn send_motion(&self, time: u32, position: Point2<f32>) {
        self.motion(time, position.x.into(), position.y.into());
    }

    fn send_button(&self, serial: u32, time: u32, button: u32, state: ButtonState) {
        let state = match state {
            ButtonState::Released => wl_pointer::ButtonState::Released,
            ButtonState::Pressed => wl_pointer::ButtonState::Pressed,
        };

        self.button(serial, time, button, state);
    }

    fn send_frame(&self) {
        if self.version() >= 5 {
            self.frame();
        }
    }
}

impl KeyboardResource<Wayland> for WlKeyboard {
    fn send_keymap(&self, keymap: &Keymap) {
        let format = wl_keyboard::KeymapFormat::try_from(keymap.format).unwrap_or(wl_keyboard::KeymapFormat::NoKeymap);
        self.keymap(format, keymap.fd.as_fd(), keymap.size);
    }

    fn send_enter(&self, serial: u32, surface: &WlSurface, keys: &[u32]) {
        let keys = keys.iter().flat_map(|key| key.to_ne_bytes()).collect();
        self.enter(serial, surface, keys);
    }

    fn send_leave(&self, serial: u32, surface: &WlSurface) {
        self.leave(serial, surface);
    }

    fn send_key(&self, serial: u32, time: u32, key: u32, state: KeyState) {
        let state = match state {
            KeyState::Released => wl_keyboard::KeyState::Released,
            KeyState::Pressed => wl_keyboard::KeyState::Pressed,
        };

        self.key(serial, time, key, state);
    }

    fn send_modifiers(&self, serial: u32, modifiers: Modifiers) {
        self.modifiers(
            serial,
            modifiers.depressed,
            modifiers.latched,
            modifiers.locked,
            modifiers.group,
        );
    }
}
