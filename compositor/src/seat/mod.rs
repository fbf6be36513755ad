//! The seat
//!
//! The seat groups the input devices a user interacts with. There is at most one pointer and one keyboard, each
//! created when the spatial compositor gains the matching capability and destroyed when it is lost. The
//! capabilities advertised to clients are derived from the devices which exist, so they can never go out of sync.
//!
//! # Devices and resources
//!
//! Clients may ask for a device at any time. If the device exists the resource is added to the client's
//! [junction](junction) for that device and receives events while one of the client's views has focus.
//! Otherwise the resource is inert: it is valid for the client to use but never receives an event.
//!
//! # Protocol independence
//!
//! The seat is generic over [`Protocol`], the set of resource types events are delivered to. The compositor uses
//! the Wayland implementation, tests use recording fakes.

pub mod grab;
pub mod junction;
pub mod keyboard;
pub mod pointer;

use std::{fmt, hash::Hash, os::fd::OwnedFd};

use bitflags::bitflags;
use cgmath::Point2;

pub use zmonitors_backend::{ButtonState, KeyState};

use crate::{
    output::OutputId,
    serial::Serials,
    view::{ViewId, Views},
};

use self::{grab::MoveGrab, keyboard::Keyboard, pointer::Pointer};

/// Name of the only seat.
pub const SEAT_NAME: &str = "default";

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Capabilities: u32 {
        const POINTER = 1;
        const KEYBOARD = 2;
    }
}

/// Resource types which seat events are delivered to.
pub trait Protocol: fmt::Debug + 'static {
    type ClientId: Clone + Eq + Hash + fmt::Debug;
    type Surface: Clone + fmt::Debug;
    type Seat: SeatResource + fmt::Debug;
    type Pointer: PointerResource<Self> + fmt::Debug;
    type Keyboard: KeyboardResource<Self> + fmt::Debug;
}

pub trait SeatResource {
    fn send_capabilities(&self, capabilities: Capabilities);

    /// Sends the seat name if the resource is new enough.
    fn send_name(&self, name: &str);
}

pub trait PointerResource<P: Protocol + ?Sized> {
    fn send_enter(&self, serial: u32, surface: &P::Surface, position: Point2<f32>);

    fn send_leave(&self, serial: u32, surface: &P::Surface);

    fn send_motion(&self, time: u32, position: Point2<f32>);

    fn send_button(&self, serial: u32, time: u32, button: u32, state: ButtonState);

    /// Ends a group of events if the resource is new enough.
    fn send_frame(&self);
}

pub trait KeyboardResource<P: Protocol + ?Sized> {
    fn send_keymap(&self, keymap: &Keymap);

    fn send_enter(&self, serial: u32, surface: &P::Surface, keys: &[u32]);

    fn send_leave(&self, serial: u32, surface: &P::Surface);

    fn send_key(&self, serial: u32, time: u32, key: u32, state: KeyState);

    fn send_modifiers(&self, serial: u32, modifiers: Modifiers);
}

/// A keymap shared with clients through a file descriptor.
#[derive(Debug)]
pub struct Keymap {
    /// One of the `wl_keyboard.keymap_format` values.
    pub format: u32,
    pub fd: OwnedFd,
    pub size: u32,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Modifiers {
    pub depressed: u32,
    pub latched: u32,
    pub locked: u32,
    pub group: u32,
}

#[derive(Debug)]
pub struct Seat<P: Protocol> {
    name: String,
    /// Bound seat globals, a client may bind the seat more than once.
    bindings: Vec<(P::ClientId, P::Seat)>,
    pointer: Option<Pointer<P>>,
    keyboard: Option<Keyboard<P>>,
    serials: Serials,
}

impl<P: Protocol> Seat<P> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bindings: Vec::new(),
            pointer: None,
            keyboard: None,
            serials: Serials::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn capabilities(&self) -> Capabilities {
        let mut capabilities = Capabilities::empty();
        capabilities.set(Capabilities::POINTER, self.pointer.is_some());
        capabilities.set(Capabilities::KEYBOARD, self.keyboard.is_some());
        capabilities
    }

    pub fn next_serial(&self) -> u32 {
        self.serials.next()
    }

    pub fn pointer(&self) -> Option<&Pointer<P>> {
        self.pointer.as_ref()
    }

    pub fn pointer_mut(&mut self) -> Option<&mut Pointer<P>> {
        self.pointer.as_mut()
    }

    pub fn keyboard(&self) -> Option<&Keyboard<P>> {
        self.keyboard.as_ref()
    }

    /// Records a new seat resource and tells it what the seat can do.
    pub fn bind(&mut self, client: P::ClientId, resource: P::Seat) {
        self.bindings.push((client.clone(), resource));
        self.send_capabilities(Some(&client));

        if let Some((_, resource)) = self.bindings.last() {
            resource.send_name(&self.name);
        }
    }

    /// Forgets the seat resource of `client` matching `f`.
    pub fn unbind<F>(&mut self, client: &P::ClientId, mut f: F)
    where
        F: FnMut(&P::Seat) -> bool,
    {
        if let Some(index) = self
            .bindings
            .iter()
            .position(|(owner, resource)| owner == client && f(resource))
        {
            self.bindings.remove(index);
        }
    }

    /// Sends the capabilities to the resources of `client`, or every resource if `None`.
    pub fn send_capabilities(&self, client: Option<&P::ClientId>) {
        let capabilities = self.capabilities();

        for (_, resource) in self
            .bindings
            .iter()
            .filter(|(owner, _)| client.map_or(true, |client| client == owner))
        {
            resource.send_capabilities(capabilities);
        }
    }

    pub fn init_pointer(&mut self) {
        if self.pointer.is_some() {
            return;
        }

        self.pointer = Some(Pointer::new());
        tracing::debug!(seat = %self.name, "Pointer created");
        self.send_capabilities(None);
    }

    pub fn release_pointer(&mut self) {
        if self.pointer.take().is_none() {
            return;
        }

        tracing::debug!(seat = %self.name, "Pointer released");
        self.send_capabilities(None);
    }

    pub fn init_keyboard(&mut self) {
        if self.keyboard.is_some() {
            return;
        }

        self.keyboard = Some(Keyboard::new());
        tracing::debug!(seat = %self.name, "Keyboard created");
        self.send_capabilities(None);
    }

    pub fn release_keyboard(&mut self) {
        if self.keyboard.take().is_none() {
            return;
        }

        tracing::debug!(seat = %self.name, "Keyboard released");
        self.send_capabilities(None);
    }

    /// Adds a pointer resource for `client`.
    ///
    /// Returns `false` if there is no pointer, in which case the resource stays inert.
    pub fn get_pointer(&mut self, client: &P::ClientId, resource: P::Pointer) -> bool {
        let Some(pointer) = self.pointer.as_mut() else {
            return false;
        };

        pointer.add_resource(client, resource);
        true
    }

    pub fn remove_pointer<F>(&mut self, client: &P::ClientId, f: F)
    where
        F: FnMut(&P::Pointer) -> bool,
    {
        if let Some(pointer) = self.pointer.as_mut() {
            pointer.remove_resource(client, f);
        }
    }

    /// Adds a keyboard resource for `client` and sends it the keymap.
    ///
    /// Returns `false` if there is no keyboard, in which case the resource stays inert.
    pub fn get_keyboard(&mut self, client: &P::ClientId, resource: P::Keyboard) -> bool {
        let Some(keyboard) = self.keyboard.as_mut() else {
            return false;
        };

        keyboard.add_resource(client, resource);
        true
    }

    pub fn remove_keyboard<F>(&mut self, client: &P::ClientId, f: F)
    where
        F: FnMut(&P::Keyboard) -> bool,
    {
        if let Some(keyboard) = self.keyboard.as_mut() {
            keyboard.remove_resource(client, f);
        }
    }

    pub fn notify_pointer_motion_abs(
        &mut self,
        views: &mut Views<P>,
        output: OutputId,
        position: Point2<f32>,
        time: u32,
    ) {
        if let Some(pointer) = self.pointer.as_mut() {
            pointer.motion_abs(views, &self.serials, output, position, time);
        }
    }

    pub fn notify_pointer_button(
        &mut self,
        views: &mut Views<P>,
        time: u32,
        button: u32,
        state: ButtonState,
        serial: u32,
    ) {
        if let Some(pointer) = self.pointer.as_mut() {
            pointer.button(views, &self.serials, time, button, state, serial);
        }
    }

    pub fn notify_pointer_leave(&mut self, views: &mut Views<P>) {
        if let Some(pointer) = self.pointer.as_mut() {
            pointer.leave(views, &self.serials);
        }
    }

    /// Gives the keyboard to the view the pointer is over.
    pub fn notify_keyboard_enter(&mut self, views: &Views<P>) {
        let (Some(keyboard), Some(pointer)) = (self.keyboard.as_mut(), self.pointer.as_ref()) else {
            return;
        };
        let Some(focus) = pointer.focus().filter(|&focus| views.get(focus).is_some()) else {
            return;
        };

        keyboard.set_focus(views, &self.serials, Some(focus));
    }

    pub fn notify_keyboard_leave(&mut self, views: &Views<P>) {
        if let Some(keyboard) = self.keyboard.as_mut() {
            keyboard.set_focus(views, &self.serials, None);
        }
    }

    /// Sends a key to the focused view with a serial of this seat.
    pub fn notify_keyboard_key(&mut self, views: &Views<P>, time: u32, key: u32, state: KeyState) {
        if let Some(keyboard) = self.keyboard.as_ref() {
            keyboard.send_key(views, self.serials.next(), time, key, state);
        }
    }

    pub fn notify_keyboard_modifiers(&mut self, views: &Views<P>, modifiers: Modifiers) {
        if let Some(keyboard) = self.keyboard.as_mut() {
            keyboard.send_modifiers(views, self.serials.next(), modifiers);
        }
    }

    pub fn notify_keyboard_keymap(&mut self, keymap: Keymap) {
        match self.keyboard.as_mut() {
            Some(keyboard) => keyboard.set_keymap(keymap),
            None => tracing::debug!("Dropping keymap, the seat has no keyboard"),
        }
    }

    /// Starts moving `view` with the pointer.
    ///
    /// The move is only started if `serial` is the serial of the button press which is currently held and the
    /// pointer is over `view`. Anything else is ignored and returns `false`.
    pub fn start_move(&mut self, views: &Views<P>, view: ViewId, serial: u32) -> bool {
        let Some(pointer) = self.pointer.as_mut() else {
            return false;
        };

        if pointer.button_count() == 0 || pointer.grab_serial() != serial || pointer.focus() != Some(view) {
            tracing::trace!(serial, grab_serial = pointer.grab_serial(), "Ignoring move request");
            return false;
        }

        let Some(initial) = views.get(view).map(|view| view.position) else {
            return false;
        };

        let anchor = pointer.grab_position();
        pointer.set_grab(MoveGrab::new(view, anchor, initial));
        true
    }
}

#[cfg(test)]
pub(crate) mod tests;
