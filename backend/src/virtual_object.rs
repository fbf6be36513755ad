//! Virtual objects, the spatial counterpart of a surface.

use cgmath::{Point3, Vector3};
use slotmap::new_key_type;
use wayland_client::{
    protocol::wl_callback::{self, WlCallback},
    Connection, Dispatch, Proxy, QueueHandle,
};

use crate::{
    cuboid_window::{CuboidWindow, CuboidWindowHandler},
    frame_callback::FrameCallbackId,
    protocol::client::{
        zgn_compositor::ZgnCompositor,
        zgn_virtual_object::{self, ZgnVirtualObject},
    },
    signal::Signal,
    Error, Event, Inner,
};

new_key_type! {
    /// Identifies a virtual object.
    ///
    /// An id stays unique after the object is destroyed, so a stale id never refers to a newer object.
    pub struct VirtualObjectId;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonState {
    Released,
    Pressed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyState {
    Released,
    Pressed,
}

/// Input routed to a virtual object.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    RayEnter {
        serial: u32,
        origin: Point3<f32>,
        direction: Vector3<f32>,
    },

    RayLeave {
        serial: u32,
    },

    RayMotion {
        time: u32,
        origin: Point3<f32>,
        direction: Vector3<f32>,
    },

    RayButton {
        serial: u32,
        time: u32,
        button: u32,
        state: ButtonState,
    },

    KeyboardEnter {
        serial: u32,
        keys: Vec<u32>,
    },

    KeyboardLeave {
        serial: u32,
    },

    KeyboardKey {
        serial: u32,
        time: u32,
        key: u32,
        state: KeyState,
    },

    KeyboardModifiers {
        serial: u32,
        depressed: u32,
        latched: u32,
        locked: u32,
        group: u32,
    },
}

/// Receives input for a virtual object without a role.
pub trait VirtualObjectHandler<D> {
    fn input(&mut self, ctx: &mut D, object: &VirtualObject, event: InputEvent);
}

/// A virtual object.
///
/// Dropping the virtual object emits the destroy signal and then destroys the backend object.
#[derive(Debug)]
pub struct VirtualObject {
    id: VirtualObjectId,
    proxy: ZgnVirtualObject,
    destroy_signal: Signal<VirtualObjectId>,
    /// Frame callbacks waiting for the next frame done, in registration order.
    pub(crate) frame_callbacks: Vec<FrameCallbackId>,
    /// Whether a frame request has been sent and not completed yet.
    pub(crate) frame_requested: bool,
}

impl VirtualObject {
    pub(crate) fn new(id: VirtualObjectId, compositor: &ZgnCompositor, qh: &QueueHandle<Inner>) -> Result<Self, Error> {
        let proxy = compositor.create_virtual_object(qh, id);

        if !proxy.is_alive() {
            return Err(Error::DeadProxy);
        }

        tracing::debug!(?id, "Created virtual object");

        Ok(Self {
            id,
            proxy,
            destroy_signal: Signal::new(),
            frame_callbacks: Vec::new(),
            frame_requested: false,
        })
    }

    pub fn id(&self) -> VirtualObjectId {
        self.id
    }

    /// Signal emitted with the id of the object when it is destroyed.
    pub fn destroy_signal(&self) -> &Signal<VirtualObjectId> {
        &self.destroy_signal
    }

    /// Applies the pending state of the object.
    pub fn commit(&self) {
        self.proxy.commit();
    }

    pub(crate) fn proxy(&self) -> &ZgnVirtualObject {
        &self.proxy
    }

    pub(crate) fn request_frame(&mut self, qh: &QueueHandle<Inner>) {
        if !self.frame_requested {
            let _callback = self.proxy.frame(qh, self.id);
            self.frame_requested = true;
        }
    }
}

impl Drop for VirtualObject {
    fn drop(&mut self) {
        self.destroy_signal.emit(&self.id);
        self.proxy.destroy();
        tracing::debug!(id = ?self.id, "Destroyed virtual object");
    }
}

/// A virtual object and its role.
pub(crate) enum Entry<D> {
    Plain {
        object: VirtualObject,
        handler: Box<dyn VirtualObjectHandler<D>>,
    },

    CuboidWindow {
        window: CuboidWindow,
        handler: Box<dyn CuboidWindowHandler<D>>,
    },
}

impl<D> Entry<D> {
    pub fn object(&self) -> &VirtualObject {
        match self {
            Entry::Plain { object, .. } => object,
            Entry::CuboidWindow { window, .. } => window.object(),
        }
    }

    pub fn object_mut(&mut self) -> &mut VirtualObject {
        match self {
            Entry::Plain { object, .. } => object,
            Entry::CuboidWindow { window, .. } => window.object_mut(),
        }
    }

    pub fn input(&mut self, ctx: &mut D, event: InputEvent) {
        match self {
            Entry::Plain { object, handler } => handler.input(ctx, object, event),
            Entry::CuboidWindow { window, handler } => handler.input(ctx, window, event),
        }
    }
}

impl Dispatch<ZgnCompositor, ()> for Inner {
    fn event(
        _state: &mut Self,
        _proxy: &ZgnCompositor,
        _event: <ZgnCompositor as Proxy>::Event,
        _data: &(),
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
    }
}

impl Dispatch<ZgnVirtualObject, VirtualObjectId> for Inner {
    fn event(
        _state: &mut Self,
        _proxy: &ZgnVirtualObject,
        _event: zgn_virtual_object::Event,
        _data: &VirtualObjectId,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
    }
}

impl Dispatch<WlCallback, VirtualObjectId> for Inner {
    fn event(
        state: &mut Self,
        _callback: &WlCallback,
        event: wl_callback::Event,
        object: &VirtualObjectId,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
        if let wl_callback::Event::Done { callback_data } = event {
            state.events.push_back(Event::Frame {
                object: *object,
                time: callback_data,
            });
        }
    }
}
