//! Cuboid windows
//!
//! A cuboid window gives a virtual object a box shape in space. The window goes through three states:
//!
//! ```text
//! Unconfigured ---> Configured ---> Committed
//!                       ^               |
//!                       \---------------/
//! ```
//!
//! The spatial compositor configures the window with a half size and orientation. Until the first configure
//! arrives the window may not be committed, so [`CuboidWindow::commit`] does nothing. Once configured, a commit
//! acknowledges the latest configure and applies the geometry it proposed.

use cgmath::{Quaternion, Vector3};
use wayland_client::{Connection, Dispatch, QueueHandle};

use crate::{
    protocol::{
        client::{
            zgn_cuboid_window::{self, ZgnCuboidWindow},
            zgn_seat::ZgnSeat,
            zgn_shell::ZgnShell,
        },
        decode_quaternion, decode_vec3, encode_quaternion, encode_vec3,
    },
    seat::RayGrab,
    virtual_object::{InputEvent, VirtualObject, VirtualObjectId},
    Event, Inner,
};

/// Size and orientation of a cuboid window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geometry {
    pub half_size: Vector3<f32>,
    pub quaternion: Quaternion<f32>,
}

/// Handles events for a cuboid window.
pub trait CuboidWindowHandler<D> {
    /// The spatial compositor proposed new geometry.
    ///
    /// The geometry is available through [`CuboidWindow::half_size`] and [`CuboidWindow::quaternion`]. It takes
    /// effect once the window is committed.
    fn configured(&mut self, ctx: &mut D, window: &mut CuboidWindow);

    /// The window was moved by the user and now faces `face_direction`.
    fn moved(&mut self, _ctx: &mut D, _window: &mut CuboidWindow, _face_direction: Vector3<f32>) {}

    fn input(&mut self, _ctx: &mut D, _window: &mut CuboidWindow, _event: InputEvent) {}
}

#[derive(Debug)]
pub struct CuboidWindow {
    proxy: ZgnCuboidWindow,
    // Dropped after the role object.
    object: VirtualObject,
    seat: ZgnSeat,
    ray_grab: RayGrab,
    pending: Geometry,
    committed: Option<Geometry>,
    /// Configure serial which has not been acknowledged yet.
    ack_serial: Option<u32>,
    configured: bool,
}

impl CuboidWindow {
    pub(crate) fn new(
        object: VirtualObject,
        shell: &ZgnShell,
        seat: &ZgnSeat,
        ray_grab: RayGrab,
        geometry: Geometry,
        qh: &QueueHandle<Inner>,
    ) -> Self {
        let proxy = shell.get_cuboid_window(
            object.proxy(),
            encode_vec3(geometry.half_size),
            encode_quaternion(geometry.quaternion),
            qh,
            object.id(),
        );

        Self {
            proxy,
            object,
            seat: seat.clone(),
            ray_grab,
            pending: geometry,
            committed: None,
            ack_serial: None,
            configured: false,
        }
    }

    pub fn id(&self) -> VirtualObjectId {
        self.object.id()
    }

    pub fn object(&self) -> &VirtualObject {
        &self.object
    }

    pub(crate) fn object_mut(&mut self) -> &mut VirtualObject {
        &mut self.object
    }

    /// The half size proposed by the latest configure.
    pub fn half_size(&self) -> Vector3<f32> {
        self.pending.half_size
    }

    pub fn quaternion(&self) -> Quaternion<f32> {
        self.pending.quaternion
    }

    /// Geometry applied by the last commit.
    pub fn committed(&self) -> Option<Geometry> {
        self.committed
    }

    pub fn is_configured(&self) -> bool {
        self.configured
    }

    /// Acknowledges the latest configure and commits the virtual object.
    ///
    /// Does nothing if the window has not been configured yet.
    pub fn commit(&mut self) {
        if !self.configured {
            tracing::trace!(id = ?self.id(), "Ignoring commit of an unconfigured cuboid window");
            return;
        }

        if let Some(serial) = self.ack_serial.take() {
            self.proxy.ack_configure(serial);
        }

        self.committed = Some(self.pending);
        self.object.commit();
    }

    /// Starts an interactive move of the window.
    ///
    /// `serial` must be the serial of the ray button press which is currently held. Returns `false` and does
    /// nothing otherwise.
    pub fn start_move(&self, serial: u32) -> bool {
        if self.ray_grab.serial() != Some(serial) {
            tracing::trace!(id = ?self.id(), serial, "Ignoring move with a stale serial");
            return false;
        }

        self.proxy.start_move(&self.seat, serial);
        true
    }

    /// Asks the spatial compositor to rotate the window.
    ///
    /// The new orientation arrives with the next configure.
    pub fn rotate(&self, quaternion: Quaternion<f32>) {
        self.proxy.rotate(encode_quaternion(quaternion));
    }

    pub(crate) fn configure(&mut self, serial: u32, geometry: Geometry) {
        self.pending = geometry;
        self.ack_serial = Some(serial);
        self.configured = true;
    }
}

impl Drop for CuboidWindow {
    fn drop(&mut self) {
        self.proxy.destroy();
    }
}

impl Dispatch<ZgnShell, ()> for Inner {
    fn event(
        _state: &mut Self,
        _proxy: &ZgnShell,
        _event: <ZgnShell as wayland_client::Proxy>::Event,
        _data: &(),
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
    }
}

impl Dispatch<ZgnCuboidWindow, VirtualObjectId> for Inner {
    fn event(
        state: &mut Self,
        _window: &ZgnCuboidWindow,
        event: zgn_cuboid_window::Event,
        object: &VirtualObjectId,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
        let object = *object;

        match event {
            zgn_cuboid_window::Event::Configure {
                serial,
                half_size,
                quaternion,
            } => {
                let (Some(half_size), Some(quaternion)) = (decode_vec3(&half_size), decode_quaternion(&quaternion))
                else {
                    tracing::warn!(?object, "Malformed cuboid window configure");
                    return;
                };

                state.events.push_back(Event::Configure {
                    object,
                    serial,
                    geometry: Geometry { half_size, quaternion },
                });
            }

            zgn_cuboid_window::Event::Moved { face_direction } => {
                let Some(face_direction) = decode_vec3(&face_direction) else {
                    tracing::warn!(?object, "Malformed cuboid window moved event");
                    return;
                };

                state.events.push_back(Event::Moved { object, face_direction });
            }
        }
    }
}
