//! Surfaces and their double buffered state.
//!
//! Requests on a surface only change its pending state. A commit applies the pending state at once, after which
//! the role of the surface, if any, decides what the new state means.

use cgmath::Vector2;
use slotmap::{new_key_type, SlotMap};
use wayland_server::{
    protocol::{wl_buffer::WlBuffer, wl_callback::WlCallback, wl_surface::WlSurface},
    Resource,
};

use crate::{shell::ToplevelId, wayland::shm::BufferData};

new_key_type! {
    pub struct SurfaceId;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Toplevel(ToplevelId),
}

#[derive(Debug)]
enum Attach {
    Buffer(WlBuffer),
    Detach,
}

#[derive(Debug, Default)]
struct Pending {
    attach: Option<Attach>,
    frame_callbacks: Vec<WlCallback>,
}

#[derive(Debug)]
pub struct Surface {
    resource: WlSurface,
    pending: Pending,
    buffer: Option<WlBuffer>,
    /// Committed frame callbacks waiting for the next frame.
    frame_callbacks: Vec<WlCallback>,
    role: Option<Role>,
}

impl Surface {
    pub fn resource(&self) -> &WlSurface {
        &self.resource
    }

    pub fn role(&self) -> Option<Role> {
        self.role
    }

    /// Gives the surface a role.
    ///
    /// A surface keeps its first role forever; returns `false` if the surface already has a different role.
    pub fn set_role(&mut self, role: Role) -> bool {
        match self.role {
            Some(current) => current == role,
            None => {
                self.role = Some(role);
                true
            }
        }
    }

    /// The committed buffer.
    pub fn buffer(&self) -> Option<&WlBuffer> {
        self.buffer.as_ref()
    }

    /// Size of the committed buffer in pixels.
    pub fn buffer_size(&self) -> Option<Vector2<f32>> {
        let data = self.buffer.as_ref()?.data::<BufferData>()?;
        Some(Vector2::new(data.width as f32, data.height as f32))
    }

    pub fn attach(&mut self, buffer: Option<WlBuffer>) {
        self.pending.attach = Some(match buffer {
            Some(buffer) => Attach::Buffer(buffer),
            None => Attach::Detach,
        });
    }

    pub fn frame(&mut self, callback: WlCallback) {
        self.pending.frame_callbacks.push(callback);
    }

    /// Applies the pending state.
    pub fn commit(&mut self) {
        let previous = match self.pending.attach.take() {
            Some(Attach::Buffer(buffer)) => self.buffer.replace(buffer),
            Some(Attach::Detach) => self.buffer.take(),
            None => None,
        };

        // Content is never read after the commit, so a replaced buffer is free to reuse.
        if let Some(previous) = previous.filter(|previous| Some(previous) != self.buffer.as_ref()) {
            previous.release();
        }

        self.frame_callbacks.append(&mut self.pending.frame_callbacks);
    }

    pub fn has_frame_callbacks(&self) -> bool {
        !self.frame_callbacks.is_empty()
    }

    pub fn send_frame_done(&mut self, time: u32) {
        for callback in self.frame_callbacks.drain(..) {
            callback.done(time);
        }
    }
}

#[derive(Debug, Default)]
pub struct Surfaces {
    surfaces: SlotMap<SurfaceId, Surface>,
}

impl Surfaces {
    /// Adds a surface, `init` creates the resource for the new id.
    pub fn insert_with<F>(&mut self, init: F) -> SurfaceId
    where
        F: FnOnce(SurfaceId) -> WlSurface,
    {
        self.surfaces.insert_with_key(|id| Surface {
            resource: init(id),
            pending: Pending::default(),
            buffer: None,
            frame_callbacks: Vec::new(),
            role: None,
        })
    }

    pub fn remove(&mut self, id: SurfaceId) -> Option<Surface> {
        self.surfaces.remove(id)
    }

    pub fn get(&self, id: SurfaceId) -> Option<&Surface> {
        self.surfaces.get(id)
    }

    pub fn get_mut(&mut self, id: SurfaceId) -> Option<&mut Surface> {
        self.surfaces.get_mut(id)
    }

    pub fn has_frame_callbacks(&self) -> bool {
        self.surfaces.values().any(Surface::has_frame_callbacks)
    }

    pub fn send_frame_done(&mut self, time: u32) {
        for surface in self.surfaces.values_mut() {
            surface.send_frame_done(time);
        }
    }

    pub fn len(&self) -> usize {
        self.surfaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }
}
