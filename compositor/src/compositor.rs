//! The compositor root.
//!
//! [`Compositor`] owns every piece of server state and is the state type of the Wayland display. It also receives
//! the spatial compositor's seat changes: a ray becomes the pointer, the spatial keyboard becomes the keyboard.

use std::os::fd::OwnedFd;

use cgmath::Point2;
use wayland_protocols::xdg::shell::server::xdg_surface;
use wayland_server::{DisplayHandle, Resource};
use zmonitors_backend::BackendHandler;

use crate::{
    output::Outputs,
    seat::{Keymap, Seat, SEAT_NAME},
    shell::{CommitAction, Shell, ToplevelId},
    surface::{Role, SurfaceId, Surfaces},
    view::{View, ViewId, Views},
    wayland::{self, Wayland},
};

#[derive(Debug)]
pub struct Compositor {
    display: DisplayHandle,
    pub outputs: Outputs,
    pub views: Views<Wayland>,
    pub seat: Seat<Wayland>,
    pub surfaces: Surfaces,
    pub shell: Shell,
    /// Whether a frame was requested from the spatial compositor and has not been presented yet.
    pub(crate) frame_scheduled: bool,
    running: bool,
}

impl Compositor {
    /// Creates the compositor and advertises its globals on `display`.
    pub fn new(display: &DisplayHandle) -> Self {
        wayland::create_globals(display);

        Self {
            display: display.clone(),
            outputs: Outputs::default(),
            views: Views::new(),
            seat: Seat::new(SEAT_NAME),
            surfaces: Surfaces::default(),
            shell: Shell::default(),
            frame_scheduled: false,
            running: true,
        }
    }

    pub fn display(&self) -> &DisplayHandle {
        &self.display
    }

    pub fn running(&self) -> bool {
        self.running
    }

    /// Stops the event loop once the current iteration finishes.
    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Tells clients the last committed frame was presented.
    pub fn send_frame_done(&mut self, time: u32) {
        self.frame_scheduled = false;
        self.surfaces.send_frame_done(time);
    }

    pub(crate) fn commit_surface(&mut self, id: SurfaceId) {
        let Some(surface) = self.surfaces.get_mut(id) else {
            return;
        };

        surface.commit();

        match surface.role() {
            Some(Role::Toplevel(toplevel)) => self.commit_toplevel(toplevel),
            None => {}
        }
    }

    pub(crate) fn destroy_surface(&mut self, id: SurfaceId) {
        let Some(surface) = self.surfaces.remove(id) else {
            return;
        };

        if let Some(Role::Toplevel(toplevel)) = surface.role() {
            self.destroy_toplevel(toplevel);
        }

        tracing::trace!(surface = ?id, "Destroyed surface");
    }

    fn commit_toplevel(&mut self, id: ToplevelId) {
        let Some(entry) = self.shell.get_mut(id) else {
            return;
        };
        let Some(surface) = self.surfaces.get(entry.surface) else {
            return;
        };
        let size = surface.buffer_size();

        match entry.toplevel.commit(size.is_some()) {
            CommitAction::Configure => {
                let serial = self.seat.next_serial();
                // Zero lets the client pick its size.
                entry.xdg_toplevel.configure(0, 0, Vec::new());
                entry.xdg_surface.configure(serial);
                entry.toplevel.configure(serial);
            }

            CommitAction::Map => {
                let Some(output) = self.outputs.primary() else {
                    tracing::warn!(toplevel = ?id, "Cannot map a toplevel without an output");
                    return;
                };
                let Some(client) = surface.resource().client().map(|client| client.id()) else {
                    return;
                };
                let size = size.unwrap_or_else(|| cgmath::Vector2::new(0.0, 0.0));

                // Center on the output.
                let position = self
                    .outputs
                    .get(output)
                    .map(|output| {
                        Point2::new(
                            ((output.width as f32 - size.x) / 2.0).max(0.0),
                            ((output.height as f32 - size.y) / 2.0).max(0.0),
                        )
                    })
                    .unwrap_or_else(|| Point2::new(0.0, 0.0));

                let view = self.views.insert(View {
                    client,
                    surface: surface.resource().clone(),
                    output,
                    position,
                    size,
                });
                entry.toplevel.mapped(view);

                for wl_output in self.outputs.resources_for(output, surface.resource()) {
                    surface.resource().enter(wl_output);
                }

                tracing::debug!(toplevel = ?id, ?view, title = ?entry.toplevel.title, "Mapped toplevel");
            }

            CommitAction::Unmap(view) => {
                entry.toplevel.unmapped();
                self.unmap_view(view);
                tracing::debug!(toplevel = ?id, "Unmapped toplevel");
            }

            CommitAction::UnconfiguredBuffer => {
                entry.xdg_surface.post_error(
                    xdg_surface::Error::UnconfiguredBuffer,
                    "buffer attached before the configure was acknowledged",
                );
            }

            CommitAction::None => {
                // The client may have resized.
                if let (Some(view), Some(size)) = (entry.toplevel.view(), size) {
                    if let Some(view) = self.views.get_mut(view) {
                        view.size = size;
                    }
                }
            }
        }
    }

    pub(crate) fn destroy_toplevel(&mut self, id: ToplevelId) {
        let Some(entry) = self.shell.remove(id) else {
            return;
        };

        if let Some(view) = entry.toplevel.view() {
            self.unmap_view(view);
        }

        tracing::debug!(toplevel = ?id, "Destroyed toplevel");
    }

    pub(crate) fn move_toplevel(&mut self, id: ToplevelId, serial: u32) {
        let Some(view) = self.shell.get(id).and_then(|entry| entry.toplevel.view()) else {
            tracing::trace!(toplevel = ?id, "Ignoring move of an unmapped toplevel");
            return;
        };

        if self.seat.start_move(&self.views, view, serial) {
            self.views.raise(view);
            tracing::debug!(toplevel = ?id, ?view, "Started move");
        }
    }

    fn unmap_view(&mut self, view: ViewId) {
        if let Some(view) = self.views.remove(view) {
            for wl_output in self.outputs.resources_for(view.output, &view.surface) {
                view.surface.leave(wl_output);
            }
        }
    }
}

impl BackendHandler for Compositor {
    fn gain_ray_capability(&mut self) {
        self.seat.init_pointer();
    }

    fn lose_ray_capability(&mut self) {
        self.seat.release_pointer();
    }

    fn gain_keyboard_capability(&mut self) {
        self.seat.init_keyboard();
    }

    fn lose_keyboard_capability(&mut self) {
        self.seat.release_keyboard();
    }

    fn keyboard_keymap(&mut self, format: u32, fd: OwnedFd, size: u32) {
        self.seat.notify_keyboard_keymap(Keymap { format, fd, size });
    }
}
