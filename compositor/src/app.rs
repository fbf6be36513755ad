//! The application: the Wayland server, the connection to the spatial compositor and the primary monitor, driven
//! by one event loop.
//!
//! Everything is created in order: the compositor, the backend connection and then the monitor. Teardown runs in
//! reverse.

use std::{fmt, io};

use calloop::{
    generic::Generic,
    signals::{Signal, Signals},
    EventLoop, Interest, LoopHandle, Mode, PostAction, Readiness,
};
use cgmath::{Quaternion, Vector2, Vector3};
use wayland_server::{Display, ListeningSocket};
use zmonitors_backend::{Backend, CuboidWindow, Geometry, VirtualObjectId};

use crate::{cli::ZmonitorsArgs, client::ClientData, monitor::Monitor, ui::Root, Compositor, Error};

/// Half depth of the monitor's cuboid.
const MONITOR_HALF_DEPTH: f32 = 0.01;

pub struct App {
    pub compositor: Compositor,
    display: Display<Compositor>,
    backend: Backend<Compositor>,
    monitor: VirtualObjectId,
    /// The error which ended the session, if any.
    failure: Option<Error>,
}

impl App {
    pub fn new(args: &ZmonitorsArgs) -> Result<Self, Error> {
        let display = Display::<Compositor>::new()?;
        let mut compositor = Compositor::new(&display.handle());

        let mut backend = Backend::connect(&args.backend_socket)?;

        let output = compositor.outputs.create(
            &display.handle(),
            "monitor-0".to_owned(),
            args.width as i32,
            args.height as i32,
        );
        let monitor = Monitor::new(output, Vector2::new(args.width as f32, args.height as f32));
        let geometry = Geometry {
            half_size: Vector3::new(args.half_width, args.half_height, MONITOR_HALF_DEPTH),
            quaternion: Quaternion::new(1.0, 0.0, 0.0, 0.0),
        };
        let monitor = backend.create_cuboid_window(geometry, Root::new(monitor))?;
        backend.flush()?;

        Ok(Self {
            compositor,
            display,
            backend,
            monitor,
            failure: None,
        })
    }

    /// Registers the display, the listening socket, the backend connection and termination signals.
    pub fn insert_sources(&mut self, handle: &LoopHandle<'static, App>, socket: ListeningSocket) -> Result<(), Error> {
        let display_fd = self.display.backend().poll_fd().try_clone_to_owned()?;
        handle
            .insert_source(Generic::new(display_fd, Interest::READ, Mode::Level), |_, _, app| {
                app.display.dispatch_clients(&mut app.compositor)?;
                Ok(PostAction::Continue)
            })
            .map_err(|err| err.error)?;

        handle
            .insert_source(Generic::new(socket, Interest::READ, Mode::Level), |_, socket, app| {
                while let Some(stream) = socket.accept()? {
                    let client = ClientData::create_client(&mut app.display.handle(), stream)?;
                    tracing::trace!(client = ?client.id(), "Accepted client");
                }

                Ok(PostAction::Continue)
            })
            .map_err(|err| err.error)?;

        let backend_fd = self.backend.fd()?;
        handle
            .insert_source(Generic::new(backend_fd, Interest::READ, Mode::Level), |readiness, _, app| {
                if let Err(err) = app.backend_ready(readiness) {
                    tracing::error!(%err, "Lost the connection to the spatial compositor");
                    app.fail(err);
                    return Ok(PostAction::Remove);
                }

                Ok(PostAction::Continue)
            })
            .map_err(|err| err.error)?;

        let signals = Signals::new(&[Signal::SIGINT, Signal::SIGTERM, Signal::SIGQUIT])?;
        handle
            .insert_source(signals, |event, _, app| {
                tracing::info!(signal = ?event.signal(), "Shutting down");
                app.compositor.stop();
            })
            .map_err(|err| err.error)?;

        Ok(())
    }

    /// Runs until a termination signal arrives or the session fails.
    pub fn run(mut self, mut event_loop: EventLoop<'static, App>) -> Result<(), Error> {
        let signal = event_loop.get_signal();

        event_loop.run(None, &mut self, |app| {
            if !app.compositor.running() {
                signal.stop();
                return;
            }

            app.idle();
        })?;

        match self.failure.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn backend_ready(&mut self, readiness: Readiness) -> Result<(), Error> {
        if readiness.error {
            return Err(io::Error::new(io::ErrorKind::ConnectionAborted, "backend connection hung up").into());
        }

        if readiness.readable {
            self.backend.dispatch(&mut self.compositor)?;
        }

        if readiness.writable {
            self.backend.flush()?;
        }

        if !readiness.readable && !readiness.writable {
            self.backend.dispatch_pending(&mut self.compositor)?;
            self.backend.flush()?;
        }

        Ok(())
    }

    /// Work done once events have been dispatched.
    fn idle(&mut self) {
        self.schedule_frame();

        if let Err(err) = self.display.flush_clients() {
            tracing::warn!(%err, "Failed to flush clients");
        }

        if let Err(err) = self.backend.flush() {
            tracing::error!(%err, "Failed to flush the spatial compositor connection");
            self.fail(err.into());
        }
    }

    /// Asks for a frame callback on the monitor while surfaces wait for one.
    fn schedule_frame(&mut self) {
        if self.compositor.frame_scheduled || !self.compositor.surfaces.has_frame_callbacks() {
            return;
        }

        let configured = self
            .backend
            .cuboid_window(self.monitor)
            .map_or(false, CuboidWindow::is_configured);

        if !configured {
            return;
        }

        let scheduled = self
            .backend
            .frame_callback(self.monitor, |compositor: &mut Compositor, time| {
                compositor.send_frame_done(time);
            })
            .is_some();

        if scheduled {
            self.backend.commit(self.monitor);
            self.compositor.frame_scheduled = true;
        }
    }

    fn fail(&mut self, err: Error) {
        self.failure.get_or_insert(err);
        self.compositor.stop();
    }
}

impl Drop for App {
    fn drop(&mut self) {
        self.backend.destroy(self.monitor);

        if let Err(err) = self.backend.flush() {
            tracing::debug!(%err, "Failed to flush while shutting down");
        }
    }
}

/// Binds the Wayland socket, `name` or the first free `wayland-N`.
pub fn bind_socket(name: Option<&str>) -> Result<ListeningSocket, Error> {
    let socket = match name {
        Some(name) => ListeningSocket::bind(name)?,
        None => ListeningSocket::bind_auto("wayland", 1..33)?,
    };

    if let Some(name) = socket.socket_name() {
        tracing::info!(socket = ?name, "Listening for Wayland clients");
    }

    Ok(socket)
}

impl fmt::Debug for App {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("App")
            .field("compositor", &self.compositor)
            .field("backend", &self.backend)
            .field("monitor", &self.monitor)
            .finish_non_exhaustive()
    }
}
