//! Client side of the zigen spatial compositing protocol.
//!
//! The [`Backend`] is the connection to the spatial compositor. It owns every virtual object created through it
//! and routes the events of those objects to the handlers they were created with.
//!
//! The backend is generic over a context type `D` which is passed to handlers. The context also receives
//! seat wide events through [`BackendHandler`].
//!
//! # Dispatching
//!
//! Events are first decoded into an internal queue and then routed. This means a handler never observes the
//! backend in the middle of decoding, and any object a handler refers to by id may be destroyed in between
//! events: routing to a destroyed object is silently dropped.

pub mod cuboid_window;
mod error;
pub mod frame_callback;
pub mod protocol;
pub mod seat;
pub mod signal;
#[cfg(any(test, feature = "test-support"))]
mod testing;
pub mod virtual_object;

pub use cuboid_window::{CuboidWindow, CuboidWindowHandler, Geometry};
pub use error::Error;
pub use frame_callback::FrameCallbackId;
pub use seat::Capabilities;
pub use signal::{Listener, Signal};
pub use virtual_object::{
    ButtonState, InputEvent, KeyState, VirtualObject, VirtualObjectHandler, VirtualObjectId,
};

use std::{
    collections::VecDeque,
    env, fmt, io,
    os::{fd::OwnedFd, unix::net::UnixStream},
    path::PathBuf,
};

use cgmath::Vector3;
use slotmap::SlotMap;
use wayland_client::{
    backend::WaylandError,
    globals::{registry_queue_init, GlobalList, GlobalListContents},
    protocol::wl_registry::WlRegistry,
    Connection, Dispatch, EventQueue, Proxy, QueueHandle,
};

use crate::{
    frame_callback::FrameCallbacks,
    protocol::client::{zgn_compositor::ZgnCompositor, zgn_seat::ZgnSeat, zgn_shell::ZgnShell},
    seat::SeatState,
    virtual_object::Entry,
};

/// Version of the zigen globals this crate implements.
const VERSION: u32 = 1;

/// Seat wide events from the spatial compositor.
pub trait BackendHandler {
    fn gain_ray_capability(&mut self);

    fn lose_ray_capability(&mut self);

    fn gain_keyboard_capability(&mut self);

    fn lose_keyboard_capability(&mut self);

    /// The keymap of the keyboard changed.
    ///
    /// `format` uses the values of `wl_keyboard.keymap_format`.
    fn keyboard_keymap(&mut self, format: u32, fd: OwnedFd, size: u32);
}

/// A decoded event, waiting to be routed.
#[derive(Debug)]
pub(crate) enum Event {
    Capabilities {
        gained: Capabilities,
        lost: Capabilities,
    },

    Keymap {
        format: u32,
        fd: OwnedFd,
        size: u32,
    },

    Input {
        object: VirtualObjectId,
        event: InputEvent,
    },

    Frame {
        object: VirtualObjectId,
        time: u32,
    },

    Configure {
        object: VirtualObjectId,
        serial: u32,
        geometry: Geometry,
    },

    Moved {
        object: VirtualObjectId,
        face_direction: Vector3<f32>,
    },
}

#[derive(Debug)]
pub(crate) struct Globals {
    compositor: ZgnCompositor,
    shell: ZgnShell,
    seat: ZgnSeat,
}

/// State used while decoding events.
#[derive(Debug)]
pub(crate) struct Inner {
    globals: Globals,
    seat: SeatState,
    events: VecDeque<Event>,
}

pub struct Backend<D> {
    connection: Connection,
    queue: EventQueue<Inner>,
    inner: Inner,
    objects: SlotMap<VirtualObjectId, Entry<D>>,
    frame_callbacks: FrameCallbacks<D>,
}

impl<D: BackendHandler> Backend<D> {
    /// Connects to the spatial compositor listening on `socket`.
    ///
    /// A relative socket name is resolved against `XDG_RUNTIME_DIR`.
    pub fn connect(socket: &str) -> Result<Self, Error> {
        let path = socket_path(socket)?;
        tracing::info!(path = %path.display(), "Connecting to the spatial compositor");

        let stream = UnixStream::connect(&path)?;
        let connection = Connection::from_socket(stream)?;
        let (globals, queue) = registry_queue_init::<Inner>(&connection)?;
        let qh = queue.handle();

        let globals = Globals {
            compositor: bind(&globals, &qh)?,
            shell: bind(&globals, &qh)?,
            seat: bind(&globals, &qh)?,
        };

        Ok(Self::from_parts(connection, queue, globals))
    }

    fn from_parts(connection: Connection, queue: EventQueue<Inner>, globals: Globals) -> Self {
        Self {
            connection,
            queue,
            inner: Inner {
                globals,
                seat: SeatState::default(),
                events: VecDeque::new(),
            },
            objects: SlotMap::with_key(),
            frame_callbacks: FrameCallbacks::new(),
        }
    }

    /// A duplicate of the file descriptor to poll for readability.
    pub fn fd(&self) -> io::Result<OwnedFd> {
        self.connection.backend().poll_fd().try_clone_to_owned()
    }

    /// Reads events from the connection and routes them.
    ///
    /// Returns the number of routed events.
    pub fn dispatch(&mut self, ctx: &mut D) -> Result<usize, Error> {
        if let Some(guard) = self.queue.prepare_read() {
            match guard.read() {
                Ok(_) => {}
                Err(WaylandError::Io(err)) if err.kind() == io::ErrorKind::WouldBlock => {}
                Err(err) => return Err(err.into()),
            }
        }

        self.dispatch_pending(ctx)
    }

    /// Routes events which have already been read, without reading from the connection.
    pub fn dispatch_pending(&mut self, ctx: &mut D) -> Result<usize, Error> {
        self.queue.dispatch_pending(&mut self.inner)?;

        let mut routed = 0;

        while let Some(event) = self.inner.events.pop_front() {
            self.route(ctx, event);
            routed += 1;
        }

        Ok(routed)
    }

    /// Writes pending requests to the connection.
    pub fn flush(&self) -> Result<(), Error> {
        match self.connection.flush() {
            Ok(()) => Ok(()),
            Err(WaylandError::Io(err)) if err.kind() == io::ErrorKind::WouldBlock => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    pub fn capabilities(&self) -> Capabilities {
        self.inner.seat.capabilities()
    }

    /// Creates a virtual object without a role.
    pub fn create_virtual_object<H>(&mut self, handler: H) -> Result<VirtualObjectId, Error>
    where
        H: VirtualObjectHandler<D> + 'static,
    {
        let qh = self.queue.handle();
        let compositor = &self.inner.globals.compositor;

        self.objects.try_insert_with_key(|id| {
            let object = VirtualObject::new(id, compositor, &qh)?;

            Ok(Entry::Plain {
                object,
                handler: Box::new(handler),
            })
        })
    }

    /// Creates a virtual object with the cuboid window role.
    ///
    /// `geometry` is a hint; the window's geometry is decided by the first configure.
    pub fn create_cuboid_window<H>(&mut self, geometry: Geometry, handler: H) -> Result<VirtualObjectId, Error>
    where
        H: CuboidWindowHandler<D> + 'static,
    {
        let qh = self.queue.handle();
        let Globals {
            compositor,
            shell,
            seat,
        } = &self.inner.globals;
        let ray_grab = self.inner.seat.grab().clone();

        self.objects.try_insert_with_key(|id| {
            let object = VirtualObject::new(id, compositor, &qh)?;
            let window = CuboidWindow::new(object, shell, seat, ray_grab, geometry, &qh);
            tracing::debug!(?id, ?geometry, "Created cuboid window");

            Ok(Entry::CuboidWindow {
                window,
                handler: Box::new(handler),
            })
        })
    }

    /// Destroys a virtual object and its role.
    ///
    /// Pending frame callbacks of the object are dropped without being invoked. Returns `false` if the object
    /// was already destroyed.
    pub fn destroy(&mut self, id: VirtualObjectId) -> bool {
        let Some(mut entry) = self.objects.remove(id) else {
            return false;
        };

        for callback in entry.object_mut().frame_callbacks.drain(..) {
            self.frame_callbacks.remove(callback);
        }

        // The destroy signal is emitted while dropping.
        drop(entry);
        true
    }

    pub fn virtual_object(&self, id: VirtualObjectId) -> Option<&VirtualObject> {
        self.objects.get(id).map(Entry::object)
    }

    pub fn cuboid_window(&self, id: VirtualObjectId) -> Option<&CuboidWindow> {
        match self.objects.get(id)? {
            Entry::CuboidWindow { window, .. } => Some(window),
            Entry::Plain { .. } => None,
        }
    }

    pub fn cuboid_window_mut(&mut self, id: VirtualObjectId) -> Option<&mut CuboidWindow> {
        match self.objects.get_mut(id)? {
            Entry::CuboidWindow { window, .. } => Some(window),
            Entry::Plain { .. } => None,
        }
    }

    /// Commits a virtual object.
    ///
    /// Cuboid windows are only committed once configured.
    pub fn commit(&mut self, id: VirtualObjectId) -> bool {
        match self.objects.get_mut(id) {
            Some(Entry::Plain { object, .. }) => object.commit(),
            Some(Entry::CuboidWindow { window, .. }) => window.commit(),
            None => return false,
        }

        true
    }

    /// Registers a callback to be invoked once the next commit of the object is presented.
    ///
    /// The callback receives the presentation time in milliseconds. Returns `None` if the object does not exist.
    pub fn frame_callback<F>(&mut self, id: VirtualObjectId, callback: F) -> Option<FrameCallbackId>
    where
        F: FnOnce(&mut D, u32) + 'static,
    {
        let qh = self.queue.handle();
        let object = self.objects.get_mut(id)?.object_mut();

        let callback = self.frame_callbacks.insert(id, Box::new(callback));
        object.frame_callbacks.push(callback);
        object.request_frame(&qh);

        Some(callback)
    }

    /// Removes a frame callback before it fires.
    pub fn destroy_frame_callback(&mut self, callback: FrameCallbackId) -> bool {
        let Some(object) = self.frame_callbacks.remove(callback) else {
            return false;
        };

        if let Some(entry) = self.objects.get_mut(object) {
            entry.object_mut().frame_callbacks.retain(|id| *id != callback);
        }

        true
    }

    fn route(&mut self, ctx: &mut D, event: Event) {
        match event {
            Event::Capabilities { gained, lost } => {
                if lost.contains(Capabilities::RAY) {
                    ctx.lose_ray_capability();
                }

                if lost.contains(Capabilities::KEYBOARD) {
                    ctx.lose_keyboard_capability();
                }

                if gained.contains(Capabilities::RAY) {
                    ctx.gain_ray_capability();
                }

                if gained.contains(Capabilities::KEYBOARD) {
                    ctx.gain_keyboard_capability();
                }
            }

            Event::Keymap { format, fd, size } => ctx.keyboard_keymap(format, fd, size),

            Event::Input { object, event } => match self.objects.get_mut(object) {
                Some(entry) => entry.input(ctx, event),
                None => tracing::trace!(?object, "Dropping input for a destroyed virtual object"),
            },

            Event::Frame { object, time } => {
                let Some(entry) = self.objects.get_mut(object) else {
                    return;
                };

                let object = entry.object_mut();
                object.frame_requested = false;
                let callbacks = std::mem::take(&mut object.frame_callbacks);

                for id in callbacks {
                    if let Some(callback) = self.frame_callbacks.take(id) {
                        callback(ctx, time);
                    }
                }
            }

            Event::Configure {
                object,
                serial,
                geometry,
            } => {
                if let Some(Entry::CuboidWindow { window, handler }) = self.objects.get_mut(object) {
                    tracing::trace!(?object, serial, ?geometry, "Configure cuboid window");
                    window.configure(serial, geometry);
                    handler.configured(ctx, window);
                }
            }

            Event::Moved { object, face_direction } => {
                if let Some(Entry::CuboidWindow { window, handler }) = self.objects.get_mut(object) {
                    handler.moved(ctx, window, face_direction);
                }
            }
        }
    }
}

impl<D> fmt::Debug for Backend<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Backend")
            .field("capabilities", &self.inner.seat.capabilities())
            .field("objects", &self.objects.len())
            .field("frame_callbacks", &self.frame_callbacks)
            .finish_non_exhaustive()
    }
}

fn socket_path(socket: &str) -> Result<PathBuf, Error> {
    let socket = PathBuf::from(socket);

    if socket.is_absolute() {
        return Ok(socket);
    }

    let runtime_dir = env::var_os("XDG_RUNTIME_DIR").ok_or(Error::NoRuntimeDir)?;
    Ok(PathBuf::from(runtime_dir).join(socket))
}

fn bind<I>(globals: &GlobalList, qh: &QueueHandle<Inner>) -> Result<I, Error>
where
    I: Proxy + 'static,
    Inner: Dispatch<I, ()>,
{
    globals
        .bind::<I, _, _>(qh, VERSION..=VERSION, ())
        .map_err(|source| Error::MissingGlobal {
            interface: I::interface().name,
            source,
        })
}

impl Dispatch<WlRegistry, GlobalListContents> for Inner {
    fn event(
        _state: &mut Self,
        _registry: &WlRegistry,
        _event: <WlRegistry as Proxy>::Event,
        _data: &GlobalListContents,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
        // Globals are only bound at startup.
    }
}

#[cfg(test)]
mod tests;
