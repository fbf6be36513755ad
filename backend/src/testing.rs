//! Driving a backend without a spatial compositor.
//!
//! The backend is connected to one end of a socket pair. Nothing answers on the other end, so events are queued
//! as if they had just been decoded and are routed by the next [`Backend::dispatch_pending`].

use std::os::unix::net::UnixStream;

use wayland_client::{protocol::wl_registry::WlRegistry, Connection, Dispatch, Proxy, QueueHandle};

use crate::{Backend, BackendHandler, Error, Event, Geometry, Globals, Inner, InputEvent, VirtualObjectId};

impl<D: BackendHandler> Backend<D> {
    /// Creates a backend with globals bound over a socket pair.
    ///
    /// The returned stream is the other end of the connection and must outlive the backend for proxies to be
    /// created.
    pub fn offline() -> Result<(Self, UnixStream), Error> {
        let (client, server) = UnixStream::pair()?;
        let connection = Connection::from_socket(client)?;
        let queue = connection.new_event_queue::<Inner>();
        let qh = queue.handle();
        let registry = connection.display().get_registry(&qh, ());

        let globals = Globals {
            compositor: registry.bind(1, 1, &qh, ()),
            shell: registry.bind(2, 1, &qh, ()),
            seat: registry.bind(3, 1, &qh, ()),
        };

        Ok((Self::from_parts(connection, queue, globals), server))
    }

    /// Queues a configure for the cuboid window `object`.
    pub fn queue_configure(&mut self, object: VirtualObjectId, serial: u32, geometry: Geometry) {
        self.inner.events.push_back(Event::Configure {
            object,
            serial,
            geometry,
        });
    }

    pub fn queue_input(&mut self, object: VirtualObjectId, event: InputEvent) {
        self.inner.events.push_back(Event::Input { object, event });
    }

    /// Queues a frame done for `object`.
    pub fn queue_frame(&mut self, object: VirtualObjectId, time: u32) {
        self.inner.events.push_back(Event::Frame { object, time });
    }
}

impl Dispatch<WlRegistry, ()> for Inner {
    fn event(
        _state: &mut Self,
        _registry: &WlRegistry,
        _event: <WlRegistry as Proxy>::Event,
        _data: &(),
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
    }
}
