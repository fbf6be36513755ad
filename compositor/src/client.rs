use std::{io, os::unix::net::UnixStream, sync::Arc};

use wayland_server::{
    backend::{self, ClientId, DisconnectReason},
    Client, DisplayHandle,
};

/// Data associated with a [`Client`].
#[derive(Debug, Default)]
pub struct ClientData;

impl ClientData {
    /// Creates a client for a newly accepted connection.
    ///
    /// This function takes ownership of the `stream`.
    pub fn create_client(display: &mut DisplayHandle, stream: UnixStream) -> io::Result<Client> {
        display.insert_client(stream, Arc::new(ClientData))
    }
}

impl backend::ClientData for ClientData {
    fn initialized(&self, client: ClientId) {
        tracing::debug!(?client, "Client connected");
    }

    fn disconnected(&self, client: ClientId, reason: DisconnectReason) {
        match reason {
            DisconnectReason::ConnectionClosed => tracing::debug!(?client, "Client disconnected"),
            DisconnectReason::ProtocolError(err) => {
                tracing::warn!(?client, code = err.code, message = %err.message, "Client killed by protocol error")
            }
        }
    }
}

