use std::io;

use wayland_client::{
    backend::WaylandError,
    globals::{BindError, GlobalError},
    ConnectError, DispatchError,
};

/// An error from the connection to the spatial compositor.
///
/// Any error returned after the connection was established is fatal for the session.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to connect to the spatial compositor")]
    Connect(#[from] ConnectError),

    #[error("XDG_RUNTIME_DIR is not set")]
    NoRuntimeDir,

    #[error("failed to receive the initial globals")]
    Globals(#[from] GlobalError),

    #[error("required global \"{interface}\" is not available")]
    MissingGlobal {
        interface: &'static str,
        #[source]
        source: BindError,
    },

    #[error("the connection to the spatial compositor is dead")]
    DeadProxy,

    #[error(transparent)]
    Wayland(#[from] WaylandError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error(transparent)]
    Io(#[from] io::Error),
}
