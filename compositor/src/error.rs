use std::io;

use wayland_server::{backend::InitError, BindError};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to create the wayland display")]
    Display(#[from] InitError),

    #[error("failed to bind the wayland socket")]
    Socket(#[from] BindError),

    #[error(transparent)]
    Backend(#[from] zmonitors_backend::Error),

    #[error("event loop error")]
    EventLoop(#[from] calloop::Error),

    #[error(transparent)]
    Io(#[from] io::Error),
}
