//! A Wayland compositor which shows its clients on monitors floating in a spatial compositor.
//!
//! Clients connect over Wayland as they would to any desktop compositor. Each output is a monitor, a cuboid
//! window in the spatial compositor, and the user interacts with client windows by pointing a ray at the monitor.

pub mod app;
pub mod cli;
mod client;
pub mod compositor;
mod error;
pub mod monitor;
pub mod output;
pub mod seat;
mod serial;
pub mod shell;
pub mod surface;
pub mod ui;
pub mod view;
pub mod wayland;

pub use compositor::Compositor;
pub use error::Error;

use calloop::EventLoop;

use crate::{
    app::{bind_socket, App},
    cli::ZmonitorsArgs,
};

/// Runs the compositor until it is told to shut down.
pub fn run(args: &ZmonitorsArgs) -> Result<(), Error> {
    let event_loop = EventLoop::<App>::try_new()?;
    let mut app = App::new(args)?;
    let socket = bind_socket(args.socket.as_deref())?;

    app.insert_sources(&event_loop.handle(), socket)?;
    app.run(event_loop)
}
