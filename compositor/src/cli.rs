//! Command line argument parsing using clap.

use clap::Parser;

/// The zmonitors Wayland compositor
#[deny(missing_docs)]
#[derive(Parser, Debug)]
#[clap(about = "Shows Wayland clients on monitors in a spatial compositor", author, version)]
pub struct ZmonitorsArgs {
    /// Socket of the spatial compositor
    ///
    /// A relative name is looked up in `XDG_RUNTIME_DIR`.
    #[clap(long, default_value = "zigen-0")]
    pub backend_socket: String,

    /// Name of the Wayland socket to listen on
    ///
    /// By default the first free `wayland-N` socket is used.
    #[clap(short, long)]
    pub socket: Option<String>,

    /// Horizontal resolution of the monitor in pixels.
    #[clap(long, default_value_t = 1920)]
    pub width: u32,

    /// Vertical resolution of the monitor in pixels.
    #[clap(long, default_value_t = 1080)]
    pub height: u32,

    /// Half of the monitor's width in the spatial compositor, in meters.
    #[clap(long, default_value_t = 0.48)]
    pub half_width: f32,

    /// Half of the monitor's height in the spatial compositor, in meters.
    #[clap(long, default_value_t = 0.27)]
    pub half_height: f32,
}
