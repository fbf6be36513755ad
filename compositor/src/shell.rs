//! The shell implementation
//!
//! # Toplevel state machine
//!
//! A toplevel goes through three states before it is shown: new, configured and mapped.
//!
//! ```text
//! /---> New ---> Configuring ---> Unmapped ---> Mapped ---\
//! |                                  ^            |  ^ |   |
//! |                                  \------------/  \-/   |
//! |                                                        |
//! \--------------------------------------------------------/
//! ```
//!
//! A toplevel starts in the `New` state. The client must perform an initial commit without a buffer, after which
//! the toplevel is configured. Before the client may attach a buffer it must acknowledge a configure. Attaching
//! a buffer before that is a protocol error.
//!
//! Once a configure is acknowledged, a commit with a buffer maps the toplevel and a view for it is placed on the
//! primary output. The toplevel stays mapped through later commits and configures. Committing a null buffer
//! unmaps the toplevel and it becomes new again, so the next commit must again be an initial commit.
//!
//! The toplevel can also be destroyed in any state, which unmaps it.

use slotmap::{new_key_type, SlotMap};
use wayland_protocols::xdg::shell::server::{xdg_surface::XdgSurface, xdg_toplevel::XdgToplevel};

use crate::{surface::SurfaceId, view::ViewId};

new_key_type! {
    pub struct ToplevelId;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToplevelState {
    /// Waiting for the initial commit.
    New,

    /// Configured but the client has not acknowledged a configure yet.
    Configuring,

    /// A configure was acknowledged, a buffer maps the toplevel.
    Unmapped,

    Mapped(ViewId),
}

/// What a commit of a toplevel requires from the compositor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitAction {
    /// The initial commit, the toplevel must be configured.
    Configure,

    Map,

    Unmap(ViewId),

    /// The client attached a buffer before acknowledging a configure.
    UnconfiguredBuffer,

    /// Nothing changes about whether the toplevel is shown.
    None,
}

#[derive(Debug)]
pub struct Toplevel {
    state: ToplevelState,
    /// Configures which were sent but not acknowledged, oldest first.
    pending_configures: Vec<u32>,
    pub title: Option<String>,
    pub app_id: Option<String>,
}

impl Toplevel {
    pub fn new() -> Self {
        Self {
            state: ToplevelState::New,
            pending_configures: Vec::new(),
            title: None,
            app_id: None,
        }
    }

    pub fn state(&self) -> ToplevelState {
        self.state
    }

    pub fn view(&self) -> Option<ViewId> {
        match self.state {
            ToplevelState::Mapped(view) => Some(view),
            _ => None,
        }
    }

    /// Decides what a commit means. `has_buffer` is whether a buffer is attached after the commit.
    pub fn commit(&self, has_buffer: bool) -> CommitAction {
        match (self.state, has_buffer) {
            (ToplevelState::New, false) => CommitAction::Configure,
            (ToplevelState::New | ToplevelState::Configuring, true) => CommitAction::UnconfiguredBuffer,
            (ToplevelState::Configuring, false) | (ToplevelState::Unmapped, false) => CommitAction::None,
            (ToplevelState::Unmapped, true) => CommitAction::Map,
            (ToplevelState::Mapped(_), true) => CommitAction::None,
            (ToplevelState::Mapped(view), false) => CommitAction::Unmap(view),
        }
    }

    /// Records a configure sent with `serial`.
    pub fn configure(&mut self, serial: u32) {
        self.pending_configures.push(serial);

        if self.state == ToplevelState::New {
            self.state = ToplevelState::Configuring;
        }
    }

    /// Acknowledges the configure sent with `serial` and every configure sent before it.
    ///
    /// Returns `false` if no configure with `serial` is pending.
    pub fn ack_configure(&mut self, serial: u32) -> bool {
        let Some(index) = self.pending_configures.iter().position(|&pending| pending == serial) else {
            return false;
        };

        self.pending_configures.drain(..=index);

        if self.state == ToplevelState::Configuring {
            self.state = ToplevelState::Unmapped;
        }

        true
    }

    pub fn mapped(&mut self, view: ViewId) {
        self.state = ToplevelState::Mapped(view);
    }

    pub fn unmapped(&mut self) {
        self.state = ToplevelState::New;
        self.pending_configures.clear();
    }
}

impl Default for Toplevel {
    fn default() -> Self {
        Self::new()
    }
}

/// A toplevel and the resources which make it up.
#[derive(Debug)]
pub struct ShellToplevel {
    pub surface: SurfaceId,
    pub xdg_surface: XdgSurface,
    pub xdg_toplevel: XdgToplevel,
    pub toplevel: Toplevel,
}

#[derive(Debug, Default)]
pub struct Shell {
    toplevels: SlotMap<ToplevelId, ShellToplevel>,
}

impl Shell {
    pub fn insert_with<F>(&mut self, f: F) -> ToplevelId
    where
        F: FnOnce(ToplevelId) -> ShellToplevel,
    {
        self.toplevels.insert_with_key(f)
    }

    pub fn remove(&mut self, id: ToplevelId) -> Option<ShellToplevel> {
        self.toplevels.remove(id)
    }

    pub fn get(&self, id: ToplevelId) -> Option<&ShellToplevel> {
        self.toplevels.get(id)
    }

    pub fn get_mut(&mut self, id: ToplevelId) -> Option<&mut ShellToplevel> {
        self.toplevels.get_mut(id)
    }

    pub fn len(&self) -> usize {
        self.toplevels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.toplevels.is_empty()
    }
}
