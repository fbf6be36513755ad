use wayland_protocols::xdg::shell::server::{
    xdg_popup::{self, XdgPopup},
    xdg_positioner::{self, XdgPositioner},
    xdg_surface::{self, XdgSurface},
    xdg_toplevel::{self, XdgToplevel},
    xdg_wm_base::{self, XdgWmBase},
};
use wayland_server::{
    backend::ClientId, Client, DataInit, Dispatch, DisplayHandle, GlobalDispatch, New, Resource,
};

use crate::{
    shell::{ShellToplevel, Toplevel, ToplevelId},
    surface::{Role, SurfaceId},
    Compositor,
};

impl GlobalDispatch<XdgWmBase, ()> for Compositor {
    fn bind(
        _state: &mut Self,
        _handle: &DisplayHandle,
        _client: &Client,
        resource: New<XdgWmBase>,
        _global_data: &(),
        data_init: &mut DataInit<'_, Self>,
    ) {
        data_init.init(resource, ());
    }
}

impl Dispatch<XdgWmBase, ()> for Compositor {
    fn request(
        _state: &mut Self,
        _client: &Client,
        resource: &XdgWmBase,
        request: xdg_wm_base::Request,
        _data: &(),
        _dhandle: &DisplayHandle,
        data_init: &mut DataInit<'_, Self>,
    ) {
        match request {
            xdg_wm_base::Request::CreatePositioner { id } => {
                data_init.init(id, ());
            }

            xdg_wm_base::Request::GetXdgSurface { id, surface } => {
                let Some(&surface) = surface.data::<SurfaceId>() else {
                    resource.post_error(xdg_wm_base::Error::InvalidSurfaceState, "unknown wl_surface");
                    return;
                };

                data_init.init(id, surface);
            }

            xdg_wm_base::Request::Pong { .. } | xdg_wm_base::Request::Destroy => {}

            _ => tracing::warn!(?request, "Unhandled xdg_wm_base request"),
        }
    }
}

impl Dispatch<XdgPositioner, ()> for Compositor {
    fn request(
        _state: &mut Self,
        _client: &Client,
        _resource: &XdgPositioner,
        request: xdg_positioner::Request,
        _data: &(),
        _dhandle: &DisplayHandle,
        _data_init: &mut DataInit<'_, Self>,
    ) {
        // Popups are not supported, so the positioner is never used.
        tracing::trace!(?request, "xdg_positioner request");
    }
}

impl Dispatch<XdgSurface, SurfaceId> for Compositor {
    fn request(
        state: &mut Self,
        _client: &Client,
        resource: &XdgSurface,
        request: xdg_surface::Request,
        data: &SurfaceId,
        _dhandle: &DisplayHandle,
        data_init: &mut DataInit<'_, Self>,
    ) {
        let surface = *data;

        match request {
            xdg_surface::Request::GetToplevel { id } => {
                if state.surfaces.get(surface).map_or(true, |surface| surface.role().is_some()) {
                    resource.post_error(xdg_surface::Error::AlreadyConstructed, "surface already has a role");
                    return;
                }

                let toplevel = state.shell.insert_with(|toplevel| ShellToplevel {
                    surface,
                    xdg_surface: resource.clone(),
                    xdg_toplevel: data_init.init(id, toplevel),
                    toplevel: Toplevel::new(),
                });

                if let Some(surface) = state.surfaces.get_mut(surface) {
                    surface.set_role(Role::Toplevel(toplevel));
                }

                tracing::debug!(?toplevel, ?surface, "Created toplevel");
            }

            xdg_surface::Request::GetPopup { id, .. } => {
                data_init.init(id, ());
                tracing::warn!(?surface, "Popups are not supported");
            }

            xdg_surface::Request::AckConfigure { serial } => {
                let Some(Role::Toplevel(toplevel)) = state.surfaces.get(surface).and_then(|surface| surface.role())
                else {
                    resource.post_error(xdg_surface::Error::NotConstructed, "xdg_surface has no role");
                    return;
                };

                let acked = state
                    .shell
                    .get_mut(toplevel)
                    .map_or(false, |entry| entry.toplevel.ack_configure(serial));

                if !acked {
                    tracing::debug!(?toplevel, serial, "Ignoring ack of an unknown configure");
                }
            }

            xdg_surface::Request::SetWindowGeometry { .. } | xdg_surface::Request::Destroy => {}

            _ => tracing::warn!(?request, "Unhandled xdg_surface request"),
        }
    }
}

impl Dispatch<XdgToplevel, ToplevelId> for Compositor {
    fn request(
        state: &mut Self,
        _client: &Client,
        _resource: &XdgToplevel,
        request: xdg_toplevel::Request,
        data: &ToplevelId,
        _dhandle: &DisplayHandle,
        _data_init: &mut DataInit<'_, Self>,
    ) {
        let id = *data;

        match request {
            xdg_toplevel::Request::SetTitle { title } => {
                if let Some(entry) = state.shell.get_mut(id) {
                    entry.toplevel.title = Some(title);
                }
            }

            xdg_toplevel::Request::SetAppId { app_id } => {
                if let Some(entry) = state.shell.get_mut(id) {
                    entry.toplevel.app_id = Some(app_id);
                }
            }

            xdg_toplevel::Request::Move { serial, .. } => state.move_toplevel(id, serial),

            xdg_toplevel::Request::Resize { serial, .. } => {
                tracing::warn!(toplevel = ?id, serial, "Interactive resize is not supported");
            }

            // Window state requests have no meaning on a monitor.
            xdg_toplevel::Request::SetParent { .. }
            | xdg_toplevel::Request::ShowWindowMenu { .. }
            | xdg_toplevel::Request::SetMaxSize { .. }
            | xdg_toplevel::Request::SetMinSize { .. }
            | xdg_toplevel::Request::SetMaximized
            | xdg_toplevel::Request::UnsetMaximized
            | xdg_toplevel::Request::SetFullscreen { .. }
            | xdg_toplevel::Request::UnsetFullscreen
            | xdg_toplevel::Request::SetMinimized => {
                tracing::trace!(toplevel = ?id, ?request, "Ignoring toplevel state request");
            }

            xdg_toplevel::Request::Destroy => {}

            _ => tracing::warn!(?request, "Unhandled xdg_toplevel request"),
        }
    }

    fn destroyed(state: &mut Self, _client: ClientId, _resource: &XdgToplevel, data: &ToplevelId) {
        state.destroy_toplevel(*data);
    }
}

impl Dispatch<XdgPopup, ()> for Compositor {
    fn request(
        _state: &mut Self,
        _client: &Client,
        _resource: &XdgPopup,
        request: xdg_popup::Request,
        _data: &(),
        _dhandle: &DisplayHandle,
        _data_init: &mut DataInit<'_, Self>,
    ) {
        match request {
            xdg_popup::Request::Destroy => {}
            _ => tracing::warn!(?request, "Unhandled xdg_popup request"),
        }
    }
}
