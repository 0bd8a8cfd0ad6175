//! The menu orchestrator service.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use horizon_trellis_core::service::{ActionHost, Service};
use horizon_trellis_core::{Error, Result, run_blocking};

use crate::config::ConfigNode;
use crate::context::UiContext;
use crate::layout::MenuLayoutManager;
use crate::registrar::MenuRegistrar;
use crate::toolkit::MenuItemHandle;

use super::{layout_section, registry_section};

/// Owns one menu: its layout manager and its registrar.
///
/// The menu finds its own widget through the container registry under its
/// sid, published either by a parent menu managing it as a sub-menu or by
/// whoever assembled the menu bar. Starting builds the items on the UI
/// dispatcher and manages the bindings; stopping reverses both, and the
/// service can then be started again.
///
/// As an [`ActionHost`] the menu receives the fan-out of state changes for
/// every action bound to one of its items and mirrors them into the
/// widgets, marshalled over the UI dispatcher and waited on. Callers must
/// therefore sit off the UI thread; the dispatcher refuses the blocking
/// wait otherwise.
pub struct MenuService {
    sid: String,
    context: Arc<UiContext>,
    layout: Arc<MenuLayoutManager>,
    registrar: MenuRegistrar,
    started: AtomicBool,
}

impl MenuService {
    /// Create an unconfigured menu service.
    pub fn new(sid: impl Into<String>, context: Arc<UiContext>) -> Self {
        let sid = sid.into();
        Self {
            layout: Arc::new(MenuLayoutManager::new(context.toolkit().clone())),
            registrar: MenuRegistrar::new(sid.clone()),
            sid,
            context,
            started: AtomicBool::new(false),
        }
    }

    /// The service id.
    pub fn sid(&self) -> &str {
        &self.sid
    }

    /// Parse the `<gui><layout>` and `<registry>` sections.
    pub fn initialize(&self, config: &ConfigNode) -> Result<()> {
        self.layout.initialize(layout_section(config, &self.sid)?)?;
        self.registrar
            .initialize(&registry_section(config), self.context.services())
    }

    /// The layout manager, for inspection.
    pub fn layout(&self) -> &Arc<MenuLayoutManager> {
        &self.layout
    }

    /// The registrar, for inspection.
    pub fn registrar(&self) -> &MenuRegistrar {
        &self.registrar
    }

    fn create(&self) -> Result<()> {
        let containers = self.context.containers();
        let parent = self.registrar.parent(containers).ok_or_else(|| {
            Error::lifecycle(format!(
                "menu '{}' has no registered parent menu",
                self.sid
            ))
        })?;

        self.layout.set_callbacks(self.registrar.callbacks());
        let layout = self.layout.clone();
        let sid = self.sid.clone();
        run_blocking(self.context.dispatcher().as_ref(), move || {
            layout.create_layout(parent, &sid)
        })??;

        self.registrar.manage_menu_items(
            &self.layout.menu_items(),
            containers,
            self.context.services(),
        )?;
        self.registrar
            .manage_menus(&self.layout.menus(), containers, self.context.services())
    }

    fn destroy(&self) -> Result<()> {
        self.registrar
            .unmanage(self.context.containers(), self.context.services())?;
        let layout = self.layout.clone();
        let sid = self.sid.clone();
        run_blocking(self.context.dispatcher().as_ref(), move || {
            layout.destroy_layout(&sid)
        })?
    }

    fn item_handle(&self, sid: &str) -> Result<MenuItemHandle> {
        self.registrar
            .menu_item_handle(sid, &self.layout.menu_items())
            .ok_or_else(|| {
                Error::lifecycle(format!(
                    "menu '{}' hosts no item for action '{sid}'",
                    self.sid
                ))
            })
    }

    /// The inversion flag of the action `sid`, if it resolves to one.
    fn action_inverted(&self, sid: &str) -> bool {
        match self.context.services().get(sid) {
            Some(service) => service
                .as_action()
                .map(|action| action.is_inverted())
                .unwrap_or(false),
            None => false,
        }
    }
}

impl Service for MenuService {
    fn start(&self) -> Result<()> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(Error::lifecycle(format!(
                "menu '{}' is already started",
                self.sid
            )));
        }
        tracing::debug!(target: "horizon_trellis::service", sid = %self.sid, "menu starting");
        if let Err(error) = self.create() {
            self.started.store(false, Ordering::SeqCst);
            return Err(error);
        }
        Ok(())
    }

    fn stop(&self) -> Result<()> {
        if !self.started.load(Ordering::SeqCst) {
            return Err(Error::lifecycle(format!(
                "menu '{}' is not started",
                self.sid
            )));
        }
        self.destroy()?;
        self.started.store(false, Ordering::SeqCst);
        tracing::debug!(target: "horizon_trellis::service", sid = %self.sid, "menu stopped");
        Ok(())
    }

    fn is_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    fn update(&self) -> Result<()> {
        Ok(())
    }

    fn as_action_host(&self) -> Option<&dyn ActionHost> {
        Some(self)
    }
}

impl ActionHost for MenuService {
    fn action_service_stopping(&self, sid: &str) -> Result<()> {
        let item = self.item_handle(sid)?;
        let layout = self.layout.clone();
        if self.layout.hide_action() {
            run_blocking(self.context.dispatcher().as_ref(), move || {
                layout.menu_item_set_visible(item, false)
            })?
        } else {
            run_blocking(self.context.dispatcher().as_ref(), move || {
                layout.menu_item_set_enabled(item, false)
            })?
        }
    }

    fn action_service_starting(&self, sid: &str) -> Result<()> {
        let item = self.item_handle(sid)?;
        let Some(service) = self.context.services().get(sid) else {
            return Err(Error::lifecycle(format!(
                "action '{sid}' is not registered"
            )));
        };
        let Some(action) = service.as_action() else {
            return Err(Error::lifecycle(format!(
                "service '{sid}' has no action state"
            )));
        };
        let enabled = action.is_executable();
        let visible = action.is_visible();
        let checked = action.is_active() ^ action.is_inverted();

        let layout = self.layout.clone();
        run_blocking(self.context.dispatcher().as_ref(), move || {
            layout.menu_item_set_enabled(item, enabled)?;
            layout.menu_item_set_visible(item, visible)?;
            layout.menu_item_set_checked(item, checked)
        })?
    }

    fn action_service_set_active(&self, sid: &str, active: bool) -> Result<()> {
        let item = self.item_handle(sid)?;
        // The widget displays the raw toolkit state, so the inversion folds
        // back in here.
        let checked = active ^ self.action_inverted(sid);
        let layout = self.layout.clone();
        run_blocking(self.context.dispatcher().as_ref(), move || {
            layout.menu_item_set_checked(item, checked)
        })?
    }

    fn action_service_set_executable(&self, sid: &str, executable: bool) -> Result<()> {
        let item = self.item_handle(sid)?;
        let layout = self.layout.clone();
        run_blocking(self.context.dispatcher().as_ref(), move || {
            layout.menu_item_set_enabled(item, executable)
        })?
    }

    fn action_service_set_visible(&self, sid: &str, visible: bool) -> Result<()> {
        let item = self.item_handle(sid)?;
        let layout = self.layout.clone();
        run_blocking(self.context.dispatcher().as_ref(), move || {
            layout.menu_item_set_visible(item, visible)
        })?
    }
}

impl std::fmt::Debug for MenuService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MenuService")
            .field("sid", &self.sid)
            .field("started", &self.is_started())
            .finish()
    }
}

static_assertions::assert_impl_all!(MenuService: Send, Sync);
