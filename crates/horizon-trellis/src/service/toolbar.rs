//! The toolbar orchestrator service.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use horizon_trellis_core::service::{ActionHost, Service};
use horizon_trellis_core::{Error, Result, run_blocking};

use crate::config::ConfigNode;
use crate::context::UiContext;
use crate::layout::ToolBarLayoutManager;
use crate::registrar::ToolBarRegistrar;
use crate::toolkit::MenuItemHandle;

use super::{layout_section, registry_section};

/// Owns one toolbar: its layout manager and its registrar.
///
/// The toolbar finds its own widget through the container registry under
/// its sid, published by the view that created the bar. Lifecycle and
/// action hosting work exactly as in
/// [`MenuService`](super::MenuService); toolbars additionally manage
/// embedded editor container slots.
pub struct ToolBarService {
    sid: String,
    context: Arc<UiContext>,
    layout: Arc<ToolBarLayoutManager>,
    registrar: ToolBarRegistrar,
    started: AtomicBool,
}

impl ToolBarService {
    /// Create an unconfigured toolbar service.
    pub fn new(sid: impl Into<String>, context: Arc<UiContext>) -> Self {
        let sid = sid.into();
        Self {
            layout: Arc::new(ToolBarLayoutManager::new(context.toolkit().clone())),
            registrar: ToolBarRegistrar::new(sid.clone()),
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
    pub fn layout(&self) -> &Arc<ToolBarLayoutManager> {
        &self.layout
    }

    /// The registrar, for inspection.
    pub fn registrar(&self) -> &ToolBarRegistrar {
        &self.registrar
    }

    fn create(&self) -> Result<()> {
        let containers = self.context.containers();
        let parent = self.registrar.parent(containers).ok_or_else(|| {
            Error::lifecycle(format!(
                "toolbar '{}' has no registered toolbar widget",
                self.sid
            ))
        })?;

        self.layout.set_callbacks(self.registrar.callbacks());
        let layout = self.layout.clone();
        let sid = self.sid.clone();
        run_blocking(self.context.dispatcher().as_ref(), move || {
            layout.create_layout(parent, &sid)
        })??;

        let services = self.context.services();
        self.registrar
            .manage_menu_items(&self.layout.menu_items(), containers, services)?;
        self.registrar
            .manage_menus(&self.layout.menus(), containers, services)?;
        self.registrar
            .manage_containers(&self.layout.containers(), containers, services)
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
                    "toolbar '{}' hosts no button for action '{sid}'",
                    self.sid
                ))
            })
    }

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

impl Service for ToolBarService {
    fn start(&self) -> Result<()> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(Error::lifecycle(format!(
                "toolbar '{}' is already started",
                self.sid
            )));
        }
        tracing::debug!(target: "horizon_trellis::service", sid = %self.sid, "toolbar starting");
        if let Err(error) = self.create() {
            self.started.store(false, Ordering::SeqCst);
            return Err(error);
        }
        Ok(())
    }

    fn stop(&self) -> Result<()> {
        if !self.started.load(Ordering::SeqCst) {
            return Err(Error::lifecycle(format!(
                "toolbar '{}' is not started",
                self.sid
            )));
        }
        self.destroy()?;
        self.started.store(false, Ordering::SeqCst);
        tracing::debug!(target: "horizon_trellis::service", sid = %self.sid, "toolbar stopped");
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

impl ActionHost for ToolBarService {
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

impl std::fmt::Debug for ToolBarService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolBarService")
            .field("sid", &self.sid)
            .field("started", &self.is_started())
            .finish()
    }
}

static_assertions::assert_impl_all!(ToolBarService: Send, Sync);
