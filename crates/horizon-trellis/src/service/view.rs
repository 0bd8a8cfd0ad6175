//! The view orchestrator service.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use horizon_trellis_core::{Error, Result, Service, run_blocking};

use crate::config::ConfigNode;
use crate::context::UiContext;
use crate::layout::ViewLayoutManager;
use crate::registrar::ViewRegistrar;
use crate::toolkit::{MenuBarHandle, ToolBarHandle};

use super::{layout_section, registry_section};

/// Owns one view: its sub-container slots and, optionally, the menu bar
/// and toolbar widgets it hosts.
///
/// Starting the view creates the layout, publishes every slot through the
/// container registry, and creates the bar widgets for any `<menuBar>` or
/// `<toolBar>` binding so the bound bar services can find them. Stopping
/// reverses the whole chain, bars before slots.
pub struct ViewService {
    sid: String,
    context: Arc<UiContext>,
    layout: Arc<ViewLayoutManager>,
    registrar: ViewRegistrar,
    menu_bar: Mutex<Option<MenuBarHandle>>,
    tool_bar: Mutex<Option<ToolBarHandle>>,
    started: AtomicBool,
}

impl ViewService {
    /// Create an unconfigured view service.
    pub fn new(sid: impl Into<String>, context: Arc<UiContext>) -> Self {
        let sid = sid.into();
        Self {
            layout: Arc::new(ViewLayoutManager::new(context.toolkit().clone())),
            registrar: ViewRegistrar::new(sid.clone()),
            sid,
            context,
            menu_bar: Mutex::new(None),
            tool_bar: Mutex::new(None),
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
        self.registrar.initialize(&registry_section(config))
    }

    /// The layout manager, for inspection.
    pub fn layout(&self) -> &Arc<ViewLayoutManager> {
        &self.layout
    }

    /// The registrar, for inspection.
    pub fn registrar(&self) -> &ViewRegistrar {
        &self.registrar
    }

    /// The menu bar widget created by this view, while started.
    pub fn menu_bar_handle(&self) -> Option<MenuBarHandle> {
        *self.menu_bar.lock()
    }

    /// The toolbar widget created by this view, while started.
    pub fn tool_bar_handle(&self) -> Option<ToolBarHandle> {
        *self.tool_bar.lock()
    }

    fn create(&self) -> Result<()> {
        let containers = self.context.containers();
        let services = self.context.services();
        let parent = self.registrar.parent(containers).ok_or_else(|| {
            Error::lifecycle(format!(
                "view '{}' has no registered parent container",
                self.sid
            ))
        })?;

        let layout = self.layout.clone();
        let sid = self.sid.clone();
        run_blocking(self.context.dispatcher().as_ref(), move || {
            layout.create_layout(parent, &sid)
        })??;
        self.registrar
            .manage_views(&self.layout.containers(), containers, services)?;

        if self.registrar.menu_bar_binding().is_some() {
            let toolkit = self.context.toolkit().clone();
            let handle = run_blocking(self.context.dispatcher().as_ref(), move || {
                toolkit.create_menu_bar(parent)
            })??;
            *self.menu_bar.lock() = Some(handle);
            self.registrar.manage_menu_bar(handle, containers, services)?;
        }
        if self.registrar.tool_bar_binding().is_some() {
            let toolkit = self.context.toolkit().clone();
            let handle = run_blocking(self.context.dispatcher().as_ref(), move || {
                toolkit.create_tool_bar(parent)
            })??;
            *self.tool_bar.lock() = Some(handle);
            self.registrar.manage_tool_bar(handle, containers, services)?;
        }
        Ok(())
    }

    fn destroy(&self) -> Result<()> {
        self.registrar
            .unmanage(self.context.containers(), self.context.services())?;

        let menu_bar = self.menu_bar.lock().take();
        let tool_bar = self.tool_bar.lock().take();
        let toolkit = self.context.toolkit().clone();
        let layout = self.layout.clone();
        let sid = self.sid.clone();
        run_blocking(self.context.dispatcher().as_ref(), move || {
            if let Some(handle) = menu_bar {
                toolkit.destroy_widget(handle.id())?;
            }
            if let Some(handle) = tool_bar {
                toolkit.destroy_widget(handle.id())?;
            }
            layout.destroy_layout(&sid)
        })?
    }
}

impl Service for ViewService {
    fn start(&self) -> Result<()> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(Error::lifecycle(format!(
                "view '{}' is already started",
                self.sid
            )));
        }
        tracing::debug!(target: "horizon_trellis::service", sid = %self.sid, "view starting");
        if let Err(error) = self.create() {
            self.started.store(false, Ordering::SeqCst);
            return Err(error);
        }
        Ok(())
    }

    fn stop(&self) -> Result<()> {
        if !self.started.load(Ordering::SeqCst) {
            return Err(Error::lifecycle(format!(
                "view '{}' is not started",
                self.sid
            )));
        }
        self.destroy()?;
        self.started.store(false, Ordering::SeqCst);
        tracing::debug!(target: "horizon_trellis::service", sid = %self.sid, "view stopped");
        Ok(())
    }

    fn is_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    fn update(&self) -> Result<()> {
        Ok(())
    }
}

impl std::fmt::Debug for ViewService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewService")
            .field("sid", &self.sid)
            .field("started", &self.is_started())
            .field("slots", &self.layout.slot_count())
            .finish()
    }
}

static_assertions::assert_impl_all!(ViewService: Send, Sync);
