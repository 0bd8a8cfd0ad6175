//! Registrar for view services.

use parking_lot::Mutex;

use horizon_trellis_core::{Error, Result, ServiceRegistry};

use crate::config::ConfigNode;
use crate::registry::ContainerRegistry;
use crate::toolkit::{ContainerHandle, MenuBarHandle, ToolBarHandle};

use super::{
    Binding, SlotBinding, binding_from_config, ensure_unique, slot_binding_from_config,
    start_bound_service, stop_bound_service,
};

#[derive(Default)]
struct ViewRegistrarState {
    views: Vec<SlotBinding>,
    menu_bar: Option<Binding>,
    tool_bar: Option<Binding>,
    parent_wid: Option<String>,
    views_managed: bool,
    menu_bar_managed: bool,
    tool_bar_managed: bool,
}

/// Correlates a view's `<registry>` bindings with its created widgets.
///
/// View bindings pair positionally with the layout's sub-container slots.
/// At most one `<menuBar>` and one `<toolBar>` binding publish the bar
/// handles the view creates; a `<parent wid=".."/>` override reparents the
/// view under an externally published container instead of the one
/// matching its own sid.
pub struct ViewRegistrar {
    sid: String,
    state: Mutex<ViewRegistrarState>,
}

impl ViewRegistrar {
    /// Create a registrar owned by the view service `sid`.
    pub fn new(sid: impl Into<String>) -> Self {
        Self {
            sid: sid.into(),
            state: Mutex::new(ViewRegistrarState::default()),
        }
    }

    /// The owning view service id.
    pub fn sid(&self) -> &str {
        &self.sid
    }

    /// Parse a `<registry>` element with `<view>`, `<menuBar>`,
    /// `<toolBar>`, and `<parent>` children.
    pub fn initialize(&self, registry: &ConfigNode) -> Result<()> {
        registry.expect_name("registry")?;
        let mut views = Vec::new();
        let mut menu_bar = None;
        let mut tool_bar = None;
        let mut parent_wid = None;
        for child in registry.children() {
            match child.name() {
                "view" => views.push(slot_binding_from_config(child)?),
                "menuBar" => {
                    if menu_bar.is_some() {
                        return Err(Error::configuration(format!(
                            "view '{}' declares more than one <menuBar>",
                            self.sid
                        )));
                    }
                    menu_bar = Some(binding_from_config(child)?);
                }
                "toolBar" => {
                    if tool_bar.is_some() {
                        return Err(Error::configuration(format!(
                            "view '{}' declares more than one <toolBar>",
                            self.sid
                        )));
                    }
                    tool_bar = Some(binding_from_config(child)?);
                }
                "parent" => {
                    if parent_wid.is_some() {
                        return Err(Error::configuration(format!(
                            "view '{}' declares more than one <parent>",
                            self.sid
                        )));
                    }
                    parent_wid = Some(child.required_attribute("wid")?.to_string());
                }
                other => {
                    return Err(Error::configuration(format!(
                        "unknown registry entry <{other}> in view '{}'",
                        self.sid
                    )));
                }
            }
        }
        ensure_unique(&self.sid, "view", views.iter().filter_map(SlotBinding::sid))?;
        ensure_unique(&self.sid, "view wid", views.iter().filter_map(SlotBinding::wid))?;

        let mut state = self.state.lock();
        state.views = views;
        state.menu_bar = menu_bar;
        state.tool_bar = tool_bar;
        state.parent_wid = parent_wid;
        Ok(())
    }

    /// The menu bar binding, if one is configured.
    pub fn menu_bar_binding(&self) -> Option<Binding> {
        self.state.lock().menu_bar.clone()
    }

    /// The toolbar binding, if one is configured.
    pub fn tool_bar_binding(&self) -> Option<Binding> {
        self.state.lock().tool_bar.clone()
    }

    /// The view bindings in declaration order.
    pub fn view_bindings(&self) -> Vec<SlotBinding> {
        self.state.lock().views.clone()
    }

    /// This view's own parent container.
    ///
    /// A `<parent wid=".."/>` override resolves through the WID map;
    /// otherwise the view looks up the container published for its own sid.
    pub fn parent(&self, containers: &ContainerRegistry) -> Option<ContainerHandle> {
        let wid = self.state.lock().parent_wid.clone();
        match wid {
            Some(wid) => containers.wid_container(&wid),
            None => containers.sid_container(&self.sid),
        }
    }

    /// Register every view binding against the created `slots` and start
    /// the auto-start ones. All-or-nothing over the sequence length.
    pub fn manage_views(
        &self,
        slots: &[ContainerHandle],
        containers: &ContainerRegistry,
        services: &ServiceRegistry,
    ) -> Result<()> {
        let bindings = {
            let state = self.state.lock();
            if state.views_managed {
                return Err(Error::lifecycle(format!(
                    "view '{}' slots are already managed",
                    self.sid
                )));
            }
            if state.views.len() > slots.len() {
                return Err(Error::configuration(format!(
                    "view '{}' binds {} views but the layout created {} slots",
                    self.sid,
                    state.views.len(),
                    slots.len()
                )));
            }
            state.views.clone()
        };

        for (binding, handle) in bindings.iter().zip(slots) {
            match binding {
                SlotBinding::Sid(binding) => {
                    containers.register_sid_container(&binding.sid, *handle)?;
                    if binding.auto_start {
                        start_bound_service(services, &binding.sid, &self.sid)?;
                    }
                }
                SlotBinding::Wid(wid) => {
                    containers.register_wid_container(wid, *handle)?;
                }
            }
        }
        self.state.lock().views_managed = true;
        tracing::debug!(
            target: "horizon_trellis::registrar",
            sid = %self.sid,
            views = bindings.len(),
            "managed view slots"
        );
        Ok(())
    }

    /// Publish the created menu bar under its binding's sid and start the
    /// bound service if requested.
    pub fn manage_menu_bar(
        &self,
        handle: MenuBarHandle,
        containers: &ContainerRegistry,
        services: &ServiceRegistry,
    ) -> Result<()> {
        let binding = {
            let state = self.state.lock();
            if state.menu_bar_managed {
                return Err(Error::lifecycle(format!(
                    "view '{}' menu bar is already managed",
                    self.sid
                )));
            }
            state.menu_bar.clone()
        };
        let Some(binding) = binding else {
            return Err(Error::lifecycle(format!(
                "view '{}' has no menuBar binding",
                self.sid
            )));
        };

        containers.register_sid_menu_bar(&binding.sid, handle)?;
        if binding.auto_start {
            start_bound_service(services, &binding.sid, &self.sid)?;
        }
        self.state.lock().menu_bar_managed = true;
        Ok(())
    }

    /// Publish the created toolbar under its binding's sid and start the
    /// bound service if requested.
    pub fn manage_tool_bar(
        &self,
        handle: ToolBarHandle,
        containers: &ContainerRegistry,
        services: &ServiceRegistry,
    ) -> Result<()> {
        let binding = {
            let state = self.state.lock();
            if state.tool_bar_managed {
                return Err(Error::lifecycle(format!(
                    "view '{}' toolbar is already managed",
                    self.sid
                )));
            }
            state.tool_bar.clone()
        };
        let Some(binding) = binding else {
            return Err(Error::lifecycle(format!(
                "view '{}' has no toolBar binding",
                self.sid
            )));
        };

        containers.register_sid_tool_bar(&binding.sid, handle)?;
        if binding.auto_start {
            start_bound_service(services, &binding.sid, &self.sid)?;
        }
        self.state.lock().tool_bar_managed = true;
        Ok(())
    }

    /// Stop every auto-started binding and withdraw every registration.
    ///
    /// Bars go first: their services reference the view's widgets while
    /// stopping.
    pub fn unmanage(
        &self,
        containers: &ContainerRegistry,
        services: &ServiceRegistry,
    ) -> Result<()> {
        let (views, menu_bar, tool_bar, views_managed, menu_bar_managed, tool_bar_managed) = {
            let state = self.state.lock();
            (
                state.views.clone(),
                state.menu_bar.clone(),
                state.tool_bar.clone(),
                state.views_managed,
                state.menu_bar_managed,
                state.tool_bar_managed,
            )
        };
        if !views_managed && !menu_bar_managed && !tool_bar_managed {
            return Err(Error::lifecycle(format!(
                "view '{}' is not managed",
                self.sid
            )));
        }

        if menu_bar_managed {
            if let Some(binding) = &menu_bar {
                if binding.auto_start {
                    stop_bound_service(services, &binding.sid, &self.sid)?;
                }
                containers.unregister_sid_menu_bar(&binding.sid)?;
            }
        }
        if tool_bar_managed {
            if let Some(binding) = &tool_bar {
                if binding.auto_start {
                    stop_bound_service(services, &binding.sid, &self.sid)?;
                }
                containers.unregister_sid_tool_bar(&binding.sid)?;
            }
        }
        if views_managed {
            for binding in &views {
                match binding {
                    SlotBinding::Sid(binding) => {
                        if binding.auto_start {
                            stop_bound_service(services, &binding.sid, &self.sid)?;
                        }
                        containers.unregister_sid_container(&binding.sid)?;
                    }
                    SlotBinding::Wid(wid) => {
                        containers.unregister_wid_container(wid)?;
                    }
                }
            }
        }

        let mut state = self.state.lock();
        state.views_managed = false;
        state.menu_bar_managed = false;
        state.tool_bar_managed = false;
        tracing::debug!(target: "horizon_trellis::registrar", sid = %self.sid, "unmanaged view");
        Ok(())
    }
}

impl std::fmt::Debug for ViewRegistrar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("ViewRegistrar")
            .field("sid", &self.sid)
            .field("views", &state.views.len())
            .field("menu_bar", &state.menu_bar.is_some())
            .field("tool_bar", &state.tool_bar.is_some())
            .field("managed", &state.views_managed)
            .finish()
    }
}

static_assertions::assert_impl_all!(ViewRegistrar: Send, Sync);
