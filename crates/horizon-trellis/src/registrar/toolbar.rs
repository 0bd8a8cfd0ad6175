//! Registrar for toolbar services.

use std::sync::Arc;

use parking_lot::Mutex;

use horizon_trellis_core::{Error, Result, ServiceRegistry};

use crate::callback::ActionCallback;
use crate::config::ConfigNode;
use crate::registry::ContainerRegistry;
use crate::toolkit::{ContainerHandle, MenuHandle, MenuItemHandle, ToolBarHandle};

use super::{
    Binding, SlotBinding, binding_from_config, ensure_unique, reflect_action_state,
    slot_binding_from_config, start_bound_service, stop_bound_service,
};

#[derive(Default)]
struct ToolBarRegistrarState {
    actions: Vec<Binding>,
    menus: Vec<Binding>,
    editors: Vec<SlotBinding>,
    callbacks: Vec<Arc<ActionCallback>>,
    items_managed: bool,
    menus_managed: bool,
    containers_managed: bool,
}

/// Correlates a toolbar's `<registry>` bindings with its created widgets.
///
/// Three independent positional sequences: action bindings against tool
/// buttons, menu bindings against drop-down menus, editor bindings against
/// embedded container slots.
pub struct ToolBarRegistrar {
    sid: String,
    state: Mutex<ToolBarRegistrarState>,
}

impl ToolBarRegistrar {
    /// Create a registrar owned by the toolbar service `sid`.
    pub fn new(sid: impl Into<String>) -> Self {
        Self {
            sid: sid.into(),
            state: Mutex::new(ToolBarRegistrarState::default()),
        }
    }

    /// The owning toolbar service id.
    pub fn sid(&self) -> &str {
        &self.sid
    }

    /// Parse a `<registry>` element with `<menuItem>`, `<menu>`, and
    /// `<editor>` children.
    pub fn initialize(&self, registry: &ConfigNode, services: &Arc<ServiceRegistry>) -> Result<()> {
        registry.expect_name("registry")?;
        let mut actions = Vec::new();
        let mut menus = Vec::new();
        let mut editors = Vec::new();
        for child in registry.children() {
            match child.name() {
                "menuItem" => actions.push(binding_from_config(child)?),
                "menu" => menus.push(binding_from_config(child)?),
                "editor" => editors.push(slot_binding_from_config(child)?),
                other => {
                    return Err(Error::configuration(format!(
                        "unknown registry entry <{other}> in toolbar '{}'",
                        self.sid
                    )));
                }
            }
        }
        ensure_unique(&self.sid, "menuItem", actions.iter().map(|b| b.sid.as_str()))?;
        ensure_unique(&self.sid, "menu", menus.iter().map(|b| b.sid.as_str()))?;
        ensure_unique(&self.sid, "editor", editors.iter().filter_map(SlotBinding::sid))?;
        ensure_unique(&self.sid, "editor wid", editors.iter().filter_map(SlotBinding::wid))?;

        let callbacks = actions
            .iter()
            .map(|binding| {
                let callback = ActionCallback::new(services.clone());
                callback.set_sid(&binding.sid);
                Arc::new(callback)
            })
            .collect();

        let mut state = self.state.lock();
        state.actions = actions;
        state.menus = menus;
        state.editors = editors;
        state.callbacks = callbacks;
        Ok(())
    }

    /// The action callbacks in binding order.
    pub fn callbacks(&self) -> Vec<Arc<ActionCallback>> {
        self.state.lock().callbacks.clone()
    }

    /// The action bindings in declaration order.
    pub fn action_bindings(&self) -> Vec<Binding> {
        self.state.lock().actions.clone()
    }

    /// This toolbar's own widget, published by the hosting view.
    pub fn parent(&self, containers: &ContainerRegistry) -> Option<ToolBarHandle> {
        containers.sid_tool_bar(&self.sid)
    }

    /// The button created for the action `sid`, correlated by position.
    pub fn menu_item_handle(&self, sid: &str, items: &[MenuItemHandle]) -> Option<MenuItemHandle> {
        let state = self.state.lock();
        state
            .actions
            .iter()
            .position(|binding| binding.sid == sid)
            .and_then(|index| items.get(index).copied())
    }

    /// Register every action binding against `items` and apply its start
    /// semantics. All-or-nothing over the sequence length.
    pub fn manage_menu_items(
        &self,
        items: &[MenuItemHandle],
        containers: &ContainerRegistry,
        services: &ServiceRegistry,
    ) -> Result<()> {
        let actions = {
            let state = self.state.lock();
            if state.items_managed {
                return Err(Error::lifecycle(format!(
                    "toolbar '{}' items are already managed",
                    self.sid
                )));
            }
            if state.actions.len() > items.len() {
                return Err(Error::configuration(format!(
                    "toolbar '{}' binds {} actions but the layout created {} buttons",
                    self.sid,
                    state.actions.len(),
                    items.len()
                )));
            }
            state.actions.clone()
        };

        for binding in &actions {
            containers.register_action_parent(&binding.sid, &self.sid);
            if binding.auto_start {
                start_bound_service(services, &binding.sid, &self.sid)?;
            } else {
                reflect_action_state(containers, services, &binding.sid)?;
            }
        }
        self.state.lock().items_managed = true;
        tracing::debug!(
            target: "horizon_trellis::registrar",
            sid = %self.sid,
            actions = actions.len(),
            "managed toolbar items"
        );
        Ok(())
    }

    /// Register every menu binding against `menus` and start the
    /// auto-start ones.
    pub fn manage_menus(
        &self,
        menus: &[MenuHandle],
        containers: &ContainerRegistry,
        services: &ServiceRegistry,
    ) -> Result<()> {
        let bindings = {
            let state = self.state.lock();
            if state.menus_managed {
                return Err(Error::lifecycle(format!(
                    "toolbar '{}' menus are already managed",
                    self.sid
                )));
            }
            if state.menus.len() > menus.len() {
                return Err(Error::configuration(format!(
                    "toolbar '{}' binds {} menus but the layout created {}",
                    self.sid,
                    state.menus.len(),
                    menus.len()
                )));
            }
            state.menus.clone()
        };

        for (binding, handle) in bindings.iter().zip(menus) {
            containers.register_sid_menu(&binding.sid, *handle)?;
            if binding.auto_start {
                start_bound_service(services, &binding.sid, &self.sid)?;
            }
        }
        self.state.lock().menus_managed = true;
        Ok(())
    }

    /// Register every editor binding against the embedded container
    /// `slots` and start the auto-start ones.
    pub fn manage_containers(
        &self,
        slots: &[ContainerHandle],
        containers: &ContainerRegistry,
        services: &ServiceRegistry,
    ) -> Result<()> {
        let bindings = {
            let state = self.state.lock();
            if state.containers_managed {
                return Err(Error::lifecycle(format!(
                    "toolbar '{}' editors are already managed",
                    self.sid
                )));
            }
            if state.editors.len() > slots.len() {
                return Err(Error::configuration(format!(
                    "toolbar '{}' binds {} editors but the layout created {} slots",
                    self.sid,
                    state.editors.len(),
                    slots.len()
                )));
            }
            state.editors.clone()
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
        self.state.lock().containers_managed = true;
        Ok(())
    }

    /// Stop every auto-started binding and withdraw every registration.
    pub fn unmanage(
        &self,
        containers: &ContainerRegistry,
        services: &ServiceRegistry,
    ) -> Result<()> {
        let state_copy = {
            let state = self.state.lock();
            (
                state.actions.clone(),
                state.menus.clone(),
                state.editors.clone(),
                state.items_managed,
                state.menus_managed,
                state.containers_managed,
            )
        };
        let (actions, menus, editors, items_managed, menus_managed, containers_managed) =
            state_copy;
        if !items_managed && !menus_managed && !containers_managed {
            return Err(Error::lifecycle(format!(
                "toolbar '{}' is not managed",
                self.sid
            )));
        }

        if items_managed {
            for binding in &actions {
                if binding.auto_start {
                    stop_bound_service(services, &binding.sid, &self.sid)?;
                }
                containers.unregister_action_parent(&binding.sid, &self.sid)?;
            }
        }
        if menus_managed {
            for binding in &menus {
                if binding.auto_start {
                    stop_bound_service(services, &binding.sid, &self.sid)?;
                }
                containers.unregister_sid_menu(&binding.sid)?;
            }
        }
        if containers_managed {
            for binding in &editors {
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
        state.items_managed = false;
        state.menus_managed = false;
        state.containers_managed = false;
        tracing::debug!(target: "horizon_trellis::registrar", sid = %self.sid, "unmanaged toolbar");
        Ok(())
    }
}

impl std::fmt::Debug for ToolBarRegistrar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("ToolBarRegistrar")
            .field("sid", &self.sid)
            .field("actions", &state.actions.len())
            .field("menus", &state.menus.len())
            .field("editors", &state.editors.len())
            .field("managed", &state.items_managed)
            .finish()
    }
}

static_assertions::assert_impl_all!(ToolBarRegistrar: Send, Sync);
