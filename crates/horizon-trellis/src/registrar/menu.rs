//! Registrar for menu services.

use std::sync::Arc;

use parking_lot::Mutex;

use horizon_trellis_core::{Error, Result, ServiceRegistry};

use crate::callback::ActionCallback;
use crate::config::ConfigNode;
use crate::registry::ContainerRegistry;
use crate::toolkit::{MenuHandle, MenuItemHandle};

use super::{
    Binding, binding_from_config, ensure_unique, reflect_action_state, start_bound_service,
    stop_bound_service,
};

#[derive(Default)]
struct MenuRegistrarState {
    actions: Vec<Binding>,
    menus: Vec<Binding>,
    callbacks: Vec<Arc<ActionCallback>>,
    items_managed: bool,
    menus_managed: bool,
}

/// Correlates a menu's `<registry>` bindings with its created widgets.
///
/// Action bindings pair positionally with the layout's actionable items,
/// menu bindings with its sub-menus. See the [module
/// docs](crate::registrar) for the correlation rule.
pub struct MenuRegistrar {
    sid: String,
    state: Mutex<MenuRegistrarState>,
}

impl MenuRegistrar {
    /// Create a registrar owned by the menu service `sid`.
    pub fn new(sid: impl Into<String>) -> Self {
        Self {
            sid: sid.into(),
            state: Mutex::new(MenuRegistrarState::default()),
        }
    }

    /// The owning menu service id.
    pub fn sid(&self) -> &str {
        &self.sid
    }

    /// Parse a `<registry>` element.
    ///
    /// Accepts `<menuItem sid=".." start=".."/>` and `<menu sid=".."
    /// start=".."/>` children. One callback is created per action binding,
    /// already bound to its sid, ready to hand to the layout manager.
    pub fn initialize(&self, registry: &ConfigNode, services: &Arc<ServiceRegistry>) -> Result<()> {
        registry.expect_name("registry")?;
        let mut actions = Vec::new();
        let mut menus = Vec::new();
        for child in registry.children() {
            match child.name() {
                "menuItem" => actions.push(binding_from_config(child)?),
                "menu" => menus.push(binding_from_config(child)?),
                other => {
                    return Err(Error::configuration(format!(
                        "unknown registry entry <{other}> in menu '{}'",
                        self.sid
                    )));
                }
            }
        }
        ensure_unique(&self.sid, "menuItem", actions.iter().map(|b| b.sid.as_str()))?;
        ensure_unique(&self.sid, "menu", menus.iter().map(|b| b.sid.as_str()))?;

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

    /// The sub-menu bindings in declaration order.
    pub fn menu_bindings(&self) -> Vec<Binding> {
        self.state.lock().menus.clone()
    }

    /// This menu's own widget, published by whoever hosts it.
    pub fn parent(&self, containers: &ContainerRegistry) -> Option<MenuHandle> {
        containers.sid_menu(&self.sid)
    }

    /// The item created for the action `sid`, correlated by position.
    pub fn menu_item_handle(&self, sid: &str, items: &[MenuItemHandle]) -> Option<MenuItemHandle> {
        let state = self.state.lock();
        state
            .actions
            .iter()
            .position(|binding| binding.sid == sid)
            .and_then(|index| items.get(index).copied())
    }

    /// Register every action binding against `items` and apply its start
    /// semantics.
    ///
    /// Nothing is registered if the binding sequence is longer than the
    /// item sequence; a menu that promises more actions than its layout
    /// created is misconfigured as a whole.
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
                    "menu '{}' items are already managed",
                    self.sid
                )));
            }
            if state.actions.len() > items.len() {
                return Err(Error::configuration(format!(
                    "menu '{}' binds {} actions but the layout created {} items",
                    self.sid,
                    state.actions.len(),
                    items.len()
                )));
            }
            state.actions.clone()
        };

        // The parent entry goes in before any start so the start
        // notification already fans out to this menu.
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
            "managed menu items"
        );
        Ok(())
    }

    /// Register every sub-menu binding against `menus` and start the
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
                    "menu '{}' sub-menus are already managed",
                    self.sid
                )));
            }
            if state.menus.len() > menus.len() {
                return Err(Error::configuration(format!(
                    "menu '{}' binds {} sub-menus but the layout created {}",
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
        tracing::debug!(
            target: "horizon_trellis::registrar",
            sid = %self.sid,
            menus = bindings.len(),
            "managed sub-menus"
        );
        Ok(())
    }

    /// Stop every auto-started binding and withdraw every registration.
    pub fn unmanage(
        &self,
        containers: &ContainerRegistry,
        services: &ServiceRegistry,
    ) -> Result<()> {
        let (actions, menus, items_managed, menus_managed) = {
            let state = self.state.lock();
            (
                state.actions.clone(),
                state.menus.clone(),
                state.items_managed,
                state.menus_managed,
            )
        };
        if !items_managed && !menus_managed {
            return Err(Error::lifecycle(format!(
                "menu '{}' is not managed",
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

        let mut state = self.state.lock();
        state.items_managed = false;
        state.menus_managed = false;
        tracing::debug!(target: "horizon_trellis::registrar", sid = %self.sid, "unmanaged menu");
        Ok(())
    }
}

impl std::fmt::Debug for MenuRegistrar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("MenuRegistrar")
            .field("sid", &self.sid)
            .field("actions", &state.actions.len())
            .field("menus", &state.menus.len())
            .field("managed", &state.items_managed)
            .finish()
    }
}

static_assertions::assert_impl_all!(MenuRegistrar: Send, Sync);

#[cfg(test)]
mod tests {
    use horizon_trellis_core::Service;
    use horizon_trellis_core::service::ActionHost;

    use crate::action::ActionService;
    use crate::toolkit::{HeadlessToolkit, WidgetToolkit};

    use super::*;

    struct NullHost;

    impl Service for NullHost {
        fn start(&self) -> Result<()> {
            Ok(())
        }

        fn stop(&self) -> Result<()> {
            Ok(())
        }

        fn is_started(&self) -> bool {
            true
        }

        fn update(&self) -> Result<()> {
            Ok(())
        }

        fn as_action_host(&self) -> Option<&dyn ActionHost> {
            Some(self)
        }
    }

    impl ActionHost for NullHost {
        fn action_service_stopping(&self, _sid: &str) -> Result<()> {
            Ok(())
        }

        fn action_service_starting(&self, _sid: &str) -> Result<()> {
            Ok(())
        }

        fn action_service_set_active(&self, _sid: &str, _active: bool) -> Result<()> {
            Ok(())
        }

        fn action_service_set_executable(&self, _sid: &str, _executable: bool) -> Result<()> {
            Ok(())
        }

        fn action_service_set_visible(&self, _sid: &str, _visible: bool) -> Result<()> {
            Ok(())
        }
    }

    struct World {
        services: Arc<ServiceRegistry>,
        containers: Arc<ContainerRegistry>,
        items: Vec<MenuItemHandle>,
        menus: Vec<MenuHandle>,
    }

    /// A menu widget with `item_count` items plus one sub-menu, and a
    /// host service registered under "fileMenu".
    fn world(item_count: usize) -> World {
        let services = Arc::new(ServiceRegistry::new());
        services.register("fileMenu", Arc::new(NullHost)).unwrap();
        let containers = Arc::new(ContainerRegistry::new(services.clone()));

        let toolkit = HeadlessToolkit::new();
        let root = toolkit.create_root_container().unwrap();
        let bar = toolkit.create_menu_bar(root).unwrap();
        let menu = toolkit.create_menu(bar, "File").unwrap();
        let items = (0..item_count)
            .map(|i| {
                toolkit
                    .add_menu_item(menu, &crate::layout::ActionProperties::named(format!("I{i}")))
                    .unwrap()
            })
            .collect();
        let menus = vec![toolkit.add_submenu(menu, "Recent").unwrap()];

        World {
            services,
            containers,
            items,
            menus,
        }
    }

    fn register_action(world: &World, sid: &str) -> Arc<ActionService> {
        let action = Arc::new(ActionService::new(sid, world.containers.clone()));
        world.services.register(sid, action.clone()).unwrap();
        action
    }

    fn initialized(xml: &str, world: &World) -> MenuRegistrar {
        let registrar = MenuRegistrar::new("fileMenu");
        let registry = ConfigNode::parse(xml).unwrap();
        registrar.initialize(&registry, &world.services).unwrap();
        registrar
    }

    #[test]
    fn test_initialize_builds_bound_callbacks() {
        let world = world(0);
        let registrar = initialized(
            r#"<registry>
                   <menuItem sid="openAct" start="true"/>
                   <menuItem sid="saveAct"/>
                   <menu sid="recentMenu"/>
               </registry>"#,
            &world,
        );

        let callbacks = registrar.callbacks();
        assert_eq!(callbacks.len(), 2);
        assert_eq!(callbacks[0].sid().as_deref(), Some("openAct"));
        assert_eq!(callbacks[1].sid().as_deref(), Some("saveAct"));

        let bindings = registrar.action_bindings();
        assert!(bindings[0].auto_start);
        assert!(!bindings[1].auto_start);
        assert_eq!(registrar.menu_bindings().len(), 1);
    }

    #[test]
    fn test_initialize_rejects_duplicate_sid() {
        let world = world(0);
        let registrar = MenuRegistrar::new("fileMenu");
        let registry = ConfigNode::parse(
            r#"<registry><menuItem sid="openAct"/><menuItem sid="openAct"/></registry>"#,
        )
        .unwrap();
        let err = registrar.initialize(&registry, &world.services).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_initialize_rejects_unknown_entry() {
        let world = world(0);
        let registrar = MenuRegistrar::new("fileMenu");
        let registry = ConfigNode::parse(r#"<registry><editor sid="x"/></registry>"#).unwrap();
        let err = registrar.initialize(&registry, &world.services).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_manage_registers_and_starts() {
        let world = world(2);
        let auto = register_action(&world, "openAct");
        let manual = register_action(&world, "saveAct");
        let registrar = initialized(
            r#"<registry>
                   <menuItem sid="openAct" start="true"/>
                   <menuItem sid="saveAct"/>
               </registry>"#,
            &world,
        );

        registrar
            .manage_menu_items(&world.items, &world.containers, &world.services)
            .unwrap();

        assert_eq!(world.containers.action_parents("openAct"), vec!["fileMenu"]);
        assert_eq!(world.containers.action_parents("saveAct"), vec!["fileMenu"]);
        assert!(auto.is_started());
        assert!(!manual.is_started());
    }

    #[test]
    fn test_manage_is_all_or_nothing() {
        let world = world(1);
        register_action(&world, "openAct");
        register_action(&world, "saveAct");
        let registrar = initialized(
            r#"<registry>
                   <menuItem sid="openAct" start="true"/>
                   <menuItem sid="saveAct" start="true"/>
               </registry>"#,
            &world,
        );

        // Two bindings, one item: rejected before any registration.
        let err = registrar
            .manage_menu_items(&world.items, &world.containers, &world.services)
            .unwrap_err();
        assert!(err.is_configuration());
        assert_eq!(world.containers.entry_count(), 0);
        assert!(!world.services.get("openAct").unwrap().is_started());
    }

    #[test]
    fn test_manage_auto_start_needs_stopped_service() {
        let world = world(1);
        let action = register_action(&world, "openAct");
        action.start().unwrap();
        let registrar = initialized(
            r#"<registry><menuItem sid="openAct" start="true"/></registry>"#,
            &world,
        );

        let err = registrar
            .manage_menu_items(&world.items, &world.containers, &world.services)
            .unwrap_err();
        assert!(err.is_lifecycle());
    }

    #[test]
    fn test_manage_auto_start_needs_registered_service() {
        let world = world(1);
        let registrar = initialized(
            r#"<registry><menuItem sid="ghostAct" start="true"/></registry>"#,
            &world,
        );

        let err = registrar
            .manage_menu_items(&world.items, &world.containers, &world.services)
            .unwrap_err();
        assert!(err.is_lifecycle());
    }

    #[test]
    fn test_manage_tolerates_missing_manual_service() {
        let world = world(1);
        let registrar = initialized(
            r#"<registry><menuItem sid="lateAct"/></registry>"#,
            &world,
        );

        registrar
            .manage_menu_items(&world.items, &world.containers, &world.services)
            .unwrap();
        assert_eq!(world.containers.action_parents("lateAct"), vec!["fileMenu"]);
    }

    #[test]
    fn test_menu_item_handle_is_positional() {
        let world = world(3);
        let registrar = initialized(
            r#"<registry>
                   <menuItem sid="a"/>
                   <menuItem sid="b"/>
                   <menuItem sid="c"/>
               </registry>"#,
            &world,
        );

        assert_eq!(registrar.menu_item_handle("a", &world.items), Some(world.items[0]));
        assert_eq!(registrar.menu_item_handle("b", &world.items), Some(world.items[1]));
        assert_eq!(registrar.menu_item_handle("c", &world.items), Some(world.items[2]));
        assert_eq!(registrar.menu_item_handle("d", &world.items), None);
    }

    #[test]
    fn test_manage_menus_registers_handles() {
        let world = world(0);
        let registrar = initialized(
            r#"<registry><menu sid="recentMenu"/></registry>"#,
            &world,
        );

        registrar
            .manage_menus(&world.menus, &world.containers, &world.services)
            .unwrap();
        assert_eq!(world.containers.sid_menu("recentMenu"), Some(world.menus[0]));
    }

    #[test]
    fn test_unmanage_stops_only_auto_started() {
        let world = world(2);
        let auto = register_action(&world, "openAct");
        let external = register_action(&world, "saveAct");
        external.start().unwrap();
        let registrar = initialized(
            r#"<registry>
                   <menuItem sid="openAct" start="true"/>
                   <menuItem sid="saveAct"/>
               </registry>"#,
            &world,
        );

        registrar
            .manage_menu_items(&world.items, &world.containers, &world.services)
            .unwrap();
        assert!(auto.is_started());

        registrar
            .unmanage(&world.containers, &world.services)
            .unwrap();

        // Auto-started stopped; externally started untouched.
        assert!(!auto.is_started());
        assert!(external.is_started());

        // Registrations are gone either way.
        assert_eq!(world.containers.action_parents("openAct"), Vec::<String>::new());
        assert_eq!(world.containers.action_parents("saveAct"), Vec::<String>::new());

        let err = registrar
            .unmanage(&world.containers, &world.services)
            .unwrap_err();
        assert!(err.is_lifecycle());
    }
}
