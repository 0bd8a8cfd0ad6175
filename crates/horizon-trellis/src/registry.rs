//! The container registry: the rendezvous between services and widgets.
//!
//! Services that create widgets publish the handles here under the service
//! id (sid) or window id (wid) they were configured with; services that
//! need a parent widget look it up by their own id. The registry also
//! remembers which action sid lives under which menu/toolbar services, and
//! fans action state changes out to those hosts.
//!
//! All maps sit behind one mutex. Lookups that miss return `None`; writes
//! that conflict (double register, unregister of an absent entry) are
//! lifecycle errors, because they only happen when create/destroy pairing
//! is broken.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

use parking_lot::Mutex;

use horizon_trellis_core::service::ActionHost;
use horizon_trellis_core::{Error, Result, ServiceRegistry};

use crate::toolkit::{ContainerHandle, MenuBarHandle, MenuHandle, ToolBarHandle};

#[derive(Default)]
struct RegistryState {
    sid_containers: HashMap<String, ContainerHandle>,
    wid_containers: HashMap<String, ContainerHandle>,
    sid_menu_bars: HashMap<String, MenuBarHandle>,
    sid_tool_bars: HashMap<String, ToolBarHandle>,
    sid_menus: HashMap<String, MenuHandle>,
    action_parents: HashMap<String, Vec<String>>,
}

fn insert_handle<H>(map: &mut HashMap<String, H>, kind: &str, id: &str, handle: H) -> Result<()> {
    match map.entry(id.to_string()) {
        Entry::Occupied(_) => Err(Error::lifecycle(format!(
            "{kind} '{id}' is already registered"
        ))),
        Entry::Vacant(slot) => {
            slot.insert(handle);
            Ok(())
        }
    }
}

fn remove_handle<H>(map: &mut HashMap<String, H>, kind: &str, id: &str) -> Result<H> {
    map.remove(id)
        .ok_or_else(|| Error::lifecycle(format!("{kind} '{id}' is not registered")))
}

/// Shared widget-handle registry keyed by service and window ids.
pub struct ContainerRegistry {
    services: Arc<ServiceRegistry>,
    state: Mutex<RegistryState>,
}

impl ContainerRegistry {
    /// Create an empty registry that resolves action parents through
    /// `services`.
    pub fn new(services: Arc<ServiceRegistry>) -> Self {
        Self {
            services,
            state: Mutex::new(RegistryState::default()),
        }
    }

    /// The service registry used for parent resolution.
    pub fn services(&self) -> &Arc<ServiceRegistry> {
        &self.services
    }

    /// Publish the container created for the service `sid`.
    pub fn register_sid_container(&self, sid: &str, handle: ContainerHandle) -> Result<()> {
        insert_handle(&mut self.state.lock().sid_containers, "container sid", sid, handle)?;
        tracing::trace!(target: "horizon_trellis::registry", sid, "registered sid container");
        Ok(())
    }

    /// Withdraw the container published for `sid`.
    pub fn unregister_sid_container(&self, sid: &str) -> Result<ContainerHandle> {
        let handle = remove_handle(&mut self.state.lock().sid_containers, "container sid", sid)?;
        tracing::trace!(target: "horizon_trellis::registry", sid, "unregistered sid container");
        Ok(handle)
    }

    /// Container published for the service `sid`, if any.
    pub fn sid_container(&self, sid: &str) -> Option<ContainerHandle> {
        self.state.lock().sid_containers.get(sid).copied()
    }

    /// Publish a container under a window id.
    pub fn register_wid_container(&self, wid: &str, handle: ContainerHandle) -> Result<()> {
        insert_handle(&mut self.state.lock().wid_containers, "container wid", wid, handle)?;
        tracing::trace!(target: "horizon_trellis::registry", wid, "registered wid container");
        Ok(())
    }

    /// Withdraw the container published under `wid`.
    pub fn unregister_wid_container(&self, wid: &str) -> Result<ContainerHandle> {
        let handle = remove_handle(&mut self.state.lock().wid_containers, "container wid", wid)?;
        tracing::trace!(target: "horizon_trellis::registry", wid, "unregistered wid container");
        Ok(handle)
    }

    /// Container published under the window id `wid`, if any.
    pub fn wid_container(&self, wid: &str) -> Option<ContainerHandle> {
        self.state.lock().wid_containers.get(wid).copied()
    }

    /// Publish the menu bar created for the service `sid`.
    pub fn register_sid_menu_bar(&self, sid: &str, handle: MenuBarHandle) -> Result<()> {
        insert_handle(&mut self.state.lock().sid_menu_bars, "menu bar sid", sid, handle)?;
        tracing::trace!(target: "horizon_trellis::registry", sid, "registered menu bar");
        Ok(())
    }

    /// Withdraw the menu bar published for `sid`.
    pub fn unregister_sid_menu_bar(&self, sid: &str) -> Result<MenuBarHandle> {
        let handle = remove_handle(&mut self.state.lock().sid_menu_bars, "menu bar sid", sid)?;
        tracing::trace!(target: "horizon_trellis::registry", sid, "unregistered menu bar");
        Ok(handle)
    }

    /// Menu bar published for the service `sid`, if any.
    pub fn sid_menu_bar(&self, sid: &str) -> Option<MenuBarHandle> {
        self.state.lock().sid_menu_bars.get(sid).copied()
    }

    /// Publish the toolbar created for the service `sid`.
    pub fn register_sid_tool_bar(&self, sid: &str, handle: ToolBarHandle) -> Result<()> {
        insert_handle(&mut self.state.lock().sid_tool_bars, "tool bar sid", sid, handle)?;
        tracing::trace!(target: "horizon_trellis::registry", sid, "registered tool bar");
        Ok(())
    }

    /// Withdraw the toolbar published for `sid`.
    pub fn unregister_sid_tool_bar(&self, sid: &str) -> Result<ToolBarHandle> {
        let handle = remove_handle(&mut self.state.lock().sid_tool_bars, "tool bar sid", sid)?;
        tracing::trace!(target: "horizon_trellis::registry", sid, "unregistered tool bar");
        Ok(handle)
    }

    /// Toolbar published for the service `sid`, if any.
    pub fn sid_tool_bar(&self, sid: &str) -> Option<ToolBarHandle> {
        self.state.lock().sid_tool_bars.get(sid).copied()
    }

    /// Publish the menu created for the service `sid`.
    pub fn register_sid_menu(&self, sid: &str, handle: MenuHandle) -> Result<()> {
        insert_handle(&mut self.state.lock().sid_menus, "menu sid", sid, handle)?;
        tracing::trace!(target: "horizon_trellis::registry", sid, "registered menu");
        Ok(())
    }

    /// Withdraw the menu published for `sid`.
    pub fn unregister_sid_menu(&self, sid: &str) -> Result<MenuHandle> {
        let handle = remove_handle(&mut self.state.lock().sid_menus, "menu sid", sid)?;
        tracing::trace!(target: "horizon_trellis::registry", sid, "unregistered menu");
        Ok(handle)
    }

    /// Menu published for the service `sid`, if any.
    pub fn sid_menu(&self, sid: &str) -> Option<MenuHandle> {
        self.state.lock().sid_menus.get(sid).copied()
    }

    /// Record that the action `sid` has an item under the service
    /// `parent_sid`.
    ///
    /// An action may live under any number of parents; each registration
    /// adds one occurrence.
    pub fn register_action_parent(&self, sid: &str, parent_sid: &str) {
        let mut state = self.state.lock();
        state
            .action_parents
            .entry(sid.to_string())
            .or_default()
            .push(parent_sid.to_string());
        tracing::trace!(
            target: "horizon_trellis::registry",
            sid,
            parent_sid,
            "registered action parent"
        );
    }

    /// Remove one occurrence of `parent_sid` from the parents of `sid`.
    pub fn unregister_action_parent(&self, sid: &str, parent_sid: &str) -> Result<()> {
        let mut state = self.state.lock();
        let Some(parents) = state.action_parents.get_mut(sid) else {
            return Err(Error::lifecycle(format!(
                "action '{sid}' has no registered parents"
            )));
        };
        let Some(position) = parents.iter().position(|parent| parent == parent_sid) else {
            return Err(Error::lifecycle(format!(
                "action '{sid}' is not registered under '{parent_sid}'"
            )));
        };
        parents.remove(position);
        if parents.is_empty() {
            state.action_parents.remove(sid);
        }
        tracing::trace!(
            target: "horizon_trellis::registry",
            sid,
            parent_sid,
            "unregistered action parent"
        );
        Ok(())
    }

    /// Parents currently registered for the action `sid`, in registration
    /// order.
    pub fn action_parents(&self, sid: &str) -> Vec<String> {
        self.state
            .lock()
            .action_parents
            .get(sid)
            .cloned()
            .unwrap_or_default()
    }

    /// Total number of entries across all maps, counting each action
    /// parent occurrence.
    pub fn entry_count(&self) -> usize {
        let state = self.state.lock();
        state.sid_containers.len()
            + state.wid_containers.len()
            + state.sid_menu_bars.len()
            + state.sid_tool_bars.len()
            + state.sid_menus.len()
            + state
                .action_parents
                .values()
                .map(|parents| parents.len())
                .sum::<usize>()
    }

    /// Tell every parent of the action `sid` that its service is stopping.
    pub fn action_service_stopping(&self, sid: &str) -> Result<()> {
        self.each_parent_host(sid, |host| host.action_service_stopping(sid))
    }

    /// Tell every parent of the action `sid` that its service is starting.
    pub fn action_service_starting(&self, sid: &str) -> Result<()> {
        self.each_parent_host(sid, |host| host.action_service_starting(sid))
    }

    /// Propagate the active state of the action `sid` to every parent.
    pub fn action_service_set_active(&self, sid: &str, active: bool) -> Result<()> {
        self.each_parent_host(sid, |host| host.action_service_set_active(sid, active))
    }

    /// Propagate the executable state of the action `sid` to every parent.
    pub fn action_service_set_executable(&self, sid: &str, executable: bool) -> Result<()> {
        self.each_parent_host(sid, |host| {
            host.action_service_set_executable(sid, executable)
        })
    }

    /// Propagate the visibility of the action `sid` to every parent.
    pub fn action_service_set_visible(&self, sid: &str, visible: bool) -> Result<()> {
        self.each_parent_host(sid, |host| host.action_service_set_visible(sid, visible))
    }

    /// Resolve every parent of `sid` to a live [`ActionHost`] and apply
    /// `forward` to each, in registration order.
    ///
    /// No parents is a quiet no-op; the action simply has no items anywhere
    /// yet. A parent that is registered here but missing from the service
    /// registry, or that cannot host actions, is a lifecycle error and
    /// stops the fan-out at that parent.
    fn each_parent_host<F>(&self, sid: &str, forward: F) -> Result<()>
    where
        F: Fn(&dyn ActionHost) -> Result<()>,
    {
        // Snapshot the parent list so host calls run without the registry
        // lock; hosts block on the UI thread and may read the registry.
        let parents = self.action_parents(sid);
        if parents.is_empty() {
            tracing::trace!(target: "horizon_trellis::registry", sid, "action has no parents");
            return Ok(());
        }
        for parent_sid in &parents {
            let Some(service) = self.services.get(parent_sid) else {
                return Err(Error::lifecycle(format!(
                    "action '{sid}' is registered under '{parent_sid}' \
                     but that service does not exist"
                )));
            };
            let Some(host) = service.as_action_host() else {
                return Err(Error::lifecycle(format!(
                    "service '{parent_sid}' cannot host the action '{sid}'"
                )));
            };
            forward(host)?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for ContainerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("ContainerRegistry")
            .field("sid_containers", &state.sid_containers.len())
            .field("wid_containers", &state.wid_containers.len())
            .field("sid_menu_bars", &state.sid_menu_bars.len())
            .field("sid_tool_bars", &state.sid_tool_bars.len())
            .field("sid_menus", &state.sid_menus.len())
            .field("actions", &state.action_parents.len())
            .finish()
    }
}

static_assertions::assert_impl_all!(ContainerRegistry: Send, Sync);

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    use horizon_trellis_core::Service;

    use crate::toolkit::{HeadlessToolkit, WidgetToolkit};

    use super::*;

    struct RecordingHost {
        started: AtomicBool,
        calls: Mutex<Vec<String>>,
    }

    impl RecordingHost {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                started: AtomicBool::new(false),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().clone()
        }
    }

    impl Service for RecordingHost {
        fn start(&self) -> Result<()> {
            self.started.store(true, Ordering::SeqCst);
            Ok(())
        }

        fn stop(&self) -> Result<()> {
            self.started.store(false, Ordering::SeqCst);
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

    impl ActionHost for RecordingHost {
        fn action_service_stopping(&self, sid: &str) -> Result<()> {
            self.calls.lock().push(format!("stopping:{sid}"));
            Ok(())
        }

        fn action_service_starting(&self, sid: &str) -> Result<()> {
            self.calls.lock().push(format!("starting:{sid}"));
            Ok(())
        }

        fn action_service_set_active(&self, sid: &str, active: bool) -> Result<()> {
            self.calls.lock().push(format!("active:{sid}:{active}"));
            Ok(())
        }

        fn action_service_set_executable(&self, sid: &str, executable: bool) -> Result<()> {
            self.calls.lock().push(format!("executable:{sid}:{executable}"));
            Ok(())
        }

        fn action_service_set_visible(&self, sid: &str, visible: bool) -> Result<()> {
            self.calls.lock().push(format!("visible:{sid}:{visible}"));
            Ok(())
        }
    }

    struct PlainService;

    impl Service for PlainService {
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
    }

    fn registry() -> ContainerRegistry {
        ContainerRegistry::new(Arc::new(ServiceRegistry::new()))
    }

    #[test]
    fn test_handle_maps_roundtrip() {
        let toolkit = HeadlessToolkit::new();
        let root = toolkit.create_root_container().unwrap();
        let bar = toolkit.create_menu_bar(root).unwrap();
        let menu = toolkit.create_menu(bar, "File").unwrap();
        let tool_bar = toolkit.create_tool_bar(root).unwrap();

        let containers = registry();
        containers.register_sid_container("view", root).unwrap();
        containers.register_wid_container("mainWindow", root).unwrap();
        containers.register_sid_menu_bar("view", bar).unwrap();
        containers.register_sid_tool_bar("toolBar", tool_bar).unwrap();
        containers.register_sid_menu("fileMenu", menu).unwrap();
        assert_eq!(containers.entry_count(), 5);

        assert_eq!(containers.sid_container("view"), Some(root));
        assert_eq!(containers.wid_container("mainWindow"), Some(root));
        assert_eq!(containers.sid_menu_bar("view"), Some(bar));
        assert_eq!(containers.sid_tool_bar("toolBar"), Some(tool_bar));
        assert_eq!(containers.sid_menu("fileMenu"), Some(menu));

        assert_eq!(containers.unregister_sid_container("view").unwrap(), root);
        assert_eq!(containers.unregister_wid_container("mainWindow").unwrap(), root);
        assert_eq!(containers.unregister_sid_menu_bar("view").unwrap(), bar);
        assert_eq!(containers.unregister_sid_tool_bar("toolBar").unwrap(), tool_bar);
        assert_eq!(containers.unregister_sid_menu("fileMenu").unwrap(), menu);
        assert_eq!(containers.entry_count(), 0);
    }

    #[test]
    fn test_lookup_miss_is_none() {
        let containers = registry();
        assert_eq!(containers.sid_container("ghost"), None);
        assert_eq!(containers.wid_container("ghost"), None);
        assert_eq!(containers.sid_menu_bar("ghost"), None);
        assert_eq!(containers.sid_tool_bar("ghost"), None);
        assert_eq!(containers.sid_menu("ghost"), None);
    }

    #[test]
    fn test_double_register_is_lifecycle_error() {
        let toolkit = HeadlessToolkit::new();
        let first = toolkit.create_root_container().unwrap();
        let second = toolkit.create_root_container().unwrap();

        let containers = registry();
        containers.register_sid_container("view", first).unwrap();
        let err = containers.register_sid_container("view", second).unwrap_err();
        assert!(err.is_lifecycle());

        // The original entry survives the rejected write.
        assert_eq!(containers.sid_container("view"), Some(first));
    }

    #[test]
    fn test_unregister_missing_is_lifecycle_error() {
        let containers = registry();
        assert!(containers.unregister_sid_container("ghost").unwrap_err().is_lifecycle());
        assert!(containers.unregister_sid_menu("ghost").unwrap_err().is_lifecycle());
        assert!(
            containers
                .unregister_action_parent("ghost", "menu")
                .unwrap_err()
                .is_lifecycle()
        );
    }

    #[test]
    fn test_action_parent_occurrences() {
        let containers = registry();
        containers.register_action_parent("open", "fileMenu");
        containers.register_action_parent("open", "toolBar");
        assert_eq!(containers.action_parents("open"), vec!["fileMenu", "toolBar"]);

        containers.unregister_action_parent("open", "fileMenu").unwrap();
        assert_eq!(containers.action_parents("open"), vec!["toolBar"]);

        let err = containers.unregister_action_parent("open", "fileMenu").unwrap_err();
        assert!(err.is_lifecycle());

        containers.unregister_action_parent("open", "toolBar").unwrap();
        assert_eq!(containers.action_parents("open"), Vec::<String>::new());
        assert_eq!(containers.entry_count(), 0);
    }

    #[test]
    fn test_fanout_reaches_every_parent() {
        let services = Arc::new(ServiceRegistry::new());
        let menu_host = RecordingHost::new();
        let tool_host = RecordingHost::new();
        services.register("fileMenu", menu_host.clone()).unwrap();
        services.register("toolBar", tool_host.clone()).unwrap();

        let containers = ContainerRegistry::new(services);
        containers.register_action_parent("open", "fileMenu");
        containers.register_action_parent("open", "toolBar");

        containers.action_service_starting("open").unwrap();
        containers.action_service_set_active("open", true).unwrap();
        containers.action_service_set_executable("open", false).unwrap();
        containers.action_service_set_visible("open", false).unwrap();
        containers.action_service_stopping("open").unwrap();

        let expected = vec![
            "starting:open".to_string(),
            "active:open:true".to_string(),
            "executable:open:false".to_string(),
            "visible:open:false".to_string(),
            "stopping:open".to_string(),
        ];
        assert_eq!(menu_host.calls(), expected);
        assert_eq!(tool_host.calls(), expected);
    }

    #[test]
    fn test_fanout_without_parents_is_noop() {
        let containers = registry();
        containers.action_service_set_active("orphan", true).unwrap();
        containers.action_service_stopping("orphan").unwrap();
    }

    #[test]
    fn test_fanout_fails_fast_on_missing_parent_service() {
        let containers = registry();
        containers.register_action_parent("open", "fileMenu");

        let err = containers.action_service_set_active("open", true).unwrap_err();
        assert!(err.is_lifecycle());
    }

    #[test]
    fn test_fanout_rejects_parent_that_cannot_host() {
        let services = Arc::new(ServiceRegistry::new());
        services.register("fileMenu", Arc::new(PlainService)).unwrap();

        let containers = ContainerRegistry::new(services);
        containers.register_action_parent("open", "fileMenu");

        let err = containers.action_service_starting("open").unwrap_err();
        assert!(err.is_lifecycle());
    }
}
