//! The action service.
//!
//! An [`ActionService`] is the service behind every actionable item. It
//! owns the logical flags (active, executable, visible, inverted) and
//! pushes every change through the [`ContainerRegistry`] fan-out so each
//! menu item or tool button bound to its sid follows along. The widgets
//! themselves belong to the hosting menu/toolbar services; an action never
//! touches a widget directly.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::RwLock;

use horizon_trellis_core::service::{ActionState, Service};
use horizon_trellis_core::{Error, Result};

use crate::config::ConfigNode;
use crate::registry::ContainerRegistry;

#[derive(Debug, Clone, Copy)]
struct ActionFlags {
    active: bool,
    executable: bool,
    visible: bool,
    inverted: bool,
}

impl Default for ActionFlags {
    fn default() -> Self {
        Self {
            active: false,
            executable: true,
            visible: true,
            inverted: false,
        }
    }
}

/// A named action: one logical command with visual state.
pub struct ActionService {
    sid: String,
    containers: Arc<ContainerRegistry>,
    flags: RwLock<ActionFlags>,
    started: AtomicBool,
    updates: AtomicUsize,
}

impl ActionService {
    /// Create a stopped action with default flags: inactive, executable,
    /// visible, not inverted.
    pub fn new(sid: impl Into<String>, containers: Arc<ContainerRegistry>) -> Self {
        Self {
            sid: sid.into(),
            containers,
            flags: RwLock::new(ActionFlags::default()),
            started: AtomicBool::new(false),
            updates: AtomicUsize::new(0),
        }
    }

    /// The service id this action is registered under.
    pub fn sid(&self) -> &str {
        &self.sid
    }

    /// Set the initial active state. Construction-time only; no fan-out.
    pub fn with_active(self, active: bool) -> Self {
        self.flags.write().active = active;
        self
    }

    /// Set the initial executable state. Construction-time only.
    pub fn with_executable(self, executable: bool) -> Self {
        self.flags.write().executable = executable;
        self
    }

    /// Set the initial visibility. Construction-time only.
    pub fn with_visible(self, visible: bool) -> Self {
        self.flags.write().visible = visible;
        self
    }

    /// Set the inversion flag. Construction-time only.
    pub fn with_inverted(self, inverted: bool) -> Self {
        self.flags.write().inverted = inverted;
        self
    }

    /// Apply a service configuration.
    ///
    /// The optional `<state>` child carries the initial flags:
    ///
    /// ```xml
    /// <service>
    ///     <state active="false" executable="yes" inverted="no" visible="true"/>
    /// </service>
    /// ```
    pub fn configure(&self, config: &ConfigNode) -> Result<()> {
        let Some(state) = config.child("state") else {
            return Ok(());
        };
        let mut flags = self.flags.write();
        flags.active = state.bool_attribute("active", flags.active)?;
        flags.executable = state.bool_attribute("executable", flags.executable)?;
        flags.visible = state.bool_attribute("visible", flags.visible)?;
        flags.inverted = state.bool_attribute("inverted", flags.inverted)?;
        Ok(())
    }

    /// Number of times the action has been triggered.
    pub fn update_count(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    /// Allow or forbid triggering, and gray the bound items accordingly.
    pub fn set_executable(&self, executable: bool) -> Result<()> {
        {
            let mut flags = self.flags.write();
            if flags.executable == executable {
                return Ok(());
            }
            flags.executable = executable;
        }
        tracing::debug!(target: "horizon_trellis::registry", sid = %self.sid, executable, "action executable changed");
        self.containers
            .action_service_set_executable(&self.sid, executable)
    }

    /// Show or hide the bound items.
    pub fn set_visible(&self, visible: bool) -> Result<()> {
        {
            let mut flags = self.flags.write();
            if flags.visible == visible {
                return Ok(());
            }
            flags.visible = visible;
        }
        tracing::debug!(target: "horizon_trellis::registry", sid = %self.sid, visible, "action visibility changed");
        self.containers.action_service_set_visible(&self.sid, visible)
    }
}

impl Service for ActionService {
    fn start(&self) -> Result<()> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(Error::lifecycle(format!(
                "action service '{}' is already started",
                self.sid
            )));
        }
        tracing::debug!(target: "horizon_trellis::action", sid = %self.sid, "action starting");
        self.containers.action_service_starting(&self.sid)
    }

    fn stop(&self) -> Result<()> {
        if !self.started.load(Ordering::SeqCst) {
            return Err(Error::lifecycle(format!(
                "action service '{}' is not started",
                self.sid
            )));
        }
        // Parents disable the bound items while the service still counts
        // as started, then the flag drops.
        self.containers.action_service_stopping(&self.sid)?;
        self.started.store(false, Ordering::SeqCst);
        tracing::debug!(target: "horizon_trellis::action", sid = %self.sid, "action stopped");
        Ok(())
    }

    fn is_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    fn update(&self) -> Result<()> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(target: "horizon_trellis::action", sid = %self.sid, "action triggered");
        Ok(())
    }

    fn as_action(&self) -> Option<&dyn ActionState> {
        Some(self)
    }
}

impl ActionState for ActionService {
    fn is_executable(&self) -> bool {
        self.flags.read().executable
    }

    fn is_active(&self) -> bool {
        self.flags.read().active
    }

    fn is_visible(&self) -> bool {
        self.flags.read().visible
    }

    fn is_inverted(&self) -> bool {
        self.flags.read().inverted
    }

    fn set_active(&self, active: bool) -> Result<()> {
        {
            let mut flags = self.flags.write();
            if flags.active == active {
                return Ok(());
            }
            flags.active = active;
        }
        tracing::debug!(target: "horizon_trellis::registry", sid = %self.sid, active, "action active changed");
        self.containers.action_service_set_active(&self.sid, active)
    }
}

impl std::fmt::Debug for ActionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let flags = *self.flags.read();
        f.debug_struct("ActionService")
            .field("sid", &self.sid)
            .field("started", &self.is_started())
            .field("active", &flags.active)
            .field("executable", &flags.executable)
            .field("visible", &flags.visible)
            .field("inverted", &flags.inverted)
            .finish()
    }
}

static_assertions::assert_impl_all!(ActionService: Send, Sync);

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;

    use horizon_trellis_core::ServiceRegistry;
    use horizon_trellis_core::service::ActionHost;

    use super::*;

    struct RecordingHost {
        calls: Mutex<Vec<String>>,
    }

    impl RecordingHost {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().clone()
        }
    }

    impl Service for RecordingHost {
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

    fn hosted_action() -> (Arc<RecordingHost>, ActionService) {
        let services = Arc::new(ServiceRegistry::new());
        let host = RecordingHost::new();
        services.register("fileMenu", host.clone()).unwrap();
        let containers = Arc::new(ContainerRegistry::new(services));
        containers.register_action_parent("open", "fileMenu");
        (host, ActionService::new("open", containers))
    }

    #[test]
    fn test_default_flags() {
        let containers = Arc::new(ContainerRegistry::new(Arc::new(ServiceRegistry::new())));
        let action = ActionService::new("open", containers);
        assert!(!action.is_active());
        assert!(action.is_executable());
        assert!(action.is_visible());
        assert!(!action.is_inverted());
        assert!(action.is_stopped());
    }

    #[test]
    fn test_configure_state_flags() {
        let containers = Arc::new(ContainerRegistry::new(Arc::new(ServiceRegistry::new())));
        let action = ActionService::new("open", containers);
        let config = ConfigNode::parse(
            r#"<service><state active="yes" executable="no" inverted="true" visible="false"/></service>"#,
        )
        .unwrap();
        action.configure(&config).unwrap();

        assert!(action.is_active());
        assert!(!action.is_executable());
        assert!(action.is_inverted());
        assert!(!action.is_visible());
    }

    #[test]
    fn test_configure_rejects_bad_flag() {
        let containers = Arc::new(ContainerRegistry::new(Arc::new(ServiceRegistry::new())));
        let action = ActionService::new("open", containers);
        let config =
            ConfigNode::parse(r#"<service><state active="maybe"/></service>"#).unwrap();
        assert!(action.configure(&config).unwrap_err().is_configuration());
    }

    #[test]
    fn test_start_stop_notifies_parents() {
        let (host, action) = hosted_action();

        action.start().unwrap();
        assert!(action.is_started());
        assert!(action.start().unwrap_err().is_lifecycle());

        action.stop().unwrap();
        assert!(!action.is_started());
        assert!(action.stop().unwrap_err().is_lifecycle());

        assert_eq!(host.calls(), vec!["starting:open", "stopping:open"]);
    }

    #[test]
    fn test_state_changes_fan_out_once() {
        let (host, action) = hosted_action();

        action.set_active(true).unwrap();
        action.set_active(true).unwrap();
        action.set_executable(false).unwrap();
        action.set_executable(false).unwrap();
        action.set_visible(false).unwrap();
        action.set_visible(false).unwrap();

        assert_eq!(
            host.calls(),
            vec!["active:open:true", "executable:open:false", "visible:open:false"]
        );
    }

    #[test]
    fn test_update_counts_triggers() {
        let containers = Arc::new(ContainerRegistry::new(Arc::new(ServiceRegistry::new())));
        let action = ActionService::new("open", containers);
        assert_eq!(action.update_count(), 0);
        action.update().unwrap();
        action.update().unwrap();
        assert_eq!(action.update_count(), 2);
    }
}
