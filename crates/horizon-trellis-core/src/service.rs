//! Service model: lifecycle traits, action capabilities, and the service registry.
//!
//! Every running piece of a trellis application is a [`Service`] known to a
//! [`ServiceRegistry`] under a string identifier (its *sid*). Services are
//! started and stopped either by their owner or by a registrar that was
//! configured to auto-start them; the registry itself holds no lifecycle
//! logic, it is keyed storage plus lookup.
//!
//! Action-kind services additionally expose [`ActionState`], and services
//! that visually host actions (menus, toolbars) expose [`ActionHost`]. Both
//! are narrow capability accessors on [`Service`] so that callers never
//! downcast concrete service types.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicBool, Ordering};
//! use horizon_trellis_core::{Result, Service, ServiceRegistry};
//!
//! struct Echo {
//!     started: AtomicBool,
//! }
//!
//! impl Service for Echo {
//!     fn start(&self) -> Result<()> {
//!         self.started.store(true, Ordering::Release);
//!         Ok(())
//!     }
//!
//!     fn stop(&self) -> Result<()> {
//!         self.started.store(false, Ordering::Release);
//!         Ok(())
//!     }
//!
//!     fn is_started(&self) -> bool {
//!         self.started.load(Ordering::Acquire)
//!     }
//!
//!     fn update(&self) -> Result<()> {
//!         Ok(())
//!     }
//! }
//!
//! let registry = ServiceRegistry::new();
//! registry.register("echo", Arc::new(Echo { started: AtomicBool::new(false) }))?;
//!
//! let echo = registry.get("echo").unwrap();
//! echo.start()?;
//! assert!(echo.is_started());
//! # Ok::<(), horizon_trellis_core::Error>(())
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{Error, Result};

/// A named service with a start/stop lifecycle.
///
/// Implementations must be interior-mutable: lifecycle methods take `&self`
/// because services are shared as `Arc<dyn Service>` across threads.
pub trait Service: Send + Sync {
    /// Start the service.
    ///
    /// Starting a service that is already started is a lifecycle violation.
    fn start(&self) -> Result<()>;

    /// Stop the service.
    ///
    /// Stopping a service that is not started is a lifecycle violation.
    fn stop(&self) -> Result<()>;

    /// Whether the service is currently started.
    fn is_started(&self) -> bool;

    /// Whether the service is currently stopped.
    fn is_stopped(&self) -> bool {
        !self.is_started()
    }

    /// Run the service's update operation.
    ///
    /// For action-kind services this is the command invoked on click.
    fn update(&self) -> Result<()>;

    /// Narrow capability accessor for action-kind services.
    fn as_action(&self) -> Option<&dyn ActionState> {
        None
    }

    /// Narrow capability accessor for services hosting action visuals.
    fn as_action_host(&self) -> Option<&dyn ActionHost> {
        None
    }
}

impl std::fmt::Debug for dyn Service {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Service").finish_non_exhaustive()
    }
}

/// State exposed by action-kind services.
///
/// An *inverted* action displays the negation of its active state: the
/// toolkit checkbox shows `active XOR inverted`. Both the callback layer and
/// the hosts apply this rule when translating between visual and logical
/// state.
pub trait ActionState {
    /// Whether the action can currently be executed.
    fn is_executable(&self) -> bool;

    /// Whether the action is active (logically checked).
    fn is_active(&self) -> bool;

    /// Whether the action is visible.
    fn is_visible(&self) -> bool;

    /// Whether the visual checked state is the negation of the active state.
    fn is_inverted(&self) -> bool;

    /// Set the active state.
    fn set_active(&self, active: bool) -> Result<()>;
}

/// Receiver side of action state fan-out.
///
/// Implemented by host services (menus, toolbars) that own the visual
/// representation of actions. The container registry resolves each parent
/// sid associated with an action and forwards the notification here; the
/// host looks up the representing item and mutates it on the UI thread.
pub trait ActionHost {
    /// The action identified by `sid` is stopping; disable or hide its item.
    fn action_service_stopping(&self, sid: &str) -> Result<()>;

    /// The action identified by `sid` is starting; push its current state
    /// into the representing item.
    fn action_service_starting(&self, sid: &str) -> Result<()>;

    /// Reflect a new active state into the representing item.
    fn action_service_set_active(&self, sid: &str, active: bool) -> Result<()>;

    /// Reflect a new executable state into the representing item.
    fn action_service_set_executable(&self, sid: &str, executable: bool) -> Result<()>;

    /// Reflect a new visibility into the representing item.
    fn action_service_set_visible(&self, sid: &str, visible: bool) -> Result<()>;
}

/// Keyed storage for running services.
///
/// The registry is an explicitly constructed, explicitly passed instance;
/// there is no process-wide singleton. Tests build a fresh registry each and
/// share it through `Arc`.
///
/// Lookups return `Option`: a missing sid is an expected state for services
/// that are resolved lazily. Registering a duplicate sid or unregistering a
/// missing one is a lifecycle violation.
pub struct ServiceRegistry {
    services: RwLock<HashMap<String, Arc<dyn Service>>>,
}

impl ServiceRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            services: RwLock::new(HashMap::new()),
        }
    }

    /// Register a service under `sid`.
    pub fn register(&self, sid: impl Into<String>, service: Arc<dyn Service>) -> Result<()> {
        let sid = sid.into();
        let mut services = self.services.write();
        if services.contains_key(&sid) {
            return Err(Error::lifecycle(format!(
                "service '{sid}' is already registered"
            )));
        }
        tracing::trace!(target: "horizon_trellis_core::service", %sid, "registered service");
        services.insert(sid, service);
        Ok(())
    }

    /// Remove and return the service registered under `sid`.
    pub fn unregister(&self, sid: &str) -> Result<Arc<dyn Service>> {
        let removed = self.services.write().remove(sid);
        match removed {
            Some(service) => {
                tracing::trace!(target: "horizon_trellis_core::service", %sid, "unregistered service");
                Ok(service)
            }
            None => Err(Error::lifecycle(format!(
                "service '{sid}' is not registered"
            ))),
        }
    }

    /// Look up the service registered under `sid`.
    pub fn get(&self, sid: &str) -> Option<Arc<dyn Service>> {
        self.services.read().get(sid).cloned()
    }

    /// Whether a service is registered under `sid`.
    pub fn exists(&self, sid: &str) -> bool {
        self.services.read().contains_key(sid)
    }

    /// Number of registered services.
    pub fn len(&self) -> usize {
        self.services.read().len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.services.read().is_empty()
    }

    /// Remove all registered services.
    ///
    /// Primarily for teardown in tests.
    pub fn clear(&self) {
        self.services.write().clear();
    }

    /// Sids of all registered services, unordered.
    pub fn sids(&self) -> Vec<String> {
        self.services.read().keys().cloned().collect()
    }
}

impl Default for ServiceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ServiceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let services = self.services.read();
        let mut sids: Vec<&String> = services.keys().collect();
        sids.sort();
        f.debug_struct("ServiceRegistry")
            .field("sids", &sids)
            .finish()
    }
}

static_assertions::assert_impl_all!(ServiceRegistry: Send, Sync);
