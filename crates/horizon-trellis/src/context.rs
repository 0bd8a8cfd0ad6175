//! The shared runtime context.
//!
//! One [`UiContext`] holds the four collaborators every GUI service needs:
//! the service registry, the container registry, the widget toolkit, and
//! the UI dispatcher. Services receive it at construction instead of
//! reaching for process globals, so independent contexts can coexist in one
//! process and tests get a fresh world each.

use std::sync::Arc;

use horizon_trellis_core::ServiceRegistry;
use horizon_trellis_core::dispatch::UiDispatcher;

use crate::registry::ContainerRegistry;
use crate::toolkit::WidgetToolkit;

/// Everything a GUI service needs to reach the rest of the system.
pub struct UiContext {
    services: Arc<ServiceRegistry>,
    containers: Arc<ContainerRegistry>,
    toolkit: Arc<dyn WidgetToolkit>,
    dispatcher: Arc<dyn UiDispatcher>,
}

impl UiContext {
    /// Create a context with fresh registries over the given toolkit and
    /// dispatcher.
    pub fn new(toolkit: Arc<dyn WidgetToolkit>, dispatcher: Arc<dyn UiDispatcher>) -> Arc<Self> {
        let services = Arc::new(ServiceRegistry::new());
        let containers = Arc::new(ContainerRegistry::new(services.clone()));
        Arc::new(Self {
            services,
            containers,
            toolkit,
            dispatcher,
        })
    }

    /// The service registry.
    pub fn services(&self) -> &Arc<ServiceRegistry> {
        &self.services
    }

    /// The container registry.
    pub fn containers(&self) -> &Arc<ContainerRegistry> {
        &self.containers
    }

    /// The widget toolkit.
    pub fn toolkit(&self) -> &Arc<dyn WidgetToolkit> {
        &self.toolkit
    }

    /// The UI dispatcher.
    pub fn dispatcher(&self) -> &Arc<dyn UiDispatcher> {
        &self.dispatcher
    }
}

impl std::fmt::Debug for UiContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UiContext")
            .field("services", &self.services.len())
            .field("containers", &self.containers)
            .finish()
    }
}

static_assertions::assert_impl_all!(UiContext: Send, Sync);
