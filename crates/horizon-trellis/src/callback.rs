//! Callbacks wired into actionable widgets.
//!
//! Every actionable layout item gets one [`ActionCallback`] when its widget
//! is created. The callback starts unbound; the registrar binds the action
//! sid matching the item's position at manage time, and may rebind it when
//! layouts are rebuilt. Toolkits invoke [`ActionCallback::execute`] for
//! plain triggers and [`ActionCallback::check`] for check/uncheck toggles.

use std::sync::Arc;

use parking_lot::Mutex;

use horizon_trellis_core::{Error, Result, ServiceRegistry};

/// Bridge from one widget's trigger to a named action service.
pub struct ActionCallback {
    services: Arc<ServiceRegistry>,
    sid: Mutex<Option<String>>,
}

impl ActionCallback {
    /// Create an unbound callback resolving services through `services`.
    pub fn new(services: Arc<ServiceRegistry>) -> Self {
        Self {
            services,
            sid: Mutex::new(None),
        }
    }

    /// Bind the callback to the action service `sid`, replacing any
    /// previous binding.
    pub fn set_sid(&self, sid: impl Into<String>) {
        *self.sid.lock() = Some(sid.into());
    }

    /// The currently bound action sid, if any.
    pub fn sid(&self) -> Option<String> {
        self.sid.lock().clone()
    }

    fn bound_service(&self) -> Result<(String, Arc<dyn horizon_trellis_core::Service>)> {
        let Some(sid) = self.sid() else {
            return Err(Error::lifecycle("callback has no action service bound"));
        };
        let Some(service) = self.services.get(&sid) else {
            return Err(Error::lifecycle(format!(
                "action service '{sid}' does not exist"
            )));
        };
        Ok((sid, service))
    }

    /// The user triggered the item: run the bound action service.
    pub fn execute(&self) -> Result<()> {
        let (sid, service) = self.bound_service()?;
        tracing::debug!(target: "horizon_trellis::callback", sid, "item triggered");
        service.update()
    }

    /// The user toggled the item to the raw toolkit state `checked`.
    ///
    /// The logical active state is the raw state XOR the action's inversion
    /// flag. It is only written when it differs from the current state, so
    /// the visual echo of the write cannot ping-pong back through here.
    pub fn check(&self, checked: bool) -> Result<()> {
        let (sid, service) = self.bound_service()?;
        let Some(action) = service.as_action() else {
            return Err(Error::lifecycle(format!(
                "service '{sid}' has no action state"
            )));
        };
        let effective = checked ^ action.is_inverted();
        if action.is_active() != effective {
            tracing::debug!(target: "horizon_trellis::callback", sid, effective, "item toggled");
            action.set_active(effective)?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for ActionCallback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionCallback")
            .field("sid", &*self.sid.lock())
            .finish()
    }
}

static_assertions::assert_impl_all!(ActionCallback: Send, Sync);
