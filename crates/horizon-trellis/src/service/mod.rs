//! Orchestrator services for menus, toolbars, and views.
//!
//! Each orchestrator owns one layout manager and one registrar and drives
//! them through a common state machine: initialized, then started (layout
//! built on the UI thread, bindings managed), then stopped (bindings
//! unmanaged, layout torn down), and startable again. `Service::start`
//! triggers creation, `Service::stop` destruction, and destruction runs in
//! reverse order of creation because bound services may still touch their
//! widgets while stopping.
//!
//! Menu and toolbar orchestrators additionally implement
//! [`ActionHost`](horizon_trellis_core::service::ActionHost): the container
//! registry fans action state changes out to them, and they translate each
//! change into widget mutations on the UI dispatcher.

use horizon_trellis_core::{Error, Result};

use crate::config::ConfigNode;

mod menu;
mod toolbar;
mod view;

pub use menu::MenuService;
pub use toolbar::ToolBarService;
pub use view::ViewService;

/// The `<gui><layout>` section of a service configuration.
fn layout_section<'a>(config: &'a ConfigNode, sid: &str) -> Result<&'a ConfigNode> {
    config
        .child("gui")
        .and_then(|gui| gui.child("layout"))
        .ok_or_else(|| {
            Error::configuration(format!(
                "service '{sid}' configuration is missing <gui><layout>"
            ))
        })
}

/// The `<registry>` section, or an empty one when absent.
fn registry_section(config: &ConfigNode) -> ConfigNode {
    config
        .child("registry")
        .cloned()
        .unwrap_or_else(|| ConfigNode::new("registry"))
}
