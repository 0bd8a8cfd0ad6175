//! Registrars: the bridge between configured sid bindings and created
//! widgets.
//!
//! A registrar parses the `<registry>` section of a service configuration
//! into ordered binding sequences, one per item kind. The positions in each
//! sequence correspond one to one with the handles the layout manager
//! produces for that kind, which is the whole correlation mechanism: the
//! i-th `<menuItem sid=../>` binding belongs to the i-th actionable item of
//! the `<layout>` section. `manage_*` registers the correlated handles in
//! the [`ContainerRegistry`](crate::registry::ContainerRegistry) and starts
//! auto-start services; `unmanage` undoes it.

use std::collections::HashSet;

use horizon_trellis_core::{Error, Result, ServiceRegistry};

use crate::config::ConfigNode;
use crate::registry::ContainerRegistry;

mod menu;
mod toolbar;
mod view;

pub use menu::MenuRegistrar;
pub use toolbar::ToolBarRegistrar;
pub use view::ViewRegistrar;

/// One sid binding from a `<registry>` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    /// The bound service id.
    pub sid: String,
    /// Whether manage starts the service and unmanage stops it.
    pub auto_start: bool,
}

/// A container-slot binding, claimed either by a service or by a window id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotBinding {
    /// Published under the sid; the service may be auto-started.
    Sid(Binding),
    /// Published under the wid for external lookup; never started.
    Wid(String),
}

impl SlotBinding {
    /// The bound sid, if this is a service binding.
    pub fn sid(&self) -> Option<&str> {
        match self {
            Self::Sid(binding) => Some(&binding.sid),
            Self::Wid(_) => None,
        }
    }

    /// The bound wid, if this is a window-id binding.
    pub fn wid(&self) -> Option<&str> {
        match self {
            Self::Sid(_) => None,
            Self::Wid(wid) => Some(wid),
        }
    }
}

fn binding_from_config(node: &ConfigNode) -> Result<Binding> {
    Ok(Binding {
        sid: node.required_attribute("sid")?.to_string(),
        auto_start: node.bool_attribute("start", false)?,
    })
}

fn slot_binding_from_config(node: &ConfigNode) -> Result<SlotBinding> {
    match (node.attribute("sid"), node.attribute("wid")) {
        (Some(_), Some(_)) => Err(Error::configuration(format!(
            "<{}> may not carry both 'sid' and 'wid'",
            node.name()
        ))),
        (Some(sid), None) => Ok(SlotBinding::Sid(Binding {
            sid: sid.to_string(),
            auto_start: node.bool_attribute("start", false)?,
        })),
        (None, Some(wid)) => Ok(SlotBinding::Wid(wid.to_string())),
        (None, None) => Err(Error::configuration(format!(
            "<{}> requires a 'sid' or 'wid' attribute",
            node.name()
        ))),
    }
}

/// Reject a sequence that binds the same id twice.
fn ensure_unique<'a>(owner: &str, kind: &str, ids: impl Iterator<Item = &'a str>) -> Result<()> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(Error::configuration(format!(
                "'{id}' is bound twice as a {kind} in the registry of '{owner}'"
            )));
        }
    }
    Ok(())
}

/// Start an auto-start binding's service. It must exist and be stopped.
fn start_bound_service(services: &ServiceRegistry, sid: &str, owner: &str) -> Result<()> {
    let Some(service) = services.get(sid) else {
        return Err(Error::lifecycle(format!(
            "'{owner}' cannot start '{sid}': service is not registered"
        )));
    };
    if service.is_started() {
        return Err(Error::lifecycle(format!(
            "'{owner}' cannot start '{sid}': service is already started"
        )));
    }
    tracing::debug!(target: "horizon_trellis::registrar", owner, sid, "starting bound service");
    service.start()
}

/// Stop an auto-start binding's service. It must exist.
fn stop_bound_service(services: &ServiceRegistry, sid: &str, owner: &str) -> Result<()> {
    let Some(service) = services.get(sid) else {
        return Err(Error::lifecycle(format!(
            "'{owner}' cannot stop '{sid}': service is not registered"
        )));
    };
    tracing::debug!(target: "horizon_trellis::registrar", owner, sid, "stopping bound service");
    service.stop()
}

/// Push the present state of a non-auto-start action into its visuals.
///
/// A bound action may already be running, started earlier under a different
/// parent, or may not be registered yet at all. Running actions push their
/// live flags out; missing or stopped ones render as stopped until their
/// own start notification arrives.
fn reflect_action_state(
    containers: &ContainerRegistry,
    services: &ServiceRegistry,
    sid: &str,
) -> Result<()> {
    match services.get(sid) {
        Some(service) if service.is_started() => containers.action_service_starting(sid),
        _ => containers.action_service_stopping(sid),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binding_parse() {
        let node = ConfigNode::parse(r#"<menuItem sid="openAct" start="yes"/>"#).unwrap();
        assert_eq!(
            binding_from_config(&node).unwrap(),
            Binding {
                sid: "openAct".to_string(),
                auto_start: true
            }
        );

        let node = ConfigNode::parse(r#"<menuItem sid="openAct"/>"#).unwrap();
        assert!(!binding_from_config(&node).unwrap().auto_start);

        let node = ConfigNode::parse(r#"<menuItem start="true"/>"#).unwrap();
        assert!(binding_from_config(&node).unwrap_err().is_configuration());
    }

    #[test]
    fn test_slot_binding_parse() {
        let node = ConfigNode::parse(r#"<view sid="editor" start="true"/>"#).unwrap();
        let slot = slot_binding_from_config(&node).unwrap();
        assert_eq!(slot.sid(), Some("editor"));
        assert_eq!(slot.wid(), None);

        let node = ConfigNode::parse(r#"<view wid="sceneView"/>"#).unwrap();
        let slot = slot_binding_from_config(&node).unwrap();
        assert_eq!(slot.wid(), Some("sceneView"));

        let node = ConfigNode::parse(r#"<view sid="a" wid="b"/>"#).unwrap();
        assert!(slot_binding_from_config(&node).unwrap_err().is_configuration());

        let node = ConfigNode::parse("<view/>").unwrap();
        assert!(slot_binding_from_config(&node).unwrap_err().is_configuration());
    }

    #[test]
    fn test_ensure_unique() {
        assert!(ensure_unique("menu", "menuItem", ["a", "b", "c"].into_iter()).is_ok());
        let err = ensure_unique("menu", "menuItem", ["a", "b", "a"].into_iter()).unwrap_err();
        assert!(err.is_configuration());
    }
}
