//! View layout: a row of sub-container slots.

use std::sync::Arc;

use parking_lot::Mutex;

use horizon_trellis_core::{Error, Result};

use crate::config::ConfigNode;
use crate::toolkit::{ContainerHandle, WidgetToolkit};

#[derive(Default)]
struct ViewLayoutState {
    slots: usize,
    containers: Vec<ContainerHandle>,
    built: bool,
}

/// Builds and tears down the sub-containers of one view.
///
/// Each `<view/>` child of the layout configuration becomes one empty
/// container slot that another service can claim through the container
/// registry. Slots come back from [`containers`](Self::containers) in
/// declaration order.
pub struct ViewLayoutManager {
    toolkit: Arc<dyn WidgetToolkit>,
    state: Mutex<ViewLayoutState>,
}

impl ViewLayoutManager {
    /// Create a manager with no layout configured.
    pub fn new(toolkit: Arc<dyn WidgetToolkit>) -> Self {
        Self {
            toolkit,
            state: Mutex::new(ViewLayoutState::default()),
        }
    }

    /// Parse a `<layout>` element containing `<view/>` slots.
    pub fn initialize(&self, layout: &ConfigNode) -> Result<()> {
        layout.expect_name("layout")?;
        let mut slots = 0;
        for child in layout.children() {
            if child.name() != "view" {
                return Err(Error::configuration(format!(
                    "unknown layout item <{}> in a view layout",
                    child.name()
                )));
            }
            slots += 1;
        }

        let mut state = self.state.lock();
        if state.built {
            return Err(Error::lifecycle(
                "cannot reconfigure a view layout that is already created",
            ));
        }
        state.slots = slots;
        Ok(())
    }

    /// Number of configured slots.
    pub fn slot_count(&self) -> usize {
        self.state.lock().slots
    }

    /// Create the configured sub-containers under `parent`.
    pub fn create_layout(&self, parent: ContainerHandle, sid: &str) -> Result<()> {
        let mut state = self.state.lock();
        if state.built {
            return Err(Error::lifecycle(format!(
                "view layout for '{sid}' is already created"
            )));
        }
        for _ in 0..state.slots {
            let handle = self.toolkit.create_container(parent)?;
            state.containers.push(handle);
        }
        state.built = true;
        tracing::debug!(
            target: "horizon_trellis::layout",
            sid,
            slots = state.containers.len(),
            "created view layout"
        );
        Ok(())
    }

    /// Destroy every slot created by [`create_layout`](Self::create_layout).
    pub fn destroy_layout(&self, sid: &str) -> Result<()> {
        let mut state = self.state.lock();
        if !state.built {
            return Err(Error::lifecycle(format!(
                "view layout for '{sid}' is not created"
            )));
        }
        for handle in state.containers.drain(..).rev() {
            self.toolkit.destroy_widget(handle.id())?;
        }
        state.built = false;
        tracing::debug!(target: "horizon_trellis::layout", sid, "destroyed view layout");
        Ok(())
    }

    /// Slot handles in declaration order.
    pub fn containers(&self) -> Vec<ContainerHandle> {
        self.state.lock().containers.clone()
    }
}

impl std::fmt::Debug for ViewLayoutManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("ViewLayoutManager")
            .field("slots", &state.slots)
            .field("built", &state.built)
            .finish()
    }
}

static_assertions::assert_impl_all!(ViewLayoutManager: Send, Sync);

#[cfg(test)]
mod tests {
    use crate::toolkit::{HeadlessToolkit, WidgetKind};

    use super::*;

    fn view_fixture() -> (Arc<HeadlessToolkit>, ContainerHandle, ViewLayoutManager) {
        let toolkit = Arc::new(HeadlessToolkit::new());
        let root = toolkit.create_root_container().unwrap();
        let manager = ViewLayoutManager::new(toolkit.clone());
        (toolkit, root, manager)
    }

    #[test]
    fn test_create_layout_builds_slots() {
        let (toolkit, root, manager) = view_fixture();
        let layout = ConfigNode::parse("<layout><view/><view/><view/></layout>").unwrap();
        manager.initialize(&layout).unwrap();
        assert_eq!(manager.slot_count(), 3);

        manager.create_layout(root, "view").unwrap();
        let slots = manager.containers();
        assert_eq!(slots.len(), 3);
        for slot in &slots {
            assert_eq!(toolkit.kind_of(slot.id()), Some(WidgetKind::Container));
        }
        assert_eq!(
            toolkit.children_of(root.id()),
            slots.iter().map(|slot| slot.id()).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_initialize_rejects_foreign_items() {
        let (_, _, manager) = view_fixture();
        let layout = ConfigNode::parse(r#"<layout><menuItem name="X"/></layout>"#).unwrap();
        assert!(manager.initialize(&layout).unwrap_err().is_configuration());
    }

    #[test]
    fn test_destroy_layout_removes_slots() {
        let (toolkit, root, manager) = view_fixture();
        let layout = ConfigNode::parse("<layout><view/><view/></layout>").unwrap();
        manager.initialize(&layout).unwrap();

        let before = toolkit.widget_count();
        manager.create_layout(root, "view").unwrap();
        let first = manager.containers()[0];

        manager.destroy_layout("view").unwrap();
        assert_eq!(toolkit.widget_count(), before);
        assert!(!toolkit.exists(first.id()));

        let err = manager.destroy_layout("view").unwrap_err();
        assert!(err.is_lifecycle());
    }

    #[test]
    fn test_create_twice_fails() {
        let (_, root, manager) = view_fixture();
        let layout = ConfigNode::parse("<layout><view/></layout>").unwrap();
        manager.initialize(&layout).unwrap();
        manager.create_layout(root, "view").unwrap();
        assert!(manager.create_layout(root, "view").unwrap_err().is_lifecycle());
    }
}
