//! Toolbar layout: buttons, separators, spacers, drop-downs, editor slots.

use std::sync::Arc;

use parking_lot::Mutex;

use horizon_trellis_core::{Error, Result};

use crate::callback::ActionCallback;
use crate::config::ConfigNode;
use crate::toolkit::{ContainerHandle, MenuHandle, MenuItemHandle, ToolBarHandle, WidgetToolkit};

use super::{LayoutItem, ToolButtonStyle};

#[derive(Default)]
struct ToolBarLayoutState {
    items: Vec<LayoutItem>,
    hide_action: bool,
    style: ToolButtonStyle,
    uniform_size: bool,
    callbacks: Vec<Arc<ActionCallback>>,
    menu_items: Vec<MenuItemHandle>,
    structurals: Vec<MenuItemHandle>,
    menus: Vec<MenuHandle>,
    containers: Vec<ContainerHandle>,
    built: bool,
}

/// Builds and tears down the widgets of one toolbar.
///
/// Same contract as [`MenuLayoutManager`](super::MenuLayoutManager):
/// actionable handles come back in declaration order with separators and
/// spacers skipped, and the create/destroy pair runs on the UI thread.
/// Toolbars additionally expose drop-down menus and embedded editor slots.
pub struct ToolBarLayoutManager {
    toolkit: Arc<dyn WidgetToolkit>,
    state: Mutex<ToolBarLayoutState>,
}

impl ToolBarLayoutManager {
    /// Create a manager with no layout configured.
    pub fn new(toolkit: Arc<dyn WidgetToolkit>) -> Self {
        Self {
            toolkit,
            state: Mutex::new(ToolBarLayoutState::default()),
        }
    }

    /// Parse a `<layout>` element.
    ///
    /// Toolbars accept `<menuItem>`, `<separator>`, `<spacer>`, `<menu>`,
    /// and `<editor>` children. The `style` attribute picks the text/icon
    /// arrangement, `uniformSize` forces equal button sizes, and
    /// `hideAction` selects hiding over disabling for stopped actions.
    pub fn initialize(&self, layout: &ConfigNode) -> Result<()> {
        layout.expect_name("layout")?;
        let mut items = Vec::new();
        for child in layout.children() {
            items.push(LayoutItem::from_config(child)?);
        }

        let mut state = self.state.lock();
        if state.built {
            return Err(Error::lifecycle(
                "cannot reconfigure a toolbar layout that is already created",
            ));
        }
        state.style = ToolButtonStyle::from_config(layout)?;
        state.uniform_size = layout.bool_attribute("uniformSize", false)?;
        state.hide_action = layout.bool_attribute("hideAction", false)?;
        state.items = items;
        Ok(())
    }

    /// Whether stopped actions hide their buttons instead of disabling them.
    pub fn hide_action(&self) -> bool {
        self.state.lock().hide_action
    }

    /// Number of actionable items in the configured layout.
    pub fn action_count(&self) -> usize {
        self.state
            .lock()
            .items
            .iter()
            .filter(|item| item.is_action())
            .count()
    }

    /// Install the callbacks to wire into tool buttons, one per actionable
    /// item in declaration order.
    pub fn set_callbacks(&self, callbacks: Vec<Arc<ActionCallback>>) {
        self.state.lock().callbacks = callbacks;
    }

    /// Create the configured widgets under `parent`.
    pub fn create_layout(&self, parent: ToolBarHandle, sid: &str) -> Result<()> {
        let mut state = self.state.lock();
        if state.built {
            return Err(Error::lifecycle(format!(
                "toolbar layout for '{sid}' is already created"
            )));
        }
        let actions = state.items.iter().filter(|item| item.is_action()).count();
        if actions != state.callbacks.len() {
            return Err(Error::configuration(format!(
                "toolbar '{sid}' declares {actions} actionable items \
                 but {} callbacks are installed",
                state.callbacks.len()
            )));
        }

        self.toolkit.set_tool_button_style(parent, state.style)?;
        self.toolkit
            .set_uniform_button_size(parent, state.uniform_size)?;

        let mut next_callback = state.callbacks.clone().into_iter();
        let items = state.items.clone();
        for item in &items {
            match item {
                LayoutItem::Action(properties) => {
                    let handle = self.toolkit.add_tool_button(parent, properties)?;
                    if let Some(callback) = next_callback.next() {
                        self.toolkit.bind_item_callback(handle, callback)?;
                    }
                    state.menu_items.push(handle);
                }
                LayoutItem::Separator => {
                    let handle = self.toolkit.add_tool_separator(parent)?;
                    state.structurals.push(handle);
                }
                LayoutItem::Spacer => {
                    let handle = self.toolkit.add_tool_spacer(parent)?;
                    state.structurals.push(handle);
                }
                LayoutItem::Menu { name } => {
                    let handle = self.toolkit.add_tool_menu(parent, name)?;
                    state.menus.push(handle);
                }
                LayoutItem::Editor => {
                    let handle = self.toolkit.add_tool_container(parent)?;
                    state.containers.push(handle);
                }
            }
        }
        state.built = true;
        tracing::debug!(
            target: "horizon_trellis::layout",
            sid,
            items = state.menu_items.len(),
            menus = state.menus.len(),
            containers = state.containers.len(),
            "created toolbar layout"
        );
        Ok(())
    }

    /// Destroy every widget created by [`create_layout`](Self::create_layout).
    pub fn destroy_layout(&self, sid: &str) -> Result<()> {
        let mut state = self.state.lock();
        if !state.built {
            return Err(Error::lifecycle(format!(
                "toolbar layout for '{sid}' is not created"
            )));
        }
        for handle in state.menu_items.drain(..).rev() {
            self.toolkit.destroy_widget(handle.id())?;
        }
        for handle in state.structurals.drain(..).rev() {
            self.toolkit.destroy_widget(handle.id())?;
        }
        for handle in state.menus.drain(..).rev() {
            self.toolkit.destroy_widget(handle.id())?;
        }
        for handle in state.containers.drain(..).rev() {
            self.toolkit.destroy_widget(handle.id())?;
        }
        state.built = false;
        tracing::debug!(target: "horizon_trellis::layout", sid, "destroyed toolbar layout");
        Ok(())
    }

    /// Tool button handles in declaration order.
    pub fn menu_items(&self) -> Vec<MenuItemHandle> {
        self.state.lock().menu_items.clone()
    }

    /// Drop-down menu handles in declaration order.
    pub fn menus(&self) -> Vec<MenuHandle> {
        self.state.lock().menus.clone()
    }

    /// Embedded editor slot handles in declaration order.
    pub fn containers(&self) -> Vec<ContainerHandle> {
        self.state.lock().containers.clone()
    }

    /// Show or hide one created button.
    pub fn menu_item_set_visible(&self, item: MenuItemHandle, visible: bool) -> Result<()> {
        self.toolkit.set_item_visible(item, visible)
    }

    /// Enable or disable one created button.
    pub fn menu_item_set_enabled(&self, item: MenuItemHandle, enabled: bool) -> Result<()> {
        self.toolkit.set_item_enabled(item, enabled)
    }

    /// Check or uncheck one created button.
    pub fn menu_item_set_checked(&self, item: MenuItemHandle, checked: bool) -> Result<()> {
        self.toolkit.set_item_checked(item, checked)
    }
}

impl std::fmt::Debug for ToolBarLayoutManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("ToolBarLayoutManager")
            .field("items", &state.items.len())
            .field("built", &state.built)
            .finish()
    }
}

static_assertions::assert_impl_all!(ToolBarLayoutManager: Send, Sync);
