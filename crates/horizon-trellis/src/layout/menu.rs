//! Menu layout: descriptors in, menu widgets out.

use std::sync::Arc;

use parking_lot::Mutex;

use horizon_trellis_core::{Error, Result};

use crate::callback::ActionCallback;
use crate::config::ConfigNode;
use crate::toolkit::{MenuHandle, MenuItemHandle, WidgetToolkit};

use super::LayoutItem;

#[derive(Default)]
struct MenuLayoutState {
    items: Vec<LayoutItem>,
    hide_action: bool,
    callbacks: Vec<Arc<ActionCallback>>,
    menu_items: Vec<MenuItemHandle>,
    separators: Vec<MenuItemHandle>,
    menus: Vec<MenuHandle>,
    built: bool,
}

/// Builds and tears down the widgets of one menu.
///
/// The manager keeps the parsed item descriptors and, once
/// [`create_layout`](Self::create_layout) has run, the created handles in
/// declaration order. Actionable items are exposed through
/// [`menu_items`](Self::menu_items) and sub-menus through
/// [`menus`](Self::menus); separators are created but not exposed, so
/// positional correlation against service bindings skips them.
///
/// `create_layout` and `destroy_layout` must run on the UI thread; the
/// owning service marshals onto it.
pub struct MenuLayoutManager {
    toolkit: Arc<dyn WidgetToolkit>,
    state: Mutex<MenuLayoutState>,
}

impl MenuLayoutManager {
    /// Create a manager with no layout configured.
    pub fn new(toolkit: Arc<dyn WidgetToolkit>) -> Self {
        Self {
            toolkit,
            state: Mutex::new(MenuLayoutState::default()),
        }
    }

    /// Parse a `<layout>` element.
    ///
    /// Menus accept `<menuItem>`, `<separator>`, and `<menu>` children. The
    /// `hideAction` attribute selects whether items of stopped actions are
    /// hidden instead of disabled.
    pub fn initialize(&self, layout: &ConfigNode) -> Result<()> {
        layout.expect_name("layout")?;
        let mut items = Vec::new();
        for child in layout.children() {
            let item = LayoutItem::from_config(child)?;
            match item {
                LayoutItem::Spacer | LayoutItem::Editor => {
                    return Err(Error::configuration(format!(
                        "<{}> is not allowed in a menu layout",
                        child.name()
                    )));
                }
                _ => items.push(item),
            }
        }

        let mut state = self.state.lock();
        if state.built {
            return Err(Error::lifecycle(
                "cannot reconfigure a menu layout that is already created",
            ));
        }
        state.hide_action = layout.bool_attribute("hideAction", false)?;
        state.items = items;
        Ok(())
    }

    /// Whether stopped actions hide their items instead of disabling them.
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

    /// Install the callbacks to wire into actionable items, one per item in
    /// declaration order.
    pub fn set_callbacks(&self, callbacks: Vec<Arc<ActionCallback>>) {
        self.state.lock().callbacks = callbacks;
    }

    /// Create the configured widgets under `parent`.
    ///
    /// `sid` is the owning service id, used in diagnostics only.
    pub fn create_layout(&self, parent: MenuHandle, sid: &str) -> Result<()> {
        let mut state = self.state.lock();
        if state.built {
            return Err(Error::lifecycle(format!(
                "menu layout for '{sid}' is already created"
            )));
        }
        let actions = state.items.iter().filter(|item| item.is_action()).count();
        if actions != state.callbacks.len() {
            return Err(Error::configuration(format!(
                "menu '{sid}' declares {actions} actionable items \
                 but {} callbacks are installed",
                state.callbacks.len()
            )));
        }

        let mut next_callback = state.callbacks.clone().into_iter();
        let items = state.items.clone();
        for item in &items {
            match item {
                LayoutItem::Action(properties) => {
                    let handle = self.toolkit.add_menu_item(parent, properties)?;
                    if let Some(callback) = next_callback.next() {
                        self.toolkit.bind_item_callback(handle, callback)?;
                    }
                    state.menu_items.push(handle);
                }
                LayoutItem::Separator => {
                    let handle = self.toolkit.add_menu_separator(parent)?;
                    state.separators.push(handle);
                }
                LayoutItem::Menu { name } => {
                    let handle = self.toolkit.add_submenu(parent, name)?;
                    state.menus.push(handle);
                }
                LayoutItem::Spacer | LayoutItem::Editor => unreachable!("rejected at initialize"),
            }
        }
        state.built = true;
        tracing::debug!(
            target: "horizon_trellis::layout",
            sid,
            items = state.menu_items.len(),
            menus = state.menus.len(),
            "created menu layout"
        );
        Ok(())
    }

    /// Destroy every widget created by [`create_layout`](Self::create_layout).
    pub fn destroy_layout(&self, sid: &str) -> Result<()> {
        let mut state = self.state.lock();
        if !state.built {
            return Err(Error::lifecycle(format!(
                "menu layout for '{sid}' is not created"
            )));
        }
        for handle in state.menu_items.drain(..).rev() {
            self.toolkit.destroy_widget(handle.id())?;
        }
        for handle in state.separators.drain(..).rev() {
            self.toolkit.destroy_widget(handle.id())?;
        }
        for handle in state.menus.drain(..).rev() {
            self.toolkit.destroy_widget(handle.id())?;
        }
        state.built = false;
        tracing::debug!(target: "horizon_trellis::layout", sid, "destroyed menu layout");
        Ok(())
    }

    /// Actionable item handles in declaration order.
    pub fn menu_items(&self) -> Vec<MenuItemHandle> {
        self.state.lock().menu_items.clone()
    }

    /// Sub-menu handles in declaration order.
    pub fn menus(&self) -> Vec<MenuHandle> {
        self.state.lock().menus.clone()
    }

    /// Show or hide one created item.
    pub fn menu_item_set_visible(&self, item: MenuItemHandle, visible: bool) -> Result<()> {
        self.toolkit.set_item_visible(item, visible)
    }

    /// Enable or disable one created item.
    pub fn menu_item_set_enabled(&self, item: MenuItemHandle, enabled: bool) -> Result<()> {
        self.toolkit.set_item_enabled(item, enabled)
    }

    /// Check or uncheck one created item.
    pub fn menu_item_set_checked(&self, item: MenuItemHandle, checked: bool) -> Result<()> {
        self.toolkit.set_item_checked(item, checked)
    }
}

impl std::fmt::Debug for MenuLayoutManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("MenuLayoutManager")
            .field("items", &state.items.len())
            .field("built", &state.built)
            .finish()
    }
}

static_assertions::assert_impl_all!(MenuLayoutManager: Send, Sync);
