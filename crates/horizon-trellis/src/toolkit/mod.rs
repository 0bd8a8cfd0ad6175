//! The widget toolkit abstraction.
//!
//! Everything above this module manipulates widgets exclusively through
//! opaque typed handles and the [`WidgetToolkit`] trait, so layout managers
//! and registrars never depend on a concrete windowing backend. The crate
//! ships [`HeadlessToolkit`] for tests and embedding without a display; a
//! real backend implements the same trait over native widgets.
//!
//! Toolkit methods are called from the UI thread only. Callers above this
//! layer marshal onto it with [`horizon_trellis_core::run_blocking`].

use std::sync::Arc;

use horizon_trellis_core::Result;

use crate::callback::ActionCallback;
use crate::layout::{ActionProperties, ToolButtonStyle};

mod headless;

pub use headless::{HeadlessToolkit, WidgetKind};

slotmap::new_key_type! {
    /// Stable key for a widget created through a [`WidgetToolkit`].
    ///
    /// Keys are never reused for a new widget, so a handle held across a
    /// destroy cannot silently alias a later widget.
    pub struct WidgetId;
}

/// Handle to a generic container widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContainerHandle(pub WidgetId);

/// Handle to a menu bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MenuBarHandle(pub WidgetId);

/// Handle to a toolbar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ToolBarHandle(pub WidgetId);

/// Handle to a menu, either top-level or nested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MenuHandle(pub WidgetId);

/// Handle to an actionable item: a menu entry or a tool button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MenuItemHandle(pub WidgetId);

impl ContainerHandle {
    /// The underlying widget key.
    pub fn id(self) -> WidgetId {
        self.0
    }
}

impl MenuBarHandle {
    /// The underlying widget key.
    pub fn id(self) -> WidgetId {
        self.0
    }
}

impl ToolBarHandle {
    /// The underlying widget key.
    pub fn id(self) -> WidgetId {
        self.0
    }
}

impl MenuHandle {
    /// The underlying widget key.
    pub fn id(self) -> WidgetId {
        self.0
    }
}

impl MenuItemHandle {
    /// The underlying widget key.
    pub fn id(self) -> WidgetId {
        self.0
    }
}

/// Backend seam for widget creation, mutation, and destruction.
///
/// Implementations must tolerate repeated state writes with the same value;
/// callers do not deduplicate `set_item_*` calls.
pub trait WidgetToolkit: Send + Sync {
    /// Create a top-level container, the backend's window analog.
    fn create_root_container(&self) -> Result<ContainerHandle>;

    /// Create a child container inside `parent`.
    fn create_container(&self, parent: ContainerHandle) -> Result<ContainerHandle>;

    /// Create a menu bar attached to `parent`.
    fn create_menu_bar(&self, parent: ContainerHandle) -> Result<MenuBarHandle>;

    /// Create a toolbar attached to `parent`.
    fn create_tool_bar(&self, parent: ContainerHandle) -> Result<ToolBarHandle>;

    /// Create a titled menu on a menu bar.
    fn create_menu(&self, bar: MenuBarHandle, title: &str) -> Result<MenuHandle>;

    /// Append an actionable item to a menu.
    fn add_menu_item(
        &self,
        menu: MenuHandle,
        properties: &ActionProperties,
    ) -> Result<MenuItemHandle>;

    /// Append a separator to a menu.
    fn add_menu_separator(&self, menu: MenuHandle) -> Result<MenuItemHandle>;

    /// Append a titled sub-menu to a menu.
    fn add_submenu(&self, menu: MenuHandle, title: &str) -> Result<MenuHandle>;

    /// Append a tool button to a toolbar.
    fn add_tool_button(
        &self,
        tool_bar: ToolBarHandle,
        properties: &ActionProperties,
    ) -> Result<MenuItemHandle>;

    /// Append a separator to a toolbar.
    fn add_tool_separator(&self, tool_bar: ToolBarHandle) -> Result<MenuItemHandle>;

    /// Append an expanding spacer to a toolbar.
    fn add_tool_spacer(&self, tool_bar: ToolBarHandle) -> Result<MenuItemHandle>;

    /// Append a titled drop-down menu to a toolbar.
    fn add_tool_menu(&self, tool_bar: ToolBarHandle, title: &str) -> Result<MenuHandle>;

    /// Append an empty container slot to a toolbar, for embedded editors.
    fn add_tool_container(&self, tool_bar: ToolBarHandle) -> Result<ContainerHandle>;

    /// Set the text/icon arrangement for every button on a toolbar.
    fn set_tool_button_style(&self, tool_bar: ToolBarHandle, style: ToolButtonStyle)
        -> Result<()>;

    /// Force every button on a toolbar to the same size.
    fn set_uniform_button_size(&self, tool_bar: ToolBarHandle, uniform: bool) -> Result<()>;

    /// Show or hide an item.
    fn set_item_visible(&self, item: MenuItemHandle, visible: bool) -> Result<()>;

    /// Enable or disable an item.
    fn set_item_enabled(&self, item: MenuItemHandle, enabled: bool) -> Result<()>;

    /// Check or uncheck an item. No callback fires from this write.
    fn set_item_checked(&self, item: MenuItemHandle, checked: bool) -> Result<()>;

    /// Wire the callback invoked when the user triggers an item.
    fn bind_item_callback(&self, item: MenuItemHandle, callback: Arc<ActionCallback>)
        -> Result<()>;

    /// Destroy a widget and everything still attached beneath it.
    fn destroy_widget(&self, id: WidgetId) -> Result<()>;
}
