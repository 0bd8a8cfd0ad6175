//! A widget backend with no display.
//!
//! [`HeadlessToolkit`] keeps every widget as a record in a slot map and
//! implements [`WidgetToolkit`] over that storage. It exists for tests and
//! for embedding the service layer in processes without a UI: the full
//! create/manage/interact/destroy cycle runs against it, and inspection
//! methods expose the widget tree so tests can assert on structure and
//! state. [`HeadlessToolkit::click`] and [`HeadlessToolkit::toggle`]
//! simulate user interaction by invoking the bound callback.

use std::sync::Arc;

use parking_lot::Mutex;
use slotmap::SlotMap;

use horizon_trellis_core::{Error, Result};

use crate::callback::ActionCallback;
use crate::layout::{ActionProperties, ToolButtonStyle};

use super::{
    ContainerHandle, MenuBarHandle, MenuHandle, MenuItemHandle, ToolBarHandle, WidgetId,
    WidgetToolkit,
};

/// What a headless widget record represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetKind {
    /// Generic container.
    Container,
    /// Menu bar.
    MenuBar,
    /// Toolbar.
    ToolBar,
    /// Menu, top-level or nested.
    Menu,
    /// Actionable item: menu entry or tool button.
    Item,
    /// Visual separator.
    Separator,
    /// Expanding spacer.
    Spacer,
}

struct WidgetRecord {
    kind: WidgetKind,
    parent: Option<WidgetId>,
    children: Vec<WidgetId>,
    visible: bool,
    enabled: bool,
    checked: bool,
    text: String,
    callback: Option<Arc<ActionCallback>>,
    button_style: ToolButtonStyle,
    uniform_size: bool,
}

impl WidgetRecord {
    fn new(kind: WidgetKind, parent: Option<WidgetId>, text: &str) -> Self {
        Self {
            kind,
            parent,
            children: Vec::new(),
            visible: true,
            enabled: true,
            checked: false,
            text: text.to_string(),
            callback: None,
            button_style: ToolButtonStyle::IconOnly,
            uniform_size: false,
        }
    }
}

/// In-memory [`WidgetToolkit`] backend.
pub struct HeadlessToolkit {
    widgets: Mutex<SlotMap<WidgetId, WidgetRecord>>,
}

impl HeadlessToolkit {
    /// Create an empty toolkit.
    pub fn new() -> Self {
        Self {
            widgets: Mutex::new(SlotMap::with_key()),
        }
    }

    fn attach(
        &self,
        kind: WidgetKind,
        parent: WidgetId,
        accepts: &[WidgetKind],
        text: &str,
    ) -> Result<WidgetId> {
        let mut widgets = self.widgets.lock();
        let Some(record) = widgets.get(parent) else {
            return Err(Error::lifecycle(format!(
                "cannot create {kind:?}: parent widget no longer exists"
            )));
        };
        if !accepts.contains(&record.kind) {
            return Err(Error::lifecycle(format!(
                "cannot attach {kind:?} under {:?}",
                record.kind
            )));
        }
        let id = widgets.insert(WidgetRecord::new(kind, Some(parent), text));
        widgets[parent].children.push(id);
        tracing::trace!(target: "horizon_trellis::toolkit", ?id, ?kind, "created widget");
        Ok(id)
    }

    fn write_item<F>(&self, item: MenuItemHandle, write: F) -> Result<()>
    where
        F: FnOnce(&mut WidgetRecord),
    {
        let mut widgets = self.widgets.lock();
        let Some(record) = widgets.get_mut(item.id()) else {
            return Err(Error::lifecycle("state write on a widget that no longer exists"));
        };
        if record.kind != WidgetKind::Item {
            return Err(Error::lifecycle(format!(
                "state write on a {:?}, expected an item",
                record.kind
            )));
        }
        write(record);
        Ok(())
    }

    fn write_tool_bar<F>(&self, tool_bar: ToolBarHandle, write: F) -> Result<()>
    where
        F: FnOnce(&mut WidgetRecord),
    {
        let mut widgets = self.widgets.lock();
        let Some(record) = widgets.get_mut(tool_bar.id()) else {
            return Err(Error::lifecycle("state write on a toolbar that no longer exists"));
        };
        if record.kind != WidgetKind::ToolBar {
            return Err(Error::lifecycle(format!(
                "state write on a {:?}, expected a toolbar",
                record.kind
            )));
        }
        write(record);
        Ok(())
    }

    fn item_callback(&self, item: MenuItemHandle) -> Result<Arc<ActionCallback>> {
        let widgets = self.widgets.lock();
        let Some(record) = widgets.get(item.id()) else {
            return Err(Error::lifecycle("interaction with a widget that no longer exists"));
        };
        if record.kind != WidgetKind::Item {
            return Err(Error::lifecycle(format!(
                "interaction with a {:?}, expected an item",
                record.kind
            )));
        }
        record
            .callback
            .clone()
            .ok_or_else(|| Error::lifecycle("item has no callback bound"))
    }

    /// Simulate the user triggering an item.
    ///
    /// Invokes the bound callback outside the toolkit lock, so the service
    /// reaction may freely call back into the toolkit. Must not be called
    /// from the UI dispatch thread; the reaction blocks on it.
    pub fn click(&self, item: MenuItemHandle) -> Result<()> {
        let callback = self.item_callback(item)?;
        callback.execute()
    }

    /// Simulate the user toggling a checkable item.
    ///
    /// Writes the raw checked state first, as native toolkits do, then
    /// invokes the bound callback with it.
    pub fn toggle(&self, item: MenuItemHandle, checked: bool) -> Result<()> {
        let callback = self.item_callback(item)?;
        self.write_item(item, |record| record.checked = checked)?;
        callback.check(checked)
    }

    /// Whether a widget still exists.
    pub fn exists(&self, id: WidgetId) -> bool {
        self.widgets.lock().contains_key(id)
    }

    /// Number of live widgets.
    pub fn widget_count(&self) -> usize {
        self.widgets.lock().len()
    }

    /// Kind of a widget, if it exists.
    pub fn kind_of(&self, id: WidgetId) -> Option<WidgetKind> {
        self.widgets.lock().get(id).map(|record| record.kind)
    }

    /// Visibility of a widget, if it exists.
    pub fn is_visible(&self, id: WidgetId) -> Option<bool> {
        self.widgets.lock().get(id).map(|record| record.visible)
    }

    /// Enabled state of a widget, if it exists.
    pub fn is_enabled(&self, id: WidgetId) -> Option<bool> {
        self.widgets.lock().get(id).map(|record| record.enabled)
    }

    /// Checked state of a widget, if it exists.
    pub fn is_checked(&self, id: WidgetId) -> Option<bool> {
        self.widgets.lock().get(id).map(|record| record.checked)
    }

    /// Display text of a widget, if it exists.
    pub fn text_of(&self, id: WidgetId) -> Option<String> {
        self.widgets.lock().get(id).map(|record| record.text.clone())
    }

    /// Children of a widget in attachment order. Empty if it does not exist.
    pub fn children_of(&self, id: WidgetId) -> Vec<WidgetId> {
        self.widgets
            .lock()
            .get(id)
            .map(|record| record.children.clone())
            .unwrap_or_default()
    }

    /// Whether an item has a callback bound.
    pub fn has_callback(&self, id: WidgetId) -> bool {
        self.widgets
            .lock()
            .get(id)
            .is_some_and(|record| record.callback.is_some())
    }

    /// Button style of a toolbar, if it exists.
    pub fn tool_button_style(&self, tool_bar: ToolBarHandle) -> Option<ToolButtonStyle> {
        self.widgets
            .lock()
            .get(tool_bar.id())
            .map(|record| record.button_style)
    }

    /// Uniform-size flag of a toolbar, if it exists.
    pub fn uniform_button_size(&self, tool_bar: ToolBarHandle) -> Option<bool> {
        self.widgets
            .lock()
            .get(tool_bar.id())
            .map(|record| record.uniform_size)
    }
}

impl Default for HeadlessToolkit {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for HeadlessToolkit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeadlessToolkit")
            .field("widgets", &self.widgets.lock().len())
            .finish()
    }
}

impl WidgetToolkit for HeadlessToolkit {
    fn create_root_container(&self) -> Result<ContainerHandle> {
        let mut widgets = self.widgets.lock();
        let id = widgets.insert(WidgetRecord::new(WidgetKind::Container, None, ""));
        tracing::trace!(target: "horizon_trellis::toolkit", ?id, "created root container");
        Ok(ContainerHandle(id))
    }

    fn create_container(&self, parent: ContainerHandle) -> Result<ContainerHandle> {
        self.attach(WidgetKind::Container, parent.id(), &[WidgetKind::Container], "")
            .map(ContainerHandle)
    }

    fn create_menu_bar(&self, parent: ContainerHandle) -> Result<MenuBarHandle> {
        self.attach(WidgetKind::MenuBar, parent.id(), &[WidgetKind::Container], "")
            .map(MenuBarHandle)
    }

    fn create_tool_bar(&self, parent: ContainerHandle) -> Result<ToolBarHandle> {
        self.attach(WidgetKind::ToolBar, parent.id(), &[WidgetKind::Container], "")
            .map(ToolBarHandle)
    }

    fn create_menu(&self, bar: MenuBarHandle, title: &str) -> Result<MenuHandle> {
        self.attach(WidgetKind::Menu, bar.id(), &[WidgetKind::MenuBar], title)
            .map(MenuHandle)
    }

    fn add_menu_item(
        &self,
        menu: MenuHandle,
        properties: &ActionProperties,
    ) -> Result<MenuItemHandle> {
        self.attach(WidgetKind::Item, menu.id(), &[WidgetKind::Menu], &properties.name)
            .map(MenuItemHandle)
    }

    fn add_menu_separator(&self, menu: MenuHandle) -> Result<MenuItemHandle> {
        self.attach(WidgetKind::Separator, menu.id(), &[WidgetKind::Menu], "")
            .map(MenuItemHandle)
    }

    fn add_submenu(&self, menu: MenuHandle, title: &str) -> Result<MenuHandle> {
        self.attach(WidgetKind::Menu, menu.id(), &[WidgetKind::Menu], title)
            .map(MenuHandle)
    }

    fn add_tool_button(
        &self,
        tool_bar: ToolBarHandle,
        properties: &ActionProperties,
    ) -> Result<MenuItemHandle> {
        self.attach(
            WidgetKind::Item,
            tool_bar.id(),
            &[WidgetKind::ToolBar],
            &properties.name,
        )
        .map(MenuItemHandle)
    }

    fn add_tool_separator(&self, tool_bar: ToolBarHandle) -> Result<MenuItemHandle> {
        self.attach(WidgetKind::Separator, tool_bar.id(), &[WidgetKind::ToolBar], "")
            .map(MenuItemHandle)
    }

    fn add_tool_spacer(&self, tool_bar: ToolBarHandle) -> Result<MenuItemHandle> {
        self.attach(WidgetKind::Spacer, tool_bar.id(), &[WidgetKind::ToolBar], "")
            .map(MenuItemHandle)
    }

    fn add_tool_menu(&self, tool_bar: ToolBarHandle, title: &str) -> Result<MenuHandle> {
        self.attach(WidgetKind::Menu, tool_bar.id(), &[WidgetKind::ToolBar], title)
            .map(MenuHandle)
    }

    fn add_tool_container(&self, tool_bar: ToolBarHandle) -> Result<ContainerHandle> {
        self.attach(WidgetKind::Container, tool_bar.id(), &[WidgetKind::ToolBar], "")
            .map(ContainerHandle)
    }

    fn set_tool_button_style(
        &self,
        tool_bar: ToolBarHandle,
        style: ToolButtonStyle,
    ) -> Result<()> {
        self.write_tool_bar(tool_bar, |record| record.button_style = style)
    }

    fn set_uniform_button_size(&self, tool_bar: ToolBarHandle, uniform: bool) -> Result<()> {
        self.write_tool_bar(tool_bar, |record| record.uniform_size = uniform)
    }

    fn set_item_visible(&self, item: MenuItemHandle, visible: bool) -> Result<()> {
        self.write_item(item, |record| record.visible = visible)
    }

    fn set_item_enabled(&self, item: MenuItemHandle, enabled: bool) -> Result<()> {
        self.write_item(item, |record| record.enabled = enabled)
    }

    fn set_item_checked(&self, item: MenuItemHandle, checked: bool) -> Result<()> {
        self.write_item(item, |record| record.checked = checked)
    }

    fn bind_item_callback(
        &self,
        item: MenuItemHandle,
        callback: Arc<ActionCallback>,
    ) -> Result<()> {
        self.write_item(item, |record| record.callback = Some(callback))
    }

    fn destroy_widget(&self, id: WidgetId) -> Result<()> {
        let mut widgets = self.widgets.lock();
        if !widgets.contains_key(id) {
            return Err(Error::lifecycle("destroyed a widget that no longer exists"));
        }

        // Depth-first sweep of the subtree. Callers destroy children before
        // parents, so this usually removes a single record.
        let mut pending = vec![id];
        let mut doomed = Vec::new();
        while let Some(next) = pending.pop() {
            if let Some(record) = widgets.get(next) {
                pending.extend(record.children.iter().copied());
                doomed.push(next);
            }
        }
        let parent = widgets[id].parent;
        for dead in &doomed {
            widgets.remove(*dead);
        }
        if let Some(parent) = parent {
            if let Some(record) = widgets.get_mut(parent) {
                record.children.retain(|child| *child != id);
            }
        }
        tracing::trace!(
            target: "horizon_trellis::toolkit",
            ?id,
            removed = doomed.len(),
            "destroyed widget"
        );
        Ok(())
    }
}

static_assertions::assert_impl_all!(HeadlessToolkit: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;

    fn toolkit_with_menu() -> (HeadlessToolkit, MenuHandle) {
        let toolkit = HeadlessToolkit::new();
        let root = toolkit.create_root_container().unwrap();
        let bar = toolkit.create_menu_bar(root).unwrap();
        let menu = toolkit.create_menu(bar, "File").unwrap();
        (toolkit, menu)
    }

    #[test]
    fn test_tree_construction_preserves_order() {
        let (toolkit, menu) = toolkit_with_menu();
        let open = toolkit
            .add_menu_item(menu, &ActionProperties::named("Open"))
            .unwrap();
        let sep = toolkit.add_menu_separator(menu).unwrap();
        let quit = toolkit
            .add_menu_item(menu, &ActionProperties::named("Quit"))
            .unwrap();

        assert_eq!(
            toolkit.children_of(menu.id()),
            vec![open.id(), sep.id(), quit.id()]
        );
        assert_eq!(toolkit.kind_of(sep.id()), Some(WidgetKind::Separator));
        assert_eq!(toolkit.text_of(open.id()).as_deref(), Some("Open"));
    }

    #[test]
    fn test_kind_mismatch_rejected() {
        let toolkit = HeadlessToolkit::new();
        let root = toolkit.create_root_container().unwrap();

        // A forged menu handle over a container id must not attach items.
        let err = toolkit
            .add_menu_item(MenuHandle(root.id()), &ActionProperties::named("Open"))
            .unwrap_err();
        assert!(err.is_lifecycle());
    }

    #[test]
    fn test_missing_parent_rejected() {
        let (toolkit, menu) = toolkit_with_menu();
        toolkit.destroy_widget(menu.id()).unwrap();

        let err = toolkit
            .add_menu_item(menu, &ActionProperties::named("Open"))
            .unwrap_err();
        assert!(err.is_lifecycle());
    }

    #[test]
    fn test_destroy_removes_subtree() {
        let (toolkit, menu) = toolkit_with_menu();
        let item = toolkit
            .add_menu_item(menu, &ActionProperties::named("Open"))
            .unwrap();
        let sub = toolkit.add_submenu(menu, "Recent").unwrap();
        let nested = toolkit
            .add_menu_item(sub, &ActionProperties::named("First"))
            .unwrap();
        assert_eq!(toolkit.widget_count(), 6);

        toolkit.destroy_widget(menu.id()).unwrap();

        assert!(!toolkit.exists(menu.id()));
        assert!(!toolkit.exists(item.id()));
        assert!(!toolkit.exists(sub.id()));
        assert!(!toolkit.exists(nested.id()));
        assert_eq!(toolkit.widget_count(), 2);

        let err = toolkit.destroy_widget(menu.id()).unwrap_err();
        assert!(err.is_lifecycle());
    }

    #[test]
    fn test_handles_not_reused_after_destroy() {
        let (toolkit, menu) = toolkit_with_menu();
        let first = toolkit
            .add_menu_item(menu, &ActionProperties::named("Open"))
            .unwrap();
        toolkit.destroy_widget(first.id()).unwrap();

        let second = toolkit
            .add_menu_item(menu, &ActionProperties::named("Save"))
            .unwrap();
        assert_ne!(first, second);
        assert!(!toolkit.exists(first.id()));
        assert!(toolkit.exists(second.id()));
        assert_eq!(toolkit.children_of(menu.id()), vec![second.id()]);
    }

    #[test]
    fn test_item_state_writes() {
        let (toolkit, menu) = toolkit_with_menu();
        let item = toolkit
            .add_menu_item(menu, &ActionProperties::named("Open"))
            .unwrap();

        assert_eq!(toolkit.is_visible(item.id()), Some(true));
        assert_eq!(toolkit.is_enabled(item.id()), Some(true));
        assert_eq!(toolkit.is_checked(item.id()), Some(false));

        toolkit.set_item_visible(item, false).unwrap();
        toolkit.set_item_enabled(item, false).unwrap();
        toolkit.set_item_checked(item, true).unwrap();
        assert_eq!(toolkit.is_visible(item.id()), Some(false));
        assert_eq!(toolkit.is_enabled(item.id()), Some(false));
        assert_eq!(toolkit.is_checked(item.id()), Some(true));

        // Same-value writes are fine.
        toolkit.set_item_checked(item, true).unwrap();
        assert_eq!(toolkit.is_checked(item.id()), Some(true));
    }

    #[test]
    fn test_toolbar_composition() {
        let toolkit = HeadlessToolkit::new();
        let root = toolkit.create_root_container().unwrap();
        let bar = toolkit.create_tool_bar(root).unwrap();

        let button = toolkit
            .add_tool_button(bar, &ActionProperties::named("Snapshot"))
            .unwrap();
        let sep = toolkit.add_tool_separator(bar).unwrap();
        let spacer = toolkit.add_tool_spacer(bar).unwrap();
        let menu = toolkit.add_tool_menu(bar, "Presets").unwrap();
        let slot = toolkit.add_tool_container(bar).unwrap();

        assert_eq!(
            toolkit.children_of(bar.id()),
            vec![button.id(), sep.id(), spacer.id(), menu.id(), slot.id()]
        );
        assert_eq!(toolkit.kind_of(spacer.id()), Some(WidgetKind::Spacer));
        assert_eq!(toolkit.kind_of(slot.id()), Some(WidgetKind::Container));

        toolkit
            .set_tool_button_style(bar, ToolButtonStyle::TextUnderIcon)
            .unwrap();
        toolkit.set_uniform_button_size(bar, true).unwrap();
        assert_eq!(
            toolkit.tool_button_style(bar),
            Some(ToolButtonStyle::TextUnderIcon)
        );
        assert_eq!(toolkit.uniform_button_size(bar), Some(true));
    }

    #[test]
    fn test_click_requires_callback() {
        let (toolkit, menu) = toolkit_with_menu();
        let item = toolkit
            .add_menu_item(menu, &ActionProperties::named("Open"))
            .unwrap();

        let err = toolkit.click(item).unwrap_err();
        assert!(err.is_lifecycle());

        let sep = toolkit.add_menu_separator(menu).unwrap();
        let err = toolkit.click(sep).unwrap_err();
        assert!(err.is_lifecycle());
    }
}
