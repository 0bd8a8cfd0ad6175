//! Layout descriptors and the menu/toolbar/view layout managers.
//!
//! A layout configuration is an ordered list of visual item descriptors.
//! The managers in the submodules translate those descriptors into live
//! widgets under a parent handle and expose the created handles in
//! declaration order; that order is what registrars correlate service
//! bindings against, so it is preserved exactly.

use std::path::PathBuf;

use horizon_trellis_core::{Error, Result};

use crate::config::ConfigNode;

mod menu;
mod toolbar;
mod view;

pub use menu::MenuLayoutManager;
pub use toolbar::ToolBarLayoutManager;
pub use view::ViewLayoutManager;

/// Check/radio behavior of an actionable item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ItemStyle {
    /// Plain push item.
    #[default]
    Plain,
    /// Two-state checkable item.
    Check,
    /// Mutually exclusive radio item.
    Radio,
}

impl ItemStyle {
    fn from_config(node: &ConfigNode) -> Result<Self> {
        match node.attribute("style") {
            None => Ok(Self::Plain),
            Some("check") => Ok(Self::Check),
            Some("radio") => Ok(Self::Radio),
            Some(other) => Err(Error::configuration(format!(
                "<{}> style must be 'check' or 'radio', got '{other}'",
                node.name()
            ))),
        }
    }
}

/// Semantic role of an action.
///
/// Toolkits with platform menu conventions (application menus, about
/// panels) relocate items carrying these roles; everything else treats them
/// as plain items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpecialAction {
    /// No special placement.
    #[default]
    Default,
    /// Application quit entry.
    Quit,
    /// About dialog entry.
    About,
    /// Help entry.
    Help,
    /// New-document entry.
    New,
}

impl SpecialAction {
    fn from_config(node: &ConfigNode) -> Result<Self> {
        match node.attribute("specialAction") {
            None | Some("DEFAULT") => Ok(Self::Default),
            Some("QUIT") => Ok(Self::Quit),
            Some("ABOUT") => Ok(Self::About),
            Some("HELP") => Ok(Self::Help),
            Some("NEW") => Ok(Self::New),
            Some(other) => Err(Error::configuration(format!(
                "unknown specialAction '{other}' on <{}>",
                node.name()
            ))),
        }
    }
}

/// Text/icon arrangement for toolbar buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToolButtonStyle {
    /// Icon only, the usual compact toolbar look.
    #[default]
    IconOnly,
    /// Text only.
    TextOnly,
    /// Text to the right of the icon.
    TextBesideIcon,
    /// Text below the icon.
    TextUnderIcon,
}

impl ToolButtonStyle {
    fn from_config(node: &ConfigNode) -> Result<Self> {
        match node.attribute("style") {
            None | Some("ToolButtonIconOnly") => Ok(Self::IconOnly),
            Some("ToolButtonTextOnly") => Ok(Self::TextOnly),
            Some("ToolButtonTextBesideIcon") => Ok(Self::TextBesideIcon),
            Some("ToolButtonTextUnderIcon") => Ok(Self::TextUnderIcon),
            Some(other) => Err(Error::configuration(format!(
                "unknown tool button style '{other}'"
            ))),
        }
    }
}

/// Presentation of one actionable layout item.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionProperties {
    /// Display text.
    pub name: String,
    /// Keyboard shortcut, e.g. "Ctrl+O".
    pub shortcut: Option<String>,
    /// Check/radio behavior.
    pub style: ItemStyle,
    /// Primary icon path.
    pub icon: Option<PathBuf>,
    /// Secondary icon path, shown when the item is checked.
    pub icon2: Option<PathBuf>,
    /// Semantic role.
    pub special: SpecialAction,
}

impl ActionProperties {
    /// Build properties with a display name and defaults for the rest.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            shortcut: None,
            style: ItemStyle::Plain,
            icon: None,
            icon2: None,
            special: SpecialAction::Default,
        }
    }

    fn from_config(node: &ConfigNode) -> Result<Self> {
        Ok(Self {
            name: node.required_attribute("name")?.to_string(),
            shortcut: node.attribute("shortcut").map(String::from),
            style: ItemStyle::from_config(node)?,
            icon: node.attribute("icon").map(PathBuf::from),
            icon2: node.attribute("icon2").map(PathBuf::from),
            special: SpecialAction::from_config(node)?,
        })
    }
}

/// One visual item descriptor from a layout configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum LayoutItem {
    /// An actionable item, wired to a callback at creation.
    Action(ActionProperties),
    /// A named sub-menu.
    Menu { name: String },
    /// A visual separator.
    Separator,
    /// An expanding spacer (toolbars only).
    Spacer,
    /// A container slot for an embedded editor (toolbars only).
    Editor,
}

impl LayoutItem {
    /// Parse a single layout child node.
    pub fn from_config(node: &ConfigNode) -> Result<Self> {
        match node.name() {
            "menuItem" => Ok(Self::Action(ActionProperties::from_config(node)?)),
            "menu" => Ok(Self::Menu {
                name: node.required_attribute("name")?.to_string(),
            }),
            "separator" => Ok(Self::Separator),
            "spacer" => Ok(Self::Spacer),
            "editor" => Ok(Self::Editor),
            other => Err(Error::configuration(format!(
                "unknown layout item <{other}>"
            ))),
        }
    }

    /// Whether this is an actionable item.
    pub fn is_action(&self) -> bool {
        matches!(self, Self::Action(_))
    }
}
