//! Menu, toolbar, and view wiring for Horizon Trellis.
//!
//! This crate assembles declarative GUI structure on top of the service
//! model from `horizon-trellis-core`:
//!
//! - **Container Registry**: the shared map from service and window ids to
//!   live widget handles, plus the action-to-parent fan-out that keeps
//!   every bound item in sync with its action service
//! - **Layout Managers**: turn `<layout>` configuration into menu, toolbar,
//!   and view widgets through an abstract toolkit
//! - **Registrars**: correlate `<registry>` service bindings with created
//!   widgets by position and drive the bound services' lifecycles
//! - **Orchestrator Services**: [`MenuService`], [`ToolBarService`], and
//!   [`ViewService`] tie one layout manager and one registrar together
//!   behind the plain [`Service`] lifecycle
//! - **Actions**: [`ActionService`] holds the logical command state;
//!   [`ActionCallback`] routes widget triggers back to it
//! - **Headless Toolkit**: an in-memory [`WidgetToolkit`](toolkit::WidgetToolkit)
//!   backend for tests and embedding without a display
//!
//! # Example
//!
//! One menu with one entry, bound to an auto-started action:
//!
//! ```
//! use std::sync::Arc;
//!
//! use horizon_trellis::toolkit::{HeadlessToolkit, WidgetToolkit};
//! use horizon_trellis::{
//!     ActionService, ConfigNode, MenuService, QueuedDispatcher, Service, UiContext,
//! };
//!
//! let toolkit = Arc::new(HeadlessToolkit::new());
//! let dispatcher = Arc::new(QueuedDispatcher::spawn());
//! let context = UiContext::new(toolkit.clone(), dispatcher.clone());
//!
//! // Widgets the application shell would normally publish.
//! let window = toolkit.create_root_container()?;
//! let menu_bar = toolkit.create_menu_bar(window)?;
//! let file_menu = toolkit.create_menu(menu_bar, "File")?;
//! context.containers().register_sid_menu("fileMenu", file_menu)?;
//!
//! // The action behind the menu entry.
//! let open = Arc::new(ActionService::new("openAct", context.containers().clone()));
//! context.services().register("openAct", open.clone())?;
//!
//! // The menu service: one entry, bound by position, auto-started.
//! let menu = Arc::new(MenuService::new("fileMenu", context.clone()));
//! menu.initialize(&ConfigNode::parse(
//!     r#"<service>
//!            <gui><layout><menuItem name="Open"/></layout></gui>
//!            <registry><menuItem sid="openAct" start="true"/></registry>
//!        </service>"#,
//! )?)?;
//! context.services().register("fileMenu", menu.clone())?;
//!
//! menu.start()?;
//! assert!(open.is_started());
//!
//! menu.stop()?;
//! assert!(!open.is_started());
//! dispatcher.shutdown_and_join();
//! # Ok::<(), horizon_trellis::Error>(())
//! ```

mod action;
mod callback;
mod config;
mod context;
pub mod layout;
pub mod registrar;
mod registry;
pub mod service;
pub mod toolkit;

pub use action::ActionService;
pub use callback::ActionCallback;
pub use config::ConfigNode;
pub use context::UiContext;
pub use registry::ContainerRegistry;
pub use service::{MenuService, ToolBarService, ViewService};

pub use horizon_trellis_core::{
    ActionHost, ActionState, Error, QueuedDispatcher, Result, Service, ServiceRegistry,
    UiDispatcher, run_blocking,
};
