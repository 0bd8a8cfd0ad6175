//! Core systems for Horizon Trellis.
//!
//! This crate provides the foundational components of the Horizon Trellis
//! GUI wiring framework:
//!
//! - **Service Model**: named services with a start/stop lifecycle, narrow
//!   action capabilities, and a dependency-injected service registry
//! - **UI Dispatch**: a queue-backed executor that marshals closures onto a
//!   single UI thread, with blocking completion waits
//! - **Errors**: the configuration/lifecycle/dispatch failure taxonomy
//!   shared by the whole framework
//!
//! # Service Example
//!
//! ```
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicBool, Ordering};
//! use horizon_trellis_core::{Result, Service, ServiceRegistry};
//!
//! struct Beacon {
//!     lit: AtomicBool,
//! }
//!
//! impl Service for Beacon {
//!     fn start(&self) -> Result<()> {
//!         self.lit.store(true, Ordering::Release);
//!         Ok(())
//!     }
//!
//!     fn stop(&self) -> Result<()> {
//!         self.lit.store(false, Ordering::Release);
//!         Ok(())
//!     }
//!
//!     fn is_started(&self) -> bool {
//!         self.lit.load(Ordering::Acquire)
//!     }
//!
//!     fn update(&self) -> Result<()> {
//!         Ok(())
//!     }
//! }
//!
//! let services = ServiceRegistry::new();
//! services.register("beacon", Arc::new(Beacon { lit: AtomicBool::new(false) }))?;
//! services.get("beacon").unwrap().start()?;
//! assert!(services.get("beacon").unwrap().is_started());
//! # Ok::<(), horizon_trellis_core::Error>(())
//! ```
//!
//! # Dispatch Example
//!
//! ```
//! use horizon_trellis_core::dispatch::{run_blocking, QueuedDispatcher};
//!
//! let dispatcher = QueuedDispatcher::spawn();
//!
//! // Runs on the pump thread; the caller blocks until it returns.
//! let label = run_blocking(&dispatcher, || "built on the UI thread".to_string())?;
//! assert_eq!(label, "built on the UI thread");
//!
//! dispatcher.shutdown_and_join();
//! # Ok::<(), horizon_trellis_core::Error>(())
//! ```

pub mod dispatch;
mod error;
pub mod logging;
pub mod service;

pub use dispatch::{
    CompletionHandle, CompletionWaiter, QueuedDispatcher, UiDispatcher, completion_pair,
    run_blocking,
};
pub use error::{Error, Result};
pub use service::{ActionHost, ActionState, Service, ServiceRegistry};
