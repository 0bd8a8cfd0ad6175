//! Logging integration for Horizon Trellis.
//!
//! Trellis instruments itself with the `tracing` crate. To see logs,
//! install a subscriber in your application:
//!
//! ```ignore
//! use tracing_subscriber;
//!
//! fn main() {
//!     tracing_subscriber::fmt::init();
//!
//!     // Your application code...
//! }
//! ```
//!
//! Registration, start/stop, manage/unmanage, and dispatch fan-out all emit
//! debug or trace events under the targets below.

/// Target names for log filtering.
///
/// Pass these to `tracing` filter directives to narrow output to one
/// subsystem, e.g. `RUST_LOG=horizon_trellis_core::dispatch=trace`.
pub mod targets {
    /// Core crate target.
    pub const CORE: &str = "horizon_trellis_core";
    /// Service registry and lifecycle target.
    pub const SERVICE: &str = "horizon_trellis_core::service";
    /// UI dispatcher target.
    pub const DISPATCH: &str = "horizon_trellis_core::dispatch";
    /// Action service target.
    pub const ACTION: &str = "horizon_trellis::action";
    /// Menu, toolbar, and view host target.
    pub const HOST: &str = "horizon_trellis::service";
    /// Container registry target.
    pub const REGISTRY: &str = "horizon_trellis::registry";
    /// Registrar manage/unmanage target.
    pub const REGISTRAR: &str = "horizon_trellis::registrar";
    /// Widget callback target.
    pub const CALLBACK: &str = "horizon_trellis::callback";
    /// Layout manager target.
    pub const LAYOUT: &str = "horizon_trellis::layout";
    /// Toolkit binding target.
    pub const TOOLKIT: &str = "horizon_trellis::toolkit";
}
