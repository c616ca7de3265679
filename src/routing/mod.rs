//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Request path
//!     → table.rs (exact lookup)
//!     → Route found: method/header checks, then its handler
//!     → No route: plugin.rs (every route-capable plugin, in order)
//! ```
//!
//! # Design Decisions
//! - Table and chain are populated at startup, immutable at runtime
//! - Exact matching only; adding a path requires a restart
//! - Plugins are not first-match-wins: all capable plugins see the request

pub mod plugin;
pub mod table;

pub use plugin::{Plugin, PluginChain, PluginRouteHandler};
pub use table::{HandlerResult, Route, RouteHandler, RouteTable};
