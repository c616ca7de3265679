//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing)
//!     → request.rs (upgrade or ordinary request?)
//!     → upgrade.rs   → authenticate → control-channel handler (websocket.rs)
//!     → dispatch.rs  → authenticate → route table / plugin chain
//!     → response.rs (Reply → wire response)
//!     → Send to client
//! ```

pub mod builtin;
pub mod dispatch;
pub mod request;
pub mod response;
pub mod server;
pub mod upgrade;
pub mod websocket;

pub use request::X_REQUEST_ID;
pub use response::{Reply, ReplyError};
pub use server::{AppState, GatewayServer};
pub use upgrade::{UpgradeHandler, UpgradeSlot};
pub use websocket::{ControlSession, WebSocketControl};
