//! APNs Core Types
//!
//! Notification model for Apple Push Notification service: alert, payload,
//! per-request header directives, and the frozen message snapshot built by
//! [`MessageBuilder`].

mod alert;
mod header;
mod message;
mod payload;

pub use alert::*;
pub use header::*;
pub use message::*;
pub use payload::*;
