//! Per-request header directives.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Delivery urgency of a notification.
///
/// High is the service default and is assumed when no priority header is
/// sent; [`Priority::wire_value`] yields the numeric header value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Priority {
    /// Deliver immediately. Must trigger an alert, sound or badge on the
    /// device; it is an error to use this for content-available-only pushes.
    #[default]
    High,
    /// Deliver at a time that takes device power into account. May be
    /// grouped, throttled, and in some cases not delivered.
    Low,
}

impl Priority {
    /// Numeric value carried by the `apns-priority` header.
    pub fn wire_value(self) -> u8 {
        match self {
            Self::High => 10,
            Self::Low => 5,
        }
    }
}

/// Header directives applied to every per-token request of a dispatch.
///
/// Not every directive maps to a wire header: unset directives are omitted,
/// and a High priority is never sent because the service assumes it by
/// default.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Header {
    /// Canonical UUID identifying the notification. If omitted the service
    /// generates one and echoes it in the response.
    pub apns_id: Option<Uuid>,

    /// Date until which the service stores and retries delivery. When unset
    /// the notification expires immediately if it cannot be delivered at
    /// once.
    pub expiration: Option<DateTime<Utc>>,

    /// Delivery urgency; defaults to [`Priority::High`].
    pub priority: Priority,

    /// Topic of the notification, typically the app bundle ID. Mandatory
    /// when the client certificate covers multiple topics.
    pub topic: Option<String>,

    /// Collapse key: an undelivered notification with the same value is
    /// superseded by this one.
    pub collapse_id: Option<String>,
}
