//! Delivery behaviour of a notification (the non-alert `aps` fields).

/// Behavioural part of the `aps` dictionary: badge, sound, background
/// delivery and category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Payload {
    /// Number displayed as the app icon badge. `Some(0)` clears the badge;
    /// `None` leaves it unchanged (the key is omitted on the wire).
    pub badge: Option<u32>,

    /// Sound file in the app bundle played on delivery. The service plays
    /// the default sound if the file does not exist or `default` is given.
    pub sound: Option<String>,

    /// Wake the app in the background for a fetch
    /// (`content-available: 1` on the wire).
    pub content_available: bool,

    /// Identifier of a registered notification category with custom actions.
    pub category: Option<String>,
}
