//! Alert content of a notification.

/// User-visible alert of a notification.
///
/// Every field is optional; unset fields are omitted from the wire payload
/// so the device falls back to its defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Alert {
    /// Short string describing the purpose of the notification, shown
    /// prominently (e.g. on Apple Watch).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Key into the app's `Localizable.strings` used for the title.
    #[serde(rename = "title-loc-key", skip_serializing_if = "Option::is_none")]
    pub title_loc_key: Option<String>,

    /// Format arguments substituted into `title-loc-key`.
    #[serde(rename = "title-loc-args", skip_serializing_if = "Vec::is_empty", default)]
    pub title_loc_args: Vec<String>,

    /// Text of the alert message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,

    /// Key into the app's `Localizable.strings` used for the body.
    #[serde(rename = "loc-key", skip_serializing_if = "Option::is_none")]
    pub loc_key: Option<String>,

    /// Format arguments substituted into `loc-key`.
    #[serde(rename = "loc-args", skip_serializing_if = "Vec::is_empty", default)]
    pub loc_args: Vec<String>,

    /// Localization key for the action button title shown instead of "View".
    #[serde(rename = "action-loc-key", skip_serializing_if = "Option::is_none")]
    pub action_loc_key: Option<String>,

    /// Image file in the app bundle used as launch image when the user
    /// opens the notification.
    #[serde(rename = "launch-image", skip_serializing_if = "Option::is_none")]
    pub launch_image: Option<String>,
}

impl Alert {
    /// Whether no alert field is set, in which case the `alert` key is
    /// omitted from the payload entirely.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.title_loc_key.is_none()
            && self.title_loc_args.is_empty()
            && self.body.is_none()
            && self.loc_key.is_none()
            && self.loc_args.is_empty()
            && self.action_loc_key.is_none()
            && self.launch_image.is_none()
    }
}
