//! Frozen notification messages and their builder.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{Alert, Header, Payload, Priority};

/// A fully assembled notification.
///
/// A `Message` is an immutable snapshot: it can only be produced by
/// [`MessageBuilder::build`], and configuration is therefore always complete
/// before a dispatch starts referencing it. Serializing a `Message` yields
/// the wire body, with the notification payload nested under the `aps` key
/// and custom fields at the top level.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    alert: Alert,
    payload: Payload,
    header: Header,
    custom: BTreeMap<String, serde_json::Value>,
}

impl Message {
    /// Start building a message.
    pub fn builder() -> MessageBuilder {
        MessageBuilder::default()
    }

    /// Alert content.
    pub fn alert(&self) -> &Alert {
        &self.alert
    }

    /// Delivery behaviour fields.
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Per-request header directives.
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Top-level custom fields.
    pub fn custom(&self) -> &BTreeMap<String, serde_json::Value> {
        &self.custom
    }
}

/// Serialized view of the `aps` dictionary.
#[derive(serde::Serialize)]
struct Aps<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    alert: Option<&'a Alert>,
    #[serde(skip_serializing_if = "Option::is_none")]
    badge: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sound: Option<&'a str>,
    #[serde(rename = "content-available", skip_serializing_if = "Option::is_none")]
    content_available: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    category: Option<&'a str>,
}

impl serde::Serialize for Message {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeMap as _;

        let aps = Aps {
            alert: (!self.alert.is_empty()).then_some(&self.alert),
            badge: self.payload.badge,
            sound: self.payload.sound.as_deref(),
            content_available: self.payload.content_available.then_some(1),
            category: self.payload.category.as_deref(),
        };

        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("aps", &aps)?;
        for (key, value) in &self.custom {
            // "aps" is reserved for the notification payload.
            if key != "aps" {
                map.serialize_entry(key, value)?;
            }
        }
        map.end()
    }
}

/// Chainable builder producing a frozen [`Message`].
#[derive(Debug, Clone, Default)]
pub struct MessageBuilder {
    alert: Alert,
    payload: Payload,
    header: Header,
    custom: BTreeMap<String, serde_json::Value>,
}

impl MessageBuilder {
    /// Set the alert title.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.alert.title = Some(title.into());
        self
    }

    /// Set the localization key and arguments for the title.
    pub fn title_localized(
        mut self,
        key: impl Into<String>,
        args: impl IntoIterator<Item = String>,
    ) -> Self {
        self.alert.title_loc_key = Some(key.into());
        self.alert.title_loc_args = args.into_iter().collect();
        self
    }

    /// Set the alert body text.
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.alert.body = Some(body.into());
        self
    }

    /// Set the localization key and arguments for the body.
    pub fn body_localized(
        mut self,
        key: impl Into<String>,
        args: impl IntoIterator<Item = String>,
    ) -> Self {
        self.alert.loc_key = Some(key.into());
        self.alert.loc_args = args.into_iter().collect();
        self
    }

    /// Set the localization key for the action button title.
    pub fn action_loc_key(mut self, key: impl Into<String>) -> Self {
        self.alert.action_loc_key = Some(key.into());
        self
    }

    /// Set the launch image shown when the user opens the notification.
    pub fn launch_image(mut self, image: impl Into<String>) -> Self {
        self.alert.launch_image = Some(image.into());
        self
    }

    /// Set the app icon badge count. Zero clears the badge.
    pub fn badge(mut self, badge: u32) -> Self {
        self.payload.badge = Some(badge);
        self
    }

    /// Set the sound played on delivery.
    pub fn sound(mut self, sound: impl Into<String>) -> Self {
        self.payload.sound = Some(sound.into());
        self
    }

    /// Request a background wake-up of the app (`content-available: 1`).
    pub fn content_available(mut self) -> Self {
        self.payload.content_available = true;
        self
    }

    /// Set the notification category for custom actions.
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.payload.category = Some(category.into());
        self
    }

    /// Set the canonical notification id echoed by the service.
    pub fn id(mut self, id: Uuid) -> Self {
        self.header.apns_id = Some(id);
        self
    }

    /// Set the date until which the service stores and retries delivery.
    pub fn expiration(mut self, expiration: DateTime<Utc>) -> Self {
        self.header.expiration = Some(expiration);
        self
    }

    /// Set the delivery priority. High is the default and is never sent on
    /// the wire.
    pub fn priority(mut self, priority: Priority) -> Self {
        self.header.priority = priority;
        self
    }

    /// Set the topic (typically the app bundle ID).
    pub fn topic(mut self, topic: impl Into<String>) -> Self {
        self.header.topic = Some(topic.into());
        self
    }

    /// Set the collapse id superseding earlier undelivered notifications.
    pub fn collapse_id(mut self, collapse_id: impl Into<String>) -> Self {
        self.header.collapse_id = Some(collapse_id.into());
        self
    }

    /// Add a top-level custom field. The key `aps` is reserved and is
    /// skipped during serialization.
    pub fn custom(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.custom.insert(key.into(), value.into());
        self
    }

    /// Freeze the configuration into an immutable [`Message`].
    pub fn build(self) -> Message {
        Message {
            alert: self.alert,
            payload: self.payload,
            header: self.header,
            custom: self.custom,
        }
    }
}
