//! Per-request header policy.

use apns_core::{Header, Priority};
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};

use crate::PushError;

const APNS_ID: HeaderName = HeaderName::from_static("apns-id");
const APNS_EXPIRATION: HeaderName = HeaderName::from_static("apns-expiration");
const APNS_PRIORITY: HeaderName = HeaderName::from_static("apns-priority");
const APNS_TOPIC: HeaderName = HeaderName::from_static("apns-topic");
const APNS_COLLAPSE_ID: HeaderName = HeaderName::from_static("apns-collapse-id");

/// Build the headers for one delivery request from the message's
/// directives.
///
/// Pure function of its input; invoked for every per-token request. Unset
/// directives are omitted, and a High priority is never sent because the
/// service already assumes it when the header is missing.
pub fn request_headers(header: &Header) -> Result<HeaderMap, PushError> {
    let mut headers = HeaderMap::new();
    headers.insert(
        CONTENT_TYPE,
        HeaderValue::from_static("application/json; charset=utf-8"),
    );

    if let Some(id) = header.apns_id {
        headers.insert(APNS_ID, HeaderValue::from_str(&id.to_string())?);
    }

    if let Some(expiration) = header.expiration {
        let seconds = expiration.timestamp().to_string();
        headers.insert(APNS_EXPIRATION, HeaderValue::from_str(&seconds)?);
    }

    if header.priority == Priority::Low {
        let value = header.priority.wire_value().to_string();
        headers.insert(APNS_PRIORITY, HeaderValue::from_str(&value)?);
    }

    if let Some(topic) = header.topic.as_deref().filter(|topic| !topic.is_empty()) {
        headers.insert(APNS_TOPIC, HeaderValue::from_str(topic)?);
    }

    if let Some(collapse_id) = header.collapse_id.as_deref().filter(|id| !id.is_empty()) {
        headers.insert(APNS_COLLAPSE_ID, HeaderValue::from_str(collapse_id)?);
    }

    Ok(headers)
}
