//! Error taxonomy for push delivery.
//!
//! The service signals failure three different ways: a `reason` string in a
//! JSON error body, a bare HTTP status code, or a transport-level error
//! before any response arrives. [`ErrorKind`] is the closed set of known
//! failure categories; the reason and status lookup tables are built once
//! and read without synchronization from every dispatch task.

use std::collections::HashMap;

use chrono::{DateTime, TimeZone as _, Utc};
use once_cell::sync::Lazy;
use reqwest::StatusCode;

/// Known failure categories reported by the push service.
///
/// Display text follows Apple's documented descriptions of the reason
/// codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
pub enum ErrorKind {
    #[error("the message payload was empty")]
    PayloadEmpty,
    #[error("the message payload was too large, the maximum size is 4096 bytes")]
    PayloadTooLarge,
    #[error("the apns-topic value was invalid")]
    BadTopic,
    #[error("pushing to this topic is not allowed")]
    TopicDisallowed,
    #[error("the apns-id value was bad")]
    BadMessageId,
    #[error("the apns-expiration value was bad")]
    BadExpirationDate,
    #[error("the apns-priority value was bad")]
    BadPriority,
    #[error("no device token was specified in the request")]
    MissingDeviceToken,
    #[error("the device token was bad, verify that it matches the environment")]
    BadDeviceToken,
    #[error("the device token does not match the specified topic")]
    DeviceTokenNotForTopic,
    #[error("the device token is inactive for the specified topic")]
    Unregistered,
    #[error("one or more headers were repeated")]
    DuplicateHeaders,
    #[error("the client certificate was for the wrong environment")]
    BadCertificateEnvironment,
    #[error("the client certificate was bad")]
    BadCertificate,
    #[error("the specified action is not allowed")]
    Forbidden,
    #[error("the request contained a bad :path value")]
    BadPath,
    #[error("the specified :method was not POST")]
    MethodNotAllowed,
    #[error("too many requests were made consecutively to the same device token")]
    TooManyRequests,
    #[error("idle timeout")]
    IdleTimeout,
    #[error("the server is shutting down")]
    Shutdown,
    #[error("an internal server error occurred")]
    InternalServerError,
    #[error("the service is unavailable")]
    ServiceUnavailable,
    #[error("the apns-topic header was required but not specified")]
    MissingTopic,
    #[error("bad request")]
    BadRequest,
    #[error("unknown error")]
    Unknown,
}

/// Reason codes from the service error body, as documented in the Local and
/// Remote Notification Programming Guide.
static REASON_KINDS: Lazy<HashMap<&'static str, ErrorKind>> = Lazy::new(|| {
    HashMap::from([
        ("PayloadEmpty", ErrorKind::PayloadEmpty),
        ("PayloadTooLarge", ErrorKind::PayloadTooLarge),
        ("BadTopic", ErrorKind::BadTopic),
        ("TopicDisallowed", ErrorKind::TopicDisallowed),
        ("BadMessageId", ErrorKind::BadMessageId),
        ("BadExpirationDate", ErrorKind::BadExpirationDate),
        ("BadPriority", ErrorKind::BadPriority),
        ("MissingDeviceToken", ErrorKind::MissingDeviceToken),
        ("BadDeviceToken", ErrorKind::BadDeviceToken),
        ("DeviceTokenNotForTopic", ErrorKind::DeviceTokenNotForTopic),
        ("Unregistered", ErrorKind::Unregistered),
        ("DuplicateHeaders", ErrorKind::DuplicateHeaders),
        ("BadCertificateEnvironment", ErrorKind::BadCertificateEnvironment),
        ("BadCertificate", ErrorKind::BadCertificate),
        ("Forbidden", ErrorKind::Forbidden),
        ("BadPath", ErrorKind::BadPath),
        ("MethodNotAllowed", ErrorKind::MethodNotAllowed),
        ("TooManyRequests", ErrorKind::TooManyRequests),
        ("IdleTimeout", ErrorKind::IdleTimeout),
        ("Shutdown", ErrorKind::Shutdown),
        ("InternalServerError", ErrorKind::InternalServerError),
        ("ServiceUnavailable", ErrorKind::ServiceUnavailable),
        ("MissingTopic", ErrorKind::MissingTopic),
    ])
});

/// Fallback classification for responses without a recognized reason.
static STATUS_KINDS: Lazy<HashMap<StatusCode, ErrorKind>> = Lazy::new(|| {
    HashMap::from([
        (StatusCode::BAD_REQUEST, ErrorKind::BadRequest),
        (StatusCode::FORBIDDEN, ErrorKind::Forbidden),
        (StatusCode::METHOD_NOT_ALLOWED, ErrorKind::MethodNotAllowed),
        (StatusCode::GONE, ErrorKind::Unregistered),
        (StatusCode::PAYLOAD_TOO_LARGE, ErrorKind::PayloadTooLarge),
        (StatusCode::TOO_MANY_REQUESTS, ErrorKind::TooManyRequests),
        (StatusCode::INTERNAL_SERVER_ERROR, ErrorKind::InternalServerError),
        (StatusCode::SERVICE_UNAVAILABLE, ErrorKind::ServiceUnavailable),
    ])
});

impl ErrorKind {
    /// Look up a service reason code.
    pub fn from_reason(reason: &str) -> Option<Self> {
        REASON_KINDS.get(reason).copied()
    }

    /// Look up an HTTP status code.
    pub fn from_status(status: StatusCode) -> Option<Self> {
        STATUS_KINDS.get(&status).copied()
    }
}

/// Why a single per-token request did not deliver.
///
/// A whole dispatch never fails; each token's failure is captured in its
/// own [`Outcome`](crate::Outcome) as one of these.
#[derive(Debug, thiserror::Error)]
pub enum PushError {
    /// The service answered with a non-200 status it could explain.
    #[error(transparent)]
    Rejected(#[from] ErrorKind),

    /// The request never completed: connect, TLS or timeout failure, or the
    /// response body broke off mid-read.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service answered with an error body that was not valid JSON.
    #[error("failed to decode error response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The device token produced an unparsable request URL.
    #[error("invalid request url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// A header directive produced an invalid header value.
    #[error("invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),
}

impl PushError {
    /// The service-reported failure category, if the service explained the
    /// rejection.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Rejected(kind) => Some(*kind),
            _ => None,
        }
    }
}

/// Structured error body of a non-200 response:
/// `{"reason": <string>, "timestamp": <int64 ms>}`.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct ServiceResponse {
    /// Reason code, echoed verbatim into the outcome.
    pub reason: Option<String>,

    /// Failure time in milliseconds since the epoch. Only reported for some
    /// reasons, e.g. when a token became unregistered.
    pub timestamp: Option<i64>,
}

impl ServiceResponse {
    /// Classify the response: reason lookup first, status fallback second,
    /// [`ErrorKind::Unknown`] when neither matches.
    pub fn kind(&self, status: StatusCode) -> ErrorKind {
        self.reason
            .as_deref()
            .and_then(ErrorKind::from_reason)
            .or_else(|| ErrorKind::from_status(status))
            .unwrap_or(ErrorKind::Unknown)
    }

    /// Failure time at second resolution.
    pub fn timestamp_utc(&self) -> Option<DateTime<Utc>> {
        self.timestamp
            .and_then(|ms| Utc.timestamp_opt(ms / 1000, 0).single())
    }
}
