//! Per-token delivery outcomes and the stream they arrive on.

use std::sync::Arc;

use apns_core::Message;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use tokio_stream::wrappers::ReceiverStream;

use crate::{PushError, ServiceResponse};

/// Stream of per-token outcomes for one dispatch call.
///
/// The stream yields exactly one [`Outcome`] per requested token, in
/// completion order, and closes once every per-token request has finished.
/// Closure is the sole end-of-batch signal. A stream belongs to a single
/// dispatch call and is never reused.
pub type OutcomeStream = ReceiverStream<Outcome>;

/// Result of one delivery attempt to one device token.
#[derive(Debug)]
pub struct Outcome {
    /// Device token this outcome belongs to.
    pub token: String,

    /// HTTP status of the response, `None` when the request never
    /// completed.
    pub status: Option<StatusCode>,

    /// Why delivery failed; `None` means delivered.
    pub error: Option<PushError>,

    /// Reason code echoed verbatim from the service error body.
    pub reason: Option<String>,

    /// Failure time reported by the service, e.g. when the token became
    /// unregistered.
    pub timestamp: Option<DateTime<Utc>>,

    /// The message this outcome originated from.
    pub message: Arc<Message>,
}

impl Outcome {
    /// Whether the notification was accepted by the service.
    pub fn delivered(&self) -> bool {
        self.status == Some(StatusCode::OK) && self.error.is_none()
    }

    pub(crate) fn success(token: String, message: Arc<Message>, status: StatusCode) -> Self {
        Self {
            token,
            status: Some(status),
            error: None,
            reason: None,
            timestamp: None,
            message,
        }
    }

    /// The request never produced a response.
    pub(crate) fn no_response(token: String, message: Arc<Message>, error: PushError) -> Self {
        Self {
            token,
            status: None,
            error: Some(error),
            reason: None,
            timestamp: None,
            message,
        }
    }

    /// A response arrived but its body could not be interpreted.
    pub(crate) fn undecodable(
        token: String,
        message: Arc<Message>,
        status: StatusCode,
        error: PushError,
    ) -> Self {
        Self {
            token,
            status: Some(status),
            error: Some(error),
            reason: None,
            timestamp: None,
            message,
        }
    }

    /// The service rejected the notification with a structured error body.
    pub(crate) fn rejected(
        token: String,
        message: Arc<Message>,
        status: StatusCode,
        service: ServiceResponse,
    ) -> Self {
        let kind = service.kind(status);
        Self {
            token,
            status: Some(status),
            error: Some(PushError::Rejected(kind)),
            timestamp: service.timestamp_utc(),
            reason: service.reason,
            message,
        }
    }
}
