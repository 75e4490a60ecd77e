//! Connection to the push service and the concurrent dispatcher.

use std::sync::Arc;

use apns_core::Message;
use bytes::Bytes;
use color_eyre::eyre::WrapErr as _;
use reqwest::{Client, StatusCode, Url};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::{Outcome, OutcomeStream, PushError, ServiceResponse, request_headers};

/// Sandbox endpoint, used while the app is in development.
pub const ENDPOINT_DEVELOPMENT: &str = "https://api.development.push.apple.com";

/// Production endpoint, used for published apps.
pub const ENDPOINT_PRODUCTION: &str = "https://api.push.apple.com";

/// A configured route to the push service: TLS-authenticated HTTP/2
/// transport plus the target host.
///
/// The transport is shared read-only across all concurrent requests of a
/// dispatch. The host may be changed between dispatch calls but must be
/// treated as fixed while one is in flight; `dispatch` captures it by value,
/// so later changes never affect running batches.
#[derive(Debug, Clone)]
pub struct Connection {
    client: Client,
    host: String,
}

impl Connection {
    /// Create a connection authenticated by the certificate in a
    /// password-protected `.p12` archive.
    ///
    /// Fails fast on an unreadable archive, wrong passphrase, non-RSA key
    /// or expired certificate; no partial connection is ever returned. The
    /// host defaults to the development endpoint.
    pub fn from_p12(path: &str, passphrase: &str) -> color_eyre::eyre::Result<Self> {
        let identity = apns_crypto::ClientIdentity::from_p12_file(path, passphrase)?;

        let identity = reqwest::Identity::from_pem(identity.to_pem().as_bytes())
            .wrap_err("failed to build TLS identity")?;

        let client = Client::builder()
            .identity(identity)
            .build()
            .wrap_err("failed to build HTTP client")?;

        Ok(Self::with_client(client))
    }

    /// Create a connection around an externally configured transport. The
    /// host defaults to the development endpoint.
    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            host: ENDPOINT_DEVELOPMENT.to_string(),
        }
    }

    /// Target the development endpoint (the default).
    pub fn development(&mut self) -> &mut Self {
        self.host = ENDPOINT_DEVELOPMENT.to_string();
        self
    }

    /// Target the production endpoint.
    pub fn production(&mut self) -> &mut Self {
        self.host = ENDPOINT_PRODUCTION.to_string();
        self
    }

    /// Target a custom host (proxies, mock servers).
    pub fn set_host(&mut self, host: impl Into<String>) -> &mut Self {
        self.host = host.into();
        self
    }

    /// Currently targeted host.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Fan a message out to every token, one concurrent request per token.
    ///
    /// Returns immediately; the stream delivers exactly one [`Outcome`] per
    /// token in completion order and closes once the whole batch has
    /// finished. An empty token list yields a stream that is already
    /// closed. The default channel capacity covers the whole batch, so
    /// request tasks never wait on a slow consumer; use
    /// [`dispatch_with_capacity`](Self::dispatch_with_capacity) to bound it.
    ///
    /// Must be called from within a tokio runtime.
    pub fn dispatch(&self, message: Message, tokens: &[String]) -> OutcomeStream {
        self.dispatch_with_capacity(message, tokens, tokens.len())
    }

    /// [`dispatch`](Self::dispatch) with a caller-chosen channel capacity.
    /// With a capacity smaller than the batch, completed request tasks
    /// suspend until the consumer drains the stream.
    pub fn dispatch_with_capacity(
        &self,
        message: Message,
        tokens: &[String],
        capacity: usize,
    ) -> OutcomeStream {
        let (results, stream) = mpsc::channel(capacity.max(1));
        let message = Arc::new(message);

        // Serialize once: every request sends byte-identical bodies.
        let body = match serde_json::to_vec(message.as_ref()) {
            Ok(body) => Bytes::from(body),
            Err(error) => {
                tracing::error!(error = %error, "failed to serialize message, dispatching nothing");
                return ReceiverStream::new(stream);
            }
        };

        tracing::debug!(host = %self.host, tokens = tokens.len(), "dispatching push batch");

        for token in tokens {
            tokio::spawn(push_token(
                self.client.clone(),
                self.host.clone(),
                token.clone(),
                Arc::clone(&message),
                body.clone(),
                results.clone(),
            ));
        }

        // This call keeps no sender: the channel closes exactly when the
        // last per-token task drops its clone, i.e. after every outcome has
        // been delivered, whatever the completion order.
        ReceiverStream::new(stream)
    }
}

/// One per-token request: build, send, interpret, report. Failures never
/// abort the rest of the batch; every exit path produces exactly one
/// outcome.
async fn push_token(
    client: Client,
    host: String,
    token: String,
    message: Arc<Message>,
    body: Bytes,
    results: mpsc::Sender<Outcome>,
) {
    let outcome = match deliver(&client, &host, &token, &message, body).await {
        Ok(outcome) => outcome,
        Err(error) => {
            tracing::debug!(token = %token, error = %error, "push request failed");
            Outcome::no_response(token, message, error)
        }
    };

    if results.send(outcome).await.is_err() {
        tracing::debug!("outcome receiver dropped before batch completion");
    }
}

async fn deliver(
    client: &Client,
    host: &str,
    token: &str,
    message: &Arc<Message>,
    body: Bytes,
) -> Result<Outcome, PushError> {
    let url = Url::parse(&format!("{host}/3/device/{token}"))?;
    let headers = request_headers(message.header())?;

    let response = client.post(url).headers(headers).body(body).send().await?;
    let status = response.status();

    if status == StatusCode::OK {
        return Ok(Outcome::success(
            token.to_owned(),
            Arc::clone(message),
            status,
        ));
    }

    let outcome = match response.bytes().await {
        // The status arrived but the body broke off mid-read.
        Err(error) => Outcome::undecodable(
            token.to_owned(),
            Arc::clone(message),
            status,
            PushError::Transport(error),
        ),
        Ok(bytes) => match serde_json::from_slice::<ServiceResponse>(&bytes) {
            // A body that is not JSON surfaces as the parse failure itself.
            Err(error) => Outcome::undecodable(
                token.to_owned(),
                Arc::clone(message),
                status,
                PushError::Decode(error),
            ),
            Ok(service) => Outcome::rejected(
                token.to_owned(),
                Arc::clone(message),
                status,
                service,
            ),
        },
    };

    Ok(outcome)
}
