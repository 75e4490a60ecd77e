//! Push demo - send one notification to a list of device tokens.

use apns_client::Connection;
use apns_core::{Message, Priority};
use clap::Parser;
use tokio_stream::StreamExt as _;

#[derive(Debug, Parser)]
#[command(name = "apns-demo", about = "Send a push notification to device tokens")]
struct Args {
    /// Path to the .p12 push certificate archive.
    #[arg(long, env = "APNS_CERTIFICATE")]
    certificate: String,

    /// Passphrase of the certificate archive.
    #[arg(long, env = "APNS_PASSPHRASE", default_value = "")]
    passphrase: String,

    /// Device tokens to push to.
    #[arg(required = true)]
    tokens: Vec<String>,

    /// Notification title.
    #[arg(long, default_value = "Hello")]
    title: String,

    /// Notification body text.
    #[arg(long, default_value = "Hello from apns-demo")]
    body: String,

    /// App icon badge count.
    #[arg(long)]
    badge: Option<u32>,

    /// Sound file played on delivery.
    #[arg(long)]
    sound: Option<String>,

    /// Topic, typically the app bundle ID.
    #[arg(long)]
    topic: Option<String>,

    /// Collapse id superseding earlier undelivered notifications.
    #[arg(long)]
    collapse_id: Option<String>,

    /// Send with low (power-considerate) priority.
    #[arg(long)]
    low_priority: bool,

    /// Push against the production endpoint instead of development.
    #[arg(long)]
    production: bool,
}

#[tokio::main]
async fn main() -> color_eyre::eyre::Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();

    let mut connection = Connection::from_p12(&args.certificate, &args.passphrase)?;
    if args.production {
        connection.production();
    }

    let mut builder = Message::builder().title(args.title).body(args.body);
    if let Some(badge) = args.badge {
        builder = builder.badge(badge);
    }
    if let Some(sound) = args.sound {
        builder = builder.sound(sound);
    }
    if let Some(topic) = args.topic {
        builder = builder.topic(topic);
    }
    if let Some(collapse_id) = args.collapse_id {
        builder = builder.collapse_id(collapse_id);
    }
    if args.low_priority {
        builder = builder.priority(Priority::Low);
    }
    let message = builder.build();

    tracing::info!(host = %connection.host(), tokens = args.tokens.len(), "pushing");

    let mut stream = connection.dispatch(message, &args.tokens);
    let mut failures = 0_usize;

    while let Some(outcome) = stream.next().await {
        if outcome.delivered() {
            tracing::info!(token = %outcome.token, "delivered");
        } else {
            failures += 1;
            let status = outcome.status.map_or(0, |status| status.as_u16());
            let error = outcome
                .error
                .as_ref()
                .map_or_else(|| "unknown".to_string(), ToString::to_string);
            tracing::error!(token = %outcome.token, status, error = %error, "push failed");
        }
    }

    if failures > 0 {
        color_eyre::eyre::bail!("{failures} token(s) failed");
    }

    Ok(())
}
