//! overpass/src/notify.rs
//! Join/leave session events and the webhook forwarder.

use serde::Serialize;
use std::time::Duration;
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, warn};

const EVENT_QUEUE_CAPACITY: usize = 64;
const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Joined { username: String },
    Left { username: String },
}

impl SessionEvent {
    fn message(&self) -> String {
        match self {
            SessionEvent::Joined { username } => format!("{username} joined the server"),
            SessionEvent::Left { username } => format!("{username} left the server"),
        }
    }
}

#[derive(Serialize)]
struct WebhookPayload<'a> {
    content: &'a str,
}

/// Handle sessions use to emit events. The handoff never blocks; when the
/// queue is full the event is dropped so a slow or failing webhook cannot
/// stall the relay path.
#[derive(Clone)]
pub struct Notifier {
    tx: mpsc::Sender<SessionEvent>,
}

impl Notifier {
    pub fn send(&self, event: SessionEvent) {
        if self.tx.try_send(event).is_err() {
            warn!("Event queue full, dropping session event");
        }
    }
}

/// Spawns the forwarder task consuming session events. With a webhook URL
/// configured each event becomes a fire-and-forget POST; without one the
/// events are only logged.
pub fn spawn_forwarder(webhook_url: Option<String>) -> (Notifier, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::channel::<SessionEvent>(EVENT_QUEUE_CAPACITY);
    let handle = tokio::spawn(async move {
        let client = webhook_url.as_ref().map(|_| {
            reqwest::Client::builder()
                .timeout(WEBHOOK_TIMEOUT)
                .build()
                .unwrap_or_else(|_| reqwest::Client::new())
        });
        while let Some(event) = rx.recv().await {
            let text = event.message();
            match (&client, &webhook_url) {
                (Some(client), Some(url)) => {
                    let payload = WebhookPayload { content: &text };
                    if let Err(e) = client.post(url.as_str()).json(&payload).send().await {
                        warn!("Webhook notification failed: {}", e);
                    }
                }
                _ => debug!(%text, "Session event (no webhook configured)"),
            }
        }
    });
    (Notifier { tx }, handle)
}
