//! Notification channels for orchestration results.
//!
//! Delivery is fire-and-forget: a failing sink is logged and never fails the
//! run that triggered it.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use design_review_core::obs;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::NotificationSettings;
use crate::error::{OrchestratorError, OrchestratorResult};
use crate::orchestrator::OverallStatus;

/// A configured notification destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotificationChannel {
    /// Email to a recipient list, optionally through an HTTP mail relay.
    Email {
        recipients: Vec<String>,
        #[serde(default)]
        relay_url: Option<String>,
    },
    Slack {
        channel: String,
        webhook_url: String,
    },
    /// Generic JSON POST.
    Webhook {
        url: String,
        #[serde(default)]
        headers: BTreeMap<String, String>,
    },
}

/// Message sent for an orchestration run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub run_id: String,
    pub status: OverallStatus,
    pub title: String,
    pub message: String,
    pub details: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

/// A destination notifications can be delivered to.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    fn name(&self) -> &str;

    async fn send(&self, notification: &Notification) -> OrchestratorResult<()>;
}

async fn post_json(
    client: &reqwest::Client,
    sink: &str,
    url: &str,
    headers: &BTreeMap<String, String>,
    payload: &serde_json::Value,
) -> OrchestratorResult<()> {
    let mut request = client.post(url).json(payload);
    for (name, value) in headers {
        request = request.header(name.as_str(), value.as_str());
    }
    let response = request
        .send()
        .await
        .map_err(|e| OrchestratorError::notification(sink, format!("request failed: {e}")))?;

    let status = response.status();
    if status.is_success() {
        debug!(sink = %sink, "notification delivered");
        Ok(())
    } else {
        let body = response.text().await.unwrap_or_default();
        Err(OrchestratorError::notification(
            sink,
            format!("endpoint returned {status}: {body}"),
        ))
    }
}

/// Slack incoming-webhook sink.
pub struct SlackSink {
    channel: String,
    webhook_url: String,
    client: reqwest::Client,
}

impl SlackSink {
    pub fn new(channel: impl Into<String>, webhook_url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            channel: channel.into(),
            webhook_url: webhook_url.into(),
            client,
        }
    }

    fn payload(&self, notification: &Notification) -> serde_json::Value {
        let color = match notification.status {
            OverallStatus::Passed => "good",
            OverallStatus::Warning => "warning",
            OverallStatus::Failed => "danger",
        };
        serde_json::json!({
            "channel": self.channel,
            "attachments": [{
                "color": color,
                "title": notification.title,
                "text": notification.message,
                "footer": format!("run {}", notification.run_id),
                "ts": notification.timestamp.timestamp(),
            }]
        })
    }
}

#[async_trait]
impl NotificationSink for SlackSink {
    fn name(&self) -> &str {
        "slack"
    }

    async fn send(&self, notification: &Notification) -> OrchestratorResult<()> {
        post_json(
            &self.client,
            self.name(),
            &self.webhook_url,
            &BTreeMap::new(),
            &self.payload(notification),
        )
        .await
    }
}

/// Generic webhook sink posting the notification as JSON.
pub struct WebhookSink {
    url: String,
    headers: BTreeMap<String, String>,
    client: reqwest::Client,
}

impl WebhookSink {
    pub fn new(url: impl Into<String>, headers: BTreeMap<String, String>, client: reqwest::Client) -> Self {
        Self {
            url: url.into(),
            headers,
            client,
        }
    }
}

#[async_trait]
impl NotificationSink for WebhookSink {
    fn name(&self) -> &str {
        "webhook"
    }

    async fn send(&self, notification: &Notification) -> OrchestratorResult<()> {
        let payload = serde_json::to_value(notification)?;
        post_json(&self.client, self.name(), &self.url, &self.headers, &payload).await
    }
}

/// Email sink.
///
/// Without a relay URL the message is only logged.
pub struct EmailSink {
    recipients: Vec<String>,
    relay_url: Option<String>,
    client: reqwest::Client,
}

impl EmailSink {
    pub fn new(recipients: Vec<String>, relay_url: Option<String>, client: reqwest::Client) -> Self {
        Self {
            recipients,
            relay_url,
            client,
        }
    }
}

#[async_trait]
impl NotificationSink for EmailSink {
    fn name(&self) -> &str {
        "email"
    }

    async fn send(&self, notification: &Notification) -> OrchestratorResult<()> {
        let Some(relay_url) = &self.relay_url else {
            warn!(
                recipients = ?self.recipients,
                "no mail relay configured; email '{}' not sent",
                notification.title
            );
            return Ok(());
        };
        let payload = serde_json::json!({
            "to": self.recipients,
            "subject": notification.title,
            "body": notification.message,
        });
        post_json(&self.client, self.name(), relay_url, &BTreeMap::new(), &payload).await
    }
}

/// Fans a notification out to every sink.
#[derive(Clone, Default)]
pub struct Notifier {
    sinks: Vec<Arc<dyn NotificationSink>>,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_settings(settings: &NotificationSettings) -> OrchestratorResult<Self> {
        Self::from_channels(&settings.channels, settings.timeout())
    }

    /// Build sinks for the configured channels, sharing one HTTP client
    /// whose requests give up after `timeout`.
    pub fn from_channels(channels: &[NotificationChannel], timeout: Duration) -> OrchestratorResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("design-review/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;
        let sinks = channels
            .iter()
            .map(|channel| -> Arc<dyn NotificationSink> {
                match channel {
                    NotificationChannel::Email {
                        recipients,
                        relay_url,
                    } => Arc::new(EmailSink::new(recipients.clone(), relay_url.clone(), client.clone())),
                    NotificationChannel::Slack {
                        channel,
                        webhook_url,
                    } => Arc::new(SlackSink::new(channel, webhook_url, client.clone())),
                    NotificationChannel::Webhook { url, headers } => {
                        Arc::new(WebhookSink::new(url, headers.clone(), client.clone()))
                    }
                }
            })
            .collect();
        Ok(Self { sinks })
    }

    pub fn with_sink(mut self, sink: Arc<dyn NotificationSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    /// Send to all sinks concurrently. Returns the number of successful
    /// deliveries; failures are logged.
    pub async fn notify(&self, notification: &Notification) -> usize {
        let outcomes = join_all(self.sinks.iter().map(|sink| async move {
            (sink.name().to_string(), sink.send(notification).await)
        }))
        .await;

        outcomes
            .into_iter()
            .filter(|(name, outcome)| match outcome {
                Ok(()) => true,
                Err(e) => {
                    obs::emit_notification_failed(name, e);
                    false
                }
            })
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct RecordingSink {
        fail: bool,
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl NotificationSink for RecordingSink {
        fn name(&self) -> &str {
            "recording"
        }

        async fn send(&self, notification: &Notification) -> OrchestratorResult<()> {
            self.seen.lock().unwrap().push(notification.title.clone());
            if self.fail {
                Err(OrchestratorError::notification("recording", "boom"))
            } else {
                Ok(())
            }
        }
    }

    fn notification() -> Notification {
        Notification {
            run_id: "run-1".to_string(),
            status: OverallStatus::Failed,
            title: "Design review failed".to_string(),
            message: "2 of 3 pages failed".to_string(),
            details: serde_json::json!({}),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_channel_json_shapes() {
        let channels: Vec<NotificationChannel> = serde_json::from_str(
            r##"[
                {"type": "email", "recipients": ["a@example.com"]},
                {"type": "slack", "channel": "#design", "webhook_url": "https://hooks.test/x"},
                {"type": "webhook", "url": "https://ci.test/hook", "headers": {"X-Token": "t"}}
            ]"##,
        )
        .expect("parse");
        assert!(matches!(&channels[0], NotificationChannel::Email { relay_url: None, .. }));
        assert!(matches!(&channels[2], NotificationChannel::Webhook { headers, .. } if headers.len() == 1));

        let notifier = Notifier::from_channels(&channels, Duration::from_secs(10)).expect("notifier");
        assert_eq!(notifier.sinks.len(), 3);
    }

    #[test]
    fn test_slack_payload_color() {
        let sink = SlackSink::new("#design", "https://hooks.test/x", reqwest::Client::new());
        let payload = sink.payload(&notification());
        assert_eq!(payload["channel"], "#design");
        assert_eq!(payload["attachments"][0]["color"], "danger");
    }

    #[tokio::test]
    async fn test_failing_sink_does_not_stop_others() {
        let ok = Arc::new(RecordingSink {
            fail: false,
            seen: Mutex::new(vec![]),
        });
        let bad = Arc::new(RecordingSink {
            fail: true,
            seen: Mutex::new(vec![]),
        });
        let notifier = Notifier::new().with_sink(bad.clone()).with_sink(ok.clone());
        let delivered = notifier.notify(&notification()).await;
        assert_eq!(delivered, 1);
        assert_eq!(ok.seen.lock().unwrap().len(), 1);
        assert_eq!(bad.seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_email_without_relay_only_logs() {
        let sink = EmailSink::new(vec!["a@example.com".to_string()], None, reqwest::Client::new());
        sink.send(&notification()).await.expect("logged");
    }

    #[tokio::test]
    async fn test_unresponsive_webhook_times_out() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        let server = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let settings = NotificationSettings {
            channels: vec![NotificationChannel::Webhook {
                url: format!("http://{addr}/hook"),
                headers: BTreeMap::new(),
            }],
            timeout_secs: 1,
            ..NotificationSettings::default()
        };
        let notifier = Notifier::from_settings(&settings).expect("notifier");

        let delivered = tokio::time::timeout(Duration::from_secs(5), notifier.notify(&notification()))
            .await
            .expect("delivery gives up before the outer deadline");
        assert_eq!(delivered, 0);
        server.abort();
    }
}
