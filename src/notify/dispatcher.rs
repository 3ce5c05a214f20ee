use std::collections::BTreeSet;
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;

use futures::stream::{self, StreamExt};

use super::sender::{ChatId, MessageSender, ResolveError};
use super::{Message, TopicGroups, TopicKey};
use crate::database::repositories::UserRepository;
use crate::database::DatabaseError;

/// Counters for one dispatch cycle
///
/// Failures are reported here and in the logs only; dispatch itself never fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub topics: usize,
    /// Topics skipped because their payload could not be built
    pub topics_failed: usize,
    pub attempted: usize,
    pub delivered: usize,
    /// Recipients skipped before sending (missing user, bad identity)
    pub unresolved: usize,
    pub send_failures: usize,
}

impl DispatchReport {
    fn merge(&mut self, other: DispatchReport) {
        self.topics += other.topics;
        self.topics_failed += other.topics_failed;
        self.attempted += other.attempted;
        self.delivered += other.delivered;
        self.unresolved += other.unresolved;
        self.send_failures += other.send_failures;
    }
}

/// Fans one payload per topic out to every reachable subscriber
pub struct NotificationDispatcher {
    users: Arc<dyn UserRepository>,
    sender: Arc<dyn MessageSender>,
    max_concurrent_topics: usize,
}

impl NotificationDispatcher {
    pub fn new(
        users: Arc<dyn UserRepository>,
        sender: Arc<dyn MessageSender>,
        max_concurrent_topics: usize,
    ) -> Self {
        Self {
            users,
            sender,
            max_concurrent_topics: max_concurrent_topics.max(1),
        }
    }

    /// Deliver each topic's payload to its recipients
    ///
    /// `fetch_payload` is invoked exactly once per topic. A failed fetch skips
    /// that topic's recipients; per-recipient resolution and send failures are
    /// logged and counted. Topics run concurrently in no particular order.
    pub async fn dispatch<F, Fut, E>(&self, groups: TopicGroups, fetch_payload: F) -> DispatchReport
    where
        F: Fn(TopicKey) -> Fut,
        Fut: Future<Output = Result<Message, E>>,
        E: Display,
    {
        if groups.is_empty() {
            return DispatchReport::default();
        }

        let report = stream::iter(groups)
            .map(|(topic, recipients)| {
                let payload = fetch_payload(topic.clone());
                self.dispatch_topic(topic, recipients, payload)
            })
            .buffer_unordered(self.max_concurrent_topics)
            .fold(DispatchReport::default(), |mut total, topic_report| async move {
                total.merge(topic_report);
                total
            })
            .await;

        tracing::info!(
            topics = report.topics,
            topics_failed = report.topics_failed,
            delivered = report.delivered,
            unresolved = report.unresolved,
            send_failures = report.send_failures,
            "📨 Notification dispatch finished"
        );

        report
    }

    async fn dispatch_topic<Fut, E>(
        &self,
        topic: TopicKey,
        recipients: BTreeSet<i64>,
        payload: Fut,
    ) -> DispatchReport
    where
        Fut: Future<Output = Result<Message, E>>,
        E: Display,
    {
        let mut report = DispatchReport {
            topics: 1,
            ..DispatchReport::default()
        };

        let message = match payload.await {
            Ok(message) => message,
            Err(e) => {
                tracing::error!(
                    topic = %topic,
                    recipients = recipients.len(),
                    "❌ Payload fetch failed, skipping topic: {}",
                    e
                );
                report.topics_failed = 1;
                return report;
            }
        };

        for user_id in recipients {
            let chat = match self.resolve(user_id).await {
                Ok(chat) => chat,
                Err(e) => {
                    tracing::warn!(topic = %topic, user_id, "Skipping recipient: {}", e);
                    report.unresolved += 1;
                    continue;
                }
            };

            report.attempted += 1;
            let sent = match &message.keyboard {
                Some(keyboard) => {
                    self.sender
                        .send_with_keyboard(chat, &message.text, keyboard)
                        .await
                }
                None => self.sender.send(chat, &message.text).await,
            };

            match sent {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    tracing::warn!(topic = %topic, user_id, "Send failed: {}", e);
                    report.send_failures += 1;
                }
            }
        }

        tracing::debug!(
            topic = %topic,
            delivered = report.delivered,
            attempted = report.attempted,
            "Topic dispatched"
        );

        report
    }

    /// Map a recipient user ID to the chat it is delivered to
    async fn resolve(&self, user_id: i64) -> Result<ChatId, ResolveError> {
        let users = Arc::clone(&self.users);
        let user = tokio::task::spawn_blocking(move || users.get_by_id(user_id))
            .await
            .map_err(|e| DatabaseError::QueryError(format!("user lookup task failed: {}", e)))??
            .ok_or(ResolveError::UserNotFound(user_id))?;

        if !user.status {
            return Err(ResolveError::Disabled(user_id));
        }

        user.delivery_identity().parse()
    }
}
