//! The notification sink used by the recruitment workflows.

use std::sync::Arc;

use chrono::Utc;
use squadhq_db::models::notification::NewNotification;
use squadhq_db::repositories::NotificationRepo;
use squadhq_db::DbPool;

use crate::bus::{EventBus, PlatformEvent};

/// Persists notifications and fans them out on the event bus.
///
/// Workflows call [`Notifier::notify`] strictly AFTER their transaction
/// has committed. Emission is best-effort: a failed insert is logged and
/// swallowed so a notification hiccup can never roll back or fail the
/// state change that triggered it.
pub struct Notifier {
    pool: DbPool,
    bus: Arc<EventBus>,
}

impl Notifier {
    /// Create a notifier over the given pool and bus.
    pub fn new(pool: DbPool, bus: Arc<EventBus>) -> Self {
        Self { pool, bus }
    }

    /// Persist one notification and publish the matching platform event.
    pub async fn notify(&self, input: NewNotification) {
        let kind = input.kind;
        match NotificationRepo::insert(&self.pool, &input, Utc::now()).await {
            Ok(row) => {
                let event = PlatformEvent::new(kind.as_str())
                    .with_source("notification", row.id)
                    .with_payload(serde_json::json!({
                        "user_id": row.user_id,
                        "title": row.title,
                        "squad_id": row.squad_id,
                        "position_id": row.position_id,
                        "application_id": row.application_id,
                    }));
                self.bus.publish(event);
            }
            Err(e) => {
                tracing::warn!(
                    user_id = input.user_id,
                    kind = kind.as_str(),
                    error = %e,
                    "Failed to persist notification; dropping"
                );
            }
        }
    }

    /// Persist a batch of notifications, independently best-effort.
    pub async fn notify_all(&self, inputs: impl IntoIterator<Item = NewNotification>) {
        for input in inputs {
            self.notify(input).await;
        }
    }
}
