//! Server event types, envelope and event bus.
//!
//! Intake, deletion, violation recording and login lockouts are published on
//! a single broadcast channel. Consumers (audit sinks, the HTTP layer, tests)
//! subscribe independently; a subscription ends when its receiver is dropped.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::models::{DocumentCategory, Severity, ViolationType};

/// Versioned wrapper around a [`ServerEvent`].
#[derive(Debug, Clone, Serialize)]
pub struct EventEnvelope {
    /// UUIDv7, so envelopes sort by emission time.
    pub event_id: Uuid,
    /// Dot-namespaced type, e.g. `"document.ingested"`.
    pub event_type: String,
    pub occurred_at: DateTime<Utc>,
    /// Actor the event is attributed to, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
    pub payload_version: u32,
    pub payload: ServerEvent,
}

impl EventEnvelope {
    pub fn new(event: ServerEvent) -> Self {
        Self {
            event_id: Uuid::now_v7(),
            event_type: event.namespaced_event_type().to_string(),
            occurred_at: Utc::now(),
            actor_id: event.actor_id().map(String::from),
            entity_id: event.entity_id(),
            payload_version: 1,
            payload: event,
        }
    }
}

/// Domain events, serialized with a `type` tag.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    /// A document passed screening and was persisted.
    DocumentIngested {
        document_id: Uuid,
        owner_id: String,
        category: DocumentCategory,
        confidence: f64,
    },
    /// A document and its blob were removed.
    DocumentDeleted { document_id: Uuid, owner_id: String },
    /// A policy breach was appended to the violation log.
    ViolationRecorded {
        violation_id: Uuid,
        violation_type: ViolationType,
        severity: Severity,
        #[serde(skip_serializing_if = "Option::is_none")]
        actor_id: Option<String>,
    },
    /// An identifier crossed the failure threshold.
    LoginLocked {
        identifier: String,
        lockout_until: DateTime<Utc>,
    },
}

impl ServerEvent {
    pub fn namespaced_event_type(&self) -> &'static str {
        match self {
            Self::DocumentIngested { .. } => "document.ingested",
            Self::DocumentDeleted { .. } => "document.deleted",
            Self::ViolationRecorded { .. } => "violation.recorded",
            Self::LoginLocked { .. } => "login.locked",
        }
    }

    fn actor_id(&self) -> Option<&str> {
        match self {
            Self::DocumentIngested { owner_id, .. } | Self::DocumentDeleted { owner_id, .. } => {
                Some(owner_id)
            }
            Self::ViolationRecorded { actor_id, .. } => actor_id.as_deref(),
            Self::LoginLocked { identifier, .. } => Some(identifier),
        }
    }

    fn entity_id(&self) -> Option<String> {
        match self {
            Self::DocumentIngested { document_id, .. }
            | Self::DocumentDeleted { document_id, .. } => Some(document_id.to_string()),
            Self::ViolationRecorded { violation_id, .. } => Some(violation_id.to_string()),
            Self::LoginLocked { .. } => None,
        }
    }
}

/// Fan-out bus over a tokio broadcast channel.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<EventEnvelope>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(crate::defaults::EVENT_BUS_CAPACITY)
    }
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Emit an event to all subscribers. Dropped silently when nobody listens.
    pub fn emit(&self, event: ServerEvent) {
        let envelope = EventEnvelope::new(event);
        let subscriber_count = self.tx.receiver_count();
        tracing::debug!(
            event_type = %envelope.event_type,
            event_id = %envelope.event_id,
            subscriber_count,
            "EventBus emit"
        );
        let _ = self.tx.send(envelope);
    }

    /// Each subscriber gets its own independent stream.
    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_event_bus_emit_subscribe() {
        let bus = EventBus::new(32);
        let mut rx = bus.subscribe();

        bus.emit(ServerEvent::DocumentIngested {
            document_id: Uuid::nil(),
            owner_id: "alice".to_string(),
            category: DocumentCategory::Financial,
            confidence: 0.8,
        });

        let envelope = rx.recv().await.unwrap();
        assert!(matches!(
            envelope.payload,
            ServerEvent::DocumentIngested { .. }
        ));
        assert_eq!(envelope.event_type, "document.ingested");
        assert_eq!(envelope.payload_version, 1);
        assert_eq!(envelope.actor_id.as_deref(), Some("alice"));
        assert_eq!(envelope.entity_id, Some(Uuid::nil().to_string()));
    }

    #[tokio::test]
    async fn test_event_bus_multiple_subscribers() {
        let bus = EventBus::new(32);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.emit(ServerEvent::LoginLocked {
            identifier: "bob".to_string(),
            lockout_until: Utc::now(),
        });

        let e1 = rx1.recv().await.unwrap();
        let e2 = rx2.recv().await.unwrap();
        assert_eq!(e1.event_type, "login.locked");
        assert_eq!(e2.event_type, "login.locked");
        assert!(e1.entity_id.is_none());
    }

    #[tokio::test]
    async fn test_event_bus_no_subscribers_ok() {
        let bus = EventBus::new(32);
        bus.emit(ServerEvent::DocumentDeleted {
            document_id: Uuid::nil(),
            owner_id: "alice".to_string(),
        });
    }

    #[tokio::test]
    async fn test_event_bus_subscriber_count() {
        let bus = EventBus::new(32);
        assert_eq!(bus.subscriber_count(), 0);

        let rx1 = bus.subscribe();
        let _rx2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        drop(rx1);
        assert_eq!(bus.subscriber_count(), 1);
    }

    #[test]
    fn test_server_event_json_serialization() {
        let event = ServerEvent::ViolationRecorded {
            violation_id: Uuid::nil(),
            violation_type: ViolationType::RateLimit,
            severity: Severity::Medium,
            actor_id: None,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""type":"ViolationRecorded""#));
        assert!(json.contains(r#""violation_type":"rate_limit""#));
        assert!(json.contains(r#""severity":"medium""#));
        assert!(!json.contains("actor_id"));
    }
}
