use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::event::Event;

/// Envelope for a domain event: the common header every event carries plus
/// the variant-specific payload.
///
/// This is the unit handed to an event publisher. The header is derived from
/// the payload at construction time, so it can never disagree with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope<E> {
    event_id: Uuid,
    occurred_at: DateTime<Utc>,

    aggregate_id: i64,
    aggregate_type: String,

    event_type: String,
    event_version: u32,

    payload: E,
}

impl<E: Event> EventEnvelope<E> {
    /// Wrap a payload with a fresh time-ordered event id.
    pub fn new(aggregate_type: impl Into<String>, payload: E) -> Self {
        Self::with_id(Uuid::now_v7(), aggregate_type, payload)
    }

    pub fn with_id(event_id: Uuid, aggregate_type: impl Into<String>, payload: E) -> Self {
        Self {
            event_id,
            occurred_at: payload.occurred_at(),
            aggregate_id: payload.aggregate_id(),
            aggregate_type: aggregate_type.into(),
            event_type: payload.event_type().to_string(),
            event_version: payload.version(),
            payload,
        }
    }
}

impl<E> EventEnvelope<E> {
    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }

    pub fn aggregate_id(&self) -> i64 {
        self.aggregate_id
    }

    pub fn aggregate_type(&self) -> &str {
        &self.aggregate_type
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn event_version(&self) -> u32 {
        self.event_version
    }

    pub fn payload(&self) -> &E {
        &self.payload
    }

    pub fn into_payload(self) -> E {
        self.payload
    }
}

impl<E: Serialize> EventEnvelope<E> {
    /// Type-erase the payload (e.g. before handing it to a broker).
    pub fn to_json(&self) -> Result<EventEnvelope<serde_json::Value>, serde_json::Error> {
        Ok(EventEnvelope {
            event_id: self.event_id,
            occurred_at: self.occurred_at,
            aggregate_id: self.aggregate_id,
            aggregate_type: self.aggregate_type.clone(),
            event_type: self.event_type.clone(),
            event_version: self.event_version,
            payload: serde_json::to_value(&self.payload)?,
        })
    }
}
