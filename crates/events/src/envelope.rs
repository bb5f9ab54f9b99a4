use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use variantforge_core::{EntityId, UserId};

use crate::Event;

/// Envelope for an event, carrying audit + routing metadata.
///
/// This is the unit handed to an [`EventBus`](crate::EventBus).
///
/// - `subject_id` / `subject_type` name the entity the event is about.
/// - `actor` is the user on whose behalf the change happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope<E> {
    event_id: Uuid,
    event_type: String,
    event_version: u32,

    subject_id: EntityId,
    subject_type: String,
    actor: UserId,

    occurred_at: DateTime<Utc>,
    payload: E,
}

impl<E> EventEnvelope<E> {
    pub fn new(
        event_id: Uuid,
        event_type: impl Into<String>,
        event_version: u32,
        subject_id: EntityId,
        subject_type: impl Into<String>,
        actor: UserId,
        occurred_at: DateTime<Utc>,
        payload: E,
    ) -> Self {
        Self {
            event_id,
            event_type: event_type.into(),
            event_version,
            subject_id,
            subject_type: subject_type.into(),
            actor,
            occurred_at,
            payload,
        }
    }

    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn event_version(&self) -> u32 {
        self.event_version
    }

    pub fn subject_id(&self) -> EntityId {
        self.subject_id
    }

    pub fn subject_type(&self) -> &str {
        &self.subject_type
    }

    pub fn actor(&self) -> UserId {
        self.actor
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }

    pub fn payload(&self) -> &E {
        &self.payload
    }

    pub fn into_payload(self) -> E {
        self.payload
    }
}

impl<E: Event> EventEnvelope<E> {
    /// Wrap a typed event, taking type/version/time from the event itself.
    pub fn wrap(
        subject_id: EntityId,
        subject_type: impl Into<String>,
        actor: UserId,
        payload: E,
    ) -> Self {
        Self::new(
            Uuid::now_v7(),
            payload.event_type(),
            payload.version(),
            subject_id,
            subject_type,
            actor,
            payload.occurred_at(),
            payload,
        )
    }
}
