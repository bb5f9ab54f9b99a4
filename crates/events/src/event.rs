use chrono::{DateTime, Utc};

/// A fact worth telling other parts of the system about.
///
/// Payloads stay plain data; routing and audit metadata live on the
/// [`EventEnvelope`](crate::EventEnvelope) that carries them. Bump `version`
/// whenever the payload shape changes.
pub trait Event: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Dotted name, `<context>.<subject>.<past-tense verb>`.
    fn event_type(&self) -> &'static str;

    fn version(&self) -> u32;

    /// Business time of the fact, not publication time.
    fn occurred_at(&self) -> DateTime<Utc>;
}
