use mongodb::bson::oid::ObjectId;
use mongodb::bson::serde_helpers::serialize_object_id_as_hex_string;
use serde::Serialize;

/// Payload emitted exactly once per Active -> Historical transition. Ephemeral:
/// fanned out to subscribers (SSE, logs) and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TriggerEvent {
    #[serde(serialize_with = "serialize_object_id_as_hex_string")]
    pub alert_id: ObjectId,
    pub code: String,
    /// The price that satisfied the condition.
    pub price: f64,
    /// Unix seconds at the moment of the transition.
    pub at: i64,
}
