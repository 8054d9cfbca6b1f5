use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// Condition kind. Each variant owns its comparison rule, so adding a kind
/// forces every match over `AlertKind` to be extended before it compiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    Above,
    Below,
}

impl AlertKind {
    /// Whether `current_price` satisfies this condition against
    /// `target_price`. Both comparisons are inclusive: a price sitting
    /// exactly on the target counts as met.
    pub fn is_met(self, target_price: f64, current_price: f64) -> bool {
        match self {
            AlertKind::Above => current_price >= target_price,
            AlertKind::Below => current_price <= target_price,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AlertKind::Above => "above",
            AlertKind::Below => "below",
        }
    }
}

/// Exactly one of these holds for any persisted alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertState {
    /// Enabled and awaiting a satisfying price.
    Active,
    /// Disabled before ever triggering; no scan evaluates it.
    Suspended,
    /// Triggered at least once since it was last armed.
    Historical,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    #[serde(rename = "_id")]
    pub id: ObjectId,

    /// Stable security key, uppercased on the way in.
    pub code: String,
    /// Display name; may go stale, never used as a key.
    pub name: String,

    pub kind: AlertKind,
    pub target_price: f64,

    pub enabled: bool,
    pub note: Option<String>,

    pub created_at: i64,

    /// Set together with `triggered_at` by the trigger transition, cleared
    /// together by a re-arm. Never mutated outside those two transitions.
    pub triggered_price: Option<f64>,
    pub triggered_at: Option<i64>,
}

impl Alert {
    pub fn state(&self) -> AlertState {
        if self.triggered_at.is_some() {
            AlertState::Historical
        } else if self.enabled {
            AlertState::Active
        } else {
            AlertState::Suspended
        }
    }
}
