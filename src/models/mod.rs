pub mod alert;
pub mod event;

pub use alert::{Alert, AlertKind, AlertState};
pub use event::TriggerEvent;
