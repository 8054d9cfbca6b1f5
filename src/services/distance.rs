//! Signed distance between a quote and an alert's target.

use crate::models::Alert;

/// Percent distance from `alert.target_price` to `current_price`, signed.
/// Positive means the quote sits above the target. Creation validates the
/// target, so a non-positive one here is a bug upstream; panic rather than
/// hand back NaN dressed up as a number.
pub fn percent_distance(alert: &Alert, current_price: f64) -> f64 {
    assert!(
        alert.target_price > 0.0,
        "alert {} has non-positive target_price {}",
        alert.id,
        alert.target_price
    );
    (current_price - alert.target_price) / alert.target_price * 100.0
}
