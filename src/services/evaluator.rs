//! Pure condition evaluation. No store reads, no enablement re-check: the
//! scan loop is responsible for only feeding it alerts that should be
//! evaluated. Identical inputs always produce identical output.

use crate::models::Alert;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Evaluation {
    Met,
    NotMet,
    /// No usable price; the caller must not transition the alert.
    Indeterminate,
}

pub fn evaluate(alert: &Alert, current_price: Option<f64>) -> Evaluation {
    let Some(price) = current_price else {
        return Evaluation::Indeterminate;
    };
    // Quotes that arrive as NaN/inf are missing data, not a price.
    if !price.is_finite() {
        return Evaluation::Indeterminate;
    }

    if alert.kind.is_met(alert.target_price, price) {
        Evaluation::Met
    } else {
        Evaluation::NotMet
    }
}
