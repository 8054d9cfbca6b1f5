pub mod finnhub;

use async_trait::async_trait;

use crate::error::AlertError;

/// Latest-price source for tracked securities.
#[async_trait]
pub trait PriceFeed: Send + Sync {
    /// `Ok(Some(price))` when the feed has a usable quote, `Ok(None)` when
    /// it is reachable but has no data for `code` (unknown symbol, market
    /// never traded it, quote not yet populated), `Err(FeedUnavailable)`
    /// when the feed itself cannot be reached.
    async fn latest_price(&self, code: &str) -> Result<Option<f64>, AlertError>;
}
