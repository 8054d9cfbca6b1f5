use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::AlertError;
use crate::feed::PriceFeed;

#[derive(Clone)]
pub struct FinnhubClient {
    http: Client,
    api_key: String,
}

impl FinnhubClient {
    pub fn new(api_key: String) -> Self {
        Self {
            http: Client::new(),
            api_key,
        }
    }

    pub fn has_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    pub async fn quote(&self, symbol: &str) -> Result<QuoteResponse, AlertError> {
        if !self.has_key() {
            return Err(AlertError::FeedUnavailable {
                reason: "FINNHUB_API_KEY is missing in .env".to_string(),
            });
        }

        let url = "https://finnhub.io/api/v1/quote";
        let res = self
            .http
            .get(url)
            .query(&[("symbol", symbol), ("token", &self.api_key)])
            .send()
            .await
            .map_err(feed_err)?;

        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(AlertError::FeedUnavailable {
                reason: format!("Finnhub quote failed: {status} {body}"),
            });
        }

        res.json::<QuoteResponse>().await.map_err(feed_err)
    }
}

fn feed_err(e: reqwest::Error) -> AlertError {
    AlertError::FeedUnavailable {
        reason: e.to_string(),
    }
}

#[async_trait]
impl PriceFeed for FinnhubClient {
    async fn latest_price(&self, code: &str) -> Result<Option<f64>, AlertError> {
        let quote = self.quote(code).await?;

        // Finnhub reports 0.0 for symbols it does not know; treat that and
        // any non-finite value as "no data" rather than a price.
        let price = quote.c;
        if !price.is_finite() || price <= 0.0 {
            return Ok(None);
        }
        Ok(Some(price))
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct QuoteResponse {
    // current
    pub c: f64,
    // change; null for symbols Finnhub does not know
    pub d: Option<f64>,
    // percent change
    pub dp: Option<f64>,
    // high
    pub h: f64,
    // low
    pub l: f64,
    // open
    pub o: f64,
    // previous close
    pub pc: f64,
    // timestamp
    pub t: i64,
}
