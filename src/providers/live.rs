use super::util::with_retry;
use crate::core::asset::AssetSymbol;
use crate::core::provider::RateProvider;
use crate::core::rates::Quote;
use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, error, instrument};

/// Quotes from a CoinMarketCap-compatible `quotes/latest` endpoint.
pub struct LiveProvider {
    base_url: String,
    api_key: Option<String>,
    currency: String,
    client: reqwest::Client,
    retries: usize,
    retry_delay_ms: u64,
}

impl LiveProvider {
    pub fn new(base_url: &str, api_key: Option<String>, currency: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("coinyield/0.1")
            .timeout(Duration::from_secs(10))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(LiveProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            currency: currency.to_uppercase(),
            client,
            retries: 2,
            retry_delay_ms: 250,
        })
    }

    pub fn with_retry_policy(mut self, retries: usize, delay_ms: u64) -> Self {
        self.retries = retries;
        self.retry_delay_ms = delay_ms;
        self
    }
}

#[derive(Debug, Deserialize)]
struct QuotesResponse {
    data: HashMap<String, CoinEntry>,
}

#[derive(Debug, Deserialize)]
struct CoinEntry {
    quote: HashMap<String, CoinQuote>,
}

#[derive(Debug, Deserialize)]
struct CoinQuote {
    price: f64,
    percent_change_24h: Option<f64>,
}

fn to_decimal(value: f64, what: &str) -> Result<Decimal> {
    Decimal::from_f64(value).ok_or_else(|| anyhow!("Invalid {what}: {value}"))
}

#[async_trait]
impl RateProvider for LiveProvider {
    fn name(&self) -> &str {
        "live"
    }

    #[instrument(
        name = "LiveRatesFetch",
        skip(self, symbols),
        fields(count = symbols.len(), currency = %self.currency)
    )]
    async fn fetch_rates(&self, symbols: &[AssetSymbol]) -> Result<HashMap<AssetSymbol, Quote>> {
        let list = symbols
            .iter()
            .map(AssetSymbol::code)
            .collect::<Vec<_>>()
            .join(",");
        let url = format!(
            "{}/v1/cryptocurrency/quotes/latest?symbol={}&convert={}",
            self.base_url, list, self.currency
        );
        debug!("Requesting rates from {}", url);

        let response = with_retry(
            || async {
                let mut request = self.client.get(&url);
                if let Some(key) = &self.api_key {
                    request = request.header("X-CMC_PRO_API_KEY", key);
                }
                request.send().await?.error_for_status()
            },
            self.retries,
            self.retry_delay_ms,
        )
        .await
        .context("Rate request failed")?;

        let response_text = response
            .text()
            .await
            .context("Failed to get response text")?;

        let data: QuotesResponse = match serde_json::from_str(&response_text) {
            Ok(data) => data,
            Err(e) => {
                error!(
                    error = ?e,
                    response = %response_text,
                    "Failed to parse rates response"
                );
                return Err(e).context("Failed to parse rates response");
            }
        };

        let mut quotes = HashMap::with_capacity(symbols.len());
        for symbol in symbols {
            let Some(coin_quote) = data
                .data
                .get(symbol.code())
                .and_then(|entry| entry.quote.get(&self.currency))
            else {
                bail!("No {} quote for {}", self.currency, symbol);
            };

            let price = to_decimal(coin_quote.price, "price")?;
            if price <= Decimal::ZERO {
                bail!("Non-positive price {} for {}", price, symbol);
            }
            let change_24h = coin_quote
                .percent_change_24h
                .map_or(Ok(Decimal::ZERO), |c| to_decimal(c, "24h change"))?;

            quotes.insert(*symbol, Quote { price, change_24h });
        }

        Ok(quotes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const QUOTES_PATH: &str = "/v1/cryptocurrency/quotes/latest";

    const MOCK_JSON: &str = r#"{
        "status": {"error_code": 0},
        "data": {
            "BTC": {"symbol": "BTC", "quote": {"USD": {"price": 43250.75, "percent_change_24h": 2.5}}},
            "ETH": {"symbol": "ETH", "quote": {"USD": {"price": 2650.5, "percent_change_24h": -1.25}}},
            "USDT": {"symbol": "USDT", "quote": {"USD": {"price": 1.0, "percent_change_24h": 0.0}}},
            "USDC": {"symbol": "USDC", "quote": {"USD": {"price": 1.0, "percent_change_24h": null}}}
        }
    }"#;

    async fn create_mock_server(status: u16, body: &str) -> MockServer {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(QUOTES_PATH))
            .and(query_param("symbol", "BTC,ETH,USDT,USDC"))
            .and(query_param("convert", "USD"))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&mock_server)
            .await;

        mock_server
    }

    #[tokio::test]
    async fn test_successful_rates_fetch() {
        let mock_server = create_mock_server(200, MOCK_JSON).await;
        let provider = LiveProvider::new(&mock_server.uri(), None, "usd").unwrap();

        let quotes = provider.fetch_rates(&AssetSymbol::ALL).await.unwrap();

        assert_eq!(quotes.len(), 4);
        assert_eq!(quotes[&AssetSymbol::Btc].price, dec!(43250.75));
        assert_eq!(quotes[&AssetSymbol::Eth].change_24h, dec!(-1.25));
        assert_eq!(quotes[&AssetSymbol::Usdc].change_24h, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_sends_api_key() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(QUOTES_PATH))
            .and(header("X-CMC_PRO_API_KEY", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_string(MOCK_JSON))
            .expect(1)
            .mount(&mock_server)
            .await;

        let provider =
            LiveProvider::new(&mock_server.uri(), Some("test-key".to_string()), "USD").unwrap();
        assert!(provider.fetch_rates(&AssetSymbol::ALL).await.is_ok());
    }

    #[tokio::test]
    async fn test_partial_response_is_an_error() {
        let partial = r#"{"data": {"BTC": {"quote": {"USD": {"price": 43250.75}}}}}"#;
        let mock_server = create_mock_server(200, partial).await;
        let provider = LiveProvider::new(&mock_server.uri(), None, "USD").unwrap();

        let err = provider.fetch_rates(&AssetSymbol::ALL).await.unwrap_err();
        assert!(err.to_string().contains("ETH"), "{err}");
    }

    #[tokio::test]
    async fn test_http_error_after_retries() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(QUOTES_PATH))
            .respond_with(ResponseTemplate::new(503))
            .expect(3)
            .mount(&mock_server)
            .await;

        let provider = LiveProvider::new(&mock_server.uri(), None, "USD")
            .unwrap()
            .with_retry_policy(2, 1);
        assert!(provider.fetch_rates(&AssetSymbol::ALL).await.is_err());
    }

    #[tokio::test]
    async fn test_malformed_json() {
        let mock_server = create_mock_server(200, "not json").await;
        let provider = LiveProvider::new(&mock_server.uri(), None, "USD").unwrap();

        assert!(provider.fetch_rates(&AssetSymbol::ALL).await.is_err());
    }
}
