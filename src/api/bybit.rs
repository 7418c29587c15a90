use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use uuid::Uuid;

use super::auth::RequestSigner;
use super::{Exchange, KlineRequest};
use crate::config::ExchangeConfig;
use crate::error::ApiError;
use crate::models::{Bar, Order, OrderAck};

/// Largest page the kline endpoint returns
pub const MAX_KLINE_LIMIT: usize = 1000;

/// Client for the Bybit v5 REST API (one symbol category, e.g. `linear`)
#[derive(Clone)]
pub struct BybitClient {
    client: Client,
    base_url: String,
    category: String,
    signer: RequestSigner,
}

// ============== Response Types ==============

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Envelope {
    ret_code: i64,
    #[serde(default)]
    ret_msg: String,
    #[serde(default)]
    result: serde_json::Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServerTime {
    time_second: String,
}

#[derive(Debug, Deserialize)]
struct KlineResult {
    list: Option<Vec<Vec<String>>>,
}

#[derive(Debug, Deserialize)]
struct PositionResult {
    list: Vec<PositionEntry>,
}

#[derive(Debug, Deserialize)]
struct PositionEntry {
    symbol: String,
    side: String,
    size: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateOrderResult {
    order_id: String,
    order_link_id: String,
}

// ============== Implementation ==============

impl BybitClient {
    pub fn new(config: &ExchangeConfig) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            category: config.category.clone(),
            signer: RequestSigner::new(
                config.api_key.clone(),
                config.api_secret.clone(),
                config.recv_window_ms,
            ),
        })
    }

    pub fn has_credentials(&self) -> bool {
        self.signer.has_credentials()
    }

    fn url(&self, path: &str, query: &str) -> String {
        if query.is_empty() {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}{}?{}", self.base_url, path, query)
        }
    }

    fn sign(&self, request: RequestBuilder, payload: &str) -> RequestBuilder {
        let timestamp_ms = Utc::now().timestamp_millis();
        self.signer
            .headers(timestamp_ms, payload)
            .into_iter()
            .fold(request, |req, (name, value)| req.header(name, value))
    }

    async fn get_public<T: DeserializeOwned>(&self, path: &str, query: &str) -> Result<T, ApiError> {
        let response = self.client.get(self.url(path, query)).send().await?;
        Self::read_result(response).await
    }

    async fn get_signed<T: DeserializeOwned>(&self, path: &str, query: &str) -> Result<T, ApiError> {
        let request = self.sign(self.client.get(self.url(path, query)), query);
        let response = request.send().await?;
        Self::read_result(response).await
    }

    async fn post_signed<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<T, ApiError> {
        let body = body.to_string();
        let request = self
            .client
            .post(self.url(path, ""))
            .header(CONTENT_TYPE, "application/json");
        let response = self.sign(request, &body).body(body).send().await?;
        Self::read_result(response).await
    }

    /// Unwrap the `{retCode, retMsg, result}` envelope
    async fn read_result<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let envelope: Envelope = response
            .json()
            .await
            .map_err(|e| ApiError::Malformed(format!("invalid envelope: {}", e)))?;

        if envelope.ret_code != 0 {
            return Err(ApiError::Rejected {
                code: envelope.ret_code,
                message: envelope.ret_msg,
            });
        }

        serde_json::from_value(envelope.result)
            .map_err(|e| ApiError::Malformed(format!("unexpected result shape: {}", e)))
    }
}

/// Bybit kline interval code for a bar period in minutes
pub fn interval_code(minutes: u32) -> Result<&'static str, ApiError> {
    let code = match minutes {
        1 => "1",
        3 => "3",
        5 => "5",
        15 => "15",
        30 => "30",
        60 => "60",
        120 => "120",
        240 => "240",
        360 => "360",
        720 => "720",
        1440 => "D",
        10080 => "W",
        43200 => "M",
        other => return Err(ApiError::UnsupportedInterval(other)),
    };
    Ok(code)
}

fn parse_number(field: &str, raw: &str) -> Result<f64, ApiError> {
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(ApiError::Malformed(format!(
            "{} is not a finite number: {:?}",
            field, raw
        ))),
    }
}

/// Row layout: `[startTime, open, high, low, close, volume, turnover]`
fn parse_kline_row(row: &[String]) -> Result<Bar, ApiError> {
    if row.len() < 5 {
        return Err(ApiError::Malformed(format!(
            "kline row has {} fields, expected at least 5",
            row.len()
        )));
    }

    let start_ms: i64 = row[0]
        .parse()
        .map_err(|_| ApiError::Malformed(format!("startTime is not an integer: {:?}", row[0])))?;
    let timestamp = Utc
        .timestamp_millis_opt(start_ms)
        .single()
        .ok_or_else(|| ApiError::Malformed(format!("startTime out of range: {}", start_ms)))?;

    Ok(Bar {
        timestamp,
        open: parse_number("open", &row[1])?,
        high: parse_number("high", &row[2])?,
        low: parse_number("low", &row[3])?,
        close: parse_number("close", &row[4])?,
    })
}

#[async_trait]
impl Exchange for BybitClient {
    /// Endpoint: GET /v5/market/time
    async fn server_time(&self) -> Result<i64, ApiError> {
        let time: ServerTime = self.get_public("/v5/market/time", "").await?;
        time.time_second
            .parse()
            .map_err(|_| ApiError::Malformed(format!("timeSecond: {:?}", time.time_second)))
    }

    /// Endpoint: GET /v5/market/kline?category&symbol&interval&start&end&limit
    async fn klines(&self, request: &KlineRequest) -> Result<Vec<Bar>, ApiError> {
        let interval = interval_code(request.interval_minutes)?;
        let limit = request.limit.clamp(1, MAX_KLINE_LIMIT);
        let query = format!(
            "category={}&symbol={}&interval={}&start={}&end={}&limit={}",
            self.category, request.symbol, interval, request.start_ms, request.end_ms, limit
        );

        let result: KlineResult = self.get_public("/v5/market/kline", &query).await?;
        let rows = result
            .list
            .ok_or_else(|| ApiError::Malformed("kline response has no result list".to_string()))?;

        let bars = rows
            .iter()
            .map(|row| parse_kline_row(row))
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(
            symbol = %request.symbol,
            interval = interval,
            bars = bars.len(),
            "Fetched klines"
        );

        Ok(bars)
    }

    /// Endpoint: GET /v5/position/list?category&symbol (signed)
    async fn position_qty(&self, symbol: &str) -> Result<f64, ApiError> {
        let query = format!("category={}&symbol={}", self.category, symbol);
        let result: PositionResult = self.get_signed("/v5/position/list", &query).await?;

        let mut net = 0.0;
        for entry in result.list.iter().filter(|p| p.symbol == symbol) {
            let size = parse_number("size", &entry.size)?;
            match entry.side.as_str() {
                "Buy" => net += size,
                "Sell" => net -= size,
                // Flat positions report an empty side
                _ => {}
            }
        }

        Ok(net)
    }

    /// Endpoint: POST /v5/order/create (signed)
    async fn place_market_order(&self, order: &Order) -> Result<OrderAck, ApiError> {
        let order_link_id = Uuid::new_v4().simple().to_string();
        let body = json!({
            "category": self.category,
            "symbol": order.symbol,
            "side": order.side().as_str(),
            "orderType": "Market",
            "qty": order.size().to_string(),
            "reduceOnly": order.reduce_only(),
            "orderLinkId": order_link_id,
        });

        let result: CreateOrderResult = self.post_signed("/v5/order/create", &body).await?;

        Ok(OrderAck {
            order_id: result.order_id,
            order_link_id: result.order_link_id,
        })
    }
}
