use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{Local, Utc};
use serde::de::DeserializeOwned;

use super::error::WebError;
use super::state::AppState;
use crate::charts::binance::{DEFAULT_LIMIT, DEFAULT_QUOTE_ASSET};
use crate::charts::{BinanceClient, CandleQuery};
use crate::error::FetchError;
use crate::output::export::records_to_csv;
use crate::pipeline::{self, PipelineRequest};
use crate::types::*;
use crate::log_info;

/// Build the API sub-router.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health))
        .route("/api/symbols", get(symbols))
        .route("/api/fetch", post(fetch))
        .route("/api/export/json", post(export_json))
        .route("/api/export/csv", post(export_csv))
}

/// Parse a JSON body; an empty body is the type's default.
fn parse_body<T: DeserializeOwned + Default>(body: &Bytes) -> Result<T, WebError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| WebError(FetchError::invalid_input(format!("Invalid JSON body: {}", e))))
}

fn attachment(content_type: &'static str, filename: String, body: String) -> Response {
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{}\"", filename)),
        ],
        body,
    )
        .into_response()
}

fn stamped(prefix: &str, ext: &str) -> String {
    format!("{}_{}.{}", prefix, Local::now().format("%Y%m%d_%H%M%S"), ext)
}

/// GET /health
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

/// GET /api/symbols?limit=N: USDT-quoted trading pairs
async fn symbols(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SymbolsQuery>,
) -> Result<Json<SymbolsResponse>, WebError> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT as usize);
    let base_url = state.config.binance_url.clone();

    let symbols = tokio::task::spawn_blocking(move || {
        BinanceClient::new(&base_url)?.fetch_symbols(DEFAULT_QUOTE_ASSET, limit)
    })
    .await??;

    Ok(Json(SymbolsResponse { success: true, symbols }))
}

/// POST /api/fetch: Binance klines, 24h stats and last trade price for one symbol
async fn fetch(State(state): State<Arc<AppState>>, body: Bytes) -> Result<Json<FetchResponse>, WebError> {
    let request: FetchRequest = parse_body(&body)?;
    let symbol = request.symbol()?;
    let interval = request.interval();
    let limit = request.limit()?;

    log_info!("web", "Fetch requested", symbol = symbol, interval = interval, limit = limit);

    let base_url = state.config.binance_url.clone();
    let query = CandleQuery {
        interval: Some(interval.clone()),
        limit: Some(limit),
        ..CandleQuery::default()
    };
    let report = tokio::task::spawn_blocking(move || {
        let client = BinanceClient::new(&base_url)?;
        let mut report = pipeline::run(&client, &PipelineRequest::new(symbol, query))?;
        // Headline price is the last trade, not the 24h window's lastPrice
        report.summary.current_price = client.fetch_price(&report.identifier)?;
        Ok::<_, FetchError>(report)
    })
    .await??;

    Ok(Json(FetchResponse::from_report(&report, &interval)))
}

/// POST /api/export/json: echo the payload back as a download
async fn export_json(body: Bytes) -> Result<Response, WebError> {
    let request: ExportRequest = parse_body(&body)?;
    let data = request.data()?;
    let text = serde_json::to_string_pretty(data)?;
    Ok(attachment("application/json", stamped("tradingview_data", "json"), text))
}

/// POST /api/export/csv: list of row objects as a CSV download
async fn export_csv(body: Bytes) -> Result<Response, WebError> {
    let request: ExportRequest = parse_body(&body)?;
    let records = request
        .data()?
        .as_array()
        .ok_or_else(|| FetchError::invalid_input("Export data must be a list of objects"))?;
    let text = records_to_csv(records)?;
    Ok(attachment("text/csv", stamped("ohlc_data", "csv"), text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::utils::test_server::{route, TestServer};
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn binance_routes(price_status: u16, price_body: &str) -> Vec<crate::utils::test_server::Route> {
        vec![
            route(
                "/klines",
                200,
                json!([
                    [1704067200000i64, "42000.10", "42100.00", "41950.50", "42050.00", "12.5",
                     1704067499999i64, "525625.00", 340, "6.1", "256500.00", "0"]
                ])
                .to_string(),
            ),
            route(
                "/ticker/24hr",
                200,
                json!({
                    "lastPrice": "42050.00",
                    "priceChange": "50.00",
                    "priceChangePercent": "0.119",
                    "highPrice": "42100.00",
                    "lowPrice": "41950.50",
                    "volume": "12.5",
                    "quoteVolume": "525625.00",
                    "count": 340
                })
                .to_string(),
            ),
            route("/ticker/price", price_status, price_body.to_string()),
        ]
    }

    async fn post_fetch(base_url: &str) -> (StatusCode, Value) {
        let config = AppConfig {
            binance_url: base_url.to_string(),
            ..AppConfig::default()
        };
        let request = Request::builder()
            .method("POST")
            .uri("/api/fetch")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json!({"symbol": "btcusdt", "interval": "5m", "limit": 1}).to_string()))
            .unwrap();

        let response = crate::web::app(config).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_fetch_headline_price_is_last_trade() {
        let server = TestServer::start(binance_routes(200, r#"{"symbol":"BTCUSDT","price":"42061.37"}"#));

        let (status, body) = post_fetch(&server.base_url).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["symbol"], "BTCUSDT");
        assert_eq!(body["summary"]["current_price"], 42061.37);
        assert_eq!(body["summary"]["high_24h"], 42100.0);
        assert!(server.was_hit("/ticker/price"));
    }

    #[tokio::test]
    async fn test_fetch_reports_price_failure() {
        let server = TestServer::start(binance_routes(503, "price down"));

        let (status, body) = post_fetch(&server.base_url).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Failed to fetch current price: 503 - price down");
    }

    #[test]
    fn test_parse_body_empty_is_default() {
        let req: FetchRequest = parse_body(&Bytes::from_static(b"  ")).unwrap();
        assert!(req.symbol.is_none());
        assert!(parse_body::<FetchRequest>(&Bytes::from_static(b"{nope")).is_err());
    }

    #[test]
    fn test_stamped_filename() {
        let name = stamped("ohlc_data", "csv");
        assert!(name.starts_with("ohlc_data_"));
        assert!(name.ends_with(".csv"));
        // ohlc_data_YYYYmmdd_HHMMSS.csv
        assert_eq!(name.len(), "ohlc_data_".len() + 15 + ".csv".len());
    }
}
