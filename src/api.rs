//! HTTP query API over a geocoded hotel file.

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Instant;

use axum::extract::rejection::JsonRejection;
use axum::extract::{ConnectInfo, Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::catalog::{CatalogError, HotelCatalog};
use crate::records::HotelRecord;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    catalog: Arc<HotelCatalog>,
    rate_limiter: Option<RateLimiter>,
}

impl AppState {
    /// State serving `catalog`, optionally rate limited.
    pub fn new(catalog: HotelCatalog, rate_limiter: Option<RateLimiter>) -> Self {
        Self {
            catalog: Arc::new(catalog),
            rate_limiter,
        }
    }
}

#[derive(Debug, Deserialize)]
struct FilterRequest {
    filter: String,
}

#[derive(Debug, Serialize)]
struct StatusBody {
    status: &'static str,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

type ApiError = (StatusCode, Json<ErrorBody>);

/// Builds the router: `GET /`, `GET /hotels`, `POST /hotel`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(status))
        .route("/hotels", get(list_hotels))
        .route("/hotel", post(find_hotel))
        .layer(middleware::from_fn_with_state(state.clone(), throttle_requests))
        .with_state(state)
}

async fn status() -> Json<StatusBody> {
    Json(StatusBody { status: "OK" })
}

async fn list_hotels(State(state): State<AppState>) -> Json<Vec<HotelRecord>> {
    Json(state.catalog.all().to_vec())
}

async fn find_hotel(
    State(state): State<AppState>,
    body: Result<Json<FilterRequest>, JsonRejection>,
) -> Result<Json<HotelRecord>, ApiError> {
    let Json(request) = body.map_err(|rejection| {
        tracing::warn!(error = %rejection.body_text(), "rejected request body");
        error_response(StatusCode::BAD_REQUEST, rejection.body_text())
    })?;
    match state.catalog.lookup(&request.filter) {
        Ok(hotel) => Ok(Json(hotel.clone())),
        Err(err @ (CatalogError::InvalidFilter(_) | CatalogError::InvalidCoordinates(_))) => {
            tracing::warn!(filter = %request.filter, error = %err, "rejected filter");
            Err(error_response(StatusCode::BAD_REQUEST, err))
        }
        Err(err @ CatalogError::NotFound(_)) => Err(error_response(StatusCode::NOT_FOUND, err)),
    }
}

async fn throttle_requests(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let user_agent = request
        .headers()
        .get(axum::http::header::USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("")
        .to_string();
    let ip = client_ip(&request);

    if let Some(limiter) = &state.rate_limiter {
        if !limiter.acquire(ip).await {
            tracing::warn!(%ip, %method, %path, %user_agent, "rate limit exceeded");
            return error_response(
                StatusCode::TOO_MANY_REQUESTS,
                "Too many requests. Please try again later.",
            )
            .into_response();
        }
    }
    tracing::info!(%ip, %method, %path, %user_agent, "incoming request");
    next.run(request).await
}

/// Client address: first `X-Forwarded-For` hop, then `X-Real-IP`, then the
/// socket peer. Requests with none of these share the unspecified address.
fn client_ip(request: &Request) -> IpAddr {
    let headers = request.headers();
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .and_then(|value| value.trim().parse::<IpAddr>().ok());
    let real_ip = || {
        headers
            .get("x-real-ip")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<IpAddr>().ok())
    };
    let peer = || {
        request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip())
    };
    forwarded
        .or_else(real_ip)
        .or_else(peer)
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}

fn error_response(status: StatusCode, message: impl ToString) -> ApiError {
    (
        status,
        Json(ErrorBody {
            error: message.to_string(),
        }),
    )
}

/// One token bucket per client address.
#[derive(Clone)]
pub struct RateLimiter {
    buckets: Arc<Mutex<HashMap<IpAddr, Bucket>>>,
    capacity: f64,
    refill_per_sec: f64,
}

struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

impl RateLimiter {
    /// Buckets refilling `max_per_second` tokens per second, each holding at most `burst`.
    ///
    /// Returns `None` (no limiting) when either value is zero.
    pub fn new(max_per_second: u32, burst: u32) -> Option<Self> {
        if max_per_second == 0 || burst == 0 {
            return None;
        }
        Some(Self {
            buckets: Arc::new(Mutex::new(HashMap::new())),
            capacity: burst as f64,
            refill_per_sec: max_per_second as f64,
        })
    }

    /// Takes one token from `ip`'s bucket, returning `false` when it is empty.
    pub async fn acquire(&self, ip: IpAddr) -> bool {
        let mut buckets = self.buckets.lock().await;
        let now = Instant::now();
        let bucket = buckets.entry(ip).or_insert(Bucket {
            tokens: self.capacity,
            last_refill: now,
        });
        let elapsed = now.duration_since(bucket.last_refill).as_secs_f64();
        bucket.last_refill = now;
        bucket.tokens = (bucket.tokens + elapsed * self.refill_per_sec).min(self.capacity);
        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request as HttpRequest};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn catalog() -> HotelCatalog {
        let hotels: Vec<HotelRecord> = serde_json::from_value(json!([
            {"name": "Royal York", "detailLink": "https://en.wikipedia.org/wiki/Royal_York",
             "locality": "Toronto", "region": "Ontario", "coordinates": "43.6455; -79.3815"},
            {"name": "Laurier", "detailLink": "https://en.wikipedia.org/wiki/Laurier",
             "locality": "Ottawa", "region": "Ontario", "coordinates": "45.4256; -75.6950",
             "address": "1 Rideau Street, Ottawa, Ontario, Canada"},
        ]))
        .unwrap();
        HotelCatalog::new(hotels)
    }

    async fn call(app: Router, request: HttpRequest<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn filter_request(filter: &str) -> HttpRequest<Body> {
        HttpRequest::builder()
            .method(Method::POST)
            .uri("/hotel")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json!({ "filter": filter }).to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn reports_status_and_lists_hotels() {
        let app = router(AppState::new(catalog(), None));
        let (status, body) = call(
            app.clone(),
            HttpRequest::get("/").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"status": "OK"}));

        let (status, body) = call(app, HttpRequest::get("/hotels").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().map(Vec::len), Some(2));
    }

    #[tokio::test]
    async fn finds_nearby_hotel_by_filter() {
        let app = router(AppState::new(catalog(), None));
        let (status, body) = call(app, filter_request("Kingston, Ontario, 44.23; -76.48")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Royal York");
    }

    #[tokio::test]
    async fn maps_filter_errors_to_status_codes() {
        let app = router(AppState::new(catalog(), None));
        let (status, _) = call(app.clone(), filter_request("Toronto only")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = call(app, filter_request("Paris, France, 48.85; 2.35")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("no hotel found"));
    }

    fn from_peer(peer: &str) -> HttpRequest<Body> {
        let mut request = HttpRequest::get("/").body(Body::empty()).unwrap();
        let addr: SocketAddr = peer.parse().unwrap();
        request.extensions_mut().insert(ConnectInfo(addr));
        request
    }

    #[tokio::test]
    async fn rejects_requests_once_the_bucket_is_empty() {
        let app = router(AppState::new(catalog(), RateLimiter::new(1, 1)));
        let (status, _) = call(app.clone(), from_peer("10.0.0.1:4000")).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = call(app, from_peer("10.0.0.1:4001")).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert!(body["error"].as_str().unwrap().contains("Too many requests"));
    }

    #[tokio::test]
    async fn each_client_gets_its_own_burst() {
        let app = router(AppState::new(catalog(), RateLimiter::new(1, 2)));
        for _ in 0..2 {
            let (status, _) = call(app.clone(), from_peer("10.0.0.1:4000")).await;
            assert_eq!(status, StatusCode::OK);
        }
        let (status, _) = call(app.clone(), from_peer("10.0.0.1:4000")).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);

        for _ in 0..2 {
            let (status, _) = call(app.clone(), from_peer("10.0.0.2:4000")).await;
            assert_eq!(status, StatusCode::OK);
        }
    }

    #[tokio::test]
    async fn forwarded_header_takes_precedence_over_peer() {
        let limiter = RateLimiter::new(1, 1);
        let app = router(AppState::new(catalog(), limiter));
        let (status, _) = call(app.clone(), from_peer("10.0.0.1:4000")).await;
        assert_eq!(status, StatusCode::OK);

        let mut proxied = from_peer("10.0.0.1:4000");
        proxied
            .headers_mut()
            .insert("x-forwarded-for", "203.0.113.9, 10.0.0.1".parse().unwrap());
        let (status, _) = call(app, proxied).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn malformed_body_is_a_bad_request_with_json_error() {
        let app = router(AppState::new(catalog(), None));
        let request = HttpRequest::builder()
            .method(Method::POST)
            .uri("/hotel")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{\"filter\": "))
            .unwrap();
        let (status, body) = call(app.clone(), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());

        let missing_type = HttpRequest::builder()
            .method(Method::POST)
            .uri("/hotel")
            .body(Body::from(json!({"filter": "a, b, 1; 2"}).to_string()))
            .unwrap();
        let (status, _) = call(app, missing_type).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
