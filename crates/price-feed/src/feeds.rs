//! HTTP price source implementations

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use pricewatch_core::{FetchError, FetchResult, FieldPath, SourceDescriptor};

/// Base trait for price sources
#[async_trait]
pub trait PriceSource: Send + Sync {
    fn name(&self) -> &str;
    async fn fetch_price(&self) -> FetchResult<f64>;
}

/// Build the HTTP client shared by all sources of a reconciler
pub fn build_http_client(timeout: Duration) -> anyhow::Result<Client> {
    let client = Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout)
        .build()?;
    Ok(client)
}

/// Source that issues one GET and reads the price at a field path
#[derive(Debug, Clone)]
pub struct HttpPriceSource {
    descriptor: SourceDescriptor,
    client: Client,
}

impl HttpPriceSource {
    pub fn new(descriptor: SourceDescriptor, client: Client) -> Self {
        Self { descriptor, client }
    }
}

#[async_trait]
impl PriceSource for HttpPriceSource {
    fn name(&self) -> &str {
        &self.descriptor.name
    }

    async fn fetch_price(&self) -> FetchResult<f64> {
        debug!("Requesting {} at {}", self.descriptor.name, self.descriptor.url);

        let mut request = self.client.get(&self.descriptor.url);
        for (name, value) in &self.descriptor.headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request.send().await.map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Transport(format!("upstream returned HTTP {}", status)));
        }

        let body = response.bytes().await.map_err(transport_error)?;
        extract_price(&body, &self.descriptor.field_path)
    }
}

fn transport_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Transport(format!("request timed out: {}", err))
    } else {
        FetchError::Transport(err.to_string())
    }
}

/// Parse a JSON body and read a positive price at `path`.
///
/// Accepts JSON numbers and decimal strings (`"50000.12"`).
pub fn extract_price(body: &[u8], path: &FieldPath) -> FetchResult<f64> {
    let json: Value = serde_json::from_slice(body)
        .map_err(|e| FetchError::MalformedResponse(format!("invalid JSON: {}", e)))?;

    let field = path
        .resolve(&json)
        .ok_or_else(|| FetchError::MalformedResponse(format!("field '{}' not found", path)))?;

    let price = match field {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .ok_or_else(|| {
        FetchError::MalformedResponse(format!("field '{}' is not numeric: {}", path, field))
    })?;

    if !price.is_finite() || price <= 0.0 {
        return Err(FetchError::MalformedResponse(format!(
            "field '{}' is not a positive price: {}",
            path, price
        )));
    }

    Ok(price)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn field(p: &str) -> FieldPath {
        p.parse().unwrap()
    }

    #[test]
    fn test_extract_nested_number() {
        let body = br#"{"bitcoin":{"usd":50123.45}}"#;
        assert_eq!(extract_price(body, &field("bitcoin.usd")), Ok(50123.45));
    }

    #[test]
    fn test_extract_numeric_string() {
        let body = br#"{"symbol":"BTCUSDT","price":"49876.50000000"}"#;
        assert_eq!(extract_price(body, &field("price")), Ok(49876.5));
    }

    #[test]
    fn test_extract_rejects_malformed() {
        let path = field("USD");

        let not_json = extract_price(b"<html>blocked</html>", &path);
        assert!(matches!(not_json, Err(FetchError::MalformedResponse(_))));

        let missing = extract_price(br#"{"Response":"Error"}"#, &path);
        assert!(matches!(missing, Err(FetchError::MalformedResponse(_))));

        let non_numeric = extract_price(br#"{"USD":"n/a"}"#, &path);
        assert!(matches!(non_numeric, Err(FetchError::MalformedResponse(_))));

        let zero = extract_price(br#"{"USD":0}"#, &path);
        assert!(matches!(zero, Err(FetchError::MalformedResponse(_))));

        let negative = extract_price(br#"{"USD":-1.5}"#, &path);
        assert!(matches!(negative, Err(FetchError::MalformedResponse(_))));
    }

    #[tokio::test]
    async fn test_http_source_sends_headers_and_extracts() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v3/simple/price"))
            .and(header("User-Agent", "pricewatch-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "bitcoin": { "usd": 50000.0 }
            })))
            .mount(&server)
            .await;

        let descriptor = SourceDescriptor::new(
            "coingecko",
            format!("{}/api/v3/simple/price", server.uri()),
            field("bitcoin.usd"),
        )
        .with_header("User-Agent", "pricewatch-test");

        let client = build_http_client(Duration::from_secs(5)).unwrap();
        let source = HttpPriceSource::new(descriptor, client);

        assert_eq!(source.name(), "coingecko");
        assert_eq!(source.fetch_price().await, Ok(50000.0));
    }

    #[tokio::test]
    async fn test_http_source_error_status_is_transport() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let descriptor = SourceDescriptor::new("limited", server.uri(), field("price"));
        let client = build_http_client(Duration::from_secs(5)).unwrap();
        let source = HttpPriceSource::new(descriptor, client);

        let result = source.fetch_price().await;
        assert!(matches!(result, Err(FetchError::Transport(_))));
    }

    #[tokio::test]
    async fn test_http_source_timeout_is_transport() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "price": 1.0 }))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let descriptor = SourceDescriptor::new("slow", server.uri(), field("price"));
        let client = build_http_client(Duration::from_millis(100)).unwrap();
        let source = HttpPriceSource::new(descriptor, client);

        let result = source.fetch_price().await;
        assert!(matches!(result, Err(ref e) if e.is_transport()));
    }

    #[tokio::test]
    async fn test_http_source_connection_refused() {
        let descriptor = SourceDescriptor::new("offline", "http://127.0.0.1:1/price", field("price"));
        let client = build_http_client(Duration::from_secs(2)).unwrap();
        let source = HttpPriceSource::new(descriptor, client);

        let result = source.fetch_price().await;
        assert!(matches!(result, Err(FetchError::Transport(_))));
    }

    #[tokio::test]
    async fn test_http_source_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let descriptor = SourceDescriptor::new("garbled", server.uri(), field("USD"));
        let client = build_http_client(Duration::from_secs(5)).unwrap();
        let source = HttpPriceSource::new(descriptor, client);

        let result = source.fetch_price().await;
        assert!(matches!(result, Err(FetchError::MalformedResponse(_))));
    }
}
