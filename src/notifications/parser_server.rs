use async_trait::async_trait;
use reqwest::{Client, Url};
use std::time::Duration;
use tracing::{debug, info};

use super::{NotifyError, StructureUpdateNotifier};

const UPDATE_PATH: &str = "updatePacketStructure";

/// Notifies the parser server over HTTP with `GET {base}/updatePacketStructure`.
pub struct HttpParserNotifier {
    client: Client,
    endpoint: Url,
}

impl HttpParserNotifier {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, NotifyError> {
        let endpoint = update_endpoint(base_url)?;
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

/// Builds the update URL. Bare `host:port` bases are treated as plain HTTP.
fn update_endpoint(base_url: &str) -> Result<Url, NotifyError> {
    let trimmed = base_url.trim().trim_end_matches('/');
    let with_scheme = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("http://{trimmed}")
    };

    let invalid = |reason: String| NotifyError::InvalidUrl {
        url: base_url.to_string(),
        reason,
    };
    let base = Url::parse(&format!("{with_scheme}/")).map_err(|e| invalid(e.to_string()))?;
    if base.cannot_be_a_base() || base.host_str().is_none() {
        return Err(invalid("missing host".to_string()));
    }
    base.join(UPDATE_PATH).map_err(|e| invalid(e.to_string()))
}

#[async_trait]
impl StructureUpdateNotifier for HttpParserNotifier {
    async fn notify_structure_updated(&self) -> Result<serde_json::Value, NotifyError> {
        debug!(endpoint = %self.endpoint, "Notifying parser server of structure update.");
        let response = self.client.get(self.endpoint.clone()).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            return Err(NotifyError::Rejected { status, body });
        }

        let body = response.json::<serde_json::Value>().await?;
        info!(endpoint = %self.endpoint, "Parser server acknowledged structure update.");
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::get, Json, Router};
    use serde_json::json;

    async fn spawn_parser_server(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        addr.to_string()
    }

    #[test]
    fn test_endpoint_from_bare_host() {
        let notifier =
            HttpParserNotifier::new("192.168.0.102:5000", Duration::from_secs(1)).unwrap();
        assert_eq!(
            notifier.endpoint().as_str(),
            "http://192.168.0.102:5000/updatePacketStructure"
        );
    }

    #[test]
    fn test_endpoint_keeps_scheme_and_path() {
        let url = update_endpoint("https://parser.local/api/").unwrap();
        assert_eq!(url.as_str(), "https://parser.local/api/updatePacketStructure");
    }

    #[test]
    fn test_endpoint_rejects_malformed_host() {
        assert!(matches!(
            update_endpoint("http://[::1"),
            Err(NotifyError::InvalidUrl { .. })
        ));
    }

    #[tokio::test]
    async fn test_successful_notification_returns_body() {
        let router = Router::new().route(
            "/updatePacketStructure",
            get(|| async { Json(json!({"status": "reloaded"})) }),
        );
        let addr = spawn_parser_server(router).await;

        let notifier = HttpParserNotifier::new(&addr, Duration::from_secs(5)).unwrap();
        let body = notifier.notify_structure_updated().await.unwrap();
        assert_eq!(body, json!({"status": "reloaded"}));
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let router = Router::new().route(
            "/updatePacketStructure",
            get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "busy") }),
        );
        let addr = spawn_parser_server(router).await;

        let notifier = HttpParserNotifier::new(&addr, Duration::from_secs(5)).unwrap();
        match notifier.notify_structure_updated().await {
            Err(NotifyError::Rejected { status, body }) => {
                assert_eq!(status, reqwest::StatusCode::SERVICE_UNAVAILABLE);
                assert_eq!(body, "busy");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_non_json_body_is_an_error() {
        let router = Router::new().route("/updatePacketStructure", get(|| async { "ok" }));
        let addr = spawn_parser_server(router).await;

        let notifier = HttpParserNotifier::new(&addr, Duration::from_secs(5)).unwrap();
        assert!(matches!(
            notifier.notify_structure_updated().await,
            Err(NotifyError::NetworkError(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_an_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);

        let notifier = HttpParserNotifier::new(&addr, Duration::from_secs(2)).unwrap();
        assert!(notifier.notify_structure_updated().await.is_err());
    }
}
