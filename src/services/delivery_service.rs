// src/services/delivery_service.rs
use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use std::sync::{Arc, Mutex};
use tracing;

use crate::{
    errors::{PushError, PushResult},
    models::{ProviderKind, PushToken},
};

/// Outbound boundary that registers a device token with the backend.
#[async_trait]
pub trait TokenDelivery: Send + Sync {
    async fn deliver(&self, token: &PushToken, provider: ProviderKind) -> PushResult<()>;
}

/// Posts tokens as JSON to a registration endpoint.
pub struct HttpTokenDelivery {
    endpoint: String,
    client: reqwest::Client,
}

impl HttpTokenDelivery {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            client: reqwest::Client::new(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl TokenDelivery for HttpTokenDelivery {
    async fn deliver(&self, token: &PushToken, provider: ProviderKind) -> PushResult<()> {
        if token.is_empty() {
            return Err(PushError::delivery("Empty push token"));
        }
        if provider == ProviderKind::None {
            return Err(PushError::delivery("Token has no provider"));
        }

        tracing::info!("Registering {} token with {}", provider, self.endpoint);

        let body = json!({
            "token": token,
            "provider": provider.label(),
            "registered_at": Utc::now().to_rfc3339(),
        });

        let response = self.client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            tracing::error!("Token registration failed: {} {}", status, error_text);
            return Err(PushError::DeliveryRejected {
                status: status.as_u16(),
                body: error_text,
            });
        }

        tracing::debug!("Token registered successfully");
        Ok(())
    }
}

/// Delivery used when no endpoint is configured. Records what it was given.
#[derive(Debug, Default)]
pub struct MockTokenDelivery {
    delivered: Mutex<Vec<(PushToken, ProviderKind)>>,
}

impl MockTokenDelivery {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn delivered(&self) -> Vec<(PushToken, ProviderKind)> {
        self.delivered
            .lock()
            .map(|d| d.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl TokenDelivery for MockTokenDelivery {
    async fn deliver(&self, token: &PushToken, provider: ProviderKind) -> PushResult<()> {
        tracing::info!("[MOCK] Would register {} token: {}", provider, token);
        self.delivered
            .lock()
            .map_err(|_| PushError::delivery("mock delivery log poisoned"))?
            .push((token.clone(), provider));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    /// Serves a single request with a canned reply and hands back
    /// the request head and body.
    async fn serve_once(
        status_line: &'static str,
        reply: &'static str,
    ) -> (String, oneshot::Receiver<(String, String)>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let endpoint = format!("http://{}/tokens", listener.local_addr().unwrap());
        let (tx, rx) = oneshot::channel();

        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 1024];

            loop {
                let n = stream.read(&mut chunk).await.unwrap();
                buf.extend_from_slice(&chunk[..n]);
                let text = String::from_utf8_lossy(&buf).to_string();
                if let Some(end) = text.find("\r\n\r\n") {
                    let head = text[..end].to_string();
                    let len = head
                        .lines()
                        .find_map(|line| {
                            line.to_ascii_lowercase()
                                .strip_prefix("content-length:")
                                .and_then(|v| v.trim().parse::<usize>().ok())
                        })
                        .unwrap_or(0);
                    if text.len() >= end + 4 + len {
                        let body = text[end + 4..end + 4 + len].to_string();
                        let _ = tx.send((head, body));
                        break;
                    }
                }
                if n == 0 {
                    break;
                }
            }

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                reply.len(),
                reply
            );
            stream.write_all(response.as_bytes()).await.unwrap();
            let _ = stream.shutdown().await;
        });

        (endpoint, rx)
    }

    #[tokio::test]
    async fn test_mock_records_deliveries() {
        let delivery = MockTokenDelivery::new();
        delivery.deliver(&PushToken::new("tok-1"), ProviderKind::Hms).await.unwrap();
        delivery.deliver(&PushToken::new("tok-2"), ProviderKind::Gms).await.unwrap();

        assert_eq!(
            delivery.delivered(),
            vec![
                (PushToken::new("tok-1"), ProviderKind::Hms),
                (PushToken::new("tok-2"), ProviderKind::Gms),
            ]
        );
    }

    #[tokio::test]
    async fn test_http_rejects_empty_token() {
        let delivery = HttpTokenDelivery::new("http://127.0.0.1:9/tokens");
        let result = delivery.deliver(&PushToken::new(""), ProviderKind::Hms).await;
        assert!(matches!(result, Err(PushError::Delivery(_))));
    }

    #[tokio::test]
    async fn test_http_posts_token_json() {
        let (endpoint, request) = serve_once("200 OK", "ok").await;
        let delivery = HttpTokenDelivery::new(endpoint);

        delivery.deliver(&PushToken::new("tok-123"), ProviderKind::Hms).await.unwrap();

        let (head, body) = request.await.unwrap();
        assert!(head.starts_with("POST /tokens HTTP/1.1"));
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["token"], "tok-123");
        assert_eq!(json["provider"], "HMS");
        let registered_at = json["registered_at"].as_str().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(registered_at).is_ok());
    }

    #[tokio::test]
    async fn test_http_non_success_is_rejected() {
        let (endpoint, request) = serve_once("503 Service Unavailable", "busy").await;
        let delivery = HttpTokenDelivery::new(endpoint);

        let result = delivery.deliver(&PushToken::new("tok-123"), ProviderKind::Gms).await;

        match result {
            Err(PushError::DeliveryRejected { status, body }) => {
                assert_eq!(status, 503);
                assert_eq!(body, "busy");
            }
            other => panic!("Expected DeliveryRejected, got {:?}", other),
        }
        let (_, body) = request.await.unwrap();
        assert!(body.contains("\"provider\":\"GMS\""));
    }

    #[tokio::test]
    async fn test_http_rejects_missing_provider() {
        let delivery = HttpTokenDelivery::new("http://127.0.0.1:9/tokens");
        let result = delivery.deliver(&PushToken::new("tok"), ProviderKind::None).await;
        assert!(matches!(result, Err(PushError::Delivery(_))));
    }
}
