//! CertStream websocket client.

use super::{CertEvent, CertEventStream, PassiveSource};
use crate::config::DEFAULT_CERTSTREAM_URL;
use async_trait::async_trait;
use futures_util::{future, StreamExt};
use serde::Deserialize;
use spyder_core::{Result, SpyderError};
use std::time::Duration;
use tokio::time::timeout;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info};
use url::Url;

/// Websocket handshake timeout
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Top-level CertStream frame
#[derive(Debug, Deserialize)]
struct Frame {
    message_type: String,
    #[serde(default)]
    data: Option<FrameData>,
}

#[derive(Debug, Deserialize)]
struct FrameData {
    leaf_cert: LeafCert,
}

#[derive(Debug, Deserialize)]
struct LeafCert {
    #[serde(default)]
    all_domains: Vec<String>,
}

/// Decode one CertStream text frame.
///
/// Returns `None` for heartbeats, other message types and frames that do
/// not parse.
pub fn decode_message(text: &str) -> Option<CertEvent> {
    let frame: Frame = serde_json::from_str(text).ok()?;
    if frame.message_type != "certificate_update" {
        return None;
    }
    let names = frame.data?.leaf_cert.all_domains;
    (!names.is_empty()).then_some(CertEvent { names })
}

/// Certificate transparency feed over the CertStream websocket protocol
#[derive(Debug, Clone)]
pub struct CertStream {
    url: String,
    connect_timeout: Duration,
}

impl Default for CertStream {
    fn default() -> Self {
        Self {
            url: DEFAULT_CERTSTREAM_URL.to_string(),
            connect_timeout: CONNECT_TIMEOUT,
        }
    }
}

impl CertStream {
    /// Feed at a custom `ws://` or `wss://` URL
    pub fn new(url: &str) -> Result<Self> {
        let parsed = Url::parse(url)
            .map_err(|e| SpyderError::Config(format!("invalid certstream URL {url}: {e}")))?;
        if !matches!(parsed.scheme(), "ws" | "wss") {
            return Err(SpyderError::Config(format!(
                "certstream URL must use ws or wss, got {}",
                parsed.scheme()
            )));
        }
        Ok(Self {
            url: url.to_string(),
            connect_timeout: CONNECT_TIMEOUT,
        })
    }

    /// Set the handshake timeout
    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Feed URL
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Install ring as the process-wide rustls provider for `wss://` feeds.
///
/// A provider installed earlier by the embedding application wins.
fn install_crypto_provider() {
    let _ = rustls::crypto::ring::default_provider().install_default();
}

#[async_trait]
impl PassiveSource for CertStream {
    fn name(&self) -> &str {
        "certstream"
    }

    async fn subscribe(&self) -> Result<CertEventStream> {
        install_crypto_provider();

        let (socket, _response) = timeout(self.connect_timeout, connect_async(self.url.as_str()))
            .await
            .map_err(|_| {
                SpyderError::SourceUnavailable(format!("connect to {} timed out", self.url))
            })?
            .map_err(|e| SpyderError::SourceUnavailable(format!("connect to {}: {e}", self.url)))?;

        info!(url = %self.url, "connected to certificate feed");

        let events = socket.filter_map(|message| {
            future::ready(match message {
                Ok(Message::Text(text)) => decode_message(text.as_str()).map(Ok),
                Ok(Message::Close(frame)) => {
                    debug!(?frame, "certificate feed closed by server");
                    None
                }
                Ok(_) => None,
                Err(e) => Some(Err(SpyderError::SourceUnavailable(format!(
                    "websocket read: {e}"
                )))),
            })
        });

        Ok(events.boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_certificate_update() {
        let frame = r#"{
            "message_type": "certificate_update",
            "data": {
                "update_type": "X509LogEntry",
                "leaf_cert": {
                    "subject": {"CN": "foo.example.com"},
                    "all_domains": ["foo.example.com", "www.foo.example.com"]
                },
                "seen": 1700000000.0
            }
        }"#;
        let event = decode_message(frame).unwrap();
        assert_eq!(event.names, vec!["foo.example.com", "www.foo.example.com"]);
    }

    #[test]
    fn test_heartbeat_ignored() {
        assert!(decode_message(r#"{"message_type": "heartbeat", "timestamp": 1.0}"#).is_none());
    }

    #[test]
    fn test_garbage_ignored() {
        assert!(decode_message("not json").is_none());
        assert!(decode_message(r#"{"message_type": "certificate_update"}"#).is_none());
    }

    #[test]
    fn test_url_validation() {
        assert!(CertStream::new("wss://certstream.example.net/").is_ok());
        assert!(matches!(
            CertStream::new("https://certstream.example.net/"),
            Err(SpyderError::Config(_))
        ));
        assert!(CertStream::new("not a url").is_err());
        assert_eq!(CertStream::default().url(), "wss://certstream.calidog.io");
    }

    #[tokio::test]
    async fn test_failed_tls_handshake_is_source_unavailable() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            // Accept and hang up before any TLS bytes are exchanged.
            while let Ok((socket, _)) = listener.accept().await {
                drop(socket);
            }
        });

        let feed = CertStream::new(&format!("wss://127.0.0.1:{port}/"))
            .unwrap()
            .connect_timeout(Duration::from_secs(5));
        let result = tokio::spawn(async move { feed.subscribe().await.map(|_| ()) })
            .await
            .expect("subscribe must not panic");

        assert!(matches!(result, Err(SpyderError::SourceUnavailable(_))));
    }

    #[tokio::test]
    async fn test_refused_connection_is_source_unavailable() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let feed = CertStream::new(&format!("ws://127.0.0.1:{port}/")).unwrap();
        let result = feed.subscribe().await.map(|_| ());
        assert!(matches!(result, Err(SpyderError::SourceUnavailable(_))));
    }
}
