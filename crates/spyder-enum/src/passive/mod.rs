//! Passive discovery from certificate issuance feeds.

mod certstream;

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use spyder_core::Result;

pub use certstream::{decode_message, CertStream};

/// Names carried by one issued certificate (subject and SANs)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CertEvent {
    /// Every DNS name on the certificate, as published
    pub names: Vec<String>,
}

impl CertEvent {
    /// Event for the given names
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }
}

/// Stream of certificate events; an `Err` item ends the feed
pub type CertEventStream = BoxStream<'static, Result<CertEvent>>;

/// A live source of certificate issuance events
#[async_trait]
pub trait PassiveSource: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &str;

    /// Connect and start receiving events.
    ///
    /// Connection failures are reported as
    /// [`SpyderError::SourceUnavailable`](spyder_core::SpyderError::SourceUnavailable).
    async fn subscribe(&self) -> Result<CertEventStream>;
}
