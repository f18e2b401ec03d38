use async_trait::async_trait;
use std::error::Error;
use url::Url;

/// Asynchronous HTTP client the dispatcher hands serialized records to.
///
/// Implementations own everything about the connection: authentication,
/// timeouts, TLS. The dispatcher calls `post` from a background Tokio task
/// and never awaits it on the application thread.
#[async_trait]
pub trait Transport: Send + Sync {
    /// POST a single JSON document to `url`.
    ///
    /// **Parameters**
    /// - `url`: the resolved ingestion endpoint of the sink.
    /// - `body`: the serialized record, a JSON object.
    ///
    /// **Returns**
    /// - `Ok(())` if the endpoint accepted the record.
    /// - `Err(..)` on network errors or a non-success response. The
    ///   dispatcher reports this on stderr and drops the record; it is
    ///   never retried.
    async fn post(&self, url: &Url, body: Vec<u8>) -> Result<(), Box<dyn Error + Send + Sync>>;
}

/// A transport that simply drops all records.
///
/// Useful for measuring the overhead of the pipeline itself without any
/// network I/O.
#[derive(Clone, Default)]
pub struct NoopTransport;

#[async_trait]
impl Transport for NoopTransport {
    async fn post(&self, _url: &Url, _body: Vec<u8>) -> Result<(), Box<dyn Error + Send + Sync>> {
        Ok(())
    }
}
