use crate::transport::Transport;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use reqwest::Client;
use std::error::Error;
use std::time::Duration;
use url::Url;

/// Configuration for [`HttpTransport`].
///
/// Logsene authenticates through the app token embedded in the endpoint
/// path, so `basic_auth` and `headers` are only needed for proxies or
/// self-hosted receivers.
#[derive(Clone, Debug)]
pub struct HttpTransportConfig {
    /// Whole-request timeout. `None` leaves reqwest's default (no timeout).
    pub timeout: Option<Duration>,
    /// Optional `(user, password)` pair sent with every request.
    pub basic_auth: Option<(String, Option<String>)>,
    /// Extra headers sent with every request.
    pub headers: HeaderMap,
}

impl Default for HttpTransportConfig {
    fn default() -> Self {
        Self {
            timeout: Some(Duration::from_secs(10)),
            basic_auth: None,
            headers: HeaderMap::new(),
        }
    }
}

/// [`Transport`] implementation using a shared reqwest [`Client`].
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    config: HttpTransportConfig,
}

impl HttpTransport {
    /// Construct a transport with the provided configuration.
    ///
    /// **Returns**
    /// - A ready-to-use [`HttpTransport`] that can be passed into
    ///   [`SematextHook::new`](crate::hook::SematextHook::new).
    /// - `Err(..)` if the underlying client could not be built (TLS
    ///   backend initialization).
    pub fn new(config: HttpTransportConfig) -> Result<Self, crate::error::Error> {
        let mut builder = Client::builder().default_headers(config.headers.clone());
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;
        Ok(Self { client, config })
    }

    /// Wrap an already configured client.
    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            config: HttpTransportConfig::default(),
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post(&self, url: &Url, body: Vec<u8>) -> Result<(), Box<dyn Error + Send + Sync>> {
        let mut request = self
            .client
            .post(url.clone())
            .header(CONTENT_TYPE, "application/json")
            .body(body);
        if let Some((user, password)) = &self.config.basic_auth {
            request = request.basic_auth(user, password.as_ref());
        }

        let resp = request.send().await?;
        if resp.status().is_success() {
            Ok(())
        } else {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_else(|_| "<no body>".to_string());
            Err(Box::new(crate::error::Error::HttpResponse {
                status: status.as_u16(),
                body: text,
            }))
        }
    }
}
