/// Errors produced while constructing the sink or running its pipeline.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Invalid endpoint with context '{context}'. Parse error: {source}")]
    InvalidEndpoint {
        context: String,
        source: url::ParseError,
    },
    #[error("Serde JSON serialization failed with context '{context}'. Error: {source}")]
    Serialize {
        context: String,
        source: serde_json::Error,
    },
    #[error("base message did not serialize to a JSON object")]
    NotAnObject,
    #[cfg(feature = "reqwest-transport")]
    #[error("Reqwest error with context '{context}'. Error: {source}")]
    Transport {
        context: String,
        source: reqwest::Error,
    },
    #[error("unsuccessful HTTP response. HTTP status code: '{status}', body: '{body}'")]
    HttpResponse { status: u16, body: String },
    #[error("no Tokio runtime is running, the sink must be built from within one")]
    NoRuntime,
    #[error("dispatch queue is closed, the background task has stopped")]
    QueueClosed,
    #[error("missing required configuration: {0}")]
    MissingConfig(&'static str),
    #[error("failed to install the global tracing subscriber: {0}")]
    SubscriberInit(String),
}

#[cfg(feature = "reqwest-transport")]
impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport {
            context: "Error sending HTTP request".to_string(),
            source: err,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
