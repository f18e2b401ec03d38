//! Access-log records for HTTP services.
//!
//! Framework middleware captures an [`AccessLog`] once the response is
//! produced and fires [`AccessLog::into_entry`] at the hook, or logs the
//! [`AccessLog::fields`] through its own facility. The fields are ordinary
//! caller-supplied fields as far as merging is concerned.

use crate::field::FieldValue;
use crate::record::{Level, LogEntry};
use chrono::{DateTime, SecondsFormat, Utc};
use http::header::{HeaderMap, CONTENT_ENCODING, CONTENT_LENGTH, CONTENT_TYPE, HOST, REFERER, USER_AGENT};
use http::{Request, Response};
use std::collections::BTreeMap;
use std::time::Duration;

pub const X_REQUEST_ID: &str = "x-request-id";
pub const X_REAL_IP: &str = "x-real-ip";
pub const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// One served request.
#[derive(Debug, Clone, PartialEq)]
pub struct AccessLog {
    pub request_id: String,
    pub remote_address: String,
    pub finished: DateTime<Utc>,
    pub method: String,
    pub protocol: String,
    pub request_length: String,
    pub request_uri: String,
    pub virtual_host: String,
    pub user_agent: String,
    pub referer: String,
    pub request_encoding: String,
    pub response_content_type: String,
    pub response_encoding: String,
    pub response_length: u64,
    pub response_status: u16,
    pub latency: Duration,
}

impl AccessLog {
    /// Capture a finished exchange.
    ///
    /// `peer` is the socket address of the client; proxy headers
    /// (`X-Forwarded-For`, `X-Real-IP`) take precedence over it.
    pub fn new<B, R>(
        request: &Request<B>,
        response: &Response<R>,
        peer: &str,
        response_length: u64,
        latency: Duration,
    ) -> Self {
        let req_headers = request.headers();
        let res_headers = response.headers();

        let mut request_id = header(req_headers, X_REQUEST_ID);
        if request_id.is_empty() {
            request_id = header(res_headers, X_REQUEST_ID);
        }
        let mut request_length = header(req_headers, CONTENT_LENGTH.as_str());
        if request_length.is_empty() {
            request_length = "0".to_string();
        }
        let mut virtual_host = header(req_headers, HOST.as_str());
        if virtual_host.is_empty() {
            virtual_host = request.uri().authority().map(|a| a.to_string()).unwrap_or_default();
        }
        let request_uri = request
            .uri()
            .path_and_query()
            .map(|pq| pq.to_string())
            .unwrap_or_else(|| request.uri().path().to_string());

        AccessLog {
            request_id,
            remote_address: real_ip(req_headers, peer),
            finished: Utc::now(),
            method: request.method().to_string(),
            protocol: format!("{:?}", request.version()),
            request_length,
            request_uri,
            virtual_host,
            user_agent: header(req_headers, USER_AGENT.as_str()),
            referer: header(req_headers, REFERER.as_str()),
            request_encoding: extract_encoding(req_headers),
            response_content_type: header(res_headers, CONTENT_TYPE.as_str()),
            response_encoding: extract_encoding(res_headers),
            response_length,
            response_status: response.status().as_u16(),
            latency,
        }
    }

    /// Structured fields describing the exchange.
    pub fn fields(&self) -> BTreeMap<String, FieldValue> {
        let latency_nanos = u64::try_from(self.latency.as_nanos()).unwrap_or(u64::MAX);
        let mut fields = BTreeMap::new();
        let mut put = |key: &str, value: FieldValue| {
            fields.insert(key.to_string(), value);
        };
        put("RequestId", self.request_id.as_str().into());
        put("remoteAddress", self.remote_address.as_str().into());
        put("timestamp", self.finished.timestamp_nanos_opt().into());

        put("httpMethod", self.method.as_str().into());
        put("protocol", self.protocol.as_str().into());
        put("requestLength", self.request_length.as_str().into());
        put("requestUri", self.request_uri.as_str().into());
        put("virtualhost", self.virtual_host.as_str().into());
        put("userAgent", self.user_agent.as_str().into());
        put("requestEncoding", self.request_encoding.as_str().into());

        put("responseContentType", self.response_content_type.as_str().into());
        put("responseEncoding", self.response_encoding.as_str().into());
        put("responseLength", self.response_length.to_string().into());
        put("responseStatus", self.response_status.into());
        put("responseTimeNanos", latency_nanos.into());
        fields
    }

    /// One-line summary in the spirit of the combined log format.
    pub fn message(&self) -> String {
        format!(
            "{} {} [{}] {} {:<7} {} {:>3} {} {} {:>13} {} {}",
            self.request_id,
            self.remote_address,
            self.finished.to_rfc3339_opts(SecondsFormat::Secs, true),
            self.virtual_host,
            self.method,
            self.request_uri,
            self.response_status,
            self.request_length,
            self.response_length,
            format!("{:?}", self.latency),
            self.referer,
            self.user_agent,
        )
    }

    /// An INFO entry carrying [`AccessLog::message`] and [`AccessLog::fields`].
    pub fn into_entry(self) -> LogEntry {
        LogEntry::new(Level::INFO, self.message())
            .at(self.finished)
            .with_fields(self.fields())
    }
}

fn header(headers: &HeaderMap, name: &str) -> String {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// Client address as seen through proxies, falling back to `peer`.
pub fn real_ip(headers: &HeaderMap, peer: &str) -> String {
    let forwarded = header(headers, X_FORWARDED_FOR);
    if let Some(first) = forwarded.split(',').map(str::trim).find(|s| !s.is_empty()) {
        return first.to_string();
    }
    let real = header(headers, X_REAL_IP);
    if !real.is_empty() {
        return real;
    }
    peer.to_string()
}

/// Body encoding announced by `headers`: `Content-Encoding` if present,
/// otherwise the `charset` parameter of a multi-part `Content-Type`.
/// Lower-cased, empty when neither is there.
pub fn extract_encoding(headers: &HeaderMap) -> String {
    let encoding = header(headers, CONTENT_ENCODING.as_str());
    if !encoding.is_empty() {
        return encoding.to_lowercase();
    }
    let content_type = header(headers, CONTENT_TYPE.as_str());
    let parts: Vec<&str> = content_type.split(';').collect();
    if parts.len() > 1 {
        for part in parts {
            if let Some((_, charset)) = part.split_once("charset=") {
                return charset.trim().to_lowercase();
            }
        }
    }
    String::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::HeaderValue;
    use serde_json::json;

    fn exchange() -> AccessLog {
        let request = Request::builder()
            .method("POST")
            .uri("http://api.example.com/orders?id=7")
            .header(X_REQUEST_ID, "req-1")
            .header(CONTENT_LENGTH, "12")
            .header(USER_AGENT, "curl/8.0")
            .header(CONTENT_TYPE, "application/json; charset=UTF-8")
            .body(())
            .unwrap();
        let response = Response::builder()
            .status(201)
            .header(CONTENT_TYPE, "application/json")
            .header(CONTENT_ENCODING, "GZIP")
            .body(())
            .unwrap();
        AccessLog::new(&request, &response, "10.0.0.1:5555", 42, Duration::from_millis(3))
    }

    #[test]
    fn captures_request_and_response() {
        let log = exchange();
        assert_eq!(log.request_id, "req-1");
        assert_eq!(log.remote_address, "10.0.0.1:5555");
        assert_eq!(log.method, "POST");
        assert_eq!(log.protocol, "HTTP/1.1");
        assert_eq!(log.request_uri, "/orders?id=7");
        assert_eq!(log.virtual_host, "api.example.com");
        assert_eq!(log.request_length, "12");
        assert_eq!(log.request_encoding, "utf-8");
        assert_eq!(log.response_encoding, "gzip");
        assert_eq!(log.response_status, 201);
    }

    #[test]
    fn request_id_falls_back_to_response_header() {
        let request = Request::builder().uri("/").body(()).unwrap();
        let response = Response::builder().header(X_REQUEST_ID, "from-response").body(()).unwrap();
        let log = AccessLog::new(&request, &response, "peer", 0, Duration::ZERO);
        assert_eq!(log.request_id, "from-response");
        assert_eq!(log.request_length, "0");
    }

    #[test]
    fn fields_use_access_log_names() {
        let fields = exchange().fields();
        assert_eq!(fields["RequestId"], FieldValue::Str("req-1".into()));
        assert_eq!(fields["responseStatus"], FieldValue::Scalar(json!(201)));
        assert_eq!(fields["responseLength"], FieldValue::Str("42".into()));
        assert_eq!(fields["responseTimeNanos"], FieldValue::Scalar(json!(3_000_000)));
        assert_eq!(fields["userAgent"], FieldValue::Str("curl/8.0".into()));
        assert!(matches!(fields["timestamp"], FieldValue::Scalar(_)));
    }

    #[test]
    fn message_is_a_single_line() {
        let log = exchange();
        let message = log.message();
        assert!(message.starts_with("req-1 10.0.0.1:5555 ["));
        assert!(message.contains("POST    /orders?id=7 201 12 42"));
        assert!(!message.contains('\n'));
        let entry = log.into_entry();
        assert_eq!(entry.level, Level::INFO);
        assert_eq!(entry.message, message);
    }

    #[test]
    fn proxy_headers_win_over_peer() {
        let mut headers = HeaderMap::new();
        headers.insert(X_FORWARDED_FOR, HeaderValue::from_static("1.2.3.4, 10.0.0.1"));
        assert_eq!(real_ip(&headers, "peer"), "1.2.3.4");
        let mut headers = HeaderMap::new();
        headers.insert(X_REAL_IP, HeaderValue::from_static("5.6.7.8"));
        assert_eq!(real_ip(&headers, "peer"), "5.6.7.8");
        assert_eq!(real_ip(&HeaderMap::new(), "peer"), "peer");
    }

    #[test]
    fn encoding_extraction() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/html"));
        assert_eq!(extract_encoding(&headers), "");
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/html; charset=ISO-8859-1"));
        assert_eq!(extract_encoding(&headers), "iso-8859-1");
        headers.insert(CONTENT_ENCODING, HeaderValue::from_static("Br"));
        assert_eq!(extract_encoding(&headers), "br");
    }
}
