//! Blocking HTTP exchange with the collection service.
use std::time::Duration;

use reqwest::{
    header::{ACCEPT, CONTENT_TYPE},
    StatusCode,
};

use crate::Result;

pub use reqwest::Method;

const JSON_MEDIA_TYPE: &str = "application/json";

/// Performs one request/response exchange.
///
/// Implementations never fail: any transport-level problem is logged and reported as an empty
/// string, which callers treat as "no usable response".
pub trait Transport {
    /// Send `body` to `url` with `method` and return the pretty-printed JSON response, or an
    /// empty string on failure.
    fn send(&self, body: &str, url: &str, method: Method) -> String;
}

impl<T: Fn(&str, &str, Method) -> String> Transport for T {
    fn send(&self, body: &str, url: &str, method: Method) -> String {
        self(body, url, method)
    }
}

/// [`Transport`] backed by a blocking `reqwest` client.
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    /// Create a transport. `timeout` bounds the whole exchange; `None` keeps the platform default.
    pub fn new(timeout: Option<Duration>) -> Result<HttpTransport> {
        // Idle connections are not kept: every call opens its own connection.
        let mut builder = reqwest::blocking::Client::builder().pool_max_idle_per_host(0);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(HttpTransport {
            client: builder.build()?,
        })
    }
}

impl Transport for HttpTransport {
    fn send(&self, body: &str, url: &str, method: Method) -> String {
        log::debug!(target: "enhencer", url, method:display = method; "sending request");
        log::trace!(target: "enhencer", url, body; "request body");

        let response = match self
            .client
            .request(method.clone(), url)
            .header(CONTENT_TYPE, JSON_MEDIA_TYPE)
            .header(ACCEPT, JSON_MEDIA_TYPE)
            .body(body.to_owned())
            .send()
        {
            Ok(response) => response,
            Err(err) => {
                log::warn!(target: "enhencer", url, method:display = method; "request failed: {:?}", err.without_url());
                return String::new();
            }
        };

        let status = response.status();
        if !is_success(status) {
            log::error!(target: "enhencer", url, method:display = method, status = status.as_u16(); "received non-success response");
            return String::new();
        }

        let text = match response.text() {
            Ok(text) => text,
            Err(err) => {
                log::warn!(target: "enhencer", url, method:display = method; "failed to read response body: {:?}", err.without_url());
                return String::new();
            }
        };

        pretty_print(&text).unwrap_or_else(|err| {
            log::warn!(target: "enhencer", url, method:display = method; "response body is not JSON: {:?}", err);
            String::new()
        })
    }
}

fn is_success(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::OK | StatusCode::CREATED | StatusCode::ACCEPTED
    )
}

/// Re-serialize JSON text in pretty-printed form.
fn pretty_print(text: &str) -> serde_json::Result<String> {
    let value: serde_json::Value = serde_json::from_str(text)?;
    serde_json::to_string_pretty(&value)
}
