use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::OnceLock;
use std::time::Duration;

use business::domain::logger::{Fields, LogField, Logger};
use business::domain::trace::TraceContext;
use futures::FutureExt;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Response, StatusCode};
use serde::Serialize;

use crate::errors::RequestError;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3);
const JSON: &str = "application/json";

/// Thin wrapper over a shared `reqwest` client.
///
/// `get` treats a non-2xx answer as "no data": the failure is logged and an
/// empty body comes back. `post` returns it as [`RequestError::Status`].
#[derive(Debug, Clone)]
pub struct HttpRequester {
    client: Client,
}

impl Default for HttpRequester {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpRequester {
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();

        Self { client }
    }

    pub async fn get(
        &self,
        url: &str,
        headers: &HashMap<String, String>,
        logger: Option<&dyn Logger>,
    ) -> Result<Vec<u8>, RequestError> {
        let report = Reporter(logger);

        match AssertUnwindSafe(self.fetch(url, headers, &report))
            .catch_unwind()
            .await
        {
            Ok(result) => result,
            Err(panic) => {
                report.error(
                    "[Get] request panicked",
                    &[
                        LogField::new("url", url),
                        LogField::new("panic", panic_message(panic.as_ref())),
                    ],
                );
                Ok(Vec::new())
            }
        }
    }

    pub async fn post<B>(
        &self,
        url: &str,
        headers: &HashMap<String, String>,
        body: &B,
        logger: Option<&dyn Logger>,
    ) -> Result<Vec<u8>, RequestError>
    where
        B: Serialize + ?Sized,
    {
        let report = Reporter(logger);

        let payload = serde_json::to_vec(body)
            .map_err(RequestError::Encode)
            .inspect_err(|err| report.failure("[Post] encode body failed", url, err))?;

        let mut header_map = header_map(headers)
            .inspect_err(|err| report.failure("[Post] build request failed", url, err))?;
        header_map
            .entry(CONTENT_TYPE)
            .or_insert(HeaderValue::from_static(JSON));

        let request = self
            .client
            .post(url)
            .headers(header_map)
            .body(payload)
            .build()
            .map_err(|source| build_error(url, source))
            .inspect_err(|err| report.failure("[Post] build request failed", url, err))?;

        let response = self
            .client
            .execute(request)
            .await
            .map_err(|source| transport(url, source))
            .inspect_err(|err| report.failure("[Post] request failed", url, err))?;

        let status = response.status();
        let body = read_body(url, response)
            .await
            .inspect_err(|err| report.failure("[Post] read body failed", url, err))?;

        if !status.is_success() {
            let err = status_error(url, status, &body);
            report.failure("[Post] unexpected status", url, &err);
            return Err(err);
        }

        Ok(body)
    }

    async fn fetch(
        &self,
        url: &str,
        headers: &HashMap<String, String>,
        report: &Reporter<'_>,
    ) -> Result<Vec<u8>, RequestError> {
        let header_map = header_map(headers)
            .inspect_err(|err| report.failure("[Get] build request failed", url, err))?;

        let request = self
            .client
            .get(url)
            .headers(header_map)
            .build()
            .map_err(|source| build_error(url, source))
            .inspect_err(|err| report.failure("[Get] build request failed", url, err))?;

        let response = self
            .client
            .execute(request)
            .await
            .map_err(|source| transport(url, source))
            .inspect_err(|err| report.failure("[Get] request failed", url, err))?;

        let status = response.status();
        let body = read_body(url, response)
            .await
            .inspect_err(|err| report.failure("[Get] read body failed", url, err))?;

        if !status.is_success() {
            let err = status_error(url, status, &body);
            report.failure("[Get] unexpected status", url, &err);
            return Ok(Vec::new());
        }

        Ok(body)
    }
}

fn shared() -> &'static HttpRequester {
    static SHARED: OnceLock<HttpRequester> = OnceLock::new();
    SHARED.get_or_init(HttpRequester::new)
}

/// GET through a process-wide requester with the default timeout.
pub async fn get(
    url: &str,
    headers: &HashMap<String, String>,
    logger: Option<&dyn Logger>,
) -> Result<Vec<u8>, RequestError> {
    shared().get(url, headers, logger).await
}

/// JSON POST through a process-wide requester with the default timeout.
pub async fn post<B>(
    url: &str,
    headers: &HashMap<String, String>,
    body: &B,
    logger: Option<&dyn Logger>,
) -> Result<Vec<u8>, RequestError>
where
    B: Serialize + ?Sized,
{
    shared().post(url, headers, body, logger).await
}

fn header_map(headers: &HashMap<String, String>) -> Result<HeaderMap, RequestError> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let invalid = || RequestError::InvalidHeader { name: name.clone() };
        let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| invalid())?;
        let header_value = HeaderValue::from_str(value).map_err(|_| invalid())?;
        map.insert(header_name, header_value);
    }
    Ok(map)
}

async fn read_body(url: &str, response: Response) -> Result<Vec<u8>, RequestError> {
    response
        .bytes()
        .await
        .map(|bytes| bytes.to_vec())
        .map_err(|source| RequestError::Body {
            url: url.to_string(),
            source,
        })
}

fn build_error(url: &str, source: reqwest::Error) -> RequestError {
    RequestError::Build {
        url: url.to_string(),
        source,
    }
}

fn transport(url: &str, source: reqwest::Error) -> RequestError {
    RequestError::Transport {
        url: url.to_string(),
        source,
    }
}

fn status_error(url: &str, status: StatusCode, body: &[u8]) -> RequestError {
    RequestError::Status {
        url: url.to_string(),
        status: status.as_u16(),
        body: String::from_utf8_lossy(body).into_owned(),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        return (*message).to_string();
    }
    payload
        .downcast_ref::<String>()
        .cloned()
        .unwrap_or_else(|| "unknown panic".to_string())
}

/// Routes failures to the caller's logger, or to `tracing` when none was given.
struct Reporter<'a>(Option<&'a dyn Logger>);

impl Reporter<'_> {
    fn failure(&self, message: &str, url: &str, err: &RequestError) {
        self.error(message, &[LogField::new("url", url), LogField::error(err)]);
    }

    fn error(&self, message: &str, fields: &[LogField]) {
        match self.0 {
            Some(logger) => logger.error(&TraceContext::new(), message, fields),
            None => tracing::error!(fields = %Fields(fields), "{message}"),
        }
    }
}
