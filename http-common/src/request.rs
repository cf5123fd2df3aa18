// Copyright (c) Microsoft. All rights reserved.

use std::io::{Error, ErrorKind};

use crate::backoff::DEFAULT_BACKOFF;

const CONTENT_TYPE_JSON: &str = "application/json";
const CONTENT_TYPE_FORM: &str = "application/x-www-form-urlencoded";

enum RequestBody {
    Json(Vec<u8>),
    Form(String),
}

pub struct HttpRequest<TConnector> {
    connector: TConnector,
    method: hyper::Method,
    uri: String,
    headers: http::HeaderMap<http::HeaderValue>,
    body: Option<RequestBody>,
    timeout: std::time::Duration,
    retries: u32,
}

impl<TConnector> HttpRequest<TConnector>
where
    TConnector: Clone + Send + Sync + hyper::client::connect::Connect + 'static,
{
    #[must_use]
    pub fn get(connector: TConnector, uri: &str) -> Self {
        HttpRequest::new(connector, hyper::Method::GET, uri, None)
    }

    /// A POST whose body is `form`, encoded as `application/x-www-form-urlencoded`.
    #[must_use]
    pub fn post_form(connector: TConnector, uri: &str, form: &[(&str, &str)]) -> Self {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(form)
            .finish();

        HttpRequest::new(
            connector,
            hyper::Method::POST,
            uri,
            Some(RequestBody::Form(body)),
        )
    }

    /// A PUT whose body is `body` serialized as JSON.
    pub fn put<TBody>(connector: TConnector, uri: &str, body: &TBody) -> Result<Self, Error>
    where
        TBody: serde::Serialize,
    {
        let body =
            serde_json::to_vec(body).map_err(|err| Error::new(ErrorKind::InvalidInput, err))?;

        Ok(HttpRequest::new(
            connector,
            hyper::Method::PUT,
            uri,
            Some(RequestBody::Json(body)),
        ))
    }

    fn new(
        connector: TConnector,
        method: hyper::Method,
        uri: &str,
        body: Option<RequestBody>,
    ) -> Self {
        HttpRequest {
            connector,
            method,
            uri: uri.to_string(),
            headers: http::HeaderMap::default(),
            body,
            timeout: std::time::Duration::from_secs(30),
            retries: 0,
        }
    }

    #[must_use]
    pub fn with_retry(mut self, retries: u32) -> Self {
        self.retries = retries;

        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.timeout = timeout;

        self
    }

    pub fn add_header(
        &mut self,
        name: hyper::header::HeaderName,
        value: &str,
    ) -> Result<(), Error> {
        let mut value = http::HeaderValue::from_str(value)
            .map_err(|err| Error::new(ErrorKind::InvalidInput, err))?;

        if name == hyper::header::AUTHORIZATION {
            value.set_sensitive(true);
        }

        self.headers.insert(name, value);

        Ok(())
    }

    /// Sends the request and returns the status and body, whatever the status.
    pub async fn response(self) -> Result<HttpResponse, Error> {
        let (status, _, body) = self.process_request().await?;

        Ok(HttpResponse { status, body })
    }

    /// Like [`HttpRequest::response`], but fails unless the response declares a JSON body.
    pub async fn json_response(self) -> Result<HttpResponse, Error> {
        let (status, headers, body) = self.process_request().await?;

        let is_json_response = if let Some(content_type) = headers.get(hyper::header::CONTENT_TYPE)
        {
            let content_type = content_type
                .to_str()
                .map_err(|err| Error::new(ErrorKind::InvalidData, err))?;

            content_type.contains(CONTENT_TYPE_JSON)
        } else {
            false
        };

        if !is_json_response {
            return Err(Error::new(
                ErrorKind::InvalidData,
                "invalid Content-Type; expected JSON",
            ));
        }

        Ok(HttpResponse { status, body })
    }

    async fn process_request(
        self,
    ) -> Result<
        (
            hyper::StatusCode,
            http::HeaderMap<http::HeaderValue>,
            hyper::body::Bytes,
        ),
        Error,
    > {
        let client: hyper::Client<_, hyper::Body> = hyper::Client::builder().build(self.connector);

        let mut current_attempt = 1;

        loop {
            let mut request = hyper::Request::builder()
                .method(&self.method)
                .uri(&self.uri);

            let request_body = match &self.body {
                Some(RequestBody::Json(body)) => {
                    request = request.header(hyper::header::CONTENT_TYPE, CONTENT_TYPE_JSON);
                    hyper::Body::from(body.clone())
                }
                Some(RequestBody::Form(body)) => {
                    request = request.header(hyper::header::CONTENT_TYPE, CONTENT_TYPE_FORM);
                    hyper::Body::from(body.clone())
                }
                None => hyper::Body::default(),
            };

            for (header_name, header_value) in &self.headers {
                request = request.header(header_name, header_value);
            }

            let request = request
                .body(request_body)
                .map_err(|err| Error::new(ErrorKind::InvalidInput, err))?;

            log::debug!("{} {}", self.method, redact_query(&self.uri));

            let mut is_throttled = false;
            let response_future = async {
                match client.request(request).await {
                    Ok(response) => {
                        let (
                            http::response::Parts {
                                status: response_status,
                                headers: response_headers,
                                ..
                            },
                            response_body,
                        ) = response.into_parts();

                        // Make sure to download body inside the timeout
                        let response_body = hyper::body::to_bytes(response_body)
                            .await
                            .map_err(|err| Error::new(ErrorKind::Other, err))?;

                        log::debug!("{} {} -> {}", self.method, redact_query(&self.uri), response_status);

                        // if response throttled, go into exponential backoff
                        if response_status == http::StatusCode::TOO_MANY_REQUESTS {
                            is_throttled = true;
                            Err(Error::new(ErrorKind::Other, "429: Too many requests"))
                        } else {
                            Ok((response_status, response_headers, response_body))
                        }
                    }
                    Err(err) => {
                        if err.is_connect() {
                            // Network error.
                            Err(Error::new(ErrorKind::NotConnected, err))
                        } else {
                            Err(Error::new(ErrorKind::Other, err))
                        }
                    }
                }
            };

            let err = match tokio::time::timeout(self.timeout, response_future).await {
                Ok(response) => match response {
                    Ok(response) => return Ok(response),
                    Err(err) => err,
                },

                Err(timeout) => timeout.into(),
            };

            if is_throttled {
                if let Some(backoff_duration) =
                    DEFAULT_BACKOFF.get_backoff_duration(current_attempt)
                {
                    log::warn!(
                        "HTTP request throttled (attempt {} of {}). Sleeping for {} seconds.",
                        current_attempt,
                        DEFAULT_BACKOFF.max_retries() + 1,
                        backoff_duration.as_secs()
                    );
                    tokio::time::sleep(backoff_duration).await;
                } else {
                    log::warn!(
                        "Final HTTP request throttled (attempt {} of {}).",
                        current_attempt,
                        DEFAULT_BACKOFF.max_retries() + 1,
                    );
                    return Err(err);
                }
            } else {
                log::warn!(
                    "Failed to send HTTP request (attempt {} of {}): {}",
                    current_attempt,
                    self.retries + 1,
                    err
                );

                if current_attempt > self.retries {
                    return Err(err);
                }

                // Wait a short time between failed requests.
                tokio::time::sleep(tokio::time::Duration::from_secs(3)).await;
            }

            current_attempt += 1;
        }
    }
}

/// Query strings may carry client ids or resource names but never secrets; still, keep
/// log lines to the path.
fn redact_query(uri: &str) -> &str {
    uri.split_once('?').map_or(uri, |(path, _)| path)
}

#[derive(Debug)]
pub struct HttpResponse {
    status: hyper::StatusCode,
    body: hyper::body::Bytes,
}

impl HttpResponse {
    pub fn into_parts(self) -> (hyper::StatusCode, hyper::body::Bytes) {
        (self.status, self.body)
    }
}
