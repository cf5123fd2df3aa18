// Copyright (c) Microsoft. All rights reserved.

use std::sync::{Arc, Mutex};

/// A request received by a [`MockServer`].
#[derive(Clone, Debug)]
pub struct RecordedRequest {
    pub method: hyper::Method,

    /// Path and query, eg `/a/b?api-version=1`.
    pub uri: String,

    /// Header names are lowercase.
    pub headers: std::collections::HashMap<String, String>,

    pub body: Option<String>,
}

impl RecordedRequest {
    async fn from_http(req: hyper::Request<hyper::Body>) -> Self {
        let method = req.method().clone();
        let uri = req
            .uri()
            .path_and_query()
            .map_or_else(|| req.uri().path().to_owned(), ToString::to_string);

        let mut headers = std::collections::HashMap::with_capacity(req.headers().len());
        for (key, value) in req.headers() {
            headers.insert(
                key.to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            );
        }

        let body = hyper::body::to_bytes(req.into_body())
            .await
            .expect("could not read request body");
        let body = if body.is_empty() {
            None
        } else {
            Some(String::from_utf8(body.to_vec()).expect("request body is not UTF-8"))
        };

        RecordedRequest {
            method,
            uri,
            headers,
            body,
        }
    }

    pub fn path(&self) -> &str {
        self.uri.split_once('?').map_or(&self.uri, |(path, _)| path)
    }

    /// The value of query parameter `name`, if present. Values are not percent-decoded.
    pub fn query_param(&self, name: &str) -> Option<&str> {
        let (_, query) = self.uri.split_once('?')?;

        query.split('&').find_map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (key == name).then_some(value)
        })
    }

    pub fn json_body(&self) -> serde_json::Value {
        let body = self.body.as_deref().expect("request has no body");
        serde_json::from_str(body).expect("request body is not JSON")
    }
}

#[derive(Clone, Debug)]
pub enum MockResponse {
    Json {
        status: hyper::StatusCode,
        body: String,
    },

    Text {
        status: hyper::StatusCode,
        body: String,
    },
}

impl MockResponse {
    pub fn json(status: hyper::StatusCode, body: impl serde::Serialize) -> Self {
        let body = serde_json::to_string(&body).unwrap();

        MockResponse::Json { status, body }
    }

    pub fn text(status: hyper::StatusCode, body: impl Into<String>) -> Self {
        MockResponse::Text {
            status,
            body: body.into(),
        }
    }

    fn into_http(self) -> hyper::Response<hyper::Body> {
        let response = hyper::Response::builder();

        let response = match self {
            MockResponse::Json { status, body } => response
                .status(status)
                .header(hyper::header::CONTENT_TYPE, "application/json; charset=utf-8")
                .body(body.into()),

            MockResponse::Text { status, body } => response
                .status(status)
                .header(hyper::header::CONTENT_TYPE, "text/plain")
                .body(body.into()),
        };

        response.unwrap()
    }
}

type Handler = dyn Fn(&RecordedRequest) -> MockResponse + Send + Sync;

/// An HTTP server on `127.0.0.1` that answers every request with the handler's response and
/// records the request. The server stops when this value is dropped.
pub struct MockServer {
    addr: std::net::SocketAddr,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    shutdown: Option<tokio::sync::oneshot::Sender<()>>,
}

impl MockServer {
    pub async fn start<F>(handler: F) -> Self
    where
        F: Fn(&RecordedRequest) -> MockResponse + Send + Sync + 'static,
    {
        let handler: Arc<Handler> = Arc::new(handler);
        let requests: Arc<Mutex<Vec<RecordedRequest>>> = Default::default();

        let make_service = {
            let requests = requests.clone();

            hyper::service::make_service_fn(move |_| {
                let handler = handler.clone();
                let requests = requests.clone();

                let service = hyper::service::service_fn(move |req| {
                    let handler = handler.clone();
                    let requests = requests.clone();

                    async move {
                        let req = RecordedRequest::from_http(req).await;
                        let response = handler(&req);
                        requests.lock().unwrap().push(req);

                        Ok::<_, std::convert::Infallible>(response.into_http())
                    }
                });

                async move { Ok::<_, std::convert::Infallible>(service) }
            })
        };

        let server = hyper::Server::try_bind(&std::net::SocketAddr::from(([127, 0, 0, 1], 0)))
            .expect("could not bind mock server")
            .serve(make_service);
        let addr = server.local_addr();

        let (shutdown, shutdown_rx) = tokio::sync::oneshot::channel();
        let server = server.with_graceful_shutdown(async {
            let _ = shutdown_rx.await;
        });
        tokio::spawn(server);

        MockServer {
            addr,
            requests,
            shutdown: Some(shutdown),
        }
    }

    /// `http://127.0.0.1:<port>`
    pub fn base_uri(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// `http://127.0.0.1:<port><path_and_query>`
    pub fn uri(&self, path_and_query: &str) -> String {
        format!("{}{}", self.base_uri(), path_and_query)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}
