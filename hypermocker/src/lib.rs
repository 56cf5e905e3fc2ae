//! Minimal HTTP server for tests. Requests have to be anticipated up front, and the test decides
//! what (and when) to respond, so retries and slow servers can be driven step by step.
use http_body_util::Full;
use hyper::{Request, Response, server::conn::http1, service::Service};
use hyper_util::rt::TokioIo;
use std::{
    collections::{HashMap, VecDeque},
    future::Future,
    net::SocketAddr,
    pin::Pin,
    sync::{Arc, Mutex},
};
use tokio::{net::TcpListener, sync::oneshot};

pub use hyper;
pub use hyper::{StatusCode, body::Bytes, http::request::Parts};

type MockResponse = Response<Full<Bytes>>;

/// Server-side end of an [`AnticipatedRequest`].
struct Expectation {
    request_tx: oneshot::Sender<Parts>,
    response_rx: oneshot::Receiver<MockResponse>,
}

#[derive(Default)]
struct State {
    /// Anticipated requests, keyed by path. Served in the order they were anticipated.
    expectations: HashMap<String, VecDeque<Expectation>>,

    unexpected: Vec<String>,
}

pub struct Server {
    port: u16,
    state: Arc<Mutex<State>>,
}

impl Server {
    /// Create new [`Server`], and bind it to a random port.
    pub async fn bind() -> Self {
        let state = Arc::new(Mutex::new(State::default()));

        let addr = SocketAddr::from(([127, 0, 0, 1], 0));
        let listener = TcpListener::bind(addr)
            .await
            .expect("could not bind the mock server");
        let port = listener
            .local_addr()
            .expect("mock server has no local address")
            .port();

        let state_clone = state.clone();
        tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    log::warn!("Could not accept a connection.");
                    continue;
                };
                let io = TokioIo::new(stream);

                let state = state_clone.clone();
                tokio::task::spawn(async move {
                    if let Err(err) = http1::Builder::new()
                        .serve_connection(io, MockRequest { state })
                        .await
                    {
                        // Clients giving up early (e.g. on timeout) end up here.
                        log::debug!("Connection closed: {err}");
                    }
                });
            }
        });

        Self { port, state }
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Base URL of this server, without a trailing slash.
    pub fn url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    /// Anticipate a request for given path. Anticipating the same path several times queues the
    /// expectations, so the n-th request gets the n-th [`AnticipatedRequest`].
    pub async fn anticipate(&self, path: impl Into<String>) -> AnticipatedRequest {
        let path = path.into();
        log::info!("Anticipating '{path}'.");

        let (request_tx, request_rx) = oneshot::channel();
        let (response_tx, response_rx) = oneshot::channel();

        self.state
            .lock()
            .expect("mock state poisoned")
            .expectations
            .entry(path)
            .or_default()
            .push_back(Expectation {
                request_tx,
                response_rx,
            });

        AnticipatedRequest {
            request_rx,
            response_tx,
        }
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        let Ok(state) = self.state.lock() else {
            return;
        };

        if !state.unexpected.is_empty() && !std::thread::panicking() {
            panic!("there are unexpected requests: {:?}", state.unexpected);
        }
    }
}

/// Test-side end of an anticipated request.
pub struct AnticipatedRequest {
    request_rx: oneshot::Receiver<Parts>,
    response_tx: oneshot::Sender<MockResponse>,
}

impl AnticipatedRequest {
    /// Wait until the request arrives and return its head (URI, headers).
    pub async fn expect(&mut self) -> Parts {
        (&mut self.request_rx)
            .await
            .expect("anticipated request was never made")
    }

    /// Respond with `200 OK`.
    pub async fn respond(self, payload: impl Into<Bytes>) {
        self.respond_with_status(StatusCode::OK, payload).await;
    }

    pub async fn respond_with_status(self, status: StatusCode, payload: impl Into<Bytes>) {
        log::info!("Responding with {status}.");
        let response = Response::builder()
            .status(status)
            .body(Full::new(payload.into()))
            .expect("invalid mock response");

        // The client might have given up already, which is a valid test scenario.
        if self.response_tx.send(response).is_err() {
            log::debug!("Client is gone, response dropped.");
        }
    }
}

struct MockRequest {
    state: Arc<Mutex<State>>,
}

impl Service<Request<hyper::body::Incoming>> for MockRequest {
    type Response = MockResponse;
    type Error = hyper::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, request: Request<hyper::body::Incoming>) -> Self::Future {
        log::info!("Incoming request '{}'.", request.uri());
        let state = self.state.clone();
        Box::pin(async move {
            let (parts, _body) = request.into_parts();

            let expectation = state.lock().ok().and_then(|mut state| {
                state
                    .expectations
                    .get_mut(parts.uri.path())
                    .and_then(VecDeque::pop_front)
            });

            if let Some(Expectation {
                request_tx,
                response_rx,
            }) = expectation
            {
                // Test might have dropped the expectation, it will see no request then.
                let _ = request_tx.send(parts);

                match response_rx.await {
                    Ok(response) => Ok(response),
                    Err(_) => Ok(status_only(StatusCode::INTERNAL_SERVER_ERROR, "dropped")),
                }
            } else {
                log::warn!("Unexpected '{}'.", parts.uri);
                if let Ok(mut state) = state.lock() {
                    state.unexpected.push(parts.uri.to_string());
                }
                Ok(status_only(StatusCode::IM_A_TEAPOT, "unexpected"))
            }
        })
    }
}

fn status_only(status: StatusCode, text: &'static str) -> MockResponse {
    let mut response = Response::new(Full::new(Bytes::from_static(text.as_bytes())));
    *response.status_mut() = status;
    response
}
