use bytes::Bytes;
use http::{HeaderMap, Method};
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::{TokioExecutor, TokioIo};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::io::AsyncReadExt;
use tokio::net::TcpListener;

/// One canned upstream response.
#[derive(Clone)]
pub struct Scripted {
    status: u16,
    body: &'static str,
    headers: Vec<(&'static str, String)>,
}

impl Scripted {
    pub fn new(status: u16, body: &'static str) -> Self {
        Self {
            status,
            body,
            headers: Vec::new(),
        }
    }

    pub fn with_header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }
}

/// What the upstream saw for one call.
#[derive(Clone, Debug)]
pub struct RecordedRequest {
    pub method: Method,
    pub path_and_query: String,
    pub headers: HeaderMap,
    pub body: String,
}

#[derive(Default)]
struct State {
    script: Vec<Scripted>,
    requests: Vec<RecordedRequest>,
}

/// A local HTTP upstream that answers with scripted responses in order,
/// repeating the last one once the script runs out.
pub struct TestUpstream {
    addr: SocketAddr,
    state: Arc<Mutex<State>>,
}

impl TestUpstream {
    pub async fn start(script: Vec<Scripted>) -> Self {
        assert!(!script.is_empty(), "script needs at least one response");

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to address");
        let addr = listener.local_addr().unwrap();
        let state = Arc::new(Mutex::new(State {
            script,
            requests: Vec::new(),
        }));

        let server_state = state.clone();
        tokio::spawn(async move {
            loop {
                let (stream, _) = listener.accept().await.unwrap();
                let io = TokioIo::new(stream);
                let state = server_state.clone();

                tokio::spawn(async move {
                    let svc = service_fn(move |req| respond(state.clone(), req));
                    if let Err(err) =
                        hyper_util::server::conn::auto::Builder::new(TokioExecutor::new())
                            .serve_connection(io, svc)
                            .await
                    {
                        eprintln!("Error serving connection: {:?}", err);
                    }
                });
            }
        });

        TestUpstream { addr, state }
    }

    /// `host:port` to configure as the upstream host.
    pub fn host(&self) -> String {
        self.addr.to_string()
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn call_count(&self) -> usize {
        self.state.lock().unwrap().requests.len()
    }
}

async fn respond(
    state: Arc<Mutex<State>>,
    req: Request<Incoming>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let (parts, body) = req.into_parts();
    let body = body
        .collect()
        .await
        .map(|collected| collected.to_bytes())
        .unwrap_or_default();

    let scripted = {
        let mut state = state.lock().unwrap();
        let index = state.requests.len().min(state.script.len() - 1);
        state.requests.push(RecordedRequest {
            method: parts.method,
            path_and_query: parts
                .uri
                .path_and_query()
                .map(|pq| pq.to_string())
                .unwrap_or_default(),
            headers: parts.headers,
            body: String::from_utf8_lossy(&body).into_owned(),
        });
        state.script[index].clone()
    };

    let mut response = Response::new(Full::new(Bytes::from_static(scripted.body.as_bytes())));
    *response.status_mut() = StatusCode::from_u16(scripted.status).unwrap();
    for (name, value) in scripted.headers {
        response
            .headers_mut()
            .insert(name, http::HeaderValue::from_str(&value).unwrap());
    }
    Ok(response)
}

/// A local port with nothing listening on it.
pub async fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}

/// An upstream that reads the start of each request and then closes the
/// connection without answering.
pub struct DroppingUpstream {
    addr: SocketAddr,
    connections: Arc<AtomicUsize>,
}

impl DroppingUpstream {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to address");
        let addr = listener.local_addr().unwrap();
        let connections = Arc::new(AtomicUsize::new(0));

        let counter = connections.clone();
        tokio::spawn(async move {
            loop {
                let (mut stream, _) = listener.accept().await.unwrap();
                counter.fetch_add(1, Ordering::SeqCst);

                tokio::spawn(async move {
                    let mut buf = [0u8; 1024];
                    let _ = stream.read(&mut buf).await;
                    drop(stream);
                });
            }
        });

        DroppingUpstream { addr, connections }
    }

    pub fn host(&self) -> String {
        self.addr.to_string()
    }

    pub fn connection_count(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }
}
