use std::future::Future;
use std::sync::{Arc, Mutex};

use crud_api::{
    HttpApiConfig, HttpApiError, HttpClient, QueryOptions, RequestDescriptor, RequestHooks,
    ResponseData, Verb,
};
use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio::time::{timeout, Duration};

fn allow_local_integration() -> bool {
    std::env::var("CRUD_API_ALLOW_LOCAL_INTEGRATION")
        .map(|value| matches!(value.as_str(), "1" | "true" | "TRUE" | "yes" | "YES"))
        .unwrap_or(false)
}

/// Serves exactly one scripted HTTP response on a local port and returns the
/// raw request text it observed.
struct OneShotServer {
    base_url: String,
    handle: JoinHandle<String>,
}

impl OneShotServer {
    async fn start(status: u16, content_type: &'static str, body: &'static str) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("local TCP listener should bind");
        let addr = listener.local_addr().expect("resolved listener address");
        let base_url = format!("http://{addr}");

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.expect("accept connection");
            let mut request = Vec::new();
            let mut chunk = [0u8; 1024];
            loop {
                let read = socket.read(&mut chunk).await.expect("read request");
                if read == 0 {
                    break;
                }
                request.extend_from_slice(&chunk[..read]);
                if request.windows(4).any(|window| window == b"\r\n\r\n") {
                    break;
                }
            }

            let mut response = format!("HTTP/1.1 {status} Scripted\r\n");
            if !content_type.is_empty() {
                response.push_str(&format!("content-type: {content_type}\r\n"));
            }
            response.push_str(&format!(
                "content-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            ));
            socket
                .write_all(response.as_bytes())
                .await
                .expect("write response");
            socket.shutdown().await.ok();

            String::from_utf8_lossy(&request).into_owned()
        });

        Self { base_url, handle }
    }

    async fn observed_request(self) -> String {
        self.handle.await.expect("server task")
    }
}

#[derive(Clone, Default)]
struct RecordingHooks {
    failures: Arc<Mutex<Vec<Option<u16>>>>,
}

impl RequestHooks for RecordingHooks {
    fn on_request_failure(&self, failure: &HttpApiError) -> impl Future<Output = ()> + Send {
        let failures = Arc::clone(&self.failures);
        let status = failure.status();
        async move {
            failures.lock().expect("failure log").push(status);
        }
    }
}

async fn dispatch_one(
    request: RequestDescriptor,
) -> Result<crud_api::ResponseEnvelope, HttpApiError> {
    let client = HttpClient::new(HttpApiConfig::new()).expect("client");
    timeout(Duration::from_secs(5), client.dispatch(request))
        .await
        .expect("dispatch should not hang")
}

#[tokio::test]
async fn success_response_decodes_json_and_carries_the_query_string() {
    if !allow_local_integration() {
        return;
    }

    let server = OneShotServer::start(200, "application/json", r#"{"id":1}"#).await;
    let url = format!("{}/articles", server.base_url);
    let request = RequestDescriptor::new(Verb::Get, url)
        .with_options(QueryOptions::new().with_offset(5).with_sort(["name"]));

    let envelope = dispatch_one(request).await.expect("success");
    assert_eq!(envelope.status, 200);
    assert_eq!(envelope.data, ResponseData::Json(json!({"id": 1})));

    let observed = server.observed_request().await;
    assert!(observed.starts_with("GET /articles?offset=5&sort[]=name HTTP/1.1"));
}

#[tokio::test]
async fn empty_body_resolves_successfully_with_an_absent_body() {
    if !allow_local_integration() {
        return;
    }

    let server = OneShotServer::start(200, "", "").await;
    let url = format!("{}/articles/1", server.base_url);
    let request = RequestDescriptor::new(Verb::Get, url);

    let envelope = dispatch_one(request).await.expect("success");
    assert_eq!(envelope.status, 200);
    assert!(envelope.data.is_empty());
    server.observed_request().await;
}

#[tokio::test]
async fn plain_text_error_pages_reach_the_caller_through_the_failure_hook() {
    if !allow_local_integration() {
        return;
    }

    let server = OneShotServer::start(404, "text/plain", "no such article").await;
    let url = format!("{}/articles/9", server.base_url);
    let hooks = RecordingHooks::default();
    let client = HttpClient::with_hooks(HttpApiConfig::new(), hooks.clone()).expect("client");

    let error = timeout(
        Duration::from_secs(5),
        client.dispatch(RequestDescriptor::new(Verb::Get, url)),
    )
    .await
    .expect("dispatch should not hang")
    .unwrap_err();

    let envelope = error.envelope().expect("status failure envelope");
    assert_eq!(envelope.status, 404);
    assert_eq!(envelope.data.as_text(), Some("no such article"));
    assert_eq!(*hooks.failures.lock().expect("failure log"), vec![Some(404)]);
    server.observed_request().await;
}

#[tokio::test]
async fn transport_failures_route_through_the_hook_before_re_raise() {
    if !allow_local_integration() {
        return;
    }

    // Bind then drop a local port so the connection is refused outright.
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("local TCP listener should bind");
    let addr = listener.local_addr().expect("resolved listener address");
    drop(listener);

    let hooks = RecordingHooks::default();
    let client = HttpClient::with_hooks(HttpApiConfig::new(), hooks.clone()).expect("client");
    let url = format!("http://{addr}/articles");

    let error = timeout(
        Duration::from_secs(5),
        client.dispatch(RequestDescriptor::new(Verb::Get, url)),
    )
    .await
    .expect("dispatch should not hang")
    .unwrap_err();

    assert!(matches!(error, HttpApiError::Transport(_)));
    assert!(error.envelope().is_none());
    assert_eq!(*hooks.failures.lock().expect("failure log"), vec![None]);
}

#[tokio::test]
async fn status_just_below_the_threshold_is_not_a_failure() {
    if !allow_local_integration() {
        return;
    }

    let server = OneShotServer::start(399, "text/plain", "almost").await;
    let url = format!("{}/articles", server.base_url);
    let request = RequestDescriptor::new(Verb::Get, url);

    let envelope = dispatch_one(request).await.expect("success");
    assert_eq!(envelope.status, 399);
    assert_eq!(envelope.data.as_text(), Some("almost"));
    server.observed_request().await;
}
