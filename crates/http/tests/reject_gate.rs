//! End-to-end behavior of the managed server over real sockets.

use http::{Response, StatusCode};
use http_body_util::Full;
use hyper::body::Bytes;
use quiesce_http::{FnHandler, HttpServer};
use quiesce_operations::{Listener, ServeError};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

fn ok_body(body: &'static str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::OK)
        .body(Full::new(Bytes::from_static(body.as_bytes())))
        .unwrap()
}

/// Server with a hit-counting handler on `/hello`, bound to an ephemeral
/// port. Returns the server, its address, the serve task, and the counter.
async fn spawn_server(
    handler_delay: Duration,
) -> (
    Arc<HttpServer>,
    SocketAddr,
    tokio::task::JoinHandle<Result<(), ServeError>>,
    Arc<AtomicUsize>,
) {
    let hits = Arc::new(AtomicUsize::new(0));
    let hits_clone = hits.clone();

    let mut server = HttpServer::new("test", "127.0.0.1:0".parse().unwrap());
    server.handle(
        "/hello",
        Arc::new(FnHandler::new(move |_req| {
            let hits = hits_clone.clone();
            async move {
                hits.fetch_add(1, Ordering::SeqCst);
                if !handler_delay.is_zero() {
                    tokio::time::sleep(handler_delay).await;
                }
                ok_body("hello\n")
            }
        })),
    );

    let server = Arc::new(server);
    let serve = {
        let server = Arc::clone(&server);
        tokio::spawn(async move { server.start().await })
    };
    let addr = server.bound_addr().await.expect("server did not bind");

    (server, addr, serve, hits)
}

#[tokio::test]
async fn test_serves_before_reject_and_refuses_after() {
    let (server, addr, serve, hits) = spawn_server(Duration::ZERO).await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("http://{addr}/hello"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), "hello\n");
    assert_eq!(hits.load(Ordering::SeqCst), 1);

    server.reject_new_requests();

    // Every subsequent request gets 503, regardless of path or method,
    // and the handler is never reached.
    for path in ["/hello", "/other", "/hello?x=1"] {
        let response = client
            .get(format!("http://{addr}{path}"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 503);
        assert_eq!(response.text().await.unwrap(), "service is shutting down\n");
    }
    let response = client
        .post(format!("http://{addr}/hello"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 503);

    assert_eq!(hits.load(Ordering::SeqCst), 1);

    server.stop(Instant::now() + Duration::from_secs(1)).await;
    assert!(matches!(serve.await.unwrap(), Err(e) if e.is_closed()));
}

#[tokio::test]
async fn test_unknown_path_is_404_before_reject() {
    let (server, addr, serve, _hits) = spawn_server(Duration::ZERO).await;

    let response = reqwest::Client::new()
        .get(format!("http://{addr}/missing"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);

    server.stop(Instant::now() + Duration::from_secs(1)).await;
    let _ = serve.await.unwrap();
}

#[tokio::test]
async fn test_stop_waits_for_in_flight_request() {
    let (server, addr, serve, hits) = spawn_server(Duration::from_millis(200)).await;
    let client = reqwest::Client::new();

    // Get a request in flight before stopping.
    let request = tokio::spawn({
        let client = client.clone();
        async move { client.get(format!("http://{addr}/hello")).send().await }
    });
    while hits.load(Ordering::SeqCst) == 0 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    server.stop(Instant::now() + Duration::from_secs(2)).await;

    // The in-flight request completed despite the stop.
    let response = request.await.unwrap().unwrap();
    assert_eq!(response.status(), 200);
    assert!(matches!(serve.await.unwrap(), Err(e) if e.is_closed()));
}

#[tokio::test]
async fn test_stop_deadline_abandons_slow_request() {
    let (server, addr, serve, hits) = spawn_server(Duration::from_secs(5)).await;
    let client = reqwest::Client::new();

    let _request = tokio::spawn({
        let client = client.clone();
        async move { client.get(format!("http://{addr}/hello")).send().await }
    });
    while hits.load(Ordering::SeqCst) == 0 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let started = std::time::Instant::now();
    server.stop(Instant::now() + Duration::from_millis(100)).await;

    // The drain wait returned at the deadline, not after the 5s handler.
    assert!(started.elapsed() < Duration::from_secs(1));
    assert!(matches!(serve.await.unwrap(), Err(e) if e.is_closed()));
}

#[tokio::test]
async fn test_rejected_counter_increments() {
    use prometheus_client::metrics::counter::Counter;

    let counter = Counter::default();
    let mut server = HttpServer::new("metrics", "127.0.0.1:0".parse().unwrap());
    server.handle(
        "/hello",
        Arc::new(FnHandler::new(|_req| async { ok_body("hello\n") })),
    );
    let server = Arc::new(server.with_rejected_counter(counter.clone()));

    let serve = {
        let server = Arc::clone(&server);
        tokio::spawn(async move { server.start().await })
    };
    let addr = server.bound_addr().await.unwrap();

    server.reject_new_requests();

    let client = reqwest::Client::new();
    for _ in 0..3 {
        let response = client
            .get(format!("http://{addr}/hello"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 503);
    }
    assert_eq!(counter.get(), 3);

    server.stop(Instant::now() + Duration::from_secs(1)).await;
    let _ = serve.await.unwrap();
}
