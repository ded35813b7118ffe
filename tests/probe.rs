use linkdeck::{EndpointMemory, EndpointProber, LinkError, Operation};
use serde_json::json;

fn routes(paths: &[&str]) -> Vec<String> {
    paths.iter().map(|p| (*p).to_owned()).collect()
}

fn prober(base: &str) -> EndpointProber {
    EndpointProber::new(reqwest::Client::new(), base, EndpointMemory::new())
}

#[tokio::test]
async fn not_found_moves_on_and_first_success_stops_the_scan() {
    let mut server = mockito::Server::new_async().await;
    let a = server
        .mock("GET", "/a")
        .with_status(404)
        .expect(1)
        .create_async()
        .await;
    let b = server
        .mock("GET", "/b")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"[{"slug":"x","url":"https://example.com"}]"#)
        .expect(1)
        .create_async()
        .await;
    let c = server.mock("GET", "/c").expect(0).create_async().await;

    let p = prober(&server.url());
    let found = p
        .probe(Operation::List, &routes(&["/a", "/b", "/c"]), None, Some("list"))
        .await
        .unwrap();

    assert_eq!(found.route, "/b");
    assert_eq!(found.data, json!([{ "slug": "x", "url": "https://example.com" }]));
    assert_eq!(p.memory().recall(Operation::List, "list").as_deref(), Some("/b"));
    a.assert_async().await;
    b.assert_async().await;
    c.assert_async().await;
}

#[tokio::test]
async fn server_errors_do_not_abort_the_probe() {
    let mut server = mockito::Server::new_async().await;
    let a = server
        .mock("GET", "/a")
        .with_status(500)
        .expect(1)
        .create_async()
        .await;
    server
        .mock("GET", "/b")
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;

    let found = prober(&server.url())
        .probe(Operation::List, &routes(&["/a", "/b"]), None, None)
        .await
        .unwrap();
    assert_eq!(found.route, "/b");
    a.assert_async().await;
}

#[tokio::test]
async fn exhaustion_reports_the_last_server_error() {
    let mut server = mockito::Server::new_async().await;
    server.mock("GET", "/a").with_status(503).create_async().await;
    server.mock("GET", "/b").with_status(404).create_async().await;

    let err = prober(&server.url())
        .probe(Operation::List, &routes(&["/a", "/b"]), None, Some("list"))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        LinkError::NetworkExhausted {
            operation: Operation::List,
            attempts: 2,
            last: Some("server responded with 503".into()),
        }
    );
}

#[tokio::test]
async fn only_missing_routes_means_unreachable() {
    let mut server = mockito::Server::new_async().await;
    server.mock("GET", "/a").with_status(404).create_async().await;
    server.mock("GET", "/b").with_status(405).create_async().await;

    let p = prober(&server.url());
    let err = p
        .probe(Operation::List, &routes(&["/a", "/b"]), None, Some("list"))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "unable to reach URL shortener service");
    assert!(p.memory().is_empty());
}

#[tokio::test]
async fn remembered_route_skips_the_candidates() {
    let mut server = mockito::Server::new_async().await;
    let a = server.mock("GET", "/a").expect(0).create_async().await;
    let b = server
        .mock("GET", "/b")
        .with_status(200)
        .with_body("[]")
        .expect(1)
        .create_async()
        .await;

    let p = prober(&server.url());
    p.memory().remember(Operation::List, "list", "/b");
    let found = p
        .probe(Operation::List, &routes(&["/a", "/b"]), None, Some("list"))
        .await
        .unwrap();
    assert_eq!(found.route, "/b");
    a.assert_async().await;
    b.assert_async().await;
}

#[tokio::test]
async fn stale_remembered_route_falls_back_to_a_full_scan() {
    let mut server = mockito::Server::new_async().await;
    let gone = server
        .mock("GET", "/gone")
        .with_status(404)
        .expect(1)
        .create_async()
        .await;
    server
        .mock("GET", "/a")
        .with_status(200)
        .with_body("[]")
        .create_async()
        .await;

    let p = prober(&server.url());
    p.memory().remember(Operation::List, "list", "/gone");
    let found = p
        .probe(Operation::List, &routes(&["/a"]), None, Some("list"))
        .await
        .unwrap();
    assert_eq!(found.route, "/a");
    assert_eq!(p.memory().recall(Operation::List, "list").as_deref(), Some("/a"));
    gone.assert_async().await;
}

#[tokio::test]
async fn failing_remembered_route_is_retried_in_its_slot() {
    let mut server = mockito::Server::new_async().await;
    server.mock("GET", "/a").with_status(404).create_async().await;
    let b = server
        .mock("GET", "/b")
        .with_status(503)
        .expect(2)
        .create_async()
        .await;
    server
        .mock("GET", "/c")
        .with_status(200)
        .with_body("[]")
        .create_async()
        .await;

    let p = prober(&server.url());
    p.memory().remember(Operation::List, "list", "/b");
    let found = p
        .probe(Operation::List, &routes(&["/a", "/b", "/c"]), None, Some("list"))
        .await
        .unwrap();
    assert_eq!(found.route, "/c");
    assert_eq!(p.memory().recall(Operation::List, "list").as_deref(), Some("/c"));
    b.assert_async().await;
}

#[tokio::test]
async fn non_json_success_is_not_accepted() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/a")
        .with_status(200)
        .with_header("content-type", "text/html")
        .with_body("<!doctype html><html></html>")
        .create_async()
        .await;
    server
        .mock("GET", "/b")
        .with_status(200)
        .with_body(r#"{"items":[]}"#)
        .create_async()
        .await;

    let found = prober(&server.url())
        .probe(Operation::List, &routes(&["/a", "/b"]), None, None)
        .await
        .unwrap();
    assert_eq!(found.route, "/b");
    assert_eq!(found.data, json!({ "items": [] }));
}

#[tokio::test]
async fn body_is_sent_as_json() {
    let mut server = mockito::Server::new_async().await;
    let create = server
        .mock("POST", "/shorten")
        .match_header("content-type", "application/json")
        .match_body(mockito::Matcher::Json(json!({ "url": "https://example.com" })))
        .with_status(201)
        .with_body(r#"{"slug":"s","url":"https://example.com"}"#)
        .create_async()
        .await;

    let body = json!({ "url": "https://example.com" });
    let found = prober(&server.url())
        .probe(Operation::Create, &routes(&["/shorten"]), Some(&body), None)
        .await
        .unwrap();
    assert_eq!(found.data["slug"], "s");
    create.assert_async().await;
}

#[tokio::test]
async fn connection_failures_are_recorded() {
    // Nothing listens on port 1.
    let err = prober("http://127.0.0.1:1")
        .probe(Operation::List, &routes(&["/a"]), None, None)
        .await
        .unwrap_err();
    match err {
        LinkError::NetworkExhausted { attempts, last, .. } => {
            assert_eq!(attempts, 1);
            assert!(last.is_some());
        }
        other => panic!("unexpected error: {other:?}"),
    }
}
