use std::collections::BTreeSet;

use url::Url;
use watcher_core::{normalize, Link};
use watcher_engine::{DeliveryError, Notifier, WebhookNotifier};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn links(values: &[&str]) -> BTreeSet<Link> {
    values
        .iter()
        .map(|s| normalize(s, None).expect("test link should normalize"))
        .collect()
}

#[tokio::test]
async fn posts_subject_and_links_as_json() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let endpoint = Url::parse(&format!("{}/hook", server.uri())).unwrap();
    let notifier = WebhookNotifier::new(endpoint, "New documents uploaded").unwrap();
    notifier
        .notify(&links(&["https://x.example/a", "https://x.example/b"]))
        .await
        .expect("delivery ok");

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let payload: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(payload["subject"], "New documents uploaded");
    let sent: Vec<&str> = payload["links"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap())
        .collect();
    assert_eq!(sent, vec!["https://x.example/a", "https://x.example/b"]);
}

#[tokio::test]
async fn non_success_status_is_a_delivery_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let endpoint = Url::parse(&format!("{}/hook", server.uri())).unwrap();
    let notifier = WebhookNotifier::new(endpoint, "subject").unwrap();

    let err = notifier
        .notify(&links(&["https://x.example/a"]))
        .await
        .unwrap_err();
    assert!(matches!(err, DeliveryError::HttpStatus(502)));
}

#[tokio::test]
async fn unreachable_endpoint_is_a_transport_error() {
    // Port 1 on localhost refuses connections.
    let endpoint = Url::parse("http://127.0.0.1:1/hook").unwrap();
    let notifier = WebhookNotifier::new(endpoint, "subject").unwrap();

    let err = notifier
        .notify(&links(&["https://x.example/a"]))
        .await
        .unwrap_err();
    assert!(matches!(err, DeliveryError::Transport(_)));
}
