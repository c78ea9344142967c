use std::time::Duration;

use serde_json::{json, Value};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use invoice_loadtest::config::Config;
use invoice_loadtest::errors::ProvisionError;
use invoice_loadtest::identity::{register, register_once};

fn config_for(server: &MockServer) -> Config {
    Config {
        base_url: format!("{}/api", server.uri()),
        registration_retry_delay: Duration::from_millis(10),
        ..Config::default()
    }
}

fn sent_bodies(requests: &[wiremock::Request]) -> Vec<Value> {
    requests
        .iter()
        .map(|r| serde_json::from_slice(&r.body).unwrap())
        .collect()
}

#[tokio::test]
async fn register_returns_token_on_201() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/register"))
        .and(header("Content-Type", "application/json"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "token": "abc.def" })))
        .expect(1)
        .mount(&server)
        .await;

    let client = reqwest::Client::new();
    let registration = register(&client, &config_for(&server)).await.unwrap();

    assert_eq!(registration.credential.as_str(), "abc.def");
    assert!(registration.email.starts_with("loadtest_"));
}

#[tokio::test]
async fn register_sends_new_company_payload() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/register"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "token": "t" })))
        .mount(&server)
        .await;

    let client = reqwest::Client::new();
    let config = Config {
        password: "S3cret!".to_string(),
        ..config_for(&server)
    };
    let registration = register_once(&client, &config).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let body = &sent_bodies(&requests)[0];

    assert_eq!(body["email"], registration.email.as_str());
    assert_eq!(body["companyEmail"], registration.email.as_str());
    assert_eq!(body["password"], "S3cret!");
    assert_eq!(body["firstName"], "Load");
    assert_eq!(body["lastName"], "Test");
    assert_eq!(body["registrationType"], "NEW_COMPANY");
    assert_eq!(body["companyAddress"], "123 Test St");
    assert_eq!(body["companyPhone"], "555-0123");
    assert!(body["taxId"].as_str().unwrap().starts_with('B'));
}

#[tokio::test]
async fn rejection_surfaces_response_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/register"))
        .respond_with(ResponseTemplate::new(409).set_body_string("Email already in use"))
        .expect(1)
        .mount(&server)
        .await;

    let client = reqwest::Client::new();
    let err = register(&client, &config_for(&server)).await.unwrap_err();

    match err {
        ProvisionError::Rejected { status, body } => {
            assert_eq!(status, 409);
            assert_eq!(body, "Email already in use");
        }
        other => panic!("expected Rejected, got {:?}", other),
    }
}

#[tokio::test]
async fn success_status_other_than_201_is_rejected() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": "t" })))
        .mount(&server)
        .await;

    let client = reqwest::Client::new();
    let err = register(&client, &config_for(&server)).await.unwrap_err();
    assert!(matches!(err, ProvisionError::Rejected { status: 200, .. }));
}

#[tokio::test]
async fn created_without_token_is_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": 7 })))
        .mount(&server)
        .await;

    let client = reqwest::Client::new();
    let err = register(&client, &config_for(&server)).await.unwrap_err();
    assert!(matches!(err, ProvisionError::MissingToken(_)));
}

#[tokio::test]
async fn unreachable_server_is_a_transport_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let config = Config {
        base_url: format!("http://{}/api", addr),
        ..Config::default()
    };
    let client = reqwest::Client::new();
    let err = register(&client, &config).await.unwrap_err();
    assert!(matches!(err, ProvisionError::Transport(_)));
}

#[tokio::test]
async fn retries_with_a_fresh_identity() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/register"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/register"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "token": "second" })))
        .mount(&server)
        .await;

    let client = reqwest::Client::new();
    let config = Config {
        registration_retries: 2,
        ..config_for(&server)
    };
    let registration = register(&client, &config).await.unwrap();
    assert_eq!(registration.credential.as_str(), "second");

    let bodies = sent_bodies(&server.received_requests().await.unwrap());
    assert_eq!(bodies.len(), 2);
    assert_ne!(bodies[0]["email"], bodies[1]["email"]);
}

#[tokio::test]
async fn no_retry_by_default() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let client = reqwest::Client::new();
    assert!(register(&client, &config_for(&server)).await.is_err());
}

#[tokio::test]
async fn repeated_registrations_do_not_collide() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "token": "t" })))
        .expect(2)
        .mount(&server)
        .await;

    let client = reqwest::Client::new();
    let config = config_for(&server);
    let first = register(&client, &config).await.unwrap();
    let second = register(&client, &config).await.unwrap();

    assert_ne!(first.email, second.email);
    let bodies = sent_bodies(&server.received_requests().await.unwrap());
    assert_ne!(bodies[0]["taxId"], bodies[1]["taxId"]);
    assert_ne!(bodies[0]["companyName"], bodies[1]["companyName"]);
}
