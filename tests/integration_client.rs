//! Integration tests: the full client through the real curl transport
//! against a scripted local server.

mod common;

use std::io::Read;
use std::time::Duration;

use backstop::client::{Client, ClientConfig};
use backstop::error::Error;
use backstop::http::Request;
use backstop::retry::ExponentialBackoff;
use backstop::transport::CurlTransport;
use common::http_server::{start, Step};
use url::Url;

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn fast_policy() -> ExponentialBackoff {
    ExponentialBackoff {
        initial_interval: Duration::from_millis(10),
        randomization_factor: 0.0,
        multiplier: 1.0,
        max_interval: Duration::from_millis(10),
        max_elapsed_time: Some(Duration::from_secs(5)),
    }
}

fn get(url: &str) -> Request {
    Request::get(Url::parse(url).unwrap())
}

#[test]
fn four_oh_four_is_classified_with_the_body_text() {
    init_logging();
    let url = start(vec![Step::Respond {
        status: 404,
        body: "not found",
    }]);
    let client = Client::new(ClientConfig::new(CurlTransport::default()));

    let err = client.execute(&get(&url)).unwrap_err();
    match &err {
        Error::Status(status) => {
            assert_eq!(status.code, 404);
            assert_eq!(status.body, "not found");
        }
        other => panic!("expected a classified status error, got: {}", other),
    }
    assert_eq!(err.to_string(), "failed HTTP call: 404: not found");
}

#[test]
fn dropped_connections_are_retried_until_the_server_answers() {
    init_logging();
    let url = start(vec![
        Step::DropConnection,
        Step::DropConnection,
        Step::Respond {
            status: 200,
            body: "hello",
        },
    ]);
    let client = Client::new(ClientConfig::new(CurlTransport::default()).retry(fast_policy()));

    let resp = client.execute(&get(&url)).expect("retries should recover");
    assert_eq!(resp.status(), 200);
    let mut body = String::new();
    resp.into_body().read_to_string(&mut body).unwrap();
    assert_eq!(body, "hello");
}

#[test]
fn five_oh_three_passes_through_with_the_body_unread() {
    init_logging();
    let url = start(vec![Step::Respond {
        status: 503,
        body: "maintenance",
    }]);
    let client = Client::new(ClientConfig::new(CurlTransport::default()));

    let resp = client.execute(&get(&url)).expect("5xx is not an error here");
    assert_eq!(resp.status(), 503);
    assert!(!resp.body().is_closed(), "body must come back open");
    let mut body = String::new();
    resp.into_body().read_to_string(&mut body).unwrap();
    assert_eq!(body, "maintenance");
}

#[test]
fn unreachable_server_exhausts_retries() {
    init_logging();
    // Nothing listens on this port; every attempt is a connection failure.
    let client = Client::new(
        ClientConfig::new(CurlTransport::default().connect_timeout(Duration::from_millis(200)))
            .retry(ExponentialBackoff {
                initial_interval: Duration::from_millis(10),
                randomization_factor: 0.0,
                multiplier: 1.0,
                max_interval: Duration::from_millis(10),
                max_elapsed_time: Some(Duration::from_millis(300)),
            }),
    );

    let err = client
        .execute(&get("http://127.0.0.1:9/"))
        .unwrap_err();
    assert!(
        err.to_string().starts_with("exhausted all retries: "),
        "got: {}",
        err
    );
    assert!(matches!(err, Error::RetriesExhausted(_)));
}

#[test]
fn response_headers_are_exposed() {
    init_logging();
    let url = start(vec![Step::Respond {
        status: 200,
        body: "ok",
    }]);
    let client = Client::new(ClientConfig::new(CurlTransport::default()));

    let resp = client.execute(&get(&url)).unwrap();
    assert_eq!(resp.header("content-length"), Some("2"));
}
