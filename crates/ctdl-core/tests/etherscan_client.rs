//! Integration test: EtherscanClient against a local scripted API server.

mod common;

use common::api_server::{self, Reply};
use ctdl_core::etherscan::EtherscanClient;
use ctdl_core::fetch::{ArtifactFetcher, RetryingFetcher};
use ctdl_core::retry::{FetchError, RetryPolicy};
use std::collections::HashMap;
use std::time::Duration;

fn client(url: &str) -> EtherscanClient {
    EtherscanClient::new(url, Some("TESTKEY".to_string()))
        .with_timeouts(Duration::from_secs(5), Duration::from_secs(10))
}

fn script(entries: Vec<(&str, Vec<Reply>)>) -> HashMap<String, Vec<Reply>> {
    entries
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

#[test]
fn successful_fetch_returns_bundle() {
    let server = api_server::start(
        HashMap::new(),
        (200, common::ok_body("contract Token {}", "Token")),
    );
    let bundle = client(&server.url).fetch("0xabc").unwrap();
    assert_eq!(bundle.content, "contract Token {}");
    assert_eq!(bundle.contract_name.as_deref(), Some("Token"));
    assert!(bundle.raw_payload.starts_with('['));
    assert_eq!(server.hits("0xabc"), 1);
}

#[test]
fn api_errors_are_classified() {
    let server = api_server::start(
        script(vec![
            ("0x429", vec![(429, String::new())]),
            ("0x500", vec![(500, "oops".to_string())]),
            ("0xempty", vec![(200, String::new())]),
            ("0xlimit", vec![(200, common::notok_body("Max rate limit reached"))]),
            ("0xbad", vec![(200, common::notok_body("Invalid Address format"))]),
        ]),
        (200, common::ok_body("", "")),
    );
    let c = client(&server.url);
    assert!(matches!(c.fetch("0x429"), Err(FetchError::RateLimited(_))));
    assert!(matches!(c.fetch("0x500"), Err(FetchError::BadRequest(_))));
    assert!(matches!(c.fetch("0xempty"), Err(FetchError::EmptyResponse)));
    assert!(matches!(c.fetch("0xlimit"), Err(FetchError::RateLimited(_))));
    assert!(matches!(c.fetch("0xbad"), Err(FetchError::BadRequest(_))));
    assert!(c.fetch("0xunverified").unwrap().is_empty());
}

#[test]
fn unreachable_api_is_connection_refused() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let c = client(&format!("http://127.0.0.1:{}/api", port));
    let err = c.fetch("0x1").unwrap_err();
    assert!(matches!(err, FetchError::ConnectionRefused(_)), "got {err:?}");
    assert!(err.is_transient());
}

#[test]
fn retrying_fetcher_rides_out_throttling() {
    let server = api_server::start(
        script(vec![(
            "0x3",
            vec![
                (429, String::new()),
                (200, common::notok_body("Max rate limit reached")),
                (200, common::ok_body("contract Three {}", "Three")),
            ],
        )]),
        (400, String::new()),
    );
    let fetcher = RetryingFetcher::new(client(&server.url), RetryPolicy::immediate(8));
    let bundle = fetcher.fetch("0x3").unwrap();
    assert_eq!(bundle.contract_name.as_deref(), Some("Three"));
    assert_eq!(server.hits("0x3"), 3);

    let err = fetcher.fetch("0x4").unwrap_err();
    assert_eq!(err.attempts, 1);
    assert_eq!(server.hits("0x4"), 1);
}

#[test]
fn retry_budget_bounds_attempts() {
    let server = api_server::start(HashMap::new(), (503, String::new()));
    let fetcher = RetryingFetcher::new(client(&server.url), RetryPolicy::immediate(8));
    let err = fetcher.fetch("0xslow").unwrap_err();
    assert_eq!(err.attempts, 8);
    assert_eq!(server.hits("0xslow"), 8);
}
