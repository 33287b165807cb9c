//! HttpProbe against a local mock gateway.

use cidcheck_probe::{Format, GatewayProbe, HttpProbe, ProbeConfig, ProbeError};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CID: &str = "bafkreigh2akiscaildcqabsyg3dfr6chu3fgpregiymsck7e7aqa4s52zy";

fn probe() -> HttpProbe {
    HttpProbe::new(ProbeConfig {
        scheme: "http".into(),
        ..ProbeConfig::default()
    })
    .unwrap()
}

#[tokio::test]
async fn test_fetch_raw_reads_proxy_cache() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/ipfs/{CID}")))
        .and(query_param("format", "raw"))
        .and(header("accept", "application/vnd.ipld.raw"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("x-proxy-cache", "HIT")
                .set_body_bytes(b"hello world".to_vec()),
        )
        .expect(1)
        .mount(&server)
        .await;

    let source = server.address().to_string();
    let response = probe().fetch(&source, CID, Format::Raw).await.unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.cache_status.as_deref(), Some("HIT"));
    assert_eq!(&response.bytes().await.unwrap()[..], b"hello world");
}

#[tokio::test]
async fn test_fetch_car_reads_saturn_cache() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("format", "car"))
        .and(header("accept", "application/vnd.ipld.car"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("saturn-cache-status", "MISS")
                .set_body_bytes(vec![0u8; 4]),
        )
        .mount(&server)
        .await;

    let source = server.address().to_string();
    let response = probe().fetch(&source, CID, Format::Car).await.unwrap();
    assert_eq!(response.cache_status.as_deref(), Some("MISS"));
}

#[tokio::test]
async fn test_non_success_status_is_a_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let source = server.address().to_string();
    let response = probe().fetch(&source, CID, Format::Raw).await.unwrap();
    assert_eq!(response.status, 500);
    assert!(!response.is_success());
    assert_eq!(response.cache_status, None);
}

#[tokio::test]
async fn test_unreachable_source_is_transport_error() {
    let result = probe().fetch("127.0.0.1:1", CID, Format::Raw).await;
    assert!(matches!(result, Err(ProbeError::Transport(_))));
}
