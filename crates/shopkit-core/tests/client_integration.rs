//! Client verbs against a live HTTP server

mod support;

use serde_json::json;
use shopkit_core::{Content, Credential, Error, HeaderMap, HeaderValue};
use support::{client_for, client_with, http_config, ACCESS_TOKEN};
use wiremock::matchers::{body_json, header, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn get_sends_query_and_default_headers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/admin/products.json"))
        .and(query_param("limit", "5"))
        .and(header("accept", "application/json"))
        .and(header_exists("user-agent"))
        .and(header("x-access-token", ACCESS_TOKEN))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"products": [{"id": 1}]})))
        .expect(1)
        .mount(&server)
        .await;

    let mut client = client_for(&server);
    client.authenticate(Credential::bearer_token(ACCESS_TOKEN).unwrap());

    let content = client
        .get("products.json", json!({"limit": 5}), HeaderMap::new())
        .await
        .unwrap();
    assert_eq!(content, Content::Json(json!({"products": [{"id": 1}]})));
    assert!(client.last_response().unwrap().is_success());
}

#[tokio::test]
async fn post_sends_json_body_with_basic_auth() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/admin/products.json"))
        .and(header("authorization", "Basic a2V5OnBhc3N3b3Jk"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({"product": {"title": "Hat"}})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"product": {"id": 9}})))
        .expect(1)
        .mount(&server)
        .await;

    let mut client = client_for(&server);
    client.authenticate(Credential::shared_secret("key", "secret", "password").unwrap());

    let content = client
        .post("products.json", json!({"product": {"title": "Hat"}}), HeaderMap::new())
        .await
        .unwrap();
    assert_eq!(content.as_json().unwrap()["product"]["id"], 9);
}

#[tokio::test]
async fn caller_headers_win_over_defaults() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/admin/reports.csv"))
        .and(header("accept", "text/csv"))
        .respond_with(ResponseTemplate::new(200).set_body_string("id,title\n1,Hat\n"))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let mut headers = HeaderMap::new();
    headers.insert("accept", HeaderValue::from_static("text/csv"));

    let content = client.get("reports.csv", json!({}), headers).await.unwrap();
    assert_eq!(content, Content::Text("id,title\n1,Hat\n".to_string()));
}

#[tokio::test]
async fn rate_limited_call_is_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/admin/shop.json"))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("retry-after", "0")
                .insert_header("x-shopify-shop-api-call-limit", "40/40"),
        )
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/admin/shop.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"shop": {"id": 1}})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let content = client.get("shop.json", json!({}), HeaderMap::new()).await.unwrap();
    assert_eq!(content.as_json().unwrap()["shop"]["id"], 1);
}

#[tokio::test]
async fn exhausted_retries_surface_rate_limit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/admin/shop.json"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "0"))
        .expect(3)
        .mount(&server)
        .await;

    let client = client_with(&server, http_config().with_retries(2));
    let err = client.get("shop.json", json!({}), HeaderMap::new()).await.unwrap_err();

    match err {
        Error::RateLimitExceeded { limit, .. } => assert_eq!(limit, 40),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(client.last_response().is_none());
}

#[tokio::test]
async fn redirects_are_followed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/admin/old.json"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/admin/new.json"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/admin/new.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"moved": true})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let content = client.get("old.json", json!({}), HeaderMap::new()).await.unwrap();
    assert_eq!(content, Content::Json(json!({"moved": true})));
}

#[tokio::test]
async fn validation_errors_carry_details() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/admin/products/1.json"))
        .respond_with(
            ResponseTemplate::new(422).set_body_json(json!({"errors": {"title": ["can't be blank"]}})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client
        .put("products/1.json", json!({"product": {"title": ""}}), HeaderMap::new())
        .await
        .unwrap_err();

    match err {
        Error::ValidationFailed { errors, .. } => {
            assert_eq!(errors, Some(json!({"title": ["can't be blank"]})));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn head_and_delete() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/admin/shop.json"))
        .respond_with(ResponseTemplate::new(200).insert_header("x-shopify-shop-api-call-limit", "2/40"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/admin/products/1.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let response = client.head("shop.json", json!({}), HeaderMap::new()).await.unwrap();
    assert_eq!(response.header("x-shopify-shop-api-call-limit"), Some("2/40"));

    let content = client.delete("products/1.json", json!({}), HeaderMap::new()).await.unwrap();
    assert_eq!(content, Content::Json(json!({})));
}
