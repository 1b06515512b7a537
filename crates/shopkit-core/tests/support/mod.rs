//! Shared test support utilities for integration tests

#![allow(dead_code)]

use std::sync::Arc;

use serde_json::Value;
use shopkit_core::{Client, HttpConfig, ReqwestTransport, SdkConfig, ShopSdk};
use wiremock::MockServer;

pub const SHOP_DOMAIN: &str = "demo-shop.myshopify.com";
pub const ACCESS_TOKEN: &str = "abcdef1234567890";

/// HTTP settings with short timeouts for local servers
pub fn http_config() -> HttpConfig {
    HttpConfig::default().with_request_timeout(std::time::Duration::from_secs(10))
}

/// Client pointed at a mock server over the real transport
pub fn client_for(server: &MockServer) -> Client {
    client_with(server, http_config())
}

pub fn client_with(server: &MockServer, config: HttpConfig) -> Client {
    let transport = ReqwestTransport::new(&config).expect("transport");
    Client::with_endpoint(&server.uri(), Arc::new(transport), config).expect("client")
}

/// SDK pointed at a mock server
pub fn sdk_for(server: &MockServer, password: Option<&str>) -> ShopSdk {
    let mut config = SdkConfig::new("app-key", "app-secret", SHOP_DOMAIN).with_http(http_config());
    if let Some(password) = password {
        config = config.with_password(password);
    }
    let transport = ReqwestTransport::new(&config.http).expect("transport");
    ShopSdk::with_transport(config, &server.uri(), Arc::new(transport)).expect("sdk")
}

/// `Link` header value for one relation on the mock server
pub fn link(server: &MockServer, path_and_query: &str, rel: &str) -> String {
    format!("<{}{}>; rel=\"{}\"", server.uri(), path_and_query, rel)
}

pub fn ids(value: &Value) -> Vec<u64> {
    value
        .as_array()
        .expect("array")
        .iter()
        .map(|item| item["id"].as_u64().expect("id"))
        .collect()
}
