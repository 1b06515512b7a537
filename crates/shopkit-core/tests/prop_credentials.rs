//! Property tests for credential application

use proptest::prelude::*;
use shopkit_core::{Credential, CredentialProvider, HeaderValue, Method, Request};

fn header_name() -> impl Strategy<Value = String> {
    "x-[a-z]{1,10}"
}

fn request_strategy() -> impl Strategy<Value = Request> {
    (
        prop::collection::btree_map(header_name(), "[a-zA-Z0-9 ]{0,16}", 0..5),
        prop::option::of("[a-z0-9{}\":,]{0,32}"),
        "(/[a-z0-9]{1,8}){1,3}",
    )
        .prop_map(|(headers, body, path)| {
            let mut request = Request::parse(Method::POST, &format!("https://demo-shop.myshopify.com{}", path))
                .expect("valid uri");
            for (name, value) in headers {
                request = request.with_header(
                    name.parse().expect("valid header name"),
                    HeaderValue::from_str(&value).expect("valid header value"),
                );
            }
            match body {
                Some(body) => request.with_body(body),
                None => request,
            }
        })
}

fn credential_strategy() -> impl Strategy<Value = Credential> {
    prop_oneof![
        ("[a-z]{1,12}", "[a-z]{1,12}", "[a-z0-9]{1,12}")
            .prop_map(|(key, secret, password)| Credential::shared_secret(key, secret, password).unwrap()),
        "[a-zA-Z0-9]{10,100}".prop_map(|token| Credential::bearer_token(token).unwrap()),
    ]
}

proptest! {
    #[test]
    fn apply_adds_exactly_one_header(credential in credential_strategy(), request in request_strategy()) {
        let applied = credential.apply(request.clone());
        let name = credential.header_name();

        prop_assert_eq!(applied.headers().get_all(&name).iter().count(), 1);
        prop_assert_eq!(applied.headers().get(&name), Some(credential.header_value()));
        prop_assert_eq!(applied.headers().len(), request.headers().len() + 1);
        prop_assert_eq!(applied.body(), request.body());
        prop_assert_eq!(applied.uri(), request.uri());
        for (header, value) in request.headers() {
            prop_assert_eq!(applied.headers().get(header), Some(value));
        }
    }

    #[test]
    fn apply_twice_is_apply_once(credential in credential_strategy(), request in request_strategy()) {
        let once = credential.apply(request);
        let twice = credential.apply(once.clone());
        prop_assert_eq!(once, twice);
    }
}
