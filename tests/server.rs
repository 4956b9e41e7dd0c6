//! End-to-end dispatch through the HTTP front end.

mod common;

use common::{start_server, test_handlers};
use party_router::config::parse_config;
use party_router::lifecycle::reload;
use reqwest::StatusCode;

const MANIFEST: &str = r#"
[routing]
root_domain = "mydomain.com"
not_found_body = "nothing here"

[[routes]]
path = "/games/{gameID:uint64}/clans"
handlers = ["echo-route", "params"]

[[routes]]
path = "/other2/{x:path}"
handlers = ["echo-route"]

[[routes]]
path = "/other2/static2"
handlers = ["echo-route"]

[[routes]]
method = "POST PUT"
path = "/postvalue"
body = "stored"

[[routes]]
host = "admin."
path = "/"
handlers = ["echo-route"]

[[routes]]
host = "*."
path = "/"
handlers = ["info"]

[[routes]]
path = "/private"
handlers = ["log", "deny", "echo-route"]

[[routes]]
path = "/healthcheck"
handlers = ["healthcheck"]
"#;

async fn get(url: &str, host: &str) -> reqwest::Response {
    reqwest::Client::new()
        .get(url)
        .header(reqwest::header::HOST, host)
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn test_dispatch_binds_params() {
    let server = start_server(MANIFEST).await;

    let res = get(&server.url("/games/42/clans"), "mydomain.com").await;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().contains_key("x-request-id"));
    assert_eq!(
        res.text().await.unwrap(),
        r#"GET /games/{gameID:uint64}/clans{"gameID":"42"}"#
    );
}

#[tokio::test]
async fn test_literal_precedence_over_http() {
    let server = start_server(MANIFEST).await;

    let res = get(&server.url("/other2/static2"), "mydomain.com").await;
    assert_eq!(res.text().await.unwrap(), "GET /other2/static2");

    let res = get(&server.url("/other2/anything/else"), "mydomain.com").await;
    assert_eq!(res.text().await.unwrap(), "GET /other2/{x:path}");
}

#[tokio::test]
async fn test_subdomains() {
    let server = start_server(MANIFEST).await;

    let res = get(&server.url("/"), "admin.mydomain.com").await;
    assert_eq!(res.text().await.unwrap(), "GET admin./");

    let res = get(&server.url("/"), "shop.mydomain.com").await;
    let body = res.text().await.unwrap();
    assert!(body.contains("Subdomain: shop"), "{body}");
}

#[tokio::test]
async fn test_not_found_and_method_not_allowed() {
    let server = start_server(MANIFEST).await;

    let res = get(&server.url("/missing"), "mydomain.com").await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(res.text().await.unwrap(), "nothing here");

    let res = get(&server.url("/postvalue"), "mydomain.com").await;
    assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(res.headers()["allow"], "POST, PUT");

    let res = reqwest::Client::new()
        .put(server.url("/postvalue"))
        .header(reqwest::header::HOST, "mydomain.com")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), "stored");
}

#[tokio::test]
async fn test_method_not_allowed_can_be_disabled() {
    let manifest = MANIFEST.replace(
        "not_found_body = \"nothing here\"",
        "not_found_body = \"nothing here\"\nfire_method_not_allowed = false",
    );
    let server = start_server(&manifest).await;

    let res = get(&server.url("/postvalue"), "mydomain.com").await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert!(res.headers().get("allow").is_none());
}

#[tokio::test]
async fn test_chain_stops() {
    let server = start_server(MANIFEST).await;

    let res = get(&server.url("/private"), "mydomain.com").await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert_eq!(res.text().await.unwrap(), "Forbidden");

    let res = get(&server.url("/healthcheck"), "mydomain.com").await;
    assert_eq!(res.text().await.unwrap(), "ok");
}

#[tokio::test]
async fn test_request_id_is_propagated() {
    let server = start_server(MANIFEST).await;

    let res = reqwest::Client::new()
        .get(server.url("/healthcheck"))
        .header(reqwest::header::HOST, "mydomain.com")
        .header("x-request-id", "req-123")
        .send()
        .await
        .unwrap();
    assert_eq!(res.headers()["x-request-id"], "req-123");
}

#[tokio::test]
async fn test_reload_swaps_table() {
    let server = start_server(MANIFEST).await;
    let before = server.table.load_full();

    let updated = parse_config(
        r#"
        [[routes]]
        path = "/fresh"
        body = "new table"
        "#,
    )
    .unwrap();
    reload(&server.table, &updated, &test_handlers()).unwrap();

    let res = get(&server.url("/fresh"), "mydomain.com").await;
    assert_eq!(res.text().await.unwrap(), "new table");
    let res = get(&server.url("/healthcheck"), "mydomain.com").await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(res.text().await.unwrap(), "Not Found");

    assert_eq!(before.router.len(), 9);
}
