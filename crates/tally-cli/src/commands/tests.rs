//! Unit tests for CLI commands.

use super::*;

use tally_config::TallyToml;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Create a command context pointed at a mock registry
fn create_test_context(server: &MockServer) -> CommandContext {
    let mut config = TallyToml::default();
    config.registry.url = server.uri();
    config.registry.max_retries = 0;
    config.fetch.concurrency = 2;

    CommandContext::from_config(std::env::temp_dir(), config).unwrap()
}

async fn mount_catalog(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/simple/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "<!DOCTYPE html>\n<html><body>\n<a href=\"/simple/old/\">old</a>\n<a href=\"/simple/new/\">new</a>\n<a href=\"/simple/gone/\">gone</a>\n<a href=\"/simple/bare/\">bare</a>\n</body></html>\n",
        ))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/pypi/old/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "releases": {
                "0.1": [{ "upload_time": "2012-03-04T05:06:07" }],
                "0.2": [{ "upload_time": "2013-01-01T00:00:00" }]
            }
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/pypi/new/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "releases": { "1.0": [{ "upload_time": "2012-03-05T00:00:00" }] }
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/pypi/gone/json"))
        .respond_with(ResponseTemplate::new(404))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/pypi/bare/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "releases": { "1.0": [] }
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_context_from_config() {
    let server = MockServer::start().await;
    let ctx = create_test_context(&server);

    assert_eq!(ctx.registry().as_str(), server.uri());
    assert_eq!(ctx.config.fetch.concurrency, 2);
}

#[tokio::test]
async fn test_context_rejects_bad_registry() {
    let mut config = TallyToml::default();
    config.registry.url = "not a url".to_string();

    assert!(CommandContext::from_config(std::env::temp_dir(), config).is_err());
}

#[tokio::test]
async fn test_cli_overrides() {
    let global = GlobalOptions {
        registry: Some("http://localhost:3141".to_string()),
        concurrency: Some(4),
        ..GlobalOptions::default()
    };

    let overrides = cli_overrides(&global);
    assert_eq!(overrides.get("registry").map(String::as_str), Some("http://localhost:3141"));
    assert_eq!(overrides.get("concurrency").map(String::as_str), Some("4"));
}

#[tokio::test]
async fn test_report_collects_catalog() {
    let server = MockServer::start().await;
    mount_catalog(&server).await;
    let ctx = create_test_context(&server);

    let index = report::discover(&ctx).await.unwrap();
    assert_eq!(index.len(), 4);

    let report = report::collect(&index, 1).await;
    assert_eq!(
        serde_json::to_value(&report).unwrap(),
        serde_json::json!({
            "3/4/2012": { "new": 1, "total": 1 },
            "3/5/2012": { "new": 1, "total": 2 }
        })
    );

    let summary = index.summary();
    assert_eq!(summary.resolved, 2);
    assert_eq!(summary.http_errors, 1);
    assert_eq!(summary.empty, 1);
}

#[tokio::test]
async fn test_report_execute() {
    let server = MockServer::start().await;
    mount_catalog(&server).await;
    let ctx = create_test_context(&server);

    assert!(report::execute(Some(0), false, &ctx).await.is_ok());
}

#[tokio::test]
async fn test_report_fails_when_catalog_is_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/simple/"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;
    let ctx = create_test_context(&server);

    let err = report::execute(None, false, &ctx).await.unwrap_err();
    assert!(matches!(err, TallyError::HttpStatus { status: 502, .. }));
}

#[tokio::test]
async fn test_ctime_lookup_lines() {
    let server = MockServer::start().await;
    mount_catalog(&server).await;
    let ctx = create_test_context(&server);

    let transport: Arc<dyn tally_registry::Transport> = ctx.client.clone();
    let index = tally_index::CatalogIndex::with_concurrency(
        vec!["old".to_string(), "gone".to_string(), "bare".to_string()],
        transport,
        ctx.registry().clone(),
        2,
    );

    let lines = ctime::lookup(&index).await;
    assert_eq!(
        lines,
        vec![
            "old\t2012-03-04T05:06:07+00:00".to_string(),
            "gone\tnone (HTTP 404)".to_string(),
            "bare\tnone (no release files)".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_list_execute() {
    let server = MockServer::start().await;
    mount_catalog(&server).await;
    let ctx = create_test_context(&server);

    assert!(list::execute(true, &ctx).await.is_ok());
    assert!(list::execute(false, &ctx).await.is_ok());
}
