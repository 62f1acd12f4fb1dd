mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::Value;

#[tokio::test]
async fn root_is_public() -> Result<()> {
    let server = common::TestServer::start().await?;

    let res = server.client.get(server.url("/")).send().await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body: Value = res.json().await?;
    assert_eq!(body["message"], "Hello world!");
    assert_eq!(body["data"]["name"], "students-api");
    Ok(())
}

#[tokio::test]
async fn health_reports_store_ok() -> Result<()> {
    let server = common::TestServer::start().await?;

    let res = server.client.get(server.url("/health")).send().await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body: Value = res.json().await?;
    assert_eq!(body["data"]["store"], "ok");
    Ok(())
}

#[tokio::test]
async fn unknown_route_is_json_not_found() -> Result<()> {
    let server = common::TestServer::start().await?;

    let res = server.client.get(server.url("/teachers")).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let body: Value = res.json().await?;
    assert_eq!(body["error"], true);
    assert_eq!(body["status"], 404);
    assert_eq!(body["message"], "Not found");
    Ok(())
}
