mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};
use uuid::Uuid;

use common::{student_body, TestServer};

#[tokio::test]
async fn missing_token_is_unauthorized() -> Result<()> {
    let server = TestServer::start().await?;

    let res = server.client.get(server.url("/students")).send().await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = server
        .client
        .get(server.url("/students"))
        .bearer_auth("not.a.jwt")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let body: Value = res.json().await?;
    assert_eq!(body["code"], "UNAUTHORIZED");
    Ok(())
}

#[tokio::test]
async fn create_then_read_roundtrip() -> Result<()> {
    let server = TestServer::start().await?;

    let res = server
        .client
        .post(server.url("/students"))
        .bearer_auth(server.teacher())
        .json(&student_body("Halyna", 12, 10.5))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);

    let body: Value = res.json().await?;
    assert_eq!(body["status"], 201);
    assert_eq!(body["message"], "Successfully created a student!");
    let created = &body["data"];
    let id = created["id"].as_str().expect("id").to_string();
    assert_eq!(created["avgMark"], 10.5);
    assert!(created["createdAt"].is_string());

    let res = server
        .client
        .get(server.url(&format!("/students/{}", id)))
        .bearer_auth(server.parent())
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body: Value = res.json().await?;
    assert_eq!(body["message"], format!("Successfully found student with id {}!", id));
    assert_eq!(&body["data"], created);
    Ok(())
}

#[tokio::test]
async fn parent_is_limited_by_policy() -> Result<()> {
    let server = TestServer::start().await?;
    let created = server.create_student("Vasyl", 9, 7.0).await?;
    let id = created["id"].as_str().unwrap();

    let res = server
        .client
        .get(server.url("/students"))
        .bearer_auth(server.parent())
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: Value = res.json().await?;
    assert_eq!(body["code"], "FORBIDDEN");

    let res = server
        .client
        .delete(server.url(&format!("/students/{}", id)))
        .bearer_auth(server.parent())
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    // Denied before the body is looked at
    let res = server
        .client
        .post(server.url("/students"))
        .bearer_auth(server.parent())
        .json(&json!({ "name": "x" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = server
        .client
        .post(server.url("/students"))
        .bearer_auth(server.parent())
        .header("content-type", "application/json")
        .body("{nope")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = server
        .client
        .get(server.url("/students?sortBy=a&sortBy=b"))
        .bearer_auth(server.parent())
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = server
        .client
        .patch(server.url(&format!("/students/{}", id)))
        .bearer_auth(server.parent())
        .json(&json!({ "onDuty": true }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["data"]["onDuty"], true);
    Ok(())
}

#[tokio::test]
async fn put_creates_then_replaces() -> Result<()> {
    let server = TestServer::start().await?;
    let id = Uuid::now_v7();
    let url = server.url(&format!("/students/{}", id));

    let res = server
        .client
        .put(&url)
        .bearer_auth(server.teacher())
        .json(&student_body("Roksolana", 13, 11.0))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let first: Value = res.json().await?;
    assert_eq!(first["data"]["id"], id.to_string());

    let res = server
        .client
        .put(&url)
        .bearer_auth(server.teacher())
        .json(&student_body("Roksolana", 13, 11.0))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let second: Value = res.json().await?;
    assert_eq!(second["message"], "Successfully upserted a student!");
    assert_eq!(first["data"], second["data"]);
    Ok(())
}

#[tokio::test]
async fn patch_keeps_untouched_fields() -> Result<()> {
    let server = TestServer::start().await?;
    let created = server.create_student("Ostap", 14, 9.0).await?;
    let id = created["id"].as_str().unwrap();

    let res = server
        .client
        .patch(server.url(&format!("/students/{}", id)))
        .bearer_auth(server.teacher())
        .json(&json!({ "age": 10 }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body: Value = res.json().await?;
    let patched = &body["data"];
    assert_eq!(patched["age"], 10);
    for key in ["name", "email", "gender", "avgMark", "onDuty", "createdAt"] {
        assert_eq!(patched[key], created[key], "{key} changed");
    }
    Ok(())
}

#[tokio::test]
async fn missing_records_are_not_found() -> Result<()> {
    let server = TestServer::start().await?;
    let url = server.url(&format!("/students/{}", Uuid::now_v7()));

    let res = server.client.get(&url).bearer_auth(server.teacher()).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = res.json().await?;
    assert_eq!(body["message"], "Student not found");

    let res = server
        .client
        .patch(&url)
        .bearer_auth(server.teacher())
        .json(&json!({ "age": 10 }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = server.client.delete(&url).bearer_auth(server.teacher()).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn delete_removes_record() -> Result<()> {
    let server = TestServer::start().await?;
    let created = server.create_student("Marta", 8, 6.0).await?;
    let url = server.url(&format!("/students/{}", created["id"].as_str().unwrap()));

    let res = server.client.delete(&url).bearer_auth(server.teacher()).send().await?;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    assert!(res.bytes().await?.is_empty());

    let res = server.client.get(&url).bearer_auth(server.teacher()).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn bad_input_is_rejected() -> Result<()> {
    let server = TestServer::start().await?;

    let res = server
        .client
        .get(server.url("/students/12345"))
        .bearer_auth(server.teacher())
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = server
        .client
        .post(server.url("/students"))
        .bearer_auth(server.teacher())
        .json(&json!({ "name": "Al", "gender": "male", "age": 40, "avgMark": 5 }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await?;
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body["field_errors"]["name"].is_string());
    assert!(body["field_errors"]["age"].is_string());

    let res = server
        .client
        .post(server.url("/students"))
        .bearer_auth(server.teacher())
        .json(&json!({ "id": "mine", "name": "Alla", "gender": "male", "age": 10, "avgMark": 5 }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let created = server.create_student("Nazar", 10, 8.0).await?;
    let res = server
        .client
        .patch(server.url(&format!("/students/{}", created["id"].as_str().unwrap())))
        .bearer_auth(server.teacher())
        .json(&json!({}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}
