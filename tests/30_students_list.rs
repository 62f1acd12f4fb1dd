mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::Value;

use common::TestServer;

async fn list(server: &TestServer, query: &str) -> Result<Value> {
    let res = server
        .client
        .get(server.url(&format!("/students{}", query)))
        .bearer_auth(server.teacher())
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["message"], "Successfully found students!");
    Ok(body["data"].clone())
}

fn marks(page: &Value) -> Vec<f64> {
    page["items"]
        .as_array()
        .map(|items| items.iter().filter_map(|s| s["avgMark"].as_f64()).collect())
        .unwrap_or_default()
}

#[tokio::test]
async fn sorted_filtered_second_page() -> Result<()> {
    let server = TestServer::start().await?;

    let fixture: [(i64, f64); 12] = [
        (10, 7.0), (8, 11.5), (11, 9.5), (12, 4.0), (9, 12.0), (13, 10.0),
        (14, 6.5), (15, 8.5), (10, 11.0), (11, 3.0), (12, 5.5), (13, 2.5),
    ];
    for (i, (age, mark)) in fixture.iter().enumerate() {
        server.create_student(&format!("Pupil{:02}", i), *age, *mark).await?;
    }

    let page = list(&server, "?page=2&perPage=5&sortBy=avgMark&sortOrder=desc&minAge=10").await?;

    assert_eq!(marks(&page), vec![6.5, 5.5, 4.0, 3.0, 2.5]);
    assert_eq!(page["page"], 2);
    assert_eq!(page["perPage"], 5);
    assert_eq!(page["totalItems"], 10);
    assert_eq!(page["totalPages"], 2);
    assert_eq!(page["hasPreviousPage"], true);
    assert_eq!(page["hasNextPage"], false);
    Ok(())
}

#[tokio::test]
async fn garbage_params_fall_back_to_defaults() -> Result<()> {
    let server = TestServer::start().await?;
    for i in 0..12 {
        server.create_student(&format!("Pupil{:02}", i), 10, 5.0).await?;
    }

    let page = list(&server, "?page=zero&perPage=-3&sortBy=shoeSize&sortOrder=sideways&minAge=abc").await?;

    // perPage below 1 clamps to 1; the unparseable page falls back to 1
    assert_eq!(page["page"], 1);
    assert_eq!(page["perPage"], 1);
    assert_eq!(page["totalItems"], 12);
    assert_eq!(page["totalPages"], 12);
    assert_eq!(page["items"].as_array().map(Vec::len), Some(1));

    let page = list(&server, "").await?;
    assert_eq!(page["perPage"], 10);
    assert_eq!(page["items"].as_array().map(Vec::len), Some(10));
    Ok(())
}

#[tokio::test]
async fn inverted_bounds_match_nothing() -> Result<()> {
    let server = TestServer::start().await?;
    server.create_student("Pupil00", 10, 5.0).await?;

    let page = list(&server, "?minAge=12&maxAge=8").await?;
    assert_eq!(page["totalItems"], 0);
    assert_eq!(page["totalPages"], 0);
    assert_eq!(page["hasNextPage"], false);
    Ok(())
}

#[tokio::test]
async fn gender_and_mark_filters_combine() -> Result<()> {
    let server = TestServer::start().await?;
    server.create_student("Pupil00", 10, 5.0).await?;
    server.create_student("Pupil01", 10, 9.0).await?;

    let mut body = common::student_body("Pupil02", 10, 9.5);
    body["gender"] = "male".into();
    let res = server
        .client
        .post(server.url("/students"))
        .bearer_auth(server.teacher())
        .json(&body)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);

    let page = list(&server, "?gender=female&minAvgMark=8").await?;
    assert_eq!(marks(&page), vec![9.0]);

    let page = list(&server, "?gender=robot&maxAvgMark=9.5&sortBy=avgMark").await?;
    assert_eq!(marks(&page), vec![5.0, 9.0, 9.5]);
    Ok(())
}

#[tokio::test]
async fn repeated_keys_keep_last_value() -> Result<()> {
    let server = TestServer::start().await?;
    for i in 0..6 {
        server.create_student(&format!("Pupil{:02}", i), 10, 5.0).await?;
    }

    let page = list(&server, "?page=1&page=2&perPage=5&pageSize=2").await?;
    assert_eq!(page["page"], 2);
    assert_eq!(page["perPage"], 2);
    assert_eq!(page["totalPages"], 3);
    assert_eq!(page["items"].as_array().map(Vec::len), Some(2));
    Ok(())
}
