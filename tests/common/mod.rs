#![allow(dead_code)]

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::{json, Value};
use uuid::Uuid;

use students_api::auth::policy::Role;
use students_api::auth::{generate_jwt, Claims};
use students_api::config::AppConfig;
use students_api::{app, AppState};

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub config: AppConfig,
    pub client: reqwest::Client,
}

impl TestServer {
    /// In-process server on a free port with the in-memory store and
    /// local photo storage under a fresh temp directory.
    pub async fn start() -> Result<Self> {
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let mut config = AppConfig::development();
        config.server.port = port;
        config.server.public_url = base_url.clone();
        config.security.jwt_secret = "integration-test-secret".to_string();
        config.storage.upload_dir = std::env::temp_dir().join(format!("students-api-it-{}", Uuid::new_v4().simple()));

        let state = AppState::from_config(config.clone()).await?;
        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .with_context(|| format!("failed to bind {}", base_url))?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, app(state)).await;
        });

        let server = Self { port, base_url, config, client: reqwest::Client::new() };
        server.wait_ready(Duration::from_secs(5)).await?;
        Ok(server)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline { break; }
            if let Ok(resp) = self.client.get(self.url("/health")).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn upload_dir(&self) -> PathBuf {
        self.config.storage.upload_dir.clone()
    }

    pub fn token(&self, role: Role) -> String {
        let claims = Claims::new(Uuid::new_v4(), "Integration", role, 1);
        generate_jwt(&claims, &self.config.security.jwt_secret).expect("token")
    }

    pub fn teacher(&self) -> String {
        self.token(Role::Teacher)
    }

    pub fn parent(&self) -> String {
        self.token(Role::Parent)
    }

    /// POST a valid student as a teacher and return its `data`
    pub async fn create_student(&self, name: &str, age: i64, avg_mark: f64) -> Result<Value> {
        let res = self
            .client
            .post(self.url("/students"))
            .bearer_auth(self.teacher())
            .json(&student_body(name, age, avg_mark))
            .send()
            .await?;
        anyhow::ensure!(res.status() == StatusCode::CREATED, "create failed: {}", res.status());
        let body: Value = res.json().await?;
        Ok(body["data"].clone())
    }
}

pub fn student_body(name: &str, age: i64, avg_mark: f64) -> Value {
    json!({
        "name": name,
        "email": format!("{}@school.test", name.to_lowercase()),
        "gender": "female",
        "age": age,
        "avgMark": avg_mark,
        "onDuty": false
    })
}
