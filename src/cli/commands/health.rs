use anyhow::Context;
use serde_json::Value;
use url::Url;

use crate::cli::{utils::output_success, OutputFormat};

pub async fn handle(server: &str, output_format: OutputFormat) -> anyhow::Result<()> {
    let url = Url::parse(server)
        .and_then(|u| u.join("/health"))
        .with_context(|| format!("invalid server URL '{}'", server))?;

    let response = reqwest::get(url.clone()).await.with_context(|| format!("GET {}", url))?;
    let status = response.status();
    let body: Value = response.json().await.unwrap_or(Value::Null);

    if !status.is_success() {
        anyhow::bail!("{} reported {}: {}", url, status, body);
    }

    output_success(output_format, &format!("{} is healthy", server), Some(body))
}
