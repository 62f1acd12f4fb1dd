use serde_json::json;
use uuid::Uuid;

use crate::auth::policy::Role;
use crate::auth::{generate_jwt, Claims};
use crate::cli::{utils::output_success, OutputFormat};
use crate::config;

pub fn handle(
    user: &str,
    role: &str,
    id: Option<Uuid>,
    expiry_hours: Option<u64>,
    output_format: OutputFormat,
) -> anyhow::Result<()> {
    let role: Role = role.parse().map_err(anyhow::Error::msg)?;
    let security = &config::config().security;

    let claims = Claims::new(
        id.unwrap_or_else(Uuid::new_v4),
        user,
        role,
        expiry_hours.unwrap_or(security.jwt_expiry_hours),
    );
    let token = generate_jwt(&claims, &security.jwt_secret)?;

    match output_format {
        OutputFormat::Json => output_success(
            output_format,
            "Token issued",
            Some(json!({ "token": token, "user_id": claims.sub, "role": role, "exp": claims.exp })),
        ),
        OutputFormat::Text => {
            println!("{}", token);
            Ok(())
        }
    }
}
