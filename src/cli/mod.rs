pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "students-api")]
#[command(about = "Students API - record service with role-gated access and photo storage")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    /// Defaults to `serve`
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP server")]
    Serve {
        #[arg(long, short, help = "Port to listen on (overrides STUDENTS_API_PORT)")]
        port: Option<u16>,
    },

    #[command(about = "Mint a bearer token signed with the configured JWT secret")]
    Token {
        #[arg(long, help = "Display name stored in the token")]
        user: String,
        #[arg(long, help = "Role: teacher or parent")]
        role: String,
        #[arg(long, help = "User id (random when omitted)")]
        id: Option<uuid::Uuid>,
        #[arg(long, help = "Lifetime in hours (defaults to SECURITY_JWT_EXPIRY_HOURS)")]
        expiry_hours: Option<u64>,
    },

    #[command(about = "Check server health status from the /health endpoint")]
    Health {
        #[arg(long, default_value = "http://localhost:3000", help = "Server URL")]
        url: String,
    },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command.unwrap_or(Commands::Serve { port: None }) {
        Commands::Serve { port } => commands::serve::handle(port).await,
        Commands::Token { user, role, id, expiry_hours } => {
            commands::token::handle(&user, &role, id, expiry_hours, output_format)
        }
        Commands::Health { url } => commands::health::handle(&url, output_format).await,
    }
}
