pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "asso")]
#[command(about = "Association back-office API - server and maintenance commands")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP server")]
    Serve {
        #[arg(long, help = "Port to bind (overrides ASSO_API_PORT / PORT)")]
        port: Option<u16>,
    },

    #[command(about = "Apply the database schema script")]
    Migrate {
        #[arg(long, default_value = "migrations/0001_init.sql", help = "SQL script to apply")]
        file: std::path::PathBuf,
    },

    #[command(about = "Back-office admin accounts")]
    Admin {
        #[command(subcommand)]
        cmd: commands::admin::AdminCommands,
    },

    #[command(about = "Print the argon2 hash of a password")]
    HashPassword {
        #[arg(help = "Password to hash")]
        password: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
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

    match cli.command {
        Commands::Serve { port } => commands::serve::handle(port).await,
        Commands::Migrate { file } => commands::migrate::handle(file, output_format).await,
        Commands::Admin { cmd } => commands::admin::handle(cmd, output_format).await,
        Commands::HashPassword { password } => {
            let hash = crate::auth::hash_password(&password)?;
            utils::output_value(&output_format, "hash", &hash)
        }
    }
}
