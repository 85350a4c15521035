use asso_admin_api::cli::commands::serve;
use asso_admin_api::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();
    serve::init_tracing();

    serve::serve(AppConfig::from_env()).await
}
