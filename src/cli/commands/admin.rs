use clap::Subcommand;
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::cli::{utils::output_rows, utils::output_success, OutputFormat};
use crate::config::AppConfig;
use crate::models::admin::{AdminProfile, ModuleName, RoleType};
use crate::models::PageRequest;
use crate::services::admin_service::{AdminFilters, AdminService, CreateAdminRequest};
use crate::services::Actor;
use crate::state::AppState;

#[derive(Subcommand)]
pub enum AdminCommands {
    #[command(about = "Create an admin account (bootstrap the first master with --master)")]
    Create {
        #[arg(long)]
        email: String,
        #[arg(long)]
        prenom: String,
        #[arg(long)]
        nom: String,
        #[arg(long, help = "At least 8 characters")]
        password: String,
        #[arg(long)]
        numero_membre: Option<String>,
        #[arg(long, help = "Grant access to every module and to admin management")]
        master: bool,
        #[arg(long, help = "Superadmin scoped to these modules (empty = all)", value_delimiter = ',')]
        superadmin: Option<Vec<ModuleName>>,
    },

    #[command(about = "List admin accounts")]
    List,
}

/// Mutations from the command line are audited under this identity
fn cli_actor() -> Actor {
    Actor { id: Uuid::nil(), email: "cli".to_string(), ip: None }
}

pub async fn handle(cmd: AdminCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let state = AppState::from_config(AppConfig::from_env()).await?;
    let service = AdminService::new(&state);

    match cmd {
        AdminCommands::Create { email, prenom, nom, password, numero_membre, master, superadmin } => {
            let request = CreateAdminRequest {
                email,
                numero_membre,
                password,
                prenom,
                nom,
                role_type: Some(if superadmin.is_some() { RoleType::Superadmin } else { RoleType::Admin }),
                is_master: master,
                super_scope: superadmin.unwrap_or_default(),
                modules: None,
            };
            request.validate()?;

            let created = service.create(&cli_actor(), request).await?;
            state.effects.flush().await;
            output_success(
                &output_format,
                &format!("Admin {} created", created.admin.email),
                Some(json!({ "id": created.admin.id, "is_master": created.admin.is_master })),
            )
        }
        AdminCommands::List => {
            let page = service.list(AdminFilters::default(), PageRequest { page: 1, limit: 500 }).await?;
            output_rows(&output_format, "admins", &page.rows, |a: &AdminProfile| {
                let flags = match (a.is_master, a.is_active) {
                    (true, _) => "master",
                    (false, false) => "inactive",
                    _ => "",
                };
                format!("{}  {} {}  {}", a.email, a.prenom, a.nom, flags)
            })
        }
    }
}
