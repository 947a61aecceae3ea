mod broadcast;
mod dispatcher;
mod engine;

use clap::{Parser, Subcommand};
use recibo_archive::{Bucket, FtpRemoteStore, ReceiptRepository};
use recibo_channels::CloudApiGateway;
use recibo_core::config;
use recibo_core::validate::parse_issue_date;
use recibo_store::Store;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(
    name = "recibo",
    version,
    about = "Recibo — WhatsApp payroll receipt assistant"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file.
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the webhook server and dialogue engine.
    Start,
    /// Check configuration, database, and archive reachability.
    Status,
    /// Register an employee in the identity registry.
    Register {
        /// National id (digits only).
        national_id: String,
        /// Full name.
        name: String,
        /// Id issuance date, DD/MM/YYYY.
        issue_date: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match cli.command {
        Commands::Start => {
            let cfg = config::load(&cli.config)?;

            if cfg.whatsapp.access_token.is_empty() || cfg.whatsapp.phone_number_id.is_empty() {
                anyhow::bail!(
                    "WhatsApp Cloud API is not configured. Set whatsapp.access_token and \
                     whatsapp.phone_number_id in config.toml."
                );
            }
            if !cfg.archive.is_configured() {
                anyhow::bail!(
                    "FTP archive is not configured. Set archive.host, archive.user, and \
                     archive.password in config.toml."
                );
            }

            let store = Store::new(&cfg.store).await?;
            let repo = Arc::new(ReceiptRepository::new(
                Arc::new(FtpRemoteStore::new(&cfg.archive)),
                &cfg.archive.base_dir,
            ));
            let gateway = Arc::new(CloudApiGateway::new(&cfg.whatsapp));
            let bus = Arc::new(broadcast::LocalBroadcaster::new());

            let engine = Arc::new(engine::Engine::new(
                store,
                repo,
                gateway,
                bus,
                cfg.company.clone(),
            ));

            let app = dispatcher::router(engine, &cfg.whatsapp.verify_token);
            let addr = format!("{}:{}", cfg.webhook.host, cfg.webhook.port);
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            info!("webhook listening on {addr}");
            axum::serve(listener, app).await?;
        }
        Commands::Status => {
            let cfg = config::load(&cli.config)?;
            println!("Recibo — Status Check\n");
            println!("Config: {}", cli.config);
            println!(
                "  whatsapp: {}",
                if cfg.whatsapp.access_token.is_empty() {
                    "missing access_token"
                } else if cfg.whatsapp.phone_number_id.is_empty() {
                    "missing phone_number_id"
                } else {
                    "configured"
                }
            );
            println!("  store: {}", cfg.store.db_path);
            println!(
                "  archive: {}",
                if cfg.archive.is_configured() {
                    cfg.archive.host.as_str()
                } else {
                    "not configured"
                }
            );

            if cfg.archive.is_configured() {
                let repo = ReceiptRepository::new(
                    Arc::new(FtpRemoteStore::new(&cfg.archive)),
                    &cfg.archive.base_dir,
                );
                println!();
                for bucket in Bucket::ALL {
                    match repo.list_with_metadata(bucket).await {
                        Ok(docs) => println!("  {bucket}: {} file(s)", docs.len()),
                        Err(e) => println!("  {bucket}: unreachable ({e})"),
                    }
                }
            }
        }
        Commands::Register {
            national_id,
            name,
            issue_date,
        } => {
            let cfg = config::load(&cli.config)?;
            let date = parse_issue_date(&issue_date)
                .map_err(|e| anyhow::anyhow!("invalid issue date: {e}"))?;

            let store = Store::new(&cfg.store).await?;
            store
                .upsert_registered_user(&national_id, &name, date)
                .await?;
            println!("Registered {name} ({national_id}).");
        }
    }

    Ok(())
}
