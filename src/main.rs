use clap::Parser;
use sid_structure_api::db;
use sid_structure_api::notifications::{HttpParserNotifier, StructureUpdateNotifier};
use sid_structure_api::server::config::ServerConfig;
use sid_structure_api::version::VERSION;
use sid_structure_api::web::create_axum_router;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_appender::rolling;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(author, version = VERSION, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long)]
    config: Option<String>,
}

fn init_logging(log_dir: &str) {
    // Log to a file: JSON format, daily rotation
    let file_appender = rolling::daily(log_dir, "structure-api.log");
    let file_layer = fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false)
        .json();

    let stdout_layer = fmt::layer().with_writer(std::io::stdout);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sea_orm=warn,sqlx::query=warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stdout_layer)
        .init();
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal.");
    }
    info!("Shutdown signal received.");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args = Args::parse();

    let server_config = match ServerConfig::load(args.config.as_deref()) {
        Ok(config) => Arc::new(config),
        Err(e) => {
            eprintln!("Failed to load server configuration: {e}");
            return Err(e.into());
        }
    };

    init_logging(&server_config.log_dir);
    info!("Starting structure API, version: {}", VERSION);

    let db_pool = db::connect(&server_config.database_url).await.map_err(|e| {
        error!(error = %e, "Failed to connect to the database.");
        e
    })?;

    let parser_notifier = HttpParserNotifier::new(
        &server_config.parser_server_url,
        Duration::from_secs(server_config.notify_timeout_secs),
    )?;
    info!(
        endpoint = %parser_notifier.endpoint(),
        "Parser server notifications configured."
    );
    let notifier: Arc<dyn StructureUpdateNotifier> = Arc::new(parser_notifier);

    let app = create_axum_router(db_pool, notifier, server_config.clone());

    let addr = server_config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("HTTP server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped.");
    Ok(())
}
