mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands, ServeArgs};
use clusterforge_cloud_aws::{CloudFormationProvider, template};
use clusterforge_controlplane::{AppState, ClusterReconciler, router};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Template => {
            let document = serde_json::to_string_pretty(&template::build())
                .context("Failed to render template")?;
            println!("{}", document);
            Ok(())
        }
        Commands::Serve(args) => serve(args).await,
    }
}

fn init_tracing(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn serve(args: ServeArgs) -> Result<()> {
    init_tracing(args.debug);

    let config = args.control_plane_config();
    config.validate().context("Invalid configuration")?;

    let aws = args.aws_config();
    let provider = CloudFormationProvider::connect(&aws).await;
    let template_body = template::body().context("Failed to serialize template")?;

    info!(
        region = %aws.region,
        vpc = %config.vpc,
        failed_stack_policy = ?config.failed_stack_policy,
        create_confirmation = config.create_confirmation.is_some(),
        disable_rollback = config.disable_rollback,
        "Starting clusterforged"
    );

    let reconciler = ClusterReconciler::new(Arc::new(provider), template_body, config);
    let app = router(AppState::new(reconciler, args.basic_auth()));

    let addr = SocketAddr::new(args.bind, args.port);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!(%addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
