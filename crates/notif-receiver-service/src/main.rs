use std::sync::Arc;

use clap::Parser;
use kube::Client;
use notif_receiver_core::adapters::kube_store::{KubeObjectStore, ReceiverGvk};
use notif_receiver_core::ObjectStore;
use notif_receiver_service::config::{LogFormat, ServiceConfig};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() {
    let config = ServiceConfig::parse();
    init_tracing(config.log_format);

    if let Err(err) = run(config).await {
        tracing::error!(error = %err, "service exited with error");
        std::process::exit(1);
    }
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry.with(fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(fmt::layer().pretty()).init(),
    }
}

async fn run(config: ServiceConfig) -> anyhow::Result<()> {
    let client = Client::try_default().await?;
    let gvk = ReceiverGvk {
        group: config.receiver_group.clone(),
        version: config.receiver_version.clone(),
        kind: "Receiver".to_string(),
        plural: config.receiver_plural.clone(),
    };
    let store: Arc<dyn ObjectStore> = Arc::new(KubeObjectStore::new(client, gvk));
    let cancellation = CancellationToken::new();

    let state = notif_receiver_service::AppState {
        store,
        cancellation: cancellation.clone(),
    };
    let router = notif_receiver_service::create_router(state);

    notif_receiver_service::serve(config.listen_addr, router, cancellation).await
}
